//! FlowlineModel struct and runtime execution.

use crate::errors::{RSGMError, RSGMResult};
use crate::flow_law::FlowLaw;
use crate::geometry::GeometryProfile;
use crate::history::ModelHistory;
use crate::mass_balance::MassBalanceModel;
use crate::parameters::ModelParameters;
use crate::stepper::advance;
use crate::{FloatValue, Time};
use is_close::is_close;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single glacier flowline evolving under one mass-balance model.
///
/// Internal timesteps are chosen adaptively, so the model can be queried at any real
/// year. Every query returns an owned snapshot; nothing handed out by the model can be
/// used to modify its state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "FlowlineModelData")]
pub struct FlowlineModel {
    /// The evolving glacier.
    geometry: GeometryProfile,
    /// Forcing applied on every timestep.
    ///
    /// Shared with any other model built from the same mass-balance object; it is never
    /// mutated.
    mass_balance: Arc<dyn MassBalanceModel>,
    parameters: ModelParameters,
    /// Current simulation year
    year: Time,
}

/// Unvalidated form of a serialised [`FlowlineModel`].
#[derive(Deserialize)]
struct FlowlineModelData {
    geometry: GeometryProfile,
    mass_balance: Arc<dyn MassBalanceModel>,
    parameters: ModelParameters,
    year: Time,
}

impl TryFrom<FlowlineModelData> for FlowlineModel {
    type Error = RSGMError;

    fn try_from(data: FlowlineModelData) -> RSGMResult<Self> {
        Self::new(data.geometry, data.mass_balance, data.parameters, data.year)
    }
}

impl FlowlineModel {
    /// Create a new model.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the parameters are invalid or the start year is
    /// not finite.
    pub fn new(
        geometry: GeometryProfile,
        mass_balance: Arc<dyn MassBalanceModel>,
        parameters: ModelParameters,
        start_year: Time,
    ) -> RSGMResult<Self> {
        parameters.validate()?;
        if !start_year.is_finite() {
            return Err(RSGMError::invalid_parameter(
                "start_year",
                start_year,
                "Start year must be finite",
            ));
        }
        Ok(Self {
            geometry,
            mass_balance,
            parameters,
            year: start_year,
        })
    }

    /// Current simulation year.
    pub fn year(&self) -> Time {
        self.year
    }

    /// Glacier length (m)
    pub fn length(&self) -> FloatValue {
        self.geometry.length()
    }

    /// Glacier area ($\text{m}^2$)
    pub fn area(&self) -> FloatValue {
        self.geometry.area()
    }

    /// Glacier volume ($\text{m}^3$)
    pub fn volume(&self) -> FloatValue {
        self.geometry.volume()
    }

    /// Ice thickness at each grid point (m)
    pub fn thickness(&self) -> Array1<FloatValue> {
        self.geometry.thickness()
    }

    /// Surface elevation at each grid point (m)
    pub fn surface_elevation(&self) -> Array1<FloatValue> {
        self.geometry.surface_elevation()
    }

    /// Bed elevation at each grid point (m)
    pub fn bed_elevation(&self) -> Array1<FloatValue> {
        self.geometry.bed_elevation()
    }

    /// Channel width at each grid point (m)
    pub fn widths(&self) -> Array1<FloatValue> {
        self.geometry.widths()
    }

    /// Depth-averaged ice velocity at the internal cell boundaries ($\text{m yr}^{-1}$).
    pub fn velocities(&self) -> Array1<FloatValue> {
        FlowLaw::new(&self.parameters.flow)
            .evaluate(&self.geometry)
            .velocity
    }

    /// Glacier-wide specific mass balance for the current state ($\text{mm w.e. yr}^{-1}$).
    pub fn specific_mass_balance(&self) -> FloatValue {
        self.mass_balance.specific_mass_balance(&self.geometry)
    }

    pub fn geometry(&self) -> &GeometryProfile {
        &self.geometry
    }

    pub fn mass_balance(&self) -> &dyn MassBalanceModel {
        self.mass_balance.as_ref()
    }

    pub fn parameters(&self) -> &ModelParameters {
        &self.parameters
    }

    /// Advance the model to `target_year`.
    ///
    /// The last internal step is shortened so that the clock lands exactly on the target.
    /// If the model is already at or past `target_year` nothing happens.
    ///
    /// # Errors
    ///
    /// A configuration error if `target_year` is not finite, or
    /// [`RSGMError::NumericalInstability`] if a step cannot be integrated or is too short
    /// to move the clock at the current year.
    pub fn run_until(&mut self, target_year: Time) -> RSGMResult<()> {
        if !target_year.is_finite() {
            return Err(RSGMError::invalid_parameter(
                "target_year",
                target_year,
                "Target year must be finite",
            ));
        }
        if target_year <= self.year {
            return Ok(());
        }

        let flow_law = FlowLaw::new(&self.parameters.flow);
        while self.year < target_year {
            let remaining = target_year - self.year;
            let dt = advance(
                &mut self.geometry,
                self.mass_balance.as_ref(),
                &flow_law,
                &self.parameters.numerics,
                self.year,
                remaining,
            )?;

            let next = self.year + dt;
            if dt >= remaining || next >= target_year {
                self.year = target_year;
            } else if next <= self.year {
                return Err(RSGMError::NumericalInstability {
                    year: self.year,
                    retries: 0,
                    reason: format!(
                        "timestep of {:.3e} yr does not advance the clock at this year",
                        dt
                    ),
                });
            } else {
                self.year = next;
            }
        }
        Ok(())
    }

    /// Advance the model to `target_year`, recording a sample every `store_interval` years.
    ///
    /// Samples are taken at the current year, at each multiple of `store_interval` after
    /// it, and at `target_year`. If the model is already past the target only the
    /// current state is recorded.
    pub fn run_until_and_store(
        &mut self,
        target_year: Time,
        store_interval: Time,
    ) -> RSGMResult<ModelHistory> {
        if !store_interval.is_finite() || store_interval <= 0.0 {
            return Err(RSGMError::invalid_parameter(
                "store_interval",
                store_interval,
                "Store interval must be positive",
            ));
        }

        let mut history = ModelHistory::new();
        history.record(self);

        let start = self.year;
        let mut sample = 1;
        loop {
            let next = start + sample as Time * store_interval;
            if next >= target_year || is_close!(next, target_year) {
                break;
            }
            self.run_until(next)?;
            history.record(self);
            sample += 1;
        }

        if target_year > self.year {
            self.run_until(target_year)?;
            history.record(self);
        }
        Ok(history)
    }

    /// Replace the mass-balance model, keeping the geometry, parameters and clock.
    pub fn with_mass_balance(self, mass_balance: Arc<dyn MassBalanceModel>) -> Self {
        Self {
            mass_balance,
            ..self
        }
    }

    /// Replace the parameters, keeping the geometry, mass balance and clock.
    pub fn with_parameters(self, parameters: ModelParameters) -> RSGMResult<Self> {
        let year = self.year;
        Self::new(self.geometry, self.mass_balance, parameters, year)
    }

    /// Consume the model, returning its geometry.
    pub fn into_geometry(self) -> GeometryProfile {
        self.geometry
    }
}
