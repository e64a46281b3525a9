//! Model builder for assembling a flowline model from its parts.

use crate::errors::{RSGMError, RSGMResult};
use crate::geometry::GeometryProfile;
use crate::mass_balance::MassBalanceModel;
use crate::parameters::ModelParameters;
use crate::{FloatValue, Time};
use std::sync::Arc;

use super::runtime::FlowlineModel;

/// Build a new [`FlowlineModel`].
///
/// A geometry and a mass-balance model are required. Parameters default to
/// [`ModelParameters::default`] and the clock starts at year 0 unless set.
///
/// ```
/// use rsgm_core::geometry::GeometryProfile;
/// use rsgm_core::mass_balance::LinearMassBalance;
/// use rsgm_core::model::ModelBuilder;
/// use std::sync::Arc;
///
/// let geometry = GeometryProfile::linear(3400.0, 1400.0, 200, 100.0, 300.0).unwrap();
/// let mb = LinearMassBalance::new(3000.0, 4.0).unwrap();
///
/// let mut model = ModelBuilder::new()
///     .with_geometry(geometry)
///     .with_mass_balance(Arc::new(mb))
///     .build()
///     .unwrap();
/// model.run_until(10.0).unwrap();
/// assert_eq!(model.year(), 10.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    geometry: Option<GeometryProfile>,
    mass_balance: Option<Arc<dyn MassBalanceModel>>,
    parameters: ModelParameters,
    start_year: Time,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial flowline geometry.
    pub fn with_geometry(&mut self, geometry: GeometryProfile) -> &mut Self {
        self.geometry = Some(geometry);
        self
    }

    /// Set the mass-balance model.
    ///
    /// The model is shared, so the same object can drive several flowline models.
    pub fn with_mass_balance(&mut self, mass_balance: Arc<dyn MassBalanceModel>) -> &mut Self {
        self.mass_balance = Some(mass_balance);
        self
    }

    /// Replace all physical and numerical parameters.
    pub fn with_parameters(&mut self, parameters: ModelParameters) -> &mut Self {
        self.parameters = parameters;
        self
    }

    /// Set Glen's creep parameter $A$ ($\text{s}^{-1}\,\text{Pa}^{-3}$).
    pub fn with_glen_a(&mut self, glen_a: FloatValue) -> &mut Self {
        self.parameters.flow.glen_a = glen_a;
        self
    }

    /// Set the basal sliding parameter $f_s$.
    pub fn with_fs(&mut self, fs: FloatValue) -> &mut Self {
        self.parameters.flow.fs = fs;
        self
    }

    pub fn with_start_year(&mut self, start_year: Time) -> &mut Self {
        self.start_year = start_year;
        self
    }

    /// Validate the inputs and create the model.
    ///
    /// The builder is left untouched and can be reused to create further models.
    ///
    /// # Errors
    ///
    /// [`RSGMError::MissingBuilderInput`] if the geometry or mass balance was not set,
    /// or any error from [`FlowlineModel::new`].
    pub fn build(&self) -> RSGMResult<FlowlineModel> {
        let geometry = self
            .geometry
            .clone()
            .ok_or_else(|| RSGMError::MissingBuilderInput("geometry".to_string()))?;
        let mass_balance = self
            .mass_balance
            .clone()
            .ok_or_else(|| RSGMError::MissingBuilderInput("mass balance model".to_string()))?;

        FlowlineModel::new(
            geometry,
            mass_balance,
            self.parameters.clone(),
            self.start_year,
        )
    }
}
