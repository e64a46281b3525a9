//! Surface mass-balance forcing
//!
//! A mass-balance model maps surface elevations to a mass-balance rate. It has no
//! memory of the glacier it is applied to: it is re-evaluated on the current surface
//! every timestep and is never mutated. To change the climate, build a new model and
//! hand it to [`FlowlineModel::with_mass_balance`](crate::model::FlowlineModel::with_mass_balance).

use crate::constants::ICE_DENSITY;
use crate::errors::{RSGMError, RSGMResult};
use crate::geometry::GeometryProfile;
use crate::FloatValue;
use ndarray::{Array1, ArrayView1, Zip};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Elevation-dependent surface mass balance.
///
/// Rates in millimetres water equivalent per year are equivalent to
/// $\text{kg m}^{-2}\,\text{yr}^{-1}$.
#[typetag::serde(tag = "type")]
pub trait MassBalanceModel: Debug + Send + Sync {
    /// Mass balance at each elevation ($\text{mm w.e. yr}^{-1}$)
    fn annual_mass_balance(&self, elevations: ArrayView1<FloatValue>) -> Array1<FloatValue>;

    /// Equilibrium line altitude (m)
    fn ela(&self) -> FloatValue;

    /// Mass balance at each elevation as an ice thickness rate ($\text{m ice yr}^{-1}$).
    fn annual_rate(&self, elevations: ArrayView1<FloatValue>) -> Array1<FloatValue> {
        self.annual_mass_balance(elevations) / ICE_DENSITY
    }

    /// Glacier-wide specific mass balance ($\text{mm w.e. yr}^{-1}$).
    ///
    /// Area-weighted mean over the glacierised grid points. Zero for an ice-free profile.
    fn specific_mass_balance(&self, geometry: &GeometryProfile) -> FloatValue {
        let mb = self.annual_mass_balance(geometry.surface_view().view());
        let (weighted, total_width) = Zip::from(&mb)
            .and(&geometry.thickness())
            .and(geometry.widths_view())
            .fold((0.0, 0.0), |(acc, total), &m, &h, &w| {
                if h > 0.0 {
                    (acc + m * w, total + w)
                } else {
                    (acc, total)
                }
            });
        if total_width > 0.0 {
            weighted / total_width
        } else {
            0.0
        }
    }
}

/// Mass balance varying linearly with elevation around the ELA.
///
/// $$\dot{b}(z) = \min\left(\frac{d\dot{b}}{dz} (z - z_{ELA}),\ \dot{b}_{max}\right)$$
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearMassBalance {
    /// Equilibrium line altitude (m)
    ela_h: FloatValue,
    /// Mass-balance gradient ($\text{mm w.e. m}^{-1}\,\text{yr}^{-1}$)
    grad: FloatValue,
    /// Optional cap on accumulation ($\text{mm w.e. yr}^{-1}$)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_mb: Option<FloatValue>,
}

impl LinearMassBalance {
    /// Create a linear mass balance without an accumulation cap.
    ///
    /// # Arguments
    ///
    /// * `ela_h` - Equilibrium line altitude (m)
    /// * `grad` - Mass-balance gradient ($\text{mm w.e. m}^{-1}\,\text{yr}^{-1}$)
    pub fn new(ela_h: FloatValue, grad: FloatValue) -> RSGMResult<Self> {
        if !ela_h.is_finite() {
            return Err(RSGMError::invalid_parameter(
                "ela_h",
                ela_h,
                "ELA must be finite",
            ));
        }
        if !grad.is_finite() {
            return Err(RSGMError::invalid_parameter(
                "grad",
                grad,
                "Mass-balance gradient must be finite",
            ));
        }
        Ok(Self {
            ela_h,
            grad,
            max_mb: None,
        })
    }

    /// Cap the mass balance at `max_mb` ($\text{mm w.e. yr}^{-1}$).
    pub fn with_max_mb(mut self, max_mb: FloatValue) -> RSGMResult<Self> {
        if !max_mb.is_finite() {
            return Err(RSGMError::invalid_parameter(
                "max_mb",
                max_mb,
                "Accumulation cap must be finite",
            ));
        }
        self.max_mb = Some(max_mb);
        Ok(self)
    }

    /// Mass-balance gradient ($\text{mm w.e. m}^{-1}\,\text{yr}^{-1}$)
    pub fn grad(&self) -> FloatValue {
        self.grad
    }

    /// Accumulation cap ($\text{mm w.e. yr}^{-1}$), if any
    pub fn max_mb(&self) -> Option<FloatValue> {
        self.max_mb
    }
}

#[typetag::serde]
impl MassBalanceModel for LinearMassBalance {
    fn annual_mass_balance(&self, elevations: ArrayView1<FloatValue>) -> Array1<FloatValue> {
        elevations.mapv(|z| {
            let mb = (z - self.ela_h) * self.grad;
            match self.max_mb {
                Some(cap) => mb.min(cap),
                None => mb,
            }
        })
    }

    fn ela(&self) -> FloatValue {
        self.ela_h
    }
}
