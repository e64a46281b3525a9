//! Flowline model parameters
//!
//! Physical and numerical parameters for a [`FlowlineModel`](crate::model::FlowlineModel).
//! Each struct provides defaults for a temperate mountain glacier and can be partially
//! deserialised, with missing fields taking their default value.

use crate::constants::{
    GLEN_A_REFERENCE, GLEN_N, GRAVITY, ICE_DENSITY, SEC_IN_DAY, SEC_IN_YEAR,
};
use crate::errors::{RSGMError, RSGMResult};
use crate::FloatValue;
use serde::{Deserialize, Serialize};

/// Parameters of the shallow-ice flow law.
///
/// Ice velocity is the sum of internal deformation and basal sliding:
///
/// $$u = f_d (\rho g)^n h^{n+1} |\alpha|^{n-1} \alpha + f_s (\rho g)^n h^{n-1} |\alpha|^{n-1} \alpha$$
///
/// with $f_d = 2A/(n+2)$ and $n = 3$.
///
/// # Default Values
///
/// Deformation uses the reference creep parameter for temperate ice and sliding is off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FlowParametersData")]
pub struct FlowParameters {
    /// Glen creep parameter $A$ ($\text{s}^{-1}\,\text{Pa}^{-3}$).
    /// Default: 2.4e-24
    pub glen_a: FloatValue,

    /// Basal sliding parameter $f_s$ ($\text{s}^{-1}\,\text{Pa}^{-3}\,\text{m}^2$).
    /// Default: 0.0 (no sliding)
    pub fs: FloatValue,

    /// Ice density ($\text{kg m}^{-3}$).
    /// Default: 900.0
    pub ice_density: FloatValue,
}

impl Default for FlowParameters {
    fn default() -> Self {
        Self {
            glen_a: GLEN_A_REFERENCE,
            fs: 0.0,
            ice_density: ICE_DENSITY,
        }
    }
}

/// Serialised [`FlowParameters`], where missing fields take their default value.
#[derive(Default, Deserialize)]
#[serde(default)]
struct FlowParametersData {
    glen_a: Option<FloatValue>,
    fs: Option<FloatValue>,
    ice_density: Option<FloatValue>,
}

impl TryFrom<FlowParametersData> for FlowParameters {
    type Error = RSGMError;

    fn try_from(data: FlowParametersData) -> RSGMResult<Self> {
        let defaults = Self::default();
        let parameters = Self {
            glen_a: data.glen_a.unwrap_or(defaults.glen_a),
            fs: data.fs.unwrap_or(defaults.fs),
            ice_density: data.ice_density.unwrap_or(defaults.ice_density),
        };
        parameters.validate()?;
        Ok(parameters)
    }
}

impl FlowParameters {
    /// Deformation factor $f_d = 2A/(n+2)$ converted to per-year units.
    pub fn deformation_factor(&self) -> FloatValue {
        2.0 * self.glen_a / (GLEN_N + 2) as FloatValue * SEC_IN_YEAR
    }

    /// Sliding factor $f_s$ converted to per-year units.
    pub fn sliding_factor(&self) -> FloatValue {
        self.fs * SEC_IN_YEAR
    }

    /// Driving stress factor $(\rho g)^n$.
    pub fn rho_g_n(&self) -> FloatValue {
        (self.ice_density * GRAVITY).powi(GLEN_N)
    }

    pub fn validate(&self) -> RSGMResult<()> {
        if !self.glen_a.is_finite() || self.glen_a < 0.0 {
            return Err(RSGMError::invalid_parameter(
                "glen_a",
                self.glen_a,
                "Creep parameter must be finite and non-negative",
            ));
        }
        if !self.fs.is_finite() || self.fs < 0.0 {
            return Err(RSGMError::invalid_parameter(
                "fs",
                self.fs,
                "Sliding parameter must be finite and non-negative",
            ));
        }
        if !self.ice_density.is_finite() || self.ice_density <= 0.0 {
            return Err(RSGMError::invalid_parameter(
                "ice_density",
                self.ice_density,
                "Ice density must be positive",
            ));
        }
        Ok(())
    }
}

/// Parameters controlling the explicit time integration.
///
/// The timestep is bounded by the diffusive stability limit
///
/// $$\Delta t \le s \frac{\Delta x^2}{2 D_{max}}$$
///
/// where $s$ is the safety factor. Steps that fail validation are retried with
/// $s$ multiplied by `retry_shrink_factor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NumericalParametersData")]
pub struct NumericalParameters {
    /// Safety factor applied to the stability limit, in (0, 1).
    /// Default: 0.5
    pub cfl_safety_factor: FloatValue,

    /// Smallest timestep taken, except for the final step landing on a target (yr).
    /// Default: 60 seconds
    pub min_dt: FloatValue,

    /// Largest timestep taken, used when ice diffusivity vanishes (yr).
    /// Default: 31 days
    pub max_dt: FloatValue,

    /// Factor applied to the safety factor on each retry, in (0, 1).
    /// Default: 0.5
    pub retry_shrink_factor: FloatValue,

    /// Number of retries before a step is declared unstable.
    /// Default: 6
    pub max_retries: usize,

    /// Largest negative thickness (m) that ice transport alone may produce in a cell
    /// before a step is rejected.
    /// Default: 1.0
    pub negative_thickness_tolerance: FloatValue,
}

impl Default for NumericalParameters {
    fn default() -> Self {
        Self {
            cfl_safety_factor: 0.5,
            min_dt: 60.0 / SEC_IN_YEAR,
            max_dt: 31.0 * SEC_IN_DAY / SEC_IN_YEAR,
            retry_shrink_factor: 0.5,
            max_retries: 6,
            negative_thickness_tolerance: 1.0,
        }
    }
}

/// Serialised [`NumericalParameters`], where missing fields take their default value.
#[derive(Default, Deserialize)]
#[serde(default)]
struct NumericalParametersData {
    cfl_safety_factor: Option<FloatValue>,
    min_dt: Option<FloatValue>,
    max_dt: Option<FloatValue>,
    retry_shrink_factor: Option<FloatValue>,
    max_retries: Option<usize>,
    negative_thickness_tolerance: Option<FloatValue>,
}

impl TryFrom<NumericalParametersData> for NumericalParameters {
    type Error = RSGMError;

    fn try_from(data: NumericalParametersData) -> RSGMResult<Self> {
        let defaults = Self::default();
        let parameters = Self {
            cfl_safety_factor: data.cfl_safety_factor.unwrap_or(defaults.cfl_safety_factor),
            min_dt: data.min_dt.unwrap_or(defaults.min_dt),
            max_dt: data.max_dt.unwrap_or(defaults.max_dt),
            retry_shrink_factor: data
                .retry_shrink_factor
                .unwrap_or(defaults.retry_shrink_factor),
            max_retries: data.max_retries.unwrap_or(defaults.max_retries),
            negative_thickness_tolerance: data
                .negative_thickness_tolerance
                .unwrap_or(defaults.negative_thickness_tolerance),
        };
        parameters.validate()?;
        Ok(parameters)
    }
}

impl NumericalParameters {
    pub fn validate(&self) -> RSGMResult<()> {
        if !(self.cfl_safety_factor > 0.0 && self.cfl_safety_factor < 1.0) {
            return Err(RSGMError::invalid_parameter(
                "cfl_safety_factor",
                self.cfl_safety_factor,
                "Safety factor must be strictly between 0 and 1",
            ));
        }
        if !(self.retry_shrink_factor > 0.0 && self.retry_shrink_factor < 1.0) {
            return Err(RSGMError::invalid_parameter(
                "retry_shrink_factor",
                self.retry_shrink_factor,
                "Shrink factor must be strictly between 0 and 1",
            ));
        }
        if !self.min_dt.is_finite() || self.min_dt <= 0.0 {
            return Err(RSGMError::invalid_parameter(
                "min_dt",
                self.min_dt,
                "Minimum timestep must be positive",
            ));
        }
        if !self.max_dt.is_finite() || self.max_dt < self.min_dt {
            return Err(RSGMError::invalid_parameter(
                "max_dt",
                self.max_dt,
                format!("Maximum timestep must be at least min_dt={}", self.min_dt),
            ));
        }
        if !self.negative_thickness_tolerance.is_finite() || self.negative_thickness_tolerance < 0.0
        {
            return Err(RSGMError::invalid_parameter(
                "negative_thickness_tolerance",
                self.negative_thickness_tolerance,
                "Tolerance must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// All parameters of a flowline model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParameters {
    pub flow: FlowParameters,
    pub numerics: NumericalParameters,
}

impl ModelParameters {
    /// Default numerics with the given flow-law coefficients (both in per-second units).
    pub fn with_flow(glen_a: FloatValue, fs: FloatValue) -> Self {
        Self {
            flow: FlowParameters {
                glen_a,
                fs,
                ..FlowParameters::default()
            },
            numerics: NumericalParameters::default(),
        }
    }

    pub fn validate(&self) -> RSGMResult<()> {
        self.flow.validate()?;
        self.numerics.validate()
    }
}
