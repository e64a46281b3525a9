//! Physical constants and unit conversion factors.
//!
//! The engine works in metres and years. Flow-law coefficients are quoted in the
//! literature per second, so they are converted on the way in.

use crate::FloatValue;

/// Seconds in a (Julian) year.
pub const SEC_IN_YEAR: FloatValue = 365.25 * SEC_IN_DAY;

/// Seconds in a day.
pub const SEC_IN_DAY: FloatValue = 86400.0;

/// Gravitational acceleration ($\text{m s}^{-2}$).
pub const GRAVITY: FloatValue = 9.81;

/// Exponent of Glen's flow law.
///
/// Fixed property of the flow law, not a tunable parameter.
pub const GLEN_N: i32 = 3;

/// Reference ice creep parameter $A$ ($\text{s}^{-1}\,\text{Pa}^{-3}$) for temperate ice.
pub const GLEN_A_REFERENCE: FloatValue = 2.4e-24;

/// Reference basal sliding parameter $f_s$ ($\text{s}^{-1}\,\text{Pa}^{-3}\,\text{m}^2$)
/// used when sliding is switched on.
pub const SLIDING_FS_REFERENCE: FloatValue = 5.7e-20;

/// Density of glacier ice ($\text{kg m}^{-3}$).
pub const ICE_DENSITY: FloatValue = 900.0;

/// Thickness (m) above which a grid point counts as glacierised when measuring length.
pub const ICE_TOLERANCE: FloatValue = 1e-6;
