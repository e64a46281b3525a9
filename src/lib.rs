//! Reduced-complexity flowline glacier model.
//!
//! The numerical engine lives in [`rsgm_core`] and is re-exported here. Building with the
//! `python` feature adds the `rsgm._lib` extension module.

pub use rsgm_core::*;

#[cfg(feature = "python")]
mod python;
