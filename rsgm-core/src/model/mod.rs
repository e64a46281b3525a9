//! A model couples a flowline geometry to a mass-balance model and advances it in time.
//!
//! The model owns its [`GeometryProfile`](crate::geometry::GeometryProfile) and mutates
//! it in place on every internal timestep. Physical and numerical parameters are fixed
//! for the lifetime of a model. Changing them, or the mass-balance model, produces a new
//! model that takes over the geometry and the clock of the old one.
//!
//! The simulation clock only moves forward. Asking a model to run to a year it has
//! already reached leaves it untouched.

mod builder;
mod equilibrium;
mod runtime;

#[cfg(test)]
mod tests;

// Public re-exports
pub use builder::ModelBuilder;
pub use equilibrium::{EquilibriumReport, EquilibriumSettings};
pub use runtime::FlowlineModel;
