//! Core numerics for reduced-complexity flowline glacier models.
//!
//! A [`FlowlineModel`](model::FlowlineModel) evolves the ice thickness along a single
//! glacier centreline under a shallow-ice flow law, forced by an elevation-dependent
//! surface mass balance. Models are built once from a geometry, a mass-balance model and
//! a set of parameters, then advanced with `run_until` or `run_until_equilibrium`.

pub mod config;
pub mod constants;
pub mod errors;
pub mod flow_law;
pub mod geometry;
pub mod history;
pub mod mass_balance;
pub mod model;
pub mod parameters;
pub mod stepper;

/// Floating point type used for all physical quantities
pub type FloatValue = f64;

/// Simulation time in years
pub type Time = f64;
