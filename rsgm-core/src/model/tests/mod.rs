//! Tests for the model module.
//!
//! These cover building models, advancing the clock, re-instantiation and the
//! equilibrium driver.

#[cfg(test)]
mod basic;

use crate::geometry::GeometryProfile;
use crate::mass_balance::LinearMassBalance;
use crate::model::{FlowlineModel, ModelBuilder};
use crate::FloatValue;
use std::sync::Arc;

/// Linear bed from 3400 m to 1400 m over 20 km with a 300 m wide channel.
fn linear_bed(n_points: usize) -> GeometryProfile {
    let dx = 20_000.0 / n_points as FloatValue;
    GeometryProfile::linear(3400.0, 1400.0, n_points, dx, 300.0).unwrap()
}

fn model_with_gradient(n_points: usize, grad: FloatValue) -> FlowlineModel {
    ModelBuilder::new()
        .with_geometry(linear_bed(n_points))
        .with_mass_balance(Arc::new(LinearMassBalance::new(3000.0, grad).unwrap()))
        .build()
        .unwrap()
}
