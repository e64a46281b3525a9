//! Basic model tests: building, clock handling, re-instantiation, serialisation.

use super::{linear_bed, model_with_gradient};
use crate::errors::RSGMError;
use crate::mass_balance::LinearMassBalance;
use crate::model::{FlowlineModel, ModelBuilder};
use crate::parameters::ModelParameters;
use approx::assert_relative_eq;
use std::sync::Arc;

#[test]
fn build_ice_free_model() {
    let model = model_with_gradient(50, 4.0);

    assert_eq!(model.year(), 0.0);
    assert_eq!(model.length(), 0.0);
    assert_eq!(model.area(), 0.0);
    assert_eq!(model.volume(), 0.0);
    assert_eq!(model.thickness().len(), 50);
    assert_eq!(model.velocities().len(), 49);
    assert_eq!(model.specific_mass_balance(), 0.0);
    assert_eq!(model.surface_elevation(), model.bed_elevation());
}

#[test]
fn builder_requires_geometry_and_mass_balance() {
    let err = ModelBuilder::new()
        .with_mass_balance(Arc::new(LinearMassBalance::new(3000.0, 4.0).unwrap()))
        .build()
        .unwrap_err();
    assert!(matches!(err, RSGMError::MissingBuilderInput(ref name) if name == "geometry"));

    let err = ModelBuilder::new()
        .with_geometry(linear_bed(10))
        .build()
        .unwrap_err();
    assert!(matches!(err, RSGMError::MissingBuilderInput(_)));
    assert!(err.is_configuration_error());
}

#[test]
fn builder_validates_parameters() {
    let err = ModelBuilder::new()
        .with_geometry(linear_bed(10))
        .with_mass_balance(Arc::new(LinearMassBalance::new(3000.0, 4.0).unwrap()))
        .with_glen_a(-1.0)
        .build()
        .unwrap_err();
    assert!(matches!(err, RSGMError::InvalidParameter { ref name, .. } if name == "glen_a"));

    let err = ModelBuilder::new()
        .with_geometry(linear_bed(10))
        .with_mass_balance(Arc::new(LinearMassBalance::new(3000.0, 4.0).unwrap()))
        .with_start_year(f64::NAN)
        .build()
        .unwrap_err();
    assert!(matches!(err, RSGMError::InvalidParameter { ref name, .. } if name == "start_year"));
}

#[test]
fn builder_is_reusable() {
    let mut builder = ModelBuilder::new();
    builder
        .with_geometry(linear_bed(10))
        .with_mass_balance(Arc::new(LinearMassBalance::new(3000.0, 4.0).unwrap()))
        .with_start_year(1850.0)
        .with_fs(5.7e-20);

    let first = builder.build().unwrap();
    let second = builder.build().unwrap();
    assert_eq!(first.year(), 1850.0);
    assert_eq!(second.year(), 1850.0);
    assert_eq!(first.parameters().flow.fs, 5.7e-20);
}

#[test]
fn clock_lands_on_target() {
    let mut model = model_with_gradient(50, 4.0);

    model.run_until(0.37).unwrap();
    assert_eq!(model.year(), 0.37);

    model.run_until(12.0).unwrap();
    assert_eq!(model.year(), 12.0);
    assert!(model.volume() > 0.0);
}

#[test]
fn no_time_travel() {
    let mut model = model_with_gradient(50, 4.0);
    model.run_until(20.0).unwrap();
    let thickness = model.thickness();

    model.run_until(10.0).unwrap();
    assert_eq!(model.year(), 20.0);
    assert_eq!(model.thickness(), thickness);
}

#[test]
fn repeated_target_is_idempotent() {
    let mut model = model_with_gradient(50, 4.0);
    model.run_until(30.0).unwrap();
    let (length, area, volume) = (model.length(), model.area(), model.volume());

    model.run_until(30.0).unwrap();
    assert_eq!(model.year(), 30.0);
    assert_eq!(model.length(), length);
    assert_eq!(model.area(), area);
    assert_eq!(model.volume(), volume);
}

#[test]
fn non_finite_target_is_rejected() {
    let mut model = model_with_gradient(10, 4.0);
    let err = model.run_until(f64::INFINITY).unwrap_err();
    assert!(err.is_configuration_error());
    assert_eq!(model.year(), 0.0);
}

#[test]
fn zero_gradient_stays_ice_free() {
    let mut model = model_with_gradient(50, 0.0);
    model.run_until(100.0).unwrap();

    assert_eq!(model.volume(), 0.0);
    assert!(model.thickness().iter().all(|&h| h == 0.0));
}

#[test]
fn thickness_is_never_negative() {
    let mut model = model_with_gradient(50, 4.0);
    for year in [1.0, 10.0, 50.0, 100.0] {
        model.run_until(year).unwrap();
        assert!(model.thickness().iter().all(|&h| h >= 0.0));
    }

    // Raise the ELA above the whole glacier so it melts away
    let warm = Arc::new(LinearMassBalance::new(4000.0, 4.0).unwrap());
    let mut model = model.with_mass_balance(warm);
    for year in [110.0, 150.0, 200.0] {
        model.run_until(year).unwrap();
        assert!(model.thickness().iter().all(|&h| h >= 0.0));
        assert!(model
            .surface_elevation()
            .iter()
            .zip(model.bed_elevation().iter())
            .all(|(s, b)| s >= b));
    }
}

#[test]
fn with_mass_balance_keeps_state() {
    let mut model = model_with_gradient(50, 4.0);
    model.run_until(40.0).unwrap();
    let thickness = model.thickness();

    let model = model.with_mass_balance(Arc::new(LinearMassBalance::new(2800.0, 4.0).unwrap()));
    assert_eq!(model.year(), 40.0);
    assert_eq!(model.thickness(), thickness);
    assert_eq!(model.mass_balance().ela(), 2800.0);
}

#[test]
fn with_parameters_keeps_state_and_validates() {
    let mut model = model_with_gradient(50, 4.0);
    model.run_until(40.0).unwrap();
    let volume = model.volume();

    let model = model
        .with_parameters(ModelParameters::with_flow(4.8e-24, 0.0))
        .unwrap();
    assert_eq!(model.year(), 40.0);
    assert_eq!(model.volume(), volume);
    assert_eq!(model.parameters().flow.glen_a, 4.8e-24);

    let err = model
        .with_parameters(ModelParameters::with_flow(2.4e-24, -1.0))
        .unwrap_err();
    assert!(matches!(err, RSGMError::InvalidParameter { .. }));
}

#[test]
fn into_geometry_returns_evolved_state() {
    let mut model = model_with_gradient(50, 4.0);
    model.run_until(25.0).unwrap();
    let volume = model.volume();

    let geometry = model.into_geometry();
    assert_eq!(geometry.volume(), volume);
}

#[test]
fn run_until_and_store_samples() {
    let mut model = model_with_gradient(50, 4.0);
    let history = model.run_until_and_store(50.0, 10.0).unwrap();

    assert_eq!(history.years, vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0]);
    assert_eq!(history.len(), 6);
    assert_eq!(history.volume[0], 0.0);
    assert_eq!(*history.volume.last().unwrap(), model.volume());
    assert!(history.volume.windows(2).all(|w| w[1] >= w[0]));
    assert_eq!(model.year(), 50.0);

    // Interval that does not divide the run
    let history = model.run_until_and_store(57.0, 5.0).unwrap();
    assert_eq!(history.years, vec![50.0, 55.0, 57.0]);

    let err = model.run_until_and_store(60.0, 0.0).unwrap_err();
    assert!(err.is_configuration_error());
}

#[test]
fn serialise_and_resume() {
    let mut model = model_with_gradient(50, 4.0);
    model.run_until(30.0).unwrap();

    let serialised = serde_json::to_string(&model).unwrap();
    assert!(serialised.contains("\"type\":\"LinearMassBalance\""));
    let mut restored: FlowlineModel = serde_json::from_str(&serialised).unwrap();
    assert_eq!(restored.year(), 30.0);
    assert_eq!(restored.thickness(), model.thickness());

    model.run_until(40.0).unwrap();
    restored.run_until(40.0).unwrap();
    assert_eq!(restored.volume(), model.volume());
}

#[test]
fn deserialising_invalid_model_is_an_error() {
    let model = model_with_gradient(4, 4.0);
    let mut value = serde_json::to_value(&model).unwrap();
    value["geometry"]["widths"] = serde_json::to_value(ndarray::array![300.0, -300.0]).unwrap();
    assert!(serde_json::from_value::<FlowlineModel>(value).is_err());

    let mut value = serde_json::to_value(&model).unwrap();
    value["parameters"]["numerics"]["cfl_safety_factor"] = serde_json::json!(5.0);
    assert!(serde_json::from_value::<FlowlineModel>(value).is_err());

    let mut value = serde_json::to_value(&model).unwrap();
    value["year"] = serde_json::json!(null);
    assert!(serde_json::from_value::<FlowlineModel>(value).is_err());
}

#[test]
fn start_year_does_not_change_the_evolution() {
    let mut from_zero = model_with_gradient(50, 4.0);
    let mut late = ModelBuilder::new()
        .with_geometry(linear_bed(50))
        .with_mass_balance(Arc::new(LinearMassBalance::new(3000.0, 4.0).unwrap()))
        .with_start_year(1e9)
        .build()
        .unwrap();

    from_zero.run_until(50.0).unwrap();
    late.run_until(1e9 + 50.0).unwrap();

    assert_eq!(late.year(), 1e9 + 50.0);
    assert_relative_eq!(late.volume(), from_zero.volume(), max_relative = 1e-4);
}

#[test]
fn stalled_clock_is_an_instability() {
    // At this year a 31 day step is below the floating point resolution of the clock
    let mut model = ModelBuilder::new()
        .with_geometry(linear_bed(10))
        .with_mass_balance(Arc::new(LinearMassBalance::new(3000.0, 4.0).unwrap()))
        .with_start_year(1e20)
        .build()
        .unwrap();

    let err = model.run_until(1e20 + 1e6).unwrap_err();
    assert!(matches!(err, RSGMError::NumericalInstability { .. }));
    assert!(!err.is_configuration_error());
    assert_eq!(model.year(), 1e20);
}
