//! Mass conservation of the flowline scheme.
//!
//! With a uniform positive mass balance nothing is ever clamped, so the only source of
//! volume is the surface forcing and ice transport must conserve mass exactly.

use approx::assert_relative_eq;
use rsgm_core::constants::ICE_DENSITY;
use rsgm_core::geometry::GeometryProfile;
use rsgm_core::mass_balance::LinearMassBalance;
use rsgm_core::model::ModelBuilder;
use std::sync::Arc;

#[test]
fn test_volume_equals_accumulated_mass() {
    let geometry = GeometryProfile::linear(3400.0, 1400.0, 100, 100.0, 300.0).unwrap();
    // ELA below the bed and a cap below the smallest value: 1000 mm w.e./yr everywhere
    let mb = LinearMassBalance::new(0.0, 4.0)
        .unwrap()
        .with_max_mb(1000.0)
        .unwrap();
    let mut model = ModelBuilder::new()
        .with_geometry(geometry)
        .with_mass_balance(Arc::new(mb))
        .build()
        .unwrap();

    let glacier_area = 100.0 * 100.0 * 300.0;
    let rate = 1000.0 / ICE_DENSITY;
    for year in [1.0, 10.0, 50.0] {
        model.run_until(year).unwrap();
        assert_relative_eq!(model.volume(), year * rate * glacier_area, max_relative = 1e-9);
    }
    assert_relative_eq!(model.area(), glacier_area);
}

#[test]
fn test_transport_conserves_volume_without_forcing() {
    // A lump of ice near the head spreads out without gaining or losing mass
    let bed = ndarray::Array1::linspace(3000.0, 2500.0, 50);
    let mut surface = bed.clone();
    for i in 0..10 {
        surface[i] += 100.0;
    }
    let geometry =
        GeometryProfile::new(bed, surface, ndarray::Array1::from_elem(50, 200.0), 100.0).unwrap();
    let initial_volume = geometry.volume();

    let mut model = ModelBuilder::new()
        .with_geometry(geometry)
        .with_mass_balance(Arc::new(LinearMassBalance::new(3000.0, 0.0).unwrap()))
        .build()
        .unwrap();
    model.run_until(10.0).unwrap();

    assert_relative_eq!(model.volume(), initial_volume, max_relative = 1e-9);
    assert!(model.length() > 10.0 * 100.0);
}

#[test]
fn test_zero_width_cell_blocks_flow_without_losing_ice() {
    let bed = ndarray::Array1::linspace(3000.0, 2500.0, 6);
    let mut surface = bed.clone();
    surface[0] += 100.0;
    surface[1] += 100.0;
    let widths = ndarray::array![200.0, 200.0, 0.0, 200.0, 200.0, 200.0];
    let geometry = GeometryProfile::new(bed, surface, widths, 100.0).unwrap();
    let initial_volume = geometry.volume();

    let mut model = ModelBuilder::new()
        .with_geometry(geometry)
        .with_mass_balance(Arc::new(LinearMassBalance::new(3000.0, 0.0).unwrap()))
        .build()
        .unwrap();
    model.run_until(20.0).unwrap();

    assert_relative_eq!(model.volume(), initial_volume, max_relative = 1e-9);
    assert!(model.thickness().iter().skip(2).all(|&h| h == 0.0));
}
