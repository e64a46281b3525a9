//! Explicit time stepping of ice thickness.
//!
//! A single step solves the mass-conservation equation
//!
//! $$\frac{\partial h}{\partial t} = \dot{b} - \frac{1}{w} \frac{\partial q}{\partial x}$$
//!
//! with a forward-Euler update. The scheme is only conditionally stable, so the timestep
//! is bounded by the diffusive limit and every candidate step is validated before it is
//! committed. A rejected step is retried with a smaller safety factor.

use crate::errors::{RSGMError, RSGMResult};
use crate::flow_law::{FlowLaw, FluxField};
use crate::geometry::GeometryProfile;
use crate::mass_balance::MassBalanceModel;
use crate::parameters::NumericalParameters;
use crate::{FloatValue, Time};
use log::debug;
use ndarray::{Array1, Zip};

/// Outcome of validating a candidate step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepValidity {
    Valid,
    /// The update produced NaN or infinite thickness
    NonFinite { index: usize },
    /// Ice transport alone removed more ice from a cell than it held, by more than the
    /// configured tolerance
    TransportOvershoot { index: usize, excursion: FloatValue },
}

impl StepValidity {
    pub fn is_valid(&self) -> bool {
        matches!(self, StepValidity::Valid)
    }

    fn describe(&self) -> String {
        match self {
            StepValidity::Valid => "valid".to_string(),
            StepValidity::NonFinite { index } => {
                format!("non-finite thickness at grid point {}", index)
            }
            StepValidity::TransportOvershoot { index, excursion } => format!(
                "ice transport drove grid point {} to {:.3} m thickness",
                index, excursion
            ),
        }
    }
}

/// A proposed update of the ice thickness.
#[derive(Debug, Clone)]
pub struct StepCandidate {
    /// Timestep (yr)
    pub dt: Time,
    /// Updated thickness with negative values already clamped to zero (m)
    pub thickness: Array1<FloatValue>,
    pub validity: StepValidity,
}

/// Timestep allowed by the diffusive stability limit.
///
/// $\Delta t = s \Delta x^2 / (2 D_{max})$, bounded to `[min_dt, max_dt]`. When the
/// diffusivity vanishes (for example on an ice-free flowline) `max_dt` is used.
pub fn stable_timestep(
    max_diffusivity: FloatValue,
    dx: FloatValue,
    safety_factor: FloatValue,
    numerics: &NumericalParameters,
) -> Time {
    let limit = if max_diffusivity > 0.0 {
        safety_factor * dx * dx / (2.0 * max_diffusivity)
    } else {
        FloatValue::INFINITY
    };
    limit.min(numerics.max_dt).max(numerics.min_dt)
}

/// Build a candidate step for a given safety factor.
///
/// This is a pure function of the current state: nothing is written to `geometry`.
///
/// # Arguments
///
/// * `geometry` - Current flowline state
/// * `forcing` - Mass balance as a thickness rate at each grid point ($\text{m yr}^{-1}$)
/// * `fluxes` - Flow-law evaluation on the current state
/// * `safety_factor` - Fraction of the stability limit to use
/// * `remaining` - Time left until the target (yr); the step never exceeds it
/// * `numerics` - Timestep bounds and tolerances
pub fn propose_step(
    geometry: &GeometryProfile,
    forcing: &Array1<FloatValue>,
    fluxes: &FluxField,
    safety_factor: FloatValue,
    remaining: Time,
    numerics: &NumericalParameters,
) -> StepCandidate {
    let dx = geometry.dx();
    let dt = stable_timestep(fluxes.max_diffusivity(), dx, safety_factor, numerics).min(remaining);

    let thickness = geometry.thickness();
    let divergence = fluxes.divergence(geometry.widths_view(), dx);

    let mut validity = StepValidity::Valid;
    let mut updated = Array1::zeros(thickness.len());
    Zip::indexed(&mut updated)
        .and(&thickness)
        .and(forcing)
        .and(&divergence)
        .for_each(|index, new_h, &h, &mb, &div| {
            let transported = h - dt * div;
            let value = transported + dt * mb;
            if validity.is_valid() {
                if !value.is_finite() {
                    validity = StepValidity::NonFinite { index };
                } else if transported < -numerics.negative_thickness_tolerance {
                    validity = StepValidity::TransportOvershoot {
                        index,
                        excursion: transported,
                    };
                }
            }
            // Retreat past a grid point is absorbed silently
            *new_h = value.max(0.0);
        });

    StepCandidate {
        dt,
        thickness: updated,
        validity,
    }
}

/// Advance `geometry` by one validated step.
///
/// Evaluates the mass balance and the flow law once, then hands over to
/// [`commit_step`].
///
/// # Returns
///
/// The timestep taken (yr).
///
/// # Errors
///
/// [`RSGMError::NumericalInstability`] if no valid step is found within
/// `numerics.max_retries` retries.
pub fn advance(
    geometry: &mut GeometryProfile,
    mass_balance: &dyn MassBalanceModel,
    flow_law: &FlowLaw,
    numerics: &NumericalParameters,
    year: Time,
    remaining: Time,
) -> RSGMResult<Time> {
    let forcing = mass_balance.annual_rate(geometry.surface_view().view());
    let fluxes = flow_law.evaluate(geometry);
    commit_step(geometry, &forcing, &fluxes, numerics, year, remaining)
}

/// Propose steps with a shrinking safety factor until one is valid, then write it to
/// `geometry`.
///
/// `geometry` is left untouched if every proposal is rejected.
pub fn commit_step(
    geometry: &mut GeometryProfile,
    forcing: &Array1<FloatValue>,
    fluxes: &FluxField,
    numerics: &NumericalParameters,
    year: Time,
    remaining: Time,
) -> RSGMResult<Time> {
    let mut safety_factor = numerics.cfl_safety_factor;
    let mut attempt = 0;
    loop {
        let candidate = propose_step(geometry, forcing, fluxes, safety_factor, remaining, numerics);
        if candidate.validity.is_valid() {
            geometry.set_thickness(&candidate.thickness);
            return Ok(candidate.dt);
        }
        if attempt >= numerics.max_retries {
            return Err(RSGMError::NumericalInstability {
                year,
                retries: attempt,
                reason: candidate.validity.describe(),
            });
        }

        attempt += 1;
        safety_factor *= numerics.retry_shrink_factor;
        debug!(
            "Rejected step at year {:.4} (dt={:.3e} yr): {}. Retrying with safety factor {:.3e}",
            year,
            candidate.dt,
            candidate.validity.describe(),
            safety_factor
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mass_balance::LinearMassBalance;
    use crate::parameters::FlowParameters;
    use is_close::is_close;
    use ndarray::array;

    #[test]
    fn test_timestep_without_ice_uses_max_dt() {
        let numerics = NumericalParameters::default();
        let dt = stable_timestep(0.0, 100.0, 0.5, &numerics);
        assert_eq!(dt, numerics.max_dt);
    }

    #[test]
    fn test_timestep_follows_diffusive_limit() {
        let numerics = NumericalParameters::default();
        // 0.5 * 100^2 / (2 * 1e6) = 0.0025 yr
        let dt = stable_timestep(1e6, 100.0, 0.5, &numerics);
        assert!((dt - 0.0025).abs() < 1e-12);

        let smaller = stable_timestep(1e6, 100.0, 0.25, &numerics);
        assert!(smaller < dt);
    }

    #[test]
    fn test_timestep_floor() {
        let numerics = NumericalParameters::default();
        let dt = stable_timestep(1e30, 100.0, 0.5, &numerics);
        assert_eq!(dt, numerics.min_dt);
    }

    #[test]
    fn test_step_is_clipped_to_remaining_time() {
        let geometry = GeometryProfile::linear(3400.0, 1400.0, 20, 100.0, 300.0).unwrap();
        let mb = LinearMassBalance::new(3000.0, 4.0).unwrap();
        let forcing = mb.annual_rate(geometry.surface_view().view());
        let fluxes = FlowLaw::new(&FlowParameters::default()).evaluate(&geometry);

        let candidate = propose_step(
            &geometry,
            &forcing,
            &fluxes,
            0.5,
            1e-3,
            &NumericalParameters::default(),
        );
        assert_eq!(candidate.dt, 1e-3);
        assert!(candidate.validity.is_valid());
    }

    #[test]
    fn test_ablation_is_clamped_silently() {
        let mut geometry = GeometryProfile::new(
            array![100.0, 90.0],
            array![100.5, 90.0],
            array![10.0, 10.0],
            100.0,
        )
        .unwrap();
        // Strong ablation everywhere
        let mb = LinearMassBalance::new(10_000.0, 10.0).unwrap();
        let numerics = NumericalParameters::default();

        let dt = advance(
            &mut geometry,
            &mb,
            &FlowLaw::new(&FlowParameters::default()),
            &numerics,
            0.0,
            1.0,
        )
        .unwrap();

        assert!(dt > 0.0);
        assert!(geometry.thickness().iter().all(|&h| h == 0.0));
    }

    #[test]
    fn test_transport_overshoot_is_detected() {
        let geometry = GeometryProfile::new(
            array![1000.0, 500.0, 0.0],
            array![1400.0, 500.0, 0.0],
            array![10.0, 10.0, 10.0],
            100.0,
        )
        .unwrap();
        let fluxes = FluxField {
            // Remove 100 km of ice per year from the head
            flux: array![0.0, 1e8, 1e8, 0.0],
            diffusivity: array![0.0, 0.0],
            velocity: array![0.0, 0.0],
        };
        let forcing = Array1::zeros(3);

        let candidate = propose_step(
            &geometry,
            &forcing,
            &fluxes,
            0.5,
            1.0,
            &NumericalParameters::default(),
        );

        assert!(matches!(
            candidate.validity,
            StepValidity::TransportOvershoot { index: 0, .. }
        ));
        assert!(candidate.thickness.iter().all(|&h| h >= 0.0));
    }

    #[test]
    fn test_rejected_step_succeeds_with_smaller_safety_factor() {
        let mut geometry = GeometryProfile::new(
            array![1000.0, 500.0, 0.0],
            array![1400.0, 500.0, 0.0],
            array![10.0, 10.0, 10.0],
            100.0,
        )
        .unwrap();
        // dt = s * 100^2 / (2 * 4e5): 6.25e-3 yr removes 625 m from the head at s = 0.5,
        // 3.125e-3 yr removes 312.5 m at s = 0.25
        let fluxes = FluxField {
            flux: array![0.0, 1e8, 1e8, 0.0],
            diffusivity: array![4e5, 0.0],
            velocity: array![0.0, 0.0],
        };
        let forcing = Array1::zeros(3);
        let numerics = NumericalParameters::default();

        let first = propose_step(&geometry, &forcing, &fluxes, 0.5, 1.0, &numerics);
        assert!(!first.validity.is_valid());

        let dt = commit_step(&mut geometry, &forcing, &fluxes, &numerics, 0.0, 1.0).unwrap();
        assert!(is_close!(dt, 3.125e-3), "dt = {}", dt);
        assert!(is_close!(geometry.thickness()[0], 87.5));
        assert!(is_close!(geometry.thickness()[2], 312.5));
    }

    #[test]
    fn test_rejected_steps_leave_geometry_untouched() {
        let mut geometry = GeometryProfile::new(
            array![1000.0, 500.0, 0.0],
            array![1400.0, 500.0, 0.0],
            array![10.0, 10.0, 10.0],
            100.0,
        )
        .unwrap();
        let before = geometry.clone();
        let fluxes = FluxField {
            flux: array![0.0, 1e8, 1e8, 0.0],
            diffusivity: array![0.0, 0.0],
            velocity: array![0.0, 0.0],
        };
        let numerics = NumericalParameters::default();

        let err = commit_step(&mut geometry, &Array1::zeros(3), &fluxes, &numerics, 5.0, 1.0)
            .unwrap_err();
        assert!(matches!(err, RSGMError::NumericalInstability { retries: 6, .. }));
        assert_eq!(geometry, before);
    }

    #[test]
    fn test_unstable_parameters_raise_instability() {
        // An absurd creep parameter with a timestep floor far above the stability limit
        let params = FlowParameters {
            glen_a: 1e-10,
            ..FlowParameters::default()
        };
        let numerics = NumericalParameters {
            min_dt: 0.05,
            max_retries: 2,
            ..NumericalParameters::default()
        };
        let mut geometry = GeometryProfile::new(
            array![3000.0, 2900.0, 2800.0, 2700.0],
            array![3300.0, 3000.0, 2800.0, 2700.0],
            array![100.0, 100.0, 100.0, 100.0],
            100.0,
        )
        .unwrap();
        let mb = LinearMassBalance::new(3000.0, 0.0).unwrap();

        let err = advance(
            &mut geometry,
            &mb,
            &FlowLaw::new(&params),
            &numerics,
            10.0,
            1.0,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            RSGMError::NumericalInstability { retries: 2, .. }
        ));
        assert!(!err.is_configuration_error());
    }
}
