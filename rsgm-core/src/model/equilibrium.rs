//! Spin-up to a dynamic steady state.

use crate::errors::{RSGMError, RSGMResult};
use crate::{FloatValue, Time};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::runtime::FlowlineModel;

/// Volumes below this (in $\text{m}^3$) are treated as an ice-free glacier when
/// computing relative volume changes.
const VOLUME_ATOL: FloatValue = 1.0;

/// Settings for [`FlowlineModel::run_until_equilibrium`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquilibriumSettings {
    /// Relative volume change per probe below which the glacier is in equilibrium.
    /// Default: 0.001
    pub rate_threshold: FloatValue,
    /// Length of each probe (yr).
    /// Default: 5.0
    pub max_years_per_probe: Time,
    /// Maximum number of probes before giving up.
    /// Default: 200
    pub max_probes: usize,
}

impl Default for EquilibriumSettings {
    fn default() -> Self {
        Self {
            rate_threshold: 0.001,
            max_years_per_probe: 5.0,
            max_probes: 200,
        }
    }
}

/// Result of an equilibrium search.
///
/// A search that runs out of probes is not an error: the model keeps the state it
/// reached and `converged` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumReport {
    pub converged: bool,
    /// Number of probes run
    pub probes: usize,
    /// Model year when the search stopped
    pub year: Time,
    /// Relative volume change over the last probe
    pub relative_change: FloatValue,
}

/// Relative volume change between two probes.
///
/// An ice-free glacier that stays ice-free has a rate of zero; one that starts
/// ice-free and gains ice has a rate of one.
fn relative_volume_change(before: FloatValue, after: FloatValue) -> FloatValue {
    if before.abs() <= VOLUME_ATOL {
        if after.abs() <= VOLUME_ATOL {
            0.0
        } else {
            1.0
        }
    } else {
        (after - before).abs() / before
    }
}

impl FlowlineModel {
    /// Advance the model until its volume stops changing.
    ///
    /// The model is advanced in probes of `max_years_per_probe` years. After each probe
    /// the relative volume change $|V_{after} - V_{before}| / V_{before}$ is compared with
    /// `rate_threshold`.
    ///
    /// # Errors
    ///
    /// A configuration error for a non-positive threshold or probe length or zero probes,
    /// and any error raised while stepping. Running out of probes is reported through
    /// [`EquilibriumReport::converged`] and a logged warning instead.
    pub fn run_until_equilibrium(
        &mut self,
        rate_threshold: FloatValue,
        max_years_per_probe: Time,
        max_probes: usize,
    ) -> RSGMResult<EquilibriumReport> {
        if !rate_threshold.is_finite() || rate_threshold <= 0.0 {
            return Err(RSGMError::invalid_parameter(
                "rate_threshold",
                rate_threshold,
                "Threshold must be positive",
            ));
        }
        if !max_years_per_probe.is_finite() || max_years_per_probe <= 0.0 {
            return Err(RSGMError::invalid_parameter(
                "max_years_per_probe",
                max_years_per_probe,
                "Probe length must be positive",
            ));
        }
        if max_probes == 0 {
            return Err(RSGMError::invalid_parameter(
                "max_probes",
                0.0,
                "At least one probe is needed",
            ));
        }

        let mut relative_change = FloatValue::INFINITY;
        for probe in 1..=max_probes {
            let before = self.volume();
            self.run_until(self.year() + max_years_per_probe)?;
            relative_change = relative_volume_change(before, self.volume());

            if relative_change < rate_threshold {
                info!(
                    "Equilibrium reached at year {} after {} probes (relative change {:.3e})",
                    self.year(),
                    probe,
                    relative_change
                );
                return Ok(EquilibriumReport {
                    converged: true,
                    probes: probe,
                    year: self.year(),
                    relative_change,
                });
            }
        }

        warn!(
            "No equilibrium after {} probes of {} years (year {}, relative change {:.3e} >= {})",
            max_probes,
            max_years_per_probe,
            self.year(),
            relative_change,
            rate_threshold
        );
        Ok(EquilibriumReport {
            converged: false,
            probes: max_probes,
            year: self.year(),
            relative_change,
        })
    }

    /// [`run_until_equilibrium`](Self::run_until_equilibrium) using a settings struct.
    pub fn run_until_equilibrium_with(
        &mut self,
        settings: &EquilibriumSettings,
    ) -> RSGMResult<EquilibriumReport> {
        self.run_until_equilibrium(
            settings.rate_threshold,
            settings.max_years_per_probe,
            settings.max_probes,
        )
    }
}
