//! Experiment configuration
//!
//! An [`ExperimentConfig`] describes a complete idealised experiment in TOML: the bed,
//! the mass balance and any parameter overrides. Omitted tables and fields take their
//! default values.
//!
//! ```toml
//! start_year = 0.0
//!
//! [bed]
//! shape = "linear"
//! top = 3400.0
//! bottom = 1400.0
//! n_points = 200
//! dx = 100.0
//! width = 300.0
//!
//! [mass_balance]
//! ela_h = 3000.0
//! grad = 4.0
//!
//! [parameters.flow]
//! glen_a = 2.4e-24
//! ```

use crate::errors::RSGMResult;
use crate::geometry::GeometryProfile;
use crate::mass_balance::LinearMassBalance;
use crate::model::{EquilibriumSettings, FlowlineModel};
use crate::parameters::ModelParameters;
use crate::{FloatValue, Time};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Bed description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum BedConfig {
    /// Linearly descending bed of constant width
    Linear {
        top: FloatValue,
        bottom: FloatValue,
        n_points: usize,
        dx: FloatValue,
        width: FloatValue,
    },
    /// Explicit bed and width profiles.
    ///
    /// Without a surface the glacier starts ice-free.
    Profile {
        bed: Vec<FloatValue>,
        widths: Vec<FloatValue>,
        dx: FloatValue,
        #[serde(default)]
        surface: Option<Vec<FloatValue>>,
    },
}

impl BedConfig {
    pub fn to_geometry(&self) -> RSGMResult<GeometryProfile> {
        match self {
            BedConfig::Linear {
                top,
                bottom,
                n_points,
                dx,
                width,
            } => GeometryProfile::linear(*top, *bottom, *n_points, *dx, *width),
            BedConfig::Profile {
                bed,
                widths,
                dx,
                surface,
            } => {
                let bed = Array1::from_vec(bed.clone());
                let widths = Array1::from_vec(widths.clone());
                match surface {
                    Some(surface) => {
                        GeometryProfile::new(bed, Array1::from_vec(surface.clone()), widths, *dx)
                    }
                    None => GeometryProfile::from_bed(bed, widths, *dx),
                }
            }
        }
    }
}

/// Linear mass-balance settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassBalanceConfig {
    /// Equilibrium line altitude (m)
    pub ela_h: FloatValue,
    /// Mass-balance gradient ($\text{mm w.e. m}^{-1}\,\text{yr}^{-1}$)
    pub grad: FloatValue,
    /// Maximum accumulation ($\text{mm w.e. yr}^{-1}$)
    #[serde(default)]
    pub max_mb: Option<FloatValue>,
}

impl MassBalanceConfig {
    pub fn to_model(&self) -> RSGMResult<LinearMassBalance> {
        let mb = LinearMassBalance::new(self.ela_h, self.grad)?;
        match self.max_mb {
            Some(cap) => mb.with_max_mb(cap),
            None => Ok(mb),
        }
    }
}

/// A complete idealised experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub start_year: Time,
    pub bed: BedConfig,
    pub mass_balance: MassBalanceConfig,
    #[serde(default)]
    pub parameters: ModelParameters,
    #[serde(default)]
    pub equilibrium: EquilibriumSettings,
}

impl ExperimentConfig {
    pub fn from_toml_str(content: &str) -> RSGMResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> RSGMResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Build the model described by this experiment.
    ///
    /// # Errors
    ///
    /// Any configuration error raised while constructing the geometry, the mass balance
    /// or the model.
    pub fn build(&self) -> RSGMResult<FlowlineModel> {
        let geometry = self.bed.to_geometry()?;
        let mass_balance = self.mass_balance.to_model()?;
        FlowlineModel::new(
            geometry,
            Arc::new(mass_balance),
            self.parameters.clone(),
            self.start_year,
        )
    }
}
