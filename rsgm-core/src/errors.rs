use crate::FloatValue;
use thiserror::Error;

/// Error type for invalid model setups and failed integrations.
///
/// Configuration variants are raised while a model is being built and mean the inputs
/// were malformed. [`RSGMError::NumericalInstability`] is raised while stepping and
/// means the inputs were well-formed but the parameters or grid resolution cannot be
/// integrated by the explicit scheme.
#[derive(Error, Debug)]
pub enum RSGMError {
    #[error("Profile length mismatch. {name} has {actual} points, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("A flowline needs at least {minimum} grid points, got {actual}")]
    TooFewPoints { minimum: usize, actual: usize },
    #[error("Grid spacing must be positive and finite, got {0}")]
    InvalidGridSpacing(FloatValue),
    #[error("Invalid {name} at grid point {index}: {value}. {reason}")]
    InvalidProfileValue {
        name: String,
        index: usize,
        value: FloatValue,
        reason: String,
    },
    #[error("Invalid parameter {name}={value}. {reason}")]
    InvalidParameter {
        name: String,
        value: FloatValue,
        reason: String,
    },
    #[error("Model builder is missing a {0}")]
    MissingBuilderInput(String),
    #[error("Could not read experiment configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not parse experiment configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("Numerical instability at year {year} after {retries} timestep reductions: {reason}")]
    NumericalInstability {
        year: FloatValue,
        retries: usize,
        reason: String,
    },
}

impl RSGMError {
    /// Whether this error was caused by malformed inputs rather than by the integration
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, RSGMError::NumericalInstability { .. })
    }

    pub(crate) fn invalid_parameter(
        name: &str,
        value: FloatValue,
        reason: impl Into<String>,
    ) -> Self {
        RSGMError::InvalidParameter {
            name: name.to_string(),
            value,
            reason: reason.into(),
        }
    }
}

/// Convenience type for `Result<T, RSGMError>`.
pub type RSGMResult<T> = Result<T, RSGMError>;
