//! Domain error types.

use crate::domain::allocator::SolverStatus;

/// Top-level error type for sharpeopt.
#[derive(Debug, thiserror::Error)]
pub enum PortfolioError {
    #[error("data source error for {asset}: {reason}")]
    DataSource { asset: String, reason: String },

    #[error(
        "insufficient data for {}: have {observations} observations, need {minimum}",
        assets.join(", ")
    )]
    InsufficientData {
        assets: Vec<String>,
        observations: usize,
        minimum: usize,
    },

    #[error("optimization failed after {iterations} iterations ({status}): {message}")]
    OptimizationFailed {
        status: SolverStatus,
        message: String,
        weights: Vec<f64>,
        iterations: usize,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PortfolioError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        PortfolioError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn data_source(asset: &str, reason: impl Into<String>) -> Self {
        PortfolioError::DataSource {
            asset: asset.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&PortfolioError> for std::process::ExitCode {
    fn from(err: &PortfolioError) -> Self {
        let code: u8 = match err {
            PortfolioError::Io(_) | PortfolioError::Report { .. } => 1,
            PortfolioError::ConfigParse { .. }
            | PortfolioError::ConfigMissing { .. }
            | PortfolioError::ConfigInvalid { .. } => 2,
            PortfolioError::DataSource { .. } => 3,
            PortfolioError::InsufficientData { .. } => 4,
            PortfolioError::OptimizationFailed { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
