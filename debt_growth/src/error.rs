//! Error types for the debt_growth crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the debt_growth crate
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Error related to panel contents or source payloads
    #[error("Data error: {0}")]
    DataError(String),

    /// Error while talking to the indicator source
    #[error("Fetch error: {0}")]
    FetchError(#[from] reqwest::Error),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from an invalid analysis configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Nonlinear least squares did not produce a usable fit
    #[error("Curve fit failed after {evaluations} evaluations: {reason}")]
    CurveFitError { evaluations: usize, reason: String },

    /// Maximum-likelihood estimation did not converge
    #[error("Estimation failed: {0}")]
    EstimationError(String),

    /// Covariate path and forecast horizon disagree
    #[error("Shape mismatch: expected {expected} rows, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    /// Error from mathematical operations
    #[error("Math error: {0}")]
    MathError(#[from] growth_math::MathError),

    /// Error while rendering a chart
    #[error("Plot error: {0}")]
    PlotError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from JSON decoding
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from TOML decoding
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, AnalysisError>;

impl From<PolarsError> for AnalysisError {
    fn from(err: PolarsError) -> Self {
        AnalysisError::PolarsError(err.to_string())
    }
}
