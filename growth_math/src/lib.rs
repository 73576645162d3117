//! # Growth Math
//!
//! Numerical helpers shared by the debt/growth analysis.
//! This crate provides NaN-aware descriptive statistics, goodness-of-fit
//! scores and the compounding used to turn growth rates into indices.

use thiserror::Error;

pub mod growth;
pub mod statistics;

pub use growth::{cumulative_growth_index, growth_factor};
pub use statistics::{linspace, mean, mean_squared_error, r2_score, sample_std, z_scores};

/// Errors that can occur in statistical calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for growth math operations
pub type Result<T> = std::result::Result<T, MathError>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
