//! # Debt Growth
//!
//! Sovereign debt service and GDP growth analysis for a panel of economies.
//!
//! ## Features
//!
//! - Indicator acquisition from the World Bank API (or any [`IndicatorSource`])
//! - A cleaned `polars` panel keyed by economy and year, with per-economy
//!   standardization of selected indicators
//! - A quadratic "Laffer curve" of growth on debt service, fitted by
//!   Levenberg–Marquardt, with covariance condition number, MSE and R²
//! - An ARIMAX(1,0,1) growth model estimated by maximum likelihood
//! - Debt-service scenarios forecast with the ARIMAX model and compounded
//!   into cumulative growth indices
//! - SVG charts of the curve and the scenarios
//!
//! ## Quick Start
//!
//! ```no_run
//! use debt_growth::{pipeline, AnalysisConfig, WorldBankClient};
//!
//! let config = AnalysisConfig::default();
//! let client = WorldBankClient::new(config.source.clone())?;
//!
//! let report = pipeline::run(&config, &client)?;
//! println!("{}", report);
//! # Ok::<(), debt_growth::AnalysisError>(())
//! ```
//!
//! Every stage is also callable on its own:
//!
//! ```no_run
//! use debt_growth::pipeline::{acquire_panel, fit_arimax, fit_laffer_curve, run_scenarios};
//! use debt_growth::{AnalysisConfig, WorldBankClient};
//!
//! let config = AnalysisConfig::default();
//! let client = WorldBankClient::new(config.source.clone())?;
//!
//! let panel = acquire_panel(&config, &client)?;
//! let curve = fit_laffer_curve(&panel, &config)?;
//! let model = fit_arimax(&panel, &config)?;
//! let table = run_scenarios(&model, &panel, &config)?;
//!
//! println!("{}\n{}\n{}", curve.diagnostics, model, table);
//! # Ok::<(), debt_growth::AnalysisError>(())
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod panel;
pub mod pipeline;
pub mod plot;
pub mod scenarios;
pub mod source;

// Re-export commonly used types
pub use crate::config::AnalysisConfig;
pub use crate::error::{AnalysisError, Result};
pub use crate::models::{EstimableModel, ForecastResult, TrainedForecastModel};
pub use crate::panel::IndicatorPanel;
pub use crate::pipeline::AnalysisReport;
pub use crate::scenarios::{ScenarioRecord, ScenarioTable};
pub use crate::source::{IndicatorSource, StaticSource, WorldBankClient};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
