//! Statistical models fitted to the indicator panel

use crate::error::{AnalysisError, Result};
use std::fmt::Debug;

pub mod arimax;
pub mod laffer;

/// Forecast result containing predicted values
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    /// Forecasted values
    values: Vec<f64>,
    /// Number of periods forecasted
    horizons: usize,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, horizons: usize) -> Result<Self> {
        if values.len() != horizons {
            return Err(AnalysisError::ShapeMismatch {
                expected: horizons,
                found: values.len(),
            });
        }

        Ok(Self { values, horizons })
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.horizons
    }

    /// Compound the forecasted growth rates into an index starting at 1.0
    pub fn cumulative_index(&self) -> Vec<f64> {
        growth_math::cumulative_growth_index(&self.values)
    }
}

/// Model specification that can be estimated from data
pub trait EstimableModel: Debug + Clone {
    /// Data the model is estimated on
    type Data;
    /// The estimated model produced
    type Fitted;

    /// Estimate the model
    fn fit(&self, data: &Self::Data) -> Result<Self::Fitted>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Estimated model that forecasts conditional on future regressors
pub trait TrainedForecastModel: Debug {
    /// Forecast `horizon` periods given one regressor row per period
    fn forecast(&self, horizon: usize, future: &[Vec<f64>]) -> Result<ForecastResult>;

    /// Forecast continuing the history of one group of a pooled sample
    ///
    /// Models without per-group state forecast every group alike.
    fn forecast_group(
        &self,
        _group: &str,
        horizon: usize,
        future: &[Vec<f64>],
    ) -> Result<ForecastResult> {
        self.forecast(horizon, future)
    }

    /// Name of the model
    fn name(&self) -> &str;
}
