//! Debt-service scenarios
//!
//! Each scenario holds the debt variable at a fixed level over the horizon
//! while every other regressor stays at the forecast economy's historical
//! mean. Forecast growth is compounded into a cumulative index and the
//! indices are tabulated by calendar year.

use crate::config::{AnalysisConfig, ScenarioSpec};
use crate::error::{AnalysisError, Result};
use crate::models::{ForecastResult, TrainedForecastModel};
use crate::panel::{IndicatorPanel, YEAR_COLUMN};
use polars::prelude::*;
use std::fmt;
use tracing::{debug, info};

/// One scenario's inputs, fixed at construction
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioRecord {
    name: String,
    /// Economy whose history the forecast continues
    economy: String,
    /// Level the debt variable is held at
    debt_service: f64,
    /// Regressor names in coefficient order
    regressors: Vec<String>,
    /// Historical means, aligned with `regressors`
    baseline: Vec<f64>,
    /// Position of the debt variable in `regressors`
    debt_position: usize,
    horizon: usize,
}

impl ScenarioRecord {
    /// Create a new scenario record
    pub fn new(
        spec: &ScenarioSpec,
        economy: &str,
        regressors: &[String],
        baseline: Vec<f64>,
        debt_variable: &str,
        horizon: usize,
    ) -> Result<Self> {
        if horizon == 0 {
            return Err(AnalysisError::ConfigError(
                "Forecast horizon must be at least one period".to_string(),
            ));
        }
        if baseline.len() != regressors.len() {
            return Err(AnalysisError::ShapeMismatch {
                expected: regressors.len(),
                found: baseline.len(),
            });
        }
        let debt_position = regressors
            .iter()
            .position(|r| r == debt_variable)
            .ok_or_else(|| {
                AnalysisError::ConfigError(format!(
                    "Debt variable '{}' is not a regressor",
                    debt_variable
                ))
            })?;

        Ok(Self {
            name: spec.name.clone(),
            economy: economy.to_string(),
            debt_service: spec.debt_service,
            regressors: regressors.to_vec(),
            baseline,
            debt_position,
            horizon,
        })
    }

    /// Record for the configured forecast economy, baseline from the panel
    pub fn from_panel(
        spec: &ScenarioSpec,
        panel: &IndicatorPanel,
        config: &AnalysisConfig,
    ) -> Result<Self> {
        let baseline = config
            .exogenous
            .iter()
            .map(|column| panel.economy_mean(&config.forecast_economy, column))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            scenario = %spec.name,
            economy = %config.forecast_economy,
            ?baseline,
            "historical covariate means"
        );

        Self::new(
            spec,
            &config.forecast_economy,
            &config.exogenous,
            baseline,
            &config.debt_variable,
            config.forecast_horizon,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn economy(&self) -> &str {
        &self.economy
    }

    pub fn debt_service(&self) -> f64 {
        self.debt_service
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn baseline(&self) -> &[f64] {
        &self.baseline
    }

    pub fn regressors(&self) -> &[String] {
        &self.regressors
    }

    /// Regressor rows for every forecast period
    pub fn covariate_path(&self) -> Vec<Vec<f64>> {
        let mut row = self.baseline.clone();
        row[self.debt_position] = self.debt_service;
        vec![row; self.horizon]
    }
}

/// Forecast growth of one scenario and its cumulative index
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioForecast {
    name: String,
    years: Vec<i32>,
    growth: Vec<f64>,
    index: Vec<f64>,
}

impl ScenarioForecast {
    /// Label a forecast with calendar years starting at `start_year`
    pub fn new(name: &str, start_year: i32, forecast: &ForecastResult) -> Self {
        let years = (0..forecast.horizons()).map(|h| start_year + h as i32).collect();

        Self {
            name: name.to_string(),
            years,
            growth: forecast.values().to_vec(),
            index: forecast.cumulative_index(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Forecast growth rates in percent
    pub fn growth(&self) -> &[f64] {
        &self.growth
    }

    /// Cumulative growth index, base 1.0
    pub fn index(&self) -> &[f64] {
        &self.index
    }
}

/// Forecast one scenario from the end of its economy's history
pub fn forecast_scenario<M: TrainedForecastModel>(
    model: &M,
    record: &ScenarioRecord,
    start_year: i32,
) -> Result<ScenarioForecast> {
    let forecast =
        model.forecast_group(record.economy(), record.horizon(), &record.covariate_path())?;
    Ok(ScenarioForecast::new(record.name(), start_year, &forecast))
}

/// Cumulative indices of all scenarios, one row per forecast year
#[derive(Debug, Clone)]
pub struct ScenarioTable {
    df: DataFrame,
    forecasts: Vec<ScenarioForecast>,
}

impl ScenarioTable {
    /// Tabulate forecasts that share the same years
    pub fn new(forecasts: Vec<ScenarioForecast>) -> Result<Self> {
        let first = forecasts.first().ok_or_else(|| {
            AnalysisError::ValidationError("No scenario forecasts to tabulate".to_string())
        })?;
        let years = first.years().to_vec();

        let mut columns = vec![Series::new(YEAR_COLUMN, years.clone())];
        for forecast in &forecasts {
            if forecast.years() != years.as_slice() {
                return Err(AnalysisError::ShapeMismatch {
                    expected: years.len(),
                    found: forecast.years().len(),
                });
            }
            columns.push(Series::new(forecast.name(), forecast.index().to_vec()));
        }

        Ok(Self {
            df: DataFrame::new(columns)?,
            forecasts,
        })
    }

    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn forecasts(&self) -> &[ScenarioForecast] {
        &self.forecasts
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn years(&self) -> Result<Vec<i32>> {
        self.df
            .column(YEAR_COLUMN)?
            .i32()?
            .into_iter()
            .map(|y| y.ok_or_else(|| AnalysisError::DataError("Missing year".to_string())))
            .collect()
    }

    /// Cumulative index column of one scenario
    pub fn column(&self, scenario: &str) -> Result<Vec<f64>> {
        let series = self.df.column(scenario).map_err(|e| {
            AnalysisError::DataError(format!("Scenario '{}' not found: {}", scenario, e))
        })?;

        Ok(series
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }
}

impl fmt::Display for ScenarioTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}", "year")?;
        for forecast in &self.forecasts {
            write!(f, "{:>14}", forecast.name())?;
        }
        writeln!(f)?;

        for (row, year) in self.forecasts[0].years().iter().enumerate() {
            write!(f, "{:>6}", year)?;
            for forecast in &self.forecasts {
                write!(f, "{:>14.6}", forecast.index()[row])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Forecast every configured scenario and tabulate the indices
pub fn run_scenarios<M: TrainedForecastModel>(
    model: &M,
    panel: &IndicatorPanel,
    config: &AnalysisConfig,
) -> Result<ScenarioTable> {
    let start_year = config.forecast_start_year();

    let forecasts = config
        .scenarios
        .iter()
        .map(|spec| {
            let record = ScenarioRecord::from_panel(spec, panel, config)?;
            let forecast = forecast_scenario(model, &record, start_year)?;
            info!(
                scenario = %record.name(),
                debt_service = record.debt_service(),
                final_index = forecast.index().last().copied().unwrap_or(f64::NAN),
                "scenario forecast"
            );
            Ok(forecast)
        })
        .collect::<Result<Vec<_>>>()?;

    ScenarioTable::new(forecasts)
}
