//! Analysis configuration
//!
//! Every constant of the analysis lives here: economies, indicator codes,
//! the sample window and the forecast scenarios. [`AnalysisConfig::default`]
//! reproduces the reference study; a TOML file can override any field.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// A source indicator code and the column name it is renamed to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSpec {
    /// Source code, e.g. `NY.GDP.MKTP.KD.ZG`
    pub code: String,
    /// Column name in the cleaned panel, e.g. `gdp_growth`
    pub name: String,
}

impl IndicatorSpec {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
        }
    }
}

/// Inclusive range of calendar years
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    /// Create a new range, rejecting a start after the end
    pub fn new(start: i32, end: i32) -> Result<Self> {
        if start > end {
            return Err(AnalysisError::ConfigError(format!(
                "Year range start ({}) is after its end ({})",
                start, end
            )));
        }

        Ok(Self { start, end })
    }

    /// Iterate over every year in the range
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }

    /// Number of years in the range
    pub fn len(&self) -> usize {
        if self.start > self.end {
            0
        } else {
            (self.end - self.start + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }
}

/// A hypothetical future debt-service level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub name: String,
    /// Value the debt variable is held at over the forecast horizon
    pub debt_service: f64,
}

impl ScenarioSpec {
    pub fn new(name: &str, debt_service: f64) -> Self {
        Self {
            name: name.to_string(),
            debt_service,
        }
    }
}

/// Grid the fitted curve is drawn over
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveGrid {
    pub start: f64,
    pub end: f64,
    pub points: usize,
}

impl Default for CurveGrid {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 15.0,
            points: 50,
        }
    }
}

/// Settings for the World Bank indicators API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub per_page: usize,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.worldbank.org/v2".to_string(),
            per_page: 1000,
            timeout_secs: 30,
        }
    }
}

/// Full configuration of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// ISO3 codes of the economies in the panel
    pub economies: Vec<String>,
    /// Row order of economies in the cleaned panel
    pub sort_order: Vec<String>,
    pub indicators: Vec<IndicatorSpec>,
    pub year_range: YearRange,
    /// Columns standardized within each economy
    pub normalized: Vec<String>,
    /// Response variable of both models
    pub response: String,
    /// Regressor of the Laffer curve and the variable the scenarios override
    pub debt_variable: String,
    /// Exogenous regressors of the ARIMAX model, in coefficient order
    pub exogenous: Vec<String>,
    pub scenarios: Vec<ScenarioSpec>,
    pub forecast_economy: String,
    pub forecast_horizon: usize,
    pub curve_grid: CurveGrid,
    /// Directory rendered charts are written to
    pub output_dir: PathBuf,
    pub source: SourceConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        Self {
            economies: strings(&["KAZ", "KGZ", "RUS", "BLR"]),
            sort_order: strings(&["BLR", "KGZ", "RUS", "KAZ"]),
            indicators: vec![
                IndicatorSpec::new("NY.GDP.MKTP.KD.ZG", "gdp_growth"),
                IndicatorSpec::new("DT.TDS.DPPF.XP.ZS", "debt_service"),
                IndicatorSpec::new("BN.RES.INCL.CD", "reserves"),
                IndicatorSpec::new("FP.CPI.TOTL.ZG", "cpi"),
                IndicatorSpec::new("NE.EXP.GNFS.ZS", "export"),
            ],
            year_range: YearRange {
                start: 1995,
                end: 2021,
            },
            normalized: strings(&["reserves"]),
            response: "gdp_growth".to_string(),
            debt_variable: "debt_service".to_string(),
            exogenous: strings(&["debt_service", "cpi", "export", "reserves"]),
            scenarios: vec![
                ScenarioSpec::new("optimistic", 6.0),
                ScenarioSpec::new("pessimistic", 10.0),
            ],
            forecast_economy: "KAZ".to_string(),
            forecast_horizon: 10,
            curve_grid: CurveGrid::default(),
            output_dir: PathBuf::from("output"),
            source: SourceConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check the configuration is internally consistent
    pub fn validate(&self) -> Result<()> {
        if self.economies.is_empty() {
            return Err(AnalysisError::ConfigError(
                "At least one economy is required".to_string(),
            ));
        }

        for (field, codes) in [("economies", &self.economies), ("sort_order", &self.sort_order)] {
            let mut seen = HashSet::new();
            if let Some(code) = codes.iter().find(|code| !seen.insert(code.as_str())) {
                return Err(AnalysisError::ConfigError(format!(
                    "Economy '{}' is listed more than once in {}",
                    code, field
                )));
            }
        }

        YearRange::new(self.year_range.start, self.year_range.end)?;

        if self.forecast_horizon == 0 {
            return Err(AnalysisError::ConfigError(
                "Forecast horizon must be at least one period".to_string(),
            ));
        }

        if !self.economies.contains(&self.forecast_economy) {
            return Err(AnalysisError::ConfigError(format!(
                "Forecast economy '{}' is not part of the panel",
                self.forecast_economy
            )));
        }

        if self.scenarios.is_empty() {
            return Err(AnalysisError::ConfigError(
                "At least one scenario is required".to_string(),
            ));
        }

        if self.curve_grid.points == 0 || self.curve_grid.start >= self.curve_grid.end {
            return Err(AnalysisError::ConfigError(
                "Curve grid needs at least one point over a non-empty interval".to_string(),
            ));
        }

        let names = self.column_names();
        let required = std::iter::once(&self.response)
            .chain(std::iter::once(&self.debt_variable))
            .chain(self.exogenous.iter())
            .chain(self.normalized.iter());
        for column in required {
            if !names.contains(column) {
                return Err(AnalysisError::ConfigError(format!(
                    "Column '{}' is not produced by any configured indicator",
                    column
                )));
            }
        }

        if !self.exogenous.contains(&self.debt_variable) {
            return Err(AnalysisError::ConfigError(format!(
                "Debt variable '{}' must be one of the exogenous regressors",
                self.debt_variable
            )));
        }

        Ok(())
    }

    /// Source indicator codes, in configuration order
    pub fn indicator_codes(&self) -> Vec<String> {
        self.indicators.iter().map(|i| i.code.clone()).collect()
    }

    /// Panel column names, in configuration order
    pub fn column_names(&self) -> Vec<String> {
        self.indicators.iter().map(|i| i.name.clone()).collect()
    }

    /// Panel column name for a source indicator code
    pub fn column_for(&self, code: &str) -> Option<&str> {
        self.indicators
            .iter()
            .find(|i| i.code == code)
            .map(|i| i.name.as_str())
    }

    /// 1-based rank of an economy in the row order
    ///
    /// Economies missing from `sort_order` rank after all listed ones.
    pub fn sort_rank(&self, economy: &str) -> usize {
        self.sort_order
            .iter()
            .position(|e| e == economy)
            .map(|p| p + 1)
            .unwrap_or(self.sort_order.len() + 1)
    }

    /// First calendar year after the sample
    pub fn forecast_start_year(&self) -> i32 {
        self.year_range.end + 1
    }
}
