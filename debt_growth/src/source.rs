//! Indicator sources
//!
//! The pipeline only sees the [`IndicatorSource`] trait. The World Bank
//! client is the production implementation; [`StaticSource`] serves
//! observations held in memory.

use crate::config::{AnalysisConfig, YearRange};
use crate::error::{AnalysisError, Result};

pub mod world_bank;

pub use world_bank::WorldBankClient;

/// One value of one indicator for one economy and year
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Source indicator code
    pub indicator: String,
    /// ISO3 economy code
    pub economy: String,
    pub year: i32,
    /// `None` when the source has no value
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(indicator: &str, economy: &str, year: i32, value: Option<f64>) -> Self {
        Self {
            indicator: indicator.to_string(),
            economy: economy.to_string(),
            year,
            value,
        }
    }
}

/// What to fetch: indicators × economies × years
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorQuery {
    pub indicators: Vec<String>,
    pub economies: Vec<String>,
    pub years: YearRange,
}

impl IndicatorQuery {
    /// Build the query described by an analysis configuration
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            indicators: config.indicator_codes(),
            economies: config.economies.clone(),
            years: config.year_range,
        }
    }

    /// Whether an observation falls inside the query
    pub fn matches(&self, observation: &Observation) -> bool {
        self.indicators.contains(&observation.indicator)
            && self.economies.contains(&observation.economy)
            && self.years.contains(observation.year)
    }
}

/// A provider of indicator observations
pub trait IndicatorSource {
    /// Fetch every available observation matching the query
    fn fetch(&self, query: &IndicatorQuery) -> Result<Vec<Observation>>;

    /// Name of the source, for logging
    fn name(&self) -> &str;
}

/// In-memory indicator source
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    observations: Vec<Observation>,
}

impl StaticSource {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    /// Add a yearly series starting at `first_year`; `NaN` marks a gap
    pub fn with_series(
        mut self,
        indicator: &str,
        economy: &str,
        first_year: i32,
        values: &[f64],
    ) -> Self {
        for (offset, value) in values.iter().enumerate() {
            let value = if value.is_nan() { None } else { Some(*value) };
            self.observations.push(Observation::new(
                indicator,
                economy,
                first_year + offset as i32,
                value,
            ));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

impl IndicatorSource for StaticSource {
    fn fetch(&self, query: &IndicatorQuery) -> Result<Vec<Observation>> {
        for code in &query.indicators {
            if !self.observations.iter().any(|o| &o.indicator == code) {
                return Err(AnalysisError::DataError(format!(
                    "Unknown indicator code '{}'",
                    code
                )));
            }
        }

        Ok(self
            .observations
            .iter()
            .filter(|o| query.matches(o))
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> IndicatorQuery {
        IndicatorQuery {
            indicators: vec!["GDP".to_string()],
            economies: vec!["KAZ".to_string()],
            years: YearRange::new(2000, 2001).unwrap(),
        }
    }

    #[test]
    fn test_static_source_filters_to_query() {
        let source = StaticSource::default()
            .with_series("GDP", "KAZ", 1999, &[1.0, 2.0, f64::NAN, 4.0])
            .with_series("GDP", "RUS", 2000, &[5.0]);

        let observations = source.fetch(&query()).unwrap();

        assert_eq!(source.len(), 5);
        assert_eq!(
            observations,
            vec![
                Observation::new("GDP", "KAZ", 2000, Some(2.0)),
                Observation::new("GDP", "KAZ", 2001, None),
            ]
        );
    }

    #[test]
    fn test_static_source_rejects_unknown_indicator() {
        let source = StaticSource::default().with_series("CPI", "KAZ", 2000, &[1.0]);
        let result = source.fetch(&query());
        assert!(matches!(result, Err(AnalysisError::DataError(_))));
    }
}
