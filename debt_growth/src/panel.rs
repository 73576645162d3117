//! Indicator panel: one row per (economy, year)

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::source::Observation;
use growth_math::{mean, z_scores};
use polars::prelude::*;
use std::collections::HashMap;

/// Name of the composite row identifier column
pub const KEY_COLUMN: &str = "idx";
/// Name of the ISO3 economy column
pub const ECONOMY_COLUMN: &str = "economy";
/// Name of the calendar year column
pub const YEAR_COLUMN: &str = "year";

/// Parse a year field, stripping the `YR` prefix some sources emit
pub fn parse_year(raw: &str) -> Result<i32> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix("YR").unwrap_or(trimmed);

    digits
        .parse::<i32>()
        .map_err(|_| AnalysisError::DataError(format!("Invalid year field '{}'", raw)))
}

/// Sortable row key: economy rank, economy code, then year
pub fn composite_key(rank: usize, economy: &str, year: i32) -> String {
    format!("{}{}{}", rank, economy, year)
}

/// Cleaned indicator panel
#[derive(Debug, Clone)]
pub struct IndicatorPanel {
    /// Data frame ordered by the composite key
    df: DataFrame,
    /// Names of the indicator columns
    value_columns: Vec<String>,
}

impl IndicatorPanel {
    /// Build the cleaned panel from raw observations
    ///
    /// Indicator codes are renamed to their column names, missing
    /// combinations become nulls, configured columns are standardized
    /// within each economy, and rows are ordered by the composite key.
    pub fn from_observations(observations: &[Observation], config: &AnalysisConfig) -> Result<Self> {
        let mut lookup: HashMap<(String, String, i32), Option<f64>> = HashMap::new();
        for observation in observations {
            if let Some(name) = config.column_for(&observation.indicator) {
                lookup.insert(
                    (name.to_string(), observation.economy.clone(), observation.year),
                    observation.value,
                );
            }
        }

        let names = config.column_names();
        let mut keys = Vec::new();
        let mut economies = Vec::new();
        let mut years = Vec::new();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

        for economy in &config.economies {
            for year in config.year_range.years() {
                keys.push(composite_key(config.sort_rank(economy), economy, year));
                economies.push(economy.clone());
                years.push(year);

                for (column, name) in columns.iter_mut().zip(&names) {
                    let value = lookup
                        .get(&(name.clone(), economy.clone(), year))
                        .copied()
                        .flatten();
                    column.push(value.unwrap_or(f64::NAN));
                }
            }
        }

        for (column, name) in columns.iter_mut().zip(&names) {
            if config.normalized.contains(name) {
                *column = standardize_by_group(column, &economies);
            }
        }

        let mut series = vec![
            Series::new(KEY_COLUMN, keys),
            Series::new(ECONOMY_COLUMN, economies),
            Series::new(YEAR_COLUMN, years),
        ];
        for (name, column) in names.iter().zip(columns) {
            let values: Vec<Option<f64>> = column
                .into_iter()
                .map(|v| if v.is_nan() { None } else { Some(v) })
                .collect();
            series.push(Series::new(name.as_str(), values));
        }

        let df = DataFrame::new(series)?
            .lazy()
            .sort(KEY_COLUMN, SortOptions::default())
            .collect()?;

        Ok(Self {
            df,
            value_columns: names,
        })
    }

    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Get the indicator column names
    pub fn value_columns(&self) -> &[String] {
        &self.value_columns
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Indicator column as `f64`, nulls mapped to `NaN`
    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let series = self.df.column(name).map_err(|e| {
            AnalysisError::DataError(format!("Column '{}' not found: {}", name, e))
        })?;

        Ok(series
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }

    /// Several indicator columns, in the order requested
    pub fn columns(&self, names: &[String]) -> Result<Vec<Vec<f64>>> {
        names.iter().map(|name| self.column(name)).collect()
    }

    /// Composite keys in row order
    pub fn keys(&self) -> Result<Vec<String>> {
        self.string_column(KEY_COLUMN)
    }

    /// Economy codes in row order
    pub fn economies(&self) -> Result<Vec<String>> {
        self.string_column(ECONOMY_COLUMN)
    }

    /// Calendar years in row order
    pub fn years(&self) -> Result<Vec<i32>> {
        self.df
            .column(YEAR_COLUMN)?
            .i32()?
            .into_iter()
            .map(|y| y.ok_or_else(|| AnalysisError::DataError("Missing year".to_string())))
            .collect()
    }

    /// Historical mean of a column for one economy, gaps skipped
    pub fn economy_mean(&self, economy: &str, column: &str) -> Result<f64> {
        let economies = self.economies()?;
        if !economies.iter().any(|e| e == economy) {
            return Err(AnalysisError::DataError(format!(
                "Economy '{}' is not in the panel",
                economy
            )));
        }

        let values: Vec<f64> = self
            .column(column)?
            .into_iter()
            .zip(&economies)
            .filter(|(_, e)| e.as_str() == economy)
            .map(|(v, _)| v)
            .collect();

        Ok(mean(&values))
    }

    fn string_column(&self, name: &str) -> Result<Vec<String>> {
        Ok(self
            .df
            .column(name)?
            .utf8()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect())
    }
}

/// Z-score `values` separately within each group label
fn standardize_by_group(values: &[f64], groups: &[String]) -> Vec<f64> {
    let mut members: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, group) in groups.iter().enumerate() {
        members.entry(group.as_str()).or_default().push(i);
    }

    let mut result = vec![f64::NAN; values.len()];
    for rows in members.values() {
        let group_values: Vec<f64> = rows.iter().map(|&i| values[i]).collect();
        for (&i, z) in rows.iter().zip(z_scores(&group_values)) {
            result[i] = z;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::YearRange;
    use rstest::rstest;

    #[rstest]
    #[case("2001", 2001)]
    #[case("YR1995", 1995)]
    #[case(" YR2021 ", 2021)]
    fn test_parse_year(#[case] raw: &str, #[case] expected: i32) {
        assert_eq!(parse_year(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("YR")]
    #[case("FY2001")]
    fn test_parse_year_rejects_non_numeric(#[case] raw: &str) {
        assert!(matches!(parse_year(raw), Err(AnalysisError::DataError(_))));
    }

    #[test]
    fn test_composite_key_orders_by_rank_then_year() {
        let mut keys = vec![
            composite_key(4, "KAZ", 1995),
            composite_key(1, "BLR", 2000),
            composite_key(1, "BLR", 1999),
        ];
        keys.sort();
        assert_eq!(keys, vec!["1BLR1999", "1BLR2000", "4KAZ1995"]);
    }

    #[test]
    fn test_standardize_by_group() {
        let groups: Vec<String> = ["A", "B", "A", "B", "C"].iter().map(|s| s.to_string()).collect();
        let z = standardize_by_group(&[1.0, 10.0, 3.0, 10.0, 7.0], &groups);

        assert!((z[0] + std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
        assert!((z[2] - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
        // zero variance and single member
        assert!(z[1].is_nan() && z[3].is_nan());
        assert!(z[4].is_nan());
    }

    #[test]
    fn test_panel_orders_rows_and_maps_gaps_to_nan() {
        let config = AnalysisConfig {
            economies: vec!["KAZ".to_string(), "BLR".to_string()],
            year_range: YearRange::new(2000, 2001).unwrap(),
            ..AnalysisConfig::default()
        };
        let observations = vec![
            Observation::new("NY.GDP.MKTP.KD.ZG", "KAZ", 2000, Some(9.8)),
            Observation::new("NY.GDP.MKTP.KD.ZG", "BLR", 2001, Some(4.7)),
            Observation::new("NY.GDP.MKTP.KD.ZG", "BLR", 2000, None),
        ];

        let panel = IndicatorPanel::from_observations(&observations, &config).unwrap();

        assert_eq!(panel.len(), 4);
        assert_eq!(
            panel.keys().unwrap(),
            vec!["1BLR2000", "1BLR2001", "4KAZ2000", "4KAZ2001"]
        );
        assert_eq!(panel.years().unwrap(), vec![2000, 2001, 2000, 2001]);

        let gdp = panel.column("gdp_growth").unwrap();
        assert!(gdp[0].is_nan());
        assert_eq!(gdp[1], 4.7);
        assert_eq!(gdp[2], 9.8);
        assert!(gdp[3].is_nan());

        assert!(panel.column("debt_service").unwrap().iter().all(|v| v.is_nan()));
        assert!(panel.column("unemployment").is_err());
        assert_eq!(panel.economy_mean("KAZ", "gdp_growth").unwrap(), 9.8);
        assert!(panel.economy_mean("RUS", "gdp_growth").is_err());
    }
}
