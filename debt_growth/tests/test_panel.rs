mod common;

use common::{CPI, DEBT, EXPORT, GDP, RESERVES};
use debt_growth::config::YearRange;
use debt_growth::source::Observation;
use debt_growth::{AnalysisConfig, IndicatorPanel};
use growth_math::{mean, sample_std};
use proptest::prelude::*;
use std::collections::HashSet;

const ECONOMIES: [&str; 4] = ["KAZ", "KGZ", "RUS", "BLR"];

fn config_for(economies: usize, start: i32, end: i32) -> AnalysisConfig {
    AnalysisConfig {
        economies: ECONOMIES[..economies].iter().map(|e| e.to_string()).collect(),
        year_range: YearRange::new(start, end).unwrap(),
        ..AnalysisConfig::default()
    }
}

proptest! {
    #[test]
    fn every_economy_year_appears_once(
        economies in 1usize..=4,
        start in 1995i32..2010,
        span in 0i32..12,
        present in proptest::collection::vec(any::<bool>(), 4 * 12),
    ) {
        let config = config_for(economies, start, start + span);

        // sparse input: some combinations missing entirely, some null
        let mut observations = Vec::new();
        for (e, economy) in config.economies.iter().enumerate() {
            for (t, year) in config.year_range.years().enumerate() {
                if present[e * 12 + t] {
                    observations.push(Observation::new(GDP, economy, year, Some(t as f64)));
                    observations.push(Observation::new(DEBT, economy, year, None));
                }
            }
        }
        // outside the window
        observations.push(Observation::new(GDP, "KAZ", start + span + 1, Some(1.0)));

        let panel = IndicatorPanel::from_observations(&observations, &config).unwrap();
        let pairs: HashSet<(String, i32)> = panel
            .economies()
            .unwrap()
            .into_iter()
            .zip(panel.years().unwrap())
            .collect();

        prop_assert_eq!(panel.len(), economies * (span as usize + 1));
        prop_assert_eq!(pairs.len(), panel.len());
        for economy in &config.economies {
            for year in config.year_range.years() {
                prop_assert!(pairs.contains(&(economy.clone(), year)));
            }
        }

        let keys = panel.keys().unwrap();
        let mut sorted = keys.clone();
        sorted.sort();
        prop_assert_eq!(keys, sorted);
    }

    #[test]
    fn standardized_reserves_have_unit_scale_per_economy(
        groups in proptest::collection::vec(
            proptest::collection::vec(1.0e8f64..5.0e10, 3..20),
            1..=4,
        ),
    ) {
        let years = groups.iter().map(Vec::len).max().unwrap_or(3);
        let config = config_for(groups.len(), 2000, 2000 + years as i32 - 1);

        let mut observations = Vec::new();
        for (economy, values) in config.economies.iter().zip(&groups) {
            for (t, value) in values.iter().enumerate() {
                observations.push(Observation::new(RESERVES, economy, 2000 + t as i32, Some(*value)));
                observations.push(Observation::new(CPI, economy, 2000 + t as i32, Some(3.0)));
                observations.push(Observation::new(EXPORT, economy, 2000 + t as i32, None));
            }
        }

        let panel = IndicatorPanel::from_observations(&observations, &config).unwrap();
        let reserves = panel.column("reserves").unwrap();
        let economies = panel.economies().unwrap();

        for (economy, values) in config.economies.iter().zip(&groups) {
            let z: Vec<f64> = reserves
                .iter()
                .zip(&economies)
                .filter(|(_, e)| *e == economy)
                .map(|(v, _)| *v)
                .collect();
            // a constant draw has no spread to scale by
            let expected = if sample_std(values) > 0.0 { values.len() } else { 0 };
            prop_assert_eq!(z.iter().filter(|v| v.is_finite()).count(), expected);
            if sample_std(values) > 1e-3 * mean(values) {
                prop_assert!(mean(&z).abs() < 1e-8);
                prop_assert!((sample_std(&z) - 1.0).abs() < 1e-8);
            }
        }

        // untouched columns keep their raw values
        let cpi = panel.column("cpi").unwrap();
        prop_assert!(cpi.iter().filter(|v| v.is_finite()).all(|v| *v == 3.0));
    }
}
