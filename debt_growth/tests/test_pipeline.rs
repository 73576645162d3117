mod common;

use approx::assert_abs_diff_eq;
use common::{synthetic_source, CPI, DEBT, EXPORT, GDP, RESERVES};
use debt_growth::config::YearRange;
use debt_growth::pipeline::{acquire_panel, fit_arimax, fit_laffer_curve, run, run_scenarios};
use debt_growth::plot::{LAFFER_CURVE_FILE, SCENARIOS_FILE};
use debt_growth::{AnalysisConfig, AnalysisError, ScenarioRecord, StaticSource};
use growth_math::{mean, sample_std};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn config(output: &TempDir) -> AnalysisConfig {
    AnalysisConfig {
        economies: vec!["KAZ".to_string(), "BLR".to_string()],
        year_range: YearRange::new(2000, 2021).unwrap(),
        output_dir: output.path().to_path_buf(),
        ..AnalysisConfig::default()
    }
}

#[test]
fn test_end_to_end_on_synthetic_panel() {
    let output = TempDir::new().unwrap();
    let config = config(&output);
    let source = synthetic_source(&["KAZ", "BLR"], 2000, 22, 11);

    let report = run(&config, &source).unwrap();

    assert_eq!(report.panel.len(), 44);
    assert_eq!(report.scenarios.len(), 10);
    assert_eq!(
        report.scenarios.years().unwrap(),
        (2022..=2031).collect::<Vec<_>>()
    );
    for scenario in ["optimistic", "pessimistic"] {
        let index = report.scenarios.column(scenario).unwrap();
        assert_eq!(index.len(), 10);
        assert!(index.iter().all(|v| v.is_finite()));
    }

    assert_eq!(report.charts.len(), 2);
    assert!(output.path().join(LAFFER_CURVE_FILE).exists());
    assert!(output.path().join(SCENARIOS_FILE).exists());

    let printed = report.to_string();
    let curve = &report.laffer.fit.curve;
    assert!(printed.contains(&format!("Params: a={}, b={}", curve.a, curve.b)));
    assert!(printed.contains("fit: a="));
    assert!(printed.contains("R2 score"));
    assert!(printed.contains("Normal ARIMAX(1,0,1)"));
    assert!(printed.contains("Beta debt_service"));
}

#[test]
fn test_stages_compose() {
    let output = TempDir::new().unwrap();
    let config = config(&output);
    let source = synthetic_source(&["KAZ", "BLR"], 2000, 22, 3);

    let panel = acquire_panel(&config, &source).unwrap();
    let keys = panel.keys().unwrap();
    assert_eq!(keys.first().map(String::as_str), Some("1BLR2000"));
    assert_eq!(keys.last().map(String::as_str), Some("4KAZ2021"));

    let curve = fit_laffer_curve(&panel, &config).unwrap();
    assert_eq!(curve.data.len(), 44);
    assert!(curve.fit.curve.a < 0.0);
    assert!(curve.diagnostics.r2 > 0.0);

    let model = fit_arimax(&panel, &config).unwrap();
    assert_eq!(model.observations(), 43);

    let table = run_scenarios(&model, &panel, &config).unwrap();
    let optimistic = table.column("optimistic").unwrap();
    let pessimistic = table.column("pessimistic").unwrap();

    // optimistic carries lower debt service
    let beta_debt = model.exogenous_coefficient("debt_service").unwrap();
    let gap = pessimistic[9] - optimistic[9];
    assert_ne!(gap, 0.0);
    assert_eq!(gap.signum(), beta_debt.signum());
}

#[test]
fn test_forecast_continues_the_forecast_economy() {
    let output = TempDir::new().unwrap();
    let mut config = config(&output);
    config.forecast_economy = "BLR".to_string();
    let source = synthetic_source(&["KAZ", "BLR"], 2000, 22, 3);

    let panel = acquire_panel(&config, &source).unwrap();
    let model = fit_arimax(&panel, &config).unwrap();

    // BLR sorts first, so its 2021 row is row 21 of the pooled sample
    let gdp = panel.column("gdp_growth").unwrap();
    let keys = panel.keys().unwrap();
    assert_eq!(keys[21], "1BLR2021");
    let state = model.lag_state("BLR").unwrap();
    assert_eq!(state.values, vec![gdp[21]]);
    assert_eq!(state.residuals, vec![model.residuals()[20]]);
    assert_ne!(model.lag_state("KAZ").unwrap(), state);

    let table = run_scenarios(&model, &panel, &config).unwrap();
    let record = ScenarioRecord::from_panel(&config.scenarios[0], &panel, &config).unwrap();
    let row = &record.covariate_path()[0];
    let exogenous: f64 = record
        .regressors()
        .iter()
        .zip(row)
        .map(|(r, x)| model.exogenous_coefficient(r).unwrap() * x)
        .sum();
    let expected = model.intercept()
        + exogenous
        + model.ar()[0] * state.values[0]
        + model.ma()[0] * state.residuals[0];

    assert_eq!(record.economy(), "BLR");
    assert_abs_diff_eq!(table.forecasts()[0].growth()[0], expected, epsilon = 1e-9);
}

#[test]
fn test_small_panel_fits_or_fails_explicitly() {
    let output = TempDir::new().unwrap();
    let mut config = config(&output);
    config.year_range = YearRange::new(2017, 2021).unwrap();

    for seed in 0..5 {
        let source = synthetic_source(&["KAZ", "BLR"], 2017, 5, seed);
        match run(&config, &source) {
            Ok(report) => {
                assert_eq!(report.panel.len(), 10);
                assert_eq!(
                    report.scenarios.years().unwrap(),
                    (2022..=2031).collect::<Vec<_>>()
                );
                for scenario in ["optimistic", "pessimistic"] {
                    let index = report.scenarios.column(scenario).unwrap();
                    assert!(index.iter().all(|v| v.is_finite()));
                }
            }
            Err(AnalysisError::EstimationError(_)) => {}
            Err(e) => panic!("seed {}: unexpected failure {}", seed, e),
        }
    }

    // one year short of the minimum sample
    config.year_range = YearRange::new(2018, 2021).unwrap();
    let source = synthetic_source(&["KAZ", "BLR"], 2018, 4, 0);
    assert!(matches!(
        run(&config, &source),
        Err(AnalysisError::EstimationError(_))
    ));
}

#[test]
fn test_reserves_are_standardized_per_economy() {
    let output = TempDir::new().unwrap();
    let config = config(&output);
    let source = synthetic_source(&["KAZ", "BLR"], 2000, 22, 5);

    let panel = acquire_panel(&config, &source).unwrap();
    let reserves = panel.column("reserves").unwrap();
    let economies = panel.economies().unwrap();

    for economy in ["KAZ", "BLR"] {
        let group: Vec<f64> = reserves
            .iter()
            .zip(&economies)
            .filter(|(_, e)| e.as_str() == economy)
            .map(|(v, _)| *v)
            .collect();
        assert!(mean(&group).abs() < 1e-9);
        assert!((sample_std(&group) - 1.0).abs() < 1e-9);
    }
}

#[test]
fn test_gaps_are_excluded_from_the_fits() {
    let output = TempDir::new().unwrap();
    let config = config(&output);
    let mut gappy = vec![f64::NAN; 3];
    gappy.extend(std::iter::repeat(5.0).take(19));
    let source = synthetic_source(&["KAZ"], 2000, 22, 9)
        .with_series(GDP, "BLR", 2000, &[f64::NAN; 22])
        .with_series(DEBT, "BLR", 2000, &gappy)
        .with_series(RESERVES, "BLR", 2000, &[1.0e9; 22])
        .with_series(CPI, "BLR", 2000, &[7.0; 22])
        .with_series(EXPORT, "BLR", 2000, &[50.0; 22]);

    let panel = acquire_panel(&config, &source).unwrap();
    assert_eq!(panel.len(), 44);

    // constant reserves cannot be standardized
    let reserves = panel.column("reserves").unwrap();
    assert_eq!(reserves.iter().filter(|v| v.is_nan()).count(), 22);

    let curve = fit_laffer_curve(&panel, &config).unwrap();
    assert_eq!(curve.data.len(), 22);
}

#[test]
fn test_unknown_indicator_is_fatal() {
    let output = TempDir::new().unwrap();
    let config = config(&output);
    let source = StaticSource::default().with_series(GDP, "KAZ", 2000, &[1.0, 2.0]);

    assert!(matches!(
        run(&config, &source),
        Err(AnalysisError::DataError(_))
    ));
}

#[test]
fn test_invalid_config_is_rejected_before_fetching() {
    let output = TempDir::new().unwrap();
    let mut config = config(&output);
    config.forecast_horizon = 0;

    assert!(matches!(
        run(&config, &StaticSource::default()),
        Err(AnalysisError::ConfigError(_))
    ));
}
