use approx::assert_abs_diff_eq;
use debt_growth::models::laffer::{CurveData, LafferCurve, LafferModel};
use debt_growth::{AnalysisError, EstimableModel};
use growth_math::linspace;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rstest::rstest;

fn noisy_curve(a: f64, b: f64, n: usize, sd: f64, seed: u64) -> CurveData {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, sd).unwrap();
    let curve = LafferCurve::new(a, b);

    let x = linspace(0.5, 15.0, n);
    let y: Vec<f64> = x
        .iter()
        .map(|&x| curve.evaluate(x) + noise.sample(&mut rng))
        .collect();

    CurveData::complete_cases(&x, &y).unwrap()
}

#[rstest]
#[case(-0.08, 1.2)]
#[case(-0.3, 4.0)]
#[case(0.05, -0.5)]
fn test_noisy_round_trip(#[case] a: f64, #[case] b: f64) {
    let data = noisy_curve(a, b, 120, 0.1, 42);
    let fit = LafferModel::default().fit(&data).unwrap();

    assert_abs_diff_eq!(fit.curve.a, a, epsilon = 0.01);
    assert_abs_diff_eq!(fit.curve.b, b, epsilon = 0.1);

    let diagnostics = fit.diagnostics(&data).unwrap();
    assert!(diagnostics.r2 > 0.9, "r2 = {}", diagnostics.r2);
    assert!(diagnostics.mse < 0.05);
    assert!(diagnostics.condition_number.is_finite());
    assert_eq!(diagnostics.observations, 120);
}

#[test]
fn test_concave_fit_reports_peak() {
    let data = noisy_curve(-0.1, 1.6, 80, 0.05, 1);
    let fit = LafferModel::default().fit(&data).unwrap();

    let peak = fit.curve.peak().unwrap();
    assert_abs_diff_eq!(peak, 8.0, epsilon = 0.5);
    assert!(fit.curve.label().starts_with("fit: a=-0."));
}

#[test]
fn test_gaps_do_not_reach_the_solver() {
    let mut data = noisy_curve(-0.08, 1.2, 40, 0.1, 7);
    data.x.push(f64::NAN);
    data.y.push(3.0);

    let cleaned = CurveData::complete_cases(&data.x, &data.y).unwrap();
    assert_eq!(cleaned.len(), 40);
    assert!(LafferModel::default().fit(&cleaned).is_ok());
}

#[test]
fn test_single_observation_is_a_curve_fit_error() {
    let data = CurveData::complete_cases(&[3.0], &[1.0]).unwrap();
    assert!(matches!(
        LafferModel::default().fit(&data),
        Err(AnalysisError::CurveFitError { .. })
    ));
}
