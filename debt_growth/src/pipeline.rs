//! The analysis as an explicit sequence of stages
//!
//! `acquire_panel → fit_laffer_curve → fit_arimax → run_scenarios`, each
//! stage taking what the previous one produced.

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::metrics::FitDiagnostics;
use crate::models::arimax::{ArimaxData, ArimaxModel, FittedArimax};
use crate::models::laffer::{CurveData, CurveFit, LafferModel};
use crate::models::EstimableModel;
use crate::panel::IndicatorPanel;
use crate::plot::{render_laffer_curve, render_scenarios};
use crate::scenarios::ScenarioTable;
use crate::source::{IndicatorQuery, IndicatorSource};
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

pub use crate::scenarios::run_scenarios;

/// Fetch every configured indicator and build the cleaned panel
pub fn acquire_panel(config: &AnalysisConfig, source: &dyn IndicatorSource) -> Result<IndicatorPanel> {
    let query = IndicatorQuery::from_config(config);
    info!(
        source = source.name(),
        indicators = query.indicators.len(),
        economies = query.economies.len(),
        "fetching indicators"
    );

    let observations = source.fetch(&query)?;
    let panel = IndicatorPanel::from_observations(&observations, config)?;

    info!(
        observations = observations.len(),
        rows = panel.len(),
        "panel assembled"
    );
    Ok(panel)
}

/// Fitted curve together with the data it was fitted to
#[derive(Debug, Clone)]
pub struct LafferOutcome {
    pub data: CurveData,
    pub fit: CurveFit,
    pub diagnostics: FitDiagnostics,
}

/// Fit the growth-on-debt quadratic over the pooled panel
pub fn fit_laffer_curve(panel: &IndicatorPanel, config: &AnalysisConfig) -> Result<LafferOutcome> {
    let x = panel.column(&config.debt_variable)?;
    let y = panel.column(&config.response)?;
    let data = CurveData::complete_cases(&x, &y)?;

    let dropped = x.len() - data.len();
    if dropped > 0 {
        warn!(
            dropped,
            kept = data.len(),
            "rows with missing values excluded from the curve fit"
        );
    }

    let fit = LafferModel::default().fit(&data)?;
    let diagnostics = fit.diagnostics(&data)?;

    info!(
        a = fit.curve.a,
        b = fit.curve.b,
        r2 = diagnostics.r2,
        evaluations = fit.evaluations,
        "curve fitted"
    );
    Ok(LafferOutcome {
        data,
        fit,
        diagnostics,
    })
}

/// Estimate ARIMAX(1,0,1) of the response on the exogenous regressors
///
/// The fit needs more than `k + 5` complete panel rows for `k`
/// regressors, so at least 10 rows with the default four. Panels near that
/// floor may also stop at the iteration cap; both cases are
/// [`AnalysisError::EstimationError`](crate::AnalysisError::EstimationError).
pub fn fit_arimax(panel: &IndicatorPanel, config: &AnalysisConfig) -> Result<FittedArimax> {
    let data = ArimaxData::from_panel(panel, &config.response, &config.exogenous)?;
    ArimaxModel::new(1, 1).fit(&data)
}

/// Everything one run produces
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub panel: IndicatorPanel,
    pub laffer: LafferOutcome,
    pub arimax: FittedArimax,
    pub scenarios: ScenarioTable,
    /// Chart files written
    pub charts: Vec<PathBuf>,
}

/// Run every stage and write the charts to the configured directory
pub fn run(config: &AnalysisConfig, source: &dyn IndicatorSource) -> Result<AnalysisReport> {
    config.validate()?;

    let panel = acquire_panel(config, source)?;
    let laffer = fit_laffer_curve(&panel, config)?;
    let arimax = fit_arimax(&panel, config)?;
    let scenarios = run_scenarios(&arimax, &panel, config)?;

    let charts = vec![
        render_laffer_curve(
            &laffer.fit,
            &laffer.data,
            &config.curve_grid,
            &config.debt_variable,
            &config.response,
            &config.output_dir,
        )?,
        render_scenarios(&scenarios, &config.output_dir)?,
    ];

    Ok(AnalysisReport {
        panel,
        laffer,
        arimax,
        scenarios,
        charts,
    })
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let curve = &self.laffer.fit.curve;
        writeln!(f, "Fitted curve: y = a*x^2 + b*x ({})", curve.label())?;
        writeln!(f, "Params: a={}, b={}", curve.a, curve.b)?;
        if let Some(peak) = curve.peak() {
            writeln!(f, "Growth-maximizing debt service: {:.3}", peak)?;
        }
        writeln!(f, "{}", self.laffer.diagnostics)?;
        writeln!(f, "{}", self.arimax)?;
        writeln!(f)?;
        write!(f, "{}", self.scenarios)
    }
}
