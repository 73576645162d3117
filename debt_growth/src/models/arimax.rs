//! ARIMAX models: ARMA errors around a linear regression
//!
//! The mean equation is
//!
//! ```text
//! μ_t = Σ φ_i·y_{t−i} + Σ θ_j·ε_{t−j} + β₀ + β·x_t,    ε_t = y_t − μ_t
//! ```
//!
//! with Normal innovations. The first `max(p, q)` observations only seed
//! the lags and pre-sample innovations are zero.
//!
//! Estimation maximizes the average log-likelihood with L-BFGS over a
//! working parameter vector `[φ…, u…, β…, s]` where `θ_j = tanh(u_j)` and
//! `σ = exp(s)`. The gradient is analytic; the Hessian used for standard
//! errors is a central finite difference of that gradient.
//!
//! Rows may carry a group label, one per economy of a pooled panel. The
//! fitted model keeps each group's last response and residual so a forecast
//! can continue any one group's history.

use crate::error::{AnalysisError, Result};
use crate::models::{EstimableModel, ForecastResult, TrainedForecastModel};
use crate::panel::IndicatorPanel;
use argmin::core::{
    CostFunction, Error, Executor, Gradient, State, TerminationReason, TerminationStatus,
};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use finitediff::FiniteDiff;
use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;
use tracing::{debug, info, warn};

/// Correction pairs kept by L-BFGS
const LBFGS_MEMORY: usize = 7;

/// Response and regressors with incomplete rows removed
#[derive(Debug, Clone, PartialEq)]
pub struct ArimaxData {
    response: String,
    regressors: Vec<String>,
    /// Response, one value per row
    y: Vec<f64>,
    /// Regressor values, one row per observation
    x: Vec<Vec<f64>>,
    /// Group label of each row
    groups: Vec<String>,
    /// Rows removed because a value was missing
    dropped: usize,
}

impl ArimaxData {
    /// Assemble data from a response and regressor columns
    pub fn new(
        response: &str,
        y: &[f64],
        regressors: &[String],
        columns: &[Vec<f64>],
    ) -> Result<Self> {
        Self::grouped(response, y, &vec![String::new(); y.len()], regressors, columns)
    }

    /// Assemble data whose rows belong to labelled groups
    pub fn grouped(
        response: &str,
        y: &[f64],
        groups: &[String],
        regressors: &[String],
        columns: &[Vec<f64>],
    ) -> Result<Self> {
        if groups.len() != y.len() {
            return Err(AnalysisError::ShapeMismatch {
                expected: y.len(),
                found: groups.len(),
            });
        }
        if regressors.len() != columns.len() {
            return Err(AnalysisError::ShapeMismatch {
                expected: regressors.len(),
                found: columns.len(),
            });
        }
        if let Some(column) = columns.iter().find(|c| c.len() != y.len()) {
            return Err(AnalysisError::ShapeMismatch {
                expected: y.len(),
                found: column.len(),
            });
        }

        let mut kept_y = Vec::with_capacity(y.len());
        let mut kept_x = Vec::with_capacity(y.len());
        let mut kept_groups = Vec::with_capacity(y.len());
        for (t, (&value, group)) in y.iter().zip(groups).enumerate() {
            let row: Vec<f64> = columns.iter().map(|c| c[t]).collect();
            if value.is_finite() && row.iter().all(|v| v.is_finite()) {
                kept_y.push(value);
                kept_x.push(row);
                kept_groups.push(group.clone());
            }
        }

        Ok(Self {
            response: response.to_string(),
            regressors: regressors.to_vec(),
            dropped: y.len() - kept_y.len(),
            y: kept_y,
            x: kept_x,
            groups: kept_groups,
        })
    }

    /// Pull the response and regressors out of the panel in row order,
    /// grouping rows by economy
    pub fn from_panel(panel: &IndicatorPanel, response: &str, regressors: &[String]) -> Result<Self> {
        let y = panel.column(response)?;
        let economies = panel.economies()?;
        let columns = panel.columns(regressors)?;
        let data = Self::grouped(response, &y, &economies, regressors, &columns)?;

        if data.dropped > 0 {
            warn!(
                dropped = data.dropped,
                kept = data.len(),
                "rows with missing values excluded from ARIMAX estimation"
            );
        }

        Ok(data)
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn n_regressors(&self) -> usize {
        self.regressors.len()
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn regressors(&self) -> &[String] {
        &self.regressors
    }
}

/// ARIMAX(p, 0, q) specification
#[derive(Debug, Clone)]
pub struct ArimaxModel {
    name: String,
    /// AR order (p)
    ar: usize,
    /// MA order (q)
    ma: usize,
    /// L-BFGS iteration cap
    max_iters: u64,
    /// Gradient norm treated as converged
    tol_grad: f64,
    /// Cost change treated as converged
    tol_cost: f64,
}

/// Residual recursion at one parameter vector
struct Filtered {
    residuals: Vec<f64>,
    cost: f64,
    gradient: Option<Vec<f64>>,
}

impl ArimaxModel {
    /// Create a new ARIMAX model
    pub fn new(ar: usize, ma: usize) -> Self {
        Self {
            name: format!("ARIMAX({},0,{})", ar, ma),
            ar,
            ma,
            max_iters: 1000,
            tol_grad: 1e-6,
            tol_cost: 1e-12,
        }
    }

    /// Replace the L-BFGS iteration cap
    pub fn with_max_iters(mut self, max_iters: u64) -> Result<Self> {
        if max_iters == 0 {
            return Err(AnalysisError::ValidationError(
                "Iteration cap must be positive".to_string(),
            ));
        }
        self.max_iters = max_iters;
        Ok(self)
    }

    fn max_lag(&self) -> usize {
        self.ar.max(self.ma)
    }

    /// Length of the working parameter vector for `k` regressors
    fn n_params(&self, k: usize) -> usize {
        self.ar + self.ma + k + 2
    }

    /// Average negative log-likelihood, optionally with its gradient
    fn filter(&self, w: &[f64], data: &ArimaxData, with_gradient: bool) -> Filtered {
        let (p, q, k) = (self.ar, self.ma, data.n_regressors());
        let n_psi = p + q + k + 1;

        let phi = &w[..p];
        let theta: Vec<f64> = w[p..p + q].iter().map(|u| u.tanh()).collect();
        let beta = &w[p + q..n_psi];
        let s = w[n_psi];
        let inv_var = (-2.0 * s).exp();

        let m = self.max_lag();
        let n = data.len();

        let mut eps = vec![0.0; n];
        let mut d_eps = if with_gradient {
            vec![vec![0.0; n_psi]; n]
        } else {
            Vec::new()
        };
        let mut sum_sq = 0.0;
        let mut grad_psi = vec![0.0; n_psi];
        let mut grad_s = 0.0;

        for t in m..n {
            let mut mu = beta[0]
                + data.x[t]
                    .iter()
                    .zip(&beta[1..])
                    .map(|(x, b)| x * b)
                    .sum::<f64>();
            for i in 0..p {
                mu += phi[i] * data.y[t - 1 - i];
            }
            for j in 0..q {
                mu += theta[j] * eps[t - 1 - j];
            }

            eps[t] = data.y[t] - mu;
            sum_sq += eps[t] * eps[t];

            if with_gradient {
                let mut d_mu = vec![0.0; n_psi];
                for i in 0..p {
                    d_mu[i] = data.y[t - 1 - i];
                }
                for j in 0..q {
                    d_mu[p + j] = eps[t - 1 - j];
                }
                d_mu[p + q] = 1.0;
                for (c, x) in data.x[t].iter().enumerate() {
                    d_mu[p + q + 1 + c] = *x;
                }
                for l in 0..q {
                    for (c, prev) in d_eps[t - 1 - l].iter().enumerate() {
                        d_mu[c] += theta[l] * prev;
                    }
                }

                let d_t: Vec<f64> = d_mu.iter().map(|v| -v).collect();
                for (g, d) in grad_psi.iter_mut().zip(&d_t) {
                    *g += eps[t] * inv_var * d;
                }
                grad_s += 1.0 - eps[t] * eps[t] * inv_var;
                d_eps[t] = d_t;
            }
        }

        let n_eff = (n - m) as f64;
        let cost = s + 0.5 * (2.0 * PI).ln() + 0.5 * inv_var * sum_sq / n_eff;

        let gradient = with_gradient.then(|| {
            let mut gradient: Vec<f64> = grad_psi.iter().map(|g| g / n_eff).collect();
            for j in 0..q {
                gradient[p + j] *= 1.0 - theta[j] * theta[j];
            }
            gradient.push(grad_s / n_eff);
            gradient
        });

        Filtered {
            residuals: eps.split_off(m),
            cost,
            gradient,
        }
    }

    /// Working-scale start: OLS betas, no ARMA terms, OLS residual scale
    fn initial_params(&self, data: &ArimaxData) -> Result<Vec<f64>> {
        let m = self.max_lag();
        let k = data.n_regressors();
        let rows = data.len() - m;

        let design = DMatrix::from_fn(rows, k + 1, |r, c| match c {
            0 => 1.0,
            _ => data.x[m + r][c - 1],
        });
        let target = DVector::from_iterator(rows, data.y[m..].iter().copied());

        let beta = design
            .clone()
            .svd(true, true)
            .solve(&target, 1e-12)
            .map_err(|e| AnalysisError::EstimationError(format!("OLS start failed: {}", e)))?;

        let residuals = target - &design * &beta;
        let sd = (residuals.norm_squared() / rows as f64).sqrt();

        let mut w = vec![0.0; self.ar + self.ma];
        w.extend(beta.iter());
        w.push(sd.max(1e-8).ln());
        Ok(w)
    }

    /// Standard errors of the natural-scale coefficients
    fn standard_errors(&self, w: &[f64], data: &ArimaxData, n_eff: usize) -> Vec<f64> {
        let w_vec = w.to_vec();
        let hessian = w_vec.central_hessian(&|x: &Vec<f64>| {
            self.filter(x, data, true).gradient.unwrap_or_default()
        });

        let dim = w.len();
        let information = DMatrix::from_fn(dim, dim, |i, j| 0.5 * (hessian[i][j] + hessian[j][i]));

        let covariance = match information.try_inverse() {
            Some(inverse) => inverse / n_eff as f64,
            None => {
                warn!("information matrix is singular; standard errors unavailable");
                return vec![f64::NAN; dim];
            }
        };

        let (p, q) = (self.ar, self.ma);
        (0..dim)
            .map(|i| {
                let variance = covariance[(i, i)];
                if !(variance >= 0.0) {
                    return f64::NAN;
                }
                let se = variance.sqrt();
                if (p..p + q).contains(&i) {
                    let theta = w[i].tanh();
                    (1.0 - theta * theta) * se
                } else if i == dim - 1 {
                    w[i].exp() * se
                } else {
                    se
                }
            })
            .collect()
    }

    /// Last `p` responses and last `q` residuals of every group
    ///
    /// `residuals[i]` belongs to row `max_lag + i`. Groups without a
    /// modelled row, or with too short a history, get no state.
    fn lag_states(&self, data: &ArimaxData, residuals: &[f64]) -> HashMap<String, LagState> {
        let m = self.max_lag();
        let mut by_group: HashMap<&str, Vec<usize>> = HashMap::new();
        for (t, group) in data.groups.iter().enumerate() {
            by_group.entry(group.as_str()).or_default().push(t);
        }

        by_group
            .into_iter()
            .filter_map(|(group, rows)| {
                let modelled: Vec<usize> = rows.iter().copied().filter(|&t| t >= m).collect();
                if modelled.is_empty() || rows.len() < self.ar || modelled.len() < self.ma {
                    return None;
                }
                let state = LagState {
                    values: rows[rows.len() - self.ar..].iter().map(|&t| data.y[t]).collect(),
                    residuals: modelled[modelled.len() - self.ma..]
                        .iter()
                        .map(|&t| residuals[t - m])
                        .collect(),
                };
                Some((group.to_string(), state))
            })
            .collect()
    }
}

/// Average negative log-likelihood as an argmin problem
struct AverageNegLogLikelihood<'a> {
    model: &'a ArimaxModel,
    data: &'a ArimaxData,
}

impl CostFunction for AverageNegLogLikelihood<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, w: &Self::Param) -> std::result::Result<Self::Output, Error> {
        let cost = self.model.filter(w, self.data, false).cost;
        if !cost.is_finite() {
            return Err(Error::msg(format!("non-finite likelihood at {:?}", w)));
        }
        Ok(cost)
    }
}

impl Gradient for AverageNegLogLikelihood<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, w: &Self::Param) -> std::result::Result<Self::Gradient, Error> {
        let gradient = self
            .model
            .filter(w, self.data, true)
            .gradient
            .unwrap_or_default();
        if gradient.iter().any(|g| !g.is_finite()) {
            return Err(Error::msg(format!("non-finite gradient at {:?}", w)));
        }
        Ok(gradient)
    }
}

impl EstimableModel for ArimaxModel {
    type Data = ArimaxData;
    type Fitted = FittedArimax;

    fn fit(&self, data: &ArimaxData) -> Result<FittedArimax> {
        let k = data.n_regressors();
        let n_params = self.n_params(k);
        let m = self.max_lag();

        if data.len() <= m + n_params {
            return Err(AnalysisError::EstimationError(format!(
                "{} needs more than {} complete observations, have {}",
                self.name,
                m + n_params,
                data.len()
            )));
        }

        let start = self.initial_params(data)?;
        debug!(?start, "ARIMAX starting values");

        let problem = AverageNegLogLikelihood { model: self, data };
        let linesearch: MoreThuenteLineSearch<Vec<f64>, Vec<f64>, f64> =
            MoreThuenteLineSearch::new();
        let solver = LBFGS::<_, Vec<f64>, Vec<f64>, f64>::new(linesearch, LBFGS_MEMORY)
            .with_tolerance_grad(self.tol_grad)
            .and_then(|s| s.with_tolerance_cost(self.tol_cost))
            .map_err(|e| AnalysisError::EstimationError(e.to_string()))?;

        let result = Executor::new(problem, solver)
            .configure(|state| state.param(start).max_iters(self.max_iters))
            .run()
            .map_err(|e| AnalysisError::EstimationError(format!("optimizer failed: {}", e)))?;

        let state = result.state();
        let iterations = state.get_iter();
        match state.get_termination_status() {
            TerminationStatus::Terminated(TerminationReason::SolverConverged)
            | TerminationStatus::Terminated(TerminationReason::TargetCostReached) => {}
            status => {
                return Err(AnalysisError::EstimationError(format!(
                    "maximum likelihood did not converge after {} iterations ({:?})",
                    iterations, status
                )));
            }
        }

        let w = state
            .get_best_param()
            .cloned()
            .ok_or_else(|| AnalysisError::EstimationError("no optimum recorded".to_string()))?;
        if w.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::EstimationError(
                "optimum has non-finite parameters".to_string(),
            ));
        }

        let filtered = self.filter(&w, data, false);
        let group_states = self.lag_states(data, &filtered.residuals);
        let n_eff = data.len() - m;
        let log_likelihood = -filtered.cost * n_eff as f64;
        let std_errors = self.standard_errors(&w, data, n_eff);

        let (p, q) = (self.ar, self.ma);
        let ar = w[..p].to_vec();
        let ma: Vec<f64> = w[p..p + q].iter().map(|u| u.tanh()).collect();
        let beta = w[p + q..n_params - 1].to_vec();
        let sigma = w[n_params - 1].exp();

        info!(
            model = %self.name,
            iterations,
            log_likelihood,
            observations = n_eff,
            "ARIMAX estimation converged"
        );

        Ok(FittedArimax {
            name: self.name.clone(),
            response: data.response.clone(),
            regressors: data.regressors.clone(),
            ar,
            ma,
            beta,
            sigma,
            std_errors,
            log_likelihood,
            aic: 2.0 * n_params as f64 - 2.0 * log_likelihood,
            bic: n_params as f64 * (n_eff as f64).ln() - 2.0 * log_likelihood,
            observations: n_eff,
            iterations,
            last: LagState {
                values: data.y[data.len() - p..].to_vec(),
                residuals: filtered.residuals[filtered.residuals.len() - q..].to_vec(),
            },
            group_states,
            residuals: filtered.residuals,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// One row of the coefficient table
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
}

impl Coefficient {
    /// Wald statistic against zero
    pub fn z_score(&self) -> f64 {
        self.estimate / self.std_error
    }
}

/// History a forecast continues from
#[derive(Debug, Clone, PartialEq)]
pub struct LagState {
    /// Last `p` observed responses, oldest first
    pub values: Vec<f64>,
    /// Last `q` in-sample innovations, oldest first
    pub residuals: Vec<f64>,
}

/// Estimated ARIMAX model
#[derive(Debug, Clone)]
pub struct FittedArimax {
    name: String,
    response: String,
    regressors: Vec<String>,
    /// AR coefficients, lag 1 first
    ar: Vec<f64>,
    /// MA coefficients, lag 1 first
    ma: Vec<f64>,
    /// Intercept followed by one coefficient per regressor
    beta: Vec<f64>,
    /// Innovation standard deviation
    sigma: f64,
    /// Standard errors in coefficient-table order
    std_errors: Vec<f64>,
    log_likelihood: f64,
    aic: f64,
    bic: f64,
    /// Observations entering the likelihood
    observations: usize,
    iterations: u64,
    /// State at the end of the pooled sample
    last: LagState,
    /// State at the end of each group's own rows
    group_states: HashMap<String, LagState>,
    residuals: Vec<f64>,
}

impl FittedArimax {
    pub fn ar(&self) -> &[f64] {
        &self.ar
    }

    pub fn ma(&self) -> &[f64] {
        &self.ma
    }

    pub fn intercept(&self) -> f64 {
        self.beta[0]
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    pub fn aic(&self) -> f64 {
        self.aic
    }

    pub fn bic(&self) -> f64 {
        self.bic
    }

    pub fn observations(&self) -> usize {
        self.observations
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    pub fn regressors(&self) -> &[String] {
        &self.regressors
    }

    /// Lag state at the end of one group's history
    pub fn lag_state(&self, group: &str) -> Option<&LagState> {
        self.group_states.get(group)
    }

    /// Forecast recursion from a given history
    fn forecast_from(
        &self,
        state: &LagState,
        horizon: usize,
        future: &[Vec<f64>],
    ) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(AnalysisError::ValidationError(
                "Forecast horizon must be at least one period".to_string(),
            ));
        }
        if future.len() != horizon {
            return Err(AnalysisError::ShapeMismatch {
                expected: horizon,
                found: future.len(),
            });
        }
        if let Some(row) = future.iter().find(|r| r.len() != self.regressors.len()) {
            return Err(AnalysisError::ShapeMismatch {
                expected: self.regressors.len(),
                found: row.len(),
            });
        }

        let mut values_hist = state.values.clone();
        let mut shocks = state.residuals.clone();
        let mut forecasts = Vec::with_capacity(horizon);

        for row in future {
            let mut mu = self.beta[0]
                + row
                    .iter()
                    .zip(&self.beta[1..])
                    .map(|(x, b)| x * b)
                    .sum::<f64>();
            for (i, phi) in self.ar.iter().enumerate() {
                mu += phi * values_hist[values_hist.len() - 1 - i];
            }
            for (j, theta) in self.ma.iter().enumerate() {
                mu += theta * shocks[shocks.len() - 1 - j];
            }

            forecasts.push(mu);
            values_hist.push(mu);
            shocks.push(0.0);
        }

        ForecastResult::new(forecasts, horizon)
    }

    /// Coefficient of one exogenous regressor
    pub fn exogenous_coefficient(&self, regressor: &str) -> Option<f64> {
        self.regressors
            .iter()
            .position(|r| r == regressor)
            .map(|i| self.beta[i + 1])
    }

    /// Coefficient table: AR, MA, intercept, regressors, then the scale
    pub fn coefficients(&self) -> Vec<Coefficient> {
        let names = (1..=self.ar.len())
            .map(|i| format!("AR({})", i))
            .chain((1..=self.ma.len()).map(|j| format!("MA({})", j)))
            .chain(std::iter::once("Beta 1".to_string()))
            .chain(self.regressors.iter().map(|r| format!("Beta {}", r)))
            .chain(std::iter::once("Normal Scale".to_string()));

        let estimates = self
            .ar
            .iter()
            .chain(&self.ma)
            .chain(&self.beta)
            .chain(std::iter::once(&self.sigma));

        names
            .zip(estimates)
            .zip(&self.std_errors)
            .map(|((name, &estimate), &std_error)| Coefficient {
                name,
                estimate,
                std_error,
            })
            .collect()
    }
}

impl TrainedForecastModel for FittedArimax {
    fn forecast(&self, horizon: usize, future: &[Vec<f64>]) -> Result<ForecastResult> {
        self.forecast_from(&self.last, horizon, future)
    }

    fn forecast_group(
        &self,
        group: &str,
        horizon: usize,
        future: &[Vec<f64>],
    ) -> Result<ForecastResult> {
        let state = self.lag_state(group).ok_or_else(|| {
            AnalysisError::DataError(format!(
                "No in-sample history for '{}' to start the forecast from",
                group
            ))
        })?;
        self.forecast_from(state, horizon, future)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for FittedArimax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(96);
        let z_crit = Normal::new(0.0, 1.0)
            .map(|n| n.inverse_cdf(0.975))
            .unwrap_or(1.959964);

        writeln!(f, "Normal {}", self.name)?;
        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "{:<48}{}",
            format!("Dependent variable: {}", self.response),
            "Method: MLE"
        )?;
        writeln!(
            f,
            "{:<48}{}",
            format!("Number of observations: {}", self.observations),
            format!("Log likelihood: {:.4}", self.log_likelihood)
        )?;
        writeln!(
            f,
            "{:<48}{}",
            format!("Iterations: {}", self.iterations),
            format!("AIC: {:.4}", self.aic)
        )?;
        writeln!(f, "{:<48}{}", "", format!("BIC: {:.4}", self.bic))?;
        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "{:<28}{:>11}{:>11}{:>9}{:>9}   {}",
            "Latent Variable", "Estimate", "Std Error", "z", "P>|z|", "95% C.I."
        )?;
        writeln!(f, "{}", rule)?;

        let coefficients = self.coefficients();
        let last = coefficients.len() - 1;
        for (i, c) in coefficients.iter().enumerate() {
            if i == last {
                writeln!(f, "{:<28}{:>11.4}", c.name, c.estimate)?;
                continue;
            }

            let z = c.z_score();
            let p_value = Normal::new(0.0, 1.0)
                .map(|n| 2.0 * (1.0 - n.cdf(z.abs())))
                .unwrap_or(f64::NAN);
            writeln!(
                f,
                "{:<28}{:>11.4}{:>11.4}{:>9.4}{:>9.4}   ({:.4} | {:.4})",
                c.name,
                c.estimate,
                c.std_error,
                z,
                p_value,
                c.estimate - z_crit * c.std_error,
                c.estimate + z_crit * c.std_error
            )?;
        }
        write!(f, "{}", rule)
    }
}
