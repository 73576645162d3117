//! Quadratic "Laffer curve" of GDP growth on debt service
//!
//! The curve `y = a·x² + b·x` is fitted by Levenberg–Marquardt least
//! squares. With `a < 0` growth peaks at an intermediate debt-service level.

use crate::error::{AnalysisError, Result};
use crate::metrics::{condition_number, FitDiagnostics};
use crate::models::EstimableModel;
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

const N_PARAMS: usize = 2;

/// Laffer curve coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LafferCurve {
    /// Quadratic coefficient
    pub a: f64,
    /// Linear coefficient
    pub b: f64,
}

impl LafferCurve {
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    /// Evaluate the curve at one point
    pub fn evaluate(&self, x: f64) -> f64 {
        self.a * x * x + self.b * x
    }

    /// Evaluate the curve over a grid
    pub fn evaluate_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }

    /// Debt-service level at which growth peaks, if the curve is concave
    pub fn peak(&self) -> Option<f64> {
        if self.a < 0.0 {
            Some(-self.b / (2.0 * self.a))
        } else {
            None
        }
    }

    /// Legend text with both coefficients to three decimals
    pub fn label(&self) -> String {
        format!("fit: a={:5.3}, b={:5.3}", self.a, self.b)
    }

    fn params(&self) -> DVector<f64> {
        DVector::from_vec(vec![self.a, self.b])
    }

    fn from_params(p: &DVector<f64>) -> Self {
        Self::new(p[0], p[1])
    }
}

/// Observations the curve is fitted to
#[derive(Debug, Clone, PartialEq)]
pub struct CurveData {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl CurveData {
    /// Pair up two columns, dropping rows where either value is not finite
    pub fn complete_cases(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(AnalysisError::ShapeMismatch {
                expected: x.len(),
                found: y.len(),
            });
        }

        let (x, y): (Vec<f64>, Vec<f64>) = x
            .iter()
            .zip(y)
            .filter(|(a, b)| a.is_finite() && b.is_finite())
            .map(|(a, b)| (*a, *b))
            .unzip();

        Ok(Self { x, y })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Levenberg–Marquardt settings for the curve fit
#[derive(Debug, Clone)]
pub struct LafferModel {
    name: String,
    /// Starting coefficients
    initial: LafferCurve,
    /// Budget of residual evaluations
    max_evaluations: usize,
    /// Relative reduction of the residual sum of squares treated as converged
    ftol: f64,
    /// Relative step size treated as converged
    xtol: f64,
}

impl Default for LafferModel {
    fn default() -> Self {
        Self {
            name: "Laffer curve".to_string(),
            initial: LafferCurve::new(1.0, 1.0),
            max_evaluations: 200 * (N_PARAMS + 1),
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
        }
    }
}

/// Result of a successful curve fit
#[derive(Debug, Clone)]
pub struct CurveFit {
    pub curve: LafferCurve,
    /// Parameter covariance, `+∞` where it cannot be estimated
    pub covariance: DMatrix<f64>,
    /// Residual sum of squares at the optimum
    pub ssr: f64,
    /// Number of observations used
    pub observations: usize,
    /// Residual evaluations spent
    pub evaluations: usize,
}

impl CurveFit {
    /// In-sample predictions at the fitted observations
    pub fn predict(&self, x: &[f64]) -> Vec<f64> {
        self.curve.evaluate_all(x)
    }

    /// Condition number of the covariance matrix
    pub fn covariance_condition(&self) -> f64 {
        condition_number(&self.covariance)
    }

    /// Stability and goodness-of-fit diagnostics on the fitted data
    pub fn diagnostics(&self, data: &CurveData) -> Result<FitDiagnostics> {
        let predicted = self.predict(&data.x);
        FitDiagnostics::new(&data.y, &predicted, self.covariance_condition())
    }
}

impl LafferModel {
    /// Create a model with a custom starting point and evaluation budget
    pub fn new(initial: LafferCurve, max_evaluations: usize) -> Result<Self> {
        if max_evaluations == 0 {
            return Err(AnalysisError::ValidationError(
                "Evaluation budget must be positive".to_string(),
            ));
        }

        Ok(Self {
            initial,
            max_evaluations,
            ..Self::default()
        })
    }

    fn jacobian(x: &[f64]) -> DMatrix<f64> {
        DMatrix::from_fn(x.len(), N_PARAMS, |i, j| match j {
            0 => x[i] * x[i],
            _ => x[i],
        })
    }

    fn residuals(curve: &LafferCurve, data: &CurveData) -> DVector<f64> {
        DVector::from_iterator(
            data.len(),
            data.x.iter().zip(&data.y).map(|(&x, &y)| y - curve.evaluate(x)),
        )
    }

    fn failure(&self, evaluations: usize, reason: &str) -> AnalysisError {
        AnalysisError::CurveFitError {
            evaluations,
            reason: reason.to_string(),
        }
    }

    /// `pinv(JᵀJ) · SSR / (n − p)` through the singular values of `J`
    fn covariance(jacobian: &DMatrix<f64>, ssr: f64) -> DMatrix<f64> {
        let n = jacobian.nrows();
        if n <= N_PARAMS {
            warn!(observations = n, "covariance of the parameters could not be estimated");
            return DMatrix::from_element(N_PARAMS, N_PARAMS, f64::INFINITY);
        }

        let svd = jacobian.clone().svd(false, true);
        let v_t = match svd.v_t {
            Some(v_t) => v_t,
            None => return DMatrix::from_element(N_PARAMS, N_PARAMS, f64::INFINITY),
        };

        let s_max = svd.singular_values.max();
        let threshold = f64::EPSILON * n.max(N_PARAMS) as f64 * s_max;

        let mut pinv = DMatrix::<f64>::zeros(N_PARAMS, N_PARAMS);
        for (k, &s) in svd.singular_values.iter().enumerate() {
            if s > threshold {
                let v = v_t.row(k).transpose();
                pinv += (&v * v.transpose()) / (s * s);
            }
        }

        pinv * (ssr / (n - N_PARAMS) as f64)
    }
}

impl EstimableModel for LafferModel {
    type Data = CurveData;
    type Fitted = CurveFit;

    fn fit(&self, data: &CurveData) -> Result<CurveFit> {
        if data.len() < N_PARAMS {
            return Err(self.failure(
                0,
                &format!(
                    "need at least {} observations, have {}",
                    N_PARAMS,
                    data.len()
                ),
            ));
        }

        let jacobian = Self::jacobian(&data.x);
        let jtj = jacobian.transpose() * &jacobian;

        let mut curve = self.initial;
        let mut residuals = Self::residuals(&curve, data);
        let mut ssr = residuals.norm_squared();
        let mut evaluations = 1;
        if !ssr.is_finite() {
            return Err(self.failure(evaluations, "residual sum of squares is not finite"));
        }

        let mut lambda = 1e-3;
        let converged = 'outer: loop {
            let gradient = jacobian.transpose() * &residuals;

            loop {
                if evaluations >= self.max_evaluations {
                    break 'outer false;
                }

                let mut damped = jtj.clone();
                for i in 0..N_PARAMS {
                    damped[(i, i)] += lambda * jtj[(i, i)].max(f64::MIN_POSITIVE);
                }

                let step = match damped.lu().solve(&gradient) {
                    Some(step) => step,
                    None => {
                        lambda *= 10.0;
                        if lambda > 1e20 {
                            break 'outer false;
                        }
                        continue;
                    }
                };

                let params = curve.params();
                let small_step = step.norm() <= self.xtol * (params.norm() + self.xtol);

                let candidate = LafferCurve::from_params(&(params + &step));
                let candidate_residuals = Self::residuals(&candidate, data);
                let candidate_ssr = candidate_residuals.norm_squared();
                evaluations += 1;

                if candidate_ssr.is_finite() && candidate_ssr <= ssr {
                    let reduction = (ssr - candidate_ssr) / ssr.max(f64::MIN_POSITIVE);
                    curve = candidate;
                    residuals = candidate_residuals;
                    ssr = candidate_ssr;
                    lambda = (lambda / 10.0).max(1e-12);

                    if reduction <= self.ftol || small_step {
                        break 'outer true;
                    }
                    break;
                }

                // A rejected step this small means the optimum is already reached.
                if small_step {
                    break 'outer true;
                }

                lambda *= 10.0;
                if lambda > 1e20 {
                    break 'outer false;
                }
            }
        };

        if !converged {
            return Err(self.failure(
                evaluations,
                "optimal parameters not found within the evaluation budget",
            ));
        }

        debug!(a = curve.a, b = curve.b, evaluations, ssr, "curve fit converged");

        Ok(CurveFit {
            curve,
            covariance: Self::covariance(&jacobian, ssr),
            ssr,
            observations: data.len(),
            evaluations,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
