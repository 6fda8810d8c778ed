//! Censored gamma MLE of the conversion curve.
//!
//! Model: conversion times follow Gamma(shape `k`, rate `λ`) scaled by the
//! eventual rate `c`, so the probability of having converted by `t` is
//! `c · P(k, λt)` with `P` the regularized lower incomplete gamma
//! function. Converted subjects contribute the density
//! `c · λ^k C^(k−1) e^(−λC) / Γ(k)` (evaluated in log space); pending
//! subjects contribute `(1 − c) + c (1 − P(k, λN))`.
//!
//! Unlike the exponential model there is no analytic gradient — the
//! optimizer's finite-difference fallback differentiates the objective.
//! Bounds follow the exponential model for `c` and `λ`, with
//! `k ∈ [1, 30]`; either `λ` or `k` can be fixed at construction, which
//! collapses that coordinate out of θ.
//!
//! No native confidence interval; wrap the model in a
//! [`Bootstrapper`](crate::conversion::models::bootstrap::Bootstrapper).
use crate::conversion::{
    core::curve::ConversionBands,
    core::data::Observations,
    errors::{ConversionError, ConversionResult},
    models::{
        ConversionModel,
        exponential::{EVENTUAL_RATE_MARGIN, HAZARD_CEILING_SCALE, HAZARD_FLOOR},
        param_map::{BoundedParam, ParamMap},
    },
};
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        Cost, LogLikelihood, MLEOptions, OptimOutcome, Theta, maximize,
        validation::validate_theta,
    },
};
use ndarray::Array1;
use statrs::function::gamma::{gamma_lr, ln_gamma};

/// Admissible shape range; `k = 1` degenerates to the exponential model.
pub const SHAPE_FLOOR: f64 = 1.0;
pub const SHAPE_CEILING: f64 = 30.0;

/// Default initial shape guess.
const SHAPE_INITIAL: f64 = 10.0;

/// Per-subject log-likelihood floor. A zero conversion time under `k > 1`
/// has zero density; flooring its log keeps the total cost finite so the
/// optimizer steers away from that region instead of aborting.
const LOG_LIKELIHOOD_FLOOR: f64 = -700.0;

/// Fitted gamma parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GammaParams {
    /// Eventual (asymptotic) conversion rate.
    pub c: f64,
    /// Conversion rate parameter of the gamma distribution.
    pub lambda: f64,
    /// Shape parameter of the gamma distribution.
    pub shape: f64,
}

/// Censored gamma conversion model.
///
/// Lifecycle and diagnostics mirror
/// [`Exponential`](crate::conversion::models::exponential::Exponential):
/// `fitted_params`/`results` are populated by `fit`, best-effort state is
/// kept on non-convergence, and predict fails fast before the first fit.
#[derive(Debug, Clone, PartialEq)]
pub struct Gamma {
    fixed_lambda: Option<f64>,
    fixed_shape: Option<f64>,
    mle_opts: MLEOptions,
    /// Optimizer outcome of the last fit.
    pub results: Option<OptimOutcome>,
    /// Fitted parameters of the last fit.
    pub fitted_params: Option<GammaParams>,
}

impl Gamma {
    /// Model with free `(c, λ, k)` and default optimizer options.
    pub fn new() -> Self {
        Self {
            fixed_lambda: None,
            fixed_shape: None,
            mle_opts: MLEOptions::default(),
            results: None,
            fitted_params: None,
        }
    }

    /// Model with either parameter clamped to a known value.
    ///
    /// # Errors
    /// [`ConversionError::InvalidFixedParam`] unless each provided value
    /// is finite and strictly positive.
    pub fn with_fixed(lambda: Option<f64>, shape: Option<f64>) -> ConversionResult<Self> {
        if let Some(lambda) = lambda {
            if !lambda.is_finite() || lambda <= 0.0 {
                return Err(ConversionError::InvalidFixedParam {
                    name: "lambda",
                    value: lambda,
                    reason: "rate must be finite and > 0",
                });
            }
        }
        if let Some(shape) = shape {
            if !shape.is_finite() || shape <= 0.0 {
                return Err(ConversionError::InvalidFixedParam {
                    name: "shape",
                    value: shape,
                    reason: "shape must be finite and > 0",
                });
            }
        }
        Ok(Self {
            fixed_lambda: lambda,
            fixed_shape: shape,
            mle_opts: MLEOptions::default(),
            results: None,
            fitted_params: None,
        })
    }

    /// Replace the optimizer options (tolerances, line search, verbosity).
    pub fn with_options(mut self, mle_opts: MLEOptions) -> Self {
        self.mle_opts = mle_opts;
        self
    }

    fn params(&self) -> ConversionResult<&GammaParams> {
        self.fitted_params.as_ref().ok_or(ConversionError::ModelNotFitted)
    }
}

impl Default for Gamma {
    fn default() -> Self {
        Self::new()
    }
}

/// Regularized lower incomplete gamma with the `x ≤ 0` boundary mapped to
/// zero mass, where `gamma_lr` itself is undefined.
fn gamma_cdf(shape: f64, x: f64) -> f64 {
    if x.is_nan() {
        f64::NAN
    } else if x <= 0.0 {
        0.0
    } else {
        gamma_lr(shape, x)
    }
}

/// Likelihood problem handed to the optimizer; declared parameter order
/// is `[c, lambda, shape]`. No `grad` implementation: the adapter falls
/// back to finite differences.
struct GammaLikelihood {
    map: ParamMap,
}

impl LogLikelihood for GammaLikelihood {
    type Data = Observations;

    fn value(&self, theta: &Theta, obs: &Observations) -> OptResult<Cost> {
        let params = self.map.decode(theta);
        let (c, lambda, shape) = (params[0], params[1], params[2]);
        let ln_norm = shape * lambda.ln() - ln_gamma(shape);
        let mut ll = 0.0;
        for i in 0..obs.len() {
            let subject_ll = if obs.converted[i] {
                let t = obs.convert_times[i];
                // (k-1)·ln t at t = 0: 0^0 = 1 for k = 1, zero density
                // above it.
                let shape_term = if t > 0.0 {
                    (shape - 1.0) * t.ln()
                } else if shape == 1.0 {
                    0.0
                } else {
                    f64::NEG_INFINITY
                };
                c.ln() + ln_norm + shape_term - lambda * t
            } else {
                let pending = (1.0 - c) + c * (1.0 - gamma_cdf(shape, lambda * obs.censor_times[i]));
                pending.ln()
            };
            ll += subject_ll.max(LOG_LIKELIHOOD_FLOOR);
        }
        Ok(ll)
    }

    fn check(&self, theta: &Theta, _obs: &Observations) -> OptResult<()> {
        validate_theta(theta, self.map.free_len())
    }
}

impl ConversionModel for Gamma {
    /// Maximize the censored likelihood and cache parameters/diagnostics.
    ///
    /// Initial guess: `c₀` = observed conversion fraction,
    /// `λ₀ = 1/max(N)`, `k₀ = 10`, each pulled inside its box.
    ///
    /// # Errors
    /// Same surface as the exponential fit: `NoConversions`,
    /// `ZeroObservationWindow`, `OptimizationFailed`, and
    /// `OptimizerDidNotConverge` (with best-effort state retained).
    fn fit(&mut self, obs: &Observations) -> ConversionResult<()> {
        if obs.converted_count() == 0 {
            return Err(ConversionError::NoConversions);
        }
        let max_censor = obs.max_censor_time();
        if max_censor <= 0.0 {
            return Err(ConversionError::ZeroObservationWindow);
        }
        let hazard_hi = (HAZARD_CEILING_SCALE / max_censor).max(10.0 * HAZARD_FLOOR);
        let lambda_param = match self.fixed_lambda {
            Some(lambda) => BoundedParam::fixed(lambda),
            None => BoundedParam::new(HAZARD_FLOOR, hazard_hi),
        };
        let shape_param = match self.fixed_shape {
            Some(shape) => BoundedParam::fixed(shape),
            None => BoundedParam::new(SHAPE_FLOOR, SHAPE_CEILING),
        };
        let problem = GammaLikelihood {
            map: ParamMap::new(vec![
                BoundedParam::new(EVENTUAL_RATE_MARGIN, 1.0 - EVENTUAL_RATE_MARGIN),
                lambda_param,
                shape_param,
            ]),
        };
        let theta0 =
            problem.map.encode(&[obs.conversion_fraction(), 1.0 / max_censor, SHAPE_INITIAL]);

        let outcome = maximize(&problem, theta0, obs, &self.mle_opts)?;
        let params = problem.map.decode(&outcome.theta_hat);
        self.fitted_params =
            Some(GammaParams { c: params[0], lambda: params[1], shape: params[2] });
        let converged = outcome.converged;
        let status = outcome.status.clone();
        self.results = Some(outcome);
        if !converged {
            return Err(ConversionError::OptimizerDidNotConverge { status });
        }
        Ok(())
    }

    fn predict(&self, ts: &Array1<f64>) -> ConversionResult<Array1<f64>> {
        let p = self.params()?;
        Ok(ts.mapv(|t| p.c * gamma_cdf(p.shape, p.lambda * t)))
    }

    fn predict_interval(&self, _ts: &Array1<f64>) -> ConversionResult<ConversionBands> {
        Err(ConversionError::ConfidenceIntervalUnsupported { model: "Gamma" })
    }
}
