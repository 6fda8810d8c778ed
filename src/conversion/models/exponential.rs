//! Censored exponential MLE of the conversion curve.
//!
//! Model: the probability of having converted by time `t` is
//! `c · (1 − e^(−λt))`, where `c` is the eventual conversion rate and `λ`
//! the conversion hazard. Each converted subject contributes the density
//! `c λ e^(−λC)`; each pending subject contributes the probability
//! `(1 − c) + c e^(−λN)` — it either never converts, or converts past its
//! censoring horizon.
//!
//! The fit maximizes the censored log-likelihood with an analytic
//! gradient, over a [`ParamMap`] that expresses the box bounds
//! `c ∈ [1e-4, 1−1e-4]`, `λ ∈ [1e-4, 30/max(N)]` in unconstrained
//! optimizer space. A fixed `λ` supplied at construction collapses that
//! coordinate out of the optimization entirely.
//!
//! This model carries no native confidence interval; wrap it in a
//! [`Bootstrapper`](crate::conversion::models::bootstrap::Bootstrapper)
//! to obtain one.
use crate::conversion::{
    core::curve::ConversionBands,
    core::data::Observations,
    errors::{ConversionError, ConversionResult},
    models::{
        ConversionModel,
        param_map::{BoundedParam, ParamMap},
    },
};
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        Cost, Grad, LogLikelihood, MLEOptions, OptimOutcome, Theta, maximize,
        validation::validate_theta,
    },
};
use ndarray::Array1;

/// Margin keeping the eventual rate away from the degenerate 0/1 bounds.
pub const EVENTUAL_RATE_MARGIN: f64 = 1e-4;

/// Lower bound on the conversion hazard.
pub const HAZARD_FLOOR: f64 = 1e-4;

/// The hazard upper bound is this multiple of `1/max(N)`: hazards above
/// `30/max(N)` would resolve entirely inside a vanishing fraction of the
/// observation window.
pub const HAZARD_CEILING_SCALE: f64 = 30.0;

/// Fitted exponential parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialParams {
    /// Eventual (asymptotic) conversion rate.
    pub c: f64,
    /// Conversion hazard.
    pub lambda: f64,
}

/// Censored exponential conversion model.
///
/// After a successful [`fit`](ConversionModel::fit), `fitted_params`
/// holds the estimate and `results` the optimizer diagnostics. A
/// non-convergent solve keeps both populated (best effort) but reports
/// [`OptimizerDidNotConverge`](ConversionError::OptimizerDidNotConverge),
/// leaving acceptance to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Exponential {
    fixed_lambda: Option<f64>,
    mle_opts: MLEOptions,
    /// Optimizer outcome of the last fit.
    pub results: Option<OptimOutcome>,
    /// Fitted parameters of the last fit.
    pub fitted_params: Option<ExponentialParams>,
}

impl Exponential {
    /// Model with free `(c, λ)` and default optimizer options.
    pub fn new() -> Self {
        Self {
            fixed_lambda: None,
            mle_opts: MLEOptions::default(),
            results: None,
            fitted_params: None,
        }
    }

    /// Model with the hazard clamped to a known value; only `c` is fit.
    ///
    /// # Errors
    /// [`ConversionError::InvalidFixedParam`] unless `lambda` is finite
    /// and strictly positive.
    pub fn with_fixed_rate(lambda: f64) -> ConversionResult<Self> {
        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(ConversionError::InvalidFixedParam {
                name: "lambda",
                value: lambda,
                reason: "hazard must be finite and > 0",
            });
        }
        Ok(Self {
            fixed_lambda: Some(lambda),
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

    fn params(&self) -> ConversionResult<&ExponentialParams> {
        self.fitted_params.as_ref().ok_or(ConversionError::ModelNotFitted)
    }
}

impl Default for Exponential {
    fn default() -> Self {
        Self::new()
    }
}

/// Likelihood problem handed to the optimizer; declared parameter order
/// is `[c, lambda]`.
struct ExponentialLikelihood {
    map: ParamMap,
}

impl LogLikelihood for ExponentialLikelihood {
    type Data = Observations;

    fn value(&self, theta: &Theta, obs: &Observations) -> OptResult<Cost> {
        let params = self.map.decode(theta);
        let (c, lambda) = (params[0], params[1]);
        let mut ll = 0.0;
        for i in 0..obs.len() {
            if obs.converted[i] {
                ll += c.ln() + lambda.ln() - lambda * obs.convert_times[i];
            } else {
                ll += ((1.0 - c) + c * (-lambda * obs.censor_times[i]).exp()).ln();
            }
        }
        Ok(ll)
    }

    /// Analytic gradient in model space, chain-ruled into θ-space.
    ///
    /// Converted subject: `∂ℓ/∂c = 1/c`, `∂ℓ/∂λ = 1/λ − C`.
    /// Pending subject with `L = (1−c) + c e^(−λN)`:
    /// `∂ℓ/∂c = (e^(−λN) − 1)/L`, `∂ℓ/∂λ = −c N e^(−λN) / L`.
    fn grad(&self, theta: &Theta, obs: &Observations) -> OptResult<Grad> {
        let params = self.map.decode(theta);
        let (c, lambda) = (params[0], params[1]);
        let mut d_c = 0.0;
        let mut d_lambda = 0.0;
        for i in 0..obs.len() {
            if obs.converted[i] {
                d_c += 1.0 / c;
                d_lambda += 1.0 / lambda - obs.convert_times[i];
            } else {
                let n = obs.censor_times[i];
                let decay = (-lambda * n).exp();
                let pending = (1.0 - c) + c * decay;
                d_c += (decay - 1.0) / pending;
                d_lambda += -c * n * decay / pending;
            }
        }
        Ok(self.map.grad_to_theta(&[d_c, d_lambda], theta))
    }

    fn check(&self, theta: &Theta, _obs: &Observations) -> OptResult<()> {
        validate_theta(theta, self.map.free_len())
    }
}

impl ConversionModel for Exponential {
    /// Maximize the censored likelihood and cache parameters/diagnostics.
    ///
    /// Initial guess: `c₀` = observed conversion fraction,
    /// `λ₀ = 1/max(N)`, both pulled inside their boxes.
    ///
    /// # Errors
    /// - [`ConversionError::NoConversions`] when no subject converted.
    /// - [`ConversionError::ZeroObservationWindow`] when `max(N) = 0`.
    /// - [`ConversionError::OptimizationFailed`] on solver failure (no
    ///   fitted state is recorded).
    /// - [`ConversionError::OptimizerDidNotConverge`] when the solver
    ///   stopped without meeting a tolerance; fitted state is recorded.
    fn fit(&mut self, obs: &Observations) -> ConversionResult<()> {
        if obs.converted_count() == 0 {
            return Err(ConversionError::NoConversions);
        }
        let max_censor = obs.max_censor_time();
        if max_censor <= 0.0 {
            return Err(ConversionError::ZeroObservationWindow);
        }
        // Keep the hazard box non-degenerate for very long horizons.
        let hazard_hi = (HAZARD_CEILING_SCALE / max_censor).max(10.0 * HAZARD_FLOOR);
        let lambda_param = match self.fixed_lambda {
            Some(lambda) => BoundedParam::fixed(lambda),
            None => BoundedParam::new(HAZARD_FLOOR, hazard_hi),
        };
        let problem = ExponentialLikelihood {
            map: ParamMap::new(vec![
                BoundedParam::new(EVENTUAL_RATE_MARGIN, 1.0 - EVENTUAL_RATE_MARGIN),
                lambda_param,
            ]),
        };
        let theta0 = problem.map.encode(&[obs.conversion_fraction(), 1.0 / max_censor]);

        let outcome = maximize(&problem, theta0, obs, &self.mle_opts)?;
        let params = problem.map.decode(&outcome.theta_hat);
        self.fitted_params = Some(ExponentialParams { c: params[0], lambda: params[1] });
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
        Ok(ts.mapv(|t| p.c * (1.0 - (-p.lambda * t).exp())))
    }

    fn predict_interval(&self, _ts: &Array1<f64>) -> ConversionResult<ConversionBands> {
        Err(ConversionError::ConfidenceIntervalUnsupported { model: "Exponential" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    /// Synthetic censored exponential cohort: each subject converts with
    /// probability `c`; conversion times are Exp(λ), censored at `window`.
    fn synthetic(n: usize, c: f64, lambda: f64, window: f64, seed: u64) -> Observations {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut convert_times = Vec::with_capacity(n);
        let mut censor_times = Vec::with_capacity(n);
        let mut converted = Vec::with_capacity(n);
        for _ in 0..n {
            let eventually = rng.gen_bool(c);
            let t = if eventually {
                let u: f64 = rng.gen();
                -(1.0 - u).ln() / lambda
            } else {
                f64::INFINITY
            };
            if eventually && t <= window {
                convert_times.push(t);
                converted.push(true);
            } else {
                convert_times.push(0.0);
                converted.push(false);
            }
            censor_times.push(window);
        }
        Observations::new(
            Array1::from(convert_times),
            Array1::from(censor_times),
            Array1::from(converted),
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify parameter recovery on a generously identified synthetic
    // cohort: fitted (c, λ) land within 10% of the generating values.
    fn fit_recovers_generating_parameters() {
        let obs = synthetic(5000, 0.3, 0.5, 20.0, 42);
        let mut model = Exponential::new();
        model.fit(&obs).unwrap();

        let p = model.fitted_params.unwrap();
        assert!((p.c - 0.3).abs() / 0.3 < 0.1, "c = {}", p.c);
        assert!((p.lambda - 0.5).abs() / 0.5 < 0.1, "lambda = {}", p.lambda);
        assert!(model.results.unwrap().converged);
    }

    #[test]
    // Purpose
    // -------
    // Verify a fixed hazard is clamped through the fit while `c` is
    // still estimated.
    fn fixed_rate_is_clamped() {
        let obs = synthetic(2000, 0.4, 0.5, 20.0, 7);
        let mut model = Exponential::with_fixed_rate(0.5).unwrap();
        model.fit(&obs).unwrap();

        let p = model.fitted_params.unwrap();
        assert_eq!(p.lambda, 0.5);
        assert!((p.c - 0.4).abs() / 0.4 < 0.15, "c = {}", p.c);

        assert!(matches!(
            Exponential::with_fixed_rate(-1.0),
            Err(ConversionError::InvalidFixedParam { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Verify degenerate-data and lifecycle failures: all-censored input,
    // an all-zero observation window, predict before fit, and the absent
    // native confidence interval.
    fn degenerate_inputs_and_lifecycle_fail_loudly() {
        let all_censored =
            Observations::new(array![0.0, 0.0], array![5.0, 5.0], array![false, false]).unwrap();
        let mut model = Exponential::new();
        assert!(matches!(model.fit(&all_censored), Err(ConversionError::NoConversions)));

        let zero_window =
            Observations::new(array![0.0, 0.0], array![0.0, 0.0], array![true, false]).unwrap();
        let mut model = Exponential::new();
        assert!(matches!(model.fit(&zero_window), Err(ConversionError::ZeroObservationWindow)));

        let model = Exponential::new();
        assert!(matches!(model.predict(&array![1.0]), Err(ConversionError::ModelNotFitted)));

        let mut model = Exponential::new();
        model.fit(&synthetic(500, 0.3, 0.5, 20.0, 3)).unwrap();
        assert!(matches!(
            model.predict_interval(&array![1.0]),
            Err(ConversionError::ConfidenceIntervalUnsupported { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Verify the closed-form prediction: 0 at t=0, c·(1−e^(−λt)) at an
    // interior point, approaching c for large t.
    fn predict_matches_closed_form() {
        let mut model = Exponential::new();
        model.fit(&synthetic(5000, 0.3, 0.5, 20.0, 42)).unwrap();
        let p = *model.fitted_params.as_ref().unwrap();

        let ts = array![0.0, 1.0, 1000.0];
        let rates = model.predict(&ts).unwrap();
        assert_eq!(rates[0], 0.0);
        let expected = p.c * (1.0 - (-p.lambda).exp());
        assert!((rates[1] - expected).abs() < 1e-12);
        assert!((rates[2] - p.c).abs() < 1e-9);
    }
}
