//! Integration tests for the censored conversion-model pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end flow: from raw subject records, through
//!   observation-array construction and time-unit selection, to model
//!   fitting, prediction, and bootstrap confidence bands.
//! - Exercise realistic parameter regimes (large cohorts, heavy
//!   censoring) rather than toy edge cases only.
//!
//! Coverage
//! --------
//! - `conversion::core`:
//!   - `Observations::from_records` with a `TimeScale`-derived factor.
//!   - `PredictedCurve` sampling for renderer consumption.
//! - `conversion::models`:
//!   - Exponential parameter recovery at scale, including the heavy-tail
//!     censoring regime (c = 0.05, λ = 0.1, window 100).
//!   - Gamma parameter recovery through the finite-difference path.
//!   - Step-function and Kaplan-Meier monotonicity, boundary behavior,
//!     and interval ordering.
//!   - Bootstrap ensemble mean and 5th/95th band against the analytic
//!     binomial (Beta) quantiles.
//! - `optimization::loglik_optimizer`:
//!   - L-BFGS via `MLEOptions`/`Tolerances` exercised through the model
//!     fits.
//!
//! Exclusions
//! ----------
//! - Fine-grained validation of low-level building blocks (transforms,
//!   parameter maps, validation helpers) — covered by unit tests.
//! - Python bindings — exercised at a higher system level.
use chrono::{TimeDelta, TimeZone, Utc};
use ndarray::{Array1, array};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rust_conversions::conversion::{
    core::{
        curve::PredictedCurve,
        data::{Observations, SubjectRecord},
        timescale::TimeScale,
    },
    errors::ConversionError,
    models::{Bootstrapper, ConversionModel, Exponential, Gamma, KaplanMeier, StepFunction},
};
use statrs::distribution::{Beta, ContinuousCDF};

/// Purpose
/// -------
/// Generate a censored exponential cohort: each subject eventually
/// converts with probability `c`; conversion delays are Exp(`lambda`),
/// right-censored at `window`.
///
/// Returns
/// -------
/// - A validated `Observations` triple of length `n` with the unconverted
///   sentinel (`C = 0`) on every pending subject.
///
/// Invariants
/// ----------
/// - Deterministic for a fixed `seed`; draws are i.i.d. across subjects.
fn exponential_cohort(n: usize, c: f64, lambda: f64, window: f64, seed: u64) -> Observations {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut convert_times = Vec::with_capacity(n);
    let mut censor_times = Vec::with_capacity(n);
    let mut converted = Vec::with_capacity(n);
    for _ in 0..n {
        let eventually = rng.gen_bool(c);
        let delay = if eventually {
            let u: f64 = rng.gen();
            -(1.0 - u).ln() / lambda
        } else {
            f64::INFINITY
        };
        if eventually && delay <= window {
            convert_times.push(delay);
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
    .expect("synthetic cohort should satisfy the observation invariants")
}

/// Purpose
/// -------
/// Generate a censored gamma cohort analogous to `exponential_cohort`,
/// with conversion delays Gamma(shape `k`, rate `lambda`).
fn gamma_cohort(n: usize, c: f64, lambda: f64, k: f64, window: f64, seed: u64) -> Observations {
    use rand_distr::{Distribution, Gamma as GammaDist};

    let mut rng = SmallRng::seed_from_u64(seed);
    let dist = GammaDist::new(k, 1.0 / lambda).expect("valid gamma shape/scale");
    let mut convert_times = Vec::with_capacity(n);
    let mut censor_times = Vec::with_capacity(n);
    let mut converted = Vec::with_capacity(n);
    for _ in 0..n {
        let eventually = rng.gen_bool(c);
        let delay = if eventually { dist.sample(&mut rng) } else { f64::INFINITY };
        if eventually && delay <= window {
            convert_times.push(delay);
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
    .expect("synthetic cohort should satisfy the observation invariants")
}

#[test]
// Purpose
// -------
// End-to-end record flow: subject records spanning a multi-day horizon
// select the Days scale, build the expected arrays, and feed a model.
fn records_to_observations_to_fit() {
    let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let day = 86_400i64;
    let mut records = Vec::new();
    for i in 0..200i64 {
        let created = base + TimeDelta::seconds(i * 60);
        let converted_at = if i % 4 == 0 {
            Some(created + TimeDelta::seconds(day * (1 + i % 5)))
        } else {
            None
        };
        records.push(SubjectRecord::new(created, converted_at, created + TimeDelta::seconds(day * 10)));
    }

    let horizon = TimeDelta::seconds(day * 10);
    let scale = TimeScale::from_horizon(horizon);
    assert_eq!(scale, TimeScale::Days);

    let obs = Observations::from_records(&records, scale.factor()).unwrap();
    assert_eq!(obs.len(), 200);
    assert!((obs.max_censor_time() - 10.0).abs() < 1e-9);
    assert_eq!(obs.converted_count(), 50);

    let mut model = KaplanMeier::new();
    model.fit(&obs).unwrap();
    let p = model.predict(&array![10.0]).unwrap();
    assert!(p[0] > 0.0 && p[0] <= 0.25 + 1e-9);
}

#[test]
// Purpose
// -------
// The committed recovery scenario: n = 100 000 subjects with true
// c = 0.05, λ = 0.1 and an effectively infinite window (N ≡ 100).
//
// Expect
// ------
// - Fitted c ∈ [0.0475, 0.0525] and λ ∈ [0.095, 0.105].
fn exponential_recovery_at_scale() {
    let obs = exponential_cohort(100_000, 0.05, 0.1, 100.0, 20_240_517);
    let mut model = Exponential::new();
    model.fit(&obs).unwrap();

    let p = model.fitted_params.unwrap();
    assert!(p.c > 0.0475 && p.c < 0.0525, "c = {}", p.c);
    assert!(p.lambda > 0.095 && p.lambda < 0.105, "lambda = {}", p.lambda);
}

#[test]
// Purpose
// -------
// Gamma recovery through the finite-difference path on a large cohort:
// fitted (c, λ, k) land within 5% of the generating values.
fn gamma_recovery_at_scale() {
    let obs = gamma_cohort(30_000, 0.3, 0.3, 3.0, 60.0, 7_331);
    let mut model = Gamma::new();
    model.fit(&obs).unwrap();

    let p = model.fitted_params.unwrap();
    assert!((p.c - 0.3).abs() / 0.3 < 0.05, "c = {}", p.c);
    assert!((p.lambda - 0.3).abs() / 0.3 < 0.05, "lambda = {}", p.lambda);
    assert!((p.shape - 3.0).abs() / 3.0 < 0.05, "shape = {}", p.shape);
}

#[test]
// Purpose
// -------
// Monotonicity of the non-parametric estimators over their fitted
// horizons on a common cohort, plus the step-function boundary contract:
// rate at t = 0 is the earliest recorded step and queries past the
// cutoff yield NaN.
fn nonparametric_monotonicity_and_boundaries() {
    let obs = exponential_cohort(5_000, 0.4, 0.5, 10.0, 99);

    let mut step = StepFunction::new();
    step.fit(&obs).unwrap();
    let mut km = KaplanMeier::new();
    km.fit(&obs).unwrap();

    let ts = Array1::linspace(0.0, 9.5, 300);
    for rates in [step.predict(&ts).unwrap(), km.predict(&ts).unwrap()] {
        for w in rates.to_vec().windows(2) {
            assert!(w[1] >= w[0] - 1e-12, "rate decreased: {} -> {}", w[0], w[1]);
        }
    }

    // No zero-delay conversions in this cohort: the earliest step is 0.
    let at_zero = step.predict(&array![0.0]).unwrap();
    assert_eq!(at_zero[0], 0.0);

    // Far beyond the risk-set cutoff horizon.
    let beyond = step.predict(&array![1e12]).unwrap();
    assert!(beyond[0].is_nan());
}

#[test]
// Purpose
// -------
// Interval ordering across every model with a confidence band: at each
// in-range query, lower ≤ estimate ≤ upper (NaN-banded points skipped).
fn interval_ordering_across_models() {
    let obs = exponential_cohort(4_000, 0.3, 0.4, 12.0, 123);
    let ts = Array1::linspace(0.2, 11.0, 40);

    let mut step = StepFunction::new();
    step.fit(&obs).unwrap();
    let mut km = KaplanMeier::new();
    km.fit(&obs).unwrap();
    let mut boot = Bootstrapper::new(Exponential::new, 40).unwrap().with_seed(4);
    boot.fit(&obs).unwrap();

    let step_bands = step.predict_interval(&ts).unwrap();
    let km_bands = km.predict_interval(&ts).unwrap();
    let boot_bands = boot.predict_interval(&ts).unwrap();
    for bands in [step_bands, km_bands, boot_bands] {
        for i in 0..ts.len() {
            if bands.lower[i].is_nan() || bands.upper[i].is_nan() {
                continue;
            }
            assert!(bands.lower[i] <= bands.estimate[i] + 1e-9, "at query {i}");
            assert!(bands.estimate[i] <= bands.upper[i] + 1e-9, "at query {i}");
        }
    }
}

#[test]
// Purpose
// -------
// The committed bootstrap scenario: 100 exponential members over the
// c = 0.05, λ = 0.1 cohort, evaluated at an effectively final horizon.
//
// Expect
// ------
// - Ensemble mean within 5% of the true eventual rate.
// - The 5th/95th percentile band within 5% relative error of the
//   analytic Beta(n·c, n·(1−c)) quantiles.
// - predict without refitting is idempotent (pure read).
fn bootstrap_band_matches_analytic_quantiles() {
    let n = 100_000usize;
    let true_c = 0.05;
    let obs = exponential_cohort(n, true_c, 0.1, 100.0, 8_675_309);

    let mut boot = Bootstrapper::with_default_size(Exponential::new).unwrap().with_seed(77);
    boot.fit(&obs).unwrap();

    let far = array![500.0];
    let bands = boot.predict_interval(&far).unwrap();
    assert!((bands.estimate[0] - true_c).abs() / true_c < 0.05, "mean = {}", bands.estimate[0]);

    let reference = Beta::new(n as f64 * true_c, n as f64 * (1.0 - true_c)).unwrap();
    let q05 = reference.inverse_cdf(0.05);
    let q95 = reference.inverse_cdf(0.95);
    assert!((bands.lower[0] - q05).abs() / q05 < 0.05, "p5 = {} vs {}", bands.lower[0], q05);
    assert!((bands.upper[0] - q95).abs() / q95 < 0.05, "p95 = {} vs {}", bands.upper[0], q95);

    let again = boot.predict_interval(&far).unwrap();
    assert_eq!(bands, again);
}

#[test]
// Purpose
// -------
// Cross-model agreement on exponentially generated data: the parametric
// fit and the Kaplan-Meier curve tell the same story inside the observed
// window.
fn parametric_and_nonparametric_curves_agree() {
    let obs = exponential_cohort(20_000, 0.4, 0.5, 15.0, 314);

    let mut exp = Exponential::new();
    exp.fit(&obs).unwrap();
    let mut km = KaplanMeier::new();
    km.fit(&obs).unwrap();

    let ts = Array1::linspace(0.5, 12.0, 24);
    let exp_rates = exp.predict(&ts).unwrap();
    let km_rates = km.predict(&ts).unwrap();
    for i in 0..ts.len() {
        assert!(
            (exp_rates[i] - km_rates[i]).abs() < 0.02,
            "curves diverge at t = {}: {} vs {}",
            ts[i],
            exp_rates[i],
            km_rates[i]
        );
    }
}

#[test]
// Purpose
// -------
// Renderer-facing surface: a bootstrapped model sampled on a uniform
// grid yields aligned (t, rate, low, high) arrays, and the error paths
// of the curve sampler are explicit (bare parametric models have no
// band to sample).
fn predicted_curve_sampling_for_renderers() {
    let obs = exponential_cohort(3_000, 0.3, 0.4, 12.0, 55);

    let mut exp = Exponential::new();
    exp.fit(&obs).unwrap();
    assert!(matches!(
        PredictedCurve::sample(&exp, 12.0, 50),
        Err(ConversionError::ConfidenceIntervalUnsupported { .. })
    ));

    let mut boot = Bootstrapper::new(Exponential::new, 30).unwrap().with_seed(12);
    boot.fit(&obs).unwrap();
    let curve = PredictedCurve::sample(&boot, 12.0, 50).unwrap();
    assert_eq!(curve.ts.len(), 50);
    assert_eq!(curve.rate.len(), 50);
    assert_eq!(curve.ts[0], 0.0);
    assert!((curve.ts[49] - 12.0).abs() < 1e-9);
    // The sampled band brackets the sampled rate away from t = 0.
    for i in 1..50 {
        assert!(curve.lower[i] <= curve.rate[i] + 1e-9);
        assert!(curve.rate[i] <= curve.upper[i] + 1e-9);
    }
}
