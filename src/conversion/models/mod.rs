//! conversion::models — the model capability contract and its five
//! implementations.
//!
//! Purpose
//! -------
//! Define the [`ConversionModel`] trait every estimator implements and
//! host the concrete strategies: the non-parametric [`StepFunction`],
//! the [`KaplanMeier`] survival wrapper, the parametric [`Exponential`]
//! and [`Gamma`] MLE models, and the [`Bootstrapper`] resampling
//! decorator that equips any base model with empirical confidence bands.
//!
//! Conventions
//! -----------
//! - `fit` mutates internal state and is the only mutation; `predict*`
//!   are pure reads of fitted state and fail fast with `ModelNotFitted`
//!   before the first successful fit.
//! - Query times past a non-parametric model's fitted horizon yield NaN
//!   per point; they never fail the call.
//! - Step-function lookups share [`last_step_at_or_before`]: the last
//!   recorded step with time ≤ t.

pub mod bootstrap;
pub mod exponential;
pub mod gamma;
pub mod kaplan_meier;
pub mod param_map;
pub mod step;

use crate::conversion::{
    core::curve::ConversionBands, core::data::Observations, errors::ConversionResult,
};
use ndarray::Array1;

pub use self::{
    bootstrap::{Bootstrapper, DEFAULT_ENSEMBLE_SIZE},
    exponential::{Exponential, ExponentialParams},
    gamma::{Gamma, GammaParams},
    kaplan_meier::KaplanMeier,
    step::{RISK_SET_FLOOR, StepFunction},
};

/// Capability contract shared by every conversion model.
///
/// Lifecycle: construct (optionally with fixed parameters) → [`fit`]
/// populates fitted state (re-fitting overwrites it) → [`predict`] /
/// [`predict_interval`] read it, repeatably and from multiple logical
/// readers. Calling a predict method before the first successful fit
/// returns [`ModelNotFitted`](crate::conversion::errors::ConversionError::ModelNotFitted).
///
/// [`fit`]: ConversionModel::fit
/// [`predict`]: ConversionModel::predict
/// [`predict_interval`]: ConversionModel::predict_interval
pub trait ConversionModel {
    /// Fit the model to a validated observation triple.
    fn fit(&mut self, obs: &Observations) -> ConversionResult<()>;

    /// Predicted conversion rate at each query time.
    ///
    /// Out-of-range query points yield NaN; they never fail the call.
    fn predict(&self, ts: &Array1<f64>) -> ConversionResult<Array1<f64>>;

    /// Predicted conversion rate with a confidence band at each query
    /// time. Models without a native band return
    /// [`ConfidenceIntervalUnsupported`](crate::conversion::errors::ConversionError::ConfidenceIntervalUnsupported);
    /// wrap them in a [`Bootstrapper`] instead.
    fn predict_interval(&self, ts: &Array1<f64>) -> ConversionResult<ConversionBands>;
}

/// Index of the last recorded step at or before `t`, or `None` when `t`
/// precedes the first step or lies past the final one.
///
/// `times` must be sorted ascending. NaN queries return `None`, which
/// callers surface as a NaN prediction.
pub(crate) fn last_step_at_or_before(times: &[f64], t: f64) -> Option<usize> {
    if times.is_empty() || t.is_nan() {
        return None;
    }
    if t > times[times.len() - 1] {
        return None;
    }
    let idx = times.partition_point(|&x| x <= t);
    if idx == 0 { None } else { Some(idx - 1) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Verify lookup semantics: exact hits, interior times resolving to the
    // preceding step, and both out-of-range directions yielding None.
    fn last_step_lookup_covers_boundaries() {
        let times = [0.0, 1.0, 2.5, 4.0];

        assert_eq!(last_step_at_or_before(&times, 0.0), Some(0));
        assert_eq!(last_step_at_or_before(&times, 1.0), Some(1));
        assert_eq!(last_step_at_or_before(&times, 1.7), Some(1));
        assert_eq!(last_step_at_or_before(&times, 4.0), Some(3));
        assert_eq!(last_step_at_or_before(&times, 4.1), None);
        assert_eq!(last_step_at_or_before(&times, -0.5), None);
        assert_eq!(last_step_at_or_before(&times, f64::NAN), None);
        assert_eq!(last_step_at_or_before(&[], 1.0), None);
    }
}
