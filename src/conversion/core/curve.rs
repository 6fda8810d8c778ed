//! Prediction containers handed to external renderers.
//!
//! - [`ConversionBands`]: per-query point estimate plus lower/upper
//!   confidence bounds, the richer of the two predict outputs.
//! - [`PredictedCurve`]: a fitted model evaluated with bands on a uniform
//!   time grid — the `(t, rate, low, high)` arrays a plotting component
//!   consumes. Rendering itself is out of scope for this crate.
use crate::conversion::{
    errors::ConversionResult,
    models::ConversionModel,
};
use ndarray::Array1;

/// Point estimates with a confidence band, positionally aligned with the
/// query times that produced them.
///
/// Invariant (up to floating tolerance and NaN propagation):
/// `lower[i] ≤ estimate[i] ≤ upper[i]`. Out-of-range query points carry
/// NaN in all three arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionBands {
    /// Point estimate of the conversion rate per query time.
    pub estimate: Array1<f64>,
    /// Lower confidence bound per query time.
    pub lower: Array1<f64>,
    /// Upper confidence bound per query time.
    pub upper: Array1<f64>,
}

impl ConversionBands {
    /// Number of query points the bands cover.
    pub fn len(&self) -> usize {
        self.estimate.len()
    }

    /// Whether the bands cover no query points.
    pub fn is_empty(&self) -> bool {
        self.estimate.is_empty()
    }
}

/// A fitted model sampled on a uniform grid over `[0, t_max]`.
///
/// This is the outward-facing curve surface: renderers plot `rate` against
/// `ts` and fill between `lower` and `upper`.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictedCurve {
    /// Uniform query grid over `[0, t_max]`.
    pub ts: Array1<f64>,
    /// Point estimate at each grid time.
    pub rate: Array1<f64>,
    /// Lower confidence bound at each grid time.
    pub lower: Array1<f64>,
    /// Upper confidence bound at each grid time.
    pub upper: Array1<f64>,
}

impl PredictedCurve {
    /// Evaluate a fitted model with its confidence band on `points`
    /// equally spaced times spanning `[0, t_max]`.
    ///
    /// # Errors
    /// Propagates the model's predict errors (e.g. `ModelNotFitted`, or
    /// `ConfidenceIntervalUnsupported` for a bare parametric model — wrap
    /// those in a Bootstrapper first).
    pub fn sample<M: ConversionModel>(
        model: &M, t_max: f64, points: usize,
    ) -> ConversionResult<Self> {
        let ts = Array1::linspace(0.0, t_max, points);
        let bands = model.predict_interval(&ts)?;
        Ok(Self { ts, rate: bands.estimate, lower: bands.lower, upper: bands.upper })
    }
}
