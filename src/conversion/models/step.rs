//! Non-parametric step-function estimator of the conversion rate.
//!
//! The fit is a single sweep over two merged event streams: a success
//! event at each converted subject's conversion time, and an exit event at
//! every subject's censoring time (the subject leaves the risk set; if it
//! had converted, its success leaves with it — past its own horizon a
//! subject no longer counts toward the rate). The sweep records the
//! running `(t, k, n)` empirical rate `k/n` and stops once the remaining
//! risk set becomes too thin to estimate from, rather than extrapolating
//! into the tail.
use crate::conversion::{
    core::curve::ConversionBands,
    core::data::Observations,
    errors::{ConversionError, ConversionResult},
    models::{ConversionModel, last_step_at_or_before},
};
use ndarray::Array1;
use statrs::distribution::{Beta, ContinuousCDF};

/// Default risk-set floor: the sweep stops once fewer subjects remain.
pub const RISK_SET_FLOOR: usize = 30;

/// Recorded sweep state: positionally aligned step times, cumulative
/// successes, and risk-set sizes.
#[derive(Debug, Clone, PartialEq)]
struct StepCurve {
    times: Vec<f64>,
    successes: Vec<usize>,
    risk_sizes: Vec<usize>,
}

/// Non-parametric step-function conversion model.
///
/// `predict` answers with the empirical rate `k/n` at the last recorded
/// step at or before the query time; `predict_interval` adds a
/// Beta-quantile credible interval on `(k, n-k)`. Query times past the
/// recorded horizon (including everything beyond the risk-set cutoff)
/// yield NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct StepFunction {
    risk_set_floor: usize,
    fitted: Option<StepCurve>,
}

impl StepFunction {
    /// Model with the default risk-set floor of 30 subjects.
    pub fn new() -> Self {
        Self { risk_set_floor: RISK_SET_FLOOR, fitted: None }
    }

    /// Model with an explicit risk-set floor. A floor of zero disables
    /// the cutoff and records the sweep to the last exit.
    pub fn with_risk_set_floor(risk_set_floor: usize) -> Self {
        Self { risk_set_floor, fitted: None }
    }

    fn curve(&self) -> ConversionResult<&StepCurve> {
        self.fitted.as_ref().ok_or(ConversionError::ModelNotFitted)
    }
}

impl Default for StepFunction {
    fn default() -> Self {
        Self::new()
    }
}

/// Event kinds ordered so that, at equal timestamps, conversions are
/// applied before exits; a subject converting at its own censoring time
/// is counted before it leaves the risk set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    Conversion,
    Exit { was_converted: bool },
}

impl ConversionModel for StepFunction {
    /// Sweep the merged event streams and record the step curve.
    ///
    /// Every fit starts from `(t=0, k=0, n=len)` and appends one step per
    /// event in ascending time order. The step that drops the risk set
    /// below the floor is still recorded; the sweep stops right after it.
    fn fit(&mut self, obs: &Observations) -> ConversionResult<()> {
        let total = obs.len();
        let mut events: Vec<(f64, EventKind)> = Vec::with_capacity(total + obs.converted_count());
        for i in 0..total {
            if obs.converted[i] {
                events.push((obs.convert_times[i], EventKind::Conversion));
            }
            events.push((
                obs.censor_times[i],
                EventKind::Exit { was_converted: obs.converted[i] },
            ));
        }
        events.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut k = 0usize;
        let mut n = total;
        let mut curve = StepCurve {
            times: vec![0.0],
            successes: vec![0],
            risk_sizes: vec![total],
        };
        for (t, kind) in events {
            match kind {
                EventKind::Conversion => k += 1,
                EventKind::Exit { was_converted } => {
                    n -= 1;
                    if was_converted {
                        k -= 1;
                    }
                }
            }
            curve.times.push(t);
            curve.successes.push(k);
            curve.risk_sizes.push(n);
            if n < self.risk_set_floor {
                break;
            }
        }
        self.fitted = Some(curve);
        Ok(())
    }

    fn predict(&self, ts: &Array1<f64>) -> ConversionResult<Array1<f64>> {
        let curve = self.curve()?;
        Ok(ts.mapv(|t| match last_step_at_or_before(&curve.times, t) {
            Some(j) if curve.risk_sizes[j] > 0 => {
                curve.successes[j] as f64 / curve.risk_sizes[j] as f64
            }
            _ => f64::NAN,
        }))
    }

    /// Point estimate plus the 5th/95th Beta quantiles on `(k, n-k)`.
    ///
    /// The Beta shapes degenerate when `k = 0` or `k = n`; those steps
    /// keep their point estimate but carry NaN bounds, matching the
    /// undefined quantiles of a zero shape parameter.
    fn predict_interval(&self, ts: &Array1<f64>) -> ConversionResult<ConversionBands> {
        let curve = self.curve()?;
        let len = ts.len();
        let mut estimate = Array1::from_elem(len, f64::NAN);
        let mut lower = Array1::from_elem(len, f64::NAN);
        let mut upper = Array1::from_elem(len, f64::NAN);
        for (i, &t) in ts.iter().enumerate() {
            if let Some(j) = last_step_at_or_before(&curve.times, t) {
                let k = curve.successes[j] as f64;
                let n = curve.risk_sizes[j] as f64;
                if n > 0.0 {
                    estimate[i] = k / n;
                }
                if let Ok(beta) = Beta::new(k, n - k) {
                    lower[i] = beta.inverse_cdf(0.05);
                    upper[i] = beta.inverse_cdf(0.95);
                }
            }
        }
        Ok(ConversionBands { estimate, lower, upper })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small_obs() -> Observations {
        // Four subjects observed to t=10: conversions at 1 and 3, one
        // subject censored early at t=2 without converting.
        Observations::new(
            array![1.0, 0.0, 3.0, 0.0],
            array![10.0, 2.0, 10.0, 10.0],
            array![true, false, true, false],
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify the sweep on a hand-traced example: rates step up at each
    // conversion, the early censor shrinks the risk set, and queries past
    // the final exit are NaN.
    fn sweep_matches_hand_trace() {
        let mut model = StepFunction::with_risk_set_floor(0);
        model.fit(&small_obs()).unwrap();

        let ts = array![0.0, 1.0, 2.0, 2.5, 3.0, 9.0, 10.0, 11.0];
        let rates = model.predict(&ts).unwrap();

        assert_eq!(rates[0], 0.0); // before any event
        assert!((rates[1] - 0.25).abs() < 1e-12); // k=1, n=4
        assert!((rates[2] - 1.0 / 3.0).abs() < 1e-12); // censor exits: k=1, n=3
        assert!((rates[3] - 1.0 / 3.0).abs() < 1e-12);
        assert!((rates[4] - 2.0 / 3.0).abs() < 1e-12); // k=2, n=3
        assert!((rates[5] - 2.0 / 3.0).abs() < 1e-12);
        assert!(rates[7].is_nan()); // past the horizon
    }

    #[test]
    // Purpose
    // -------
    // Verify predict fails fast before fit and that the risk-set floor
    // truncates the recorded horizon.
    fn predict_before_fit_and_floor_cutoff() {
        let model = StepFunction::new();
        assert!(matches!(
            model.predict(&array![1.0]),
            Err(ConversionError::ModelNotFitted)
        ));

        // Floor of 4 stops the sweep at the first exit (n drops to 3).
        let mut model = StepFunction::with_risk_set_floor(4);
        model.fit(&small_obs()).unwrap();
        let rates = model.predict(&array![2.0, 2.1]).unwrap();
        assert!((rates[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!(rates[1].is_nan(), "past the truncated horizon");
    }

    #[test]
    // Purpose
    // -------
    // Verify the predicted rate is non-decreasing in t over the fitted
    // horizon when no converted subject exits early.
    fn rate_is_monotone_when_no_converted_exit() {
        let n = 200usize;
        let convert_times: Vec<f64> =
            (0..n).map(|i| if i % 4 == 0 { (i as f64) / 10.0 } else { 0.0 }).collect();
        let converted: Vec<bool> = (0..n).map(|i| i % 4 == 0).collect();
        let censor_times = vec![100.0; n];
        let obs = Observations::new(
            Array1::from(convert_times),
            Array1::from(censor_times),
            Array1::from(converted),
        )
        .unwrap();

        let mut model = StepFunction::new();
        model.fit(&obs).unwrap();
        let ts = Array1::linspace(0.0, 99.0, 250);
        let rates = model.predict(&ts).unwrap();
        for w in rates.to_vec().windows(2) {
            assert!(w[1] >= w[0] - 1e-12, "rate decreased: {} -> {}", w[0], w[1]);
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify interval ordering lower ≤ estimate ≤ upper wherever the Beta
    // shapes are non-degenerate, and NaN bounds when k = 0.
    fn interval_ordering_and_degenerate_shapes() {
        let mut model = StepFunction::with_risk_set_floor(0);
        model.fit(&small_obs()).unwrap();

        let ts = array![0.0, 1.5, 3.5];
        let bands = model.predict_interval(&ts).unwrap();

        // k = 0 at t = 0: estimate defined, bounds undefined.
        assert_eq!(bands.estimate[0], 0.0);
        assert!(bands.lower[0].is_nan());

        for i in 1..ts.len() {
            assert!(bands.lower[i] <= bands.estimate[i] + 1e-9);
            assert!(bands.estimate[i] <= bands.upper[i] + 1e-9);
        }
    }
}
