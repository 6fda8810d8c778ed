//! Kaplan-Meier product-limit estimator for right-censored data.
//!
//! The estimator consumes `(time, event_observed)` pairs, where a `false`
//! flag marks a right-censored observation: the subject was still pending
//! at that time and its true event time is only known to be larger.
//! Standard statistics are biased on such data; the product-limit curve
//! accounts for censoring by shrinking the risk set as subjects leave it.
//!
//! The curve records a step at **every** distinct observed time (event or
//! censor-only), so step lookups cover the full observed horizon; the
//! survival probability only decreases at event times. A 95% confidence
//! band is attached per step using the exponential Greenwood (log-minus-log)
//! formula, which keeps the band inside `[0, 1]` by construction.

/// Standard normal 97.5% quantile used for the 95% confidence band.
const Z_95: f64 = 1.959963984540054;

/// Kaplan-Meier survival curve with a pointwise 95% confidence band.
///
/// Parallel vectors describe the fitted step function; entry `i` is valid
/// on `[times[i], times[i+1])`. The first entry is always the baseline
/// `t = 0, S = 1` unless the data themselves contain time zero.
///
/// Invariants after [`from_data`](KaplanMeierEstimate::from_data):
/// - `times` is strictly increasing and starts at `0.0`.
/// - `survival` is non-increasing with values in `[0, 1]`.
/// - `lower[i] ≤ survival[i] ≤ upper[i]` for every step.
#[derive(Debug, Clone, PartialEq)]
pub struct KaplanMeierEstimate {
    /// Distinct observed times (events and censorings), ascending.
    pub times: Vec<f64>,
    /// Survival probability at each step.
    pub survival: Vec<f64>,
    /// Lower 95% confidence bound on survival at each step.
    pub lower: Vec<f64>,
    /// Upper 95% confidence bound on survival at each step.
    pub upper: Vec<f64>,
    /// Risk-set size just before each step's time.
    pub at_risk: Vec<usize>,
    /// Number of observed events at each step's time.
    pub events: Vec<usize>,
}

impl KaplanMeierEstimate {
    /// Fit the product-limit curve from `(time, event_observed)` pairs.
    ///
    /// `event_observed = true` marks an observed event at that time;
    /// `false` marks a right-censored exit. Ties are handled in the
    /// standard way: all removals at a time share the risk set in place
    /// just before that time.
    ///
    /// Empty input yields an empty curve (no steps); callers validate
    /// non-emptiness where it matters.
    pub fn from_data(data: &[(f64, bool)]) -> Self {
        if data.is_empty() {
            return Self {
                times: vec![],
                survival: vec![],
                lower: vec![],
                upper: vec![],
                at_risk: vec![],
                events: vec![],
            };
        }

        let mut sorted: Vec<(f64, bool)> = data.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = sorted.len();
        let mut times = Vec::new();
        let mut survival = Vec::new();
        let mut lower = Vec::new();
        let mut upper = Vec::new();
        let mut at_risk_vec = Vec::new();
        let mut events_vec = Vec::new();

        // Baseline step unless the earliest observed time is zero itself.
        if sorted[0].0 > 0.0 {
            times.push(0.0);
            survival.push(1.0);
            lower.push(1.0);
            upper.push(1.0);
            at_risk_vec.push(total);
            events_vec.push(0);
        }

        let mut current_survival = 1.0;
        // Greenwood variance accumulator: sum of d / (n (n - d)).
        let mut greenwood = 0.0;

        let mut i = 0;
        while i < total {
            let current_time = sorted[i].0;
            let at_risk = total - i;

            let mut event_count = 0usize;
            let mut j = i;
            while j < total && sorted[j].0 == current_time {
                if sorted[j].1 {
                    event_count += 1;
                }
                j += 1;
            }

            if event_count > 0 {
                let d = event_count as f64;
                let n = at_risk as f64;
                current_survival *= 1.0 - d / n;
                greenwood += d / (n * (n - d));
            }

            let (lo, hi) = exponential_greenwood_band(current_survival, greenwood);
            times.push(current_time);
            survival.push(current_survival);
            lower.push(lo);
            upper.push(hi);
            at_risk_vec.push(at_risk);
            events_vec.push(event_count);

            i = j;
        }

        Self { times, survival, lower, upper, at_risk: at_risk_vec, events: events_vec }
    }
}

/// Pointwise 95% band on the survival probability via the exponential
/// Greenwood (log-minus-log) transform.
///
/// For `s ∈ (0, 1)` the band is `s^exp(±z·sqrt(v)/ln s)`. The transform is
/// undefined at the endpoints: `s = 1` pins the band to `[1, 1]` (nothing
/// has happened yet) and `s = 0` pins it to `[0, 0]`. An exhausted risk
/// set drives the accumulated variance to infinity, which widens the band
/// to `[0, 1]` through the same formula.
fn exponential_greenwood_band(s: f64, greenwood: f64) -> (f64, f64) {
    if s >= 1.0 {
        return (1.0, 1.0);
    }
    if s <= 0.0 {
        return (0.0, 0.0);
    }
    let log_s = s.ln();
    let theta = (-log_s).ln();
    let half_width = Z_95 * greenwood.sqrt() / log_s.abs();
    let lo = (-((theta + half_width).exp())).exp();
    let hi = (-((theta - half_width).exp())).exp();
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Product-limit survival values on a small hand-computed example.
    // - Step recording at censor-only times.
    // - Baseline-row behavior and empty-input behavior.
    // - Confidence-band ordering and endpoint pinning.
    //
    // They intentionally DO NOT cover:
    // - The conversion-model wrapper built on top of this estimator.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify survival values on a hand-computed example with an interior
    // censoring: events at t=1 and t=3, censor at t=2.
    //
    // Expect
    // ------
    // - S = 1 at baseline, 2/3 after t=1, unchanged at t=2, 0 after t=3
    //   (risk set is 1 at t=3 and the subject converts).
    fn survival_matches_hand_computation_with_censoring() {
        let data = vec![(1.0, true), (2.0, false), (3.0, true)];
        let km = KaplanMeierEstimate::from_data(&data);

        assert_eq!(km.times, vec![0.0, 1.0, 2.0, 3.0]);
        assert!((km.survival[0] - 1.0).abs() < 1e-12);
        assert!((km.survival[1] - 2.0 / 3.0).abs() < 1e-12);
        assert!((km.survival[2] - 2.0 / 3.0).abs() < 1e-12);
        assert!((km.survival[3] - 0.0).abs() < 1e-12);
        assert_eq!(km.at_risk, vec![3, 3, 2, 1]);
        assert_eq!(km.events, vec![0, 1, 0, 1]);
    }

    #[test]
    // Purpose
    // -------
    // Verify that ties at a single time share the pre-time risk set:
    // two events among four subjects at t=5 give S = 1/2.
    fn tied_events_share_risk_set() {
        let data = vec![(5.0, true), (5.0, true), (7.0, false), (9.0, false)];
        let km = KaplanMeierEstimate::from_data(&data);

        let idx = km.times.iter().position(|&t| t == 5.0).unwrap();
        assert!((km.survival[idx] - 0.5).abs() < 1e-12);
        assert_eq!(km.at_risk[idx], 4);
        assert_eq!(km.events[idx], 2);
    }

    #[test]
    // Purpose
    // -------
    // Verify endpoint behavior of the confidence band: pinned to [1,1]
    // before any event and ordered lower ≤ S ≤ upper everywhere.
    fn confidence_band_is_ordered_and_pinned() {
        let data: Vec<(f64, bool)> =
            (1..=40).map(|i| (i as f64, i % 3 != 0)).collect();
        let km = KaplanMeierEstimate::from_data(&data);

        assert_eq!(km.lower[0], 1.0);
        assert_eq!(km.upper[0], 1.0);
        for i in 0..km.times.len() {
            assert!(
                km.lower[i] <= km.survival[i] + 1e-12 && km.survival[i] <= km.upper[i] + 1e-12,
                "band ordering violated at step {i}"
            );
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that empty input yields an empty curve and that all-censored
    // input keeps survival at 1 across every step.
    fn empty_and_all_censored_inputs() {
        let km = KaplanMeierEstimate::from_data(&[]);
        assert!(km.times.is_empty());

        let data = vec![(1.0, false), (2.0, false), (3.0, false)];
        let km = KaplanMeierEstimate::from_data(&data);
        assert!(km.survival.iter().all(|&s| s == 1.0));
        assert!(km.lower.iter().all(|&s| s == 1.0));
    }
}
