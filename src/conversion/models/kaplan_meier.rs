//! Kaplan-Meier conversion model.
//!
//! Wraps the product-limit estimator from [`crate::survival`]: each
//! subject contributes its effective event time — the conversion time if
//! it converted, otherwise its censoring time — with the converted flag
//! as the event indicator. Conversion probability is one minus survival,
//! which flips the confidence band: the *lower* conversion bound comes
//! from the *upper* survival bound and vice versa.
use crate::conversion::{
    core::curve::ConversionBands,
    core::data::Observations,
    errors::{ConversionError, ConversionResult},
    models::{ConversionModel, last_step_at_or_before},
};
use crate::survival::KaplanMeierEstimate;
use ndarray::Array1;

/// Fitted conversion-scale curve derived from the survival estimate.
#[derive(Debug, Clone, PartialEq)]
struct KmCurve {
    times: Vec<f64>,
    conversion: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

/// Kaplan-Meier conversion model with a built-in confidence band.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KaplanMeier {
    fitted: Option<KmCurve>,
}

impl KaplanMeier {
    pub fn new() -> Self {
        Self { fitted: None }
    }

    fn curve(&self) -> ConversionResult<&KmCurve> {
        self.fitted.as_ref().ok_or(ConversionError::ModelNotFitted)
    }
}

impl ConversionModel for KaplanMeier {
    /// Fit the product-limit estimator on effective event times.
    fn fit(&mut self, obs: &Observations) -> ConversionResult<()> {
        let data: Vec<(f64, bool)> = (0..obs.len())
            .map(|i| {
                let t = if obs.converted[i] { obs.convert_times[i] } else { obs.censor_times[i] };
                (t, obs.converted[i])
            })
            .collect();
        let km = KaplanMeierEstimate::from_data(&data);

        // Conversion scale: 1 - S, with the band bounds swapped.
        let conversion = km.survival.iter().map(|&s| 1.0 - s).collect();
        let lower = km.upper.iter().map(|&s| 1.0 - s).collect();
        let upper = km.lower.iter().map(|&s| 1.0 - s).collect();
        self.fitted = Some(KmCurve { times: km.times, conversion, lower, upper });
        Ok(())
    }

    fn predict(&self, ts: &Array1<f64>) -> ConversionResult<Array1<f64>> {
        let curve = self.curve()?;
        Ok(ts.mapv(|t| match last_step_at_or_before(&curve.times, t) {
            Some(j) => curve.conversion[j],
            None => f64::NAN,
        }))
    }

    fn predict_interval(&self, ts: &Array1<f64>) -> ConversionResult<ConversionBands> {
        let curve = self.curve()?;
        let len = ts.len();
        let mut estimate = Array1::from_elem(len, f64::NAN);
        let mut lower = Array1::from_elem(len, f64::NAN);
        let mut upper = Array1::from_elem(len, f64::NAN);
        for (i, &t) in ts.iter().enumerate() {
            if let Some(j) = last_step_at_or_before(&curve.times, t) {
                estimate[i] = curve.conversion[j];
                lower[i] = curve.lower[j];
                upper[i] = curve.upper[j];
            }
        }
        Ok(ConversionBands { estimate, lower, upper })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn mixed_obs() -> Observations {
        Observations::new(
            array![2.0, 0.0, 5.0, 0.0, 8.0],
            array![10.0, 4.0, 10.0, 10.0, 10.0],
            array![true, false, true, false, true],
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify conversion values on a hand-computed product-limit curve:
    // S steps to 4/5 after t=2, holds through the t=4 censoring, then
    // drops to 8/15 after t=5 (risk set 3) and 4/15 after t=8 (risk
    // set 2).
    fn conversion_matches_hand_computed_survival() {
        let mut model = KaplanMeier::new();
        model.fit(&mixed_obs()).unwrap();

        let ts = array![0.0, 2.0, 4.5, 5.0, 8.0, 10.0];
        let p = model.predict(&ts).unwrap();

        assert!((p[0] - 0.0).abs() < 1e-12);
        assert!((p[1] - 0.2).abs() < 1e-12);
        assert!((p[2] - 0.2).abs() < 1e-12);
        assert!((p[3] - 7.0 / 15.0).abs() < 1e-12);
        assert!((p[4] - 11.0 / 15.0).abs() < 1e-12);
        assert!((p[5] - 11.0 / 15.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Verify lifecycle and range behavior: predict before fit fails fast;
    // queries beyond the largest observed time yield NaN.
    fn lifecycle_and_out_of_range() {
        let model = KaplanMeier::new();
        assert!(matches!(
            model.predict(&array![1.0]),
            Err(ConversionError::ModelNotFitted)
        ));

        let mut model = KaplanMeier::new();
        model.fit(&mixed_obs()).unwrap();
        let p = model.predict(&array![10.0, 10.5]).unwrap();
        assert!(!p[0].is_nan());
        assert!(p[1].is_nan());
    }

    #[test]
    // Purpose
    // -------
    // Verify the predicted conversion rate is non-decreasing in t and the
    // swapped band brackets the estimate at every in-range query.
    fn monotone_estimate_with_ordered_band() {
        let mut model = KaplanMeier::new();
        model.fit(&mixed_obs()).unwrap();

        let ts = Array1::linspace(0.0, 10.0, 101);
        let bands = model.predict_interval(&ts).unwrap();

        let rates = bands.estimate.to_vec();
        for w in rates.windows(2) {
            assert!(w[1] >= w[0] - 1e-12);
        }
        for i in 0..ts.len() {
            assert!(bands.lower[i] <= bands.estimate[i] + 1e-9);
            assert!(bands.estimate[i] <= bands.upper[i] + 1e-9);
        }
    }
}
