//! Observation containers for censored conversion models.
//!
//! Purpose
//! -------
//! Provide small, validated containers for right-censored conversion data.
//! This module centralizes input validation for the observation triple
//! `(C, N, B)` and standardizes how raw per-subject records are turned
//! into the numeric arrays every model consumes.
//!
//! Key behaviors
//! -------------
//! - [`SubjectRecord`] captures one subject's raw timeline: created,
//!   possibly converted, observed until.
//! - [`Observations`] enforces the triple's invariants (equal lengths,
//!   non-empty, finite, non-negative, conversion before censoring, the
//!   0.0 sentinel for unconverted subjects) at construction time.
//! - [`Observations::from_records`] is the deterministic, single-pass
//!   builder from records to arrays; it performs no filtering — dropping
//!   bad records is the caller's job, and invalid elapsed times surface
//!   as errors instead.
//! - [`Observations::resample`] draws a with-replacement bootstrap
//!   resample that keeps each subject's `(C, N, B)` triple intact.
//!
//! Invariants & assumptions
//! ------------------------
//! - `C[i] = 0.0` is the reserved sentinel for unconverted subjects. A
//!   converted subject may also legitimately have `C[i] = 0.0`
//!   (conversion at creation time); the two cases are distinguished via
//!   `B` only, never via `C == 0`.
//! - For converted subjects, `C[i] ≤ N[i]`: a conversion can only have
//!   been observed inside the subject's observation window.
//! - Once constructed, the triple is immutable; models treat it as a
//!   shared read-only input.
//!
//! Conventions
//! -----------
//! - Elapsed times are expressed in the unit chosen by the caller via the
//!   seconds-to-unit `time_factor` (see `core::timescale`).
//! - Indexing is 0-based and positional across the three arrays.
use crate::conversion::errors::{ConversionError, ConversionResult};
use chrono::{DateTime, Utc};
use ndarray::Array1;
use rand::Rng;

/// One subject's raw timeline.
///
/// A record says when the subject entered the population, when (if ever)
/// it converted, and when it was last observed. The observation time acts
/// as the right-censoring point for subjects that have not converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectRecord {
    /// When the subject was created.
    pub created_at: DateTime<Utc>,
    /// When the subject converted, if it has.
    pub converted_at: Option<DateTime<Utc>>,
    /// When the subject was last observed (the censoring point).
    pub observed_at: DateTime<Utc>,
}

impl SubjectRecord {
    /// Construct a record; a plain data carrier with no validation.
    ///
    /// Timeline consistency (creation before conversion, conversion inside
    /// the observation window) is checked when the record is turned into
    /// [`Observations`], where a violation can be reported with its index.
    pub fn new(
        created_at: DateTime<Utc>, converted_at: Option<DateTime<Utc>>, observed_at: DateTime<Utc>,
    ) -> Self {
        Self { created_at, converted_at, observed_at }
    }
}

/// `Observations` — validated, immutable `(C, N, B)` observation triple.
///
/// Purpose
/// -------
/// Represent the sole input to every model's fit operation: per subject,
/// the elapsed time to conversion (`convert_times`, 0.0 if unconverted),
/// the elapsed time to the censoring point (`censor_times`), and the
/// converted flag (`converted`). Centralizing validation here lets model
/// code assume clean, positionally aligned arrays.
///
/// Fields
/// ------
/// - `convert_times`: `Array1<f64>`
///   Elapsed time to conversion; `0.0` for unconverted subjects (the
///   reserved sentinel) and for zero-delay conversions.
/// - `censor_times`: `Array1<f64>`
///   Elapsed time to the subject's observation/censoring point.
/// - `converted`: `Array1<bool>`
///   Whether the subject converted inside its observation window.
///
/// Invariants
/// ----------
/// - All three arrays share the same non-zero length.
/// - All times are finite and non-negative.
/// - `converted[i]` implies `convert_times[i] ≤ censor_times[i]`.
/// - `!converted[i]` implies `convert_times[i] == 0.0`.
///
/// Notes
/// -----
/// - Models must distinguish "converted at time zero" from "never
///   converted" via `converted`, never via `convert_times == 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Observations {
    /// Elapsed time to conversion (0.0 sentinel if unconverted).
    pub convert_times: Array1<f64>,
    /// Elapsed time to the censoring point.
    pub censor_times: Array1<f64>,
    /// Converted flag.
    pub converted: Array1<bool>,
}

impl Observations {
    /// Construct a validated observation triple.
    ///
    /// Parameters
    /// ----------
    /// - `convert_times`: elapsed conversion times (0.0 for unconverted).
    /// - `censor_times`: elapsed censoring times.
    /// - `converted`: converted flags.
    ///
    /// Returns
    /// -------
    /// `ConversionResult<Observations>` — `Ok` if every invariant holds,
    /// otherwise the first violation found, with its array name and index.
    ///
    /// Errors
    /// ------
    /// - [`ConversionError::EmptyObservations`] for zero-length input.
    /// - [`ConversionError::LengthMismatch`] when the arrays disagree.
    /// - [`ConversionError::NonFiniteValue`] / [`ConversionError::NegativeValue`]
    ///   for invalid elapsed times.
    /// - [`ConversionError::ConversionAfterCensor`] when a conversion falls
    ///   outside its observation window.
    /// - [`ConversionError::UnconvertedNonzeroTime`] when an unconverted
    ///   subject does not carry the 0.0 sentinel.
    pub fn new(
        convert_times: Array1<f64>, censor_times: Array1<f64>, converted: Array1<bool>,
    ) -> ConversionResult<Self> {
        if convert_times.len() != censor_times.len() || censor_times.len() != converted.len() {
            return Err(ConversionError::LengthMismatch {
                convert_len: convert_times.len(),
                censor_len: censor_times.len(),
                flag_len: converted.len(),
            });
        }
        if convert_times.is_empty() {
            return Err(ConversionError::EmptyObservations);
        }
        for (index, (&c, (&n, &b))) in convert_times
            .iter()
            .zip(censor_times.iter().zip(converted.iter()))
            .enumerate()
        {
            validate_elapsed("convert times", index, c)?;
            validate_elapsed("censor times", index, n)?;
            if b && c > n {
                return Err(ConversionError::ConversionAfterCensor {
                    index,
                    convert_time: c,
                    censor_time: n,
                });
            }
            if !b && c != 0.0 {
                return Err(ConversionError::UnconvertedNonzeroTime { index, value: c });
            }
        }
        Ok(Self { convert_times, censor_times, converted })
    }

    /// Build the observation triple from raw subject records.
    ///
    /// Deterministic, single pass, no filtering: every record contributes
    /// exactly one entry, and `time_factor` converts elapsed seconds into
    /// the caller's chosen unit. A record converted at its creation
    /// instant yields `C = 0, B = true` — a real zero-delay conversion,
    /// preserved as such.
    ///
    /// Errors
    /// ------
    /// - [`ConversionError::InvalidTimeFactor`] for a non-finite or
    ///   non-positive factor.
    /// - Any validation error from [`Observations::new`], e.g. a record
    ///   whose conversion predates its creation shows up as a negative
    ///   elapsed time.
    pub fn from_records(records: &[SubjectRecord], time_factor: f64) -> ConversionResult<Self> {
        if !time_factor.is_finite() || time_factor <= 0.0 {
            return Err(ConversionError::InvalidTimeFactor { value: time_factor });
        }
        let mut convert_times = Vec::with_capacity(records.len());
        let mut censor_times = Vec::with_capacity(records.len());
        let mut converted = Vec::with_capacity(records.len());
        for record in records {
            let c = match record.converted_at {
                Some(converted_at) => elapsed(record.created_at, converted_at) * time_factor,
                None => 0.0,
            };
            convert_times.push(c);
            censor_times.push(elapsed(record.created_at, record.observed_at) * time_factor);
            converted.push(record.converted_at.is_some());
        }
        Self::new(Array1::from(convert_times), Array1::from(censor_times), Array1::from(converted))
    }

    /// Number of subjects.
    pub fn len(&self) -> usize {
        self.converted.len()
    }

    /// Whether the triple is empty (never true after validation).
    pub fn is_empty(&self) -> bool {
        self.converted.is_empty()
    }

    /// Number of converted subjects.
    pub fn converted_count(&self) -> usize {
        self.converted.iter().filter(|&&b| b).count()
    }

    /// Fraction of subjects that converted, the natural initial guess for
    /// the eventual conversion rate.
    pub fn conversion_fraction(&self) -> f64 {
        self.converted_count() as f64 / self.len() as f64
    }

    /// Largest censoring time, which scales the admissible hazard range.
    pub fn max_censor_time(&self) -> f64 {
        self.censor_times.iter().fold(0.0_f64, |acc, &n| acc.max(n))
    }

    /// Draw a with-replacement bootstrap resample of the same size.
    ///
    /// Each draw copies one subject's full `(C, N, B)` triple, preserving
    /// the joint per-subject structure. Validation is skipped: a resample
    /// of a valid triple is valid by construction.
    pub fn resample<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let n = self.len();
        let mut convert_times = Vec::with_capacity(n);
        let mut censor_times = Vec::with_capacity(n);
        let mut converted = Vec::with_capacity(n);
        for _ in 0..n {
            let j = rng.gen_range(0..n);
            convert_times.push(self.convert_times[j]);
            censor_times.push(self.censor_times[j]);
            converted.push(self.converted[j]);
        }
        Self {
            convert_times: Array1::from(convert_times),
            censor_times: Array1::from(censor_times),
            converted: Array1::from(converted),
        }
    }
}

/// Elapsed seconds between two instants, with sub-second precision.
fn elapsed(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

/// Reject non-finite or negative elapsed times.
fn validate_elapsed(array: &'static str, index: usize, value: f64) -> ConversionResult<()> {
    if !value.is_finite() {
        return Err(ConversionError::NonFiniteValue { array, index, value });
    }
    if value < 0.0 {
        return Err(ConversionError::NegativeValue { array, index, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify the happy path: records with a mix of converted and pending
    // subjects produce the expected arrays under a unit factor.
    fn from_records_builds_expected_triple() {
        let records = vec![
            SubjectRecord::new(ts(0), Some(ts(60)), ts(600)),
            SubjectRecord::new(ts(0), None, ts(600)),
            SubjectRecord::new(ts(0), Some(ts(0)), ts(600)),
        ];
        let obs = Observations::from_records(&records, 1.0).unwrap();

        assert_eq!(obs.convert_times, array![60.0, 0.0, 0.0]);
        assert_eq!(obs.censor_times, array![600.0, 600.0, 600.0]);
        assert_eq!(obs.converted, array![true, false, true]);
        // Zero-delay conversion and the unconverted sentinel coincide in C
        // but are distinguished by the flag.
        assert!(obs.converted[2] && !obs.converted[1]);
        assert_eq!(obs.converted_count(), 2);
    }

    #[test]
    // Purpose
    // -------
    // Verify the time factor rescales elapsed seconds into the chosen unit.
    fn from_records_applies_time_factor() {
        let records = vec![SubjectRecord::new(ts(0), Some(ts(7200)), ts(86400))];
        let obs = Observations::from_records(&records, 1.0 / 3600.0).unwrap();

        assert!((obs.convert_times[0] - 2.0).abs() < 1e-12);
        assert!((obs.censor_times[0] - 24.0).abs() < 1e-12);

        assert!(matches!(
            Observations::from_records(&records, 0.0),
            Err(ConversionError::InvalidTimeFactor { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Verify each validation path: mismatched lengths, empty input,
    // non-finite and negative times, conversion past the censoring point,
    // and a nonzero time on an unconverted subject.
    fn new_rejects_invalid_triples() {
        let err = Observations::new(array![1.0], array![1.0, 2.0], array![true]);
        assert!(matches!(err, Err(ConversionError::LengthMismatch { .. })));

        let err = Observations::new(array![], array![], Array1::from(vec![]));
        assert!(matches!(err, Err(ConversionError::EmptyObservations)));

        let err = Observations::new(array![f64::NAN], array![1.0], array![true]);
        assert!(matches!(err, Err(ConversionError::NonFiniteValue { .. })));

        let err = Observations::new(array![0.0], array![-1.0], array![false]);
        assert!(matches!(err, Err(ConversionError::NegativeValue { .. })));

        let err = Observations::new(array![5.0], array![2.0], array![true]);
        assert!(matches!(err, Err(ConversionError::ConversionAfterCensor { .. })));

        let err = Observations::new(array![3.0], array![10.0], array![false]);
        assert!(matches!(err, Err(ConversionError::UnconvertedNonzeroTime { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Verify resampling preserves size and joint per-subject structure:
    // every drawn triple must equal one of the source triples.
    fn resample_preserves_joint_structure() {
        let obs = Observations::new(
            array![1.0, 0.0, 3.0, 0.0],
            array![10.0, 20.0, 30.0, 40.0],
            array![true, false, true, false],
        )
        .unwrap();

        let mut rng = SmallRng::seed_from_u64(7);
        let resampled = obs.resample(&mut rng);
        assert_eq!(resampled.len(), obs.len());

        for i in 0..resampled.len() {
            let triple = (
                resampled.convert_times[i],
                resampled.censor_times[i],
                resampled.converted[i],
            );
            let found = (0..obs.len()).any(|j| {
                triple == (obs.convert_times[j], obs.censor_times[j], obs.converted[j])
            });
            assert!(found, "resampled triple {triple:?} not present in source");
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify the summary accessors used by the parametric initial guesses.
    fn summary_accessors_match_hand_counts() {
        let obs = Observations::new(
            array![1.0, 0.0, 3.0, 0.0],
            array![10.0, 20.0, 30.0, 40.0],
            array![true, false, true, false],
        )
        .unwrap();

        assert_eq!(obs.len(), 4);
        assert_eq!(obs.converted_count(), 2);
        assert!((obs.conversion_fraction() - 0.5).abs() < 1e-12);
        assert!((obs.max_censor_time() - 40.0).abs() < 1e-12);
    }
}
