//! Percentile-bootstrap ensemble over any base conversion model.
//!
//! The Bootstrapper decorates a base model with empirical uncertainty:
//! it owns a fixed-size ensemble of independently constructed members,
//! fits each one on an independent with-replacement resample of the
//! observation triple (the joint per-subject structure preserved), and
//! reports the cross-member mean as the point estimate with the 5th/95th
//! empirical percentiles as the confidence band. No normality assumption
//! anywhere.
//!
//! Members are fit in parallel via rayon as a pure performance
//! optimization: each member owns a private seeded `SmallRng` stream, so
//! resampling draws stay independent across members regardless of
//! scheduling, and results are identical to a sequential fit under the
//! same base seed.
use crate::conversion::{
    core::curve::ConversionBands,
    core::data::Observations,
    errors::{ConversionError, ConversionResult},
    models::ConversionModel,
};
use ndarray::Array1;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Default number of ensemble members.
pub const DEFAULT_ENSEMBLE_SIZE: usize = 100;

/// Resampling ensemble wrapper implementing [`ConversionModel`].
///
/// The ensemble size is fixed for the lifetime of the instance.
/// Re-fitting redraws every member's resample; a failed fit (e.g. a
/// resample that lost every conversion) poisons the whole call and the
/// ensemble stays unusable until a later fit succeeds.
#[derive(Debug, Clone)]
pub struct Bootstrapper<M> {
    members: Vec<M>,
    seed: Option<u64>,
    fitted: bool,
}

impl<M: ConversionModel + Send> Bootstrapper<M> {
    /// Build an ensemble of `ensemble_size` fresh members from a factory.
    ///
    /// # Errors
    /// [`ConversionError::InvalidEnsembleSize`] for an empty ensemble.
    pub fn new<F: FnMut() -> M>(mut factory: F, ensemble_size: usize) -> ConversionResult<Self> {
        if ensemble_size == 0 {
            return Err(ConversionError::InvalidEnsembleSize { size: ensemble_size });
        }
        let members = (0..ensemble_size).map(|_| factory()).collect();
        Ok(Self { members, seed: None, fitted: false })
    }

    /// Build an ensemble of [`DEFAULT_ENSEMBLE_SIZE`] members.
    pub fn with_default_size<F: FnMut() -> M>(factory: F) -> ConversionResult<Self> {
        Self::new(factory, DEFAULT_ENSEMBLE_SIZE)
    }

    /// Seed the resampling streams for reproducible ensembles.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of ensemble members.
    pub fn ensemble_size(&self) -> usize {
        self.members.len()
    }

    fn ensure_fitted(&self) -> ConversionResult<()> {
        if self.fitted { Ok(()) } else { Err(ConversionError::ModelNotFitted) }
    }
}

impl<M: ConversionModel + Send> ConversionModel for Bootstrapper<M> {
    /// Fit every member on its own with-replacement resample.
    ///
    /// Per-member seeds are drawn up front from one base generator (the
    /// user seed, or entropy), then the members fit in parallel with
    /// private `SmallRng` streams.
    fn fit(&mut self, obs: &Observations) -> ConversionResult<()> {
        self.fitted = false;
        let mut seed_rng = match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let seeds: Vec<u64> = (0..self.members.len()).map(|_| seed_rng.gen()).collect();

        self.members
            .par_iter_mut()
            .zip(seeds.into_par_iter())
            .try_for_each(|(member, seed)| {
                let mut rng = SmallRng::seed_from_u64(seed);
                member.fit(&obs.resample(&mut rng))
            })?;
        self.fitted = true;
        Ok(())
    }

    /// Cross-member mean at each query time.
    fn predict(&self, ts: &Array1<f64>) -> ConversionResult<Array1<f64>> {
        self.ensure_fitted()?;
        let mut acc = Array1::<f64>::zeros(ts.len());
        for member in &self.members {
            acc += &member.predict(ts)?;
        }
        Ok(acc / self.members.len() as f64)
    }

    /// Cross-member mean with the 5th/95th percentile band.
    ///
    /// Percentiles interpolate linearly between order statistics. A
    /// non-finite member value at a query point (e.g. a step-function
    /// member past its horizon) makes all three outputs NaN there.
    fn predict_interval(&self, ts: &Array1<f64>) -> ConversionResult<ConversionBands> {
        self.ensure_fitted()?;
        let predictions: Vec<Array1<f64>> = self
            .members
            .iter()
            .map(|member| member.predict(ts))
            .collect::<ConversionResult<_>>()?;

        let len = ts.len();
        let mut estimate = Array1::from_elem(len, f64::NAN);
        let mut lower = Array1::from_elem(len, f64::NAN);
        let mut upper = Array1::from_elem(len, f64::NAN);
        let mut column = Vec::with_capacity(self.members.len());
        for i in 0..len {
            column.clear();
            column.extend(predictions.iter().map(|p| p[i]));
            if column.iter().any(|v| !v.is_finite()) {
                continue;
            }
            column.sort_by(|a, b| a.total_cmp(b));
            estimate[i] = column.iter().sum::<f64>() / column.len() as f64;
            lower[i] = percentile(&column, 0.05);
            upper[i] = percentile(&column, 0.95);
        }
        Ok(ConversionBands { estimate, lower, upper })
    }
}

/// Linear-interpolation percentile of an ascending-sorted sample.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
    }
}
