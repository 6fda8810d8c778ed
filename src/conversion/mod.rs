//! conversion — censored conversion-rate estimation.
//!
//! Purpose
//! -------
//! Estimate time-to-conversion distributions from right-censored event
//! data: every subject is created at a known time and may or may not have
//! converted by its observation time. The module turns raw per-subject
//! records into a validated observation triple, fits one of four models
//! (or a bootstrap ensemble over a model), and produces conversion-rate
//! curves with confidence bands as a function of elapsed time.
//!
//! Key behaviors
//! -------------
//! - [`core`] validates and carries the `(C, N, B)` observation triple,
//!   selects reporting time units, and packages predicted curves for
//!   external renderers.
//! - [`models`] defines the [`ConversionModel`](models::ConversionModel)
//!   contract and implements the step-function, Kaplan-Meier,
//!   exponential, and gamma estimators plus the
//!   [`Bootstrapper`](models::Bootstrapper) decorator.
//! - [`errors`] normalizes input, degenerate-data, lifecycle, and
//!   optimizer failures into [`ConversionError`](errors::ConversionError).
//!
//! Invariants & assumptions
//! ------------------------
//! - Observation triples are immutable once validated; models read them
//!   and never write back.
//! - `fit` is the only mutating model operation; `predict` is a pure read
//!   valid only after a successful (or explicitly accepted best-effort)
//!   fit.
//! - Out-of-range queries degrade per point (NaN), never per call.
//!
//! Downstream usage
//! ----------------
//! - Build `Observations` via
//!   [`Observations::from_records`](core::data::Observations::from_records)
//!   with a [`TimeScale`](core::timescale::TimeScale) factor, fit a model,
//!   and sample a [`PredictedCurve`](core::curve::PredictedCurve) for
//!   rendering.
//! - Parametric models get their confidence bands exclusively through the
//!   Bootstrapper.

pub mod core;
pub mod errors;
pub mod models;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_conversions::conversion::prelude::*;
//
// to import the main conversion surface in a single line.

pub mod prelude {
    pub use super::core::{
        curve::{ConversionBands, PredictedCurve},
        data::{Observations, SubjectRecord},
        timescale::TimeScale,
    };
    pub use super::errors::{ConversionError, ConversionResult};
    pub use super::models::{
        Bootstrapper, ConversionModel, Exponential, Gamma, KaplanMeier, StepFunction,
    };
}
