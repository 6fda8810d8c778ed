//! Errors for censored conversion modeling (observation validation,
//! degenerate-data policies, model lifecycle, and optimizer failures).
//!
//! This module defines [`ConversionError`], used across the model layer and
//! the optional Python-facing API. It implements `Display`/`Error` and
//! converts to `PyErr` when the `python-bindings` feature is enabled.
//!
//! ## Conventions
//! - **Indices are 0-based** and refer to positions in the observation
//!   triple `(C, N, B)`.
//! - Elapsed times must be finite and non-negative; `C = 0` with the
//!   converted flag set is a legal zero-delay conversion, while `C = 0`
//!   with the flag clear is the unconverted sentinel.
//! - Optimizer/backend errors are normalized to
//!   [`ConversionError::OptimizationFailed`] with a human-readable status.
//! - Out-of-range predictions are **not** errors; they surface as per-point
//!   NaN values.
use crate::optimization::errors::OptError;

/// Crate-wide result alias for conversion-model operations.
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Unified error type for censored conversion modeling.
///
/// Covers input/data validation, degenerate-data rejection, model
/// lifecycle misuse, and estimation failures. Implements
/// `Display`/`Error` and converts to a Python `ValueError` at PyO3
/// boundaries.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionError {
    // ---- Input/data validation ----
    /// Observation triple is empty.
    EmptyObservations,

    /// The three observation arrays have different lengths.
    LengthMismatch { convert_len: usize, censor_len: usize, flag_len: usize },

    /// An elapsed time is NaN/±inf.
    NonFiniteValue { array: &'static str, index: usize, value: f64 },

    /// An elapsed time is negative.
    NegativeValue { array: &'static str, index: usize, value: f64 },

    /// A converted subject's conversion time exceeds its censoring time.
    ConversionAfterCensor { index: usize, convert_time: f64, censor_time: f64 },

    /// An unconverted subject must carry the 0.0 conversion-time sentinel.
    UnconvertedNonzeroTime { index: usize, value: f64 },

    /// The seconds-to-unit factor must be finite and strictly positive.
    InvalidTimeFactor { value: f64 },

    // ---- Degenerate data ----
    /// No subject converted; the censored likelihood has no interior
    /// optimum, so parametric fits refuse the data outright.
    NoConversions,

    /// Every censoring time is zero, leaving no observation window to
    /// bound the hazard rate.
    ZeroObservationWindow,

    // ---- Model configuration ----
    /// A fixed parameter override is outside its admissible domain.
    InvalidFixedParam { name: &'static str, value: f64, reason: &'static str },

    /// Bootstrap ensembles need at least one member.
    InvalidEnsembleSize { size: usize },

    // ---- Model lifecycle ----
    /// predict was called before fit.
    ModelNotFitted,

    /// The model has no native confidence interval; wrap it in a
    /// Bootstrapper to obtain one.
    ConfidenceIntervalUnsupported { model: &'static str },

    // ---- Estimation / optimizer ----
    /// The solver stopped without meeting a tolerance (e.g. iteration
    /// cap). Best-effort parameters and diagnostics remain on the model;
    /// the caller decides whether to accept them.
    OptimizerDidNotConverge { status: String },

    /// Optimizer failed outright; include a human-readable status/reason.
    OptimizationFailed { status: String },
}

impl std::error::Error for ConversionError {}

impl std::fmt::Display for ConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversionError::EmptyObservations => {
                write!(f, "Observation arrays must not be empty")
            }
            ConversionError::LengthMismatch { convert_len, censor_len, flag_len } => {
                write!(
                    f,
                    "Observation arrays must have equal lengths: \
                     convert times {convert_len}, censor times {censor_len}, flags {flag_len}"
                )
            }
            ConversionError::NonFiniteValue { array, index, value } => {
                write!(f, "Non-finite value in {array} at index {index}: {value}")
            }
            ConversionError::NegativeValue { array, index, value } => {
                write!(f, "Negative value in {array} at index {index}: {value}")
            }
            ConversionError::ConversionAfterCensor { index, convert_time, censor_time } => {
                write!(
                    f,
                    "Subject {index} converted at {convert_time} but was only observed \
                     until {censor_time}"
                )
            }
            ConversionError::UnconvertedNonzeroTime { index, value } => {
                write!(
                    f,
                    "Subject {index} is flagged unconverted but has conversion time {value}; \
                     unconverted subjects carry the 0.0 sentinel"
                )
            }
            ConversionError::InvalidTimeFactor { value } => {
                write!(f, "Time factor must be finite and > 0, got {value}")
            }
            ConversionError::NoConversions => {
                write!(f, "No subject converted; parametric fitting requires at least one")
            }
            ConversionError::ZeroObservationWindow => {
                write!(f, "All censoring times are zero; no observation window to fit against")
            }
            ConversionError::InvalidFixedParam { name, value, reason } => {
                write!(f, "Invalid fixed parameter {name} = {value}: {reason}")
            }
            ConversionError::InvalidEnsembleSize { size } => {
                write!(f, "Bootstrap ensemble size must be at least 1, got {size}")
            }
            ConversionError::ModelNotFitted => {
                write!(f, "Model hasn't been fitted yet")
            }
            ConversionError::ConfidenceIntervalUnsupported { model } => {
                write!(
                    f,
                    "{model} has no native confidence interval; wrap it in a Bootstrapper"
                )
            }
            ConversionError::OptimizerDidNotConverge { status } => {
                write!(f, "Optimizer stopped without converging: {status}")
            }
            ConversionError::OptimizationFailed { status } => {
                write!(f, "Optimization failed: {status}")
            }
        }
    }
}

impl From<OptError> for ConversionError {
    fn from(err: OptError) -> Self {
        ConversionError::OptimizationFailed { status: err.to_string() }
    }
}

#[cfg(feature = "python-bindings")]
impl From<ConversionError> for pyo3::PyErr {
    fn from(err: ConversionError) -> Self {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
