//! conversion::core — observation containers, units, and curve surfaces.
//!
//! Everything the models consume or hand outward that is not itself a
//! model: the validated `(C, N, B)` observation triple and its builders
//! ([`data`]), time-unit selection ([`timescale`]), and the prediction
//! containers renderers consume ([`curve`]).

pub mod curve;
pub mod data;
pub mod timescale;

pub use self::{
    curve::{ConversionBands, PredictedCurve},
    data::{Observations, SubjectRecord},
    timescale::TimeScale,
};
