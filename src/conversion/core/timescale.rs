//! Time units for reporting conversion curves.
//!
//! - [`TimeScale`] declares the granularity elapsed times are expressed in
//!   and carries the seconds-to-unit factor fed to
//!   [`Observations::from_records`](crate::conversion::core::data::Observations::from_records).
//!
//! Notes
//! -----
//! - The scale is chosen from the longest observation horizon so that a
//!   rendered axis lands in a readable range (days for multi-day
//!   horizons, seconds for sub-minute ones).
use chrono::TimeDelta;

/// Units of measurement for elapsed conversion times.
///
/// Selecting a scale does **not** rescale values by itself; it provides
/// the factor the observation builder applies and the label a renderer
/// puts on the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeScale {
    /// Seconds.
    Seconds,
    /// Minutes (60 s).
    Minutes,
    /// Hours (3600 s).
    Hours,
    /// Days (86400 s).
    Days,
}

impl TimeScale {
    /// Pick the coarsest unit not exceeding the observation horizon.
    ///
    /// Horizons of at least a day report in days, at least an hour in
    /// hours, at least a minute in minutes, and anything shorter in
    /// seconds. Non-positive horizons fall through to seconds.
    pub fn from_horizon(horizon: TimeDelta) -> Self {
        if horizon >= TimeDelta::days(1) {
            TimeScale::Days
        } else if horizon >= TimeDelta::hours(1) {
            TimeScale::Hours
        } else if horizon >= TimeDelta::minutes(1) {
            TimeScale::Minutes
        } else {
            TimeScale::Seconds
        }
    }

    /// Seconds-to-unit conversion factor.
    pub fn factor(&self) -> f64 {
        match self {
            TimeScale::Seconds => 1.0,
            TimeScale::Minutes => 1.0 / 60.0,
            TimeScale::Hours => 1.0 / 3600.0,
            TimeScale::Days => 1.0 / 86400.0,
        }
    }

    /// Axis label for external renderers.
    pub fn label(&self) -> &'static str {
        match self {
            TimeScale::Seconds => "Seconds",
            TimeScale::Minutes => "Minutes",
            TimeScale::Hours => "Hours",
            TimeScale::Days => "Days",
        }
    }
}
