//! survival — non-parametric survival estimation primitives.
//!
//! Hosts the Kaplan-Meier product-limit estimator consumed by the
//! conversion-model layer. The estimator is model-agnostic: it works on
//! plain `(time, event_observed)` pairs and knows nothing about conversion
//! semantics; `conversion::models::kaplan_meier` translates between the
//! two worlds (conversion probability is one minus survival).

pub mod kaplan_meier;

pub use self::kaplan_meier::KaplanMeierEstimate;
