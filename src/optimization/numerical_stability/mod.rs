//! numerical_stability — numerically robust parameter transforms.
//!
//! Purpose
//! -------
//! Collect the stable scalar transforms used to map unconstrained
//! optimizer parameters into model space for censored conversion models.
//! Centralizing the transform logic here lets the optimizer and model
//! layers assume well-conditioned `f64` arithmetic.
//!
//! Key behaviors
//! -------------
//! - Stable softplus/logistic helpers for mapping unconstrained reals into
//!   strictly positive or `(0, 1)` parameters without overflow/underflow.
//! - A bounded logistic/logit pair expressing box constraints
//!   `(lo, hi)` as unconstrained coordinates, plus its derivative for
//!   chain-ruling analytic gradients.
//!
//! Conventions
//! -----------
//! - All routines are pure scalar helpers; domain validation (finite
//!   bounds, `lo < hi`) is enforced by the model layer that owns the
//!   parameter maps, not here.
//! - This module never logs, performs I/O, or touches global state; it is
//!   suitable for use inside tight likelihood loops.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    INTERIOR_MARGIN, bounded_logistic, bounded_logistic_deriv, bounded_logit, safe_logistic,
    safe_softplus, safe_softplus_inv,
};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_conversions::optimization::numerical_stability::prelude::*;
//
// to import the main numerical-stability surface in a single line.

pub mod prelude {
    pub use super::transformations::{
        INTERIOR_MARGIN, bounded_logistic, bounded_logistic_deriv, bounded_logit, safe_logistic,
        safe_softplus, safe_softplus_inv,
    };
}
