//! optimization — MLE stack, numerical helpers, and unified error surface.
//!
//! Purpose
//! -------
//! Provide a cohesive optimization layer for censored-likelihood model
//! fitting, combining an Argmin-backed log-likelihood optimizer,
//! numerically stable parameter transforms, and a single error/result
//! surface. Model code implements a log-likelihood, chooses tolerances,
//! and obtains fitted parameters and diagnostics without touching backend
//! solver details.
//!
//! Key behaviors
//! -------------
//! - Expose a high-level API for **maximizing log-likelihoods** `ℓ(θ)`
//!   (`loglik_optimizer`), including solver and stopping-criteria
//!   configuration.
//! - Supply shared numerical primitives (`numerical_stability`) for
//!   mapping unconstrained parameters into bounded model space.
//! - Normalize configuration issues, numerical failures, and backend
//!   solver errors into a single enum (`errors::OptError`) with a common
//!   result alias (`OptResult<T>`).
//!
//! Conventions
//! -----------
//! - All solvers conceptually maximize a log-likelihood `ℓ(θ)` by
//!   minimizing an internal cost `c(θ) = -ℓ(θ)`; user-facing APIs and
//!   outcomes are expressed in terms of `ℓ`.
//! - Parameters and gradients use `ndarray`-based aliases (`Theta`,
//!   `Grad`); mapping between unconstrained θ-space and bounded model
//!   parameters `(c, λ, k)` is handled by the model layer using
//!   numerical-stability helpers.
//! - Public entrypoints that can fail return `OptResult<T>`; callers never
//!   see raw Argmin errors.
//! - This module and its submodules avoid I/O and logging (the optional
//!   `obs_slog` observer being the single, feature-gated exception).

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_conversions::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
