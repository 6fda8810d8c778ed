//! loglik_optimizer — MLE-friendly, argmin-powered log-likelihood optimizer.
//!
//! Purpose
//! -------
//! Provide a high-level, Argmin-backed optimization layer for **maximizing
//! log-likelihoods** `ℓ(θ)`. Conversion models implement a single trait,
//! [`LogLikelihood`], and invoke [`maximize`] to run L-BFGS with a
//! configurable line search, tolerances, and finite-difference fallbacks.
//!
//! Key behaviors
//! -------------
//! - Convert user-supplied log-likelihoods `ℓ(θ)` into Argmin-compatible
//!   cost functions `c(θ) = -ℓ(θ)` via [`adapter::ArgMinAdapter`].
//! - Expose a single entrypoint [`maximize`] that validates the initial
//!   guess, selects a solver via [`builders`], executes it via
//!   [`run::run_lbfgs`], and normalizes results into an [`OptimOutcome`].
//! - Fall back to robust finite differences (central, then forward) when a
//!   model provides no analytic gradient.
//! - Centralize optimizer configuration ([`Tolerances`], [`MLEOptions`])
//!   and input validation ([`validation`]).
//!
//! Conventions
//! -----------
//! - Optimization happens over an unconstrained θ-space; box constraints
//!   and fixed parameters are mapped in and out by the model layer (see
//!   `conversion::models::param_map`).
//! - `OptimOutcome::converged` is `true` only for tolerance-driven exits;
//!   iteration-cap exits carry a best-effort estimate and the caller
//!   decides whether to accept it.
//!
//! Testing notes
//! -------------
//! - Unit tests cover adapter sign conventions, FD fallback, option
//!   validation, and quadratic-optimum recovery; the censored-likelihood
//!   integration tests exercise the full stack end to end.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::{
    api::maximize,
    traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances},
    types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta},
};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::{
        api::maximize,
        traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances},
        types::{Cost, FnEvalMap, Grad, Theta},
    };
}
