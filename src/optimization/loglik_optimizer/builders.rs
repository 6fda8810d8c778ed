//! loglik_optimizer::builders — L-BFGS solver construction helpers.
//!
//! Small, focused builders for the L-BFGS solvers used by the
//! log-likelihood optimizer. They hide Argmin's generic wiring and apply
//! crate-level options (tolerances, memory size) so higher-level code can
//! request a configured solver without touching Argmin-specific types.
//!
//! The builders do **not** set an initial parameter vector or `max_iters`;
//! these are runtime concerns applied by the runner (`run_lbfgs`).
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        traits::MLEOptions,
        types::{DEFAULT_LBFGS_MEM, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente, MoreThuenteLS},
    },
};

/// Construct an L-BFGS solver with Hager–Zhang line search.
///
/// Consults `opts.lbfgs_mem` (falling back to [`DEFAULT_LBFGS_MEM`]) and
/// wires any provided gradient/cost tolerances into the solver.
///
/// # Errors
/// Surfaces Argmin configuration failures (e.g. rejected tolerances) as
/// [`OptError`](crate::optimization::errors::OptError) values.
pub fn build_optimizer_hager_zhang(opts: &MLEOptions) -> OptResult<LbfgsHagerZhang> {
    let linesearch = HagerZhangLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let mut solver = LBFGS::new(linesearch, mem);
    if let Some(tol_grad) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(tol_grad)?;
    }
    if let Some(tol_cost) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(tol_cost)?;
    }
    Ok(solver)
}

/// Construct an L-BFGS solver with More–Thuente line search.
///
/// Same configuration contract as [`build_optimizer_hager_zhang`].
///
/// # Errors
/// Surfaces Argmin configuration failures (e.g. rejected tolerances) as
/// [`OptError`](crate::optimization::errors::OptError) values.
pub fn build_optimizer_more_thuente(opts: &MLEOptions) -> OptResult<LbfgsMoreThuente> {
    let linesearch = MoreThuenteLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let mut solver = LBFGS::new(linesearch, mem);
    if let Some(tol_grad) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(tol_grad)?;
    }
    if let Some(tol_cost) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(tol_cost)?;
    }
    Ok(solver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::loglik_optimizer::traits::{LineSearcher, Tolerances};

    #[test]
    // Purpose
    // -------
    // Verify both builders accept default options and options with an
    // explicit L-BFGS memory.
    fn builders_accept_default_and_explicit_memory() {
        let opts = MLEOptions::default();
        assert!(build_optimizer_hager_zhang(&opts).is_ok());
        assert!(build_optimizer_more_thuente(&opts).is_ok());

        let tols = Tolerances::new(Some(1e-6), None, Some(100)).unwrap();
        let opts = MLEOptions::new(tols, LineSearcher::HagerZhang, false, Some(5)).unwrap();
        assert!(build_optimizer_hager_zhang(&opts).is_ok());
    }
}
