//! Parameter maps between optimizer θ-space and bounded model space.
//!
//! The parametric models optimize over an unconstrained vector θ while
//! their likelihoods are written in terms of box-bounded parameters such
//! as `c ∈ [1e-4, 1-1e-4]`. A [`ParamMap`] owns that correspondence:
//! each declared [`BoundedParam`] either maps one θ coordinate through
//! the scaled logistic, or is **fixed** and contributes no coordinate at
//! all — the "bounds collapse to the fixed value" semantics for clamped
//! parameters.
//!
//! The map also pushes analytic model-space gradients back into θ-space
//! via the chain rule, so a model's `grad` implementation can stay in the
//! natural parameterization.
use crate::optimization::{
    loglik_optimizer::{Grad, Theta},
    numerical_stability::transformations::{
        bounded_logistic, bounded_logistic_deriv, bounded_logit,
    },
};
use ndarray::Array1;

/// One model parameter: either free inside an open box `(lo, hi)` or
/// fixed at a constant supplied at model construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundedParam {
    lo: f64,
    hi: f64,
    fixed: Option<f64>,
}

impl BoundedParam {
    /// A free parameter constrained to the open interval `(lo, hi)`.
    ///
    /// Callers supply finite bounds with `lo < hi`; the model layer owns
    /// those constants.
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi, fixed: None }
    }

    /// A parameter clamped to `value`: excluded from θ entirely.
    pub fn fixed(value: f64) -> Self {
        Self { lo: value, hi: value, fixed: Some(value) }
    }

    /// Whether this parameter contributes a θ coordinate.
    pub fn is_free(&self) -> bool {
        self.fixed.is_none()
    }
}

/// Ordered collection of model parameters with their θ correspondence.
///
/// Free parameters consume θ coordinates in declaration order; fixed ones
/// are skipped. All conversions preserve the declared order on the
/// model-space side.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamMap {
    params: Vec<BoundedParam>,
}

impl ParamMap {
    pub fn new(params: Vec<BoundedParam>) -> Self {
        Self { params }
    }

    /// Number of free (θ-space) coordinates.
    pub fn free_len(&self) -> usize {
        self.params.iter().filter(|p| p.is_free()).count()
    }

    /// Encode model-space initial values (one per declared parameter,
    /// fixed ones included and ignored) into an initial θ vector.
    ///
    /// Values outside a parameter's box are pulled into its interior by
    /// the clamping logit, so a boundary guess still starts the optimizer
    /// at a finite point.
    pub fn encode(&self, values: &[f64]) -> Theta {
        debug_assert_eq!(values.len(), self.params.len());
        let theta: Vec<f64> = self
            .params
            .iter()
            .zip(values.iter())
            .filter(|(p, _)| p.is_free())
            .map(|(p, &v)| bounded_logit(v, p.lo, p.hi))
            .collect();
        Array1::from(theta)
    }

    /// Decode a θ vector into model-space values in declared order,
    /// substituting fixed parameters where they were clamped.
    pub fn decode(&self, theta: &Theta) -> Vec<f64> {
        let mut free = theta.iter();
        self.params
            .iter()
            .map(|p| match p.fixed {
                Some(v) => v,
                None => {
                    let x = *free.next().expect("theta shorter than free params");
                    bounded_logistic(x, p.lo, p.hi)
                }
            })
            .collect()
    }

    /// Chain-rule a model-space gradient (one partial per declared
    /// parameter) into a θ-space gradient over the free coordinates.
    pub fn grad_to_theta(&self, model_grad: &[f64], theta: &Theta) -> Grad {
        debug_assert_eq!(model_grad.len(), self.params.len());
        let mut free_idx = 0usize;
        let mut out = Vec::with_capacity(self.free_len());
        for (p, &g) in self.params.iter().zip(model_grad.iter()) {
            if p.is_free() {
                out.push(g * bounded_logistic_deriv(theta[free_idx], p.lo, p.hi));
                free_idx += 1;
            }
        }
        Array1::from(out)
    }
}
