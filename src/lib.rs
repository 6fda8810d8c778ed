//! rust_conversions — censored conversion-rate modeling with Python
//! bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the conversion-model stack to Python via the
//! `_rust_conversions` extension module. When the `python-bindings`
//! feature is enabled, this module defines the Python-facing classes and
//! submodules used by the `rust_conversions` package.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`conversion`, `survival`,
//!   `optimization`) as the public crate surface.
//! - Define `#[pyclass]` wrappers and the `#[pymodule]` initializer for
//!   the `_rust_conversions` Python extension.
//! - Register the `conversion_models` submodule under `rust_conversions`
//!   so dot-notation imports work as expected.
//!
//! Invariants & assumptions
//! ------------------------
//! - All heavy numerical work is implemented in the inner Rust modules;
//!   this file performs only FFI glue, input validation, and error
//!   mapping.
//! - On successful conversion from Python objects to Rust types, the
//!   invariants documented in the core modules are assumed to hold.
//!
//! Conventions
//! -----------
//! - Python-exposed classes live under
//!   `_rust_conversions.conversion_models` and are typically wrapped by
//!   thin pure-Python facades in the top-level `rust_conversions`
//!   package.
//! - The hazard parameter is spelled `lambd` on the Python surface
//!   (`lambda` is a Python keyword).
//! - Errors from core Rust code are propagated as rich error types
//!   internally and converted to `PyErr` values at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend directly on the inner modules and can
//!   ignore the PyO3 items guarded by the `python-bindings` feature.
//! - External users interact with either the safe Rust APIs or the
//!   pure-Python wrappers; the PyO3 plumbing is considered internal.

pub mod conversion;
pub mod optimization;
pub mod survival;
pub mod utils;

#[cfg(feature = "python-bindings")]
use ndarray::Array1;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    conversion::{
        core::curve::ConversionBands,
        errors::ConversionError,
        models::{
            Bootstrapper, ConversionModel, DEFAULT_ENSEMBLE_SIZE, Exponential, Gamma, KaplanMeier,
            StepFunction,
        },
    },
    utils::{build_observations, extract_f64_array, extract_mle_opts},
};

#[cfg(feature = "python-bindings")]
fn extract_query_times<'py>(py: Python<'py>, ts: &Bound<'py, PyAny>) -> PyResult<Array1<f64>> {
    let arr = extract_f64_array(py, ts)?;
    let slice = arr
        .as_slice()
        .map_err(|_| PyValueError::new_err("ts must be a 1-D contiguous float64 array"))?;
    Ok(Array1::from(slice.to_vec()))
}

#[cfg(feature = "python-bindings")]
fn bands_to_py(bands: ConversionBands) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    (bands.estimate.to_vec(), bands.lower.to_vec(), bands.upper.to_vec())
}

/// Non-parametric step-function model exposed to Python.
///
/// Mirrors [`StepFunction`]: a sweep-line empirical rate with a
/// Beta-quantile interval, truncated once the risk set thins out.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_conversions.conversion_models")]
pub struct StepFunctionModel {
    inner: StepFunction,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl StepFunctionModel {
    #[new]
    #[pyo3(
        text_signature = "(risk_set_floor=30)",
        signature = (risk_set_floor = None)
    )]
    pub fn new(risk_set_floor: Option<usize>) -> Self {
        let inner = match risk_set_floor {
            Some(floor) => StepFunction::with_risk_set_floor(floor),
            None => StepFunction::new(),
        };
        StepFunctionModel { inner }
    }

    pub fn fit<'py>(
        &mut self, py: Python<'py>, convert_times: &Bound<'py, PyAny>,
        censor_times: &Bound<'py, PyAny>, converted: &Bound<'py, PyAny>,
    ) -> PyResult<()> {
        let obs = build_observations(py, convert_times, censor_times, converted)?;
        self.inner.fit(&obs).map_err(Into::into)
    }

    pub fn predict<'py>(&self, py: Python<'py>, ts: &Bound<'py, PyAny>) -> PyResult<Vec<f64>> {
        let ts = extract_query_times(py, ts)?;
        Ok(self.inner.predict(&ts)?.to_vec())
    }

    pub fn predict_interval<'py>(
        &self, py: Python<'py>, ts: &Bound<'py, PyAny>,
    ) -> PyResult<(Vec<f64>, Vec<f64>, Vec<f64>)> {
        let ts = extract_query_times(py, ts)?;
        Ok(bands_to_py(self.inner.predict_interval(&ts)?))
    }
}

/// Kaplan-Meier model exposed to Python, with its built-in band.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_conversions.conversion_models")]
pub struct KaplanMeierModel {
    inner: KaplanMeier,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl KaplanMeierModel {
    #[new]
    pub fn new() -> Self {
        KaplanMeierModel { inner: KaplanMeier::new() }
    }

    pub fn fit<'py>(
        &mut self, py: Python<'py>, convert_times: &Bound<'py, PyAny>,
        censor_times: &Bound<'py, PyAny>, converted: &Bound<'py, PyAny>,
    ) -> PyResult<()> {
        let obs = build_observations(py, convert_times, censor_times, converted)?;
        self.inner.fit(&obs).map_err(Into::into)
    }

    pub fn predict<'py>(&self, py: Python<'py>, ts: &Bound<'py, PyAny>) -> PyResult<Vec<f64>> {
        let ts = extract_query_times(py, ts)?;
        Ok(self.inner.predict(&ts)?.to_vec())
    }

    pub fn predict_interval<'py>(
        &self, py: Python<'py>, ts: &Bound<'py, PyAny>,
    ) -> PyResult<(Vec<f64>, Vec<f64>, Vec<f64>)> {
        let ts = extract_query_times(py, ts)?;
        Ok(bands_to_py(self.inner.predict_interval(&ts)?))
    }
}

/// Censored exponential MLE model exposed to Python.
///
/// Constructed via `ExponentialModel(lambd=None, tol_grad=None, ...)`;
/// passing `lambd` clamps the hazard. Fitted parameters are exposed as
/// the `c` and `lambd` properties, and `converged` reports the last
/// solve's termination class.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_conversions.conversion_models")]
pub struct ExponentialModel {
    inner: Exponential,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl ExponentialModel {
    #[new]
    #[pyo3(
        text_signature = "(lambd=None, tol_grad=None, tol_cost=None, max_iter=None, \
                          line_searcher=None, lbfgs_mem=None)",
        signature = (lambd = None, tol_grad = None, tol_cost = None, max_iter = None,
                     line_searcher = None, lbfgs_mem = None)
    )]
    pub fn new(
        lambd: Option<f64>, tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
        line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
    ) -> PyResult<Self> {
        let opts = extract_mle_opts(tol_grad, tol_cost, max_iter, line_searcher, lbfgs_mem)?;
        let inner = match lambd {
            Some(lambd) => Exponential::with_fixed_rate(lambd)?,
            None => Exponential::new(),
        }
        .with_options(opts);
        Ok(ExponentialModel { inner })
    }

    pub fn fit<'py>(
        &mut self, py: Python<'py>, convert_times: &Bound<'py, PyAny>,
        censor_times: &Bound<'py, PyAny>, converted: &Bound<'py, PyAny>,
    ) -> PyResult<()> {
        let obs = build_observations(py, convert_times, censor_times, converted)?;
        self.inner.fit(&obs).map_err(Into::into)
    }

    pub fn predict<'py>(&self, py: Python<'py>, ts: &Bound<'py, PyAny>) -> PyResult<Vec<f64>> {
        let ts = extract_query_times(py, ts)?;
        Ok(self.inner.predict(&ts)?.to_vec())
    }

    #[getter]
    pub fn c(&self) -> PyResult<f64> {
        match &self.inner.fitted_params {
            Some(params) => Ok(params.c),
            None => Err(ConversionError::ModelNotFitted.into()),
        }
    }

    #[getter]
    pub fn lambd(&self) -> PyResult<f64> {
        match &self.inner.fitted_params {
            Some(params) => Ok(params.lambda),
            None => Err(ConversionError::ModelNotFitted.into()),
        }
    }

    #[getter]
    pub fn converged(&self) -> PyResult<bool> {
        match &self.inner.results {
            Some(results) => Ok(results.converged),
            None => Err(ConversionError::ModelNotFitted.into()),
        }
    }
}

/// Censored gamma MLE model exposed to Python.
///
/// Constructed via `GammaModel(lambd=None, k=None, ...)`; passing `lambd`
/// and/or `k` clamps those parameters.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_conversions.conversion_models")]
pub struct GammaModel {
    inner: Gamma,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl GammaModel {
    #[new]
    #[pyo3(
        text_signature = "(lambd=None, k=None, tol_grad=None, tol_cost=None, max_iter=None, \
                          line_searcher=None, lbfgs_mem=None)",
        signature = (lambd = None, k = None, tol_grad = None, tol_cost = None, max_iter = None,
                     line_searcher = None, lbfgs_mem = None)
    )]
    pub fn new(
        lambd: Option<f64>, k: Option<f64>, tol_grad: Option<f64>, tol_cost: Option<f64>,
        max_iter: Option<usize>, line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
    ) -> PyResult<Self> {
        let opts = extract_mle_opts(tol_grad, tol_cost, max_iter, line_searcher, lbfgs_mem)?;
        let inner = Gamma::with_fixed(lambd, k)?.with_options(opts);
        Ok(GammaModel { inner })
    }

    pub fn fit<'py>(
        &mut self, py: Python<'py>, convert_times: &Bound<'py, PyAny>,
        censor_times: &Bound<'py, PyAny>, converted: &Bound<'py, PyAny>,
    ) -> PyResult<()> {
        let obs = build_observations(py, convert_times, censor_times, converted)?;
        self.inner.fit(&obs).map_err(Into::into)
    }

    pub fn predict<'py>(&self, py: Python<'py>, ts: &Bound<'py, PyAny>) -> PyResult<Vec<f64>> {
        let ts = extract_query_times(py, ts)?;
        Ok(self.inner.predict(&ts)?.to_vec())
    }

    #[getter]
    pub fn c(&self) -> PyResult<f64> {
        match &self.inner.fitted_params {
            Some(params) => Ok(params.c),
            None => Err(ConversionError::ModelNotFitted.into()),
        }
    }

    #[getter]
    pub fn lambd(&self) -> PyResult<f64> {
        match &self.inner.fitted_params {
            Some(params) => Ok(params.lambda),
            None => Err(ConversionError::ModelNotFitted.into()),
        }
    }

    #[getter]
    pub fn k(&self) -> PyResult<f64> {
        match &self.inner.fitted_params {
            Some(params) => Ok(params.shape),
            None => Err(ConversionError::ModelNotFitted.into()),
        }
    }
}

#[cfg(feature = "python-bindings")]
enum BootstrapInner {
    Exponential(Bootstrapper<Exponential>),
    Gamma(Bootstrapper<Gamma>),
}

/// Percentile-bootstrap ensemble over a parametric base model.
///
/// Constructed via `BootstrapModel(base, n_bootstraps=100, seed=None)`
/// where `base` is `"exponential"` or `"gamma"`. `predict_interval`
/// reports the cross-member mean with the 5th/95th percentile band.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_conversions.conversion_models")]
pub struct BootstrapModel {
    inner: BootstrapInner,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl BootstrapModel {
    #[new]
    #[pyo3(
        text_signature = "(base, n_bootstraps=100, seed=None)",
        signature = (base, n_bootstraps = None, seed = None)
    )]
    pub fn new(base: &str, n_bootstraps: Option<usize>, seed: Option<u64>) -> PyResult<Self> {
        let size = n_bootstraps.unwrap_or(DEFAULT_ENSEMBLE_SIZE);
        let inner = match base.to_lowercase().as_str() {
            "exponential" => {
                let mut boot = Bootstrapper::new(Exponential::new, size)?;
                if let Some(seed) = seed {
                    boot = boot.with_seed(seed);
                }
                BootstrapInner::Exponential(boot)
            }
            "gamma" => {
                let mut boot = Bootstrapper::new(Gamma::new, size)?;
                if let Some(seed) = seed {
                    boot = boot.with_seed(seed);
                }
                BootstrapInner::Gamma(boot)
            }
            other => {
                return Err(PyValueError::new_err(format!(
                    "invalid base model {other:?} (expected 'exponential' or 'gamma')"
                )));
            }
        };
        Ok(BootstrapModel { inner })
    }

    pub fn fit<'py>(
        &mut self, py: Python<'py>, convert_times: &Bound<'py, PyAny>,
        censor_times: &Bound<'py, PyAny>, converted: &Bound<'py, PyAny>,
    ) -> PyResult<()> {
        let obs = build_observations(py, convert_times, censor_times, converted)?;
        match &mut self.inner {
            BootstrapInner::Exponential(boot) => boot.fit(&obs)?,
            BootstrapInner::Gamma(boot) => boot.fit(&obs)?,
        }
        Ok(())
    }

    pub fn predict<'py>(&self, py: Python<'py>, ts: &Bound<'py, PyAny>) -> PyResult<Vec<f64>> {
        let ts = extract_query_times(py, ts)?;
        let rates = match &self.inner {
            BootstrapInner::Exponential(boot) => boot.predict(&ts)?,
            BootstrapInner::Gamma(boot) => boot.predict(&ts)?,
        };
        Ok(rates.to_vec())
    }

    pub fn predict_interval<'py>(
        &self, py: Python<'py>, ts: &Bound<'py, PyAny>,
    ) -> PyResult<(Vec<f64>, Vec<f64>, Vec<f64>)> {
        let ts = extract_query_times(py, ts)?;
        let bands = match &self.inner {
            BootstrapInner::Exponential(boot) => boot.predict_interval(&ts)?,
            BootstrapInner::Gamma(boot) => boot.predict_interval(&ts)?,
        };
        Ok(bands_to_py(bands))
    }
}

/// `_rust_conversions` — PyO3 module initializer for the Python
/// extension.
///
/// Creates the `conversion_models` submodule, attaches it to the parent
/// module, and registers it in `sys.modules` so dotted imports work from
/// Python.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_conversions<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let conversion_models_mod = PyModule::new_bound(_py, "conversion_models")?;
    conversion_models(_py, m, &conversion_models_mod)?;

    // Manually add the submodule into sys.modules to allow dot notation.
    _py.import_bound("sys")?
        .getattr("modules")?
        .set_item("rust_conversions.conversion_models", conversion_models_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn conversion_models<'py>(
    _py: Python, rust_conversions: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<StepFunctionModel>()?;
    m.add_class::<KaplanMeierModel>()?;
    m.add_class::<ExponentialModel>()?;
    m.add_class::<GammaModel>()?;
    m.add_class::<BootstrapModel>()?;
    rust_conversions.add_submodule(m)?;
    Ok(())
}
