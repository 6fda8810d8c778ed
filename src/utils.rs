#[cfg(feature = "python-bindings")]
use ndarray::Array1;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    conversion::core::data::Observations,
    optimization::loglik_optimizer::traits::{LineSearcher, MLEOptions, Tolerances},
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
};

/// Extract a contiguous 1-D `f64` array from a numpy array, pandas
/// series, or any sequence of floats.
#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray_bound(py).readonly())
}

/// Extract a boolean flag vector from a numpy bool array or any sequence
/// of bools.
#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_bool_vec<'py>(_py: Python<'py>, raw_data: &Bound<'py, PyAny>) -> PyResult<Vec<bool>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<bool>>() {
        if let Ok(slice) = arr_ro.as_slice() {
            return Ok(slice.to_vec());
        }
    }
    raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err("expected a 1-D numpy.ndarray or sequence of bool")
    })
}

/// Build a validated [`Observations`] triple from Python-facing arrays.
#[cfg(feature = "python-bindings")]
pub fn build_observations<'py>(
    py: Python<'py>, convert_times: &Bound<'py, PyAny>, censor_times: &Bound<'py, PyAny>,
    converted: &Bound<'py, PyAny>,
) -> PyResult<Observations> {
    let c_arr = extract_f64_array(py, convert_times)?;
    let n_arr = extract_f64_array(py, censor_times)?;
    let c_slice = c_arr.as_slice().map_err(|_| {
        PyValueError::new_err("convert_times must be a 1-D contiguous float64 array or sequence")
    })?;
    let n_slice = n_arr.as_slice().map_err(|_| {
        PyValueError::new_err("censor_times must be a 1-D contiguous float64 array or sequence")
    })?;
    let b_vec = extract_bool_vec(py, converted)?;
    let obs = Observations::new(
        Array1::from(c_slice.to_vec()),
        Array1::from(n_slice.to_vec()),
        Array1::from(b_vec),
    )?;
    Ok(obs)
}

/// Assemble optimizer options from Python-facing keyword arguments,
/// falling back to crate defaults per field.
#[cfg(feature = "python-bindings")]
pub fn extract_mle_opts(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
) -> PyResult<MLEOptions> {
    use std::str::FromStr;

    let defaults = MLEOptions::default();
    let tols = Tolerances::new(
        tol_grad.or(defaults.tols.tol_grad),
        tol_cost.or(defaults.tols.tol_cost),
        max_iter.or(defaults.tols.max_iter),
    )
    .map_err(|e| PyValueError::new_err(e.to_string()))?;
    let searcher = match line_searcher {
        Some(name) => {
            LineSearcher::from_str(name).map_err(|e| PyValueError::new_err(e.to_string()))?
        }
        None => defaults.line_searcher,
    };
    MLEOptions::new(tols, searcher, false, lbfgs_mem)
        .map_err(|e| PyValueError::new_err(e.to_string()))
}
