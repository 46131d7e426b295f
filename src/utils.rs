//! utils — conversion helpers for the PyO3 layer.
//!
//! Purpose
//! -------
//! Turn loosely typed Python arguments (NumPy arrays, pandas objects, nested
//! sequences, kernel names) into the validated Rust types consumed by
//! `spectral`. Everything here is compiled only with `python-bindings`.
//!
//! Conventions
//! -----------
//! - Series are accepted as 2-D `float64` arrays `(n_samples, n_features)`;
//!   a 1-D input is treated as a single channel.
//! - Kernel names are parsed with `KernelType::from_str`, so the accepted
//!   aliases match the Rust API.

#[cfg(feature = "python-bindings")]
use ndarray::{Array2, Axis};

#[cfg(feature = "python-bindings")]
use numpy::{PyReadonlyArray1, PyReadonlyArray2};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyTypeError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::spectral::{
    errors::SpectralError, estimator::SmoothingOptions, kernel::KernelType,
    lag_window::LagWindowOptions,
};

#[cfg(feature = "python-bindings")]
use std::str::FromStr;

/// Extract a `(n_samples, n_features)` series from a Python object.
///
/// Accepts, in order of preference:
/// - a 2-D or 1-D `numpy.ndarray` of `float64`,
/// - any object with a `to_numpy()` method returning such an array
///   (pandas `DataFrame` / `Series`),
/// - a sequence of equal-length float sequences (rows = time).
///
/// Errors
/// ------
/// - `TypeError` if none of the above apply or rows are ragged.
#[cfg(feature = "python-bindings")]
pub fn extract_series<'py>(raw_data: &Bound<'py, PyAny>) -> PyResult<Array2<f64>> {
    if let Some(series) = extract_numpy_series(raw_data) {
        return Ok(series);
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (), None) {
        if let Some(series) = extract_numpy_series(&obj) {
            return Ok(series);
        }
    }

    let rows: Vec<Vec<f64>> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err(
            "expected a 2-D numpy.ndarray, pandas.DataFrame, or sequence of float64 rows",
        )
    })?;
    let n_features = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|row| row.len() != n_features) {
        return Err(PyTypeError::new_err("all rows must have the same number of channels"));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    let n_samples = if n_features == 0 { 0 } else { flat.len() / n_features };
    Array2::from_shape_vec((n_samples, n_features), flat)
        .map_err(|err| PyTypeError::new_err(format!("could not build series: {err}")))
}

#[cfg(feature = "python-bindings")]
fn extract_numpy_series(obj: &Bound<'_, PyAny>) -> Option<Array2<f64>> {
    if let Ok(arr) = obj.extract::<PyReadonlyArray2<f64>>() {
        return Some(arr.as_array().to_owned());
    }
    obj.extract::<PyReadonlyArray1<f64>>()
        .ok()
        .map(|arr| arr.as_array().to_owned().insert_axis(Axis(1)))
}

/// Parse an optional kernel name, falling back to `default`.
#[cfg(feature = "python-bindings")]
pub fn extract_kernel(name: Option<&str>, default: KernelType) -> Result<KernelType, SpectralError> {
    name.map_or(Ok(default), KernelType::from_str)
}

/// Build [`SmoothingOptions`] from Python keyword arguments.
///
/// Defaults: `window = "rectangular"`, `center = False`.
#[cfg(feature = "python-bindings")]
pub fn extract_smoothing_options(
    window: Option<&str>, center: Option<bool>,
) -> PyResult<SmoothingOptions> {
    let window = extract_kernel(window, KernelType::Rectangular)?;
    Ok(SmoothingOptions::new(window, center.unwrap_or(false)))
}

/// Build [`LagWindowOptions`] from Python keyword arguments.
///
/// Defaults: `taper = "bartlett"`, `center = False`,
/// `small_sample_correction = False`.
#[cfg(feature = "python-bindings")]
pub fn extract_lag_window_options(
    taper: Option<&str>, center: Option<bool>, small_sample_correction: Option<bool>,
) -> PyResult<LagWindowOptions> {
    let taper = extract_kernel(taper, KernelType::Bartlett)?;
    Ok(LagWindowOptions::new(
        taper,
        center.unwrap_or(false),
        small_sample_correction.unwrap_or(false),
    ))
}
