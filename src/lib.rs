//! spectral_coherence — cross-spectral density and coherence estimation with
//! Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the spectral estimators to Python via the `_spectral_coherence`
//! extension module.
//!
//! Key behaviors
//! -------------
//! - Re-export the core [`spectral`] module as the public crate surface.
//! - With the `python-bindings` feature, define the `#[pyfunction]` entry
//!   points, the `LagWindow` `#[pyclass]`, and the `#[pymodule]` initializer.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in `spectral`; this file only converts
//!   arguments, calls the Rust API, and converts results into NumPy arrays.
//! - Errors from `spectral` are `SpectralError` values and surface in Python
//!   as `ValueError`; malformed array arguments surface as `TypeError`.
//!
//! Conventions
//! -----------
//! - Python functions return `(tensor, freqs)` tuples: a complex
//!   `(n_freqs, p, p)` array for densities and coherency, a real one for
//!   coherence, and a 1-D array of normalized frequencies.
//! - The bandwidth keyword is spelled `B` and the lag keyword `L` on the
//!   Python side.
//!
//! Downstream usage
//! ----------------
//! - Rust code should depend on [`spectral`] (or `spectral::prelude`) and can
//!   ignore the PyO3 items guarded by the `python-bindings` feature.
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by unit tests in `spectral` and by the
//!   integration tests under `tests/`; the bindings are thin enough to be
//!   exercised from Python only.

pub mod spectral;
pub mod utils;

#[cfg(feature = "python-bindings")]
use ndarray::{Array1, Array3};

#[cfg(feature = "python-bindings")]
use num_complex::Complex64;

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray1, PyArray2, PyArray3};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    spectral::{estimator::Estimator, lag_window::LagWindow},
    utils::{extract_lag_window_options, extract_series, extract_smoothing_options},
};

#[cfg(feature = "python-bindings")]
type TensorWithFreqs<'py, T> = (Bound<'py, PyArray3<T>>, Bound<'py, PyArray1<f64>>);

#[cfg(feature = "python-bindings")]
fn to_numpy<'py, T: numpy::Element>(
    py: Python<'py>, (tensor, frequencies): (Array3<T>, Array1<f64>),
) -> TensorWithFreqs<'py, T> {
    (tensor.into_pyarray(py), frequencies.into_pyarray(py))
}

#[cfg(feature = "python-bindings")]
fn smoothing_estimator(
    bandwidth: usize, window: Option<&str>, center: Option<bool>,
) -> PyResult<Estimator> {
    let options = extract_smoothing_options(window, center)?;
    Ok(Estimator::SmoothedPeriodogram { bandwidth, options })
}

/// smoothed_periodogram(x, /, B=1, n_max_freqs=None, window='rectangular', center=False)
///
/// Smoothed cross-periodogram on the full grid `(-0.5, 0.5]`.
///
/// Returns
/// -------
/// `(S, freqs)` with `S` complex of shape `(n_freqs, p, p)`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    name = "smoothed_periodogram",
    signature = (x, B = 1, n_max_freqs = None, window = None, center = None),
    text_signature = "(x, /, B=1, n_max_freqs=None, window='rectangular', center=False)"
)]
#[allow(non_snake_case)]
pub fn py_smoothed_periodogram<'py>(
    py: Python<'py>, x: &Bound<'py, PyAny>, B: usize, n_max_freqs: Option<usize>,
    window: Option<&str>, center: Option<bool>,
) -> PyResult<TensorWithFreqs<'py, Complex64>> {
    let series = extract_series(x)?;
    let sdm = smoothing_estimator(B, window, center)?.estimate(&series, n_max_freqs, false)?;
    Ok(to_numpy(py, sdm.into_parts()))
}

/// half_smoothed_periodogram(x, /, B=1, n_max_freqs=None, window='rectangular', center=False)
///
/// Smoothed cross-periodogram restricted to `[0, 0.5]`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    name = "half_smoothed_periodogram",
    signature = (x, B = 1, n_max_freqs = None, window = None, center = None),
    text_signature = "(x, /, B=1, n_max_freqs=None, window='rectangular', center=False)"
)]
#[allow(non_snake_case)]
pub fn py_half_smoothed_periodogram<'py>(
    py: Python<'py>, x: &Bound<'py, PyAny>, B: usize, n_max_freqs: Option<usize>,
    window: Option<&str>, center: Option<bool>,
) -> PyResult<TensorWithFreqs<'py, Complex64>> {
    let series = extract_series(x)?;
    let sdm = smoothing_estimator(B, window, center)?.estimate(&series, n_max_freqs, true)?;
    Ok(to_numpy(py, sdm.into_parts()))
}

/// coherence(x, /, B=1, n_max_freqs=None, window='rectangular', center=False)
///
/// Magnitude-squared coherence on the full grid.
///
/// Notes
/// -----
/// - With `B = 1` every non-degenerate pair has coherence 1; use `B > 1`
///   for a meaningful estimate.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    name = "coherence",
    signature = (x, B = 1, n_max_freqs = None, window = None, center = None),
    text_signature = "(x, /, B=1, n_max_freqs=None, window='rectangular', center=False)"
)]
#[allow(non_snake_case)]
pub fn py_coherence<'py>(
    py: Python<'py>, x: &Bound<'py, PyAny>, B: usize, n_max_freqs: Option<usize>,
    window: Option<&str>, center: Option<bool>,
) -> PyResult<TensorWithFreqs<'py, f64>> {
    let series = extract_series(x)?;
    let coh = smoothing_estimator(B, window, center)?.coherence(&series, n_max_freqs, false)?;
    Ok(to_numpy(py, coh.into_parts()))
}

/// half_coherence(x, /, B=1, n_max_freqs=None, window='rectangular', center=False)
///
/// Magnitude-squared coherence restricted to `[0, 0.5]`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    name = "half_coherence",
    signature = (x, B = 1, n_max_freqs = None, window = None, center = None),
    text_signature = "(x, /, B=1, n_max_freqs=None, window='rectangular', center=False)"
)]
#[allow(non_snake_case)]
pub fn py_half_coherence<'py>(
    py: Python<'py>, x: &Bound<'py, PyAny>, B: usize, n_max_freqs: Option<usize>,
    window: Option<&str>, center: Option<bool>,
) -> PyResult<TensorWithFreqs<'py, f64>> {
    let series = extract_series(x)?;
    let coh = smoothing_estimator(B, window, center)?.coherence(&series, n_max_freqs, true)?;
    Ok(to_numpy(py, coh.into_parts()))
}

/// coherency(x, /, B=1, n_max_freqs=None, window='rectangular', center=False)
///
/// Complex coherency on the full grid; `abs(coherency)**2 == coherence`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    name = "coherency",
    signature = (x, B = 1, n_max_freqs = None, window = None, center = None),
    text_signature = "(x, /, B=1, n_max_freqs=None, window='rectangular', center=False)"
)]
#[allow(non_snake_case)]
pub fn py_coherency<'py>(
    py: Python<'py>, x: &Bound<'py, PyAny>, B: usize, n_max_freqs: Option<usize>,
    window: Option<&str>, center: Option<bool>,
) -> PyResult<TensorWithFreqs<'py, Complex64>> {
    let series = extract_series(x)?;
    let cohy = smoothing_estimator(B, window, center)?.coherency(&series, n_max_freqs, false)?;
    Ok(to_numpy(py, cohy.into_parts()))
}

/// PyLagWindow — Python wrapper around [`LagWindow`].
///
/// Purpose
/// -------
/// Expose the lag-window estimator as a callable object: covariances are
/// computed once at construction, then `window(nu)` evaluates the `p×p`
/// estimate at any normalized frequency and `window.estimate(...)` evaluates
/// it on the standard grid.
///
/// Parameters
/// ----------
/// - `x`: series `(n_samples, n_features)`.
/// - `L`: truncation lag, `1 ≤ L < n_samples`.
/// - `taper`: lag taper name, `"bartlett"` (default) or `"parzen"`.
/// - `center`: demean channels, default `False`.
/// - `small_sample_correction`: scale lag `ℓ` by `1/(n−ℓ)`, default `False`.
///
/// Notes
/// -----
/// - Rust callers should use [`LagWindow`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "LagWindow", module = "spectral_coherence._spectral_coherence")]
pub struct PyLagWindow {
    inner: LagWindow,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyLagWindow {
    #[new]
    #[pyo3(
        signature = (x, L, taper = None, center = None, small_sample_correction = None),
        text_signature = "(x, L, /, taper='bartlett', center=False, small_sample_correction=False)"
    )]
    #[allow(non_snake_case)]
    pub fn new<'py>(
        x: &Bound<'py, PyAny>, L: usize, taper: Option<&str>, center: Option<bool>,
        small_sample_correction: Option<bool>,
    ) -> PyResult<Self> {
        let series = extract_series(x)?;
        let options = extract_lag_window_options(taper, center, small_sample_correction)?;
        let inner = LagWindow::new(&series, L, &options)?;
        Ok(PyLagWindow { inner })
    }

    /// Evaluate the estimate at normalized frequency `nu`.
    pub fn __call__<'py>(&self, py: Python<'py>, nu: f64) -> PyResult<Bound<'py, PyArray2<Complex64>>> {
        Ok(self.inner.evaluate(nu)?.into_pyarray(py))
    }

    /// Evaluate on the standard grid; returns `(S, freqs)`.
    #[pyo3(signature = (n_max_freqs = None, half = false))]
    pub fn estimate<'py>(
        &self, py: Python<'py>, n_max_freqs: Option<usize>, half: bool,
    ) -> PyResult<TensorWithFreqs<'py, Complex64>> {
        let sdm = self.inner.estimate(n_max_freqs, half)?;
        Ok(to_numpy(py, sdm.into_parts()))
    }

    #[getter]
    #[allow(non_snake_case)]
    pub fn L(&self) -> usize {
        self.inner.max_lag()
    }

    #[getter]
    pub fn n_samples(&self) -> usize {
        self.inner.n_samples()
    }

    #[getter]
    pub fn n_features(&self) -> usize {
        self.inner.n_features()
    }
}

/// _spectral_coherence — PyO3 module initializer for the Python extension.
///
/// Purpose
/// -------
/// Define the `_spectral_coherence` Python module and register the estimator
/// functions and the `LagWindow` class.
///
/// Errors
/// ------
/// - `PyErr`
///   If registering a function or class fails.
///
/// Notes
/// -----
/// - This function is invoked automatically by Python when importing the
///   compiled extension; it is not called directly by user code.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _spectral_coherence<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_smoothed_periodogram, m)?)?;
    m.add_function(wrap_pyfunction!(py_half_smoothed_periodogram, m)?)?;
    m.add_function(wrap_pyfunction!(py_coherence, m)?)?;
    m.add_function(wrap_pyfunction!(py_half_coherence, m)?)?;
    m.add_function(wrap_pyfunction!(py_coherency, m)?)?;
    m.add_class::<PyLagWindow>()?;
    Ok(())
}
