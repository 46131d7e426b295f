//! spectral::errors — error type shared by every spectral estimation routine.
//!
//! Purpose
//! -------
//! Provide a single error enum and result alias for grid construction,
//! periodogram estimation, smoothing, lag-window estimation, and coherence
//! normalization. Validation failures are reported through these types
//! before any Fourier transform is computed.
//!
//! Key behaviors
//! -------------
//! - Define [`SpectralError`] and [`SpectralResult`] as the canonical error
//!   and result types of the `spectral` module.
//! - Classify every variant into one of two families via
//!   [`SpectralError::kind`]:
//!   - [`ErrorKind::InvalidInput`] for malformed series (empty, non-finite),
//!   - [`ErrorKind::InvalidParameter`] for out-of-range tuning values
//!     (`B`, `L`, lag taper, `n_max_freqs`, evaluation frequency, tensor
//!     shape).
//! - Attach human-readable `Display` messages that embed the offending
//!   value, so diagnostics are meaningful without extra context.
//! - Convert into `PyErr` (`ValueError`) when the `python-bindings` feature
//!   is enabled.
//!
//! Conventions
//! -----------
//! - Near-zero auto-spectral power in coherence normalization is *not* an
//!   error: it is resolved by the zero-fill policy documented in
//!   `spectral::coherence`.
//! - Indices carried in payloads are 0-based (rows = time, columns =
//!   channels).

use crate::spectral::kernel::KernelType;

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type SpectralResult<T> = Result<T, SpectralError>;

/// Coarse classification of [`SpectralError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The series itself is unusable (empty, non-finite values).
    InvalidInput,
    /// A tuning parameter or intermediate tensor is out of range.
    InvalidParameter,
}

/// SpectralError — validation failures of the spectral estimation engine.
///
/// Variants
/// --------
/// - `EmptySeries { n_samples, n_features }`
///   The series has no rows or no columns.
/// - `NonFiniteData { row, col, value }`
///   The first NaN or ±∞ found in the series, scanning row-major.
/// - `InvalidSampleCount { n_samples }`
///   A frequency grid was requested for `n_samples = 0`.
/// - `InvalidMaxFreqs { n_max_freqs }`
///   The frequency cap is zero.
/// - `InvalidBandwidth { bandwidth, n_samples }`
///   The smoothing bandwidth violates `1 ≤ B ≤ n_samples`.
/// - `EvenBandwidth { bandwidth }`
///   The smoothing bandwidth is even; centered windows need odd `B`.
/// - `InvalidMaxLag { max_lag, n_samples }`
///   The lag-window truncation violates `1 ≤ L < n_samples`.
/// - `IndefiniteTaper { taper }`
///   The lag taper can make auto-spectra negative; only tapers with a
///   non-negative Fourier transform are accepted.
/// - `InvalidFrequency { nu }`
///   A lag-window evaluator was called at a non-finite frequency.
/// - `ShapeMismatch { expected, actual }`
///   A tensor handed to a building block does not have the documented
///   `(n_freqs, n_features, n_features)` layout.
/// - `UnknownKernel { name }`
///   A kernel name could not be parsed into a `KernelType`.
#[derive(Debug, Clone, PartialEq)]
pub enum SpectralError {
    // ---- Input validation ----
    EmptySeries { n_samples: usize, n_features: usize },
    NonFiniteData { row: usize, col: usize, value: f64 },

    // ---- Parameter validation ----
    InvalidSampleCount { n_samples: usize },
    InvalidMaxFreqs { n_max_freqs: usize },
    InvalidBandwidth { bandwidth: usize, n_samples: usize },
    EvenBandwidth { bandwidth: usize },
    InvalidMaxLag { max_lag: usize, n_samples: usize },
    IndefiniteTaper { taper: KernelType },
    InvalidFrequency { nu: f64 },
    ShapeMismatch { expected: String, actual: Vec<usize> },
    UnknownKernel { name: String },
}

impl SpectralError {
    /// Return the error family of this variant.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SpectralError::EmptySeries { .. } | SpectralError::NonFiniteData { .. } => {
                ErrorKind::InvalidInput
            }
            _ => ErrorKind::InvalidParameter,
        }
    }
}

impl std::error::Error for SpectralError {}

impl std::fmt::Display for SpectralError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Input validation ----
            SpectralError::EmptySeries { n_samples, n_features } => write!(
                f,
                "Series must have at least one sample and one feature, got shape ({n_samples}, {n_features})"
            ),
            SpectralError::NonFiniteData { row, col, value } => {
                write!(f, "Series value at ({row}, {col}) must be finite, got {value}")
            }

            // ---- Parameter validation ----
            SpectralError::InvalidSampleCount { n_samples } => {
                write!(f, "Number of samples must be at least 1, got {n_samples}")
            }
            SpectralError::InvalidMaxFreqs { n_max_freqs } => {
                write!(f, "n_max_freqs must be at least 1, got {n_max_freqs}")
            }
            SpectralError::InvalidBandwidth { bandwidth, n_samples } => write!(
                f,
                "Bandwidth B={bandwidth} must satisfy 1 ≤ B ≤ n_samples ({n_samples})"
            ),
            SpectralError::EvenBandwidth { bandwidth } => {
                write!(f, "Bandwidth B={bandwidth} must be odd")
            }
            SpectralError::InvalidMaxLag { max_lag, n_samples } => write!(
                f,
                "Maximum lag L={max_lag} must satisfy 1 ≤ L < n_samples ({n_samples})"
            ),
            SpectralError::IndefiniteTaper { taper } => write!(
                f,
                "Lag taper {taper:?} is not positive semi-definite (expected 'bartlett' or 'parzen')"
            ),
            SpectralError::InvalidFrequency { nu } => {
                write!(f, "Evaluation frequency must be finite, got {nu}")
            }
            SpectralError::ShapeMismatch { expected, actual } => {
                write!(f, "Tensor shape mismatch: expected {expected}, got {actual:?}")
            }
            SpectralError::UnknownKernel { name } => write!(
                f,
                "Unknown kernel {name:?} (expected 'rectangular', 'bartlett', 'parzen', or 'quadratic_spectral')"
            ),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<SpectralError> for PyErr {
    fn from(err: SpectralError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
