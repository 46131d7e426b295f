//! Smoothing windows and lag tapers shared by both spectral estimators.
//!
//! This module provides:
//! - A `KernelType` enum with the usual spectral-window families (Rectangular/
//!   Daniell, Bartlett, Parzen, QS).
//! - Per-offset weights `w(x)` on the normalized axis `x ∈ [-1, 1]`.
//! - Frequency-domain weights for a bandwidth `B` (normalized to sum 1) and
//!   lag-domain taper weights for a truncation `L`.
//!
//! Conventions:
//! - Frequency smoothing evaluates the kernel at `x = j/(h+1)` for offsets
//!   `j ∈ [-h, h]`, `h = (B-1)/2`, so the outermost bins keep a positive weight.
//! - Lag tapers evaluate the kernel at `x = ℓ/L`; the Bartlett taper is
//!   therefore `1 - |ℓ|/L` and vanishes at `ℓ = L`.
//! - Only Bartlett and Parzen are valid lag tapers: their Fourier transforms
//!   are non-negative, so the tapered estimate keeps non-negative
//!   auto-spectra. Every family is a valid frequency window.
use crate::spectral::errors::{SpectralError, SpectralResult};
use std::str::FromStr;

/// Spectral window / lag taper family.
///
/// - `Rectangular`: flat weight on `|x| ≤ 1` (Daniell window in frequency).
/// - `Bartlett`: triangular kernel, compact support on `|x| ≤ 1`.
/// - `Parzen`: smoother compact-support kernel with heavier down-weighting
///   near the edge.
/// - `QuadraticSpectral`: infinite-support kernel; positive on `|x| < 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelType {
    Rectangular,
    Bartlett,
    Parzen,
    QuadraticSpectral,
}

impl KernelType {
    /// Evaluate the kernel weight at the given normalized argument.
    ///
    /// # Arguments
    /// - `input`: real number, typically `x = j/(h+1)` (frequency smoothing)
    ///   or `x = ℓ/L` (lag taper).
    ///
    /// # Returns
    /// Kernel value `w(x)`, with `w(0) = 1` for every family.
    pub fn weight(&self, input: f64) -> f64 {
        let abs_input = input.abs();
        match self {
            KernelType::Rectangular => {
                if abs_input <= 1.0 {
                    1.0
                } else {
                    0.0
                }
            }
            KernelType::Bartlett => {
                if abs_input <= 1.0 {
                    1.0 - abs_input
                } else {
                    0.0
                }
            }
            KernelType::Parzen => {
                if abs_input <= 0.5 {
                    let abs_input_squared = abs_input * abs_input;
                    1.0 - 6.0 * abs_input_squared + 6.0 * abs_input * abs_input_squared
                } else if abs_input <= 1.0 {
                    2.0 * (1.0 - abs_input).powi(3)
                } else {
                    0.0
                }
            }
            KernelType::QuadraticSpectral => {
                if input == 0.0 {
                    1.0
                } else {
                    let pi_x = std::f64::consts::PI * input;
                    let trig_input = 6.0 * pi_x / 5.0;
                    (25.0 / (12.0 * (pi_x.powi(2))))
                        * ((trig_input).sin() / trig_input - (trig_input).cos())
                }
            }
        }
    }

    /// Normalized frequency-domain weights for an odd bandwidth `B`.
    ///
    /// Returns `B` weights for offsets `-h..=h` (index `j + h`), summing to 1.
    /// The caller is expected to have validated `B` (odd, positive).
    pub fn smoothing_weights(&self, bandwidth: usize) -> Vec<f64> {
        let half_width = (bandwidth as isize - 1) / 2;
        let denom = (half_width + 1) as f64;
        let raw: Vec<f64> =
            (-half_width..=half_width).map(|j| self.weight(j as f64 / denom)).collect();
        let total: f64 = raw.iter().sum();
        raw.into_iter().map(|w| w / total).collect()
    }

    /// Whether the kernel is positive semi-definite when used as a lag taper
    /// truncated at `L`, i.e. its transform over `ℓ ∈ [-L, L]` is never
    /// negative.
    ///
    /// The truncated periodogram (`Rectangular`) has a Dirichlet transform
    /// with negative lobes, and `QuadraticSpectral` is cut off at a nonzero
    /// value, so both are rejected.
    pub fn is_positive_definite_taper(&self) -> bool {
        matches!(self, KernelType::Bartlett | KernelType::Parzen)
    }

    /// Lag taper weights `w(ℓ/L)` for `ℓ = 0..=L`.
    ///
    /// `w(0) = 1`; negative lags reuse the same weights by symmetry.
    pub fn lag_weights(&self, max_lag: usize) -> Vec<f64> {
        let denom = max_lag as f64;
        (0..=max_lag).map(|lag| self.weight(lag as f64 / denom)).collect()
    }
}

impl FromStr for KernelType {
    type Err = SpectralError;

    fn from_str(s: &str) -> SpectralResult<Self> {
        match s.to_lowercase().as_str() {
            "rectangular" | "daniell" | "uniform" | "dirichlet" => Ok(KernelType::Rectangular),
            "bartlett" | "triangular" => Ok(KernelType::Bartlett),
            "parzen" => Ok(KernelType::Parzen),
            "quadratic_spectral" | "quadraticspectral" | "qs" => Ok(KernelType::QuadraticSpectral),
            other => Err(SpectralError::UnknownKernel { name: other.to_string() }),
        }
    }
}
