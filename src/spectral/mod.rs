//! spectral — cross-spectral density and coherence estimation.
//!
//! Purpose
//! -------
//! Estimate, for a real multivariate series `x(t) ∈ ℝ^p` sampled at unit
//! spacing, the `p×p` spectral density matrix `S(f)` at a grid of normalized
//! frequencies `f ∈ (-0.5, 0.5]`, and the coherence `|S_ij|² / (S_ii S_jj)`
//! between every pair of channels.
//!
//! Key behaviors
//! -------------
//! - Two interchangeable estimators, selected through
//!   [`Estimator`](estimator::Estimator):
//!   - smoothed periodogram: raw cross-periodogram averaged over `B`
//!     neighboring Fourier frequencies ([`smoother`]),
//!   - lag window: tapered sample cross-covariances up to lag `L`, Fourier
//!     transformed ([`lag_window`]).
//! - Estimates are computed on the non-negative frequencies only and
//!   mirrored onto the full grid ([`half_spectrum`]).
//! - An optional frequency cap keeps an evenly strided subset of the grid
//!   that always contains zero ([`grid`]).
//!
//! Module map
//! ----------
//! - [`grid`]: frequency grids and FFT bin mapping.
//! - [`periodogram`]: Fourier coefficients, raw and half-spectrum
//!   cross-periodograms.
//! - [`smoother`]: circular frequency-domain averaging.
//! - [`lag_window`]: lag-window evaluator.
//! - [`coherence`]: coherence and coherency normalization.
//! - [`half_spectrum`]: half-to-full reconstruction.
//! - [`kernel`]: smoothing windows and lag tapers.
//! - [`estimator`]: estimator strategy and public entry points.
//! - [`errors`], [`validation`]: error types and input guards.
//!
//! Conventions
//! -----------
//! - Series are `n_samples × n_features` with rows indexing time.
//! - Spectral tensors are `(n_freqs, n_features, n_features)`.
//! - Everything is a pure function of its inputs; nothing is cached.
pub mod coherence;
pub mod errors;
pub mod estimator;
pub mod grid;
pub mod half_spectrum;
pub mod kernel;
pub mod lag_window;
pub mod periodogram;
pub mod smoother;
pub mod validation;

pub use self::errors::{ErrorKind, SpectralError, SpectralResult};
pub use self::estimator::{
    Coherence, Coherency, Estimator, SmoothingOptions, SpectralDensity, coherence, coherency,
    half_coherence, half_smoothed_periodogram, smoothed_periodogram,
};
pub use self::grid::{FrequencyGrid, build_grid};
pub use self::kernel::KernelType;
pub use self::lag_window::{LagWindow, LagWindowOptions, lag_window};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Usage:
//     use spectral_coherence::spectral::prelude::*;
//
pub mod prelude {
    pub use super::errors::{SpectralError, SpectralResult};
    pub use super::estimator::{
        Coherence, Coherency, Estimator, SmoothingOptions, SpectralDensity, coherence, coherency,
        half_coherence, half_smoothed_periodogram, smoothed_periodogram,
    };
    pub use super::kernel::KernelType;
    pub use super::lag_window::{LagWindow, LagWindowOptions, lag_window};
}
