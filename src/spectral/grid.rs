//! spectral::grid — normalized frequency grids and their FFT bin mapping.
//!
//! Purpose
//! -------
//! Decide at which normalized frequencies (cycles per sample) the spectral
//! density is evaluated, and map each of them to its position in the natural
//! output order of a length-`n_samples` discrete Fourier transform.
//!
//! Key behaviors
//! -------------
//! - Full grid: the `n_samples` Fourier frequencies `m / n` for signed bins
//!   `m ∈ (-n/2, n/2]`, in increasing order (so `+0.5` is kept for even `n`).
//! - Half grid: signed bins `0..=⌊n/2⌋`, the non-redundant half for real
//!   input.
//! - Optional cap `n_max_freqs`: only signed bins that are multiples of
//!   `stride = ⌈n / n_max_freqs⌉` survive. Zero is always a multiple, so the
//!   zero frequency is always present, and at most `n_max_freqs` bins remain.
//!   The capped half grid is exactly the non-negative part of the capped full
//!   grid.
//!
//! Conventions
//! -----------
//! - `offsets()` are signed bins, `indices()` natural FFT indices
//!   (`m mod n`), `frequencies()` the values `m / n`. All three are aligned.
//! - Grids are cheap value objects rebuilt on every call; nothing is cached.
use crate::spectral::{
    errors::{SpectralError, SpectralResult},
    validation::validate_max_freqs,
};
use ndarray::Array1;

/// FrequencyGrid — ordered evaluation frequencies with their FFT bins.
///
/// Fields
/// ------
/// - `n_samples`: length of the underlying Fourier transform.
/// - `half`: whether only non-negative frequencies are present.
/// - `stride`: spacing between retained signed bins (1 when uncapped).
/// - `offsets`: strictly increasing signed bins.
/// - `indices`: natural FFT index of each offset.
/// - `frequencies`: `offsets / n_samples`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyGrid {
    n_samples: usize,
    half: bool,
    stride: usize,
    offsets: Vec<isize>,
    indices: Vec<usize>,
    frequencies: Array1<f64>,
}

impl FrequencyGrid {
    /// Normalized frequencies, strictly increasing.
    pub fn frequencies(&self) -> &Array1<f64> {
        &self.frequencies
    }

    /// Natural-order FFT index of each grid frequency.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Signed bin of each grid frequency.
    pub fn offsets(&self) -> &[isize] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn is_half(&self) -> bool {
        self.half
    }

    /// Position of a signed bin inside the grid, if present.
    pub fn position_of(&self, offset: isize) -> Option<usize> {
        self.offsets.binary_search(&offset).ok()
    }
}

/// Build the evaluation grid for a series of length `n_samples`.
///
/// Parameters
/// ----------
/// - `n_samples`: `usize`
///   Length of the series (and of its Fourier transform). Must be ≥ 1.
/// - `n_max_freqs`: `Option<usize>`
///   Optional cap on the number of frequencies. `None` keeps every bin.
/// - `half`: `bool`
///   Restrict to `[0, 0.5]` when `true`.
///
/// Returns
/// -------
/// `SpectralResult<FrequencyGrid>`
///
/// Errors
/// ------
/// - `SpectralError::InvalidSampleCount` when `n_samples == 0`.
/// - `SpectralError::InvalidMaxFreqs` when `n_max_freqs == Some(0)`.
///
/// Examples
/// --------
/// ```rust
/// # use spectral_coherence::spectral::grid::build_grid;
/// let grid = build_grid(4, None, false).unwrap();
/// assert_eq!(grid.frequencies().to_vec(), vec![-0.25, 0.0, 0.25, 0.5]);
/// assert_eq!(grid.indices(), &[3, 0, 1, 2]);
/// ```
pub fn build_grid(
    n_samples: usize, n_max_freqs: Option<usize>, half: bool,
) -> SpectralResult<FrequencyGrid> {
    if n_samples == 0 {
        return Err(SpectralError::InvalidSampleCount { n_samples });
    }
    validate_max_freqs(n_max_freqs)?;

    let stride = n_max_freqs.map_or(1, |cap| n_samples.div_ceil(cap));
    let n = n_samples as isize;
    let upper = n / 2;
    let lower = if half { 0 } else { upper - n + 1 };
    let step = stride as isize;

    let offsets: Vec<isize> = (lower..=upper).filter(|m| m.rem_euclid(step) == 0).collect();
    let indices = offsets.iter().map(|m| m.rem_euclid(n) as usize).collect();
    let frequencies = offsets.iter().map(|&m| m as f64 / n_samples as f64).collect();

    Ok(FrequencyGrid { n_samples, half, stride, offsets, indices, frequencies })
}
