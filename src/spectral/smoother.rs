//! spectral::smoother — circular frequency-domain averaging of periodograms.
//!
//! Purpose
//! -------
//! Turn the raw cross-periodogram into a consistent spectral density
//! estimate by averaging each frequency with its `B - 1` nearest neighbors:
//!
//! ```text
//! Ŝ(k) = Σ_{j=-h}^{h} w_j · I((k + j) mod n),   h = (B - 1) / 2,
//! ```
//!
//! with weights `w_j` from [`KernelType::smoothing_weights`] (uniform by
//! default). The frequency axis is periodic, so neighbors wrap around with
//! explicit modular arithmetic.
//!
//! Key behaviors
//! -------------
//! - [`smooth`] operates on a full, cyclically ordered tensor (natural FFT
//!   order or any rotation of it, e.g. ascending frequencies).
//! - [`smooth_bins`] evaluates the same average only at requested signed bins
//!   of a half-spectrum [`CrossPeriodogram`]; this is what the public entry
//!   points use, for both strided and half grids.
//! - Both work one window offset at a time over every output bin: gather the
//!   shifted matrices in one selection, then add them with their weight.
//!   The cost is `O(B · n_out · p²)` in `B` batched passes. Offsets are
//!   summed in a fixed order, so a bin's value never depends on which other
//!   bins were requested.
//!
//! Invariants & assumptions
//! ------------------------
//! - `B` is odd and `1 ≤ B ≤ n`, validated here.
//! - Weights are real and non-negative, so Hermitian symmetry and
//!   non-negative diagonals of the input carry over to the output.
use crate::spectral::{
    errors::SpectralResult,
    kernel::KernelType,
    periodogram::CrossPeriodogram,
    validation::{validate_bandwidth, validate_square_stack},
};
use ndarray::{Array3, Axis, Zip};
use num_complex::Complex64;

/// Circularly smooth a full-axis tensor of spectral matrices.
///
/// Parameters
/// ----------
/// - `raw`: `&Array3<Complex64>`
///   Tensor `(n, p, p)` covering every Fourier frequency exactly once, in a
///   cyclic order.
/// - `bandwidth`: `usize`
///   Odd window length `B`, `1 ≤ B ≤ n`.
/// - `window`: `KernelType`
///   Shape of the averaging kernel.
///
/// Returns
/// -------
/// `SpectralResult<Array3<Complex64>>`
///   Smoothed tensor with the same shape and frequency order as `raw`.
///
/// Errors
/// ------
/// - `SpectralError::ShapeMismatch` if `raw` is not a stack of square
///   matrices.
/// - `SpectralError::InvalidBandwidth` / `EvenBandwidth` for an invalid `B`.
pub fn smooth(
    raw: &Array3<Complex64>, bandwidth: usize, window: KernelType,
) -> SpectralResult<Array3<Complex64>> {
    let (n_freqs, _) = validate_square_stack(raw)?;
    validate_bandwidth(bandwidth, n_freqs)?;

    let weights = window.smoothing_weights(bandwidth);
    let half_width = (bandwidth as isize - 1) / 2;
    let n = n_freqs as isize;
    let mut smoothed = Array3::<Complex64>::zeros(raw.raw_dim());

    for (offset, &w) in (-half_width..=half_width).zip(&weights) {
        let neighbors: Vec<usize> =
            (0..n).map(|k| (k + offset).rem_euclid(n) as usize).collect();
        add_weighted(&mut smoothed, &raw.select(Axis(0), &neighbors), w);
    }
    Ok(smoothed)
}

/// Smoothed spectral matrices at selected signed bins of a half-spectrum
/// periodogram.
///
/// Parameters
/// ----------
/// - `periodogram`: `&CrossPeriodogram`
///   Half-spectrum storage of the raw periodogram.
/// - `bandwidth`: `usize`
///   Odd window length `B`, `1 ≤ B ≤ n_samples`.
/// - `window`: `KernelType`
///   Shape of the averaging kernel.
/// - `offsets`: `&[isize]`
///   Signed bins (e.g. [`FrequencyGrid::offsets`](crate::spectral::grid::FrequencyGrid::offsets))
///   at which to evaluate.
///
/// Returns
/// -------
/// `SpectralResult<Array3<Complex64>>`
///   Tensor `(offsets.len(), p, p)`.
///
/// Errors
/// ------
/// - `SpectralError::InvalidBandwidth` / `EvenBandwidth` for an invalid `B`.
///
/// Notes
/// -----
/// - Values are identical to `smooth(periodogram.to_full(), ..)` at the same
///   bins; only the requested bins are ever summed.
pub fn smooth_bins(
    periodogram: &CrossPeriodogram, bandwidth: usize, window: KernelType, offsets: &[isize],
) -> SpectralResult<Array3<Complex64>> {
    validate_bandwidth(bandwidth, periodogram.n_samples())?;

    let weights = window.smoothing_weights(bandwidth);
    let half_width = (bandwidth as isize - 1) / 2;
    let p = periodogram.n_features();
    let mut smoothed = Array3::<Complex64>::zeros((offsets.len(), p, p));

    for (offset, &w) in (-half_width..=half_width).zip(&weights) {
        let neighbors: Vec<isize> = offsets.iter().map(|&center| center + offset).collect();
        add_weighted(&mut smoothed, &periodogram.matrices(&neighbors), w);
    }
    Ok(smoothed)
}

// ---- Helper methods ----

fn add_weighted(acc: &mut Array3<Complex64>, shifted: &Array3<Complex64>, weight: f64) {
    Zip::from(acc).and(shifted).for_each(|a, &z| *a += z * weight);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::{errors::SpectralError, grid::build_grid};
    use approx::assert_relative_eq;
    use ndarray::Array2;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Identity behavior for B = 1 and invariance of flat spectra.
    // - Circular wraparound at the ends of the frequency axis.
    // - Agreement of `smooth_bins` (half storage) with `smooth` (full tensor),
    //   and independence of each bin from the rest of the request.
    // - Hermitian preservation and the parameter error paths.
    // -------------------------------------------------------------------------

    const TOL: f64 = 1e-10;

    fn impulse(n: usize, bin: usize) -> Array3<Complex64> {
        let mut raw = Array3::<Complex64>::zeros((n, 1, 1));
        raw[[bin, 0, 0]] = Complex64::new(1.0, 0.0);
        raw
    }

    #[test]
    // Purpose
    // -------
    // Verify that B = 1 returns the input unchanged.
    //
    // Given
    // -----
    // - A random-looking (5, 2, 2) tensor.
    //
    // Expect
    // ------
    // - Output equals input exactly.
    fn smooth_unit_bandwidth_is_identity() {
        // Arrange
        let raw = Array3::from_shape_fn((5, 2, 2), |(k, i, j)| {
            Complex64::new((k + i) as f64, j as f64 - i as f64)
        });

        // Act
        let smoothed = smooth(&raw, 1, KernelType::Rectangular).unwrap();

        // Assert
        assert_eq!(smoothed, raw);
    }

    #[test]
    // Purpose
    // -------
    // Check the circular wraparound of the uniform window.
    //
    // Given
    // -----
    // - An impulse at bin 0 of a length-7 axis, B = 3.
    //
    // Expect
    // ------
    // - Bins 6, 0, 1 equal 1/3; all other bins are 0.
    fn smooth_wraps_around_frequency_axis() {
        // Arrange
        let raw = impulse(7, 0);

        // Act
        let smoothed = smooth(&raw, 3, KernelType::Rectangular).unwrap();

        // Assert
        for k in 0..7 {
            let expected = if matches!(k, 6 | 0 | 1) { 1.0 / 3.0 } else { 0.0 };
            assert_relative_eq!(smoothed[[k, 0, 0]].re, expected, epsilon = TOL);
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure a flat spectrum is a fixed point of every window.
    //
    // Given
    // -----
    // - A constant (9, 1, 1) tensor and B = 5.
    //
    // Expect
    // ------
    // - Output equals the constant for every kernel.
    fn smooth_preserves_flat_spectrum() {
        // Arrange
        let raw = Array3::from_elem((9, 1, 1), Complex64::new(2.5, 0.0));

        for window in [KernelType::Rectangular, KernelType::Bartlett, KernelType::Parzen] {
            // Act
            let smoothed = smooth(&raw, 5, window).unwrap();

            // Assert
            for z in smoothed.iter() {
                assert_relative_eq!(z.re, 2.5, epsilon = TOL);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that smoothing the half-spectrum storage at selected bins gives
    // the same values as smoothing the expanded full tensor.
    //
    // Given
    // -----
    // - A 20×2 series, B = 5, Bartlett window, full grid offsets.
    //
    // Expect
    // ------
    // - `smooth_bins` matches `smooth(to_full)` at each natural index, and
    //   the results are exactly Hermitian.
    fn smooth_bins_matches_full_tensor_smoothing() {
        // Arrange
        let series = Array2::from_shape_fn((20, 2), |(t, c)| ((t * (c + 2)) as f64 * 0.37).sin());
        let periodogram = CrossPeriodogram::from_series(&series, false).unwrap();
        let grid = build_grid(20, None, false).unwrap();

        // Act
        let full = smooth(&periodogram.to_full(), 5, KernelType::Bartlett).unwrap();
        let bins = smooth_bins(&periodogram, 5, KernelType::Bartlett, grid.offsets()).unwrap();

        // Assert
        for (pos, &idx) in grid.indices().iter().enumerate() {
            for i in 0..2 {
                for j in 0..2 {
                    let a = bins[[pos, i, j]];
                    let b = full[[idx, i, j]];
                    assert_relative_eq!(a.re, b.re, epsilon = TOL);
                    assert_relative_eq!(a.im, b.im, epsilon = TOL);
                    assert_eq!(a, bins[[pos, j, i]].conj());
                }
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // A bin's smoothed value must not depend on which other bins are
    // requested alongside it.
    //
    // Given
    // -----
    // - A 33×2 series, B = 9, Parzen window; every offset of the full grid,
    //   then a strided subset in shuffled order.
    //
    // Expect
    // ------
    // - Exactly equal matrices for the shared bins.
    fn smooth_bins_is_independent_of_requested_set() {
        // Arrange
        let series = Array2::from_shape_fn((33, 2), |(t, c)| ((t * (c + 3)) as f64 * 0.21).cos());
        let periodogram = CrossPeriodogram::from_series(&series, true).unwrap();
        let all: Vec<isize> = (-16..=16).collect();
        let subset = [12, -15, 0, 3, -6];

        // Act
        let dense = smooth_bins(&periodogram, 9, KernelType::Parzen, &all).unwrap();
        let sparse = smooth_bins(&periodogram, 9, KernelType::Parzen, &subset).unwrap();

        // Assert
        for (mat, &bin) in sparse.outer_iter().zip(&subset) {
            assert_eq!(mat, dense.index_axis(Axis(0), (bin + 16) as usize));
        }
    }

    #[test]
    // Purpose
    // -------
    // Cover the bandwidth and shape error paths.
    //
    // Given
    // -----
    // - A (6, 1, 1) tensor with B = 4 and B = 7, and a non-square tensor.
    //
    // Expect
    // ------
    // - `EvenBandwidth`, `InvalidBandwidth`, `ShapeMismatch`.
    fn smooth_rejects_invalid_bandwidth_and_shape() {
        // Arrange
        let raw = impulse(6, 0);
        let ragged = Array3::<Complex64>::zeros((6, 1, 2));

        // Act / Assert
        assert_eq!(
            smooth(&raw, 4, KernelType::Rectangular),
            Err(SpectralError::EvenBandwidth { bandwidth: 4 })
        );
        assert_eq!(
            smooth(&raw, 7, KernelType::Rectangular),
            Err(SpectralError::InvalidBandwidth { bandwidth: 7, n_samples: 6 })
        );
        assert!(matches!(
            smooth(&ragged, 1, KernelType::Rectangular),
            Err(SpectralError::ShapeMismatch { .. })
        ));
    }
}
