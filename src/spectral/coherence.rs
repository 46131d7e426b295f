//! spectral::coherence — normalization of spectral density tensors.
//!
//! Purpose
//! -------
//! Convert a spectral density tensor `S` of shape `(n_freqs, p, p)` into
//! magnitude-squared coherence
//!
//! ```text
//! C[k, i, j] = |S[k, i, j]|² / (S[k, i, i] · S[k, j, j]),
//! ```
//!
//! or into the complex coherency `S[k, i, j] / sqrt(S[k, i, i] · S[k, j, j])`,
//! whose squared modulus is the coherence.
//!
//! Key behaviors
//! -------------
//! - The diagonal is exactly `1` (coherence) or `1 + 0i` (coherency).
//! - Off-diagonal coherence is clipped to `[0, 1]`; coherency is scaled back
//!   onto the unit disk if rounding pushes its modulus above 1.
//! - Zero-fill policy: channel `i` is silent at a frequency when its
//!   auto-spectrum there is not positive or is at most
//!   `DEGENERATE_POWER_TOL · r_i`, where `r_i` is a reference power of that
//!   channel alone. Entries pairing a silent channel are `0`. The number of
//!   zero-filled pairs is reported at `trace` level.
//! - The reference is either supplied by the caller (the estimators pass
//!   each channel's mean power, see [`channel_power`]) or, for the plain
//!   `*_from_density` functions, the channel's largest auto-spectrum in the
//!   tensor. Either way, rescaling or offsetting one channel never changes
//!   which entries of another channel are zero-filled.
//!
//! Invariants & assumptions
//! ------------------------
//! - Only the upper triangle is computed; the lower triangle is its mirror
//!   (plain copy for coherence, conjugate for coherency), so outputs are
//!   exactly symmetric / Hermitian.
//! - Diagonal entries of `S` are read through their real part.
use crate::spectral::{
    errors::{SpectralError, SpectralResult},
    validation::validate_square_stack,
};
use ndarray::{Array1, Array2, Array3, ArrayBase, Axis, Data, Ix3};
use num_complex::Complex64;
use tracing::trace;

/// Power, relative to a channel's reference power, at or below which its
/// auto-spectrum counts as zero. Rounding leaves auto-spectra of order
/// `ε² · r` in bins the channel does not occupy.
pub const DEGENERATE_POWER_TOL: f64 = 1e-24;

/// Mean power `(1/n) Σ_t x_i(t)²` of every channel.
///
/// By Parseval this is the average of the channel's raw auto-periodogram
/// over all Fourier frequencies, so it is the natural reference scale for
/// the zero-fill policy. It does not depend on the frequency cap.
pub fn channel_power(series: &Array2<f64>) -> Array1<f64> {
    series
        .mapv(|v| v * v)
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(series.ncols()))
}

/// Magnitude-squared coherence of a spectral density tensor.
///
/// Parameters
/// ----------
/// - `density`: `(n_freqs, p, p)` Hermitian tensor with real non-negative
///   diagonal.
///
/// Returns
/// -------
/// `SpectralResult<Array3<f64>>`
///   Symmetric coherence tensor of the same shape.
///
/// Errors
/// ------
/// - `SpectralError::ShapeMismatch` if `density` is not a stack of square
///   matrices.
///
/// Notes
/// -----
/// - Each channel's reference power is its own largest auto-spectrum in
///   `density`. Use [`coherence_with_reference`] when the tensor holds only
///   a subset of frequencies and the result must not depend on which.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::Array3;
/// # use num_complex::Complex64;
/// # use spectral_coherence::spectral::coherence::coherence_from_density;
/// let mut s = Array3::<Complex64>::zeros((1, 2, 2));
/// s[[0, 0, 0]] = Complex64::new(4.0, 0.0);
/// s[[0, 1, 1]] = Complex64::new(1.0, 0.0);
/// s[[0, 0, 1]] = Complex64::new(0.0, 1.0);
/// s[[0, 1, 0]] = Complex64::new(0.0, -1.0);
/// let c = coherence_from_density(&s).unwrap();
/// assert!((c[[0, 0, 1]] - 0.25).abs() < 1e-12);
/// assert_eq!(c[[0, 1, 1]], 1.0);
/// ```
pub fn coherence_from_density<S>(density: &ArrayBase<S, Ix3>) -> SpectralResult<Array3<f64>>
where
    S: Data<Elem = Complex64>,
{
    let reference = peak_power(density)?;
    coherence_with_reference(density, &reference)
}

/// Magnitude-squared coherence with explicit per-channel reference powers.
///
/// Parameters
/// ----------
/// - `density`: `(n_freqs, p, p)` Hermitian tensor.
/// - `reference`: `&Array1<f64>`
///   One non-negative reference power per channel, e.g. [`channel_power`].
///
/// Errors
/// ------
/// - `SpectralError::ShapeMismatch` if `density` is not a stack of square
///   matrices or `reference` does not have one entry per channel.
pub fn coherence_with_reference<S>(
    density: &ArrayBase<S, Ix3>, reference: &Array1<f64>,
) -> SpectralResult<Array3<f64>>
where
    S: Data<Elem = Complex64>,
{
    normalize(
        density,
        reference,
        1.0,
        0.0,
        |cross, power_i, power_j| (cross.norm_sqr() / (power_i * power_j)).clamp(0.0, 1.0),
        |c| c,
    )
}

/// Complex coherency `S[i,j] / sqrt(S[i,i] S[j,j])` under the same zero-fill
/// policy as [`coherence_from_density`].
///
/// Errors
/// ------
/// - `SpectralError::ShapeMismatch` if `density` is not a stack of square
///   matrices.
pub fn coherency_from_density<S>(density: &ArrayBase<S, Ix3>) -> SpectralResult<Array3<Complex64>>
where
    S: Data<Elem = Complex64>,
{
    let reference = peak_power(density)?;
    coherency_with_reference(density, &reference)
}

/// Complex coherency with explicit per-channel reference powers.
///
/// Errors
/// ------
/// - Same as [`coherence_with_reference`].
pub fn coherency_with_reference<S>(
    density: &ArrayBase<S, Ix3>, reference: &Array1<f64>,
) -> SpectralResult<Array3<Complex64>>
where
    S: Data<Elem = Complex64>,
{
    normalize(
        density,
        reference,
        Complex64::new(1.0, 0.0),
        Complex64::new(0.0, 0.0),
        |cross, power_i, power_j| {
            let z = cross / (power_i * power_j).sqrt();
            let modulus = z.norm();
            if modulus > 1.0 { z / modulus } else { z }
        },
        |z| z.conj(),
    )
}

// ---- Helper methods ----

/// Largest auto-spectrum of every channel across the tensor.
fn peak_power<S>(density: &ArrayBase<S, Ix3>) -> SpectralResult<Array1<f64>>
where
    S: Data<Elem = Complex64>,
{
    let (_, p) = validate_square_stack(density)?;
    Ok(Array1::from_shape_fn(p, |i| {
        density.outer_iter().map(|mat| mat[[i, i]].re).fold(0.0_f64, f64::max)
    }))
}

fn normalize<S, T>(
    density: &ArrayBase<S, Ix3>, reference: &Array1<f64>, diagonal: T, degenerate: T,
    ratio: impl Fn(Complex64, f64, f64) -> T, mirror: impl Fn(T) -> T,
) -> SpectralResult<Array3<T>>
where
    S: Data<Elem = Complex64>,
    T: Copy,
{
    let (n_freqs, p) = validate_square_stack(density)?;
    if reference.len() != p {
        return Err(SpectralError::ShapeMismatch {
            expected: format!("one reference power per channel ({p})"),
            actual: vec![reference.len()],
        });
    }
    let thresholds = reference.mapv(|r| DEGENERATE_POWER_TOL * r.max(0.0));

    let mut out = Array3::from_elem((n_freqs, p, p), degenerate);
    let mut zero_filled = 0usize;

    for (mut dst, src) in out.outer_iter_mut().zip(density.outer_iter()) {
        let usable = |i: usize| {
            let power = src[[i, i]].re;
            power > 0.0 && power > thresholds[i]
        };
        for i in 0..p {
            dst[[i, i]] = diagonal;
            for j in (i + 1)..p {
                if usable(i) && usable(j) {
                    let value = ratio(src[[i, j]], src[[i, i]].re, src[[j, j]].re);
                    dst[[i, j]] = value;
                    dst[[j, i]] = mirror(value);
                } else {
                    zero_filled += 1;
                }
            }
        }
    }

    if zero_filled > 0 {
        trace!(zero_filled, n_freqs, n_features = p, "zero-filled degenerate coherence pairs");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::{
        errors::SpectralError, kernel::KernelType, periodogram::CrossPeriodogram, smoother::smooth,
    };
    use approx::assert_relative_eq;
    use ndarray::{Array2, Axis, concatenate};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Bounds, symmetry, and unit diagonal on a realistic smoothed tensor.
    // - Identical channels (coherence exactly 1).
    // - The zero-fill policy for a zero-power channel, and its independence
    //   from the scale of other channels.
    // - Explicit per-channel reference powers.
    // - Coherency structure and its relation to coherence.
    // - Shape validation.
    // -------------------------------------------------------------------------

    fn smoothed_density(series: &Array2<f64>, bandwidth: usize) -> Array3<Complex64> {
        let periodogram = CrossPeriodogram::from_series(series, false).unwrap();
        smooth(&periodogram.to_full(), bandwidth, KernelType::Rectangular).unwrap()
    }

    fn three_channel_series(n: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, 3), |(t, c)| {
            let t = t as f64;
            match c {
                0 => (0.31 * t).sin() + 0.4 * (1.7 * t).cos(),
                1 => (0.31 * t + 0.5).sin() + 0.8 * (2.3 * t * t / 50.0).sin(),
                _ => (0.05 * t * t).cos(),
            }
        })
    }

    #[test]
    // Purpose
    // -------
    // Verify coherence bounds, symmetry, and the unit diagonal.
    //
    // Given
    // -----
    // - A 64×3 series smoothed with B = 7.
    //
    // Expect
    // ------
    // - 0 ≤ C ≤ 1, C[i,j] == C[j,i], C[i,i] == 1 at every frequency.
    fn coherence_is_bounded_symmetric_with_unit_diagonal() {
        // Arrange
        let density = smoothed_density(&three_channel_series(64), 7);

        // Act
        let coh = coherence_from_density(&density).unwrap();

        // Assert
        for mat in coh.outer_iter() {
            for i in 0..3 {
                assert_eq!(mat[[i, i]], 1.0);
                for j in 0..3 {
                    assert!((0.0..=1.0).contains(&mat[[i, j]]));
                    assert_eq!(mat[[i, j]], mat[[j, i]]);
                }
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Check that identical channels are perfectly coherent.
    //
    // Given
    // -----
    // - A two-channel series whose columns are equal, B ∈ {1, 5, 11}.
    //
    // Expect
    // ------
    // - Off-diagonal coherence equal to 1 at every frequency.
    fn coherence_of_identical_channels_is_one() {
        // Arrange
        let column = three_channel_series(40).column(0).to_owned().insert_axis(Axis(1));
        let series = concatenate(Axis(1), &[column.view(), column.view()]).unwrap();

        for bandwidth in [1, 5, 11] {
            // Act
            let coh = coherence_from_density(&smoothed_density(&series, bandwidth)).unwrap();

            // Assert
            for mat in coh.outer_iter() {
                assert_relative_eq!(mat[[0, 1]], 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Exercise the zero-fill policy.
    //
    // Given
    // -----
    // - A two-channel series whose second column is identically zero.
    //
    // Expect
    // ------
    // - Off-diagonal coherence and coherency are 0; diagonals stay 1.
    fn zero_power_channel_is_zero_filled() {
        // Arrange
        let series = Array2::from_shape_fn((16, 2), |(t, c)| if c == 0 { (t as f64).sin() } else { 0.0 });
        let density = smoothed_density(&series, 3);

        // Act
        let coh = coherence_from_density(&density).unwrap();
        let cohy = coherency_from_density(&density).unwrap();

        // Assert
        for (c, z) in coh.outer_iter().zip(cohy.outer_iter()) {
            assert_eq!(c[[0, 1]], 0.0);
            assert_eq!(c[[1, 0]], 0.0);
            assert_eq!(c[[1, 1]], 1.0);
            assert_eq!(z[[0, 1]], Complex64::new(0.0, 0.0));
            assert_eq!(z[[0, 0]], Complex64::new(1.0, 0.0));
        }
    }

    #[test]
    // Purpose
    // -------
    // A channel that is a tiny multiple of another is still perfectly
    // coherent with it; silence is judged per channel, not against the
    // loudest channel in the tensor.
    //
    // Given
    // -----
    // - Channels x and 1e-7·x, n = 64, B = 5.
    //
    // Expect
    // ------
    // - Off-diagonal coherence ≈ 1 at every frequency, with the default and
    //   with the `channel_power` reference.
    fn scaled_copy_is_not_zero_filled() {
        // Arrange
        let column = three_channel_series(64).column(0).to_owned().insert_axis(Axis(1));
        let quiet = &column * 1e-7;
        let series = concatenate(Axis(1), &[column.view(), quiet.view()]).unwrap();
        let density = smoothed_density(&series, 5);

        // Act
        let by_peak = coherence_from_density(&density).unwrap();
        let by_power = coherence_with_reference(&density, &channel_power(&series)).unwrap();

        // Assert
        for (a, b) in by_peak.outer_iter().zip(by_power.outer_iter()) {
            assert_relative_eq!(a[[0, 1]], 1.0, epsilon = 1e-9);
            assert_relative_eq!(b[[0, 1]], 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    // Purpose
    // -------
    // Check that explicit reference powers apply channel by channel.
    //
    // Given
    // -----
    // - The 64×3 smoothed tensor, once with its mean powers and once with
    //   an enormous reference for channel 2 only.
    //
    // Expect
    // ------
    // - Mean powers zero-fill nothing. With the inflated reference every pair
    //   involving channel 2 is 0 while pair (0, 1) is unchanged.
    // - A reference of the wrong length is a `ShapeMismatch`.
    fn reference_powers_apply_per_channel() {
        // Arrange
        let series = three_channel_series(64);
        let density = smoothed_density(&series, 7);
        let power = channel_power(&series);
        let mut inflated = power.clone();
        inflated[2] = 1e40;

        // Act
        let plain = coherence_with_reference(&density, &power).unwrap();
        let silenced = coherency_with_reference(&density, &inflated).unwrap();

        // Assert
        for (c, z) in plain.outer_iter().zip(silenced.outer_iter()) {
            assert!(c[[0, 2]] > 0.0 && c[[1, 2]] > 0.0);
            assert_eq!(z[[0, 2]], Complex64::new(0.0, 0.0));
            assert_eq!(z[[2, 1]], Complex64::new(0.0, 0.0));
            assert_relative_eq!(z[[0, 1]].norm_sqr(), c[[0, 1]], epsilon = 1e-10);
        }
        assert!(matches!(
            coherence_with_reference(&density, &power.slice(ndarray::s![..2]).to_owned()),
            Err(SpectralError::ShapeMismatch { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Relate coherency to coherence and check its Hermitian structure.
    //
    // Given
    // -----
    // - The 64×3 smoothed tensor from above.
    //
    // Expect
    // ------
    // - |coherency|² ≈ coherence, coherency Hermitian with modulus ≤ 1.
    fn coherency_is_hermitian_and_squares_to_coherence() {
        // Arrange
        let density = smoothed_density(&three_channel_series(64), 9);

        // Act
        let coh = coherence_from_density(&density).unwrap();
        let cohy = coherency_from_density(&density).unwrap();

        // Assert
        for ((k, i, j), z) in cohy.indexed_iter() {
            assert!(z.norm() <= 1.0 + 1e-12);
            assert_eq!(*z, cohy[[k, j, i]].conj());
            assert_relative_eq!(z.norm_sqr(), coh[[k, i, j]], epsilon = 1e-10);
        }
    }

    #[test]
    // Purpose
    // -------
    // Reject tensors that are not stacks of square matrices.
    //
    // Given
    // -----
    // - A (4, 2, 3) tensor.
    //
    // Expect
    // ------
    // - `ShapeMismatch` from both normalizers.
    fn normalizers_reject_non_square_stack() {
        // Arrange
        let ragged = Array3::<Complex64>::zeros((4, 2, 3));

        // Act / Assert
        assert!(matches!(coherence_from_density(&ragged), Err(SpectralError::ShapeMismatch { .. })));
        assert!(matches!(coherency_from_density(&ragged), Err(SpectralError::ShapeMismatch { .. })));
    }
}
