//! spectral::lag_window — lag-window (tapered covariance) spectral estimator.
//!
//! Purpose
//! -------
//! Estimate the spectral density matrix in the lag domain: compute sample
//! cross-covariance matrices up to lag `L`, taper them, and Fourier-transform
//! the tapered sequence. The estimator has the form
//!
//! ```text
//! f̂(ν) = Σ_{ℓ=-L}^{L} w(ℓ/L) · Γ(ℓ) · exp(-2πi ℓ ν),
//! Γ(ℓ) = c_ℓ · X_{ℓ:}ᵀ X_{:n−ℓ}      (ℓ ≥ 0),     Γ(−ℓ) = Γ(ℓ)ᵀ,
//! ```
//!
//! where `X` is the `n×p` series (rows = time), `w` is the lag taper (Bartlett
//! by default, `w(x) = 1 − |x|`), and `c_ℓ` is `1/n` or, with the small-sample
//! correction, `1/(n − ℓ)`.
//!
//! Key behaviors
//! -------------
//! - [`LagWindow`] is a reusable evaluator: covariances are computed once in
//!   `O(n · L · p²)`, then [`LagWindow::evaluate`] returns the `p×p` estimate
//!   at any normalized frequency, on or off the Fourier grid.
//! - [`LagWindow::evaluate_grid`] zero-pads the tapered sequence to length
//!   `n` and runs one batched FFT over the upper-triangular entry pairs,
//!   amortizing the cost across all grid frequencies.
//! - Only Bartlett and Parzen tapers are accepted; a truncated rectangular
//!   or quadratic-spectral taper can make auto-spectra negative.
//! - Without any taper, `L = n − 1` and `c_ℓ = 1/n`, the covariance
//!   sequence transforms back to the raw periodogram at every Fourier
//!   frequency; the unit tests use this to pin the normalization.
//!
//! Invariants & assumptions
//! ------------------------
//! - `1 ≤ L < n`; validated on construction.
//! - Outputs are exactly Hermitian with exactly real diagonals. With
//!   `c_ℓ = 1/n` the diagonal is also non-negative; the small-sample
//!   correction does not guarantee this.
use crate::spectral::{
    errors::{SpectralError, SpectralResult},
    estimator::{SpectralDensity, assemble_density},
    grid::{FrequencyGrid, build_grid},
    kernel::KernelType,
    periodogram::check_grid_length,
    validation::{validate_max_lag, validate_series, validate_taper},
};
use ndarray::{Array2, Array3, ArrayBase, Axis, DataMut, Ix2, s};
use num_complex::Complex64;
use rustfft::FftPlanner;
use std::{borrow::Cow, f64::consts::PI};
use tracing::debug;

/// LagWindowOptions — configuration for the lag-window estimator.
///
/// Fields
/// ------
/// - `taper`: [`KernelType`]
///   Lag taper evaluated at `ℓ/L`; `Bartlett` or `Parzen`.
/// - `center`: `bool`
///   Demean each channel before computing covariances.
/// - `small_sample_correction`: `bool`
///   Use `c_ℓ = 1/(n−ℓ)` instead of `c_ℓ = 1/n`.
///
/// Notes
/// -----
/// - `Default` gives the Bartlett taper, no centering, and `c_ℓ = 1/n`,
///   which matches the normalization of the raw periodogram.
#[derive(Debug, Clone, PartialEq)]
pub struct LagWindowOptions {
    /// Lag taper family.
    pub taper: KernelType,
    /// Demean channels before computing covariances.
    pub center: bool,
    /// Apply the `1/(n−ℓ)` finite-sample scaling.
    pub small_sample_correction: bool,
}

impl LagWindowOptions {
    pub fn new(taper: KernelType, center: bool, small_sample_correction: bool) -> Self {
        LagWindowOptions { taper, center, small_sample_correction }
    }
}

impl Default for LagWindowOptions {
    fn default() -> Self {
        Self { taper: KernelType::Bartlett, center: false, small_sample_correction: false }
    }
}

/// LagWindow — tapered cross-covariance sequence ready for evaluation.
///
/// Fields
/// ------
/// - `n_samples`: length of the series the covariances came from.
/// - `max_lag`: truncation point `L`.
/// - `tapered`: `w(ℓ/L) · Γ(ℓ)` for `ℓ = 0..=L`, each `p×p`.
#[derive(Debug, Clone, PartialEq)]
pub struct LagWindow {
    n_samples: usize,
    max_lag: usize,
    tapered: Vec<Array2<f64>>,
}

impl LagWindow {
    /// Compute and taper the cross-covariances of `series` up to lag `L`.
    ///
    /// Parameters
    /// ----------
    /// - `series`: `&Array2<f64>`
    ///   `n×p` real series (rows = time).
    /// - `max_lag`: `usize`
    ///   Truncation `L`, `1 ≤ L < n`.
    /// - `opts`: `&LagWindowOptions`
    ///   Taper, centering, and scaling policy.
    ///
    /// Returns
    /// -------
    /// `SpectralResult<LagWindow>`
    ///
    /// Errors
    /// ------
    /// - Series validation errors (`EmptySeries`, `NonFiniteData`).
    /// - `SpectralError::InvalidMaxLag` when `L = 0` or `L ≥ n`.
    /// - `SpectralError::IndefiniteTaper` for a taper other than Bartlett or
    ///   Parzen.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use ndarray::array;
    /// # use spectral_coherence::spectral::lag_window::{LagWindow, LagWindowOptions};
    /// let series = array![[1.0], [2.0], [3.0]];
    /// let window = LagWindow::new(&series, 1, &LagWindowOptions::default()).unwrap();
    /// // Bartlett weight vanishes at ℓ = L, so only Γ(0) = 14/3 survives.
    /// let f = window.evaluate(0.1).unwrap();
    /// assert!((f[[0, 0]].re - 14.0 / 3.0).abs() < 1e-12);
    /// ```
    pub fn new(series: &Array2<f64>, max_lag: usize, opts: &LagWindowOptions) -> SpectralResult<Self> {
        validate_series(series)?;
        let (n_samples, n_features) = series.dim();
        validate_max_lag(max_lag, n_samples)?;
        validate_taper(opts.taper)?;
        debug!(n_samples, n_features, max_lag, taper = ?opts.taper, "building lag window");

        let data: Cow<'_, Array2<f64>> = if opts.center {
            series
                .mean_axis(Axis(0))
                .map_or(Cow::Borrowed(series), |means| Cow::Owned(series - &means))
        } else {
            Cow::Borrowed(series)
        };

        let tapered = opts
            .taper
            .lag_weights(max_lag)
            .into_iter()
            .enumerate()
            .map(|(lag, weight)| {
                lagged_covariance(data.as_ref(), lag, opts.small_sample_correction) * weight
            })
            .collect();

        Ok(LagWindow { n_samples, max_lag, tapered })
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn n_features(&self) -> usize {
        self.tapered[0].nrows()
    }

    pub fn max_lag(&self) -> usize {
        self.max_lag
    }

    /// Tapered covariances `w(ℓ/L) Γ(ℓ)` for `ℓ = 0..=L`.
    pub fn tapered_covariances(&self) -> &[Array2<f64>] {
        &self.tapered
    }

    /// Evaluate the estimate at a single normalized frequency `ν`.
    ///
    /// Errors
    /// ------
    /// - `SpectralError::InvalidFrequency` if `ν` is NaN or ±∞.
    ///
    /// Notes
    /// -----
    /// - Costs `O(L · p²)` per call; nothing is shared between calls. Use
    ///   [`LagWindow::evaluate_grid`] for many Fourier frequencies.
    pub fn evaluate(&self, nu: f64) -> SpectralResult<Array2<Complex64>> {
        if !nu.is_finite() {
            return Err(SpectralError::InvalidFrequency { nu });
        }
        let p = self.n_features();
        let mut out = Array2::<Complex64>::zeros((p, p));

        for (lag, gamma) in self.tapered.iter().enumerate() {
            let phase = Complex64::from_polar(1.0, -2.0 * PI * lag as f64 * nu);
            for i in 0..p {
                for j in i..p {
                    let mut term = phase * gamma[[i, j]];
                    if lag > 0 {
                        term += phase.conj() * gamma[[j, i]];
                    }
                    out[[i, j]] += term;
                }
            }
        }
        fill_hermitian(&mut out);
        Ok(out)
    }

    /// Evaluate the estimate at every frequency of `grid` with one batched FFT.
    ///
    /// Errors
    /// ------
    /// - `SpectralError::ShapeMismatch` if `grid` was built for a different
    ///   series length.
    ///
    /// Notes
    /// -----
    /// - The tapered sequence is laid out cyclically on `n` points
    ///   (`ℓ ↦ ℓ mod n`); overlapping positions are summed, which is exact
    ///   for evaluation at the Fourier frequencies `k/n`.
    pub fn evaluate_grid(&self, grid: &FrequencyGrid) -> SpectralResult<Array3<Complex64>> {
        check_grid_length(self.n_samples, grid)?;
        let n = self.n_samples;
        let p = self.n_features();
        let pairs: Vec<(usize, usize)> =
            (0..p).flat_map(|i| (i..p).map(move |j| (i, j))).collect();

        let mut buffer = vec![Complex64::new(0.0, 0.0); pairs.len() * n];
        for (chunk, &(i, j)) in buffer.chunks_mut(n).zip(&pairs) {
            for (lag, gamma) in self.tapered.iter().enumerate() {
                chunk[lag % n] += gamma[[i, j]];
                if lag > 0 {
                    chunk[n - lag] += gamma[[j, i]];
                }
            }
        }

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(n);
        fft.process(&mut buffer);

        let mut out = Array3::<Complex64>::zeros((grid.len(), p, p));
        for (mut mat, &bin) in out.outer_iter_mut().zip(grid.indices()) {
            for (pair, &(i, j)) in pairs.iter().enumerate() {
                mat[[i, j]] = buffer[pair * n + bin];
            }
            fill_hermitian(&mut mat);
        }
        Ok(out)
    }
}

impl LagWindow {
    /// Evaluate on the standard grid, the same way [`Estimator`] does.
    ///
    /// Parameters
    /// ----------
    /// - `n_max_freqs`: optional frequency cap.
    /// - `half`: restrict to `[0, 0.5]`.
    ///
    /// Errors
    /// ------
    /// - `SpectralError::InvalidMaxFreqs` for `n_max_freqs = Some(0)`.
    ///
    /// [`Estimator`]: crate::spectral::estimator::Estimator
    pub fn estimate(&self, n_max_freqs: Option<usize>, half: bool) -> SpectralResult<SpectralDensity> {
        let half_grid = build_grid(self.n_samples, n_max_freqs, true)?;
        let density = self.evaluate_grid(&half_grid)?;
        assemble_density(density, &half_grid, n_max_freqs, half)
    }
}

/// Lag-window evaluator with default options (Bartlett taper).
///
/// Errors
/// ------
/// - Same as [`LagWindow::new`].
pub fn lag_window(series: &Array2<f64>, max_lag: usize) -> SpectralResult<LagWindow> {
    LagWindow::new(series, max_lag, &LagWindowOptions::default())
}

/// Lag-window estimate at every frequency of `grid`.
///
/// Errors
/// ------
/// - Same as [`LagWindow::new`] and [`LagWindow::evaluate_grid`].
pub fn lag_window_estimate(
    series: &Array2<f64>, max_lag: usize, grid: &FrequencyGrid, opts: &LagWindowOptions,
) -> SpectralResult<Array3<Complex64>> {
    LagWindow::new(series, max_lag, opts)?.evaluate_grid(grid)
}

// ---- Helper methods ----

/// `Γ(ℓ) = c_ℓ · X_{ℓ:}ᵀ X_{:n−ℓ}` for a single lag.
fn lagged_covariance(data: &Array2<f64>, lag: usize, small_sample_correction: bool) -> Array2<f64> {
    let n = data.nrows();
    let scale = if small_sample_correction {
        1.0 / ((n - lag) as f64)
    } else {
        1.0 / (n as f64)
    };
    let lagged = data.slice(s![lag.., ..]);
    let leading = data.slice(s![..n - lag, ..]);
    lagged.t().dot(&leading) * scale
}

/// Copy the upper triangle onto the lower one by conjugation and drop the
/// imaginary part of the diagonal.
fn fill_hermitian<S: DataMut<Elem = Complex64>>(mat: &mut ArrayBase<S, Ix2>) {
    let p = mat.nrows();
    for i in 0..p {
        mat[[i, i]] = Complex64::new(mat[[i, i]].re, 0.0);
        for j in 0..i {
            mat[[i, j]] = mat[[j, i]].conj();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::periodogram::raw_periodogram;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Hand-computable covariances and evaluations for a tiny series.
    // - Equivalence with the raw periodogram for the untapered, full-lag
    //   covariance sequence.
    // - Rejection of indefinite tapers.
    // - Agreement of the batched grid evaluation with pointwise evaluation.
    // - Hermitian structure, periodicity, and non-negativity (Bartlett).
    // - Parameter error paths.
    // -------------------------------------------------------------------------

    const TOL: f64 = 1e-10;

    fn two_channel_series(n: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, 2), |(t, c)| {
            let t = t as f64;
            if c == 0 { (0.9 * t).sin() + 0.3 } else { (0.4 * t).cos() + 0.5 * (0.9 * t - 0.2).sin() }
        })
    }

    #[test]
    // Purpose
    // -------
    // Validate covariances and evaluation against a manual computation.
    //
    // Given
    // -----
    // - x = [1, 2, 3], L = 2, Bartlett taper [1, 1/2, 0], c_ℓ = 1/n.
    // - Γ(0) = 14/3, Γ(1) = 8/3, Γ(2) = 1, so
    //   f(ν) = 14/3 + (8/3) cos(2πν).
    //
    // Expect
    // ------
    // - f(0) = 22/3, f(0.25) = 14/3, f(0.5) = 2.
    fn evaluate_matches_manual_bartlett_window() {
        // Arrange
        let series = array![[1.0], [2.0], [3.0]];

        // Act
        let window = lag_window(&series, 2).unwrap();

        // Assert
        let tapered = window.tapered_covariances();
        assert_relative_eq!(tapered[0][[0, 0]], 14.0 / 3.0, epsilon = TOL);
        assert_relative_eq!(tapered[1][[0, 0]], 4.0 / 3.0, epsilon = TOL);
        assert_relative_eq!(tapered[2][[0, 0]], 0.0, epsilon = TOL);
        for (nu, expected) in [(0.0, 22.0 / 3.0), (0.25, 14.0 / 3.0), (0.5, 2.0)] {
            let f = window.evaluate(nu).unwrap();
            assert_relative_eq!(f[[0, 0]].re, expected, epsilon = TOL);
            assert_eq!(f[[0, 0]].im, 0.0);
        }
    }

    #[test]
    // Purpose
    // -------
    // Check the small-sample correction on Γ(1).
    //
    // Given
    // -----
    // - x = [1, 2, 3], L = 2, Bartlett taper, correction on.
    //
    // Expect
    // ------
    // - Γ(1) = 8/2 = 4, tapered by 1/2 to 2.
    fn small_sample_correction_rescales_lagged_covariance() {
        // Arrange
        let series = array![[1.0], [2.0], [3.0]];
        let opts = LagWindowOptions::new(KernelType::Bartlett, false, true);

        // Act
        let window = LagWindow::new(&series, 2, &opts).unwrap();

        // Assert
        assert_relative_eq!(window.tapered_covariances()[1][[0, 0]], 2.0, epsilon = TOL);
    }

    #[test]
    // Purpose
    // -------
    // Verify that the untapered covariance sequence with L = n − 1 equals
    // the raw periodogram at every Fourier frequency, which pins the
    // covariance normalization and the cyclic layout of `evaluate_grid`.
    //
    // Given
    // -----
    // - A 12×2 series, every lag 0..=11 at weight 1, c_ℓ = 1/n.
    //
    // Expect
    // ------
    // - `evaluate_grid` matches `raw_periodogram` on the full grid.
    fn untapered_covariances_reproduce_raw_periodogram() {
        // Arrange
        let n = 12;
        let series = two_channel_series(n);
        let grid = build_grid(n, None, false).unwrap();
        let tapered = (0..n).map(|lag| lagged_covariance(&series, lag, false)).collect();
        let untapered = LagWindow { n_samples: n, max_lag: n - 1, tapered };

        // Act
        let lagged = untapered.evaluate_grid(&grid).unwrap();
        let direct = raw_periodogram(&series, &grid, false).unwrap();

        // Assert
        for (a, b) in lagged.iter().zip(direct.iter()) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-9);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-9);
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure the batched FFT path agrees with pointwise evaluation,
    // including when 2L + 1 > n (cyclic aliasing of lags).
    //
    // Given
    // -----
    // - A 15×2 series, Parzen taper, L ∈ {4, 10}.
    //
    // Expect
    // ------
    // - `evaluate_grid` rows equal `evaluate(f)` for every grid frequency.
    fn evaluate_grid_matches_pointwise_evaluation() {
        // Arrange
        let n = 15;
        let series = two_channel_series(n);
        let grid = build_grid(n, None, false).unwrap();
        let opts = LagWindowOptions::new(KernelType::Parzen, true, false);

        for max_lag in [4, 10] {
            // Act
            let window = LagWindow::new(&series, max_lag, &opts).unwrap();
            let batched = window.evaluate_grid(&grid).unwrap();

            // Assert
            for (pos, &nu) in grid.frequencies().iter().enumerate() {
                let point = window.evaluate(nu).unwrap();
                for ((i, j), z) in point.indexed_iter() {
                    assert_relative_eq!(z.re, batched[[pos, i, j]].re, epsilon = TOL);
                    assert_relative_eq!(z.im, batched[[pos, i, j]].im, epsilon = TOL);
                }
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Check Hermitian structure, unit periodicity, conjugate symmetry in ν,
    // and non-negativity of the Bartlett estimate at off-grid frequencies.
    //
    // Given
    // -----
    // - A 40×2 series, default options, L = 6, ν on a fine off-grid mesh.
    //
    // Expect
    // ------
    // - f(ν) Hermitian, f(ν + 1) ≈ f(ν), f(−ν) ≈ conj(f(ν)), diag ≥ 0.
    fn evaluate_is_hermitian_periodic_and_non_negative_for_bartlett() {
        // Arrange
        let series = two_channel_series(40);
        let window = lag_window(&series, 6).unwrap();

        for step in 0..50 {
            let nu = -0.49 + 0.0197 * step as f64;

            // Act
            let f = window.evaluate(nu).unwrap();
            let shifted = window.evaluate(nu + 1.0).unwrap();
            let mirrored = window.evaluate(-nu).unwrap();

            // Assert
            for i in 0..2 {
                assert!(f[[i, i]].re >= -TOL);
                assert_eq!(f[[i, i]].im, 0.0);
                for j in 0..2 {
                    assert_eq!(f[[i, j]], f[[j, i]].conj());
                    assert_relative_eq!(shifted[[i, j]].re, f[[i, j]].re, epsilon = 1e-9);
                    assert_relative_eq!(shifted[[i, j]].im, f[[i, j]].im, epsilon = 1e-9);
                    assert_relative_eq!(mirrored[[i, j]].re, f[[i, j]].re, epsilon = 1e-9);
                    assert_relative_eq!(mirrored[[i, j]].im, -f[[i, j]].im, epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Cover the lag and frequency error paths.
    //
    // Given
    // -----
    // - A 5-sample series with L ∈ {0, 5}, and a valid window at ν = NaN.
    //
    // Expect
    // ------
    // - `InvalidMaxLag` for both lags and `InvalidFrequency` for NaN.
    fn lag_window_rejects_invalid_lag_and_frequency() {
        // Arrange
        let series = array![[1.0], [0.0], [2.0], [1.0], [3.0]];

        // Act / Assert
        assert_eq!(
            lag_window(&series, 0).unwrap_err(),
            SpectralError::InvalidMaxLag { max_lag: 0, n_samples: 5 }
        );
        assert_eq!(
            lag_window(&series, 5).unwrap_err(),
            SpectralError::InvalidMaxLag { max_lag: 5, n_samples: 5 }
        );
        let window = lag_window(&series, 2).unwrap();
        assert!(matches!(window.evaluate(f64::NAN), Err(SpectralError::InvalidFrequency { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Reject tapers that can drive auto-spectra negative.
    //
    // Given
    // -----
    // - 64 samples of a two-channel series, L = 20, rectangular and
    //   quadratic-spectral tapers; the same setup with Parzen.
    //
    // Expect
    // ------
    // - `IndefiniteTaper` for the first two, from both `LagWindow::new` and
    //   `lag_window_estimate`.
    // - Parzen is accepted and its auto-spectra are non-negative on the grid.
    fn indefinite_tapers_are_rejected() {
        // Arrange
        let series = two_channel_series(64);
        let grid = build_grid(64, None, false).unwrap();

        for taper in [KernelType::Rectangular, KernelType::QuadraticSpectral] {
            let opts = LagWindowOptions::new(taper, false, false);

            // Act / Assert
            assert_eq!(LagWindow::new(&series, 20, &opts), Err(SpectralError::IndefiniteTaper { taper }));
            assert_eq!(
                lag_window_estimate(&series, 20, &grid, &opts),
                Err(SpectralError::IndefiniteTaper { taper })
            );
        }

        let parzen = LagWindowOptions::new(KernelType::Parzen, false, false);
        let density = lag_window_estimate(&series, 20, &grid, &parzen).unwrap();
        for mat in density.outer_iter() {
            assert!(mat[[0, 0]].re >= -TOL && mat[[1, 1]].re >= -TOL);
        }
    }

    #[test]
    // Purpose
    // -------
    // Check `estimate` on half and full grids, with a cap.
    //
    // Given
    // -----
    // - A 21×2 series, L = 5, cap 8.
    //
    // Expect
    // ------
    // - Half frequencies in [0, 0.5]; the full result is Hermitian in
    //   frequency and agrees with `evaluate` at every returned frequency.
    fn estimate_returns_grid_values_for_half_and_full() {
        // Arrange
        let window = lag_window(&two_channel_series(21), 5).unwrap();

        // Act
        let half = window.estimate(Some(8), true).unwrap();
        let full = window.estimate(Some(8), false).unwrap();

        // Assert
        assert!(half.frequencies().iter().all(|&f| (0.0..=0.5).contains(&f)));
        assert!(full.frequencies().len() <= 8);
        for (pos, &nu) in full.frequencies().iter().enumerate() {
            let point = window.evaluate(nu).unwrap();
            for ((i, j), z) in point.indexed_iter() {
                assert_relative_eq!(z.re, full.density()[[pos, i, j]].re, epsilon = TOL);
                assert_relative_eq!(z.im, full.density()[[pos, i, j]].im, epsilon = TOL);
            }
        }
    }
}
