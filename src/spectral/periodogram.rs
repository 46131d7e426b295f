//! spectral::periodogram — Fourier coefficients and raw cross-periodograms.
//!
//! Purpose
//! -------
//! Turn a real `n_samples × n_features` series into per-frequency complex
//! Hermitian matrices
//!
//! ```text
//! I(f)[i, j] = (1/n) · X_i(f) · conj(X_j(f)),
//! X_k(f)     = Σ_t x_k(t) · exp(-2πi f t),
//! ```
//!
//! the raw (inconsistent) estimate of the spectral density matrix.
//!
//! Key behaviors
//! -------------
//! - [`fourier_coefficients`] runs one batched forward FFT over every channel
//!   (single `rustfft` plan, single `process` call over a channel-major
//!   buffer), optionally after demeaning each channel.
//! - [`raw_periodogram`] forms the conjugate outer products directly at every
//!   bin of a [`FrequencyGrid`], as one broadcast product over all bins and
//!   channel pairs.
//! - [`CrossPeriodogram::matrices`] gathers any list of signed bins in one
//!   batched selection, conjugating the mirrored ones.
//! - [`CrossPeriodogram`] stores only bins `0..=⌊n/2⌋` and answers requests
//!   for any other bin through `I(-f) = conj(I(f))`, which holds for real
//!   input. This is the storage used by the half-spectrum path.
//!
//! Invariants & assumptions
//! ------------------------
//! - Outer products are computed so that `I[i,j]` and `I[j,i]` are exact
//!   conjugates and the diagonal is exactly real and non-negative; no
//!   tolerance is needed for these properties on raw periodograms.
//! - Callers validate the series; the helpers here only check the grid/series
//!   length agreement.
use crate::spectral::{
    errors::{SpectralError, SpectralResult},
    grid::FrequencyGrid,
    validation::validate_series,
};
use ndarray::{Array2, Array3, Axis};
use num_complex::Complex64;
use rustfft::FftPlanner;
use std::borrow::Cow;
use tracing::debug;

/// Discrete Fourier coefficients of every channel, natural FFT order.
///
/// Parameters
/// ----------
/// - `series`: `&Array2<f64>`
///   `n_samples × n_features` real series (rows = time). Assumed validated.
/// - `center`: `bool`
///   Subtract each channel's sample mean before transforming.
///
/// Returns
/// -------
/// `Array2<Complex64>`
///   `n_samples × n_features` matrix whose row `k` holds `X(k / n)` for every
///   channel (unnormalized forward transform).
pub fn fourier_coefficients(series: &Array2<f64>, center: bool) -> Array2<Complex64> {
    let (n_samples, n_features) = series.dim();

    let data: Cow<'_, Array2<f64>> = if center {
        series
            .mean_axis(Axis(0))
            .map_or(Cow::Borrowed(series), |means| Cow::Owned(series - &means))
    } else {
        Cow::Borrowed(series)
    };

    // Channel-major buffer so that one `process` call transforms all channels.
    let mut buffer: Vec<Complex64> = data.t().iter().map(|&v| Complex64::new(v, 0.0)).collect();
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n_samples);
    fft.process(&mut buffer);

    Array2::from_shape_fn((n_samples, n_features), |(k, c)| buffer[c * n_samples + k])
}

/// Raw cross-periodogram at every frequency of `grid`.
///
/// Parameters
/// ----------
/// - `series`: `&Array2<f64>`
///   `n_samples × n_features` real series.
/// - `grid`: `&FrequencyGrid`
///   Evaluation grid built for the same `n_samples`.
/// - `center`: `bool`
///   Demean channels before transforming.
///
/// Returns
/// -------
/// `SpectralResult<Array3<Complex64>>`
///   Tensor of shape `(grid.len(), n_features, n_features)`.
///
/// Errors
/// ------
/// - Any series validation error (`EmptySeries`, `NonFiniteData`).
/// - `SpectralError::ShapeMismatch` if the grid was built for a different
///   length.
///
/// Notes
/// -----
/// - Every requested bin is computed from its own Fourier coefficient; no
///   symmetry shortcut is taken. Use [`CrossPeriodogram`] for the half-
///   spectrum path.
pub fn raw_periodogram(
    series: &Array2<f64>, grid: &FrequencyGrid, center: bool,
) -> SpectralResult<Array3<Complex64>> {
    validate_series(series)?;
    check_grid_length(series.nrows(), grid)?;

    let coefficients = fourier_coefficients(series, center);
    Ok(outer_products(&coefficients, grid.indices()))
}

/// CrossPeriodogram — raw periodogram stored on the non-redundant half axis.
///
/// Purpose
/// -------
/// Hold `I(k/n)` for `k = 0..=⌊n/2⌋` of a real series and serve any signed
/// bin through conjugate symmetry, so the frequency smoother can read
/// neighbors across zero and across the Nyquist bin without recomputing
/// outer products.
///
/// Fields
/// ------
/// - `n_samples`: transform length `n`.
/// - `half`: tensor of shape `(⌊n/2⌋ + 1, n_features, n_features)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossPeriodogram {
    n_samples: usize,
    half: Array3<Complex64>,
}

impl CrossPeriodogram {
    /// Validate `series` and build its half-spectrum periodogram.
    ///
    /// Errors
    /// ------
    /// - Series validation errors (`EmptySeries`, `NonFiniteData`).
    pub fn from_series(series: &Array2<f64>, center: bool) -> SpectralResult<Self> {
        validate_series(series)?;
        let (n_samples, n_features) = series.dim();
        debug!(n_samples, n_features, center, "computing half-spectrum cross-periodogram");

        let coefficients = fourier_coefficients(series, center);
        Ok(Self::from_coefficients(&coefficients))
    }

    /// Build from precomputed Fourier coefficients (`n_samples × n_features`).
    pub fn from_coefficients(coefficients: &Array2<Complex64>) -> Self {
        let n_samples = coefficients.nrows();
        let bins: Vec<usize> = (0..=n_samples / 2).collect();
        CrossPeriodogram { n_samples, half: outer_products(coefficients, &bins) }
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn n_features(&self) -> usize {
        self.half.dim().1
    }

    /// The stored non-negative bins `0..=⌊n/2⌋`.
    pub fn half_spectrum(&self) -> &Array3<Complex64> {
        &self.half
    }

    /// Raw periodogram matrix at any signed bin (taken modulo `n`).
    pub fn matrix(&self, bin: isize) -> Array2<Complex64> {
        self.matrices(&[bin]).index_axis_move(Axis(0), 0)
    }

    /// Raw periodogram matrices at a list of signed bins, `(bins.len(), p, p)`.
    ///
    /// One `select` gathers every stored bin; mirrored bins are conjugated in
    /// place afterwards.
    pub fn matrices(&self, bins: &[isize]) -> Array3<Complex64> {
        let (stored, mirrored): (Vec<usize>, Vec<bool>) =
            bins.iter().map(|&bin| self.resolve(bin)).unzip();
        let mut out = self.half.select(Axis(0), &stored);
        for (mut mat, flip) in out.outer_iter_mut().zip(mirrored) {
            if flip {
                mat.mapv_inplace(|z| z.conj());
            }
        }
        out
    }

    /// Expand to all `n` bins in natural FFT order.
    pub fn to_full(&self) -> Array3<Complex64> {
        let bins: Vec<isize> = (0..self.n_samples as isize).collect();
        self.matrices(&bins)
    }

    // Map a signed bin to (stored index, needs conjugation).
    fn resolve(&self, bin: isize) -> (usize, bool) {
        let r = bin.rem_euclid(self.n_samples as isize) as usize;
        if r <= self.n_samples / 2 { (r, false) } else { (self.n_samples - r, true) }
    }
}

// ---- Helper methods ----

/// Conjugate outer products `(1/n) x xᴴ` at the requested natural bins.
///
/// Broadcasts `(m, p, 1) × (m, 1, p)` over all bins at once. Each entry is
/// `x_i · conj(x_j)`, so `[i, j]` and `[j, i]` are exact conjugates and the
/// diagonal has an exactly zero imaginary part.
fn outer_products(coefficients: &Array2<Complex64>, bins: &[usize]) -> Array3<Complex64> {
    let scale = 1.0 / coefficients.nrows() as f64;
    let rows = coefficients.select(Axis(0), bins);
    let conjugated = rows.mapv(|z| z.conj());

    let mut out = &rows.insert_axis(Axis(2)) * &conjugated.insert_axis(Axis(1));
    out.mapv_inplace(|z| z * scale);
    out
}

pub(crate) fn check_grid_length(n_samples: usize, grid: &FrequencyGrid) -> SpectralResult<()> {
    if grid.n_samples() != n_samples {
        return Err(SpectralError::ShapeMismatch {
            expected: format!("grid built for n_samples = {n_samples}"),
            actual: vec![grid.n_samples()],
        });
    }
    Ok(())
}
