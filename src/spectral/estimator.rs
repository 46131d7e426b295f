//! spectral::estimator — estimator strategy and public entry points.
//!
//! Purpose
//! -------
//! Tie the building blocks together: validate inputs, build the frequency
//! grid, produce a spectral density estimate with either the smoothed
//! periodogram or the lag-window method, and optionally normalize it into
//! coherence or coherency. This is the layer downstream code calls.
//!
//! Key behaviors
//! -------------
//! - [`Estimator`] is a closed set of estimation strategies:
//!   - `SmoothedPeriodogram { bandwidth, options }` averages `B` neighboring
//!     Fourier frequencies of the raw cross-periodogram,
//!   - `LagWindow { max_lag, options }` tapers and transforms the sample
//!     cross-covariances up to lag `L`.
//!   Both produce the same output shape and are interchangeable.
//! - Every estimate is first computed on the half grid (non-negative
//!   frequencies). Full-grid results are reconstructed with
//!   `S(-f) = conj(S(f))` and `C(-f) = C(f)` via `spectral::half_spectrum`.
//! - Free functions ([`smoothed_periodogram`], [`coherence`],
//!   [`half_smoothed_periodogram`], [`half_coherence`], [`coherency`]) are
//!   shorthands for the smoothed periodogram with default options.
//!
//! Invariants & assumptions
//! ------------------------
//! - All validation (series, `B` or `L`, `n_max_freqs`) happens before any
//!   Fourier transform runs; series errors are reported first.
//! - Returned frequencies are strictly increasing, in `(-0.5, 0.5]` for full
//!   results and `[0, 0.5]` for half results.
//! - Density tensors are Hermitian with real non-negative diagonals. Lag
//!   windows only accept positive semi-definite tapers; the one exception is
//!   `small_sample_correction`, which can push auto-spectra slightly below
//!   zero. Coherence tensors have a unit diagonal and off-diagonals in
//!   `[0, 1]`.
//!
//! Conventions
//! -----------
//! - Frequencies are in cycles per sample; there is no sampling-rate
//!   argument.
//! - Tensors are `(n_freqs, n_features, n_features)`.
//!
//! Downstream usage
//! ----------------
//! - Use the free functions for the common case, or build an [`Estimator`]
//!   to choose the method, the kernel, and centering explicitly.
use crate::spectral::{
    coherence::{channel_power, coherence_with_reference, coherency_with_reference},
    errors::SpectralResult,
    grid::{FrequencyGrid, build_grid},
    half_spectrum::{mirror_coherence, mirror_density},
    kernel::KernelType,
    lag_window::{LagWindow, LagWindowOptions},
    periodogram::CrossPeriodogram,
    smoother::smooth_bins,
    validation::{
        validate_bandwidth, validate_max_freqs, validate_max_lag, validate_series, validate_taper,
    },
};
use ndarray::{Array1, Array2, Array3};
use num_complex::Complex64;
use tracing::debug;

/// SmoothingOptions — configuration for the smoothed periodogram.
///
/// Fields
/// ------
/// - `window`: [`KernelType`]
///   Shape of the frequency-domain averaging window.
/// - `center`: `bool`
///   Demean each channel before the Fourier transform.
///
/// Notes
/// -----
/// - `Default` is the uniform (Daniell) window without centering, i.e. the
///   plain average of `B` neighboring periodogram ordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingOptions {
    pub window: KernelType,
    pub center: bool,
}

impl SmoothingOptions {
    pub fn new(window: KernelType, center: bool) -> Self {
        SmoothingOptions { window, center }
    }
}

impl Default for SmoothingOptions {
    fn default() -> Self {
        Self { window: KernelType::Rectangular, center: false }
    }
}

/// SpectralDensity — spectral density matrices and their frequencies.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralDensity {
    density: Array3<Complex64>,
    frequencies: Array1<f64>,
}

impl SpectralDensity {
    /// Tensor `(n_freqs, n_features, n_features)`.
    pub fn density(&self) -> &Array3<Complex64> {
        &self.density
    }

    pub fn frequencies(&self) -> &Array1<f64> {
        &self.frequencies
    }

    pub fn n_features(&self) -> usize {
        self.density.dim().1
    }

    /// Split into `(density, frequencies)`.
    pub fn into_parts(self) -> (Array3<Complex64>, Array1<f64>) {
        (self.density, self.frequencies)
    }
}

/// Coherence — magnitude-squared coherence matrices and their frequencies.
#[derive(Debug, Clone, PartialEq)]
pub struct Coherence {
    coherence: Array3<f64>,
    frequencies: Array1<f64>,
}

impl Coherence {
    /// Tensor `(n_freqs, n_features, n_features)`, values in `[0, 1]`.
    pub fn coherence(&self) -> &Array3<f64> {
        &self.coherence
    }

    pub fn frequencies(&self) -> &Array1<f64> {
        &self.frequencies
    }

    /// Split into `(coherence, frequencies)`.
    pub fn into_parts(self) -> (Array3<f64>, Array1<f64>) {
        (self.coherence, self.frequencies)
    }
}

/// Coherency — complex normalized cross-spectra and their frequencies.
#[derive(Debug, Clone, PartialEq)]
pub struct Coherency {
    coherency: Array3<Complex64>,
    frequencies: Array1<f64>,
}

impl Coherency {
    /// Tensor `(n_freqs, n_features, n_features)`, moduli in `[0, 1]`.
    pub fn coherency(&self) -> &Array3<Complex64> {
        &self.coherency
    }

    pub fn frequencies(&self) -> &Array1<f64> {
        &self.frequencies
    }

    /// Split into `(coherency, frequencies)`.
    pub fn into_parts(self) -> (Array3<Complex64>, Array1<f64>) {
        (self.coherency, self.frequencies)
    }
}

/// Estimator — spectral density estimation strategy.
///
/// Variants
/// --------
/// - `SmoothedPeriodogram { bandwidth, options }`
///   Odd bandwidth `B`, `1 ≤ B ≤ n_samples`.
/// - `LagWindow { max_lag, options }`
///   Truncation `L`, `1 ≤ L < n_samples`; the taper must be Bartlett or
///   Parzen.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::Array2;
/// # use spectral_coherence::spectral::estimator::Estimator;
/// let series = Array2::from_shape_fn((64, 2), |(t, c)| ((t * (c + 1)) as f64 * 0.3).sin());
/// let smoothed = Estimator::smoothed_periodogram(5).estimate(&series, None, true).unwrap();
/// let lagged = Estimator::lag_window(8).estimate(&series, None, true).unwrap();
/// assert_eq!(smoothed.density().dim(), lagged.density().dim());
/// assert_eq!(smoothed.frequencies(), lagged.frequencies());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Estimator {
    SmoothedPeriodogram { bandwidth: usize, options: SmoothingOptions },
    LagWindow { max_lag: usize, options: LagWindowOptions },
}

impl Estimator {
    /// Smoothed periodogram with default [`SmoothingOptions`].
    pub fn smoothed_periodogram(bandwidth: usize) -> Self {
        Estimator::SmoothedPeriodogram { bandwidth, options: SmoothingOptions::default() }
    }

    /// Lag-window estimator with default [`LagWindowOptions`].
    pub fn lag_window(max_lag: usize) -> Self {
        Estimator::LagWindow { max_lag, options: LagWindowOptions::default() }
    }

    /// Estimate the spectral density matrix.
    ///
    /// Parameters
    /// ----------
    /// - `series`: `&Array2<f64>`
    ///   `n_samples × n_features` real series (rows = time).
    /// - `n_max_freqs`: `Option<usize>`
    ///   Optional cap on the number of output frequencies.
    /// - `half`: `bool`
    ///   Return only frequencies in `[0, 0.5]`.
    ///
    /// Returns
    /// -------
    /// `SpectralResult<SpectralDensity>`
    ///
    /// Errors
    /// ------
    /// - `EmptySeries` / `NonFiniteData` for an unusable series.
    /// - `InvalidBandwidth` / `EvenBandwidth` / `InvalidMaxLag` /
    ///   `IndefiniteTaper` for the method parameters.
    /// - `InvalidMaxFreqs` for `n_max_freqs = Some(0)`.
    pub fn estimate(
        &self, series: &Array2<f64>, n_max_freqs: Option<usize>, half: bool,
    ) -> SpectralResult<SpectralDensity> {
        let half_grid = self.prepare(series, n_max_freqs, half)?;
        let density = self.half_density(series, &half_grid)?;
        assemble_density(density, &half_grid, n_max_freqs, half)
    }

    /// Estimate magnitude-squared coherence.
    ///
    /// Errors
    /// ------
    /// - Same as [`Estimator::estimate`].
    ///
    /// Notes
    /// -----
    /// - A channel is treated as silent at a frequency when its auto-spectrum
    ///   is negligible next to its own mean power; pairs involving it are
    ///   zero-filled (see `spectral::coherence`). The decision does not
    ///   depend on the other channels or on `n_max_freqs`.
    pub fn coherence(
        &self, series: &Array2<f64>, n_max_freqs: Option<usize>, half: bool,
    ) -> SpectralResult<Coherence> {
        let half_grid = self.prepare(series, n_max_freqs, half)?;
        let density = self.half_density(series, &half_grid)?;
        let coherence = coherence_with_reference(&density, &channel_power(series))?;
        if half {
            return Ok(Coherence { coherence, frequencies: half_grid.frequencies().clone() });
        }
        let full_grid = build_grid(series.nrows(), n_max_freqs, false)?;
        let coherence = mirror_coherence(&coherence, &half_grid, &full_grid)?;
        Ok(Coherence { coherence, frequencies: full_grid.frequencies().clone() })
    }

    /// Estimate complex coherency.
    ///
    /// Errors
    /// ------
    /// - Same as [`Estimator::estimate`].
    pub fn coherency(
        &self, series: &Array2<f64>, n_max_freqs: Option<usize>, half: bool,
    ) -> SpectralResult<Coherency> {
        let half_grid = self.prepare(series, n_max_freqs, half)?;
        let density = self.half_density(series, &half_grid)?;
        let coherency = coherency_with_reference(&density, &channel_power(series))?;
        if half {
            return Ok(Coherency { coherency, frequencies: half_grid.frequencies().clone() });
        }
        let full_grid = build_grid(series.nrows(), n_max_freqs, false)?;
        let coherency = mirror_density(&coherency, &half_grid, &full_grid)?;
        Ok(Coherency { coherency, frequencies: full_grid.frequencies().clone() })
    }

    // ---- Helper methods ----

    /// Validate everything up front and build the half grid.
    fn prepare(
        &self, series: &Array2<f64>, n_max_freqs: Option<usize>, half: bool,
    ) -> SpectralResult<FrequencyGrid> {
        validate_series(series)?;
        let (n_samples, n_features) = series.dim();
        match self {
            Estimator::SmoothedPeriodogram { bandwidth, .. } => {
                validate_bandwidth(*bandwidth, n_samples)?
            }
            Estimator::LagWindow { max_lag, options } => {
                validate_max_lag(*max_lag, n_samples)?;
                validate_taper(options.taper)?
            }
        }
        validate_max_freqs(n_max_freqs)?;
        debug!(n_samples, n_features, ?n_max_freqs, half, estimator = ?self, "estimating spectral density");
        build_grid(n_samples, n_max_freqs, true)
    }

    fn half_density(
        &self, series: &Array2<f64>, half_grid: &FrequencyGrid,
    ) -> SpectralResult<Array3<Complex64>> {
        match self {
            Estimator::SmoothedPeriodogram { bandwidth, options } => {
                let periodogram = CrossPeriodogram::from_series(series, options.center)?;
                smooth_bins(&periodogram, *bandwidth, options.window, half_grid.offsets())
            }
            Estimator::LagWindow { max_lag, options } => {
                LagWindow::new(series, *max_lag, options)?.evaluate_grid(half_grid)
            }
        }
    }
}

/// Wrap a half-grid density, mirroring it onto the full grid unless `half`.
pub(crate) fn assemble_density(
    density: Array3<Complex64>, half_grid: &FrequencyGrid, n_max_freqs: Option<usize>, half: bool,
) -> SpectralResult<SpectralDensity> {
    if half {
        return Ok(SpectralDensity { density, frequencies: half_grid.frequencies().clone() });
    }
    let full_grid = build_grid(half_grid.n_samples(), n_max_freqs, false)?;
    let density = mirror_density(&density, half_grid, &full_grid)?;
    Ok(SpectralDensity { density, frequencies: full_grid.frequencies().clone() })
}

/// Smoothed periodogram on the full grid `(-0.5, 0.5]`.
///
/// Parameters
/// ----------
/// - `series`: `n_samples × n_features` real series.
/// - `bandwidth`: odd `B`, `1 ≤ B ≤ n_samples`; `B = 1` is the raw
///   periodogram.
/// - `n_max_freqs`: optional frequency cap.
///
/// Errors
/// ------
/// - Same as [`Estimator::estimate`].
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use spectral_coherence::spectral::estimator::smoothed_periodogram;
/// let series = array![[1.0], [2.0], [3.0], [4.0]];
/// let sdm = smoothed_periodogram(&series, 1, None).unwrap();
/// assert_eq!(sdm.frequencies().to_vec(), vec![-0.25, 0.0, 0.25, 0.5]);
/// // |X(0)|² / n = 10² / 4
/// assert!((sdm.density()[[1, 0, 0]].re - 25.0).abs() < 1e-12);
/// ```
pub fn smoothed_periodogram(
    series: &Array2<f64>, bandwidth: usize, n_max_freqs: Option<usize>,
) -> SpectralResult<SpectralDensity> {
    Estimator::smoothed_periodogram(bandwidth).estimate(series, n_max_freqs, false)
}

/// Smoothed periodogram restricted to `[0, 0.5]`.
///
/// Errors
/// ------
/// - Same as [`Estimator::estimate`].
pub fn half_smoothed_periodogram(
    series: &Array2<f64>, bandwidth: usize, n_max_freqs: Option<usize>,
) -> SpectralResult<SpectralDensity> {
    Estimator::smoothed_periodogram(bandwidth).estimate(series, n_max_freqs, true)
}

/// Coherence from the smoothed periodogram on the full grid.
///
/// Errors
/// ------
/// - Same as [`Estimator::estimate`].
pub fn coherence(
    series: &Array2<f64>, bandwidth: usize, n_max_freqs: Option<usize>,
) -> SpectralResult<Coherence> {
    Estimator::smoothed_periodogram(bandwidth).coherence(series, n_max_freqs, false)
}

/// Coherence from the smoothed periodogram restricted to `[0, 0.5]`.
///
/// Errors
/// ------
/// - Same as [`Estimator::estimate`].
pub fn half_coherence(
    series: &Array2<f64>, bandwidth: usize, n_max_freqs: Option<usize>,
) -> SpectralResult<Coherence> {
    Estimator::smoothed_periodogram(bandwidth).coherence(series, n_max_freqs, true)
}

/// Complex coherency from the smoothed periodogram on the full grid.
///
/// Errors
/// ------
/// - Same as [`Estimator::estimate`].
pub fn coherency(
    series: &Array2<f64>, bandwidth: usize, n_max_freqs: Option<usize>,
) -> SpectralResult<Coherency> {
    Estimator::smoothed_periodogram(bandwidth).coherency(series, n_max_freqs, false)
}
