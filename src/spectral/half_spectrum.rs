//! spectral::half_spectrum — reconstruction of full grids from half grids.
//!
//! Purpose
//! -------
//! For a real series the spectral density satisfies `S(-f) = conj(S(f))`, and
//! coherence satisfies `C(-f) = C(f)`. The estimation pipeline therefore only
//! ever evaluates the non-negative frequencies; this module expands such a
//! half result onto the matching full grid.
//!
//! Key behaviors
//! -------------
//! - [`mirror_density`] conjugates the matrices of negative frequencies.
//! - [`mirror_coherence`] copies them unchanged.
//! - Both require that every full-grid frequency `f` has `|f|` on the half
//!   grid, which holds whenever both grids come from
//!   [`build_grid`](crate::spectral::grid::build_grid) with the same
//!   `n_samples` and `n_max_freqs`.
use crate::spectral::{
    errors::{SpectralError, SpectralResult},
    grid::FrequencyGrid,
    validation::validate_square_stack,
};
use ndarray::{Array3, ArrayBase, Data, Ix3};
use num_complex::Complex64;

/// Expand a half-grid spectral density onto the full grid.
///
/// Parameters
/// ----------
/// - `half`: `(half_grid.len(), p, p)` density at non-negative frequencies.
/// - `half_grid`: grid the half density was evaluated on.
/// - `full_grid`: target grid, same `n_samples` and cap.
///
/// Returns
/// -------
/// `SpectralResult<Array3<Complex64>>`
///   `(full_grid.len(), p, p)` tensor in the full grid's frequency order.
///
/// Errors
/// ------
/// - `SpectralError::ShapeMismatch` if `half` does not match `half_grid`, the
///   grids disagree on `n_samples`, or a full-grid frequency has no mirror on
///   the half grid.
pub fn mirror_density<S>(
    half: &ArrayBase<S, Ix3>, half_grid: &FrequencyGrid, full_grid: &FrequencyGrid,
) -> SpectralResult<Array3<Complex64>>
where
    S: Data<Elem = Complex64>,
{
    mirror(half, half_grid, full_grid, |z: Complex64| z.conj())
}

/// Expand a half-grid coherence tensor onto the full grid.
///
/// Errors
/// ------
/// - Same as [`mirror_density`].
pub fn mirror_coherence<S>(
    half: &ArrayBase<S, Ix3>, half_grid: &FrequencyGrid, full_grid: &FrequencyGrid,
) -> SpectralResult<Array3<f64>>
where
    S: Data<Elem = f64>,
{
    mirror(half, half_grid, full_grid, |c: f64| c)
}

// ---- Helper methods ----

fn mirror<S, T>(
    half: &ArrayBase<S, Ix3>, half_grid: &FrequencyGrid, full_grid: &FrequencyGrid,
    reflect: impl Fn(T) -> T,
) -> SpectralResult<Array3<T>>
where
    S: Data<Elem = T>,
    T: Copy,
{
    let (n_rows, p) = validate_square_stack(half)?;
    if n_rows != half_grid.len() || !half_grid.is_half() {
        return Err(SpectralError::ShapeMismatch {
            expected: format!("({}, p, p) on a half grid", half_grid.len()),
            actual: half.shape().to_vec(),
        });
    }
    if half_grid.n_samples() != full_grid.n_samples() {
        return Err(SpectralError::ShapeMismatch {
            expected: format!("full grid built for n_samples = {}", half_grid.n_samples()),
            actual: vec![full_grid.n_samples()],
        });
    }

    // (position on the half grid, needs reflection) for each full-grid bin.
    let sources = full_grid
        .offsets()
        .iter()
        .map(|&offset| {
            half_grid
                .position_of(offset.abs())
                .map(|pos| (pos, offset < 0))
                .ok_or_else(|| SpectralError::ShapeMismatch {
                    expected: format!("half grid containing signed bin {}", offset.abs()),
                    actual: vec![half_grid.len()],
                })
        })
        .collect::<SpectralResult<Vec<_>>>()?;

    Ok(Array3::from_shape_fn((full_grid.len(), p, p), |(k, i, j)| {
        let (pos, reflected) = sources[k];
        let value = half[[pos, i, j]];
        if reflected { reflect(value) } else { value }
    }))
}
