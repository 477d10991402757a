//! Banded collocation systems.
//!
//! Row `i` of a collocation matrix holds the basis functions (or one of their
//! derivatives) at one parameter; at most `degree + 1` consecutive entries are
//! non-zero, so the matrix is stored as `n` rows of `lower + upper + 1` band
//! entries, entry `(i, j)` living at column `j - i + lower`.
//!
//! The LU factorization does not pivot. It is sound for the totally positive
//! matrices produced at Schoenberg points; for anything else a pivot that
//! vanishes relative to its row is reported instead of dividing by it.

use log::debug;
use nalgebra::DMatrix;

use crate::{eval, interpolate::InterpolationError, pole::Coords, PIVOT_EPSILON};

#[derive(Debug, Clone, PartialEq)]
pub struct BandedMatrix {
    band: DMatrix<f64>,
    upper: usize,
    lower: usize,
}

impl BandedMatrix {
    /// An all-zero matrix of `size` rows with the given bandwidths.
    pub fn zeros(size: usize, upper: usize, lower: usize) -> Self {
        BandedMatrix { band: DMatrix::zeros(size, upper + lower + 1), upper, lower }
    }

    pub fn size(&self) -> usize {
        self.band.nrows()
    }

    pub fn upper(&self) -> usize {
        self.upper
    }

    pub fn lower(&self) -> usize {
        self.lower
    }

    /// Band storage, `size` rows of `lower + upper + 1` entries.
    pub fn band(&self) -> &DMatrix<f64> {
        &self.band
    }

    /// Entry `(row, column)` of the full matrix, zero outside the band.
    pub fn get(&self, row: usize, column: usize) -> f64 {
        if column + self.lower < row || column > row + self.upper {
            return 0.0;
        }
        self.band[(row, column + self.lower - row)]
    }

    fn at(&mut self, row: usize, column: usize) -> &mut f64 {
        &mut self.band[(row, column + self.lower - row)]
    }

    fn upper_columns(&self, row: usize) -> std::ops::Range<usize> {
        row..(row + self.upper + 1).min(self.size())
    }
}

/// Assembles the collocation matrix for `parameters` and their contact orders
/// (0 for a position, 1 for a tangent, ...), one row per parameter.
pub fn build_bsp_matrix(
    parameters: &[f64],
    contact_orders: &[usize],
    flat_knots: &[f64],
    degree: usize,
) -> Result<BandedMatrix, InterpolationError> {
    let size = flat_knots.len().saturating_sub(degree + 1);
    if parameters.len() != size || contact_orders.len() != size {
        return Err(InterpolationError::DimensionMismatch { constraints: parameters.len(), poles: size });
    }

    let mut rows = Vec::with_capacity(size);
    let (mut upper, mut lower) = (0, 0);
    for (i, (&u, &order)) in parameters.iter().zip(contact_orders).enumerate() {
        let (first, basis) = eval::eval_bspline_basis(order, degree + 1, flat_knots, u)
            .ok_or(InterpolationError::DimensionMismatch { constraints: size, poles: size })?;
        upper = upper.max((first + degree).saturating_sub(i));
        lower = lower.max(i.saturating_sub(first));
        rows.push((first, basis.row(order).iter().copied().collect::<Vec<_>>()));
    }

    let mut matrix = BandedMatrix::zeros(size, upper, lower);
    for (i, (first, values)) in rows.into_iter().enumerate() {
        for (j, value) in values.into_iter().enumerate() {
            *matrix.at(i, first + j) = value;
        }
    }
    Ok(matrix)
}

/// In-place LU factorization without pivoting; `L` (unit diagonal) and `U`
/// share the band storage.
pub fn factor_banded_matrix(matrix: &mut BandedMatrix) -> Result<(), InterpolationError> {
    let size = matrix.size();
    for k in 0..size {
        let pivot = matrix.get(k, k);
        let row_max = matrix.upper_columns(k).map(|j| matrix.get(k, j).abs()).fold(0.0, f64::max);
        if pivot.is_nan() || pivot.abs() <= PIVOT_EPSILON * row_max {
            debug!("banded factorization failed: pivot {} is {pivot} for a row maximum of {row_max}", k + 1);
            return Err(InterpolationError::InversionProblem { pivot: k + 1 });
        }

        let last_row = (k + matrix.lower).min(size - 1);
        let last_column = (k + matrix.upper).min(size - 1);
        for i in k + 1..=last_row {
            let factor = matrix.get(i, k) / pivot;
            *matrix.at(i, k) = factor;
            for j in k + 1..=last_column {
                let update = factor * matrix.get(k, j);
                *matrix.at(i, j) -= update;
            }
        }
    }
    Ok(())
}

/// Solves with a factored matrix for `dimension` right-hand sides stored
/// row by row in `rhs`, overwritten by the solution.
pub fn solve_banded_system(matrix: &BandedMatrix, dimension: usize, rhs: &mut [f64]) {
    let size = matrix.size();
    for i in 0..size {
        for j in i.saturating_sub(matrix.lower)..i {
            let factor = matrix.get(i, j);
            for d in 0..dimension {
                rhs[i * dimension + d] -= factor * rhs[j * dimension + d];
            }
        }
    }
    for i in (0..size).rev() {
        for j in i + 1..(i + matrix.upper + 1).min(size) {
            let factor = matrix.get(i, j);
            for d in 0..dimension {
                rhs[i * dimension + d] -= factor * rhs[j * dimension + d];
            }
        }
        let diagonal = matrix.get(i, i);
        for value in rhs[i * dimension..(i + 1) * dimension].iter_mut() {
            *value /= diagonal;
        }
    }
}

/// Typed [`solve_banded_system`] over poles.
pub fn solve_banded_poles<P: Coords>(matrix: &BandedMatrix, poles: &mut [P]) {
    let mut rhs = crate::pole::pack_poles(poles, None);
    solve_banded_system(matrix, P::DIM, &mut rhs);
    for (pole, chunk) in poles.iter_mut().zip(rhs.chunks_exact(P::DIM)) {
        *pole = P::read_from(chunk);
    }
}

/// Solves for rational poles.
///
/// With `homogeneous` set, poles and weights are solved as given and returned
/// undivided. Otherwise poles are multiplied by their weights first and the
/// solved poles are divided by the solved weights.
pub fn solve_banded_rational<P: Coords>(matrix: &BandedMatrix, homogeneous: bool, poles: &mut [P], weights: &mut [f64]) {
    let dimension = P::DIM + 1;
    let mut rhs = vec![0.0; poles.len() * dimension];
    for ((pole, &weight), chunk) in poles.iter().zip(weights.iter()).zip(rhs.chunks_exact_mut(dimension)) {
        pole.write_to(chunk);
        if !homogeneous {
            for value in chunk[..P::DIM].iter_mut() {
                *value *= weight;
            }
        }
        chunk[P::DIM] = weight;
    }

    solve_banded_system(matrix, dimension, &mut rhs);

    for ((pole, weight), chunk) in poles.iter_mut().zip(weights.iter_mut()).zip(rhs.chunks_exact_mut(dimension)) {
        *weight = chunk[P::DIM];
        if !homogeneous {
            let divisor = chunk[P::DIM];
            for value in chunk[..P::DIM].iter_mut() {
                *value /= divisor;
            }
        }
        *pole = P::read_from(chunk);
    }
}
