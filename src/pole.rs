//! Poles and the curve descriptions handed to the kernel.
//!
//! The kernel itself works on flat `f64` buffers of `dimension` values per
//! pole. [`Coords`] moves typed points in and out of those buffers and a
//! rational curve simply adds a weight channel: poles are packed as
//! `(w*x, w*y, ..., w)`.

use nalgebra::{Point, SVector};
use once_cell::sync::Lazy;

use crate::{check_degree, knot, MAX_DEGREE};

/// A point type the kernel can pack into flat buffers.
pub trait Coords: Copy {
    /// Number of coordinates.
    const DIM: usize;

    /// Writes the coordinates into `out[..DIM]`.
    fn write_to(&self, out: &mut [f64]);

    /// Reads a point back from `buffer[..DIM]`.
    fn read_from(buffer: &[f64]) -> Self;
}

impl Coords for f64 {
    const DIM: usize = 1;

    fn write_to(&self, out: &mut [f64]) {
        out[0] = *self;
    }

    fn read_from(buffer: &[f64]) -> Self {
        buffer[0]
    }
}

impl<const D: usize> Coords for SVector<f64, D> {
    const DIM: usize = D;

    fn write_to(&self, out: &mut [f64]) {
        out[..D].copy_from_slice(self.as_slice());
    }

    fn read_from(buffer: &[f64]) -> Self {
        Self::from_column_slice(&buffer[..D])
    }
}

impl<const D: usize> Coords for Point<f64, D> {
    const DIM: usize = D;

    fn write_to(&self, out: &mut [f64]) {
        out[..D].copy_from_slice(self.coords.as_slice());
    }

    fn read_from(buffer: &[f64]) -> Self {
        Self::from(SVector::<f64, D>::from_column_slice(&buffer[..D]))
    }
}

static BEZIER_KNOTS: [f64; 2] = [0.0, 1.0];

static BEZIER_FLAT_KNOTS: Lazy<Vec<Vec<f64>>> = Lazy::new(|| {
    (0..=MAX_DEGREE)
        .map(|degree| {
            let mut flat = vec![0.0; degree + 1];
            flat.resize(2 * (degree + 1), 1.0);
            flat
        })
        .collect()
});

static BEZIER_MULTS: Lazy<Vec<[usize; 2]>> = Lazy::new(|| (0..=MAX_DEGREE).map(|degree| [degree + 1; 2]).collect());

static UNIT_WEIGHTS: Lazy<Vec<f64>> = Lazy::new(|| vec![1.0; MAX_DEGREE + 1]);

/// Flat knots `[0; degree+1] ++ [1; degree+1]` of a Bezier curve.
pub fn bezier_flat_knots(degree: usize) -> &'static [f64] {
    check_degree(degree);
    &BEZIER_FLAT_KNOTS[degree]
}

/// Structured knots `[0, 1]` of a Bezier curve.
pub fn bezier_knots() -> &'static [f64] {
    &BEZIER_KNOTS
}

/// Multiplicities `[degree+1, degree+1]` of a Bezier curve.
pub fn bezier_mults(degree: usize) -> &'static [usize] {
    check_degree(degree);
    &BEZIER_MULTS[degree]
}

/// A shared buffer of `len` unit weights, `len <= MAX_DEGREE + 1`.
pub fn unit_weights(len: usize) -> &'static [f64] {
    &UNIT_WEIGHTS[..len]
}

/// Packs poles into a flat buffer, in homogeneous form when weights are given.
pub fn pack_poles<P: Coords>(poles: &[P], weights: Option<&[f64]>) -> Vec<f64> {
    let dimension = P::DIM + usize::from(weights.is_some());
    let mut buffer = vec![0.0; poles.len() * dimension];
    for (i, (pole, chunk)) in poles.iter().zip(buffer.chunks_exact_mut(dimension)).enumerate() {
        pole.write_to(chunk);
        if let Some(weights) = weights {
            let weight = weights[i];
            for value in chunk[..P::DIM].iter_mut() {
                *value *= weight;
            }
            chunk[P::DIM] = weight;
        }
    }
    buffer
}

/// Unpacks a flat buffer written by [`pack_poles`] with the same rationality.
pub fn unpack_poles<P: Coords>(buffer: &[f64], rational: bool) -> (Vec<P>, Option<Vec<f64>>) {
    let dimension = P::DIM + usize::from(rational);
    let count = buffer.len() / dimension;
    let mut poles = Vec::with_capacity(count);
    let mut weights = if rational { Some(Vec::with_capacity(count)) } else { None };

    let mut scratch = vec![0.0; P::DIM];
    for chunk in buffer.chunks_exact(dimension) {
        if let Some(weights) = weights.as_mut() {
            let weight = chunk[P::DIM];
            weights.push(weight);
            for (out, value) in scratch.iter_mut().zip(&chunk[..P::DIM]) {
                *out = value / weight;
            }
            poles.push(P::read_from(&scratch));
        } else {
            poles.push(P::read_from(chunk));
        }
    }
    (poles, weights)
}

/// Borrowed description of a curve owned by the caller.
#[derive(Debug)]
pub struct CurveRef<'a, P> {
    pub degree: usize,
    pub periodic: bool,
    pub poles: &'a [P],
    pub weights: Option<&'a [f64]>,
    pub knots: &'a [f64],
    pub mults: &'a [usize],
}

impl<P> Clone for CurveRef<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for CurveRef<'_, P> {}

impl<'a, P: Coords> CurveRef<'a, P> {
    /// A non-periodic, non-rational curve.
    pub fn new(degree: usize, poles: &'a [P], knots: &'a [f64], mults: &'a [usize]) -> Self {
        check_degree(degree);
        CurveRef { degree, periodic: false, poles, weights: None, knots, mults }
    }

    /// A Bezier curve of degree `poles.len() - 1` over `[0, 1]`.
    pub fn bezier(poles: &'a [P]) -> Self {
        let degree = poles.len().saturating_sub(1);
        Self::new(degree, poles, bezier_knots(), bezier_mults(degree))
    }

    pub fn with_weights(mut self, weights: &'a [f64]) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_periodic(mut self, periodic: bool) -> Self {
        self.periodic = periodic;
        self
    }

    pub fn is_rational(&self) -> bool {
        self.weights.is_some()
    }

    /// Doubles per pole in the packed buffer.
    pub fn dimension(&self) -> usize {
        P::DIM + usize::from(self.is_rational())
    }

    /// Pole count implied by degree, periodicity and multiplicities; 0 when inconsistent.
    pub fn nb_poles(&self) -> usize {
        knot::nb_poles(self.degree, self.periodic, self.mults)
    }

    /// Whether the arrays agree with each other.
    pub fn is_consistent(&self) -> bool {
        let expected = self.nb_poles();
        expected != 0
            && expected == self.poles.len()
            && self.knots.len() == self.mults.len()
            && self.knots.windows(2).all(|w| w[0] < w[1])
            && self.weights.map_or(true, |w| w.len() == expected)
    }

    pub fn flat_knots(&self) -> Vec<f64> {
        knot::knot_sequence(self.knots, self.mults, self.degree, self.periodic)
    }

    pub fn homogeneous_poles(&self) -> Vec<f64> {
        pack_poles(self.poles, self.weights)
    }

    /// Start of the defined parameter range.
    pub fn first_parameter(&self) -> f64 {
        if self.periodic {
            self.knots[0]
        } else {
            self.knots[knot::first_u_knot_index(self.degree, self.mults)]
        }
    }

    /// End of the defined parameter range.
    pub fn last_parameter(&self) -> f64 {
        if self.periodic {
            self.knots[self.knots.len() - 1]
        } else {
            self.knots[knot::last_u_knot_index(self.degree, self.mults)]
        }
    }
}

/// Owned curve arrays produced by a structural transform.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineData<P> {
    pub degree: usize,
    pub periodic: bool,
    pub poles: Vec<P>,
    pub weights: Option<Vec<f64>>,
    pub knots: Vec<f64>,
    pub mults: Vec<usize>,
}

impl<P: Coords> SplineData<P> {
    /// Rebuilds typed arrays from a packed pole buffer and structured knots.
    pub fn from_packed(
        degree: usize,
        periodic: bool,
        buffer: &[f64],
        rational: bool,
        knots: Vec<f64>,
        mults: Vec<usize>,
    ) -> Self {
        let (poles, weights) = unpack_poles(buffer, rational);
        SplineData { degree, periodic, poles, weights, knots, mults }
    }

    /// Re-borrows the arrays for evaluation or a further transform.
    pub fn as_curve(&self) -> CurveRef<'_, P> {
        CurveRef {
            degree: self.degree,
            periodic: self.periodic,
            poles: &self.poles,
            weights: self.weights.as_deref(),
            knots: &self.knots,
            mults: &self.mults,
        }
    }
}
