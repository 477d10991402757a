//! Per-span Taylor coefficients for repeated evaluation.
//!
//! A cache stores the curve restricted to one span as a polynomial in the
//! normalized parameter `x = (u - start) / length`. Rational curves keep the
//! homogeneous numerator and denominator undivided. The cache never checks
//! whether `u` is still inside its span: call [`SpanCache::contains`] and
//! rebuild when it fails. Caches of periodic curves map `u` into the period
//! before testing or evaluating it.

use std::marker::PhantomData;

use log::{debug, trace};
use smallvec::smallvec;

use crate::{
    check_degree,
    eval::{self, LocalBuffer},
    knot,
    polynomial::Polynomial,
    pole::{bezier_flat_knots, pack_poles, Coords, CurveRef},
};

/// Fills `coefficients` (`(degree + 1) * dimension` values) with the Taylor
/// expansion of the span `span` around `start`, scaled to a span of `length`.
///
/// Coefficient `k` is `D^k(start) * length^k / k!`.
#[allow(clippy::too_many_arguments)]
pub fn build_cache(
    start: f64,
    length: f64,
    span: usize,
    degree: usize,
    flat_knots: &[f64],
    dimension: usize,
    poles: &[f64],
    coefficients: &mut [f64],
) {
    eval::eval_derivatives(start, span, degree, flat_knots, dimension, poles, degree, coefficients);
    let mut scale = 1.0;
    for k in 1..=degree {
        scale *= length / k as f64;
        for value in coefficients[k * dimension..(k + 1) * dimension].iter_mut() {
            *value *= scale;
        }
    }
}

/// Value and derivatives up to `order` at `u` from coefficients written by [`build_cache`].
#[allow(clippy::too_many_arguments)]
pub fn cache_derivatives(
    u: f64,
    start: f64,
    length: f64,
    degree: usize,
    dimension: usize,
    coefficients: &[f64],
    order: usize,
    results: &mut [f64],
) {
    let polynomial = Polynomial::new(&coefficients[..(degree + 1) * dimension], dimension);
    polynomial.evaluate((u - start) / length, order, results);
    let mut scale = 1.0;
    for k in 1..=order {
        scale /= length;
        for value in results[k * dimension..(k + 1) * dimension].iter_mut() {
            *value *= scale;
        }
    }
}

/// Taylor coefficients of a whole Bezier curve on `[0, 1]`.
pub fn poles_coefficients(degree: usize, dimension: usize, poles: &[f64], coefficients: &mut [f64]) {
    build_cache(0.0, 1.0, degree, degree, bezier_flat_knots(degree), dimension, poles, coefficients);
}

/// Derivatives up to `order` at `u` from [`poles_coefficients`].
pub fn coefs_derivatives(u: f64, degree: usize, dimension: usize, coefficients: &[f64], order: usize, results: &mut [f64]) {
    cache_derivatives(u, 0.0, 1.0, degree, dimension, coefficients, order, results);
}

/// Cached polynomial piece of a curve.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanCache<P> {
    start: f64,
    length: f64,
    closed: bool,
    period: Option<(f64, f64)>,
    degree: usize,
    rational: bool,
    coefficients: Vec<f64>,
    marker: PhantomData<P>,
}

impl<P: Coords> SpanCache<P> {
    /// Builds the cache for the span containing `u`.
    ///
    /// A curve whose knots hold no span gets a cache that contains no
    /// parameter and evaluates to NaN.
    pub fn build(curve: &CurveRef<'_, P>, u: f64) -> Self {
        check_degree(curve.degree);
        let flat = curve.flat_knots_cow();
        let dimension = curve.dimension();
        let mut coefficients = vec![f64::NAN; (curve.degree + 1) * dimension];
        let located = knot::locate_parameter_flat(curve.degree, &flat, u, curve.periodic);
        let Some((span, _)) = located.filter(|_| !curve.poles.is_empty()) else {
            debug!("span cache requested on a curve without spans");
            return SpanCache {
                start: f64::NAN,
                length: f64::NAN,
                closed: false,
                period: None,
                degree: curve.degree,
                rational: curve.is_rational(),
                coefficients,
                marker: PhantomData,
            };
        };

        let start = flat[span];
        let length = flat[span + 1] - start;
        let poles = curve.homogeneous_poles();
        build_cache(start, length, span, curve.degree, &flat, dimension, &poles, &mut coefficients);
        trace!("span cache built on [{start}, {}] for degree {}", start + length, curve.degree);

        let last_span = flat.len() - curve.degree - 2;
        let period = curve.periodic.then(|| (flat[curve.degree], flat[flat.len() - curve.degree - 1]));
        SpanCache {
            start,
            length,
            closed: !curve.periodic && span == last_span,
            period,
            degree: curve.degree,
            rational: curve.is_rational(),
            coefficients,
            marker: PhantomData,
        }
    }

    /// Cache of a whole Bezier curve on `[0, 1]`.
    pub fn bezier(poles: &[P], weights: Option<&[f64]>) -> Self {
        let degree = poles.len().saturating_sub(1);
        let packed = pack_poles(poles, weights);
        let dimension = P::DIM + usize::from(weights.is_some());
        let mut coefficients = vec![0.0; (degree + 1) * dimension];
        poles_coefficients(degree, dimension, &packed, &mut coefficients);
        SpanCache {
            start: 0.0,
            length: 1.0,
            closed: true,
            period: None,
            degree,
            rational: weights.is_some(),
            coefficients,
            marker: PhantomData,
        }
    }

    fn local(&self, u: f64) -> f64 {
        match self.period {
            Some((first, last)) => knot::wrap(u, first, last),
            None => u,
        }
    }

    /// Whether `u` lies in the span this cache was built for. The last span
    /// of a non-periodic curve includes its end; on a periodic curve `u` is
    /// first mapped into the period.
    pub fn contains(&self, u: f64) -> bool {
        let u = self.local(u);
        let end = self.start + self.length;
        u >= self.start && (u < end || (self.closed && u == end))
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Coefficients in the normalized parameter, `(degree + 1)` rows of packed poles.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    fn evaluate_into(&self, u: f64, order: usize, results: &mut [f64]) {
        let u = self.local(u);
        let dimension = P::DIM + usize::from(self.rational);
        if self.rational {
            let mut homogeneous: LocalBuffer = smallvec![0.0; (order + 1) * dimension];
            cache_derivatives(u, self.start, self.length, self.degree, dimension, &self.coefficients, order, &mut homogeneous);
            eval::rational_derivatives(&homogeneous, P::DIM, order, results);
        } else {
            cache_derivatives(u, self.start, self.length, self.degree, dimension, &self.coefficients, order, results);
        }
    }

    fn evaluate_fixed<const N: usize>(&self, u: f64) -> [P; N] {
        let mut results: LocalBuffer = smallvec![0.0; N * P::DIM];
        self.evaluate_into(u, N - 1, &mut results);
        std::array::from_fn(|k| P::read_from(&results[k * P::DIM..]))
    }

    pub fn d0(&self, u: f64) -> P {
        let [point] = self.evaluate_fixed::<1>(u);
        point
    }

    pub fn d1(&self, u: f64) -> (P, P) {
        let [point, d1] = self.evaluate_fixed::<2>(u);
        (point, d1)
    }

    pub fn d2(&self, u: f64) -> (P, P, P) {
        let [point, d1, d2] = self.evaluate_fixed::<3>(u);
        (point, d1, d2)
    }

    pub fn d3(&self, u: f64) -> (P, P, P, P) {
        let [point, d1, d2, d3] = self.evaluate_fixed::<4>(u);
        (point, d1, d2, d3)
    }
}
