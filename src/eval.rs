//! Core evaluation: Boor's recursion, Bohm's derivatives and basis functions.
//!
//! The kernels work on a local window of one span: `degree + 1` poles packed
//! `dimension` doubles each and the `2 * degree` knots around the span,
//! `knots[m] = flat[span - degree + 1 + m]`. Rational curves are evaluated in
//! homogeneous coordinates and divided afterwards.

use std::borrow::Cow;

use nalgebra::DMatrix;
use smallvec::{smallvec, SmallVec};

use crate::{
    check_degree, knot,
    pole::{bezier_flat_knots, Coords, CurveRef},
};

pub(crate) type LocalBuffer = SmallVec<[f64; 64]>;

/// Taylor order used to extend the curve past each end of its range.
///
/// An order equal to the degree continues the end polynomial exactly; a lower
/// order truncates its Taylor expansion at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtrapMode {
    pub before: usize,
    pub after: usize,
}

impl ExtrapMode {
    pub fn polynomial(degree: usize) -> Self {
        ExtrapMode { before: degree, after: degree }
    }
}

fn alpha(u: f64, low: f64, high: f64) -> f64 {
    let denominator = high - low;
    if denominator == 0.0 {
        0.0
    } else {
        (u - low) / denominator
    }
}

/// Runs `depth` levels of Boor's triangular recursion in place.
///
/// `poles` holds `length` consecutive poles `P_f .. P_{f+length-1}` and
/// `knots[m]` is the flat knot `t_{f+1+m}`. At level `r` every pole `j >= r`
/// becomes `(1 - a) P_{j-1} + a P_j` with `a = (u - knots[j-1]) / (knots[j+degree-r] - knots[j-1])`.
/// A full run (`depth = degree`, `length = degree + 1`) leaves the curve point in
/// the last pole; a depth-1 run is a single knot insertion at `u`.
pub fn boor_scheme(
    u: f64,
    degree: usize,
    knots: &[f64],
    dimension: usize,
    poles: &mut [f64],
    depth: usize,
    length: usize,
) {
    for level in 1..=depth {
        for j in (level..length).rev() {
            let a = alpha(u, knots[j - 1], knots[j + degree - level]);
            let (head, tail) = poles.split_at_mut(j * dimension);
            let previous = &head[(j - 1) * dimension..];
            for (current, before) in tail[..dimension].iter_mut().zip(previous) {
                *current = (1.0 - a) * before + a * *current;
            }
        }
    }
}

/// Inverts one level of [`boor_scheme`].
///
/// `inserted` holds the `length + 1` poles produced by inserting `u` once into
/// `length` poles; `knots` follows the [`boor_scheme`] layout for the curve
/// *without* that knot. The poles are rebuilt from the left end and from the
/// right end; where the two sweeps meet, the pole is recomputed from both
/// sides and compared with the inserted one.
///
/// Returns `Ok(deviation)` and writes the `length` recovered poles to `out`
/// when the deviation is within `tolerance`, `Err(deviation)` otherwise. A NaN
/// deviation is always refused.
#[allow(clippy::too_many_arguments)]
pub fn anti_boor_scheme(
    u: f64,
    degree: usize,
    knots: &[f64],
    dimension: usize,
    inserted: &[f64],
    length: usize,
    tolerance: f64,
    out: &mut [f64],
) -> Result<f64, f64> {
    if length < 2 {
        return Err(f64::INFINITY);
    }
    let last = length - 1;
    let mut recovered: Vec<f64> = vec![0.0; length * dimension];
    recovered[..dimension].copy_from_slice(&inserted[..dimension]);
    recovered[last * dimension..].copy_from_slice(&inserted[length * dimension..(length + 1) * dimension]);

    let middle = length / 2;
    for j in 1..middle {
        let a = alpha(u, knots[j - 1], knots[j + degree - 1]);
        for d in 0..dimension {
            let before = recovered[(j - 1) * dimension + d];
            recovered[j * dimension + d] = (inserted[j * dimension + d] - (1.0 - a) * before) / a;
        }
    }
    for j in (middle + 1..length).rev() {
        let a = alpha(u, knots[j - 1], knots[j + degree - 1]);
        for d in 0..dimension {
            let after = recovered[j * dimension + d];
            recovered[(j - 1) * dimension + d] = (inserted[j * dimension + d] - a * after) / (1.0 - a);
        }
    }

    let a = alpha(u, knots[middle - 1], knots[middle + degree - 1]);
    let mut deviation = 0.0;
    for d in 0..dimension {
        let rebuilt = (1.0 - a) * recovered[(middle - 1) * dimension + d] + a * recovered[middle * dimension + d];
        let difference = rebuilt - inserted[middle * dimension + d];
        deviation += difference * difference;
    }
    let deviation = deviation.sqrt();

    if deviation.is_nan() || deviation > tolerance {
        return Err(deviation);
    }
    out[..length * dimension].copy_from_slice(&recovered);
    Ok(deviation)
}

/// Evaluates one point of a span with a full Boor run.
///
/// `poles` holds the `degree + 1` local poles and is used as scratch.
pub fn eval(u: f64, degree: usize, knots: &[f64], dimension: usize, poles: &mut [f64], result: &mut [f64]) {
    boor_scheme(u, degree, knots, dimension, poles, degree, degree + 1);
    result[..dimension].copy_from_slice(&poles[degree * dimension..(degree + 1) * dimension]);
}

/// Replaces local poles by the control polygons of the derivatives.
///
/// After the call, poles `order..length` are the poles of the `order`-th
/// derivative curve, whose degree is `degree - order`.
pub fn derivative(degree: usize, knots: &[f64], dimension: usize, length: usize, order: usize, poles: &mut [f64]) {
    for k in 1..=order.min(degree) {
        let factor = (degree - k + 1) as f64;
        for j in (k..length).rev() {
            let span = knots[j + degree - k] - knots[j - 1];
            let scale = if span == 0.0 { 0.0 } else { factor / span };
            for d in 0..dimension {
                let before = poles[(j - 1) * dimension + d];
                let current = &mut poles[j * dimension + d];
                *current = (*current - before) * scale;
            }
        }
    }
}

/// Value and derivatives up to `order` of one span in a single pass.
///
/// `results` receives `order + 1` points of `dimension` doubles; orders above
/// the degree are zero. `poles` is used as scratch.
pub fn bohm(u: f64, degree: usize, order: usize, knots: &[f64], dimension: usize, poles: &mut [f64], results: &mut [f64]) {
    let mut scratch: LocalBuffer = smallvec![0.0; (degree + 1) * dimension];
    for k in 0..=order {
        let point = &mut results[k * dimension..(k + 1) * dimension];
        if k > degree {
            point.fill(0.0);
            continue;
        }
        if k > 0 {
            derivative(degree - k + 1, &knots[k - 1..], dimension, degree - k + 2, 1, &mut poles[(k - 1) * dimension..]);
        }
        let reduced = degree - k;
        let count = (reduced + 1) * dimension;
        scratch[..count].copy_from_slice(&poles[k * dimension..(degree + 1) * dimension]);
        eval(u, reduced, &knots[k..2 * degree - k], dimension, &mut scratch[..count], point);
    }
}

pub(crate) fn binomial(n: usize, k: usize) -> f64 {
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// Divides homogeneous derivatives by the weight channel with the quotient rule.
///
/// `homogeneous` holds `order + 1` points of `dimension + 1` doubles, the last
/// one being the weight; `results` receives `order + 1` points of `dimension`.
pub fn rational_derivatives(homogeneous: &[f64], dimension: usize, order: usize, results: &mut [f64]) {
    let stride = dimension + 1;
    let weight = homogeneous[dimension];
    for k in 0..=order {
        for d in 0..dimension {
            let mut value = homogeneous[k * stride + d];
            for i in 1..=k {
                value -= binomial(k, i) * homogeneous[i * stride + dimension] * results[(k - i) * dimension + d];
            }
            results[k * dimension + d] = value / weight;
        }
    }
}

/// Gathers the local poles of a span, wrapping indices for periodic curves.
pub(crate) fn gather_poles(
    dimension: usize,
    poles: &[f64],
    first: usize,
    count: usize,
    local: &mut [f64],
) {
    let nb_poles = poles.len() / dimension;
    for j in 0..count {
        let index = (first + j) % nb_poles;
        local[j * dimension..(j + 1) * dimension].copy_from_slice(&poles[index * dimension..(index + 1) * dimension]);
    }
}

/// Derivatives up to `order` at `u` of a curve given by a flat pole buffer.
///
/// `span` is the flat span index from [`knot::locate_parameter_flat`] and `u`
/// must already be remapped for periodic curves. The buffer is evaluated as
/// is: pack rational poles homogeneously and divide with [`rational_derivatives`].
#[allow(clippy::too_many_arguments)]
pub fn eval_derivatives(
    u: f64,
    span: usize,
    degree: usize,
    flat_knots: &[f64],
    dimension: usize,
    poles: &[f64],
    order: usize,
    results: &mut [f64],
) {
    check_degree(degree);
    let mut local: LocalBuffer = smallvec![0.0; (degree + 1) * dimension];
    gather_poles(dimension, poles, span - degree, degree + 1, &mut local);
    bohm(u, degree, order, &flat_knots[span + 1 - degree..=span + degree], dimension, &mut local, results);
}

/// Like [`eval_derivatives`] but continues the curve past its range with a
/// truncated Taylor expansion at the nearest end, per `mode`. Results are NaN
/// when the flat knots hold no span.
#[allow(clippy::too_many_arguments)]
pub fn eval_extrapolated(
    u: f64,
    degree: usize,
    flat_knots: &[f64],
    periodic: bool,
    dimension: usize,
    poles: &[f64],
    order: usize,
    mode: ExtrapMode,
    results: &mut [f64],
) {
    let Some((span, located)) = knot::locate_parameter_flat(degree, flat_knots, u, periodic) else {
        results[..(order + 1) * dimension].fill(f64::NAN);
        return;
    };
    let n = flat_knots.len() - degree - 1;
    let (first, last) = (flat_knots[degree], flat_knots[n]);
    let (anchor, taylor_order) = match u {
        u if !periodic && u < first => (first, mode.before),
        u if !periodic && u > last => (last, mode.after),
        _ => {
            eval_derivatives(located, span, degree, flat_knots, dimension, poles, order, results);
            return;
        }
    };

    let depth = taylor_order.max(order);
    let mut at_anchor: LocalBuffer = smallvec![0.0; (depth + 1) * dimension];
    eval_derivatives(anchor, span, degree, flat_knots, dimension, poles, depth, &mut at_anchor);

    let h = u - anchor;
    for k in 0..=order {
        for d in 0..dimension {
            let mut value = 0.0;
            let mut power = 1.0;
            for m in k..=taylor_order {
                value += at_anchor[m * dimension + d] * power;
                power *= h / (m - k + 1) as f64;
            }
            results[k * dimension + d] = value;
        }
    }
}

/// Values and derivatives of the non-zero basis functions at `parameter`.
///
/// Returns the index of the first non-zero basis function and a matrix with
/// `derivative_request + 1` rows and `order` (= degree + 1) columns, or `None`
/// when the knot sequence is too short for that order.
pub fn eval_bspline_basis(
    derivative_request: usize,
    order: usize,
    flat_knots: &[f64],
    parameter: f64,
) -> Option<(usize, DMatrix<f64>)> {
    if order == 0 || flat_knots.len() < 2 * order {
        return None;
    }
    let degree = order - 1;
    check_degree(degree);
    let (span, u) = knot::locate_parameter_flat(degree, flat_knots, parameter, false)?;
    let t = flat_knots;

    let mut ndu = DMatrix::<f64>::zeros(order, order);
    let mut left = vec![0.0; order];
    let mut right = vec![0.0; order];
    ndu[(0, 0)] = 1.0;
    for j in 1..=degree {
        left[j] = u - t[span + 1 - j];
        right[j] = t[span + j] - u;
        let mut saved = 0.0;
        for r in 0..j {
            ndu[(j, r)] = right[r + 1] + left[j - r];
            let temp = ndu[(r, j - 1)] / ndu[(j, r)];
            ndu[(r, j)] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        ndu[(j, j)] = saved;
    }

    let mut ders = DMatrix::<f64>::zeros(derivative_request + 1, order);
    for j in 0..=degree {
        ders[(0, j)] = ndu[(j, degree)];
    }

    let top = derivative_request.min(degree);
    let p = degree as isize;
    let mut a = DMatrix::<f64>::zeros(2, order);
    for r in 0..=p {
        let (mut s1, mut s2) = (0, 1);
        a[(0, 0)] = 1.0;
        for k in 1..=top as isize {
            let mut d = 0.0;
            let rk = r - k;
            let pk = p - k;
            if r >= k {
                a[(s2, 0)] = a[(s1, 0)] / ndu[((pk + 1) as usize, rk as usize)];
                d = a[(s2, 0)] * ndu[(rk as usize, pk as usize)];
            }
            let j1 = if rk >= -1 { 1 } else { -rk };
            let j2 = if r - 1 <= pk { k - 1 } else { p - r };
            for j in j1..=j2 {
                let j = j as usize;
                let column = (rk + j as isize) as usize;
                a[(s2, j)] = (a[(s1, j)] - a[(s1, j - 1)]) / ndu[((pk + 1) as usize, column)];
                d += a[(s2, j)] * ndu[(column, pk as usize)];
            }
            if r <= pk {
                a[(s2, k as usize)] = -a[(s1, (k - 1) as usize)] / ndu[((pk + 1) as usize, r as usize)];
                d += a[(s2, k as usize)] * ndu[(r as usize, pk as usize)];
            }
            ders[(k as usize, r as usize)] = d;
            std::mem::swap(&mut s1, &mut s2);
        }
    }

    let mut factor = degree as f64;
    for k in 1..=top {
        for j in 0..=degree {
            ders[(k, j)] *= factor;
        }
        factor *= (degree - k) as f64;
    }
    Some((span - degree, ders))
}

impl<P: Coords> CurveRef<'_, P> {
    pub(crate) fn flat_knots_cow(&self) -> Cow<'static, [f64]> {
        let bezier = !self.periodic
            && self.knots == [0.0, 1.0]
            && self.mults.iter().all(|m| *m == self.degree + 1);
        if bezier {
            Cow::Borrowed(bezier_flat_knots(self.degree))
        } else {
            Cow::Owned(self.flat_knots())
        }
    }

    fn evaluate_into(&self, u: f64, order: usize, results: &mut [f64]) {
        check_degree(self.degree);
        let flat = self.flat_knots_cow();
        let dimension = self.dimension();
        let located = knot::locate_parameter_flat(self.degree, &flat, u, self.periodic);
        let Some((span, u)) = located.filter(|_| !self.poles.is_empty()) else {
            results[..(order + 1) * P::DIM].fill(f64::NAN);
            return;
        };
        let count = self.degree + 1;

        let mut local: LocalBuffer = smallvec![0.0; count * dimension];
        let nb_poles = self.poles.len();
        for j in 0..count {
            let index = (span - self.degree + j) % nb_poles;
            let chunk = &mut local[j * dimension..(j + 1) * dimension];
            self.poles[index].write_to(chunk);
            if let Some(weights) = self.weights {
                let weight = weights[index];
                for value in chunk[..P::DIM].iter_mut() {
                    *value *= weight;
                }
                chunk[P::DIM] = weight;
            }
        }

        let knots = &flat[span + 1 - self.degree..=span + self.degree];
        if self.is_rational() {
            let mut homogeneous: LocalBuffer = smallvec![0.0; (order + 1) * dimension];
            bohm(u, self.degree, order, knots, dimension, &mut local, &mut homogeneous);
            rational_derivatives(&homogeneous, P::DIM, order, results);
        } else {
            bohm(u, self.degree, order, knots, dimension, &mut local, results);
        }
    }

    /// The point and its derivatives up to `order` at `u`, NaN when the knots
    /// hold no span.
    pub fn derivatives(&self, u: f64, order: usize) -> Vec<P> {
        let mut results = vec![0.0; (order + 1) * P::DIM];
        self.evaluate_into(u, order, &mut results);
        results.chunks_exact(P::DIM).map(P::read_from).collect()
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

    /// The `n`-th derivative alone.
    pub fn dn(&self, u: f64, n: usize) -> P {
        let mut results = vec![0.0; (n + 1) * P::DIM];
        self.evaluate_into(u, n, &mut results);
        P::read_from(&results[n * P::DIM..])
    }

    /// The point and its derivatives up to `order`, extrapolated per `mode`
    /// outside the defined range of a non-periodic curve.
    pub fn extrapolated(&self, u: f64, order: usize, mode: ExtrapMode) -> Vec<P> {
        check_degree(self.degree);
        let flat = self.flat_knots_cow();
        let poles = self.homogeneous_poles();
        let dimension = self.dimension();

        let mut homogeneous = vec![0.0; (order + 1) * dimension];
        eval_extrapolated(u, self.degree, &flat, self.periodic, dimension, &poles, order, mode, &mut homogeneous);

        let results = if self.is_rational() {
            let mut cartesian = vec![0.0; (order + 1) * P::DIM];
            rational_derivatives(&homogeneous, P::DIM, order, &mut cartesian);
            cartesian
        } else {
            homogeneous
        };
        results.chunks_exact(P::DIM).map(P::read_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use nalgebra::Vector2;

    use super::*;

    fn cubic_poles() -> Vec<Vector2<f64>> {
        vec![Vector2::new(0.0, 0.0), Vector2::new(1.0, 2.0), Vector2::new(2.0, -1.0), Vector2::new(3.0, 0.0)]
    }

    fn bernstein_cubic(poles: &[Vector2<f64>], t: f64) -> Vector2<f64> {
        let s = 1.0 - t;
        poles[0] * s * s * s + poles[1] * 3.0 * s * s * t + poles[2] * 3.0 * s * t * t + poles[3] * t * t * t
    }

    #[test]
    fn bezier_end_points() {
        let poles = cubic_poles();
        let curve = CurveRef::bezier(&poles);
        assert_approx_eq!(curve.d0(0.0).x, 0.0, 1e-12);
        assert_approx_eq!(curve.d0(0.0).y, 0.0, 1e-12);
        assert_approx_eq!(curve.d0(1.0).x, 3.0, 1e-12);
        assert_approx_eq!(curve.d0(1.0).y, 0.0, 1e-12);
    }

    #[test]
    fn bezier_matches_bernstein_form() {
        let poles = cubic_poles();
        let curve = CurveRef::bezier(&poles);
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            let expected = bernstein_cubic(&poles, t);
            let point = curve.d0(t);
            assert_approx_eq!(point.x, expected.x, 1e-12);
            assert_approx_eq!(point.y, expected.y, 1e-12);
        }
    }

    #[test]
    fn bohm_derivatives_of_a_polynomial() {
        // x(t) = t^3 written as a Bezier curve
        let poles = [0.0, 0.0, 0.0, 1.0];
        let curve = CurveRef::bezier(&poles);
        let (value, d1, d2, d3) = curve.d3(0.5);
        assert_approx_eq!(value, 0.125, 1e-12);
        assert_approx_eq!(d1, 0.75, 1e-12);
        assert_approx_eq!(d2, 3.0, 1e-12);
        assert_approx_eq!(d3, 6.0, 1e-12);
        assert_approx_eq!(curve.dn(0.5, 4), 0.0, 1e-12);
    }

    #[test]
    fn derivatives_of_a_spline() {
        // piecewise quadratic reproducing f(t) = t^2 on [0, 2]
        let knots = [0.0, 1.0, 2.0];
        let mults = [3, 1, 3];
        let poles = [0.0, 0.0, 2.0, 4.0];
        let curve = CurveRef::new(2, &poles, &knots, &mults);
        for t in [0.0, 0.3, 1.0, 1.7, 2.0] {
            let (value, d1, d2) = curve.d2(t);
            assert_approx_eq!(value, t * t, 1e-12);
            assert_approx_eq!(d1, 2.0 * t, 1e-12);
            assert_approx_eq!(d2, 2.0, 1e-12);
        }
    }

    #[test]
    fn rational_quarter_circle() {
        let poles = [Vector2::new(1.0, 0.0), Vector2::new(1.0, 1.0), Vector2::new(0.0, 1.0)];
        let weights = [1.0, std::f64::consts::FRAC_1_SQRT_2, 1.0];
        let curve = CurveRef::bezier(&poles).with_weights(&weights);
        for i in 0..=8 {
            let (point, tangent) = curve.d1(i as f64 / 8.0);
            assert_approx_eq!(point.norm(), 1.0, 1e-12);
            assert_approx_eq!(point.dot(&tangent), 0.0, 1e-12);
        }
    }

    #[test]
    fn raw_buffer_evaluation() {
        let flat = [0.0, 0.0, 0.0, 1.0, 2.0, 2.0, 2.0];
        let poles = [0.0, 0.0, 2.0, 4.0];
        let (span, u) = knot::locate_parameter_flat(2, &flat, 1.5, false).unwrap();
        let mut results = [0.0; 2];
        eval_derivatives(u, span, 2, &flat, 1, &poles, 1, &mut results);
        assert_approx_eq!(results[0], 2.25, 1e-12);
        assert_approx_eq!(results[1], 3.0, 1e-12);
    }

    #[test]
    fn boor_depth_one_inserts_a_knot() {
        // quadratic Bezier, insert u = 0.5 in the middle span
        let mut poles = [-1.0, 0.0, 1.0];
        let knots = [0.0, 0.0, 1.0, 1.0];
        boor_scheme(0.5, 2, &knots, 1, &mut poles, 1, 3);
        assert_eq!(poles, [-1.0, -0.5, 0.5]);
    }

    #[test]
    fn anti_boor_recovers_inserted_poles() {
        let inserted = [-1.0, -0.5, 0.5, 1.0];
        let knots = [0.0, 0.0, 1.0, 1.0];
        let mut out = [0.0; 3];
        let deviation = anti_boor_scheme(0.5, 2, &knots, 1, &inserted, 3, 1e-12, &mut out).unwrap();
        assert!(deviation < 1e-12);
        assert_eq!(out, [-1.0, 0.0, 1.0]);

        let bent = [-1.0, -0.5, 0.9, 1.0];
        assert!(anti_boor_scheme(0.5, 2, &knots, 1, &bent, 3, 1e-3, &mut out).is_err());
        assert_eq!(out, [-1.0, 0.0, 1.0]);

        let broken = [-1.0, f64::NAN, 0.5, 1.0];
        let refused = anti_boor_scheme(0.5, 2, &knots, 1, &broken, 3, f64::INFINITY, &mut out);
        assert!(refused.is_err_and(f64::is_nan));
        assert_eq!(out, [-1.0, 0.0, 1.0]);
    }

    #[test]
    fn derivative_polygon_of_bezier() {
        let mut poles = [0.0, 1.0, 3.0, 6.0];
        let knots = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        derivative(3, &knots, 1, 4, 1, &mut poles);
        assert_eq!(&poles[1..], &[3.0, 6.0, 9.0]);
    }

    #[test]
    fn basis_partition_of_unity() {
        let flat = [0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 3.0, 3.0, 3.0];
        for u in [0.0, 0.4, 1.0, 2.5, 3.0] {
            let (first, basis) = eval_bspline_basis(2, 4, &flat, u).unwrap();
            assert!(first <= 2);
            let sum: f64 = basis.row(0).iter().sum();
            let d_sum: f64 = basis.row(1).iter().sum();
            let dd_sum: f64 = basis.row(2).iter().sum();
            assert_approx_eq!(sum, 1.0, 1e-12);
            assert_approx_eq!(d_sum, 0.0, 1e-12);
            assert_approx_eq!(dd_sum, 0.0, 1e-12);
        }
        assert!(eval_bspline_basis(0, 6, &flat, 0.5).is_none());
    }

    #[test]
    fn basis_reproduces_curve() {
        let flat = [0.0, 0.0, 0.0, 1.0, 2.0, 2.0, 2.0];
        let poles = [0.0, 0.0, 2.0, 4.0];
        let (first, basis) = eval_bspline_basis(1, 3, &flat, 0.7).unwrap();
        let value: f64 = (0..3).map(|j| basis[(0, j)] * poles[first + j]).sum();
        let slope: f64 = (0..3).map(|j| basis[(1, j)] * poles[first + j]).sum();
        assert_approx_eq!(value, 0.49, 1e-12);
        assert_approx_eq!(slope, 1.4, 1e-12);
    }

    #[test]
    fn polynomial_extrapolation_continues_end_span() {
        let knots = [0.0, 1.0, 2.0];
        let mults = [3, 1, 3];
        let poles = [0.0, 0.0, 2.0, 4.0];
        let curve = CurveRef::new(2, &poles, &knots, &mults);

        let exact = curve.extrapolated(3.0, 1, ExtrapMode::polynomial(2));
        assert_approx_eq!(exact[0], 9.0, 1e-12);
        assert_approx_eq!(exact[1], 6.0, 1e-12);

        let tangent = curve.extrapolated(-1.0, 0, ExtrapMode { before: 1, after: 2 });
        assert_approx_eq!(tangent[0], 0.0, 1e-12);

        let inside = curve.extrapolated(0.5, 0, ExtrapMode { before: 0, after: 0 });
        assert_approx_eq!(inside[0], 0.25, 1e-12);
    }

    #[test]
    fn periodic_curve_wraps() {
        let knots = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mults = [1; 7];
        let poles = [0.0, 1.0, 0.5, -1.0, 2.0, 0.0];
        let curve = CurveRef::new(3, &poles, &knots, &mults).with_periodic(true);
        assert_approx_eq!(curve.d0(0.3), curve.d0(6.3), 1e-12);
        assert_approx_eq!(curve.d0(-0.4), curve.d0(5.6), 1e-12);
    }
}
