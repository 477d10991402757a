//! Curve construction from constraints: global interpolation, composition
//! with external functions and local point/tangent editing.

use smallvec::{smallvec, SmallVec};
use thiserror::Error;

use crate::{
    banded::{build_bsp_matrix, factor_banded_matrix, solve_banded_poles, solve_banded_rational, solve_banded_system},
    check_degree, eval, knot,
    pole::{unpack_poles, Coords, CurveRef},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InterpolationError {
    /// The unpivoted factorization met a vanishing pivot (1-based).
    #[error("collocation matrix cannot be inverted, pivot {pivot} vanished")]
    InversionProblem { pivot: usize },
    #[error("evaluator failed with code {code}")]
    EvaluatorFailed { code: i32 },
    #[error("{constraints} constraints given for {poles} poles")]
    DimensionMismatch { constraints: usize, poles: usize },
    #[error("no pole in the allowed range influences the parameter")]
    NoFreePoles,
    #[error("constraints cannot be met by moving the free poles")]
    Singular,
}

/// An external function sampled while building a curve.
pub trait EvaluatorFunction {
    /// Value (or derivative of order `derivative_request`) at `parameter`,
    /// `start_end` being the parameter range of the curve under construction.
    /// A failure carries the evaluator's own status code.
    fn evaluate(&self, derivative_request: usize, start_end: [f64; 2], parameter: f64) -> Result<f64, i32>;
}

impl<F: Fn(f64) -> f64> EvaluatorFunction for F {
    fn evaluate(&self, derivative_request: usize, _start_end: [f64; 2], parameter: f64) -> Result<f64, i32> {
        if derivative_request == 0 {
            Ok(self(parameter))
        } else {
            Err(1)
        }
    }
}

/// Knot averages `(t[i+1] + ... + t[i+degree]) / degree`, one per pole.
///
/// Interpolating at these parameters gives a totally positive collocation
/// matrix, safe for the unpivoted factorization.
pub fn build_schoenberg_points(degree: usize, flat_knots: &[f64]) -> Vec<f64> {
    let count = flat_knots.len().saturating_sub(degree + 1);
    if degree == 0 {
        return (0..count).map(|i| 0.5 * (flat_knots[i] + flat_knots[i + 1])).collect();
    }
    (0..count)
        .map(|i| flat_knots[i + 1..=i + degree].iter().sum::<f64>() / degree as f64)
        .collect()
}

/// Solves in place for the poles whose curve meets `poles` (values, or
/// derivatives per `contact_orders`) at `parameters`.
pub fn interpolate_flat(
    degree: usize,
    flat_knots: &[f64],
    parameters: &[f64],
    contact_orders: &[usize],
    dimension: usize,
    poles: &mut [f64],
) -> Result<(), InterpolationError> {
    check_degree(degree);
    let mut matrix = build_bsp_matrix(parameters, contact_orders, flat_knots, degree)?;
    factor_banded_matrix(&mut matrix)?;
    solve_banded_system(&matrix, dimension, poles);
    Ok(())
}

/// Typed [`interpolate_flat`].
pub fn interpolate<P: Coords>(
    degree: usize,
    flat_knots: &[f64],
    parameters: &[f64],
    contact_orders: &[usize],
    poles: &mut [P],
) -> Result<(), InterpolationError> {
    check_degree(degree);
    let mut matrix = build_bsp_matrix(parameters, contact_orders, flat_knots, degree)?;
    factor_banded_matrix(&mut matrix)?;
    solve_banded_poles(&matrix, poles);
    Ok(())
}

/// Rational interpolation: points are weighted before solving and the solved
/// poles are divided by the interpolated weights.
pub fn interpolate_rational<P: Coords>(
    degree: usize,
    flat_knots: &[f64],
    parameters: &[f64],
    contact_orders: &[usize],
    poles: &mut [P],
    weights: &mut [f64],
) -> Result<(), InterpolationError> {
    check_degree(degree);
    let mut matrix = build_bsp_matrix(parameters, contact_orders, flat_knots, degree)?;
    factor_banded_matrix(&mut matrix)?;
    solve_banded_rational(&matrix, false, poles, weights);
    Ok(())
}

/// How a sampled function value combines with the curve.
#[derive(Clone, Copy)]
enum Composition {
    Multiply,
    Reparameterise,
}

/// Homogeneous point of the curve at `u`, NaN when the curve has no span.
fn homogeneous_at<P: Coords>(curve: &CurveRef<'_, P>, flat_knots: &[f64], poles: &[f64], u: f64, out: &mut [f64]) {
    let located = knot::locate_parameter_flat(curve.degree, flat_knots, u, curve.periodic);
    match located.filter(|_| !poles.is_empty()) {
        Some((span, u)) => eval::eval_derivatives(u, span, curve.degree, flat_knots, curve.dimension(), poles, 0, out),
        None => out.fill(f64::NAN),
    }
}

/// Samples the composed curve in homogeneous form at the Schoenberg points of
/// `flat_knots` and interpolates numerator and weight together, so rational
/// curves stay rational.
fn sample_on<P: Coords, F: EvaluatorFunction>(
    function: &F,
    curve: &CurveRef<'_, P>,
    flat_knots: &[f64],
    new_degree: usize,
    composition: Composition,
) -> Result<(Vec<P>, Option<Vec<f64>>), InterpolationError> {
    check_degree(new_degree);
    let parameters = build_schoenberg_points(new_degree, flat_knots);
    let last = flat_knots.len().saturating_sub(new_degree + 1);
    if parameters.is_empty() || last <= new_degree {
        return Err(InterpolationError::DimensionMismatch { constraints: 0, poles: parameters.len() });
    }
    let start_end = [flat_knots[new_degree], flat_knots[last]];

    let curve_flat = curve.flat_knots();
    let curve_poles = curve.homogeneous_poles();
    let dimension = curve.dimension();
    let mut values = vec![0.0; parameters.len() * dimension];
    for (&t, chunk) in parameters.iter().zip(values.chunks_exact_mut(dimension)) {
        let value = function
            .evaluate(0, start_end, t)
            .map_err(|code| InterpolationError::EvaluatorFailed { code })?;
        match composition {
            Composition::Multiply => {
                homogeneous_at(curve, &curve_flat, &curve_poles, t, chunk);
                for coordinate in chunk[..P::DIM].iter_mut() {
                    *coordinate *= value;
                }
            }
            Composition::Reparameterise => homogeneous_at(curve, &curve_flat, &curve_poles, value, chunk),
        }
    }

    let contact_orders = vec![0; parameters.len()];
    interpolate_flat(new_degree, flat_knots, &parameters, &contact_orders, dimension, &mut values)?;
    Ok(unpack_poles(&values, curve.is_rational()))
}

/// Poles of `f(t) * C(t)` of degree `new_degree` on `flat_knots`, with
/// weights when `C` is rational.
///
/// Only the numerator of a rational curve is multiplied. Exact when the
/// product is representable on those knots, a Schoenberg interpolant of it
/// otherwise.
pub fn function_multiply<P: Coords, F: EvaluatorFunction>(
    function: &F,
    curve: &CurveRef<'_, P>,
    flat_knots: &[f64],
    new_degree: usize,
) -> Result<(Vec<P>, Option<Vec<f64>>), InterpolationError> {
    sample_on(function, curve, flat_knots, new_degree, Composition::Multiply)
}

/// Poles (and weights) of `C(f(t))` of degree `new_degree` on `flat_knots`,
/// under the same exactness condition as [`function_multiply`].
pub fn function_reparameterise<P: Coords, F: EvaluatorFunction>(
    function: &F,
    curve: &CurveRef<'_, P>,
    flat_knots: &[f64],
    new_degree: usize,
) -> Result<(Vec<P>, Option<Vec<f64>>), InterpolationError> {
    sample_on(function, curve, flat_knots, new_degree, Composition::Reparameterise)
}

/// Rational basis functions at `u`: pole index, value and first derivative,
/// one entry per distinct pole.
fn influence<P: Coords>(curve: &CurveRef<'_, P>, u: f64) -> SmallVec<[(usize, f64, f64); 8]> {
    let flat = curve.flat_knots();
    let mut entries: SmallVec<[(usize, f64, f64); 8]> = SmallVec::new();
    let Some((_, u)) = knot::locate_parameter_flat(curve.degree, &flat, u, curve.periodic) else {
        return entries;
    };
    let Some((first, basis)) = eval::eval_bspline_basis(1, curve.degree + 1, &flat, u) else {
        return entries;
    };

    let nb_poles = curve.poles.len();
    let weight = |index: usize| curve.weights.map_or(1.0, |w| w[index]);
    let (mut sum, mut sum_derivative) = (0.0, 0.0);
    for j in 0..=curve.degree {
        let index = (first + j) % nb_poles;
        sum += weight(index) * basis[(0, j)];
        sum_derivative += weight(index) * basis[(1, j)];
    }

    for j in 0..=curve.degree {
        let index = (first + j) % nb_poles;
        let w = weight(index);
        let value = w * basis[(0, j)] / sum;
        let derivative = w * (basis[(1, j)] * sum - basis[(0, j)] * sum_derivative) / (sum * sum);
        match entries.iter_mut().find(|entry| entry.0 == index) {
            Some(entry) => {
                entry.1 += value;
                entry.2 += derivative;
            }
            None => entries.push((index, value, derivative)),
        }
    }
    entries
}

fn displaced<P: Coords>(pole: P, terms: &[(P, f64)]) -> P {
    let mut buffer: SmallVec<[f64; 4]> = smallvec![0.0; P::DIM];
    let mut delta: SmallVec<[f64; 4]> = smallvec![0.0; P::DIM];
    pole.write_to(&mut buffer);
    for (vector, factor) in terms {
        vector.write_to(&mut delta);
        for (value, d) in buffer.iter_mut().zip(&delta) {
            *value += factor * d;
        }
    }
    P::read_from(&buffer)
}

/// Moves poles `index1..=index2` so that the curve passes through
/// `C(u) + displacement`.
///
/// The pole with the largest influence at `u` moves most and the others
/// taper off linearly towards the ends of the movable range. Returns the
/// range of poles that moved.
pub fn move_point<P: Coords>(
    curve: &CurveRef<'_, P>,
    u: f64,
    displacement: P,
    index1: usize,
    index2: usize,
    new_poles: &mut [P],
) -> Result<(usize, usize), InterpolationError> {
    if new_poles.len() != curve.poles.len() {
        return Err(InterpolationError::DimensionMismatch { constraints: new_poles.len(), poles: curve.poles.len() });
    }
    let movable: SmallVec<[(usize, f64, f64); 8]> = influence(curve, u)
        .into_iter()
        .filter(|(index, value, _)| (index1..=index2).contains(index) && *value > 0.0)
        .collect();
    if movable.is_empty() {
        return Err(InterpolationError::NoFreePoles);
    }

    let mut peak = 0;
    for (k, entry) in movable.iter().enumerate() {
        if entry.1 > movable[peak].1 {
            peak = k;
        }
    }
    let peak_end = match movable.get(peak + 1) {
        Some(next) if (next.1 - movable[peak].1).abs() < 1e-10 => peak + 1,
        _ => peak,
    };

    let last = movable.len() - 1;
    let coefficients: SmallVec<[f64; 8]> = movable
        .iter()
        .enumerate()
        .map(|(k, (_, value, _))| {
            let ramp = if k < peak {
                (k + 1) as f64 / (peak + 1) as f64
            } else if k > peak_end {
                (last - k + 1) as f64 / (last - peak_end + 1) as f64
            } else {
                1.0
            };
            value * ramp
        })
        .collect();
    let norm: f64 = coefficients.iter().zip(&movable).map(|(c, entry)| c * entry.1).sum();
    if norm <= f64::EPSILON {
        return Err(InterpolationError::Singular);
    }

    new_poles.copy_from_slice(curve.poles);
    for (coefficient, (index, _, _)) in coefficients.iter().zip(&movable) {
        new_poles[*index] = displaced(new_poles[*index], &[(displacement, coefficient / norm)]);
    }
    let first = movable.iter().map(|entry| entry.0).min().unwrap_or(index1);
    let last = movable.iter().map(|entry| entry.0).max().unwrap_or(index2);
    Ok((first, last))
}

/// Moves two adjacent poles so that the curve passes through
/// `C(u) + displacement` with derivative `C'(u) + derivative_displacement`.
///
/// `start_condition` and `end_condition` pin the curve ends: -1 leaves the
/// end free, 0 pins its point, 1 its point and tangent, and so on. Among the
/// adjacent pairs of free poles the best conditioned one is moved.
#[allow(clippy::too_many_arguments)]
pub fn move_point_and_tangent<P: Coords>(
    curve: &CurveRef<'_, P>,
    u: f64,
    displacement: P,
    derivative_displacement: P,
    start_condition: isize,
    end_condition: isize,
    new_poles: &mut [P],
) -> Result<(usize, usize), InterpolationError> {
    let nb_poles = curve.poles.len();
    if new_poles.len() != nb_poles {
        return Err(InterpolationError::DimensionMismatch { constraints: new_poles.len(), poles: nb_poles });
    }
    let pinned_start = (start_condition + 1).max(0) as usize;
    let pinned_end = (end_condition + 1).max(0) as usize;
    let free = |index: usize| index >= pinned_start && index + pinned_end < nb_poles;

    let entries = influence(curve, u);
    let mut best: Option<(usize, f64)> = None;
    for (k, pair) in entries.windows(2).enumerate() {
        if !free(pair[0].0) || !free(pair[1].0) {
            continue;
        }
        let det = pair[0].1 * pair[1].2 - pair[1].1 * pair[0].2;
        if best.map_or(true, |(_, d)| det.abs() > d.abs()) {
            best = Some((k, det));
        }
    }
    let (k, det) = best.ok_or(InterpolationError::NoFreePoles)?;
    if det.abs() <= f64::EPSILON {
        return Err(InterpolationError::Singular);
    }

    let (left, right) = (entries[k], entries[k + 1]);
    new_poles.copy_from_slice(curve.poles);
    new_poles[left.0] = displaced(
        new_poles[left.0],
        &[(displacement, right.2 / det), (derivative_displacement, -right.1 / det)],
    );
    new_poles[right.0] = displaced(
        new_poles[right.0],
        &[(displacement, -left.2 / det), (derivative_displacement, left.1 / det)],
    );
    Ok((left.0.min(right.0), left.0.max(right.0)))
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use nalgebra::Vector2;

    use super::*;

    #[test]
    fn schoenberg_points_of_clamped_cubic() {
        let flat = [0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 2.0, 2.0, 2.0];
        let points = build_schoenberg_points(3, &flat);
        let expected = [0.0, 1.0 / 3.0, 1.0, 5.0 / 3.0, 2.0];
        assert_eq!(points.len(), 5);
        for (point, value) in points.iter().zip(expected) {
            assert_approx_eq!(*point, value, 1e-12);
        }
        assert_eq!(build_schoenberg_points(0, &[0.0, 1.0, 3.0]), vec![0.5, 2.0]);
    }

    #[test]
    fn interpolation_reproduces_points() {
        let flat = [0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 3.0, 3.0, 3.0];
        let parameters = build_schoenberg_points(3, &flat);
        let targets: Vec<Vector2<f64>> = parameters.iter().map(|t| Vector2::new(*t, (t * 1.3).sin())).collect();
        let mut poles = targets.clone();
        interpolate(3, &flat, &parameters, &vec![0; parameters.len()], &mut poles).unwrap();

        let knots = [0.0, 1.0, 2.0, 3.0];
        let mults = [4, 1, 1, 4];
        let curve = CurveRef::new(3, &poles, &knots, &mults);
        for (t, target) in parameters.iter().zip(&targets) {
            assert_approx_eq!((curve.d0(*t) - target).norm(), 0.0, 1e-12);
        }
    }

    #[test]
    fn interpolation_with_a_tangent_row() {
        let flat = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut poles = [0.0, 2.0, 1.0];
        interpolate_flat(2, &flat, &[0.0, 0.0, 1.0], &[0, 1, 0], 1, &mut poles).unwrap();
        for (pole, expected) in poles.iter().zip([0.0, 1.0, 1.0]) {
            assert_approx_eq!(*pole, expected, 1e-12);
        }
    }

    #[test]
    fn degenerate_parameters_fail_with_pivot() {
        let flat = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut poles = [0.0, 1.0, 2.0];
        let result = interpolate_flat(2, &flat, &[0.0, 0.0, 1.0], &[0, 0, 0], 1, &mut poles);
        assert_eq!(result, Err(InterpolationError::InversionProblem { pivot: 2 }));
    }

    #[test]
    fn rational_interpolation_of_constant_weights() {
        let flat = [0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0];
        let parameters = build_schoenberg_points(2, &flat);
        let mut poles = [0.0, 1.0, -1.0, 2.0];
        let mut weights = [2.0; 4];
        let mut plain = poles;
        interpolate_rational(2, &flat, &parameters, &[0; 4], &mut poles, &mut weights).unwrap();
        interpolate(2, &flat, &parameters, &[0; 4], &mut plain).unwrap();
        for i in 0..4 {
            assert_approx_eq!(weights[i], 2.0, 1e-12);
            assert_approx_eq!(poles[i], plain[i], 1e-12);
        }
    }

    #[test]
    fn multiply_and_reparameterise() {
        let line = [0.0, 1.0];
        let curve = CurveRef::bezier(&line);
        let flat = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let product = function_multiply(&|t: f64| t, &curve, &flat, 2).unwrap();
        let composed = function_reparameterise(&|t: f64| t * t, &curve, &flat, 2).unwrap();
        for (poles, weights) in [product, composed] {
            assert_eq!(weights, None);
            for (pole, expected) in poles.iter().zip([0.0, 0.0, 1.0]) {
                assert_approx_eq!(*pole, expected, 1e-12);
            }
        }
    }

    #[test]
    fn rational_composition_keeps_the_weights() {
        let poles = [Vector2::new(1.0, 0.0), Vector2::new(1.0, 1.0), Vector2::new(0.0, 1.0)];
        let weights = [1.0, std::f64::consts::FRAC_1_SQRT_2, 1.0];
        let arc = CurveRef::bezier(&poles).with_weights(&weights);
        let flat = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let (scaled, scaled_weights) = function_multiply(&|_: f64| 2.0, &arc, &flat, 2).unwrap();
        let scaled_weights = scaled_weights.unwrap();
        let doubled = CurveRef::bezier(&scaled).with_weights(&scaled_weights);
        for i in 0..=10 {
            let u = i as f64 / 10.0;
            assert_approx_eq!(doubled.d0(u).norm(), 2.0, 1e-12);
            assert_approx_eq!((doubled.d0(u) - 2.0 * arc.d0(u)).norm(), 0.0, 1e-12);
        }

        let (same, same_weights) = function_reparameterise(&|t: f64| t, &arc, &flat, 2).unwrap();
        for ((pole, weight), (expected, expected_weight)) in
            same.iter().zip(same_weights.unwrap()).zip(poles.iter().zip(weights))
        {
            assert_approx_eq!((pole - expected).norm(), 0.0, 1e-12);
            assert_approx_eq!(weight, expected_weight, 1e-12);
        }
    }

    struct Failing;

    impl EvaluatorFunction for Failing {
        fn evaluate(&self, _: usize, _: [f64; 2], _: f64) -> Result<f64, i32> {
            Err(3)
        }
    }

    #[test]
    fn evaluator_failure_is_reported() {
        let line = [0.0, 1.0];
        let curve = CurveRef::bezier(&line);
        let flat = [0.0, 0.0, 1.0, 1.0];
        assert_eq!(
            function_multiply(&Failing, &curve, &flat, 1),
            Err(InterpolationError::EvaluatorFailed { code: 3 })
        );
    }

    fn wavy() -> (Vec<Vector2<f64>>, Vec<f64>, Vec<usize>) {
        let poles = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 2.0),
            Vector2::new(2.0, -1.0),
            Vector2::new(3.0, 1.5),
            Vector2::new(4.0, 0.0),
            Vector2::new(5.0, 1.0),
        ];
        (poles, vec![0.0, 1.0, 2.0, 3.0], vec![4, 1, 1, 4])
    }

    #[test]
    fn moved_point_is_reached() {
        let (poles, knots, mults) = wavy();
        let curve = CurveRef::new(3, &poles, &knots, &mults);
        let displacement = Vector2::new(0.0, 1.0);
        let mut moved = poles.clone();

        let (first, last) = move_point(&curve, 1.5, displacement, 0, 5, &mut moved).unwrap();
        assert_eq!((first, last), (1, 4));
        assert_eq!(moved[0], poles[0]);
        assert_eq!(moved[5], poles[5]);

        let edited = CurveRef::new(3, &moved, &knots, &mults);
        assert_approx_eq!((edited.d0(1.5) - curve.d0(1.5) - displacement).norm(), 0.0, 1e-12);

        let (first, last) = move_point(&curve, 1.5, displacement, 3, 3, &mut moved).unwrap();
        assert_eq!((first, last), (3, 3));
        assert_eq!(move_point(&curve, 0.2, displacement, 5, 5, &mut moved), Err(InterpolationError::NoFreePoles));
    }

    #[test]
    fn moved_point_and_tangent_are_reached() {
        let (poles, knots, mults) = wavy();
        let curve = CurveRef::new(3, &poles, &knots, &mults);
        let displacement = Vector2::new(0.5, -0.25);
        let tangent_displacement = Vector2::new(0.0, 1.0);
        let mut moved = poles.clone();

        let (first, last) =
            move_point_and_tangent(&curve, 1.2, displacement, tangent_displacement, 1, 1, &mut moved).unwrap();
        assert_eq!(last, first + 1);
        assert!(first >= 2 && last <= 3);

        let edited = CurveRef::new(3, &moved, &knots, &mults);
        let (before, before_tangent) = curve.d1(1.2);
        let (after, after_tangent) = edited.d1(1.2);
        assert_approx_eq!((after - before - displacement).norm(), 0.0, 1e-10);
        assert_approx_eq!((after_tangent - before_tangent - tangent_displacement).norm(), 0.0, 1e-10);

        assert_eq!(
            move_point_and_tangent(&curve, 0.1, displacement, tangent_displacement, 2, 2, &mut moved),
            Err(InterpolationError::NoFreePoles)
        );
    }
}
