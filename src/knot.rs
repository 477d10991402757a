//! Knot vector management.
//!
//! A curve carries its knots twice over: as strictly increasing `knots` with
//! per-knot `mults`, or as a flat sequence where every knot is repeated by its
//! multiplicity. Everything here converts between the two, locates spans and
//! classifies distributions. Malformed input yields a sentinel (`0`, `None`,
//! `false`) rather than an error.

use crate::KNOT_EPSILON;

/// Spacing of a run of knots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnotSpacing {
    Uniform,
    NonUniform,
}

/// Shape of a run of multiplicities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultDistribution {
    /// Every multiplicity is the same.
    Constant,
    /// Interior multiplicities are the same, first and last agree but differ from them.
    QuasiConstant,
    NonConstant,
}

/// Distribution of a whole knot vector, used by callers to pick faster paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnotDistribution {
    /// Equally spaced knots, all of multiplicity 1.
    Uniform,
    /// Equally spaced knots, clamped ends, interior multiplicity 1.
    QuasiUniform,
    /// Equally spaced knots, clamped ends, interior multiplicity `degree`.
    PiecewiseBezier,
    NonUniform,
}

/// Bisection search of `x` in the non-decreasing `array`.
///
/// Returns the largest index `i` with `array[i] <= x`, `-1` when `x` lies
/// below the first value and `array.len()` when it lies above the last one.
pub fn hunt(array: &[f64], x: f64) -> isize {
    if array.is_empty() || x < array[0] {
        return -1;
    }
    if x > array[array.len() - 1] {
        return array.len() as isize;
    }
    array.partition_point(|value| *value <= x) as isize - 1
}

/// Index of the first knot of the defined parameter range.
///
/// Returns 0 for empty multiplicities.
pub fn first_u_knot_index(degree: usize, mults: &[usize]) -> usize {
    let Some(&first) = mults.first() else {
        return 0;
    };
    let mut index = 0;
    let mut sigma = first;
    while sigma <= degree && index + 1 < mults.len() {
        index += 1;
        sigma += mults[index];
    }
    index
}

/// Index of the last knot of the defined parameter range.
///
/// Returns 0 for empty multiplicities.
pub fn last_u_knot_index(degree: usize, mults: &[usize]) -> usize {
    let Some(&last) = mults.last() else {
        return 0;
    };
    let mut index = mults.len() - 1;
    let mut sigma = last;
    while sigma <= degree && index > 0 {
        index -= 1;
        sigma += mults[index];
    }
    index
}

/// Position in the flat sequence of the last copy of knot `index`.
///
/// Returns 0 when `index` is not a knot index.
pub fn flat_index(degree: usize, index: usize, mults: &[usize], periodic: bool) -> usize {
    if index >= mults.len() {
        return 0;
    }
    if periodic {
        degree + mults[1..=index].iter().sum::<usize>()
    } else {
        mults[..=index].iter().sum::<usize>().saturating_sub(1)
    }
}

/// Length of the parameter period of a periodic curve, 0 without knots.
pub fn period(knots: &[f64]) -> f64 {
    match (knots.first(), knots.last()) {
        (Some(first), Some(last)) => last - first,
        _ => 0.0,
    }
}

/// Maps `u` into `[first, last)` by whole periods.
pub(crate) fn wrap(u: f64, first: f64, last: f64) -> f64 {
    let length = last - first;
    if length <= 0.0 {
        return u;
    }
    let wrapped = first + (u - first).rem_euclid(length);
    // rem_euclid can round up to the period itself
    if wrapped >= last {
        first
    } else {
        wrapped
    }
}

/// Locates `u` among structured knots.
///
/// Returns the knot index `i` with `knots[i] <= u < knots[i + 1]`, clamped to
/// the defined range, and the parameter remapped into the period for periodic
/// curves (unchanged otherwise). `None` when the knots do not bound a span.
pub fn locate_parameter(degree: usize, knots: &[f64], mults: &[usize], u: f64, periodic: bool) -> Option<(usize, f64)> {
    if knots.len() < 2 || knots.len() != mults.len() {
        return None;
    }
    let (first, last) = if periodic {
        (0, knots.len() - 1)
    } else {
        (first_u_knot_index(degree, mults), last_u_knot_index(degree, mults))
    };
    if first >= last {
        return None;
    }
    let new_u = if periodic { wrap(u, knots[first], knots[last]) } else { u };

    let index = match hunt(&knots[first..=last], new_u) {
        i if i < 0 => first,
        i => (first + i as usize).min(last - 1),
    };
    Some((index, new_u))
}

/// Locates `u` in a flat knot sequence.
///
/// Returns the span index `s` with `flat[s] <= u < flat[s + 1]`, restricted to
/// non-empty spans of the defined range `degree..nb_poles`, and the remapped
/// parameter. `None` when the sequence is too short to hold a span.
pub fn locate_parameter_flat(degree: usize, flat_knots: &[f64], u: f64, periodic: bool) -> Option<(usize, f64)> {
    let n = flat_knots.len().checked_sub(degree + 1)?;
    if n <= degree {
        return None;
    }
    let new_u = if periodic { wrap(u, flat_knots[degree], flat_knots[n]) } else { u };

    let mut span;
    if new_u < flat_knots[degree] {
        span = degree;
        while span + 1 < n && flat_knots[span + 1] == flat_knots[span] {
            span += 1;
        }
    } else if new_u >= flat_knots[n] {
        span = n - 1;
        while span > degree && flat_knots[span] == flat_knots[span + 1] {
            span -= 1;
        }
    } else {
        span = degree + flat_knots[degree..n].partition_point(|k| *k <= new_u) - 1;
    }
    Some((span, new_u))
}

/// Largest multiplicity over `mults[from..=to]`.
pub fn max_knot_mult(mults: &[usize], from: usize, to: usize) -> usize {
    mults[from..=to].iter().copied().max().unwrap_or(0)
}

/// Smallest multiplicity over `mults[from..=to]`.
pub fn min_knot_mult(mults: &[usize], from: usize, to: usize) -> usize {
    mults[from..=to].iter().copied().min().unwrap_or(0)
}

/// Number of poles implied by the degree, periodicity and multiplicities.
///
/// Returns 0 when they are inconsistent: a zero multiplicity, an interior
/// multiplicity above `degree`, an end multiplicity above `degree + 1`, too
/// few knots for one full span, or a periodic curve whose end multiplicities
/// differ or exceed `degree`.
pub fn nb_poles(degree: usize, periodic: bool, mults: &[usize]) -> usize {
    if mults.len() < 2 {
        return 0;
    }
    let first = mults[0];
    let last = mults[mults.len() - 1];
    if first == 0 || last == 0 {
        return 0;
    }

    let mut sigma = if periodic {
        if first > degree || last > degree || first != last {
            return 0;
        }
        first
    } else {
        if first > degree + 1 || last > degree + 1 {
            return 0;
        }
        first + last
    };

    for &mult in &mults[1..mults.len() - 1] {
        if mult == 0 || mult > degree {
            return 0;
        }
        sigma += mult;
    }
    if periodic {
        return sigma;
    }
    match sigma.saturating_sub(degree + 1) {
        count if count > degree => count,
        _ => 0,
    }
}

/// Length of the flat sequence built by [`knot_sequence`].
///
/// Returns 0 for empty multiplicities or a periodic first multiplicity above
/// `degree + 1`.
pub fn knot_sequence_length(mults: &[usize], degree: usize, periodic: bool) -> usize {
    let total: usize = mults.iter().sum();
    match (periodic, mults.first()) {
        (_, None) => 0,
        (true, Some(&first)) => match (degree + 1).checked_sub(first) {
            Some(extension) => total + 2 * extension,
            None => 0,
        },
        (false, Some(_)) => total,
    }
}

/// Expands structured knots into the flat sequence.
///
/// For periodic curves the sequence is extended on both sides by
/// `degree + 1 - mults[0]` knots borrowed from the opposite end and shifted by
/// the period, so that every span of the period has `degree` knots on each side.
/// Returns an empty sequence when knots and multiplicities do not match or
/// the periodic extension cannot be built.
pub fn knot_sequence(knots: &[f64], mults: &[usize], degree: usize, periodic: bool) -> Vec<f64> {
    if knots.is_empty() || knots.len() != mults.len() {
        return Vec::new();
    }
    let last = knots.len() - 1;
    let extension = if periodic {
        let borrowable = last > 0 && mults[..last].iter().any(|m| *m > 0) && mults[1..].iter().any(|m| *m > 0);
        match (degree + 1).checked_sub(mults[0]) {
            Some(0) => 0,
            Some(extension) if borrowable => extension,
            _ => return Vec::new(),
        }
    } else {
        0
    };
    let mut sequence = Vec::with_capacity(knot_sequence_length(mults, degree, periodic));

    if extension > 0 {
        let period = period(knots);
        let mut head = Vec::with_capacity(extension);
        let mut index = last;
        let mut shift = 0.0;
        while head.len() < extension {
            if index == 0 {
                index = last;
            }
            if index == last {
                shift -= period;
            }
            index -= 1;
            for _ in 0..mults[index] {
                if head.len() < extension {
                    head.push(knots[index] + shift);
                }
            }
        }
        sequence.extend(head.into_iter().rev());
    }

    for (knot, &mult) in knots.iter().zip(mults) {
        sequence.extend(std::iter::repeat(*knot).take(mult));
    }

    if extension > 0 {
        let period = period(knots);
        let mut added = 0;
        let mut index = 0;
        let mut shift = period;
        while added < extension {
            index += 1;
            if index > last {
                index = 1;
                shift += period;
            }
            for _ in 0..mults[index] {
                if added < extension {
                    sequence.push(knots[index] + shift);
                    added += 1;
                }
            }
        }
    }
    sequence
}

/// The part of a flat sequence that belongs to the knots proper, without the
/// periodic extension.
fn defined_part(flat_knots: &[f64], degree: usize, periodic: bool) -> &[f64] {
    if !periodic {
        return flat_knots;
    }
    if flat_knots.len() <= degree {
        return &[];
    }
    let first_mult = flat_knots[..=degree].iter().rev().take_while(|k| **k == flat_knots[degree]).count();
    let extension = degree + 1 - first_mult;
    if flat_knots.len() < 2 * extension {
        return &[];
    }
    &flat_knots[extension..flat_knots.len() - extension]
}

/// Number of distinct knots in a flat sequence.
pub fn knots_length(flat_knots: &[f64], degree: usize, periodic: bool) -> usize {
    let defined = defined_part(flat_knots, degree, periodic);
    if defined.is_empty() {
        return 0;
    }
    1 + defined.windows(2).filter(|w| w[1] != w[0]).count()
}

/// Collapses a flat sequence back into knots and multiplicities.
///
/// Inverse of [`knot_sequence`] for the same degree and periodicity.
pub fn knots_from_sequence(flat_knots: &[f64], degree: usize, periodic: bool) -> (Vec<f64>, Vec<usize>) {
    let defined = defined_part(flat_knots, degree, periodic);
    let mut knots: Vec<f64> = Vec::with_capacity(knots_length(flat_knots, degree, periodic));
    let mut mults: Vec<usize> = Vec::with_capacity(knots.capacity());

    for &value in defined {
        match knots.last() {
            Some(&last) if last == value => {
                if let Some(mult) = mults.last_mut() {
                    *mult += 1;
                }
            }
            _ => {
                knots.push(value);
                mults.push(1);
            }
        }
    }
    (knots, mults)
}

/// Whether `knots[from..=to]` are equally spaced.
pub fn knot_form(knots: &[f64], from: usize, to: usize) -> KnotSpacing {
    if to <= from + 1 {
        return KnotSpacing::Uniform;
    }
    let reference = knots[from + 1] - knots[from];
    for i in from + 1..to {
        let step = knots[i + 1] - knots[i];
        let scale = 1.0_f64.max(knots[i + 1].abs());
        if (step - reference).abs() > KNOT_EPSILON * scale {
            return KnotSpacing::NonUniform;
        }
    }
    KnotSpacing::Uniform
}

/// Classifies `mults[from..=to]`.
pub fn mult_form(mults: &[usize], from: usize, to: usize) -> MultDistribution {
    let run = &mults[from..=to];
    if run.iter().all(|m| *m == run[0]) {
        return MultDistribution::Constant;
    }
    if run.len() > 2 {
        let interior = &run[1..run.len() - 1];
        if run[0] == run[run.len() - 1] && interior.iter().all(|m| *m == interior[0]) {
            return MultDistribution::QuasiConstant;
        }
    }
    MultDistribution::NonConstant
}

/// Classifies a knot vector and reports the largest interior multiplicity.
pub fn knot_analysis(degree: usize, periodic: bool, knots: &[f64], mults: &[usize]) -> (KnotDistribution, usize) {
    let last = knots.len() - 1;
    let mut form = KnotDistribution::NonUniform;

    if knot_form(knots, 0, last) == KnotSpacing::Uniform {
        match mult_form(mults, 0, last) {
            MultDistribution::Constant => {
                if knots.len() == 2 {
                    form = KnotDistribution::PiecewiseBezier;
                } else if mults[0] == 1 {
                    form = KnotDistribution::Uniform;
                }
            }
            MultDistribution::QuasiConstant => {
                if mults[0] == degree + 1 {
                    if mults[1] == degree {
                        form = KnotDistribution::PiecewiseBezier;
                    } else if mults[1] == 1 {
                        form = KnotDistribution::QuasiUniform;
                    }
                }
            }
            MultDistribution::NonConstant => {}
        }
    }

    let (first_km, last_km) = if periodic {
        (0, last)
    } else {
        (first_u_knot_index(degree, mults), last_u_knot_index(degree, mults))
    };
    let max_mult = if last_km > first_km + 1 { max_knot_mult(mults, first_km + 1, last_km - 1) } else { 0 };

    (form, max_mult)
}

/// Affinely maps the knots onto `[u1, u2]`.
///
/// Returns false and leaves the knots untouched when `u1 == u2` or the current
/// range is empty.
#[must_use]
pub fn reparametrize(u1: f64, u2: f64, knots: &mut [f64]) -> bool {
    if knots.len() < 2 || u1 == u2 {
        return false;
    }
    let first = knots[0];
    let last = knots[knots.len() - 1];
    if first == last {
        return false;
    }
    let ratio = (u2 - u1) / (last - first);
    for knot in knots.iter_mut() {
        *knot = u1 + (*knot - first) * ratio;
    }
    true
}

/// Reverses knots so that `k -> first + last - k` in reversed order.
pub fn reverse_knots(knots: &mut [f64]) {
    if knots.is_empty() {
        return;
    }
    let sum = knots[0] + knots[knots.len() - 1];
    knots.reverse();
    for knot in knots.iter_mut() {
        *knot = sum - *knot;
    }
}

/// Reverses multiplicities.
pub fn reverse_mults(mults: &mut [usize]) {
    mults.reverse();
}

/// Reverses poles (or weights) of a curve whose knots were reversed.
///
/// `last` is the pivot from [`reverse_last_index`]: `items[..=last]` and
/// `items[last + 1..]` are reversed separately, which is a full reversal for
/// non-periodic curves and the wrap-aware one for periodic curves.
pub fn reverse_poles<T>(items: &mut [T], last: usize) {
    if items.is_empty() {
        return;
    }
    let pivot = last % items.len();
    items[..=pivot].reverse();
    items[pivot + 1..].reverse();
}

/// Pivot index to pass to [`reverse_poles`].
pub fn reverse_last_index(degree: usize, periodic: bool, mults: &[usize]) -> usize {
    let poles = nb_poles(degree, periodic, mults);
    if poles == 0 {
        return 0;
    }
    if periodic {
        (knot_sequence_length(mults, degree, periodic) - degree - 2) % poles
    } else {
        poles - 1
    }
}

/// Whether the weights vary by more than `epsilon`, making the curve truly rational.
pub fn is_rational(weights: &[f64], epsilon: f64) -> bool {
    match weights.first() {
        Some(&first) => weights.iter().any(|w| (w - first).abs() > epsilon),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hunt_clamps_out_of_range() {
        let array = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(hunt(&array, -0.5), -1);
        assert_eq!(hunt(&array, 0.0), 0);
        assert_eq!(hunt(&array, 1.5), 1);
        assert_eq!(hunt(&array, 3.0), 3);
        assert_eq!(hunt(&array, 3.5), 4);
    }

    #[test]
    fn defined_range_indices() {
        let mults = [4, 1, 1, 4];
        assert_eq!(first_u_knot_index(3, &mults), 0);
        assert_eq!(last_u_knot_index(3, &mults), 3);

        let mults = [1, 1, 1, 1, 1, 1, 1, 1];
        assert_eq!(first_u_knot_index(3, &mults), 3);
        assert_eq!(last_u_knot_index(3, &mults), 4);
    }

    #[test]
    fn flat_index_points_at_last_copy() {
        let mults = [4, 2, 1, 4];
        assert_eq!(flat_index(3, 0, &mults, false), 3);
        assert_eq!(flat_index(3, 1, &mults, false), 5);
        assert_eq!(flat_index(3, 2, &mults, false), 6);

        let knots = [0.0, 1.0, 2.0, 3.0];
        let mults = [1, 2, 1, 1];
        let flat = knot_sequence(&knots, &mults, 3, true);
        let index = flat_index(3, 1, &mults, true);
        assert_eq!(flat[index], 1.0);
        assert!(flat[index + 1] > 1.0);
    }

    #[test]
    fn nb_poles_consistency() {
        assert_eq!(nb_poles(3, false, &[4, 1, 1, 4]), 6);
        assert_eq!(nb_poles(3, true, &[1, 1, 1, 1, 1, 1, 1]), 6);
        assert_eq!(nb_poles(3, false, &[5, 4]), 0);
        assert_eq!(nb_poles(3, false, &[4, 0, 4]), 0);
        assert_eq!(nb_poles(3, false, &[4, 4, 4]), 0);
        assert_eq!(nb_poles(3, true, &[2, 1, 1]), 0);
        assert_eq!(nb_poles(3, true, &[4, 1, 4]), 0);
        assert_eq!(nb_poles(3, false, &[1, 1, 1, 1, 1, 1, 1, 1, 1]), 5);
        assert_eq!(nb_poles(3, false, &[2, 2]), 0);
    }

    #[test]
    fn sequence_of_clamped_knots() {
        let flat = knot_sequence(&[0.0, 0.5, 1.0], &[3, 1, 3], 2, false);
        assert_eq!(flat, vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0]);
        assert_eq!(knot_sequence_length(&[3, 1, 3], 2, false), 7);

        let (knots, mults) = knots_from_sequence(&flat, 2, false);
        assert_eq!(knots, vec![0.0, 0.5, 1.0]);
        assert_eq!(mults, vec![3, 1, 3]);
        assert_eq!(knots_length(&flat, 2, false), 3);
    }

    #[test]
    fn sequence_of_periodic_knots() {
        let knots = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mults = [1; 7];
        let flat = knot_sequence(&knots, &mults, 3, true);
        assert_eq!(flat, vec![-3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(flat.len(), knot_sequence_length(&mults, 3, true));

        let (back, back_mults) = knots_from_sequence(&flat, 3, true);
        assert_eq!(back, knots.to_vec());
        assert_eq!(back_mults, mults.to_vec());
    }

    #[test]
    fn sequence_of_periodic_knots_with_repeated_ends() {
        let knots = [0.0, 1.0, 3.0, 4.0];
        let mults = [2, 1, 2, 2];
        let flat = knot_sequence(&knots, &mults, 3, true);
        assert_eq!(flat, vec![-1.0, -1.0, 0.0, 0.0, 1.0, 3.0, 3.0, 4.0, 4.0, 5.0, 7.0]);

        let (back, back_mults) = knots_from_sequence(&flat, 3, true);
        assert_eq!(back, knots.to_vec());
        assert_eq!(back_mults, mults.to_vec());
    }

    #[test]
    fn locate_in_flat_sequence() {
        let flat = [0.0, 0.0, 0.0, 1.0, 2.0, 2.0, 2.0];
        assert_eq!(locate_parameter_flat(2, &flat, 0.0, false).unwrap().0, 2);
        assert_eq!(locate_parameter_flat(2, &flat, 0.5, false).unwrap().0, 2);
        assert_eq!(locate_parameter_flat(2, &flat, 1.0, false).unwrap().0, 3);
        assert_eq!(locate_parameter_flat(2, &flat, 2.0, false).unwrap().0, 3);
        assert_eq!(locate_parameter_flat(2, &flat, 5.0, false).unwrap().0, 3);
        assert_eq!(locate_parameter_flat(2, &flat, -1.0, false).unwrap().0, 2);
    }

    #[test]
    fn locate_wraps_periodic_parameter() {
        let knots = [0.0, 1.0, 2.0, 3.0];
        let mults = [1, 1, 1, 1];
        let (index, u) = locate_parameter(2, &knots, &mults, 4.5, true).unwrap();
        assert_eq!(index, 1);
        assert!((u - 1.5).abs() < 1e-15);

        let (index, u) = locate_parameter(2, &knots, &mults, -0.5, true).unwrap();
        assert_eq!(index, 2);
        assert!((u - 2.5).abs() < 1e-15);

        let flat = knot_sequence(&knots, &mults, 2, true);
        let (span, u) = locate_parameter_flat(2, &flat, 3.0, true).unwrap();
        assert_eq!(u, 0.0);
        assert_eq!(flat[span], 0.0);
    }

    #[test]
    fn locate_structured_clamps() {
        let knots = [0.0, 1.0, 2.0];
        let mults = [3, 1, 3];
        assert_eq!(locate_parameter(2, &knots, &mults, -1.0, false), Some((0, -1.0)));
        assert_eq!(locate_parameter(2, &knots, &mults, 1.0, false), Some((1, 1.0)));
        assert_eq!(locate_parameter(2, &knots, &mults, 2.0, false), Some((1, 2.0)));
    }

    #[test]
    fn multiplicity_extrema() {
        let mults = [4, 1, 3, 2, 4];
        assert_eq!(max_knot_mult(&mults, 1, 3), 3);
        assert_eq!(min_knot_mult(&mults, 1, 3), 1);
    }

    #[test]
    fn distribution_analysis() {
        let knots = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(knot_form(&knots, 0, 3), KnotSpacing::Uniform);
        assert_eq!(knot_form(&[0.0, 1.0, 3.0], 0, 2), KnotSpacing::NonUniform);

        assert_eq!(mult_form(&[1, 1, 1], 0, 2), MultDistribution::Constant);
        assert_eq!(mult_form(&[4, 1, 1, 4], 0, 3), MultDistribution::QuasiConstant);
        assert_eq!(mult_form(&[4, 1, 2, 4], 0, 3), MultDistribution::NonConstant);

        assert_eq!(knot_analysis(3, false, &knots, &[4, 1, 1, 4]), (KnotDistribution::QuasiUniform, 1));
        assert_eq!(knot_analysis(3, false, &knots, &[4, 3, 3, 4]), (KnotDistribution::PiecewiseBezier, 3));
        assert_eq!(knot_analysis(3, false, &[0.0, 1.0], &[4, 4]), (KnotDistribution::PiecewiseBezier, 0));
        assert_eq!(knot_analysis(2, true, &knots, &[1, 1, 1, 1]).0, KnotDistribution::Uniform);
        assert_eq!(knot_analysis(3, false, &[0.0, 1.0, 3.0], &[4, 1, 4]).0, KnotDistribution::NonUniform);
    }

    #[test]
    fn reparametrize_maps_range() {
        let mut knots = [0.0, 1.0, 4.0];
        assert!(reparametrize(2.0, 10.0, &mut knots));
        assert_eq!(knots, [2.0, 4.0, 10.0]);

        assert!(!reparametrize(1.0, 1.0, &mut knots));
        assert_eq!(knots, [2.0, 4.0, 10.0]);
    }

    #[test]
    fn reverse_is_an_involution() {
        let original = [0.0, 0.5, 2.0, 3.0];
        let mut knots = original;
        reverse_knots(&mut knots);
        assert_eq!(knots, [0.0, 1.0, 2.5, 3.0]);
        reverse_knots(&mut knots);
        assert_eq!(knots, original);

        let mut mults = [4, 1, 2, 4];
        reverse_mults(&mut mults);
        assert_eq!(mults, [4, 2, 1, 4]);
    }

    #[test]
    fn periodic_pole_reversal_pivot() {
        let mults = [1; 7];
        assert_eq!(reverse_last_index(3, true, &mults), 2);
        assert_eq!(reverse_last_index(3, false, &[4, 1, 4]), 4);

        let mut poles = [0, 1, 2, 3, 4, 5];
        reverse_poles(&mut poles, 2);
        assert_eq!(poles, [2, 1, 0, 5, 4, 3]);
    }

    #[test]
    fn rational_detection() {
        assert!(!is_rational(&[2.0, 2.0, 2.0], 1e-12));
        assert!(is_rational(&[1.0, 2.0, 1.0], 1e-12));
        assert!(!is_rational(&[], 1e-12));
    }

    #[test]
    fn malformed_input_gives_sentinels() {
        assert_eq!(knot_sequence_length(&[5, 1, 5], 3, true), 0);
        assert_eq!(knot_sequence_length(&[], 3, false), 0);
        assert!(knot_sequence(&[], &[], 3, false).is_empty());
        assert!(knot_sequence(&[0.0, 1.0], &[5, 5], 3, true).is_empty());
        assert!(knot_sequence(&[0.0, 1.0], &[1], 3, false).is_empty());
        assert!(knot_sequence(&[0.0], &[1], 3, true).is_empty());

        assert_eq!(first_u_knot_index(3, &[]), 0);
        assert_eq!(last_u_knot_index(3, &[]), 0);
        assert_eq!(flat_index(3, 2, &[4, 4], false), 0);
        assert_eq!(period(&[]), 0.0);

        assert_eq!(locate_parameter_flat(3, &[0.0, 1.0], 0.5, false), None);
        assert_eq!(locate_parameter_flat(2, &[0.0, 0.0, 0.0, 1.0, 1.0], 0.5, false), None);
        assert_eq!(locate_parameter(3, &[], &[], 0.5, false), None);
        assert_eq!(locate_parameter(3, &[0.0, 1.0], &[2, 2], 0.5, false), None);
    }
}
