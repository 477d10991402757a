//! Structural transforms: knot insertion and removal, degree elevation,
//! unperiodization and trimming.
//!
//! Every transform borrows the caller's curve and returns a new
//! [`SplineData`]. Work happens on a packed copy (homogeneous for rational
//! curves) with flat knots, so a refused transform never touches its input.
//!
//! Periodic curves are unrolled into an open window of several periods, the
//! knot is inserted or removed once per period, and one period of poles is
//! read back from the middle of the window.

use log::debug;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    check_degree,
    eval::{self, binomial, LocalBuffer},
    knot,
    pole::{Coords, CurveRef, SplineData},
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("parameter {value} lies outside the curve range [{first}, {last}]")]
    OutOfRange { value: f64, first: f64, last: f64 },
    #[error("range [{u1}, {u2}] is empty")]
    EmptyRange { u1: f64, u2: f64 },
    #[error("knots to insert decrease at position {index}")]
    NotIncreasing { index: usize },
    #[error("knot {index} is not an interior knot")]
    NotInterior { index: usize },
    #[error("multiplicity {requested} is invalid for knot {index} of multiplicity {current}")]
    InvalidMultiplicity { index: usize, requested: usize, current: usize },
    #[error("knot removal deviates by {deviation}, above the tolerance {tolerance}")]
    ToleranceExceeded { deviation: f64, tolerance: f64 },
    #[error("degree {requested} is below the current degree {current}")]
    DegreeDecrease { requested: usize, current: usize },
    #[error("poles, weights, knots and multiplicities do not describe a curve")]
    Malformed,
}

fn refuse(operation: &str, error: TransformError) -> TransformError {
    debug!("{operation} refused: {error}");
    error
}

fn check_curve<P: Coords>(operation: &str, curve: &CurveRef<'_, P>) -> Result<(), TransformError> {
    check_degree(curve.degree);
    if !curve.is_consistent() {
        return Err(refuse(operation, TransformError::Malformed));
    }
    Ok(())
}

/// `value` moved by `periods` whole periods.
fn shifted(value: f64, period: f64, periods: isize) -> f64 {
    value + period * periods as f64
}

/// Packed poles with flat knots of a non-periodic curve.
struct FlatCurve {
    degree: usize,
    dimension: usize,
    rational: bool,
    poles: Vec<f64>,
    flat: Vec<f64>,
}

impl FlatCurve {
    fn new<P: Coords>(curve: &CurveRef<'_, P>) -> Self {
        FlatCurve {
            degree: curve.degree,
            dimension: curve.dimension(),
            rational: curve.is_rational(),
            poles: curve.homogeneous_poles(),
            flat: curve.flat_knots(),
        }
    }

    /// Open copy of a periodic curve over `2 * reach + 1` periods. The middle
    /// period keeps the curve's own flat knots and pole order.
    fn periodic_window<P: Coords>(curve: &CurveRef<'_, P>, reach: usize) -> Self {
        let (p, dim) = (curve.degree, curve.dimension());
        let n = curve.poles.len();
        let period = knot::period(curve.knots);
        let periodic_flat = curve.flat_knots();
        let packed = curve.homogeneous_poles();
        let lead = (p + 1).saturating_sub(curve.mults[0]);
        let offset = (reach * n + lead) as isize;
        let count = (2 * reach + 1) * n;

        // every knot is a shifted copy of one from the first period, so a
        // knot and its copies compare equal to `shifted` values
        let flat = (0..count + p + 1)
            .map(|j| {
                let j = j as isize - offset;
                let n = n as isize;
                shifted(periodic_flat[lead + j.rem_euclid(n) as usize], period, j.div_euclid(n))
            })
            .collect();
        let mut poles = Vec::with_capacity(count * dim);
        for i in 0..count {
            let source = i % n;
            poles.extend_from_slice(&packed[source * dim..(source + 1) * dim]);
        }
        FlatCurve { degree: p, dimension: dim, rational: curve.is_rational(), poles, flat }
    }

    /// Reads one period back from a window built by [`Self::periodic_window`].
    /// `start` is the first knot of the period, `knots` and `mults` describe the
    /// periodic result.
    fn into_periodic<P: Coords>(self, start: f64, knots: Vec<f64>, mults: Vec<usize>) -> SplineData<P> {
        let dim = self.dimension;
        let lead = (self.degree + 1).saturating_sub(mults[0]);
        let first = self.flat.partition_point(|k| *k < start) - lead;
        let count = knot::nb_poles(self.degree, true, &mults);
        let poles = &self.poles[first * dim..(first + count) * dim];
        SplineData::from_packed(self.degree, true, poles, self.rational, knots, mults)
    }

    /// Open parameter range where every span has a full set of poles.
    fn range(&self) -> (f64, f64) {
        (self.flat[self.degree], self.flat[self.flat.len() - self.degree - 1])
    }

    fn count(&self, u: f64) -> usize {
        self.flat.iter().filter(|k| **k == u).count()
    }

    /// Boehm insertion of one copy of `u`.
    fn insert(&mut self, u: f64) {
        let (p, dim) = (self.degree, self.dimension);
        let span = knot::locate_parameter_flat(p, &self.flat, u, false).map_or(p, |(span, _)| span);
        let first = span - p;

        let mut local: LocalBuffer = SmallVec::from_slice(&self.poles[first * dim..(span + 1) * dim]);
        eval::boor_scheme(u, p, &self.flat[first + 1..], dim, &mut local, 1, p + 1);

        let mut poles = Vec::with_capacity(self.poles.len() + dim);
        poles.extend_from_slice(&self.poles[..(first + 1) * dim]);
        poles.extend_from_slice(&local[dim..]);
        poles.extend_from_slice(&self.poles[span * dim..]);
        self.poles = poles;
        self.flat.insert(span + 1, u);
    }

    fn raise_to(&mut self, u: f64, target: usize) {
        for _ in self.count(u)..target {
            self.insert(u);
        }
    }

    /// Upper bound on how far the curve moves when one removal shifts a pole
    /// by `deviation` in packed coordinates, `reduced` being the poles after
    /// the removal.
    ///
    /// The shift acts through a single basis function. A rational curve moves
    /// by at most `deviation * (1 + max |P|) / min w'`, with the pole norms
    /// taken before the removal and the weights after it.
    fn moved_by(&self, deviation: f64, reduced: &[f64]) -> f64 {
        if !self.rational {
            return deviation;
        }
        let dim = self.dimension;
        let lightest = self
            .poles
            .chunks_exact(dim)
            .chain(reduced.chunks_exact(dim))
            .map(|pole| pole[dim - 1])
            .fold(f64::INFINITY, f64::min);
        if lightest.is_nan() || lightest <= 0.0 {
            return f64::INFINITY;
        }
        let farthest = self
            .poles
            .chunks_exact(dim)
            .map(|pole| pole[..dim - 1].iter().map(|x| (x / pole[dim - 1]).powi(2)).sum::<f64>().sqrt())
            .fold(0.0, f64::max);
        let lightest_after = reduced.chunks_exact(dim).map(|pole| pole[dim - 1]).fold(f64::INFINITY, f64::min);
        deviation * (1.0 + farthest) / lightest_after
    }

    /// Removes the flat knot at `last_copy`, the last copy of an interior knot.
    ///
    /// Returns the bound of [`Self::moved_by`], and leaves the curve unchanged
    /// with `Err` when that bound exceeds `budget`.
    fn remove(&mut self, last_copy: usize, budget: f64) -> Result<f64, f64> {
        let (p, dim) = (self.degree, self.dimension);
        let u = self.flat[last_copy];
        let mult = self.count(u);
        let first = last_copy - 1 - p;
        let length = p + 2 - mult;

        let mut reduced = self.flat.clone();
        reduced.remove(last_copy);
        let mut recovered = vec![0.0; length * dim];
        let deviation = eval::anti_boor_scheme(
            u,
            p,
            &reduced[first + 1..],
            dim,
            &self.poles[first * dim..(first + length + 1) * dim],
            length,
            f64::INFINITY,
            &mut recovered,
        )?;

        let mut poles = Vec::with_capacity(self.poles.len() - dim);
        poles.extend_from_slice(&self.poles[..first * dim]);
        poles.extend_from_slice(&recovered);
        poles.extend_from_slice(&self.poles[(first + length + 1) * dim..]);
        let moved = self.moved_by(deviation, &poles);
        if moved.is_nan() || moved > budget {
            return Err(moved);
        }
        self.poles = poles;
        self.flat = reduced;
        Ok(moved)
    }

    /// Restricts the curve to `[u1, u2]`, leaving both ends clamped.
    fn trim(&mut self, u1: f64, u2: f64) {
        let (p, dim) = (self.degree, self.dimension);
        self.raise_to(u1, p);
        self.raise_to(u2, p);

        let start = self.flat.partition_point(|k| *k < u1);
        let past = start + self.count(u1);
        let end = self.flat.partition_point(|k| *k < u2);

        self.poles = self.poles[(past - p - 1) * dim..end * dim].to_vec();
        let mut flat = vec![u1; p + 1];
        flat.extend_from_slice(&self.flat[past..end]);
        flat.extend(std::iter::repeat(u2).take(p + 1));
        self.flat = flat;
    }

    /// Exact degree elevation of a clamped curve.
    fn elevate(&mut self, new_degree: usize) -> Result<(), f64> {
        let (p, dim) = (self.degree, self.dimension);
        let delta = new_degree - p;
        let (knots, mults) = knot::knots_from_sequence(&self.flat, p, false);
        let last = knots.len() - 1;

        for &u in &knots[1..last] {
            self.raise_to(u, p);
        }

        let mut poles = Vec::with_capacity((last * new_degree + 1) * dim);
        for segment in 0..last {
            let bezier = &self.poles[segment * p * dim..(segment * p + p + 1) * dim];
            for i in usize::from(segment > 0)..=new_degree {
                let mut pole: LocalBuffer = SmallVec::from_elem(0.0, dim);
                for j in i.saturating_sub(delta)..=i.min(p) {
                    let factor = binomial(p, j) * binomial(delta, i - j) / binomial(new_degree, i);
                    for (value, source) in pole.iter_mut().zip(&bezier[j * dim..(j + 1) * dim]) {
                        *value += factor * source;
                    }
                }
                poles.extend_from_slice(&pole);
            }
        }

        let mut flat = vec![knots[0]; new_degree + 1];
        for &u in &knots[1..last] {
            flat.extend(std::iter::repeat(u).take(new_degree));
        }
        flat.extend(std::iter::repeat(knots[last]).take(new_degree + 1));

        self.degree = new_degree;
        self.poles = poles;
        self.flat = flat;

        for index in (1..last).rev() {
            let mut last_copy = new_degree + index * new_degree;
            for _ in mults[index] + delta..new_degree {
                self.remove(last_copy, f64::INFINITY)?;
                last_copy -= 1;
            }
        }
        Ok(())
    }

    fn into_data<P: Coords>(self) -> SplineData<P> {
        let (knots, mults) = knot::knots_from_sequence(&self.flat, self.degree, false);
        SplineData::from_packed(self.degree, false, &self.poles, self.rational, knots, mults)
    }
}

/// Snaps `u` onto an existing knot closer than `epsilon`.
fn snap(knots: &[f64], u: f64, epsilon: f64) -> f64 {
    knots.iter().copied().find(|k| (k - u).abs() <= epsilon).unwrap_or(u)
}

fn domain(degree: usize, periodic: bool, knots: &[f64], mults: &[usize]) -> (f64, f64) {
    if periodic {
        (knots[0], knots[knots.len() - 1])
    } else {
        (knots[knot::first_u_knot_index(degree, mults)], knots[knot::last_u_knot_index(degree, mults)])
    }
}

/// Structured knots after merging the additions, and the copies to insert per value.
struct Insertion {
    knots: Vec<f64>,
    mults: Vec<usize>,
    copies: Vec<(f64, usize)>,
}

#[allow(clippy::too_many_arguments)]
fn plan_insertion(
    degree: usize,
    periodic: bool,
    knots: &[f64],
    mults: &[usize],
    add_knots: &[f64],
    add_mults: Option<&[usize]>,
    epsilon: f64,
    add: bool,
) -> Result<Insertion, TransformError> {
    if knot::nb_poles(degree, periodic, mults) == 0 || knots.len() != mults.len() {
        return Err(TransformError::Malformed);
    }
    if add_mults.is_some_and(|m| m.len() != add_knots.len()) {
        return Err(TransformError::Malformed);
    }
    if let Some(index) = add_knots.windows(2).position(|w| w[1] < w[0]) {
        return Err(TransformError::NotIncreasing { index: index + 1 });
    }

    let (first, last) = domain(degree, periodic, knots, mults);
    let mut merged_knots = knots.to_vec();
    let mut merged_mults = mults.to_vec();
    for (i, &u) in add_knots.iter().enumerate() {
        if u < first - epsilon || u > last + epsilon {
            return Err(TransformError::OutOfRange { value: u, first, last });
        }
        if (u - first).abs() <= epsilon || (u - last).abs() <= epsilon {
            continue;
        }
        let requested = add_mults.map_or(1, |m| m[i]);
        match merged_knots.iter().position(|k| (k - u).abs() <= epsilon) {
            Some(index) => {
                let current = merged_mults[index];
                let target = if add { current + requested } else { current.max(requested) };
                merged_mults[index] = target.min(degree);
            }
            None => {
                let index = merged_knots.partition_point(|k| *k < u);
                merged_knots.insert(index, u);
                merged_mults.insert(index, requested.min(degree));
            }
        }
    }

    let mut copies = Vec::new();
    let mut old = 0;
    for (&u, &target) in merged_knots.iter().zip(&merged_mults) {
        let current = if old < knots.len() && knots[old] == u {
            old += 1;
            mults[old - 1]
        } else {
            0
        };
        if target > current {
            copies.push((u, target - current));
        }
    }

    let keep: Vec<bool> = merged_mults.iter().map(|m| *m > 0).collect();
    let mut flags = keep.iter();
    merged_knots.retain(|_| flags.next().copied().unwrap_or(true));
    merged_mults.retain(|m| *m > 0);

    Ok(Insertion { knots: merged_knots, mults: merged_mults, copies })
}

/// Validates an insertion and returns the resulting `(nb_poles, nb_knots)`.
///
/// Additional knots must be non-decreasing and inside the defined range.
/// Knots closer than `epsilon` to an existing knot merge with it; the merged
/// multiplicity is the sum when `add` is set, the maximum otherwise, and is
/// capped at `degree`. Knots on the range ends are ignored, including the
/// wrap-around knot of a periodic curve.
#[allow(clippy::too_many_arguments)]
pub fn prepare_insert_knots(
    degree: usize,
    periodic: bool,
    knots: &[f64],
    mults: &[usize],
    add_knots: &[f64],
    add_mults: Option<&[usize]>,
    epsilon: f64,
    add: bool,
) -> Result<(usize, usize), TransformError> {
    let insertion = plan_insertion(degree, periodic, knots, mults, add_knots, add_mults, epsilon, add)
        .map_err(|error| refuse("knot insertion", error))?;
    Ok((knot::nb_poles(degree, periodic, &insertion.mults), insertion.knots.len()))
}

/// Inserts knots without changing the curve, see [`prepare_insert_knots`].
pub fn insert_knots<P: Coords>(
    curve: &CurveRef<'_, P>,
    add_knots: &[f64],
    add_mults: Option<&[usize]>,
    epsilon: f64,
    add: bool,
) -> Result<SplineData<P>, TransformError> {
    check_curve("knot insertion", curve)?;
    let insertion =
        plan_insertion(curve.degree, curve.periodic, curve.knots, curve.mults, add_knots, add_mults, epsilon, add)
            .map_err(|error| refuse("knot insertion", error))?;

    if !curve.periodic {
        let mut flat = FlatCurve::new(curve);
        for &(u, count) in &insertion.copies {
            for _ in 0..count {
                flat.insert(u);
            }
        }
        return Ok(flat.into_data());
    }

    let reach = window_reach(curve.degree, curve.poles.len());
    let period = knot::period(curve.knots);
    let mut window = FlatCurve::periodic_window(curve, reach);
    let (first, last) = window.range();
    for &(u, count) in &insertion.copies {
        for periods in -(reach as isize)..=reach as isize {
            let u = shifted(u, period, periods);
            if u > first && u < last {
                for _ in 0..count {
                    window.insert(u);
                }
            }
        }
    }
    Ok(window.into_periodic(curve.knots[0], insertion.knots, insertion.mults))
}

/// Periods kept on each side of the middle one, enough for the supports of
/// the middle poles to stay clear of the window ends.
fn window_reach(degree: usize, nb_poles: usize) -> usize {
    (degree + 1).div_ceil(nb_poles.max(1)) + 2
}

/// Inserts `mult` copies of one knot, adding to an existing knot at `u`.
pub fn insert_knot<P: Coords>(curve: &CurveRef<'_, P>, u: f64, mult: usize) -> Result<SplineData<P>, TransformError> {
    insert_knots(curve, &[u], Some(&[mult]), crate::KNOT_EPSILON, true)
}

/// Lowers the multiplicity of interior knot `index` to `mult` (0 drops it).
///
/// The bounds of every removed copy add up, and the total must stay within
/// `tolerance` of the curve in real coordinates. Otherwise nothing is
/// returned but that total. For a periodic curve the knot is removed once per
/// period and the wrap-around knot is not interior.
pub fn remove_knot<P: Coords>(
    curve: &CurveRef<'_, P>,
    index: usize,
    mult: usize,
    tolerance: f64,
) -> Result<SplineData<P>, TransformError> {
    const OPERATION: &str = "knot removal";
    check_curve(OPERATION, curve)?;
    let (first, last) = if curve.periodic {
        (0, curve.knots.len() - 1)
    } else {
        (knot::first_u_knot_index(curve.degree, curve.mults), knot::last_u_knot_index(curve.degree, curve.mults))
    };
    if index <= first || index >= last {
        return Err(refuse(OPERATION, TransformError::NotInterior { index }));
    }
    let current = curve.mults[index];
    if mult > current {
        return Err(refuse(OPERATION, TransformError::InvalidMultiplicity { index, requested: mult, current }));
    }
    let exceeded = |deviation| refuse(OPERATION, TransformError::ToleranceExceeded { deviation, tolerance });

    let mut spent = 0.0;
    if !curve.periodic {
        let mut flat = FlatCurve::new(curve);
        let mut last_copy = knot::flat_index(curve.degree, index, curve.mults, false);
        for _ in mult..current {
            let moved = flat.remove(last_copy, tolerance - spent).map_err(|moved| exceeded(spent + moved))?;
            spent += moved;
            last_copy -= 1;
        }
        return Ok(flat.into_data());
    }

    let p = curve.degree;
    let reach = window_reach(p, curve.poles.len());
    let period = knot::period(curve.knots);
    let mut window = FlatCurve::periodic_window(curve, reach);
    let (start, end) = window.range();
    let mut per_period = curve.poles.len();
    for _ in mult..current {
        per_period -= 1;
        let mut round: SmallVec<[f64; 8]> = SmallVec::new();
        for periods in -(reach as isize)..=reach as isize {
            let u = shifted(curve.knots[index], period, periods);
            if u <= start || u >= end {
                continue;
            }
            let last_copy = window.flat.partition_point(|k| *k <= u) - 1;
            round.push(window.remove(last_copy, tolerance - spent).map_err(|moved| exceeded(spent + moved))?);
        }
        // copies one period apart touch disjoint basis functions once a
        // period holds more than `degree` flat knots
        spent += if per_period > p { round.iter().copied().fold(0.0, f64::max) } else { round.iter().sum() };
        if spent > tolerance {
            return Err(exceeded(spent));
        }
    }

    let mut knots = curve.knots.to_vec();
    let mut mults = curve.mults.to_vec();
    if mult == 0 {
        knots.remove(index);
        mults.remove(index);
    } else {
        mults[index] = mult;
    }
    Ok(window.into_periodic(curve.knots[0], knots, mults))
}

/// Number of knots [`increase_degree`] returns.
pub fn increase_degree_count_knots(degree: usize, periodic: bool, mults: &[usize]) -> usize {
    if periodic {
        mults.len()
    } else {
        knot::last_u_knot_index(degree, mults) - knot::first_u_knot_index(degree, mults) + 1
    }
}

/// Raises the degree to `new_degree` without changing the curve.
///
/// A non-periodic result is clamped to the defined range: knots outside it
/// are dropped, both ends get multiplicity `new_degree + 1` and interior
/// multiplicities grow by the degree difference. A periodic curve stays
/// periodic and every multiplicity grows by the difference.
pub fn increase_degree<P: Coords>(curve: &CurveRef<'_, P>, new_degree: usize) -> Result<SplineData<P>, TransformError> {
    const OPERATION: &str = "degree elevation";
    check_curve(OPERATION, curve)?;
    check_degree(new_degree);
    if new_degree < curve.degree {
        return Err(refuse(OPERATION, TransformError::DegreeDecrease { requested: new_degree, current: curve.degree }));
    }
    let failed = |deviation| refuse(OPERATION, TransformError::ToleranceExceeded { deviation, tolerance: f64::INFINITY });

    if !curve.periodic {
        let mut flat = FlatCurve::new(curve);
        flat.trim(curve.first_parameter(), curve.last_parameter());
        flat.elevate(new_degree).map_err(failed)?;
        return Ok(flat.into_data());
    }

    let n = curve.poles.len();
    let margin = new_degree.div_ceil(n) + 1;
    let reach = margin + window_reach(curve.degree, n);
    let period = knot::period(curve.knots);
    let start = curve.knots[0];
    let mut window = FlatCurve::periodic_window(curve, reach);
    window.trim(shifted(start, period, -(margin as isize)), shifted(start, period, margin as isize + 1));
    window.elevate(new_degree).map_err(failed)?;

    let delta = new_degree - curve.degree;
    let mults = curve.mults.iter().map(|m| m + delta).collect();
    Ok(window.into_periodic(start, curve.knots.to_vec(), mults))
}

/// `(nb_poles, nb_knots)` of the non-periodic form of a periodic curve.
pub fn prepare_unperiodize(degree: usize, knots: &[f64], mults: &[usize]) -> (usize, usize) {
    let flat = knot::knot_sequence(knots, mults, degree, true);
    (flat.len() - degree - 1, knot::knots_length(&flat, degree, false))
}

/// Rewrites a periodic curve as an equivalent non-periodic one by repeating
/// the wrapped poles and knots. Non-periodic curves are returned as they are.
pub fn unperiodize<P: Coords>(curve: &CurveRef<'_, P>) -> Result<SplineData<P>, TransformError> {
    check_curve("unperiodization", curve)?;
    if !curve.periodic {
        return Ok(SplineData {
            degree: curve.degree,
            periodic: false,
            poles: curve.poles.to_vec(),
            weights: curve.weights.map(<[f64]>::to_vec),
            knots: curve.knots.to_vec(),
            mults: curve.mults.to_vec(),
        });
    }

    let flat = curve.flat_knots();
    let count = flat.len() - curve.degree - 1;
    let n = curve.poles.len();
    let poles = (0..count).map(|i| curve.poles[i % n]).collect();
    let weights = curve.weights.map(|w| (0..count).map(|i| w[i % n]).collect());
    let (knots, mults) = knot::knots_from_sequence(&flat, curve.degree, false);
    Ok(SplineData { degree: curve.degree, periodic: false, poles, weights, knots, mults })
}

fn trim_range(
    degree: usize,
    periodic: bool,
    knots: &[f64],
    mults: &[usize],
    u1: f64,
    u2: f64,
) -> Result<(f64, f64), TransformError> {
    let epsilon = crate::KNOT_EPSILON;
    let (first, last) = domain(degree, periodic, knots, mults);
    for value in [u1, u2] {
        if value < first - epsilon || value > last + epsilon {
            return Err(TransformError::OutOfRange { value, first, last });
        }
    }
    let (u1, u2) = (snap(knots, u1.max(first), epsilon), snap(knots, u2.min(last), epsilon));
    if u2 - u1 <= epsilon {
        return Err(TransformError::EmptyRange { u1, u2 });
    }
    Ok((u1, u2))
}

/// `(nb_poles, nb_knots)` of the curve restricted to `[u1, u2]`.
pub fn prepare_trimming(
    degree: usize,
    periodic: bool,
    knots: &[f64],
    mults: &[usize],
    u1: f64,
    u2: f64,
) -> Result<(usize, usize), TransformError> {
    if knot::nb_poles(degree, periodic, mults) == 0 || knots.len() != mults.len() {
        return Err(refuse("trimming", TransformError::Malformed));
    }
    let (u1, u2) = trim_range(degree, periodic, knots, mults, u1, u2).map_err(|error| refuse("trimming", error))?;
    let (inside, poles) = knots
        .iter()
        .zip(mults)
        .filter(|(k, _)| **k > u1 && **k < u2)
        .fold((0, degree + 1), |(count, poles), (_, m)| (count + 1, poles + m));
    Ok((poles, inside + 2))
}

/// Restricts the curve to `[u1, u2]`. Periodic curves are unperiodized first.
pub fn trimming<P: Coords>(curve: &CurveRef<'_, P>, u1: f64, u2: f64) -> Result<SplineData<P>, TransformError> {
    check_curve("trimming", curve)?;
    if curve.periodic {
        let open = unperiodize(curve)?;
        return trimming(&open.as_curve(), u1, u2);
    }
    let (u1, u2) = trim_range(curve.degree, false, curve.knots, curve.mults, u1, u2)
        .map_err(|error| refuse("trimming", error))?;

    let mut flat = FlatCurve::new(curve);
    flat.trim(u1, u2);
    Ok(flat.into_data())
}
