//! Dimension-free kernel for B-spline and Bezier curves, rational (NURBS) or not.
//!
//! The crate does not own curves. Callers keep their poles, weights, knots and
//! multiplicities and hand them in as a [`CurveRef`]; every operation either
//! evaluates that description or returns a new [`SplineData`] the caller swaps in.
//!
//! - [`knot`]: structured/flat knot conversion, span location, distribution analysis.
//! - [`eval`]: Boor and Bohm evaluation, derivatives, basis functions.
//! - [`cache`]: per-span Taylor coefficients for fast repeated evaluation.
//! - [`transform`]: knot insertion and removal, degree elevation, unperiodization, trimming.
//! - [`banded`] and [`interpolate`]: banded collocation systems and curve construction.
//!
//! # Example
//! ```
//! use assert_approx_eq::assert_approx_eq;
//! use bspline_kernel::CurveRef;
//! use nalgebra::Vector2;
//!
//! let poles = [
//!     Vector2::new(0.0, 0.0),
//!     Vector2::new(1.0, 2.0),
//!     Vector2::new(2.0, -1.0),
//!     Vector2::new(3.0, 0.0),
//! ];
//! let curve = CurveRef::bezier(&poles);
//!
//! let start = curve.d0(0.0);
//! let end = curve.d0(1.0);
//! assert_approx_eq!(start.x, 0.0, 1e-12);
//! assert_approx_eq!(end.x, 3.0, 1e-12);
//! ```

pub mod banded;
pub mod cache;
pub mod eval;
pub mod interpolate;
pub mod knot;
pub mod pole;
pub mod transform;

mod polynomial;

pub use cache::SpanCache;
pub use eval::ExtrapMode;
pub use interpolate::InterpolationError;
pub use knot::{KnotDistribution, MultDistribution};
pub use pole::{Coords, CurveRef, SplineData};
pub use transform::TransformError;

/// Highest polynomial degree accepted by the kernel.
pub const MAX_DEGREE: usize = 25;

/// Two knots closer than this are the same knot when merging or analysing distributions.
pub const KNOT_EPSILON: f64 = 1e-12;

/// Relative size under which a banded LU pivot counts as vanished.
pub const PIVOT_EPSILON: f64 = 1e-14;

/// Default spread under which a set of weights is treated as constant.
pub const WEIGHT_EPSILON: f64 = 1e-12;

pub(crate) fn check_degree(degree: usize) {
    assert!(
        degree <= MAX_DEGREE,
        "degree {degree} exceeds the maximum supported degree {MAX_DEGREE}"
    );
}
