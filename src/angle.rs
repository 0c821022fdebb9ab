//! Angle utilities used by the edge-pair prior and its interval bounds.
use crate::geom::Vector;
use std::f64::consts::{PI, TAU};

/// Wraps an angle into the range (−π, π].
#[inline]
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Signed angle (radians, in (−π, π]) rotating `a` onto `b`.
/// Zero when either vector is zero.
#[inline]
pub fn signed_angle_between(a: &Vector, b: &Vector) -> f64 {
    let cross = a.x * b.y - a.y * b.x;
    let dot = a.dot(b);
    cross.atan2(dot)
}

/// Direction angle of a vector, in (−π, π].
#[inline]
pub fn direction(v: &Vector) -> f64 {
    v.y.atan2(v.x)
}

/// Smallest unsigned angular distance from `target` to any angle in the
/// closed interval `[lo, hi]`, measured modulo 2π. Returns a value in [0, π].
pub fn angular_distance_to_interval(lo: f64, hi: f64, target: f64) -> f64 {
    debug_assert!(lo <= hi);
    if hi - lo >= TAU {
        return 0.0;
    }
    let k = ((lo - target) / TAU).ceil();
    if target + k * TAU <= hi {
        return 0.0;
    }
    wrap_angle(lo - target)
        .abs()
        .min(wrap_angle(hi - target).abs())
}
