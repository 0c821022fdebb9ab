//! Geometric primitives: vectors, lattice points, circles and rectangles.
//!
//! `Vector` is nalgebra's `Vector2<f64>`; it already provides addition,
//! subtraction, scalar multiplication, `dot` and `norm_squared`. The helpers
//! below fill the few gaps used across the crate.
use crate::error::{Error, Result};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type Vector = Vector2<f64>;

/// Squared Euclidean distance between two vectors.
#[inline]
pub fn distance_sq(a: &Vector, b: &Vector) -> f64 {
    (a - b).norm_squared()
}

/// Integer position on the pixel lattice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn to_vector(self) -> Vector {
        Vector::new(self.x as f64, self.y as f64)
    }
}

/// Axis-aligned pixel rectangle `[x, x + width) × [y, y + height)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Last column covered by the rectangle (inclusive).
    pub fn max_x(&self) -> i32 {
        last_index(self.x, self.width)
    }

    /// Last row covered by the rectangle (inclusive).
    pub fn max_y(&self) -> i32 {
        last_index(self.y, self.height)
    }

    pub fn contains(&self, p: Point) -> bool {
        !self.is_empty()
            && p.x >= self.x
            && p.y >= self.y
            && p.x <= self.max_x()
            && p.y <= self.max_y()
    }

    /// Scales origin and size, truncating like the integer casts of a
    /// downscaled image.
    pub fn scaled(&self, scale: f64) -> Self {
        Self {
            x: (self.x as f64 * scale) as i32,
            y: (self.y as f64 * scale) as i32,
            width: (self.width as f64 * scale) as usize,
            height: (self.height as f64 * scale) as usize,
        }
    }
}

/// `start + len - 1`, saturated to the `i32` range.
fn last_index(start: i32, len: usize) -> i32 {
    let last = i64::from(start) + i64::try_from(len).unwrap_or(i64::MAX) - 1;
    last.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vector,
    radius: f64,
}

impl Circle {
    pub fn new(center: Vector, radius: f64) -> Result<Self> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(Error::InvalidRadius(radius));
        }
        Ok(Self { center, radius })
    }

    pub fn from_xyr(x: f64, y: f64, radius: f64) -> Result<Self> {
        Self::new(Vector::new(x, y), radius)
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// `true` when `other` lies entirely inside this circle.
    pub fn contains_circle(&self, other: &Circle) -> bool {
        let dr = self.radius - other.radius;
        other.radius <= self.radius && distance_sq(&other.center, &self.center) <= dr * dr
    }

    pub fn contains_point(&self, point: &Vector) -> bool {
        distance_sq(point, &self.center) <= self.radius * self.radius
    }

    /// Power of `point` with respect to the circle: negative inside, zero on
    /// the boundary.
    #[inline]
    pub fn power(&self, point: &Vector) -> f64 {
        distance_sq(point, &self.center) - self.radius * self.radius
    }
}

impl fmt::Display for Circle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "C=({:.2}, {:.2}) R={:.2}",
            self.center.x, self.center.y, self.radius
        )
    }
}
