//! Axis-aligned boxes over shape parameters.
//!
//! A [`VertexConstraints`] restricts one vertex circle to integer center
//! ranges and an integer radius range; a [`ShapeConstraintsSet`] holds one
//! such box per model vertex, so the whole set is a box in a
//! `3 × vertex_count` dimensional lattice. Boxes are split by halving one
//! range; a box where every range holds a single value is a *leaf* and
//! stands for exactly one concrete [`Shape`].
//!
//! The prior lower bound uses interval arithmetic on edge vectors: the edge
//! vector of `(i, j)` ranges over the Minkowski difference of the two center
//! boxes, which is again a box. Lengths, direction angles and length ratios
//! of such boxes are bounded in closed form.
use crate::angle::{angular_distance_to_interval, direction, wrap_angle};
use crate::error::{Error, Result};
use crate::geom::{Circle, Point, Rect, Vector};
use crate::model::{ShapeModel, LENGTH_EPS};
use crate::shape::Shape;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Closed interval `[lo, hi]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    pub fn new(lo: f64, hi: f64) -> Self {
        debug_assert!(lo <= hi, "inverted interval [{lo}, {hi}]");
        Self { lo, hi }
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    pub fn mid(&self) -> f64 {
        0.5 * (self.lo + self.hi)
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.lo && v <= self.hi
    }

    /// Point of the interval closest to `v`.
    pub fn clamp(&self, v: f64) -> f64 {
        v.clamp(self.lo, self.hi)
    }

    /// Distance from zero to the interval.
    fn abs_min(&self) -> f64 {
        if self.lo > 0.0 {
            self.lo
        } else if self.hi < 0.0 {
            -self.hi
        } else {
            0.0
        }
    }

    fn abs_max(&self) -> f64 {
        self.lo.abs().max(self.hi.abs())
    }
}

/// Box of 2D vectors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VectorBox {
    pub x: Interval,
    pub y: Interval,
}

impl VectorBox {
    pub fn contains_origin(&self) -> bool {
        self.x.contains(0.0) && self.y.contains(0.0)
    }

    pub fn corners(&self) -> [Vector; 4] {
        [
            Vector::new(self.x.lo, self.y.lo),
            Vector::new(self.x.hi, self.y.lo),
            Vector::new(self.x.lo, self.y.hi),
            Vector::new(self.x.hi, self.y.hi),
        ]
    }

    /// Range of vector lengths.
    pub fn norm_range(&self) -> Interval {
        let lo = self.x.abs_min().hypot(self.y.abs_min());
        let hi = self.x.abs_max().hypot(self.y.abs_max());
        Interval::new(lo, hi)
    }

    /// Range of direction angles, unwrapped around the box center direction.
    /// `None` when the box contains the origin and every direction is possible.
    pub fn angle_range(&self) -> Option<Interval> {
        if self.contains_origin() {
            return None;
        }
        let reference = direction(&Vector::new(self.x.mid(), self.y.mid()));
        let mut lo = 0.0f64;
        let mut hi = 0.0f64;
        for corner in self.corners() {
            let d = wrap_angle(direction(&corner) - reference);
            lo = lo.min(d);
            hi = hi.max(d);
        }
        Some(Interval::new(reference + lo, reference + hi))
    }
}

/// Parameter axis of a vertex box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Radius,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Radius];

    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Radius => "radius",
        }
    }
}

/// Integer box for one vertex circle. All bounds are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexConstraints {
    min_center: Point,
    max_center: Point,
    min_radius: i32,
    max_radius: i32,
}

impl VertexConstraints {
    pub fn new(min_center: Point, max_center: Point, min_radius: i32, max_radius: i32) -> Result<Self> {
        if min_center.x > max_center.x || min_center.y > max_center.y {
            return Err(Error::InvalidConstraints(format!(
                "center range {min_center:?}..{max_center:?} is empty"
            )));
        }
        if min_radius < 0 || min_radius > max_radius {
            return Err(Error::InvalidConstraints(format!(
                "radius range {min_radius}..{max_radius} is empty or negative"
            )));
        }
        Ok(Self {
            min_center,
            max_center,
            min_radius,
            max_radius,
        })
    }

    /// Leaf box holding a single circle.
    pub fn fixed(center: Point, radius: i32) -> Result<Self> {
        Self::new(center, center, radius, radius)
    }

    pub fn min_center(&self) -> Point {
        self.min_center
    }

    pub fn max_center(&self) -> Point {
        self.max_center
    }

    pub fn min_radius(&self) -> i32 {
        self.min_radius
    }

    pub fn max_radius(&self) -> i32 {
        self.max_radius
    }

    fn range(&self, axis: Axis) -> (i32, i32) {
        match axis {
            Axis::X => (self.min_center.x, self.max_center.x),
            Axis::Y => (self.min_center.y, self.max_center.y),
            Axis::Radius => (self.min_radius, self.max_radius),
        }
    }

    /// Number of values in the range minus one.
    pub fn width(&self, axis: Axis) -> u32 {
        let (lo, hi) = self.range(axis);
        hi.abs_diff(lo)
    }

    pub fn is_leaf(&self) -> bool {
        Axis::ALL.iter().all(|&a| self.width(a) == 0)
    }

    pub fn x_range(&self) -> Interval {
        Interval::new(self.min_center.x as f64, self.max_center.x as f64)
    }

    pub fn y_range(&self) -> Interval {
        Interval::new(self.min_center.y as f64, self.max_center.y as f64)
    }

    pub fn radius_range(&self) -> Interval {
        Interval::new(self.min_radius as f64, self.max_radius as f64)
    }

    pub fn center_box(&self) -> VectorBox {
        VectorBox {
            x: self.x_range(),
            y: self.y_range(),
        }
    }

    /// Halves one range: `[lo, mid]` and `[mid + 1, hi]`.
    pub fn split(&self, axis: Axis) -> Option<(Self, Self)> {
        let (lo, hi) = self.range(axis);
        if lo >= hi {
            return None;
        }
        let mid = lattice_mid(lo, hi);
        let mut first = *self;
        let mut second = *self;
        match axis {
            Axis::X => {
                first.max_center.x = mid;
                second.min_center.x = mid + 1;
            }
            Axis::Y => {
                first.max_center.y = mid;
                second.min_center.y = mid + 1;
            }
            Axis::Radius => {
                first.max_radius = mid;
                second.min_radius = mid + 1;
            }
        }
        Some((first, second))
    }

    /// Circle at the (floor) midpoint of every range.
    pub fn midpoint(&self) -> Result<Circle> {
        let mid = |(lo, hi): (i32, i32)| lattice_mid(lo, hi) as f64;
        Circle::from_xyr(
            mid(self.range(Axis::X)),
            mid(self.range(Axis::Y)),
            mid(self.range(Axis::Radius)),
        )
    }

    pub fn contains(&self, circle: &Circle) -> bool {
        self.x_range().contains(circle.center.x)
            && self.y_range().contains(circle.center.y)
            && self.radius_range().contains(circle.radius())
    }
}

/// One vertex box per model vertex.
#[derive(Clone, Debug)]
pub struct ShapeConstraintsSet {
    model: Arc<ShapeModel>,
    vertices: Vec<VertexConstraints>,
}

impl ShapeConstraintsSet {
    pub fn create(model: Arc<ShapeModel>, vertices: Vec<VertexConstraints>) -> Result<Self> {
        if vertices.len() != model.vertex_count() {
            return Err(Error::ConstraintCount {
                expected: model.vertex_count(),
                actual: vertices.len(),
            });
        }
        Ok(Self { model, vertices })
    }

    /// Root box: every vertex anywhere inside `rect`, radius in `[min_radius, max_radius]`.
    pub fn spanning(model: Arc<ShapeModel>, rect: Rect, min_radius: i32, max_radius: i32) -> Result<Self> {
        if rect.is_empty() {
            return Err(Error::InvalidConstraints("empty location".to_string()));
        }
        let vc = VertexConstraints::new(
            Point::new(rect.x, rect.y),
            Point::new(rect.max_x(), rect.max_y()),
            min_radius,
            max_radius,
        )?;
        let n = model.vertex_count();
        Self::create(model, vec![vc; n])
    }

    pub fn model(&self) -> &Arc<ShapeModel> {
        &self.model
    }

    pub fn vertex_constraints(&self) -> &[VertexConstraints] {
        &self.vertices
    }

    pub fn is_leaf(&self) -> bool {
        self.vertices.iter().all(VertexConstraints::is_leaf)
    }

    /// Widest range over all vertices and axes; ties go to the lowest vertex,
    /// then x, y, radius. `None` for leaves.
    pub fn widest_dimension(&self) -> Option<(usize, Axis)> {
        let mut best: Option<(usize, Axis, u32)> = None;
        for (i, vc) in self.vertices.iter().enumerate() {
            for axis in Axis::ALL {
                let w = vc.width(axis);
                if w > 0 && best.map_or(true, |(_, _, bw)| w > bw) {
                    best = Some((i, axis, w));
                }
            }
        }
        best.map(|(i, a, _)| (i, a))
    }

    /// Splits the range of `axis` of one vertex into two disjoint halves.
    pub fn split(&self, vertex: usize, axis: Axis) -> Result<(Self, Self)> {
        let (a, b) = self.vertices[vertex]
            .split(axis)
            .ok_or(Error::DegenerateSplit {
                vertex,
                axis: axis.name(),
            })?;
        let mut first = self.clone();
        let mut second = self.clone();
        first.vertices[vertex] = a;
        second.vertices[vertex] = b;
        Ok((first, second))
    }

    /// Concrete shape at the midpoint of the box; the unique shape of a leaf.
    pub fn midpoint_shape(&self) -> Result<Shape> {
        let circles = self
            .vertices
            .iter()
            .map(VertexConstraints::midpoint)
            .collect::<Result<Vec<_>>>()?;
        Shape::new(self.model.clone(), circles)
    }

    pub fn contains_shape(&self, shape: &Shape) -> bool {
        shape.vertices().len() == self.vertices.len()
            && self
                .vertices
                .iter()
                .zip(shape.vertices())
                .all(|(vc, c)| vc.contains(c))
    }

    /// Box of possible vectors of an edge (second center minus first).
    pub fn edge_vector_box(&self, edge: usize) -> VectorBox {
        let e = self.model.edges()[edge];
        let b1 = self.vertices[e.index1].center_box();
        let b2 = self.vertices[e.index2].center_box();
        VectorBox {
            x: Interval::new(b2.x.lo - b1.x.hi, b2.x.hi - b1.x.lo),
            y: Interval::new(b2.y.lo - b1.y.hi, b2.y.hi - b1.y.lo),
        }
    }

    /// Lower bound of the prior energy over every shape in the box; exact
    /// for leaves.
    pub fn shape_energy_lower_bound(&self) -> Result<f64> {
        if self.is_leaf() {
            return Ok(self.midpoint_shape()?.prior_energy());
        }
        let model = &self.model;
        let body = self.edge_vector_box(model.reference_edge()).norm_range();
        let body_lo = body.lo.max(LENGTH_EPS);
        let body_hi = body.hi.max(LENGTH_EPS);

        let mut result = 0.0;
        for (i, vc) in self.vertices.iter().enumerate() {
            let params = model.vertex_params(i);
            let radius = vc.radius_range();
            let ratio = Interval::new(radius.lo / body_hi, radius.hi / body_lo);
            let closest = ratio.clamp(params.radius_to_length_ratio);
            result += model.calculate_vertex_energy_term(i, 1.0, closest);
        }

        for (first, second) in model.constrained_edge_pairs() {
            let Some(params) = model.edge_pair_params(first, second) else {
                continue;
            };
            let v1 = self.edge_vector_box(first);
            let v2 = self.edge_vector_box(second);

            let angle_diff = match (v1.angle_range(), v2.angle_range()) {
                (Some(a1), Some(a2)) => {
                    angular_distance_to_interval(a2.lo - a1.hi, a2.hi - a1.lo, params.mean_angle)
                }
                _ => 0.0,
            };

            let n1 = v1.norm_range();
            let n2 = v2.norm_range();
            let ratio = Interval::new(
                n2.lo / n1.hi.max(LENGTH_EPS),
                n2.hi / n1.lo.max(LENGTH_EPS),
            );
            result += params.energy(angle_diff, ratio.clamp(params.mean_length_ratio));
        }
        Ok(result)
    }
}

/// Floor of `(lo + hi) / 2` for `lo <= hi`, without overflowing.
#[inline]
fn lattice_mid(lo: i32, hi: i32) -> i32 {
    lo + (hi.abs_diff(lo) / 2) as i32
}
