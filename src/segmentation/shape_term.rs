//! Per-pixel bounds of the object potential over a constraints box.
//!
//! For every shape inside a box and every pixel `p`, the potential
//! `φ(p) = max_e f(u_e(p))` (with `u_e` the capsule power of edge `e` and `f`
//! non-increasing) lies in `[lower(p), upper(p)]`:
//!
//! - `upper` comes from a lower bound on `u_e`. The center of the circle
//!   interpolated at `t` lies in the box `X(t) = (1 − t)·B1 + t·B2`, and for `t`
//!   in a sub-interval `[t_k, t_k+1]` it lies inside the bounding box of the
//!   two end boxes, with a radius of at most the larger end radius. Each such slab is
//!   expanded to the pixel lattice and clamped to the region, which keeps the
//!   bound valid for pixels of the region. The whole field is one generalized
//!   distance transform over the slabs painted with `−R²`.
//! - `lower` comes from an upper bound on `u_e`: at each sample `t_k` the
//!   farthest corner of `X(t_k)` with the smallest radius.
//!
//! Leaves carry the exact potential of their unique shape.
use crate::constraints::{Interval, ShapeConstraintsSet, VectorBox};
use crate::distance::GeneralizedDistanceTransform2D;
use crate::error::Result;
use crate::geom::{Point, Rect, Vector};
use crate::shape::Shape;

/// Potential bounds for every pixel of a region, row-major.
#[derive(Clone, Debug)]
pub struct ShapeTermBounds {
    region: Rect,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl ShapeTermBounds {
    /// Bounds collapsed onto the exact potential of `shape`.
    pub fn exact(shape: &Shape, region: Rect) -> Self {
        let mut values = Vec::with_capacity(region.area());
        for y in region.y..region.y + region.height as i32 {
            for x in region.x..region.x + region.width as i32 {
                values.push(shape.object_potential(&Vector::new(x as f64, y as f64)));
            }
        }
        Self {
            region,
            lower: values.clone(),
            upper: values,
        }
    }

    pub fn region(&self) -> Rect {
        self.region
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        (y - self.region.y) as usize * self.region.width + (x - self.region.x) as usize
    }

    pub fn lower(&self, x: i32, y: i32) -> f64 {
        self.lower[self.index(x, y)]
    }

    pub fn upper(&self, x: i32, y: i32) -> f64 {
        self.upper[self.index(x, y)]
    }

    pub fn lower_values(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper_values(&self) -> &[f64] {
        &self.upper
    }
}

/// Lattice box of center positions with the largest radius over one
/// sub-interval of an edge.
#[derive(Clone, Copy, Debug)]
struct Slab {
    x0: i32,
    x1: i32,
    y0: i32,
    y1: i32,
    radius_sq: f64,
}

impl Slab {
    fn power_lower_bound(&self, p: Point) -> f64 {
        let dx = axis_gap(p.x, self.x0, self.x1) as f64;
        let dy = axis_gap(p.y, self.y0, self.y1) as f64;
        dx * dx + dy * dy - self.radius_sq
    }
}

fn axis_gap(v: i32, lo: i32, hi: i32) -> i32 {
    if v < lo {
        lo - v
    } else if v > hi {
        v - hi
    } else {
        0
    }
}

/// Box of center positions at a sample `t_k` with the smallest radius there.
#[derive(Clone, Copy, Debug)]
struct Sample {
    centers: VectorBox,
    min_radius: f64,
}

impl Sample {
    fn power_upper_bound(&self, p: &Vector) -> f64 {
        let dx = (p.x - self.centers.x.lo).abs().max((p.x - self.centers.x.hi).abs());
        let dy = (p.y - self.centers.y.lo).abs().max((p.y - self.centers.y.hi).abs());
        dx * dx + dy * dy - self.min_radius * self.min_radius
    }
}

fn lerp(a: &Interval, b: &Interval, t: f64) -> Interval {
    Interval::new((1.0 - t) * a.lo + t * b.lo, (1.0 - t) * a.hi + t * b.hi)
}

fn clamp_axis(lo: f64, hi: f64, min: i32, max: i32) -> (i32, i32) {
    let lo = (lo.floor() as i32).clamp(min, max);
    let hi = (hi.ceil() as i32).clamp(min, max);
    (lo, hi)
}

fn slabs(constraints: &ShapeConstraintsSet, region: Rect, steps: usize) -> Vec<Slab> {
    let model = constraints.model();
    let boxes = constraints.vertex_constraints();
    let steps = steps.max(1);
    let mut out = Vec::with_capacity(model.edges().len() * steps);
    for edge in model.edges() {
        let (v1, v2) = (&boxes[edge.index1], &boxes[edge.index2]);
        let (b1, b2) = (v1.center_box(), v2.center_box());
        let (r1, r2) = (v1.max_radius() as f64, v2.max_radius() as f64);
        for k in 0..steps {
            let t0 = k as f64 / steps as f64;
            let t1 = (k + 1) as f64 / steps as f64;
            let (xa, xb) = (lerp(&b1.x, &b2.x, t0), lerp(&b1.x, &b2.x, t1));
            let (ya, yb) = (lerp(&b1.y, &b2.y, t0), lerp(&b1.y, &b2.y, t1));
            let (x0, x1) = clamp_axis(xa.lo.min(xb.lo), xa.hi.max(xb.hi), region.x, region.max_x());
            let (y0, y1) = clamp_axis(ya.lo.min(yb.lo), ya.hi.max(yb.hi), region.y, region.max_y());
            let radius = ((1.0 - t0) * r1 + t0 * r2).max((1.0 - t1) * r1 + t1 * r2);
            out.push(Slab {
                x0,
                x1,
                y0,
                y1,
                radius_sq: radius * radius,
            });
        }
    }
    out
}

fn samples(constraints: &ShapeConstraintsSet, steps: usize) -> Vec<Sample> {
    let model = constraints.model();
    let boxes = constraints.vertex_constraints();
    let steps = steps.max(1);
    let mut out = Vec::with_capacity(model.edges().len() * (steps + 1));
    for edge in model.edges() {
        let (v1, v2) = (&boxes[edge.index1], &boxes[edge.index2]);
        let (b1, b2) = (v1.center_box(), v2.center_box());
        let (r1, r2) = (v1.min_radius() as f64, v2.min_radius() as f64);
        for k in 0..=steps {
            let t = k as f64 / steps as f64;
            out.push(Sample {
                centers: VectorBox {
                    x: lerp(&b1.x, &b2.x, t),
                    y: lerp(&b1.y, &b2.y, t),
                },
                min_radius: (1.0 - t) * r1 + t * r2,
            });
        }
    }
    out
}

fn lowest_power_upper_bound(samples: &[Sample], p: &Vector) -> f64 {
    samples
        .iter()
        .map(|s| s.power_upper_bound(p))
        .fold(f64::INFINITY, f64::min)
}

/// `(lower, upper)` potential bounds at one pixel of `region` for every
/// shape in `constraints`, with `steps` sub-intervals per edge.
///
/// The bounds are valid for pixels inside `region`.
pub fn calculate_shape_term(
    constraints: &ShapeConstraintsSet,
    point: Point,
    region: Rect,
    steps: usize,
) -> Result<(f64, f64)> {
    if constraints.is_leaf() {
        let exact = constraints
            .midpoint_shape()?
            .object_potential(&point.to_vector());
        return Ok((exact, exact));
    }
    let model = constraints.model();
    let min_power = slabs(constraints, region, steps)
        .iter()
        .map(|s| s.power_lower_bound(point))
        .fold(f64::INFINITY, f64::min);
    let max_power = lowest_power_upper_bound(&samples(constraints, steps), &point.to_vector());
    Ok((
        model.object_potential_from_power(max_power),
        model.object_potential_from_power(min_power),
    ))
}

/// Potential bounds over the whole region, equal to [`calculate_shape_term`]
/// at every pixel.
pub fn calculate_shape_term_field(
    constraints: &ShapeConstraintsSet,
    region: Rect,
    steps: usize,
) -> Result<ShapeTermBounds> {
    if constraints.is_leaf() {
        return Ok(ShapeTermBounds::exact(&constraints.midpoint_shape()?, region));
    }
    let model = constraints.model();
    let width = region.width;
    let mut penalties = vec![f64::INFINITY; region.area()];
    if !region.is_empty() {
        for slab in slabs(constraints, region, steps) {
            for y in slab.y0..=slab.y1 {
                let row = (y - region.y) as usize * width;
                for x in slab.x0..=slab.x1 {
                    let cell = &mut penalties[row + (x - region.x) as usize];
                    *cell = cell.min(-slab.radius_sq);
                }
            }
        }
    }
    let origin = Point::new(region.x, region.y);
    let min_power =
        GeneralizedDistanceTransform2D::from_penalties(origin, width, region.height, 1.0, 1.0, penalties)?
            .into_values();

    let samples = samples(constraints, steps);
    let mut lower = Vec::with_capacity(region.area());
    let mut upper = Vec::with_capacity(region.area());
    for (i, &power) in min_power.iter().enumerate() {
        let x = region.x + (i % width) as i32;
        let y = region.y + (i / width) as i32;
        let max_power = lowest_power_upper_bound(&samples, &Vector::new(x as f64, y as f64));
        lower.push(model.object_potential_from_power(max_power));
        upper.push(model.object_potential_from_power(power));
    }
    Ok(ShapeTermBounds {
        region,
        lower,
        upper,
    })
}
