//! Generalized distance transform over a rectangular lattice.
//!
//! For every cell `p` of the grid the transform computes
//!
//! ```text
//! D(p) = min_q  penalty(q) + scale_x · (p.x − q.x)² + scale_y · (p.y − q.y)²
//! ```
//!
//! in time linear in the number of cells: the squared distance is separable,
//! so a one-dimensional lower-envelope scan over rows followed by one over
//! columns gives the exact result.
//!
//! Non-finite penalties mark forbidden cells and never enter an envelope. A
//! line without any finite cell produces `+∞` everywhere, so forbidden
//! regions never turn into NaN.
use crate::error::{Error, Result};
use crate::geom::Point;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Clone, Debug)]
pub struct GeneralizedDistanceTransform2D {
    origin: Point,
    width: usize,
    height: usize,
    values: Vec<f64>,
}

impl GeneralizedDistanceTransform2D {
    /// Builds the transform of `penalty`, evaluated at the absolute lattice
    /// coordinates of every cell of `[origin, origin + size)`.
    pub fn new<F>(
        origin: Point,
        width: usize,
        height: usize,
        scale_x: f64,
        scale_y: f64,
        penalty: F,
    ) -> Result<Self>
    where
        F: Fn(i32, i32) -> f64,
    {
        let mut penalties = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                penalties.push(penalty(origin.x + x as i32, origin.y + y as i32));
            }
        }
        Self::from_penalties(origin, width, height, scale_x, scale_y, penalties)
    }

    /// Builds the transform of a row-major penalty buffer.
    pub fn from_penalties(
        origin: Point,
        width: usize,
        height: usize,
        scale_x: f64,
        scale_y: f64,
        mut penalties: Vec<f64>,
    ) -> Result<Self> {
        if !(scale_x > 0.0 && scale_x.is_finite() && scale_y > 0.0 && scale_y.is_finite()) {
            return Err(Error::InvalidScale(scale_x, scale_y));
        }
        if penalties.len() != width * height {
            return Err(Error::SizeMismatch {
                what: "distance transform penalties",
                expected: width * height,
                actual: penalties.len(),
            });
        }
        if width > 0 && height > 0 {
            transform_rows(&mut penalties, width, scale_x);
            let mut transposed = transpose(&penalties, width, height);
            transform_rows(&mut transposed, height, scale_y);
            penalties = transpose(&transposed, height, width);
        }
        Ok(Self {
            origin,
            width,
            height,
            values: penalties,
        })
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Value at absolute lattice coordinates.
    ///
    /// # Panics
    /// If `(x, y)` lies outside the grid.
    #[inline]
    pub fn value(&self, x: i32, y: i32) -> f64 {
        let lx = (x - self.origin.x) as usize;
        let ly = (y - self.origin.y) as usize;
        assert!(
            lx < self.width && ly < self.height,
            "({x}, {y}) outside distance transform grid"
        );
        self.values[ly * self.width + lx]
    }

    /// Row-major values, `width` per row.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

fn transpose(data: &[f64], width: usize, height: usize) -> Vec<f64> {
    let mut out = vec![0.0; data.len()];
    for y in 0..height {
        for x in 0..width {
            out[x * height + y] = data[y * width + x];
        }
    }
    out
}

fn transform_rows(data: &mut [f64], width: usize, scale: f64) {
    #[cfg(feature = "parallel")]
    {
        data.par_chunks_mut(width).for_each_init(
            || EnvelopeScratch::with_capacity(width),
            |scratch, line| scratch.transform(line, scale),
        );
    }
    #[cfg(not(feature = "parallel"))]
    {
        let mut scratch = EnvelopeScratch::with_capacity(width);
        for line in data.chunks_mut(width) {
            scratch.transform(line, scale);
        }
    }
}

/// Buffers of the one-dimensional lower-envelope scan, reused across lines.
struct EnvelopeScratch {
    input: Vec<f64>,
    // parabola apexes and the boundaries between consecutive parabolas
    apex: Vec<usize>,
    bounds: Vec<f64>,
}

impl EnvelopeScratch {
    fn with_capacity(n: usize) -> Self {
        Self {
            input: Vec::with_capacity(n),
            apex: Vec::with_capacity(n),
            bounds: Vec::with_capacity(n + 1),
        }
    }

    /// In-place `line[p] = min_q line[q] + scale · (p − q)²`.
    fn transform(&mut self, line: &mut [f64], scale: f64) {
        self.input.clear();
        self.input.extend_from_slice(line);
        self.apex.clear();
        self.bounds.clear();

        let f = &self.input;
        let intersect = |q: usize, r: usize| -> f64 {
            let (qf, rf) = (q as f64, r as f64);
            ((f[q] + scale * qf * qf) - (f[r] + scale * rf * rf)) / (2.0 * scale * (qf - rf))
        };

        for q in (0..f.len()).filter(|&q| f[q].is_finite()) {
            if self.apex.is_empty() {
                self.apex.push(q);
                self.bounds.push(f64::NEG_INFINITY);
                continue;
            }
            let mut s = intersect(q, self.apex[self.apex.len() - 1]);
            while s <= self.bounds[self.bounds.len() - 1] {
                self.apex.pop();
                self.bounds.pop();
                s = intersect(q, self.apex[self.apex.len() - 1]);
            }
            self.apex.push(q);
            self.bounds.push(s);
        }

        if self.apex.is_empty() {
            line.fill(f64::INFINITY);
            return;
        }

        let mut k = 0;
        for (p, out) in line.iter_mut().enumerate() {
            let pf = p as f64;
            while k + 1 < self.apex.len() && self.bounds[k + 1] < pf {
                k += 1;
            }
            let q = self.apex[k];
            let d = pf - q as f64;
            *out = scale * d * d + f[q];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn brute_force(
        penalties: &[f64],
        width: usize,
        height: usize,
        sx: f64,
        sy: f64,
    ) -> Vec<f64> {
        let mut out = vec![f64::INFINITY; width * height];
        for py in 0..height {
            for px in 0..width {
                let mut best = f64::INFINITY;
                for qy in 0..height {
                    for qx in 0..width {
                        let pen = penalties[qy * width + qx];
                        if !pen.is_finite() {
                            continue;
                        }
                        let dx = px as f64 - qx as f64;
                        let dy = py as f64 - qy as f64;
                        best = best.min(pen + sx * dx * dx + sy * dy * dy);
                    }
                }
                out[py * width + px] = best;
            }
        }
        out
    }

    #[test]
    fn single_zero_cell_gives_scaled_squared_distance() {
        let origin = Point::new(-3, 5);
        let (sx, sy) = (1.5, 0.5);
        let dt = GeneralizedDistanceTransform2D::new(origin, 9, 7, sx, sy, |x, y| {
            if (x, y) == (1, 8) {
                0.0
            } else {
                f64::INFINITY
            }
        })
        .unwrap();
        for y in 5..12 {
            for x in -3..6 {
                let dx = (x - 1) as f64;
                let dy = (y - 8) as f64;
                let expected = sx * dx * dx + sy * dy * dy;
                assert!(
                    (dt.value(x, y) - expected).abs() < 1e-9,
                    "({x}, {y}): {} vs {expected}",
                    dt.value(x, y)
                );
            }
        }
    }

    #[test]
    fn radially_symmetric_penalty_gives_symmetric_output() {
        let n = 11;
        let c = (n / 2) as i32;
        let dt = GeneralizedDistanceTransform2D::new(Point::new(0, 0), n, n, 1.0, 1.0, |x, y| {
            let r2 = ((x - c).pow(2) + (y - c).pow(2)) as f64;
            if r2 <= 4.0 {
                -(4.0 - r2)
            } else {
                f64::INFINITY
            }
        })
        .unwrap();
        for y in 0..n as i32 {
            for x in 0..n as i32 {
                let v = dt.value(x, y);
                let mirrored = [
                    dt.value(2 * c - x, y),
                    dt.value(x, 2 * c - y),
                    dt.value(y, x),
                ];
                for m in mirrored {
                    assert!((v - m).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn matches_brute_force_on_random_fields() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let width = rng.gen_range(1..12);
            let height = rng.gen_range(1..12);
            let sx = rng.gen_range(0.1..3.0);
            let sy = rng.gen_range(0.1..3.0);
            let penalties: Vec<f64> = (0..width * height)
                .map(|_| {
                    if rng.gen_bool(0.3) {
                        f64::INFINITY
                    } else {
                        rng.gen_range(-50.0..50.0)
                    }
                })
                .collect();
            let expected = brute_force(&penalties, width, height, sx, sy);
            let dt = GeneralizedDistanceTransform2D::from_penalties(
                Point::new(0, 0),
                width,
                height,
                sx,
                sy,
                penalties,
            )
            .unwrap();
            for (got, want) in dt.values().iter().zip(&expected) {
                if want.is_infinite() {
                    assert!(got.is_infinite());
                } else {
                    assert!((got - want).abs() < 1e-6, "{got} vs {want}");
                }
            }
        }
    }

    #[test]
    fn all_forbidden_yields_infinity_not_nan() {
        let dt = GeneralizedDistanceTransform2D::new(Point::new(0, 0), 4, 3, 1.0, 1.0, |_, _| {
            f64::INFINITY
        })
        .unwrap();
        assert!(dt.values().iter().all(|v| *v == f64::INFINITY));

        let nan_cells = GeneralizedDistanceTransform2D::new(Point::new(0, 0), 3, 1, 1.0, 1.0, |x, _| {
            if x == 0 {
                f64::NAN
            } else {
                2.0
            }
        })
        .unwrap();
        assert_eq!(nan_cells.values(), &[3.0, 2.0, 2.0]);
    }

    #[test]
    fn rejects_invalid_scales_and_sizes() {
        for (sx, sy) in [(0.0, 1.0), (1.0, -1.0), (f64::NAN, 1.0), (1.0, f64::INFINITY)] {
            assert!(matches!(
                GeneralizedDistanceTransform2D::new(Point::new(0, 0), 2, 2, sx, sy, |_, _| 0.0),
                Err(Error::InvalidScale(..))
            ));
        }
        assert!(GeneralizedDistanceTransform2D::from_penalties(
            Point::new(0, 0),
            2,
            2,
            1.0,
            1.0,
            vec![0.0; 3]
        )
        .is_err());
        let empty =
            GeneralizedDistanceTransform2D::new(Point::new(0, 0), 0, 5, 1.0, 1.0, |_, _| 0.0)
                .unwrap();
        assert!(empty.values().is_empty());
    }
}
