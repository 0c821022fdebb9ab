//! Immutable shape model: skeleton graph plus prior-energy parameters.
//!
//! A model describes a skeleton of circular joints (vertices) connected by
//! directed edges ("bones"). Its energy terms are pure functions:
//!
//! - vertex terms penalise radii that deviate from the expected fraction of
//!   the body length (the length of the reference edge);
//! - edge-pair terms penalise deviations of the relative angle and length
//!   ratio between two edge vectors, for the constrained subset of pairs;
//! - the object potential of an edge measures how strongly a point lies in
//!   the tapered capsule swept between the two endpoint circles.
//!
//! Models are built once, validated, and shared behind an [`Arc`] by every
//! shape and constraints set derived from them.
use crate::angle::{signed_angle_between, wrap_angle};
use crate::error::{Error, Result};
use crate::geom::{Circle, Vector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Lengths below this value are treated as this value when dividing.
pub(crate) const LENGTH_EPS: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeEdge {
    pub index1: usize,
    pub index2: usize,
}

impl ShapeEdge {
    pub const fn new(index1: usize, index2: usize) -> Self {
        Self { index1, index2 }
    }
}

/// Per-vertex radius prior.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeVertexParams {
    /// Expected radius as a fraction of the body length.
    pub radius_to_length_ratio: f64,
    /// Tolerance of the ratio; must be positive.
    pub radius_to_length_deviation: f64,
}

impl ShapeVertexParams {
    pub const fn new(radius_to_length_ratio: f64, radius_to_length_deviation: f64) -> Self {
        Self {
            radius_to_length_ratio,
            radius_to_length_deviation,
        }
    }
}

/// Pose prior for a constrained pair of edges.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeEdgePairParams {
    /// Expected signed angle (radians) from the first edge vector to the second.
    pub mean_angle: f64,
    /// Expected `|second| / |first|`.
    pub mean_length_ratio: f64,
    pub angle_deviation: f64,
    pub length_ratio_deviation: f64,
}

impl ShapeEdgePairParams {
    pub const fn new(
        mean_angle: f64,
        mean_length_ratio: f64,
        angle_deviation: f64,
        length_ratio_deviation: f64,
    ) -> Self {
        Self {
            mean_angle,
            mean_length_ratio,
            angle_deviation,
            length_ratio_deviation,
        }
    }

    /// Energy for an angle deviation (already wrapped) and a length ratio.
    #[inline]
    pub(crate) fn energy(&self, angle_diff: f64, length_ratio: f64) -> f64 {
        let a = angle_diff / self.angle_deviation;
        let l = (length_ratio - self.mean_length_ratio) / self.length_ratio_deviation;
        a * a + l * l
    }
}

/// Serializable description of a model, validated by [`ShapeModel::from_description`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShapeModelDescription {
    pub edges: Vec<ShapeEdge>,
    pub vertex_params: Vec<ShapeVertexParams>,
    #[serde(default)]
    pub edge_pairs: Vec<EdgePairEntry>,
    #[serde(default)]
    pub reference_edge: usize,
    #[serde(default = "default_background_distance_coeff")]
    pub background_distance_coeff: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EdgePairEntry {
    pub first: usize,
    pub second: usize,
    pub params: ShapeEdgePairParams,
}

fn default_background_distance_coeff() -> f64 {
    ShapeModel::DEFAULT_BACKGROUND_DISTANCE_COEFF
}

#[derive(Debug)]
pub struct ShapeModel {
    vertex_count: usize,
    edges: Vec<ShapeEdge>,
    vertex_params: Vec<ShapeVertexParams>,
    edge_pair_params: BTreeMap<(usize, usize), ShapeEdgePairParams>,
    reference_edge: usize,
    background_distance_coeff: f64,
}

impl ShapeModel {
    pub const DEFAULT_BACKGROUND_DISTANCE_COEFF: f64 = 0.05;

    /// Validates and builds a model with edge 0 as the reference edge and the
    /// default potential decay.
    ///
    /// Edge-pair keys use ascending edge ids: the parameters of `(a, b)`
    /// describe edge `b` relative to edge `a`.
    pub fn create(
        edges: Vec<ShapeEdge>,
        vertex_params: Vec<ShapeVertexParams>,
        edge_pair_params: BTreeMap<(usize, usize), ShapeEdgePairParams>,
    ) -> Result<Arc<Self>> {
        Self::with_options(
            edges,
            vertex_params,
            edge_pair_params,
            0,
            Self::DEFAULT_BACKGROUND_DISTANCE_COEFF,
        )
    }

    pub fn with_options(
        edges: Vec<ShapeEdge>,
        vertex_params: Vec<ShapeVertexParams>,
        edge_pair_params: BTreeMap<(usize, usize), ShapeEdgePairParams>,
        reference_edge: usize,
        background_distance_coeff: f64,
    ) -> Result<Arc<Self>> {
        if edges.is_empty() {
            return Err(Error::NoEdges);
        }
        let vertex_count = edges
            .iter()
            .map(|e| e.index1.max(e.index2) + 1)
            .max()
            .unwrap_or(0);
        if vertex_params.len() != vertex_count {
            return Err(Error::VertexParamCount {
                expected: vertex_count,
                actual: vertex_params.len(),
            });
        }
        for (i, p) in vertex_params.iter().enumerate() {
            if !(p.radius_to_length_deviation > 0.0) || !p.radius_to_length_ratio.is_finite() {
                return Err(Error::InvalidParameter(format!(
                    "vertex {i}: ratio must be finite and deviation positive, got {p:?}"
                )));
            }
        }
        for (&(first, second), p) in &edge_pair_params {
            let invalid = |reason| Error::InvalidEdgePair {
                first,
                second,
                reason,
            };
            if first >= edges.len() || second >= edges.len() {
                return Err(invalid("edge id out of range"));
            }
            if first == second {
                return Err(invalid("an edge cannot be paired with itself"));
            }
            if first > second {
                return Err(invalid("edge ids must be in ascending order"));
            }
            let finite = p.mean_angle.is_finite() && p.mean_length_ratio.is_finite();
            if !finite || !(p.angle_deviation > 0.0) || !(p.length_ratio_deviation > 0.0) {
                return Err(invalid("means must be finite and deviations positive"));
            }
        }
        if reference_edge >= edges.len() {
            return Err(Error::ReferenceEdgeOutOfRange {
                edge: reference_edge,
                edge_count: edges.len(),
            });
        }
        if !(background_distance_coeff > 0.0) || !background_distance_coeff.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "background distance coefficient must be positive, got {background_distance_coeff}"
            )));
        }

        Ok(Arc::new(Self {
            vertex_count,
            edges,
            vertex_params,
            edge_pair_params,
            reference_edge,
            background_distance_coeff,
        }))
    }

    pub fn from_description(desc: &ShapeModelDescription) -> Result<Arc<Self>> {
        let mut pairs = BTreeMap::new();
        for entry in &desc.edge_pairs {
            if pairs
                .insert((entry.first, entry.second), entry.params)
                .is_some()
            {
                return Err(Error::InvalidEdgePair {
                    first: entry.first,
                    second: entry.second,
                    reason: "duplicate edge pair",
                });
            }
        }
        Self::with_options(
            desc.edges.clone(),
            desc.vertex_params.clone(),
            pairs,
            desc.reference_edge,
            desc.background_distance_coeff,
        )
    }

    pub fn to_description(&self) -> ShapeModelDescription {
        ShapeModelDescription {
            edges: self.edges.clone(),
            vertex_params: self.vertex_params.clone(),
            edge_pairs: self
                .edge_pair_params
                .iter()
                .map(|(&(first, second), &params)| EdgePairEntry {
                    first,
                    second,
                    params,
                })
                .collect(),
            reference_edge: self.reference_edge,
            background_distance_coeff: self.background_distance_coeff,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn edges(&self) -> &[ShapeEdge] {
        &self.edges
    }

    pub fn vertex_params(&self, vertex: usize) -> &ShapeVertexParams {
        &self.vertex_params[vertex]
    }

    pub fn reference_edge(&self) -> usize {
        self.reference_edge
    }

    pub fn background_distance_coeff(&self) -> f64 {
        self.background_distance_coeff
    }

    /// Constrained edge pairs in ascending key order.
    pub fn constrained_edge_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edge_pair_params.keys().copied()
    }

    /// Parameters of the pair `(first, second)`. Keys are stored ascending,
    /// so `(second, first)` with `first < second` is never constrained.
    pub fn edge_pair_params(&self, first: usize, second: usize) -> Option<&ShapeEdgePairParams> {
        self.edge_pair_params.get(&(first, second))
    }

    pub fn calculate_vertex_energy_term(
        &self,
        vertex: usize,
        body_length: f64,
        radius: f64,
    ) -> f64 {
        let params = &self.vertex_params[vertex];
        let ratio = radius / body_length.max(LENGTH_EPS);
        let d = (ratio - params.radius_to_length_ratio) / params.radius_to_length_deviation;
        d * d
    }

    /// Pose energy of a constrained pair, with `v1`/`v2` the vectors of
    /// edges `first`/`second`. The pair is looked up exactly as in
    /// [`ShapeModel::edge_pair_params`].
    pub fn calculate_edge_pair_energy_term(
        &self,
        first: usize,
        second: usize,
        v1: &Vector,
        v2: &Vector,
    ) -> Result<f64> {
        let params = self
            .edge_pair_params(first, second)
            .ok_or(Error::UnconstrainedEdgePair { first, second })?;
        let angle_diff = wrap_angle(signed_angle_between(v1, v2) - params.mean_angle);
        let length_ratio = v2.norm() / v1.norm().max(LENGTH_EPS);
        Ok(params.energy(angle_diff, length_ratio))
    }

    /// Object potential in `[0, 1]` of `point` for the capsule between two
    /// circles: 1 inside, decaying with the power distance outside.
    pub fn calculate_object_potential_for_edge(
        &self,
        point: &Vector,
        c1: &Circle,
        c2: &Circle,
    ) -> f64 {
        self.object_potential_from_power(capsule_power(point, c1, c2))
    }

    /// Maps a power value onto the object potential. Non-increasing in `power`.
    #[inline]
    pub fn object_potential_from_power(&self, power: f64) -> f64 {
        if power <= 0.0 {
            1.0
        } else {
            (-self.background_distance_coeff * power).exp()
        }
    }
}

/// Minimum over `t ∈ [0, 1]` of the power of `point` with respect to the
/// circle interpolated between `c1` (t = 0) and `c2` (t = 1).
///
/// The union of the interpolated circles is the convex hull of the two
/// circles, so the value is non-positive exactly inside that capsule.
pub fn capsule_power(point: &Vector, c1: &Circle, c2: &Circle) -> f64 {
    let d = c2.center - c1.center;
    let dr = c2.radius() - c1.radius();
    let w = point - c1.center;
    let r1 = c1.radius();

    // |w - t d|^2 - (r1 + t dr)^2 = a t^2 + b t + c
    let a = d.norm_squared() - dr * dr;
    let b = -2.0 * (w.dot(&d) + r1 * dr);
    let c = w.norm_squared() - r1 * r1;

    let mut best = c1.power(point).min(c2.power(point));
    if a > 0.0 {
        let t = -b / (2.0 * a);
        if t > 0.0 && t < 1.0 {
            best = best.min(c - b * b / (4.0 * a));
        }
    }
    best
}
