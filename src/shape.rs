//! Concrete shape: one circle per vertex of a shared [`ShapeModel`].
use crate::error::{Error, Result};
use crate::geom::{Circle, Vector};
use crate::model::{ShapeEdge, ShapeModel};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Shape {
    model: Arc<ShapeModel>,
    vertices: Vec<Circle>,
}

impl Shape {
    /// Builds a shape; the number of circles must equal the model's vertex count.
    pub fn new(model: Arc<ShapeModel>, vertices: impl IntoIterator<Item = Circle>) -> Result<Self> {
        let expected = model.vertex_count();
        let mut collected = Vec::with_capacity(expected);
        for circle in vertices {
            if collected.len() == expected {
                return Err(Error::TooManyVertices { expected });
            }
            collected.push(circle);
        }
        if collected.len() != expected {
            return Err(Error::TooFewVertices {
                expected,
                actual: collected.len(),
            });
        }
        Ok(Self {
            model,
            vertices: collected,
        })
    }

    pub fn model(&self) -> &Arc<ShapeModel> {
        &self.model
    }

    pub fn vertices(&self) -> &[Circle] {
        &self.vertices
    }

    pub fn edges(&self) -> &[ShapeEdge] {
        self.model.edges()
    }

    /// Vector from the first to the second endpoint of an edge.
    pub fn edge_vector(&self, edge: usize) -> Vector {
        let e = self.model.edges()[edge];
        self.vertices[e.index2].center - self.vertices[e.index1].center
    }

    /// Length of the model's reference edge.
    pub fn body_length(&self) -> f64 {
        self.edge_vector(self.model.reference_edge()).norm()
    }

    /// Object potential at `point`: the maximum over all edge capsules.
    pub fn object_potential(&self, point: &Vector) -> f64 {
        let mut potential = 0.0f64;
        for edge in self.model.edges() {
            let edge_potential = self.model.calculate_object_potential_for_edge(
                point,
                &self.vertices[edge.index1],
                &self.vertices[edge.index2],
            );
            potential = potential.max(edge_potential);
        }
        potential
    }

    /// Prior energy with an externally supplied body length.
    pub fn calculate_energy(&self, body_length: f64) -> f64 {
        let mut result = 0.0;
        for (i, circle) in self.vertices.iter().enumerate() {
            result += self
                .model
                .calculate_vertex_energy_term(i, body_length, circle.radius());
        }
        for (first, second) in self.model.constrained_edge_pairs() {
            let v1 = self.edge_vector(first);
            let v2 = self.edge_vector(second);
            // keys come from the model itself, so the pair is always constrained
            if let Ok(term) = self
                .model
                .calculate_edge_pair_energy_term(first, second, &v1, &v2)
            {
                result += term;
            }
        }
        result
    }

    /// Prior energy normalised by the shape's own body length.
    pub fn prior_energy(&self) -> f64 {
        self.calculate_energy(self.body_length())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ShapeEdgePairParams, ShapeVertexParams};
    use approx::assert_abs_diff_eq;
    use std::collections::BTreeMap;
    use std::f64::consts::FRAC_PI_2;

    fn chain_model() -> Arc<ShapeModel> {
        ShapeModel::create(
            vec![ShapeEdge::new(0, 1), ShapeEdge::new(1, 2)],
            vec![ShapeVertexParams::new(0.2, 0.1); 3],
            BTreeMap::from([((0, 1), ShapeEdgePairParams::new(FRAC_PI_2, 0.5, 0.2, 0.2))]),
        )
        .unwrap()
    }

    fn circle(x: f64, y: f64, r: f64) -> Circle {
        Circle::from_xyr(x, y, r).unwrap()
    }

    #[test]
    fn construction_requires_exact_vertex_count() {
        let model = chain_model();
        let c = circle(0.0, 0.0, 1.0);
        assert!(Shape::new(model.clone(), vec![c; 3]).is_ok());
        assert_eq!(
            Shape::new(model.clone(), vec![c; 4]).unwrap_err(),
            Error::TooManyVertices { expected: 3 }
        );
        assert_eq!(
            Shape::new(model.clone(), vec![c; 2]).unwrap_err(),
            Error::TooFewVertices {
                expected: 3,
                actual: 2
            }
        );
        assert!(Shape::new(model, Vec::new()).is_err());
    }

    #[test]
    fn energy_is_zero_at_rest_pose() {
        let shape = Shape::new(
            chain_model(),
            vec![
                circle(0.0, 0.0, 2.0),
                circle(10.0, 0.0, 2.0),
                circle(10.0, 5.0, 2.0),
            ],
        )
        .unwrap();
        assert_abs_diff_eq!(shape.body_length(), 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(shape.prior_energy(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn energy_sums_vertex_and_pair_terms() {
        let model = chain_model();
        let shape = Shape::new(
            model.clone(),
            vec![
                circle(0.0, 0.0, 3.0),
                circle(10.0, 0.0, 2.0),
                circle(10.0, 6.0, 2.0),
            ],
        )
        .unwrap();
        let vertex = model.calculate_vertex_energy_term(0, 10.0, 3.0);
        assert_abs_diff_eq!(vertex, 1.0, epsilon = 1e-9);
        let pair = ((0.6 - 0.5) / 0.2f64).powi(2);
        assert_abs_diff_eq!(shape.calculate_energy(10.0), vertex + pair, epsilon = 1e-9);
    }

    #[test]
    fn overlapping_capsules_take_maximum_not_sum() {
        let shape = Shape::new(
            chain_model(),
            vec![
                circle(0.0, 0.0, 3.0),
                circle(10.0, 0.0, 3.0),
                circle(10.0, 10.0, 3.0),
            ],
        )
        .unwrap();
        let model = shape.model().clone();
        let v = shape.vertices();
        // outside both capsules, near the joint, so both potentials are fractional
        let point = Vector::new(14.0, -2.0);
        let p0 = model.calculate_object_potential_for_edge(&point, &v[0], &v[1]);
        let p1 = model.calculate_object_potential_for_edge(&point, &v[1], &v[2]);
        assert!(p0 > 0.0 && p0 < 1.0 && p1 > 0.0 && p1 < 1.0);
        assert_eq!(shape.object_potential(&point), p0.max(p1));
        assert!(shape.object_potential(&point) < p0 + p1);

        let inside_both = Vector::new(10.0, 1.0);
        assert_eq!(shape.object_potential(&inside_both), 1.0);
    }
}
