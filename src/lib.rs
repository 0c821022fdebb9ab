#![doc = include_str!("../README.md")]

// Core model and geometry
pub mod angle;
pub mod error;
pub mod geom;
pub mod model;
pub mod shape;

// Search
pub mod constraints;
pub mod distance;
pub mod segmentation;

// Support
pub mod config;
pub mod diagnostics;
pub mod image;

// --- High-level re-exports -------------------------------------------------

pub use crate::constraints::{Axis, ShapeConstraintsSet, VertexConstraints};
pub use crate::distance::GeneralizedDistanceTransform2D;
pub use crate::error::{Error, Result};
pub use crate::geom::{Circle, Point, Rect, Vector};
pub use crate::model::{
    ShapeEdge, ShapeEdgePairParams, ShapeModel, ShapeModelDescription, ShapeVertexParams,
};
pub use crate::segmentation::{
    BranchAndBoundSegmentator, ImageCosts, ImageTermProvider, SegmentationParams,
    SegmentationResult, SegmentationStatus,
};
pub use crate::shape::Shape;

pub use crate::diagnostics::SearchReport;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use shape_prior_seg::prelude::*;
/// use std::collections::BTreeMap;
///
/// # fn main() -> Result<()> {
/// let model = ShapeModel::create(
///     vec![ShapeEdge::new(0, 1)],
///     vec![ShapeVertexParams::new(0.3, 0.1); 2],
///     BTreeMap::new(),
/// )?;
/// let region = Rect::new(0, 0, 32, 20);
/// let costs = ImageCosts::uniform(region, 1.0, 0.0, 0.5)?;
/// let root = ShapeConstraintsSet::spanning(model.clone(), region, 1, 6)?;
///
/// let seg = BranchAndBoundSegmentator::new(model, SegmentationParams::default())?;
/// let result = seg.segment(root, &costs, region)?;
/// println!("energy={:.3} gap={:.3}", result.energy, result.gap());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{BinaryMask, ImageF32};
    pub use crate::{
        BranchAndBoundSegmentator, Circle, Error, ImageCosts, Point, Rect, Result,
        SegmentationParams, Shape, ShapeConstraintsSet, ShapeEdge, ShapeModel,
        ShapeVertexParams, VertexConstraints,
    };
}
