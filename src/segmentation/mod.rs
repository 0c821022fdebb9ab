//! Branch-and-bound segmentation with a shape prior.
//!
//! The search looks for the shape `θ` and labeling `x` minimizing
//!
//! ```text
//! E(θ, x) = prior_weight · prior(θ)
//!         + Σ_p [x_p ? img_fg(p) + w·(1 − φ_θ(p)) : img_bg(p) + w·φ_θ(p)]
//!         + Σ_{p~q} w_pq · [x_p ≠ x_q]
//! ```
//!
//! over integer constraint boxes of shape parameters. Each node of the search
//! is a [`ShapeConstraintsSet`](crate::constraints::ShapeConstraintsSet):
//!
//! - its lower bound combines the interval lower bound of the prior with a
//!   min-cut over unaries built from per-pixel potential bounds
//!   ([`calculate_shape_term_field`]): the upper potential bound makes the
//!   foreground as cheap as possible, the lower one does the same for the
//!   background;
//! - its upper bound is the exact energy of the midpoint shape.
//!
//! Nodes are expanded best-first by lower bound (ties by insertion order).
//! The search stops as soon as the smallest lower bound reaches the best
//! energy found so far within `tolerance`, which certifies optimality, or when
//! a node/time budget runs out.
//!
//! Notes
//! - Child boxes are subsets of their parent, so every bound only tightens
//!   along a branch; leaves (single-value boxes) are evaluated exactly.
//! - With the `parallel` feature the two children of a split are bounded
//!   concurrently. The best energy is only read and written on the search
//!   thread.

mod image_term;
mod mincut;
mod params;
mod segmentator;
mod shape_term;

pub use image_term::{
    GaussianIntensity, ImageCosts, ImageTermProvider, IntensityImageTerm, IntensityModelParams,
};
pub use mincut::{DinicSolver, GridCutProblem, Labeling, MinCutSolver};
pub use params::{SegmentationParams, SplitPolicy};
pub use segmentator::{
    BranchAndBoundSegmentator, SegmentationResult, SegmentationStatus, ShapeEvaluation,
};
pub use shape_term::{calculate_shape_term, calculate_shape_term_field, ShapeTermBounds};
