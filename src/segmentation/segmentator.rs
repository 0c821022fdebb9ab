use super::image_term::{ImageCosts, ImageTermProvider, IntensityImageTerm};
use super::mincut::{DinicSolver, GridCutProblem, Labeling, MinCutSolver};
use super::params::{SegmentationParams, SplitPolicy};
use super::shape_term::{calculate_shape_term_field, ShapeTermBounds};
use crate::constraints::{Axis, ShapeConstraintsSet};
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{SearchReport, TimingBreakdown};
use crate::error::{Error, Result};
use crate::geom::Rect;
use crate::image::{BinaryMask, ImageF32};
use crate::model::ShapeModel;
use crate::shape::Shape;
use log::{debug, info, warn};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationStatus {
    /// The lowest lower bound reached the best energy within the tolerance.
    Optimal,
    /// A node or time budget stopped the search first.
    BudgetExhausted,
}

/// Exact evaluation of one concrete shape.
#[derive(Clone, Debug)]
pub struct ShapeEvaluation {
    pub shape: Shape,
    pub prior_energy: f64,
    /// Weighted prior plus the optimal labeling energy.
    pub energy: f64,
    pub mask: BinaryMask,
}

#[derive(Clone, Debug)]
pub struct SegmentationResult {
    /// Region the mask covers.
    pub region: Rect,
    pub mask: BinaryMask,
    pub shape: Shape,
    pub energy: f64,
    /// Certified lower bound on the optimal energy.
    pub lower_bound: f64,
    pub status: SegmentationStatus,
    pub report: SearchReport,
}

impl SegmentationResult {
    pub fn gap(&self) -> f64 {
        self.energy - self.lower_bound
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SegmentationStatus::Optimal
    }
}

struct QueueEntry {
    lower: f64,
    seq: u64,
    // next dimension tried by `SplitPolicy::RoundRobin`
    cursor: usize,
    node: ShapeConstraintsSet,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    // reversed: BinaryHeap pops the smallest (lower, seq) first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .lower
            .total_cmp(&self.lower)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Best-first branch-and-bound over constraint boxes of one shape model.
pub struct BranchAndBoundSegmentator<S = DinicSolver> {
    model: Arc<ShapeModel>,
    params: SegmentationParams,
    solver: S,
}

impl BranchAndBoundSegmentator<DinicSolver> {
    pub fn new(model: Arc<ShapeModel>, params: SegmentationParams) -> Result<Self> {
        Self::with_solver(model, params, DinicSolver)
    }
}

impl<S: MinCutSolver> BranchAndBoundSegmentator<S> {
    pub fn with_solver(
        model: Arc<ShapeModel>,
        params: SegmentationParams,
        solver: S,
    ) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            model,
            params,
            solver,
        })
    }

    pub fn model(&self) -> &Arc<ShapeModel> {
        &self.model
    }

    pub fn params(&self) -> &SegmentationParams {
        &self.params
    }

    fn labeling(&self, costs: &ImageCosts, bounds: &ShapeTermBounds) -> Result<Labeling> {
        let w = self.params.shape_weight;
        let fg: Vec<f64> = costs
            .fg()
            .iter()
            .zip(bounds.upper_values())
            .map(|(c, hi)| c + w * (1.0 - hi))
            .collect();
        let bg: Vec<f64> = costs
            .bg()
            .iter()
            .zip(bounds.lower_values())
            .map(|(c, lo)| c + w * lo)
            .collect();
        let region = costs.region();
        self.solver.solve(&GridCutProblem {
            width: region.width,
            height: region.height,
            fg: &fg,
            bg: &bg,
            horizontal: costs.horizontal(),
            vertical: costs.vertical(),
        })
    }

    /// Lower bound of the energy over every shape in `node`; exact for leaves.
    pub fn lower_bound(&self, node: &ShapeConstraintsSet, costs: &ImageCosts) -> Result<f64> {
        let prior = node.shape_energy_lower_bound()?;
        let bounds = calculate_shape_term_field(node, costs.region(), self.params.capsule_steps)?;
        let labeling = self.labeling(costs, &bounds)?;
        let value = self.params.prior_weight * prior + labeling.energy;
        if !value.is_finite() {
            return Err(Error::NonFiniteBound("lower bound"));
        }
        Ok(value)
    }

    /// Exact energy and optimal labeling for one shape.
    pub fn evaluate_shape(&self, shape: &Shape, costs: &ImageCosts) -> Result<ShapeEvaluation> {
        let region = costs.region();
        let prior_energy = shape.prior_energy();
        let bounds = ShapeTermBounds::exact(shape, region);
        let labeling = self.labeling(costs, &bounds)?;
        let energy = self.params.prior_weight * prior_energy + labeling.energy;
        if !energy.is_finite() {
            return Err(Error::NonFiniteBound("shape energy"));
        }
        let actual = labeling.labels.len();
        let mask = BinaryMask::from_labels(region.width, region.height, labeling.labels).ok_or(
            Error::SizeMismatch {
                what: "labeling",
                expected: region.area(),
                actual,
            },
        )?;
        Ok(ShapeEvaluation {
            shape: shape.clone(),
            prior_energy,
            energy,
            mask,
        })
    }

    fn choose_split(
        &self,
        node: &ShapeConstraintsSet,
        cursor: usize,
    ) -> Option<(usize, Axis, usize)> {
        match self.params.split_policy {
            SplitPolicy::LargestWidth => node.widest_dimension().map(|(v, a)| (v, a, cursor)),
            SplitPolicy::RoundRobin => {
                let dims = node.vertex_constraints().len() * Axis::ALL.len();
                (0..dims).map(|i| (cursor + i) % dims).find_map(|d| {
                    let (vertex, axis) = (d / Axis::ALL.len(), Axis::ALL[d % Axis::ALL.len()]);
                    (node.vertex_constraints()[vertex].width(axis) > 0)
                        .then_some((vertex, axis, d + 1))
                })
            }
        }
    }

    fn bound_children(
        &self,
        a: &ShapeConstraintsSet,
        b: &ShapeConstraintsSet,
        costs: &ImageCosts,
    ) -> (Result<f64>, Result<f64>) {
        #[cfg(feature = "parallel")]
        {
            rayon::join(|| self.lower_bound(a, costs), || self.lower_bound(b, costs))
        }
        #[cfg(not(feature = "parallel"))]
        {
            (self.lower_bound(a, costs), self.lower_bound(b, costs))
        }
    }

    fn budget_exhausted(&self, report: &SearchReport, start: Instant) -> bool {
        let nodes = self
            .params
            .max_nodes
            .is_some_and(|max| report.nodes_expanded >= max);
        let time = self
            .params
            .time_limit_ms
            .is_some_and(|limit| elapsed_ms(start) >= limit as f64);
        nodes || time
    }

    /// Searches `root` for the shape and labeling of lowest energy over `region`.
    pub fn segment<I>(
        &self,
        root: ShapeConstraintsSet,
        image_term: &I,
        region: Rect,
    ) -> Result<SegmentationResult>
    where
        I: ImageTermProvider + ?Sized,
    {
        if !Arc::ptr_eq(root.model(), &self.model) {
            return Err(Error::InvalidConstraints(
                "constraints set belongs to a different shape model".to_string(),
            ));
        }
        if region.is_empty() {
            return Err(Error::InvalidConstraints("empty segmentation region".to_string()));
        }
        let start = Instant::now();
        let mut report = SearchReport::default();
        let mut timings = TimingBreakdown::default();

        let stage = Instant::now();
        let costs = image_term.image_costs(region)?;
        if costs.region() != region {
            return Err(Error::ImageTerm(format!(
                "provider returned costs for {:?}, requested {region:?}",
                costs.region()
            )));
        }
        timings.push_since("image_term", stage);

        let stage = Instant::now();
        let root_lower = self.lower_bound(&root, &costs)?;
        timings.push_since("root_bound", stage);
        debug!("root lower bound {root_lower:.4} over {region:?}");

        let tolerance = self.params.tolerance;
        let mut heap = BinaryHeap::new();
        let mut seq = 0u64;
        heap.push(QueueEntry {
            lower: root_lower,
            seq,
            cursor: 0,
            node: root,
        });
        report.nodes_pushed = 1;
        report.max_queue_len = 1;

        let mut best: Option<ShapeEvaluation> = None;
        // lowest bound among discarded children, for the empty-queue outcome
        let mut pruned_floor = f64::INFINITY;
        let search_start = Instant::now();

        let outcome = loop {
            let Some(entry) = heap.pop() else {
                match &best {
                    Some(b) => break (SegmentationStatus::Optimal, pruned_floor.min(b.energy)),
                    None => return Err(Error::Unresolved),
                }
            };
            let best_energy = best.as_ref().map_or(f64::INFINITY, |b| b.energy);
            if entry.lower >= best_energy - tolerance {
                break (SegmentationStatus::Optimal, entry.lower.min(best_energy));
            }
            if best.is_some() && self.budget_exhausted(&report, start) {
                warn!(
                    "search budget exhausted after {} nodes; gap {:.4}",
                    report.nodes_expanded,
                    best_energy - entry.lower
                );
                break (SegmentationStatus::BudgetExhausted, entry.lower.min(best_energy));
            }

            report.nodes_expanded += 1;
            let candidate = self.evaluate_shape(&entry.node.midpoint_shape()?, &costs)?;
            report.shapes_evaluated += 1;
            if candidate.energy < best_energy {
                debug!(
                    "node {}: best energy {:.4} -> {:.4} (lower bound {:.4})",
                    report.nodes_expanded, best_energy, candidate.energy, entry.lower
                );
                report.upper_bound_trace.push(candidate.energy);
                best = Some(candidate);
            }
            let best_energy = best.as_ref().map_or(f64::INFINITY, |b| b.energy);
            if entry.lower >= best_energy - tolerance {
                break (SegmentationStatus::Optimal, entry.lower.min(best_energy));
            }

            let log_every = self.params.log_every;
            if log_every > 0 && report.nodes_expanded % log_every == 0 {
                debug!(
                    "node {}: queue={} lower={:.4} best={:.4}",
                    report.nodes_expanded,
                    heap.len(),
                    entry.lower,
                    best_energy
                );
            }

            let Some((vertex, axis, cursor)) = self.choose_split(&entry.node, entry.cursor) else {
                continue;
            };
            let (a, b) = entry.node.split(vertex, axis)?;
            let (lower_a, lower_b) = self.bound_children(&a, &b, &costs);
            for (child, lower) in [(a, lower_a?), (b, lower_b?)] {
                if lower < best_energy - tolerance {
                    seq += 1;
                    heap.push(QueueEntry {
                        lower,
                        seq,
                        cursor,
                        node: child,
                    });
                    report.nodes_pushed += 1;
                } else {
                    pruned_floor = pruned_floor.min(lower);
                    report.nodes_pruned += 1;
                }
            }
            report.max_queue_len = report.max_queue_len.max(heap.len());
        };
        timings.push_since("search", search_start);

        let (status, lower_bound) = outcome;
        let best = best.ok_or(Error::Unresolved)?;
        report.elapsed_ms = elapsed_ms(start);
        timings.total_ms = report.elapsed_ms;
        report.timings = timings;
        info!(
            "segmentation {:?}: energy {:.4}, lower bound {:.4}, {}",
            status,
            best.energy,
            lower_bound,
            report.summary()
        );

        Ok(SegmentationResult {
            region,
            mask: best.mask,
            shape: best.shape,
            energy: best.energy,
            lower_bound,
            status,
            report,
        })
    }

    /// Segments the whole image, with intensity models estimated from
    /// `location` and every vertex allowed anywhere inside `location`.
    pub fn segment_image(&self, image: &ImageF32, location: Rect) -> Result<SegmentationResult> {
        let max_radius = self
            .params
            .max_radius
            .unwrap_or((location.width.min(location.height) / 2) as i32)
            .max(self.params.min_radius);
        let root = ShapeConstraintsSet::spanning(
            self.model.clone(),
            location,
            self.params.min_radius,
            max_radius,
        )?;
        let image_term = IntensityImageTerm::from_location(
            image.clone(),
            location,
            self.params.intensity.clone(),
        )?;
        let region = Rect::new(0, 0, image.w, image.h);
        self.segment(root, &image_term, region)
    }
}
