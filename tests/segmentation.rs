mod common;

use common::synthetic_image::{capsule_image, capsule_mask, two_tone_costs};
use shape_prior_seg::constraints::{ShapeConstraintsSet, VertexConstraints};
use shape_prior_seg::geom::{Circle, Point, Rect};
use shape_prior_seg::model::{ShapeEdge, ShapeModel, ShapeVertexParams};
use shape_prior_seg::segmentation::{
    BranchAndBoundSegmentator, ImageTermProvider, IntensityImageTerm, SegmentationParams,
    SegmentationStatus,
};
use shape_prior_seg::shape::Shape;
use std::collections::BTreeMap;
use std::sync::Arc;

fn capsule_model() -> Arc<ShapeModel> {
    // steep potential decay so the labeling follows the capsule boundary
    ShapeModel::with_options(
        vec![ShapeEdge::new(0, 1)],
        vec![ShapeVertexParams::new(0.3, 0.1); 2],
        BTreeMap::new(),
        0,
        1.0,
    )
    .expect("valid model")
}

fn circle(x: f64, y: f64, r: f64) -> Circle {
    Circle::from_xyr(x, y, r).expect("valid circle")
}

fn vertex_box(x0: i32, y0: i32, x1: i32, y1: i32, r0: i32, r1: i32) -> VertexConstraints {
    VertexConstraints::new(Point::new(x0, y0), Point::new(x1, y1), r0, r1).expect("valid box")
}

fn nearest_distance(found: &[Circle], target: &Circle) -> f64 {
    found
        .iter()
        .map(|c| (c.center - target.center).norm())
        .fold(f64::INFINITY, f64::min)
}

#[test]
fn recovers_capsule_from_synthetic_costs() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (c1, c2) = (circle(10.0, 10.0, 4.0), circle(22.0, 10.0, 4.0));
    let image = capsule_image(32, 20, &c1, &c2, 1.0, 0.0);
    let costs = two_tone_costs(&image, 4.0, 0.25);

    let model = capsule_model();
    let seg = BranchAndBoundSegmentator::new(model.clone(), SegmentationParams::default())
        .expect("valid params");
    let root = ShapeConstraintsSet::create(
        model,
        vec![vertex_box(7, 7, 13, 13, 2, 6), vertex_box(19, 7, 25, 13, 2, 6)],
    )
    .expect("valid root");

    let result = seg
        .segment(root, &costs, Rect::new(0, 0, 32, 20))
        .expect("search succeeds");
    assert_eq!(result.status, SegmentationStatus::Optimal);
    assert!(result.gap() <= seg.params().tolerance + 1e-12);

    let truth = capsule_mask(32, 20, &c1, &c2);
    assert!(result.mask.mismatch(&truth) <= 4, "mismatch {}", result.mask.mismatch(&truth));
    for target in [&c1, &c2] {
        let d = nearest_distance(result.shape.vertices(), target);
        assert!(d <= 2.0, "vertex off by {d}");
    }

    let truth_shape = Shape::new(seg.model().clone(), [c1, c2]).expect("valid shape");
    let truth_energy = seg.evaluate_shape(&truth_shape, &costs).expect("evaluated").energy;
    assert!(result.energy <= truth_energy + 1e-9);
    assert!(result.report.nodes_pruned > 0);
}

#[test]
fn segments_image_with_estimated_intensity_models() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (c1, c2) = (circle(7.0, 7.0, 2.0), circle(15.0, 7.0, 2.0));
    let image = capsule_image(22, 14, &c1, &c2, 0.8, 0.2);
    let location = Rect::new(4, 4, 15, 7);

    let params = SegmentationParams {
        min_radius: 1,
        max_radius: Some(3),
        ..Default::default()
    };
    let seg = BranchAndBoundSegmentator::new(capsule_model(), params.clone()).expect("valid params");
    let result = seg.segment_image(&image, location).expect("search succeeds");
    assert!(result.is_optimal());
    assert_eq!(result.region, Rect::new(0, 0, 22, 14));
    assert!(result.lower_bound <= result.energy);

    let term = IntensityImageTerm::from_location(image.clone(), location, params.intensity)
        .expect("models");
    let costs = term.image_costs(result.region).expect("costs");
    let truth_shape = Shape::new(seg.model().clone(), [c1, c2]).expect("valid shape");
    let truth_energy = seg.evaluate_shape(&truth_shape, &costs).expect("evaluated").energy;
    assert!(result.energy <= truth_energy + 1e-9);

    let truth = capsule_mask(22, 14, &c1, &c2);
    assert!(result.mask.mismatch(&truth) <= 6);
}
