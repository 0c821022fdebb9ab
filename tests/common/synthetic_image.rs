use shape_prior_seg::geom::{Circle, Rect, Vector};
use shape_prior_seg::image::{BinaryMask, ImageF32};
use shape_prior_seg::model::capsule_power;
use shape_prior_seg::segmentation::ImageCosts;

/// Mask of the capsule spanned by two circles.
pub fn capsule_mask(width: usize, height: usize, c1: &Circle, c2: &Circle) -> BinaryMask {
    let mut mask = BinaryMask::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let p = Vector::new(x as f64, y as f64);
            mask.set(x, y, capsule_power(&p, c1, c2) <= 0.0);
        }
    }
    mask
}

/// Two-tone image: `inside` on the capsule, `outside` elsewhere.
pub fn capsule_image(
    width: usize,
    height: usize,
    c1: &Circle,
    c2: &Circle,
    inside: f32,
    outside: f32,
) -> ImageF32 {
    let mask = capsule_mask(width, height, c1, c2);
    let mut img = ImageF32::new(width, height);
    for y in 0..height {
        for x in 0..width {
            img.set(x, y, if mask.get(x, y) { inside } else { outside });
        }
    }
    img
}

/// Quadratic costs pulling the labeling towards intensity 1 (foreground)
/// or 0 (background), with a constant smoothness weight.
pub fn two_tone_costs(image: &ImageF32, strength: f64, pairwise: f64) -> ImageCosts {
    let (w, h) = (image.w, image.h);
    let mut fg = Vec::with_capacity(w * h);
    let mut bg = Vec::with_capacity(w * h);
    for &v in &image.data {
        let v = v as f64;
        fg.push(strength * (v - 1.0) * (v - 1.0));
        bg.push(strength * v * v);
    }
    ImageCosts::new(
        Rect::new(0, 0, w, h),
        fg,
        bg,
        vec![pairwise; (w - 1) * h],
        vec![pairwise; w * (h - 1)],
    )
    .expect("well-formed costs")
}
