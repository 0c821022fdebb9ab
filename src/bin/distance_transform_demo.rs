//! Distance from every pixel to the nearest black pixel of a mask image.
//!
//! Black pixels (value below 128) cost nothing, everything else is
//! effectively forbidden. The output stores `sqrt(distance)` clamped at 255.

use shape_prior_seg::distance::GeneralizedDistanceTransform2D;
use shape_prior_seg::geom::Point;
use shape_prior_seg::image::io::{load_grayscale_image, save_grayscale_f32};
use shape_prior_seg::image::ImageF32;
use std::env;
use std::path::Path;

const FORBIDDEN: f64 = 1e10;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut args = env::args().skip(1);
    let input = args.next().ok_or_else(usage)?;
    let output = args.next().ok_or_else(usage)?;

    let gray = load_grayscale_image(Path::new(&input))?;
    let (w, h) = (gray.width(), gray.height());
    let black = gray.as_view().below(128);
    let penalties = black
        .data
        .iter()
        .map(|&b| if b { 0.0 } else { FORBIDDEN })
        .collect();
    let transform =
        GeneralizedDistanceTransform2D::from_penalties(Point::new(0, 0), w, h, 1.0, 1.0, penalties)
            .map_err(|e| format!("Distance transform failed: {e}"))?;

    let mut out = ImageF32::new(w, h);
    for (dst, &d) in out.data.iter_mut().zip(transform.values()) {
        *dst = (d.max(0.0).sqrt().min(255.0) / 255.0) as f32;
    }
    save_grayscale_f32(&out, Path::new(&output))?;

    println!("Saved distance image to {output}");
    Ok(())
}

fn usage() -> String {
    "Usage: distance_transform_demo <mask.png> <out.png>".to_string()
}
