//! Renders how tight the shape-term bounds of one constraints set are.
//!
//! Red intensity is the gap `upper - lower` of the potential bounds at each
//! pixel. Blue marks pixels where the bounds cross.

use shape_prior_seg::config::{load_model, shape_term as cfg};
use shape_prior_seg::constraints::ShapeConstraintsSet;
use shape_prior_seg::geom::Rect;
use shape_prior_seg::image::io::save_rgb;
use shape_prior_seg::segmentation::calculate_shape_term_field;
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = cfg::load_config(Path::new(&config_path))?;
    let model = load_model(&config.model)?;
    let vertices = config
        .vertices
        .iter()
        .map(|v| v.resolve())
        .collect::<Result<Vec<_>, _>>()?;
    let constraints =
        ShapeConstraintsSet::create(model, vertices).map_err(|e| e.to_string())?;

    let region = Rect::new(0, 0, config.width, config.height);
    let bounds = calculate_shape_term_field(&constraints, region, config.capsule_steps)
        .map_err(|e| format!("Failed to bound shape term: {e}"))?;

    let mut rgb = Vec::with_capacity(region.area() * 3);
    let mut max_gap = 0.0f64;
    for (lo, hi) in bounds.lower_values().iter().zip(bounds.upper_values()) {
        let diff = hi - lo;
        max_gap = max_gap.max(diff);
        let red = (diff * config.gain).clamp(0.0, 255.0) as u8;
        let blue = (-diff * config.gain).clamp(0.0, 255.0) as u8;
        rgb.extend_from_slice(&[red, 0, blue]);
    }
    save_rgb(config.width, config.height, rgb, &config.output)?;

    println!(
        "Saved shape-term gap image to {} (max gap {max_gap:.4})",
        config.output.display()
    );
    Ok(())
}

fn usage() -> String {
    "Usage: shape_term_demo <config.json>".to_string()
}
