//! JSON configuration for the demo binaries.

pub mod segment;
pub mod shape_term;

use crate::image::io::read_json_file;
use crate::model::{ShapeModel, ShapeModelDescription};
use std::path::Path;
use std::sync::Arc;

/// Load a [`ShapeModelDescription`] from JSON and validate it.
pub fn load_model(path: &Path) -> Result<Arc<ShapeModel>, String> {
    let desc: ShapeModelDescription = read_json_file(path)?;
    ShapeModel::from_description(&desc)
        .map_err(|e| format!("Invalid model {}: {e}", path.display()))
}
