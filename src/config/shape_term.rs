use crate::constraints::VertexConstraints;
use crate::geom::Point;
use crate::image::io::read_json_file;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct ShapeTermDemoConfig {
    pub model: PathBuf,
    pub width: usize,
    pub height: usize,
    #[serde(default = "default_capsule_steps")]
    pub capsule_steps: usize,
    /// One box per model vertex.
    pub vertices: Vec<VertexBoxConfig>,
    /// Gain applied to the bound difference before it is clamped to 255.
    #[serde(default = "default_gain")]
    pub gain: f64,
    pub output: PathBuf,
}

fn default_capsule_steps() -> usize {
    4
}

fn default_gain() -> f64 {
    200.0
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct VertexBoxConfig {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
    pub min_radius: i32,
    pub max_radius: i32,
}

impl VertexBoxConfig {
    pub fn resolve(&self) -> Result<VertexConstraints, String> {
        VertexConstraints::new(
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            self.min_radius,
            self.max_radius,
        )
        .map_err(|e| format!("Invalid vertex box {self:?}: {e}"))
    }
}

pub fn load_config(path: &Path) -> Result<ShapeTermDemoConfig, String> {
    read_json_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_config_resolves_vertex_boxes() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/shape_term.json");
        let cfg = load_config(&path).unwrap();
        assert_eq!((cfg.width, cfg.height), (320, 240));
        let boxes: Vec<VertexConstraints> = cfg
            .vertices
            .iter()
            .map(|v| v.resolve().unwrap())
            .collect();
        assert_eq!(boxes[1].min_radius(), 20);

        let broken = VertexBoxConfig {
            min_radius: 5,
            max_radius: 4,
            ..cfg.vertices[0]
        };
        assert!(broken.resolve().unwrap_err().starts_with("Invalid vertex box"));
    }
}
