use crate::geom::Rect;
use crate::image::io::read_json_file;
use crate::segmentation::SegmentationParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct SegmentDemoConfig {
    pub input: PathBuf,
    /// Shape model JSON (`ShapeModelDescription`).
    pub model: PathBuf,
    /// Resize factor applied to the input before segmenting.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Object location in input-image pixels; scaled with the image.
    pub location: Rect,
    #[serde(default)]
    pub params: SegmentationParams,
    pub output: SegmentDemoOutputConfig,
}

fn default_scale() -> f64 {
    1.0
}

impl SegmentDemoConfig {
    /// Location in the pixels of the resized image.
    pub fn scaled_location(&self) -> Rect {
        self.location.scaled(self.scale)
    }
}

#[derive(Debug, Deserialize)]
pub struct SegmentDemoOutputConfig {
    #[serde(rename = "dir")]
    pub dir: PathBuf,
}

pub fn load_config(path: &Path) -> Result<SegmentDemoConfig, String> {
    read_json_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::SplitPolicy;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let cfg: SegmentDemoConfig = serde_json::from_str(
            r#"{
                "input": "giraffe.jpg",
                "model": "giraffe.json",
                "scale": 0.15,
                "location": { "x": 153, "y": 124, "width": 796, "height": 480 },
                "params": { "split_policy": "round_robin" },
                "output": { "dir": "out" }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.params.split_policy, SplitPolicy::RoundRobin);
        assert_eq!(cfg.params.capsule_steps, SegmentationParams::default().capsule_steps);
        assert_eq!(cfg.scaled_location(), Rect::new(22, 18, 119, 72));
    }

    #[test]
    fn loads_demo_config_and_reports_missing_files() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        let cfg = load_config(&dir.join("demos/segment_giraffe.json")).unwrap();
        assert_eq!(cfg.params.time_limit_ms, Some(60000));
        assert_eq!(cfg.output.dir, PathBuf::from("out/segment_giraffe"));

        let missing = dir.join("demos/no_such_config.json");
        let err = load_config(&missing).unwrap_err();
        assert!(err.starts_with("Failed to read"), "{err}");
        assert!(err.contains("no_such_config.json"), "{err}");
    }
}
