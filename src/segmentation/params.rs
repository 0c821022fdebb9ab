//! Parameters of the branch-and-bound search.
//!
//! Defaults suit images of a few hundred pixels per side. For tuning, start
//! with `shape_weight` (how strongly the skeleton pulls the labeling) and
//! `capsule_steps` (tighter shape-term bounds at a higher cost per node).
use super::image_term::IntensityModelParams;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// How the search picks the dimension to split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Widest range over all vertices and axes.
    #[default]
    LargestWidth,
    /// Cycles through vertices and axes, skipping single-value ranges.
    RoundRobin,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationParams {
    /// Weight of the shape prior energy.
    pub prior_weight: f64,
    /// Weight of the object potential in the unary costs.
    pub shape_weight: f64,
    /// Number of `t` sub-intervals used to bound each edge capsule (>= 1).
    pub capsule_steps: usize,
    /// Search stops once the lowest lower bound is within this of the best energy.
    pub tolerance: f64,
    pub split_policy: SplitPolicy,
    /// Maximum number of expanded nodes; `None` means unlimited.
    pub max_nodes: Option<usize>,
    /// Wall-clock budget in milliseconds; `None` means unlimited.
    pub time_limit_ms: Option<u64>,
    /// Emit a progress line every this many expanded nodes (0 disables).
    pub log_every: usize,
    /// Smallest vertex radius considered by `segment_image`.
    pub min_radius: i32,
    /// Largest vertex radius considered by `segment_image`. `None` uses half
    /// the shorter side of the location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_radius: Option<i32>,
    /// Intensity models used by `segment_image`.
    pub intensity: IntensityModelParams,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            prior_weight: 1.0,
            shape_weight: 1.0,
            capsule_steps: 4,
            tolerance: 1e-6,
            split_policy: SplitPolicy::default(),
            max_nodes: None,
            time_limit_ms: None,
            log_every: 1000,
            min_radius: 1,
            max_radius: None,
            intensity: IntensityModelParams::default(),
        }
    }
}

impl SegmentationParams {
    pub fn validate(&self) -> Result<()> {
        let non_negative = |name: &str, v: f64| {
            if v >= 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(Error::InvalidParameter(format!(
                    "{name} must be finite and non-negative, got {v}"
                )))
            }
        };
        non_negative("prior_weight", self.prior_weight)?;
        non_negative("shape_weight", self.shape_weight)?;
        non_negative("tolerance", self.tolerance)?;
        if self.capsule_steps == 0 {
            return Err(Error::InvalidParameter(
                "capsule_steps must be at least 1".to_string(),
            ));
        }
        if self.min_radius < 0 || self.max_radius.is_some_and(|r| r < self.min_radius) {
            return Err(Error::InvalidParameter(format!(
                "radius range {}..{:?} is empty or negative",
                self.min_radius, self.max_radius
            )));
        }
        self.intensity.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let params: SegmentationParams =
            serde_json::from_str(r#"{ "shape_weight": 3.0, "split_policy": "round_robin" }"#)
                .unwrap();
        assert_eq!(params.shape_weight, 3.0);
        assert_eq!(params.split_policy, SplitPolicy::RoundRobin);
        assert_eq!(params.capsule_steps, SegmentationParams::default().capsule_steps);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let bad = [
            SegmentationParams {
                capsule_steps: 0,
                ..Default::default()
            },
            SegmentationParams {
                shape_weight: -1.0,
                ..Default::default()
            },
            SegmentationParams {
                tolerance: f64::NAN,
                ..Default::default()
            },
            SegmentationParams {
                min_radius: 5,
                max_radius: Some(4),
                ..Default::default()
            },
            SegmentationParams {
                intensity: IntensityModelParams {
                    contrast_sigma: 0.0,
                    ..Default::default()
                },
                ..Default::default()
            },
            SegmentationParams {
                intensity: IntensityModelParams {
                    unary_weight: f64::INFINITY,
                    ..Default::default()
                },
                ..Default::default()
            },
        ];
        for params in bad {
            assert!(params.validate().is_err(), "{params:?}");
        }
    }
}
