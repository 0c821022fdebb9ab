//! Image evidence consumed by the search.
//!
//! An [`ImageTermProvider`] turns a pixel region into [`ImageCosts`]: per-pixel
//! foreground/background unaries and non-negative smoothness weights between
//! horizontal and vertical neighbours. [`IntensityImageTerm`] is the stock
//! provider for grayscale images.
use crate::error::{Error, Result};
use crate::geom::{Point, Rect};
use crate::image::ImageF32;
use log::debug;
use serde::{Deserialize, Serialize};

/// Image costs of a region, row-major.
///
/// `horizontal[y * (w - 1) + x]` couples `(x, y)` with `(x + 1, y)`;
/// `vertical[y * w + x]` couples `(x, y)` with `(x, y + 1)`.
#[derive(Clone, Debug)]
pub struct ImageCosts {
    region: Rect,
    fg: Vec<f64>,
    bg: Vec<f64>,
    horizontal: Vec<f64>,
    vertical: Vec<f64>,
}

impl ImageCosts {
    pub fn new(
        region: Rect,
        fg: Vec<f64>,
        bg: Vec<f64>,
        horizontal: Vec<f64>,
        vertical: Vec<f64>,
    ) -> Result<Self> {
        let (w, h) = (region.width, region.height);
        let check = |what: &'static str, len: usize, expected: usize| {
            if len == expected {
                Ok(())
            } else {
                Err(Error::SizeMismatch {
                    what,
                    expected,
                    actual: len,
                })
            }
        };
        check("foreground costs", fg.len(), w * h)?;
        check("background costs", bg.len(), w * h)?;
        check("horizontal weights", horizontal.len(), w.saturating_sub(1) * h)?;
        check("vertical weights", vertical.len(), w * h.saturating_sub(1))?;

        if fg.iter().chain(&bg).any(|v| !v.is_finite()) {
            return Err(Error::NonFiniteBound("unary cost"));
        }
        if horizontal
            .iter()
            .chain(&vertical)
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(Error::InvalidParameter(
                "pairwise weights must be finite and non-negative".to_string(),
            ));
        }
        Ok(Self {
            region,
            fg,
            bg,
            horizontal,
            vertical,
        })
    }

    /// Same unaries for every pixel and a constant smoothness weight.
    pub fn uniform(region: Rect, fg: f64, bg: f64, pairwise: f64) -> Result<Self> {
        let (w, h) = (region.width, region.height);
        Self::new(
            region,
            vec![fg; w * h],
            vec![bg; w * h],
            vec![pairwise; w.saturating_sub(1) * h],
            vec![pairwise; w * h.saturating_sub(1)],
        )
    }

    pub fn region(&self) -> Rect {
        self.region
    }

    pub fn fg(&self) -> &[f64] {
        &self.fg
    }

    pub fn bg(&self) -> &[f64] {
        &self.bg
    }

    pub fn horizontal(&self) -> &[f64] {
        &self.horizontal
    }

    pub fn vertical(&self) -> &[f64] {
        &self.vertical
    }
}

/// Source of image costs for a pixel region.
pub trait ImageTermProvider: Sync {
    fn image_costs(&self, region: Rect) -> Result<ImageCosts>;
}

impl ImageTermProvider for ImageCosts {
    fn image_costs(&self, region: Rect) -> Result<ImageCosts> {
        if region != self.region {
            return Err(Error::ImageTerm(format!(
                "costs cover {:?}, requested {region:?}",
                self.region
            )));
        }
        Ok(self.clone())
    }
}

/// Normal intensity distribution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaussianIntensity {
    pub mean: f64,
    pub std: f64,
}

impl GaussianIntensity {
    /// Negative log-likelihood up to a shared constant.
    #[inline]
    pub fn cost(&self, value: f64) -> f64 {
        let z = (value - self.mean) / self.std;
        0.5 * z * z + self.std.ln()
    }

    fn estimate(values: &[f64], min_std: f64) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        Some(Self {
            mean,
            std: var.sqrt().max(min_std),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntensityModelParams {
    /// Scale of the intensity unaries.
    pub unary_weight: f64,
    /// Smoothness weight between equal intensities.
    pub pairwise_weight: f64,
    /// Intensity difference at which the smoothness weight falls to `e^-0.5`.
    pub contrast_sigma: f64,
    /// Floor on estimated standard deviations.
    pub min_std: f64,
}

impl Default for IntensityModelParams {
    fn default() -> Self {
        Self {
            unary_weight: 1.0,
            pairwise_weight: 0.5,
            contrast_sigma: 0.1,
            min_std: 0.02,
        }
    }
}

impl IntensityModelParams {
    /// Weights must be finite and non-negative; `contrast_sigma` and
    /// `min_std` divide the intensities and must be positive.
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("unary_weight", self.unary_weight),
            ("pairwise_weight", self.pairwise_weight),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(Error::InvalidParameter(format!(
                    "intensity.{name} must be finite and non-negative, got {v}"
                )));
            }
        }
        for (name, v) in [("contrast_sigma", self.contrast_sigma), ("min_std", self.min_std)] {
            if !(v.is_finite() && v > 0.0) {
                return Err(Error::InvalidParameter(format!(
                    "intensity.{name} must be finite and positive, got {v}"
                )));
            }
        }
        Ok(())
    }
}

/// Gaussian object/background intensity models with contrast-sensitive
/// smoothness, over an `ImageF32` with values in `[0, 1]`.
#[derive(Clone, Debug)]
pub struct IntensityImageTerm {
    image: ImageF32,
    object: GaussianIntensity,
    background: GaussianIntensity,
    params: IntensityModelParams,
}

impl IntensityImageTerm {
    pub fn new(
        image: ImageF32,
        object: GaussianIntensity,
        background: GaussianIntensity,
        params: IntensityModelParams,
    ) -> Self {
        Self {
            image,
            object,
            background,
            params,
        }
    }

    /// Estimates the object model from pixels inside `location` and the
    /// background model from the rest of the image.
    pub fn from_location(image: ImageF32, location: Rect, params: IntensityModelParams) -> Result<Self> {
        params.validate()?;
        let mut inside = Vec::new();
        let mut outside = Vec::new();
        for y in 0..image.h {
            for x in 0..image.w {
                let v = image.get(x, y) as f64;
                if location.contains(Point::new(x as i32, y as i32)) {
                    inside.push(v);
                } else {
                    outside.push(v);
                }
            }
        }
        let object = GaussianIntensity::estimate(&inside, params.min_std)
            .ok_or_else(|| Error::ImageTerm(format!("location {location:?} holds no pixels")))?;
        let background = GaussianIntensity::estimate(&outside, params.min_std).ok_or_else(|| {
            Error::ImageTerm(format!("location {location:?} leaves no background pixels"))
        })?;
        debug!(
            "intensity models: object mean={:.3} std={:.3}, background mean={:.3} std={:.3}",
            object.mean,
            object.std,
            background.mean,
            background.std
        );
        Ok(Self::new(image, object, background, params))
    }

    pub fn object(&self) -> &GaussianIntensity {
        &self.object
    }

    pub fn background(&self) -> &GaussianIntensity {
        &self.background
    }

    fn smoothness(&self, a: f64, b: f64) -> f64 {
        let d = (a - b) / self.params.contrast_sigma;
        self.params.pairwise_weight * (-0.5 * d * d).exp()
    }
}

impl ImageTermProvider for IntensityImageTerm {
    fn image_costs(&self, region: Rect) -> Result<ImageCosts> {
        let fits = region.x >= 0
            && region.y >= 0
            && region.x as usize + region.width <= self.image.w
            && region.y as usize + region.height <= self.image.h;
        if !fits {
            return Err(Error::ImageTerm(format!(
                "region {region:?} exceeds image {}x{}",
                self.image.w, self.image.h
            )));
        }
        let (w, h) = (region.width, region.height);
        let (x0, y0) = (region.x as usize, region.y as usize);
        let value = |x: usize, y: usize| self.image.get(x0 + x, y0 + y) as f64;

        let k = self.params.unary_weight;
        let mut fg = Vec::with_capacity(w * h);
        let mut bg = Vec::with_capacity(w * h);
        let mut horizontal = Vec::with_capacity(w.saturating_sub(1) * h);
        let mut vertical = Vec::with_capacity(w * h.saturating_sub(1));
        for y in 0..h {
            for x in 0..w {
                let v = value(x, y);
                fg.push(k * self.object.cost(v));
                bg.push(k * self.background.cost(v));
                if x + 1 < w {
                    horizontal.push(self.smoothness(v, value(x + 1, y)));
                }
            }
        }
        for y in 0..h.saturating_sub(1) {
            for x in 0..w {
                vertical.push(self.smoothness(value(x, y), value(x, y + 1)));
            }
        }
        ImageCosts::new(region, fg, bg, horizontal, vertical)
    }
}
