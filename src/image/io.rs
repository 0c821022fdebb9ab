//! I/O helpers for images, masks and JSON.
//!
//! - `load_grayscale_image`: read a PNG/JPEG/etc. into an owned 8-bit gray buffer.
//! - `load_grayscale_f32`: same, normalised into an `ImageF32`, optionally rescaled.
//! - `save_grayscale_f32`: write an `ImageF32` to a grayscale PNG.
//! - `save_mask`: write a `BinaryMask` as a black/white PNG.
//! - `save_rgb`: write interleaved RGB bytes to a PNG.
//! - `write_json_file` / `read_json_file`: serde JSON to and from disk.
use super::{BinaryMask, ImageF32, ImageU8, ImageView};
use image::imageops::FilterType;
use image::{GrayImage, Luma, RgbImage};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Owned 8-bit grayscale pixels as decoded from disk.
#[derive(Clone, Debug)]
pub struct GrayImageU8 {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl GrayImageU8 {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Borrow as a read-only `ImageU8` view
    pub fn as_view(&self) -> ImageU8<'_> {
        ImageU8 {
            w: self.width,
            h: self.height,
            stride: self.width,
            data: &self.data,
        }
    }
}

impl From<GrayImage> for GrayImageU8 {
    fn from(img: GrayImage) -> Self {
        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            data: img.into_raw(),
        }
    }
}

fn open_luma(path: &Path) -> Result<GrayImage, String> {
    Ok(image::open(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?
        .into_luma8())
}

/// Load an image from disk and convert to 8-bit grayscale.
pub fn load_grayscale_image(path: &Path) -> Result<GrayImageU8, String> {
    Ok(open_luma(path)?.into())
}

/// Load an image as normalised grayscale, resized by `scale` (1.0 keeps the size).
pub fn load_grayscale_f32(path: &Path, scale: f64) -> Result<ImageF32, String> {
    if !(scale > 0.0 && scale.is_finite()) {
        return Err(format!("Invalid scale {scale} for {}", path.display()));
    }
    let mut img = open_luma(path)?;
    if scale != 1.0 {
        let w = ((img.width() as f64 * scale) as u32).max(1);
        let h = ((img.height() as f64 * scale) as u32).max(1);
        img = image::imageops::resize(&img, w, h, FilterType::Triangle);
    }
    let gray = GrayImageU8::from(img);
    Ok(ImageF32::from_u8(&gray.as_view()))
}

/// Save a float image to a grayscale PNG, clamping values in [0, 255].
pub fn save_grayscale_f32(image: &ImageF32, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let mut out = GrayImage::new(image.w as u32, image.h as u32);
    for y in 0..image.h {
        let row = image.row(y);
        for (x, &px) in row.iter().enumerate() {
            let v = (px * 255.0).clamp(0.0, 255.0);
            out.put_pixel(x as u32, y as u32, Luma([v as u8]));
        }
    }
    out.save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Save a mask as a PNG with white foreground on black.
pub fn save_mask(mask: &BinaryMask, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let mut out = GrayImage::new(mask.w as u32, mask.h as u32);
    for (y, row) in mask.rows().enumerate() {
        for (x, &fg) in row.iter().enumerate() {
            out.put_pixel(x as u32, y as u32, Luma([if fg { 255 } else { 0 }]));
        }
    }
    out.save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Save interleaved 8-bit RGB data to a PNG.
pub fn save_rgb(width: usize, height: usize, rgb: Vec<u8>, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let image = RgbImage::from_raw(width as u32, height as u32, rgb)
        .ok_or_else(|| "Failed to create image buffer".to_string())?;
    image
        .save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

/// Read and deserialize a JSON file.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&data).map_err(|e| format!("Failed to parse {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
