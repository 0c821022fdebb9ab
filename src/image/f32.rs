//! Owned single-channel f32 image, row-major with no padding.
//!
//! Intensities are normalised to `[0, 1]`. Image terms read from this type.
use super::traits::ImageView;
use super::ImageU8;

#[derive(Clone, Debug)]
pub struct ImageF32 {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// `w * h` intensities in row-major order
    pub data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![0.0; w * h],
        }
    }

    /// Normalised copy of an 8-bit view (`0..=255` → `0.0..=1.0`).
    pub fn from_u8(src: &ImageU8<'_>) -> Self {
        let mut out = Self::new(src.w, src.h);
        if src.w == 0 {
            return out;
        }
        for (dst, row) in out.data.chunks_exact_mut(src.w).zip(src.rows()) {
            for (d, &v) in dst.iter_mut().zip(row) {
                *d = v as f32 / 255.0;
            }
        }
        out
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.w + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        self.data[y * self.w + x] = v;
    }
}

impl ImageView for ImageF32 {
    type Pixel = f32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_u8_normalises_padded_rows() {
        // 2x2 image stored with a padded stride of 3
        let data = [0u8, 255, 7, 51, 102, 9];
        let view = ImageU8::with_stride(2, 2, 3, &data).unwrap();
        let img = ImageF32::from_u8(&view);
        assert_eq!(img.get(0, 0), 0.0);
        assert_eq!(img.get(1, 0), 1.0);
        assert!((img.get(0, 1) - 0.2).abs() < 1e-6);
        assert!((img.get(1, 1) - 0.4).abs() < 1e-6);
        assert_eq!(img.data.len(), 4);
    }
}
