//! Borrowed 8-bit grayscale view, as decoded from disk.
use super::traits::ImageView;
use super::BinaryMask;

#[derive(Clone, Copy, Debug)]
pub struct ImageU8<'a> {
    pub w: usize,
    pub h: usize,
    /// Bytes between rows (>= `w`)
    pub stride: usize,
    pub data: &'a [u8],
}

impl<'a> ImageU8<'a> {
    /// Tightly packed view; `None` when `data` is too short.
    pub fn new(w: usize, h: usize, data: &'a [u8]) -> Option<Self> {
        Self::with_stride(w, h, w, data)
    }

    /// View over rows padded to `stride` bytes.
    pub fn with_stride(w: usize, h: usize, stride: usize, data: &'a [u8]) -> Option<Self> {
        let needed = if h == 0 { 0 } else { (h - 1) * stride + w };
        (stride >= w && data.len() >= needed).then_some(Self { w, h, stride, data })
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }

    /// Mask of pixels darker than `level`.
    pub fn below(&self, level: u8) -> BinaryMask {
        let mut mask = BinaryMask::new(self.w, self.h);
        for (y, row) in self.rows().enumerate() {
            for (x, &v) in row.iter().enumerate() {
                mask.set(x, y, v < level);
            }
        }
        mask
    }
}

impl ImageView for ImageU8<'_> {
    type Pixel = u8;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_rows_and_threshold() {
        let data = [0u8, 200, 99, 130, 10, 99];
        let view = ImageU8::with_stride(2, 2, 3, &data).unwrap();
        assert_eq!(view.row(1), &[130, 10]);
        let mask = view.below(128);
        assert!(mask.get(0, 0) && !mask.get(1, 0));
        assert!(!mask.get(0, 1) && mask.get(1, 1));
        assert!(ImageU8::new(3, 2, &data[..5]).is_none());
        assert!(ImageU8::with_stride(4, 1, 3, &data).is_none());
    }
}
