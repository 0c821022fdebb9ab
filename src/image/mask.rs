//! Owned binary mask, row-major with no padding.
//!
//! `true` marks foreground pixels. Used for segmentation labelings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    /// Mask width in pixels
    pub w: usize,
    /// Mask height in pixels
    pub h: usize,
    /// Backing storage in row-major order
    pub data: Vec<bool>,
}

impl BinaryMask {
    /// All-background mask of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![false; w * h],
        }
    }

    /// Wraps row-major labels; `None` when the length does not match.
    pub fn from_labels(w: usize, h: usize, data: Vec<bool>) -> Option<Self> {
        (data.len() == w * h).then_some(Self {
            w,
            h,
            data,
        })
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.w + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: bool) {
        self.data[y * self.w + x] = v;
    }

    /// Number of foreground pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Number of pixels where the two masks disagree.
    ///
    /// # Panics
    /// If the sizes differ.
    pub fn mismatch(&self, other: &BinaryMask) -> usize {
        assert_eq!((self.w, self.h), (other.w, other.h), "mask sizes differ");
        self.data
            .iter()
            .zip(&other.data)
            .filter(|(a, b)| a != b)
            .count()
    }
}

impl crate::image::traits::ImageView for BinaryMask {
    type Pixel = bool;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[bool] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageView;

    #[test]
    fn counts_and_mismatch() {
        let mut a = BinaryMask::new(4, 3);
        let mut b = BinaryMask::new(4, 3);
        a.set(1, 1, true);
        a.set(2, 1, true);
        b.set(2, 1, true);
        b.set(3, 2, true);
        assert_eq!(a.count(), 2);
        assert_eq!(a.mismatch(&b), 2);
        assert_eq!(a.row(1), &[false, true, true, false]);
        assert!(BinaryMask::from_labels(2, 2, vec![true; 3]).is_none());
    }
}
