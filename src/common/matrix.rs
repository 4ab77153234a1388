use std::fmt::{Display, Formatter};

use super::bit_utils::BitArray;
use super::error::{QRError, QRResult};

// Bit matrix
//------------------------------------------------------------------------------

/// Two dimensional grid of bits, `x` being the column and `y` the row.
///
/// Rows are packed into 32-bit words, each row starting on a fresh word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    row_size: usize,
    bits: Vec<u32>,
}

impl BitMatrix {
    pub fn new(width: usize, height: usize) -> QRResult<Self> {
        if width == 0 || height == 0 {
            return Err(QRError::InvalidArgument("dimensions must be greater than zero"));
        }
        let row_size = width.div_ceil(32);
        Ok(Self { width, height, row_size, bits: vec![0; row_size * height] })
    }

    pub fn square(dimension: usize) -> QRResult<Self> {
        Self::new(dimension, dimension)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn offset(&self, x: usize, y: usize) -> (usize, u32) {
        debug_assert!(x < self.width, "Column out of bounds: Width {}, X {x}", self.width);
        debug_assert!(y < self.height, "Row out of bounds: Height {}, Y {y}", self.height);
        (y * self.row_size + (x >> 5), 1 << (x & 31))
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        let (i, mask) = self.offset(x, y);
        self.bits[i] & mask != 0
    }

    pub fn set(&mut self, x: usize, y: usize) {
        let (i, mask) = self.offset(x, y);
        self.bits[i] |= mask;
    }

    pub fn unset(&mut self, x: usize, y: usize) {
        let (i, mask) = self.offset(x, y);
        self.bits[i] &= !mask;
    }

    pub fn flip(&mut self, x: usize, y: usize) {
        let (i, mask) = self.offset(x, y);
        self.bits[i] ^= mask;
    }

    pub fn clear(&mut self) {
        self.bits.fill(0);
    }

    fn check_region(&self, left: usize, top: usize, width: usize, height: usize) -> QRResult<()> {
        if width == 0 || height == 0 {
            return Err(QRError::InvalidArgument("region must be at least 1x1"));
        }
        if left + width > self.width || top + height > self.height {
            return Err(QRError::InvalidArgument("region must fit inside the matrix"));
        }
        Ok(())
    }

    /// Sets every bit of the `width` x `height` region whose top left corner is `(left, top)`.
    pub fn set_region(
        &mut self,
        left: usize,
        top: usize,
        width: usize,
        height: usize,
    ) -> QRResult<()> {
        self.check_region(left, top, width, height)?;
        for y in top..top + height {
            for x in left..left + width {
                self.set(x, y);
            }
        }
        Ok(())
    }

    /// Whether every bit of the region is set.
    pub fn is_region_set(
        &self,
        left: usize,
        top: usize,
        width: usize,
        height: usize,
    ) -> QRResult<bool> {
        self.check_region(left, top, width, height)?;
        let all_set = (top..top + height).all(|y| (left..left + width).all(|x| self.get(x, y)));
        Ok(all_set)
    }

    /// Copies row `y` into a [`BitArray`] of `width` bits.
    pub fn row(&self, y: usize) -> BitArray {
        debug_assert!(y < self.height, "Row out of bounds: Height {}, Y {y}", self.height);
        let mut row = BitArray::with_len(self.row_size * 32);
        let start = y * self.row_size;
        for (w, &word) in self.bits[start..start + self.row_size].iter().enumerate() {
            row.set_bulk(w * 32, word);
        }
        let mut trimmed = BitArray::with_len(self.width);
        for x in (0..self.width).filter(|&x| row.get(x)) {
            trimmed.set(x);
        }
        trimmed
    }

    pub fn set_row(&mut self, y: usize, row: &BitArray) -> QRResult<()> {
        if row.len() != self.width {
            return Err(QRError::InvalidArgument("row length must match matrix width"));
        }
        for x in 0..self.width {
            if row.get(x) {
                self.set(x, y);
            } else {
                self.unset(x, y);
            }
        }
        Ok(())
    }

    pub fn to_string_with(&self, set: &str, unset: &str) -> String {
        let mut res = String::with_capacity(self.height * (self.width * set.len() + 1));
        for y in 0..self.height {
            for x in 0..self.width {
                res.push_str(if self.get(x, y) { set } else { unset });
            }
            res.push('\n');
        }
        res
    }
}

impl Display for BitMatrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_with("X ", "  "))
    }
}

#[cfg(test)]
mod bit_matrix_tests {
    use super::BitMatrix;
    use crate::common::bit_utils::BitArray;

    #[test]
    fn test_get_set() {
        let mut m = BitMatrix::new(33, 5).unwrap();
        assert_eq!(m.width(), 33);
        assert_eq!(m.height(), 5);
        m.set(32, 4);
        m.set(0, 0);
        assert!(m.get(32, 4));
        assert!(m.get(0, 0));
        assert!(!m.get(31, 4));
        m.flip(32, 4);
        assert!(!m.get(32, 4));
        m.unset(0, 0);
        assert!(!m.get(0, 0));
    }

    #[test]
    fn test_zero_dimension() {
        assert!(BitMatrix::new(0, 3).is_err());
        assert!(BitMatrix::square(0).is_err());
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds() {
        let m = BitMatrix::square(21).unwrap();
        m.get(21, 0);
    }

    #[test]
    fn test_region() {
        let mut m = BitMatrix::square(40).unwrap();
        m.set_region(30, 2, 5, 3).unwrap();
        assert!(m.is_region_set(30, 2, 5, 3).unwrap());
        assert!(!m.is_region_set(29, 2, 5, 3).unwrap());
        assert!(m.get(34, 4));
        assert!(!m.get(35, 4));
        assert!(m.set_region(38, 0, 3, 1).is_err());
        assert!(m.set_region(0, 0, 0, 1).is_err());
        m.clear();
        assert!(!m.get(34, 4));
    }

    #[test]
    fn test_row() {
        let mut m = BitMatrix::new(35, 2).unwrap();
        m.set(1, 1);
        m.set(34, 1);
        let row = m.row(1);
        assert_eq!(row.len(), 35);
        assert!(row.get(1) && row.get(34));
        assert!(!row.get(0));

        let mut other = BitMatrix::new(35, 2).unwrap();
        other.set_row(0, &row).unwrap();
        assert!(other.get(34, 0));
        assert!(other.set_row(0, &BitArray::with_len(3)).is_err());
    }

    #[test]
    fn test_display() {
        let mut m = BitMatrix::new(3, 2).unwrap();
        m.set(0, 0);
        m.set(2, 1);
        assert_eq!(m.to_string(), "X     \n    X \n");
        assert_eq!(m.to_string_with("1", "0"), "100\n001\n");
    }
}
