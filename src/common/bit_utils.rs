use std::fmt::{Display, Formatter};
use std::mem;

use num_traits::PrimInt;

use super::error::{QRError, QRResult};

// Bit array
//------------------------------------------------------------------------------

/// Growable array of bits packed into 32-bit words.
///
/// Bit `i` lives in word `i / 32` at bit position `i % 32`. Appending is
/// amortized O(1); the stream writer uses it to assemble the data codewords.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitArray {
    words: Vec<u32>,
    len: usize,
}

impl BitArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Array of `len` unset bits.
    pub fn with_len(len: usize) -> Self {
        Self { words: vec![0; len.div_ceil(32)], len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn size_in_bytes(&self) -> usize {
        self.len.div_ceil(8)
    }

    pub fn get(&self, i: usize) -> bool {
        debug_assert!(i < self.len, "Out of bitarray bounds: Len {}, Pos {i}", self.len);
        (self.words[i >> 5] >> (i & 31)) & 1 != 0
    }

    pub fn set(&mut self, i: usize) {
        debug_assert!(i < self.len, "Out of bitarray bounds: Len {}, Pos {i}", self.len);
        self.words[i >> 5] |= 1 << (i & 31);
    }

    pub fn flip(&mut self, i: usize) {
        debug_assert!(i < self.len, "Out of bitarray bounds: Len {}, Pos {i}", self.len);
        self.words[i >> 5] ^= 1 << (i & 31);
    }

    /// The 32 bits starting at `i`, which must be a multiple of 32.
    pub fn get_bulk(&self, i: usize) -> u32 {
        debug_assert!(i & 31 == 0, "Bulk access must be word aligned: Pos {i}");
        self.words[i >> 5]
    }

    /// Overwrites the 32 bits starting at `i`, which must be a multiple of 32.
    pub fn set_bulk(&mut self, i: usize, word: u32) {
        debug_assert!(i & 31 == 0, "Bulk access must be word aligned: Pos {i}");
        self.words[i >> 5] = word;
    }

    /// Sets every bit in `start..end`.
    pub fn set_range(&mut self, start: usize, end: usize) -> QRResult<()> {
        self.check_range(start, end)?;
        self.range_masks(start, end).for_each(|(w, mask)| self.words[w] |= mask);
        Ok(())
    }

    /// Whether every bit in `start..end` equals `value`. Empty ranges are uniform.
    pub fn is_range(&self, start: usize, end: usize, value: bool) -> QRResult<bool> {
        self.check_range(start, end)?;
        let expected = |mask: u32| if value { mask } else { 0 };
        Ok(self.range_masks(start, end).all(|(w, mask)| self.words[w] & mask == expected(mask)))
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    fn check_range(&self, start: usize, end: usize) -> QRResult<()> {
        if end < start || end > self.len {
            return Err(QRError::InvalidArgument("bit range out of bounds"));
        }
        Ok(())
    }

    // (word index, mask of bits inside the range) for each word touched by start..end
    fn range_masks(&self, start: usize, end: usize) -> impl Iterator<Item = (usize, u32)> {
        let first = start >> 5;
        let last = if end == start { first } else { (end - 1) >> 5 };
        (first..=last).filter(move |_| end > start).map(move |w| {
            let lo = if w == first { start & 31 } else { 0 };
            let hi = if w == last { ((end - 1) & 31) + 1 } else { 32 };
            let mask = (u32::MAX >> (32 - (hi - lo))) << lo;
            (w, mask)
        })
    }
}

// Push bits for bit array
//------------------------------------------------------------------------------

impl BitArray {
    pub fn push(&mut self, bit: bool) {
        if self.len & 31 == 0 {
            self.words.push(0);
        }
        if bit {
            self.words[self.len >> 5] |= 1 << (self.len & 31);
        }
        self.len += 1;
    }

    /// Appends the `size` least significant bits of `bits`, most significant first.
    pub fn push_bits<T>(&mut self, bits: T, size: usize)
    where
        T: PrimInt + Display,
    {
        let max_bits = mem::size_of::<T>() * 8;
        debug_assert!(size <= max_bits, "Bit count exceeds type width: Size {size}");
        debug_assert!(
            size >= max_bits - bits.leading_zeros() as usize,
            "Bit count shouldn't exceed bit length: Length {size}, Bits {bits}"
        );

        for i in (0..size).rev() {
            self.push((bits >> i) & T::one() == T::one());
        }
    }

    pub fn extend(&mut self, other: &BitArray) {
        for i in 0..other.len {
            self.push(other.get(i));
        }
    }

    pub fn extend_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.push_bits(b, 8);
        }
    }

    pub fn xor(&mut self, other: &BitArray) -> QRResult<()> {
        if self.len != other.len {
            return Err(QRError::InvalidArgument("bit arrays differ in size"));
        }
        for (w, &o) in self.words.iter_mut().zip(other.words.iter()) {
            *w ^= o;
        }
        Ok(())
    }

    /// Reverses the order of all bits.
    pub fn reverse(&mut self) {
        let mut reversed = vec![0u32; self.words.len()];
        for i in 0..self.len {
            if self.get(i) {
                let j = self.len - 1 - i;
                reversed[j >> 5] |= 1 << (j & 31);
            }
        }
        self.words = reversed;
    }

    /// Packs bits into bytes, eight at a time, most significant bit first.
    /// A trailing partial byte is zero padded.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.size_in_bytes()];
        self.write_bytes(0, &mut bytes);
        bytes
    }

    /// Writes `out.len()` bytes starting from bit `bit_offset`.
    pub fn write_bytes(&self, bit_offset: usize, out: &mut [u8]) {
        let mut pos = bit_offset;
        for byte in out.iter_mut() {
            let mut b = 0u8;
            for j in 0..8 {
                if pos + j < self.len && self.get(pos + j) {
                    b |= 0x80 >> j;
                }
            }
            *byte = b;
            pos += 8;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(|i| self.get(i))
    }
}

impl Display for BitArray {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for i in 0..self.len {
            if i & 7 == 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", if self.get(i) { 'X' } else { '.' })?;
        }
        Ok(())
    }
}
