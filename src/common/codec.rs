use std::fmt::{Display, Formatter};

use encoding_rs::{Encoding, SHIFT_JIS};

use super::error::{QRError, QRResult};
use super::metadata::Version;

pub use encode::*;

// Mode
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Mode {
    Terminator,
    Numeric,
    Alphanumeric,
    Byte,
    Eci,
    Kanji,
}

impl Mode {
    /// 4 bit mode indicator.
    pub fn bits(self) -> u8 {
        match self {
            Self::Terminator => 0b0000,
            Self::Numeric => 0b0001,
            Self::Alphanumeric => 0b0010,
            Self::Byte => 0b0100,
            Self::Eci => 0b0111,
            Self::Kanji => 0b1000,
        }
    }

    /// Width of the character count indicator in `version`.
    pub fn char_count_bits(self, version: &Version) -> usize {
        let widths = match self {
            Self::Numeric => [10, 12, 14],
            Self::Alphanumeric => [9, 11, 13],
            Self::Byte => [8, 16, 16],
            Self::Kanji => [8, 10, 12],
            Self::Eci | Self::Terminator => return 0,
        };
        match version.number() {
            1..=9 => widths[0],
            10..=26 => widths[1],
            _ => widths[2],
        }
    }

    #[inline]
    fn numeric_digit(char: u8) -> u16 {
        debug_assert!(Mode::Numeric.contains(char), "Invalid numeric data: {char}");
        (char - b'0') as u16
    }

    #[inline]
    fn alphanumeric_digit(char: u8) -> u16 {
        debug_assert!(Mode::Alphanumeric.contains(char), "Invalid alphanumeric data: {char}");
        match char {
            b'0'..=b'9' => (char - b'0') as u16,
            b'A'..=b'Z' => (char - b'A' + 10) as u16,
            b' ' => 36,
            b'$' => 37,
            b'%' => 38,
            b'*' => 39,
            b'+' => 40,
            b'-' => 41,
            b'.' => 42,
            b'/' => 43,
            b':' => 44,
            _ => unreachable!("Invalid alphanumeric {char}"),
        }
    }

    pub fn encode_chunk(&self, data: &[u8]) -> u16 {
        let len = data.len();
        match self {
            Self::Numeric => {
                debug_assert!(len <= 3, "Data is too long for numeric conversion: {len}");
                data.iter().fold(0_u16, |n, b| n * 10 + Self::numeric_digit(*b))
            }
            Self::Alphanumeric => {
                debug_assert!(len <= 2, "Data is too long for alphanumeric conversion: {len}");
                data.iter().fold(0_u16, |n, b| n * 45 + Self::alphanumeric_digit(*b))
            }
            Self::Byte => {
                debug_assert!(len == 1, "Data is too long for byte conversion: {len}");
                data[0] as u16
            }
            _ => unreachable!("Mode {self:?} has no chunk encoding"),
        }
    }

    pub fn contains(&self, byte: u8) -> bool {
        match self {
            Self::Numeric => byte.is_ascii_digit(),
            Self::Alphanumeric => {
                matches!(byte, b'0'..=b'9' | b'A'..=b'Z' | b' ' | b'$' | b'%' | b'*' | b'+' | b'-' | b'.' | b'/' | b':')
            }
            Self::Byte => true,
            Self::Kanji | Self::Eci | Self::Terminator => false,
        }
    }

    /// Bit length of `len` characters, excluding the header.
    pub fn encoded_len(&self, len: usize) -> usize {
        match *self {
            Self::Numeric => (len * 10 + 2) / 3,
            Self::Alphanumeric => (len * 11 + 1) / 2,
            Self::Byte => len * 8,
            Self::Kanji => len * 13,
            Self::Eci | Self::Terminator => 0,
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Terminator => "TERMINATOR",
            Self::Numeric => "NUMERIC",
            Self::Alphanumeric => "ALPHANUMERIC",
            Self::Byte => "BYTE",
            Self::Eci => "ECI",
            Self::Kanji => "KANJI",
        };
        f.write_str(name)
    }
}

/// Numeric if every byte is a digit, alphanumeric if every byte belongs to the
/// 45 character set, byte otherwise. Empty content is byte.
pub fn choose_mode(data: &[u8]) -> Mode {
    if data.is_empty() {
        Mode::Byte
    } else if data.iter().all(|&b| Mode::Numeric.contains(b)) {
        Mode::Numeric
    } else if data.iter().all(|&b| Mode::Alphanumeric.contains(b)) {
        Mode::Alphanumeric
    } else {
        Mode::Byte
    }
}

/// Whether `content` converts to Shift_JIS as double byte characters only.
/// Such content is still encoded in byte mode.
pub fn is_only_double_byte_kanji(content: &str) -> bool {
    let (bytes, _, had_errors) = SHIFT_JIS.encode(content);
    if had_errors || bytes.is_empty() || bytes.len() % 2 != 0 {
        return false;
    }
    bytes.chunks_exact(2).all(|pair| matches!(pair[0], 0x81..=0x9F | 0xE0..=0xEB))
}


// Extended channel interpretation
//------------------------------------------------------------------------------

/// ECI assignment announcing `encoding`.
pub fn eci_for_encoding(encoding: &'static Encoding) -> QRResult<u32> {
    let value = match encoding.name() {
        "ISO-8859-2" => 4,
        "ISO-8859-3" => 5,
        "ISO-8859-4" => 6,
        "ISO-8859-5" => 7,
        "ISO-8859-6" => 8,
        "ISO-8859-7" => 9,
        "ISO-8859-8" | "ISO-8859-8-I" => 10,
        "windows-1254" => 11,
        "ISO-8859-10" => 12,
        "windows-874" => 13,
        "ISO-8859-13" => 15,
        "ISO-8859-14" => 16,
        "ISO-8859-15" => 17,
        "ISO-8859-16" => 18,
        "Shift_JIS" => 20,
        "windows-1250" => 21,
        "windows-1251" => 22,
        "windows-1252" => 23,
        "windows-1256" => 24,
        "UTF-8" => 26,
        "Big5" => 28,
        "GBK" | "gb18030" => 29,
        "EUC-KR" => 30,
        name => return Err(QRError::UnsupportedEncoding(name)),
    };
    Ok(value)
}


// Segment
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment<'a> {
    mode: Mode,
    eci: Option<u32>,
    data: &'a [u8],
}

impl<'a> Segment<'a> {
    pub fn new(mode: Mode, eci: Option<u32>, data: &'a [u8]) -> Self {
        Self { mode, eci, data }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Mode indicator, ECI header if any, character count and data bits.
    pub fn bit_len(&self, version: &Version) -> usize {
        let eci_bits = if self.eci.is_some() { MODE_INDICATOR_BITS + ECI_VALUE_BITS } else { 0 };
        let encoded_bits = self.mode.encoded_len(self.data.len());
        eci_bits + MODE_INDICATOR_BITS + self.mode.char_count_bits(version) + encoded_bits
    }
}


// Writer for encoded data
//------------------------------------------------------------------------------

mod writer {
    use super::{Mode, Segment, ECI_VALUE_BITS, MODE_INDICATOR_BITS, PADDING_CODEWORDS};
    use crate::common::bit_utils::BitArray;
    use crate::common::metadata::Version;

    pub fn push_segment(seg: &Segment, version: &Version, out: &mut BitArray) {
        push_header(seg, version, out);
        match seg.mode {
            Mode::Numeric => push_numeric_data(seg.data, out),
            Mode::Alphanumeric => push_alphanumeric_data(seg.data, out),
            Mode::Byte => push_byte_data(seg.data, out),
            _ => unreachable!("Segment mode is chosen by choose_mode"),
        }
    }

    pub(super) fn push_header(seg: &Segment, version: &Version, out: &mut BitArray) {
        if let Some(eci) = seg.eci {
            out.push_bits(Mode::Eci.bits(), MODE_INDICATOR_BITS);
            out.push_bits(eci, ECI_VALUE_BITS);
        }
        out.push_bits(seg.mode.bits(), MODE_INDICATOR_BITS);
        let len_bits = seg.mode.char_count_bits(version);
        let char_cnt = seg.data.len();
        debug_assert!(
            char_cnt < (1 << len_bits),
            "Char count exceeds bit length: Char count {char_cnt}, Char count bits {len_bits}"
        );
        out.push_bits(char_cnt as u16, len_bits);
    }

    pub(super) fn push_numeric_data(data: &[u8], out: &mut BitArray) {
        for chunk in data.chunks(3) {
            let len = Mode::Numeric.encoded_len(chunk.len());
            let data = Mode::Numeric.encode_chunk(chunk);
            out.push_bits(data, len);
        }
    }

    pub(super) fn push_alphanumeric_data(data: &[u8], out: &mut BitArray) {
        for chunk in data.chunks(2) {
            let len = Mode::Alphanumeric.encoded_len(chunk.len());
            let data = Mode::Alphanumeric.encode_chunk(chunk);
            out.push_bits(data, len);
        }
    }

    pub(super) fn push_byte_data(data: &[u8], out: &mut BitArray) {
        out.extend_bytes(data);
    }

    /// Up to 4 zero bits, fewer when capacity runs out.
    pub fn push_terminator(out: &mut BitArray, bit_capacity: usize) {
        let term_len = std::cmp::min(4, bit_capacity.saturating_sub(out.len()));
        out.push_bits(Mode::Terminator.bits(), term_len);
    }

    pub fn pad_remaining_capacity(out: &mut BitArray, bit_capacity: usize) {
        push_padding_bits(out);
        push_padding_codewords(out, bit_capacity);
    }

    pub(super) fn push_padding_bits(out: &mut BitArray) {
        let offset = out.len() & 7;
        if offset > 0 {
            out.push_bits(0, 8 - offset);
        }
    }

    pub(super) fn push_padding_codewords(out: &mut BitArray, bit_capacity: usize) {
        debug_assert!(
            out.len() & 7 == 0,
            "Bit offset should be zero before padding codewords: {}",
            out.len() & 7
        );

        let remain_byte_capacity = bit_capacity.saturating_sub(out.len()) >> 3;
        PADDING_CODEWORDS.iter().copied().cycle().take(remain_byte_capacity).for_each(|pc| {
            out.push_bits(pc, 8);
        });
    }

}

// Encoder
//------------------------------------------------------------------------------

mod encode {
    use tracing::debug;

    use super::writer::{pad_remaining_capacity, push_segment, push_terminator};
    use super::{choose_mode, Mode, Segment};
    use crate::common::bit_utils::BitArray;
    use crate::common::error::{QRError, QRResult};
    use crate::common::metadata::{ECLevel, Version};

    /// Encodes `data` into the data codewords of the smallest version that fits.
    pub fn encode(
        data: &[u8],
        ecl: ECLevel,
        eci: Option<u32>,
    ) -> QRResult<(BitArray, Mode, &'static Version)> {
        let seg = build_segment(data, eci);
        let ver = find_version(&seg, ecl)?;
        debug!(version = ver.number(), mode = %seg.mode(), "Chose version");
        let bs = write_segment(&seg, ver, ecl);
        Ok((bs, seg.mode(), ver))
    }

    /// Encodes `data` into the data codewords of a fixed `ver`.
    pub fn encode_with_version(
        data: &[u8],
        ecl: ECLevel,
        eci: Option<u32>,
        ver: &'static Version,
    ) -> QRResult<(BitArray, Mode)> {
        let seg = build_segment(data, eci);
        if seg.bit_len(ver) > ver.data_bit_capacity(ecl) {
            return Err(QRError::DataTooLong);
        }
        let bs = write_segment(&seg, ver, ecl);
        Ok((bs, seg.mode()))
    }

    fn build_segment(data: &[u8], eci: Option<u32>) -> Segment<'_> {
        let mode = choose_mode(data);
        // Only byte content depends on the character set
        let eci = if mode == Mode::Byte { eci } else { None };
        Segment::new(mode, eci, data)
    }

    // Count indicator width changes at versions 10 and 27, so the size is
    // recomputed for every candidate
    pub(crate) fn find_version(seg: &Segment, ecl: ECLevel) -> QRResult<&'static Version> {
        Version::all()
            .find(|v| seg.bit_len(v) <= v.data_bit_capacity(ecl))
            .ok_or(QRError::DataTooLong)
    }

    fn write_segment(seg: &Segment, ver: &Version, ecl: ECLevel) -> BitArray {
        let bit_capacity = ver.data_bit_capacity(ecl);
        let mut bs = BitArray::new();
        push_segment(seg, ver, &mut bs);
        push_terminator(&mut bs, bit_capacity);
        pad_remaining_capacity(&mut bs, bit_capacity);
        debug_assert_eq!(bs.len(), bit_capacity, "Encoded data must fill the data capacity");
        bs
    }

}

// Global constants
//------------------------------------------------------------------------------

pub(crate) const MODE_INDICATOR_BITS: usize = 4;

pub(crate) const ECI_VALUE_BITS: usize = 8;

static PADDING_CODEWORDS: [u8; 2] = [0b1110_1100, 0b0001_0001];
