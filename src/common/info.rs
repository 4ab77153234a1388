use super::ec::rectify_info;
use super::error::QRResult;
use super::mask::MaskPattern;
use super::metadata::{ECLevel, Version};

// Format information
//------------------------------------------------------------------------------

/// Error correction level and mask pattern, as carried by the 15 bit format
/// information next to the finder patterns.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub struct FormatInformation {
    ec_level: ECLevel,
    mask: MaskPattern,
}

impl FormatInformation {
    pub fn new(ec_level: ECLevel, mask: MaskPattern) -> Self {
        Self { ec_level, mask }
    }

    /// Parses the 5 data bits: 2 bits of level followed by 3 bits of mask.
    pub fn decode_bits(bits: u32) -> QRResult<Self> {
        let ec_level = ECLevel::from_bits((bits >> 3) & 0b11)?;
        let mask = MaskPattern::new((bits & 0b111) as u8)?;
        Ok(Self { ec_level, mask })
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ec_level
    }

    pub fn mask(&self) -> MaskPattern {
        self.mask
    }

    pub fn data_bits(&self) -> u32 {
        (self.ec_level.bits() << 3) | *self.mask as u32
    }

    /// Masked 15 bit codeword: data bits, BCH(15, 5) remainder, XOR 0x5412.
    pub fn encode(&self) -> u32 {
        format_info(self.data_bits())
    }

    /// Recovers the format from two read copies, tolerating up to 3 flipped
    /// bits. Copies that were never masked are tried as a fallback.
    pub fn decode(masked_a: u32, masked_b: u32) -> Option<Self> {
        Self::do_decode(masked_a, masked_b).or_else(|| {
            Self::do_decode(masked_a ^ FORMAT_INFO_MASK_QR, masked_b ^ FORMAT_INFO_MASK_QR)
        })
    }

    fn do_decode(masked_a: u32, masked_b: u32) -> Option<Self> {
        let mut best_diff = u32::MAX;
        let mut best_bits = 0;

        for &(target, bits) in FORMAT_INFO_DECODE_LOOKUP.iter() {
            if target == masked_a || target == masked_b {
                return Self::decode_bits(bits).ok();
            }

            for candidate in [masked_a, masked_b] {
                let diff = (candidate ^ target).count_ones();
                if diff < best_diff {
                    best_bits = bits;
                    best_diff = diff;
                }
            }
        }

        // Masked codes are at least 7 bits apart
        if best_diff <= 3 {
            Self::decode_bits(best_bits).ok()
        } else {
            None
        }
    }
}

/// Version from its 18 bit information, tolerating up to 3 flipped bits.
pub fn decode_version_information(bits: u32) -> Option<&'static Version> {
    let info = rectify_info(bits, &VERSION_INFOS, 3).ok()?;
    let index = VERSION_INFOS.iter().position(|&v| v == info)?;
    Version::get(index + 7).ok()
}

// BCH codes
//------------------------------------------------------------------------------

const fn bch_remainder(value: u32, poly: u32) -> u32 {
    let poly_len = 32 - poly.leading_zeros();
    let mut value = value << (poly_len - 1);
    while 32 - value.leading_zeros() >= poly_len {
        value ^= poly << (32 - value.leading_zeros() - poly_len);
    }
    value
}

pub(crate) const fn format_info(data_bits: u32) -> u32 {
    ((data_bits << 10) | bch_remainder(data_bits, FORMAT_INFO_POLY)) ^ FORMAT_INFO_MASK_QR
}

pub(crate) const fn version_info(version: u32) -> u32 {
    (version << 12) | bch_remainder(version, VERSION_INFO_POLY)
}


// Global constants
//------------------------------------------------------------------------------

pub const FORMAT_INFO_BIT_LEN: usize = 15;

pub const VERSION_INFO_BIT_LEN: usize = 18;

pub const FORMAT_INFO_MASK_QR: u32 = 0x5412;

// x^10 + x^8 + x^5 + x^4 + x^2 + x + 1
const FORMAT_INFO_POLY: u32 = 0x537;

// x^12 + x^11 + x^10 + x^9 + x^8 + x^5 + x^2 + 1
const VERSION_INFO_POLY: u32 = 0x1F25;

// (masked codeword, data bits)
static FORMAT_INFO_DECODE_LOOKUP: [(u32, u32); 32] = [
    (0x5412, 0x00),
    (0x5125, 0x01),
    (0x5E7C, 0x02),
    (0x5B4B, 0x03),
    (0x45F9, 0x04),
    (0x40CE, 0x05),
    (0x4F97, 0x06),
    (0x4AA0, 0x07),
    (0x77C4, 0x08),
    (0x72F3, 0x09),
    (0x7DAA, 0x0A),
    (0x789D, 0x0B),
    (0x662F, 0x0C),
    (0x6318, 0x0D),
    (0x6C41, 0x0E),
    (0x6976, 0x0F),
    (0x1689, 0x10),
    (0x13BE, 0x11),
    (0x1CE7, 0x12),
    (0x19D0, 0x13),
    (0x0762, 0x14),
    (0x0255, 0x15),
    (0x0D0C, 0x16),
    (0x083B, 0x17),
    (0x355F, 0x18),
    (0x3068, 0x19),
    (0x3F31, 0x1A),
    (0x3A06, 0x1B),
    (0x24B4, 0x1C),
    (0x2183, 0x1D),
    (0x2EDA, 0x1E),
    (0x2BED, 0x1F),
];

// Versions 7 to 40
static VERSION_INFOS: [u32; 34] = [
    0x07C94, 0x085BC, 0x09A99, 0x0A4D3, 0x0BBF6, 0x0C762, 0x0D847, 0x0E60D, 0x0F928, 0x10B78,
    0x1145D, 0x12A17, 0x13532, 0x149A6, 0x15683, 0x168C9, 0x177EC, 0x18EC4, 0x191E1, 0x1AFAB,
    0x1B08E, 0x1CC1A, 0x1D33F, 0x1ED75, 0x1F250, 0x209D5, 0x216F0, 0x228BA, 0x2379F, 0x24B0B,
    0x2542E, 0x26A64, 0x27541, 0x28C69,
];
