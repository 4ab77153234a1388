use std::sync::OnceLock;

use super::error::{QRError, QRResult};
use super::info::version_info;
use super::matrix::BitMatrix;

// Error correction level
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Hash)]
pub enum ECLevel {
    L = 0,
    M = 1,
    Q = 2,
    H = 3,
}

impl ECLevel {
    /// Two bit code used in the format information.
    pub fn bits(self) -> u32 {
        match self {
            Self::L => 0b01,
            Self::M => 0b00,
            Self::Q => 0b11,
            Self::H => 0b10,
        }
    }

    pub fn from_bits(bits: u32) -> QRResult<Self> {
        match bits {
            0b01 => Ok(Self::L),
            0b00 => Ok(Self::M),
            0b11 => Ok(Self::Q),
            0b10 => Ok(Self::H),
            _ => Err(QRError::InvalidECLevel),
        }
    }

    /// Approximate share of codewords that can be restored, in percent.
    pub fn recovery_percent(self) -> usize {
        match self {
            Self::L => 7,
            Self::M => 15,
            Self::Q => 25,
            Self::H => 30,
        }
    }
}

#[cfg(test)]
mod ec_level_tests {
    use test_case::test_case;

    use super::ECLevel;
    use crate::common::error::QRError;

    #[test_case(ECLevel::L, 0b01)]
    #[test_case(ECLevel::M, 0b00)]
    #[test_case(ECLevel::Q, 0b11)]
    #[test_case(ECLevel::H, 0b10)]
    fn test_bits(ecl: ECLevel, bits: u32) {
        assert_eq!(ecl.bits(), bits);
        assert_eq!(ECLevel::from_bits(bits), Ok(ecl));
    }

    #[test]
    fn test_invalid_bits() {
        assert_eq!(ECLevel::from_bits(4), Err(QRError::InvalidECLevel));
    }

    #[test]
    fn test_recovery_increases() {
        let levels = [ECLevel::L, ECLevel::M, ECLevel::Q, ECLevel::H];
        assert!(levels.windows(2).all(|w| w[0].recovery_percent() < w[1].recovery_percent()));
    }
}

// Error correction blocks
//------------------------------------------------------------------------------

/// `count` blocks of `data_codewords` data codewords each.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct EcBlock {
    count: usize,
    data_codewords: usize,
}

impl EcBlock {
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn data_codewords(&self) -> usize {
        self.data_codewords
    }
}

/// Block layout of one version at one error correction level: one or two
/// groups of blocks sharing the same number of error correction codewords.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct EcBlocks {
    ec_codewords_per_block: usize,
    blocks: Vec<EcBlock>,
}

impl EcBlocks {
    pub fn ec_codewords_per_block(&self) -> usize {
        self.ec_codewords_per_block
    }

    /// Block groups in table order, shorter blocks first.
    pub fn blocks(&self) -> &[EcBlock] {
        &self.blocks
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.iter().map(|b| b.count).sum()
    }

    pub fn total_ec_codewords(&self) -> usize {
        self.ec_codewords_per_block * self.num_blocks()
    }

    pub fn total_data_codewords(&self) -> usize {
        self.blocks.iter().map(|b| b.count * b.data_codewords).sum()
    }

    pub fn total_codewords(&self) -> usize {
        self.total_ec_codewords() + self.total_data_codewords()
    }

    /// Data codeword count of every block, in placement order.
    pub fn data_codewords_per_block(&self) -> impl Iterator<Item = usize> + '_ {
        self.blocks.iter().flat_map(|b| std::iter::repeat(b.data_codewords).take(b.count))
    }
}

// Version
//------------------------------------------------------------------------------

/// Symbol version 1 to 40 with its layout and capacity data.
///
/// Versions are built once and shared; obtain them through [`Version::get`].
#[derive(Debug, PartialEq, Eq)]
pub struct Version {
    number: usize,
    alignment_pattern_centers: &'static [usize],
    ec_blocks: [EcBlocks; 4],
    total_codewords: usize,
}

static VERSIONS: OnceLock<Vec<Version>> = OnceLock::new();

impl Version {
    pub fn get(number: usize) -> QRResult<&'static Version> {
        if !(1..=40).contains(&number) {
            return Err(QRError::InvalidVersion);
        }
        let versions = VERSIONS.get_or_init(|| (1..=40).map(Self::build).collect());
        Ok(&versions[number - 1])
    }

    /// All 40 versions in ascending order.
    pub fn all() -> impl Iterator<Item = &'static Version> {
        (1..=40).filter_map(|n| Self::get(n).ok())
    }

    fn build(number: usize) -> Self {
        let ec_blocks = EC_BLOCKS_TABLE[number - 1].map(|(ec_codewords_per_block, groups)| {
            let blocks = groups
                .iter()
                .filter(|&&(count, _)| count > 0)
                .map(|&(count, data_codewords)| EcBlock { count, data_codewords })
                .collect();
            EcBlocks { ec_codewords_per_block, blocks }
        });
        let total_codewords = ec_blocks[0].total_codewords();
        Self {
            number,
            alignment_pattern_centers: ALIGNMENT_PATTERN_CENTERS[number - 1],
            ec_blocks,
            total_codewords,
        }
    }

    /// Version implied by a symbol `dimension`, without checking any other property.
    pub fn provisional_for_dimension(dimension: usize) -> QRResult<&'static Version> {
        if dimension % 4 != 1 || dimension < 21 {
            return Err(QRError::InvalidArgument("dimension must be 17 + 4 * version"));
        }
        Self::get((dimension - 17) >> 2)
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn dimension(&self) -> usize {
        self.number * 4 + 17
    }

    pub fn alignment_pattern_centers(&self) -> &'static [usize] {
        self.alignment_pattern_centers
    }

    pub fn ec_blocks(&self, ec_level: ECLevel) -> &EcBlocks {
        &self.ec_blocks[ec_level as usize]
    }

    pub fn total_codewords(&self) -> usize {
        self.total_codewords
    }

    pub fn data_codewords(&self, ec_level: ECLevel) -> usize {
        self.ec_blocks(ec_level).total_data_codewords()
    }

    pub fn data_bit_capacity(&self, ec_level: ECLevel) -> usize {
        self.data_codewords(ec_level) << 3
    }

    /// Modules left over after the last full codeword, filled with light modules.
    pub fn remainder_bits(&self) -> usize {
        raw_data_modules(self.number) - (self.total_codewords << 3)
    }

    /// 18 bit version information, present from version 7 on.
    pub fn info(&self) -> Option<u32> {
        (self.number >= 7).then(|| version_info(self.number as u32))
    }

    /// Marks every function module: finders with separators and format areas,
    /// alignment patterns, timing patterns and version areas.
    pub fn build_function_pattern(&self) -> QRResult<BitMatrix> {
        let dimension = self.dimension();
        let mut matrix = BitMatrix::square(dimension)?;

        matrix.set_region(0, 0, 9, 9)?;
        matrix.set_region(dimension - 8, 0, 8, 9)?;
        matrix.set_region(0, dimension - 8, 9, 8)?;

        let centers = self.alignment_pattern_centers;
        let max = centers.len();
        for (x, &cx) in centers.iter().enumerate() {
            for (y, &cy) in centers.iter().enumerate() {
                let overlaps_finder = (x == 0 && (y == 0 || y == max - 1)) || (x == max - 1 && y == 0);
                if !overlaps_finder {
                    matrix.set_region(cy - 2, cx - 2, 5, 5)?;
                }
            }
        }

        matrix.set_region(6, 9, 1, dimension - 17)?;
        matrix.set_region(9, 6, dimension - 17, 1)?;

        if self.number > 6 {
            matrix.set_region(dimension - 11, 0, 3, 6)?;
            matrix.set_region(0, dimension - 11, 6, 3)?;
        }

        Ok(matrix)
    }
}

// Modules available for codewords and remainder bits
fn raw_data_modules(version: usize) -> usize {
    let mut modules = (16 * version + 128) * version + 64;
    if version >= 2 {
        let n = version / 7 + 2;
        modules -= (25 * n - 10) * n - 55;
        if version >= 7 {
            modules -= 36;
        }
    }
    modules
}


// Global constants
//------------------------------------------------------------------------------

static ALIGNMENT_PATTERN_CENTERS: [&[usize]; 40] = [
    &[],
    &[6, 18],
    &[6, 22],
    &[6, 26],
    &[6, 30],
    &[6, 34],
    &[6, 22, 38],
    &[6, 24, 42],
    &[6, 26, 46],
    &[6, 28, 50],
    &[6, 30, 54],
    &[6, 32, 58],
    &[6, 34, 62],
    &[6, 26, 46, 66],
    &[6, 26, 48, 70],
    &[6, 26, 50, 74],
    &[6, 30, 54, 78],
    &[6, 30, 56, 82],
    &[6, 30, 58, 86],
    &[6, 34, 62, 90],
    &[6, 28, 50, 72, 94],
    &[6, 26, 50, 74, 98],
    &[6, 30, 54, 78, 102],
    &[6, 28, 54, 80, 106],
    &[6, 32, 58, 84, 110],
    &[6, 30, 58, 86, 114],
    &[6, 34, 62, 90, 118],
    &[6, 26, 50, 74, 98, 122],
    &[6, 30, 54, 78, 102, 126],
    &[6, 26, 52, 78, 104, 130],
    &[6, 30, 56, 82, 108, 134],
    &[6, 34, 60, 86, 112, 138],
    &[6, 30, 58, 86, 114, 142],
    &[6, 34, 62, 90, 118, 146],
    &[6, 30, 54, 78, 102, 126, 150],
    &[6, 24, 50, 76, 102, 128, 154],
    &[6, 28, 54, 80, 106, 132, 158],
    &[6, 32, 58, 84, 110, 136, 162],
    &[6, 26, 54, 82, 110, 138, 166],
    &[6, 30, 58, 86, 114, 142, 170],
];

// Per version, for L, M, Q and H: (ec codewords per block, [(block count, data codewords); 2]).
// An empty second group is (0, 0).
#[rustfmt::skip]
static EC_BLOCKS_TABLE: [[(usize, [(usize, usize); 2]); 4]; 40] = [
    [(7, [(1, 19), (0, 0)]), (10, [(1, 16), (0, 0)]), (13, [(1, 13), (0, 0)]), (17, [(1, 9), (0, 0)])],
    [(10, [(1, 34), (0, 0)]), (16, [(1, 28), (0, 0)]), (22, [(1, 22), (0, 0)]), (28, [(1, 16), (0, 0)])],
    [(15, [(1, 55), (0, 0)]), (26, [(1, 44), (0, 0)]), (18, [(2, 17), (0, 0)]), (22, [(2, 13), (0, 0)])],
    [(20, [(1, 80), (0, 0)]), (18, [(2, 32), (0, 0)]), (26, [(2, 24), (0, 0)]), (16, [(4, 9), (0, 0)])],
    [(26, [(1, 108), (0, 0)]), (24, [(2, 43), (0, 0)]), (18, [(2, 15), (2, 16)]), (22, [(2, 11), (2, 12)])],
    [(18, [(2, 68), (0, 0)]), (16, [(4, 27), (0, 0)]), (24, [(4, 19), (0, 0)]), (28, [(4, 15), (0, 0)])],
    [(20, [(2, 78), (0, 0)]), (18, [(4, 31), (0, 0)]), (18, [(2, 14), (4, 15)]), (26, [(4, 13), (1, 14)])],
    [(24, [(2, 97), (0, 0)]), (22, [(2, 38), (2, 39)]), (22, [(4, 18), (2, 19)]), (26, [(4, 14), (2, 15)])],
    [(30, [(2, 116), (0, 0)]), (22, [(3, 36), (2, 37)]), (20, [(4, 16), (4, 17)]), (24, [(4, 12), (4, 13)])],
    [(18, [(2, 68), (2, 69)]), (26, [(4, 43), (1, 44)]), (24, [(6, 19), (2, 20)]), (28, [(6, 15), (2, 16)])],
    [(20, [(4, 81), (0, 0)]), (30, [(1, 50), (4, 51)]), (28, [(4, 22), (4, 23)]), (24, [(3, 12), (8, 13)])],
    [(24, [(2, 92), (2, 93)]), (22, [(6, 36), (2, 37)]), (26, [(4, 20), (6, 21)]), (28, [(7, 14), (4, 15)])],
    [(26, [(4, 107), (0, 0)]), (22, [(8, 37), (1, 38)]), (24, [(8, 20), (4, 21)]), (22, [(12, 11), (4, 12)])],
    [(30, [(3, 115), (1, 116)]), (24, [(4, 40), (5, 41)]), (20, [(11, 16), (5, 17)]), (24, [(11, 12), (5, 13)])],
    [(22, [(5, 87), (1, 88)]), (24, [(5, 41), (5, 42)]), (30, [(5, 24), (7, 25)]), (24, [(11, 12), (7, 13)])],
    [(24, [(5, 98), (1, 99)]), (28, [(7, 45), (3, 46)]), (24, [(15, 19), (2, 20)]), (30, [(3, 15), (13, 16)])],
    [(28, [(1, 107), (5, 108)]), (28, [(10, 46), (1, 47)]), (28, [(1, 22), (15, 23)]), (28, [(2, 14), (17, 15)])],
    [(30, [(5, 120), (1, 121)]), (26, [(9, 43), (4, 44)]), (28, [(17, 22), (1, 23)]), (28, [(2, 14), (19, 15)])],
    [(28, [(3, 113), (4, 114)]), (26, [(3, 44), (11, 45)]), (26, [(17, 21), (4, 22)]), (26, [(9, 13), (16, 14)])],
    [(28, [(3, 107), (5, 108)]), (26, [(3, 41), (13, 42)]), (30, [(15, 24), (5, 25)]), (28, [(15, 15), (10, 16)])],
    [(28, [(4, 116), (4, 117)]), (26, [(17, 42), (0, 0)]), (28, [(17, 22), (6, 23)]), (30, [(19, 16), (6, 17)])],
    [(28, [(2, 111), (7, 112)]), (28, [(17, 46), (0, 0)]), (30, [(7, 24), (16, 25)]), (24, [(34, 13), (0, 0)])],
    [(30, [(4, 121), (5, 122)]), (28, [(4, 47), (14, 48)]), (30, [(11, 24), (14, 25)]), (30, [(16, 15), (14, 16)])],
    [(30, [(6, 117), (4, 118)]), (28, [(6, 45), (14, 46)]), (30, [(11, 24), (16, 25)]), (30, [(30, 16), (2, 17)])],
    [(26, [(8, 106), (4, 107)]), (28, [(8, 47), (13, 48)]), (30, [(7, 24), (22, 25)]), (30, [(22, 15), (13, 16)])],
    [(28, [(10, 114), (2, 115)]), (28, [(19, 46), (4, 47)]), (28, [(28, 22), (6, 23)]), (30, [(33, 16), (4, 17)])],
    [(30, [(8, 122), (4, 123)]), (28, [(22, 45), (3, 46)]), (30, [(8, 23), (26, 24)]), (30, [(12, 15), (28, 16)])],
    [(30, [(3, 117), (10, 118)]), (28, [(3, 45), (23, 46)]), (30, [(4, 24), (31, 25)]), (30, [(11, 15), (31, 16)])],
    [(30, [(7, 116), (7, 117)]), (28, [(21, 45), (7, 46)]), (30, [(1, 23), (37, 24)]), (30, [(19, 15), (26, 16)])],
    [(30, [(5, 115), (10, 116)]), (28, [(19, 47), (10, 48)]), (30, [(15, 24), (25, 25)]), (30, [(23, 15), (25, 16)])],
    [(30, [(13, 115), (3, 116)]), (28, [(2, 46), (29, 47)]), (30, [(42, 24), (1, 25)]), (30, [(23, 15), (28, 16)])],
    [(30, [(17, 115), (0, 0)]), (28, [(10, 46), (23, 47)]), (30, [(10, 24), (35, 25)]), (30, [(19, 15), (35, 16)])],
    [(30, [(17, 115), (1, 116)]), (28, [(14, 46), (21, 47)]), (30, [(29, 24), (19, 25)]), (30, [(11, 15), (46, 16)])],
    [(30, [(13, 115), (6, 116)]), (28, [(14, 46), (23, 47)]), (30, [(44, 24), (7, 25)]), (30, [(59, 16), (1, 17)])],
    [(30, [(12, 121), (7, 122)]), (28, [(12, 47), (26, 48)]), (30, [(39, 24), (14, 25)]), (30, [(22, 15), (41, 16)])],
    [(30, [(6, 121), (14, 122)]), (28, [(6, 47), (34, 48)]), (30, [(46, 24), (10, 25)]), (30, [(2, 15), (64, 16)])],
    [(30, [(17, 122), (4, 123)]), (28, [(29, 46), (14, 47)]), (30, [(49, 24), (10, 25)]), (30, [(24, 15), (46, 16)])],
    [(30, [(4, 122), (18, 123)]), (28, [(13, 46), (32, 47)]), (30, [(48, 24), (14, 25)]), (30, [(42, 15), (32, 16)])],
    [(30, [(20, 117), (4, 118)]), (28, [(40, 47), (7, 48)]), (30, [(43, 24), (22, 25)]), (30, [(10, 15), (67, 16)])],
    [(30, [(19, 118), (6, 119)]), (28, [(18, 47), (31, 48)]), (30, [(34, 24), (34, 25)]), (30, [(20, 15), (61, 16)])],
];
