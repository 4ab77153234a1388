use std::fmt::{Display, Formatter};

use crate::common::codec::Mode;
use crate::common::mask::MaskPattern;
use crate::common::matrix::BitMatrix;
use crate::common::metadata::{ECLevel, Version};

// QR code symbol
//------------------------------------------------------------------------------

/// Finished symbol: the encoding parameters and the module matrix, dark
/// modules being set bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QRCode {
    mode: Mode,
    ec_level: ECLevel,
    version: &'static Version,
    mask: MaskPattern,
    matrix: BitMatrix,
}

impl QRCode {
    pub(crate) fn new(
        mode: Mode,
        ec_level: ECLevel,
        version: &'static Version,
        mask: MaskPattern,
        matrix: BitMatrix,
    ) -> Self {
        debug_assert_eq!(matrix.width(), version.dimension(), "Matrix doesn't fit the version");
        Self { mode, ec_level, version, mask, matrix }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ec_level
    }

    pub fn version(&self) -> &'static Version {
        self.version
    }

    pub fn mask(&self) -> MaskPattern {
        self.mask
    }

    /// Modules per side.
    pub fn width(&self) -> usize {
        self.matrix.width()
    }

    /// Whether the module in column `x` and row `y` is dark.
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.matrix.get(x, y)
    }

    pub fn matrix(&self) -> &BitMatrix {
        &self.matrix
    }

    pub fn into_matrix(self) -> BitMatrix {
        self.matrix
    }
}

impl Display for QRCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "<<")?;
        writeln!(f, " mode: {}", self.mode)?;
        writeln!(f, " ecLevel: {:?}", self.ec_level)?;
        writeln!(f, " version: {}", self.version.number())?;
        writeln!(f, " maskPattern: {}", *self.mask)?;
        writeln!(f, " matrix:")?;
        write!(f, "{}", self.matrix.to_string_with(" 1", " 0"))?;
        writeln!(f, ">>")
    }
}
