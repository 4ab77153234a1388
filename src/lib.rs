//! # qrforge
//!
//! A Rust library for encoding QR code symbols (ISO/IEC 18004, versions 1-40)
//! with Reed-Solomon error correction.
//!
//! ## Features
//!
//! - **Symbol encoding**: Numeric, alphanumeric and byte modes, smallest fitting version,
//!   block interleaving and penalty-scored mask selection
//! - **Character sets**: Text is converted with an [`encoding_rs`] encoding and announced
//!   with an ECI header, or written as ISO-8859-1 when no encoding is set
//! - **Reed-Solomon**: Galois fields, polynomials, a cached generator encoder and a
//!   Euclidean decoder, usable on their own
//! - **Format & version information**: BCH encoding and error tolerant decoding
//!
//! ## Quick Start
//!
//! ```rust
//! use qrforge::QRBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Smallest version, level L and the best mask are chosen automatically
//! let qr = QRBuilder::new(b"Hello, World!").build()?;
//!
//! assert_eq!(qr.width(), 21);
//! let top_left_dark = qr.get(0, 0);
//! assert!(top_left_dark);
//! # Ok(())
//! # }
//! ```
//!
//! ### Full Configuration
//!
//! ```rust
//! use qrforge::{ECLevel, MaskPattern, QRBuilder, Version};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let qr = QRBuilder::from_text("h\u{e9}llo")
//!     .encoding(encoding_rs::UTF_8)   // Announced with ECI 26
//!     .version(Version::get(2)?)      // If not provided, finds smallest version to fit data
//!     .ec_level(ECLevel::M)           // If not provided, defaults to ECLevel::L
//!     .mask(MaskPattern::new(3)?)     // If not provided, finds best mask based on penalty score
//!     .build()?;
//!
//! println!("{qr}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Correction Levels
//! - **L (Low)**: ~7% error correction
//! - **M (Medium)**: ~15% error correction
//! - **Q (Quartile)**: ~25% error correction
//! - **H (High)**: ~30% error correction

#![allow(clippy::items_after_test_module)]

pub mod builder;
pub(crate) mod common;
pub mod symbol;

pub use builder::QRBuilder;
pub use common::bit_utils::BitArray;
pub use common::codec::{choose_mode, eci_for_encoding, is_only_double_byte_kanji, Mode};
pub use common::ec::{
    CanonicalField, Codeword, FieldPolynomial, GaloisField, ReedSolomonDecoder,
    ReedSolomonEncoder,
};
pub use common::error::{QRError, QRResult};
pub use common::info::{decode_version_information, FormatInformation};
pub use common::mask::MaskPattern;
pub use common::matrix::BitMatrix;
pub use common::metadata::{ECLevel, EcBlock, EcBlocks, Version};
pub use symbol::QRCode;
