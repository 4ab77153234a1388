use thiserror::Error;

// Error
//------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq, Copy, Clone)]
pub enum QRError {
    // QR builder
    #[error("empty data")]
    EmptyData,
    #[error("data too long")]
    DataTooLong,
    #[error("invalid version")]
    InvalidVersion,
    #[error("invalid error correction level")]
    InvalidECLevel,
    #[error("invalid character")]
    InvalidChar,
    #[error("invalid masking pattern")]
    InvalidMaskingPattern,
    #[error("unsupported character encoding: {0}")]
    UnsupportedEncoding(&'static str),

    // Field arithmetic & error correction
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("primitive polynomial {primitive:#x} does not generate a field of size {size}")]
    FieldDefinition { primitive: u32, size: usize },
    #[error("too many errors to correct successfully")]
    TooManyErrors,
    #[error("invalid info")]
    InvalidInfo,
}

pub type QRResult<T> = Result<T, QRError>;
