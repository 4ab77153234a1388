use std::sync::{OnceLock, PoisonError, RwLock};

use tracing::trace;

use super::galois::GaloisField;
use super::poly::FieldPolynomial;
use crate::common::error::{QRError, QRResult};

// Codeword
//------------------------------------------------------------------------------

/// Storage type of a single codeword. Fields larger than `1 << BITS` are rejected.
pub trait Codeword: Copy + Default {
    const BITS: u32;

    fn to_element(self) -> u16;

    fn from_element(e: u16) -> Self;
}

impl Codeword for u8 {
    const BITS: u32 = 8;

    fn to_element(self) -> u16 {
        self as u16
    }

    fn from_element(e: u16) -> Self {
        debug_assert!(e <= u8::MAX as u16, "Element {e} doesn't fit in a byte");
        e as u8
    }
}

impl Codeword for u16 {
    const BITS: u32 = 16;

    fn to_element(self) -> u16 {
        self
    }

    fn from_element(e: u16) -> Self {
        e
    }
}

// Encoder
//------------------------------------------------------------------------------

/// Systematic Reed-Solomon encoder over a single field.
///
/// Generator polynomials are cached by degree. The cache only ever grows, so
/// concurrent readers never observe a polynomial being replaced.
pub struct ReedSolomonEncoder<'f> {
    field: &'f GaloisField,
    generators: RwLock<Vec<FieldPolynomial<'f>>>,
}

static QR_ENCODER: OnceLock<ReedSolomonEncoder<'static>> = OnceLock::new();

impl<'f> ReedSolomonEncoder<'f> {
    pub fn new(field: &'f GaloisField) -> Self {
        Self { field, generators: RwLock::new(vec![field.one()]) }
    }

    /// Process-wide encoder over the QR code field.
    pub fn qr() -> &'static ReedSolomonEncoder<'static> {
        QR_ENCODER.get_or_init(|| ReedSolomonEncoder::new(GaloisField::qr_code_field_256()))
    }

    pub fn field(&self) -> &'f GaloisField {
        self.field
    }

    /// Product of `(x - 2^(i + base))` for `i` in `0..degree`.
    pub fn build_generator(&self, degree: usize) -> QRResult<FieldPolynomial<'f>> {
        {
            let generators = self.generators.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(g) = generators.get(degree) {
                return Ok(g.clone());
            }
        }

        let mut generators = self.generators.write().unwrap_or_else(PoisonError::into_inner);
        let gen_base = self.field.generator_base();
        while generators.len() <= degree {
            let d = generators.len();
            trace!(degree = d, "Extending generator cache");
            let factor = FieldPolynomial::new(self.field, vec![1, self.field.exp(d - 1 + gen_base)])?;
            let next = generators[d - 1].multiply(&factor)?;
            generators.push(next);
        }
        Ok(generators[degree].clone())
    }

    /// Overwrites the last `ec_len` codewords of `block` with the error
    /// correction codewords of the data codewords preceding them.
    pub fn encode<T: Codeword>(&self, block: &mut [T], ec_len: usize) -> QRResult<()> {
        if ec_len == 0 {
            return Err(QRError::InvalidArgument("no error correction codewords"));
        }
        let data_len = match block.len().checked_sub(ec_len) {
            Some(n) if n > 0 => n,
            _ => return Err(QRError::InvalidArgument("no data codewords")),
        };
        if self.field.size() > 1 << T::BITS {
            return Err(QRError::InvalidArgument("field too large for codeword type"));
        }

        let generator = self.build_generator(ec_len)?;
        let info = block[..data_len].iter().map(|c| c.to_element()).collect();
        let info = FieldPolynomial::new(self.field, info)?.multiply_by_monomial(ec_len, 1)?;
        let (_, remainder) = info.divide(&generator)?;

        let coeffs = remainder.coefficients();
        let num_zero = ec_len - coeffs.len();
        let (zeros, ecc) = block[data_len..].split_at_mut(num_zero);
        zeros.fill(T::default());
        for (e, &c) in ecc.iter_mut().zip(coeffs) {
            *e = T::from_element(c);
        }
        Ok(())
    }
}
