use std::fmt::{Debug, Formatter};
use std::sync::OnceLock;

use super::poly::FieldPolynomial;
use crate::common::error::{QRError, QRResult};

// Galois field
//------------------------------------------------------------------------------

/// Arithmetic over GF(2^n) backed by exponent and log tables.
///
/// Elements are stored as `u16`, which covers every field up to GF(2^16). The
/// tables are built once at construction and never change afterwards, so a
/// field can be shared freely behind a `&'static` reference.
pub struct GaloisField {
    exp: Vec<u16>,
    log: Vec<u16>,
    primitive: u32,
    size: usize,
    gen_base: usize,
}

impl GaloisField {
    /// Builds the tables for the field generated by `primitive`.
    ///
    /// Fails with [`QRError::FieldDefinition`] when `primitive` is not primitive
    /// for a field of `size` elements, i.e. when powers of `x` do not walk
    /// every nonzero element before returning to 1.
    pub fn new(primitive: u32, size: usize, gen_base: usize) -> QRResult<Self> {
        if !size.is_power_of_two() || !(4..=1 << 16).contains(&size) {
            return Err(QRError::InvalidArgument("field size must be a power of two in 4..=65536"));
        }
        if gen_base >= size {
            return Err(QRError::InvalidArgument("generator base must be smaller than field size"));
        }
        // Degree must be exactly log2(size)
        let degree_ok = primitive as usize & size != 0 && (primitive as usize) < size << 1;
        if !degree_ok {
            return Err(QRError::FieldDefinition { primitive, size });
        }

        let mut exp = vec![0u16; size];
        let mut x = 1usize;
        for e in exp.iter_mut() {
            *e = x as u16;
            x <<= 1;
            if x >= size {
                x ^= primitive as usize;
                x &= size - 1;
            }
        }

        // Powers of x must return to 1 after exactly size - 1 steps
        let returns_early = exp[1..size - 1].iter().any(|&e| e == 1);
        if exp[size - 1] != 1 || returns_early {
            return Err(QRError::FieldDefinition { primitive, size });
        }

        let mut log = vec![0u16; size];
        for (i, &e) in exp.iter().take(size - 1).enumerate() {
            log[e as usize] = i as u16;
        }

        Ok(Self { exp, log, primitive, size, gen_base })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn primitive(&self) -> u32 {
        self.primitive
    }

    pub fn generator_base(&self) -> usize {
        self.gen_base
    }

    /// 2 to the power of `a` in the field. Exponents wrap modulo `size - 1`.
    pub fn exp(&self, a: usize) -> u16 {
        self.exp[a % (self.size - 1)]
    }

    pub fn log(&self, a: u16) -> QRResult<usize> {
        self.check_element(a)?;
        if a == 0 {
            return Err(QRError::InvalidArgument("log of zero is undefined"));
        }
        Ok(self.log[a as usize] as usize)
    }

    pub fn inverse(&self, a: u16) -> QRResult<u16> {
        self.check_element(a)?;
        if a == 0 {
            return Err(QRError::InvalidArgument("zero has no inverse"));
        }
        Ok(self.exp[self.size - 1 - self.log[a as usize] as usize])
    }

    pub fn multiply(&self, a: u16, b: u16) -> u16 {
        debug_assert!((a as usize) < self.size, "Element {a} outside field of size {}", self.size);
        debug_assert!((b as usize) < self.size, "Element {b} outside field of size {}", self.size);

        if a == 0 || b == 0 {
            return 0;
        }
        let log_sum = self.log[a as usize] as usize + self.log[b as usize] as usize;
        self.exp[log_sum % (self.size - 1)]
    }

    /// Addition and subtraction coincide in characteristic 2.
    pub fn add_or_subtract(a: u16, b: u16) -> u16 {
        a ^ b
    }

    pub fn zero(&self) -> FieldPolynomial<'_> {
        FieldPolynomial::zero(self)
    }

    pub fn one(&self) -> FieldPolynomial<'_> {
        FieldPolynomial::one(self)
    }

    /// `coeff * x^degree`
    pub fn build_monomial(&self, degree: usize, coeff: u16) -> QRResult<FieldPolynomial<'_>> {
        self.check_element(coeff)?;
        if coeff == 0 {
            return Ok(self.zero());
        }
        let mut coeffs = vec![0; degree + 1];
        coeffs[0] = coeff;
        FieldPolynomial::new(self, coeffs)
    }

    pub(crate) fn check_element(&self, a: u16) -> QRResult<()> {
        if (a as usize) < self.size {
            Ok(())
        } else {
            Err(QRError::InvalidArgument("coefficient outside of field"))
        }
    }
}

impl Debug for GaloisField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GF(0x{:x}, {})", self.primitive, self.size)
    }
}

// Canonical fields
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum CanonicalField {
    QRCode256,
    DataMatrix256,
    AztecData12,
    AztecData10,
    AztecData8,
    AztecData6,
    AztecParam,
    MaxiCode64,
}

static QR_CODE_FIELD_256: OnceLock<GaloisField> = OnceLock::new();
static DATA_MATRIX_FIELD_256: OnceLock<GaloisField> = OnceLock::new();
static AZTEC_DATA_12: OnceLock<GaloisField> = OnceLock::new();
static AZTEC_DATA_10: OnceLock<GaloisField> = OnceLock::new();
static AZTEC_DATA_6: OnceLock<GaloisField> = OnceLock::new();
static AZTEC_PARAM: OnceLock<GaloisField> = OnceLock::new();

impl GaloisField {
    /// The field used by QR code Reed-Solomon blocks: GF(256), x^8 + x^4 + x^3 + x^2 + 1.
    pub fn qr_code_field_256() -> &'static Self {
        Self::canonical(CanonicalField::QRCode256)
    }

    pub fn canonical(field: CanonicalField) -> &'static Self {
        let (cell, primitive, size, gen_base) = match field {
            CanonicalField::QRCode256 => (&QR_CODE_FIELD_256, 0x011D, 256, 0),
            CanonicalField::DataMatrix256 | CanonicalField::AztecData8 => {
                (&DATA_MATRIX_FIELD_256, 0x012D, 256, 1)
            }
            CanonicalField::AztecData12 => (&AZTEC_DATA_12, 0x1069, 4096, 1),
            CanonicalField::AztecData10 => (&AZTEC_DATA_10, 0x0409, 1024, 1),
            CanonicalField::AztecData6 | CanonicalField::MaxiCode64 => {
                (&AZTEC_DATA_6, 0x0043, 64, 1)
            }
            CanonicalField::AztecParam => (&AZTEC_PARAM, 0x0013, 16, 1),
        };
        cell.get_or_init(|| {
            Self::new(primitive, size, gen_base)
                .unwrap_or_else(|e| unreachable!("Canonical field rejected: {e}"))
        })
    }
}

#[cfg(test)]
mod galois_tests {
    use proptest::prelude::*;
    use test_case::test_case;

    use super::{CanonicalField, GaloisField};
    use crate::common::error::QRError;

    #[test]
    fn test_exp_table() {
        let gf = GaloisField::qr_code_field_256();
        assert_eq!(gf.exp(0), 1);
        assert_eq!(gf.exp(1), 2);
        assert_eq!(gf.exp(7), 128);
        assert_eq!(gf.exp(8), 0x1D);
        assert_eq!(gf.exp(255), 1);
        assert_eq!(gf.log(2).unwrap(), 1);
        assert_eq!(gf.log(0x1D).unwrap(), 8);
    }

    #[test]
    fn test_zero_operands() {
        let gf = GaloisField::qr_code_field_256();
        assert_eq!(gf.log(0), Err(QRError::InvalidArgument("log of zero is undefined")));
        assert_eq!(gf.inverse(0), Err(QRError::InvalidArgument("zero has no inverse")));
        assert_eq!(gf.multiply(0, 123), 0);
        assert_eq!(gf.multiply(77, 0), 0);
    }

    #[test]
    fn test_out_of_field_element() {
        let gf = GaloisField::canonical(CanonicalField::AztecParam);
        assert!(gf.log(16).is_err());
        assert!(gf.build_monomial(2, 16).is_err());
    }

    #[test]
    fn test_non_primitive_polynomial() {
        // AES polynomial: irreducible, but x only has order 51
        let err = GaloisField::new(0x011B, 256, 0).unwrap_err();
        assert_eq!(err, QRError::FieldDefinition { primitive: 0x011B, size: 256 });
        // Reducible
        assert!(GaloisField::new(0x0100, 256, 0).is_err());
    }

    #[test_case(0x001D)]
    #[test_case(0x031D)]
    #[test_case(0x021D)]
    fn test_wrong_degree_polynomial(primitive: u32) {
        let err = GaloisField::new(primitive, 256, 0).unwrap_err();
        assert_eq!(err, QRError::FieldDefinition { primitive, size: 256 });
    }

    #[test]
    fn test_invalid_size() {
        assert!(GaloisField::new(0x011D, 200, 0).is_err());
        assert!(GaloisField::new(0x011D, 256, 256).is_err());
    }

    #[test_case(CanonicalField::QRCode256, 256, 0)]
    #[test_case(CanonicalField::DataMatrix256, 256, 1)]
    #[test_case(CanonicalField::AztecData12, 4096, 1)]
    #[test_case(CanonicalField::AztecData10, 1024, 1)]
    #[test_case(CanonicalField::AztecData8, 256, 1)]
    #[test_case(CanonicalField::AztecData6, 64, 1)]
    #[test_case(CanonicalField::AztecParam, 16, 1)]
    #[test_case(CanonicalField::MaxiCode64, 64, 1)]
    fn test_canonical_fields(field: CanonicalField, size: usize, gen_base: usize) {
        let gf = GaloisField::canonical(field);
        assert_eq!(gf.size(), size);
        assert_eq!(gf.generator_base(), gen_base);
        for a in 1..size as u16 {
            assert_eq!(gf.exp(gf.log(a).unwrap()), a);
            assert_eq!(gf.multiply(a, gf.inverse(a).unwrap()), 1);
        }
    }

    #[test]
    fn test_aliases_share_instance() {
        let dm = GaloisField::canonical(CanonicalField::DataMatrix256);
        let az = GaloisField::canonical(CanonicalField::AztecData8);
        assert!(std::ptr::eq(dm, az));
        let mc = GaloisField::canonical(CanonicalField::MaxiCode64);
        let a6 = GaloisField::canonical(CanonicalField::AztecData6);
        assert!(std::ptr::eq(mc, a6));
    }

    #[test]
    fn test_build_monomial() {
        let gf = GaloisField::qr_code_field_256();
        let m = gf.build_monomial(3, 5).unwrap();
        assert_eq!(m.degree(), 3);
        assert_eq!(m.coefficients(), &[5, 0, 0, 0]);
        assert!(gf.build_monomial(3, 0).unwrap().is_zero());
    }

    proptest! {
        #[test]
        fn proptest_multiply_commutes(a in 1u16..256, b in 1u16..256) {
            let gf = GaloisField::qr_code_field_256();
            prop_assert_eq!(gf.multiply(a, b), gf.multiply(b, a));
        }

        #[test]
        fn proptest_inverse_of_product(a in 1u16..256, b in 1u16..256) {
            let gf = GaloisField::qr_code_field_256();
            let lhs = gf.inverse(gf.multiply(a, b)).unwrap();
            let rhs = gf.multiply(gf.inverse(a).unwrap(), gf.inverse(b).unwrap());
            prop_assert_eq!(lhs, rhs);
        }

        #[test]
        fn proptest_exp_log(a in 1u16..256) {
            let gf = GaloisField::qr_code_field_256();
            prop_assert_eq!(gf.exp(gf.log(a).unwrap()), a);
        }

        #[test]
        fn proptest_distributive(a in 0u16..256, b in 0u16..256, c in 0u16..256) {
            let gf = GaloisField::qr_code_field_256();
            let lhs = gf.multiply(a, GaloisField::add_or_subtract(b, c));
            let rhs = GaloisField::add_or_subtract(gf.multiply(a, b), gf.multiply(a, c));
            prop_assert_eq!(lhs, rhs);
        }
    }
}
