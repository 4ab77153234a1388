use tracing::{debug, debug_span};

use super::encoder::Codeword;
use super::galois::GaloisField;
use super::poly::FieldPolynomial;
use crate::common::error::{QRError, QRResult};

// Decoder
//------------------------------------------------------------------------------

/// Reed-Solomon decoder: syndromes, extended Euclid, Chien search and Forney.
pub struct ReedSolomonDecoder<'f> {
    field: &'f GaloisField,
}

impl<'f> ReedSolomonDecoder<'f> {
    pub fn new(field: &'f GaloisField) -> Self {
        Self { field }
    }

    pub fn qr() -> ReedSolomonDecoder<'static> {
        ReedSolomonDecoder::new(GaloisField::qr_code_field_256())
    }

    /// Corrects `received` in place, where the last `two_s` codewords are
    /// error correction codewords. Returns the number of corrected codewords.
    pub fn decode<T: Codeword>(&self, received: &mut [T], two_s: usize) -> QRResult<usize> {
        let _span = debug_span!("rs_decode", len = received.len(), two_s).entered();
        if two_s == 0 || two_s >= received.len() {
            return Err(QRError::InvalidArgument("block needs data and ec codewords"));
        }
        let field = self.field;

        let elements = received.iter().map(|c| c.to_element()).collect();
        let poly = FieldPolynomial::new(field, elements)?;

        let mut syndromes = vec![0; two_s];
        for i in 0..two_s {
            syndromes[two_s - 1 - i] = poly.evaluate_at(field.exp(i + field.generator_base()));
        }
        if syndromes.iter().all(|&s| s == 0) {
            return Ok(0);
        }

        let syndrome = FieldPolynomial::new(field, syndromes)?;
        let (sigma, omega) =
            self.run_euclidean_algorithm(field.build_monomial(two_s, 1)?, syndrome, two_s)?;
        let locations = self.find_error_locations(&sigma)?;
        let magnitudes = self.find_error_magnitudes(&omega, &locations)?;

        for (&loc, &mag) in locations.iter().zip(magnitudes.iter()) {
            let pos = (received.len() - 1)
                .checked_sub(field.log(loc)?)
                .ok_or(QRError::TooManyErrors)?;
            let corrected = GaloisField::add_or_subtract(received[pos].to_element(), mag);
            received[pos] = T::from_element(corrected);
        }

        debug!(corrections = locations.len(), "Corrected errors");
        Ok(locations.len())
    }

    // Returns (sigma, omega): error locator and error evaluator
    fn run_euclidean_algorithm(
        &self,
        a: FieldPolynomial<'f>,
        b: FieldPolynomial<'f>,
        two_s: usize,
    ) -> QRResult<(FieldPolynomial<'f>, FieldPolynomial<'f>)> {
        let field = self.field;
        let (a, b) = if a.degree() < b.degree() { (b, a) } else { (a, b) };

        let mut r_last = a;
        let mut r = b;
        let mut t_last = field.zero();
        let mut t = field.one();

        while r.degree() >= two_s / 2 {
            let r_last_last = std::mem::replace(&mut r_last, r);
            let t_last_last = std::mem::replace(&mut t_last, t);

            if r_last.is_zero() {
                return Err(QRError::TooManyErrors);
            }

            r = r_last_last;
            let mut q = field.zero();
            let dlt_inverse = field.inverse(r_last.coefficient(r_last.degree()))?;
            while r.degree() >= r_last.degree() && !r.is_zero() {
                let degree_diff = r.degree() - r_last.degree();
                let scale = field.multiply(r.coefficient(r.degree()), dlt_inverse);
                q = q.add_or_subtract(&field.build_monomial(degree_diff, scale)?)?;
                r = r.add_or_subtract(&r_last.multiply_by_monomial(degree_diff, scale)?)?;
            }

            t = q.multiply(&t_last)?.add_or_subtract(&t_last_last)?;

            if r.degree() >= r_last.degree() && !r.is_zero() {
                return Err(QRError::TooManyErrors);
            }
        }

        let sigma_tilde_at_zero = t.coefficient(0);
        if sigma_tilde_at_zero == 0 {
            return Err(QRError::TooManyErrors);
        }

        let inverse = field.inverse(sigma_tilde_at_zero)?;
        Ok((t.multiply_scalar(inverse)?, r.multiply_scalar(inverse)?))
    }

    // Chien search by brute force over every nonzero element
    fn find_error_locations(&self, sigma: &FieldPolynomial<'f>) -> QRResult<Vec<u16>> {
        let num_errors = sigma.degree();
        if num_errors == 1 {
            return Ok(vec![sigma.coefficient(1)]);
        }

        let mut locations = Vec::with_capacity(num_errors);
        for i in 1..self.field.size() as u16 {
            if locations.len() == num_errors {
                break;
            }
            if sigma.evaluate_at(i) == 0 {
                locations.push(self.field.inverse(i)?);
            }
        }

        if locations.len() != num_errors {
            return Err(QRError::TooManyErrors);
        }
        Ok(locations)
    }

    // Forney's formula, with the derivative of sigma evaluated in product form
    fn find_error_magnitudes(
        &self,
        omega: &FieldPolynomial<'f>,
        locations: &[u16],
    ) -> QRResult<Vec<u16>> {
        let field = self.field;
        let mut magnitudes = Vec::with_capacity(locations.len());
        for (i, &loc) in locations.iter().enumerate() {
            let xi_inverse = field.inverse(loc)?;
            let mut denominator = 1;
            for (j, &other) in locations.iter().enumerate() {
                if i != j {
                    let term = field.multiply(other, xi_inverse);
                    denominator = field.multiply(denominator, term ^ 1);
                }
            }
            if denominator == 0 {
                return Err(QRError::TooManyErrors);
            }

            let mut mag = field.multiply(omega.evaluate_at(xi_inverse), field.inverse(denominator)?);
            if field.generator_base() != 0 {
                mag = field.multiply(mag, xi_inverse);
            }
            magnitudes.push(mag);
        }
        Ok(magnitudes)
    }
}

// Rectifier for format and version infos
//------------------------------------------------------------------------------

/// Nearest valid codeword to `info` by Hamming distance, accepted when the
/// distance is at most `err_capacity`.
pub fn rectify_info(info: u32, valid_numbers: &[u32], err_capacity: u32) -> QRResult<u32> {
    let res = *valid_numbers
        .iter()
        .min_by_key(|&n| (info ^ n).count_ones())
        .ok_or(QRError::InvalidArgument("no valid codewords"))?;

    if (info ^ res).count_ones() <= err_capacity {
        Ok(res)
    } else {
        Err(QRError::InvalidInfo)
    }
}

#[cfg(test)]
mod decoder_tests {
    use proptest::prelude::*;
    use rand::seq::index::sample;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use test_case::test_case;

    use super::{rectify_info, ReedSolomonDecoder};
    use crate::common::ec::encoder::ReedSolomonEncoder;
    use crate::common::ec::galois::{CanonicalField, GaloisField};
    use crate::common::error::QRError;

    fn encoded(data: &[u8], ec_len: usize) -> Vec<u8> {
        let mut block = data.to_vec();
        block.resize(data.len() + ec_len, 0);
        ReedSolomonEncoder::qr().encode(&mut block, ec_len).unwrap();
        block
    }

    #[test]
    fn test_no_errors() {
        let data = [32, 91, 11, 120, 209, 114, 220, 77, 67, 64, 236, 17, 236, 17, 236, 17];
        let mut block = encoded(&data, 10);
        let copy = block.clone();
        assert_eq!(ReedSolomonDecoder::qr().decode(&mut block, 10), Ok(0));
        assert_eq!(block, copy);
    }

    #[test_case(&[5], &[0x2e])]
    #[test_case(&[5, 10], &[0x2e, 0xf9])]
    #[test_case(&[0, 13, 14], &[0xff, 0x01, 0x80])]
    fn test_correct_errors(positions: &[usize], flips: &[u8]) {
        let data = [32, 91, 11, 45, 89, 123, 77, 44, 56, 99, 202];
        let original = encoded(&data, 8);
        let mut block = original.clone();
        for (&p, &f) in positions.iter().zip(flips) {
            block[p] ^= f;
        }
        let corrected = ReedSolomonDecoder::qr().decode(&mut block, 8).unwrap();
        assert_eq!(corrected, positions.len());
        assert_eq!(block, original);
    }

    #[test_case(0)]
    #[test_case(3)]
    #[test_case(10)]
    fn test_invalid_ec_length(two_s: usize) {
        let mut block = [1u8, 2, 3];
        assert_eq!(
            ReedSolomonDecoder::qr().decode(&mut block, two_s),
            Err(QRError::InvalidArgument("block needs data and ec codewords"))
        );
        assert_eq!(block, [1, 2, 3]);
    }

    #[test]
    fn test_too_many_errors() {
        let data = [32, 91, 11, 45, 89, 123, 77, 44, 56, 99, 202];
        let original = encoded(&data, 4);
        let mut block = original.clone();
        for (i, b) in block.iter_mut().take(6).enumerate() {
            *b ^= 0x5a + i as u8;
        }
        // Either detected, or miscorrected towards another codeword
        match ReedSolomonDecoder::qr().decode(&mut block, 4) {
            Err(e) => assert_eq!(e, QRError::TooManyErrors),
            Ok(_) => assert_ne!(block, original),
        }
    }

    #[test]
    fn test_data_matrix_field() {
        let gf = GaloisField::canonical(CanonicalField::DataMatrix256);
        let enc = ReedSolomonEncoder::new(gf);
        let mut block = vec![142u8, 164, 186, 0, 0, 0, 0, 0];
        enc.encode(&mut block, 5).unwrap();
        let original = block.clone();
        block[1] ^= 0x33;
        block[6] ^= 0x01;
        let dec = ReedSolomonDecoder::new(gf);
        assert_eq!(dec.decode(&mut block, 5), Ok(2));
        assert_eq!(block, original);
    }

    #[test]
    fn test_wide_codewords() {
        let gf = GaloisField::canonical(CanonicalField::AztecData12);
        let enc = ReedSolomonEncoder::new(gf);
        let mut block = vec![4000u16, 17, 2048, 999, 0, 0, 0, 0, 0, 0];
        enc.encode(&mut block, 6).unwrap();
        let original = block.clone();
        block[0] = 1;
        block[3] = 4095;
        block[9] ^= 7;
        assert_eq!(ReedSolomonDecoder::new(gf).decode(&mut block, 6), Ok(3));
        assert_eq!(block, original);
    }

    #[test]
    fn test_rectify_info() {
        let valid = [0b10101, 0b01010, 0b11111];
        assert_eq!(rectify_info(0b10101, &valid, 1), Ok(0b10101));
        assert_eq!(rectify_info(0b10111, &valid, 1), Ok(0b10101));
        assert_eq!(rectify_info(0b00111, &valid, 1), Err(QRError::InvalidInfo));
        assert!(rectify_info(0, &[], 3).is_err());
    }

    proptest! {
        #[test]
        fn proptest_correct_up_to_capacity(
            data in prop::collection::vec(any::<u8>(), 1..60),
            ec_len in 2usize..31,
            seed in any::<u64>(),
        ) {
            let original = encoded(&data, ec_len);
            let mut block = original.clone();
            let mut rng = StdRng::seed_from_u64(seed);
            let num_errors = rng.random_range(0..=ec_len / 2);
            for pos in sample(&mut rng, block.len(), num_errors) {
                block[pos] ^= rng.random_range(1..=255u8);
            }
            let corrected = ReedSolomonDecoder::qr().decode(&mut block, ec_len).unwrap();
            prop_assert_eq!(corrected, num_errors);
            prop_assert_eq!(block, original);
        }
    }
}
