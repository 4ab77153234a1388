use std::fmt::{Debug, Formatter};

use super::galois::GaloisField;
use crate::common::error::{QRError, QRResult};

// Field polynomial
//------------------------------------------------------------------------------

/// Polynomial with coefficients in a [`GaloisField`], most significant first.
///
/// Coefficients are normalized on construction: leading zeros are stripped,
/// and the zero polynomial is stored as `[0]`.
#[derive(Clone)]
pub struct FieldPolynomial<'f> {
    field: &'f GaloisField,
    coeffs: Vec<u16>,
}

impl<'f> FieldPolynomial<'f> {
    pub fn new(field: &'f GaloisField, coeffs: Vec<u16>) -> QRResult<Self> {
        if coeffs.is_empty() {
            return Err(QRError::InvalidArgument("polynomial needs at least one coefficient"));
        }
        for &c in coeffs.iter() {
            field.check_element(c)?;
        }
        Ok(Self::normalized(field, coeffs))
    }

    // Coefficients must already lie inside the field
    fn normalized(field: &'f GaloisField, mut coeffs: Vec<u16>) -> Self {
        match coeffs.iter().position(|&c| c != 0) {
            Some(0) => {}
            Some(first) => {
                coeffs.drain(..first);
            }
            None => {
                coeffs.clear();
                coeffs.push(0);
            }
        }
        Self { field, coeffs }
    }

    pub(crate) fn zero(field: &'f GaloisField) -> Self {
        Self { field, coeffs: vec![0] }
    }

    pub(crate) fn one(field: &'f GaloisField) -> Self {
        Self { field, coeffs: vec![1] }
    }

    pub fn field(&self) -> &'f GaloisField {
        self.field
    }

    pub fn coefficients(&self) -> &[u16] {
        &self.coeffs
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs[0] == 0
    }

    /// Coefficient of the `x^degree` term, zero beyond the polynomial's degree.
    pub fn coefficient(&self, degree: usize) -> u16 {
        match self.degree().checked_sub(degree) {
            Some(i) => self.coeffs[i],
            None => 0,
        }
    }

    pub fn evaluate_at(&self, x: u16) -> u16 {
        match x {
            0 => self.coefficient(0),
            1 => self.coeffs.iter().fold(0, |acc, &c| GaloisField::add_or_subtract(acc, c)),
            _ => self.coeffs.iter().fold(0, |acc, &c| {
                GaloisField::add_or_subtract(self.field.multiply(x, acc), c)
            }),
        }
    }

    fn check_same_field(&self, other: &Self) -> QRResult<()> {
        if std::ptr::eq(self.field, other.field) {
            Ok(())
        } else {
            Err(QRError::InvalidArgument("polynomials do not share a field"))
        }
    }
}

// Arithmetic
//------------------------------------------------------------------------------

impl<'f> FieldPolynomial<'f> {
    pub fn add_or_subtract(&self, other: &Self) -> QRResult<Self> {
        self.check_same_field(other)?;
        if self.is_zero() {
            return Ok(other.clone());
        }
        if other.is_zero() {
            return Ok(self.clone());
        }

        let (small, large) = if self.coeffs.len() > other.coeffs.len() {
            (&other.coeffs, &self.coeffs)
        } else {
            (&self.coeffs, &other.coeffs)
        };
        let diff = large.len() - small.len();
        let mut sum = large.clone();
        for (s, &c) in sum[diff..].iter_mut().zip(small.iter()) {
            *s = GaloisField::add_or_subtract(*s, c);
        }
        Ok(Self::normalized(self.field, sum))
    }

    pub fn multiply(&self, other: &Self) -> QRResult<Self> {
        self.check_same_field(other)?;
        if self.is_zero() || other.is_zero() {
            return Ok(Self::zero(self.field));
        }

        let mut product = vec![0; self.coeffs.len() + other.coeffs.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            for (j, &b) in other.coeffs.iter().enumerate() {
                product[i + j] =
                    GaloisField::add_or_subtract(product[i + j], self.field.multiply(a, b));
            }
        }
        Ok(Self::normalized(self.field, product))
    }

    pub fn multiply_scalar(&self, scalar: u16) -> QRResult<Self> {
        self.field.check_element(scalar)?;
        match scalar {
            0 => Ok(Self::zero(self.field)),
            1 => Ok(self.clone()),
            _ => {
                let coeffs = self.coeffs.iter().map(|&c| self.field.multiply(c, scalar)).collect();
                Ok(Self::normalized(self.field, coeffs))
            }
        }
    }

    /// `self * coeff * x^degree`
    pub fn multiply_by_monomial(&self, degree: usize, coeff: u16) -> QRResult<Self> {
        self.field.check_element(coeff)?;
        if coeff == 0 {
            return Ok(Self::zero(self.field));
        }
        let mut product = Vec::with_capacity(self.coeffs.len() + degree);
        product.extend(self.coeffs.iter().map(|&c| self.field.multiply(c, coeff)));
        product.resize(self.coeffs.len() + degree, 0);
        Ok(Self::normalized(self.field, product))
    }

    /// Long division, returning `(quotient, remainder)`.
    pub fn divide(&self, divisor: &Self) -> QRResult<(Self, Self)> {
        self.check_same_field(divisor)?;
        if divisor.is_zero() {
            return Err(QRError::InvalidArgument("divide by zero polynomial"));
        }

        let field = self.field;
        let mut quotient = Self::zero(field);
        let mut remainder = self.clone();

        let lead_inv = field.inverse(divisor.coefficient(divisor.degree()))?;
        while remainder.degree() >= divisor.degree() && !remainder.is_zero() {
            let degree_diff = remainder.degree() - divisor.degree();
            let scale = field.multiply(remainder.coefficient(remainder.degree()), lead_inv);
            let term = divisor.multiply_by_monomial(degree_diff, scale)?;
            let iter_quotient = field.build_monomial(degree_diff, scale)?;
            quotient = quotient.add_or_subtract(&iter_quotient)?;
            remainder = remainder.add_or_subtract(&term)?;
        }

        Ok((quotient, remainder))
    }
}

impl PartialEq for FieldPolynomial<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.field, other.field) && self.coeffs == other.coeffs
    }
}

impl Eq for FieldPolynomial<'_> {}

impl Debug for FieldPolynomial<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let mut terms = Vec::with_capacity(self.coeffs.len());
        for degree in (0..=self.degree()).rev() {
            let c = self.coefficient(degree);
            if c == 0 {
                continue;
            }
            let term = match degree {
                0 => format!("{c}"),
                1 => format!("{c}x"),
                _ => format!("{c}x^{degree}"),
            };
            terms.push(term);
        }
        write!(f, "{}", terms.join(" + "))
    }
}
