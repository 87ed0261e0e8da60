use super::galois::Field;
use crate::error::{QRError, QRResult};

// Polynomial over GF(256)
//------------------------------------------------------------------------------

/// Coefficients are stored highest degree first. Leading zeros are stripped on
/// construction, so the zero polynomial is always `[0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poly<'f> {
    field: &'f Field,
    coeffs: Vec<u8>,
}

impl<'f> Poly<'f> {
    pub fn new(field: &'f Field, coeffs: Vec<u8>) -> Self {
        match coeffs.iter().position(|&c| c != 0) {
            Some(0) => Self { field, coeffs },
            Some(lead) => Self { field, coeffs: coeffs[lead..].to_vec() },
            None => Self::zero(field),
        }
    }

    pub fn zero(field: &'f Field) -> Self {
        Self { field, coeffs: vec![0] }
    }

    pub fn monomial(field: &'f Field, degree: usize, coeff: u8) -> Self {
        if coeff == 0 {
            return Self::zero(field);
        }
        let mut coeffs = vec![0; degree + 1];
        coeffs[0] = coeff;
        Self { field, coeffs }
    }

    pub fn coeffs(&self) -> &[u8] {
        &self.coeffs
    }

    pub fn into_coeffs(self) -> Vec<u8> {
        self.coeffs
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs[0] == 0
    }

    /// Coefficient of x^degree
    pub fn coefficient(&self, degree: usize) -> u8 {
        if degree > self.degree() {
            return 0;
        }
        self.coeffs[self.coeffs.len() - 1 - degree]
    }

    pub fn evaluate_at(&self, x: u8) -> u8 {
        if x == 0 {
            return self.coefficient(0);
        }
        self.coeffs.iter().fold(0, |acc, &c| self.field.multiply(acc, x) ^ c)
    }
}

// Arithmetic
//------------------------------------------------------------------------------

impl<'f> Poly<'f> {
    pub fn add(&self, other: &Self) -> Self {
        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() {
            return self.clone();
        }

        let (small, large) = if self.coeffs.len() > other.coeffs.len() {
            (&other.coeffs, &self.coeffs)
        } else {
            (&self.coeffs, &other.coeffs)
        };
        let diff = large.len() - small.len();
        let mut sum = large[..diff].to_vec();
        sum.extend(large[diff..].iter().zip(small.iter()).map(|(a, b)| a ^ b));
        Self::new(self.field, sum)
    }

    pub fn multiply(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::zero(self.field);
        }

        let mut prod = vec![0; self.coeffs.len() + other.coeffs.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            for (j, &b) in other.coeffs.iter().enumerate() {
                prod[i + j] ^= self.field.multiply(a, b);
            }
        }
        Self::new(self.field, prod)
    }

    pub fn multiply_by_scalar(&self, scalar: u8) -> Self {
        match scalar {
            0 => Self::zero(self.field),
            1 => self.clone(),
            s => {
                let prod = self.coeffs.iter().map(|&c| self.field.multiply(c, s)).collect();
                Self::new(self.field, prod)
            }
        }
    }

    pub fn multiply_by_monomial(&self, degree: usize, coeff: u8) -> Self {
        if coeff == 0 {
            return Self::zero(self.field);
        }
        let mut prod: Vec<u8> =
            self.coeffs.iter().map(|&c| self.field.multiply(c, coeff)).collect();
        prod.resize(self.coeffs.len() + degree, 0);
        Self::new(self.field, prod)
    }

    /// Synthetic division. Returns (quotient, remainder).
    pub fn divide(&self, other: &Self) -> QRResult<(Self, Self)> {
        if other.is_zero() {
            return Err(QRError::DivisionByZero);
        }

        let mut quotient = Self::zero(self.field);
        let mut remainder = self.clone();
        let divisor_lead = other.coefficient(other.degree());

        while !remainder.is_zero() && remainder.degree() >= other.degree() {
            let degree_diff = remainder.degree() - other.degree();
            let scale = self.field.divide(remainder.coefficient(remainder.degree()), divisor_lead)?;
            let term = other.multiply_by_monomial(degree_diff, scale);
            quotient = quotient.add(&Self::monomial(self.field, degree_diff, scale));
            remainder = remainder.add(&term);
        }

        Ok((quotient, remainder))
    }
}
