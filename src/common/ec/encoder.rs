use std::sync::Arc;

use log::trace;
use parking_lot::RwLock;

use super::matrix::GfMatrix;
use crate::common::{galois::Field, poly::Poly};
use crate::error::{QRError, QRResult};

// Reed-Solomon encoder
//------------------------------------------------------------------------------

/// Systematic and erasure-fill Reed-Solomon encoder over a shared field.
///
/// Generator polynomials are memoized by degree. The cache only ever grows and
/// is extended under the write lock, so concurrent callers never race on it.
#[derive(Debug)]
pub struct ReedSolomonEncoder {
    field: Arc<Field>,
    generators: RwLock<Vec<Vec<u8>>>,
}

impl ReedSolomonEncoder {
    pub fn new(field: Arc<Field>) -> Self {
        Self { field, generators: RwLock::new(vec![vec![1]]) }
    }

    pub fn cached_generators(&self) -> usize {
        self.generators.read().len()
    }

    fn generator(&self, degree: usize) -> Poly<'_> {
        {
            let cache = self.generators.read();
            if let Some(g) = cache.get(degree) {
                return Poly::new(&self.field, g.clone());
            }
        }

        let mut cache = self.generators.write();
        // Another writer may have extended the cache while we waited
        while cache.len() <= degree {
            let d = cache.len();
            let last = Poly::new(&self.field, cache[d - 1].clone());
            let root = self.field.exp(d - 1 + self.field.generator_base());
            let next = last.multiply(&Poly::new(&self.field, vec![1, root]));
            trace!("Cached generator polynomial of degree {d}");
            cache.push(next.into_coeffs());
        }
        Poly::new(&self.field, cache[degree].clone())
    }
}

impl Default for ReedSolomonEncoder {
    fn default() -> Self {
        Self::new(Arc::new(Field::qr()))
    }
}

// Systematic encoding
//------------------------------------------------------------------------------

impl ReedSolomonEncoder {
    /// Overwrites the trailing `ec_count` bytes of `codeword` with the remainder
    /// of `data(x) * x^ec_count` divided by the generator polynomial.
    pub fn encode(&self, codeword: &mut [u8], ec_count: usize) -> QRResult<()> {
        if ec_count == 0 {
            return Err(QRError::InvalidArgument("No error correction bytes".into()));
        }
        if ec_count >= codeword.len() {
            return Err(QRError::InvalidArgument("No data bytes provided".into()));
        }

        let data_count = codeword.len() - ec_count;
        let gen = self.generator(ec_count);
        let info = Poly::new(&self.field, codeword[..data_count].to_vec())
            .multiply_by_monomial(ec_count, 1);
        let (_, rem) = info.divide(&gen)?;

        let coeffs = rem.coeffs();
        let zeros = ec_count - coeffs.len();
        let (pad, ecc) = codeword[data_count..].split_at_mut(zeros);
        pad.fill(0);
        ecc.copy_from_slice(coeffs);
        Ok(())
    }

    /// Evaluates the codeword at each generator root. All zeros means the
    /// codeword is valid.
    pub fn syndromes(&self, codeword: &[u8], ec_count: usize) -> Vec<u8> {
        let poly = Poly::new(&self.field, codeword.to_vec());
        let base = self.field.generator_base();
        (0..ec_count).map(|i| poly.evaluate_at(self.field.exp(i + base))).collect()
    }
}


// Erasure-fill encoding
//------------------------------------------------------------------------------

impl ReedSolomonEncoder {
    /// Solves for the bytes at the positions where `fixed` is false, so that
    /// the whole slice becomes a valid codeword with `n - known_count` parity
    /// symbols. The free positions may be anywhere in the codeword.
    pub fn encode_erasures(
        &self,
        codeword: &mut [u8],
        fixed: &[bool],
        known_count: usize,
    ) -> QRResult<()> {
        let n = codeword.len();
        if fixed.len() != n {
            return Err(QRError::InvalidArgument(format!(
                "Fixed mask length {} doesn't match codeword length {n}",
                fixed.len()
            )));
        }
        if fixed.iter().filter(|&&f| f).count() != known_count {
            return Err(QRError::InvalidArgument(format!(
                "Fixed mask doesn't mark exactly {known_count} positions"
            )));
        }
        if n > FIELD_ORDER {
            return Err(QRError::InvalidArgument(format!("Codeword too long: {n}")));
        }

        let m = n - known_count;
        if m == 0 {
            return Ok(());
        }

        let free: Vec<usize> = (0..n).filter(|&i| !fixed[i]).collect();
        let mut a = self.erasure_system(codeword, fixed, &free);
        self.eliminate(&mut a)?;
        let solved = self.back_substitute(&a)?;

        trace!("Solved {m} erasures in codeword of length {n}");
        for (&pos, &v) in free.iter().zip(solved.iter()) {
            codeword[pos] = v;
        }
        Ok(())
    }

    // Row i is the parity check at root a^(i + base): the free positions form
    // the coefficient columns and the fixed positions fold into the last column.
    fn erasure_system(&self, codeword: &[u8], fixed: &[bool], free: &[usize]) -> GfMatrix {
        let n = codeword.len();
        let m = free.len();
        let base = self.field.generator_base();
        let mut a = GfMatrix::new(m, m + 1);

        for i in 0..m {
            let root = i + base;
            for (j, &pos) in free.iter().enumerate() {
                a[(i, j)] = self.field.exp(root * (n - 1 - pos));
            }

            let mut y = 0;
            for pos in (0..n).filter(|&p| fixed[p]) {
                y ^= self.field.multiply(codeword[pos], self.field.exp(root * (n - 1 - pos)));
            }
            a[(i, m)] = y;
        }
        a
    }

    // Forward elimination. The pivot is the row holding the numerically largest
    // byte in the column; any non-zero pivot would do, this rule keeps output
    // reproducible.
    fn eliminate(&self, a: &mut GfMatrix) -> QRResult<()> {
        let m = a.rows();
        for k in 0..m.saturating_sub(1) {
            let mut pivot = k;
            for i in k + 1..m {
                if a[(i, k)] > a[(pivot, k)] {
                    pivot = i;
                }
            }
            if a[(pivot, k)] == 0 {
                return Err(QRError::Unsolvable);
            }
            a.swap_rows(k, pivot);

            let lead = a[(k, k)];
            for i in k + 1..m {
                if a[(i, k)] == 0 {
                    continue;
                }
                let factor = self.field.divide(a[(i, k)], lead)?;
                for j in k..=m {
                    let v = self.field.multiply(a[(k, j)], factor);
                    a[(i, j)] ^= v;
                }
            }
        }
        Ok(())
    }

    fn back_substitute(&self, a: &GfMatrix) -> QRResult<Vec<u8>> {
        let m = a.rows();
        let mut x = vec![0u8; m];
        for i in (0..m).rev() {
            let row = a.row(i);
            let mut acc = row[m];
            for j in i + 1..m {
                acc ^= self.field.multiply(row[j], x[j]);
            }
            x[i] = self.field.divide(acc, row[i]).map_err(|_| QRError::Unsolvable)?;
        }
        Ok(x)
    }
}


// Global constants
//------------------------------------------------------------------------------

const FIELD_ORDER: usize = 255;
