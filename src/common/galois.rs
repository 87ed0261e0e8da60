use crate::error::{QRError, QRResult};

// Galois field
//------------------------------------------------------------------------------

/// Log/antilog tables for GF(256). Addition and subtraction are plain XOR and
/// never go through the tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    exp: [u8; FIELD_SIZE],
    log: [u8; FIELD_SIZE],
    base: usize,
}

impl Field {
    pub fn new(primitive: u16, base: usize) -> Self {
        debug_assert!(primitive & 0x100 != 0, "Primitive must be of degree 8: {primitive:#x}");

        let mut exp = [0u8; FIELD_SIZE];
        let mut log = [0u8; FIELD_SIZE];
        let mut x = 1u16;
        for e in exp.iter_mut() {
            *e = x as u8;
            x <<= 1;
            if x >= FIELD_SIZE as u16 {
                x ^= primitive;
            }
        }
        for (i, &e) in exp.iter().enumerate().take(FIELD_SIZE - 1) {
            log[e as usize] = i as u8;
        }
        Self { exp, log, base }
    }

    /// Field used by QR: x^8 + x^4 + x^3 + x^2 + 1, generator base 0.
    pub fn qr() -> Self {
        Self::new(QR_PRIMITIVE, 0)
    }

    pub fn generator_base(&self) -> usize {
        self.base
    }

    pub fn exp(&self, i: usize) -> u8 {
        self.exp[i % ORDER]
    }

    pub fn log(&self, v: u8) -> QRResult<usize> {
        if v == 0 {
            return Err(QRError::FieldDomain);
        }
        Ok(self.log[v as usize] as usize)
    }

    pub fn add(a: u8, b: u8) -> u8 {
        a ^ b
    }

    pub fn multiply(&self, a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.exp[(self.log[a as usize] as usize + self.log[b as usize] as usize) % ORDER]
    }

    pub fn divide(&self, a: u8, b: u8) -> QRResult<u8> {
        if b == 0 {
            return Err(QRError::DivisionByZero);
        }
        if a == 0 {
            return Ok(0);
        }
        let diff = ORDER + self.log[a as usize] as usize - self.log[b as usize] as usize;
        Ok(self.exp[diff % ORDER])
    }

    pub fn inverse(&self, a: u8) -> QRResult<u8> {
        self.divide(1, a)
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::qr()
    }
}


// Global constants
//------------------------------------------------------------------------------

pub const FIELD_SIZE: usize = 256;

// Multiplicative group order
const ORDER: usize = FIELD_SIZE - 1;

pub const QR_PRIMITIVE: u16 = 0x011d;
