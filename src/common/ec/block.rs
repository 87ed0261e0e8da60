use super::ReedSolomonEncoder;
use crate::error::QRResult;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Block {
    data: Vec<u8>,
    // Data length
    dlen: usize,
}

impl Block {
    pub fn new(raw: &[u8], ec_len: usize, rs: &ReedSolomonEncoder) -> QRResult<Self> {
        let dlen = raw.len();
        let mut data = Vec::with_capacity(dlen + ec_len);
        data.extend_from_slice(raw);
        data.resize(dlen + ec_len, 0);
        rs.encode(&mut data, ec_len)?;
        Ok(Self { data, dlen })
    }

    pub fn with_encoded(encoded: &[u8], dlen: usize) -> Self {
        debug_assert!(dlen <= encoded.len(), "Data length {dlen} exceeds block length");
        Self { data: encoded.to_vec(), dlen }
    }

    pub fn ec_len(&self) -> usize {
        self.data.len() - self.dlen
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..self.dlen]
    }

    pub fn ecc(&self) -> &[u8] {
        &self.data[self.dlen..]
    }

    pub fn is_valid(&self, rs: &ReedSolomonEncoder) -> bool {
        rs.syndromes(&self.data, self.ec_len()).iter().all(|&s| s == 0)
    }
}
