use std::ops::Deref;

use log::trace;

use crate::common::{
    codec::EncodedData,
    ec::{Block, ReedSolomonEncoder},
    metadata::{BlockSpec, ECLevel, Version},
    BitStream,
};
use crate::error::{QRError, QRResult};

/// Encoded payload together with the block layout of its symbol.
#[derive(Debug, Clone)]
pub struct SymbolPlan {
    encoded: EncodedData,
    ecl: ECLevel,
    blocks: Vec<BlockSpec>,
}

impl SymbolPlan {
    pub fn new(encoded: EncodedData, ecl: ECLevel) -> QRResult<Self> {
        let blocks = encoded.ver.ec_blocks(ecl)?;
        let ver = encoded.ver;
        if blocks.iter().map(|b| b.data_len).sum::<usize>() != ver.data_codewords(ecl)
            || blocks.iter().map(|b| b.len()).sum::<usize>() != ver.total_codewords()
        {
            return Err(QRError::InterleavingMismatch);
        }
        Ok(Self { encoded, ecl, blocks })
    }

    pub fn encoded(&self) -> &EncodedData {
        &self.encoded
    }

    pub fn version(&self) -> Version {
        self.encoded.ver
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ecl
    }

    pub fn blocks(&self) -> &[BlockSpec] {
        &self.blocks
    }

    pub fn data_len(&self) -> usize {
        self.encoded.ver.data_codewords(self.ecl)
    }

    pub fn total_len(&self) -> usize {
        self.encoded.ver.total_codewords()
    }

    /// Pads the data, adds error correction per block and interleaves.
    pub fn codewords(&self, rs: &ReedSolomonEncoder) -> QRResult<BitStream> {
        let padded = self.encoded.padded();
        let data = padded.data();
        if data.len() != self.data_len() {
            return Err(QRError::InterleavingMismatch);
        }

        let blocks = blockify(data, &self.blocks)
            .into_iter()
            .zip(&self.blocks)
            .map(|(raw, spec)| Block::new(raw, spec.ec_len, rs))
            .collect::<QRResult<Vec<_>>>()?;
        trace!("Split {} data bytes into {} blocks", data.len(), blocks.len());

        let data_blocks: Vec<&[u8]> = blocks.iter().map(|b| b.data()).collect();
        let ecc_blocks: Vec<&[u8]> = blocks.iter().map(|b| b.ecc()).collect();

        let mut payload = BitStream::new(self.total_len() << 3);
        payload.extend(&interleave(&data_blocks));
        payload.extend(&interleave(&ecc_blocks));
        if payload.len() != self.total_len() << 3 {
            return Err(QRError::InterleavingMismatch);
        }
        Ok(payload)
    }

    /// Byte map from final symbol order to pre-interleave order. Pre-interleave
    /// order holds every data byte as it appears in the bitstream, followed by
    /// the error correction bytes block after block.
    pub fn interleave_map(&self) -> QRResult<Vec<usize>> {
        let total_data = self.data_len();
        let max_dlen = self.blocks.iter().map(|b| b.data_len).max().unwrap_or(0);
        let max_ec = self.blocks.iter().map(|b| b.ec_len).max().unwrap_or(0);

        let mut data_off = Vec::with_capacity(self.blocks.len());
        let mut ec_off = Vec::with_capacity(self.blocks.len());
        let (mut d, mut e) = (0, total_data);
        for b in &self.blocks {
            data_off.push(d);
            ec_off.push(e);
            d += b.data_len;
            e += b.ec_len;
        }

        let mut map = Vec::with_capacity(self.total_len());
        for i in 0..max_dlen {
            for (b, spec) in self.blocks.iter().enumerate() {
                if i < spec.data_len {
                    map.push(data_off[b] + i);
                }
            }
        }
        for i in 0..max_ec {
            for (b, spec) in self.blocks.iter().enumerate() {
                if i < spec.ec_len {
                    map.push(ec_off[b] + i);
                }
            }
        }

        validate_permutation(&map)?;
        Ok(map)
    }

    /// Bit map from final symbol order to pre-interleave order.
    pub fn interleave_bit_map(&self) -> QRResult<Vec<usize>> {
        let byte_map = self.interleave_map()?;
        Ok(byte_map.iter().flat_map(|&b| (0..8).map(move |k| (b << 3) + k)).collect())
    }

    /// Bit map from pre-interleave order to final symbol order.
    pub fn deinterleave_bit_map(&self) -> QRResult<Vec<usize>> {
        invert(&self.interleave_bit_map()?)
    }
}

pub(crate) fn blockify<'a>(data: &'a [u8], specs: &[BlockSpec]) -> Vec<&'a [u8]> {
    debug_assert_eq!(
        data.len(),
        specs.iter().map(|s| s.data_len).sum::<usize>(),
        "Data len doesn't match total size of blocks"
    );

    let mut res = Vec::with_capacity(specs.len());
    let mut rest = data;
    for spec in specs {
        let (head, tail) = rest.split_at(spec.data_len);
        res.push(head);
        rest = tail;
    }
    res
}

pub fn interleave<T: Copy, V: Deref<Target = [T]>>(blocks: &[V]) -> Vec<T> {
    let max_block_size = blocks.iter().map(|b| b.len()).max().unwrap_or(0);
    let total_size = blocks.iter().map(|b| b.len()).sum::<usize>();
    let mut res = Vec::with_capacity(total_size);
    for i in 0..max_block_size {
        for b in blocks {
            if i < b.len() {
                res.push(b[i]);
            }
        }
    }
    res
}

pub fn invert(map: &[usize]) -> QRResult<Vec<usize>> {
    validate_permutation(map)?;
    let mut inv = vec![0; map.len()];
    for (i, &m) in map.iter().enumerate() {
        inv[m] = i;
    }
    Ok(inv)
}

fn validate_permutation(map: &[usize]) -> QRResult<()> {
    let mut seen = vec![false; map.len()];
    for &m in map {
        if m >= map.len() || seen[m] {
            return Err(QRError::NotPermutation);
        }
        seen[m] = true;
    }
    Ok(())
}

#[cfg(test)]
mod plan_tests {
    use std::sync::Arc;

    use test_case::test_case;

    use super::{blockify, interleave, invert, SymbolPlan};
    use crate::common::{
        codec::encode,
        ec::ReedSolomonEncoder,
        galois::Field,
        metadata::{BlockSpec, ECLevel, Version},
    };
    use crate::error::QRError;

    fn plan(text: &str, ver: usize, ecl: ECLevel) -> SymbolPlan {
        let enc = encode(text, ecl, Some(Version::new(ver).unwrap()), None).unwrap();
        SymbolPlan::new(enc, ecl).unwrap()
    }

    #[test]
    fn test_interleave() {
        let blocks = vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9, 0]];
        let interleaved = interleave(&blocks);
        let exp_interleaved = vec![1, 4, 7, 2, 5, 8, 3, 6, 9, 0];
        assert_eq!(interleaved, exp_interleaved);
    }

    #[test]
    fn test_blockify() {
        let specs = [
            BlockSpec { data_len: 2, ec_len: 3 },
            BlockSpec { data_len: 2, ec_len: 3 },
            BlockSpec { data_len: 3, ec_len: 3 },
        ];
        let data = [1u8, 2, 3, 4, 5, 6, 7];
        let exp: Vec<&[u8]> = vec![&[1, 2][..], &[3, 4][..], &[5, 6, 7][..]];
        assert_eq!(blockify(&data, &specs), exp);
    }

    #[test]
    fn test_codewords_1m() {
        let rs = ReedSolomonEncoder::new(Arc::new(Field::qr()));
        let payload = plan("01234567", 1, ECLevel::M).codewords(&rs).unwrap();
        assert_eq!(
            payload.data(),
            b"\x10\x20\x0c\x56\x61\x80\xec\x11\xec\x11\xec\x11\xec\x11\xec\x11\
              \xa5\x24\xd4\xc1\xed\x36\xc7\x87\x2c\x55"
        );
    }

    #[test_case(1, ECLevel::L)]
    #[test_case(5, ECLevel::Q)]
    #[test_case(7, ECLevel::H)]
    #[test_case(40, ECLevel::M)]
    fn test_interleave_map_matches_interleave(ver: usize, ecl: ECLevel) {
        let rs = ReedSolomonEncoder::new(Arc::new(Field::qr()));
        let plan = plan("HELLO WORLD", ver, ecl);
        let payload = plan.codewords(&rs).unwrap();
        let map = plan.interleave_map().unwrap();
        assert_eq!(map.len(), plan.total_len());

        // Pre-interleave order: data as planned, then each block's ecc
        let padded = plan.encoded().padded();
        let mut pre = padded.data().to_vec();
        let mut off = 0;
        for spec in plan.blocks() {
            let mut block = padded.data()[off..off + spec.data_len].to_vec();
            block.resize(spec.len(), 0);
            rs.encode(&mut block, spec.ec_len).unwrap();
            pre.extend_from_slice(&block[spec.data_len..]);
            off += spec.data_len;
        }

        let remapped: Vec<u8> = map.iter().map(|&i| pre[i]).collect();
        assert_eq!(remapped, payload.data());
    }

    #[test]
    fn test_bit_maps_are_inverse() {
        let plan = plan("HELLO WORLD", 5, ECLevel::Q);
        let fwd = plan.interleave_bit_map().unwrap();
        let inv = plan.deinterleave_bit_map().unwrap();
        assert_eq!(fwd.len(), plan.total_len() << 3);
        for (i, &p) in fwd.iter().enumerate() {
            assert_eq!(inv[p], i);
        }
        // Bits inside a byte keep their order
        assert_eq!(fwd[8] & 7, 0);
        assert_eq!(fwd[9], fwd[8] + 1);
    }

    #[test]
    fn test_byte_conservation() {
        for ver in Version::all() {
            for ecl in ECLevel::ALL {
                let blocks = ver.ec_blocks(ecl).unwrap();
                assert_eq!(blocks.iter().map(|b| b.data_len).sum::<usize>(), ver.data_codewords(ecl));
                assert_eq!(blocks.iter().map(|b| b.len()).sum::<usize>(), ver.total_codewords());
            }
        }
    }

    #[test]
    fn test_invert_rejects_non_permutation() {
        assert_eq!(invert(&[0, 2, 1]), Ok(vec![0, 2, 1]));
        assert_eq!(invert(&[0, 0, 1]), Err(QRError::NotPermutation));
        assert_eq!(invert(&[0, 3, 1]), Err(QRError::NotPermutation));
    }
}
