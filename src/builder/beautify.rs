use log::{debug, trace};

use super::{plan::SymbolPlan, qr::QR};
use crate::common::{
    ec::{Block, ReedSolomonEncoder},
    mask::MaskPattern,
    BitStream,
};
use crate::embed::Target;
use crate::error::{QRError, QRResult};

// Byte position and the weight it is ranked by
#[derive(Debug, Clone, Copy)]
struct Ranked {
    importance: f32,
    index: usize,
}

/// Marks the `fixed_count` most important positions as fixed. Equal weights
/// keep their original order.
pub fn select_fixed(importance: &[f32], fixed_count: usize) -> Vec<bool> {
    debug_assert!(fixed_count <= importance.len(), "More fixed positions than bytes");

    let mut ranked: Vec<Ranked> =
        importance.iter().enumerate().map(|(index, &importance)| Ranked { importance, index }).collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));

    let mut fixed = vec![false; importance.len()];
    for r in ranked.iter().take(fixed_count) {
        fixed[r.index] = true;
    }
    fixed
}

/// Builds the final codeword stream for a symbol whose data modules should
/// resemble `target` once `mask` is applied. Header and data bits are kept
/// verbatim; each block's least important bytes are solved by erasure fill.
pub fn beautify(
    plan: &SymbolPlan,
    target: &Target,
    mask: MaskPattern,
    rs: &ReedSolomonEncoder,
) -> QRResult<BitStream> {
    let (mut bytes, byte_weight) = weigh(plan, target, mask)?;
    let fixed_masks = select_block_fixed(plan, &byte_weight);

    for (i, ((spec, positions), fixed)) in
        plan.blocks().iter().zip(block_positions(plan)).zip(&fixed_masks).enumerate()
    {
        let mut codeword: Vec<u8> = positions.iter().map(|&p| bytes[p]).collect();
        rs.encode_erasures(&mut codeword, fixed, spec.data_len)?;

        if !Block::with_encoded(&codeword, spec.data_len).is_valid(rs) {
            return Err(QRError::InterleavingMismatch);
        }
        trace!(
            "Block {i}: solved {} bytes, {} of them in the data region",
            spec.ec_len,
            fixed[..spec.data_len].iter().filter(|&&f| !f).count()
        );

        for (&p, &b) in positions.iter().zip(&codeword) {
            bytes[p] = b;
        }
    }

    let byte_map = plan.interleave_map()?;
    let interleaved: Vec<u8> = byte_map.iter().map(|&p| bytes[p]).collect();
    debug!("Beautified {} codewords in {} blocks", plan.total_len(), plan.blocks().len());
    Ok(BitStream::from(&interleaved))
}

// Desired bytes and byte weights in pre-interleave order. Header and data
// bits keep their literal value under the f32::MAX sentinel; every other bit
// takes the target colour pre-compensated for the mask.
fn weigh(plan: &SymbolPlan, target: &Target, mask: MaskPattern) -> QRResult<(Vec<u8>, Vec<f32>)> {
    let ver = plan.version();
    if target.width() != ver.width() {
        return Err(QRError::TargetMismatch { expected: ver.width(), found: target.width() });
    }

    let total_bits = plan.total_len() << 3;
    let coords = QR::data_coords(ver);
    let fwd = plan.interleave_bit_map()?;
    if coords.len() < total_bits || fwd.len() != total_bits {
        return Err(QRError::InterleavingMismatch);
    }

    let head = &plan.encoded().bits;
    let head_len = head.len();
    let mask_fn = mask.mask_functions();
    let mut ideal = vec![false; total_bits];
    let mut weight = vec![0.0f32; total_bits];
    for (f, &p) in fwd.iter().enumerate() {
        let (r, c) = coords[f];
        if p < head_len {
            ideal[p] = head.get(p);
            weight[p] = f32::MAX;
        } else {
            let (ru, cu) = (r as usize, c as usize);
            ideal[p] = target.is_dark(ru, cu) ^ mask_fn(r, c);
            weight[p] = target.importance(ru, cu);
        }
    }

    let bytes = ideal
        .chunks_exact(8)
        .map(|bits| bits.iter().fold(0u8, |acc, &b| (acc << 1) | b as u8))
        .collect();
    let byte_weight =
        weight.chunks_exact(8).map(|w| w.iter().copied().fold(0.0, f32::max)).collect();
    Ok((bytes, byte_weight))
}

// Pre-interleave positions of each block: its data bytes, then its ecc bytes
fn block_positions(plan: &SymbolPlan) -> Vec<Vec<usize>> {
    let (mut data_off, mut ec_off) = (0, plan.data_len());
    plan.blocks()
        .iter()
        .map(|spec| {
            let positions =
                (data_off..data_off + spec.data_len).chain(ec_off..ec_off + spec.ec_len).collect();
            data_off += spec.data_len;
            ec_off += spec.ec_len;
            positions
        })
        .collect()
}

// Fixed mask per block, aligned with `block_positions`
fn select_block_fixed(plan: &SymbolPlan, byte_weight: &[f32]) -> Vec<Vec<bool>> {
    plan.blocks()
        .iter()
        .zip(block_positions(plan))
        .map(|(spec, positions)| {
            let importance: Vec<f32> = positions.iter().map(|&p| byte_weight[p]).collect();
            select_fixed(&importance, spec.data_len)
        })
        .collect()
}

#[cfg(test)]
mod beautify_tests {
    use test_case::test_case;

    use super::{beautify, block_positions, select_block_fixed, select_fixed, weigh};
    use crate::builder::{plan::SymbolPlan, QR};
    use crate::common::{
        codec::encode,
        ec::ReedSolomonEncoder,
        mask::MaskPattern,
        metadata::{Color, ECLevel, Version},
    };
    use crate::embed::Target;
    use crate::error::QRError;

    fn plan(text: &str, ver: usize, ecl: ECLevel) -> SymbolPlan {
        let enc = encode(text, ecl, Some(Version::new(ver).unwrap()), None).unwrap();
        SymbolPlan::new(enc, ecl).unwrap()
    }

    fn diagonal_target(ver: usize) -> Target {
        let w = Version::new(ver).unwrap().width();
        let pattern = (0..w * w).map(|i| i / w > i % w).collect();
        let importance = (0..w * w).map(|i| ((i * 7919) % 13) as f32).collect();
        Target::new(w, pattern, importance).unwrap()
    }

    #[test]
    fn test_select_fixed() {
        let fixed = select_fixed(&[0.5, 3.0, 1.0, 3.0, 0.0], 3);
        assert_eq!(fixed, vec![false, true, true, true, false]);
        // Ties keep index order
        let fixed = select_fixed(&[1.0, 1.0, 1.0, 1.0], 2);
        assert_eq!(fixed, vec![true, true, false, false]);
        assert_eq!(select_fixed(&[f32::MAX, 0.0], 1), vec![true, false]);
    }

    // Every header byte must come out fixed, whatever the target weighs
    fn assert_header_fixed(plan: &SymbolPlan, target: &Target) {
        let head_bytes = plan.encoded().head_len() >> 3;
        let (_, byte_weight) = weigh(plan, target, MaskPattern::new(5).unwrap()).unwrap();
        let fixed = select_block_fixed(plan, &byte_weight);
        for (b, (positions, fixed)) in block_positions(plan).iter().zip(&fixed).enumerate() {
            assert_eq!(fixed.iter().filter(|&&f| f).count(), plan.blocks()[b].data_len);
            for (&p, &f) in positions.iter().zip(fixed) {
                if p < head_bytes {
                    assert!(f, "Version {} block {b}: header byte {p} is free", *plan.version());
                }
            }
        }
    }

    #[test]
    fn test_header_bytes_never_free() {
        for ver in Version::all() {
            for ecl in ECLevel::ALL {
                let w = ver.width();
                let text = "HELLO WORLD 0123456789".repeat(*ver);
                let enc = encode(&text, ecl, Some(ver), None)
                    .or_else(|_| encode("HI", ecl, Some(ver), None))
                    .unwrap();
                let plan = SymbolPlan::new(enc, ecl).unwrap();

                let saturated = Target::new(w, vec![true; w * w], vec![f32::MAX; w * w]).unwrap();
                assert_header_fixed(&plan, &saturated);
                let uneven = Target::new(
                    w,
                    (0..w * w).map(|i| i % 3 == 0).collect(),
                    (0..w * w).map(|i| ((i * 7919) % 101) as f32).collect(),
                )
                .unwrap();
                assert_header_fixed(&plan, &uneven);
            }
        }
    }

    #[test_case(1, ECLevel::L)]
    #[test_case(3, ECLevel::M)]
    #[test_case(5, ECLevel::Q)]
    #[test_case(7, ECLevel::H)]
    fn test_beautify_keeps_header_and_valid_blocks(ver: usize, ecl: ECLevel) {
        let rs = ReedSolomonEncoder::default();
        let plan = plan("HELLO WORLD", ver, ecl);
        let mask = MaskPattern::new(2).unwrap();
        let payload = beautify(&plan, &diagonal_target(ver), mask, &rs).unwrap();
        assert_eq!(payload.len(), plan.total_len() << 3);

        // Undo the interleaving and check every block
        let map = plan.interleave_map().unwrap();
        let mut pre = vec![0u8; plan.total_len()];
        for (f, &p) in map.iter().enumerate() {
            pre[p] = payload.data()[f];
        }
        let head = plan.encoded().bits.data();
        assert_eq!(&pre[..head.len()], head);

        let (mut d, mut e) = (0, plan.data_len());
        for spec in plan.blocks() {
            let mut cw = pre[d..d + spec.data_len].to_vec();
            cw.extend_from_slice(&pre[e..e + spec.ec_len]);
            assert!(rs.syndromes(&cw, spec.ec_len).iter().all(|&s| s == 0));
            d += spec.data_len;
            e += spec.ec_len;
        }
    }

    #[test]
    fn test_beautify_follows_target() {
        let rs = ReedSolomonEncoder::default();
        let ver = Version::new(5).unwrap();
        let plan = plan("HI", 5, ECLevel::L);
        let target = diagonal_target(5);
        let mask = MaskPattern::new(0).unwrap();
        let payload = beautify(&plan, &target, mask, &rs).unwrap();

        let mut qr = QR::new(ver, ECLevel::L);
        qr.draw_all_function_patterns();
        qr.draw_encoding_region(&payload);
        qr.apply_mask(mask);

        let coords = &QR::data_coords(ver)[..plan.total_len() << 3];
        let matching = coords
            .iter()
            .filter(|&&(r, c)| (*qr.get(r, c) == Color::Dark) == target.is_dark(r as usize, c as usize))
            .count();
        // Fixed bytes match outright, solved ones about half the time
        assert!(matching * 4 > coords.len() * 3, "{matching} of {} modules match", coords.len());
    }

    #[test]
    fn test_beautify_rejects_wrong_width() {
        let rs = ReedSolomonEncoder::default();
        let plan = plan("HELLO", 2, ECLevel::L);
        let res = beautify(&plan, &diagonal_target(1), MaskPattern::new(0).unwrap(), &rs);
        assert_eq!(res, Err(QRError::TargetMismatch { expected: 25, found: 21 }));
    }
}
