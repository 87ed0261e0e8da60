mod beautify;
mod plan;
mod qr;

pub use beautify::select_fixed;
pub use plan::{interleave, invert, SymbolPlan};
pub use qr::{Module, DEFAULT_MARGIN, QR};

use std::sync::Arc;

use log::{debug, info};

use crate::common::{
    codec::{encode, Charset},
    ec::ReedSolomonEncoder,
    mask::{apply_best_mask, MaskPattern},
    metadata::{ECLevel, Version},
    BitStream,
};
use crate::embed::Target;
use crate::error::QRResult;

pub struct QRBuilder<'a> {
    data: &'a str,
    version: Option<Version>,
    ec_level: ECLevel,
    charset: Option<Charset>,
    mask: Option<MaskPattern>,
    margin: usize,
    rs: Arc<ReedSolomonEncoder>,
}

impl<'a> QRBuilder<'a> {
    pub fn new(data: &'a str) -> Self {
        Self {
            data,
            version: None,
            ec_level: ECLevel::L,
            charset: None,
            mask: None,
            margin: DEFAULT_MARGIN,
            rs: Arc::new(ReedSolomonEncoder::default()),
        }
    }

    pub fn data(&mut self, data: &'a str) -> &mut Self {
        self.data = data;
        self
    }

    pub fn version(&mut self, version: Version) -> &mut Self {
        self.version = Some(version);
        self
    }

    pub fn unset_version(&mut self) -> &mut Self {
        self.version = None;
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }

    pub fn charset(&mut self, charset: Charset) -> &mut Self {
        self.charset = Some(charset);
        self
    }

    pub fn mask(&mut self, mask: MaskPattern) -> &mut Self {
        self.mask = Some(mask);
        self
    }

    pub fn margin(&mut self, margin: usize) -> &mut Self {
        self.margin = margin;
        self
    }

    /// Shares one encoder, and so one generator cache, between builders.
    pub fn encoder(&mut self, rs: Arc<ReedSolomonEncoder>) -> &mut Self {
        self.rs = rs;
        self
    }

    pub fn metadata(&self) -> String {
        let charset = self.charset.map_or("Auto", |c| c.name());
        match self.version {
            Some(v) => format!(
                "{{ Version: {}, Ec level: {:?}, Charset: {charset} }}",
                *v, self.ec_level
            ),
            None => format!("{{ Version: None, Ec level: {:?}, Charset: {charset} }}", self.ec_level),
        }
    }
}


impl QRBuilder<'_> {
    /// Encodes the content and lays out its blocks without drawing anything.
    pub fn plan(&self) -> QRResult<SymbolPlan> {
        let encoded = encode(self.data, self.ec_level, self.version, self.charset)?;
        SymbolPlan::new(encoded, self.ec_level)
    }

    pub fn build(&self) -> QRResult<QR> {
        info!("Generating QR {}", self.metadata());

        let plan = self.plan()?;
        debug!("Adding error correction and interleaving");
        let payload = plan.codewords(&self.rs)?;

        let mut qr = self.draw(&plan, &payload);
        let mask = match self.mask {
            Some(m) => {
                qr.apply_mask(m);
                m
            }
            None => apply_best_mask(&mut qr),
        };
        debug!("Applied mask {}", *mask);

        Self::report(&plan, &qr);
        Ok(qr)
    }

    /// Builds a symbol whose data modules follow `target` wherever the
    /// redundancy allows. The mask is the configured one, or pattern 0.
    pub fn beautify(&self, target: &Target) -> QRResult<QR> {
        info!("Generating beautified QR {}", self.metadata());

        let plan = self.plan()?;
        let mask = self.mask.unwrap_or_default();
        let payload = beautify::beautify(&plan, target, mask, &self.rs)?;

        let mut qr = self.draw(&plan, &payload);
        qr.apply_mask(mask);

        let w = qr.width();
        let matching = QR::data_coords(qr.version())
            .iter()
            .filter(|&&(r, c)| (*qr.get(r, c)).select(false, true) == target.is_dark(r as usize, c as usize))
            .count();
        info!("{matching} data modules follow the target in a {w}x{w} symbol");

        Self::report(&plan, &qr);
        Ok(qr)
    }

    fn draw(&self, plan: &SymbolPlan, payload: &BitStream) -> QR {
        let mut qr = QR::new(plan.version(), plan.ec_level());
        qr.set_margin(self.margin);
        qr.draw_all_function_patterns();
        qr.draw_encoding_region(payload);
        qr
    }

    fn report(plan: &SymbolPlan, qr: &QR) {
        let total_modules = qr.width() * qr.width();
        let dark_modules = qr.count_dark_modules();
        info!("QR generated: {}", qr.metadata());
        info!(
            "Data capacity: {} bytes, Encoded size: {} bytes, Mode: {:?}",
            plan.data_len(),
            plan.encoded().head_len() >> 3,
            plan.encoded().mode
        );
        info!(
            "Dark cells: {dark_modules}, Light cells: {}, Balance: {}%",
            total_modules - dark_modules,
            dark_modules * 100 / total_modules
        );
    }
}

#[cfg(test)]
mod builder_tests {
    use std::sync::Arc;

    use super::{QRBuilder, QR};
    use crate::common::{
        ec::ReedSolomonEncoder, mask::MaskPattern, metadata::Version, BitStream, ECLevel,
    };
    use crate::embed::Target;
    use crate::error::QRError;

    #[test]
    fn test_build_picks_smallest_version() {
        let qr = QRBuilder::new("HELLO WORLD").ec_level(ECLevel::Q).build().unwrap();
        assert_eq!(*qr.version(), 1);
        assert_eq!(qr.ec_level(), ECLevel::Q);
        assert!(qr.mask().is_some());
    }

    #[test]
    fn test_build_honours_options() {
        let mask = MaskPattern::new(3).unwrap();
        let qr = QRBuilder::new("12345")
            .version(Version::new(4).unwrap())
            .ec_level(ECLevel::H)
            .mask(mask)
            .margin(2)
            .build()
            .unwrap();
        assert_eq!(*qr.version(), 4);
        assert_eq!(qr.mask(), Some(mask));
        assert_eq!(qr.margin(), 2);
    }

    #[test]
    fn test_build_data_overflow() {
        let data = "1234567890".repeat(306);
        let res = QRBuilder::new(&data).version(Version::new(40).unwrap()).ec_level(ECLevel::H).build();
        assert_eq!(res.unwrap_err(), QRError::CapacityExceeded);
        assert_eq!(QRBuilder::new("").build().unwrap_err(), QRError::EmptyData);
    }

    #[test]
    fn test_shared_encoder_cache() {
        let rs = Arc::new(ReedSolomonEncoder::default());
        QRBuilder::new("A").version(Version::new(1).unwrap()).encoder(rs.clone()).build().unwrap();
        let cached = rs.cached_generators();
        assert!(cached > 7);
        QRBuilder::new("B").version(Version::new(1).unwrap()).encoder(rs.clone()).build().unwrap();
        assert_eq!(rs.cached_generators(), cached);
    }

    #[test]
    fn test_plan_payload_matches_symbol() {
        let builder = QRBuilder::new("01234567");
        let plan = builder.plan().unwrap();
        let payload = plan.codewords(&ReedSolomonEncoder::default()).unwrap();
        let qr = builder.build().unwrap();
        let mask_fn = qr.mask().unwrap().mask_functions();

        let coords = QR::data_coords(qr.version());
        let read: Vec<bool> = coords[..payload.len()]
            .iter()
            .map(|&(r, c)| (*qr.get(r, c)).select(false, true) ^ mask_fn(r, c))
            .collect();
        let expected: Vec<bool> = payload.iter().collect();
        assert_eq!(read, expected);
        assert_eq!(BitStream::from(payload.data()), payload);
    }

    #[test]
    fn test_beautify_uses_default_mask() {
        let w = Version::new(2).unwrap().width();
        let target = Target::new(w, vec![true; w * w], vec![1.0; w * w]).unwrap();
        let qr = QRBuilder::new("HELLO").version(Version::new(2).unwrap()).beautify(&target).unwrap();
        assert_eq!(qr.mask(), Some(MaskPattern::default()));

        let small = Target::new(21, vec![true; 441], vec![1.0; 441]).unwrap();
        let res = QRBuilder::new("HELLO").version(Version::new(2).unwrap()).beautify(&small);
        assert_eq!(res.unwrap_err(), QRError::TargetMismatch { expected: 25, found: 21 });
    }
}
