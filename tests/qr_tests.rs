use qrsculpt::QR;

// Renders the symbol and reads it back with an independent decoder
pub fn decode(qr: &QR) -> (usize, String) {
    let img = qr.render(4);
    let (w, h) = (img.width() as usize, img.height() as usize);
    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(w, h, |x, y| img.get_pixel(x as u32, y as u32)[0]);
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "Expected exactly one symbol");
    let (meta, content) = grids[0].decode().expect("Failed to read QR");
    (meta.version.0, content)
}

#[cfg(test)]
mod qr_proptests {
    use prop::string::string_regex;
    use proptest::prelude::*;

    use super::decode;
    use qrsculpt::*;

    pub fn ec_level_strategy() -> BoxedStrategy<ECLevel> {
        prop_oneof![Just(ECLevel::L), Just(ECLevel::M), Just(ECLevel::Q), Just(ECLevel::H)].boxed()
    }

    pub fn qr_strategy(regex: &str, max_sz: usize) -> impl Strategy<Value = (ECLevel, String)> {
        let pattern = format!(r"{regex}{{1,{max_sz}}}");
        (ec_level_strategy(), string_regex(&pattern).unwrap())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn proptest_numeric(params in qr_strategy("[0-9]", 300)) {
            let (ecl, data) = params;
            let qr = QRBuilder::new(&data).ec_level(ecl).build().unwrap();
            let (_, decoded) = decode(&qr);
            prop_assert_eq!(data, decoded);
        }

        #[test]
        fn proptest_alphanumeric(params in qr_strategy(r"[0-9A-Z $%*+\-./:]", 200)) {
            let (ecl, data) = params;
            let qr = QRBuilder::new(&data).ec_level(ecl).build().unwrap();
            let (_, decoded) = decode(&qr);
            prop_assert_eq!(data, decoded);
        }

        #[test]
        fn proptest_byte(params in qr_strategy("[a-z!@#&()=?]", 150)) {
            let (ecl, data) = params;
            let qr = QRBuilder::new(&data).ec_level(ecl).build().unwrap();
            let (_, decoded) = decode(&qr);
            prop_assert_eq!(data, decoded);
        }
    }
}

#[cfg(test)]
mod qr_tests {
    use test_case::test_case;

    use super::decode;
    use qrsculpt::{ECLevel, QRBuilder, Version};

    #[test]
    fn test_default_round_trip() {
        let qr = QRBuilder::new("test").build().unwrap();
        assert_eq!(qr.ec_level(), ECLevel::L);
        assert_eq!(decode(&qr), (1, "test".to_string()));
    }

    #[test_case("Hello, world!🌎".to_string(), 2, ECLevel::L; "utf8_eci")]
    #[test_case("TEST".to_string(), 1, ECLevel::M; "alphanumeric_1m")]
    #[test_case("12345".to_string(), 1, ECLevel::Q; "numeric_1q")]
    #[test_case("OK".to_string(), 1, ECLevel::H; "tiny_1h")]
    #[test_case("A11111111111111".repeat(11), 7, ECLevel::M; "alphanumeric_7m")]
    #[test_case("aAAAAAA1111111111111AAAAAAa".repeat(3), 7, ECLevel::Q; "byte_7q")]
    #[test_case("1234567890".repeat(15), 7, ECLevel::H; "numeric_7h")]
    #[test_case("1234567890".repeat(28), 10, ECLevel::H; "numeric_10h")]
    #[test_case("aAAAAAAAAA1111111111111111AAAAAAAAAAa".repeat(4), 12, ECLevel::Q; "byte_12q")]
    fn test_round_trip(data: String, ver: usize, ecl: ECLevel) {
        let qr = QRBuilder::new(&data).version(Version::new(ver).unwrap()).ec_level(ecl).build().unwrap();
        let (decoded_ver, content) = decode(&qr);
        assert_eq!(decoded_ver, ver);
        assert_eq!(content, data);
    }

    #[test_case("1234567890".repeat(305), ECLevel::H, 40; "numeric_40h")]
    #[test_case("HELLO WORLD ".repeat(100), ECLevel::M, 23; "alphanumeric_auto")]
    fn test_round_trip_auto_version(data: String, ecl: ECLevel, ver: usize) {
        let qr = QRBuilder::new(&data).ec_level(ecl).build().unwrap();
        assert_eq!(*qr.version(), ver);
        assert_eq!(decode(&qr).1, data);
    }

    #[test]
    fn test_capacity_exceeded() {
        let data = "1234567890".repeat(306);
        let res = QRBuilder::new(&data).ec_level(ECLevel::H).build();
        assert_eq!(res.unwrap_err(), qrsculpt::QRError::CapacityExceeded);
    }
}

#[cfg(test)]
mod beautify_tests {
    use image::{DynamicImage, GrayImage, Luma};
    use test_case::test_case;

    use super::decode;
    use qrsculpt::{ECLevel, QRBuilder, Target, Version};

    // Dark below the diagonal, importance rising towards the centre
    fn triangle_target(ver: Version) -> Target {
        let w = ver.width();
        let mid = w as f32 / 2.0;
        let mut pattern = Vec::with_capacity(w * w);
        let mut importance = Vec::with_capacity(w * w);
        for r in 0..w {
            for c in 0..w {
                pattern.push(r > c);
                importance.push(mid - (r as f32 - mid).abs().max((c as f32 - mid).abs()));
            }
        }
        Target::new(w, pattern, importance).unwrap()
    }

    #[test_case("https://example.com/qrsculpt", 5, ECLevel::L)]
    #[test_case("HELLO WORLD", 3, ECLevel::M)]
    #[test_case("12345", 7, ECLevel::Q)]
    #[test_case("Beautiful symbols", 10, ECLevel::H)]
    fn test_beautify_round_trip(data: &str, ver: usize, ecl: ECLevel) {
        let ver = Version::new(ver).unwrap();
        let qr = QRBuilder::new(data).version(ver).ec_level(ecl).beautify(&triangle_target(ver)).unwrap();
        assert_eq!(decode(&qr), (*ver, data.to_string()));
    }

    #[test]
    fn test_beautify_from_image_round_trip() {
        let ver = Version::new(6).unwrap();
        let module_sz = 6;
        let px = ver.width() as u32 * module_sz;
        let centre = px as f32 / 2.0;
        let img = GrayImage::from_fn(px, px, |x, y| {
            let d = ((x as f32 - centre).powi(2) + (y as f32 - centre).powi(2)).sqrt();
            if d < centre * 0.6 {
                Luma([20])
            } else {
                Luma([235])
            }
        });
        let img = DynamicImage::ImageLuma8(img);
        let target = Target::from_image(&img, ver, module_sz).unwrap();
        let qr = QRBuilder::new("qrsculpt").version(ver).ec_level(ECLevel::M).beautify(&target).unwrap();
        assert_eq!(decode(&qr), (6, "qrsculpt".to_string()));
    }
}
