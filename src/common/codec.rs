use encoding_rs::{Encoding, SHIFT_JIS, UTF_8};

use super::metadata::Version;
use crate::error::{QRError, QRResult};

pub use encode::*;

// Mode
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Mode {
    Numeric = 0b0001,
    Alphanumeric = 0b0010,
    Byte = 0b0100,
    Kanji = 0b1000,
}

impl Mode {
    #[inline]
    fn numeric_digit(char: u8) -> u16 {
        debug_assert!(Mode::Numeric.contains(char), "Invalid numeric data: {char}");
        (char - b'0') as u16
    }

    #[inline]
    fn alphanumeric_digit(char: u8) -> u16 {
        debug_assert!(Mode::Alphanumeric.contains(char), "Invalid alphanumeric data: {char}");
        match char {
            b'0'..=b'9' => (char - b'0') as u16,
            b'A'..=b'Z' => (char - b'A' + 10) as u16,
            b' ' => 36,
            b'$' => 37,
            b'%' => 38,
            b'*' => 39,
            b'+' => 40,
            b'-' => 41,
            b'.' => 42,
            b'/' => 43,
            b':' => 44,
            _ => unreachable!("Invalid alphanumeric {char}"),
        }
    }

    // Shift_JIS double byte code to its 13-bit kanji value
    fn kanji_value(hi: u8, lo: u8) -> QRResult<u16> {
        let code = ((hi as u16) << 8) | lo as u16;
        let sub = match code {
            0x8140..=0x9ffc => code - 0x8140,
            0xe040..=0xebbf => code - 0xc140,
            _ => return Err(QRError::InvalidChar),
        };
        Ok((sub >> 8) * 0xc0 + (sub & 0xff))
    }

    fn numeric_chunk(data: &[u8]) -> u16 {
        debug_assert!(data.len() <= 3, "Data is too long for numeric conver: {}", data.len());
        data.iter().fold(0_u16, |n, b| n * 10 + Self::numeric_digit(*b))
    }

    fn alphanumeric_chunk(data: &[u8]) -> u16 {
        debug_assert!(data.len() <= 2, "Data is too long for alphanumeric conver: {}", data.len());
        data.iter().fold(0_u16, |n, b| n * 45 + Self::alphanumeric_digit(*b))
    }

    pub fn encode_chunk(&self, data: &[u8]) -> QRResult<u16> {
        let len = data.len();
        match self {
            Self::Numeric => Ok(Self::numeric_chunk(data)),
            Self::Alphanumeric => Ok(Self::alphanumeric_chunk(data)),
            Self::Byte => {
                debug_assert!(len == 1, "Data is too long for byte conver: {len}");
                Ok(data[0] as u16)
            }
            Self::Kanji => {
                debug_assert!(len == 2, "Kanji chunk must be a byte pair: {len}");
                Self::kanji_value(data[0], data[1])
            }
        }
    }

    pub fn contains(&self, byte: u8) -> bool {
        match self {
            Self::Numeric => byte.is_ascii_digit(),
            Self::Alphanumeric => {
                matches!(byte, b'0'..=b'9' | b'A'..=b'Z' | b' ' | b'$' | b'%' | b'*' | b'+' | b'-' | b'.' | b'/' | b':')
            }
            Self::Byte | Self::Kanji => true,
        }
    }

    /// Bit length of `len` characters, where a kanji character is one byte pair.
    pub fn encoded_len(&self, len: usize) -> usize {
        match *self {
            Self::Numeric => (len * 10 + 2) / 3,
            Self::Alphanumeric => (len * 11 + 1) / 2,
            Self::Byte => len * 8,
            Self::Kanji => len * 13,
        }
    }

    pub fn char_cnt_bits(&self, ver: Version) -> usize {
        let i = match *ver {
            1..=9 => 0,
            10..=26 => 1,
            _ => 2,
        };
        match self {
            Self::Numeric => [10, 12, 14][i],
            Self::Alphanumeric => [9, 11, 13][i],
            Self::Byte => [8, 16, 16][i],
            Self::Kanji => [8, 10, 12][i],
        }
    }

    /// Picks the single mode for the whole content. Kanji only applies when the
    /// charset is Shift_JIS and every character is a double byte kanji code.
    pub fn choose(text: &str, charset: Charset) -> Self {
        if charset.is_shift_jis() {
            return if is_only_double_byte_kanji(text) { Self::Kanji } else { Self::Byte };
        }

        let mut has_numeric = false;
        let mut has_alphanumeric = false;
        for &b in text.as_bytes() {
            if Self::Numeric.contains(b) {
                has_numeric = true;
            } else if Self::Alphanumeric.contains(b) {
                has_alphanumeric = true;
            } else {
                return Self::Byte;
            }
        }

        if has_alphanumeric {
            Self::Alphanumeric
        } else if has_numeric {
            Self::Numeric
        } else {
            Self::Byte
        }
    }
}

fn is_only_double_byte_kanji(text: &str) -> bool {
    let (bytes, _, had_errors) = SHIFT_JIS.encode(text);
    if had_errors || bytes.len() % 2 != 0 {
        return false;
    }
    bytes.chunks_exact(2).all(|p| matches!(p[0], 0x81..=0x9f | 0xe0..=0xeb))
}


// Charset
//------------------------------------------------------------------------------

/// Byte mode character set. ISO-8859-1 is the QR default and needs no ECI, so
/// it is handled without going through `encoding_rs` (which maps that label to
/// windows-1252).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Latin1,
    Encoded(&'static Encoding),
}

impl Charset {
    pub fn from_label(label: &str) -> QRResult<Self> {
        let norm = label.trim().to_ascii_lowercase();
        if LATIN1_LABELS.contains(&norm.as_str()) {
            return Ok(Self::Latin1);
        }

        let enc = Encoding::for_label(norm.as_bytes())
            .ok_or_else(|| QRError::UnsupportedCharset(label.to_string()))?;
        // These can't be produced by an encoder
        if enc.output_encoding() != enc {
            return Err(QRError::UnsupportedCharset(label.to_string()));
        }
        Ok(Self::Encoded(enc))
    }

    pub fn utf8() -> Self {
        Self::Encoded(UTF_8)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Latin1 => "ISO-8859-1",
            Self::Encoded(enc) => enc.name(),
        }
    }

    pub fn is_shift_jis(&self) -> bool {
        matches!(self, Self::Encoded(enc) if *enc == SHIFT_JIS)
    }

    pub fn encode(&self, text: &str) -> QRResult<Vec<u8>> {
        match self {
            Self::Latin1 => {
                text.chars().map(|c| u8::try_from(c).map_err(|_| QRError::InvalidChar)).collect()
            }
            Self::Encoded(enc) => {
                let (bytes, _, had_errors) = enc.encode(text);
                if had_errors {
                    return Err(QRError::InvalidChar);
                }
                Ok(bytes.into_owned())
            }
        }
    }

    /// ECI designator announced ahead of byte mode data, if the charset has one.
    pub fn eci(&self) -> Option<u8> {
        let Self::Encoded(enc) = self else {
            return None;
        };
        ECI_DESIGNATORS.iter().find(|(name, _)| *name == enc.name()).map(|(_, eci)| *eci)
    }
}

#[cfg(test)]
mod charset_tests {
    use test_case::test_case;

    use super::Charset;
    use crate::error::QRError;

    #[test_case("ISO-8859-1")]
    #[test_case("latin1")]
    #[test_case(" iso8859-1 ")]
    fn test_latin1_labels(label: &str) {
        assert_eq!(Charset::from_label(label), Ok(Charset::Latin1));
    }

    #[test_case("utf-8", Some(26))]
    #[test_case("Shift_JIS", Some(20))]
    #[test_case("gbk", Some(29))]
    #[test_case("big5", Some(28))]
    #[test_case("euc-kr", Some(30))]
    #[test_case("windows-1251", Some(22))]
    #[test_case("iso-8859-2", Some(4))]
    #[test_case("iso-8859-15", Some(17))]
    #[test_case("koi8-r", None)]
    fn test_eci(label: &str, eci: Option<u8>) {
        assert_eq!(Charset::from_label(label).unwrap().eci(), eci);
    }

    #[test]
    fn test_unsupported() {
        assert!(matches!(Charset::from_label("utf-16le"), Err(QRError::UnsupportedCharset(_))));
        assert!(matches!(Charset::from_label("klingon"), Err(QRError::UnsupportedCharset(_))));
    }

    #[test]
    fn test_encode() {
        assert_eq!(Charset::Latin1.encode("héllo"), Ok(vec![b'h', 0xe9, b'l', b'l', b'o']));
        assert_eq!(Charset::Latin1.encode("日本"), Err(QRError::InvalidChar));
        assert_eq!(Charset::utf8().encode("é"), Ok(vec![0xc3, 0xa9]));
        let sjis = Charset::from_label("shift_jis").unwrap();
        assert_eq!(sjis.encode("点"), Ok(vec![0x93, 0x5f]));
        assert_eq!(sjis.encode("é"), Err(QRError::InvalidChar));
    }
}

// Segment
//------------------------------------------------------------------------------

/// Whole content in one mode, already converted to the bytes that get packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    mode: Mode,
    eci: Option<u8>,
    // Character count written in the header
    char_cnt: usize,
    data: Vec<u8>,
}

impl Segment {
    /// Without a charset, content outside ISO-8859-1 falls back to UTF-8 and is
    /// announced with an ECI.
    pub fn new(text: &str, charset: Option<Charset>) -> QRResult<Self> {
        let charset = match charset {
            Some(cs) => cs,
            None if text.chars().all(|c| (c as u32) <= 0xff) => Charset::Latin1,
            None => Charset::utf8(),
        };

        let mode = Mode::choose(text, charset);
        let (data, char_cnt, eci) = match mode {
            Mode::Numeric | Mode::Alphanumeric => (text.as_bytes().to_vec(), text.len(), None),
            Mode::Byte => {
                let data = charset.encode(text)?;
                let cnt = data.len();
                (data, cnt, charset.eci())
            }
            Mode::Kanji => {
                let data = charset.encode(text)?;
                let cnt = data.len() / 2;
                (data, cnt, None)
            }
        };
        Ok(Self { mode, eci, char_cnt, data })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn eci(&self) -> Option<u8> {
        self.eci
    }

    pub fn char_cnt(&self) -> usize {
        self.char_cnt
    }

    pub fn bit_len(&self, ver: Version) -> usize {
        let eci_bits = if self.eci.is_some() { MODE_INDICATOR_BITS + 8 } else { 0 };
        eci_bits
            + MODE_INDICATOR_BITS
            + self.mode.char_cnt_bits(ver)
            + self.mode.encoded_len(self.char_cnt)
    }
}


// Writer for encoded data
//------------------------------------------------------------------------------

mod writer {
    use super::{Mode, Segment, ECI_MODE_INDICATOR, MODE_INDICATOR_BITS, PADDING_CODEWORDS};
    use crate::common::{metadata::Version, BitStream};
    use crate::error::QRResult;

    pub fn push_segment(seg: &Segment, ver: Version, out: &mut BitStream) -> QRResult<()> {
        push_header(seg, ver, out);
        match seg.mode {
            Mode::Numeric => push_numeric_data(&seg.data, out),
            Mode::Alphanumeric => push_alphanumeric_data(&seg.data, out),
            Mode::Byte => push_byte_data(&seg.data, out),
            Mode::Kanji => push_kanji_data(&seg.data, out)?,
        }
        Ok(())
    }

    pub(super) fn push_header(seg: &Segment, ver: Version, out: &mut BitStream) {
        if let Some(eci) = seg.eci {
            out.push_bits(ECI_MODE_INDICATOR, MODE_INDICATOR_BITS);
            out.push_bits(eci, 8);
        }
        out.push_bits(seg.mode as u8, MODE_INDICATOR_BITS);
        let len_bits = seg.mode.char_cnt_bits(ver);
        debug_assert!(
            seg.char_cnt < (1 << len_bits),
            "Char count exceeds bit length: Char count {}, Char count bits {len_bits}",
            seg.char_cnt
        );
        out.push_bits(seg.char_cnt as u16, len_bits);
    }

    pub(super) fn push_numeric_data(data: &[u8], out: &mut BitStream) {
        for chunk in data.chunks(3) {
            let len = Mode::Numeric.encoded_len(chunk.len());
            let data = Mode::numeric_chunk(chunk);
            out.push_bits(data, len);
        }
    }

    pub(super) fn push_alphanumeric_data(data: &[u8], out: &mut BitStream) {
        for chunk in data.chunks(2) {
            let len = Mode::Alphanumeric.encoded_len(chunk.len());
            let data = Mode::alphanumeric_chunk(chunk);
            out.push_bits(data, len);
        }
    }

    pub(super) fn push_byte_data(data: &[u8], out: &mut BitStream) {
        for &b in data {
            out.push_bits(b, 8);
        }
    }

    pub(super) fn push_kanji_data(data: &[u8], out: &mut BitStream) -> QRResult<()> {
        for pair in data.chunks_exact(2) {
            let data = Mode::Kanji.encode_chunk(pair)?;
            out.push_bits(data, 13);
        }
        Ok(())
    }

    /// Up to 4 zero bits, then zero bits to the next byte boundary. Never
    /// writes past capacity.
    pub fn push_terminator(out: &mut BitStream) {
        let bit_len = out.len();
        let bit_capacity = out.capacity();
        if bit_len < bit_capacity {
            let term_len = std::cmp::min(4, bit_capacity - bit_len);
            out.push_bits(0u8, term_len);
        }

        let offset = out.len() & 7;
        if offset > 0 {
            out.push_bits(0u8, 8 - offset);
        }
    }

    pub fn push_padding_codewords(out: &mut BitStream) {
        let offset = out.len() & 7;
        debug_assert!(offset == 0, "Bit offset should be zero before padding codewords: {offset}");

        let remain_byte_capacity = (out.capacity() - out.len()) >> 3;
        PADDING_CODEWORDS.iter().copied().cycle().take(remain_byte_capacity).for_each(|pc| {
            out.push_bits(pc, 8);
        });
    }

}

// Encoder
//------------------------------------------------------------------------------

mod encode {
    use log::debug;

    use super::{
        writer::{push_padding_codewords, push_segment, push_terminator},
        Charset, Mode, Segment,
    };
    use crate::common::{
        metadata::{ECLevel, Version},
        BitStream,
    };
    use crate::error::{QRError, QRResult};

    /// Header and data bits of a planned symbol, terminated and byte aligned but
    /// not yet padded to capacity.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct EncodedData {
        pub bits: BitStream,
        pub ver: Version,
        pub mode: Mode,
    }

    impl EncodedData {
        /// Number of header and data bits, terminator included.
        pub fn head_len(&self) -> usize {
            self.bits.len()
        }

        /// Fills the remaining capacity with the alternating pad codewords.
        pub fn padded(&self) -> BitStream {
            let mut bits = self.bits.clone();
            push_padding_codewords(&mut bits);
            bits
        }
    }

    pub fn encode(
        text: &str,
        ecl: ECLevel,
        ver: Option<Version>,
        charset: Option<Charset>,
    ) -> QRResult<EncodedData> {
        if text.is_empty() {
            return Err(QRError::EmptyData);
        }

        let seg = Segment::new(text, charset)?;
        let ver = match ver {
            Some(v) => v,
            None => recommend_version(&seg, ecl)?,
        };
        debug!("Encoding {} chars in {:?} mode, version {}", seg.char_cnt(), seg.mode(), *ver);

        let bit_capacity = ver.data_bit_capacity(ecl);
        if seg.char_cnt() >= 1 << seg.mode().char_cnt_bits(ver) {
            return Err(QRError::CapacityExceeded);
        }
        if seg.bit_len(ver) > bit_capacity {
            return Err(QRError::CapacityExceeded);
        }

        let mut bits = BitStream::new(bit_capacity);
        push_segment(&seg, ver, &mut bits)?;
        push_terminator(&mut bits);
        Ok(EncodedData { bits, ver, mode: seg.mode() })
    }

    // Length field width depends on the version, so size it with a version 1
    // guess and then settle on the final version.
    fn recommend_version(seg: &Segment, ecl: ECLevel) -> QRResult<Version> {
        let provisional = choose_version(seg.bit_len(Version::new(1)?), ecl)?;
        choose_version(seg.bit_len(provisional), ecl)
    }

    fn choose_version(bits: usize, ecl: ECLevel) -> QRResult<Version> {
        Version::all().find(|v| v.data_bit_capacity(ecl) >= bits).ok_or(QRError::CapacityExceeded)
    }

}

// Global constants
//------------------------------------------------------------------------------

const MODE_INDICATOR_BITS: usize = 4;

const ECI_MODE_INDICATOR: u8 = 0b0111;

static PADDING_CODEWORDS: [u8; 2] = [0b1110_1100, 0b0001_0001];

static LATIN1_LABELS: [&str; 9] = [
    "iso-8859-1",
    "iso8859-1",
    "iso_8859-1",
    "iso88591",
    "latin1",
    "l1",
    "cp819",
    "ibm819",
    "iso-ir-100",
];

static ECI_DESIGNATORS: [(&str, u8); 22] = [
    ("ISO-8859-2", 4),
    ("ISO-8859-3", 5),
    ("ISO-8859-4", 6),
    ("ISO-8859-5", 7),
    ("ISO-8859-6", 8),
    ("ISO-8859-7", 9),
    ("ISO-8859-8", 10),
    ("ISO-8859-10", 12),
    ("ISO-8859-13", 15),
    ("ISO-8859-14", 16),
    ("ISO-8859-15", 17),
    ("ISO-8859-16", 18),
    ("Shift_JIS", 20),
    ("windows-1250", 21),
    ("windows-1251", 22),
    ("windows-1252", 23),
    ("windows-1256", 24),
    ("UTF-8", 26),
    ("Big5", 28),
    ("GBK", 29),
    ("gb18030", 29),
    ("EUC-KR", 30),
];
