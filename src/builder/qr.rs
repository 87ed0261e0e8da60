use std::ops::Deref;

use image::{imageops, GrayImage, Luma, Rgb, RgbImage};

use crate::common::{
    mask::MaskPattern,
    metadata::{format_info, Color, ECLevel, Version, FORMAT_INFO_BIT_LEN, VERSION_INFO_BIT_LEN},
    BitStream, EncRegionIter,
};
use crate::embed::Target;
use crate::error::{QRError, QRResult};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Module {
    Empty,
    Func(Color),
    Version(Color),
    Format(Color),
    Data(Color),
}

impl Deref for Module {
    type Target = Color;
    fn deref(&self) -> &Self::Target {
        match self {
            Module::Empty => &Color::Light,
            Module::Func(c) => c,
            Module::Version(c) => c,
            Module::Format(c) => c,
            Module::Data(c) => c,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QR {
    grid: Vec<Module>,
    w: usize,
    ver: Version,
    ecl: ECLevel,
    mask: Option<MaskPattern>,
    // Quiet zone in modules
    margin: usize,
}

// QR type for builder
//------------------------------------------------------------------------------

impl QR {
    pub fn new(ver: Version, ecl: ECLevel) -> Self {
        let w = ver.width();
        Self { grid: vec![Module::Empty; w * w], w, ver, ecl, mask: None, margin: DEFAULT_MARGIN }
    }

    pub fn grid(&self) -> &[Module] {
        &self.grid
    }

    pub fn version(&self) -> Version {
        self.ver
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ecl
    }

    pub fn mask(&self) -> Option<MaskPattern> {
        self.mask
    }

    pub fn margin(&self) -> usize {
        self.margin
    }

    pub fn set_margin(&mut self, margin: usize) {
        self.margin = margin;
    }

    pub fn metadata(&self) -> String {
        match self.mask {
            Some(m) => {
                format!("{{ Version: {}, Ec level: {:?}, Mask: {} }}", *self.ver, self.ecl, *m)
            }
            None => format!("{{ Version: {}, Ec level: {:?}, Mask: None }}", *self.ver, self.ecl),
        }
    }

    pub fn count_dark_modules(&self) -> usize {
        self.grid.iter().filter(|&m| matches!(**m, Color::Dark)).count()
    }

    #[cfg(test)]
    pub fn to_debug_str(&self) -> String {
        let w = self.w as i16;
        let mut res = String::with_capacity((w * (w + 1)) as usize);
        res.push('\n');
        for i in 0..w {
            for j in 0..w {
                let c = match self.get(i, j) {
                    Module::Empty => '.',
                    Module::Func(Color::Dark) => 'f',
                    Module::Func(Color::Light) => 'F',
                    Module::Version(Color::Dark) => 'v',
                    Module::Version(Color::Light) => 'V',
                    Module::Format(Color::Dark) => 'm',
                    Module::Format(Color::Light) => 'M',
                    Module::Data(Color::Dark) => 'd',
                    Module::Data(Color::Light) => 'D',
                };
                res.push(c);
            }
            res.push('\n');
        }
        res
    }

    fn coord_to_index(&self, r: i16, c: i16) -> usize {
        let w = self.w as i16;
        debug_assert!(-w <= r && r < w, "Row {r} out of bounds for width {w}");
        debug_assert!(-w <= c && c < w, "Column {c} out of bounds for width {w}");

        let r = if r < 0 { r + w } else { r };
        let c = if c < 0 { c + w } else { c };
        (r * w + c) as _
    }

    /// Negative coordinates count back from the bottom or right edge.
    pub fn get(&self, r: i16, c: i16) -> Module {
        self.grid[self.coord_to_index(r, c)]
    }

    pub fn get_mut(&mut self, r: i16, c: i16) -> &mut Module {
        let index = self.coord_to_index(r, c);
        &mut self.grid[index]
    }

    pub fn set(&mut self, r: i16, c: i16, module: Module) {
        *self.get_mut(r, c) = module;
    }
}


// Finder pattern
//------------------------------------------------------------------------------

impl QR {
    fn draw_finder_patterns(&mut self) {
        self.draw_finder_pattern_at(3, 3);
        self.draw_finder_pattern_at(3, -4);
        self.draw_finder_pattern_at(-4, 3);
    }

    // Centre of the pattern plus its light separator on the inner sides
    fn draw_finder_pattern_at(&mut self, r: i16, c: i16) {
        let (dr_top, dr_bottom) = if r > 0 { (-3, 4) } else { (-4, 3) };
        let (dc_left, dc_right) = if c > 0 { (-3, 4) } else { (-4, 3) };
        for i in dr_top..=dr_bottom {
            for j in dc_left..=dc_right {
                let clr = match (i, j) {
                    (4 | -4, _) | (_, 4 | -4) => Color::Light,
                    (3 | -3, _) | (_, 3 | -3) => Color::Dark,
                    (2 | -2, _) | (_, 2 | -2) => Color::Light,
                    _ => Color::Dark,
                };
                self.set(r + i, c + j, Module::Func(clr));
            }
        }
    }
}


// Timing pattern
//------------------------------------------------------------------------------

impl QR {
    fn draw_timing_pattern(&mut self) {
        let last = self.w as i16 - 9;
        self.draw_line(TIMING_LINE, 8, TIMING_LINE, last);
        self.draw_line(8, TIMING_LINE, last, TIMING_LINE);
    }

    // Dark on even indices
    fn draw_line(&mut self, r1: i16, c1: i16, r2: i16, c2: i16) {
        debug_assert!(r1 == r2 || c1 == c2, "Line is neither vertical nor horizontal");

        if r1 == r2 {
            for j in c1..=c2 {
                self.set(r1, j, Module::Func(Color::from(j & 1 == 0)));
            }
        } else {
            for i in r1..=r2 {
                self.set(i, c1, Module::Func(Color::from(i & 1 == 0)));
            }
        }
    }
}


// Alignment pattern
//------------------------------------------------------------------------------

impl QR {
    fn draw_alignment_patterns(&mut self) {
        let poses = self.ver.alignment_pattern();
        for &r in poses {
            for &c in poses {
                self.draw_alignment_pattern_at(r, c)
            }
        }
    }

    // Centres overlapping a finder pattern are skipped
    fn draw_alignment_pattern_at(&mut self, r: i16, c: i16) {
        let w = self.w as i16;
        if (r == 6 && (c == 6 || c - w == -7)) || (r - w == -7 && c == 6) {
            return;
        }
        for i in -2..=2 {
            for j in -2..=2 {
                let clr = match (i, j) {
                    (-2 | 2, _) | (_, -2 | 2) | (0, 0) => Color::Dark,
                    _ => Color::Light,
                };
                self.set(r + i, c + j, Module::Func(clr));
            }
        }
    }
}


// All function patterns
//------------------------------------------------------------------------------

impl QR {
    pub fn draw_all_function_patterns(&mut self) {
        self.draw_finder_patterns();
        self.draw_timing_pattern();
        self.draw_alignment_patterns();
    }
}

// Format & version info
//------------------------------------------------------------------------------

impl QR {
    fn reserve_format_area(&mut self) {
        self.draw_format_info((1 << FORMAT_INFO_BIT_LEN) - 1);
    }

    fn draw_format_info(&mut self, info: u32) {
        self.draw_number(info, FORMAT_INFO_BIT_LEN, &FORMAT_INFO_COORDS_MAIN);
        self.draw_number(info, FORMAT_INFO_BIT_LEN, &FORMAT_INFO_COORDS_SIDE);
        self.set(-8, 8, Module::Format(Color::Dark));
    }

    // Bit i sits at (i / 3, w - 11 + i % 3) and at its transpose
    fn draw_version_info(&mut self) {
        if *self.ver < 7 {
            return;
        }
        let info = self.ver.info();
        for i in 0..VERSION_INFO_BIT_LEN {
            let module = Module::Version(Color::from((info >> i) & 1 == 1));
            let (a, b) = ((i / 3) as i16, (i % 3) as i16 - 11);
            self.set(a, b, module);
            self.set(b, a, module);
        }
    }

    // Most significant bit goes to the first coordinate
    fn draw_number(&mut self, number: u32, bit_len: usize, coords: &[(i16, i16)]) {
        let mut mask = 1 << (bit_len - 1);
        for &(r, c) in coords {
            self.set(r, c, Module::Format(Color::from(number & mask != 0)));
            mask >>= 1;
        }
    }
}


// Encoding region
//------------------------------------------------------------------------------

impl QR {
    /// Coordinates of the data modules in placement order, remainder bits
    /// included at the tail.
    pub fn data_coords(ver: Version) -> Vec<(i16, i16)> {
        let mut qr = QR::new(ver, ECLevel::L);
        qr.draw_all_function_patterns();
        qr.reserve_format_area();
        qr.draw_version_info();
        EncRegionIter::new(ver).filter(|&(r, c)| qr.get(r, c) == Module::Empty).collect()
    }

    pub fn draw_encoding_region(&mut self, payload: &BitStream) {
        debug_assert_eq!(
            payload.len(),
            self.ver.total_codewords() << 3,
            "Payload doesn't fill the symbol's codewords"
        );

        self.reserve_format_area();
        self.draw_version_info();

        let mut coords = EncRegionIter::new(self.ver);
        for bit in payload.iter() {
            let module = Module::Data(Color::from(bit));
            for (r, c) in coords.by_ref() {
                if matches!(self.get(r, c), Module::Empty) {
                    self.set(r, c, module);
                    break;
                }
            }
        }
        self.fill_remainder_bits(coords);

        debug_assert!(!self.grid.contains(&Module::Empty), "Empty module left after placement");
    }

    fn fill_remainder_bits(&mut self, coords: impl Iterator<Item = (i16, i16)>) {
        let mut filled = 0;
        for (r, c) in coords {
            if matches!(self.get(r, c), Module::Empty) {
                self.set(r, c, Module::Data(Color::Light));
                filled += 1;
            }
        }
        debug_assert_eq!(filled, self.ver.remainder_bits(), "Unexpected remainder bit count");
    }

    /// Flips data modules where the pattern's function holds and writes the
    /// matching format info.
    pub fn apply_mask(&mut self, pattern: MaskPattern) {
        self.mask = Some(pattern);
        let mask_fn = pattern.mask_functions();
        let w = self.w as i16;
        for r in 0..w {
            for c in 0..w {
                if mask_fn(r, c) {
                    if let Module::Data(clr) = self.get(r, c) {
                        self.set(r, c, Module::Data(!clr))
                    }
                }
            }
        }
        self.draw_format_info(format_info(self.ecl, *pattern));
    }
}


// Render
//------------------------------------------------------------------------------

impl QR {
    pub fn render(&self, module_sz: u32) -> GrayImage {
        let qz_sz = self.margin as u32 * module_sz;
        let qr_sz = self.w as u32 * module_sz;
        let total_sz = qz_sz + qr_sz + qz_sz;

        let mut canvas = GrayImage::from_pixel(total_sz, total_sz, Luma([255]));
        for i in 0..qr_sz {
            for j in 0..qr_sz {
                let r = (i / module_sz) as i16;
                let c = (j / module_sz) as i16;
                let pixel = self.get(r, c).select(Luma([255]), Luma([0]));
                canvas.put_pixel(j + qz_sz, i + qz_sz, pixel);
            }
        }

        canvas
    }

    /// Renders over a background stretched to cover the symbol. Function
    /// patterns stay solid. Format and version modules, and data modules that
    /// disagree with `target`, get a solid centre third; data modules that
    /// already match show the background only.
    pub fn render_with_background(
        &self,
        bg: &RgbImage,
        target: &Target,
        module_sz: u32,
    ) -> QRResult<RgbImage> {
        if target.width() != self.w {
            return Err(QRError::TargetMismatch { expected: self.w, found: target.width() });
        }

        let qz_sz = self.margin as u32 * module_sz;
        let qr_sz = self.w as u32 * module_sz;
        let total_sz = qz_sz + qr_sz + qz_sz;
        let bg = imageops::resize(bg, qr_sz, qr_sz, imageops::FilterType::Triangle);

        let lo = module_sz / 3;
        let hi = module_sz - lo;
        let is_centre = |p: u32| (lo..hi).contains(&(p % module_sz));

        let mut canvas = RgbImage::from_pixel(total_sz, total_sz, Rgb([255, 255, 255]));
        for i in 0..qr_sz {
            for j in 0..qr_sz {
                let r = (i / module_sz) as i16;
                let c = (j / module_sz) as i16;
                let module = self.get(r, c);
                let solid = module.select(Rgb([255, 255, 255]), Rgb([0, 0, 0]));
                let dotted = match module {
                    Module::Func(_) | Module::Empty => {
                        canvas.put_pixel(j + qz_sz, i + qz_sz, solid);
                        continue;
                    }
                    Module::Format(_) | Module::Version(_) => true,
                    Module::Data(clr) => {
                        (clr == Color::Dark) != target.is_dark(r as usize, c as usize)
                    }
                };
                let pixel = if dotted && is_centre(i) && is_centre(j) {
                    solid
                } else {
                    *bg.get_pixel(j, i)
                };
                canvas.put_pixel(j + qz_sz, i + qz_sz, pixel);
            }
        }

        Ok(canvas)
    }

    // Light modules print as blocks for dark terminals
    pub fn to_str(&self, module_sz: usize) -> String {
        let qz_sz = self.margin * module_sz;
        let qr_sz = self.w * module_sz;
        let total_sz = qz_sz + qr_sz + qz_sz;

        let mut canvas = String::with_capacity(total_sz * (total_sz + 1));
        for i in 0..total_sz {
            for j in 0..total_sz {
                if i < qz_sz || i >= qz_sz + qr_sz || j < qz_sz || j >= qz_sz + qr_sz {
                    canvas.push('█');
                    continue;
                }
                let r = ((i - qz_sz) / module_sz) as i16;
                let c = ((j - qz_sz) / module_sz) as i16;
                canvas.push(self.get(r, c).select('█', ' '));
            }
            canvas.push('\n');
        }

        canvas
    }
}


// Global constants
//------------------------------------------------------------------------------

pub const DEFAULT_MARGIN: usize = 4;

const TIMING_LINE: i16 = 6;

// Most significant bit first
static FORMAT_INFO_COORDS_MAIN: [(i16, i16); 15] = [
    (8, 0),
    (8, 1),
    (8, 2),
    (8, 3),
    (8, 4),
    (8, 5),
    (8, 7),
    (8, 8),
    (7, 8),
    (5, 8),
    (4, 8),
    (3, 8),
    (2, 8),
    (1, 8),
    (0, 8),
];

static FORMAT_INFO_COORDS_SIDE: [(i16, i16); 15] = [
    (-1, 8),
    (-2, 8),
    (-3, 8),
    (-4, 8),
    (-5, 8),
    (-6, 8),
    (-7, 8),
    (8, -8),
    (8, -7),
    (8, -6),
    (8, -5),
    (8, -4),
    (8, -3),
    (8, -2),
    (8, -1),
];
