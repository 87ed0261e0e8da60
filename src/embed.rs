use image::{imageops::FilterType, DynamicImage};
use imageproc::{
    filter::median_filter,
    gradients::{horizontal_sobel, vertical_sobel},
};
use log::debug;

use crate::common::metadata::Version;
use crate::error::{QRError, QRResult};

/// Appearance the beautifier steers towards: a dark/light wish per module and
/// how much each module matters visually.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    w: usize,
    pattern: Vec<bool>,
    importance: Vec<f32>,
}

impl Target {
    pub fn new(w: usize, pattern: Vec<bool>, importance: Vec<f32>) -> QRResult<Self> {
        let sz = w * w;
        if pattern.len() != sz || importance.len() != sz {
            return Err(QRError::InvalidArgument(format!(
                "Target grids must hold {sz} modules: Pattern {}, Importance {}",
                pattern.len(),
                importance.len()
            )));
        }
        if let Some(v) = importance.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(QRError::InvalidArgument(format!("Invalid importance value {v}")));
        }
        Ok(Self { w, pattern, importance })
    }

    /// Samples an image at module resolution. Dark is decided on each module's
    /// centre third, importance sums the clamped Sobel magnitude over the
    /// module.
    pub fn from_image(img: &DynamicImage, ver: Version, module_sz: u32) -> QRResult<Self> {
        if module_sz == 0 {
            return Err(QRError::InvalidArgument("Module size must be positive".to_string()));
        }

        let w = ver.width();
        let px = w as u32 * module_sz;
        let gray = img.resize_exact(px, px, FilterType::Triangle).to_luma8();
        let blurred = median_filter(&gray, 1, 1);
        let gx = horizontal_sobel(&blurred);
        let gy = vertical_sobel(&blurred);

        let lo = module_sz / 3;
        let hi = (module_sz - lo).max(lo + 1);
        let mut pattern = Vec::with_capacity(w * w);
        let mut importance = Vec::with_capacity(w * w);
        for r in 0..w as u32 {
            for c in 0..w as u32 {
                let (y0, x0) = (r * module_sz, c * module_sz);

                let mut edge = 0.0;
                for y in y0..y0 + module_sz {
                    for x in x0..x0 + module_sz {
                        let mag = gx.get_pixel(x, y)[0].unsigned_abs() as u32
                            + gy.get_pixel(x, y)[0].unsigned_abs() as u32;
                        edge += mag.min(255) as f32 / 255.0;
                    }
                }
                importance.push(edge);

                let (mut sum, mut cnt) = (0u32, 0u32);
                for y in y0 + lo..y0 + hi {
                    for x in x0 + lo..x0 + hi {
                        sum += gray.get_pixel(x, y)[0] as u32;
                        cnt += 1;
                    }
                }
                pattern.push(sum < DARK_THRESHOLD * cnt);
            }
        }

        debug!(
            "Sampled {w}x{w} target: {} dark modules, total importance {:.1}",
            pattern.iter().filter(|&&d| d).count(),
            importance.iter().sum::<f32>()
        );
        Self::new(w, pattern, importance)
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn is_dark(&self, r: usize, c: usize) -> bool {
        self.pattern[r * self.w + c]
    }

    pub fn importance(&self, r: usize, c: usize) -> f32 {
        self.importance[r * self.w + c]
    }
}

#[cfg(test)]
mod target_tests {
    use image::{DynamicImage, GrayImage, Luma};

    use super::Target;
    use crate::common::metadata::Version;
    use crate::error::QRError;

    #[test]
    fn test_new_validates() {
        assert!(Target::new(2, vec![false; 4], vec![0.0; 4]).is_ok());
        assert!(matches!(
            Target::new(2, vec![false; 3], vec![0.0; 4]),
            Err(QRError::InvalidArgument(_))
        ));
        assert!(matches!(
            Target::new(2, vec![false; 4], vec![0.0, 1.0, -1.0, 0.0]),
            Err(QRError::InvalidArgument(_))
        ));
        assert!(matches!(
            Target::new(2, vec![false; 4], vec![0.0, f32::NAN, 0.0, 0.0]),
            Err(QRError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_from_image_left_half_dark() {
        let ver = Version::new(1).unwrap();
        let module_sz = 4;
        let px = 21 * module_sz;
        let img = GrayImage::from_fn(px, px, |x, _| if x < px / 2 { Luma([0]) } else { Luma([255]) });
        let target = Target::from_image(&DynamicImage::ImageLuma8(img), ver, module_sz).unwrap();

        assert_eq!(target.width(), 21);
        assert!(target.is_dark(10, 0));
        assert!(target.is_dark(3, 9));
        assert!(!target.is_dark(3, 11));
        assert!(!target.is_dark(20, 20));

        // Edges only where the halves meet
        assert_eq!(target.importance(5, 0), 0.0);
        assert_eq!(target.importance(5, 20), 0.0);
        assert!(target.importance(5, 10) > 0.0);
    }

    #[test]
    fn test_from_image_rejects_zero_module_size() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(10, 10));
        assert!(Target::from_image(&img, Version::new(1).unwrap(), 0).is_err());
    }
}

// Global constants
//------------------------------------------------------------------------------

const DARK_THRESHOLD: u32 = 128;
