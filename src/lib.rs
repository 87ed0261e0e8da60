//! # qrsculpt
//!
//! A QR code generator that can bend a symbol's appearance towards an image
//! while keeping it decodable.
//!
//! Standard generation picks the smallest version that fits, adds
//! Reed-Solomon error correction, interleaves the blocks and chooses the mask
//! with the lowest penalty. Beautified generation keeps the header and data
//! bits untouched and spends each block's redundancy on looking like a target:
//! the most important bytes are pinned to the target's appearance and the rest
//! are solved for so every block stays a valid codeword.
//!
//! ## Quick Start
//!
//! ```rust
//! use qrsculpt::{ECLevel, QRBuilder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let qr = QRBuilder::new("Hello, World!").ec_level(ECLevel::M).build()?;
//! let img = qr.render(4);
//! assert_eq!(img.width(), (qr.width() as u32 + 8) * 4);
//! # Ok(())
//! # }
//! ```
//!
//! ### Beautified symbols
//!
//! ```rust,no_run
//! use qrsculpt::{QRBuilder, Target, Version};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ver = Version::new(5)?;
//! let img = image::open("logo.png")?;
//! let target = Target::from_image(&img, ver, 8)?;
//! let qr = QRBuilder::new("https://example.com").version(ver).beautify(&target)?;
//! qr.render_with_background(&img.to_rgb8(), &target, 8)?.save("logo_qr.png")?;
//! # Ok(())
//! # }
//! ```

#![allow(clippy::items_after_test_module)]

pub mod builder;
pub mod common;
pub mod embed;
pub mod error;

pub use builder::{Module, QRBuilder, SymbolPlan, QR};
pub use common::codec::{Charset, Mode};
pub use common::ec::ReedSolomonEncoder;
pub use common::galois::Field;
pub use common::mask::MaskPattern;
pub use common::metadata::{Color, ECLevel, Version};
pub use embed::Target;
pub use error::{QRError, QRResult};
