pub mod bit_utils;
pub mod codec;
pub mod ec;
pub mod galois;
pub mod iter;
pub mod mask;
pub mod metadata;
pub mod poly;

pub use bit_utils::*;
pub use ec::*;
pub use galois::*;
pub use iter::*;
pub use mask::*;
pub use metadata::*;
pub use poly::*;
