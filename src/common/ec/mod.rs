mod block;
mod encoder;
mod matrix;

pub use block::*;
pub use encoder::*;

