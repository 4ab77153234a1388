mod block;
mod decoder;
mod encoder;
mod galois;
mod poly;

pub(crate) use block::*;
pub use decoder::*;
pub use encoder::*;
pub use galois::*;
pub use poly::*;
