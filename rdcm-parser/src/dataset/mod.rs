//! The dataset-level codec: a flat [`DataToken`] stream over an
//! element codec, which understands sequence/item/pixel-sequence
//! nesting so callers never have to recurse by hand.

pub mod read;
pub mod tokens;
pub mod write;

pub use read::{DataSetReader, ReadOptions};
pub use tokens::DataToken;
pub use write::DataSetWriter;
