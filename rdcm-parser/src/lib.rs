//! The streaming DICOM data set codec: a bounded-read [`stream`], a
//! transfer-syntax-aware element codec ([`stateful`]), the
//! sequence/item/pixel-sequence-aware token stream built on top of it
//! ([`dataset`]), and the post-parse [`frame_index`] builder.
//!
//! `rdcm-object` builds a full `DicomFile`/`InMemDicomObject` on top of
//! this crate; this crate has no notion of a "file" or an in-memory
//! tree, only of a byte stream under a known transfer syntax.

pub mod dataset;
pub mod error;
pub mod frame_index;
pub mod stateful;
pub mod stream;

pub use dataset::{DataSetReader, DataSetWriter, DataToken, ReadOptions};
pub use error::{Error, Result};
pub use frame_index::{FrameInfo, NativePixelParams};
pub use stateful::{StatefulDecoder, StatefulEncoder};
pub use stream::{detect_preamble, ByteStream, PreambleCheck};
