//! A high-level abstraction for reading and manipulating DICOM
//! objects: a full Part 10 file, a File Meta Information group, and
//! an in-memory data set, each with their own, independently useful
//! type.
//!
//! ## Overview
//!
//! - [`DicomFile`] opens and writes whole `.dcm` files: preamble
//!   detection (with the ACR-NEMA-compatible headerless fallback),
//!   the [`FileMetaTable`], and the main data set together.
//! - [`InMemDicomObject`] is the in-memory data set itself: an ordered
//!   tree of elements, readable from a bare byte stream under an
//!   already-known transfer syntax (no file meta group required), and
//!   buildable from scratch for writing new objects.
//! - [`FileMetaTable`] is the File Meta Information group (0002,xxxx)
//!   on its own, always Explicit VR Little Endian regardless of what
//!   transfer syntax the main data set uses.
//! - [`pixel_frame_index`][InMemDicomObject::pixel_frame_index] and
//!   [`pixel_frame_bytes`][InMemDicomObject::pixel_frame_bytes] give
//!   O(1) access to individual frames of Pixel Data, native or
//!   encapsulated, without re-walking the data set.
//!
//! # Examples
//!
//! ```no_run
//! use rdcm_object::DicomFile;
//! use rdcm_core::Tag;
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let file = DicomFile::open("0001.dcm")?;
//! let patient_name = file
//!     .dataset()
//!     .element(Tag(0x0010, 0x0010))?
//!     .value()
//!     .primitive()
//!     .unwrap()
//!     .to_str()?;
//! # Ok(())
//! # }
//! ```

mod file;
mod frames;
mod mem;
mod meta;

pub mod error;

pub use file::{DicomFile, OpenOptions};
pub use frames::FrameInfo;
pub use mem::InMemDicomObject;
pub use meta::FileMetaTable;

pub use error::Error;
