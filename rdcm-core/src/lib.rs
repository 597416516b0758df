//! Core data types shared by every layer of the `rdcm` DICOM toolkit:
//! the attribute [`Tag`], the [`VR`] enumeration, the [`Length`] of an
//! element body, the [`TransferSyntax`] attribute triple, and the
//! [`value`] module holding [`PrimitiveValue`].
//!
//! This crate has no knowledge of how bytes are read or written; it is
//! the vocabulary that [`rdcm-encoding`], [`rdcm-parser`] and
//! [`rdcm-object`] build upon.

pub mod error;
pub mod header;
pub mod tag;
pub mod transfer_syntax;
pub mod value;
pub mod vr;

pub use error::{Error, Result};
pub use header::{DataElement, DataElementHeader, HasLength, Header};
pub use tag::Tag;
pub use transfer_syntax::{ByteOrder, Codec, PixelEncoding, TransferSyntax, VrMethod};
pub use value::{PrimitiveValue, Value};
pub use vr::VR;

/// Length of a data element's value, in bytes.
///
/// A value of [`Length::UNDEFINED`] marks a length that is only known
/// once the corresponding delimiter is reached (sequences and
/// encapsulated pixel data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Length(pub u32);

impl Length {
    /// The sentinel value `0xFFFF_FFFF` marking an undefined length.
    pub const UNDEFINED: Length = Length(0xFFFF_FFFF);

    /// Whether this length is the undefined-length sentinel.
    #[inline]
    pub fn is_undefined(self) -> bool {
        self.0 == Self::UNDEFINED.0
    }

    /// Whether this length is defined (i.e. not [`Length::UNDEFINED`]).
    #[inline]
    pub fn is_defined(self) -> bool {
        !self.is_undefined()
    }

    /// Whether a defined length is even, as required of every
    /// serialized element body. Undefined lengths are vacuously even.
    #[inline]
    pub fn is_even(self) -> bool {
        self.is_undefined() || self.0 % 2 == 0
    }

    /// The length as a `usize`, when defined.
    #[inline]
    pub fn get(self) -> Option<usize> {
        self.is_defined().then_some(self.0 as usize)
    }
}

impl From<u32> for Length {
    fn from(v: u32) -> Self {
        Length(v)
    }
}

impl std::fmt::Display for Length {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_undefined() {
            write!(f, "UNDEFINED")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
