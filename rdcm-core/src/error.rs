//! Errors raised while constructing or casting core DICOM values.

use crate::tag::Tag;
use crate::value::ValueType;
use snafu::Snafu;

/// Type alias for a result from this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by the core value and header types, independent of
/// any particular byte encoding.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    /// obtained data element tag {tag} did not match the expected tag
    #[snafu(display("unexpected tag {tag} in current reading position"))]
    UnexpectedTag { tag: Tag },

    /// the length recorded for the element's value is inconsistent
    /// with the number of bytes actually available
    UnexpectedDataValueLength,

    /// attempted to cast a value to an incompatible representation
    #[snafu(display("cannot cast value of type {got:?} as {requested}"))]
    CastValue {
        /// the representation that was requested
        requested: &'static str,
        /// the value's actual representation
        got: ValueType,
    },
}

impl Error {
    /// A stable numeric identifier for this error variant. Part of the
    /// 1900s (internal/core) family; higher layers define their own
    /// families starting at 1000.
    pub fn code(&self) -> u32 {
        match self {
            Error::UnexpectedTag { .. } => 1901,
            Error::UnexpectedDataValueLength => 1902,
            Error::CastValue { .. } => 1903,
        }
    }
}
