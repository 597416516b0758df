//! Errors raised while opening, parsing or writing a [`crate::DicomFile`]
//! or [`crate::InMemDicomObject`].

use rdcm_core::Tag;
use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    #[snafu(context(false))]
    #[snafu(display("I/O error: {source}"))]
    Io { source: std::io::Error },

    #[snafu(display("not a DICOM file: no preamble/magic and no readable File Meta group"))]
    NotDicom,

    #[snafu(display("missing required file meta element {tag}"))]
    MissingMetaElement { tag: Tag },

    #[snafu(display("transfer syntax {uid} named in file meta is not recognized"))]
    UnknownTransferSyntax { uid: String },

    #[snafu(display("{source}"))]
    Parser { source: rdcm_parser::Error },

    #[snafu(display("{source}"))]
    Encoding { source: rdcm_encoding::Error },

    #[snafu(display("attribute {tag} not found in data set"))]
    NoSuchAttribute { tag: Tag },

    #[snafu(display("corrupt sequence/item structure: {reason}"))]
    CorruptedSequence { reason: String },

    #[snafu(display("{source}"))]
    Deflate { source: std::io::Error },

    #[snafu(display("frame index {index} out of range ({count} frames)"))]
    FrameIndexOutOfRange { index: usize, count: usize },
}

impl From<rdcm_parser::Error> for Error {
    fn from(source: rdcm_parser::Error) -> Self {
        Error::Parser { source }
    }
}

impl From<rdcm_encoding::Error> for Error {
    fn from(source: rdcm_encoding::Error) -> Self {
        Error::Encoding { source }
    }
}

impl Error {
    /// A stable numeric identifier for this error variant. File/object
    /// parse failures are protocol-layer (1100s), matching
    /// `rdcm-parser`'s own family, since they are the same taxonomy
    /// tier one level up.
    pub fn code(&self) -> u32 {
        match self {
            Error::Io { .. } => 1100,
            Error::NotDicom => 1110,
            Error::MissingMetaElement { .. } => 1111,
            Error::UnknownTransferSyntax { .. } => 1112,
            Error::Parser { source } => source.code(),
            Error::Encoding { source } => source.code(),
            Error::NoSuchAttribute { .. } => 1113,
            Error::Deflate { .. } => 1114,
            Error::CorruptedSequence { .. } => 1115,
            Error::FrameIndexOutOfRange { .. } => 1304,
        }
    }
}
