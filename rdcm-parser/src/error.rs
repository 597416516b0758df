//! Errors raised by the byte stream, element codec, dataset codec and
//! frame index.

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

    #[snafu(display("unexpected end of data: needed {needed} bytes, {available} available"))]
    Truncated { needed: u64, available: u64 },

    #[snafu(display("transfer syntax {uid} is not recognized"))]
    UnknownTransferSyntax { uid: String },

    #[snafu(display("invalid VR code on the wire at {tag}"))]
    InvalidVr { tag: Tag },

    #[snafu(display("unexpected tag {tag} in current reading position"))]
    UnexpectedTag { tag: Tag },

    #[snafu(display("data set is corrupted: {reason}"))]
    Corrupted { reason: String },

    #[snafu(display("(7FE0,0010) Pixel Data is not present"))]
    NoPixelData,

    #[snafu(display("no frames could be located in the pixel sequence"))]
    NoFramesFound,

    #[snafu(display("missing tags required to index native pixel data: {tags:?}"))]
    MissingRequiredTags { tags: Vec<&'static str> },

    #[snafu(display(
        "native pixel data length mismatch: expected {expected} bytes, found {actual}"
    ))]
    FrameSizeMismatch { expected: u64, actual: u64 },

    #[snafu(display("{source}"))]
    Core { source: rdcm_core::Error },

    #[snafu(display("{source}"))]
    Encoding { source: rdcm_encoding::Error },
}

impl From<rdcm_core::Error> for Error {
    fn from(source: rdcm_core::Error) -> Self {
        Error::Core { source }
    }
}

impl From<rdcm_encoding::Error> for Error {
    fn from(source: rdcm_encoding::Error) -> Self {
        Error::Encoding { source }
    }
}

impl Error {
    /// A stable numeric identifier for this error variant. Byte
    /// stream and codec failures are protocol-layer (1100s); frame
    /// index failures are data-transfer-layer (1300s), since they
    /// surface while extracting pixel frames for transfer.
    pub fn code(&self) -> u32 {
        match self {
            Error::Io { .. } => 1100,
            Error::Truncated { .. } => 1101,
            Error::UnknownTransferSyntax { .. } => 1102,
            Error::InvalidVr { .. } => 1103,
            Error::UnexpectedTag { .. } => 1104,
            Error::Corrupted { .. } => 1105,
            Error::NoPixelData => 1300,
            Error::MissingRequiredTags { .. } => 1301,
            Error::FrameSizeMismatch { .. } => 1302,
            Error::NoFramesFound => 1303,
            Error::Core { source } => source.code(),
            Error::Encoding { source } => source.code(),
        }
    }
}
