//! Errors produced while encoding or decoding a primitive value body.

use rdcm_core::value::ValueType;
use rdcm_core::VR;
use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("{vr} does not hold a primitive value"))]
    NotAPrimitive { vr: VR },
    #[snafu(display("cannot encode a {got:?} value under VR {vr}"))]
    VrValueMismatch { vr: VR, got: ValueType },
}

impl Error {
    /// A stable numeric identifier for this error variant, for callers
    /// that need to report failures without matching on the enum
    /// (DIMSE status codes, metrics labels).
    pub fn code(&self) -> u32 {
        match self {
            Error::NotAPrimitive { .. } => 1910,
            Error::VrValueMismatch { .. } => 1911,
        }
    }
}
