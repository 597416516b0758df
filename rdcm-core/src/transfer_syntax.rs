//! The [`TransferSyntax`] attribute triple: byte order, VR encoding
//! method and pixel data encoding, plus the UID that names it.
//!
//! This crate only describes a transfer syntax's *properties*. Their
//! concrete table of supported UIDs, and the codec/adapter machinery
//! built on top of these properties, live in the registry and encoding
//! crates respectively.

use std::fmt;

/// Byte order used to encode multi-byte binary values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

/// How value representations are recorded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VrMethod {
    /// The VR is implied by the dictionary; the header carries only a
    /// 32-bit length field.
    Implicit,
    /// The VR is written explicitly; the length field's width then
    /// depends on the VR (see [`crate::vr::VR::has_32_bit_length`]).
    Explicit,
}

/// How pixel data is encoded within the data set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelEncoding {
    /// Pixel Data is a single primitive value in the transfer syntax's
    /// native byte order.
    Native,
    /// Pixel Data is an encapsulated pixel sequence: a Basic Offset
    /// Table item followed by one fragment item per (compressed)
    /// frame, or more for fragmented frames.
    Encapsulated,
}

/// What, if anything, this transfer syntax additionally requires of
/// the byte stream once the data set's element structure is already
/// known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// No further transformation; elements are read and written as-is.
    None,
    /// The data set is deflate-compressed after the file meta group.
    Deflated,
    /// Pixel fragments must be encoded/decoded by a codec not provided
    /// by this toolkit (e.g. JPEG, JPEG 2000, RLE). The registry marks
    /// such transfer syntaxes as known but unsupported for pixel
    /// access; dataset structure can still be parsed.
    Unsupported,
}

/// The combination of properties that determines how a data set's
/// bytes must be interpreted, keyed by its transfer syntax UID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSyntax {
    /// The transfer syntax UID, e.g. `"1.2.840.10008.1.2.1"`.
    pub uid: &'static str,
    /// A short human-readable name, for diagnostics and dumps.
    pub name: &'static str,
    pub byte_order: ByteOrder,
    pub vr_method: VrMethod,
    pub pixel_encoding: PixelEncoding,
    pub codec: Codec,
}

impl TransferSyntax {
    /// Whether this transfer syntax's pixel data can be accessed by
    /// this toolkit without an external codec.
    pub fn is_fully_supported(&self) -> bool {
        !matches!(self.codec, Codec::Unsupported)
    }

    /// The UID with any trailing NUL padding trimmed, as it would be
    /// compared against a wire value.
    pub fn trim_uid(uid: &str) -> &str {
        uid.trim_end_matches(['\0', ' '])
    }
}

impl fmt::Display for TransferSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPLICIT_VR_LE: TransferSyntax = TransferSyntax {
        uid: "1.2.840.10008.1.2.1",
        name: "Explicit VR Little Endian",
        byte_order: ByteOrder::LittleEndian,
        vr_method: VrMethod::Explicit,
        pixel_encoding: PixelEncoding::Native,
        codec: Codec::None,
    };

    #[test]
    fn trims_padded_uid() {
        assert_eq!(
            TransferSyntax::trim_uid("1.2.840.10008.1.2.1\0"),
            "1.2.840.10008.1.2.1"
        );
    }

    #[test]
    fn supported_by_default() {
        assert!(EXPLICIT_VR_LE.is_fully_supported());
    }
}
