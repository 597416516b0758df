//! The fixed table of transfer syntaxes this codec supports natively,
//! plus the compressed families it recognizes as valid but cannot
//! decode pixel data for (dataset structure, being length-delimited
//! and codec-independent, still parses fine for those).

use rdcm_core::{ByteOrder, Codec, PixelEncoding, TransferSyntax, VrMethod};

pub const IMPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax {
    uid: "1.2.840.10008.1.2",
    name: "Implicit VR Little Endian",
    byte_order: ByteOrder::LittleEndian,
    vr_method: VrMethod::Implicit,
    pixel_encoding: PixelEncoding::Native,
    codec: Codec::None,
};

pub const EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax {
    uid: "1.2.840.10008.1.2.1",
    name: "Explicit VR Little Endian",
    byte_order: ByteOrder::LittleEndian,
    vr_method: VrMethod::Explicit,
    pixel_encoding: PixelEncoding::Native,
    codec: Codec::None,
};

pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax {
    uid: "1.2.840.10008.1.2.1.99",
    name: "Deflated Explicit VR Little Endian",
    byte_order: ByteOrder::LittleEndian,
    vr_method: VrMethod::Explicit,
    pixel_encoding: PixelEncoding::Native,
    codec: Codec::Deflated,
};

pub const EXPLICIT_VR_BIG_ENDIAN: TransferSyntax = TransferSyntax {
    uid: "1.2.840.10008.1.2.2",
    name: "Explicit VR Big Endian",
    byte_order: ByteOrder::BigEndian,
    vr_method: VrMethod::Explicit,
    pixel_encoding: PixelEncoding::Native,
    codec: Codec::None,
};

pub const JPEG_BASELINE_8BIT: TransferSyntax = TransferSyntax {
    uid: "1.2.840.10008.1.2.4.50",
    name: "JPEG Baseline (Process 1)",
    byte_order: ByteOrder::LittleEndian,
    vr_method: VrMethod::Explicit,
    pixel_encoding: PixelEncoding::Encapsulated,
    codec: Codec::Unsupported,
};

pub const JPEG_2000_LOSSLESS: TransferSyntax = TransferSyntax {
    uid: "1.2.840.10008.1.2.4.90",
    name: "JPEG 2000 Image Compression (Lossless Only)",
    byte_order: ByteOrder::LittleEndian,
    vr_method: VrMethod::Explicit,
    pixel_encoding: PixelEncoding::Encapsulated,
    codec: Codec::Unsupported,
};

pub const RLE_LOSSLESS: TransferSyntax = TransferSyntax {
    uid: "1.2.840.10008.1.2.5",
    name: "RLE Lossless",
    byte_order: ByteOrder::LittleEndian,
    vr_method: VrMethod::Explicit,
    pixel_encoding: PixelEncoding::Encapsulated,
    codec: Codec::Unsupported,
};

pub const JPEG_LS_LOSSLESS: TransferSyntax = TransferSyntax {
    uid: "1.2.840.10008.1.2.4.80",
    name: "JPEG-LS Lossless Image Compression",
    byte_order: ByteOrder::LittleEndian,
    vr_method: VrMethod::Explicit,
    pixel_encoding: PixelEncoding::Encapsulated,
    codec: Codec::Unsupported,
};

pub const ALL: &[TransferSyntax] = &[
    IMPLICIT_VR_LITTLE_ENDIAN,
    EXPLICIT_VR_LITTLE_ENDIAN,
    DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN,
    EXPLICIT_VR_BIG_ENDIAN,
    JPEG_BASELINE_8BIT,
    JPEG_2000_LOSSLESS,
    JPEG_LS_LOSSLESS,
    RLE_LOSSLESS,
];
