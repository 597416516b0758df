//! Accepted abstract and transfer syntaxes for the storage service.

use rdcm_dictionary_std::uids;

/// Abstract syntaxes this acceptor negotiates: Verification (for
/// C-ECHO) plus every storage SOP class this toolkit's dictionary
/// knows, whether the instance arrives from a plain C-STORE SCU or as
/// a sub-operation of someone else's C-MOVE.
pub static ABSTRACT_SYNTAXES: &[&str] = &[
    uids::VERIFICATION,
    uids::CT_IMAGE_STORAGE,
    uids::MR_IMAGE_STORAGE,
    uids::SECONDARY_CAPTURE_IMAGE_STORAGE,
    uids::ULTRASOUND_IMAGE_STORAGE,
];

/// The two transfer syntaxes every DICOM implementation is required to
/// support, offered regardless of `--uncompressed-only`.
pub static NATIVE_TRANSFER_SYNTAXES: &[&str] =
    &[uids::IMPLICIT_VR_LITTLE_ENDIAN, uids::EXPLICIT_VR_LITTLE_ENDIAN];
