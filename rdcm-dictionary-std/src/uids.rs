//! Well-known UID constants, trimmed to the transfer syntaxes and SOP
//! classes this toolkit's codec and DIMSE services name directly.
//!
//! Grounded on `dictionary-std/src/uids.rs`'s generated constant list
//! (values copied verbatim — UIDs are standard numbers, not authored
//! text), reduced to the subset this crate actually uses.

/// SOP Class: Verification SOP Class.
pub const VERIFICATION: &str = "1.2.840.10008.1.1";

/// Transfer Syntax: Implicit VR Little Endian.
pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";
/// Transfer Syntax: Explicit VR Little Endian.
pub const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";
/// Transfer Syntax: Deflated Explicit VR Little Endian.
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1.99";
/// Transfer Syntax: Explicit VR Big Endian (retired).
pub const EXPLICIT_VR_BIG_ENDIAN: &str = "1.2.840.10008.1.2.2";
/// Transfer Syntax: JPEG Baseline (Process 1).
pub const JPEG_BASELINE_8BIT: &str = "1.2.840.10008.1.2.4.50";
/// Transfer Syntax: JPEG 2000 Image Compression (Lossless Only).
pub const JPEG_2000_LOSSLESS: &str = "1.2.840.10008.1.2.4.90";
/// Transfer Syntax: JPEG-LS Lossless Image Compression.
pub const JPEG_LS_LOSSLESS: &str = "1.2.840.10008.1.2.4.80";
/// Transfer Syntax: RLE Lossless.
pub const RLE_LOSSLESS: &str = "1.2.840.10008.1.2.5";

/// SOP Class: CT Image Storage.
pub const CT_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.2";
/// SOP Class: MR Image Storage.
pub const MR_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.4";
/// SOP Class: Secondary Capture Image Storage.
pub const SECONDARY_CAPTURE_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.7";
/// SOP Class: Ultrasound Image Storage.
pub const ULTRASOUND_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.6.1";

/// SOP Class: Patient Root Query/Retrieve Information Model - FIND.
pub const PATIENT_ROOT_QR_FIND: &str = "1.2.840.10008.5.1.4.1.2.1.1";
/// SOP Class: Patient Root Query/Retrieve Information Model - MOVE.
pub const PATIENT_ROOT_QR_MOVE: &str = "1.2.840.10008.5.1.4.1.2.1.2";
/// SOP Class: Patient Root Query/Retrieve Information Model - GET.
pub const PATIENT_ROOT_QR_GET: &str = "1.2.840.10008.5.1.4.1.2.1.3";
/// SOP Class: Study Root Query/Retrieve Information Model - FIND.
pub const STUDY_ROOT_QR_FIND: &str = "1.2.840.10008.5.1.4.1.2.2.1";
/// SOP Class: Study Root Query/Retrieve Information Model - MOVE.
pub const STUDY_ROOT_QR_MOVE: &str = "1.2.840.10008.5.1.4.1.2.2.2";
/// SOP Class: Study Root Query/Retrieve Information Model - GET.
pub const STUDY_ROOT_QR_GET: &str = "1.2.840.10008.5.1.4.1.2.2.3";

/// The transfer syntax mandatory on every DICOM implementation,
/// used when no explicit negotiation has happened.
pub const DEFAULT_TRANSFER_SYNTAX: &str = IMPLICIT_VR_LITTLE_ENDIAN;

/// Every Query/Retrieve FIND SOP class known to this dictionary.
pub const QR_FIND_SOP_CLASSES: &[&str] = &[PATIENT_ROOT_QR_FIND, STUDY_ROOT_QR_FIND];
/// Every Query/Retrieve GET SOP class known to this dictionary.
pub const QR_GET_SOP_CLASSES: &[&str] = &[PATIENT_ROOT_QR_GET, STUDY_ROOT_QR_GET];
/// Every Query/Retrieve MOVE SOP class known to this dictionary.
pub const QR_MOVE_SOP_CLASSES: &[&str] = &[PATIENT_ROOT_QR_MOVE, STUDY_ROOT_QR_MOVE];
