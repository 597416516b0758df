//! The trimmed attribute table backing [`crate::entry_by_tag`] and
//! [`crate::entry_by_alias`].
//!
//! Grounded on the shape of the teacher's generated attribute table
//! (`dictionary-std/src/tags.rs`'s `ENTRIES` array of `(Tag, Tag,
//! &str, VR, VM, &str)` tuples), reduced here to the attributes
//! exercised by the dataset codec, the file meta table and the DIMSE
//! identifier data sets this toolkit builds.

use crate::DictionaryEntry;
use rdcm_core::{Tag, VR};

pub static ENTRIES: &[DictionaryEntry] = &[
    // File Meta group
    DictionaryEntry { tag: Tag(0x0002, 0x0000), alias: "FileMetaInformationGroupLength", vr: VR::UL },
    DictionaryEntry { tag: Tag(0x0002, 0x0001), alias: "FileMetaInformationVersion", vr: VR::OB },
    DictionaryEntry { tag: Tag(0x0002, 0x0002), alias: "MediaStorageSOPClassUID", vr: VR::UI },
    DictionaryEntry { tag: Tag(0x0002, 0x0003), alias: "MediaStorageSOPInstanceUID", vr: VR::UI },
    DictionaryEntry { tag: Tag(0x0002, 0x0010), alias: "TransferSyntaxUID", vr: VR::UI },
    DictionaryEntry { tag: Tag(0x0002, 0x0012), alias: "ImplementationClassUID", vr: VR::UI },
    DictionaryEntry { tag: Tag(0x0002, 0x0013), alias: "ImplementationVersionName", vr: VR::SH },
    DictionaryEntry { tag: Tag(0x0002, 0x0016), alias: "SourceApplicationEntityTitle", vr: VR::AE },
    // Identification
    DictionaryEntry { tag: Tag(0x0008, 0x0016), alias: "SOPClassUID", vr: VR::UI },
    DictionaryEntry { tag: Tag(0x0008, 0x0018), alias: "SOPInstanceUID", vr: VR::UI },
    DictionaryEntry { tag: Tag(0x0008, 0x0020), alias: "StudyDate", vr: VR::DA },
    DictionaryEntry { tag: Tag(0x0008, 0x0030), alias: "StudyTime", vr: VR::TM },
    DictionaryEntry { tag: Tag(0x0008, 0x0050), alias: "AccessionNumber", vr: VR::SH },
    DictionaryEntry { tag: Tag(0x0008, 0x0052), alias: "QueryRetrieveLevel", vr: VR::CS },
    DictionaryEntry { tag: Tag(0x0008, 0x0060), alias: "Modality", vr: VR::CS },
    DictionaryEntry { tag: Tag(0x0008, 0x0090), alias: "ReferringPhysicianName", vr: VR::PN },
    DictionaryEntry { tag: Tag(0x0008, 0x1030), alias: "StudyDescription", vr: VR::LO },
    DictionaryEntry { tag: Tag(0x0008, 0x103E), alias: "SeriesDescription", vr: VR::LO },
    // Patient
    DictionaryEntry { tag: Tag(0x0010, 0x0010), alias: "PatientName", vr: VR::PN },
    DictionaryEntry { tag: Tag(0x0010, 0x0020), alias: "PatientID", vr: VR::LO },
    DictionaryEntry { tag: Tag(0x0010, 0x0030), alias: "PatientBirthDate", vr: VR::DA },
    DictionaryEntry { tag: Tag(0x0010, 0x0040), alias: "PatientSex", vr: VR::CS },
    // Study/Series/Image identifiers
    DictionaryEntry { tag: Tag(0x0020, 0x000D), alias: "StudyInstanceUID", vr: VR::UI },
    DictionaryEntry { tag: Tag(0x0020, 0x000E), alias: "SeriesInstanceUID", vr: VR::UI },
    DictionaryEntry { tag: Tag(0x0020, 0x0010), alias: "StudyID", vr: VR::SH },
    DictionaryEntry { tag: Tag(0x0020, 0x0011), alias: "SeriesNumber", vr: VR::IS },
    DictionaryEntry { tag: Tag(0x0020, 0x0013), alias: "InstanceNumber", vr: VR::IS },
    // Pixel data description
    DictionaryEntry { tag: Tag(0x0028, 0x0002), alias: "SamplesPerPixel", vr: VR::US },
    DictionaryEntry { tag: Tag(0x0028, 0x0004), alias: "PhotometricInterpretation", vr: VR::CS },
    DictionaryEntry { tag: Tag(0x0028, 0x0006), alias: "PlanarConfiguration", vr: VR::US },
    DictionaryEntry { tag: Tag(0x0028, 0x0008), alias: "NumberOfFrames", vr: VR::IS },
    DictionaryEntry { tag: Tag(0x0028, 0x0010), alias: "Rows", vr: VR::US },
    DictionaryEntry { tag: Tag(0x0028, 0x0011), alias: "Columns", vr: VR::US },
    DictionaryEntry { tag: Tag(0x0028, 0x0100), alias: "BitsAllocated", vr: VR::US },
    DictionaryEntry { tag: Tag(0x0028, 0x0101), alias: "BitsStored", vr: VR::US },
    DictionaryEntry { tag: Tag(0x0028, 0x0103), alias: "PixelRepresentation", vr: VR::US },
    DictionaryEntry { tag: Tag(0x7FE0, 0x0010), alias: "PixelData", vr: VR::OW },
    // DIMSE command set (0000,xxxx), decoded under implicit VR LE
    DictionaryEntry { tag: Tag(0x0000, 0x0000), alias: "CommandGroupLength", vr: VR::UL },
    DictionaryEntry { tag: Tag(0x0000, 0x0002), alias: "AffectedSOPClassUID", vr: VR::UI },
    DictionaryEntry { tag: Tag(0x0000, 0x0003), alias: "RequestedSOPClassUID", vr: VR::UI },
    DictionaryEntry { tag: Tag(0x0000, 0x0100), alias: "CommandField", vr: VR::US },
    DictionaryEntry { tag: Tag(0x0000, 0x0110), alias: "MessageID", vr: VR::US },
    DictionaryEntry { tag: Tag(0x0000, 0x0120), alias: "MessageIDBeingRespondedTo", vr: VR::US },
    DictionaryEntry { tag: Tag(0x0000, 0x0600), alias: "MoveDestination", vr: VR::AE },
    DictionaryEntry { tag: Tag(0x0000, 0x0700), alias: "Priority", vr: VR::US },
    DictionaryEntry { tag: Tag(0x0000, 0x0800), alias: "CommandDataSetType", vr: VR::US },
    DictionaryEntry { tag: Tag(0x0000, 0x0900), alias: "Status", vr: VR::US },
    DictionaryEntry { tag: Tag(0x0000, 0x1000), alias: "AffectedSOPInstanceUID", vr: VR::UI },
    DictionaryEntry { tag: Tag(0x0000, 0x1001), alias: "RequestedSOPInstanceUID", vr: VR::UI },
    DictionaryEntry { tag: Tag(0x0000, 0x1005), alias: "AttributeIdentifierList", vr: VR::AT },
    DictionaryEntry { tag: Tag(0x0000, 0x1020), alias: "NumberOfRemainingSuboperations", vr: VR::US },
    DictionaryEntry { tag: Tag(0x0000, 0x1021), alias: "NumberOfCompletedSuboperations", vr: VR::US },
    DictionaryEntry { tag: Tag(0x0000, 0x1022), alias: "NumberOfFailedSuboperations", vr: VR::US },
    DictionaryEntry { tag: Tag(0x0000, 0x1023), alias: "NumberOfWarningSuboperations", vr: VR::US },
];
