//! A standard DICOM attribute and UID dictionary, trimmed to the
//! attributes and UIDs the `rdcm` toolkit's codec and DIMSE services
//! actually need to name.
//!
//! This is not a full PS3.6 dictionary: callers decoding an arbitrary
//! attribute not listed here still get its raw tag and VR (when
//! explicit), they just don't get a friendly name or a VR inferred
//! under implicit VR little endian.

mod entries;
pub mod sop_class;
pub mod uids;

use rdcm_core::{Tag, VR};

/// A dictionary entry: everything this crate knows about an attribute
/// beyond its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub tag: Tag,
    pub alias: &'static str,
    pub vr: VR,
}

/// Look up a well-known attribute by tag.
pub fn entry_by_tag(tag: Tag) -> Option<&'static DictionaryEntry> {
    entries::ENTRIES.iter().find(|e| e.tag == tag)
}

/// Look up a well-known attribute by its keyword (e.g. `"PatientName"`).
pub fn entry_by_alias(alias: &str) -> Option<&'static DictionaryEntry> {
    entries::ENTRIES.iter().find(|e| e.alias == alias)
}

/// The VR this crate knows an attribute to have, used to decode
/// elements under implicit VR little endian. Elements not present in
/// this trimmed dictionary default to [`VR::UN`].
pub fn vr_for(tag: Tag) -> VR {
    entry_by_tag(tag).map(|e| e.vr).unwrap_or(VR::UN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_patient_name() {
        let e = entry_by_alias("PatientName").unwrap();
        assert_eq!(e.tag, Tag(0x0010, 0x0010));
        assert_eq!(e.vr, VR::PN);
    }

    #[test]
    fn unknown_tag_defaults_to_un() {
        assert_eq!(vr_for(Tag(0x0009, 0x0001)), VR::UN);
    }
}
