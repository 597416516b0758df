//! The File Meta Information group (0002,xxxx): always Explicit VR
//! Little Endian regardless of the main data set's transfer syntax
//! (spec §4.4), read and written as a flat run of elements ahead of
//! the dataset proper.

use std::io::{Read, Seek, Write};

use rdcm_core::{Tag, VR};
use rdcm_parser::stateful::{StatefulDecoder, StatefulEncoder};
use rdcm_parser::stream::ByteStream;

use crate::error::{MissingMetaElementSnafu, Result, UnknownTransferSyntaxSnafu};

const GROUP_LENGTH: Tag = Tag(0x0002, 0x0000);
const INFO_VERSION: Tag = Tag(0x0002, 0x0001);
const MEDIA_STORAGE_SOP_CLASS_UID: Tag = Tag(0x0002, 0x0002);
const MEDIA_STORAGE_SOP_INSTANCE_UID: Tag = Tag(0x0002, 0x0003);
const TRANSFER_SYNTAX_UID: Tag = Tag(0x0002, 0x0010);
const IMPLEMENTATION_CLASS_UID: Tag = Tag(0x0002, 0x0012);
const IMPLEMENTATION_VERSION_NAME: Tag = Tag(0x0002, 0x0013);
const SOURCE_APPLICATION_ENTITY_TITLE: Tag = Tag(0x0002, 0x0016);

/// This toolkit's own Implementation Class UID, written into every
/// file meta group it produces.
pub const IMPLEMENTATION_CLASS_UID_ROOT: &str = "1.2.826.0.1.3680043.10.1337";
pub const IMPLEMENTATION_VERSION_NAME_STR: &str = "RDCM_001";

/// The parsed File Meta Information group (0002,xxxx).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetaTable {
    pub information_version: Vec<u8>,
    pub media_storage_sop_class_uid: String,
    pub media_storage_sop_instance_uid: String,
    pub transfer_syntax_uid: String,
    pub implementation_class_uid: String,
    pub implementation_version_name: Option<String>,
    pub source_application_entity_title: Option<String>,
}

fn explicit_vr_le() -> rdcm_core::TransferSyntax {
    rdcm_transfer_syntax_registry::get(rdcm_dictionary_std::uids::EXPLICIT_VR_LITTLE_ENDIAN)
        .expect("Explicit VR Little Endian is always registered")
}

impl FileMetaTable {
    /// Read the file meta group starting at the stream's current
    /// position (immediately after the preamble and `DICM` magic, or
    /// at offset 0 for a headerless stream).
    pub fn read_from<R: Read + Seek>(stream: &mut ByteStream<R>) -> Result<Self> {
        let ts = explicit_vr_le();
        let mut dec = StatefulDecoder::new(stream, ts);

        let group_length_header = dec.decode_header()?;
        let group_length = if group_length_header.tag == GROUP_LENGTH {
            dec.decode_value(&group_length_header)?
                .to_int::<u32>()
                .unwrap_or(0)
        } else {
            return MissingMetaElementSnafu { tag: GROUP_LENGTH }.fail();
        };
        let end = dec.position() + group_length as u64;

        let mut information_version = Vec::new();
        let mut media_storage_sop_class_uid = None;
        let mut media_storage_sop_instance_uid = None;
        let mut transfer_syntax_uid = None;
        let mut implementation_class_uid = None;
        let mut implementation_version_name = None;
        let mut source_application_entity_title = None;

        while dec.position() < end {
            let header = dec.decode_header()?;
            if header.vr == VR::OB {
                let len = header.len.get().unwrap_or(0);
                let bytes = dec.read_bytes(len)?;
                if header.tag == INFO_VERSION {
                    information_version = bytes;
                }
                continue;
            }
            let value = dec.decode_value(&header)?;
            let text = value.to_str().map(|s| s.trim_end().to_string());
            match header.tag {
                t if t == MEDIA_STORAGE_SOP_CLASS_UID => media_storage_sop_class_uid = text.ok(),
                t if t == MEDIA_STORAGE_SOP_INSTANCE_UID => {
                    media_storage_sop_instance_uid = text.ok()
                }
                t if t == TRANSFER_SYNTAX_UID => transfer_syntax_uid = text.ok(),
                t if t == IMPLEMENTATION_CLASS_UID => implementation_class_uid = text.ok(),
                t if t == IMPLEMENTATION_VERSION_NAME => implementation_version_name = text.ok(),
                t if t == SOURCE_APPLICATION_ENTITY_TITLE => {
                    source_application_entity_title = text.ok()
                }
                _ => {}
            }
        }

        Ok(FileMetaTable {
            information_version,
            media_storage_sop_class_uid: media_storage_sop_class_uid.ok_or(
                crate::error::Error::MissingMetaElement {
                    tag: MEDIA_STORAGE_SOP_CLASS_UID,
                },
            )?,
            media_storage_sop_instance_uid: media_storage_sop_instance_uid.ok_or(
                crate::error::Error::MissingMetaElement {
                    tag: MEDIA_STORAGE_SOP_INSTANCE_UID,
                },
            )?,
            transfer_syntax_uid: transfer_syntax_uid.ok_or(crate::error::Error::MissingMetaElement {
                tag: TRANSFER_SYNTAX_UID,
            })?,
            implementation_class_uid: implementation_class_uid.unwrap_or_default(),
            implementation_version_name,
            source_application_entity_title,
        })
    }

    /// Resolve this table's named transfer syntax against the
    /// registry, failing if it names one this toolkit does not
    /// recognize at all.
    pub fn resolve_transfer_syntax(&self) -> Result<rdcm_core::TransferSyntax> {
        rdcm_transfer_syntax_registry::get(&self.transfer_syntax_uid).ok_or_else(|| {
            UnknownTransferSyntaxSnafu {
                uid: self.transfer_syntax_uid.clone(),
            }
            .build()
        })
    }

    /// Build a fresh table for a new object, naming `sop_class_uid`
    /// and `sop_instance_uid` and the transfer syntax it will be
    /// written with.
    pub fn new(sop_class_uid: String, sop_instance_uid: String, transfer_syntax_uid: String) -> Self {
        FileMetaTable {
            information_version: vec![0, 1],
            media_storage_sop_class_uid: sop_class_uid,
            media_storage_sop_instance_uid: sop_instance_uid,
            transfer_syntax_uid,
            implementation_class_uid: IMPLEMENTATION_CLASS_UID_ROOT.to_string(),
            implementation_version_name: Some(IMPLEMENTATION_VERSION_NAME_STR.to_string()),
            source_application_entity_title: None,
        }
    }

    /// Write this table out, preceded by the `DICM` magic and its own
    /// freshly computed group length.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        let mut body = Vec::new();
        {
            let ts = explicit_vr_le();
            let mut enc = StatefulEncoder::new(&mut body, ts);

            write_ui(&mut enc, INFO_VERSION, VR::OB, &self.information_version)?;
            write_str(&mut enc, MEDIA_STORAGE_SOP_CLASS_UID, VR::UI, &self.media_storage_sop_class_uid)?;
            write_str(
                &mut enc,
                MEDIA_STORAGE_SOP_INSTANCE_UID,
                VR::UI,
                &self.media_storage_sop_instance_uid,
            )?;
            write_str(&mut enc, TRANSFER_SYNTAX_UID, VR::UI, &self.transfer_syntax_uid)?;
            write_str(
                &mut enc,
                IMPLEMENTATION_CLASS_UID,
                VR::UI,
                &self.implementation_class_uid,
            )?;
            if let Some(name) = &self.implementation_version_name {
                write_str(&mut enc, IMPLEMENTATION_VERSION_NAME, VR::SH, name)?;
            }
            if let Some(aet) = &self.source_application_entity_title {
                write_str(&mut enc, SOURCE_APPLICATION_ENTITY_TITLE, VR::AE, aet)?;
            }
        }

        out.write_all(b"DICM")?;
        let ts = explicit_vr_le();
        let mut enc = StatefulEncoder::new(out, ts);
        let header = rdcm_core::DataElementHeader::new(GROUP_LENGTH, VR::UL, rdcm_core::Length(4));
        enc.encode_header(&header)?;
        enc.encode_value(VR::UL, &rdcm_core::PrimitiveValue::from(body.len() as u32))?;
        enc.write_raw(&body)?;
        Ok(())
    }
}

fn write_ui<W: Write>(enc: &mut StatefulEncoder<W>, tag: Tag, vr: VR, bytes: &[u8]) -> Result<()> {
    let mut padded = bytes.to_vec();
    if padded.len() % 2 != 0 {
        padded.push(vr.padding());
    }
    let header = rdcm_core::DataElementHeader::new(tag, vr, rdcm_core::Length(padded.len() as u32));
    enc.encode_header(&header)?;
    enc.write_raw(&padded)?;
    Ok(())
}

fn write_str<W: Write>(enc: &mut StatefulEncoder<W>, tag: Tag, vr: VR, s: &str) -> Result<()> {
    let header_len = s.len() + (s.len() % 2);
    let header = rdcm_core::DataElementHeader::new(tag, vr, rdcm_core::Length(header_len as u32));
    enc.encode_header(&header)?;
    enc.encode_value(vr, &rdcm_core::PrimitiveValue::from(s.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_through_write_and_read() {
        let table = FileMetaTable::new(
            "1.2.840.10008.5.1.4.1.1.7".to_string(),
            "1.2.3.4.5".to_string(),
            "1.2.840.10008.1.2.1".to_string(),
        );

        let mut buf = Vec::new();
        table.write_to(&mut buf).unwrap();

        // Skip the "DICM" magic this test writes directly (no preamble).
        let mut stream = ByteStream::new(Cursor::new(buf[4..].to_vec())).unwrap();
        let read_back = FileMetaTable::read_from(&mut stream).unwrap();

        assert_eq!(read_back.media_storage_sop_class_uid, table.media_storage_sop_class_uid);
        assert_eq!(
            read_back.media_storage_sop_instance_uid,
            table.media_storage_sop_instance_uid
        );
        assert_eq!(read_back.transfer_syntax_uid, table.transfer_syntax_uid);
        assert_eq!(read_back.implementation_class_uid, table.implementation_class_uid);
    }

    #[test]
    fn resolves_a_known_transfer_syntax() {
        let table = FileMetaTable::new(
            "1.2.840.10008.5.1.4.1.1.7".to_string(),
            "1.2.3".to_string(),
            "1.2.840.10008.1.2".to_string(),
        );
        let ts = table.resolve_transfer_syntax().unwrap();
        assert_eq!(ts.uid, "1.2.840.10008.1.2");
    }

    #[test]
    fn rejects_an_unknown_transfer_syntax() {
        let table = FileMetaTable::new(
            "1.2.840.10008.5.1.4.1.1.7".to_string(),
            "1.2.3".to_string(),
            "9.9.9.9".to_string(),
        );
        assert!(table.resolve_transfer_syntax().is_err());
    }
}
