//! [`InMemDicomObject`]: an ordered, mutable tree of data elements held
//! entirely in memory, built by draining a [`rdcm_parser::dataset::DataSetReader`]
//! token stream and written back out the same way.

use std::collections::BTreeMap;
use std::io::{Read, Seek, Write};

use rdcm_core::{
    DataElement, DataElementHeader, HasLength, Header, Length, PrimitiveValue, Tag, TransferSyntax, Value, VR,
};
use rdcm_parser::dataset::{DataSetReader, DataSetWriter, DataToken, ReadOptions};
use rdcm_parser::stream::ByteStream;

use crate::error::{CorruptedSequenceSnafu, NoSuchAttributeSnafu, Result};

/// An in-memory DICOM data set: an ordered `Tag -> DataElement` map,
/// where a sequence element's nested items are themselves
/// [`InMemDicomObject`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct InMemDicomObject {
    entries: BTreeMap<Tag, DataElement<InMemDicomObject>>,
    ts: TransferSyntax,
    /// Set when a length read while parsing this object would have
    /// overrun the remaining stream; parsing stopped at that element
    /// rather than failing outright, and whatever was already read is
    /// preserved here (spec's corruption-tolerance rule).
    corrupted: bool,
}

impl InMemDicomObject {
    /// An empty data set under the given transfer syntax, for building
    /// an object from scratch.
    pub fn new_empty(ts: TransferSyntax) -> Self {
        InMemDicomObject {
            entries: BTreeMap::new(),
            ts,
            corrupted: false,
        }
    }

    pub fn transfer_syntax(&self) -> TransferSyntax {
        self.ts
    }

    pub fn is_corrupted(&self) -> bool {
        self.corrupted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataElement<InMemDicomObject>> {
        self.entries.values()
    }

    /// Look up an element by tag.
    pub fn get(&self, tag: Tag) -> Option<&DataElement<InMemDicomObject>> {
        self.entries.get(&tag)
    }

    /// Look up an element by its standard dictionary keyword, e.g.
    /// `"PatientName"`.
    pub fn element_by_name(&self, alias: &str) -> Result<&DataElement<InMemDicomObject>> {
        let tag = rdcm_dictionary_std::entry_by_alias(alias)
            .map(|e| e.tag)
            .ok_or(crate::error::Error::NoSuchAttribute { tag: Tag(0, 0) })?;
        self.get(tag)
            .ok_or_else(|| NoSuchAttributeSnafu { tag }.build())
    }

    pub fn element(&self, tag: Tag) -> Result<&DataElement<InMemDicomObject>> {
        self.get(tag).ok_or_else(|| NoSuchAttributeSnafu { tag }.build())
    }

    pub fn remove(&mut self, tag: Tag) -> Option<DataElement<InMemDicomObject>> {
        self.entries.remove(&tag)
    }

    /// Insert a primitive-valued element, replacing any prior element
    /// of the same tag and recomputing the header's length from the
    /// value.
    pub fn put_primitive(&mut self, tag: Tag, vr: VR, value: PrimitiveValue) {
        let header = DataElementHeader::new(tag, vr, Length(0));
        let el = DataElement::new(header, Value::Primitive(value)).with_recomputed_length();
        self.entries.insert(tag, el);
    }

    /// Insert a string-valued element under the given VR.
    pub fn put_str(&mut self, tag: Tag, vr: VR, value: impl Into<String>) {
        self.put_primitive(tag, vr, PrimitiveValue::from(value.into()));
    }

    /// Insert a sequence element with already-built nested items.
    pub fn put_sequence(&mut self, tag: Tag, items: Vec<InMemDicomObject>) {
        let value: Value<InMemDicomObject> = Value::Sequence {
            items,
            size: Length::UNDEFINED,
        };
        let header = DataElementHeader::new(tag, VR::SQ, value.length());
        self.entries.insert(tag, DataElement::new(header, value));
    }

    /// Insert an encapsulated Pixel Data element from raw fragments
    /// and an already-computed Basic Offset Table.
    pub fn put_pixel_sequence(&mut self, fragments: Vec<Vec<u8>>, offset_table: Vec<u32>) {
        let value: Value<InMemDicomObject> = Value::PixelSequence {
            fragments,
            offset_table,
        };
        let header = DataElementHeader::new(Tag::PIXEL_DATA, VR::OB, value.length());
        self.entries.insert(Tag::PIXEL_DATA, DataElement::new(header, value));
    }

    fn get_primitive(&self, tag: Tag) -> Option<&PrimitiveValue> {
        self.get(tag).and_then(|e| e.value().primitive())
    }

    pub(crate) fn get_u16(&self, tag: Tag) -> Option<u16> {
        self.get_primitive(tag).and_then(|v| v.to_int::<u16>().ok())
    }

    pub(crate) fn get_u32(&self, tag: Tag) -> Option<u32> {
        self.get_primitive(tag).and_then(|v| v.to_int::<u32>().ok())
    }

    /// Build an object by draining a dataset token stream under the
    /// given transfer syntax. Stops early (flagging [`Self::is_corrupted`])
    /// if a length overruns the remaining stream, rather than failing.
    pub fn build_object<R: Read + Seek>(
        stream: &mut ByteStream<R>,
        ts: TransferSyntax,
        options: ReadOptions,
    ) -> Result<Self> {
        let mut reader = DataSetReader::new(stream, ts, options);
        Self::build_from_reader(&mut reader, ts)
    }

    fn build_from_reader<R: Read + Seek>(
        reader: &mut DataSetReader<R>,
        ts: TransferSyntax,
    ) -> Result<Self> {
        enum Frame {
            Dataset(BTreeMap<Tag, DataElement<InMemDicomObject>>),
            Sequence {
                tag: Tag,
                items: Vec<InMemDicomObject>,
            },
            PixelSequence {
                fragments: Vec<Vec<u8>>,
                offset_table: Vec<u32>,
            },
        }

        let mut stack = vec![Frame::Dataset(BTreeMap::new())];
        let mut pending_header: Option<DataElementHeader> = None;
        let mut corrupted = false;

        loop {
            let token = match reader.next_token() {
                Ok(Some(tok)) => tok,
                Ok(None) => break,
                Err(rdcm_parser::Error::Truncated { .. }) => {
                    corrupted = true;
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            match token {
                DataToken::ElementHeader(h) => pending_header = Some(h),
                DataToken::PrimitiveValue(v) => {
                    let header = pending_header
                        .take()
                        .expect("PrimitiveValue token must follow an ElementHeader");
                    match stack.last_mut().unwrap() {
                        Frame::Dataset(map) => {
                            map.insert(header.tag, DataElement::new(header, Value::Primitive(v)));
                        }
                        _ => {
                            return CorruptedSequenceSnafu {
                                reason: "primitive value outside of a dataset frame".to_string(),
                            }
                            .fail()
                        }
                    }
                }
                DataToken::SequenceStart { tag, .. } => {
                    stack.push(Frame::Sequence { tag, items: Vec::new() });
                }
                DataToken::PixelSequenceStart => {
                    stack.push(Frame::PixelSequence {
                        fragments: Vec::new(),
                        offset_table: Vec::new(),
                    });
                }
                DataToken::ItemStart { .. } => {
                    stack.push(Frame::Dataset(BTreeMap::new()));
                }
                DataToken::ItemEnd => {
                    let entries = match stack.pop() {
                        Some(Frame::Dataset(m)) => m,
                        _ => {
                            return CorruptedSequenceSnafu {
                                reason: "item end without an open item".to_string(),
                            }
                            .fail()
                        }
                    };
                    let item = InMemDicomObject {
                        entries,
                        ts,
                        corrupted: false,
                    };
                    match stack.last_mut() {
                        Some(Frame::Sequence { items, .. }) => items.push(item),
                        _ => {
                            return CorruptedSequenceSnafu {
                                reason: "item closed outside of a sequence".to_string(),
                            }
                            .fail()
                        }
                    }
                }
                DataToken::ItemValue(bytes) => match stack.last_mut() {
                    Some(Frame::PixelSequence { fragments, .. }) => fragments.push(bytes),
                    _ => {
                        return CorruptedSequenceSnafu {
                            reason: "fragment outside of a pixel sequence".to_string(),
                        }
                        .fail()
                    }
                },
                DataToken::OffsetTable(offsets) => match stack.last_mut() {
                    Some(Frame::PixelSequence { offset_table, .. }) => *offset_table = offsets,
                    _ => {
                        return CorruptedSequenceSnafu {
                            reason: "offset table outside of a pixel sequence".to_string(),
                        }
                        .fail()
                    }
                },
                DataToken::SequenceEnd => {
                    let closed = stack.pop();
                    let (tag, value): (Tag, Value<InMemDicomObject>) = match closed {
                        Some(Frame::Sequence { tag, items }) => (
                            tag,
                            Value::Sequence {
                                items,
                                size: Length::UNDEFINED,
                            },
                        ),
                        Some(Frame::PixelSequence { fragments, offset_table }) => (
                            Tag::PIXEL_DATA,
                            Value::PixelSequence { fragments, offset_table },
                        ),
                        _ => {
                            return CorruptedSequenceSnafu {
                                reason: "sequence end without an open sequence".to_string(),
                            }
                            .fail()
                        }
                    };
                    let vr = if tag == Tag::PIXEL_DATA { VR::OB } else { VR::SQ };
                    let header = DataElementHeader::new(tag, vr, value.length());
                    match stack.last_mut() {
                        Some(Frame::Dataset(map)) => {
                            map.insert(tag, DataElement::new(header, value));
                        }
                        _ => {
                            return CorruptedSequenceSnafu {
                                reason: "sequence closed outside of a dataset".to_string(),
                            }
                            .fail()
                        }
                    }
                }
            }
        }

        let entries = match stack.pop() {
            Some(Frame::Dataset(m)) if stack.is_empty() => m,
            _ => {
                return CorruptedSequenceSnafu {
                    reason: "stream ended with open sequences/items".to_string(),
                }
                .fail()
            }
        };

        Ok(InMemDicomObject { entries, ts, corrupted })
    }

    /// Serialize this object's elements as a dataset, in tag order.
    pub fn write_dataset<W: Write>(&self, out: &mut W) -> Result<()> {
        let mut writer = DataSetWriter::new(out, self.ts);
        self.write_into(&mut writer)
    }

    fn write_into<W: Write>(&self, writer: &mut DataSetWriter<W>) -> Result<()> {
        for el in self.entries.values() {
            match el.value() {
                Value::Primitive(v) => {
                    let header = DataElementHeader::new(el.tag(), el.vr(), primitive_length(v));
                    writer.write_element(&header, v)?;
                }
                Value::Sequence { items, .. } => {
                    writer.write_token(&DataToken::SequenceStart {
                        tag: el.tag(),
                        len: Length::UNDEFINED,
                    })?;
                    for item in items {
                        writer.write_token(&DataToken::ItemStart {
                            len: Length::UNDEFINED,
                        })?;
                        item.write_into(writer)?;
                        writer.write_token(&DataToken::ItemEnd)?;
                    }
                    writer.write_token(&DataToken::SequenceEnd)?;
                }
                Value::PixelSequence { fragments, offset_table } => {
                    writer.write_token(&DataToken::PixelSequenceStart)?;
                    writer.write_token(&DataToken::OffsetTable(offset_table.clone()))?;
                    for fragment in fragments {
                        writer.write_token(&DataToken::ItemValue(fragment.clone()))?;
                    }
                    writer.write_token(&DataToken::SequenceEnd)?;
                }
            }
        }
        Ok(())
    }
}

/// The even-padded wire length of a primitive value's body, matching
/// [`rdcm_core::Value::length`]'s rule without requiring a clone.
fn primitive_length(v: &PrimitiveValue) -> Length {
    let len = v.calculate_byte_len();
    Length((len + (len % 2)) as u32)
}
