//! Wires [`InMemDicomObject`]'s Pixel Data element to
//! [`rdcm_parser::frame_index`], giving O(1) access to individual
//! frames without re-walking the data set (spec §4.5).
//!
//! Offsets reported by [`FrameInfo`] here are relative to the decoded
//! Pixel Data value (or to the concatenated fragment stream, for
//! encapsulated pixel data), not to any file on disk: the object
//! already holds every byte in memory, so there is no file to seek
//! back into.

use rdcm_core::{Tag, Value};
use rdcm_parser::frame_index::{build_encapsulated, build_native, NativePixelParams};
pub use rdcm_parser::frame_index::FrameInfo;

use crate::error::{FrameIndexOutOfRangeSnafu, NoSuchAttributeSnafu, Result};
use crate::mem::InMemDicomObject;

const ROWS: Tag = Tag(0x0028, 0x0010);
const COLUMNS: Tag = Tag(0x0028, 0x0011);
const SAMPLES_PER_PIXEL: Tag = Tag(0x0028, 0x0002);
const BITS_ALLOCATED: Tag = Tag(0x0028, 0x0100);
const NUMBER_OF_FRAMES: Tag = Tag(0x0028, 0x0028);

impl InMemDicomObject {
    /// Build the per-frame offset/length table for this object's Pixel
    /// Data element, whichever of the two on-wire shapes it takes.
    pub fn pixel_frame_index(&self) -> Result<Vec<FrameInfo>> {
        let el = self
            .get(Tag::PIXEL_DATA)
            .ok_or_else(|| NoSuchAttributeSnafu { tag: Tag::PIXEL_DATA }.build())?;

        match el.value() {
            Value::PixelSequence { fragments, offset_table } => {
                let mut spans = Vec::with_capacity(fragments.len());
                let mut cursor = 0u64;
                for fragment in fragments {
                    spans.push((cursor, fragment.len() as u64));
                    cursor += fragment.len() as u64;
                }
                Ok(build_encapsulated(offset_table, &spans)?)
            }
            Value::Primitive(v) => {
                let params = NativePixelParams {
                    rows: self.get_u16(ROWS),
                    columns: self.get_u16(COLUMNS),
                    samples_per_pixel: self.get_u16(SAMPLES_PER_PIXEL),
                    bits_allocated: self.get_u16(BITS_ALLOCATED),
                    number_of_frames: self.get_u32(NUMBER_OF_FRAMES),
                    pixel_data_offset: 0,
                    pixel_data_length: v.calculate_byte_len() as u64,
                };
                Ok(build_native(params)?)
            }
            Value::Sequence { .. } => NoSuchAttributeSnafu { tag: Tag::PIXEL_DATA }.fail(),
        }
    }

    /// The raw bytes of frame `index`, reassembling fragments when the
    /// frame's codestream spans more than one.
    pub fn pixel_frame_bytes(&self, index: usize) -> Result<Vec<u8>> {
        let frames = self.pixel_frame_index()?;
        let frame = frames.get(index).copied().ok_or_else(|| {
            FrameIndexOutOfRangeSnafu {
                index,
                count: frames.len(),
            }
            .build()
        })?;

        let el = self.get(Tag::PIXEL_DATA).expect("checked by pixel_frame_index");
        let start = frame.offset as usize;
        let end = start + frame.length as usize;

        match el.value() {
            Value::PixelSequence { fragments, .. } => {
                let mut buf = Vec::with_capacity(end - start);
                for fragment in fragments {
                    buf.extend_from_slice(fragment);
                }
                Ok(buf[start..end].to_vec())
            }
            Value::Primitive(v) => {
                let bytes = rdcm_encoding::encode_value(el.vr(), v, self.transfer_syntax().byte_order)?;
                Ok(bytes[start..end].to_vec())
            }
            Value::Sequence { .. } => unreachable!("checked by pixel_frame_index"),
        }
    }
}
