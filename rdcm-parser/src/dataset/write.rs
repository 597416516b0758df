//! [`DataSetWriter`]: serializes a [`DataToken`] stream back to bytes
//! under a known transfer syntax.
//!
//! This writer does not recompute lengths; it trusts what each token
//! reports. [`rdcm_object`](../../rdcm_object/index.html)'s in-memory
//! object always hands it elements with a freshly computed primitive
//! length (via [`rdcm_core::HasLength`]) and [`rdcm_core::Length::UNDEFINED`]
//! for every sequence, item and pixel sequence it opens — the
//! delimiter-terminated form spec §4.4 allows as an alternative to a
//! precomputed explicit length, and the one this toolkit always
//! chooses, since it needs no lookahead buffering to get right after a
//! mutation.

use std::io::Write;

use rdcm_core::{DataElementHeader, Tag, TransferSyntax, VR};

use super::tokens::DataToken;
use crate::error::Result;
use crate::stateful::encode::StatefulEncoder;

/// A dataset-level token writer.
pub struct DataSetWriter<'a, W> {
    encoder: StatefulEncoder<'a, W>,
    /// Tracks whether the innermost open frame is a pixel sequence, so
    /// [`DataToken::ItemValue`]/[`DataToken::OffsetTable`] are written
    /// as raw fragment items rather than nested-dataset items.
    pixel_stack: Vec<bool>,
}

impl<'a, W: Write> DataSetWriter<'a, W> {
    pub fn new(out: &'a mut W, ts: TransferSyntax) -> Self {
        DataSetWriter {
            encoder: StatefulEncoder::new(out, ts),
            pixel_stack: Vec::new(),
        }
    }

    pub fn write_token(&mut self, token: &DataToken) -> Result<()> {
        match token {
            DataToken::ElementHeader(header) => {
                self.encoder.encode_header(header)?;
            }
            DataToken::PrimitiveValue(_) => {
                // The caller must pair a header with its value so the
                // value's VR is known; use `write_element` instead of
                // feeding this variant through `write_token` directly.
                unreachable!(
                    "PrimitiveValue token must be written via write_element, not write_token"
                )
            }
            DataToken::SequenceStart { tag, len } => {
                let header = DataElementHeader::new(*tag, VR::SQ, *len);
                self.encoder.encode_header(&header)?;
                self.pixel_stack.push(false);
            }
            DataToken::PixelSequenceStart => {
                let header =
                    DataElementHeader::new(Tag::PIXEL_DATA, VR::OB, rdcm_core::Length::UNDEFINED);
                self.encoder.encode_header(&header)?;
                self.pixel_stack.push(true);
            }
            DataToken::SequenceEnd => {
                self.pixel_stack.pop();
                let header = DataElementHeader::new(
                    Tag::SEQUENCE_DELIMITATION,
                    VR::UN,
                    rdcm_core::Length(0),
                );
                self.encoder.encode_header(&header)?;
            }
            DataToken::ItemStart { len } => {
                let header = DataElementHeader::new(Tag::ITEM, VR::UN, *len);
                self.encoder.encode_header(&header)?;
            }
            DataToken::ItemEnd => {
                let header =
                    DataElementHeader::new(Tag::ITEM_DELIMITATION, VR::UN, rdcm_core::Length(0));
                self.encoder.encode_header(&header)?;
            }
            DataToken::ItemValue(bytes) => {
                self.write_fragment_item(bytes)?;
            }
            DataToken::OffsetTable(offsets) => {
                let mut body = Vec::with_capacity(offsets.len() * 4);
                for o in offsets {
                    body.extend_from_slice(&o.to_le_bytes());
                }
                self.write_fragment_item(&body)?;
            }
        }
        Ok(())
    }

    fn write_fragment_item(&mut self, body: &[u8]) -> Result<()> {
        let header = DataElementHeader::new(Tag::ITEM, VR::UN, rdcm_core::Length(body.len() as u32));
        self.encoder.encode_header(&header)?;
        self.encoder.write_raw(body)?;
        Ok(())
    }

    /// Write a primitive element: its header followed immediately by
    /// its value, as the pair always appears together on the wire.
    /// This is the entry point `rdcm_object` uses instead of feeding
    /// [`DataToken::PrimitiveValue`] through [`Self::write_token`]
    /// directly, since the value's encoding needs the header's VR.
    pub fn write_element(
        &mut self,
        header: &DataElementHeader,
        value: &rdcm_core::PrimitiveValue,
    ) -> Result<()> {
        self.encoder.encode_header(header)?;
        self.encoder.encode_value(header.vr, value)?;
        Ok(())
    }
}
