//! [`DataSetReader`]: turns a byte stream under a known transfer
//! syntax into a flat [`DataToken`] stream, tracking the nesting of
//! sequences, items and pixel-data fragments explicitly rather than
//! recursing, so a caller can stop after any token (e.g. to skip
//! Pixel Data) without unwinding a call stack.

use std::io::{Read, Seek};

use rdcm_core::{DataElementHeader, Length, Tag, TransferSyntax, VR};

use crate::error::{CorruptedSnafu, Result};
use crate::stateful::decode::StatefulDecoder;
use crate::stream::ByteStream;

use super::tokens::DataToken;

/// Options controlling how much of a dataset's pixel data is pulled
/// into the token stream, mirroring the `DicomFile` open options of
/// spec §6.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Stop after the file meta group / before any main-dataset
    /// element is read.
    pub header_only: bool,
    /// Skip (7FE0,0010) Pixel Data entirely: its header is still
    /// emitted, but no value/fragment tokens follow it.
    pub without_pixel_data: bool,
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    /// A sequence of nested-dataset items.
    Sequence { end: Option<u64> },
    /// A pixel sequence of raw fragments.
    PixelSequence { end: Option<u64>, next_item_is_bot: bool },
    /// An item nested inside a [`Frame::Sequence`]; its body is itself
    /// a dataset.
    Item { end: Option<u64> },
}

/// A streaming, stack-based dataset token reader.
pub struct DataSetReader<'a, R> {
    decoder: StatefulDecoder<'a, R>,
    stack: Vec<Frame>,
    options: ReadOptions,
    pending: std::collections::VecDeque<DataToken>,
    skipping_pixel_data: bool,
    done: bool,
}

impl<'a, R: Read + Seek> DataSetReader<'a, R> {
    pub fn new(stream: &'a mut ByteStream<R>, ts: TransferSyntax, options: ReadOptions) -> Self {
        DataSetReader {
            decoder: StatefulDecoder::new(stream, ts),
            stack: Vec::new(),
            options,
            pending: std::collections::VecDeque::new(),
            skipping_pixel_data: false,
            done: false,
        }
    }

    /// The absolute byte offset the underlying stream is positioned
    /// at right now — callers building a frame index capture this
    /// immediately before/after the tokens describing Pixel Data.
    pub fn position(&self) -> u64 {
        self.decoder.position()
    }

    fn at_top_level(&self) -> bool {
        self.stack.is_empty()
    }

    /// Pop any frames whose defined end offset has been reached,
    /// emitting the matching closing token(s) for each.
    fn close_finished_frames(&mut self) {
        loop {
            let pos = self.decoder.position();
            match self.stack.last() {
                Some(Frame::Item { end: Some(end) }) if pos >= *end => {
                    self.stack.pop();
                    self.pending.push_back(DataToken::ItemEnd);
                }
                Some(Frame::Sequence { end: Some(end) }) if pos >= *end => {
                    self.stack.pop();
                    self.pending.push_back(DataToken::SequenceEnd);
                }
                Some(Frame::PixelSequence { end: Some(end), .. }) if pos >= *end => {
                    self.stack.pop();
                    self.pending.push_back(DataToken::SequenceEnd);
                }
                _ => break,
            }
        }
    }

    /// Produce the next token, or `None` once the reader has returned
    /// to the top level with the stream exhausted.
    pub fn next_token(&mut self) -> Result<Option<DataToken>> {
        if let Some(tok) = self.pending.pop_front() {
            return Ok(Some(tok));
        }
        if self.done {
            return Ok(None);
        }

        self.close_finished_frames();
        if let Some(tok) = self.pending.pop_front() {
            return Ok(Some(tok));
        }

        if self.at_top_level() && self.decoder.remaining() == Some(0) {
            self.done = true;
            return Ok(None);
        }

        let header = match self.decoder.decode_header() {
            Ok(h) => h,
            Err(e) => {
                if self.at_top_level() && self.decoder.remaining() == Some(0) {
                    self.done = true;
                    return Ok(None);
                }
                return Err(e);
            }
        };

        self.handle_header(header)?;
        self.next_token()
    }

    fn handle_header(&mut self, header: DataElementHeader) -> Result<()> {
        let tag = header.tag;

        if tag == Tag::SEQUENCE_DELIMITATION {
            match self.stack.pop() {
                Some(Frame::Sequence { .. }) | Some(Frame::PixelSequence { .. }) => {
                    self.pending.push_back(DataToken::SequenceEnd);
                    return Ok(());
                }
                other => {
                    let reason = format!(
                        "sequence delimitation item with no open sequence (stack: {other:?})"
                    );
                    tracing::warn!(%reason, "malformed data set");
                    return CorruptedSnafu { reason }.fail();
                }
            }
        }

        if tag == Tag::ITEM_DELIMITATION {
            match self.stack.pop() {
                Some(Frame::Item { .. }) => {
                    self.pending.push_back(DataToken::ItemEnd);
                    return Ok(());
                }
                other => {
                    let reason = format!("item delimitation item with no open item ({other:?})");
                    tracing::warn!(%reason, "malformed data set");
                    return CorruptedSnafu { reason }.fail();
                }
            }
        }

        if tag == Tag::ITEM {
            return self.handle_item(header.len);
        }

        if header.vr == VR::SQ {
            let end = header.len.get().map(|l| self.decoder.position() + l as u64);
            self.pending
                .push_back(DataToken::SequenceStart { tag, len: header.len });
            self.stack.push(Frame::Sequence { end });
            return Ok(());
        }

        if tag == Tag::PIXEL_DATA && header.len.is_undefined() {
            self.pending.push_back(DataToken::PixelSequenceStart);
            self.skipping_pixel_data = self.options.without_pixel_data;
            self.stack.push(Frame::PixelSequence {
                end: None,
                next_item_is_bot: true,
            });
            return Ok(());
        }

        // A primitive element.
        self.pending.push_back(DataToken::ElementHeader(header));
        let skip_value = tag == Tag::PIXEL_DATA && self.options.without_pixel_data;
        match header.len.get() {
            Some(len) => {
                if skip_value {
                    self.decoder.skip(len as u64)?;
                } else {
                    let value = self.decoder.decode_value(&header)?;
                    self.pending.push_back(DataToken::PrimitiveValue(value));
                }
            }
            None => {
                return CorruptedSnafu {
                    reason: format!("element {tag} of VR {:?} has undefined length", header.vr),
                }
                .fail();
            }
        }
        Ok(())
    }

    fn handle_item(&mut self, len: Length) -> Result<()> {
        match self.stack.last_mut() {
            Some(Frame::PixelSequence { next_item_is_bot, .. }) => {
                let is_bot = *next_item_is_bot;
                *next_item_is_bot = false;
                let body_len = len.get().ok_or_else(|| {
                    crate::error::Error::Corrupted {
                        reason: "pixel sequence fragment with undefined length".into(),
                    }
                })?;
                let bytes = self.decoder.read_bytes(body_len)?;
                if self.skipping_pixel_data {
                    // still consumed above (to keep the stream
                    // position correct); just don't surface it.
                    return Ok(());
                }
                if is_bot {
                    let offsets = bytes
                        .chunks_exact(4)
                        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                        .collect();
                    self.pending.push_back(DataToken::OffsetTable(offsets));
                } else {
                    self.pending.push_back(DataToken::ItemValue(bytes));
                }
                Ok(())
            }
            Some(Frame::Sequence { .. }) | None => {
                let end = len.get().map(|l| self.decoder.position() + l as u64);
                self.pending.push_back(DataToken::ItemStart { len });
                self.stack.push(Frame::Item { end });
                Ok(())
            }
            Some(Frame::Item { .. }) => CorruptedSnafu {
                reason: "nested item directly inside an item (expected an intervening sequence)"
                    .to_string(),
            }
            .fail(),
        }
    }

    /// Whether the reader is currently inside any sequence, item or
    /// pixel sequence (i.e. has not returned to the top level).
    pub fn is_nested(&self) -> bool {
        !self.stack.is_empty()
    }
}
