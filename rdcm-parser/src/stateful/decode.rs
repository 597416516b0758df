//! Transfer-syntax-aware decoding of one element header and its
//! primitive value body, per the algorithm of spec §4.3.

use crate::error::{InvalidVrSnafu, Result};
use crate::stream::ByteStream;
use rdcm_core::{ByteOrder, DataElementHeader, Length, PrimitiveValue, Tag, TransferSyntax, VrMethod, VR};
use std::io::{Read, Seek};

/// Reads element headers and primitive values under a fixed transfer
/// syntax, delegating unknown-tag VR inference to the standard
/// dictionary when the syntax is implicit.
pub struct StatefulDecoder<'a, R> {
    stream: &'a mut ByteStream<R>,
    ts: TransferSyntax,
}

impl<'a, R: Read + Seek> StatefulDecoder<'a, R> {
    pub fn new(stream: &'a mut ByteStream<R>, ts: TransferSyntax) -> Self {
        StatefulDecoder { stream, ts }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.ts.byte_order
    }

    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.stream.read_exact(&mut buf)?;
        Ok(match self.ts.byte_order {
            ByteOrder::LittleEndian => u16::from_le_bytes(buf),
            ByteOrder::BigEndian => u16::from_be_bytes(buf),
        })
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.stream.read_exact(&mut buf)?;
        Ok(match self.ts.byte_order {
            ByteOrder::LittleEndian => u32::from_le_bytes(buf),
            ByteOrder::BigEndian => u32::from_be_bytes(buf),
        })
    }

    /// Decode the next element header: tag, VR and length.
    ///
    /// Under implicit VR, the VR is resolved from the standard
    /// dictionary (falling back to [`VR::UN`] for unknown tags) and
    /// the length field is always 32-bit. Under explicit VR, the VR
    /// read from the wire determines whether the length field is 16-
    /// or 32-bit, per [`VR::has_32_bit_length`].
    pub fn decode_header(&mut self) -> Result<DataElementHeader> {
        let group = self.read_u16()?;
        let element = self.read_u16()?;
        let tag = Tag(group, element);

        let (vr, len) = match self.ts.vr_method {
            VrMethod::Implicit => {
                let vr = rdcm_dictionary_std::vr_for(tag);
                let len = self.read_u32()?;
                (vr, len)
            }
            VrMethod::Explicit => {
                if tag == Tag::ITEM
                    || tag == Tag::ITEM_DELIMITATION
                    || tag == Tag::SEQUENCE_DELIMITATION
                {
                    // Item framing tags never carry a VR code, even
                    // inside an explicit-VR stream.
                    let len = self.read_u32()?;
                    (VR::UN, len)
                } else {
                    let mut code = [0u8; 2];
                    self.stream.read_exact(&mut code)?;
                    let vr = VR::from_code(code).context_with(tag)?;
                    let len = if vr.has_32_bit_length() {
                        let mut reserved = [0u8; 2];
                        self.stream.read_exact(&mut reserved)?;
                        self.read_u32()?
                    } else {
                        self.read_u16()? as u32
                    };
                    (vr, len)
                }
            }
        };

        Ok(DataElementHeader::new(tag, vr, Length(len)))
    }

    /// Read a primitive value's raw body (already known to be of
    /// defined length) and decode it per the header's VR.
    pub fn decode_value(&mut self, header: &DataElementHeader) -> Result<PrimitiveValue> {
        let len = header
            .len
            .get()
            .expect("decode_value called with an undefined length");
        let bytes = self.stream.read_vec(len)?;
        Ok(rdcm_encoding::decode_value(header.vr, &bytes, self.ts.byte_order)?)
    }

    /// Read a fixed-size raw byte run (item/fragment bodies, which are
    /// never VR-decoded).
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        Ok(self.stream.read_vec(len)?)
    }

    pub fn skip(&mut self, len: u64) -> Result<()> {
        self.stream.forward(len)
    }

    pub fn remaining(&self) -> Option<u64> {
        self.stream.remaining()
    }
}

trait OptionVrExt {
    fn context_with(self, tag: Tag) -> Result<VR>;
}

impl OptionVrExt for Option<VR> {
    fn context_with(self, tag: Tag) -> Result<VR> {
        use snafu::OptionExt;
        self.context(InvalidVrSnafu { tag })
    }
}
