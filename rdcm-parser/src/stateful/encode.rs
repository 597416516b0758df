//! Transfer-syntax-aware encoding of one element header and its
//! primitive value body — the inverse of [`crate::stateful::decode`].

use rdcm_core::{ByteOrder, DataElementHeader, HasLength, Header, PrimitiveValue, TransferSyntax, VrMethod, VR};
use std::io::Write;

use crate::error::Result;

/// Writes element headers and primitive values under a fixed transfer
/// syntax. Holds no buffering of its own; callers decide whether `W`
/// is the final sink or an in-memory buffer used to compute a parent
/// sequence/item's length bottom-up.
pub struct StatefulEncoder<'a, W> {
    out: &'a mut W,
    ts: TransferSyntax,
}

impl<'a, W: Write> StatefulEncoder<'a, W> {
    pub fn new(out: &'a mut W, ts: TransferSyntax) -> Self {
        StatefulEncoder { out, ts }
    }

    fn write_u16(&mut self, v: u16) -> Result<()> {
        self.out.write_all(&match self.ts.byte_order {
            ByteOrder::LittleEndian => v.to_le_bytes(),
            ByteOrder::BigEndian => v.to_be_bytes(),
        })?;
        Ok(())
    }

    fn write_u32(&mut self, v: u32) -> Result<()> {
        self.out.write_all(&match self.ts.byte_order {
            ByteOrder::LittleEndian => v.to_le_bytes(),
            ByteOrder::BigEndian => v.to_be_bytes(),
        })?;
        Ok(())
    }

    /// Write an element's header. `len` is the already-final, already-
    /// even-padded body length; callers must compute it bottom-up
    /// before calling this (see [`crate::dataset::write`]).
    pub fn encode_header(&mut self, header: &DataElementHeader) -> Result<()> {
        self.write_u16(header.tag.group())?;
        self.write_u16(header.tag.element())?;

        if let VrMethod::Explicit = self.ts.vr_method {
            if !(header.is_item()
                || header.is_item_delimiter()
                || header.is_sequence_delimiter())
            {
                self.out.write_all(header.vr.code().as_bytes())?;
                if header.vr.has_32_bit_length() {
                    self.out.write_all(&[0, 0])?;
                    self.write_u32(header.len.0)?;
                    return Ok(());
                } else {
                    self.write_u16(header.len.0 as u16)?;
                    return Ok(());
                }
            }
        }
        self.write_u32(header.len.0)?;
        Ok(())
    }

    /// Write a primitive value's body, padded to even length with the
    /// VR's padding byte.
    pub fn encode_value(&mut self, vr: VR, value: &PrimitiveValue) -> Result<()> {
        let mut body = rdcm_encoding::encode_value(vr, value, self.ts.byte_order)?;
        if body.len() % 2 != 0 {
            body.push(vr.padding());
        }
        self.out.write_all(&body)?;
        Ok(())
    }

    /// Write raw, already-even-length bytes verbatim (item/fragment
    /// bodies, which carry no VR).
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        Ok(())
    }
}

/// The even-padded wire length a primitive value's body will occupy,
/// without actually encoding it — used by the dataset writer to fill
/// in a header's length field before the value bytes are known to be
/// written yet.
pub fn padded_value_len(value: &PrimitiveValue) -> u32 {
    value.length().0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stateful::decode::StatefulDecoder;
    use crate::stream::ByteStream;
    use rdcm_core::{Codec, Length, PixelEncoding, Tag};
    use std::io::Cursor;

    const EXPLICIT_LE: TransferSyntax = TransferSyntax {
        uid: "1.2.840.10008.1.2.1",
        name: "Explicit VR Little Endian",
        byte_order: ByteOrder::LittleEndian,
        vr_method: VrMethod::Explicit,
        pixel_encoding: PixelEncoding::Native,
        codec: Codec::None,
    };

    #[test]
    fn round_trips_short_length_element() {
        let value = PrimitiveValue::from("CT");
        let header = DataElementHeader::new(Tag(0x0008, 0x0060), VR::CS, Length(2));

        let mut buf = Vec::new();
        {
            let mut enc = StatefulEncoder::new(&mut buf, EXPLICIT_LE);
            enc.encode_header(&header).unwrap();
            enc.encode_value(VR::CS, &value).unwrap();
        }

        let mut stream = ByteStream::new(Cursor::new(buf)).unwrap();
        let mut dec = StatefulDecoder::new(&mut stream, EXPLICIT_LE);
        let decoded_header = dec.decode_header().unwrap();
        assert_eq!(decoded_header, header);
        let decoded_value = dec.decode_value(&decoded_header).unwrap();
        assert_eq!(decoded_value, value);
    }

    #[test]
    fn pads_odd_length_string_with_space() {
        let value = PrimitiveValue::from("ODD");
        let mut buf = Vec::new();
        let mut enc = StatefulEncoder::new(&mut buf, EXPLICIT_LE);
        enc.encode_value(VR::LO, &value).unwrap();
        assert_eq!(buf, b"ODD ");
    }
}
