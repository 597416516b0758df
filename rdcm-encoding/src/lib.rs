//! Per-VR encoding and decoding of primitive element values.
//!
//! This crate turns a VR, a byte order and a raw value body into a
//! [`rdcm_core::PrimitiveValue`], and back. It knows nothing about
//! element headers, sequences or transfer syntax negotiation — that
//! belongs to `rdcm-parser`, which calls into this crate once per
//! element body.

pub mod error;
mod text;

use rdcm_core::{ByteOrder, PrimitiveValue, VR};

pub use error::{Error, Result};

/// Decode a primitive value's body, already stripped of any trailing
/// padding byte, according to its VR and the transfer syntax's byte
/// order.
///
/// Binary VRs are decoded into their natural width; string VRs are
/// decoded as UTF-8 and (for multi-valued VRs) split on the `\`
/// value delimiter. Malformed UTF-8 in a text VR is replaced
/// losslessly using [`String::from_utf8_lossy`], matching how the
/// teacher's decoder tolerates non-conformant input rather than
/// failing the whole data set over one attribute.
pub fn decode_value(vr: VR, bytes: &[u8], byte_order: ByteOrder) -> Result<PrimitiveValue> {
    if bytes.is_empty() {
        return Ok(PrimitiveValue::Empty);
    }

    match vr {
        VR::AT => {
            let tags = bytes
                .chunks_exact(4)
                .map(|c| {
                    let group = read_u16(c, byte_order);
                    let elem = read_u16(&c[2..], byte_order);
                    rdcm_core::Tag(group, elem)
                })
                .collect();
            Ok(PrimitiveValue::Tags(tags))
        }
        VR::OB | VR::UN => Ok(PrimitiveValue::U8(bytes.iter().copied().collect())),
        VR::US | VR::OW => Ok(PrimitiveValue::U16(
            bytes.chunks_exact(2).map(|c| read_u16(c, byte_order)).collect(),
        )),
        VR::SS => Ok(PrimitiveValue::I16(
            bytes
                .chunks_exact(2)
                .map(|c| read_u16(c, byte_order) as i16)
                .collect(),
        )),
        VR::UL | VR::OL => Ok(PrimitiveValue::U32(
            bytes.chunks_exact(4).map(|c| read_u32(c, byte_order)).collect(),
        )),
        VR::SL => Ok(PrimitiveValue::I32(
            bytes
                .chunks_exact(4)
                .map(|c| read_u32(c, byte_order) as i32)
                .collect(),
        )),
        VR::UV | VR::OV => Ok(PrimitiveValue::U64(
            bytes.chunks_exact(8).map(|c| read_u64(c, byte_order)).collect(),
        )),
        VR::SV => Ok(PrimitiveValue::I64(
            bytes
                .chunks_exact(8)
                .map(|c| read_u64(c, byte_order) as i64)
                .collect(),
        )),
        VR::FL | VR::OF => Ok(PrimitiveValue::F32(
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_bits(read_u32(c, byte_order)))
                .collect(),
        )),
        VR::FD | VR::OD => Ok(PrimitiveValue::F64(
            bytes
                .chunks_exact(8)
                .map(|c| f64::from_bits(read_u64(c, byte_order)))
                .collect(),
        )),
        VR::ST | VR::LT | VR::UT | VR::UR => {
            Ok(PrimitiveValue::Str(text::decode_single(bytes)))
        }
        VR::AE | VR::AS | VR::CS | VR::DA | VR::DS | VR::DT | VR::IS | VR::LO | VR::PN
        | VR::SH | VR::TM | VR::UC | VR::UI => Ok(PrimitiveValue::Strs(text::decode_multi(bytes))),
        VR::SQ => error::NotAPrimitiveSnafu { vr }.fail(),
    }
}

/// Encode a primitive value's body for the given VR and byte order.
/// The caller is responsible for appending the VR's padding byte to
/// reach an even length.
pub fn encode_value(vr: VR, value: &PrimitiveValue, byte_order: ByteOrder) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(value.calculate_byte_len());
    match (vr, value) {
        (VR::AT, PrimitiveValue::Tags(tags)) => {
            for t in tags {
                write_u16(&mut out, t.group(), byte_order);
                write_u16(&mut out, t.element(), byte_order);
            }
        }
        (VR::OB | VR::UN, PrimitiveValue::U8(bytes)) => out.extend_from_slice(bytes),
        (VR::US | VR::OW, PrimitiveValue::U16(vals)) => {
            for v in vals {
                write_u16(&mut out, *v, byte_order);
            }
        }
        (VR::SS, PrimitiveValue::I16(vals)) => {
            for v in vals {
                write_u16(&mut out, *v as u16, byte_order);
            }
        }
        (VR::UL | VR::OL, PrimitiveValue::U32(vals)) => {
            for v in vals {
                write_u32(&mut out, *v, byte_order);
            }
        }
        (VR::SL, PrimitiveValue::I32(vals)) => {
            for v in vals {
                write_u32(&mut out, *v as u32, byte_order);
            }
        }
        (VR::UV | VR::OV, PrimitiveValue::U64(vals)) => {
            for v in vals {
                write_u64(&mut out, *v, byte_order);
            }
        }
        (VR::SV, PrimitiveValue::I64(vals)) => {
            for v in vals {
                write_u64(&mut out, *v as u64, byte_order);
            }
        }
        (VR::FL | VR::OF, PrimitiveValue::F32(vals)) => {
            for v in vals {
                write_u32(&mut out, v.to_bits(), byte_order);
            }
        }
        (VR::FD | VR::OD, PrimitiveValue::F64(vals)) => {
            for v in vals {
                write_u64(&mut out, v.to_bits(), byte_order);
            }
        }
        (VR::ST | VR::LT | VR::UT | VR::UR, PrimitiveValue::Str(s)) => {
            out.extend_from_slice(s.as_bytes())
        }
        (_, PrimitiveValue::Strs(vals)) if vr.is_string() => {
            out.extend_from_slice(text::encode_multi(vals).as_bytes())
        }
        (_, PrimitiveValue::Empty) => {}
        _ => {
            return error::VrValueMismatchSnafu { vr, got: value.value_type() }.fail();
        }
    }
    Ok(out)
}

fn read_u16(b: &[u8], order: ByteOrder) -> u16 {
    let arr = [b[0], b[1]];
    match order {
        ByteOrder::LittleEndian => u16::from_le_bytes(arr),
        ByteOrder::BigEndian => u16::from_be_bytes(arr),
    }
}

fn read_u32(b: &[u8], order: ByteOrder) -> u32 {
    let arr = [b[0], b[1], b[2], b[3]];
    match order {
        ByteOrder::LittleEndian => u32::from_le_bytes(arr),
        ByteOrder::BigEndian => u32::from_be_bytes(arr),
    }
}

fn read_u64(b: &[u8], order: ByteOrder) -> u64 {
    let mut arr = [0u8; 8];
    arr.copy_from_slice(&b[..8]);
    match order {
        ByteOrder::LittleEndian => u64::from_le_bytes(arr),
        ByteOrder::BigEndian => u64::from_be_bytes(arr),
    }
}

fn write_u16(out: &mut Vec<u8>, v: u16, order: ByteOrder) {
    out.extend_from_slice(&match order {
        ByteOrder::LittleEndian => v.to_le_bytes(),
        ByteOrder::BigEndian => v.to_be_bytes(),
    });
}

fn write_u32(out: &mut Vec<u8>, v: u32, order: ByteOrder) {
    out.extend_from_slice(&match order {
        ByteOrder::LittleEndian => v.to_le_bytes(),
        ByteOrder::BigEndian => v.to_be_bytes(),
    });
}

fn write_u64(out: &mut Vec<u8>, v: u64, order: ByteOrder) {
    out.extend_from_slice(&match order {
        ByteOrder::LittleEndian => v.to_le_bytes(),
        ByteOrder::BigEndian => v.to_be_bytes(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_multi_valued_string() {
        let value = PrimitiveValue::from("DERIVED\\SECONDARY");
        let bytes = encode_value(VR::CS, &value, ByteOrder::LittleEndian).unwrap();
        let decoded = decode_value(VR::CS, &bytes, ByteOrder::LittleEndian).unwrap();
        assert_eq!(decoded.to_multi_str().unwrap(), &["DERIVED", "SECONDARY"]);
    }

    #[test]
    fn round_trips_u16_big_endian() {
        let value = PrimitiveValue::U16([512u16, 512].into_iter().collect());
        let bytes = encode_value(VR::US, &value, ByteOrder::BigEndian).unwrap();
        assert_eq!(bytes, [0x02, 0x00, 0x02, 0x00]);
        let decoded = decode_value(VR::US, &bytes, ByteOrder::BigEndian).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn empty_body_decodes_as_empty() {
        assert_eq!(
            decode_value(VR::PN, &[], ByteOrder::LittleEndian).unwrap(),
            PrimitiveValue::Empty
        );
    }

    #[test]
    fn sequence_vr_is_rejected() {
        assert!(decode_value(VR::SQ, &[0, 0], ByteOrder::LittleEndian).is_err());
    }
}
