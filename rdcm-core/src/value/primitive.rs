//! [`PrimitiveValue`], the in-memory representation of a decoded
//! element value before any higher-level interpretation.

use crate::error::{CastValueSnafu, Error, Result};
use crate::header::HasLength;
use crate::tag::Tag;
use crate::Length;
use smallvec::SmallVec;
use std::fmt;

/// Inline-storage-optimized vector type used for value collections.
/// Most DICOM elements hold a handful of values, so small collections
/// avoid a heap allocation.
pub type C<T> = SmallVec<[T; 2]>;

/// A decoded element value, independent of its original VR's textual
/// or binary nature once past the wire format.
///
/// Date, time and person-name VRs are kept as text ([`PrimitiveValue::Strs`]
/// or [`PrimitiveValue::Str`]) rather than parsed eagerly: the codec
/// does not interpret their internal syntax, leaving that to callers
/// (see the PN handling note in the dataset codec).
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    /// No data; the element has zero length.
    Empty,
    /// A sequence of strings. Used for most textual VRs (AE, AS, CS,
    /// DA, DS, DT, IS, LO, PN, SH, TM, UC, UI).
    Strs(C<String>),
    /// A single, never-multi-valued string. Used for ST, LT, UT, UR.
    Str(String),
    /// A sequence of attribute tags, used for AT.
    Tags(C<Tag>),
    /// Raw bytes, used for OB and UN.
    U8(C<u8>),
    /// Signed 16-bit integers, used for SS.
    I16(C<i16>),
    /// Unsigned 16-bit integers, used for US and OW.
    U16(C<u16>),
    /// Signed 32-bit integers, used for SL and IS-when-binary.
    I32(C<i32>),
    /// Unsigned 32-bit integers, used for UL and OL.
    U32(C<u32>),
    /// Signed 64-bit integers, used for SV.
    I64(C<i64>),
    /// Unsigned 64-bit integers, used for UV and OV.
    U64(C<u64>),
    /// 32-bit floating point numbers, used for FL and OF.
    F32(C<f32>),
    /// 64-bit floating point numbers, used for FD and OD.
    F64(C<f64>),
}

/// A lightweight tag identifying the shape of a [`PrimitiveValue`],
/// used in [`crate::error::Error::CastValue`] to report a failed cast
/// without cloning the offending value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Empty,
    Strs,
    Str,
    Tags,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl PrimitiveValue {
    /// The number of individual values held (0 for [`PrimitiveValue::Empty`],
    /// 1 for [`PrimitiveValue::Str`]).
    pub fn multiplicity(&self) -> u32 {
        match self {
            PrimitiveValue::Empty => 0,
            PrimitiveValue::Strs(c) => c.len() as u32,
            PrimitiveValue::Str(_) => 1,
            PrimitiveValue::Tags(c) => c.len() as u32,
            PrimitiveValue::U8(c) => c.len() as u32,
            PrimitiveValue::I16(c) => c.len() as u32,
            PrimitiveValue::U16(c) => c.len() as u32,
            PrimitiveValue::I32(c) => c.len() as u32,
            PrimitiveValue::U32(c) => c.len() as u32,
            PrimitiveValue::I64(c) => c.len() as u32,
            PrimitiveValue::U64(c) => c.len() as u32,
            PrimitiveValue::F32(c) => c.len() as u32,
            PrimitiveValue::F64(c) => c.len() as u32,
        }
    }

    /// The tag describing this value's shape.
    pub fn value_type(&self) -> ValueType {
        match self {
            PrimitiveValue::Empty => ValueType::Empty,
            PrimitiveValue::Strs(_) => ValueType::Strs,
            PrimitiveValue::Str(_) => ValueType::Str,
            PrimitiveValue::Tags(_) => ValueType::Tags,
            PrimitiveValue::U8(_) => ValueType::U8,
            PrimitiveValue::I16(_) => ValueType::I16,
            PrimitiveValue::U16(_) => ValueType::U16,
            PrimitiveValue::I32(_) => ValueType::I32,
            PrimitiveValue::U32(_) => ValueType::U32,
            PrimitiveValue::I64(_) => ValueType::I64,
            PrimitiveValue::U64(_) => ValueType::U64,
            PrimitiveValue::F32(_) => ValueType::F32,
            PrimitiveValue::F64(_) => ValueType::F64,
        }
    }

    /// The first (or only) value as a string slice, if this is a
    /// textual representation.
    pub fn to_str(&self) -> Result<&str> {
        match self {
            PrimitiveValue::Str(s) => Ok(s.as_str()),
            PrimitiveValue::Strs(c) => Ok(c.first().map(String::as_str).unwrap_or("")),
            _ => CastValueSnafu {
                requested: "str",
                got: self.value_type(),
            }
            .fail(),
        }
    }

    /// All string values, for multi-valued textual VRs.
    pub fn to_multi_str(&self) -> Result<&[String]> {
        match self {
            PrimitiveValue::Strs(c) => Ok(c.as_slice()),
            PrimitiveValue::Str(_) => Err(Error::CastValue {
                requested: "multi str",
                got: self.value_type(),
            }),
            _ => CastValueSnafu {
                requested: "multi str",
                got: self.value_type(),
            }
            .fail(),
        }
    }

    /// The value as a signed integer, parsing text when necessary.
    pub fn to_int<T>(&self) -> Result<T>
    where
        T: TryFromPrimitiveValue,
    {
        T::try_from_value(self)
    }

    /// The raw byte slice, for OB/UN binary values.
    pub fn to_bytes(&self) -> Result<&[u8]> {
        match self {
            PrimitiveValue::U8(c) => Ok(c.as_slice()),
            _ => CastValueSnafu {
                requested: "bytes",
                got: self.value_type(),
            }
            .fail(),
        }
    }

    /// Serialize the value's bytes as they would appear on the wire,
    /// excluding any trailing padding (callers append that).
    pub fn calculate_byte_len(&self) -> usize {
        match self {
            PrimitiveValue::Empty => 0,
            PrimitiveValue::Str(s) => s.len(),
            PrimitiveValue::Strs(c) => {
                let joined: usize = c.iter().map(|s| s.len()).sum();
                joined + c.len().saturating_sub(1)
            }
            PrimitiveValue::Tags(c) => c.len() * 4,
            PrimitiveValue::U8(c) => c.len(),
            PrimitiveValue::I16(c) => c.len() * 2,
            PrimitiveValue::U16(c) => c.len() * 2,
            PrimitiveValue::I32(c) => c.len() * 4,
            PrimitiveValue::U32(c) => c.len() * 4,
            PrimitiveValue::I64(c) => c.len() * 8,
            PrimitiveValue::U64(c) => c.len() * 8,
            PrimitiveValue::F32(c) => c.len() * 4,
            PrimitiveValue::F64(c) => c.len() * 8,
        }
    }
}

impl HasLength for PrimitiveValue {
    fn length(&self) -> Length {
        let len = self.calculate_byte_len();
        Length((len + (len % 2)) as u32)
    }
}

/// Trait implemented for the primitive numeric types that
/// [`PrimitiveValue::to_int`] can produce, converting from whichever
/// concrete variant was decoded and, for text values, parsing the
/// first component.
pub trait TryFromPrimitiveValue: Sized {
    fn try_from_value(v: &PrimitiveValue) -> Result<Self>;
}

macro_rules! impl_try_from_primitive_value {
    ($t:ty) => {
        impl TryFromPrimitiveValue for $t {
            fn try_from_value(v: &PrimitiveValue) -> Result<Self> {
                match v {
                    PrimitiveValue::I16(c) => c
                        .first()
                        .map(|&x| x as $t)
                        .ok_or(Error::UnexpectedDataValueLength),
                    PrimitiveValue::U16(c) => c
                        .first()
                        .map(|&x| x as $t)
                        .ok_or(Error::UnexpectedDataValueLength),
                    PrimitiveValue::I32(c) => c
                        .first()
                        .map(|&x| x as $t)
                        .ok_or(Error::UnexpectedDataValueLength),
                    PrimitiveValue::U32(c) => c
                        .first()
                        .map(|&x| x as $t)
                        .ok_or(Error::UnexpectedDataValueLength),
                    PrimitiveValue::I64(c) => c
                        .first()
                        .map(|&x| x as $t)
                        .ok_or(Error::UnexpectedDataValueLength),
                    PrimitiveValue::U64(c) => c
                        .first()
                        .map(|&x| x as $t)
                        .ok_or(Error::UnexpectedDataValueLength),
                    PrimitiveValue::Str(s) => s.trim().parse().map_err(|_| Error::CastValue {
                        requested: stringify!($t),
                        got: v.value_type(),
                    }),
                    PrimitiveValue::Strs(c) => c
                        .first()
                        .ok_or(Error::UnexpectedDataValueLength)
                        .and_then(|s| {
                            s.trim().parse().map_err(|_| Error::CastValue {
                                requested: stringify!($t),
                                got: v.value_type(),
                            })
                        }),
                    _ => CastValueSnafu {
                        requested: stringify!($t),
                        got: v.value_type(),
                    }
                    .fail(),
                }
            }
        }
    };
}

impl_try_from_primitive_value!(i16);
impl_try_from_primitive_value!(u16);
impl_try_from_primitive_value!(i32);
impl_try_from_primitive_value!(u32);
impl_try_from_primitive_value!(i64);
impl_try_from_primitive_value!(u64);

impl From<&str> for PrimitiveValue {
    fn from(s: &str) -> Self {
        PrimitiveValue::Strs(C::from_iter([s.to_string()]))
    }
}

impl From<String> for PrimitiveValue {
    fn from(s: String) -> Self {
        PrimitiveValue::Strs(C::from_iter([s]))
    }
}

impl From<u16> for PrimitiveValue {
    fn from(v: u16) -> Self {
        PrimitiveValue::U16(C::from_iter([v]))
    }
}

impl From<u32> for PrimitiveValue {
    fn from(v: u32) -> Self {
        PrimitiveValue::U32(C::from_iter([v]))
    }
}

impl From<i32> for PrimitiveValue {
    fn from(v: i32) -> Self {
        PrimitiveValue::I32(C::from_iter([v]))
    }
}

impl From<Vec<u8>> for PrimitiveValue {
    fn from(v: Vec<u8>) -> Self {
        PrimitiveValue::U8(C::from_vec(v))
    }
}

impl From<Tag> for PrimitiveValue {
    fn from(t: Tag) -> Self {
        PrimitiveValue::Tags(C::from_iter([t]))
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveValue::Empty => write!(f, ""),
            PrimitiveValue::Str(s) => write!(f, "{s}"),
            PrimitiveValue::Strs(c) => write!(f, "{}", c.join("\\")),
            other => write!(f, "{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplicity_counts_values() {
        assert_eq!(PrimitiveValue::Empty.multiplicity(), 0);
        assert_eq!(PrimitiveValue::from("12345").multiplicity(), 1);
        assert_eq!(
            PrimitiveValue::Strs(C::from_iter(["A".to_string(), "B".to_string()]))
                .multiplicity(),
            2
        );
    }

    #[test]
    fn int_cast_parses_text() {
        let v = PrimitiveValue::from("42");
        assert_eq!(v.to_int::<i32>().unwrap(), 42);
    }

    #[test]
    fn int_cast_from_binary() {
        let v = PrimitiveValue::U16(C::from_iter([7u16]));
        assert_eq!(v.to_int::<u16>().unwrap(), 7);
    }

    #[test]
    fn byte_len_accounts_for_separators() {
        let v = PrimitiveValue::Strs(C::from_iter(["AB".to_string(), "CDE".to_string()]));
        assert_eq!(v.calculate_byte_len(), 2 + 1 + 3);
    }
}
