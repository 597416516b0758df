//! Element values: [`PrimitiveValue`] for leaf elements, and the
//! [`Value`] wrapper that also covers sequences and encapsulated pixel
//! data items.

mod primitive;

pub use primitive::{PrimitiveValue, TryFromPrimitiveValue, ValueType, C};

use crate::header::HasLength;
use crate::Length;

/// An element's value: either a primitive leaf value, a sequence of
/// nested item collections, or a pixel sequence made of raw
/// fragments (the three shapes an element can take per PS3.5 §7.5).
///
/// `I` is the item representation used by the owning container (for
/// example a full in-memory object, or just its encoded byte range).
#[derive(Debug, Clone, PartialEq)]
pub enum Value<I> {
    /// A primitive leaf value.
    Primitive(PrimitiveValue),
    /// A sequence of nested item collections.
    Sequence {
        items: Vec<I>,
        /// The length recorded on the wire, [`Length::UNDEFINED`] when
        /// terminated by a sequence delimitation item instead.
        size: Length,
    },
    /// Encapsulated pixel data: a basic offset table followed by one
    /// or more compressed-frame fragments, each held as raw bytes.
    PixelSequence {
        fragments: Vec<Vec<u8>>,
        /// Offsets (in bytes) of each frame's first fragment, decoded
        /// from the basic offset table item when present.
        offset_table: Vec<u32>,
    },
}

impl<I> Value<I> {
    /// The primitive value, if this is [`Value::Primitive`].
    pub fn primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            Value::Primitive(v) => Some(v),
            _ => None,
        }
    }

    /// The nested items, if this is [`Value::Sequence`].
    pub fn items(&self) -> Option<&[I]> {
        match self {
            Value::Sequence { items, .. } => Some(items),
            _ => None,
        }
    }

    /// The raw fragments, if this is [`Value::PixelSequence`].
    pub fn fragments(&self) -> Option<&[Vec<u8>]> {
        match self {
            Value::PixelSequence { fragments, .. } => Some(fragments),
            _ => None,
        }
    }

    /// Whether this value is a [`Value::Primitive`] holding
    /// [`PrimitiveValue::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Primitive(PrimitiveValue::Empty))
    }
}

impl<I> From<PrimitiveValue> for Value<I> {
    fn from(v: PrimitiveValue) -> Self {
        Value::Primitive(v)
    }
}

impl<I> HasLength for Value<I> {
    fn length(&self) -> Length {
        match self {
            Value::Primitive(v) => {
                let len = v.calculate_byte_len();
                Length((len + (len % 2)) as u32)
            }
            Value::Sequence { size, .. } => *size,
            Value::PixelSequence { .. } => Length::UNDEFINED,
        }
    }
}
