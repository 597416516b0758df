//! [`DataToken`], the unit the dataset reader/writer exchange with
//! their caller: a flattened view of a dataset's nested element,
//! sequence, item and pixel-fragment structure.

use rdcm_core::{DataElementHeader, Length, PrimitiveValue, Tag};
use std::fmt;

/// One unit of a dataset's token stream, as produced by
/// [`crate::dataset::read::DataSetReader`] and consumed by
/// [`crate::dataset::write::DataSetWriter`].
#[derive(Debug, Clone, PartialEq)]
pub enum DataToken {
    /// The header of a primitive-valued element; its value follows as
    /// a separate [`DataToken::PrimitiveValue`].
    ElementHeader(DataElementHeader),
    /// The start of a sequence element (VR = SQ).
    SequenceStart { tag: Tag, len: Length },
    /// The start of an encapsulated pixel data element (VR = OB,
    /// undefined length).
    PixelSequenceStart,
    /// The closing delimiter of a sequence or pixel sequence, whether
    /// it was read from an explicit delimitation item or inferred from
    /// reaching a defined length's end offset.
    SequenceEnd,
    /// The start of an item nested inside a sequence.
    ItemStart { len: Length },
    /// The closing delimiter of an item.
    ItemEnd,
    /// A primitive element's decoded value.
    PrimitiveValue(PrimitiveValue),
    /// A pixel sequence fragment's raw, undecoded bytes.
    ItemValue(Vec<u8>),
    /// The Basic Offset Table: the first item of a pixel sequence,
    /// decoded into its 32-bit offsets (empty when the BOT item itself
    /// is zero-length — a meaningful, distinct state from "absent",
    /// since the BOT item is always present in a pixel sequence).
    OffsetTable(Vec<u32>),
}

impl fmt::Display for DataToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataToken::PrimitiveValue(v) => write!(f, "PrimitiveValue({:?})", v.value_type()),
            DataToken::ItemValue(bytes) => write!(f, "ItemValue({} bytes)", bytes.len()),
            other => write!(f, "{other:?}"),
        }
    }
}
