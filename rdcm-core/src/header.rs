//! The data element header ([`DataElementHeader`]) and the owning
//! container types built on top of it, independent of encoding.

use crate::tag::Tag;
use crate::value::Value;
use crate::vr::VR;
use crate::Length;

/// A trait for a data type containing a DICOM element header: a tag
/// and a value length.
#[allow(clippy::len_without_is_empty)]
pub trait Header {
    /// The element's tag.
    fn tag(&self) -> Tag;

    /// The value's length, as read off the wire. May be
    /// [`Length::UNDEFINED`] for sequences and encapsulated pixel data.
    fn length(&self) -> Length;

    /// Whether this is the header of a sequence/pixel-sequence item.
    fn is_item(&self) -> bool {
        self.tag() == Tag::ITEM
    }

    /// Whether this is an item delimitation item.
    fn is_item_delimiter(&self) -> bool {
        self.tag() == Tag::ITEM_DELIMITATION
    }

    /// Whether this is a sequence delimitation item.
    fn is_sequence_delimiter(&self) -> bool {
        self.tag() == Tag::SEQUENCE_DELIMITATION
    }
}

/// A trait for anything whose serialized length can be reported,
/// whether it is a bare header or a fully decoded value.
pub trait HasLength {
    /// The length, in bytes, this value occupies on the wire
    /// (excluding its own header).
    fn length(&self) -> Length;

    /// Whether the length is known without reading a delimiter.
    fn is_length_defined(&self) -> bool {
        self.length().is_defined()
    }
}

/// The header of a single data element: its tag, value
/// representation and value length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataElementHeader {
    /// The element's tag.
    pub tag: Tag,
    /// The element's value representation.
    pub vr: VR,
    /// The recorded length of the value that follows.
    pub len: Length,
}

impl DataElementHeader {
    /// Construct a new header from its three parts.
    pub fn new<T: Into<Tag>>(tag: T, vr: VR, len: Length) -> Self {
        DataElementHeader {
            tag: tag.into(),
            vr,
            len,
        }
    }
}

impl Header for DataElementHeader {
    fn tag(&self) -> Tag {
        self.tag
    }

    fn length(&self) -> Length {
        self.len
    }
}

impl HasLength for DataElementHeader {
    fn length(&self) -> Length {
        self.len
    }
}

/// An owned data element: a header paired with its decoded value.
///
/// `I` is the representation of nested items when the value is a
/// [`Value::Sequence`]; callers working purely with a dataset's flat
/// token stream never need to name it.
#[derive(Debug, Clone, PartialEq)]
pub struct DataElement<I> {
    header: DataElementHeader,
    value: Value<I>,
}

impl<I> DataElement<I> {
    /// Construct a new element from a header and value. The header's
    /// recorded length is not re-validated against the value here;
    /// callers that build elements by hand (rather than decoding them)
    /// are responsible for keeping the two consistent, or for calling
    /// [`DataElement::with_recomputed_length`].
    pub fn new(header: DataElementHeader, value: Value<I>) -> Self {
        DataElement { header, value }
    }

    /// The element's value.
    pub fn value(&self) -> &Value<I> {
        &self.value
    }

    /// The element's value representation.
    pub fn vr(&self) -> VR {
        self.header.vr
    }

    /// Replace the header's recorded length with the one computed
    /// from the current value, as required after mutating a value
    /// in place (the stale-length class of bug this type exists to
    /// prevent).
    pub fn with_recomputed_length(mut self) -> Self {
        self.header.len = self.value.length();
        self
    }
}

impl<I> Header for DataElement<I> {
    fn tag(&self) -> Tag {
        self.header.tag
    }

    fn length(&self) -> Length {
        self.header.len
    }
}

impl<I> HasLength for DataElement<I> {
    fn length(&self) -> Length {
        self.header.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::PrimitiveValue;

    #[test]
    fn header_reports_special_tags() {
        let h = DataElementHeader::new(Tag::ITEM, VR::UN, Length(0));
        assert!(h.is_item());
        assert!(!h.is_sequence_delimiter());
    }

    #[test]
    fn recompute_length_follows_value() {
        let header = DataElementHeader::new(Tag(0x0010, 0x0010), VR::PN, Length(0));
        let el: DataElement<()> =
            DataElement::new(header, Value::from(PrimitiveValue::from("DOE^JANE")))
                .with_recomputed_length();
        assert_eq!(el.length(), Length(8));
    }
}
