//! Parsing of query text terms into DICOM query identifier elements.

use std::str::FromStr;

use rdcm_core::{Tag, VR};
use rdcm_dictionary_std::{entry_by_alias, entry_by_tag};
use rdcm_object::InMemDicomObject;
use snafu::{whatever, OptionExt, ResultExt, Whatever};

#[derive(Debug, Clone, Eq, Hash, PartialEq)]
struct TermQuery {
    field: Tag,
    match_value: String,
}

/// Term queries can be parsed with the syntax `«tag»=«value»`,
/// where `«tag»` is either a DICOM tag group-element pair
/// or the respective attribute keyword,
/// and `=«value»` is optional.
impl FromStr for TermQuery {
    type Err = Whatever;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('=');

        let tag_part = parts.next().whatever_context("empty query")?;
        let value_part = parts.next().unwrap_or_default();

        let field: Tag = tag_part.parse().or_else(|_| {
            entry_by_alias(tag_part)
                .map(|e| e.tag)
                .whatever_context("could not resolve query field name")
        })?;

        Ok(TermQuery {
            field,
            match_value: value_part.to_owned(),
        })
    }
}

/// Build a query identifier data set out of `base` (typically an empty
/// object, or one read from a template file) and the given query terms.
pub fn parse_queries(
    mut base: InMemDicomObject,
    qs: &[impl AsRef<str>],
) -> Result<InMemDicomObject, Whatever> {
    for q in qs {
        let term_query: TermQuery = q.as_ref().parse()?;
        let vr = entry_by_tag(term_query.field)
            .map(|e| e.vr)
            .unwrap_or(VR::LO);
        put_term(&mut base, term_query.field, vr, &term_query.match_value)?;
    }
    Ok(base)
}

fn put_term(obj: &mut InMemDicomObject, tag: Tag, vr: VR, txt_value: &str) -> Result<(), Whatever> {
    match vr {
        VR::AE
        | VR::AS
        | VR::CS
        | VR::DA
        | VR::DS
        | VR::IS
        | VR::LO
        | VR::LT
        | VR::SH
        | VR::PN
        | VR::ST
        | VR::TM
        | VR::UI
        | VR::UC
        | VR::UR
        | VR::UT
        | VR::DT => {
            obj.put_str(tag, vr, txt_value.to_owned());
        }
        VR::US => {
            let us: u16 = txt_value.parse().whatever_context("failed to parse value as US")?;
            obj.put_primitive(tag, vr, us.into());
        }
        VR::UL => {
            let ul: u32 = txt_value.parse().whatever_context("failed to parse value as UL")?;
            obj.put_primitive(tag, vr, ul.into());
        }
        VR::SL => {
            let sl: i32 = txt_value.parse().whatever_context("failed to parse value as SL")?;
            obj.put_primitive(tag, vr, sl.into());
        }
        _ => whatever!("unsupported VR {:?} for a query term", vr),
    }
    Ok(())
}
