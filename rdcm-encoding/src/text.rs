//! Text decoding/encoding helpers shared by the string VRs.
//!
//! This toolkit only claims ISO-IR 6 (plain ASCII/UTF-8) as its
//! Specific Character Set; a value containing bytes outside that set
//! is decoded losslessly via [`String::from_utf8_lossy`] rather than
//! rejected, so a single non-conformant attribute cannot abort an
//! otherwise well-formed data set.

use rdcm_core::value::C;

/// Decode a single-valued text VR's body (ST, LT, UT, UR): trailing
/// whitespace is trimmed, but no `\` splitting happens.
pub fn decode_single(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches([' ', '\0'])
        .to_string()
}

/// Decode a multi-valued text VR's body, splitting on the `\` value
/// delimiter and trimming each component's surrounding padding.
pub fn decode_multi(bytes: &[u8]) -> C<String> {
    String::from_utf8_lossy(bytes)
        .split('\\')
        .map(|s| s.trim_matches([' ', '\0']).to_string())
        .collect()
}

/// Join multi-valued text components back into a single `\`-delimited
/// wire value. Padding to even length is the caller's responsibility.
pub fn encode_multi(values: &[String]) -> String {
    values.join("\\")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_space_padding_on_single_value() {
        assert_eq!(decode_single(b"free text  "), "free text");
    }

    #[test]
    fn splits_and_trims_multi_value() {
        let values = decode_multi(b"DERIVED \\SECONDARY");
        assert_eq!(&values[..], &["DERIVED".to_string(), "SECONDARY".to_string()]);
    }

    #[test]
    fn lossy_decodes_invalid_utf8() {
        let decoded = decode_single(&[0xFF, 0xFE]);
        assert!(decoded.chars().all(|c| c == '\u{FFFD}'));
    }
}
