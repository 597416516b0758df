//! The DICOM Value Representation ([`VR`]) enumeration and its
//! encoding properties, per PS3.5 §6.2.

use std::fmt;

/// A two-letter DICOM value representation code.
///
/// Each variant carries, via its methods, the encoding properties
/// spec'd in PS3.5: whether its length field is 16- or 32-bit in
/// explicit VR encoding, its padding character, and whether it is
/// textual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum VR {
    AE,
    AS,
    AT,
    CS,
    DA,
    DS,
    DT,
    FL,
    FD,
    IS,
    LO,
    LT,
    OB,
    OD,
    OF,
    OL,
    OV,
    OW,
    PN,
    SH,
    SL,
    SQ,
    SS,
    ST,
    SV,
    TM,
    UC,
    UI,
    UL,
    UN,
    UR,
    US,
    UT,
    UV,
}

impl VR {
    /// The two-letter textual code of this VR, e.g. `"CS"`.
    pub fn code(self) -> &'static str {
        use VR::*;
        match self {
            AE => "AE",
            AS => "AS",
            AT => "AT",
            CS => "CS",
            DA => "DA",
            DS => "DS",
            DT => "DT",
            FL => "FL",
            FD => "FD",
            IS => "IS",
            LO => "LO",
            LT => "LT",
            OB => "OB",
            OD => "OD",
            OF => "OF",
            OL => "OL",
            OV => "OV",
            OW => "OW",
            PN => "PN",
            SH => "SH",
            SL => "SL",
            SQ => "SQ",
            SS => "SS",
            ST => "ST",
            SV => "SV",
            TM => "TM",
            UC => "UC",
            UI => "UI",
            UL => "UL",
            UN => "UN",
            UR => "UR",
            US => "US",
            UT => "UT",
            UV => "UV",
        }
    }

    /// Parse a VR from its two-letter code, as read off the wire in
    /// explicit VR encoding.
    pub fn from_code(code: [u8; 2]) -> Option<VR> {
        use VR::*;
        Some(match &code {
            b"AE" => AE,
            b"AS" => AS,
            b"AT" => AT,
            b"CS" => CS,
            b"DA" => DA,
            b"DS" => DS,
            b"DT" => DT,
            b"FL" => FL,
            b"FD" => FD,
            b"IS" => IS,
            b"LO" => LO,
            b"LT" => LT,
            b"OB" => OB,
            b"OD" => OD,
            b"OF" => OF,
            b"OL" => OL,
            b"OV" => OV,
            b"OW" => OW,
            b"PN" => PN,
            b"SH" => SH,
            b"SL" => SL,
            b"SQ" => SQ,
            b"SS" => SS,
            b"ST" => ST,
            b"SV" => SV,
            b"TM" => TM,
            b"UC" => UC,
            b"UI" => UI,
            b"UL" => UL,
            b"UN" => UN,
            b"UR" => UR,
            b"US" => US,
            b"UT" => UT,
            b"UV" => UV,
            _ => return None,
        })
    }

    /// Whether this VR uses a 32-bit length field (and 2 reserved
    /// bytes after the VR code) in explicit VR encoding.
    ///
    /// Per PS3.5 §7.1.2, this applies to OB, OD, OF, OL, OV, SQ, SV,
    /// UC, UN, UR, UT and UV.
    pub fn has_32_bit_length(self) -> bool {
        matches!(
            self,
            VR::OB
                | VR::OD
                | VR::OF
                | VR::OL
                | VR::OV
                | VR::SQ
                | VR::SV
                | VR::UC
                | VR::UN
                | VR::UR
                | VR::UT
                | VR::UV
        )
    }

    /// Whether this VR may carry an undefined length
    /// (`0xFFFF_FFFF`) on the wire. Only SQ and the pixel-data VRs
    /// (OB, OW) do, the latter exclusively for encapsulated pixel
    /// sequences.
    pub fn allows_undefined_length(self) -> bool {
        matches!(self, VR::SQ | VR::OB | VR::OW)
    }

    /// The byte used to pad this VR's value to even length.
    /// String VRs pad with an ASCII space; UI pads with a null byte;
    /// every other VR is binary and inherently even-sized once its
    /// element count is chosen, but is reported as space-padded for
    /// uniformity.
    pub fn padding(self) -> u8 {
        if self == VR::UI {
            0x00
        } else {
            0x20
        }
    }

    /// Whether this is one of the string (character-based) VRs.
    pub fn is_string(self) -> bool {
        use VR::*;
        matches!(
            self,
            AE | AS | CS | DA | DS | DT | IS | LO | LT | PN | SH | ST | TM | UC | UI | UR | UT
        )
    }

    /// Whether the registry should treat this VR as multi-valued
    /// (backslash-separated) by default. Single-valued "Text" VRs
    /// (ST, LT, UT, UR) are never split.
    pub fn is_multi_valued(self) -> bool {
        use VR::*;
        matches!(
            self,
            AE | AS | CS | DA | DS | DT | IS | LO | PN | SH | TM | UC | UI
        )
    }
}

impl fmt::Display for VR {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_code() {
        for vr in [VR::OB, VR::SQ, VR::UN, VR::CS, VR::PN] {
            assert_eq!(VR::from_code(vr.code().as_bytes().try_into().unwrap()), Some(vr));
        }
    }

    #[test]
    fn long_length_vrs_match_spec() {
        assert!(VR::OB.has_32_bit_length());
        assert!(VR::SQ.has_32_bit_length());
        assert!(VR::UN.has_32_bit_length());
        assert!(!VR::CS.has_32_bit_length());
        assert!(!VR::US.has_32_bit_length());
    }

    #[test]
    fn padding_rule() {
        assert_eq!(VR::UI.padding(), 0x00);
        assert_eq!(VR::CS.padding(), 0x20);
        assert_eq!(VR::OB.padding(), 0x20);
    }
}
