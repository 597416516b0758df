//! A static registry mapping transfer syntax UIDs to their
//! [`rdcm_core::TransferSyntax`] properties.
//!
//! Grounded on the teacher's `transfer-syntax-registry` crate: a
//! lookup table keyed by UID, populated once at startup rather than
//! looked up by the plugin/`inventory` mechanism the teacher also
//! supports (that mechanism exists to let third-party crates register
//! codecs for transfer syntaxes this toolkit doesn't implement
//! natively; this toolkit's scope never needs it, so the table here is
//! simply the fixed list of transfer syntaxes the codec supports).

mod entries;

use once_cell::sync::Lazy;
use rdcm_core::TransferSyntax;
use std::collections::HashMap;

static REGISTRY: Lazy<HashMap<&'static str, TransferSyntax>> = Lazy::new(|| {
    entries::ALL
        .iter()
        .map(|ts| (ts.uid, *ts))
        .collect()
});

/// Look up a transfer syntax by UID, trimming the trailing padding a
/// UI value may carry on the wire.
pub fn get(uid: &str) -> Option<TransferSyntax> {
    REGISTRY.get(TransferSyntax::trim_uid(uid)).copied()
}

/// Every transfer syntax this registry knows about.
pub fn all() -> impl Iterator<Item = &'static TransferSyntax> {
    entries::ALL.iter()
}

/// The transfer syntax every DICOM implementation must support:
/// Implicit VR Little Endian.
pub fn default_transfer_syntax() -> TransferSyntax {
    entries::IMPLICIT_VR_LITTLE_ENDIAN
}
