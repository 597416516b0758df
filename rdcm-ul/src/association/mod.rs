//! DICOM association module
//!
//! This module contains utilities for establishing associations
//! between DICOM nodes via TCP/IP, and for exchanging PDUs
//! once an association has been accorded.

use snafu::Snafu;

use crate::pdu::Pdu;

pub mod client;
pub mod pdata;
pub mod scp;
pub mod server;
mod uid;

pub use client::{ClientAssociation, ClientAssociationOptions};
pub use server::{ServerAssociation, ServerAssociationOptions};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    /// failed to send PDU message
    Send { source: crate::pdu::WriteError },

    /// failed to receive PDU message
    Receive { source: crate::pdu::reader::Error },

    #[snafu(display("unexpected response `{:?}`", pdu))]
    #[non_exhaustive]
    UnexpectedResponse {
        /// the PDU obtained from the other node
        pdu: Pdu,
    },

    #[snafu(display("unknown response `{:?}`", pdu))]
    #[non_exhaustive]
    UnknownResponse {
        /// the PDU obtained from the other node, of variant Unknown
        pdu: Pdu,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A service class user or a provider.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub enum ServiceClassRole {
    /// Service Class User
    Scu,
    /// Service Class Provider
    Scp,
}

/// A presentation context accorded as part of an association negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedPresentationContext {
    /// The identifier of the accorded presentation context
    pub id: u8,
    /// The accorded abstract syntax UID
    pub abstract_syntax_uid: String,
    /// The accorded transfer syntax UID
    pub transfer_syntax_uid: String,
}
