//! # rdcm
//!
//! This crate is the parent of the `rdcm-*` library crates in this
//! workspace: a pure Rust DICOM dataset codec and DIMSE association
//! engine. Each module re-exports the crate of the same name, so code
//! that wants a single dependency instead of the individual `rdcm-*`
//! crates can depend on this one.
//!
//! ## Basic
//!
//! - For an idiomatic API to reading and writing DICOM data
//!   from files or other sources, see the [`object`] module.
//! - To print human readable summaries of a DICOM object, see the
//!   [`dump`] module.
//! - The [`core`] module contains most of the data types
//!   that the other modules rely on, including types for DICOM tags
//!   ([`Tag`](core::Tag)), value representations ([`VR`](core::VR)),
//!   and in-memory representations of DICOM values, contained in
//!   data elements.
//! - The DICOM standard data dictionary is in [`dictionary_std`],
//!   which provides a singleton standard DICOM tag index that can be
//!   queried at run time, as well as constants for known tags and
//!   UIDs.
//! - [`transfer_syntax`] is a re-export of the transfer syntax
//!   registry crate, giving access to the global registry of known
//!   transfer syntaxes.
//!
//! ## Advanced
//!
//! - To write DICOM network application entity software, see the
//!   [`ul`] module for PDU reading/writing and a DICOM association
//!   API, enabled by the `ul` feature (on by default).
//! - If you are writing or declaring your own transfer syntax, take
//!   the [`encoding`] module and build your own
//!   [`TransferSyntax`](encoding::TransferSyntax) implementation.
//! - [`parser`] contains the mid-level abstractions for reading and
//!   writing DICOM data sets. It is only needed when the [`object`]
//!   API is unfit or too inefficient for a certain task.

pub use rdcm_core as core;
pub use rdcm_dictionary_std as dictionary_std;
pub use rdcm_dump as dump;
pub use rdcm_encoding as encoding;
pub use rdcm_object as object;
pub use rdcm_parser as parser;
pub use rdcm_transfer_syntax_registry as transfer_syntax;
#[cfg(feature = "ul")]
pub use rdcm_ul as ul;
