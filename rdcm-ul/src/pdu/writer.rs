//! Encoding of [`Pdu`] values to their PS3.8 wire representation.

use crate::pdu::*;
use byteordered::byteorder::{BigEndian, WriteBytesExt};
use snafu::{Backtrace, ResultExt, Snafu};
use std::io::Write;

pub type Error = crate::pdu::WriteError;

pub type Result<T> = std::result::Result<T, WriteError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum WriteChunkError {
    #[snafu(display("failed to build chunk"))]
    BuildChunk {
        #[snafu(backtrace)]
        source: Box<WriteError>,
    },
    #[snafu(display("failed to write chunk length"))]
    WriteLength {
        backtrace: Backtrace,
        source: std::io::Error,
    },
    #[snafu(display("failed to write chunk data"))]
    WriteData {
        backtrace: Backtrace,
        source: std::io::Error,
    },
}

/// Build a sub-structure with `func`, then emit it behind a 4-byte
/// big-endian length prefix. Most top-level PDUs are one such chunk:
/// PDU-type and reserved byte, then the length-prefixed body.
fn length_prefixed_u32<F>(writer: &mut dyn Write, func: F) -> std::result::Result<(), WriteChunkError>
where
    F: FnOnce(&mut Vec<u8>) -> Result<()>,
{
    let mut body = Vec::new();
    func(&mut body).map_err(Box::from).context(BuildChunkSnafu)?;
    writer
        .write_u32::<BigEndian>(body.len() as u32)
        .context(WriteLengthSnafu)?;
    writer.write_all(&body).context(WriteDataSnafu)
}

/// Same as [`length_prefixed_u32`], for the variable items nested inside
/// a PDU (application context, presentation context, user-data items).
fn length_prefixed_u16<F>(writer: &mut dyn Write, func: F) -> std::result::Result<(), WriteChunkError>
where
    F: FnOnce(&mut Vec<u8>) -> Result<()>,
{
    let mut body = Vec::new();
    func(&mut body).map_err(Box::from).context(BuildChunkSnafu)?;
    writer
        .write_u16::<BigEndian>(body.len() as u16)
        .context(WriteLengthSnafu)?;
    writer.write_all(&body).context(WriteDataSnafu)
}

fn write_pdu_type_and_reserved(writer: &mut dyn Write, pdu_type: u8) -> Result<()> {
    writer.write_u8(pdu_type).context(WriteFieldSnafu { field: "PDU-type" })?;
    writer.write_u8(0x00).context(WriteReservedSnafu { bytes: 1_u32 })
}

fn write_padded_ae_title(writer: &mut dyn Write, ae_title: &str, field: &'static str) -> Result<()> {
    let mut bytes = ae_title.as_bytes().to_vec();
    bytes.resize(16, b' ');
    writer.write_all(&bytes).context(WriteFieldSnafu { field })
}

pub fn write_pdu<W>(writer: &mut W, pdu: &Pdu) -> Result<()>
where
    W: Write,
{
    match pdu {
        Pdu::AssociationRQ(pdu) => write_association_rq(writer, pdu),
        Pdu::AssociationAC(pdu) => write_association_ac(writer, pdu),
        Pdu::AssociationRJ(pdu) => write_association_rj(writer, pdu),
        Pdu::PData { data } => write_pdata(writer, data),
        Pdu::ReleaseRQ => write_empty_pdu(writer, 0x05, "ReleaseRQ"),
        Pdu::ReleaseRP => write_empty_pdu(writer, 0x06, "ReleaseRP"),
        Pdu::AbortRQ { source } => write_abort_rq(writer, source),
        Pdu::Unknown { pdu_type, data } => write_unknown(writer, *pdu_type, data),
    }
}

/// A-ASSOCIATE-RQ: protocol version, the two AE titles, then the
/// application context, presentation contexts and user information
/// variable items (PS3.8 Section 9.3.2).
fn write_association_rq(writer: &mut dyn Write, pdu: &AssociationRQ) -> Result<()> {
    let AssociationRQ {
        protocol_version,
        calling_ae_title,
        called_ae_title,
        application_context_name,
        presentation_contexts,
        user_variables,
    } = pdu;

    write_pdu_type_and_reserved(writer, 0x01)?;

    length_prefixed_u32(writer, |writer| {
        writer
            .write_u16::<BigEndian>(*protocol_version)
            .context(WriteFieldSnafu { field: "Protocol-version" })?;
        writer
            .write_u16::<BigEndian>(0x00)
            .context(WriteReservedSnafu { bytes: 2_u32 })?;

        write_padded_ae_title(writer, called_ae_title, "Called-AE-title")?;
        write_padded_ae_title(writer, calling_ae_title, "Calling-AE-title")?;

        writer.write_all(&[0; 32]).context(WriteReservedSnafu { bytes: 32_u32 })?;

        write_pdu_variable_application_context_name(writer, application_context_name)?;
        for pc in presentation_contexts {
            write_pdu_variable_presentation_context_proposed(writer, pc)?;
        }
        write_pdu_variable_user_variables(writer, user_variables)?;

        Ok(())
    })
    .context(WriteChunkSnafu { name: "A-ASSOCIATE-RQ" })?;

    Ok(())
}

/// A-ASSOCIATE-AC: same layout as the request, but the AE title fields
/// only echo back what the requestor sent and are not meaningful on
/// their own (PS3.8 Section 9.3.3).
fn write_association_ac(writer: &mut dyn Write, pdu: &AssociationAC) -> Result<()> {
    let AssociationAC {
        protocol_version,
        application_context_name,
        called_ae_title,
        calling_ae_title,
        presentation_contexts,
        user_variables,
    } = pdu;

    write_pdu_type_and_reserved(writer, 0x02)?;

    length_prefixed_u32(writer, |writer| {
        writer
            .write_u16::<BigEndian>(*protocol_version)
            .context(WriteFieldSnafu { field: "Protocol-version" })?;
        writer
            .write_u16::<BigEndian>(0x00)
            .context(WriteReservedSnafu { bytes: 2_u32 })?;

        write_padded_ae_title(writer, called_ae_title, "Called-AE-title")?;
        write_padded_ae_title(writer, calling_ae_title, "Calling-AE-title")?;

        writer.write_all(&[0; 32]).context(WriteReservedSnafu { bytes: 32_u32 })?;

        write_pdu_variable_application_context_name(writer, application_context_name)?;
        for pc in presentation_contexts {
            write_pdu_variable_presentation_context_result(writer, pc)?;
        }
        write_pdu_variable_user_variables(writer, user_variables)?;

        Ok(())
    })
    .context(WriteChunkSnafu { name: "A-ASSOCIATE-AC" })
}

fn association_rj_service_user_reason_code(reason: &AssociationRJServiceUserReason) -> u8 {
    match reason {
        AssociationRJServiceUserReason::NoReasonGiven => 0x01,
        AssociationRJServiceUserReason::ApplicationContextNameNotSupported => 0x02,
        AssociationRJServiceUserReason::CallingAETitleNotRecognized => 0x03,
        AssociationRJServiceUserReason::CalledAETitleNotRecognized => 0x07,
        AssociationRJServiceUserReason::Reserved(data) => *data,
    }
}

fn association_rj_asce_reason_code(reason: &AssociationRJServiceProviderASCEReason) -> u8 {
    match reason {
        AssociationRJServiceProviderASCEReason::NoReasonGiven => 0x01,
        AssociationRJServiceProviderASCEReason::ProtocolVersionNotSupported => 0x02,
    }
}

fn association_rj_presentation_reason_code(reason: &AssociationRJServiceProviderPresentationReason) -> u8 {
    match reason {
        AssociationRJServiceProviderPresentationReason::TemporaryCongestion => 0x01,
        AssociationRJServiceProviderPresentationReason::LocalLimitExceeded => 0x02,
        AssociationRJServiceProviderPresentationReason::Reserved(data) => *data,
    }
}

/// A-ASSOCIATE-RJ: a result code (permanent/transient) followed by a
/// source and a source-specific reason code (PS3.8 Section 9.3.4).
fn write_association_rj(writer: &mut dyn Write, pdu: &AssociationRJ) -> Result<()> {
    let AssociationRJ { result, source } = pdu;

    write_pdu_type_and_reserved(writer, 0x03)?;

    length_prefixed_u32(writer, |writer| {
        writer.write_u8(0x00).context(WriteReservedSnafu { bytes: 1_u32 })?;

        writer
            .write_u8(match result {
                AssociationRJResult::Permanent => 0x01,
                AssociationRJResult::Transient => 0x02,
            })
            .context(WriteFieldSnafu { field: "AssociationRJResult" })?;

        match source {
            AssociationRJSource::ServiceUser(reason) => {
                writer.write_u8(0x01).context(WriteFieldSnafu { field: "AssociationRJSource" })?;
                writer
                    .write_u8(association_rj_service_user_reason_code(reason))
                    .context(WriteFieldSnafu { field: "AssociationRJReason" })?;
            }
            AssociationRJSource::ServiceProviderASCE(reason) => {
                writer.write_u8(0x02).context(WriteFieldSnafu { field: "AssociationRJSource" })?;
                writer
                    .write_u8(association_rj_asce_reason_code(reason))
                    .context(WriteFieldSnafu { field: "AssociationRJReason" })?;
            }
            AssociationRJSource::ServiceProviderPresentation(reason) => {
                writer.write_u8(0x03).context(WriteFieldSnafu { field: "AssociationRJSource" })?;
                writer
                    .write_u8(association_rj_presentation_reason_code(reason))
                    .context(WriteFieldSnafu { field: "AssociationRJReason" })?;
            }
        }

        Ok(())
    })
    .context(WriteChunkSnafu { name: "AssociationRJ" })?;

    Ok(())
}

/// P-DATA-TF: one or more Presentation-Data-Value items, each a
/// presentation-context-id byte, a message-control-header byte (bit 0
/// command-vs-data, bit 1 last-fragment) and the fragment payload
/// (PS3.8 Section 9.3.5, Annex E).
fn write_pdata(writer: &mut dyn Write, values: &[PDataValue]) -> Result<()> {
    write_pdu_type_and_reserved(writer, 0x04)?;

    length_prefixed_u32(writer, |writer| {
        for value in values {
            length_prefixed_u32(writer, |writer| {
                writer.push(value.presentation_context_id);

                let mut control_header = 0x00;
                if let PDataValueType::Command = value.value_type {
                    control_header |= 0x01;
                }
                if value.is_last {
                    control_header |= 0x02;
                }
                writer.push(control_header);

                writer.extend(&value.data);
                Ok(())
            })
            .context(WriteChunkSnafu { name: "Presentation-data-value item" })?;
        }
        Ok(())
    })
    .context(WriteChunkSnafu { name: "PData" })
}

/// A-RELEASE-RQ/RP both carry an empty, reserved 4-byte body.
fn write_empty_pdu(writer: &mut dyn Write, pdu_type: u8, name: &'static str) -> Result<()> {
    write_pdu_type_and_reserved(writer, pdu_type)?;
    length_prefixed_u32(writer, |writer| {
        writer.extend([0u8; 4]);
        Ok(())
    })
    .context(WriteChunkSnafu { name })?;
    Ok(())
}

fn abort_rq_source_and_reason(source: &AbortRQSource) -> [u8; 2] {
    match source {
        AbortRQSource::ServiceUser => [0x00, 0x00],
        AbortRQSource::Reserved => [0x01, 0x00],
        AbortRQSource::ServiceProvider(reason) => match reason {
            AbortRQServiceProviderReason::ReasonNotSpecified => [0x02, 0x00],
            AbortRQServiceProviderReason::UnrecognizedPdu => [0x02, 0x01],
            AbortRQServiceProviderReason::UnexpectedPdu => [0x02, 0x02],
            AbortRQServiceProviderReason::Reserved => [0x02, 0x03],
            AbortRQServiceProviderReason::UnrecognizedPduParameter => [0x02, 0x04],
            AbortRQServiceProviderReason::UnexpectedPduParameter => [0x02, 0x05],
            AbortRQServiceProviderReason::InvalidPduParameter => [0x02, 0x06],
        },
    }
}

/// A-ABORT: two reserved bytes, then a source byte and a source-specific
/// reason byte (PS3.8 Section 9.3.8).
fn write_abort_rq(writer: &mut dyn Write, source: &AbortRQSource) -> Result<()> {
    write_pdu_type_and_reserved(writer, 0x07)?;

    length_prefixed_u32(writer, |writer| {
        writer.push(0);
        writer.push(0);
        writer.extend(abort_rq_source_and_reason(source));
        Ok(())
    })
    .context(WriteChunkSnafu { name: "AbortRQ" })?;

    Ok(())
}

/// An unrecognized PDU type: pass its body through untouched so that a
/// peer speaking a PDU kind this crate doesn't model can still be
/// round-tripped by an intermediary.
fn write_unknown(writer: &mut dyn Write, pdu_type: u8, data: &[u8]) -> Result<()> {
    write_pdu_type_and_reserved(writer, pdu_type)?;
    length_prefixed_u32(writer, |writer| {
        writer.extend(data);
        Ok(())
    })
    .context(WriteChunkSnafu { name: "Unknown" })?;
    Ok(())
}

fn write_pdu_variable_application_context_name(
    writer: &mut dyn Write,
    application_context_name: &str,
) -> Result<()> {
    // Application Context Item: item-type 10H, then the name (an
    // Application-context-name UID, PS3.8 Section 7.1.1.2).
    writer.write_u8(0x10).context(WriteFieldSnafu { field: "Item-type" })?;
    writer.write_u8(0x00).context(WriteReservedSnafu { bytes: 1_u32 })?;

    length_prefixed_u16(writer, |writer| {
        writer
            .write_all(application_context_name.as_bytes())
            .context(WriteFieldSnafu { field: "Application-context-name" })
    })
    .context(WriteChunkSnafu { name: "Application Context Item" })?;

    Ok(())
}

fn write_pdu_variable_presentation_context_proposed(
    writer: &mut dyn Write,
    presentation_context: &PresentationContextProposed,
) -> Result<()> {
    // Presentation Context Item (item-type 20H): a context ID, then one
    // Abstract Syntax sub-item (30H) and one or more Transfer Syntax
    // sub-items (40H), per PS3.8 Section 9.3.2.2.
    writer.write_u8(0x20).context(WriteFieldSnafu { field: "Item-type" })?;
    writer.write_u8(0x00).context(WriteReservedSnafu { bytes: 1_u32 })?;

    length_prefixed_u16(writer, |writer| {
        writer
            .write_u8(presentation_context.id)
            .context(WriteFieldSnafu { field: "Presentation-context-ID" })?;
        writer.write_all(&[0, 0, 0]).context(WriteReservedSnafu { bytes: 3_u32 })?;

        writer.write_u8(0x30).context(WriteFieldSnafu { field: "Item-type" })?;
        writer.write_u8(0x00).context(WriteReservedSnafu { bytes: 1_u32 })?;
        length_prefixed_u16(writer, |writer| {
            writer
                .write_all(presentation_context.abstract_syntax.as_bytes())
                .context(WriteFieldSnafu { field: "Abstract-syntax-name" })
        })
        .context(WriteChunkSnafu { name: "Abstract Syntax Item" })?;

        for transfer_syntax in &presentation_context.transfer_syntaxes {
            writer
                .write_u8(0x40)
                .context(WriteFieldSnafu { field: "Transfer-syntax Item-type" })?;
            writer.write_u8(0x00).context(WriteReservedSnafu { bytes: 1_u32 })?;
            length_prefixed_u16(writer, |writer| {
                writer
                    .write_all(transfer_syntax.as_bytes())
                    .context(WriteFieldSnafu { field: "Transfer-syntax-name" })
            })
            .context(WriteChunkSnafu { name: "Transfer Syntax Sub-Item" })?;
        }

        Ok(())
    })
    .context(WriteChunkSnafu { name: "Presentation Context Item" })?;

    Ok(())
}

fn write_pdu_variable_presentation_context_result(
    writer: &mut dyn Write,
    presentation_context: &PresentationContextResult,
) -> Result<()> {
    // Presentation Context Item (item-type 21H): the negotiated context
    // ID, the acceptance/rejection reason, and (when accepted) the one
    // agreed Transfer Syntax sub-item (PS3.8 Section 9.3.3.2).
    writer.write_u8(0x21).context(WriteFieldSnafu { field: "Item-type" })?;
    writer.write_u8(0x00).context(WriteReservedSnafu { bytes: 1_u32 })?;

    length_prefixed_u16(writer, |writer| {
        writer
            .write_u8(presentation_context.id)
            .context(WriteFieldSnafu { field: "Presentation-context-ID" })?;
        writer.write_u8(0x00).context(WriteReservedSnafu { bytes: 1_u32 })?;

        writer
            .write_u8(match &presentation_context.reason {
                PresentationContextResultReason::Acceptance => 0,
                PresentationContextResultReason::UserRejection => 1,
                PresentationContextResultReason::NoReason => 2,
                PresentationContextResultReason::AbstractSyntaxNotSupported => 3,
                PresentationContextResultReason::TransferSyntaxesNotSupported => 4,
            })
            .context(WriteFieldSnafu { field: "Result-reason" })?;
        writer.write_u8(0x00).context(WriteReservedSnafu { bytes: 1_u32 })?;

        writer.write_u8(0x40).context(WriteFieldSnafu { field: "Item-type" })?;
        writer.write_u8(0x00).context(WriteReservedSnafu { bytes: 1_u32 })?;
        length_prefixed_u16(writer, |writer| {
            writer
                .write_all(presentation_context.transfer_syntax.as_bytes())
                .context(WriteFieldSnafu { field: "Transfer-syntax-name" })
        })
        .context(WriteChunkSnafu { name: "Transfer Syntax sub-item" })?;

        Ok(())
    })
    .context(WriteChunkSnafu { name: "Presentation-context" })
}

fn write_user_variable_item(writer: &mut dyn Write, item: &UserVariableItem) -> Result<()> {
    match item {
        UserVariableItem::MaxLength(max_length) => {
            writer.write_u8(0x51).context(WriteFieldSnafu { field: "Item-type" })?;
            writer.write_u8(0x00).context(WriteReservedSnafu { bytes: 1_u32 })?;
            length_prefixed_u16(writer, |writer| {
                writer
                    .write_u32::<BigEndian>(*max_length)
                    .context(WriteFieldSnafu { field: "Maximum-length-received" })
            })
            .context(WriteChunkSnafu { name: "Maximum-length-received" })
        }
        UserVariableItem::ImplementationVersionName(name) => {
            writer.write_u8(0x55).context(WriteFieldSnafu { field: "Item-type" })?;
            writer.write_u8(0x00).context(WriteReservedSnafu { bytes: 1_u32 })?;
            length_prefixed_u16(writer, |writer| {
                writer
                    .write_all(name.as_bytes())
                    .context(WriteFieldSnafu { field: "Implementation-version-name" })
            })
            .context(WriteChunkSnafu { name: "Implementation-version-name" })
        }
        UserVariableItem::ImplementationClassUID(uid) => {
            writer.write_u8(0x52).context(WriteFieldSnafu { field: "Item-type" })?;
            writer.write_u8(0x00).context(WriteReservedSnafu { bytes: 1_u32 })?;
            length_prefixed_u16(writer, |writer| {
                writer
                    .write_all(uid.as_bytes())
                    .context(WriteFieldSnafu { field: "Implementation-class-uid" })
            })
            .context(WriteChunkSnafu { name: "Implementation-class-uid" })
        }
        UserVariableItem::SopClassExtendedNegotiationSubItem(sop_class_uid, data) => {
            writer.write_u8(0x56).context(WriteFieldSnafu { field: "Item-type" })?;
            writer.write_u8(0x00).context(WriteReservedSnafu { bytes: 1_u32 })?;
            length_prefixed_u16(writer, |writer| {
                length_prefixed_u16(writer, |writer| {
                    writer
                        .write_all(sop_class_uid.as_bytes())
                        .context(WriteFieldSnafu { field: "SOP-class-uid" })
                })
                .context(WriteChunkSnafu { name: "SOP-class-uid" })?;
                length_prefixed_u16(writer, |writer| {
                    writer
                        .write_all(data)
                        .context(WriteFieldSnafu { field: "Service-class-application-information" })
                })
                .context(WriteChunkSnafu { name: "Service-class-application-information" })
            })
            .context(WriteChunkSnafu { name: "Sub-item" })
        }
        UserVariableItem::UserIdentityItem(user_identity) => {
            writer.write_u8(0x58).context(WriteFieldSnafu { field: "Item-type" })?;
            writer.write_u8(0x00).context(WriteReservedSnafu { bytes: 1_u32 })?;
            length_prefixed_u16(writer, |writer| {
                writer
                    .write_u8(user_identity.identity_type().to_u8())
                    .context(WriteFieldSnafu { field: "User-Identity-Type" })?;
                writer
                    .write_u8(u8::from(user_identity.positive_response_requested()))
                    .context(WriteFieldSnafu { field: "Positive-response-requested" })?;
                length_prefixed_u16(writer, |writer| {
                    writer
                        .write_all(user_identity.primary_field().as_slice())
                        .context(WriteFieldSnafu { field: "Primary-field" })
                })
                .context(WriteChunkSnafu { name: "Primary-field" })?;
                length_prefixed_u16(writer, |writer| {
                    writer
                        .write_all(user_identity.secondary_field().as_slice())
                        .context(WriteFieldSnafu { field: "Secondary-field" })
                })
                .context(WriteChunkSnafu { name: "Secondary-field" })
            })
            .context(WriteChunkSnafu { name: "Item-length" })
        }
        UserVariableItem::Unknown(item_type, data) => {
            writer.write_u8(*item_type).context(WriteFieldSnafu { field: "Item-type" })?;
            writer.write_u8(0x00).context(WriteReservedSnafu { bytes: 1_u32 })?;
            length_prefixed_u16(writer, |writer| {
                writer.write_all(data).context(WriteFieldSnafu { field: "Unknown Data" })
            })
            .context(WriteChunkSnafu { name: "Unknown" })
        }
    }
}

fn write_pdu_variable_user_variables(
    writer: &mut dyn Write,
    user_variables: &[UserVariableItem],
) -> Result<()> {
    if user_variables.is_empty() {
        return Ok(());
    }

    // User Information Item (item-type 50H) wraps every user-data
    // sub-item (PS3.8 Annex D).
    writer.write_u8(0x50).context(WriteFieldSnafu { field: "Item-type" })?;
    writer.write_u8(0x00).context(WriteReservedSnafu { bytes: 1_u32 })?;

    length_prefixed_u16(writer, |writer| {
        for item in user_variables {
            write_user_variable_item(writer, item)?;
        }
        Ok(())
    })
    .context(WriteChunkSnafu { name: "User-data" })
}
