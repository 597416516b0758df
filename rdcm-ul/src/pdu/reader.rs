/// PDU reader module
use crate::pdu::*;
use byteordered::byteorder::{BigEndian, ReadBytesExt};
use snafu::{ensure, Backtrace, OptionExt, ResultExt, Snafu};
use std::io::{Cursor, ErrorKind, Read, Seek, SeekFrom};
use tracing::warn;

/// The default maximum PDU size
pub const DEFAULT_MAX_PDU: u32 = 16_384;

/// The minimum PDU size,
/// as specified by the standard
pub const MINIMUM_PDU_SIZE: u32 = 4_096;

/// The maximum PDU size,
/// as specified by the standard
pub const MAXIMUM_PDU_SIZE: u32 = 131_072;

/// The length of the PDU header in bytes,
/// comprising the PDU type (1 byte),
/// reserved byte (1 byte),
/// and PDU length (4 bytes).
pub const PDU_HEADER_SIZE: u32 = 6;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Invalid max PDU length {}", max_pdu_length))]
    InvalidMaxPdu {
        max_pdu_length: u32,
        backtrace: Backtrace,
    },

    #[snafu(display("No PDU available"))]
    NoPduAvailable { backtrace: Backtrace },

    #[snafu(display("Could not read PDU"))]
    ReadPdu {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Could not read PDU item"))]
    ReadPduItem {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Could not read PDU field `{}`", field))]
    ReadPduField {
        field: &'static str,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid item length {} (must be >=2)", length))]
    InvalidItemLength { length: u32 },

    #[snafu(display("Could not read {} reserved bytes", bytes))]
    ReadReserved {
        bytes: u32,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display(
        "Incoming pdu was too large: length {}, maximum is {}",
        pdu_length,
        max_pdu_length
    ))]
    PduTooLarge {
        pdu_length: u32,
        max_pdu_length: u32,
        backtrace: Backtrace,
    },
    #[snafu(display("PDU contained an invalid value {:?}", var_item))]
    InvalidPduVariable {
        var_item: PduVariableItem,
        backtrace: Backtrace,
    },
    #[snafu(display("Multiple transfer syntaxes were accepted"))]
    MultipleTransferSyntaxesAccepted { backtrace: Backtrace },
    #[snafu(display("Invalid reject source or reason"))]
    InvalidRejectSourceOrReason { backtrace: Backtrace },
    #[snafu(display("Invalid abort service provider"))]
    InvalidAbortSourceOrReason { backtrace: Backtrace },
    #[snafu(display("Invalid presentation context result reason"))]
    InvalidPresentationContextResultReason { backtrace: Backtrace },
    #[snafu(display("invalid transfer syntax sub-item"))]
    InvalidTransferSyntaxSubItem { backtrace: Backtrace },
    #[snafu(display("unknown presentation context sub-item"))]
    UnknownPresentationContextSubItem { backtrace: Backtrace },
    #[snafu(display("Missing application context name"))]
    MissingApplicationContextName { backtrace: Backtrace },
    #[snafu(display("Missing abstract syntax"))]
    MissingAbstractSyntax { backtrace: Backtrace },
    #[snafu(display("Missing transfer syntax"))]
    MissingTransferSyntax { backtrace: Backtrace },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Read one PDU from `reader`, capped at `max_pdu_length` bytes of payload.
///
/// With `strict` set, a PDU whose declared length exceeds `max_pdu_length`
/// is a hard error; otherwise it is tolerated up to [`MAXIMUM_PDU_SIZE`] and
/// logged, matching how some peers advertise a conservative maximum but
/// occasionally send a slightly larger PDU anyway.
pub fn read_pdu<R>(reader: &mut R, max_pdu_length: u32, strict: bool) -> Result<Pdu>
where
    R: Read,
{
    ensure!(
        (MINIMUM_PDU_SIZE..=MAXIMUM_PDU_SIZE).contains(&max_pdu_length),
        InvalidMaxPduSnafu { max_pdu_length }
    );

    // A failure to read even the first two bytes means no PDU is available
    // yet rather than a truncated PDU; callers that block on this should be
    // able to tell the two apart.
    let mut bytes = [0; 2];
    if let Err(e) = reader.read_exact(&mut bytes) {
        ensure!(e.kind() != ErrorKind::UnexpectedEof, NoPduAvailableSnafu);
        return Err(e).context(ReadPduFieldSnafu { field: "type" });
    }

    let pdu_type = bytes[0];
    let pdu_length = reader
        .read_u32::<BigEndian>()
        .context(ReadPduFieldSnafu { field: "length" })?;

    check_pdu_length(pdu_length, max_pdu_length, strict)?;

    let bytes = read_n(reader, pdu_length as usize).context(ReadPduSnafu)?;
    let mut cursor = Cursor::new(bytes);

    match pdu_type {
        0x01 => read_association_rq(&mut cursor),
        0x02 => read_association_ac(&mut cursor),
        0x03 => read_association_rj(&mut cursor),
        0x04 => read_pdata(&mut cursor),
        0x05 => read_empty_pdu(&mut cursor).map(|()| Pdu::ReleaseRQ),
        0x06 => read_empty_pdu(&mut cursor).map(|()| Pdu::ReleaseRP),
        0x07 => read_abort_rq(&mut cursor),
        _ => {
            let data = read_n(&mut cursor, pdu_length as usize)
                .context(ReadPduFieldSnafu { field: "Unknown" })?;
            Ok(Pdu::Unknown { pdu_type, data })
        }
    }
}

fn check_pdu_length(pdu_length: u32, max_pdu_length: u32, strict: bool) -> Result<()> {
    if strict {
        ensure!(
            pdu_length <= max_pdu_length,
            PduTooLargeSnafu {
                pdu_length,
                max_pdu_length
            }
        );
    } else if pdu_length > max_pdu_length {
        ensure!(
            pdu_length <= MAXIMUM_PDU_SIZE,
            PduTooLargeSnafu {
                pdu_length,
                max_pdu_length: MAXIMUM_PDU_SIZE
            }
        );
        tracing::warn!(
            "Incoming pdu was too large: length {}, maximum is {}",
            pdu_length,
            max_pdu_length
        );
    }
    Ok(())
}

/// Read the Called/Calling-AE-title pair shared by A-ASSOCIATE-RQ and -AC,
/// each a 16-byte fixed-width field padded with spaces.
fn read_ae_title_pair<R>(cursor: &mut R) -> Result<(String, String)>
where
    R: Read,
{
    let mut called = [0; 16];
    cursor
        .read_exact(&mut called)
        .context(ReadPduFieldSnafu {
            field: "Called-AE-title",
        })?;
    let mut calling = [0; 16];
    cursor
        .read_exact(&mut calling)
        .context(ReadPduFieldSnafu {
            field: "Calling-AE-title",
        })?;
    Ok((
        rdcm_encoding::text::decode_single(&called),
        rdcm_encoding::text::decode_single(&calling),
    ))
}

fn read_association_rq(cursor: &mut Cursor<Vec<u8>>) -> Result<Pdu> {
    let protocol_version = cursor.read_u16::<BigEndian>().context(ReadPduFieldSnafu {
        field: "Protocol-version",
    })?;
    cursor
        .read_u16::<BigEndian>()
        .context(ReadReservedSnafu { bytes: 2_u32 })?;

    let (called_ae_title, calling_ae_title) = read_ae_title_pair(cursor)?;

    cursor
        .seek(SeekFrom::Current(32))
        .context(ReadReservedSnafu { bytes: 32_u32 })?;

    let mut application_context_name: Option<String> = None;
    let mut presentation_contexts = vec![];
    let mut user_variables = vec![];

    while cursor.position() < cursor.get_ref().len() as u64 {
        match read_pdu_variable(cursor)? {
            PduVariableItem::ApplicationContext(val) => {
                application_context_name = Some(val);
            }
            PduVariableItem::PresentationContextProposed(val) => {
                presentation_contexts.push(val);
            }
            PduVariableItem::UserVariables(val) => {
                user_variables = val;
            }
            var_item => {
                return InvalidPduVariableSnafu { var_item }.fail();
            }
        }
    }

    Ok(Pdu::AssociationRQ(AssociationRQ {
        protocol_version,
        application_context_name: application_context_name
            .context(MissingApplicationContextNameSnafu)?,
        called_ae_title,
        calling_ae_title,
        presentation_contexts,
        user_variables,
    }))
}

fn read_association_ac(cursor: &mut Cursor<Vec<u8>>) -> Result<Pdu> {
    let protocol_version = cursor.read_u16::<BigEndian>().context(ReadPduFieldSnafu {
        field: "Protocol-version",
    })?;
    cursor
        .read_u16::<BigEndian>()
        .context(ReadReservedSnafu { bytes: 2_u32 })?;

    // The AE-title fields just echo the request; their value here is not
    // validated against anything.
    let (called_ae_title, calling_ae_title) = read_ae_title_pair(cursor)?;

    cursor
        .seek(SeekFrom::Current(32))
        .context(ReadReservedSnafu { bytes: 32_u32 })?;

    let mut application_context_name: Option<String> = None;
    let mut presentation_contexts = vec![];
    let mut user_variables = vec![];

    while cursor.position() < cursor.get_ref().len() as u64 {
        match read_pdu_variable(cursor)? {
            PduVariableItem::ApplicationContext(val) => {
                application_context_name = Some(val);
            }
            PduVariableItem::PresentationContextResult(val) => {
                presentation_contexts.push(val);
            }
            PduVariableItem::UserVariables(val) => {
                user_variables = val;
            }
            var_item => {
                return InvalidPduVariableSnafu { var_item }.fail();
            }
        }
    }

    Ok(Pdu::AssociationAC(AssociationAC {
        protocol_version,
        application_context_name: application_context_name
            .context(MissingApplicationContextNameSnafu)?,
        called_ae_title,
        calling_ae_title,
        presentation_contexts,
        user_variables,
    }))
}

fn read_association_rj(cursor: &mut Cursor<Vec<u8>>) -> Result<Pdu> {
    cursor
        .read_u8()
        .context(ReadReservedSnafu { bytes: 1_u32 })?;

    let result = AssociationRJResult::from(
        cursor
            .read_u8()
            .context(ReadPduFieldSnafu { field: "Result" })?,
    )
    .context(InvalidRejectSourceOrReasonSnafu)?;

    let source = AssociationRJSource::from(
        cursor
            .read_u8()
            .context(ReadPduFieldSnafu { field: "Source" })?,
        cursor.read_u8().context(ReadPduFieldSnafu {
            field: "Reason/Diag.",
        })?,
    )
    .context(InvalidRejectSourceOrReasonSnafu)?;

    Ok(Pdu::AssociationRJ(AssociationRJ { result, source }))
}

fn read_pdata(cursor: &mut Cursor<Vec<u8>>) -> Result<Pdu> {
    let mut values = vec![];
    while cursor.position() < cursor.get_ref().len() as u64 {
        let item_length = cursor.read_u32::<BigEndian>().context(ReadPduFieldSnafu {
            field: "Item-Length",
        })?;

        ensure!(
            item_length >= 2,
            InvalidItemLengthSnafu {
                length: item_length
            }
        );

        let presentation_context_id = cursor.read_u8().context(ReadPduFieldSnafu {
            field: "Presentation-context-ID",
        })?;

        // Message control header: bit 0 distinguishes command from data
        // fragments, bit 1 marks the last fragment of the message.
        let header = cursor.read_u8().context(ReadPduFieldSnafu {
            field: "Message Control Header",
        })?;

        let value_type = if header & 0x01 > 0 {
            PDataValueType::Command
        } else {
            PDataValueType::Data
        };
        let is_last = (header & 0x02) > 0;

        let data = read_n(cursor, (item_length - 2) as usize).context(ReadPduFieldSnafu {
            field: "Presentation-data-value",
        })?;

        values.push(PDataValue {
            presentation_context_id,
            value_type,
            is_last,
            data,
        })
    }

    Ok(Pdu::PData { data: values })
}

fn read_empty_pdu(cursor: &mut Cursor<Vec<u8>>) -> Result<()> {
    cursor
        .seek(SeekFrom::Current(4))
        .context(ReadReservedSnafu { bytes: 4_u32 })?;
    Ok(())
}

fn read_abort_rq(cursor: &mut Cursor<Vec<u8>>) -> Result<Pdu> {
    let mut reserved = [0u8; 2];
    cursor
        .read_exact(&mut reserved)
        .context(ReadReservedSnafu { bytes: 2_u32 })?;

    let source = AbortRQSource::from(
        cursor
            .read_u8()
            .context(ReadPduFieldSnafu { field: "Source" })?,
        cursor.read_u8().context(ReadPduFieldSnafu {
            field: "Reason/Diag",
        })?,
    )
    .context(InvalidAbortSourceOrReasonSnafu)?;

    Ok(Pdu::AbortRQ { source })
}

fn read_n<R>(reader: &mut R, bytes_to_read: usize) -> std::io::Result<Vec<u8>>
where
    R: Read,
{
    let mut result = Vec::new();
    reader.take(bytes_to_read as u64).read_to_end(&mut result)?;
    Ok(result)
}

/// Read one item-type/reserved/length/value tuple from a variable-items
/// field, dispatching on the item type to the right sub-item parser.
fn read_pdu_variable<R>(reader: &mut R) -> Result<PduVariableItem>
where
    R: Read,
{
    let item_type = reader
        .read_u8()
        .context(ReadPduFieldSnafu { field: "Item-type" })?;
    reader
        .read_u8()
        .context(ReadReservedSnafu { bytes: 1_u32 })?;
    let item_length = reader.read_u16::<BigEndian>().context(ReadPduFieldSnafu {
        field: "Item-length",
    })?;

    let bytes = read_n(reader, item_length as usize).context(ReadPduItemSnafu)?;
    let mut cursor = Cursor::new(bytes);

    match item_type {
        0x10 => Ok(PduVariableItem::ApplicationContext(
            rdcm_encoding::text::decode_single(&cursor.into_inner()),
        )),
        0x20 => read_presentation_context_proposed(&mut cursor),
        0x21 => read_presentation_context_result(&mut cursor),
        0x50 => read_user_information(&mut cursor),
        _ => Ok(PduVariableItem::Unknown(item_type)),
    }
}

/// Read a sub-item's type/reserved/length header, common to every
/// sub-item nested inside a presentation-context or user-information item.
fn read_sub_item_header<R>(cursor: &mut R) -> Result<(u8, u16)>
where
    R: Read,
{
    let item_type = cursor
        .read_u8()
        .context(ReadPduFieldSnafu { field: "Item-type" })?;
    cursor
        .read_u8()
        .context(ReadReservedSnafu { bytes: 1_u32 })?;
    let item_length = cursor.read_u16::<BigEndian>().context(ReadPduFieldSnafu {
        field: "Item-length",
    })?;
    Ok((item_type, item_length))
}

fn read_presentation_context_proposed(cursor: &mut Cursor<Vec<u8>>) -> Result<PduVariableItem> {
    let mut abstract_syntax: Option<String> = None;
    let mut transfer_syntaxes = vec![];

    let presentation_context_id = cursor.read_u8().context(ReadPduFieldSnafu {
        field: "Presentation-context-ID",
    })?;
    cursor
        .seek(SeekFrom::Current(3))
        .context(ReadReservedSnafu { bytes: 3_u32 })?;

    while cursor.position() < cursor.get_ref().len() as u64 {
        let (item_type, item_length) = read_sub_item_header(cursor)?;

        match item_type {
            0x30 => {
                abstract_syntax = Some(rdcm_encoding::text::decode_single(
                    &read_n(cursor, item_length as usize).context(ReadPduFieldSnafu {
                        field: "Abstract-syntax-name",
                    })?,
                ));
            }
            0x40 => {
                transfer_syntaxes.push(rdcm_encoding::text::decode_single(
                    &read_n(cursor, item_length as usize).context(ReadPduFieldSnafu {
                        field: "Transfer-syntax-name",
                    })?,
                ));
            }
            _ => return UnknownPresentationContextSubItemSnafu.fail(),
        }
    }

    Ok(PduVariableItem::PresentationContextProposed(
        PresentationContextProposed {
            id: presentation_context_id,
            abstract_syntax: abstract_syntax.context(MissingAbstractSyntaxSnafu)?,
            transfer_syntaxes,
        },
    ))
}

fn read_presentation_context_result(cursor: &mut Cursor<Vec<u8>>) -> Result<PduVariableItem> {
    let mut transfer_syntax: Option<String> = None;

    let presentation_context_id = cursor.read_u8().context(ReadPduFieldSnafu {
        field: "Presentation-context-ID",
    })?;
    cursor
        .read_u8()
        .context(ReadReservedSnafu { bytes: 1_u32 })?;

    let reason = PresentationContextResultReason::from(cursor.read_u8().context(
        ReadPduFieldSnafu {
            field: "Result/Reason",
        },
    )?)
    .context(InvalidPresentationContextResultReasonSnafu)?;

    cursor
        .read_u8()
        .context(ReadReservedSnafu { bytes: 1_u32 })?;

    // Only meaningful when `reason` is acceptance; otherwise this sub-item
    // is present but its contents are not significant.
    while cursor.position() < cursor.get_ref().len() as u64 {
        let (item_type, item_length) = read_sub_item_header(cursor)?;

        match item_type {
            0x40 => {
                if transfer_syntax.is_some() {
                    return MultipleTransferSyntaxesAcceptedSnafu.fail();
                }
                transfer_syntax = Some(rdcm_encoding::text::decode_single(
                    &read_n(cursor, item_length as usize).context(ReadPduFieldSnafu {
                        field: "Transfer-syntax-name",
                    })?,
                ));
            }
            _ => return InvalidTransferSyntaxSubItemSnafu.fail(),
        }
    }

    Ok(PduVariableItem::PresentationContextResult(
        PresentationContextResult {
            id: presentation_context_id,
            reason,
            transfer_syntax: transfer_syntax.context(MissingTransferSyntaxSnafu)?,
        },
    ))
}

fn read_user_information(cursor: &mut Cursor<Vec<u8>>) -> Result<PduVariableItem> {
    let mut user_variables = vec![];

    while cursor.position() < cursor.get_ref().len() as u64 {
        let (item_type, item_length) = read_sub_item_header(cursor)?;

        match item_type {
            0x51 => {
                user_variables.push(UserVariableItem::MaxLength(
                    cursor.read_u32::<BigEndian>().context(ReadPduFieldSnafu {
                        field: "Maximum-length-received",
                    })?,
                ));
            }
            0x52 => {
                let implementation_class_uid = rdcm_encoding::text::decode_single(
                    &read_n(cursor, item_length as usize).context(ReadPduFieldSnafu {
                        field: "Implementation-class-uid",
                    })?,
                );
                user_variables.push(UserVariableItem::ImplementationClassUID(
                    implementation_class_uid,
                ));
            }
            0x55 => {
                let implementation_version_name = rdcm_encoding::text::decode_single(
                    &read_n(cursor, item_length as usize).context(ReadPduFieldSnafu {
                        field: "Implementation-version-name",
                    })?,
                );
                user_variables.push(UserVariableItem::ImplementationVersionName(
                    implementation_version_name,
                ));
            }
            0x56 => {
                user_variables.push(read_sop_class_extended_negotiation(cursor)?);
            }
            0x58 => {
                if let Some(item) = read_user_identity(cursor)? {
                    user_variables.push(item);
                }
            }
            _ => {
                user_variables.push(UserVariableItem::Unknown(
                    item_type,
                    read_n(cursor, item_length as usize)
                        .context(ReadPduFieldSnafu { field: "Unknown" })?,
                ));
            }
        }
    }

    Ok(PduVariableItem::UserVariables(user_variables))
}

fn read_sop_class_extended_negotiation(cursor: &mut Cursor<Vec<u8>>) -> Result<UserVariableItem> {
    let sop_class_uid_length = cursor.read_u16::<BigEndian>().context(ReadPduFieldSnafu {
        field: "SOP-class-uid-length",
    })?;
    let sop_class_uid = rdcm_encoding::text::decode_single(
        &read_n(cursor, sop_class_uid_length as usize).context(ReadPduFieldSnafu {
            field: "SOP-class-uid",
        })?,
    );

    let data_length = cursor.read_u16::<BigEndian>().context(ReadPduFieldSnafu {
        field: "Service-class-application-information-length",
    })?;
    let data = read_n(cursor, data_length as usize).context(ReadPduFieldSnafu {
        field: "Service-class-application-information",
    })?;

    Ok(UserVariableItem::SopClassExtendedNegotiationSubItem(
        sop_class_uid,
        data,
    ))
}

fn read_user_identity(cursor: &mut Cursor<Vec<u8>>) -> Result<Option<UserVariableItem>> {
    let user_identity_type = cursor.read_u8().context(ReadPduFieldSnafu {
        field: "User-Identity-type",
    })?;
    let positive_response_requested = cursor.read_u8().context(ReadPduFieldSnafu {
        field: "User-Identity-positive-response-requested",
    })?;

    let primary_field_length = cursor.read_u16::<BigEndian>().context(ReadPduFieldSnafu {
        field: "User-Identity-primary-field-length",
    })?;
    let primary_field =
        read_n(cursor, primary_field_length as usize).context(ReadPduFieldSnafu {
            field: "User-Identity-primary-field",
        })?;

    // Only non-zero when the identity type is username+password (2).
    let secondary_field_length = cursor.read_u16::<BigEndian>().context(ReadPduFieldSnafu {
        field: "User-Identity-secondary-field-length",
    })?;
    let secondary_field =
        read_n(cursor, secondary_field_length as usize).context(ReadPduFieldSnafu {
            field: "User-Identity-secondary-field",
        })?;

    match UserIdentityType::from(user_identity_type) {
        Some(user_identity_type) => Ok(Some(UserVariableItem::UserIdentityItem(
            UserIdentity::new(
                positive_response_requested == 1,
                user_identity_type,
                primary_field,
                secondary_field,
            ),
        ))),
        None => {
            warn!("Unknown User Identity Type code {}", user_identity_type);
            Ok(None)
        }
    }
}
