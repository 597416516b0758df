//! DIMSE message exchange (C-ECHO, C-FIND, C-STORE, C-GET, C-MOVE),
//! built on top of an established association.
//!
//! Every DIMSE message is a command data set, always encoded in
//! _Implicit VR Little Endian_ regardless of the transfer syntax
//! negotiated for the presentation context, optionally followed by a
//! data set in the negotiated transfer syntax. Both are carried as one
//! or more P-DATA-TF fragments over the same presentation context (PS3.7
//! Section 6.3, PS3.8 Section 9.3.5).

use std::io::Cursor;

use rdcm_core::{Tag, TransferSyntax, VR};
use rdcm_object::InMemDicomObject;
use rdcm_parser::dataset::ReadOptions;
use rdcm_parser::stream::ByteStream;
use rdcm_transfer_syntax_registry::entries::IMPLICIT_VR_LITTLE_ENDIAN;
use snafu::{OptionExt, ResultExt, Snafu};

use crate::association::client::ClientAssociation;
use crate::association::server::ServerAssociation;
use crate::pdu::{PDataValue, PDataValueType, Pdu};

/// Command Group Length (0000,0000): the byte length of every other
/// command element that follows it.
pub const COMMAND_GROUP_LENGTH: Tag = Tag(0x0000, 0x0000);
/// Affected SOP Class UID (0000,0002).
pub const AFFECTED_SOP_CLASS_UID: Tag = Tag(0x0000, 0x0002);
/// Command Field (0000,0100).
pub const COMMAND_FIELD: Tag = Tag(0x0000, 0x0100);
/// Message ID (0000,0110).
pub const MESSAGE_ID: Tag = Tag(0x0000, 0x0110);
/// Message ID Being Responded To (0000,0120).
pub const MESSAGE_ID_BEING_RESPONDED_TO: Tag = Tag(0x0000, 0x0120);
/// Move Destination (0000,0600).
pub const MOVE_DESTINATION: Tag = Tag(0x0000, 0x0600);
/// Priority (0000,0700).
pub const PRIORITY: Tag = Tag(0x0000, 0x0700);
/// Command Data Set Type (0000,0800).
pub const COMMAND_DATA_SET_TYPE: Tag = Tag(0x0000, 0x0800);
/// Status (0000,0900).
pub const STATUS: Tag = Tag(0x0000, 0x0900);
/// Affected SOP Instance UID (0000,1000).
pub const AFFECTED_SOP_INSTANCE_UID: Tag = Tag(0x0000, 0x1000);
/// Number of Remaining Sub-operations (0000,1020).
pub const NUMBER_OF_REMAINING_SUBOPERATIONS: Tag = Tag(0x0000, 0x1020);
/// Number of Completed Sub-operations (0000,1021).
pub const NUMBER_OF_COMPLETED_SUBOPERATIONS: Tag = Tag(0x0000, 0x1021);
/// Number of Failed Sub-operations (0000,1022).
pub const NUMBER_OF_FAILED_SUBOPERATIONS: Tag = Tag(0x0000, 0x1022);
/// Number of Warning Sub-operations (0000,1023).
pub const NUMBER_OF_WARNING_SUBOPERATIONS: Tag = Tag(0x0000, 0x1023);

/// Sentinel value of the Command Data Set Type field meaning "no data set".
pub const NO_DATA_SET: u16 = 0x0101;

/// The value of the Command Field (0000,0100), identifying the kind of
/// DIMSE message a command data set carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandField {
    CStoreRq,
    CStoreRsp,
    CGetRq,
    CGetRsp,
    CFindRq,
    CFindRsp,
    CMoveRq,
    CMoveRsp,
    CEchoRq,
    CEchoRsp,
}

impl CommandField {
    pub fn from_u16(value: u16) -> Option<Self> {
        Some(match value {
            0x0001 => Self::CStoreRq,
            0x8001 => Self::CStoreRsp,
            0x0010 => Self::CGetRq,
            0x8010 => Self::CGetRsp,
            0x0020 => Self::CFindRq,
            0x8020 => Self::CFindRsp,
            0x0021 => Self::CMoveRq,
            0x8021 => Self::CMoveRsp,
            0x0030 => Self::CEchoRq,
            0x8030 => Self::CEchoRsp,
            _ => return None,
        })
    }

    pub fn to_u16(self) -> u16 {
        match self {
            Self::CStoreRq => 0x0001,
            Self::CStoreRsp => 0x8001,
            Self::CGetRq => 0x0010,
            Self::CGetRsp => 0x8010,
            Self::CFindRq => 0x0020,
            Self::CFindRsp => 0x8020,
            Self::CMoveRq => 0x0021,
            Self::CMoveRsp => 0x8021,
            Self::CEchoRq => 0x0030,
            Self::CEchoRsp => 0x8030,
        }
    }
}

/// A DIMSE status code, as carried in the Status (0000,0900) command field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Pending,
    Cancel,
    Warning(u16),
    Failure(u16),
}

impl Status {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0000 => Status::Success,
            0xFF00 | 0xFF01 => Status::Pending,
            0xFE00 => Status::Cancel,
            v if v & 0xF000 == 0xB000 => Status::Warning(v),
            v => Status::Failure(v),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            Status::Success => 0x0000,
            Status::Pending => 0xFF00,
            Status::Cancel => 0xFE00,
            Status::Warning(v) | Status::Failure(v) => v,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    pub fn is_pending(self) -> bool {
        matches!(self, Status::Pending)
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("failed to exchange a PDU over the requester association"))]
    Client { source: crate::association::client::Error },

    #[snafu(display("failed to exchange a PDU over the acceptor association"))]
    Server { source: crate::association::server::Error },

    #[snafu(display("unexpected PDU while awaiting message fragments: `{:?}`", pdu))]
    UnexpectedPdu { pdu: Pdu },

    #[snafu(display("could not build the command data set"))]
    BuildCommand { source: rdcm_object::Error },

    #[snafu(display("could not parse the command data set"))]
    ParseCommand { source: rdcm_object::Error },

    #[snafu(display("command is missing required field `{}`", field))]
    MissingCommandField { field: &'static str },

    #[snafu(display("unrecognized command field value `{:#06x}`", value))]
    UnknownCommandField { value: u16 },

    #[snafu(display("could not parse the accompanying data set"))]
    ParseDataSet { source: rdcm_object::Error },

    #[snafu(display("could not write the accompanying data set"))]
    WriteDataSet { source: rdcm_object::Error },

    #[snafu(display(
        "no presentation context negotiated for abstract syntax `{}`",
        abstract_syntax_uid
    ))]
    NoPresentationContext { abstract_syntax_uid: String },

    #[snafu(display("no presentation context negotiated with id `{}`", id))]
    NoPresentationContextId { id: u8 },

    #[snafu(display("no transfer syntax registered for UID `{}`", transfer_syntax_uid))]
    UnknownTransferSyntax { transfer_syntax_uid: String },

    #[snafu(display("the C-GET sink rejected an inbound C-STORE sub-operation"))]
    Sink { source: Box<dyn std::error::Error + Send + Sync> },

    #[snafu(display("unexpected command field `{:?}` while awaiting a C-GET-RSP or C-STORE-RQ", field))]
    UnexpectedCommandField { field: CommandField },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A DIMSE message: a command data set and an optional accompanying data set.
#[derive(Debug, Clone)]
pub struct Message {
    pub command: InMemDicomObject,
    pub data: Option<Vec<u8>>,
}

impl Message {
    /// The value of this message's Command Field.
    pub fn command_field(&self) -> Result<CommandField> {
        let value = command_u16(&self.command, COMMAND_FIELD)?;
        CommandField::from_u16(value).context(UnknownCommandFieldSnafu { value })
    }

    /// The value of this message's Status field, if present
    /// (present on every `*Rsp` message, absent on requests).
    pub fn status(&self) -> Option<Status> {
        self.command
            .get(STATUS)
            .and_then(|e| e.value().primitive())
            .and_then(|v| v.to_int::<u16>().ok())
            .map(Status::from_u16)
    }

    /// Decode the accompanying data set under the given transfer syntax.
    pub fn dataset(&self, ts: TransferSyntax) -> Result<InMemDicomObject> {
        let bytes = self.data.clone().unwrap_or_default();
        decode_dataset(&bytes, ts).context(ParseDataSetSnafu)
    }

    /// The value of this message's Affected SOP Class UID field.
    pub fn affected_sop_class_uid(&self) -> Result<String> {
        command_str(&self.command, AFFECTED_SOP_CLASS_UID)
    }

    /// The value of this message's Affected SOP Instance UID field.
    pub fn affected_sop_instance_uid(&self) -> Result<String> {
        command_str(&self.command, AFFECTED_SOP_INSTANCE_UID)
    }

    /// The value of this message's Message ID field (present on requests).
    pub fn message_id(&self) -> Result<u16> {
        command_u16(&self.command, MESSAGE_ID)
    }

    /// The value of this message's Message ID Being Responded To field
    /// (present on responses).
    pub fn message_id_being_responded_to(&self) -> Result<u16> {
        command_u16(&self.command, MESSAGE_ID_BEING_RESPONDED_TO)
    }
}

fn command_u16(command: &InMemDicomObject, tag: Tag) -> Result<u16> {
    command
        .get(tag)
        .and_then(|e| e.value().primitive())
        .and_then(|v| v.to_int::<u16>().ok())
        .context(MissingCommandFieldSnafu {
            field: dictionary_name(tag),
        })
}

fn command_str(command: &InMemDicomObject, tag: Tag) -> Result<String> {
    command
        .get(tag)
        .and_then(|e| e.value().primitive())
        .and_then(|v| v.to_str().ok().map(|s| s.to_string()))
        .context(MissingCommandFieldSnafu {
            field: dictionary_name(tag),
        })
}

fn dictionary_name(tag: Tag) -> &'static str {
    match tag {
        COMMAND_GROUP_LENGTH => "CommandGroupLength",
        AFFECTED_SOP_CLASS_UID => "AffectedSOPClassUID",
        COMMAND_FIELD => "CommandField",
        MESSAGE_ID => "MessageID",
        MESSAGE_ID_BEING_RESPONDED_TO => "MessageIDBeingRespondedTo",
        MOVE_DESTINATION => "MoveDestination",
        PRIORITY => "Priority",
        COMMAND_DATA_SET_TYPE => "CommandDataSetType",
        STATUS => "Status",
        AFFECTED_SOP_INSTANCE_UID => "AffectedSOPInstanceUID",
        _ => "Unknown",
    }
}

/// Build a command data set, always under Implicit VR Little Endian.
fn new_command() -> InMemDicomObject {
    InMemDicomObject::new_empty(IMPLICIT_VR_LITTLE_ENDIAN)
}

/// Insert the Command Group Length (0000,0000) element into a clone of
/// `command`, computed as the encoded byte length of every other element.
fn with_group_length(command: &InMemDicomObject) -> Result<InMemDicomObject> {
    let mut buffer = Vec::new();
    command.write_dataset(&mut buffer).context(BuildCommandSnafu)?;
    let mut command = command.clone();
    command.put_primitive(COMMAND_GROUP_LENGTH, VR::UL, (buffer.len() as u32).into());
    Ok(command)
}

fn decode_dataset(bytes: &[u8], ts: TransferSyntax) -> rdcm_object::Result<InMemDicomObject> {
    let mut stream = ByteStream::new(Cursor::new(bytes.to_vec()))
        .context(rdcm_object::error::ParserSnafu)?;
    InMemDicomObject::build_object(&mut stream, ts, ReadOptions::default())
}

/// An established association over which DIMSE messages can be exchanged.
///
/// Implemented for both [`ClientAssociation`] and [`ServerAssociation`], so
/// that the message exchange logic in this module is written once and
/// shared by the requester (SCU) and acceptor (SCP) sides alike.
pub trait DimseConnection {
    fn send_pdu(&mut self, pdu: &Pdu) -> Result<()>;
    fn receive_pdu(&mut self) -> Result<Pdu>;
    fn max_pdu_length(&self) -> u32;
}

impl DimseConnection for ClientAssociation {
    fn send_pdu(&mut self, pdu: &Pdu) -> Result<()> {
        self.send(pdu).context(ClientSnafu)
    }

    fn receive_pdu(&mut self) -> Result<Pdu> {
        self.receive().context(ClientSnafu)
    }

    fn max_pdu_length(&self) -> u32 {
        ClientAssociation::max_pdu_length(self)
    }
}

impl DimseConnection for ServerAssociation {
    fn send_pdu(&mut self, pdu: &Pdu) -> Result<()> {
        self.send(pdu).context(ServerSnafu)
    }

    fn receive_pdu(&mut self) -> Result<Pdu> {
        self.receive().context(ServerSnafu)
    }

    fn max_pdu_length(&self) -> u32 {
        ServerAssociation::max_pdu_length(self)
    }
}

/// The maximum amount of fragment payload that fits in a single P-DATA-TF
/// PDU of the given maximum PDU length (PDU header, then PDV length,
/// presentation-context-id byte and message-control-header byte).
fn max_fragment_len(max_pdu_length: u32) -> usize {
    (max_pdu_length.saturating_sub(6 + 4 + 2)).max(1) as usize
}

fn send_fragments(
    conn: &mut impl DimseConnection,
    presentation_context_id: u8,
    value_type: PDataValueType,
    bytes: &[u8],
) -> Result<()> {
    let chunk_len = max_fragment_len(conn.max_pdu_length());
    if bytes.is_empty() {
        conn.send_pdu(&Pdu::PData {
            data: vec![PDataValue {
                presentation_context_id,
                value_type,
                is_last: true,
                data: Vec::new(),
            }],
        })?;
        return Ok(());
    }

    let mut offset = 0;
    while offset < bytes.len() {
        let end = (offset + chunk_len).min(bytes.len());
        let is_last = end == bytes.len();
        conn.send_pdu(&Pdu::PData {
            data: vec![PDataValue {
                presentation_context_id,
                value_type,
                is_last,
                data: bytes[offset..end].to_vec(),
            }],
        })?;
        offset = end;
    }
    Ok(())
}

/// Receive fragments of the given value type (command or data set) until
/// the last fragment is seen, concatenating their payloads in order and
/// returning the presentation context they were carried over.
fn receive_fragments(
    conn: &mut impl DimseConnection,
    expected_type: PDataValueType,
) -> Result<(u8, Vec<u8>)> {
    let mut buffer = Vec::new();
    let mut presentation_context_id = None;
    loop {
        match conn.receive_pdu()? {
            Pdu::PData { data } => {
                let mut done = false;
                for value in data {
                    if value.value_type != expected_type {
                        continue;
                    }
                    presentation_context_id.get_or_insert(value.presentation_context_id);
                    buffer.extend_from_slice(&value.data);
                    if value.is_last {
                        done = true;
                    }
                }
                if done {
                    let id = presentation_context_id.unwrap_or(0);
                    return Ok((id, buffer));
                }
            }
            pdu => return UnexpectedPduSnafu { pdu }.fail(),
        }
    }
}

/// The framing overhead of packing `n` PDVs into a single P-DATA-TF PDU:
/// one 6-byte PDU header shared by all PDVs, plus each PDV's own 4-byte
/// length field and 2-byte presentation-context-id/control-header pair.
fn pdata_overhead(pdv_count: usize) -> usize {
    6 + pdv_count * (4 + 2)
}

/// Whether a command PDV and a data PDV of the given sizes fit together,
/// each as a single unfragmented value, inside one P-DATA-TF PDU bounded
/// by `max_pdu_length`.
fn fits_in_one_pdu(max_pdu_length: u32, command_len: usize, data_len: usize) -> bool {
    command_len + data_len <= (max_pdu_length as usize).saturating_sub(pdata_overhead(2))
}

/// Send a DIMSE message over the given presentation context.
///
/// The command set is always sent whole, with its Command Group Length
/// element filled in first. When an accompanying data set is present and
/// both values fit, unfragmented, inside one P-DATA-TF PDU, they are
/// packed together as two PDVs of the same PDU; otherwise each is sent
/// as its own stream of fragments, command first.
pub fn send_message(
    conn: &mut impl DimseConnection,
    presentation_context_id: u8,
    message: &Message,
) -> Result<()> {
    let command = with_group_length(&message.command)?;
    let mut command_bytes = Vec::new();
    command.write_dataset(&mut command_bytes).context(BuildCommandSnafu)?;

    match &message.data {
        Some(data) if fits_in_one_pdu(conn.max_pdu_length(), command_bytes.len(), data.len()) => {
            conn.send_pdu(&Pdu::PData {
                data: vec![
                    PDataValue {
                        presentation_context_id,
                        value_type: PDataValueType::Command,
                        is_last: true,
                        data: command_bytes,
                    },
                    PDataValue {
                        presentation_context_id,
                        value_type: PDataValueType::Data,
                        is_last: true,
                        data: data.clone(),
                    },
                ],
            })
        }
        Some(data) => {
            send_fragments(
                conn,
                presentation_context_id,
                PDataValueType::Command,
                &command_bytes,
            )?;
            send_fragments(conn, presentation_context_id, PDataValueType::Data, data)
        }
        None => send_fragments(
            conn,
            presentation_context_id,
            PDataValueType::Command,
            &command_bytes,
        ),
    }
}

/// Receive a DIMSE message sent over any presentation context,
/// returning it together with the identifier of that context.
pub fn receive_message(conn: &mut impl DimseConnection) -> Result<(u8, Message)> {
    let (presentation_context_id, command_bytes) =
        receive_fragments(conn, PDataValueType::Command)?;

    let command =
        decode_dataset(&command_bytes, IMPLICIT_VR_LITTLE_ENDIAN).context(ParseCommandSnafu)?;

    let data_set_type = command_u16(&command, COMMAND_DATA_SET_TYPE)?;
    let data = if data_set_type == NO_DATA_SET {
        None
    } else {
        let (_, data_bytes) = receive_fragments(conn, PDataValueType::Data)?;
        Some(data_bytes)
    };

    Ok((presentation_context_id, Message { command, data }))
}

/// Build a C-ECHO-RQ command.
pub fn c_echo_rq(message_id: u16, sop_class_uid: &str) -> Message {
    let mut command = new_command();
    command.put_str(AFFECTED_SOP_CLASS_UID, VR::UI, sop_class_uid.to_string());
    command.put_primitive(COMMAND_FIELD, VR::US, CommandField::CEchoRq.to_u16().into());
    command.put_primitive(MESSAGE_ID, VR::US, message_id.into());
    command.put_primitive(COMMAND_DATA_SET_TYPE, VR::US, NO_DATA_SET.into());
    Message { command, data: None }
}

/// Build a C-ECHO-RSP command.
pub fn c_echo_rsp(message_id: u16, sop_class_uid: &str, status: Status) -> Message {
    let mut command = new_command();
    command.put_str(AFFECTED_SOP_CLASS_UID, VR::UI, sop_class_uid.to_string());
    command.put_primitive(
        COMMAND_FIELD,
        VR::US,
        CommandField::CEchoRsp.to_u16().into(),
    );
    command.put_primitive(MESSAGE_ID_BEING_RESPONDED_TO, VR::US, message_id.into());
    command.put_primitive(COMMAND_DATA_SET_TYPE, VR::US, NO_DATA_SET.into());
    command.put_primitive(STATUS, VR::US, status.to_u16().into());
    Message { command, data: None }
}

/// The DIMSE priority of a request, as carried in the Priority (0000,0700)
/// command field of C-FIND-RQ, C-MOVE-RQ and C-GET-RQ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    fn to_u16(self) -> u16 {
        match self {
            Priority::Low => 0x0002,
            Priority::Medium => 0x0000,
            Priority::High => 0x0001,
        }
    }
}

/// Build a C-STORE-RQ command to send the given data set along with it.
pub fn c_store_rq(
    message_id: u16,
    sop_class_uid: &str,
    sop_instance_uid: &str,
    priority: Priority,
    dataset: Vec<u8>,
) -> Message {
    let mut command = new_command();
    command.put_str(AFFECTED_SOP_CLASS_UID, VR::UI, sop_class_uid.to_string());
    command.put_primitive(
        COMMAND_FIELD,
        VR::US,
        CommandField::CStoreRq.to_u16().into(),
    );
    command.put_primitive(MESSAGE_ID, VR::US, message_id.into());
    command.put_primitive(PRIORITY, VR::US, priority.to_u16().into());
    // a value other than NO_DATA_SET merely signals presence; 0x0000 is conventional
    command.put_primitive(COMMAND_DATA_SET_TYPE, VR::US, 0x0000u16.into());
    command.put_str(
        AFFECTED_SOP_INSTANCE_UID,
        VR::UI,
        sop_instance_uid.to_string(),
    );
    Message {
        command,
        data: Some(dataset),
    }
}

/// Build a C-STORE-RSP command.
pub fn c_store_rsp(
    message_id: u16,
    sop_class_uid: &str,
    sop_instance_uid: &str,
    status: Status,
) -> Message {
    let mut command = new_command();
    command.put_str(AFFECTED_SOP_CLASS_UID, VR::UI, sop_class_uid.to_string());
    command.put_primitive(
        COMMAND_FIELD,
        VR::US,
        CommandField::CStoreRsp.to_u16().into(),
    );
    command.put_primitive(MESSAGE_ID_BEING_RESPONDED_TO, VR::US, message_id.into());
    command.put_primitive(COMMAND_DATA_SET_TYPE, VR::US, NO_DATA_SET.into());
    command.put_str(
        AFFECTED_SOP_INSTANCE_UID,
        VR::UI,
        sop_instance_uid.to_string(),
    );
    command.put_primitive(STATUS, VR::US, status.to_u16().into());
    Message { command, data: None }
}

/// Build a C-FIND-RQ command carrying the given identifier (query keys).
pub fn c_find_rq(
    message_id: u16,
    sop_class_uid: &str,
    priority: Priority,
    identifier: Vec<u8>,
) -> Message {
    let mut command = new_command();
    command.put_str(AFFECTED_SOP_CLASS_UID, VR::UI, sop_class_uid.to_string());
    command.put_primitive(COMMAND_FIELD, VR::US, CommandField::CFindRq.to_u16().into());
    command.put_primitive(MESSAGE_ID, VR::US, message_id.into());
    command.put_primitive(PRIORITY, VR::US, priority.to_u16().into());
    command.put_primitive(COMMAND_DATA_SET_TYPE, VR::US, 0x0000u16.into());
    Message {
        command,
        data: Some(identifier),
    }
}

/// Build a C-FIND-RSP command. Pass `identifier` when the status is
/// [`Status::Pending`], carrying the matching keys for one result;
/// omit it for the final response.
pub fn c_find_rsp(
    message_id: u16,
    sop_class_uid: &str,
    status: Status,
    identifier: Option<Vec<u8>>,
) -> Message {
    let mut command = new_command();
    command.put_str(AFFECTED_SOP_CLASS_UID, VR::UI, sop_class_uid.to_string());
    command.put_primitive(
        COMMAND_FIELD,
        VR::US,
        CommandField::CFindRsp.to_u16().into(),
    );
    command.put_primitive(MESSAGE_ID_BEING_RESPONDED_TO, VR::US, message_id.into());
    command.put_primitive(STATUS, VR::US, status.to_u16().into());
    let has_data = identifier.is_some();
    command.put_primitive(
        COMMAND_DATA_SET_TYPE,
        VR::US,
        (if has_data { 0x0000u16 } else { NO_DATA_SET }).into(),
    );
    Message {
        command,
        data: identifier,
    }
}

/// Build a C-MOVE-RQ command.
pub fn c_move_rq(
    message_id: u16,
    sop_class_uid: &str,
    priority: Priority,
    move_destination: &str,
    identifier: Vec<u8>,
) -> Message {
    let mut command = new_command();
    command.put_str(AFFECTED_SOP_CLASS_UID, VR::UI, sop_class_uid.to_string());
    command.put_primitive(COMMAND_FIELD, VR::US, CommandField::CMoveRq.to_u16().into());
    command.put_primitive(MESSAGE_ID, VR::US, message_id.into());
    command.put_primitive(PRIORITY, VR::US, priority.to_u16().into());
    command.put_str(MOVE_DESTINATION, VR::AE, move_destination.to_string());
    command.put_primitive(COMMAND_DATA_SET_TYPE, VR::US, 0x0000u16.into());
    Message {
        command,
        data: Some(identifier),
    }
}

/// Build a C-MOVE-RSP command.
pub fn c_move_rsp(
    message_id: u16,
    sop_class_uid: &str,
    status: Status,
    remaining: u16,
    completed: u16,
    failed: u16,
    warning: u16,
) -> Message {
    let mut command = new_command();
    command.put_str(AFFECTED_SOP_CLASS_UID, VR::UI, sop_class_uid.to_string());
    command.put_primitive(
        COMMAND_FIELD,
        VR::US,
        CommandField::CMoveRsp.to_u16().into(),
    );
    command.put_primitive(MESSAGE_ID_BEING_RESPONDED_TO, VR::US, message_id.into());
    command.put_primitive(COMMAND_DATA_SET_TYPE, VR::US, NO_DATA_SET.into());
    command.put_primitive(STATUS, VR::US, status.to_u16().into());
    command.put_primitive(NUMBER_OF_REMAINING_SUBOPERATIONS, VR::US, remaining.into());
    command.put_primitive(NUMBER_OF_COMPLETED_SUBOPERATIONS, VR::US, completed.into());
    command.put_primitive(NUMBER_OF_FAILED_SUBOPERATIONS, VR::US, failed.into());
    command.put_primitive(NUMBER_OF_WARNING_SUBOPERATIONS, VR::US, warning.into());
    Message { command, data: None }
}

/// Build a C-GET-RQ command.
pub fn c_get_rq(
    message_id: u16,
    sop_class_uid: &str,
    priority: Priority,
    identifier: Vec<u8>,
) -> Message {
    let mut command = new_command();
    command.put_str(AFFECTED_SOP_CLASS_UID, VR::UI, sop_class_uid.to_string());
    command.put_primitive(COMMAND_FIELD, VR::US, CommandField::CGetRq.to_u16().into());
    command.put_primitive(MESSAGE_ID, VR::US, message_id.into());
    command.put_primitive(PRIORITY, VR::US, priority.to_u16().into());
    command.put_primitive(COMMAND_DATA_SET_TYPE, VR::US, 0x0000u16.into());
    Message {
        command,
        data: Some(identifier),
    }
}

/// Build a C-GET-RSP command.
pub fn c_get_rsp(
    message_id: u16,
    sop_class_uid: &str,
    status: Status,
    remaining: u16,
    completed: u16,
    failed: u16,
    warning: u16,
) -> Message {
    let mut command = new_command();
    command.put_str(AFFECTED_SOP_CLASS_UID, VR::UI, sop_class_uid.to_string());
    command.put_primitive(COMMAND_FIELD, VR::US, CommandField::CGetRsp.to_u16().into());
    command.put_primitive(MESSAGE_ID_BEING_RESPONDED_TO, VR::US, message_id.into());
    command.put_primitive(COMMAND_DATA_SET_TYPE, VR::US, NO_DATA_SET.into());
    command.put_primitive(STATUS, VR::US, status.to_u16().into());
    command.put_primitive(NUMBER_OF_REMAINING_SUBOPERATIONS, VR::US, remaining.into());
    command.put_primitive(NUMBER_OF_COMPLETED_SUBOPERATIONS, VR::US, completed.into());
    command.put_primitive(NUMBER_OF_FAILED_SUBOPERATIONS, VR::US, failed.into());
    command.put_primitive(NUMBER_OF_WARNING_SUBOPERATIONS, VR::US, warning.into());
    Message { command, data: None }
}

/// Send a C-ECHO-RQ over the given presentation context and await the
/// matching C-ECHO-RSP, returning its status.
pub fn c_echo(
    association: &mut ClientAssociation,
    presentation_context_id: u8,
    sop_class_uid: &str,
    message_id: u16,
) -> Result<Status> {
    let rq = c_echo_rq(message_id, sop_class_uid);
    send_message(association, presentation_context_id, &rq)?;

    let (_, rsp) = receive_message(association)?;
    rsp.status().context(MissingCommandFieldSnafu {
        field: "Status",
    })
}

/// Send a C-FIND-RQ identifier over the given presentation context and
/// collect every matching response identifier until the final response.
///
/// Returns the list of matching identifiers (still encoded, under the
/// negotiated transfer syntax) together with the final response's status.
pub fn c_find(
    association: &mut ClientAssociation,
    presentation_context_id: u8,
    sop_class_uid: &str,
    message_id: u16,
    priority: Priority,
    identifier: Vec<u8>,
) -> Result<(Vec<Vec<u8>>, Status)> {
    let rq = c_find_rq(message_id, sop_class_uid, priority, identifier);
    send_message(association, presentation_context_id, &rq)?;

    let mut matches = Vec::new();
    loop {
        let (_, rsp) = receive_message(association)?;
        let status = rsp.status().context(MissingCommandFieldSnafu {
            field: "Status",
        })?;
        if let Some(data) = rsp.data {
            matches.push(data);
        }
        if !status.is_pending() {
            return Ok((matches, status));
        }
    }
}

/// Send a C-STORE-RQ with the given encoded data set and await the
/// C-STORE-RSP status.
pub fn c_store(
    association: &mut ClientAssociation,
    presentation_context_id: u8,
    sop_class_uid: &str,
    sop_instance_uid: &str,
    message_id: u16,
    priority: Priority,
    dataset: Vec<u8>,
) -> Result<Status> {
    let rq = c_store_rq(
        message_id,
        sop_class_uid,
        sop_instance_uid,
        priority,
        dataset,
    );
    send_message(association, presentation_context_id, &rq)?;

    let (_, rsp) = receive_message(association)?;
    rsp.status().context(MissingCommandFieldSnafu {
        field: "Status",
    })
}

/// The outcome of one interim response of a C-MOVE or C-GET exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubOperationProgress {
    pub remaining: u16,
    pub completed: u16,
    pub failed: u16,
    pub warning: u16,
}

fn sub_operation_progress(command: &InMemDicomObject) -> SubOperationProgress {
    let field = |tag| command_u16(command, tag).unwrap_or(0);
    SubOperationProgress {
        remaining: field(NUMBER_OF_REMAINING_SUBOPERATIONS),
        completed: field(NUMBER_OF_COMPLETED_SUBOPERATIONS),
        failed: field(NUMBER_OF_FAILED_SUBOPERATIONS),
        warning: field(NUMBER_OF_WARNING_SUBOPERATIONS),
    }
}

/// Send a C-MOVE-RQ identifier and await every interim response, invoking
/// `on_progress` for each one, until the final response is received.
pub fn c_move(
    association: &mut ClientAssociation,
    presentation_context_id: u8,
    sop_class_uid: &str,
    message_id: u16,
    priority: Priority,
    move_destination: &str,
    identifier: Vec<u8>,
    mut on_progress: impl FnMut(SubOperationProgress),
) -> Result<Status> {
    let rq = c_move_rq(
        message_id,
        sop_class_uid,
        priority,
        move_destination,
        identifier,
    );
    send_message(association, presentation_context_id, &rq)?;

    loop {
        let (_, rsp) = receive_message(association)?;
        let status = rsp.status().context(MissingCommandFieldSnafu {
            field: "Status",
        })?;
        on_progress(sub_operation_progress(&rsp.command));
        if !status.is_pending() {
            return Ok(status);
        }
    }
}

/// Send a C-GET-RQ identifier and drive the rest of the exchange to
/// completion.
///
/// On the same association, the acceptor interleaves C-GET-RSP progress
/// messages with C-STORE-RQ sub-operations: one per matched instance, each
/// requiring this requester to act as a C-STORE SCP. Every inbound
/// C-STORE-RQ is decoded under the transfer syntax negotiated for the
/// presentation context it arrived on, handed to `sink`, and acknowledged
/// with a C-STORE-RSP before the loop resumes; every C-GET-RSP is handed
/// to `on_progress`. Returns the final response's status.
pub fn c_get(
    association: &mut ClientAssociation,
    presentation_context_id: u8,
    sop_class_uid: &str,
    message_id: u16,
    priority: Priority,
    identifier: Vec<u8>,
    mut sink: impl FnMut(InMemDicomObject) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>,
    mut on_progress: impl FnMut(SubOperationProgress),
) -> Result<Status> {
    let rq = c_get_rq(message_id, sop_class_uid, priority, identifier);
    send_message(association, presentation_context_id, &rq)?;

    loop {
        let (pc_id, msg) = receive_message(association)?;
        match msg.command_field()? {
            CommandField::CStoreRq => {
                let sub_sop_class_uid = msg.affected_sop_class_uid()?;
                let sub_sop_instance_uid = msg.affected_sop_instance_uid()?;
                let sub_message_id = msg.message_id()?;

                let transfer_syntax_uid = association
                    .presentation_contexts()
                    .iter()
                    .find(|pc| pc.id == pc_id)
                    .map(|pc| pc.transfer_syntax_uid.clone())
                    .context(NoPresentationContextIdSnafu { id: pc_id })?;
                let ts = rdcm_transfer_syntax_registry::get(&transfer_syntax_uid)
                    .context(UnknownTransferSyntaxSnafu { transfer_syntax_uid })?;

                let status = match msg.dataset(ts).and_then(|dataset| sink(dataset).context(SinkSnafu)) {
                    Ok(()) => Status::Success,
                    Err(_) => Status::Failure(0xC000),
                };

                let rsp = c_store_rsp(sub_message_id, &sub_sop_class_uid, &sub_sop_instance_uid, status);
                send_message(association, pc_id, &rsp)?;
            }
            CommandField::CGetRsp => {
                let status = msg.status().context(MissingCommandFieldSnafu {
                    field: "Status",
                })?;
                on_progress(sub_operation_progress(&msg.command));
                if !status.is_pending() {
                    return Ok(status);
                }
            }
            other => return UnexpectedCommandFieldSnafu { field: other }.fail(),
        }
    }
}

/// Receive one DIMSE message over the acceptor association and hand it to
/// `handler`, which returns the response message to send back on the same
/// presentation context.
///
/// This is the minimal SCP dispatch step: a verification, query/retrieve
/// or storage service implementation calls this in a loop, inspecting
/// [`Message::command_field`] to decide how to build its response.
pub fn serve_one(
    association: &mut ServerAssociation,
    handler: impl FnOnce(Message) -> Result<Message>,
) -> Result<()> {
    let (presentation_context_id, request) = receive_message(association)?;
    let response = handler(request)?;
    send_message(association, presentation_context_id, &response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::association::{ClientAssociationOptions, ServerAssociationOptions};
    use std::net::TcpListener;
    use std::thread;

    const VERIFICATION_SOP_CLASS: &str = "1.2.840.10008.1.1";
    const IMPLICIT_VR_LE: &str = "1.2.840.10008.1.2";

    #[test]
    fn command_field_round_trip() {
        for field in [
            CommandField::CStoreRq,
            CommandField::CStoreRsp,
            CommandField::CGetRq,
            CommandField::CGetRsp,
            CommandField::CFindRq,
            CommandField::CFindRsp,
            CommandField::CMoveRq,
            CommandField::CMoveRsp,
            CommandField::CEchoRq,
            CommandField::CEchoRsp,
        ] {
            assert_eq!(CommandField::from_u16(field.to_u16()), Some(field));
        }
    }

    #[test]
    fn status_round_trip() {
        assert_eq!(Status::from_u16(0x0000), Status::Success);
        assert_eq!(Status::from_u16(0xFF00), Status::Pending);
        assert_eq!(Status::from_u16(0xFE00), Status::Cancel);
        assert!(Status::Success.is_success());
        assert!(Status::Pending.is_pending());
        assert!(!Status::Success.is_pending());
    }

    struct RecordingConnection {
        max_pdu_length: u32,
        sent: Vec<Pdu>,
    }

    impl DimseConnection for RecordingConnection {
        fn send_pdu(&mut self, pdu: &Pdu) -> Result<()> {
            self.sent.push(pdu.clone());
            Ok(())
        }

        fn receive_pdu(&mut self) -> Result<Pdu> {
            unreachable!("the packing test never reads back a PDU")
        }

        fn max_pdu_length(&self) -> u32 {
            self.max_pdu_length
        }
    }

    #[test]
    fn small_message_is_packed_into_one_pdu() {
        let rq = c_store_rq(1, VERIFICATION_SOP_CLASS, "1.2.3.4", Priority::Medium, vec![1, 2, 3, 4]);
        let mut conn = RecordingConnection {
            max_pdu_length: 16384,
            sent: Vec::new(),
        };

        send_message(&mut conn, 1, &rq).unwrap();

        assert_eq!(conn.sent.len(), 1);
        match &conn.sent[0] {
            Pdu::PData { data } => {
                assert_eq!(data.len(), 2);
                assert_eq!(data[0].value_type, PDataValueType::Command);
                assert_eq!(data[1].value_type, PDataValueType::Data);
                assert!(data[0].is_last);
                assert!(data[1].is_last);
            }
            other => panic!("expected a single P-DATA-TF PDU, got {:?}", other),
        }
    }

    #[test]
    fn oversized_message_falls_back_to_separate_pdus() {
        let rq = c_store_rq(1, VERIFICATION_SOP_CLASS, "1.2.3.4", Priority::Medium, vec![0u8; 64]);
        let mut conn = RecordingConnection {
            // too small to hold both PDVs of this message, unfragmented, together
            max_pdu_length: 64,
            sent: Vec::new(),
        };

        send_message(&mut conn, 1, &rq).unwrap();

        assert!(conn.sent.len() >= 2);
        let types: Vec<_> = conn
            .sent
            .iter()
            .flat_map(|pdu| match pdu {
                Pdu::PData { data } => data.iter().map(|v| v.value_type.clone()).collect::<Vec<_>>(),
                _ => Vec::new(),
            })
            .collect();
        assert!(types.iter().any(|t| *t == PDataValueType::Command));
        assert!(types.iter().any(|t| *t == PDataValueType::Data));
    }

    #[test]
    fn c_echo_round_trip_over_association() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server_thread = thread::spawn(move || {
            let (socket, _) = listener.accept().unwrap();
            let mut association = ServerAssociationOptions::new()
                .ae_title("STORE-SCP")
                .with_supported_abstract_syntax(VERIFICATION_SOP_CLASS, vec![IMPLICIT_VR_LE])
                .accept(socket)
                .unwrap();

            serve_one(&mut association, |request| {
                assert_eq!(request.command_field().unwrap(), CommandField::CEchoRq);
                let message_id = request.message_id().unwrap();
                Ok(c_echo_rsp(message_id, VERIFICATION_SOP_CLASS, Status::Success))
            })
            .unwrap();
        });

        let mut association = ClientAssociationOptions::new()
            .calling_ae_title("STORE-SCU")
            .called_ae_title("STORE-SCP")
            .with_abstract_syntax(VERIFICATION_SOP_CLASS)
            .with_transfer_syntax(IMPLICIT_VR_LE)
            .establish(addr)
            .unwrap();

        let presentation_context_id = association
            .presentation_context_for(VERIFICATION_SOP_CLASS)
            .unwrap()
            .id;

        let status = c_echo(&mut association, presentation_context_id, VERIFICATION_SOP_CLASS, 1)
            .unwrap();
        assert_eq!(status, Status::Success);

        server_thread.join().unwrap();
    }
}
