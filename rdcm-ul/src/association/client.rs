//! Association requester module
use std::{
    borrow::Cow,
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use snafu::{ensure, OptionExt, ResultExt, Snafu};

use crate::pdu::{
    read_pdu, write_pdu, reader::DEFAULT_MAX_PDU, AssociationAC, AssociationRJ,
    AssociationRJResult, AssociationRJSource, AssociationRQ, Pdu, PresentationContextProposed,
    PresentationContextResultReason, UserIdentity,
};

use super::NegotiatedPresentationContext;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    /// missing abstract syntax to begin negotiation
    MissingAbstractSyntax,

    /// could not connect to server
    Connect { source: std::io::Error },

    /// failed to send association request
    SendRequest { source: crate::pdu::WriteError },

    /// failed to receive association response
    ReceiveResponse { source: crate::pdu::reader::Error },

    #[snafu(display("unexpected response from server `{:?}`", pdu))]
    #[non_exhaustive]
    UnexpectedResponse {
        /// the PDU obtained from the server
        pdu: Pdu,
    },

    #[snafu(display("unknown response from server, PDU type `{}`", pdu_type))]
    UnknownResponse { pdu_type: u8 },

    #[snafu(display("protocol version mismatch: expected {}, got {}", expected, got))]
    ProtocolVersionMismatch { expected: u16, got: u16 },

    /// the association was rejected by the server
    Rejected {
        association_result: AssociationRJResult,
        association_source: AssociationRJSource,
    },

    /// no presentation contexts accepted by the server
    NoAcceptedPresentationContexts,

    /// failed to send PDU message
    #[non_exhaustive]
    Send { source: crate::pdu::WriteError },

    /// failed to receive PDU message
    #[non_exhaustive]
    Receive { source: crate::pdu::reader::Error },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Resolve `address` and connect to the first reachable socket address,
/// bounding the attempt by `timeout` when given.
fn connect<A: ToSocketAddrs>(address: A, timeout: Option<Duration>) -> std::io::Result<TcpStream> {
    let Some(timeout) = timeout else {
        return TcpStream::connect(address);
    };

    let mut last_err = None;
    for addr in address.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "no addresses to connect to")
    }))
}

/// A DICOM association builder for a requesting node (SCU).
///
/// This is the standard way of requesting and establishing
/// an association with another DICOM node,
/// which usually takes the role of a service class provider (SCP).
///
/// # Example
///
/// ```no_run
/// # use rdcm_ul::association::client::ClientAssociationOptions;
///
/// # fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let association = ClientAssociationOptions::new()
///    .with_abstract_syntax("1.2.840.10008.1.1")
///    .with_transfer_syntax("1.2.840.10008.1.2.1")
///    .establish("129.168.0.5:104")?;
/// # Ok(())
/// # }
/// ```
///
/// Multiple abstract syntaxes may be proposed by calling
/// [`with_abstract_syntax`](Self::with_abstract_syntax) repeatedly;
/// each is offered the same set of transfer syntaxes.
/// By default, the requester proposes
/// _Implicit VR Little Endian_ and _Explicit VR Little Endian_.
#[derive(Debug, Clone)]
pub struct ClientAssociationOptions {
    /// the calling AE title
    calling_ae_title: Cow<'static, str>,
    /// the called AE title
    called_ae_title: Cow<'static, str>,
    /// the requested application context name
    application_context_name: Cow<'static, str>,
    /// the list of requested abstract syntaxes
    abstract_syntax_uids: Vec<Cow<'static, str>>,
    /// the list of requested transfer syntaxes, offered for every abstract syntax
    transfer_syntax_uids: Vec<Cow<'static, str>>,
    /// an optional user identity to negotiate
    user_identity: Option<UserIdentity>,
    /// the expected protocol version
    protocol_version: u16,
    /// the maximum PDU length to advertise and enforce
    max_pdu_length: u32,
    /// connect and read timeout, if any
    timeout: Option<Duration>,
}

impl Default for ClientAssociationOptions {
    fn default() -> Self {
        ClientAssociationOptions {
            calling_ae_title: "THIS-SCU".into(),
            called_ae_title: "ANY-SCP".into(),
            application_context_name: "1.2.840.10008.3.1.1.1".into(),
            abstract_syntax_uids: Vec::new(),
            transfer_syntax_uids: Vec::new(),
            user_identity: None,
            protocol_version: 1,
            max_pdu_length: DEFAULT_MAX_PDU,
            timeout: None,
        }
    }
}

impl ClientAssociationOptions {
    /// Create a new set of options for establishing an association.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define the calling application entity title for the association,
    /// which refers to this DICOM node.
    ///
    /// The default is `THIS-SCU`.
    pub fn calling_ae_title<T>(mut self, calling_ae_title: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        self.calling_ae_title = calling_ae_title.into();
        self
    }

    /// Define the called application entity title for the association,
    /// which refers to the target DICOM node.
    ///
    /// The default is `ANY-SCP`.
    pub fn called_ae_title<T>(mut self, called_ae_title: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        self.called_ae_title = called_ae_title.into();
        self
    }

    /// Include this abstract syntax
    /// in the list of proposed presentation contexts.
    pub fn with_abstract_syntax<T>(mut self, abstract_syntax_uid: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        self.abstract_syntax_uids.push(abstract_syntax_uid.into());
        self
    }

    /// Include this transfer syntax in each proposed presentation context.
    pub fn with_transfer_syntax<T>(mut self, transfer_syntax_uid: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        self.transfer_syntax_uids.push(transfer_syntax_uid.into());
        self
    }

    /// Negotiate a user identity along with the association.
    pub fn user_identity(mut self, user_identity: UserIdentity) -> Self {
        self.user_identity = Some(user_identity);
        self
    }

    /// Override the maximum PDU length that this node will accept.
    pub fn max_pdu_length(mut self, value: u32) -> Self {
        self.max_pdu_length = value;
        self
    }

    /// Bound how long the connection attempt and every subsequent read
    /// may take. Unset by default, meaning no timeout is applied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Initiate the TCP connection and negotiate the association.
    pub fn establish<A: ToSocketAddrs>(self, address: A) -> Result<ClientAssociation> {
        let ClientAssociationOptions {
            calling_ae_title,
            called_ae_title,
            application_context_name,
            abstract_syntax_uids,
            mut transfer_syntax_uids,
            user_identity,
            protocol_version,
            max_pdu_length,
            timeout,
        } = self;

        // fail if no abstract syntaxes were provided: they represent intent,
        // should not be omitted by the user
        ensure!(!abstract_syntax_uids.is_empty(), MissingAbstractSyntaxSnafu);

        // provide default transfer syntaxes
        if transfer_syntax_uids.is_empty() {
            // Explicit VR Little Endian
            transfer_syntax_uids.push("1.2.840.10008.1.2.1".into());
            // Implicit VR Little Endian
            transfer_syntax_uids.push("1.2.840.10008.1.2".into());
        }

        let presentation_contexts: Vec<_> = abstract_syntax_uids
            .into_iter()
            .enumerate()
            .map(|(i, abstract_syntax)| PresentationContextProposed {
                id: (i as u8) * 2 + 1,
                abstract_syntax: abstract_syntax.to_string(),
                transfer_syntaxes: transfer_syntax_uids
                    .iter()
                    .map(|uid| uid.to_string())
                    .collect(),
            })
            .collect();

        let mut user_variables = vec![crate::pdu::UserVariableItem::MaxLength(max_pdu_length)];
        if let Some(user_identity) = user_identity {
            user_variables.push(crate::pdu::UserVariableItem::UserIdentityItem(user_identity));
        }

        let msg = Pdu::AssociationRQ(AssociationRQ {
            protocol_version,
            calling_ae_title: calling_ae_title.to_string(),
            called_ae_title: called_ae_title.to_string(),
            application_context_name: application_context_name.to_string(),
            presentation_contexts: presentation_contexts.clone(),
            user_variables,
        });

        let mut socket = connect(address, timeout).context(ConnectSnafu)?;
        socket.set_read_timeout(timeout).context(ConnectSnafu)?;

        write_pdu(&mut socket, &msg).context(SendRequestSnafu)?;

        let msg =
            read_pdu(&mut socket, max_pdu_length, true).context(ReceiveResponseSnafu)?;

        match msg {
            Pdu::AssociationAC(AssociationAC {
                protocol_version: protocol_version_scp,
                presentation_contexts: presentation_contexts_scp,
                ..
            }) => {
                ensure!(
                    protocol_version == protocol_version_scp,
                    ProtocolVersionMismatchSnafu {
                        expected: protocol_version,
                        got: protocol_version_scp,
                    }
                );

                let accepted: Vec<NegotiatedPresentationContext> = presentation_contexts_scp
                    .into_iter()
                    .filter(|c| c.reason == PresentationContextResultReason::Acceptance)
                    .filter_map(|c| {
                        let proposed = presentation_contexts.iter().find(|p| p.id == c.id)?;
                        Some(NegotiatedPresentationContext {
                            id: c.id,
                            abstract_syntax_uid: proposed.abstract_syntax.clone(),
                            transfer_syntax_uid: c.transfer_syntax,
                        })
                    })
                    .collect();

                ensure!(!accepted.is_empty(), NoAcceptedPresentationContextsSnafu);

                Ok(ClientAssociation {
                    presentation_contexts: accepted,
                    max_pdu_length,
                    socket,
                })
            }
            Pdu::AssociationRJ(AssociationRJ { result, source }) => RejectedSnafu {
                association_result: result,
                association_source: source,
            }
            .fail(),
            Pdu::Unknown { pdu_type, .. } => UnknownResponseSnafu { pdu_type }.fail(),
            pdu => UnexpectedResponseSnafu { pdu }.fail(),
        }
    }
}

/// A DICOM upper layer association from the perspective
/// of the node that requested it.
#[derive(Debug)]
pub struct ClientAssociation {
    /// The presentation contexts accorded during negotiation
    presentation_contexts: Vec<NegotiatedPresentationContext>,
    /// The maximum PDU length
    max_pdu_length: u32,
    /// The TCP stream to the other DICOM node
    socket: TcpStream,
}

impl ClientAssociation {
    /// List the presentation contexts accorded during negotiation.
    pub fn presentation_contexts(&self) -> &[NegotiatedPresentationContext] {
        &self.presentation_contexts
    }

    /// Find the presentation context negotiated for the given abstract syntax.
    pub fn presentation_context_for(
        &self,
        abstract_syntax_uid: &str,
    ) -> Option<&NegotiatedPresentationContext> {
        self.presentation_contexts
            .iter()
            .find(|c| c.abstract_syntax_uid == abstract_syntax_uid)
    }

    /// The maximum PDU length negotiated for this association.
    pub fn max_pdu_length(&self) -> u32 {
        self.max_pdu_length
    }

    /// Send a PDU message to the other intervenient.
    pub fn send(&mut self, msg: &Pdu) -> Result<()> {
        write_pdu(&mut self.socket, msg).context(SendSnafu)
    }

    /// Read a PDU message from the other intervenient.
    pub fn receive(&mut self) -> Result<Pdu> {
        read_pdu(&mut self.socket, self.max_pdu_length, true).context(ReceiveSnafu)
    }

    /// Obtain a writer for P-Data fragments over the given presentation context.
    pub fn send_pdata(&mut self, presentation_context_id: u8) -> super::pdata::PDataWriter<&mut TcpStream> {
        super::pdata::PDataWriter::new(&mut self.socket, presentation_context_id, self.max_pdu_length)
    }

    /// Gracefully release the association.
    pub fn release(&mut self) -> Result<()> {
        write_pdu(&mut self.socket, &Pdu::ReleaseRQ).context(SendSnafu)?;

        let pdu = read_pdu(&mut self.socket, self.max_pdu_length, true).context(ReceiveSnafu)?;

        match pdu {
            Pdu::ReleaseRP => {}
            Pdu::Unknown { pdu_type, .. } => return UnknownResponseSnafu { pdu_type }.fail(),
            pdu => return UnexpectedResponseSnafu { pdu }.fail(),
        }

        let _ = self.socket.shutdown(std::net::Shutdown::Both);
        Ok(())
    }

    /// Abort the association immediately, without a graceful release.
    pub fn abort(&mut self) -> Result<()> {
        write_pdu(
            &mut self.socket,
            &Pdu::AbortRQ {
                source: crate::pdu::AbortRQSource::ServiceUser,
            },
        )
        .context(SendSnafu)?;
        let _ = self.socket.shutdown(std::net::Shutdown::Both);
        Ok(())
    }
}

impl Drop for ClientAssociation {
    fn drop(&mut self) {
        let _ = self.release();
    }
}
