//! Association acceptor module
use std::{
    borrow::Cow,
    net::{TcpListener, TcpStream},
};

use snafu::{ResultExt, Snafu};

use crate::pdu::{
    read_pdu, reader::DEFAULT_MAX_PDU, write_pdu, AssociationAC, AssociationRJ,
    AssociationRJResult, AssociationRJServiceUserReason, AssociationRJSource, AssociationRQ,
    Pdu, PresentationContextResult, PresentationContextResultReason, UserVariableItem,
};

use super::NegotiatedPresentationContext;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    /// could not accept the incoming TCP connection
    Accept { source: std::io::Error },

    /// failed to receive association request
    ReceiveRequest { source: crate::pdu::reader::Error },

    #[snafu(display("unexpected request from client `{:?}`", pdu))]
    UnexpectedRequest { pdu: Pdu },

    #[snafu(display("unknown request from client, PDU type `{}`", pdu_type))]
    UnknownRequest { pdu_type: u8 },

    /// failed to send association response
    SendResponse { source: crate::pdu::WriteError },

    /// the requester proposed an application context that is not supported
    #[snafu(display("application context `{}` is not supported", name))]
    UnsupportedApplicationContext { name: String },

    /// none of the proposed presentation contexts could be accepted
    NoAcceptablePresentationContexts,

    /// failed to send PDU message
    #[non_exhaustive]
    Send { source: crate::pdu::WriteError },

    /// failed to receive PDU message
    #[non_exhaustive]
    Receive { source: crate::pdu::reader::Error },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A presentation context this acceptor is willing to negotiate,
/// described by its abstract syntax and the transfer syntaxes it supports for it.
#[derive(Debug, Clone)]
pub struct SupportedAbstractSyntax {
    pub abstract_syntax_uid: Cow<'static, str>,
    pub transfer_syntax_uids: Vec<Cow<'static, str>>,
}

/// A DICOM association builder for an accepting node (SCP).
///
/// This negotiates incoming association requests against a fixed
/// list of supported abstract syntaxes and transfer syntaxes,
/// accepting the presentation contexts for which a compatible
/// transfer syntax is proposed and rejecting the rest.
///
/// # Example
///
/// ```no_run
/// # use std::net::TcpListener;
/// # use rdcm_ul::association::server::ServerAssociationOptions;
/// # fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let listener = TcpListener::bind("0.0.0.0:104")?;
/// let (stream, _addr) = listener.accept()?;
/// let association = ServerAssociationOptions::new()
///     .ae_title("MY-SCP")
///     .with_supported_abstract_syntax("1.2.840.10008.1.1", ["1.2.840.10008.1.2.1"])
///     .accept(stream)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ServerAssociationOptions {
    ae_title: Cow<'static, str>,
    application_context_name: Cow<'static, str>,
    supported_abstract_syntaxes: Vec<SupportedAbstractSyntax>,
    protocol_version: u16,
    max_pdu_length: u32,
    strict_ae_title: bool,
}

impl Default for ServerAssociationOptions {
    fn default() -> Self {
        ServerAssociationOptions {
            ae_title: "ANY-SCP".into(),
            application_context_name: "1.2.840.10008.3.1.1.1".into(),
            supported_abstract_syntaxes: Vec::new(),
            protocol_version: 1,
            max_pdu_length: DEFAULT_MAX_PDU,
            strict_ae_title: false,
        }
    }
}

impl ServerAssociationOptions {
    /// Create a new set of options for accepting an association.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define the application entity title of this node.
    ///
    /// The default is `ANY-SCP`.
    pub fn ae_title<T>(mut self, ae_title: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        self.ae_title = ae_title.into();
        self
    }

    /// Require the called AE title in the request to match this node's AE title.
    pub fn strict_ae_title(mut self, strict: bool) -> Self {
        self.strict_ae_title = strict;
        self
    }

    /// Declare support for the given abstract syntax, restricted to the given
    /// transfer syntaxes.
    pub fn with_supported_abstract_syntax<T, I, U>(
        mut self,
        abstract_syntax_uid: T,
        transfer_syntax_uids: I,
    ) -> Self
    where
        T: Into<Cow<'static, str>>,
        I: IntoIterator<Item = U>,
        U: Into<Cow<'static, str>>,
    {
        self.supported_abstract_syntaxes.push(SupportedAbstractSyntax {
            abstract_syntax_uid: abstract_syntax_uid.into(),
            transfer_syntax_uids: transfer_syntax_uids.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Override the maximum PDU length that this node will accept.
    pub fn max_pdu_length(mut self, value: u32) -> Self {
        self.max_pdu_length = value;
        self
    }

    /// Bind a TCP listener and block until a single incoming association is negotiated.
    pub fn listen(self, address: impl std::net::ToSocketAddrs) -> Result<ServerAssociation> {
        let listener = TcpListener::bind(address).context(AcceptSnafu)?;
        let (stream, _addr) = listener.accept().context(AcceptSnafu)?;
        self.accept(stream)
    }

    /// Negotiate an association over an already-accepted TCP stream.
    pub fn accept(self, mut socket: TcpStream) -> Result<ServerAssociation> {
        let ServerAssociationOptions {
            ae_title,
            application_context_name,
            supported_abstract_syntaxes,
            protocol_version,
            max_pdu_length,
            strict_ae_title,
        } = self;

        let request = read_pdu(&mut socket, max_pdu_length, true).context(ReceiveRequestSnafu)?;

        let AssociationRQ {
            calling_ae_title,
            called_ae_title,
            application_context_name: requested_context,
            presentation_contexts,
            user_variables,
            ..
        } = match request {
            Pdu::AssociationRQ(rq) => rq,
            Pdu::Unknown { pdu_type, .. } => return UnknownRequestSnafu { pdu_type }.fail(),
            pdu => return UnexpectedRequestSnafu { pdu }.fail(),
        };

        if strict_ae_title && called_ae_title.trim() != ae_title {
            let rj = Pdu::AssociationRJ(AssociationRJ {
                result: AssociationRJResult::Permanent,
                source: AssociationRJSource::ServiceUser(
                    AssociationRJServiceUserReason::CalledAETitleNotRecognized,
                ),
            });
            let _ = write_pdu(&mut socket, &rj);
            return UnsupportedApplicationContextSnafu {
                name: called_ae_title,
            }
            .fail();
        }

        if requested_context != application_context_name {
            let rj = Pdu::AssociationRJ(AssociationRJ {
                result: AssociationRJResult::Permanent,
                source: AssociationRJSource::ServiceUser(
                    AssociationRJServiceUserReason::ApplicationContextNameNotSupported,
                ),
            });
            let _ = write_pdu(&mut socket, &rj);
            return UnsupportedApplicationContextSnafu {
                name: requested_context,
            }
            .fail();
        }

        let negotiated_max_pdu_length = user_variables
            .iter()
            .find_map(|v| match v {
                UserVariableItem::MaxLength(len) => Some(*len),
                _ => None,
            })
            .unwrap_or(max_pdu_length)
            .min(max_pdu_length);

        let mut results = Vec::with_capacity(presentation_contexts.len());
        let mut accepted = Vec::new();

        for proposed in &presentation_contexts {
            let supported = supported_abstract_syntaxes
                .iter()
                .find(|s| s.abstract_syntax_uid == proposed.abstract_syntax);

            let chosen_transfer_syntax = supported.and_then(|supported| {
                proposed
                    .transfer_syntaxes
                    .iter()
                    .find(|ts| supported.transfer_syntax_uids.iter().any(|s| s == ts.as_str()))
            });

            match chosen_transfer_syntax {
                Some(transfer_syntax) => {
                    results.push(PresentationContextResult {
                        id: proposed.id,
                        reason: PresentationContextResultReason::Acceptance,
                        transfer_syntax: transfer_syntax.clone(),
                    });
                    accepted.push(NegotiatedPresentationContext {
                        id: proposed.id,
                        abstract_syntax_uid: proposed.abstract_syntax.clone(),
                        transfer_syntax_uid: transfer_syntax.clone(),
                    });
                }
                None if supported.is_none() => {
                    results.push(PresentationContextResult {
                        id: proposed.id,
                        reason: PresentationContextResultReason::AbstractSyntaxNotSupported,
                        transfer_syntax: proposed
                            .transfer_syntaxes
                            .first()
                            .cloned()
                            .unwrap_or_default(),
                    });
                }
                None => {
                    results.push(PresentationContextResult {
                        id: proposed.id,
                        reason: PresentationContextResultReason::TransferSyntaxesNotSupported,
                        transfer_syntax: proposed
                            .transfer_syntaxes
                            .first()
                            .cloned()
                            .unwrap_or_default(),
                    });
                }
            }
        }

        if accepted.is_empty() {
            let rj = Pdu::AssociationRJ(AssociationRJ {
                result: AssociationRJResult::Permanent,
                source: AssociationRJSource::ServiceUser(
                    AssociationRJServiceUserReason::NoReasonGiven,
                ),
            });
            let _ = write_pdu(&mut socket, &rj);
            return NoAcceptablePresentationContextsSnafu.fail();
        }

        let response = Pdu::AssociationAC(AssociationAC {
            protocol_version,
            application_context_name: application_context_name.to_string(),
            called_ae_title: called_ae_title.clone(),
            calling_ae_title: calling_ae_title.clone(),
            presentation_contexts: results,
            user_variables: vec![UserVariableItem::MaxLength(negotiated_max_pdu_length)],
        });

        write_pdu(&mut socket, &response).context(SendResponseSnafu)?;

        Ok(ServerAssociation {
            calling_ae_title,
            presentation_contexts: accepted,
            max_pdu_length: negotiated_max_pdu_length,
            socket,
        })
    }
}

/// A DICOM upper layer association from the perspective
/// of the node that accepted it.
#[derive(Debug)]
pub struct ServerAssociation {
    /// The AE title presented by the requesting node
    calling_ae_title: String,
    /// The presentation contexts accorded during negotiation
    presentation_contexts: Vec<NegotiatedPresentationContext>,
    /// The maximum PDU length
    max_pdu_length: u32,
    /// The TCP stream to the other DICOM node
    socket: TcpStream,
}

impl ServerAssociation {
    /// The AE title presented by the requesting node.
    pub fn calling_ae_title(&self) -> &str {
        &self.calling_ae_title
    }

    /// List the presentation contexts accorded during negotiation.
    pub fn presentation_contexts(&self) -> &[NegotiatedPresentationContext] {
        &self.presentation_contexts
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
    pub fn send_pdata(
        &mut self,
        presentation_context_id: u8,
    ) -> super::pdata::PDataWriter<&mut TcpStream> {
        super::pdata::PDataWriter::new(&mut self.socket, presentation_context_id, self.max_pdu_length)
    }

    /// Acknowledge a release request from the requesting node.
    pub fn release(&mut self) -> Result<()> {
        write_pdu(&mut self.socket, &Pdu::ReleaseRP).context(SendSnafu)?;
        let _ = self.socket.shutdown(std::net::Shutdown::Both);
        Ok(())
    }

    /// Abort the association immediately, without a graceful release.
    pub fn abort(&mut self) -> Result<()> {
        write_pdu(
            &mut self.socket,
            &Pdu::AbortRQ {
                source: crate::pdu::AbortRQSource::ServiceProvider(
                    crate::pdu::AbortRQServiceProviderReason::ReasonNotSpecified,
                ),
            },
        )
        .context(SendSnafu)?;
        let _ = self.socket.shutdown(std::net::Shutdown::Both);
        Ok(())
    }
}
