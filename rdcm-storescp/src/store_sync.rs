//! The per-association dispatch loop: accept C-ECHO and C-STORE
//! requests until the requester releases or aborts.

use std::path::Path;

use snafu::{OptionExt, ResultExt};
use tracing::{debug, info, warn};

use rdcm_object::{DicomFile, FileMetaTable};
use rdcm_ul::association::server::ServerAssociation;
use rdcm_ul::dimse::{c_echo_rsp, c_store_rsp, receive_message, send_message, CommandField, Status};
use rdcm_ul::Pdu;

use crate::{DimseSnafu, Error, NoPresentationContextSnafu, TransferSyntaxSnafu, WriteFileSnafu};

/// Run one association to completion: answer every C-ECHO and C-STORE
/// request it carries, writing stored instances under `out_dir`, until
/// the requester sends A-RELEASE-RQ or A-ABORT.
pub fn run_store_sync(
    association: &mut ServerAssociation,
    out_dir: &Path,
    verbose: bool,
) -> Result<(), Error> {
    info!("New association from {}", association.calling_ae_title());
    debug!("Presentation contexts: {:?}", association.presentation_contexts());

    loop {
        let (pc_id, message) = match receive_message(association) {
            Ok(pair) => pair,
            Err(rdcm_ul::dimse::Error::UnexpectedPdu { pdu: Pdu::ReleaseRQ }) => {
                let _ = association.send(&Pdu::ReleaseRP);
                info!("Association released");
                return Ok(());
            }
            Err(rdcm_ul::dimse::Error::UnexpectedPdu { pdu: Pdu::AbortRQ { source } }) => {
                warn!("Association aborted by requester: {:?}", source);
                return Ok(());
            }
            Err(e) => return Err(e).context(DimseSnafu),
        };

        let command_field = message.command_field().context(DimseSnafu)?;
        match command_field {
            CommandField::CEchoRq => {
                let sop_class_uid = message.affected_sop_class_uid().context(DimseSnafu)?;
                let message_id = message.message_id().context(DimseSnafu)?;
                if verbose {
                    info!("Received C-ECHO-RQ (message ID {})", message_id);
                }
                let rsp = c_echo_rsp(message_id, &sop_class_uid, Status::Success);
                send_message(association, pc_id, &rsp).context(DimseSnafu)?;
            }
            CommandField::CStoreRq => {
                let sop_class_uid = message.affected_sop_class_uid().context(DimseSnafu)?;
                let sop_instance_uid = message.affected_sop_instance_uid().context(DimseSnafu)?;
                let message_id = message.message_id().context(DimseSnafu)?;

                let pc = association
                    .presentation_contexts()
                    .iter()
                    .find(|pc| pc.id == pc_id)
                    .cloned()
                    .context(NoPresentationContextSnafu { id: pc_id })?;
                let ts = rdcm_transfer_syntax_registry::get(&pc.transfer_syntax_uid)
                    .context(TransferSyntaxSnafu { uid: pc.transfer_syntax_uid.clone() })?;

                let dataset = message.dataset(ts).context(DimseSnafu)?;
                let meta = FileMetaTable::new(
                    sop_class_uid.clone(),
                    sop_instance_uid.clone(),
                    pc.transfer_syntax_uid.clone(),
                );
                let file = DicomFile::new(meta, dataset);

                let path = out_dir.join(format!("{}.dcm", sop_instance_uid));
                file.write_to_file(&path).context(WriteFileSnafu { path: path.clone() })?;

                if verbose {
                    info!(
                        "Stored instance {} ({}) at {}",
                        sop_instance_uid,
                        sop_class_uid,
                        path.display()
                    );
                }

                let rsp = c_store_rsp(message_id, &sop_class_uid, &sop_instance_uid, Status::Success);
                send_message(association, pc_id, &rsp).context(DimseSnafu)?;
            }
            other => {
                warn!("Ignoring unsupported command field {:?}", other);
            }
        }
    }
}
