//! The per-file C-STORE exchange: pick a negotiated presentation
//! context matching the file's own transfer syntax, encode its data
//! set, and run the C-STORE request/response round trip.

use indicatif::ProgressBar;
use snafu::{OptionExt, ResultExt};
use tracing::{debug, error, info, warn};

use rdcm_object::DicomFile;
use rdcm_ul::association::client::ClientAssociation;
use rdcm_ul::dimse::{c_store, Priority, Status};

use crate::{CStoreSnafu, EncodeSnafu, NoPresentationContextSnafu, UnsupportedTransferSyntaxSnafu, Error};

/// Find the presentation context accepted for `sop_class_uid` whose
/// negotiated transfer syntax matches the file's own. This toolkit
/// does not transcode, so anything else is a hard failure.
pub fn pick_presentation_context(
    association: &ClientAssociation,
    sop_class_uid: &str,
    file_ts_uid: &str,
) -> Result<u8, Error> {
    let pc = association
        .presentation_context_for(sop_class_uid)
        .context(NoPresentationContextSnafu {
            sop_class_uid: sop_class_uid.to_owned(),
        })?;
    if pc.transfer_syntax_uid != file_ts_uid {
        return UnsupportedTransferSyntaxSnafu {
            uid: file_ts_uid.to_owned(),
        }
        .fail();
    }
    Ok(pc.id)
}

pub fn send_file(
    association: &mut ClientAssociation,
    file: &DicomFile,
    sop_class_uid: &str,
    sop_instance_uid: &str,
    message_id: u16,
    verbose: bool,
    fail_first: bool,
    progress_bar: Option<&ProgressBar>,
) -> Result<(), Error> {
    if let Some(pb) = progress_bar {
        pb.set_message(sop_instance_uid.to_owned());
    }

    let file_ts_uid = file.dataset().transfer_syntax().uid;
    let pc_id = pick_presentation_context(association, sop_class_uid, file_ts_uid)?;

    let mut dataset = Vec::with_capacity(2048);
    file.dataset()
        .write_dataset(&mut dataset)
        .context(EncodeSnafu)?;

    if verbose {
        info!(
            "Sending file (~{} kB), sop_instance={}, sop_class={}, ts={}, pc={}",
            dataset.len() / 1_000,
            sop_instance_uid,
            sop_class_uid,
            file_ts_uid,
            pc_id,
        );
    }

    let status = c_store(
        association,
        pc_id,
        sop_class_uid,
        sop_instance_uid,
        message_id,
        Priority::Medium,
        dataset,
    )
    .context(CStoreSnafu)?;

    match status {
        Status::Success => {
            if verbose {
                info!("Successfully stored instance {}", sop_instance_uid);
            }
        }
        Status::Warning(code) => {
            warn!("Possible issue storing instance `{}` (status code {:04X}H)", sop_instance_uid, code);
        }
        Status::Pending => {
            warn!("Possible issue storing instance `{}`: status is pending", sop_instance_uid);
        }
        Status::Cancel => {
            error!("Could not store instance `{}`: operation cancelled", sop_instance_uid);
            if fail_first {
                let _ = association.abort();
                std::process::exit(-2);
            }
        }
        Status::Failure(code) => {
            error!("Failed to store instance `{}` (status code {:04X}H)", sop_instance_uid, code);
            if fail_first {
                let _ = association.abort();
                std::process::exit(-2);
            }
        }
    }

    if let Some(pb) = progress_bar {
        pb.inc(1);
    }
    debug!("done sending instance {}", sop_instance_uid);
    Ok(())
}
