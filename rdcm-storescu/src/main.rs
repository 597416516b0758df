use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rdcm_app_common::{init_logging, ConnectionOptions};
use rdcm_object::DicomFile;
use rdcm_ul::association::client::ClientAssociationOptions;
use snafu::{Report, ResultExt, Snafu, Whatever};
use tracing::{error, info, warn};
use walkdir::WalkDir;

mod store_sync;
use store_sync::send_file;

/// DICOM C-STORE SCU
#[derive(Debug, Parser)]
#[command(version)]
struct App {
    /// socket address to Store SCP (example: "127.0.0.1:104")
    addr: String,
    /// the DICOM file(s) or directories to store
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// verbose mode
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
    /// the C-STORE message ID
    #[arg(short = 'm', long = "message-id", default_value = "1")]
    message_id: u16,
    /// fail immediately if not all DICOM files can be transferred
    #[arg(long = "fail-first")]
    fail_first: bool,
    #[command(flatten)]
    connection: ConnectionOptions,
}

#[derive(Debug, Snafu)]
enum Error {
    /// Could not establish association with SCP
    Establish { source: rdcm_ul::association::client::Error },

    /// No presentation context was accepted for SOP Class {sop_class_uid}
    NoPresentationContext { sop_class_uid: String },

    /// The negotiated presentation context does not match this file's own
    /// transfer syntax {uid}
    UnsupportedTransferSyntax { uid: String },

    /// Could not encode a file's data set
    Encode { source: rdcm_object::Error },

    /// Could not perform C-STORE exchange
    CStore { source: rdcm_ul::dimse::Error },

    #[snafu(whatever, display("{message}"))]
    Other {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error + 'static>, Some)))]
        source: Option<Box<dyn std::error::Error + 'static>>,
    },
}

fn main() {
    run().unwrap_or_else(|e| {
        error!("{}", Report::from_error(e));
        std::process::exit(-2);
    });
}

/// A file opened and validated to have a usable SOP Class/Instance UID
/// and transfer syntax.
struct PendingFile {
    path: PathBuf,
    dicom: DicomFile,
    sop_class_uid: String,
    sop_instance_uid: String,
}

fn collect_files(inputs: Vec<PathBuf>, verbose: bool) -> Vec<PendingFile> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(&input)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| !e.file_type().is_dir())
            {
                paths.push(entry.into_path());
            }
        } else {
            paths.push(input);
        }
    }

    let mut pending = Vec::with_capacity(paths.len());
    for path in paths {
        if verbose {
            info!("Opening file '{}'...", path.display());
        }
        match DicomFile::open(&path) {
            Ok(dicom) => {
                let sop_class_uid = dicom.meta().media_storage_sop_class_uid.clone();
                let sop_instance_uid = dicom.meta().media_storage_sop_instance_uid.clone();
                if !rdcm_dictionary_std::sop_class::is_storage(&sop_class_uid) {
                    warn!("Skipping '{}': not a storage SOP class ({})", path.display(), sop_class_uid);
                    continue;
                }
                pending.push(PendingFile { path, dicom, sop_class_uid, sop_instance_uid });
            }
            Err(e) => warn!("Could not open '{}' as DICOM: {}", path.display(), e),
        }
    }

    if pending.is_empty() {
        eprintln!("No supported files to transfer");
        std::process::exit(-1);
    }
    pending
}

fn run() -> Result<(), Error> {
    let App { addr, files, verbose, message_id, fail_first, connection } = App::parse();

    init_logging(verbose).unwrap_or_else(|e: Whatever| {
        eprintln!("[ERROR] {}", Report::from_error(e));
    });

    let pending = collect_files(files, verbose);

    // one abstract syntax per distinct SOP class, each offered the
    // transfer syntaxes of the files that use it plus the two
    // uncompressed syntaxes every SCP is required to support.
    let mut transfer_syntaxes_by_class: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for file in &pending {
        let ts_uid = file.dicom.dataset().transfer_syntax().uid.to_owned();
        let entry = transfer_syntaxes_by_class
            .entry(file.sop_class_uid.clone())
            .or_default();
        if !entry.contains(&ts_uid) {
            entry.push(ts_uid);
        }
    }
    for syntaxes in transfer_syntaxes_by_class.values_mut() {
        for fallback in ["1.2.840.10008.1.2.1", "1.2.840.10008.1.2"] {
            if !syntaxes.iter().any(|ts| ts == fallback) {
                syntaxes.push(fallback.to_owned());
            }
        }
    }

    info!("Establishing association with '{}'...", &addr);

    let mut association_opt = ClientAssociationOptions::new()
        .calling_ae_title(connection.calling_ae_title)
        .max_pdu_length(connection.max_pdu_length);
    for (sop_class_uid, transfer_syntaxes) in &transfer_syntaxes_by_class {
        association_opt = association_opt.with_abstract_syntax(sop_class_uid.clone());
        for ts in transfer_syntaxes {
            association_opt = association_opt.with_transfer_syntax(ts.clone());
        }
    }
    if let Some(called_ae_title) = connection.called_ae_title {
        association_opt = association_opt.called_ae_title(called_ae_title);
    }
    if let Some(timeout) = connection.timeout {
        association_opt = association_opt.timeout(Duration::from_secs(timeout));
    }

    let mut association = association_opt.establish(&addr).context(EstablishSnafu)?;
    info!("Association established");

    let progress_bar = if verbose {
        None
    } else {
        let pb = ProgressBar::new(pending.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} {wide_msg}")
                .expect("invalid progress bar template"),
        );
        pb.enable_steady_tick(Duration::from_millis(480));
        Some(pb)
    };

    let mut failures = 0usize;
    for file in &pending {
        let result = send_file(
            &mut association,
            &file.dicom,
            &file.sop_class_uid,
            &file.sop_instance_uid,
            message_id,
            verbose,
            fail_first,
            progress_bar.as_ref(),
        );
        if let Err(e) = result {
            failures += 1;
            error!("{}: {}", file.path.display(), Report::from_error(e));
            if fail_first {
                let _ = association.abort();
                std::process::exit(-2);
            }
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message("done");
    }

    let _ = association.release();

    if failures > 0 {
        warn!("{} of {} files failed to transfer", failures, pending.len());
    }
    Ok(())
}
