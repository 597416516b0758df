use std::io::BufRead as _;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rdcm_app_common::{init_logging, ConnectionOptions};
use rdcm_core::{Header, TransferSyntax};
use rdcm_dictionary_std::{entry_by_alias, uids};
use rdcm_object::InMemDicomObject;
use rdcm_ul::association::client::ClientAssociationOptions;
use rdcm_ul::dimse::{c_move, Priority, Status, SubOperationProgress};
use snafu::{whatever, OptionExt, ResultExt, Snafu, Whatever};
use tracing::{debug, error, info, warn};

mod query;
use query::parse_queries;

/// DICOM C-MOVE SCU
#[derive(Debug, Parser)]
#[command(version)]
struct App {
    /// socket address to MOVE SCP (example: "127.0.0.1:1045")
    addr: String,
    /// a DICOM file representing the query object
    file: Option<PathBuf>,
    /// a file containing lines of queries
    #[arg(long)]
    query_file: Option<PathBuf>,
    /// a sequence of queries, each in the form `Field=Value`
    #[arg(short('q'))]
    query: Vec<String>,

    /// the C-MOVE destination AE title, naming the storage SCP the
    /// remote node should send matching instances to
    #[arg(long = "move-destination", default_value = "RDCM")]
    move_destination: String,

    /// verbose mode
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
    /// the C-MOVE message ID
    #[arg(short = 'm', long = "message-id", default_value = "1")]
    message_id: u16,
    #[command(flatten)]
    connection: ConnectionOptions,

    /// use patient root information model
    #[arg(short = 'P', long, conflicts_with = "study")]
    patient: bool,
    /// use study root information model (default)
    #[arg(short = 'S', long, conflicts_with = "patient")]
    study: bool,
}

fn main() {
    run().unwrap_or_else(|e| {
        error!("{}", snafu::Report::from_error(e));
        std::process::exit(-2);
    });
}

#[derive(Debug, Snafu)]
enum Error {
    /// Could not establish association with SCP
    Establish { source: rdcm_ul::association::client::Error },

    /// Could not perform C-MOVE exchange
    Move { source: rdcm_ul::dimse::Error },

    #[snafu(whatever, display("{message}"))]
    Other {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error + 'static>, Some)))]
        source: Option<Box<dyn std::error::Error + 'static>>,
    },
}

/// Rebuild `obj`'s elements under a different transfer syntax, so the
/// identifier can be re-encoded for whatever syntax ended up negotiated.
fn retarget(obj: &InMemDicomObject, ts: TransferSyntax) -> InMemDicomObject {
    use rdcm_core::Value;

    let mut out = InMemDicomObject::new_empty(ts);
    for el in obj.iter() {
        match el.value() {
            Value::Primitive(v) => out.put_primitive(el.tag(), el.vr(), v.clone()),
            Value::Sequence { items, .. } => out.put_sequence(el.tag(), items.clone()),
            Value::PixelSequence { fragments, offset_table } => {
                out.put_pixel_sequence(fragments.clone(), offset_table.clone())
            }
        }
    }
    out
}

fn build_query(
    file: Option<PathBuf>,
    query_file: Option<PathBuf>,
    q: Vec<String>,
    patient: bool,
    study: bool,
    ts: TransferSyntax,
) -> Result<InMemDicomObject, Error> {
    let (mut obj, mut has_base) = if let Some(file) = file {
        info!("Opening file '{}'...", file.display());
        let file = rdcm_object::DicomFile::open(&file).whatever_context("Could not open query file")?;
        (retarget(file.dataset(), ts), true)
    } else {
        (InMemDicomObject::new_empty(ts), false)
    };

    if let Some(query_file) = query_file {
        let mut queries = Vec::new();
        let file = std::fs::File::open(query_file).whatever_context("Could not open query text file")?;
        let reader = std::io::BufReader::new(file);
        for line in reader.lines() {
            let line = line.whatever_context("Could not read line from query file")?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            queries.push(line.to_owned());
        }
        obj = parse_queries(obj, &queries).whatever_context("Could not build query from query file")?;
        has_base = true;
    }

    if q.is_empty() && !has_base {
        whatever!("Query not specified");
    }
    obj = parse_queries(obj, &q).whatever_context("Could not build query from terms")?;

    let qr_level_tag = entry_by_alias("QueryRetrieveLevel")
        .whatever_context("dictionary is missing QueryRetrieveLevel")?
        .tag;
    if obj.get(qr_level_tag).is_none() {
        let level = if patient && !study { "PATIENT" } else { "STUDY" };
        obj.put_str(qr_level_tag, rdcm_core::VR::CS, level);
    }

    Ok(obj)
}

fn report_progress(i: u32, progress: SubOperationProgress) {
    info!(
        "Sub-operations after response #{}: {} remaining, {} completed, {} failed, {} warning",
        i, progress.remaining, progress.completed, progress.failed, progress.warning,
    );
}

fn run() -> Result<(), Error> {
    let App {
        addr,
        file,
        query_file,
        query,
        move_destination,
        verbose,
        message_id,
        connection,
        patient,
        study,
    } = App::parse();

    init_logging(verbose).unwrap_or_else(|e: Whatever| {
        eprintln!("[ERROR] {}", snafu::Report::from_error(e));
    });

    let abstract_syntax = if patient {
        uids::PATIENT_ROOT_QR_MOVE
    } else {
        uids::STUDY_ROOT_QR_MOVE
    };

    info!("Establishing association with '{}'...", &addr);

    let mut association_opt = ClientAssociationOptions::new()
        .with_abstract_syntax(abstract_syntax)
        .calling_ae_title(connection.calling_ae_title)
        .max_pdu_length(connection.max_pdu_length);
    if let Some(called_ae_title) = connection.called_ae_title {
        association_opt = association_opt.called_ae_title(called_ae_title);
    }
    if let Some(timeout) = connection.timeout {
        association_opt = association_opt.timeout(Duration::from_secs(timeout));
    }

    let mut association = association_opt.establish(&addr).context(EstablishSnafu)?;
    info!("Association established");

    let pc = association
        .presentation_context_for(abstract_syntax)
        .whatever_context("No presentation context accepted")?;
    let pc_id = pc.id;
    let ts = rdcm_transfer_syntax_registry::get(&pc.transfer_syntax_uid)
        .whatever_context("Poorly negotiated transfer syntax")?;

    debug!("Transfer syntax: {:?}", ts);

    let identifier = build_query(file, query_file, query, patient, study, ts)?;
    let mut encoded = Vec::new();
    identifier
        .write_dataset(&mut encoded)
        .whatever_context("Could not encode query identifier")?;

    let mut i = 0u32;
    let status = c_move(
        &mut association,
        pc_id,
        abstract_syntax,
        message_id,
        Priority::Medium,
        &move_destination,
        encoded,
        |progress| {
            if verbose {
                report_progress(i, progress);
            }
            i += 1;
        },
    )
    .context(MoveSnafu)?;

    match status {
        Status::Success => debug!("Move is complete"),
        Status::Failure(code) => warn!("Operation failed (status code {:04X}H)", code),
        Status::Cancel => warn!("Operation cancelled"),
        other => debug!("Final status: {:?}", other),
    }

    let _ = association.release();

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::App;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        App::command().debug_assert();
    }
}
