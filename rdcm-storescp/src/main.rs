use std::net::TcpListener;
use std::path::PathBuf;

use clap::Parser;
use rdcm_app_common::init_logging;
use rdcm_ul::association::server::ServerAssociationOptions;
use snafu::{Report, ResultExt, Snafu, Whatever};
use tracing::{error, info, warn};

mod store_sync;
mod transfer;

use store_sync::run_store_sync;
use transfer::{ABSTRACT_SYNTAXES, NATIVE_TRANSFER_SYNTAXES};

/// DICOM C-STORE SCP
#[derive(Debug, Parser)]
#[command(version)]
struct App {
    /// verbose mode
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// this node's AE title
    #[arg(short = 'a', long = "ae-title", default_value = "RDCM-STORE")]
    ae_title: String,

    /// require the calling AE title to match this node's AE title
    #[arg(short = 's', long = "strict")]
    strict: bool,

    /// only accept the two uncompressed transfer syntaxes
    #[arg(long = "uncompressed-only")]
    uncompressed_only: bool,

    /// max PDU length
    #[arg(short = 'm', long = "max-pdu-length", default_value = "16384")]
    max_pdu_length: u32,

    /// directory to write incoming instances to
    #[arg(short = 'o', long = "out-dir", default_value = ".")]
    out_dir: PathBuf,

    /// which port to listen on
    #[arg(short = 'p', long, default_value = "11111")]
    port: u16,
}

#[derive(Debug, Snafu)]
enum Error {
    /// could not bind to or accept on the listening socket
    Accept { source: rdcm_ul::association::server::Error },

    /// DIMSE message exchange failed
    Dimse { source: rdcm_ul::dimse::Error },

    #[snafu(display("no presentation context with ID {}", id))]
    NoPresentationContext { id: u8 },

    #[snafu(display("negotiated transfer syntax `{}` is not supported", uid))]
    TransferSyntax { uid: String },

    #[snafu(display("could not write instance to {}", path.display()))]
    WriteFile { source: rdcm_object::Error, path: PathBuf },

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

fn run() -> Result<(), Error> {
    let App {
        verbose,
        ae_title,
        strict,
        uncompressed_only,
        max_pdu_length,
        out_dir,
        port,
    } = App::parse();

    init_logging(verbose).unwrap_or_else(|e: Whatever| {
        eprintln!("[ERROR] {}", Report::from_error(e));
    });

    std::fs::create_dir_all(&out_dir).whatever_context("could not create output directory")?;

    let transfer_syntaxes: Vec<&str> = if uncompressed_only {
        NATIVE_TRANSFER_SYNTAXES.to_vec()
    } else {
        rdcm_transfer_syntax_registry::all()
            .filter(|ts| ts.is_fully_supported())
            .map(|ts| ts.uid)
            .collect()
    };

    let mut options = ServerAssociationOptions::new()
        .ae_title(ae_title.clone())
        .strict_ae_title(strict)
        .max_pdu_length(max_pdu_length);
    for abstract_syntax_uid in ABSTRACT_SYNTAXES {
        options = options.with_supported_abstract_syntax(*abstract_syntax_uid, transfer_syntaxes.clone());
    }

    let listener = TcpListener::bind(("0.0.0.0", port)).whatever_context("could not bind listener")?;
    info!("{} listening on port {}", ae_title, port);

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Could not accept incoming connection: {}", e);
                continue;
            }
        };

        let mut association = match options.clone().accept(stream).context(AcceptSnafu) {
            Ok(association) => association,
            Err(e) => {
                warn!("Could not negotiate association: {}", Report::from_error(e));
                continue;
            }
        };

        if let Err(e) = run_store_sync(&mut association, &out_dir, verbose) {
            warn!("Association ended with an error: {}", Report::from_error(e));
        }
    }

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
