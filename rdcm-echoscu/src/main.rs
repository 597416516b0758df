use clap::Parser;
use rdcm_app_common::{init_logging, ConnectionOptions};
use rdcm_dictionary_std::uids;
use rdcm_ul::association::client::ClientAssociationOptions;
use rdcm_ul::dimse::{c_echo, Status};
use snafu::{whatever, ResultExt, Whatever};
use tracing::warn;

/// DICOM C-ECHO SCU
#[derive(Debug, Parser)]
#[command(version)]
struct App {
    /// socket address to SCP,
    /// optionally with AE title
    /// (example: "QUERY-SCP@127.0.0.1:1045")
    addr: String,
    /// verbose mode
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
    /// the C-ECHO message ID
    #[arg(short = 'm', long = "message-id", default_value = "1")]
    message_id: u16,
    #[command(flatten)]
    connection: ConnectionOptions,
}

fn main() {
    run().unwrap_or_else(|e| {
        tracing::error!("{}", snafu::Report::from_error(e));
        std::process::exit(-2);
    })
}

fn run() -> Result<(), Whatever> {
    let App {
        addr,
        verbose,
        message_id,
        connection,
    } = App::parse();

    init_logging(verbose).unwrap_or_else(|e: Whatever| {
        eprintln!("[ERROR] {}", snafu::Report::from_error(e));
    });

    let mut association_opt = ClientAssociationOptions::new()
        .with_abstract_syntax(uids::VERIFICATION)
        .calling_ae_title(connection.calling_ae_title)
        .max_pdu_length(connection.max_pdu_length);
    if let Some(called_ae_title) = connection.called_ae_title {
        association_opt = association_opt.called_ae_title(called_ae_title);
    }
    if let Some(timeout) = connection.timeout {
        association_opt = association_opt.timeout(std::time::Duration::from_secs(timeout));
    }

    let mut association = association_opt
        .establish(&addr)
        .whatever_context("Could not establish association with SCP")?;

    let pc = association
        .presentation_context_for(uids::VERIFICATION)
        .whatever_context("No presentation context accepted")?
        .id;

    if verbose {
        println!("Association with {} successful", addr);
    }

    if verbose {
        println!(
            "Sending echo message (msg id {}), awaiting reply...",
            message_id
        );
    }

    let status = c_echo(&mut association, pc, uids::VERIFICATION, message_id)
        .whatever_context("C-ECHO exchange failed")?;

    if verbose {
        println!("Status: {:?}", status);
    }
    match status {
        Status::Success => {
            if verbose {
                println!("C-ECHO successful");
            }
        }
        Status::Warning(code) => warn!("Possible issue in C-ECHO (status code {:04X}H)", code),
        Status::Pending => warn!("Possible issue in C-ECHO: status is pending"),
        Status::Cancel => warn!("Operation cancelled"),
        Status::Failure(code) => whatever!("C-ECHO failed (status code {:04X}H)", code),
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
