//! Shared building blocks for the `rdcm-*` command-line applications:
//! the connection/negotiation flags every SCU shares, and the logging
//! setup every binary performs the same way.

use clap::Args;
use snafu::{ResultExt, Whatever};
use tracing::Level;

/// Association negotiation parameters common to every SCU binary
/// (calling/called AE title, association timeout, maximum PDU length).
#[derive(Args, Debug, Clone)]
pub struct ConnectionOptions {
    /// the calling AE title
    #[arg(long = "calling-ae-title", default_value = "RDCM")]
    pub calling_ae_title: String,

    /// the called AE title, overriding any AE title present in the address
    #[arg(long = "called-ae-title")]
    pub called_ae_title: Option<String>,

    /// the maximum PDU length accepted from the peer
    #[arg(long = "max-pdu-length", default_value = "16384")]
    pub max_pdu_length: u32,

    /// timeout for the association request, in seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,
}

/// Install the global tracing subscriber used by every `rdcm-*` binary,
/// with `-v`/`--verbose` raising the default level from `INFO` to `DEBUG`.
/// Honors `RUST_LOG` if set, overriding the verbosity flag.
pub fn init_logging(verbose: bool) -> Result<(), Whatever> {
    let default_level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_level.as_str()))
        .whatever_context("invalid RUST_LOG filter")?;

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}
