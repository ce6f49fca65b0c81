//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docverify - verify documents against an on-chain identity registry
#[derive(Parser)]
#[command(name = "docverify")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Verify documents against an on-chain identity registry")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Use an additional config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Read records from a JSON file instead of a JSON-RPC provider
    #[arg(long, global = true, value_name = "PATH", env = "DOCVERIFY_LEDGER_FILE")]
    pub ledger_file: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fingerprint a document and verify it on the ledger
    Verify {
        /// Document to verify
        file: PathBuf,

        /// Export an identity card when verification succeeds
        #[arg(long)]
        export: bool,
    },

    /// Verify a fingerprint entered by hand
    Check {
        /// Fingerprint, 0x followed by 64 lowercase hex digits
        hash: String,

        /// Export an identity card when verification succeeds
        #[arg(long)]
        export: bool,
    },

    /// Print a document's fingerprint without contacting the ledger
    Hash {
        /// Document to fingerprint
        file: PathBuf,
    },

    /// Extract KYC fields from an ID card image
    Analyze {
        /// ID card image
        image: PathBuf,

        /// Selfie to match against the card photo: a file path, a
        /// `data:image/...;base64,` URL, or `-` to read base64 from stdin
        #[arg(long, value_name = "SOURCE")]
        selfie: Option<String>,
    },
}
