//! CLI argument definitions using clap
//!
//! Commands:
//! - docquery parse --input <path>
//! - docquery inspect --response <path> [--page N] [--record I]
//! - docquery console --response <path>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::transport::QueryType;

/// docquery - query result console for a document database
#[derive(Parser, Debug)]
#[command(name = "docquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by the commands that execute a query
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Captured multipart response to replay as the query answer
    #[arg(long)]
    pub response: PathBuf,

    /// Path to configuration file; defaults apply when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Query language
    #[arg(long, value_enum, default_value_t = QueryType::Xquery)]
    pub query_type: QueryType,

    /// Query text sent with the request
    #[arg(long, default_value = "()")]
    pub query: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a multipart response file and print its envelope
    Parse {
        /// Path to the raw response
        #[arg(long)]
        input: PathBuf,
    },

    /// Execute once and print the resulting page and active record
    Inspect {
        #[command(flatten)]
        query: QueryArgs,

        /// Page to show
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        page: isize,

        /// Record to select on that page
        #[arg(long, allow_negative_numbers = true)]
        record: Option<isize>,
    },

    /// Execute once, then read navigation commands from stdin
    Console {
        #[command(flatten)]
        query: QueryArgs,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
