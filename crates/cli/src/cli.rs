//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use contracts::Metadata;

/// evtx2es - ship Windows event logs to Elasticsearch
#[derive(Parser, Debug)]
#[command(
    name = "evtx2es",
    author,
    version,
    about = "Send Windows EVTX event logs to Elasticsearch or a JSON-lines file",
    long_about = "Reads every record of an EVTX file, flattens it into a search-friendly \n\
                  document and bulk-indexes the documents into Elasticsearch.\n\n\
                  When OUTPUT contains '.json' the documents are appended to that file \n\
                  instead, one JSON document per line."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "EVTX2ES_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "EVTX2ES_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(flatten)]
    pub run: RunArgs,
}

impl Cli {
    /// Filter used when RUST_LOG is not set
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Arguments for an ingest run
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// EVTX file to read
    pub evtxfile: PathBuf,

    /// Elasticsearch address (host, host:port or URL), or a path containing '.json' to export to
    pub output: String,

    /// Destination index (also used as the document type)
    #[arg(short, long, env = "EVTX2ES_INDEX")]
    pub index: Option<String>,

    /// Documents per bulk request
    #[arg(short = 's', long = "size", env = "EVTX2ES_BATCH_SIZE")]
    pub batch_size: Option<usize>,

    /// JSON object attached to every document under `meta`
    #[arg(short, long, value_parser = parse_metadata)]
    pub meta: Option<Metadata>,

    /// Print every normalized document to stdout
    #[arg(short, long)]
    pub debug: bool,

    /// Settings file (TOML or JSON); command-line values take precedence
    #[arg(short, long, env = "EVTX2ES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bulk request timeout in seconds
    #[arg(long, env = "EVTX2ES_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Elasticsearch user
    #[arg(long, env = "EVTX2ES_USERNAME")]
    pub username: Option<String>,

    /// Elasticsearch password
    #[arg(long, env = "EVTX2ES_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "EVTX2ES_METRICS_PORT")]
    pub metrics_port: u16,
}

impl RunArgs {
    pub fn destination(&self) -> Destination {
        Destination::from_arg(&self.output)
    }

    pub fn metrics_port(&self) -> Option<u16> {
        (self.metrics_port != 0).then_some(self.metrics_port)
    }
}

fn parse_metadata(text: &str) -> Result<Metadata, String> {
    Metadata::parse(text).map_err(|e| e.to_string())
}

/// Where documents go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// JSON-lines export file
    Export(PathBuf),
    /// Elasticsearch address
    Index(String),
}

impl Destination {
    /// Any argument containing `.json` is an export path.
    pub fn from_arg(arg: &str) -> Self {
        if arg.contains(".json") {
            Self::Export(PathBuf::from(arg))
        } else {
            Self::Index(arg.to_string())
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
