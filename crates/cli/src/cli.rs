//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use specgen_client::config::ConfigOverrides;
use specgen_client::controller::JobRequest;
use specgen_core::types::{
    Granularity, Mode, FIELD_DOCUMENT_FILES, FIELD_NEW_EXCEL_FILES, FIELD_OLD_STRUCTURED_MD,
    FIELD_OLD_TEST_SPEC_MD,
};
use specgen_core::validation::Selections;

/// Generate test specifications from design documents.
#[derive(Debug, Parser)]
#[command(name = "specgen", version)]
pub struct Cli {
    /// Service base URL (overrides SPECGEN_API_URL).
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Directory receiving the archive (overrides SPECGEN_OUTPUT_DIR).
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Seconds between progress polls (overrides SPECGEN_POLL_INTERVAL_SECS).
    #[arg(long, global = true, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Print the final report as JSON on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a test specification from one or more design documents.
    Generate(GenerateArgs),
    /// Generate a test specification from the changes between document versions.
    Diff(DiffArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Output granularity, passed to the service as-is.
    #[arg(long, default_value = Granularity::SIMPLE)]
    pub granularity: String,

    /// Design documents.
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Output granularity, passed to the service as-is.
    #[arg(long, default_value = Granularity::SIMPLE)]
    pub granularity: String,

    /// New-version design documents.
    #[arg(long = "new", value_name = "FILE", num_args = 1..)]
    pub new_files: Vec<PathBuf>,

    /// Previous structured design document.
    #[arg(long, value_name = "FILE")]
    pub old_structured: Option<PathBuf>,

    /// Previous test specification.
    #[arg(long, value_name = "FILE")]
    pub old_test_spec: Option<PathBuf>,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_url: self.api_url.clone(),
            output_dir: self.output_dir.clone(),
            poll_interval_secs: self.poll_interval,
        }
    }
}

impl Command {
    /// Selections are passed through unchecked; the controller validates
    /// them so that a missing input is reported like any other rejection.
    pub fn into_request(self) -> JobRequest {
        match self {
            Self::Generate(args) => JobRequest {
                mode: Mode::SingleDocument,
                granularity: Granularity::new(args.granularity),
                selections: Selections::new().with(FIELD_DOCUMENT_FILES, args.files),
            },
            Self::Diff(args) => JobRequest {
                mode: Mode::Comparative,
                granularity: Granularity::new(args.granularity),
                selections: Selections::new()
                    .with(FIELD_NEW_EXCEL_FILES, args.new_files)
                    .with(FIELD_OLD_STRUCTURED_MD, args.old_structured)
                    .with(FIELD_OLD_TEST_SPEC_MD, args.old_test_spec),
            },
        }
    }
}
