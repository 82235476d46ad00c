use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Evaluate subjects against eligibility criteria.
///
/// Criteria are YAML documents loaded from a directory; subjects are JSON
/// objects. Results are printed as JSON on stdout, logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "verdict", version, about = "Eligibility criteria evaluation")]
pub struct CliArgs {
    /// Directory containing criteria YAML files (overrides VERDICT_CRITERIA_DIR)
    #[arg(long, global = true)]
    pub criteria_dir: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate one subject (a JSON object file, or `-` for stdin)
    Evaluate {
        criteria_id: String,
        subject: PathBuf,
    },

    /// Evaluate a JSON-lines file of subjects in parallel, one result per line
    Batch {
        criteria_id: String,
        subjects: PathBuf,
    },

    /// Validate a criteria file; exits non-zero on errors
    Validate { file: PathBuf },

    /// List criteria files with their load status
    List,

    /// Re-evaluate a subject every time its criteria file changes
    Watch {
        criteria_id: String,
        subject: PathBuf,
    },
}
