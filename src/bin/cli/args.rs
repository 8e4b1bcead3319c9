//! CLI Argument Structures
//!
//! This module contains all CLI argument definitions and command structures
//! used by the Scrivener CLI binary.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use scrivener_rs::TransferStrategy;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Writing-Style Analysis & Alignment Engine
#[derive(Parser)]
#[command(name = "scrivener")]
#[command(version = VERSION)]
#[command(about = "Scrivener - Writing-Style Analysis & Alignment Engine")]
#[command(long_about = "
Profile the writing style of a document, compare two styles, and rewrite
content toward a target style as a set of reviewable changes.

Common Usage:

  # Profile a document
  scrivener analyze ./notes.txt

  # Compare two documents
  scrivener compare ./casual.txt ./formal.txt --method euclidean

  # Rewrite toward the style of another document, accepting every change
  scrivener transfer ./casual.txt --target ./formal.txt --strategy gradual --accept-all

  # Run without downloading an embedding model
  scrivener --offline analyze ./notes.txt

The language model is reached through the Gemini API; set GEMINI_API_KEY.
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Use the offline hashing embedder instead of a local model
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Profile the writing style of a document
    Analyze(AnalyzeArgs),

    /// Compare the writing styles of two documents
    Compare(CompareArgs),

    /// Rewrite a document toward a target style
    Transfer(TransferArgs),

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Initialize a configuration file with defaults
    #[command(name = "init-config")]
    InitConfig(InitConfigArgs),

    /// Validate a Scrivener configuration file
    #[command(name = "validate-config")]
    ValidateConfig(ValidateConfigArgs),
}

/// Arguments for `analyze`
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Document to profile
    pub file: PathBuf,

    /// Profile name (defaults to the file stem)
    #[arg(long)]
    pub name: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Also show extracted semantic units
    #[arg(long)]
    pub units: bool,
}

/// Arguments for `compare`
#[derive(Args)]
pub struct CompareArgs {
    /// First document
    pub first: PathBuf,

    /// Second document
    pub second: PathBuf,

    /// Similarity method
    #[arg(long, value_enum, default_value = "cosine")]
    pub method: MethodArg,

    /// Six comma-separated weights for the weighted method
    #[arg(long, value_delimiter = ',')]
    pub weights: Vec<f64>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for `transfer`
#[derive(Args)]
pub struct TransferArgs {
    /// Document to rewrite
    pub source: PathBuf,

    /// Target style: a document to profile, or a profile saved as JSON
    #[arg(long)]
    pub target: PathBuf,

    /// Transfer strategy
    #[arg(long, value_enum, default_value = "direct")]
    pub strategy: StrategyArg,

    /// Accept every proposed change and export
    #[arg(long, conflicts_with = "reject_all")]
    pub accept_all: bool,

    /// Reject every proposed change and export
    #[arg(long)]
    pub reject_all: bool,

    /// Write the exported text here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format for the change list
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for `init-config`
#[derive(Args)]
pub struct InitConfigArgs {
    /// Output configuration file name
    #[arg(short, long, default_value = ".scrivener.yml")]
    pub output: PathBuf,

    /// Overwrite existing configuration file
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for `validate-config`
#[derive(Args)]
pub struct ValidateConfigArgs {
    /// Path to configuration file to validate
    pub file: PathBuf,
}

/// Output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Coloured tables for terminals
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

/// Similarity methods exposed on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    /// Cosine over centered scores
    Cosine,
    /// Gaussian of Euclidean distance
    Euclidean,
    /// Weighted absolute difference
    Weighted,
}

/// Transfer strategies exposed on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// One rewrite straight to the target
    Direct,
    /// Several rewrites through interpolated targets
    Gradual,
    /// Rewrite only segments tied to the largest gaps
    Selective,
}

impl From<StrategyArg> for TransferStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Direct => TransferStrategy::Direct,
            StrategyArg::Gradual => TransferStrategy::Gradual,
            StrategyArg::Selective => TransferStrategy::Selective,
        }
    }
}
