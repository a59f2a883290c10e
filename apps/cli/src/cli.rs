use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use strata::domain::format::OutputFormat;

/// Layered, audited configuration documents.
#[derive(Debug, Parser)]
#[command(name = "strata", version, long_about = None)]
pub(crate) struct Cli {
    /// Configuration file; `strata.*` in the working directory is used when present
    #[arg(short, long, global = true)]
    pub(crate) config: Option<PathBuf>,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Manage registered documents
    Doc {
        #[command(subcommand)]
        command: DocCommand,
    },

    /// Register a template and seed the default region with its values
    Import {
        name: String,
        path: PathBuf,
        #[arg(short, long)]
        author: String,
    },

    /// Write one value into a region
    Put {
        #[command(flatten)]
        target: Target,
        key: String,
        /// Typed value: quote strings, e.g. '"localhost"'
        value: String,
        #[arg(short, long)]
        author: String,
        /// Allow keys the default region does not define
        #[arg(short, long)]
        force: bool,
    },

    /// Read one value, falling back to the default region
    Get {
        #[command(flatten)]
        target: Target,
        key: String,
    },

    /// Render the subtree below a key
    Tree {
        #[command(flatten)]
        target: Target,
        key: Option<String>,
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Render the full configuration of a region
    #[command(alias = "gen")]
    Generate {
        #[command(flatten)]
        target: Target,
        #[arg(short, long)]
        format: Option<OutputFormat>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the changes made at or below a key
    Audit {
        #[command(flatten)]
        target: Target,
        key: Option<String>,
        /// Only changes by this author (case-insensitive)
        #[arg(short, long)]
        author: Option<String>,
    },

    /// Delete every value and audit record of a region
    Destroy {
        #[command(flatten)]
        target: Target,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum DocCommand {
    /// Register a template without seeding values
    Create {
        name: String,
        /// Template file, or `-` for stdin
        source: String,
        /// Format of a template read from stdin
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Print the key set of a document
    Show { name: String },

    /// List registered documents
    List,
}

#[derive(Debug, Args)]
pub(crate) struct Target {
    pub(crate) document: String,
    pub(crate) region: String,
}
