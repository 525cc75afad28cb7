use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ol", about = concat!("ol v", env!("CARGO_PKG_VERSION"), " - edit markdown outlines by heading"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: nearest outline.toml above the document)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the heading tree of a document
    Show(ShowArgs),
    /// Set or clear the state of a heading
    State(StateArgs),
    /// Set or remove a property on a heading
    Prop(PropArgs),
    /// Print the line edits that turn one file into another
    Diff(DiffArgs),
    /// Check that a document reads back unchanged
    Check(CheckArgs),
}

#[derive(Args)]
pub struct ShowArgs {
    /// Document to read
    pub file: PathBuf,
    /// Only show headings down to this depth
    #[arg(long)]
    pub depth: Option<usize>,
}

#[derive(Args)]
pub struct StateArgs {
    /// Document to edit
    pub file: PathBuf,
    /// Heading text (exact match, first in document order)
    pub heading: String,
    /// New state, or "none" to clear it
    pub state: String,
    /// Print the edits instead of writing them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct PropArgs {
    /// Document to edit
    pub file: PathBuf,
    /// Heading text (exact match, first in document order)
    pub heading: String,
    /// Property key ([A-Z_]+)
    pub key: String,
    /// Value to set; omit to remove the property
    pub value: Option<String>,
    /// Print the edits instead of writing them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    /// Original file
    pub old: PathBuf,
    /// Modified file
    pub new: PathBuf,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Document to check
    pub file: PathBuf,
}
