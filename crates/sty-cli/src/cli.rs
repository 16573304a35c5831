//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use std::path::PathBuf;

/// Installs and upgrades packaged configuration bundles
#[derive(Parser)]
#[command(name = "sty")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install a bundle into a directory
    Init(InitArgs),
    /// Generate shell completions
    Completion(CompletionArgs),
}

#[derive(clap::Args)]
pub struct InitArgs {
    /// Bundle tarball (.tgz) to install
    #[arg(short, long, value_name = "FILE")]
    pub archive: PathBuf,

    /// Installation directory (default: ~/pigsty)
    #[arg(short, long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Install over an existing directory, keeping pigsty.yml and files/pki
    #[arg(short, long)]
    pub force: bool,
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}
