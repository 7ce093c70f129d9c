//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Depot - relocate paths into a central directory and symlink them back
#[derive(Parser, Debug)]
#[command(name = "dpt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if dpt was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a new depot repository here
    #[command(
        name = "init",
        long_about = "Initialize a new depot repository in the current directory.\n\n\
            Creates an empty ledger file. Fails if the directory is already a \
            repository, or if it sits inside another depot repository - nested \
            repositories are not allowed."
    )]
    Init,

    /// Relocate a path into the depot and symlink it back
    #[command(
        name = "track",
        long_about = "Relocate PATH into the repository and replace it with a \
            symbolic link pointing at the relocated copy.\n\n\
            The pair is recorded in the ledger so the relocation can later be \
            reversed with 'dpt release' or replayed on another machine with \
            'dpt apply'. Must be run at the repository root.\n\n\
            If anything fails partway, the already-performed steps are undone \
            and the command reports exactly what was and was not reverted.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Track a dotfile under its own name
    dpt track ~/.vimrc

    # Track it under an explicit destination inside the repo
    dpt track ~/.vimrc editors/vimrc

    # Preview the operations without touching anything
    dpt track ~/.vimrc --dry-run"
    )]
    Track {
        /// The path to relocate
        path: PathBuf,

        /// Destination inside the repository (defaults to the path's file
        /// name, under the configured track directory if one is set)
        dest: Option<PathBuf>,

        /// Print the operations rather than running them
        #[arg(short = 'd', long)]
        dry_run: bool,
    },

    /// Return a tracked path to its original location
    #[command(
        name = "release",
        long_about = "Reverse a tracked relocation: remove the symbolic link, \
            move the content back to its original location, and drop the pair \
            from the ledger.\n\n\
            PATH may name either side of the pair - the original location or \
            the repository-relative destination."
    )]
    Release {
        /// Either side of the tracked pair
        path: PathBuf,

        /// Print the operations rather than running them
        #[arg(short = 'd', long)]
        dry_run: bool,
    },

    /// Link every ledger entry into place on this machine
    #[command(
        name = "apply",
        long_about = "Create the symbolic link for every ledger entry that is \
            not yet linked, typically on a freshly cloned repository.\n\n\
            A pre-flight scan validates every entry first and reports all \
            offending entries at once: a missing stored copy, a stored copy \
            that is itself a symlink, or an occupied link destination. Nothing \
            is created unless the whole ledger is applicable.",
        after_help = "\
WORKFLOW EXAMPLES:
    # On a new machine, after cloning your depot repository
    cd ~/dotfiles && dpt apply

    # See what would be linked first
    dpt apply --dry-run"
    )]
    Apply {
        /// Print the operations rather than running them
        #[arg(short = 'd', long)]
        dry_run: bool,
    },

    /// List tracked entries
    #[command(
        name = "list",
        long_about = "List every tracked pair in ledger order.\n\n\
            Entries whose symbolic link is currently in place are marked with \
            an asterisk (*)."
    )]
    List {
        /// Machine-readable JSON output
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    #[command(name = "completion")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
