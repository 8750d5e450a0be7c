//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug output
//! - `--quiet` / `-q`: Minimal output
//!
//! Unrecognized options exit with code 2 via clap. Required options are
//! declared optional here and checked in the handlers, so a missing
//! option is a validation failure (exit 1 with `error: ...` on stderr)
//! rather than a clap parse error.

use clap::{Parser, Subcommand};

/// Typegraft - migrate configuration type directories, with history,
/// between git repositories
#[derive(Parser, Debug)]
#[command(name = "typegraft")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug output
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
    /// Copy type histories into a branch of a destination repository
    #[command(
        name = "copy",
        long_about = "Copy type histories into a branch of a destination repository.\n\n\
            Every commit touching the named types is rewritten to contain only \
            their paths and pushed to the destination branch; per-file commit \
            provenance is preserved. The source repository is left untouched.\n\n\
            An empty type list is a no-op and succeeds immediately."
    )]
    Copy {
        /// Source repository (local working copy)
        #[arg(short = 's', long = "source", value_name = "REPO")]
        source: Option<String>,

        /// Path prefix of the source type directory
        #[arg(short = 'P', long = "source-prefix", value_name = "PREFIX")]
        source_prefix: Option<String>,

        /// Destination repository (path or URL)
        #[arg(short = 'd', long = "dest", value_name = "REPO")]
        dest: Option<String>,

        /// Path prefix of the destination type directory
        #[arg(short = 'p', long = "dest-prefix", value_name = "PREFIX")]
        dest_prefix: Option<String>,

        /// Destination branch to create or update
        #[arg(short = 'b', long = "branch", value_name = "BRANCH")]
        branch: Option<String>,

        /// Type names to migrate
        #[arg(value_name = "TYPE")]
        types: Vec<String>,
    },

    /// Copy type histories, then delete the originals from the source
    #[command(
        name = "move",
        long_about = "Copy type histories to the destination, then delete the original \
            type directories from the source.\n\n\
            Deletion happens only after the destination push has succeeded, on \
            the source branch (-B, defaulting to the destination branch name), \
            one commit per type."
    )]
    Move {
        /// Source repository (local working copy)
        #[arg(short = 's', long = "source", value_name = "REPO")]
        source: Option<String>,

        /// Path prefix of the source type directory
        #[arg(short = 'P', long = "source-prefix", value_name = "PREFIX")]
        source_prefix: Option<String>,

        /// Source branch for the removal commits (defaults to -b)
        #[arg(short = 'B', long = "source-branch", value_name = "BRANCH")]
        source_branch: Option<String>,

        /// Destination repository (path or URL)
        #[arg(short = 'd', long = "dest", value_name = "REPO")]
        dest: Option<String>,

        /// Path prefix of the destination type directory
        #[arg(short = 'p', long = "dest-prefix", value_name = "PREFIX")]
        dest_prefix: Option<String>,

        /// Destination branch to create or update
        #[arg(short = 'b', long = "branch", value_name = "BRANCH")]
        branch: Option<String>,

        /// Type names to migrate
        #[arg(value_name = "TYPE")]
        types: Vec<String>,
    },

    /// Populate an empty set repository from type-name globs
    #[command(
        name = "make-set",
        long_about = "Populate a freshly created, empty set repository with every type \
            matching the given globs.\n\n\
            Globs are expanded against the current listing of the source type \
            directory. The destination branch is fixed to 'main'. With \
            --delete-source (-m) the originals are removed from the source \
            afterwards, which requires --source-branch."
    )]
    MakeSet {
        /// Delete the originals from the source after pushing
        #[arg(short = 'm', long = "delete-source")]
        delete_source: bool,

        /// Source repository (local working copy)
        #[arg(short = 's', long = "source", value_name = "REPO")]
        source: Option<String>,

        /// Path prefix of the source type directory
        #[arg(short = 'P', long = "source-prefix", value_name = "PREFIX")]
        source_prefix: Option<String>,

        /// Source branch for the removal commits (required with -m)
        #[arg(short = 'B', long = "source-branch", value_name = "BRANCH")]
        source_branch: Option<String>,

        /// Destination repository (must be empty)
        #[arg(short = 'd', long = "dest", value_name = "REPO")]
        dest: Option<String>,

        /// Type-name globs to expand
        #[arg(value_name = "TYPE_GLOB")]
        globs: Vec<String>,
    },
}
