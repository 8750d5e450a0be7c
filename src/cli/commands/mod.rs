//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Builds an engine request and calls [`crate::engine::migrate`]
//! 3. Formats and displays output
//!
//! Handlers do NOT perform repository mutations directly.
//!
//! Required options are declared optional to clap and checked here, so a
//! missing `--source`/`--dest`/`--branch` reports through the standard
//! `error: <message>` exit-1 path instead of clap's exit-2 usage error.

mod copy;
mod make_set;
mod move_cmd;

pub use copy::copy;
pub use make_set::make_set;
pub use move_cmd::move_types;

use anyhow::{anyhow, Result};

use crate::cli::args::Command;
use crate::ui::output::Verbosity;

/// Reject a missing required option with a message naming it.
fn require(value: Option<String>, option: &str) -> Result<String> {
    value.ok_or_else(|| anyhow!("missing required option {option}"))
}

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, verbosity: Verbosity) -> Result<()> {
    match command {
        Command::Copy {
            source,
            source_prefix,
            dest,
            dest_prefix,
            branch,
            types,
        } => {
            let source = require(source, "--source")?;
            let dest = require(dest, "--dest")?;
            let branch = require(branch, "--branch")?;
            copy::copy(
                &source,
                source_prefix.as_deref(),
                &dest,
                dest_prefix.as_deref(),
                &branch,
                &types,
                verbosity,
            )
        }
        Command::Move {
            source,
            source_prefix,
            source_branch,
            dest,
            dest_prefix,
            branch,
            types,
        } => {
            let source = require(source, "--source")?;
            let dest = require(dest, "--dest")?;
            let branch = require(branch, "--branch")?;
            move_cmd::move_types(
                &source,
                source_prefix.as_deref(),
                source_branch.as_deref(),
                &dest,
                dest_prefix.as_deref(),
                &branch,
                &types,
                verbosity,
            )
        }
        Command::MakeSet {
            delete_source,
            source,
            source_prefix,
            source_branch,
            dest,
            globs,
        } => {
            let source = require(source, "--source")?;
            let dest = require(dest, "--dest")?;
            make_set::make_set(
                delete_source,
                &source,
                source_prefix.as_deref(),
                source_branch.as_deref(),
                &dest,
                &globs,
                verbosity,
            )
        }
    }
}
