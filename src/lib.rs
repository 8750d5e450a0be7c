//! Typegraft - extract configuration type directories, with history, into
//! their own repositories.
//!
//! Typegraft takes a named subset of "type" directories out of one git
//! repository's full commit history and transplants that history - rewritten
//! to include only the matched paths - into a branch of a second repository,
//! optionally removing the originals from the source.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Orchestrates preflight -> workspace -> rewrite -> push -> prune
//! - [`core`] - Domain types and the path filter compiler
//! - [`git`] - Single interface for all Git operations, including the
//!   history rewrite
//! - [`ui`] - Output utilities
//!
//! # Correctness Invariants
//!
//! 1. No ref is created before every precondition has been checked
//! 2. The temporary branch and backup refs never outlive one invocation;
//!    cleanup runs on every exit path
//! 3. The source repository is restored to its original head on both
//!    success and failure
//! 4. Source-side deletion happens only after the destination push succeeded

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod ui;
