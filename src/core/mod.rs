//! core
//!
//! Domain types and pure logic with no git2 dependency.
//!
//! - [`types`] - Validated newtypes for type names, branch names, object
//!   ids, and repository locations
//! - [`filter`] - The path filter compiler

pub mod filter;
pub mod types;
