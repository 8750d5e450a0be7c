//! engine::set
//!
//! The set builder: expands type-name globs against the *current* listing
//! of the source repository's type directory (not historical trees) and
//! produces a concrete, deduplicated type-name list for the core.

use std::collections::BTreeSet;
use std::path::Path;

use glob::Pattern;
use thiserror::Error;

use crate::core::types::{TypeError, TypeName};

/// Errors from glob expansion.
#[derive(Debug, Error)]
pub enum SetError {
    /// The type root directory does not exist in the source working tree.
    #[error("type directory not found: {path}")]
    TypeRootMissing {
        /// The missing directory
        path: std::path::PathBuf,
    },

    /// A glob pattern is malformed.
    #[error("invalid type glob '{pattern}': {source}")]
    BadPattern {
        /// The offending pattern
        pattern: String,
        /// The parse failure
        source: glob::PatternError,
    },

    /// A glob pattern matched no type directory.
    #[error("type glob '{pattern}' matches no type directory")]
    NoMatch {
        /// The pattern that matched nothing
        pattern: String,
    },

    /// Listing the type root failed.
    #[error("cannot list {path}: {message}")]
    ListFailed {
        /// The directory being listed
        path: std::path::PathBuf,
        /// The I/O error
        message: String,
    },

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Expand glob patterns against the type directories under
/// `workdir/<type_root>`.
///
/// Returns a sorted, deduplicated list. Each pattern must match at least
/// one type directory; a pattern matching nothing is an error, mirroring
/// the missing-directory error for explicitly named types.
pub fn expand_type_globs(
    workdir: &Path,
    type_root: &str,
    patterns: &[String],
) -> Result<Vec<TypeName>, SetError> {
    let root = workdir.join(type_root);
    if !root.is_dir() {
        return Err(SetError::TypeRootMissing { path: root });
    }

    let mut available: Vec<String> = Vec::new();
    let entries = std::fs::read_dir(&root).map_err(|e| SetError::ListFailed {
        path: root.clone(),
        message: e.to_string(),
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| SetError::ListFailed {
            path: root.clone(),
            message: e.to_string(),
        })?;
        if entry.path().is_dir() {
            if let Ok(name) = entry.file_name().into_string() {
                available.push(name);
            }
        }
    }

    let mut selected = BTreeSet::new();
    for pattern in patterns {
        let compiled = Pattern::new(pattern).map_err(|source| SetError::BadPattern {
            pattern: pattern.clone(),
            source,
        })?;
        let mut any = false;
        for name in &available {
            if compiled.matches(name) {
                selected.insert(TypeName::new(name.clone())?);
                any = true;
            }
        }
        if !any {
            return Err(SetError::NoMatch {
                pattern: pattern.clone(),
            });
        }
    }

    Ok(selected.into_iter().collect())
}
