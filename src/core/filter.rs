//! core::filter
//!
//! The path filter compiler.
//!
//! Turns a set of requested type names plus a type root into a single
//! compiled pattern that matches exactly the files under those type
//! subdirectories. The pattern is anchored at path start and requires a
//! trailing path separator after the matched name, so `foo` can never
//! match paths under `foobar/`.

use regex::Regex;
use thiserror::Error;

use crate::core::types::TypeName;

/// Errors from filter compilation.
#[derive(Debug, Error)]
pub enum FilterError {
    /// No type names were supplied.
    #[error("at least one type name is required")]
    EmptyTypeSet,

    /// The assembled pattern failed to compile.
    #[error("filter pattern failed to compile: {0}")]
    BadPattern(#[from] regex::Error),
}

/// A compiled path filter selecting which tree paths survive a rewrite.
///
/// # Example
///
/// ```
/// use typegraft::core::filter::PathFilter;
/// use typegraft::core::types::TypeName;
///
/// let names = vec![TypeName::new("__web").unwrap()];
/// let filter = PathFilter::compile("conf/type", &names).unwrap();
///
/// assert!(filter.matches("conf/type/__web/manifest"));
/// assert!(!filter.matches("conf/type/__webserver/manifest"));
/// assert!(!filter.matches("doc/conf/type/__web/manifest"));
/// ```
#[derive(Debug, Clone)]
pub struct PathFilter {
    pattern: Regex,
}

impl PathFilter {
    /// Compile a filter for the given type root and type names.
    ///
    /// Every literal component is regex-escaped, so type names containing
    /// metacharacters (`.`, `+`, ...) match only themselves. Duplicate
    /// names produce redundant alternatives, which is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::EmptyTypeSet`] for a zero-length name set;
    /// callers treat that case as a no-op before reaching the compiler.
    pub fn compile(type_root: &str, names: &[TypeName]) -> Result<Self, FilterError> {
        if names.is_empty() {
            return Err(FilterError::EmptyTypeSet);
        }

        let alternatives = names
            .iter()
            .map(|n| regex::escape(n.as_str()))
            .collect::<Vec<_>>()
            .join("|");

        let root = type_root.trim_end_matches('/');
        let source = if root.is_empty() {
            format!("^({alternatives})/")
        } else {
            format!("^{}/({alternatives})/", regex::escape(root))
        };

        Ok(Self {
            pattern: Regex::new(&source)?,
        })
    }

    /// Whether a repository-relative path survives the filter.
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    /// The compiled pattern source, for diagnostics.
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}
