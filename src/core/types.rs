//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`TypeName`] - Validated configuration type name
//! - [`BranchName`] - Validated Git branch name
//! - [`Oid`] - Git object identifier (SHA)
//! - [`RepoLocation`] - Source or destination repository reference
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use typegraft::core::types::{BranchName, TypeName};
//!
//! let branch = BranchName::new("feature/split").unwrap();
//! let name = TypeName::new("__webserver").unwrap();
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(TypeName::new("nested/name").is_err());
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from type validation and resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid type name: {0}")]
    InvalidTypeName(String),

    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("cannot resolve repository path {path}: {reason}")]
    UnresolvablePath {
        /// The path that could not be resolved
        path: PathBuf,
        /// Why resolution failed
        reason: String,
    },
}

/// A validated configuration type name.
///
/// Type names address a single subdirectory under the type root, so they
/// must be a single path component:
/// - Cannot be empty, `.` or `..`
/// - Cannot contain `/` or `\`
/// - Cannot start with `-` (would be read as an option by external tools)
/// - Cannot contain ASCII control characters
///
/// # Example
///
/// ```
/// use typegraft::core::types::TypeName;
///
/// let name = TypeName::new("__webserver").unwrap();
/// assert_eq!(name.as_str(), "__webserver");
///
/// assert!(TypeName::new("").is_err());
/// assert!(TypeName::new("a/b").is_err());
/// assert!(TypeName::new("-flag").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(String);

impl TypeName {
    /// Create a new validated type name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidTypeName` if the name is not a single,
    /// safe path component.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidTypeName(
                "type name cannot be empty".into(),
            ));
        }
        if name == "." || name == ".." {
            return Err(TypeError::InvalidTypeName(format!(
                "type name cannot be '{name}'"
            )));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(TypeError::InvalidTypeName(
                "type name cannot contain path separators".into(),
            ));
        }
        if name.starts_with('-') {
            return Err(TypeError::InvalidTypeName(
                "type name cannot start with '-'".into(),
            ));
        }
        for c in name.chars() {
            if c.is_ascii_control() {
                return Err(TypeError::InvalidTypeName(
                    "type name cannot contain control characters".into(),
                ));
            }
        }
        Ok(())
    }

    /// Get the type name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated Git branch name.
///
/// Branch names must conform to Git's refname rules (see `git check-ref-format`):
/// - Cannot be empty
/// - Cannot start with `.` or `-`
/// - Cannot end with `.lock` or `/`
/// - Cannot contain `..`, `@{`, `//`, or ASCII control characters
/// - Cannot contain spaces, `~`, `^`, `:`, `\`, `?`, `*`, `[`
/// - Cannot be exactly `@`
///
/// # Example
///
/// ```
/// use typegraft::core::types::BranchName;
///
/// let name = BranchName::new("feature/split").unwrap();
/// assert_eq!(name.as_str(), "feature/split");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new(".hidden").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's
    /// refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Validate a branch name against Git's refname rules.
    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot be empty".into(),
            ));
        }
        if name == "@" {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot be '@' (reserved)".into(),
            ));
        }
        if name.starts_with('.') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot start with '.'".into(),
            ));
        }
        if name.starts_with('-') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot start with '-'".into(),
            ));
        }
        if name.ends_with(".lock") {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot end with '.lock'".into(),
            ));
        }
        if name.ends_with('/') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot end with '/'".into(),
            ));
        }
        if name.contains("..") {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot contain '..'".into(),
            ));
        }
        if name.contains("@{") {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot contain '@{'".into(),
            ));
        }
        if name.contains("//") {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot contain '//'".into(),
            ));
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        for c in INVALID_CHARS {
            if name.contains(c) {
                return Err(TypeError::InvalidBranchName(format!(
                    "branch name cannot contain '{c}'"
                )));
            }
        }

        for c in name.chars() {
            if c.is_ascii_control() {
                return Err(TypeError::InvalidBranchName(
                    "branch name cannot contain control characters".into(),
                ));
            }
        }

        for component in name.split('/') {
            if component.is_empty() {
                continue;
            }
            if component.starts_with('.') {
                return Err(TypeError::InvalidBranchName(
                    "path component cannot start with '.'".into(),
                ));
            }
            if component.ends_with(".lock") {
                return Err(TypeError::InvalidBranchName(
                    "path component cannot end with '.lock'".into(),
                ));
            }
        }

        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The full ref name for this branch (`refs/heads/<branch>`).
    pub fn refname(&self) -> String {
        format!("refs/heads/{}", self.0)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase for consistency.
///
/// # Example
///
/// ```
/// use typegraft::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id, normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a valid hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        Self::validate(&oid)?;
        Ok(Self(oid))
    }

    /// Get an abbreviated form of the OID.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    fn validate(oid: &str) -> Result<(), TypeError> {
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A source or destination repository reference.
///
/// Distinguishes local working-copy paths from remote URLs. Local paths are
/// resolved to absolute form exactly once, at the boundary, so that later
/// operations never depend on the ambient working directory.
///
/// # Example
///
/// ```
/// use typegraft::core::types::RepoLocation;
///
/// assert!(RepoLocation::parse("https://example.com/repo.git").is_remote());
/// assert!(RepoLocation::parse("git@example.com:repo.git").is_remote());
/// assert!(RepoLocation::parse("../repos/types").is_local());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoLocation {
    /// A local filesystem path (possibly relative).
    Local(PathBuf),
    /// A remote URL (scheme-qualified or scp-like SSH).
    Remote(String),
}

impl RepoLocation {
    /// Classify a repository spec as local or remote.
    ///
    /// A spec is remote when it carries a URL scheme (`://`) or looks like
    /// an scp-style SSH address (`user@host:path`). Everything else is a
    /// local path.
    pub fn parse(spec: &str) -> Self {
        if spec.contains("://") {
            return Self::Remote(spec.to_string());
        }
        // scp-like: user@host:path, where the colon comes before any slash
        if let Some(colon) = spec.find(':') {
            let before = &spec[..colon];
            if before.contains('@') && !before.contains('/') {
                return Self::Remote(spec.to_string());
            }
        }
        Self::Local(PathBuf::from(spec))
    }

    /// Whether this location is a local filesystem path.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// Whether this location is a remote URL.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// The local path, if this is a local location.
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Self::Local(p) => Some(p),
            Self::Remote(_) => None,
        }
    }

    /// Resolve to the absolute form handed to git transports.
    ///
    /// Local paths are canonicalized; remote URLs pass through unchanged.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::UnresolvablePath` if a local path does not exist
    /// or is not valid UTF-8 after canonicalization.
    pub fn resolved(&self) -> Result<String, TypeError> {
        match self {
            Self::Remote(url) => Ok(url.clone()),
            Self::Local(path) => {
                let abs = std::fs::canonicalize(path).map_err(|e| TypeError::UnresolvablePath {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
                abs.to_str()
                    .map(String::from)
                    .ok_or_else(|| TypeError::UnresolvablePath {
                        path: path.clone(),
                        reason: "path is not valid UTF-8".into(),
                    })
            }
        }
    }
}

impl std::fmt::Display for RepoLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(p) => write!(f, "{}", p.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// Join an optional path prefix with the conventional `type` directory.
///
/// An empty or absent prefix means the type directory sits at the
/// repository root.
///
/// # Example
///
/// ```
/// use typegraft::core::types::type_root;
///
/// assert_eq!(type_root(Some("conf")), "conf/type");
/// assert_eq!(type_root(None), "type");
/// assert_eq!(type_root(Some("")), "type");
/// ```
pub fn type_root(prefix: Option<&str>) -> String {
    match prefix {
        Some(p) if !p.is_empty() => {
            let p = p.trim_end_matches('/');
            format!("{p}/type")
        }
        _ => "type".to_string(),
    }
}
