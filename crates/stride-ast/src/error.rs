//! Collected compile diagnostics.
//!
//! Errors in the middle-end are data, not control flow: every pass walks
//! the whole tree and appends to a shared list, so one compile surfaces
//! every defect at once. The final list is sorted by source location
//! before being shown.
//!
//! Each [`Error`] carries a closed [`ErrorKind`], an ordered list of string
//! tokens, and a source [`Location`]. The human-readable message is
//! interpolated from the tokens on demand; callers that want structured
//! access (tests, IDEs) read the tokens directly.
//!
//! # Examples
//!
//! ```
//! use stride_ast::{Error, ErrorKind, Location};
//!
//! let err = Error::new(
//!     ErrorKind::UnknownType,
//!     Location::new("main.stride", 4),
//! )
//! .with_token("foo");
//!
//! assert_eq!(err.message(), "unknown type 'foo'");
//! ```

use crate::foundation::Location;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed taxonomy of middle-end diagnostics.
///
/// Syntax errors originate in the external parser and are forwarded
/// upstream; nothing here produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Declaration's object type resolves to no known type declaration.
    UnknownType,
    /// A constant evaluation met a node of an unusable type.
    InvalidType,
    /// Property name is not a port of the declared type.
    InvalidPort,
    /// Port value's structural type is outside the port's valid set.
    InvalidPortType,
    /// Bundle index did not evaluate to an integer type.
    IndexMustBeInteger,
    /// Declared bundle size and initializer element count differ.
    BundleSizeMismatch,
    /// 1-based list index outside `1..=len`.
    ArrayIndexOutOfRange,
    /// Two declarations share a name within one scope frame.
    DuplicateSymbol,
    /// List mixes element types with no valid promotion.
    InconsistentList,
    /// Adjacent stream members have differing static sizes.
    StreamMemberSizeMismatch,
    /// Block/bundle reference or function callee resolves to nothing.
    UndeclaredSymbol,
    /// A constrained type's declarative bound was violated.
    ConstraintFail,
    /// A rate property neither folds to a constant nor names an entity.
    UnresolvedRate,
    /// System references a framework no platform provides.
    UnknownPlatform,
    /// Orchestration-level failure (store I/O, builder construction, ...).
    SystemError,
}

impl ErrorKind {
    /// Short human-readable category name.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::UnknownType => "unknown type",
            ErrorKind::InvalidType => "invalid type",
            ErrorKind::InvalidPort => "invalid port",
            ErrorKind::InvalidPortType => "invalid port type",
            ErrorKind::IndexMustBeInteger => "index must be integer",
            ErrorKind::BundleSizeMismatch => "bundle size mismatch",
            ErrorKind::ArrayIndexOutOfRange => "array index out of range",
            ErrorKind::DuplicateSymbol => "duplicate symbol",
            ErrorKind::InconsistentList => "inconsistent list",
            ErrorKind::StreamMemberSizeMismatch => "stream member size mismatch",
            ErrorKind::UndeclaredSymbol => "undeclared symbol",
            ErrorKind::ConstraintFail => "constraint failed",
            ErrorKind::UnresolvedRate => "unresolved rate",
            ErrorKind::UnknownPlatform => "unknown platform",
            ErrorKind::SystemError => "system error",
        }
    }
}

/// One collected diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Error {
    /// Category.
    pub kind: ErrorKind,
    /// Ordered message tokens; meaning depends on `kind`.
    pub tokens: Vec<String>,
    /// Source position the diagnostic points at.
    pub loc: Location,
}

impl Error {
    /// Create a diagnostic with no tokens yet.
    pub fn new(kind: ErrorKind, loc: Location) -> Self {
        Self {
            kind,
            tokens: Vec::new(),
            loc,
        }
    }

    /// Append one token (chainable).
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.tokens.push(token.into());
        self
    }

    /// Append several tokens (chainable).
    pub fn with_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens.extend(tokens.into_iter().map(Into::into));
        self
    }

    /// Token by position, or `""` when absent.
    fn token(&self, i: usize) -> &str {
        self.tokens.get(i).map(String::as_str).unwrap_or("")
    }

    /// Interpolate the human-readable message from the tokens.
    pub fn message(&self) -> String {
        match self.kind {
            ErrorKind::UnknownType => format!("unknown type '{}'", self.token(0)),
            ErrorKind::InvalidType => {
                format!("expression of type '{}' is not valid here", self.token(0))
            }
            ErrorKind::InvalidPort => {
                format!("'{}' is not a port of type '{}'", self.token(1), self.token(0))
            }
            ErrorKind::InvalidPortType => format!(
                "port '{}' on type '{}' does not accept '{}' (accepts: {})",
                self.token(1),
                self.token(0),
                self.token(2),
                self.token(3),
            ),
            ErrorKind::IndexMustBeInteger => format!(
                "bundle index for '{}' must be an integer, found '{}'",
                self.token(0),
                self.token(1),
            ),
            ErrorKind::BundleSizeMismatch => format!(
                "bundle '{}' declares size {} but its value provides {}",
                self.token(0),
                self.token(1),
                self.token(2),
            ),
            ErrorKind::ArrayIndexOutOfRange => format!(
                "index {} is out of range for '{}'",
                self.token(1),
                self.token(0),
            ),
            ErrorKind::DuplicateSymbol => {
                format!("duplicate declaration of '{}'", self.token(0))
            }
            ErrorKind::InconsistentList => format!(
                "list for '{}' mixes incompatible element types",
                self.token(0),
            ),
            ErrorKind::StreamMemberSizeMismatch => format!(
                "stream members '{}' and '{}' have mismatched sizes ({} vs {})",
                self.token(0),
                self.token(1),
                self.token(2),
                self.token(3),
            ),
            ErrorKind::UndeclaredSymbol => {
                format!("undeclared symbol '{}'", self.token(0))
            }
            ErrorKind::ConstraintFail => format!(
                "value {} for port '{}' on type '{}' violates constraint {}",
                self.token(3),
                self.token(1),
                self.token(0),
                self.token(2),
            ),
            ErrorKind::UnresolvedRate => {
                format!("cannot resolve rate '{}'", self.token(0))
            }
            ErrorKind::UnknownPlatform => {
                format!("unknown platform '{}'", self.token(0))
            }
            ErrorKind::SystemError => self.token(0).to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: error: {}: {}",
            self.loc,
            self.kind.name(),
            self.message()
        )
    }
}

impl std::error::Error for Error {}

/// Stable sort by source location so one compile's diagnostics surface in
/// source order.
pub fn sort_by_location(errors: &mut [Error]) {
    errors.sort_by(|a, b| a.loc.cmp(&b.loc));
}
