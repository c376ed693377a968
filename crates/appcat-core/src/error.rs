//! Error types for catalog definition and validation.

use crate::qname::QName;
use std::fmt;
use thiserror::Error;

/// Classification shared by definition and validation errors.
///
/// Tests and callers match on the kind instead of parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// A required value was not supplied.
    Missing,
    /// A name does not follow identifier rules.
    InvalidName,
    /// The name is already taken.
    AlreadyExists,
    /// A referenced entity does not exist.
    NotFound,
    /// A value is malformed.
    Invalid,
    /// Two related entities cannot be combined.
    Incompatible,
    /// A numeric value is outside its allowed range.
    OutOfBounds,
    /// A collection exceeds its configured limit.
    TooMany,
    /// The operation is not supported for this entity.
    Unsupported,
    /// A collection that must not be empty is empty.
    Empty,
    /// Ancestor edges would form a cycle.
    Cycle,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Missing => "missing",
            ErrorKind::InvalidName => "invalid name",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::NotFound => "not found",
            ErrorKind::Invalid => "invalid",
            ErrorKind::Incompatible => "incompatible",
            ErrorKind::OutOfBounds => "out of bounds",
            ErrorKind::TooMany => "too many",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::Empty => "empty",
            ErrorKind::Cycle => "cycle",
        };
        f.write_str(s)
    }
}

/// Errors raised while defining the catalog.
///
/// Builder methods abort with these; the `try_*` builder methods return them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// A required value was not supplied.
    #[error("{0} is missing")]
    Missing(String),

    /// A name does not follow identifier rules.
    #[error("invalid name «{name}»: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The name is already bound.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// A referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A value is malformed.
    #[error("{0} is invalid")]
    Invalid(String),

    /// Two entities cannot be combined.
    #[error("incompatible {0}")]
    Incompatible(String),

    /// A numeric value is outside its allowed range.
    #[error("{0} is out of bounds")]
    OutOfBounds(String),

    /// A collection exceeds its configured limit.
    #[error("too many {0}")]
    TooMany(String),

    /// The operation is not supported.
    #[error("unsupported {0}")]
    Unsupported(String),

    /// Accepting an ancestor would make the workspace inherit from itself.
    #[error("circular inheritance: ancestor «{ancestor}» already inherits from «{workspace}»")]
    CircularInheritance {
        /// The workspace being altered.
        workspace: QName,
        /// The rejected ancestor.
        ancestor: QName,
    },
}

impl DefinitionError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DefinitionError::Missing(_) => ErrorKind::Missing,
            DefinitionError::InvalidName { .. } => ErrorKind::InvalidName,
            DefinitionError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            DefinitionError::NotFound(_) => ErrorKind::NotFound,
            DefinitionError::Invalid(_) => ErrorKind::Invalid,
            DefinitionError::Incompatible(_) => ErrorKind::Incompatible,
            DefinitionError::OutOfBounds(_) => ErrorKind::OutOfBounds,
            DefinitionError::TooMany(_) => ErrorKind::TooMany,
            DefinitionError::Unsupported(_) => ErrorKind::Unsupported,
            DefinitionError::CircularInheritance { .. } => ErrorKind::Cycle,
        }
    }

    pub(crate) fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        DefinitionError::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for definition operations.
pub type DefinitionResult<T> = Result<T, DefinitionError>;

/// One problem found while validating the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{owner}: {message} [{kind}]")]
pub struct ValidationError {
    /// Error classification.
    pub kind: ErrorKind,
    /// Qualified name of the offending type (or workspace, for ACL rules).
    pub owner: QName,
    /// Human readable description.
    pub message: String,
}

impl ValidationError {
    /// Create a validation error.
    pub fn new(kind: ErrorKind, owner: &QName, message: impl Into<String>) -> Self {
        Self {
            kind,
            owner: owner.clone(),
            message: message.into(),
        }
    }

    pub(crate) fn not_found(owner: &QName, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, owner, message)
    }

    pub(crate) fn incompatible(owner: &QName, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Incompatible, owner, message)
    }

    pub(crate) fn invalid(owner: &QName, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Invalid, owner, message)
    }

    pub(crate) fn empty(owner: &QName, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Empty, owner, message)
    }
}

/// All problems found by one validation pass, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one error.
    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of recorded errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate recorded errors.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Returns true if an error of `kind` mentions `needle` in its owner or message.
    pub fn contains(&self, kind: ErrorKind, needle: &str) -> bool {
        self.errors.iter().any(|e| {
            e.kind == kind && (e.message.contains(needle) || e.owner.to_string().contains(needle))
        })
    }

    /// Count errors of the given kind.
    pub fn count_of(&self, kind: ErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind == kind).count()
    }

    /// `Ok(())` if empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.errors.len())?;
        for e in &self.errors {
            write!(f, "\n  - {e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_error_kind() {
        let err = DefinitionError::NotFound("type «test.doc»".into());
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "type «test.doc» not found");

        let err = DefinitionError::CircularInheritance {
            workspace: QName::new("test", "ws1"),
            ancestor: QName::new("test", "ws2"),
        };
        assert_eq!(err.kind(), ErrorKind::Cycle);
        assert!(err.to_string().contains("test.ws2"));
    }

    #[test]
    fn test_validation_errors_collect() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());
        assert!(errors.clone().into_result().is_ok());

        let owner = QName::new("W", "Doc");
        errors.push(ValidationError::not_found(&owner, "container «rec» type «W.Rec» not found"));
        errors.push(ValidationError::incompatible(&owner, "something else"));

        assert_eq!(errors.len(), 2);
        assert!(errors.contains(ErrorKind::NotFound, "W.Rec"));
        assert!(errors.contains(ErrorKind::Incompatible, "W.Doc"));
        assert!(!errors.contains(ErrorKind::NotFound, "W.Other"));
        assert_eq!(errors.count_of(ErrorKind::NotFound), 1);

        let text = errors.to_string();
        assert!(text.starts_with("2 validation error(s)"));
        assert!(text.contains("W.Doc: container «rec» type «W.Rec» not found [not found]"));
        assert!(errors.into_result().is_err());
    }
}
