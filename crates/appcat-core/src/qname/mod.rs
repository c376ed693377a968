//! Qualified names and the package namespace.
//!
//! A [`QName`] pairs a package local name with an entity name, for example
//! `sys.Workspace`. Package local names are bound one-to-one to globally
//! unique package paths by [`Packages`], which gives every qualified name a
//! path-qualified [`FullQName`] form.

mod packages;

pub use packages::Packages;

use crate::error::{DefinitionError, DefinitionResult};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Separator between the package and entity parts of a name.
pub const QNAME_SEPARATOR: char = '.';

/// Local name of the system package.
pub const SYS_PACKAGE: &str = "sys";

/// Path of the system package.
pub const SYS_PACKAGE_PATH: &str = "appcat.dev/sys";

/// Qualified name: package local name plus entity name.
///
/// Names order lexicographically by package, then by entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    pkg: String,
    entity: String,
}

impl QName {
    /// The absent name.
    pub const NULL: QName = QName {
        pkg: String::new(),
        entity: String::new(),
    };

    /// Create a qualified name from its parts.
    pub fn new(pkg: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            pkg: pkg.into(),
            entity: entity.into(),
        }
    }

    /// Create a name in the system package.
    pub fn sys(entity: impl Into<String>) -> Self {
        Self::new(SYS_PACKAGE, entity)
    }

    /// Wildcard type name accepted wherever a function parameter or result is expected.
    pub fn any() -> Self {
        Self::sys("ANY")
    }

    /// Name of the implicit root workspace every workspace inherits from.
    pub fn sys_workspace() -> Self {
        Self::sys("Workspace")
    }

    /// Parse `pkg.entity`.
    ///
    /// The string must contain exactly one separator. Part syntax is not
    /// checked here, see [`validate_qname`].
    pub fn parse(s: &str) -> DefinitionResult<Self> {
        let mut parts = s.split(QNAME_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(pkg), Some(entity), None) => Ok(Self::new(pkg, entity)),
            _ => Err(DefinitionError::invalid_name(
                s,
                "expected exactly one «.» between package and entity",
            )),
        }
    }

    /// Package local name.
    pub fn pkg(&self) -> &str {
        &self.pkg
    }

    /// Entity name.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Returns true for [`QName::NULL`].
    pub fn is_null(&self) -> bool {
        self.pkg.is_empty() && self.entity.is_empty()
    }

    /// Returns true if the name belongs to the system package.
    pub fn is_sys(&self) -> bool {
        self.pkg == SYS_PACKAGE
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.pkg, QNAME_SEPARATOR, self.entity)
    }
}

impl FromStr for QName {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for QName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Path-qualified name: package path plus entity name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FullQName {
    path: String,
    entity: String,
}

impl FullQName {
    /// The absent name.
    pub const NULL: FullQName = FullQName {
        path: String::new(),
        entity: String::new(),
    };

    /// Create a full name from a package path and an entity name.
    pub fn new(path: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            entity: entity.into(),
        }
    }

    /// Package path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Entity name.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Returns true for [`FullQName::NULL`].
    pub fn is_null(&self) -> bool {
        self.path.is_empty() && self.entity.is_empty()
    }
}

impl fmt::Display for FullQName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.path, QNAME_SEPARATOR, self.entity)
    }
}

impl Serialize for FullQName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Check identifier syntax.
///
/// An identifier is non-empty, at most `max_len` bytes long, starts with an
/// ASCII letter or underscore and continues with ASCII letters, digits or
/// underscores.
pub fn validate_ident(ident: &str, max_len: usize) -> DefinitionResult<()> {
    let mut chars = ident.chars();
    let Some(first) = chars.next() else {
        return Err(DefinitionError::Missing("identifier".into()));
    };
    if ident.len() > max_len {
        return Err(DefinitionError::invalid_name(
            ident,
            format!("longer than {max_len} characters"),
        ));
    }
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(DefinitionError::invalid_name(
            ident,
            "must start with a letter or underscore",
        ));
    }
    if let Some(c) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(DefinitionError::invalid_name(
            ident,
            format!("unexpected character «{c}»"),
        ));
    }
    Ok(())
}

/// Check that both parts of a qualified name are valid identifiers.
pub fn validate_qname(name: &QName, max_len: usize) -> DefinitionResult<()> {
    if name.is_null() {
        return Err(DefinitionError::Missing("qualified name".into()));
    }
    validate_ident(name.pkg(), max_len)
        .and_then(|_| validate_ident(name.entity(), max_len))
        .map_err(|err| match err {
            DefinitionError::InvalidName { reason, .. } => {
                DefinitionError::invalid_name(name.to_string(), reason)
            }
            DefinitionError::Missing(_) => {
                DefinitionError::invalid_name(name.to_string(), "package and entity must be set")
            }
            other => other,
        })
}
