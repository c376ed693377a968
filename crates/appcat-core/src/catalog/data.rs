//! Data types: named, constrained value kinds.

use super::constraint::Constraint;
use super::types::DataKind;
use crate::qname::QName;
use serde::Serialize;

/// Body of a `Data` type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataType {
    kind: DataKind,
    #[serde(skip_serializing_if = "QName::is_null")]
    ancestor: QName,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    constraints: Vec<Constraint>,
}

impl DataType {
    /// Create a data type deriving from `ancestor` (or from nothing, if NULL).
    pub fn new(kind: DataKind, ancestor: QName, constraints: Vec<Constraint>) -> Self {
        Self {
            kind,
            ancestor,
            constraints,
        }
    }

    /// System data type of `kind`.
    pub(crate) fn sys(kind: DataKind) -> Self {
        Self::new(kind, QName::NULL, Vec::new())
    }

    /// Value kind.
    pub fn kind(&self) -> DataKind {
        self.kind
    }

    /// Ancestor data type, NULL for system data types.
    pub fn ancestor(&self) -> &QName {
        &self.ancestor
    }

    /// Constraints declared by this type, without inherited ones.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}
