//! ACL query errors.

use super::Operation;
use crate::qname::QName;
use thiserror::Error;

/// Errors in the arguments of an ACL query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AclError {
    /// The resource is not a known type.
    #[error("resource «{0}» not found")]
    ResourceNotFound(QName),

    /// The operation does not apply to the resource.
    #[error("operation {op} is not applicable to {kind} «{resource}»")]
    IncompatibleResource {
        /// Requested operation.
        op: Operation,
        /// Resource name.
        resource: QName,
        /// Resource kind, as text.
        kind: String,
    },

    /// The operation can not be queried.
    #[error("operation {0} is not supported by ACL queries")]
    UnsupportedOperation(Operation),

    /// A requested field does not exist on the resource.
    #[error("field «{field}» not found in «{resource}»")]
    FieldNotFound {
        /// Resource name.
        resource: QName,
        /// Requested field.
        field: String,
    },

    /// No principal was supplied.
    #[error("principals are missing")]
    MissingPrincipals,

    /// A principal is not a known role.
    #[error("role «{0}» not found")]
    RoleNotFound(QName),
}

/// Result type for ACL queries.
pub type AclResult<T> = Result<T, AclError>;
