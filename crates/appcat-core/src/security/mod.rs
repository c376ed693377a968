//! Access control: ordered ACL rules and their evaluation.
//!
//! Rules are appended by workspace builders and kept in declaration order;
//! the order decides which of two conflicting rules wins.

mod error;
mod evaluator;
mod rule;

pub use error::{AclError, AclResult};
pub use evaluator::{Access, PublishedOps};
pub(crate) use evaluator::{is_operation_allowed, published_types, AclScope};
pub use rule::{default_operations_for_kind, operations_for_kind, AclRule, Operation, Policy};
pub(crate) use rule::{check_rule_on_type, check_rule_shape};
