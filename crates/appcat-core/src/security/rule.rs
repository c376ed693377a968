//! ACL rules and the operations they govern.

use crate::catalog::{ResourceFilter, TypeDef, TypeKind};
use crate::error::{DefinitionError, DefinitionResult};
use crate::qname::QName;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Operation governed by ACL rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Operation {
    /// Insert a record.
    Insert,
    /// Update record fields.
    Update,
    /// Read record fields.
    Select,
    /// Activate a record.
    Activate,
    /// Deactivate a record.
    Deactivate,
    /// Execute a function.
    Execute,
    /// Inherit the privileges of another role.
    Inherits,
}

impl Operation {
    /// Returns true for operations that may be narrowed to fields.
    pub fn has_fields(self) -> bool {
        matches!(
            self,
            Operation::Insert | Operation::Update | Operation::Select
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Rule effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Policy {
    /// Grant.
    Allow,
    /// Revoke.
    Deny,
}

impl Policy {
    /// Statement verb.
    pub fn action(self) -> &'static str {
        match self {
            Policy::Allow => "GRANT",
            Policy::Deny => "REVOKE",
        }
    }
}

/// Operations applicable to resources of `kind`.
pub fn operations_for_kind(kind: TypeKind) -> &'static [Operation] {
    use Operation::*;
    const ACTIVABLE: &[Operation] = &[Insert, Update, Select, Activate, Deactivate];
    const STRUCTURE: &[Operation] = &[Insert, Update, Select];
    const VIEW: &[Operation] = &[Select];
    const FUNCTION: &[Operation] = &[Execute];
    const ROLE: &[Operation] = &[Inherits];

    match kind {
        k if k.is_activable() => ACTIVABLE,
        k if k.is_structure() => STRUCTURE,
        TypeKind::ViewRecord => VIEW,
        k if k.is_function() => FUNCTION,
        TypeKind::Role => ROLE,
        _ => &[],
    }
}

/// Operations `grant_all` and `revoke_all` expand to for resources of `kind`.
pub fn default_operations_for_kind(kind: TypeKind) -> &'static [Operation] {
    let ops = operations_for_kind(kind);
    if kind.is_activable() {
        &ops[..3]
    } else {
        ops
    }
}

/// Check that `ops` and `fields` apply to the resource `t`.
pub(crate) fn check_rule_on_type(
    ops: &BTreeSet<Operation>,
    fields: &[String],
    t: &TypeDef,
) -> DefinitionResult<()> {
    let available = operations_for_kind(t.kind());
    if available.is_empty() {
        return Err(DefinitionError::Unsupported(format!("{t} as ACL resource")));
    }
    if let Some(op) = ops.iter().find(|op| !available.contains(op)) {
        return Err(DefinitionError::Incompatible(format!("operation {op} and {t}")));
    }
    if let Some(list) = t.fields() {
        if let Some(missing) = fields.iter().find(|f| !list.contains(f)) {
            return Err(DefinitionError::NotFound(format!("field «{missing}» in {t}")));
        }
    }
    Ok(())
}

/// Check the operation set and field list of a new rule.
pub(crate) fn check_rule_shape(
    policy: Policy,
    ops: &BTreeSet<Operation>,
    fields: &[String],
) -> DefinitionResult<()> {
    if ops.is_empty() {
        return Err(DefinitionError::Missing("ACL rule operations".into()));
    }
    if ops.contains(&Operation::Inherits) {
        if ops.len() > 1 {
            return Err(DefinitionError::Incompatible(
                "operations: Inherits can not be mixed with other operations".into(),
            ));
        }
        if policy == Policy::Deny {
            return Err(DefinitionError::Unsupported("revoking Inherits".into()));
        }
    }
    if !fields.is_empty() {
        if let Some(op) = ops.iter().find(|op| !op.has_fields()) {
            return Err(DefinitionError::Incompatible(format!(
                "operation {op} with fields"
            )));
        }
    }
    Ok(())
}

/// One ordered ACL statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AclRule {
    position: usize,
    policy: Policy,
    ops: BTreeSet<Operation>,
    filter: ResourceFilter,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<String>,
    principal: QName,
    workspace: QName,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

impl AclRule {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        position: usize,
        policy: Policy,
        ops: BTreeSet<Operation>,
        filter: ResourceFilter,
        fields: Vec<String>,
        principal: QName,
        workspace: QName,
        comment: Option<String>,
    ) -> Self {
        Self {
            position,
            policy,
            ops,
            filter,
            fields,
            principal,
            workspace,
            comment,
        }
    }

    /// Position in the catalog rule list.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Effect.
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Governed operations.
    pub fn ops(&self) -> impl Iterator<Item = Operation> + '_ {
        self.ops.iter().copied()
    }

    /// Returns true if the rule governs `op`.
    pub fn has_op(&self, op: Operation) -> bool {
        self.ops.contains(&op)
    }

    pub(crate) fn op_set(&self) -> &BTreeSet<Operation> {
        &self.ops
    }

    /// Selected resources.
    pub fn filter(&self) -> &ResourceFilter {
        &self.filter
    }

    /// Field subset; empty means all fields.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Role the rule applies to.
    pub fn principal(&self) -> &QName {
        &self.principal
    }

    /// Workspace the rule was declared in.
    pub fn workspace(&self) -> &QName {
        &self.workspace
    }

    /// Comment.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

impl fmt::Display for AclRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ops: Vec<String> = self.ops.iter().map(Operation::to_string).collect();
        write!(f, "{} [{}] ON {}", self.policy.action(), ops.join(" "), self.filter)?;
        if !self.fields.is_empty() {
            write!(f, "({})", self.fields.join(", "))?;
        }
        let preposition = match self.policy {
            Policy::Allow => "TO",
            Policy::Deny => "FROM",
        };
        write!(f, " {preposition} {}", self.principal)
    }
}
