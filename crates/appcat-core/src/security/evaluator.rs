//! ACL evaluation.
//!
//! Rules are scanned in declaration order. For each rule that governs the
//! operation, selects the resource and names one of the (expanded)
//! principals:
//!
//! - a full grant allows the operation on every field of the resource;
//! - a field grant allows the operation and adds its fields;
//! - a full revoke denies the operation and clears the allowed fields;
//! - a field revoke removes its fields and allows the operation only while
//!   some field remains.

use super::error::{AclError, AclResult};
use super::rule::{operations_for_kind, AclRule, Operation, Policy};
use crate::catalog::{TypeDef, TypeKind};
use crate::qname::QName;
use std::collections::BTreeSet;
use tracing::debug;

/// Outcome of an ACL query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Access {
    allowed: bool,
    fields: Option<Vec<String>>,
}

impl Access {
    /// Returns true if the operation is allowed.
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// Allowed fields in resource field order; `None` for resources without fields.
    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }
}

/// The part of a catalog an ACL query runs against.
pub(crate) trait AclScope {
    /// Resolve a type name; the NULL object on miss.
    fn resolve(&self, name: &QName) -> &TypeDef;

    /// Role types in scope.
    fn roles(&self) -> impl Iterator<Item = &TypeDef> + '_;

    /// Rules in scope, in declaration order.
    fn rules(&self) -> impl Iterator<Item = &AclRule> + '_;

    /// Emit a debug event for denied queries.
    fn log_denied(&self) -> bool;
}

/// Evaluate `op` on `resource` for the union of `principals`.
pub(crate) fn is_operation_allowed<S: AclScope>(
    scope: &S,
    op: Operation,
    resource: &QName,
    fields: &[&str],
    principals: &[QName],
) -> AclResult<Access> {
    if op == Operation::Inherits {
        return Err(AclError::UnsupportedOperation(op));
    }

    let t = scope.resolve(resource);
    if t.is_null() {
        return Err(AclError::ResourceNotFound(resource.clone()));
    }
    if !operations_for_kind(t.kind()).contains(&op) {
        return Err(AclError::IncompatibleResource {
            op,
            resource: resource.clone(),
            kind: t.kind().to_string(),
        });
    }
    let field_list = t.fields();
    for field in fields {
        if !field_list.is_some_and(|list| list.contains(field)) {
            return Err(AclError::FieldNotFound {
                resource: resource.clone(),
                field: field.to_string(),
            });
        }
    }

    if principals.is_empty() {
        return Err(AclError::MissingPrincipals);
    }
    if let Some(unknown) = principals
        .iter()
        .find(|p| scope.resolve(p).kind() != TypeKind::Role)
    {
        return Err(AclError::RoleNotFound(unknown.clone()));
    }
    let roles = expand_roles(scope, principals);

    let (mut result, allowed_fields) = scan_rules(scope, op, t, &roles);

    if result && !fields.is_empty() {
        result = fields.iter().all(|f| allowed_fields.contains(f));
    }

    let effective = field_list.map(|list| {
        list.names()
            .filter(|name| allowed_fields.contains(name))
            .map(str::to_string)
            .collect()
    });

    if !result && scope.log_denied() {
        debug!(
            op = %op,
            resource = %resource,
            principals = ?principals,
            requested = ?fields,
            "ACL query denied"
        );
    }

    Ok(Access {
        allowed: result,
        fields: effective,
    })
}

/// Run the ordered rule scan for `op` on `t`.
///
/// Returns whether the operation is allowed and the set of allowed fields.
fn scan_rules<'a, S: AclScope>(
    scope: &'a S,
    op: Operation,
    t: &'a TypeDef,
    roles: &BTreeSet<QName>,
) -> (bool, BTreeSet<&'a str>) {
    let field_list = t.fields();
    let mut allowed_fields: BTreeSet<&str> = BTreeSet::new();
    let mut result = false;
    for rule in scope.rules() {
        if !rule.has_op(op) || !roles.contains(rule.principal()) || !rule.filter().matches(t) {
            continue;
        }
        match (rule.policy(), rule.fields().is_empty()) {
            (Policy::Allow, true) => {
                result = true;
                allowed_fields.extend(field_list.into_iter().flat_map(|l| l.names()));
            }
            (Policy::Allow, false) => {
                result = true;
                allowed_fields.extend(rule.fields().iter().map(String::as_str));
            }
            (Policy::Deny, true) => {
                result = false;
                allowed_fields.clear();
            }
            (Policy::Deny, false) => {
                for field in rule.fields() {
                    allowed_fields.remove(field.as_str());
                }
                result = !allowed_fields.is_empty();
            }
        }
    }
    (result, allowed_fields)
}

/// Operations a role may perform, per type: allowed fields in field order,
/// `None` when the operation has no fields or every field is allowed.
pub type PublishedOps = Vec<(Operation, Option<Vec<String>>)>;

/// Kinds listed by [`published_types`].
fn is_published(kind: TypeKind) -> bool {
    kind.is_record()
        || kind.is_function()
        || matches!(kind, TypeKind::Object | TypeKind::ViewRecord)
}

/// Every published type of `types` that `role`, or a role it inherits,
/// may access, with the allowed operations in [`operations_for_kind`] order.
pub(crate) fn published_types<'t, S: AclScope>(
    scope: &S,
    types: impl Iterator<Item = &'t TypeDef>,
    role: &QName,
) -> Vec<(&'t TypeDef, PublishedOps)> {
    let roles = expand_roles(scope, std::slice::from_ref(role));
    types
        .filter(|t| is_published(t.kind()))
        .filter_map(|t| {
            let ops: PublishedOps = operations_for_kind(t.kind())
                .iter()
                .filter_map(|&op| {
                    let (allowed, fields) = scan_rules(scope, op, t, &roles);
                    allowed.then(|| (op, published_fields(op, t, &fields)))
                })
                .collect();
            (!ops.is_empty()).then_some((t, ops))
        })
        .collect()
}

fn published_fields(op: Operation, t: &TypeDef, allowed: &BTreeSet<&str>) -> Option<Vec<String>> {
    let list = t.fields().filter(|_| op.has_fields())?;
    if list.names().all(|name| allowed.contains(name)) {
        return None;
    }
    Some(
        list.names()
            .filter(|name| allowed.contains(name))
            .map(str::to_string)
            .collect(),
    )
}

/// Principals plus every role they inherit through `Inherits` grants.
fn expand_roles<S: AclScope>(scope: &S, principals: &[QName]) -> BTreeSet<QName> {
    let mut roles: BTreeSet<QName> = principals.iter().cloned().collect();
    loop {
        let mut grown = false;
        for rule in scope
            .rules()
            .filter(|r| r.policy() == Policy::Allow && r.has_op(Operation::Inherits))
        {
            if !roles.contains(rule.principal()) {
                continue;
            }
            for role in scope.roles().filter(|r| rule.filter().matches(r)) {
                grown |= roles.insert(role.name().clone());
            }
        }
        if !grown {
            return roles;
        }
    }
}
