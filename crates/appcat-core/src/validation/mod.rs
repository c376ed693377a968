//! Catalog validation.
//!
//! One pass over every type and every ACL rule. Problems are collected into
//! a [`ValidationErrors`] value; no check stops the pass.

mod acl;
mod checks;

use crate::catalog::registry::Registry;
use crate::catalog::{ResourceFilter, TypeBody, TypeDef};
use crate::error::ValidationErrors;
use crate::qname::QName;
use tracing::debug;

/// Consistency check of one type body against the rest of the catalog.
pub(crate) trait Validate {
    /// Record every problem of `self`, owned by `owner`, into `errors`.
    fn validate(&self, owner: &TypeDef, ctx: &Context<'_>, errors: &mut ValidationErrors);
}

/// Read access to the registry being validated.
pub(crate) struct Context<'r> {
    registry: &'r Registry,
}

impl<'r> Context<'r> {
    /// Resolve a type by name, `sys.ANY` included.
    pub(crate) fn resolve(&self, name: &QName) -> Option<&'r TypeDef> {
        let t = self.registry.type_def(name);
        (!t.is_null()).then_some(t)
    }

    /// Types visible from `ws` that `filter` selects.
    pub(crate) fn matching(&self, ws: &QName, filter: &ResourceFilter) -> Vec<&'r TypeDef> {
        self.registry
            .visible_defs(ws)
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect()
    }

    pub(crate) fn registry(&self) -> &'r Registry {
        self.registry
    }
}

/// Validate every definition of `registry`.
pub(crate) fn validate(registry: &Registry) -> ValidationErrors {
    let ctx = Context { registry };
    let mut errors = ValidationErrors::new();

    for t in registry.types.values() {
        validate_type(t, &ctx, &mut errors);
    }
    acl::validate_rules(&ctx, &mut errors);

    debug!(
        types = registry.types.len(),
        rules = registry.acl.len(),
        errors = errors.len(),
        "catalog validated"
    );
    errors
}

fn validate_type(t: &TypeDef, ctx: &Context<'_>, errors: &mut ValidationErrors) {
    if let Some(fields) = t.fields() {
        checks::validate_fields(t, fields, ctx, errors);
    }
    match t.body() {
        TypeBody::Null | TypeBody::Any | TypeBody::Role | TypeBody::Tag(_) | TypeBody::Rate(_) => {}
        TypeBody::Data(data) => data.validate(t, ctx, errors),
        TypeBody::Structure(s) => s.validate(t, ctx, errors),
        TypeBody::View(view) => view.validate(t, ctx, errors),
        TypeBody::Function(f) => f.validate(t, ctx, errors),
        TypeBody::Projector(p) => p.validate(t, ctx, errors),
        TypeBody::Job(job) => job.validate(t, ctx, errors),
        TypeBody::Workspace(ws) => ws.validate(t, ctx, errors),
        TypeBody::Limit(limit) => limit.validate(t, ctx, errors),
    }
}
