//! Per-body validation checks.

use super::{Context, Validate};
use crate::catalog::{
    constraint_conflicts, param_kind_available, result_kind_available, validate_cron, DataType,
    FieldList, Function, Job, Limit, Projector, Storages, Structure, TypeDef, TypeKind, View,
    Workspace,
};
use crate::error::{ErrorKind, ValidationError, ValidationErrors};
use crate::qname::QName;
use crate::security::operations_for_kind;

/// Reference targets and constraint consistency of every field.
pub(super) fn validate_fields(
    owner: &TypeDef,
    fields: &FieldList,
    ctx: &Context<'_>,
    errors: &mut ValidationErrors,
) {
    let name = owner.name();
    for field in fields.user_fields() {
        for target in field.ref_targets() {
            match ctx.resolve(target) {
                None => errors.push(ValidationError::not_found(
                    name,
                    format!("field «{}» reference type «{target}» not found", field.name()),
                )),
                Some(t) if !t.kind().is_record() => errors.push(ValidationError::incompatible(
                    name,
                    format!("field «{}» refers to {t}, record or document expected", field.name()),
                )),
                Some(_) => {}
            }
        }
        for conflict in constraint_conflicts(field.constraints()) {
            errors.push(ValidationError::invalid(
                name,
                format!("field «{}» constraints: {conflict}", field.name()),
            ));
        }
    }
}

impl Validate for Structure {
    fn validate(&self, owner: &TypeDef, ctx: &Context<'_>, errors: &mut ValidationErrors) {
        for c in self.containers() {
            match ctx.resolve(c.target()) {
                None => errors.push(ValidationError::not_found(
                    owner.name(),
                    format!("container «{}» type «{}» not found", c.name(), c.target()),
                )),
                Some(t) if !owner.kind().container_kind_available(t.kind()) => {
                    errors.push(ValidationError::incompatible(
                        owner.name(),
                        format!(
                            "container «{}»: {} can not contain {t}",
                            c.name(),
                            owner.kind()
                        ),
                    ))
                }
                Some(_) => {}
            }
        }
    }
}

impl Validate for View {
    fn validate(&self, owner: &TypeDef, _ctx: &Context<'_>, errors: &mut ValidationErrors) {
        let name = owner.name();
        if self.partition_key().is_empty() {
            errors.push(ValidationError::empty(name, "view partition key is empty"));
        }
        if self.clustering_columns().is_empty() {
            errors.push(ValidationError::empty(name, "view clustering columns are empty"));
        }
        let Some((_, leading)) = self.clustering_columns().split_last() else {
            return;
        };
        for column in leading {
            if self.fields().get(column).is_some_and(|f| !f.is_fixed_width()) {
                errors.push(ValidationError::incompatible(
                    name,
                    format!("variable width clustering column «{column}» must be the last one"),
                ));
            }
        }
    }
}

/// Check a parameter or result reference of a function.
fn check_function_type(
    owner: &TypeDef,
    role: &str,
    name: &QName,
    ctx: &Context<'_>,
    accept: fn(TypeKind) -> bool,
    errors: &mut ValidationErrors,
) {
    if name.is_null() || *name == QName::any() {
        return;
    }
    match ctx.resolve(name) {
        None => errors.push(ValidationError::not_found(
            owner.name(),
            format!("{role} type «{name}» not found"),
        )),
        Some(t) if !accept(t.kind()) => errors.push(ValidationError::incompatible(
            owner.name(),
            format!("{role} type {t} is not allowed"),
        )),
        Some(_) => {}
    }
}

impl Validate for Function {
    fn validate(&self, owner: &TypeDef, ctx: &Context<'_>, errors: &mut ValidationErrors) {
        check_function_type(owner, "parameter", self.param(), ctx, param_kind_available, errors);
        check_function_type(
            owner,
            "unlogged parameter",
            self.unlogged_param(),
            ctx,
            param_kind_available,
            errors,
        );
        check_function_type(owner, "result", self.result(), ctx, result_kind_available, errors);
        check_storages(owner, "state", self.states(), ctx, errors);
        check_storages(owner, "intent", self.intents(), ctx, errors);
    }
}

/// Every type named in `storages` must exist.
fn check_storages(
    owner: &TypeDef,
    side: &str,
    storages: &Storages,
    ctx: &Context<'_>,
    errors: &mut ValidationErrors,
) {
    for (storage, s) in storages.iter() {
        for name in s.names().filter(|n| ctx.resolve(n).is_none()) {
            errors.push(ValidationError::not_found(
                owner.name(),
                format!("{side} storage «{storage}» type «{name}» not found"),
            ));
        }
    }
}

impl Validate for DataType {
    fn validate(&self, owner: &TypeDef, ctx: &Context<'_>, errors: &mut ValidationErrors) {
        let name = owner.name();
        let ancestor = self.ancestor();
        if !ancestor.is_null() {
            match ctx.resolve(ancestor).and_then(|t| t.as_data().map(|d| (t, d))) {
                None => errors.push(ValidationError::not_found(
                    name,
                    format!("ancestor data type «{ancestor}» not found"),
                )),
                Some((t, d)) if d.kind() != self.kind() => {
                    errors.push(ValidationError::incompatible(
                        name,
                        format!("data kind {} and ancestor {t} of kind {}", self.kind(), d.kind()),
                    ))
                }
                Some(_) => {}
            }
        }
        for conflict in constraint_conflicts(&ctx.registry().data_constraints(name)) {
            errors.push(ValidationError::invalid(name, format!("constraints: {conflict}")));
        }
    }
}

impl Validate for Workspace {
    fn validate(&self, owner: &TypeDef, ctx: &Context<'_>, errors: &mut ValidationErrors) {
        let Some(descriptor) = self.descriptor() else {
            return;
        };
        match ctx.resolve(descriptor) {
            None => errors.push(ValidationError::not_found(
                owner.name(),
                format!("descriptor «{descriptor}» not found"),
            )),
            Some(t) if t.kind() != TypeKind::CDoc => errors.push(ValidationError::incompatible(
                owner.name(),
                format!("descriptor {t}, CDoc expected"),
            )),
            Some(t) if t.is_abstract() && !owner.is_abstract() => {
                errors.push(ValidationError::invalid(
                    owner.name(),
                    format!("descriptor {t} is abstract, workspace is not"),
                ))
            }
            Some(_) => {}
        }
    }
}

impl Validate for Job {
    fn validate(&self, owner: &TypeDef, ctx: &Context<'_>, errors: &mut ValidationErrors) {
        if let Err(reason) = validate_cron(self.cron()) {
            errors.push(ValidationError::invalid(
                owner.name(),
                format!("cron schedule «{}»: {reason}", self.cron()),
            ));
        }
        check_storages(owner, "state", self.states(), ctx, errors);
        if !self.intents().is_empty() {
            errors.push(ValidationError::new(
                ErrorKind::Unsupported,
                owner.name(),
                "job can not have intents",
            ));
        }
    }
}

impl Validate for Projector {
    fn validate(&self, owner: &TypeDef, ctx: &Context<'_>, errors: &mut ValidationErrors) {
        let name = owner.name();
        if self.events().is_empty() {
            errors.push(ValidationError::empty(name, "projector has no events"));
        }
        for event in self.events() {
            let matched = ctx.matching(owner.workspace(), event.filter());
            if matched.is_empty() {
                errors.push(ValidationError::not_found(
                    name,
                    format!("event filter {} matches no type", event.filter()),
                ));
            }
            for t in matched {
                for op in event.ops().filter(|op| !op.available_for(t.kind())) {
                    errors.push(ValidationError::incompatible(
                        name,
                        format!("event {op} is not available for {t}"),
                    ));
                }
            }
        }
        check_storages(owner, "state", self.states(), ctx, errors);
        check_storages(owner, "intent", self.intents(), ctx, errors);
    }
}

impl Validate for Limit {
    fn validate(&self, owner: &TypeDef, ctx: &Context<'_>, errors: &mut ValidationErrors) {
        let name = owner.name();
        match ctx.resolve(self.rate()) {
            None => errors.push(ValidationError::not_found(
                name,
                format!("rate «{}» not found", self.rate()),
            )),
            Some(t) if t.kind() != TypeKind::Rate => errors.push(ValidationError::incompatible(
                name,
                format!("rate {t}, Rate expected"),
            )),
            Some(_) => {}
        }

        let matched = ctx.matching(owner.workspace(), self.filter());
        if matched.is_empty() {
            errors.push(ValidationError::not_found(
                name,
                format!("limit filter {} matches no type", self.filter()),
            ));
        }
        for t in matched {
            let available = operations_for_kind(t.kind());
            for op in self.ops().filter(|op| !available.contains(op)) {
                errors.push(ValidationError::incompatible(
                    name,
                    format!("limited operation {op} is not available for {t}"),
                ));
            }
        }
    }
}
