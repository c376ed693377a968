//! ACL rule validation.

use super::Context;
use crate::error::{ValidationError, ValidationErrors};
use crate::security::check_rule_on_type;

/// Every rule must select at least one type visible from its workspace, and
/// every selected type must support the rule's operations and fields.
pub(super) fn validate_rules(ctx: &Context<'_>, errors: &mut ValidationErrors) {
    for rule in &ctx.registry().acl {
        let ws = rule.workspace();
        let matched = ctx.matching(ws, rule.filter());
        if matched.is_empty() {
            errors.push(ValidationError::not_found(
                ws,
                format!("ACL rule #{} «{rule}»: filter matches no type", rule.position()),
            ));
        }
        for t in matched {
            if let Err(err) = check_rule_on_type(rule.op_set(), rule.fields(), t) {
                errors.push(ValidationError::new(
                    err.kind(),
                    ws,
                    format!("ACL rule #{} «{rule}»: {err}", rule.position()),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::CatalogBuilder;
    use crate::catalog::{DataKind, ResourceFilter, TypeKind};
    use crate::error::ErrorKind;
    use crate::qname::QName;
    use crate::security::Operation;

    fn q(s: &str) -> QName {
        QName::new("test", s)
    }

    #[test]
    fn test_rule_without_match() {
        let mut builder = CatalogBuilder::new();
        let mut ws = builder.add_workspace(q("ws"));
        ws.add_role(q("reader"));
        ws.grant(&[Operation::Select], ResourceFilter::name(q("later")), &[], q("reader"), "");
        drop(ws);

        let errors = builder.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(ErrorKind::NotFound, "QNAMES(test.later)"));
        assert_eq!(errors.iter().next().unwrap().owner, q("ws"));

        builder
            .alter_workspace(q("ws"))
            .add_cdoc(q("later"))
            .add_field("f", DataKind::Int32, false);
        assert!(builder.validate().is_ok());
    }

    #[test]
    fn test_rule_checked_against_later_types() {
        let mut builder = CatalogBuilder::new();
        let mut ws = builder.add_workspace(q("ws"));
        ws.add_role(q("reader"));
        ws.add_cdoc(q("doc")).add_field("f", DataKind::Int32, false);
        ws.grant(
            &[Operation::Select],
            ResourceFilter::kinds([TypeKind::CDoc]),
            &["f"],
            q("reader"),
            "",
        );
        // a CDoc without field «f» added after the rule
        ws.add_cdoc(q("other"));
        drop(ws);

        let errors = builder.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(ErrorKind::NotFound, "test.other"));
    }
}
