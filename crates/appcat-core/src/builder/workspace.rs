//! Workspace builder.

use super::{
    find_visible_kind, non_empty, or_abort, FunctionBuilder, JobBuilder, ProjectorBuilder,
    StructureBuilder, TypeBuilder, ViewBuilder,
};
use crate::catalog::registry::Registry;
use crate::catalog::{
    Constraint, DataKind, DataType, Function, Job, Limit, Projector, Rate, RateScope,
    ResourceFilter, Structure, Tag, TypeBody, TypeDef, TypeKind, View,
};
use crate::error::{DefinitionError, DefinitionResult};
use crate::qname::QName;
use crate::security::{default_operations_for_kind, Operation, Policy};
use std::time::Duration;

/// Builder of one workspace and the types declared in it.
#[derive(Debug)]
pub struct WorkspaceBuilder<'a> {
    registry: &'a mut Registry,
    name: QName,
}

impl<'a> WorkspaceBuilder<'a> {
    pub(crate) fn new(registry: &'a mut Registry, name: QName) -> Self {
        Self { registry, name }
    }

    /// Workspace name.
    pub fn name(&self) -> &QName {
        &self.name
    }

    fn add(&mut self, name: &QName, kind: TypeKind, body: TypeBody) {
        let def = TypeDef::new(name.clone(), kind, self.name.clone(), body);
        or_abort(self.registry.add_type(def));
    }

    fn add_structure(&mut self, name: QName, kind: TypeKind) -> StructureBuilder<'_> {
        self.add(&name, kind, TypeBody::Structure(Structure::new(kind)));
        StructureBuilder::new(self.registry, name)
    }

    /// Add a global document.
    ///
    /// # Panics
    ///
    /// This and every other `add_*` method panic if `name` is invalid or
    /// already bound.
    pub fn add_gdoc(&mut self, name: QName) -> StructureBuilder<'_> {
        self.add_structure(name, TypeKind::GDoc)
    }

    /// Add a configuration document.
    pub fn add_cdoc(&mut self, name: QName) -> StructureBuilder<'_> {
        self.add_structure(name, TypeKind::CDoc)
    }

    /// Add a workflow document.
    pub fn add_wdoc(&mut self, name: QName) -> StructureBuilder<'_> {
        self.add_structure(name, TypeKind::WDoc)
    }

    /// Add an operation document.
    pub fn add_odoc(&mut self, name: QName) -> StructureBuilder<'_> {
        self.add_structure(name, TypeKind::ODoc)
    }

    /// Add a global record.
    pub fn add_grecord(&mut self, name: QName) -> StructureBuilder<'_> {
        self.add_structure(name, TypeKind::GRecord)
    }

    /// Add a configuration record.
    pub fn add_crecord(&mut self, name: QName) -> StructureBuilder<'_> {
        self.add_structure(name, TypeKind::CRecord)
    }

    /// Add a workflow record.
    pub fn add_wrecord(&mut self, name: QName) -> StructureBuilder<'_> {
        self.add_structure(name, TypeKind::WRecord)
    }

    /// Add an operation record.
    pub fn add_orecord(&mut self, name: QName) -> StructureBuilder<'_> {
        self.add_structure(name, TypeKind::ORecord)
    }

    /// Add an object.
    pub fn add_object(&mut self, name: QName) -> StructureBuilder<'_> {
        self.add_structure(name, TypeKind::Object)
    }

    /// Add an element.
    pub fn add_element(&mut self, name: QName) -> StructureBuilder<'_> {
        self.add_structure(name, TypeKind::Element)
    }

    /// Add a view.
    pub fn add_view(&mut self, name: QName) -> ViewBuilder<'_> {
        self.add(&name, TypeKind::ViewRecord, TypeBody::View(View::new()));
        ViewBuilder::new(self.registry, name)
    }

    /// Add a command.
    pub fn add_command(&mut self, name: QName) -> FunctionBuilder<'_> {
        self.add(&name, TypeKind::Command, TypeBody::Function(Function::new()));
        FunctionBuilder::new(self.registry, name)
    }

    /// Add a query.
    pub fn add_query(&mut self, name: QName) -> FunctionBuilder<'_> {
        self.add(&name, TypeKind::Query, TypeBody::Function(Function::new()));
        FunctionBuilder::new(self.registry, name)
    }

    /// Add a projector.
    pub fn add_projector(&mut self, name: QName) -> ProjectorBuilder<'_> {
        self.add(&name, TypeKind::Projector, TypeBody::Projector(Projector::new()));
        ProjectorBuilder::new(self.registry, name)
    }

    /// Add a scheduled job.
    pub fn add_job(&mut self, name: QName) -> JobBuilder<'_> {
        self.add(&name, TypeKind::Job, TypeBody::Job(Job::new()));
        JobBuilder::new(self.registry, name)
    }

    /// Add a role.
    pub fn add_role(&mut self, name: QName) -> TypeBuilder<'_> {
        self.add(&name, TypeKind::Role, TypeBody::Role);
        TypeBuilder::new(self.registry, name)
    }

    /// Add a data type derived from `ancestor`.
    ///
    /// A NULL ancestor means the system data type of `kind`.
    ///
    /// # Panics
    ///
    /// Panics if the ancestor is not a visible data type of the same kind or
    /// a constraint does not apply to `kind`.
    pub fn add_data(
        &mut self,
        name: QName,
        kind: DataKind,
        ancestor: QName,
        constraints: Vec<Constraint>,
    ) -> TypeBuilder<'_> {
        let ancestor = if ancestor.is_null() {
            kind.sys_data_name()
        } else {
            ancestor
        };
        let data = or_abort(self.check_data(kind, &ancestor, &constraints));
        self.add(&name, TypeKind::Data, TypeBody::Data(DataType::new(kind, ancestor, data)));
        TypeBuilder::new(self.registry, name)
    }

    fn check_data(
        &self,
        kind: DataKind,
        ancestor: &QName,
        constraints: &[Constraint],
    ) -> DefinitionResult<Vec<Constraint>> {
        let parent = find_visible_kind(self.registry, &self.name, ancestor, "data type", |k| {
            k == TypeKind::Data
        })?;
        let parent_kind = parent.as_data().map(DataType::kind).unwrap_or(DataKind::Null);
        if parent_kind != kind {
            return Err(DefinitionError::Incompatible(format!(
                "data kind {kind} and ancestor «{ancestor}» of kind {parent_kind}"
            )));
        }
        for c in constraints {
            c.check(kind)?;
        }
        Ok(constraints.to_vec())
    }

    /// Add a tag.
    pub fn add_tag(&mut self, name: QName, feature: &str) -> TypeBuilder<'_> {
        self.add(&name, TypeKind::Tag, TypeBody::Tag(Tag::new(feature)));
        TypeBuilder::new(self.registry, name)
    }

    /// Add a rate.
    ///
    /// # Panics
    ///
    /// Panics if `count` or `period` is zero.
    pub fn add_rate(
        &mut self,
        name: QName,
        count: u32,
        period: Duration,
        scopes: &[RateScope],
    ) -> TypeBuilder<'_> {
        let rate = or_abort(Rate::new(count, period, scopes.iter().copied()));
        self.add(&name, TypeKind::Rate, TypeBody::Rate(rate));
        TypeBuilder::new(self.registry, name)
    }

    /// Add a limit of `ops` on the resources selected by `filter`.
    ///
    /// # Panics
    ///
    /// Panics if `ops` is empty or holds an operation that can not be
    /// limited, or if `rate` is NULL.
    pub fn add_limit(
        &mut self,
        name: QName,
        ops: &[Operation],
        filter: ResourceFilter,
        rate: QName,
    ) -> TypeBuilder<'_> {
        let limit = or_abort(Limit::new(ops.iter().copied(), filter, rate));
        self.add(&name, TypeKind::Limit, TypeBody::Limit(limit));
        TypeBuilder::new(self.registry, name)
    }

    /// Replace the explicit ancestors.
    ///
    /// # Panics
    ///
    /// Panics if the list is empty, a name is not a workspace or accepting
    /// it would make the inheritance graph cyclic. Nothing changes on failure.
    pub fn set_ancestors(&mut self, ancestors: impl IntoIterator<Item = QName>) -> &mut Self {
        or_abort(self.try_set_ancestors(ancestors));
        self
    }

    /// Fallible [`set_ancestors`](Self::set_ancestors).
    pub fn try_set_ancestors(
        &mut self,
        ancestors: impl IntoIterator<Item = QName>,
    ) -> DefinitionResult<()> {
        self.registry
            .set_ancestors(&self.name, ancestors.into_iter().collect())
    }

    /// Use the types of other workspaces.
    ///
    /// # Panics
    ///
    /// Panics if a name is not a workspace.
    pub fn use_workspace(&mut self, used: impl IntoIterator<Item = QName>) -> &mut Self {
        or_abort(self.try_use_workspace(used));
        self
    }

    /// Fallible [`use_workspace`](Self::use_workspace).
    pub fn try_use_workspace(&mut self, used: impl IntoIterator<Item = QName>) -> DefinitionResult<()> {
        self.registry
            .use_workspaces(&self.name, used.into_iter().collect())
    }

    /// Set the descriptor document.
    ///
    /// # Panics
    ///
    /// Panics if `descriptor` is not a CDoc declared in this workspace.
    pub fn set_descriptor(&mut self, descriptor: QName) -> &mut Self {
        or_abort(self.registry.set_descriptor(&self.name, descriptor));
        self
    }

    /// Mark the workspace abstract.
    pub fn set_abstract(&mut self) -> &mut Self {
        or_abort(self.registry.type_mut(&self.name)).set_abstract();
        self
    }

    /// Set or clear the workspace comment.
    pub fn set_comment(&mut self, comment: &str) -> &mut Self {
        or_abort(self.registry.type_mut(&self.name)).set_comment(non_empty(comment));
        self
    }

    /// Grant `ops` on the resources selected by `filter` to `principal`.
    ///
    /// An empty `fields` list grants every field.
    ///
    /// # Panics
    ///
    /// Panics if `ops` is empty or mixes `Inherits` with other operations,
    /// if fields are given for operations without fields, if `principal` is
    /// not a visible role, or if a type already matching `filter` does not
    /// support the rule.
    pub fn grant(
        &mut self,
        ops: &[Operation],
        filter: ResourceFilter,
        fields: &[&str],
        principal: QName,
        comment: &str,
    ) -> &mut Self {
        or_abort(self.try_add_rule(Policy::Allow, ops, filter, fields, principal, comment));
        self
    }

    /// Revoke `ops` on the resources selected by `filter` from `principal`.
    ///
    /// # Panics
    ///
    /// As [`grant`](Self::grant); `Inherits` can not be revoked.
    pub fn revoke(
        &mut self,
        ops: &[Operation],
        filter: ResourceFilter,
        fields: &[&str],
        principal: QName,
        comment: &str,
    ) -> &mut Self {
        or_abort(self.try_add_rule(Policy::Deny, ops, filter, fields, principal, comment));
        self
    }

    /// Grant the default operations of the selected resources.
    ///
    /// Operations are taken from the first visible type matching `filter`;
    /// a filter selecting roles grants `Inherits`.
    ///
    /// # Panics
    ///
    /// Panics if nothing visible matches `filter` or the matched kind has no
    /// operations.
    pub fn grant_all(&mut self, filter: ResourceFilter, principal: QName, comment: &str) -> &mut Self {
        or_abort(self.try_add_rule_all(Policy::Allow, filter, principal, comment));
        self
    }

    /// Revoke the default operations of the selected resources.
    ///
    /// # Panics
    ///
    /// As [`grant_all`](Self::grant_all).
    pub fn revoke_all(&mut self, filter: ResourceFilter, principal: QName, comment: &str) -> &mut Self {
        or_abort(self.try_add_rule_all(Policy::Deny, filter, principal, comment));
        self
    }

    /// Fallible form of [`grant`](Self::grant) and [`revoke`](Self::revoke).
    pub fn try_add_rule(
        &mut self,
        policy: Policy,
        ops: &[Operation],
        filter: ResourceFilter,
        fields: &[&str],
        principal: QName,
        comment: &str,
    ) -> DefinitionResult<()> {
        self.registry.add_rule(
            &self.name,
            policy,
            ops.iter().copied().collect(),
            filter,
            fields.iter().map(|f| f.to_string()).collect(),
            principal,
            non_empty(comment),
        )
    }

    fn try_add_rule_all(
        &mut self,
        policy: Policy,
        filter: ResourceFilter,
        principal: QName,
        comment: &str,
    ) -> DefinitionResult<()> {
        let kind = self
            .registry
            .visible_defs(&self.name)
            .into_iter()
            .find(|t| filter.matches(t))
            .map(TypeDef::kind)
            .ok_or_else(|| DefinitionError::NotFound(format!("types matching {filter}")))?;
        let ops = default_operations_for_kind(kind);
        if ops.is_empty() {
            return Err(DefinitionError::Unsupported(format!("{kind} as ACL resource")));
        }
        self.try_add_rule(policy, ops, filter, &[], principal, comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CatalogBuilder;
    use crate::error::ErrorKind;

    fn q(s: &str) -> QName {
        QName::new("test", s)
    }

    #[test]
    fn test_types_owned_by_workspace() {
        let mut builder = CatalogBuilder::new();
        let mut ws = builder.add_workspace(q("ws"));
        ws.add_cdoc(q("doc"));
        ws.add_command(q("cmd"));
        ws.add_tag(q("tag"), "feature");
        drop(ws);

        for name in ["doc", "cmd", "tag"] {
            assert_eq!(builder.type_def(&q(name)).workspace(), &q("ws"), "{name}");
        }
        assert_eq!(builder.type_def(&q("ws")).workspace(), &q("ws"));
    }

    #[test]
    fn test_try_set_ancestors_cycle() {
        let mut builder = CatalogBuilder::new();
        builder.add_workspace(q("a"));
        builder.add_workspace(q("b")).set_ancestors([q("a")]);

        let err = builder
            .alter_workspace(q("a"))
            .try_set_ancestors([q("b")])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cycle);
        let catalog = builder.build().unwrap();
        let a = catalog.workspace(&q("a")).unwrap();
        assert!(!a.inherits(&q("b")));
        assert!(catalog.workspace(&q("b")).unwrap().inherits(&q("a")));
    }

    #[test]
    #[should_panic(expected = "circular inheritance")]
    fn test_self_ancestor_aborts() {
        let mut builder = CatalogBuilder::new();
        builder.add_workspace(q("a")).set_ancestors([q("a")]);
    }

    #[test]
    fn test_add_data() {
        let mut builder = CatalogBuilder::new();
        let mut ws = builder.add_workspace(q("ws"));
        ws.add_data(q("str10"), DataKind::String, QName::NULL, vec![Constraint::MaxLen(10)]);
        ws.add_data(q("code"), DataKind::String, q("str10"), vec![Constraint::Pattern("^[A-Z]+$".into())]);
        drop(ws);

        let code = builder.type_def(&q("code")).as_data().unwrap();
        assert_eq!(code.ancestor(), &q("str10"));
        assert_eq!(
            builder.type_def(&q("str10")).as_data().unwrap().ancestor(),
            &QName::sys("string")
        );
    }

    #[test]
    #[should_panic(expected = "incompatible data kind")]
    fn test_add_data_kind_mismatch_aborts() {
        let mut builder = CatalogBuilder::new();
        builder
            .add_workspace(q("ws"))
            .add_data(q("num"), DataKind::Int32, QName::sys("string"), vec![]);
    }

    #[test]
    fn test_rule_checks() {
        let mut builder = CatalogBuilder::new();
        let mut ws = builder.add_workspace(q("ws"));
        ws.add_cdoc(q("doc")).add_field("f1", DataKind::Int64, false);
        ws.add_role(q("reader"));

        assert_eq!(
            ws.try_add_rule(Policy::Allow, &[Operation::Select], q("doc").into(), &[], q("nobody"), "")
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ws.try_add_rule(Policy::Allow, &[Operation::Execute], q("doc").into(), &[], q("reader"), "")
                .unwrap_err()
                .kind(),
            ErrorKind::Incompatible
        );
        assert_eq!(
            ws.try_add_rule(Policy::Allow, &[Operation::Select], q("doc").into(), &["nope"], q("reader"), "")
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
        ws.grant(&[Operation::Select], q("doc").into(), &["f1"], q("reader"), "read f1");
        drop(ws);

        let rules = &builder.registry.acl;
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].comment(), Some("read f1"));
        assert_eq!(rules[0].workspace(), &q("ws"));
    }

    #[test]
    fn test_grant_all_expands_default_ops() {
        let mut builder = CatalogBuilder::new();
        let mut ws = builder.add_workspace(q("ws"));
        ws.add_wdoc(q("doc"));
        ws.add_role(q("reader"));
        ws.add_role(q("admin"));
        ws.grant_all(q("doc").into(), q("reader"), "");
        ws.grant_all(q("reader").into(), q("admin"), "");
        drop(ws);

        let rules = &builder.registry.acl;
        let ops: Vec<_> = rules[0].ops().collect();
        assert_eq!(ops, vec![Operation::Insert, Operation::Update, Operation::Select]);
        assert!(rules[1].has_op(Operation::Inherits));
    }

    #[test]
    #[should_panic(expected = "not found")]
    fn test_grant_all_without_match_aborts() {
        let mut builder = CatalogBuilder::new();
        let mut ws = builder.add_workspace(q("ws"));
        ws.add_role(q("reader"));
        ws.grant_all(q("doc").into(), q("reader"), "");
    }

    #[test]
    fn test_descriptor_and_abstract() {
        let mut builder = CatalogBuilder::new();
        let mut ws = builder.add_workspace(q("ws"));
        ws.add_cdoc(q("desc")).set_abstract();
        ws.set_descriptor(q("desc")).set_comment("abstract base");
        drop(ws);

        let def = builder.type_def(&q("ws"));
        assert!(def.is_abstract());
        assert_eq!(def.comment(), Some("abstract base"));
        assert_eq!(def.as_workspace().unwrap().descriptor(), Some(&q("desc")));
    }
}
