//! Build-phase type registry.
//!
//! The registry owns every type definition while the catalog is being
//! defined. Types reference each other by name only; nothing here is
//! resolved until validation.

use super::constraint::{merge_constraints, Constraint};
use super::data::DataType;
use super::filter::ResourceFilter;
use super::typedef::{TypeBody, TypeDef};
use super::types::{DataKind, TypeKind};
use super::workspace::{Workspace, WorkspaceGraph};
use crate::config::CatalogConfig;
use crate::error::{DefinitionError, DefinitionResult};
use crate::qname::{validate_qname, Packages, QName};
use crate::security::{check_rule_on_type, check_rule_shape, AclRule, Operation, Policy};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Mutable store of types, uniques, packages and ACL rules.
#[derive(Debug, Clone)]
pub(crate) struct Registry {
    pub(crate) config: CatalogConfig,
    pub(crate) packages: Packages,
    pub(crate) types: BTreeMap<QName, TypeDef>,
    /// Unique name to owning type name.
    pub(crate) uniques: BTreeMap<QName, QName>,
    pub(crate) acl: Vec<AclRule>,
}

impl Registry {
    /// Create a registry holding the system package, workspace and data types.
    pub(crate) fn new(config: CatalogConfig) -> Self {
        let sys_ws = QName::sys_workspace();
        let mut body = Workspace::new();
        body.add_local(sys_ws.clone());

        let mut types = BTreeMap::new();
        for kind in DataKind::ALL {
            let name = kind.sys_data_name();
            body.add_local(name.clone());
            types.insert(
                name.clone(),
                TypeDef::new(name, TypeKind::Data, sys_ws.clone(), TypeBody::Data(DataType::sys(kind))),
            );
        }
        types.insert(
            sys_ws.clone(),
            TypeDef::new(sys_ws.clone(), TypeKind::Workspace, sys_ws, TypeBody::Workspace(body)),
        );

        Self {
            config,
            packages: Packages::with_sys(),
            types,
            uniques: BTreeMap::new(),
            acl: Vec::new(),
        }
    }

    /// Look a type up.
    pub(crate) fn get(&self, name: &QName) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Look a type up, returning `sys.ANY` or the NULL object where appropriate.
    pub(crate) fn type_def(&self, name: &QName) -> &TypeDef {
        if *name == QName::any() {
            return TypeDef::any();
        }
        self.types.get(name).unwrap_or(TypeDef::null())
    }

    pub(crate) fn type_mut(&mut self, name: &QName) -> DefinitionResult<&mut TypeDef> {
        self.types
            .get_mut(name)
            .ok_or_else(|| DefinitionError::NotFound(format!("type «{name}»")))
    }

    /// True if a type or a unique is bound to `name`.
    pub(crate) fn is_bound(&self, name: &QName) -> bool {
        *name == QName::any() || self.types.contains_key(name) || self.uniques.contains_key(name)
    }

    /// Insert a new type into its owning workspace.
    pub(crate) fn add_type(&mut self, mut def: TypeDef) -> DefinitionResult<()> {
        let name = def.name().clone();
        validate_qname(&name, self.config.max_ident_len)?;
        if self.is_bound(&name) {
            return Err(DefinitionError::AlreadyExists(format!("type «{name}»")));
        }
        if let TypeBody::Workspace(ws) = def.body_mut() {
            ws.add_local(name.clone());
        } else {
            let owner = def.workspace().clone();
            self.workspace_mut(&owner)?.add_local(name.clone());
        }
        debug!(name = %name, kind = %def.kind(), workspace = %def.workspace(), "type added");
        self.types.insert(name, def);
        Ok(())
    }

    /// Bind a unique name to its owner.
    pub(crate) fn bind_unique(&mut self, name: &QName, owner: &QName) -> DefinitionResult<()> {
        validate_qname(name, self.config.max_ident_len)?;
        if self.is_bound(name) {
            return Err(DefinitionError::AlreadyExists(format!("name «{name}»")));
        }
        self.uniques.insert(name.clone(), owner.clone());
        Ok(())
    }

    pub(crate) fn workspace(&self, name: &QName) -> DefinitionResult<&Workspace> {
        match self.types.get(name) {
            Some(t) => t.as_workspace().ok_or_else(|| {
                DefinitionError::Incompatible(format!("{t}, workspace expected"))
            }),
            None => Err(DefinitionError::NotFound(format!("workspace «{name}»"))),
        }
    }

    pub(crate) fn workspace_mut(&mut self, name: &QName) -> DefinitionResult<&mut Workspace> {
        match self.types.get_mut(name) {
            Some(t) => {
                let kind = t.kind();
                match t.body_mut() {
                    TypeBody::Workspace(ws) => Ok(ws),
                    _ => Err(DefinitionError::Incompatible(format!(
                        "{kind} «{name}», workspace expected"
                    ))),
                }
            }
            None => Err(DefinitionError::NotFound(format!("workspace «{name}»"))),
        }
    }

    /// Look a type up among the types visible from `ws`.
    pub(crate) fn find_visible(&self, ws: &QName, name: &QName) -> Option<&TypeDef> {
        if *name == QName::any() {
            return Some(TypeDef::any());
        }
        if self.is_visible(ws, name) {
            self.types.get(name)
        } else {
            None
        }
    }

    /// Types visible from `ws`, in name order.
    pub(crate) fn visible_defs(&self, ws: &QName) -> Vec<&TypeDef> {
        self.visible_types(ws)
            .iter()
            .filter_map(|n| self.types.get(n))
            .collect()
    }

    /// Replace the explicit ancestors of `ws`.
    ///
    /// Every candidate is checked before the graph changes.
    pub(crate) fn set_ancestors(&mut self, ws: &QName, ancestors: Vec<QName>) -> DefinitionResult<()> {
        if ancestors.is_empty() {
            return Err(DefinitionError::Missing(format!("ancestors of workspace «{ws}»")));
        }
        self.workspace(ws)?;
        let mut accepted: Vec<QName> = Vec::with_capacity(ancestors.len());
        for ancestor in ancestors {
            self.workspace(&ancestor)?;
            if self.ancestor_closure(&ancestor).contains(ws) {
                return Err(DefinitionError::CircularInheritance {
                    workspace: ws.clone(),
                    ancestor,
                });
            }
            if !accepted.contains(&ancestor) {
                accepted.push(ancestor);
            }
        }
        debug!(workspace = %ws, ancestors = ?accepted, "ancestors set");
        self.workspace_mut(ws)?.set_ancestors(accepted);
        Ok(())
    }

    /// Record "uses" edges from `ws`.
    pub(crate) fn use_workspaces(&mut self, ws: &QName, used: Vec<QName>) -> DefinitionResult<()> {
        self.workspace(ws)?;
        for name in &used {
            self.workspace(name)?;
        }
        let body = self.workspace_mut(ws)?;
        for name in used {
            body.add_used(name);
        }
        Ok(())
    }

    /// Set the descriptor document of `ws`.
    ///
    /// An abstract descriptor makes the workspace abstract.
    pub(crate) fn set_descriptor(&mut self, ws: &QName, descriptor: QName) -> DefinitionResult<()> {
        if !self.workspace(ws)?.has_local(&descriptor) {
            return Err(DefinitionError::NotFound(format!(
                "descriptor «{descriptor}» in workspace «{ws}»"
            )));
        }
        let doc = self.type_def(&descriptor);
        if doc.kind() != TypeKind::CDoc {
            return Err(DefinitionError::Incompatible(format!(
                "descriptor {doc}, CDoc expected"
            )));
        }
        let is_abstract = doc.is_abstract();
        self.workspace_mut(ws)?.set_descriptor(descriptor);
        if is_abstract {
            self.type_mut(ws)?.set_abstract();
        }
        Ok(())
    }

    /// Attach a tag visible from the type's workspace.
    pub(crate) fn add_tag(&mut self, name: &QName, tag: QName) -> DefinitionResult<()> {
        let ws = self.type_mut(name)?.workspace().clone();
        match self.find_visible(&ws, &tag) {
            Some(t) if t.kind() == TypeKind::Tag => {}
            _ => return Err(DefinitionError::NotFound(format!("tag «{tag}»"))),
        }
        self.type_mut(name)?.add_tag(tag);
        Ok(())
    }

    /// Effective constraints of a data type, ancestors first, overridden per kind.
    pub(crate) fn data_constraints(&self, name: &QName) -> Vec<Constraint> {
        let mut chain = Vec::new();
        let mut seen = BTreeSet::new();
        let mut current = name.clone();
        while let Some(data) = self.types.get(&current).and_then(TypeDef::as_data) {
            if !seen.insert(current.clone()) {
                break;
            }
            chain.push(data);
            current = data.ancestor().clone();
        }
        chain
            .iter()
            .rev()
            .fold(Vec::new(), |acc, d| merge_constraints(&acc, d.constraints()))
    }

    /// Append an ACL rule declared in `ws`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn add_rule(
        &mut self,
        ws: &QName,
        policy: Policy,
        ops: BTreeSet<Operation>,
        filter: ResourceFilter,
        fields: Vec<String>,
        principal: QName,
        comment: Option<String>,
    ) -> DefinitionResult<()> {
        self.workspace(ws)?;
        check_rule_shape(policy, &ops, &fields)?;
        match self.find_visible(ws, &principal) {
            Some(t) if t.kind() == TypeKind::Role => {}
            _ => return Err(DefinitionError::NotFound(format!("role «{principal}»"))),
        }
        for t in self.visible_defs(ws).into_iter().filter(|t| filter.matches(t)) {
            check_rule_on_type(&ops, &fields, t)?;
        }

        let rule = AclRule::new(
            self.acl.len(),
            policy,
            ops,
            filter,
            fields,
            principal,
            ws.clone(),
            comment,
        );
        debug!(workspace = %ws, rule = %rule, "ACL rule added");
        self.acl.push(rule);
        Ok(())
    }
}

impl WorkspaceGraph for Registry {
    fn workspace_body(&self, name: &QName) -> Option<&Workspace> {
        self.types.get(name).and_then(TypeDef::as_workspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::structure::Structure;
    use crate::error::ErrorKind;

    fn q(s: &str) -> QName {
        QName::new("test", s)
    }

    fn registry() -> Registry {
        let mut r = Registry::new(CatalogConfig::default());
        for ws in ["ws1", "ws2", "ws3"] {
            r.add_type(TypeDef::new(
                q(ws),
                TypeKind::Workspace,
                q(ws),
                TypeBody::Workspace(Workspace::new()),
            ))
            .unwrap();
        }
        r
    }

    fn doc(name: &str, ws: &str) -> TypeDef {
        TypeDef::new(
            q(name),
            TypeKind::CDoc,
            q(ws),
            TypeBody::Structure(Structure::new(TypeKind::CDoc)),
        )
    }

    #[test]
    fn test_sys_types() {
        let r = Registry::new(CatalogConfig::default());
        let sys = r.workspace(&QName::sys_workspace()).unwrap();
        assert!(sys.has_local(&QName::sys("int64")));
        assert_eq!(r.type_def(&QName::sys("string")).kind(), TypeKind::Data);
        assert_eq!(r.type_def(&QName::any()).kind(), TypeKind::Any);
        assert!(r.type_def(&q("unknown")).is_null());
        assert!(r.packages.path_by_local("sys").is_some());
    }

    #[test]
    fn test_add_type() {
        let mut r = registry();
        r.add_type(doc("doc", "ws1")).unwrap();
        assert!(r.workspace(&q("ws1")).unwrap().has_local(&q("doc")));
        assert_eq!(r.type_def(&q("doc")).workspace(), &q("ws1"));

        assert_eq!(
            r.add_type(doc("doc", "ws2")).unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
        assert_eq!(
            r.add_type(doc("doc2", "nows")).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            r.add_type(doc("doc3", "doc")).unwrap_err().kind(),
            ErrorKind::Incompatible
        );
        assert_eq!(
            r.add_type(TypeDef::new(QName::new("test", "bad name"), TypeKind::Role, q("ws1"), TypeBody::Role))
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidName
        );
        assert_eq!(
            r.add_type(TypeDef::new(QName::any(), TypeKind::Role, q("ws1"), TypeBody::Role))
                .unwrap_err()
                .kind(),
            ErrorKind::AlreadyExists
        );
    }

    #[test]
    fn test_unique_shares_name_space() {
        let mut r = registry();
        r.add_type(doc("doc", "ws1")).unwrap();
        r.bind_unique(&q("uniq"), &q("doc")).unwrap();
        assert_eq!(
            r.add_type(doc("uniq", "ws1")).unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
        assert_eq!(
            r.bind_unique(&q("doc"), &q("doc")).unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
    }

    #[test]
    fn test_set_ancestors_rejects_cycles() {
        let mut r = registry();
        r.set_ancestors(&q("ws2"), vec![q("ws1")]).unwrap();
        r.set_ancestors(&q("ws3"), vec![q("ws2")]).unwrap();

        let err = r.set_ancestors(&q("ws1"), vec![q("ws3")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cycle);
        assert!(r.workspace(&q("ws1")).unwrap().explicit_ancestors().is_empty());

        let err = r.set_ancestors(&q("ws1"), vec![q("ws1")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cycle);

        let err = r
            .set_ancestors(&QName::sys_workspace(), vec![q("ws1")])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cycle);

        assert_eq!(
            r.set_ancestors(&q("ws1"), vec![]).unwrap_err().kind(),
            ErrorKind::Missing
        );
        assert_eq!(
            r.set_ancestors(&q("ws1"), vec![q("nows")]).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_find_visible() {
        let mut r = registry();
        r.add_type(doc("doc1", "ws1")).unwrap();
        r.add_type(doc("doc2", "ws2")).unwrap();
        r.add_type(doc("doc3", "ws3")).unwrap();
        r.set_ancestors(&q("ws2"), vec![q("ws1")]).unwrap();
        r.use_workspaces(&q("ws2"), vec![q("ws3")]).unwrap();

        assert!(r.find_visible(&q("ws2"), &q("doc1")).is_some());
        assert!(r.find_visible(&q("ws2"), &q("doc3")).is_some());
        assert!(r.find_visible(&q("ws2"), &QName::sys("int32")).is_some());
        assert!(r.find_visible(&q("ws1"), &q("doc2")).is_none());
        assert!(r.find_visible(&q("ws3"), &q("doc2")).is_none());

        let names: Vec<_> = r.visible_defs(&q("ws2")).iter().map(|t| t.name().clone()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_set_descriptor() {
        let mut r = registry();
        let mut d = doc("desc", "ws1");
        d.set_abstract();
        r.add_type(d).unwrap();
        r.add_type(doc("other", "ws2")).unwrap();

        r.set_descriptor(&q("ws1"), q("desc")).unwrap();
        assert_eq!(r.workspace(&q("ws1")).unwrap().descriptor(), Some(&q("desc")));
        assert!(r.type_def(&q("ws1")).is_abstract());

        assert_eq!(
            r.set_descriptor(&q("ws1"), q("other")).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_data_constraints_chain() {
        let mut r = registry();
        r.add_type(TypeDef::new(
            q("str10"),
            TypeKind::Data,
            q("ws1"),
            TypeBody::Data(DataType::new(
                DataKind::String,
                QName::sys("string"),
                vec![Constraint::MinLen(1), Constraint::MaxLen(10)],
            )),
        ))
        .unwrap();
        r.add_type(TypeDef::new(
            q("str4"),
            TypeKind::Data,
            q("ws1"),
            TypeBody::Data(DataType::new(DataKind::String, q("str10"), vec![Constraint::MaxLen(4)])),
        ))
        .unwrap();

        assert_eq!(
            r.data_constraints(&q("str4")),
            vec![Constraint::MinLen(1), Constraint::MaxLen(4)]
        );
        assert!(r.data_constraints(&QName::sys("string")).is_empty());
    }
}
