//! Frozen catalog snapshot.
//!
//! A [`Catalog`] is produced by a successful build and has no mutation API.
//! Type lookups, container targets, workspace visibility and ancestor
//! closures are resolved once at freeze time.

use super::registry::Registry;
use super::typedef::TypeDef;
use super::types::TypeKind;
use super::workspace::{effective_ancestors, Workspace, WorkspaceGraph};
use super::TypeBody;
use crate::config::CatalogConfig;
use crate::qname::{FullQName, Packages, QName};
use crate::security::{
    is_operation_allowed, published_types, Access, AclResult, AclRule, AclScope, Operation,
    PublishedOps,
};
use std::collections::{BTreeSet, HashMap};

/// Immutable, validated catalog of application types.
#[derive(Debug, Clone)]
pub struct Catalog {
    config: CatalogConfig,
    packages: Packages,
    /// Types sorted by name.
    types: Vec<TypeDef>,
    index: HashMap<QName, usize>,
    uniques: HashMap<QName, QName>,
    /// Indices of the types visible from each workspace, sorted by name.
    visible: HashMap<QName, Vec<usize>>,
    /// Each workspace plus its transitive ancestors.
    ancestry: HashMap<QName, BTreeSet<QName>>,
    descriptors: HashMap<QName, QName>,
    acl: Vec<AclRule>,
}

impl Catalog {
    /// Freeze a validated registry.
    pub(crate) fn freeze(registry: Registry) -> Self {
        let mut visible_names = HashMap::new();
        let mut ancestry = HashMap::new();
        let mut descriptors = HashMap::new();
        for (name, def) in &registry.types {
            let Some(ws) = def.as_workspace() else {
                continue;
            };
            visible_names.insert(name.clone(), registry.visible_types(name));
            ancestry.insert(name.clone(), registry.ancestor_closure(name));
            if let Some(descriptor) = ws.descriptor() {
                descriptors.insert(descriptor.clone(), name.clone());
            }
        }

        let Registry {
            config,
            packages,
            types,
            uniques,
            acl,
        } = registry;

        let mut types: Vec<TypeDef> = types.into_values().collect();
        let index: HashMap<QName, usize> = types
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name().clone(), i))
            .collect();

        for t in &mut types {
            if let TypeBody::Structure(s) = t.body_mut() {
                for c in s.containers_mut() {
                    c.resolved = index.get(c.target()).copied();
                }
            }
        }

        let visible = visible_names
            .into_iter()
            .map(|(ws, names)| {
                let indices = names.iter().filter_map(|n| index.get(n).copied()).collect();
                (ws, indices)
            })
            .collect();

        Self {
            config,
            packages,
            types,
            index,
            uniques: uniques.into_iter().collect(),
            visible,
            ancestry,
            descriptors,
            acl,
        }
    }

    /// Configuration the catalog was built with.
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Look a type up, returning the NULL object if unknown.
    ///
    /// `sys.ANY` resolves to the wildcard type.
    pub fn type_def(&self, name: &QName) -> &TypeDef {
        if *name == QName::any() {
            return TypeDef::any();
        }
        self.find_type(name).unwrap_or(TypeDef::null())
    }

    /// Look a type up.
    pub fn find_type(&self, name: &QName) -> Option<&TypeDef> {
        self.index.get(name).map(|&i| &self.types[i])
    }

    fn find_kind(&self, name: &QName, accept: impl Fn(TypeKind) -> bool) -> Option<&TypeDef> {
        self.find_type(name).filter(|t| accept(t.kind()))
    }

    /// Global document.
    pub fn gdoc(&self, name: &QName) -> Option<&TypeDef> {
        self.find_kind(name, |k| k == TypeKind::GDoc)
    }

    /// Configuration document.
    pub fn cdoc(&self, name: &QName) -> Option<&TypeDef> {
        self.find_kind(name, |k| k == TypeKind::CDoc)
    }

    /// Workflow document.
    pub fn wdoc(&self, name: &QName) -> Option<&TypeDef> {
        self.find_kind(name, |k| k == TypeKind::WDoc)
    }

    /// Operation document.
    pub fn odoc(&self, name: &QName) -> Option<&TypeDef> {
        self.find_kind(name, |k| k == TypeKind::ODoc)
    }

    /// Record of any kind.
    pub fn record(&self, name: &QName) -> Option<&TypeDef> {
        self.find_kind(name, |k| k.is_record() && !k.is_doc())
    }

    /// Object.
    pub fn object(&self, name: &QName) -> Option<&TypeDef> {
        self.find_kind(name, |k| k == TypeKind::Object)
    }

    /// Element.
    pub fn element(&self, name: &QName) -> Option<&TypeDef> {
        self.find_kind(name, |k| k == TypeKind::Element)
    }

    /// View.
    pub fn view(&self, name: &QName) -> Option<&TypeDef> {
        self.find_kind(name, |k| k == TypeKind::ViewRecord)
    }

    /// Command.
    pub fn command(&self, name: &QName) -> Option<&TypeDef> {
        self.find_kind(name, |k| k == TypeKind::Command)
    }

    /// Query.
    pub fn query(&self, name: &QName) -> Option<&TypeDef> {
        self.find_kind(name, |k| k == TypeKind::Query)
    }

    /// Command or query.
    pub fn function(&self, name: &QName) -> Option<&TypeDef> {
        self.find_kind(name, TypeKind::is_function)
    }

    /// Projector.
    pub fn projector(&self, name: &QName) -> Option<&TypeDef> {
        self.find_kind(name, |k| k == TypeKind::Projector)
    }

    /// Job.
    pub fn job(&self, name: &QName) -> Option<&TypeDef> {
        self.find_kind(name, |k| k == TypeKind::Job)
    }

    /// Role.
    pub fn role(&self, name: &QName) -> Option<&TypeDef> {
        self.find_kind(name, |k| k == TypeKind::Role)
    }

    /// Data type.
    pub fn data(&self, name: &QName) -> Option<&TypeDef> {
        self.find_kind(name, |k| k == TypeKind::Data)
    }

    /// Rate.
    pub fn rate(&self, name: &QName) -> Option<&TypeDef> {
        self.find_kind(name, |k| k == TypeKind::Rate)
    }

    /// Limit.
    pub fn limit(&self, name: &QName) -> Option<&TypeDef> {
        self.find_kind(name, |k| k == TypeKind::Limit)
    }

    /// Every type, sorted by name.
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.iter()
    }

    /// Types of one kind, sorted by name.
    pub fn types_of_kind(&self, kind: TypeKind) -> impl Iterator<Item = &TypeDef> {
        self.types.iter().filter(move |t| t.kind() == kind)
    }

    /// Number of types, system types included.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Look a workspace up.
    pub fn workspace(&self, name: &QName) -> Option<WorkspaceRef<'_>> {
        let def = self.find_type(name)?;
        WorkspaceRef::new(self, def)
    }

    /// Every workspace, sorted by name.
    pub fn workspaces(&self) -> impl Iterator<Item = WorkspaceRef<'_>> {
        self.types.iter().filter_map(|t| WorkspaceRef::new(self, t))
    }

    /// Workspace described by the `descriptor` document.
    pub fn workspace_by_descriptor(&self, descriptor: &QName) -> Option<WorkspaceRef<'_>> {
        self.descriptors
            .get(descriptor)
            .and_then(|ws| self.workspace(ws))
    }

    /// Target type of a container; the NULL object if either is unknown.
    pub fn container_target(&self, owner: &QName, container: &str) -> &TypeDef {
        self.find_type(owner)
            .and_then(|t| t.container(container))
            .and_then(|c| c.resolved)
            .map_or(TypeDef::null(), |i| &self.types[i])
    }

    /// Type declaring the unique `name`.
    pub fn unique_owner(&self, name: &QName) -> Option<&TypeDef> {
        self.uniques.get(name).and_then(|owner| self.find_type(owner))
    }

    /// Registered packages.
    pub fn packages(&self) -> &Packages {
        &self.packages
    }

    /// Path-qualified form of `name`; [`FullQName::NULL`] if the package is unknown.
    pub fn full_qname(&self, name: &QName) -> FullQName {
        self.packages.full_qname(name)
    }

    /// Local form of `name`; [`QName::NULL`] if the path is unknown.
    pub fn local_qname(&self, name: &FullQName) -> QName {
        self.packages.local_qname(name)
    }

    /// Path of a package local name.
    pub fn package_path(&self, local: &str) -> Option<&str> {
        self.packages.path_by_local(local)
    }

    /// Local name of a package path.
    pub fn package_local_name(&self, path: &str) -> Option<&str> {
        self.packages.local_by_path(path)
    }

    /// Every ACL rule, in declaration order.
    pub fn acl(&self) -> &[AclRule] {
        &self.acl
    }

    /// Check whether the union of `principals` may perform `op` on `resource`.
    ///
    /// Every rule of the catalog is considered. `fields` narrows the query
    /// to specific fields; the returned [`Access`] lists the allowed fields
    /// in resource field order.
    pub fn is_operation_allowed(
        &self,
        op: Operation,
        resource: &QName,
        fields: &[&str],
        principals: &[QName],
    ) -> AclResult<Access> {
        is_operation_allowed(self, op, resource, fields, principals)
    }
}

impl AclScope for Catalog {
    fn resolve(&self, name: &QName) -> &TypeDef {
        self.type_def(name)
    }

    fn roles(&self) -> impl Iterator<Item = &TypeDef> + '_ {
        self.types_of_kind(TypeKind::Role)
    }

    fn rules(&self) -> impl Iterator<Item = &AclRule> + '_ {
        self.acl.iter()
    }

    fn log_denied(&self) -> bool {
        self.config.log_denied_access
    }
}

/// Read view of one workspace of a [`Catalog`].
#[derive(Debug, Clone, Copy)]
pub struct WorkspaceRef<'a> {
    catalog: &'a Catalog,
    def: &'a TypeDef,
    ws: &'a Workspace,
}

impl<'a> WorkspaceRef<'a> {
    fn new(catalog: &'a Catalog, def: &'a TypeDef) -> Option<Self> {
        let ws = def.as_workspace()?;
        Some(Self { catalog, def, ws })
    }

    /// Workspace name.
    pub fn name(&self) -> &'a QName {
        self.def.name()
    }

    /// Workspace type definition.
    pub fn def(&self) -> &'a TypeDef {
        self.def
    }

    /// Abstract flag.
    pub fn is_abstract(&self) -> bool {
        self.def.is_abstract()
    }

    /// Direct ancestors in declaration order; `sys.Workspace` if none were set.
    pub fn ancestors(&self) -> Vec<QName> {
        effective_ancestors(self.def.name(), self.ws)
    }

    /// Directly used workspaces.
    pub fn used_workspaces(&self) -> &'a [QName] {
        self.ws.used_workspaces()
    }

    /// True if `other` is this workspace or one of its transitive ancestors.
    pub fn inherits(&self, other: &QName) -> bool {
        self.catalog
            .ancestry
            .get(self.name())
            .is_some_and(|a| a.contains(other))
    }

    /// Descriptor document.
    pub fn descriptor(&self) -> Option<&'a TypeDef> {
        self.ws
            .descriptor()
            .and_then(|name| self.catalog.find_type(name))
    }

    /// Types declared in this workspace, sorted by name.
    pub fn local_types(&self) -> impl Iterator<Item = &'a TypeDef> + 'a {
        let catalog = self.catalog;
        self.ws
            .local_types()
            .filter_map(move |name| catalog.find_type(name))
    }

    fn visible(&self) -> &'a [usize] {
        self.catalog
            .visible
            .get(self.name())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every type visible from this workspace, sorted by name.
    pub fn types(&self) -> impl Iterator<Item = &'a TypeDef> + 'a {
        visible_types(self.catalog, self.visible())
    }

    /// Look a visible type up, returning the NULL object if unknown or not visible.
    pub fn type_def(&self, name: &QName) -> &'a TypeDef {
        if *name == QName::any() {
            return TypeDef::any();
        }
        let types = &self.catalog.types;
        match self
            .visible()
            .binary_search_by(|&i| types[i].name().cmp(name))
        {
            Ok(pos) => &types[self.visible()[pos]],
            Err(_) => TypeDef::null(),
        }
    }

    /// Rules declared in this workspace or its ancestors, in declaration order.
    pub fn acl(&self) -> impl Iterator<Item = &'a AclRule> + 'a {
        scoped_rules(self.catalog, self.def.name())
    }

    /// Workspace-scoped [`Catalog::is_operation_allowed`].
    ///
    /// The resource and the principals must be visible from this workspace;
    /// only rules declared here or in an ancestor are considered.
    pub fn is_operation_allowed(
        &self,
        op: Operation,
        resource: &QName,
        fields: &[&str],
        principals: &[QName],
    ) -> AclResult<Access> {
        is_operation_allowed(self, op, resource, fields, principals)
    }

    /// Documents, records, objects, views and functions visible here that
    /// `role` may access through rules of this workspace or its ancestors.
    ///
    /// Roles inherited by `role` are taken into account. Types come in name
    /// order; a type no operation is allowed on is left out.
    pub fn published_types(
        &self,
        role: &QName,
    ) -> impl Iterator<Item = (&'a TypeDef, PublishedOps)> + 'a {
        published_types(self, self.types(), role).into_iter()
    }
}

impl AclScope for WorkspaceRef<'_> {
    fn resolve(&self, name: &QName) -> &TypeDef {
        self.type_def(name)
    }

    fn roles(&self) -> impl Iterator<Item = &TypeDef> + '_ {
        visible_types(self.catalog, self.visible()).filter(|t| t.kind() == TypeKind::Role)
    }

    fn rules(&self) -> impl Iterator<Item = &AclRule> + '_ {
        scoped_rules(self.catalog, self.def.name())
    }

    fn log_denied(&self) -> bool {
        self.catalog.config.log_denied_access
    }
}

fn visible_types<'c>(catalog: &'c Catalog, indices: &'c [usize]) -> impl Iterator<Item = &'c TypeDef> + 'c {
    indices.iter().map(move |&i| &catalog.types[i])
}

/// Rules declared in `ws` or one of its ancestors.
fn scoped_rules<'c>(catalog: &'c Catalog, ws: &QName) -> impl Iterator<Item = &'c AclRule> + 'c {
    let ancestry = catalog.ancestry.get(ws);
    catalog
        .acl
        .iter()
        .filter(move |r| ancestry.is_some_and(|a| a.contains(r.workspace())))
}
