//! Read-only JSON description of a built catalog.
//!
//! Lists packages, user workspaces with the types they declare, and the ACL.
//! System workspace contents are left out.

use crate::catalog::{Catalog, TypeDef, WorkspaceRef};
use crate::qname::{FullQName, QName};
use crate::security::AclRule;
use serde::Serialize;
use std::collections::BTreeMap;

/// Serializable view of a [`Catalog`].
#[derive(Debug, Serialize)]
pub struct CatalogDescription<'a> {
    /// Package local name to path.
    pub packages: BTreeMap<&'a str, &'a str>,
    /// User workspaces, sorted by name.
    pub workspaces: Vec<WorkspaceDescription<'a>>,
    /// ACL rules in declaration order.
    pub acl: &'a [AclRule],
}

/// Serializable view of one workspace.
#[derive(Debug, Serialize)]
pub struct WorkspaceDescription<'a> {
    /// Workspace name.
    pub name: &'a QName,
    /// Path-qualified name; NULL if the package is not registered.
    pub full_name: FullQName,
    /// Abstract flag.
    #[serde(rename = "abstract", skip_serializing_if = "std::ops::Not::not")]
    pub is_abstract: bool,
    /// Direct ancestors.
    pub ancestors: Vec<QName>,
    /// Used workspaces.
    #[serde(skip_serializing_if = "<[QName]>::is_empty")]
    pub used: &'a [QName],
    /// Descriptor document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<&'a QName>,
    /// Types declared in the workspace, the workspace itself excluded.
    pub types: Vec<&'a TypeDef>,
}

impl<'a> WorkspaceDescription<'a> {
    fn new(catalog: &'a Catalog, ws: WorkspaceRef<'a>) -> Self {
        let name = ws.name();
        Self {
            name,
            full_name: catalog.full_qname(name),
            is_abstract: ws.is_abstract(),
            ancestors: ws.ancestors(),
            used: ws.used_workspaces(),
            descriptor: ws.descriptor().map(TypeDef::name),
            types: ws.local_types().filter(|t| t.name() != name).collect(),
        }
    }
}

impl Catalog {
    /// Describe the catalog.
    pub fn describe(&self) -> CatalogDescription<'_> {
        CatalogDescription {
            packages: self.packages().iter().collect(),
            workspaces: self
                .workspaces()
                .filter(|ws| !ws.name().is_sys())
                .map(|ws| WorkspaceDescription::new(self, ws))
                .collect(),
            acl: self.acl(),
        }
    }

    /// Describe the catalog as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.describe())
    }
}
