//! Type definitions: the common header plus a kind-specific body.

use super::data::DataType;
use super::extension::{Function, Job, Projector};
use super::field::{FieldDef, FieldList};
use super::rate::{Limit, Rate};
use super::structure::{Container, Structure, Unique};
use super::types::TypeKind;
use super::view::View;
use super::workspace::Workspace;
use crate::qname::QName;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

/// Body of a tag type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tag {
    feature: String,
}

impl Tag {
    pub(crate) fn new(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
        }
    }

    /// Feature description.
    pub fn feature(&self) -> &str {
        &self.feature
    }
}

/// Kind-specific payload of a type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeBody {
    /// The absent type.
    Null,
    /// Wildcard type.
    Any,
    /// Data type.
    Data(DataType),
    /// Document, record, object or element.
    Structure(Structure),
    /// View.
    View(View),
    /// Command or query.
    Function(Function),
    /// Projector.
    Projector(Projector),
    /// Scheduled job.
    Job(Job),
    /// Workspace.
    Workspace(Workspace),
    /// ACL principal.
    Role,
    /// Tag.
    Tag(Tag),
    /// Rate.
    Rate(Rate),
    /// Limit.
    Limit(Limit),
}

/// A catalog type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDef {
    name: QName,
    kind: TypeKind,
    workspace: QName,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(rename = "abstract", skip_serializing_if = "std::ops::Not::not")]
    is_abstract: bool,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    tags: BTreeSet<QName>,
    body: TypeBody,
}

static NULL_TYPE: TypeDef = TypeDef {
    name: QName::NULL,
    kind: TypeKind::Null,
    workspace: QName::NULL,
    comment: None,
    is_abstract: false,
    tags: BTreeSet::new(),
    body: TypeBody::Null,
};

static ANY_TYPE: LazyLock<TypeDef> = LazyLock::new(|| {
    TypeDef::new(QName::any(), TypeKind::Any, QName::sys_workspace(), TypeBody::Any)
});

impl TypeDef {
    pub(crate) fn new(name: QName, kind: TypeKind, workspace: QName, body: TypeBody) -> Self {
        Self {
            name,
            kind,
            workspace,
            comment: None,
            is_abstract: false,
            tags: BTreeSet::new(),
            body,
        }
    }

    /// The NULL object returned by lookups that miss.
    pub fn null() -> &'static TypeDef {
        &NULL_TYPE
    }

    /// The wildcard `sys.ANY` type.
    pub fn any() -> &'static TypeDef {
        &ANY_TYPE
    }

    /// Qualified name.
    pub fn name(&self) -> &QName {
        &self.name
    }

    /// Kind.
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Owning workspace. A workspace owns itself.
    pub fn workspace(&self) -> &QName {
        &self.workspace
    }

    /// Comment.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Abstract flag.
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Tags, sorted.
    pub fn tags(&self) -> impl Iterator<Item = &QName> {
        self.tags.iter()
    }

    /// Returns true for the NULL object.
    pub fn is_null(&self) -> bool {
        self.kind == TypeKind::Null
    }

    /// Returns true for types of the system package.
    pub fn is_sys(&self) -> bool {
        self.name.is_sys()
    }

    /// Kind-specific payload.
    pub fn body(&self) -> &TypeBody {
        &self.body
    }

    /// Data type payload.
    pub fn as_data(&self) -> Option<&DataType> {
        match &self.body {
            TypeBody::Data(d) => Some(d),
            _ => None,
        }
    }

    /// Structure payload.
    pub fn as_structure(&self) -> Option<&Structure> {
        match &self.body {
            TypeBody::Structure(s) => Some(s),
            _ => None,
        }
    }

    /// View payload.
    pub fn as_view(&self) -> Option<&View> {
        match &self.body {
            TypeBody::View(v) => Some(v),
            _ => None,
        }
    }

    /// Command or query payload.
    pub fn as_function(&self) -> Option<&Function> {
        match &self.body {
            TypeBody::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Projector payload.
    pub fn as_projector(&self) -> Option<&Projector> {
        match &self.body {
            TypeBody::Projector(p) => Some(p),
            _ => None,
        }
    }

    /// Job payload.
    pub fn as_job(&self) -> Option<&Job> {
        match &self.body {
            TypeBody::Job(j) => Some(j),
            _ => None,
        }
    }

    /// Workspace payload.
    pub fn as_workspace(&self) -> Option<&Workspace> {
        match &self.body {
            TypeBody::Workspace(w) => Some(w),
            _ => None,
        }
    }

    /// Tag payload.
    pub fn as_tag(&self) -> Option<&Tag> {
        match &self.body {
            TypeBody::Tag(t) => Some(t),
            _ => None,
        }
    }

    /// Rate payload.
    pub fn as_rate(&self) -> Option<&Rate> {
        match &self.body {
            TypeBody::Rate(r) => Some(r),
            _ => None,
        }
    }

    /// Limit payload.
    pub fn as_limit(&self) -> Option<&Limit> {
        match &self.body {
            TypeBody::Limit(l) => Some(l),
            _ => None,
        }
    }

    /// Field list of structures and views.
    pub fn fields(&self) -> Option<&FieldList> {
        match &self.body {
            TypeBody::Structure(s) => Some(s.fields()),
            TypeBody::View(v) => Some(v.fields()),
            _ => None,
        }
    }

    /// Find a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields().and_then(|f| f.get(name))
    }

    /// Number of fields, zero for types without fields.
    pub fn field_count(&self) -> usize {
        self.fields().map_or(0, FieldList::len)
    }

    /// Containers; empty for non-structures.
    pub fn containers(&self) -> &[Container] {
        self.as_structure()
            .map(Structure::containers)
            .unwrap_or_default()
    }

    /// Find a container by name.
    pub fn container(&self, name: &str) -> Option<&Container> {
        self.as_structure().and_then(|s| s.container(name))
    }

    /// Number of containers.
    pub fn container_count(&self) -> usize {
        self.containers().len()
    }

    /// Uniques; empty for non-structures.
    pub fn uniques(&self) -> &[Unique] {
        self.as_structure()
            .map(Structure::uniques)
            .unwrap_or_default()
    }

    /// Singleton flag of documents.
    pub fn is_singleton(&self) -> bool {
        self.as_structure().is_some_and(Structure::is_singleton)
    }

    pub(crate) fn body_mut(&mut self) -> &mut TypeBody {
        &mut self.body
    }

    pub(crate) fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
    }

    pub(crate) fn set_abstract(&mut self) {
        self.is_abstract = true;
    }

    pub(crate) fn add_tag(&mut self, tag: QName) {
        self.tags.insert(tag);
    }
}

impl fmt::Display for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} «{}»", self.kind, self.name)
    }
}
