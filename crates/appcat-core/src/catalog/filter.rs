//! Resource filters select types for ACL rules, limits and projector events.

use super::typedef::TypeDef;
use super::types::TypeKind;
use crate::qname::QName;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Predicate over types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResourceFilter {
    /// Types with one of these names.
    Names(BTreeSet<QName>),
    /// Types of one of these kinds.
    Kinds(BTreeSet<TypeKind>),
    /// Types carrying at least one of these tags.
    Tags(BTreeSet<QName>),
    /// Types declared locally in this workspace, the workspace itself excluded.
    Workspace(QName),
    /// All sub-filters match.
    And(Vec<ResourceFilter>),
    /// At least one sub-filter matches.
    Or(Vec<ResourceFilter>),
    /// The sub-filter does not match.
    Not(Box<ResourceFilter>),
}

impl ResourceFilter {
    /// Match exactly one name.
    pub fn name(name: QName) -> Self {
        Self::Names(BTreeSet::from([name]))
    }

    /// Match any of the names.
    pub fn names(names: impl IntoIterator<Item = QName>) -> Self {
        Self::Names(names.into_iter().collect())
    }

    /// Match any of the kinds.
    pub fn kinds(kinds: impl IntoIterator<Item = TypeKind>) -> Self {
        Self::Kinds(kinds.into_iter().collect())
    }

    /// Match any of the tags.
    pub fn tags(tags: impl IntoIterator<Item = QName>) -> Self {
        Self::Tags(tags.into_iter().collect())
    }

    /// Match local types of a workspace.
    pub fn workspace(name: QName) -> Self {
        Self::Workspace(name)
    }

    /// Conjunction.
    pub fn and(filters: impl IntoIterator<Item = ResourceFilter>) -> Self {
        Self::And(filters.into_iter().collect())
    }

    /// Disjunction.
    pub fn or(filters: impl IntoIterator<Item = ResourceFilter>) -> Self {
        Self::Or(filters.into_iter().collect())
    }

    /// Negation.
    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: ResourceFilter) -> Self {
        Self::Not(Box::new(filter))
    }

    /// Returns true if the filter selects `t`.
    pub fn matches(&self, t: &TypeDef) -> bool {
        match self {
            ResourceFilter::Names(names) => names.contains(t.name()),
            ResourceFilter::Kinds(kinds) => kinds.contains(&t.kind()),
            ResourceFilter::Tags(tags) => t.tags().any(|tag| tags.contains(tag)),
            ResourceFilter::Workspace(ws) => {
                t.workspace() == ws && t.kind() != TypeKind::Workspace
            }
            ResourceFilter::And(filters) => filters.iter().all(|f| f.matches(t)),
            ResourceFilter::Or(filters) => filters.iter().any(|f| f.matches(t)),
            ResourceFilter::Not(filter) => !filter.matches(t),
        }
    }

    /// Lazily select the matching types.
    pub fn matching<'a, I>(&'a self, types: I) -> impl Iterator<Item = &'a TypeDef> + 'a
    where
        I: IntoIterator<Item = &'a TypeDef>,
        I::IntoIter: 'a,
    {
        types.into_iter().filter(move |t| self.matches(t))
    }
}

fn join<T: fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for ResourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceFilter::Names(names) => write!(f, "QNAMES({})", join(names)),
            ResourceFilter::Kinds(kinds) => write!(f, "TYPES({})", join(kinds)),
            ResourceFilter::Tags(tags) => write!(f, "TAGS({})", join(tags)),
            ResourceFilter::Workspace(ws) => write!(f, "WORKSPACE({ws})"),
            ResourceFilter::And(filters) => write!(f, "AND({})", join(filters)),
            ResourceFilter::Or(filters) => write!(f, "OR({})", join(filters)),
            ResourceFilter::Not(filter) => write!(f, "NOT({filter})"),
        }
    }
}

impl From<QName> for ResourceFilter {
    fn from(name: QName) -> Self {
        Self::name(name)
    }
}

impl From<TypeKind> for ResourceFilter {
    fn from(kind: TypeKind) -> Self {
        Self::Kinds(BTreeSet::from([kind]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::structure::Structure;
    use crate::catalog::typedef::TypeBody;

    fn doc(name: &str, ws: &str) -> TypeDef {
        TypeDef::new(
            QName::new("test", name),
            TypeKind::CDoc,
            QName::new("test", ws),
            TypeBody::Structure(Structure::new(TypeKind::CDoc)),
        )
    }

    #[test]
    fn test_basic_filters() {
        let mut d = doc("doc", "ws");
        d.add_tag(QName::new("test", "tag"));

        assert!(ResourceFilter::name(QName::new("test", "doc")).matches(&d));
        assert!(!ResourceFilter::name(QName::new("test", "other")).matches(&d));
        assert!(ResourceFilter::kinds([TypeKind::CDoc, TypeKind::WDoc]).matches(&d));
        assert!(!ResourceFilter::from(TypeKind::GDoc).matches(&d));
        assert!(ResourceFilter::tags([QName::new("test", "tag")]).matches(&d));
        assert!(ResourceFilter::workspace(QName::new("test", "ws")).matches(&d));
        assert!(!ResourceFilter::workspace(QName::new("test", "other")).matches(&d));
    }

    #[test]
    fn test_composite_filters() {
        let d = doc("doc", "ws");
        let is_doc = ResourceFilter::from(TypeKind::CDoc);
        let named = ResourceFilter::from(QName::new("test", "other"));

        assert!(!ResourceFilter::and([is_doc.clone(), named.clone()]).matches(&d));
        assert!(ResourceFilter::or([is_doc.clone(), named.clone()]).matches(&d));
        assert!(ResourceFilter::not(named.clone()).matches(&d));
        assert!(!ResourceFilter::not(is_doc.clone()).matches(&d));
    }

    #[test]
    fn test_matching_and_display() {
        let types = vec![doc("a", "ws"), doc("b", "ws")];
        let filter = ResourceFilter::names([QName::new("test", "b"), QName::new("test", "a")]);
        assert_eq!(filter.matching(&types).count(), 2);
        assert_eq!(filter.to_string(), "QNAMES(test.a, test.b)");
        assert_eq!(
            ResourceFilter::not(TypeKind::CDoc.into()).to_string(),
            "NOT(TYPES(CDoc))"
        );
    }
}
