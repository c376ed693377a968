//! Structures: documents, records, objects and elements.
//!
//! A structure owns a field list, a list of containers (named, bounded slots
//! for nested structures) and a list of uniques. Container targets are kept
//! as names; the frozen catalog caches their resolution.

use super::field::FieldList;
use super::types::TypeKind;
use crate::config::CatalogConfig;
use crate::error::{DefinitionError, DefinitionResult};
use crate::qname::{validate_ident, QName};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Occurrence bound of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Occurs(u16);

impl Occurs {
    /// No upper limit.
    pub const UNBOUNDED: Occurs = Occurs(u16::MAX);

    /// Create a bound.
    pub const fn new(value: u16) -> Self {
        Occurs(value)
    }

    /// Numeric value; `u16::MAX` for [`Occurs::UNBOUNDED`].
    pub fn value(self) -> u16 {
        self.0
    }

    /// Returns true for [`Occurs::UNBOUNDED`].
    pub fn is_unbounded(self) -> bool {
        self == Self::UNBOUNDED
    }
}

impl From<u16> for Occurs {
    fn from(value: u16) -> Self {
        Occurs(value)
    }
}

impl fmt::Display for Occurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            f.write_str("unbounded")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Serialize for Occurs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_unbounded() {
            serializer.serialize_str("unbounded")
        } else {
            serializer.serialize_u16(self.0)
        }
    }
}

/// A named slot for nested structures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Container {
    name: String,
    target: QName,
    min_occurs: Occurs,
    max_occurs: Occurs,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(skip)]
    pub(crate) resolved: Option<usize>,
}

impl Container {
    /// Create a container, checking the occurrence bounds.
    pub fn new(
        name: impl Into<String>,
        target: QName,
        min_occurs: Occurs,
        max_occurs: Occurs,
    ) -> DefinitionResult<Self> {
        let name = name.into();
        if max_occurs.value() == 0 {
            return Err(DefinitionError::OutOfBounds(format!(
                "max occurs of container «{name}», must be positive"
            )));
        }
        if min_occurs > max_occurs {
            return Err(DefinitionError::OutOfBounds(format!(
                "min occurs {min_occurs} of container «{name}», must not exceed max occurs {max_occurs}"
            )));
        }
        Ok(Self {
            name,
            target,
            min_occurs,
            max_occurs,
            comment: None,
            resolved: None,
        })
    }

    /// Container name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the contained type.
    pub fn target(&self) -> &QName {
        &self.target
    }

    /// Minimum occurrences.
    pub fn min_occurs(&self) -> Occurs {
        self.min_occurs
    }

    /// Maximum occurrences.
    pub fn max_occurs(&self) -> Occurs {
        self.max_occurs
    }

    /// Comment.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub(crate) fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
    }
}

/// A set of fields whose combined value is unique among records of the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unique {
    name: QName,
    fields: Vec<String>,
}

impl Unique {
    /// Unique name. Shares the name space with types.
    pub fn name(&self) -> &QName {
        &self.name
    }

    /// Field names in declaration order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// Body of a structure type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Structure {
    fields: FieldList,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    containers: Vec<Container>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    uniques: Vec<Unique>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    singleton: bool,
}

impl Structure {
    /// Create an empty structure of `kind` holding its system fields.
    pub(crate) fn new(kind: TypeKind) -> Self {
        Self {
            fields: FieldList::for_kind(kind),
            containers: Vec::new(),
            uniques: Vec::new(),
            singleton: false,
        }
    }

    /// Fields, system fields first.
    pub fn fields(&self) -> &FieldList {
        &self.fields
    }

    /// Containers in declaration order.
    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    /// Find a container by name.
    pub fn container(&self, name: &str) -> Option<&Container> {
        self.containers.iter().find(|c| c.name == name)
    }

    /// Uniques in declaration order.
    pub fn uniques(&self) -> &[Unique] {
        &self.uniques
    }

    /// Find a unique by name.
    pub fn unique(&self, name: &QName) -> Option<&Unique> {
        self.uniques.iter().find(|u| &u.name == name)
    }

    /// Returns true if at most one instance may exist per workspace.
    pub fn is_singleton(&self) -> bool {
        self.singleton
    }

    pub(crate) fn fields_mut(&mut self) -> &mut FieldList {
        &mut self.fields
    }

    pub(crate) fn containers_mut(&mut self) -> std::slice::IterMut<'_, Container> {
        self.containers.iter_mut()
    }

    pub(crate) fn container_mut(&mut self, name: &str) -> Option<&mut Container> {
        self.containers.iter_mut().find(|c| c.name == name)
    }

    /// Append a container to a structure of `owner` kind.
    ///
    /// `child` is the kind of the target if it is already registered; unknown
    /// targets are left for validation.
    pub(crate) fn add_container(
        &mut self,
        container: Container,
        owner: TypeKind,
        child: Option<TypeKind>,
        config: &CatalogConfig,
    ) -> DefinitionResult<()> {
        validate_ident(&container.name, config.max_ident_len)?;
        if self.container(&container.name).is_some() {
            return Err(DefinitionError::AlreadyExists(format!(
                "container «{}»",
                container.name
            )));
        }
        if self.fields.contains(&container.name) {
            return Err(DefinitionError::AlreadyExists(format!(
                "field «{}», container can not use the same name",
                container.name
            )));
        }
        if self.containers.len() >= config.max_containers_per_type {
            return Err(DefinitionError::TooMany(format!(
                "containers, at most {} allowed",
                config.max_containers_per_type
            )));
        }
        if let Some(child) = child {
            if !owner.container_kind_available(child) {
                return Err(DefinitionError::Incompatible(format!(
                    "container «{}»: {owner} can not contain {child} «{}»",
                    container.name, container.target
                )));
            }
        }
        self.containers.push(container);
        Ok(())
    }

    /// Append a unique over existing fields.
    pub(crate) fn add_unique(
        &mut self,
        name: QName,
        fields: Vec<String>,
        config: &CatalogConfig,
    ) -> DefinitionResult<()> {
        if fields.is_empty() {
            return Err(DefinitionError::Missing(format!("fields of unique «{name}»")));
        }
        if fields.len() > config.max_fields_per_unique {
            return Err(DefinitionError::TooMany(format!(
                "fields in unique «{name}», at most {} allowed",
                config.max_fields_per_unique
            )));
        }
        if self.uniques.len() >= config.max_uniques_per_type {
            return Err(DefinitionError::TooMany(format!(
                "uniques, at most {} allowed",
                config.max_uniques_per_type
            )));
        }
        let set: BTreeSet<&str> = fields.iter().map(String::as_str).collect();
        if set.len() != fields.len() {
            return Err(DefinitionError::AlreadyExists(format!(
                "duplicated field in unique «{name}»"
            )));
        }
        if let Some(missing) = fields.iter().find(|f| !self.fields.contains(f)) {
            return Err(DefinitionError::NotFound(format!(
                "field «{missing}» of unique «{name}»"
            )));
        }
        for other in &self.uniques {
            let other_set: BTreeSet<&str> = other.fields.iter().map(String::as_str).collect();
            if set.is_subset(&other_set) || other_set.is_subset(&set) {
                return Err(DefinitionError::AlreadyExists(format!(
                    "unique «{}» overlapping fields of unique «{name}»",
                    other.name
                )));
            }
        }
        self.uniques.push(Unique { name, fields });
        Ok(())
    }

    pub(crate) fn set_singleton(&mut self) {
        self.singleton = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::field::FieldDef;
    use crate::catalog::types::DataKind;
    use crate::error::ErrorKind;

    fn doc_with_fields(names: &[&str]) -> Structure {
        let config = CatalogConfig::default();
        let mut s = Structure::new(TypeKind::CDoc);
        for name in names {
            s.fields_mut()
                .push(FieldDef::new(*name, DataKind::Int32, false), TypeKind::CDoc, &config)
                .unwrap();
        }
        s
    }

    #[test]
    fn test_occurs() {
        assert!(Occurs::UNBOUNDED.is_unbounded());
        assert_eq!(Occurs::UNBOUNDED.to_string(), "unbounded");
        assert_eq!(Occurs::from(3).to_string(), "3");
        assert!(Occurs::new(1) < Occurs::UNBOUNDED);
        assert_eq!(serde_json::to_string(&Occurs::UNBOUNDED).unwrap(), "\"unbounded\"");
        assert_eq!(serde_json::to_string(&Occurs::new(2)).unwrap(), "2");
    }

    #[test]
    fn test_container_bounds() {
        let target = QName::new("test", "rec");
        assert!(Container::new("rec", target.clone(), Occurs::new(0), Occurs::UNBOUNDED).is_ok());
        assert!(Container::new("rec", target.clone(), Occurs::new(1), Occurs::new(1)).is_ok());

        let err = Container::new("rec", target.clone(), Occurs::new(0), Occurs::new(0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
        let err = Container::new("rec", target, Occurs::new(2), Occurs::new(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
    }

    #[test]
    fn test_add_container() {
        let config = CatalogConfig::default();
        let mut s = doc_with_fields(&["f1"]);
        let rec = QName::new("test", "rec");

        let c = Container::new("rec", rec.clone(), Occurs::new(0), Occurs::UNBOUNDED).unwrap();
        s.add_container(c, TypeKind::CDoc, Some(TypeKind::CRecord), &config)
            .unwrap();
        assert_eq!(s.containers().len(), 1);
        assert_eq!(s.container("rec").unwrap().target(), &rec);

        let dup = Container::new("rec", rec.clone(), Occurs::new(0), Occurs::new(1)).unwrap();
        let err = s.add_container(dup, TypeKind::CDoc, None, &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        let clash = Container::new("f1", rec.clone(), Occurs::new(0), Occurs::new(1)).unwrap();
        let err = s.add_container(clash, TypeKind::CDoc, None, &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        let obj = Container::new("obj", QName::new("test", "obj"), Occurs::new(0), Occurs::new(1))
            .unwrap();
        let err = s
            .add_container(obj, TypeKind::CDoc, Some(TypeKind::Object), &config)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Incompatible);
    }

    #[test]
    fn test_add_unique() {
        let config = CatalogConfig::default();
        let mut s = doc_with_fields(&["a", "b", "c"]);

        s.add_unique(QName::new("test", "uniqA"), vec!["a".into()], &config)
            .unwrap();
        s.add_unique(QName::new("test", "uniqBC"), vec!["b".into(), "c".into()], &config)
            .unwrap();
        assert_eq!(s.uniques().len(), 2);
        assert!(s.unique(&QName::new("test", "uniqA")).is_some());

        // superset of an existing unique
        let err = s
            .add_unique(QName::new("test", "uniqAB"), vec!["a".into(), "b".into()], &config)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        // subset of an existing unique
        let err = s
            .add_unique(QName::new("test", "uniqC"), vec!["c".into()], &config)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        let err = s
            .add_unique(QName::new("test", "uniqX"), vec!["x".into()], &config)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = s
            .add_unique(QName::new("test", "uniqE"), vec![], &config)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Missing);
    }
}
