//! Field definitions for structures and views.

use super::constraint::Constraint;
use super::types::{DataKind, SystemField, TypeKind};
use crate::config::CatalogConfig;
use crate::error::{DefinitionError, DefinitionResult};
use crate::qname::{validate_ident, QName};
use serde::Serialize;
use std::collections::BTreeSet;

/// Prefix shared by all system field names.
pub const SYS_FIELD_PREFIX: &str = "sys.";
/// Type name of the instance.
pub const SYS_FIELD_QNAME: &str = "sys.QName";
/// Record identity.
pub const SYS_FIELD_ID: &str = "sys.ID";
/// Parent record identity.
pub const SYS_FIELD_PARENT_ID: &str = "sys.ParentID";
/// Container name within the parent.
pub const SYS_FIELD_CONTAINER: &str = "sys.Container";
/// Activation flag.
pub const SYS_FIELD_IS_ACTIVE: &str = "sys.IsActive";

/// How a field value may be verified by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum VerificationKind {
    /// Verified by a code sent to an e-mail address.
    EMail,
    /// Verified by a code sent to a phone number.
    Phone,
}

/// A field definition within a structure or view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDef {
    name: String,
    data: QName,
    data_kind: DataKind,
    required: bool,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    verify: BTreeSet<VerificationKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    constraints: Vec<Constraint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refs: Option<BTreeSet<QName>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

impl FieldDef {
    /// Create a field backed by the system data type of `data_kind`.
    pub fn new(name: impl Into<String>, data_kind: DataKind, required: bool) -> Self {
        Self::with_data(name, data_kind.sys_data_name(), data_kind, required)
    }

    /// Create a field backed by a named data type.
    pub fn with_data(
        name: impl Into<String>,
        data: QName,
        data_kind: DataKind,
        required: bool,
    ) -> Self {
        Self {
            name: name.into(),
            data,
            data_kind,
            required,
            verify: BTreeSet::new(),
            constraints: Vec::new(),
            refs: None,
            comment: None,
        }
    }

    /// Create a reference field. An empty target set allows any record.
    pub fn reference(
        name: impl Into<String>,
        required: bool,
        targets: impl IntoIterator<Item = QName>,
    ) -> Self {
        let mut field = Self::new(name, DataKind::RecordID, required);
        field.refs = Some(targets.into_iter().collect());
        field
    }

    pub(crate) fn system(field: &SystemField) -> Self {
        Self::new(field.name, field.kind, field.required)
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the data type.
    pub fn data(&self) -> &QName {
        &self.data
    }

    /// Kind of the stored value.
    pub fn data_kind(&self) -> DataKind {
        self.data_kind
    }

    /// Required flag.
    pub fn required(&self) -> bool {
        self.required
    }

    /// Returns true for system fields.
    pub fn is_sys(&self) -> bool {
        self.name.starts_with(SYS_FIELD_PREFIX)
    }

    /// Returns true if values have a fixed storage width.
    pub fn is_fixed_width(&self) -> bool {
        self.data_kind.is_fixed_width()
    }

    /// Returns true for reference fields.
    pub fn is_ref(&self) -> bool {
        self.refs.is_some()
    }

    /// Allowed reference targets. Empty for non-reference fields and for "any".
    pub fn ref_targets(&self) -> impl Iterator<Item = &QName> {
        self.refs.iter().flatten()
    }

    /// Returns true if this reference field may point at a record of type `target`.
    pub fn may_refer_to(&self, target: &QName) -> bool {
        match &self.refs {
            Some(targets) => targets.is_empty() || targets.contains(target),
            None => false,
        }
    }

    /// Returns true if the value may be verified.
    pub fn verifiable(&self) -> bool {
        !self.verify.is_empty()
    }

    /// Returns true if the value may be verified by `kind`.
    pub fn verified_by(&self, kind: VerificationKind) -> bool {
        self.verify.contains(&kind)
    }

    /// Value constraints.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Comment.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub(crate) fn set_constraints(&mut self, constraints: Vec<Constraint>) -> DefinitionResult<()> {
        for c in &constraints {
            c.check(self.data_kind)
                .map_err(|err| DefinitionError::Invalid(format!("field «{}»: {err}", self.name)))?;
        }
        self.constraints = constraints;
        Ok(())
    }

    pub(crate) fn set_verify(&mut self, kinds: impl IntoIterator<Item = VerificationKind>) {
        self.verify = kinds.into_iter().collect();
    }

    pub(crate) fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
    }
}

/// Ordered, name-unique list of fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldList {
    fields: Vec<FieldDef>,
}

impl FieldList {
    /// Create a list holding the system fields of `kind`.
    pub(crate) fn for_kind(kind: TypeKind) -> Self {
        Self {
            fields: kind.system_fields().iter().map(FieldDef::system).collect(),
        }
    }

    /// Find a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns true if a field with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of fields, system fields included.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the list has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldDef> {
        self.fields.iter()
    }

    /// Iterate field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Iterate non-system fields.
    pub fn user_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| !f.is_sys())
    }

    /// Iterate reference fields.
    pub fn ref_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.is_ref())
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut FieldDef> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    /// Append a user field to a type of `owner` kind.
    pub(crate) fn push(
        &mut self,
        field: FieldDef,
        owner: TypeKind,
        config: &CatalogConfig,
    ) -> DefinitionResult<()> {
        validate_ident(&field.name, config.max_ident_len)?;
        if self.contains(&field.name) {
            return Err(DefinitionError::AlreadyExists(format!("field «{}»", field.name)));
        }
        if self.fields.len() >= config.max_fields_per_type {
            return Err(DefinitionError::TooMany(format!(
                "fields, at most {} allowed",
                config.max_fields_per_type
            )));
        }
        if !owner.field_kind_available(field.data_kind) {
            return Err(DefinitionError::Incompatible(format!(
                "field «{}» data kind {} and type kind {owner}",
                field.name, field.data_kind
            )));
        }
        self.fields.push(field);
        Ok(())
    }
}

impl<'a> IntoIterator for &'a FieldList {
    type Item = &'a FieldDef;
    type IntoIter = std::slice::Iter<'a, FieldDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_field_def() {
        let field = FieldDef::new("name", DataKind::String, true);
        assert_eq!(field.name(), "name");
        assert_eq!(field.data(), &QName::sys("string"));
        assert!(field.required());
        assert!(!field.is_sys());
        assert!(!field.is_ref());
        assert!(!field.is_fixed_width());
    }

    #[test]
    fn test_reference_field() {
        let doc = QName::new("test", "doc");
        let any = FieldDef::reference("anyRef", false, []);
        assert!(any.is_ref());
        assert!(any.may_refer_to(&doc));

        let narrow = FieldDef::reference("docRef", true, [doc.clone()]);
        assert!(narrow.may_refer_to(&doc));
        assert!(!narrow.may_refer_to(&QName::new("test", "rec")));
        assert_eq!(narrow.ref_targets().count(), 1);

        let plain = FieldDef::new("id", DataKind::RecordID, false);
        assert!(!plain.may_refer_to(&doc));
    }

    #[test]
    fn test_field_list_push() {
        let config = CatalogConfig::default();
        let mut list = FieldList::for_kind(TypeKind::CDoc);
        assert_eq!(
            list.names().collect::<Vec<_>>(),
            vec![SYS_FIELD_QNAME, SYS_FIELD_ID, SYS_FIELD_IS_ACTIVE]
        );

        list.push(FieldDef::new("f1", DataKind::Int64, true), TypeKind::CDoc, &config)
            .unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(list.user_fields().count(), 1);

        let err = list
            .push(FieldDef::new("f1", DataKind::String, false), TypeKind::CDoc, &config)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        let err = list
            .push(FieldDef::new("bad name", DataKind::String, false), TypeKind::CDoc, &config)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidName);

        let err = list
            .push(FieldDef::new("rec", DataKind::Record, false), TypeKind::CDoc, &config)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Incompatible);
    }

    #[test]
    fn test_field_list_limit() {
        let config = CatalogConfig::default().with_max_fields_per_type(2);
        let mut list = FieldList::for_kind(TypeKind::Object);
        list.push(FieldDef::new("a", DataKind::Int32, false), TypeKind::Object, &config)
            .unwrap();
        let err = list
            .push(FieldDef::new("b", DataKind::Int32, false), TypeKind::Object, &config)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooMany);
    }

    #[test]
    fn test_field_constraints() {
        let mut field = FieldDef::new("code", DataKind::String, false);
        field.set_constraints(vec![Constraint::MaxLen(4)]).unwrap();
        assert_eq!(field.constraints(), &[Constraint::MaxLen(4)]);

        let err = field.set_constraints(vec![Constraint::MinIncl(0.0)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
        assert!(err.to_string().contains("code"));
    }
}
