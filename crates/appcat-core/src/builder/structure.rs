//! Builder of documents, records, objects and elements.

use super::{find_visible_kind, impl_type_builder, non_empty, or_abort};
use crate::catalog::registry::Registry;
use crate::catalog::{
    Constraint, Container, DataKind, DataType, FieldDef, Occurs, Structure, TypeBody, TypeKind,
    VerificationKind,
};
use crate::error::{DefinitionError, DefinitionResult};
use crate::qname::{validate_qname, QName};

/// Builder of a structured type.
#[derive(Debug)]
pub struct StructureBuilder<'a> {
    registry: &'a mut Registry,
    name: QName,
}

impl_type_builder!(StructureBuilder);

impl<'a> StructureBuilder<'a> {
    pub(crate) fn new(registry: &'a mut Registry, name: QName) -> Self {
        Self { registry, name }
    }

    fn structure_mut(&mut self) -> DefinitionResult<(TypeKind, &mut Structure)> {
        let def = self.registry.type_mut(&self.name)?;
        let kind = def.kind();
        match def.body_mut() {
            TypeBody::Structure(s) => Ok((kind, s)),
            _ => Err(DefinitionError::Incompatible(format!(
                "{kind} «{}», structure expected",
                self.name
            ))),
        }
    }

    fn push_field(&mut self, field: FieldDef) -> DefinitionResult<()> {
        let config = self.registry.config;
        let (kind, s) = self.structure_mut()?;
        s.fields_mut().push(field, kind, &config)
    }

    fn field_mut(&mut self, field: &str) -> DefinitionResult<&mut FieldDef> {
        let (_, s) = self.structure_mut()?;
        s.fields_mut()
            .get_mut(field)
            .ok_or_else(|| DefinitionError::NotFound(format!("field «{field}»")))
    }

    /// Add a field of a system data kind.
    ///
    /// # Panics
    ///
    /// Panics if the name is invalid or taken, the field limit is reached,
    /// or the kind is not allowed in this structure.
    pub fn add_field(&mut self, name: &str, kind: DataKind, required: bool) -> &mut Self {
        or_abort(self.push_field(FieldDef::new(name, kind, required)));
        self
    }

    /// Add a field of a named data type.
    ///
    /// The field inherits the effective constraints of the data type.
    ///
    /// # Panics
    ///
    /// Panics if `data` is not a data type visible from the workspace, or
    /// for the reasons listed on [`add_field`](Self::add_field).
    pub fn add_data_field(&mut self, name: &str, data: QName, required: bool) -> &mut Self {
        or_abort(self.try_add_data_field(name, data, required));
        self
    }

    fn try_add_data_field(&mut self, name: &str, data: QName, required: bool) -> DefinitionResult<()> {
        let ws = self.registry.type_def(&self.name).workspace().clone();
        let data_def = find_visible_kind(self.registry, &ws, &data, "data type", |k| {
            k == TypeKind::Data
        })?;
        let kind = data_def.as_data().map(DataType::kind).unwrap_or(DataKind::Null);
        let constraints = self.registry.data_constraints(&data);

        let mut field = FieldDef::with_data(name, data, kind, required);
        field.set_constraints(constraints)?;
        self.push_field(field)
    }

    /// Add a reference field. An empty `refs` list allows any record.
    ///
    /// Targets are checked by validation.
    pub fn add_ref_field(&mut self, name: &str, required: bool, refs: &[QName]) -> &mut Self {
        or_abort(self.push_field(FieldDef::reference(name, required, refs.iter().cloned())));
        self
    }

    /// Replace the constraints of a field.
    ///
    /// # Panics
    ///
    /// Panics if the field is unknown or a constraint does not apply to its kind.
    pub fn set_field_constraints(&mut self, field: &str, constraints: Vec<Constraint>) -> &mut Self {
        or_abort(
            self.field_mut(field)
                .and_then(|f| f.set_constraints(constraints)),
        );
        self
    }

    /// Mark a field as verified by the given kinds.
    ///
    /// # Panics
    ///
    /// Panics if the field is unknown or is not a string field.
    pub fn set_field_verify(&mut self, field: &str, kinds: &[VerificationKind]) -> &mut Self {
        let f = or_abort(self.field_mut(field));
        if f.data_kind() != DataKind::String {
            or_abort::<()>(Err(DefinitionError::Incompatible(format!(
                "verification of field «{field}» of kind {}",
                f.data_kind()
            ))));
        }
        f.set_verify(kinds.iter().copied());
        self
    }

    /// Set or clear a field comment.
    pub fn set_field_comment(&mut self, field: &str, comment: &str) -> &mut Self {
        or_abort(self.field_mut(field)).set_comment(non_empty(comment));
        self
    }

    /// Add a container of `target` records, objects or elements.
    ///
    /// # Panics
    ///
    /// Panics if the name is invalid or taken, the occurrence bounds are
    /// wrong, or `target` is already known and can not be nested here.
    pub fn add_container(&mut self, name: &str, target: QName, min: Occurs, max: Occurs) -> &mut Self {
        or_abort(self.try_add_container(name, target, min, max));
        self
    }

    fn try_add_container(
        &mut self,
        name: &str,
        target: QName,
        min: Occurs,
        max: Occurs,
    ) -> DefinitionResult<()> {
        let config = self.registry.config;
        let child = self.registry.get(&target).map(|t| t.kind());
        let container = Container::new(name, target, min, max)?;
        let (kind, s) = self.structure_mut()?;
        s.add_container(container, kind, child, &config)
    }

    /// Set or clear a container comment.
    pub fn set_container_comment(&mut self, container: &str, comment: &str) -> &mut Self {
        let result = self.structure_mut().and_then(|(_, s)| {
            s.container_mut(container)
                .ok_or_else(|| DefinitionError::NotFound(format!("container «{container}»")))
        });
        or_abort(result).set_comment(non_empty(comment));
        self
    }

    /// Add a unique over `fields`.
    ///
    /// The unique name shares the catalog name space with types.
    ///
    /// # Panics
    ///
    /// Panics if the name is taken, a field is unknown, the field list is
    /// empty or overlaps another unique of this type.
    pub fn add_unique(&mut self, name: QName, fields: &[&str]) -> &mut Self {
        or_abort(self.try_add_unique(name, fields));
        self
    }

    fn try_add_unique(&mut self, name: QName, fields: &[&str]) -> DefinitionResult<()> {
        if self.registry.is_bound(&name) {
            return Err(DefinitionError::AlreadyExists(format!("name «{name}»")));
        }
        let config = self.registry.config;
        validate_qname(&name, config.max_ident_len)?;
        let owner = self.name.clone();
        let (_, s) = self.structure_mut()?;
        s.add_unique(
            name.clone(),
            fields.iter().map(|f| f.to_string()).collect(),
            &config,
        )?;
        self.registry.bind_unique(&name, &owner)
    }

    /// Mark the document a singleton.
    ///
    /// # Panics
    ///
    /// Panics unless the type is a CDoc or WDoc.
    pub fn set_singleton(&mut self) -> &mut Self {
        let (kind, s) = or_abort(self.structure_mut());
        if !kind.can_be_singleton() {
            or_abort::<()>(Err(DefinitionError::Unsupported(format!(
                "singleton {kind}"
            ))));
        }
        s.set_singleton();
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::CatalogBuilder;
    use crate::catalog::{Constraint, DataKind, Occurs, TypeKind, VerificationKind};
    use crate::error::ErrorKind;
    use crate::qname::QName;

    fn q(s: &str) -> QName {
        QName::new("test", s)
    }

    #[test]
    fn test_fields_and_containers() {
        let mut builder = CatalogBuilder::new();
        let mut ws = builder.add_workspace(q("ws"));
        ws.add_crecord(q("rec")).add_field("r1", DataKind::Bool, false);
        ws.add_cdoc(q("doc"))
            .add_field("f1", DataKind::Int64, true)
            .add_field("f2", DataKind::String, false)
            .add_ref_field("ref", false, &[q("rec")])
            .add_container("rec", q("rec"), Occurs::new(0), Occurs::UNBOUNDED)
            .set_field_comment("f1", "primary counter")
            .set_container_comment("rec", "nested rows")
            .set_comment("configuration");
        drop(ws);

        let doc = builder.type_def(&q("doc"));
        assert_eq!(doc.kind(), TypeKind::CDoc);
        let names: Vec<_> = doc.fields().unwrap().names().collect();
        assert_eq!(
            names,
            ["sys.QName", "sys.ID", "sys.IsActive", "f1", "f2", "ref"]
        );
        assert_eq!(doc.field("f1").unwrap().comment(), Some("primary counter"));
        assert!(doc.field("ref").unwrap().may_refer_to(&q("rec")));
        assert_eq!(doc.container_count(), 1);
        assert_eq!(doc.container("rec").unwrap().comment(), Some("nested rows"));
        assert_eq!(doc.comment(), Some("configuration"));
    }

    #[test]
    #[should_panic(expected = "already exists")]
    fn test_duplicate_field_aborts() {
        let mut builder = CatalogBuilder::new();
        builder
            .add_workspace(q("ws"))
            .add_cdoc(q("doc"))
            .add_field("f1", DataKind::Int64, true)
            .add_field("f1", DataKind::String, false);
    }

    #[test]
    #[should_panic(expected = "can not contain")]
    fn test_container_kind_checked_when_known() {
        let mut builder = CatalogBuilder::new();
        let mut ws = builder.add_workspace(q("ws"));
        ws.add_wrecord(q("rec"));
        ws.add_cdoc(q("doc")).add_container("rec", q("rec"), 0.into(), 1.into());
    }

    #[test]
    fn test_data_field_inherits_constraints() {
        let mut builder = CatalogBuilder::new();
        let mut ws = builder.add_workspace(q("ws"));
        ws.add_data(q("code"), DataKind::String, QName::NULL, vec![Constraint::MaxLen(4)]);
        ws.add_odoc(q("doc"))
            .add_data_field("code", q("code"), true)
            .add_field("email", DataKind::String, false)
            .set_field_verify("email", &[VerificationKind::EMail]);
        drop(ws);

        let doc = builder.type_def(&q("doc"));
        let code = doc.field("code").unwrap();
        assert_eq!(code.data(), &q("code"));
        assert_eq!(code.data_kind(), DataKind::String);
        assert_eq!(code.constraints(), &[Constraint::MaxLen(4)]);
        assert!(doc.field("email").unwrap().verified_by(VerificationKind::EMail));
    }

    #[test]
    #[should_panic(expected = "not found")]
    fn test_data_field_requires_visible_data() {
        let mut builder = CatalogBuilder::new();
        builder.add_workspace(q("other")).add_data(q("code"), DataKind::String, QName::NULL, vec![]);
        builder
            .add_workspace(q("ws"))
            .add_cdoc(q("doc"))
            .add_data_field("code", q("code"), true);
    }

    #[test]
    fn test_uniques_share_name_space() {
        let mut builder = CatalogBuilder::new();
        let mut ws = builder.add_workspace(q("ws"));
        ws.add_cdoc(q("doc"))
            .add_field("a", DataKind::Int32, true)
            .add_field("b", DataKind::Int32, true)
            .add_unique(q("uniqA"), &["a"]);
        drop(ws);

        assert_eq!(builder.type_def(&q("doc")).uniques().len(), 1);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            builder.alter_workspace(q("ws")).add_role(q("uniqA"));
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_unique_name_checked_before_adding() {
        let mut builder = CatalogBuilder::new();
        let mut ws = builder.add_workspace(q("ws"));
        let mut doc = ws.add_cdoc(q("doc"));
        doc.add_field("a", DataKind::Int32, true);
        assert_eq!(
            doc.try_add_unique(QName::new("test", "1uniq"), &["a"]).unwrap_err().kind(),
            ErrorKind::InvalidName
        );
        assert_eq!(
            doc.try_add_unique(QName::NULL, &["a"]).unwrap_err().kind(),
            ErrorKind::Missing
        );
        drop(ws);

        assert!(builder.type_def(&q("doc")).uniques().is_empty());
        assert!(builder.type_def(&QName::new("test", "1uniq")).is_null());
    }

    #[test]
    #[should_panic(expected = "unsupported singleton")]
    fn test_singleton_only_for_cdoc_and_wdoc() {
        let mut builder = CatalogBuilder::new();
        let mut ws = builder.add_workspace(q("ws"));
        ws.add_cdoc(q("settings")).set_singleton();
        ws.add_odoc(q("doc")).set_singleton();
    }
}
