//! View builder.

use super::{impl_type_builder, or_abort};
use crate::catalog::registry::Registry;
use crate::catalog::{DataKind, FieldDef, TypeBody, ViewPart};
use crate::error::{DefinitionError, DefinitionResult};
use crate::qname::QName;

/// Builder of a view.
///
/// Partition key fields must be fixed width; only value fields may hold
/// `Record` or `Event` data.
#[derive(Debug)]
pub struct ViewBuilder<'a> {
    registry: &'a mut Registry,
    name: QName,
}

impl_type_builder!(ViewBuilder);

impl<'a> ViewBuilder<'a> {
    pub(crate) fn new(registry: &'a mut Registry, name: QName) -> Self {
        Self { registry, name }
    }

    fn add(&mut self, part: ViewPart, field: FieldDef) -> DefinitionResult<()> {
        let config = self.registry.config;
        let def = self.registry.type_mut(&self.name)?;
        match def.body_mut() {
            TypeBody::View(view) => view.add_field(part, field, &config),
            _ => Err(DefinitionError::Incompatible(format!(
                "«{}», view expected",
                self.name
            ))),
        }
    }

    /// Add a partition key field.
    ///
    /// # Panics
    ///
    /// Panics if the field name is taken or the kind is variable width.
    pub fn add_partition_field(&mut self, name: &str, kind: DataKind) -> &mut Self {
        or_abort(self.add(ViewPart::Partition, FieldDef::new(name, kind, true)));
        self
    }

    /// Add a clustering column.
    pub fn add_clustering_field(&mut self, name: &str, kind: DataKind) -> &mut Self {
        or_abort(self.add(ViewPart::Clustering, FieldDef::new(name, kind, false)));
        self
    }

    /// Add a value field.
    pub fn add_value_field(&mut self, name: &str, kind: DataKind, required: bool) -> &mut Self {
        or_abort(self.add(ViewPart::Value, FieldDef::new(name, kind, required)));
        self
    }

    /// Add a reference value field.
    pub fn add_value_ref_field(&mut self, name: &str, required: bool, refs: &[QName]) -> &mut Self {
        let field = FieldDef::reference(name, required, refs.iter().cloned());
        or_abort(self.add(ViewPart::Value, field));
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::CatalogBuilder;
    use crate::catalog::{DataKind, ViewPart};
    use crate::qname::QName;

    fn q(s: &str) -> QName {
        QName::new("test", s)
    }

    #[test]
    fn test_view_parts() {
        let mut builder = CatalogBuilder::new();
        builder
            .add_workspace(q("ws"))
            .add_view(q("view"))
            .add_partition_field("pk", DataKind::Int64)
            .add_clustering_field("cc", DataKind::String)
            .add_value_field("event", DataKind::Event, false)
            .add_value_ref_field("owner", false, &[])
            .set_comment("projection");

        let def = builder.type_def(&q("view"));
        let view = def.as_view().unwrap();
        assert_eq!(view.partition_key(), &["pk".to_string()]);
        assert_eq!(view.part_of("event"), Some(ViewPart::Value));
        assert_eq!(def.field_count(), 5);
        assert_eq!(def.comment(), Some("projection"));
    }

    #[test]
    #[should_panic(expected = "partition key field «pk»")]
    fn test_variable_width_partition_aborts() {
        let mut builder = CatalogBuilder::new();
        builder
            .add_workspace(q("ws"))
            .add_view(q("view"))
            .add_partition_field("pk", DataKind::String);
    }
}
