//! Views: key-value projections of events and records.

use super::field::{FieldDef, FieldList};
use super::types::{DataKind, TypeKind};
use crate::config::CatalogConfig;
use crate::error::{DefinitionError, DefinitionResult};
use serde::Serialize;

/// Part of a view a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViewPart {
    /// Partition key.
    Partition,
    /// Clustering columns.
    Clustering,
    /// Value.
    Value,
}

/// Body of a `ViewRecord` type.
///
/// All parts share one field list, so field names are unique across parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    fields: FieldList,
    partition: Vec<String>,
    clustering: Vec<String>,
    value: Vec<String>,
}

impl View {
    pub(crate) fn new() -> Self {
        Self {
            fields: FieldList::for_kind(TypeKind::ViewRecord),
            partition: Vec::new(),
            clustering: Vec::new(),
            value: Vec::new(),
        }
    }

    /// All fields, system fields first.
    pub fn fields(&self) -> &FieldList {
        &self.fields
    }

    /// Partition key field names.
    pub fn partition_key(&self) -> &[String] {
        &self.partition
    }

    /// Clustering column names.
    pub fn clustering_columns(&self) -> &[String] {
        &self.clustering
    }

    /// Value field names.
    pub fn value_fields(&self) -> &[String] {
        &self.value
    }

    /// Part a field belongs to; `None` for system and unknown fields.
    pub fn part_of(&self, name: &str) -> Option<ViewPart> {
        let has = |names: &[String]| names.iter().any(|n| n == name);
        if has(&self.partition) {
            Some(ViewPart::Partition)
        } else if has(&self.clustering) {
            Some(ViewPart::Clustering)
        } else if has(&self.value) {
            Some(ViewPart::Value)
        } else {
            None
        }
    }

    /// Add a field to `part`.
    pub(crate) fn add_field(
        &mut self,
        part: ViewPart,
        field: FieldDef,
        config: &CatalogConfig,
    ) -> DefinitionResult<()> {
        match part {
            ViewPart::Partition if !field.is_fixed_width() => {
                return Err(DefinitionError::Incompatible(format!(
                    "partition key field «{}» of variable width kind {}",
                    field.name(),
                    field.data_kind()
                )));
            }
            ViewPart::Partition | ViewPart::Clustering
                if matches!(field.data_kind(), DataKind::Record | DataKind::Event) =>
            {
                return Err(DefinitionError::Incompatible(format!(
                    "key field «{}» of kind {}",
                    field.name(),
                    field.data_kind()
                )));
            }
            _ => {}
        }

        let name = field.name().to_string();
        self.fields.push(field, TypeKind::ViewRecord, config)?;
        match part {
            ViewPart::Partition => self.partition.push(name),
            ViewPart::Clustering => self.clustering.push(name),
            ViewPart::Value => self.value.push(name),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_view_parts() {
        let config = CatalogConfig::default();
        let mut view = View::new();
        view.add_field(ViewPart::Partition, FieldDef::new("pk", DataKind::Int64, true), &config)
            .unwrap();
        view.add_field(ViewPart::Clustering, FieldDef::new("cc", DataKind::String, true), &config)
            .unwrap();
        view.add_field(ViewPart::Value, FieldDef::new("val", DataKind::Event, false), &config)
            .unwrap();

        assert_eq!(view.partition_key(), &["pk".to_string()]);
        assert_eq!(view.part_of("cc"), Some(ViewPart::Clustering));
        assert_eq!(view.part_of("val"), Some(ViewPart::Value));
        assert_eq!(view.part_of("sys.QName"), None);
        assert_eq!(view.fields().len(), 4);
    }

    #[test]
    fn test_view_key_restrictions() {
        let config = CatalogConfig::default();
        let mut view = View::new();

        let err = view
            .add_field(ViewPart::Partition, FieldDef::new("pk", DataKind::String, true), &config)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Incompatible);

        let err = view
            .add_field(ViewPart::Clustering, FieldDef::new("cc", DataKind::Record, true), &config)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Incompatible);

        view.add_field(ViewPart::Partition, FieldDef::new("pk", DataKind::Int32, true), &config)
            .unwrap();
        let err = view
            .add_field(ViewPart::Value, FieldDef::new("pk", DataKind::Int32, true), &config)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert!(view.value_fields().is_empty());
    }
}
