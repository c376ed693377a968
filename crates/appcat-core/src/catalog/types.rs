//! Type and data kinds with their compatibility tables.

use super::field::{
    SYS_FIELD_CONTAINER, SYS_FIELD_ID, SYS_FIELD_IS_ACTIVE, SYS_FIELD_PARENT_ID, SYS_FIELD_QNAME,
};
use crate::qname::QName;
use serde::Serialize;
use std::fmt;

/// Kind of a catalog type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TypeKind {
    /// The absent type.
    Null,
    /// Wildcard type.
    Any,
    /// Data type.
    Data,
    /// Global document.
    GDoc,
    /// Configuration document.
    CDoc,
    /// Workflow document.
    WDoc,
    /// Operation document, used as command argument.
    ODoc,
    /// Global record.
    GRecord,
    /// Configuration record.
    CRecord,
    /// Workflow record.
    WRecord,
    /// Operation record.
    ORecord,
    /// View.
    ViewRecord,
    /// Object, used as function argument or result.
    Object,
    /// Element nested in an object.
    Element,
    /// Query function.
    Query,
    /// Command function.
    Command,
    /// Projector.
    Projector,
    /// Scheduled job.
    Job,
    /// Workspace.
    Workspace,
    /// ACL principal.
    Role,
    /// Rate.
    Rate,
    /// Limit.
    Limit,
    /// Tag.
    Tag,
}

impl TypeKind {
    /// Documents of any flavor.
    pub fn is_doc(self) -> bool {
        matches!(
            self,
            TypeKind::GDoc | TypeKind::CDoc | TypeKind::WDoc | TypeKind::ODoc
        )
    }

    /// Documents and records. These carry `sys.ID` and may be referenced.
    pub fn is_record(self) -> bool {
        self.is_doc()
            || matches!(
                self,
                TypeKind::GRecord | TypeKind::CRecord | TypeKind::WRecord | TypeKind::ORecord
            )
    }

    /// Kinds with fields and containers.
    pub fn is_structure(self) -> bool {
        self.is_record() || matches!(self, TypeKind::Object | TypeKind::Element)
    }

    /// Kinds with fields: structures and views.
    pub fn has_fields(self) -> bool {
        self.is_structure() || self == TypeKind::ViewRecord
    }

    /// Commands and queries.
    pub fn is_function(self) -> bool {
        matches!(self, TypeKind::Command | TypeKind::Query)
    }

    /// Extensions run by an extension engine.
    pub fn is_extension(self) -> bool {
        self.is_function() || matches!(self, TypeKind::Projector | TypeKind::Job)
    }

    /// Kinds carrying the `sys.IsActive` field.
    pub fn is_activable(self) -> bool {
        matches!(
            self,
            TypeKind::GDoc
                | TypeKind::CDoc
                | TypeKind::WDoc
                | TypeKind::GRecord
                | TypeKind::CRecord
                | TypeKind::WRecord
        )
    }

    /// Kinds that may be declared singletons.
    pub fn can_be_singleton(self) -> bool {
        matches!(self, TypeKind::CDoc | TypeKind::WDoc)
    }

    /// Returns true if a structure of this kind may contain a `child`.
    pub fn container_kind_available(self, child: TypeKind) -> bool {
        use TypeKind::*;
        matches!(
            (self, child),
            (GDoc, GRecord)
                | (CDoc, CRecord)
                | (WDoc, WRecord)
                | (ODoc, ODoc)
                | (ODoc, ORecord)
                | (GRecord, GRecord)
                | (CRecord, CRecord)
                | (WRecord, WRecord)
                | (ORecord, ORecord)
                | (Object, Element)
                | (Element, Element)
        )
    }

    /// Returns true if a field of `data` kind may be added to this kind.
    pub fn field_kind_available(self, data: DataKind) -> bool {
        match data {
            DataKind::Null => false,
            DataKind::Record | DataKind::Event => self == TypeKind::ViewRecord,
            _ => self.has_fields(),
        }
    }

    /// System fields created with a type of this kind, in field order.
    pub fn system_fields(self) -> &'static [SystemField] {
        const DOC: &[SystemField] = &[SystemField::QNAME, SystemField::ID, SystemField::IS_ACTIVE];
        const ODOC: &[SystemField] = &[SystemField::QNAME, SystemField::ID];
        const RECORD: &[SystemField] = &[
            SystemField::QNAME,
            SystemField::ID,
            SystemField::PARENT_ID,
            SystemField::CONTAINER,
            SystemField::IS_ACTIVE,
        ];
        const ORECORD: &[SystemField] = &[
            SystemField::QNAME,
            SystemField::ID,
            SystemField::PARENT_ID,
            SystemField::CONTAINER,
        ];
        const OBJECT: &[SystemField] = &[SystemField::QNAME];
        const ELEMENT: &[SystemField] = &[SystemField::QNAME, SystemField::CONTAINER];

        match self {
            TypeKind::GDoc | TypeKind::CDoc | TypeKind::WDoc => DOC,
            TypeKind::ODoc => ODOC,
            TypeKind::GRecord | TypeKind::CRecord | TypeKind::WRecord => RECORD,
            TypeKind::ORecord => ORECORD,
            TypeKind::ViewRecord | TypeKind::Object => OBJECT,
            TypeKind::Element => ELEMENT,
            _ => &[],
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Kind of a data value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DataKind {
    /// No value.
    Null,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// Binary data.
    Bytes,
    /// UTF-8 string.
    String,
    /// Qualified name.
    QName,
    /// Boolean.
    Bool,
    /// Record identifier.
    RecordID,
    /// Whole record, views only.
    Record,
    /// Whole event, views only.
    Event,
}

impl DataKind {
    /// Every kind except [`DataKind::Null`].
    pub const ALL: [DataKind; 11] = [
        DataKind::Int32,
        DataKind::Int64,
        DataKind::Float32,
        DataKind::Float64,
        DataKind::Bytes,
        DataKind::String,
        DataKind::QName,
        DataKind::Bool,
        DataKind::RecordID,
        DataKind::Record,
        DataKind::Event,
    ];

    /// Kinds with a fixed storage width.
    pub fn is_fixed_width(self) -> bool {
        matches!(
            self,
            DataKind::Int32
                | DataKind::Int64
                | DataKind::Float32
                | DataKind::Float64
                | DataKind::QName
                | DataKind::Bool
                | DataKind::RecordID
        )
    }

    /// Numeric kinds.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            DataKind::Int32 | DataKind::Int64 | DataKind::Float32 | DataKind::Float64
        )
    }

    /// String and bytes.
    pub fn is_string_like(self) -> bool {
        matches!(self, DataKind::String | DataKind::Bytes)
    }

    /// Name of the system data type for this kind, e.g. `sys.int64`.
    pub fn sys_data_name(self) -> QName {
        let entity = match self {
            DataKind::Null => return QName::NULL,
            DataKind::Int32 => "int32",
            DataKind::Int64 => "int64",
            DataKind::Float32 => "float32",
            DataKind::Float64 => "float64",
            DataKind::Bytes => "bytes",
            DataKind::String => "string",
            DataKind::QName => "QName",
            DataKind::Bool => "bool",
            DataKind::RecordID => "RecordID",
            DataKind::Record => "Record",
            DataKind::Event => "Event",
        };
        QName::sys(entity)
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A field added automatically to types of some kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemField {
    /// Field name.
    pub name: &'static str,
    /// Data kind.
    pub kind: DataKind,
    /// Required flag.
    pub required: bool,
}

impl SystemField {
    /// `sys.QName`: type name of the instance.
    pub const QNAME: SystemField = SystemField {
        name: SYS_FIELD_QNAME,
        kind: DataKind::QName,
        required: true,
    };
    /// `sys.ID`: record identity.
    pub const ID: SystemField = SystemField {
        name: SYS_FIELD_ID,
        kind: DataKind::RecordID,
        required: true,
    };
    /// `sys.ParentID`: identity of the parent record.
    pub const PARENT_ID: SystemField = SystemField {
        name: SYS_FIELD_PARENT_ID,
        kind: DataKind::RecordID,
        required: true,
    };
    /// `sys.Container`: container name within the parent.
    pub const CONTAINER: SystemField = SystemField {
        name: SYS_FIELD_CONTAINER,
        kind: DataKind::String,
        required: true,
    };
    /// `sys.IsActive`: activation flag.
    pub const IS_ACTIVE: SystemField = SystemField {
        name: SYS_FIELD_IS_ACTIVE,
        kind: DataKind::Bool,
        required: false,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classes() {
        assert!(TypeKind::CDoc.is_doc());
        assert!(TypeKind::CDoc.is_record());
        assert!(TypeKind::CRecord.is_record());
        assert!(!TypeKind::CRecord.is_doc());
        assert!(TypeKind::Element.is_structure());
        assert!(!TypeKind::ViewRecord.is_structure());
        assert!(TypeKind::ViewRecord.has_fields());
        assert!(TypeKind::Query.is_function());
        assert!(TypeKind::Job.is_extension());
        assert!(!TypeKind::Role.has_fields());
    }

    #[test]
    fn test_container_table() {
        assert!(TypeKind::CDoc.container_kind_available(TypeKind::CRecord));
        assert!(!TypeKind::CDoc.container_kind_available(TypeKind::Object));
        assert!(!TypeKind::CDoc.container_kind_available(TypeKind::WRecord));
        assert!(TypeKind::ODoc.container_kind_available(TypeKind::ODoc));
        assert!(TypeKind::ODoc.container_kind_available(TypeKind::ORecord));
        assert!(TypeKind::Object.container_kind_available(TypeKind::Element));
        assert!(TypeKind::Element.container_kind_available(TypeKind::Element));
        assert!(!TypeKind::Command.container_kind_available(TypeKind::Element));
    }

    #[test]
    fn test_field_kinds() {
        assert!(TypeKind::CDoc.field_kind_available(DataKind::Int64));
        assert!(!TypeKind::CDoc.field_kind_available(DataKind::Record));
        assert!(TypeKind::ViewRecord.field_kind_available(DataKind::Event));
        assert!(!TypeKind::Command.field_kind_available(DataKind::Int64));
        assert!(!TypeKind::CDoc.field_kind_available(DataKind::Null));
    }

    #[test]
    fn test_system_fields() {
        let names: Vec<_> = TypeKind::CRecord.system_fields().iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec!["sys.QName", "sys.ID", "sys.ParentID", "sys.Container", "sys.IsActive"]
        );
        assert_eq!(TypeKind::ODoc.system_fields().len(), 2);
        assert!(TypeKind::Role.system_fields().is_empty());
        assert!(TypeKind::CDoc.is_activable());
        assert!(!TypeKind::ODoc.is_activable());
    }

    #[test]
    fn test_data_kinds() {
        assert!(DataKind::Int64.is_fixed_width());
        assert!(!DataKind::String.is_fixed_width());
        assert!(DataKind::Float32.is_numeric());
        assert!(DataKind::Bytes.is_string_like());
        assert_eq!(DataKind::Int64.sys_data_name(), QName::sys("int64"));
        assert!(DataKind::Null.sys_data_name().is_null());
        assert_eq!(DataKind::Bool.to_string(), "Bool");
    }
}
