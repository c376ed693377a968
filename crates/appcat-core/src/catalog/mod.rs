//! Application type catalog.
//!
//! Type definitions, the build-phase registry that holds them, and the frozen
//! [`Catalog`] produced by a successful build.

mod catalog;
mod constraint;
mod cron;
mod data;
mod extension;
mod field;
mod filter;
mod rate;
pub(crate) mod registry;
mod structure;
mod typedef;
mod types;
mod view;
mod workspace;

pub use catalog::{Catalog, WorkspaceRef};
pub use constraint::{
    constraint_conflicts, merge_constraints, Constraint, ConstraintKind, DEFAULT_FIELD_MAX_LEN,
    MAX_FIELD_LEN,
};
pub use cron::validate_cron;
pub use data::DataType;
pub use extension::{
    param_kind_available, result_kind_available, ExtensionEngine, Function, Job, Projector,
    ProjectorEvent, ProjectorOp, Storage, Storages,
};
pub use field::{
    FieldDef, FieldList, VerificationKind, SYS_FIELD_CONTAINER, SYS_FIELD_ID, SYS_FIELD_IS_ACTIVE,
    SYS_FIELD_PARENT_ID, SYS_FIELD_PREFIX, SYS_FIELD_QNAME,
};
pub use filter::ResourceFilter;
pub use rate::{Limit, Rate, RateScope, LIMITABLE_OPERATIONS};
pub use structure::{Container, Occurs, Structure, Unique};
pub use typedef::{Tag, TypeBody, TypeDef};
pub use types::{DataKind, SystemField, TypeKind};
pub use view::{View, ViewPart};
pub use workspace::Workspace;
