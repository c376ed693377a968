//! AppCat Core - application type catalog.
//!
//! This crate defines the shapes and permissions of an application: a
//! two-phase builder assembles documents, records, views, functions,
//! workspaces, roles and ACL rules into a validated, immutable [`Catalog`]
//! that answers authorization queries.

pub mod builder;
pub mod catalog;
pub mod config;
pub mod describe;
pub mod error;
pub mod qname;
pub mod security;
mod validation;

pub use builder::{
    CatalogBuilder, FunctionBuilder, JobBuilder, ProjectorBuilder, StoragesBuilder,
    StructureBuilder, TypeBuilder, ViewBuilder, WorkspaceBuilder,
};
pub use catalog::{Catalog, DataKind, ResourceFilter, TypeDef, TypeKind, WorkspaceRef};
pub use config::CatalogConfig;
pub use describe::{CatalogDescription, WorkspaceDescription};
pub use error::{
    DefinitionError, DefinitionResult, ErrorKind, ValidationError, ValidationErrors,
};
pub use qname::{FullQName, Packages, QName};

// Security exports
pub use security::{Access, AclError, AclResult, AclRule, Operation, Policy, PublishedOps};
