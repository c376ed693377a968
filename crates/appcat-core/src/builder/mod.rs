//! Catalog builders.
//!
//! [`CatalogBuilder`] owns the build-phase registry. Workspace and type
//! builders are short-lived views that borrow it mutably; each call checks
//! its own arguments and aborts on definition errors, while cross-type
//! consistency is left to [`CatalogBuilder::build`].
//!
//! Methods that abort document it under `# Panics`; `try_*` variants return
//! the [`DefinitionError`](crate::error::DefinitionError) instead.

mod extension;
mod structure;
mod view;
mod workspace;

pub use extension::{FunctionBuilder, JobBuilder, ProjectorBuilder, StoragesBuilder};
pub use structure::StructureBuilder;
pub use view::ViewBuilder;
pub use workspace::WorkspaceBuilder;

use crate::catalog::registry::Registry;
use crate::catalog::{Catalog, TypeBody, TypeDef, TypeKind, Workspace};
use crate::config::CatalogConfig;
use crate::error::{DefinitionError, DefinitionResult, ValidationErrors};
use crate::qname::QName;
use crate::validation;
use tracing::{error, info, instrument, warn};

/// Unwrap a definition result, logging and panicking on error.
#[track_caller]
pub(crate) fn or_abort<T>(result: DefinitionResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            error!(kind = %err.kind(), error = %err, "catalog definition aborted");
            panic!("{err}");
        }
    }
}

/// Builder of a [`Catalog`].
///
/// # Example
///
/// ```
/// use appcat_core::builder::CatalogBuilder;
/// use appcat_core::catalog::{DataKind, TypeKind};
/// use appcat_core::qname::QName;
///
/// let mut builder = CatalogBuilder::new();
/// builder.add_package("test", "example.com/test");
///
/// let mut ws = builder.add_workspace(QName::new("test", "ws"));
/// ws.add_cdoc(QName::new("test", "doc"))
///     .add_field("f1", DataKind::Int64, true);
///
/// let catalog = builder.build().unwrap();
/// assert_eq!(catalog.type_def(&QName::new("test", "doc")).kind(), TypeKind::CDoc);
/// ```
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    registry: Registry,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogBuilder {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self::with_config(CatalogConfig::default())
    }

    /// Create a builder with a custom configuration.
    pub fn with_config(config: CatalogConfig) -> Self {
        Self {
            registry: Registry::new(config),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &CatalogConfig {
        &self.registry.config
    }

    /// Bind a package local name to a package path.
    ///
    /// # Panics
    ///
    /// Panics if the name is invalid, the path is empty, or either side is
    /// already bound to something else.
    pub fn add_package(&mut self, local: &str, path: &str) -> &mut Self {
        or_abort(self.try_add_package(local, path));
        self
    }

    /// Fallible [`add_package`](Self::add_package).
    pub fn try_add_package(&mut self, local: &str, path: &str) -> DefinitionResult<()> {
        let max_len = self.registry.config.max_ident_len;
        self.registry.packages.add(local, path, max_len)
    }

    /// Add a workspace and return its builder.
    ///
    /// # Panics
    ///
    /// Panics if the name is invalid or already bound.
    pub fn add_workspace(&mut self, name: QName) -> WorkspaceBuilder<'_> {
        or_abort(self.try_add_workspace(name))
    }

    /// Fallible [`add_workspace`](Self::add_workspace).
    pub fn try_add_workspace(&mut self, name: QName) -> DefinitionResult<WorkspaceBuilder<'_>> {
        let def = TypeDef::new(
            name.clone(),
            TypeKind::Workspace,
            name.clone(),
            TypeBody::Workspace(Workspace::new()),
        );
        self.registry.add_type(def)?;
        Ok(WorkspaceBuilder::new(&mut self.registry, name))
    }

    /// Reopen an existing workspace.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a workspace.
    pub fn alter_workspace(&mut self, name: QName) -> WorkspaceBuilder<'_> {
        or_abort(self.registry.workspace(&name).map(|_| ()));
        WorkspaceBuilder::new(&mut self.registry, name)
    }

    /// Set or clear the comment of any type.
    ///
    /// # Panics
    ///
    /// Panics if the type is unknown.
    pub fn set_type_comment(&mut self, name: &QName, comment: &str) -> &mut Self {
        let def = or_abort(self.registry.type_mut(name));
        def.set_comment(non_empty(comment));
        self
    }

    /// Type as currently defined; the NULL object if unknown.
    pub fn type_def(&self, name: &QName) -> &TypeDef {
        self.registry.type_def(name)
    }

    /// Check the catalog without building it.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validation::validate(&self.registry).into_result()
    }

    /// Validate and freeze the current definitions.
    ///
    /// The builder is left untouched and may be altered and built again.
    #[instrument(skip_all)]
    pub fn build(&self) -> Result<Catalog, ValidationErrors> {
        if let Err(errors) = self.validate() {
            warn!(errors = errors.len(), "catalog build failed");
            return Err(errors);
        }
        let catalog = Catalog::freeze(self.registry.clone());
        info!(
            types = catalog.type_count(),
            workspaces = catalog.workspaces().count(),
            rules = catalog.acl().len(),
            "catalog built"
        );
        Ok(catalog)
    }

    /// Build, panicking with the aggregated validation errors.
    ///
    /// # Panics
    ///
    /// Panics if validation fails.
    pub fn must_build(&self) -> Catalog {
        match self.build() {
            Ok(catalog) => catalog,
            Err(errors) => {
                error!(errors = errors.len(), "catalog build aborted");
                panic!("{errors}");
            }
        }
    }
}

pub(crate) fn non_empty(comment: &str) -> Option<String> {
    if comment.is_empty() {
        None
    } else {
        Some(comment.to_string())
    }
}

/// Resolve a type among those visible from `ws`, checking its kind.
pub(crate) fn find_visible_kind<'r>(
    registry: &'r Registry,
    ws: &QName,
    name: &QName,
    expected: &str,
    accept: impl Fn(TypeKind) -> bool,
) -> DefinitionResult<&'r TypeDef> {
    match registry.find_visible(ws, name) {
        Some(t) if accept(t.kind()) => Ok(t),
        Some(t) => Err(DefinitionError::Incompatible(format!("{t}, {expected} expected"))),
        None => Err(DefinitionError::NotFound(format!("{expected} «{name}»"))),
    }
}

/// Setters shared by every type builder.
macro_rules! impl_type_builder {
    ($builder:ident) => {
        impl $builder<'_> {
            /// Name of the type being built.
            pub fn name(&self) -> &$crate::qname::QName {
                &self.name
            }

            /// Set or clear the comment.
            pub fn set_comment(&mut self, comment: &str) -> &mut Self {
                let def = $crate::builder::or_abort(self.registry.type_mut(&self.name));
                def.set_comment($crate::builder::non_empty(comment));
                self
            }

            /// Mark the type abstract.
            pub fn set_abstract(&mut self) -> &mut Self {
                $crate::builder::or_abort(self.registry.type_mut(&self.name)).set_abstract();
                self
            }

            /// Attach a tag.
            ///
            /// # Panics
            ///
            /// Panics if `tag` is not a tag visible from the workspace.
            pub fn add_tag(&mut self, tag: $crate::qname::QName) -> &mut Self {
                $crate::builder::or_abort(self.registry.add_tag(&self.name, tag));
                self
            }
        }
    };
}

pub(crate) use impl_type_builder;

/// Builder of types without a configurable body: roles, data types, tags,
/// rates and limits.
#[derive(Debug)]
pub struct TypeBuilder<'a> {
    registry: &'a mut Registry,
    name: QName,
}

impl<'a> TypeBuilder<'a> {
    pub(crate) fn new(registry: &'a mut Registry, name: QName) -> Self {
        Self { registry, name }
    }
}

impl_type_builder!(TypeBuilder);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn q(s: &str) -> QName {
        QName::new("test", s)
    }

    #[test]
    fn test_add_package() {
        let mut builder = CatalogBuilder::new();
        builder.add_package("test", "example.com/test");
        builder.add_package("test", "example.com/test");
        assert_eq!(
            builder
                .try_add_package("test", "example.com/other")
                .unwrap_err()
                .kind(),
            ErrorKind::AlreadyExists
        );
    }

    #[test]
    #[should_panic(expected = "already exists")]
    fn test_duplicate_workspace_aborts() {
        let mut builder = CatalogBuilder::new();
        builder.add_workspace(q("ws"));
        builder.add_workspace(q("ws"));
    }

    #[test]
    #[should_panic(expected = "not found")]
    fn test_alter_unknown_workspace_aborts() {
        let mut builder = CatalogBuilder::new();
        builder.alter_workspace(q("ws"));
    }

    #[test]
    fn test_try_add_workspace() {
        let mut builder = CatalogBuilder::new();
        assert!(builder.try_add_workspace(q("ws")).is_ok());
        assert_eq!(
            builder.try_add_workspace(QName::NULL).unwrap_err().kind(),
            ErrorKind::Missing
        );
        assert_eq!(
            builder.try_add_workspace(q("ws")).unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
    }

    #[test]
    fn test_build_leaves_builder_usable() {
        let mut builder = CatalogBuilder::new();
        builder.add_workspace(q("ws")).add_role(q("reader"));
        let first = builder.build().unwrap();

        builder.alter_workspace(q("ws")).add_role(q("writer"));
        let second = builder.build().unwrap();

        assert!(first.type_def(&q("writer")).is_null());
        assert_eq!(second.type_def(&q("writer")).kind(), TypeKind::Role);
        assert_eq!(builder.type_def(&q("writer")).kind(), TypeKind::Role);
    }

    #[test]
    fn test_set_type_comment() {
        let mut builder = CatalogBuilder::new();
        builder.add_workspace(q("ws")).add_role(q("reader"));
        builder.set_type_comment(&q("reader"), "reads everything");
        assert_eq!(builder.type_def(&q("reader")).comment(), Some("reads everything"));
        builder.set_type_comment(&q("reader"), "");
        assert_eq!(builder.type_def(&q("reader")).comment(), None);
    }

    #[test]
    fn test_failed_build_is_repeatable() {
        let mut builder = CatalogBuilder::new();
        builder
            .add_workspace(q("ws"))
            .add_cdoc(q("doc"))
            .add_container("rec", q("rec"), 0.into(), 1.into());

        let first = builder.build().unwrap_err();
        let second = builder.build().unwrap_err();
        assert_eq!(first.len(), second.len());
        assert_eq!(first.to_string(), second.to_string());
        assert!(first.contains(ErrorKind::NotFound, "test.rec"));
    }

    #[test]
    #[should_panic(expected = "validation error")]
    fn test_must_build_panics() {
        let mut builder = CatalogBuilder::new();
        builder
            .add_workspace(q("ws"))
            .add_cdoc(q("doc"))
            .add_container("rec", q("rec"), 0.into(), 1.into());
        builder.must_build();
    }
}
