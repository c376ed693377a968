//! Builders of commands, queries, projectors and jobs.

use super::{impl_type_builder, non_empty, or_abort};
use crate::catalog::registry::Registry;
use crate::catalog::{
    ExtensionEngine, Function, Job, Projector, ProjectorOp, ResourceFilter, Storages, TypeBody,
    TypeKind,
};
use crate::error::{DefinitionError, DefinitionResult};
use crate::qname::QName;

fn body_mut<'r>(registry: &'r mut Registry, name: &QName) -> DefinitionResult<(TypeKind, &'r mut TypeBody)> {
    let def = registry.type_mut(name)?;
    Ok((def.kind(), def.body_mut()))
}

#[derive(Debug, Clone, Copy)]
enum Side {
    States,
    Intents,
}

fn storages_builder<'r>(
    registry: &'r mut Registry,
    name: &QName,
    side: Side,
) -> DefinitionResult<StoragesBuilder<'r>> {
    let max_len = registry.config.max_ident_len;
    let (states, intents) = match body_mut(registry, name)? {
        (_, TypeBody::Function(f)) => f.storages_mut(),
        (_, TypeBody::Projector(p)) => p.storages_mut(),
        (_, TypeBody::Job(j)) => j.storages_mut(),
        (kind, _) => {
            return Err(DefinitionError::Incompatible(format!(
                "{kind} «{name}», extension expected"
            )))
        }
    };
    let storages = match side {
        Side::States => states,
        Side::Intents => intents,
    };
    Ok(StoragesBuilder { storages, max_len })
}

/// Builder of the storages an extension reads or writes.
///
/// Type names are resolved by validation.
#[derive(Debug)]
pub struct StoragesBuilder<'a> {
    storages: &'a mut Storages,
    max_len: usize,
}

impl StoragesBuilder<'_> {
    /// Add `storage`, or extend it, with the types `names`.
    ///
    /// # Panics
    ///
    /// Panics if the storage name or one of `names` is missing or invalid.
    pub fn add(&mut self, storage: QName, names: &[QName]) -> &mut Self {
        or_abort(self.try_add(storage, names));
        self
    }

    /// Fallible [`add`](Self::add). Nothing is added on error.
    pub fn try_add(&mut self, storage: QName, names: &[QName]) -> DefinitionResult<()> {
        self.storages.add(storage, names.iter().cloned(), self.max_len)
    }

    /// Set or clear the comment of an added storage.
    ///
    /// # Panics
    ///
    /// Panics if `storage` was not added.
    pub fn set_comment(&mut self, storage: &QName, comment: &str) -> &mut Self {
        or_abort(self.storages.set_comment(storage, non_empty(comment)));
        self
    }
}

macro_rules! impl_storages {
    ($builder:ident) => {
        impl $builder<'_> {
            /// Storages the extension reads.
            pub fn states(&mut self) -> StoragesBuilder<'_> {
                or_abort(storages_builder(self.registry, &self.name, Side::States))
            }

            /// Storages the extension writes.
            pub fn intents(&mut self) -> StoragesBuilder<'_> {
                or_abort(storages_builder(self.registry, &self.name, Side::Intents))
            }
        }
    };
}

/// Builder of a command or query.
///
/// Parameter and result names are resolved by validation; `sys.ANY` is
/// accepted for both.
#[derive(Debug)]
pub struct FunctionBuilder<'a> {
    registry: &'a mut Registry,
    name: QName,
}

impl_type_builder!(FunctionBuilder);
impl_storages!(FunctionBuilder);

impl<'a> FunctionBuilder<'a> {
    pub(crate) fn new(registry: &'a mut Registry, name: QName) -> Self {
        Self { registry, name }
    }

    fn function_mut(&mut self) -> DefinitionResult<(TypeKind, &mut Function)> {
        match body_mut(self.registry, &self.name)? {
            (kind, TypeBody::Function(f)) => Ok((kind, f)),
            (kind, _) => Err(DefinitionError::Incompatible(format!(
                "{kind} «{}», function expected",
                self.name
            ))),
        }
    }

    /// Set the parameter type.
    pub fn set_param(&mut self, param: QName) -> &mut Self {
        or_abort(self.function_mut()).1.set_param(param);
        self
    }

    /// Set the unlogged parameter type.
    ///
    /// # Panics
    ///
    /// Panics if the function is a query.
    pub fn set_unlogged_param(&mut self, param: QName) -> &mut Self {
        let (kind, f) = or_abort(self.function_mut());
        if kind != TypeKind::Command {
            or_abort::<()>(Err(DefinitionError::Unsupported(format!(
                "unlogged parameter for {kind}"
            ))));
        }
        f.set_unlogged_param(param);
        self
    }

    /// Set the result type.
    pub fn set_result(&mut self, result: QName) -> &mut Self {
        or_abort(self.function_mut()).1.set_result(result);
        self
    }

    /// Set the extension engine.
    pub fn set_engine(&mut self, engine: ExtensionEngine) -> &mut Self {
        or_abort(self.function_mut()).1.set_engine(engine);
        self
    }
}

/// Builder of a projector.
#[derive(Debug)]
pub struct ProjectorBuilder<'a> {
    registry: &'a mut Registry,
    name: QName,
}

impl_type_builder!(ProjectorBuilder);
impl_storages!(ProjectorBuilder);

impl<'a> ProjectorBuilder<'a> {
    pub(crate) fn new(registry: &'a mut Registry, name: QName) -> Self {
        Self { registry, name }
    }

    fn projector_mut(&mut self) -> DefinitionResult<&mut Projector> {
        match body_mut(self.registry, &self.name)? {
            (_, TypeBody::Projector(p)) => Ok(p),
            (kind, _) => Err(DefinitionError::Incompatible(format!(
                "{kind} «{}», projector expected",
                self.name
            ))),
        }
    }

    /// Trigger the projector on `ops` of the resources selected by `filter`.
    ///
    /// Matching resources are checked by validation.
    ///
    /// # Panics
    ///
    /// Panics if `ops` is empty.
    pub fn add_event(&mut self, ops: &[ProjectorOp], filter: ResourceFilter, comment: &str) -> &mut Self {
        if ops.is_empty() {
            or_abort::<()>(Err(DefinitionError::Missing(format!(
                "operations of projector «{}» event",
                self.name
            ))));
        }
        or_abort(self.projector_mut()).add_event(
            ops.iter().copied().collect(),
            filter,
            non_empty(comment),
        );
        self
    }

    /// Run the projector synchronously with the triggering event.
    pub fn set_sync(&mut self, sync: bool) -> &mut Self {
        or_abort(self.projector_mut()).set_sync(sync);
        self
    }

    /// Deliver error events to the projector.
    pub fn set_want_errors(&mut self) -> &mut Self {
        or_abort(self.projector_mut()).set_want_errors(true);
        self
    }

    /// Set the extension engine.
    pub fn set_engine(&mut self, engine: ExtensionEngine) -> &mut Self {
        or_abort(self.projector_mut()).set_engine(engine);
        self
    }
}

/// Builder of a scheduled job.
#[derive(Debug)]
pub struct JobBuilder<'a> {
    registry: &'a mut Registry,
    name: QName,
}

impl_type_builder!(JobBuilder);
impl_storages!(JobBuilder);

impl<'a> JobBuilder<'a> {
    pub(crate) fn new(registry: &'a mut Registry, name: QName) -> Self {
        Self { registry, name }
    }

    fn job_mut(&mut self) -> DefinitionResult<&mut Job> {
        match body_mut(self.registry, &self.name)? {
            (_, TypeBody::Job(j)) => Ok(j),
            (kind, _) => Err(DefinitionError::Incompatible(format!(
                "{kind} «{}», job expected",
                self.name
            ))),
        }
    }

    /// Set the cron schedule. The syntax is checked by validation.
    pub fn set_cron(&mut self, cron: &str) -> &mut Self {
        or_abort(self.job_mut()).set_cron(cron.to_string());
        self
    }

    /// Set the extension engine.
    pub fn set_engine(&mut self, engine: ExtensionEngine) -> &mut Self {
        or_abort(self.job_mut()).set_engine(engine);
        self
    }
}
