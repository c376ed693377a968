//! Extensions: commands, queries, projectors and jobs.

use super::filter::ResourceFilter;
use super::types::TypeKind;
use crate::error::{DefinitionError, DefinitionResult};
use crate::qname::{validate_qname, QName};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Engine that runs an extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ExtensionEngine {
    /// Compiled into the host application.
    #[default]
    BuiltIn,
    /// WebAssembly module.
    Wasm,
}

impl fmt::Display for ExtensionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Storage an extension reads (state) or writes (intent), with the types
/// it touches there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Storage {
    names: BTreeSet<QName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

impl Storage {
    /// Type names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &QName> {
        self.names.iter()
    }

    /// Comment.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

/// Storages keyed by storage name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Storages(BTreeMap<QName, Storage>);

impl Storages {
    /// Returns true if no storage was added.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of storages.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Storage by name.
    pub fn get(&self, storage: &QName) -> Option<&Storage> {
        self.0.get(storage)
    }

    /// Storages sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&QName, &Storage)> {
        self.0.iter()
    }

    /// Add `storage` or extend its names. Nothing changes on error.
    pub(crate) fn add(
        &mut self,
        storage: QName,
        names: impl IntoIterator<Item = QName>,
        max_len: usize,
    ) -> DefinitionResult<()> {
        validate_qname(&storage, max_len)?;
        let names: Vec<QName> = names.into_iter().collect();
        for name in &names {
            validate_qname(name, max_len)?;
        }
        self.0.entry(storage).or_default().names.extend(names);
        Ok(())
    }

    pub(crate) fn set_comment(&mut self, storage: &QName, comment: Option<String>) -> DefinitionResult<()> {
        let s = self
            .0
            .get_mut(storage)
            .ok_or_else(|| DefinitionError::NotFound(format!("storage «{storage}»")))?;
        s.comment = comment;
        Ok(())
    }
}

/// Body of a command or query.
///
/// Parameter and result are type names; NULL means none, `sys.ANY` means
/// any type. Resolution happens during validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Function {
    engine: ExtensionEngine,
    #[serde(skip_serializing_if = "QName::is_null")]
    param: QName,
    #[serde(skip_serializing_if = "QName::is_null")]
    unlogged_param: QName,
    #[serde(skip_serializing_if = "QName::is_null")]
    result: QName,
    #[serde(skip_serializing_if = "Storages::is_empty")]
    states: Storages,
    #[serde(skip_serializing_if = "Storages::is_empty")]
    intents: Storages,
}

impl Function {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Extension engine.
    pub fn engine(&self) -> ExtensionEngine {
        self.engine
    }

    /// Parameter type name.
    pub fn param(&self) -> &QName {
        &self.param
    }

    /// Unlogged parameter type name, commands only.
    pub fn unlogged_param(&self) -> &QName {
        &self.unlogged_param
    }

    /// Result type name.
    pub fn result(&self) -> &QName {
        &self.result
    }

    /// Storages read.
    pub fn states(&self) -> &Storages {
        &self.states
    }

    /// Storages written.
    pub fn intents(&self) -> &Storages {
        &self.intents
    }

    pub(crate) fn storages_mut(&mut self) -> (&mut Storages, &mut Storages) {
        (&mut self.states, &mut self.intents)
    }

    pub(crate) fn set_engine(&mut self, engine: ExtensionEngine) {
        self.engine = engine;
    }

    pub(crate) fn set_param(&mut self, param: QName) {
        self.param = param;
    }

    pub(crate) fn set_unlogged_param(&mut self, param: QName) {
        self.unlogged_param = param;
    }

    pub(crate) fn set_result(&mut self, result: QName) {
        self.result = result;
    }
}

/// Kinds accepted as function parameters.
pub fn param_kind_available(kind: TypeKind) -> bool {
    matches!(kind, TypeKind::Data | TypeKind::ODoc | TypeKind::Object)
}

/// Kinds accepted as function results.
pub fn result_kind_available(kind: TypeKind) -> bool {
    param_kind_available(kind) || kind.is_doc()
}

/// Event that triggers a projector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ProjectorOp {
    /// Record inserted.
    Insert,
    /// Record updated.
    Update,
    /// Record activated.
    Activate,
    /// Record deactivated.
    Deactivate,
    /// Command executed.
    Execute,
    /// Command executed with a parameter of the matched type.
    ExecuteWithParam,
}

impl ProjectorOp {
    /// Returns true if the event can occur on types of `kind`.
    pub fn available_for(self, kind: TypeKind) -> bool {
        match self {
            ProjectorOp::Insert | ProjectorOp::Update => {
                kind.is_record() && kind != TypeKind::ODoc && kind != TypeKind::ORecord
            }
            ProjectorOp::Activate | ProjectorOp::Deactivate => kind.is_activable(),
            ProjectorOp::Execute => kind == TypeKind::Command,
            ProjectorOp::ExecuteWithParam => matches!(kind, TypeKind::ODoc | TypeKind::Object),
        }
    }
}

impl fmt::Display for ProjectorOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One trigger of a projector: operations on the types a filter selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectorEvent {
    ops: BTreeSet<ProjectorOp>,
    filter: ResourceFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

impl ProjectorEvent {
    /// Triggering operations.
    pub fn ops(&self) -> impl Iterator<Item = ProjectorOp> + '_ {
        self.ops.iter().copied()
    }

    /// Selected types.
    pub fn filter(&self) -> &ResourceFilter {
        &self.filter
    }

    /// Comment.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

/// Body of a projector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Projector {
    engine: ExtensionEngine,
    sync: bool,
    want_errors: bool,
    events: Vec<ProjectorEvent>,
    #[serde(skip_serializing_if = "Storages::is_empty")]
    states: Storages,
    #[serde(skip_serializing_if = "Storages::is_empty")]
    intents: Storages,
}

impl Projector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Extension engine.
    pub fn engine(&self) -> ExtensionEngine {
        self.engine
    }

    /// Runs synchronously with the triggering command.
    pub fn is_sync(&self) -> bool {
        self.sync
    }

    /// Also triggered by failed commands.
    pub fn want_errors(&self) -> bool {
        self.want_errors
    }

    /// Triggers.
    pub fn events(&self) -> &[ProjectorEvent] {
        &self.events
    }

    /// Storages read.
    pub fn states(&self) -> &Storages {
        &self.states
    }

    /// Storages written.
    pub fn intents(&self) -> &Storages {
        &self.intents
    }

    pub(crate) fn storages_mut(&mut self) -> (&mut Storages, &mut Storages) {
        (&mut self.states, &mut self.intents)
    }

    pub(crate) fn set_engine(&mut self, engine: ExtensionEngine) {
        self.engine = engine;
    }

    pub(crate) fn set_sync(&mut self, sync: bool) {
        self.sync = sync;
    }

    pub(crate) fn set_want_errors(&mut self, want: bool) {
        self.want_errors = want;
    }

    pub(crate) fn add_event(
        &mut self,
        ops: BTreeSet<ProjectorOp>,
        filter: ResourceFilter,
        comment: Option<String>,
    ) {
        self.events.push(ProjectorEvent {
            ops,
            filter,
            comment,
        });
    }
}

/// Body of a scheduled job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Job {
    engine: ExtensionEngine,
    cron: String,
    #[serde(skip_serializing_if = "Storages::is_empty")]
    states: Storages,
    #[serde(skip_serializing_if = "Storages::is_empty")]
    intents: Storages,
}

impl Job {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Extension engine.
    pub fn engine(&self) -> ExtensionEngine {
        self.engine
    }

    /// Cron schedule.
    pub fn cron(&self) -> &str {
        &self.cron
    }

    /// Storages read.
    pub fn states(&self) -> &Storages {
        &self.states
    }

    /// Storages written.
    pub fn intents(&self) -> &Storages {
        &self.intents
    }

    pub(crate) fn storages_mut(&mut self) -> (&mut Storages, &mut Storages) {
        (&mut self.states, &mut self.intents)
    }

    pub(crate) fn set_engine(&mut self, engine: ExtensionEngine) {
        self.engine = engine;
    }

    pub(crate) fn set_cron(&mut self, cron: String) {
        self.cron = cron;
    }
}
