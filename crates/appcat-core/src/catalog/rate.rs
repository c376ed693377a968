//! Rates and limits.

use super::filter::ResourceFilter;
use crate::error::{DefinitionError, DefinitionResult};
use crate::security::Operation;
use crate::qname::QName;
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;

/// Scope a rate is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RateScope {
    /// Per application partition.
    AppPartition,
    /// Per workspace.
    Workspace,
    /// Per user.
    User,
    /// Per client address.
    IP,
}

/// Body of a rate: at most `count` events per `period`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rate {
    count: u32,
    period: Duration,
    scopes: BTreeSet<RateScope>,
}

impl Rate {
    /// Create a rate. Without scopes the rate counts per application partition.
    pub fn new(
        count: u32,
        period: Duration,
        scopes: impl IntoIterator<Item = RateScope>,
    ) -> DefinitionResult<Self> {
        if count == 0 {
            return Err(DefinitionError::OutOfBounds("rate count 0".into()));
        }
        if period.is_zero() {
            return Err(DefinitionError::OutOfBounds("zero rate period".into()));
        }
        let mut scopes: BTreeSet<RateScope> = scopes.into_iter().collect();
        if scopes.is_empty() {
            scopes.insert(RateScope::AppPartition);
        }
        Ok(Self {
            count,
            period,
            scopes,
        })
    }

    /// Events allowed per period.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Period length.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Counting scopes.
    pub fn scopes(&self) -> impl Iterator<Item = RateScope> + '_ {
        self.scopes.iter().copied()
    }
}

/// Operations a limit may restrict.
pub const LIMITABLE_OPERATIONS: &[Operation] = &[
    Operation::Insert,
    Operation::Update,
    Operation::Select,
    Operation::Activate,
    Operation::Deactivate,
    Operation::Execute,
];

/// Body of a limit: applies a rate to operations on the selected types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Limit {
    ops: BTreeSet<Operation>,
    filter: ResourceFilter,
    rate: QName,
}

impl Limit {
    /// Create a limit.
    pub fn new(
        ops: impl IntoIterator<Item = Operation>,
        filter: ResourceFilter,
        rate: QName,
    ) -> DefinitionResult<Self> {
        let ops: BTreeSet<Operation> = ops.into_iter().collect();
        if ops.is_empty() {
            return Err(DefinitionError::Missing("limit operations".into()));
        }
        if let Some(op) = ops.iter().find(|op| !LIMITABLE_OPERATIONS.contains(op)) {
            return Err(DefinitionError::Unsupported(format!("limited operation {op}")));
        }
        if rate.is_null() {
            return Err(DefinitionError::Missing("limit rate".into()));
        }
        Ok(Self { ops, filter, rate })
    }

    /// Limited operations.
    pub fn ops(&self) -> impl Iterator<Item = Operation> + '_ {
        self.ops.iter().copied()
    }

    /// Selected types.
    pub fn filter(&self) -> &ResourceFilter {
        &self.filter
    }

    /// Applied rate.
    pub fn rate(&self) -> &QName {
        &self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_rate() {
        let rate = Rate::new(10, Duration::from_secs(60), []).unwrap();
        assert_eq!(rate.count(), 10);
        assert_eq!(rate.scopes().collect::<Vec<_>>(), vec![RateScope::AppPartition]);

        let rate = Rate::new(1, Duration::from_secs(1), [RateScope::User, RateScope::IP]).unwrap();
        assert_eq!(rate.scopes().count(), 2);

        assert_eq!(
            Rate::new(0, Duration::from_secs(1), []).unwrap_err().kind(),
            ErrorKind::OutOfBounds
        );
        assert_eq!(
            Rate::new(1, Duration::ZERO, []).unwrap_err().kind(),
            ErrorKind::OutOfBounds
        );
    }

    #[test]
    fn test_limit() {
        let filter = ResourceFilter::name(QName::new("test", "cmd"));
        let rate = QName::new("test", "rate");

        let limit = Limit::new([Operation::Execute], filter.clone(), rate.clone()).unwrap();
        assert_eq!(limit.ops().collect::<Vec<_>>(), vec![Operation::Execute]);
        assert_eq!(limit.rate(), &rate);

        assert_eq!(
            Limit::new([], filter.clone(), rate.clone()).unwrap_err().kind(),
            ErrorKind::Missing
        );
        assert_eq!(
            Limit::new([Operation::Inherits], filter.clone(), rate).unwrap_err().kind(),
            ErrorKind::Unsupported
        );
        assert_eq!(
            Limit::new([Operation::Execute], filter, QName::NULL).unwrap_err().kind(),
            ErrorKind::Missing
        );
    }
}
