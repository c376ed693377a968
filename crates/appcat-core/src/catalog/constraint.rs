//! Value constraints for fields and data types.

use super::types::DataKind;
use crate::error::{DefinitionError, DefinitionResult};
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Maximum length a `MaxLen` constraint may declare.
pub const MAX_FIELD_LEN: u16 = u16::MAX;

/// Length limit applied to string and bytes fields without a `MaxLen` constraint.
pub const DEFAULT_FIELD_MAX_LEN: u16 = 255;

/// A constraint on the values of a field or data type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Constraint {
    /// Minimum length of a string or bytes value.
    MinLen(u16),
    /// Maximum length of a string or bytes value.
    MaxLen(u16),
    /// Regular expression a string or bytes value must match.
    Pattern(String),
    /// Inclusive lower bound of a numeric value.
    MinIncl(f64),
    /// Exclusive lower bound of a numeric value.
    MinExcl(f64),
    /// Inclusive upper bound of a numeric value.
    MaxIncl(f64),
    /// Exclusive upper bound of a numeric value.
    MaxExcl(f64),
    /// Enumeration of allowed values.
    Enum(Vec<String>),
}

/// Constraint discriminant, used to merge inherited constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ConstraintKind {
    MinLen,
    MaxLen,
    Pattern,
    MinIncl,
    MinExcl,
    MaxIncl,
    MaxExcl,
    Enum,
}

impl Constraint {
    /// Discriminant of this constraint.
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::MinLen(_) => ConstraintKind::MinLen,
            Constraint::MaxLen(_) => ConstraintKind::MaxLen,
            Constraint::Pattern(_) => ConstraintKind::Pattern,
            Constraint::MinIncl(_) => ConstraintKind::MinIncl,
            Constraint::MinExcl(_) => ConstraintKind::MinExcl,
            Constraint::MaxIncl(_) => ConstraintKind::MaxIncl,
            Constraint::MaxExcl(_) => ConstraintKind::MaxExcl,
            Constraint::Enum(_) => ConstraintKind::Enum,
        }
    }

    /// Check that this constraint applies to values of `data` kind and is well formed.
    pub fn check(&self, data: DataKind) -> DefinitionResult<()> {
        let applicable = match self.kind() {
            ConstraintKind::MinLen | ConstraintKind::MaxLen | ConstraintKind::Pattern => {
                data.is_string_like()
            }
            ConstraintKind::MinIncl
            | ConstraintKind::MinExcl
            | ConstraintKind::MaxIncl
            | ConstraintKind::MaxExcl => data.is_numeric(),
            ConstraintKind::Enum => data == DataKind::String || data.is_numeric(),
        };
        if !applicable {
            return Err(DefinitionError::Incompatible(format!(
                "constraint {self} and data kind {data}"
            )));
        }

        match self {
            Constraint::MaxLen(0) => Err(DefinitionError::OutOfBounds(format!(
                "constraint {self}, expected 1..={MAX_FIELD_LEN}"
            ))),
            Constraint::Pattern(pattern) => Regex::new(pattern)
                .map(|_| ())
                .map_err(|err| DefinitionError::Invalid(format!("pattern «{pattern}»: {err}"))),
            Constraint::MinIncl(v) | Constraint::MinExcl(v) | Constraint::MaxIncl(v) | Constraint::MaxExcl(v)
                if v.is_nan() =>
            {
                Err(DefinitionError::Invalid(format!("constraint {self}")))
            }
            Constraint::Enum(values) if values.is_empty() => {
                Err(DefinitionError::Missing(format!("values of constraint {self}")))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::MinLen(v) => write!(f, "MinLen: {v}"),
            Constraint::MaxLen(v) => write!(f, "MaxLen: {v}"),
            Constraint::Pattern(p) => write!(f, "Pattern: `{p}`"),
            Constraint::MinIncl(v) => write!(f, "MinIncl: {v}"),
            Constraint::MinExcl(v) => write!(f, "MinExcl: {v}"),
            Constraint::MaxIncl(v) => write!(f, "MaxIncl: {v}"),
            Constraint::MaxExcl(v) => write!(f, "MaxExcl: {v}"),
            Constraint::Enum(values) => write!(f, "Enum: [{}]", values.join(", ")),
        }
    }
}

/// Overlay `own` constraints on `inherited` ones; own constraints win per kind.
pub fn merge_constraints(inherited: &[Constraint], own: &[Constraint]) -> Vec<Constraint> {
    let mut merged: Vec<Constraint> = inherited
        .iter()
        .filter(|c| !own.iter().any(|o| o.kind() == c.kind()))
        .cloned()
        .collect();
    merged.extend(own.iter().cloned());
    merged.sort_by_key(Constraint::kind);
    merged
}

/// Describe contradictions inside a constraint set, such as `MinLen` above `MaxLen`.
pub fn constraint_conflicts(constraints: &[Constraint]) -> Vec<String> {
    let mut conflicts = Vec::new();

    let find = |kind: ConstraintKind| constraints.iter().find(|c| c.kind() == kind);

    if let (Some(Constraint::MinLen(min)), Some(Constraint::MaxLen(max))) =
        (find(ConstraintKind::MinLen), find(ConstraintKind::MaxLen))
    {
        if min > max {
            conflicts.push(format!("MinLen {min} exceeds MaxLen {max}"));
        }
    }

    let lower = constraints.iter().find_map(|c| match c {
        Constraint::MinIncl(v) => Some((*v, true)),
        Constraint::MinExcl(v) => Some((*v, false)),
        _ => None,
    });
    let upper = constraints.iter().find_map(|c| match c {
        Constraint::MaxIncl(v) => Some((*v, true)),
        Constraint::MaxExcl(v) => Some((*v, false)),
        _ => None,
    });
    if let (Some((lo, lo_incl)), Some((hi, hi_incl))) = (lower, upper) {
        let empty = if lo_incl && hi_incl { lo > hi } else { lo >= hi };
        if empty {
            conflicts.push(format!("lower bound {lo} is not below upper bound {hi}"));
        }
    }

    if constraints.iter().any(|c| c.kind() == ConstraintKind::MinIncl)
        && constraints.iter().any(|c| c.kind() == ConstraintKind::MinExcl)
    {
        conflicts.push("both MinIncl and MinExcl are set".to_string());
    }
    if constraints.iter().any(|c| c.kind() == ConstraintKind::MaxIncl)
        && constraints.iter().any(|c| c.kind() == ConstraintKind::MaxExcl)
    {
        conflicts.push("both MaxIncl and MaxExcl are set".to_string());
    }

    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_constraint_applicability() {
        assert!(Constraint::MaxLen(100).check(DataKind::String).is_ok());
        assert!(Constraint::MinLen(1).check(DataKind::Bytes).is_ok());
        assert!(Constraint::MinIncl(0.0).check(DataKind::Int64).is_ok());
        assert!(Constraint::Enum(vec!["a".into()]).check(DataKind::String).is_ok());

        let err = Constraint::MaxLen(100).check(DataKind::Int32).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Incompatible);
        let err = Constraint::MaxIncl(1.0).check(DataKind::String).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Incompatible);
        let err = Constraint::Enum(vec!["a".into()]).check(DataKind::Bool).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Incompatible);
    }

    #[test]
    fn test_malformed_constraints() {
        assert_eq!(
            Constraint::MaxLen(0).check(DataKind::String).unwrap_err().kind(),
            ErrorKind::OutOfBounds
        );
        assert_eq!(
            Constraint::Pattern("([a-z".into()).check(DataKind::String).unwrap_err().kind(),
            ErrorKind::Invalid
        );
        assert_eq!(
            Constraint::MinIncl(f64::NAN).check(DataKind::Float64).unwrap_err().kind(),
            ErrorKind::Invalid
        );
        assert_eq!(
            Constraint::Enum(vec![]).check(DataKind::String).unwrap_err().kind(),
            ErrorKind::Missing
        );
        assert!(Constraint::Pattern("^[a-z]+$".into()).check(DataKind::String).is_ok());
    }

    #[test]
    fn test_merge_constraints() {
        let inherited = vec![Constraint::MinLen(1), Constraint::MaxLen(100)];
        let own = vec![Constraint::MaxLen(10)];
        let merged = merge_constraints(&inherited, &own);
        assert_eq!(merged, vec![Constraint::MinLen(1), Constraint::MaxLen(10)]);
    }

    #[test]
    fn test_constraint_conflicts() {
        assert!(constraint_conflicts(&[Constraint::MinLen(1), Constraint::MaxLen(10)]).is_empty());
        assert_eq!(
            constraint_conflicts(&[Constraint::MinLen(10), Constraint::MaxLen(1)]).len(),
            1
        );
        assert_eq!(
            constraint_conflicts(&[Constraint::MinIncl(1.0), Constraint::MaxExcl(1.0)]).len(),
            1
        );
        assert!(constraint_conflicts(&[Constraint::MinIncl(1.0), Constraint::MaxIncl(1.0)]).is_empty());
        assert_eq!(
            constraint_conflicts(&[Constraint::MinIncl(1.0), Constraint::MinExcl(0.0)]).len(),
            1
        );
    }
}
