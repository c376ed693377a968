//! Package local name to package path bijection.

use super::{validate_ident, FullQName, QName, SYS_PACKAGE, SYS_PACKAGE_PATH};
use crate::error::{DefinitionError, DefinitionResult};
use std::collections::BTreeMap;

/// Registered packages.
///
/// Both directions are kept in sync; a binding is never renamed once made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packages {
    by_local: BTreeMap<String, String>,
    by_path: BTreeMap<String, String>,
}

impl Packages {
    /// Create an empty package set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Package set holding only the system package.
    pub(crate) fn with_sys() -> Self {
        let mut packages = Self::new();
        packages
            .by_local
            .insert(SYS_PACKAGE.to_string(), SYS_PACKAGE_PATH.to_string());
        packages
            .by_path
            .insert(SYS_PACKAGE_PATH.to_string(), SYS_PACKAGE.to_string());
        packages
    }

    /// Bind `local` to `path`.
    ///
    /// Binding the identical pair again is a no-op.
    pub fn add(&mut self, local: &str, path: &str, max_ident_len: usize) -> DefinitionResult<()> {
        validate_ident(local, max_ident_len)?;
        if path.is_empty() {
            return Err(DefinitionError::Missing(format!("path of package «{local}»")));
        }
        if let Some(bound) = self.by_local.get(local) {
            if bound == path {
                return Ok(());
            }
            return Err(DefinitionError::AlreadyExists(format!(
                "package «{local}» bound to path «{bound}»"
            )));
        }
        if let Some(bound) = self.by_path.get(path) {
            return Err(DefinitionError::AlreadyExists(format!(
                "package path «{path}» bound to local name «{bound}»"
            )));
        }
        self.by_local.insert(local.to_string(), path.to_string());
        self.by_path.insert(path.to_string(), local.to_string());
        Ok(())
    }

    /// Path bound to a local name.
    pub fn path_by_local(&self, local: &str) -> Option<&str> {
        self.by_local.get(local).map(String::as_str)
    }

    /// Local name bound to a path.
    pub fn local_by_path(&self, path: &str) -> Option<&str> {
        self.by_path.get(path).map(String::as_str)
    }

    /// Convert a qualified name to its path-qualified form.
    ///
    /// Returns [`FullQName::NULL`] if the package is unknown.
    pub fn full_qname(&self, name: &QName) -> FullQName {
        match self.path_by_local(name.pkg()) {
            Some(path) => FullQName::new(path, name.entity()),
            None => FullQName::NULL,
        }
    }

    /// Convert a path-qualified name back to its local form.
    ///
    /// Returns [`QName::NULL`] if the path is unknown.
    pub fn local_qname(&self, name: &FullQName) -> QName {
        match self.local_by_path(name.path()) {
            Some(local) => QName::new(local, name.entity()),
            None => QName::NULL,
        }
    }

    /// Iterate `(local name, path)` pairs ordered by local name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_local.iter().map(|(l, p)| (l.as_str(), p.as_str()))
    }

    /// Number of registered packages.
    pub fn len(&self) -> usize {
        self.by_local.len()
    }

    /// Returns true if no package is registered.
    pub fn is_empty(&self) -> bool {
        self.by_local.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_add_and_resolve() {
        let mut packages = Packages::new();
        packages.add("test", "example.com/test", 255).unwrap();

        let name = QName::new("test", "doc");
        let full = packages.full_qname(&name);
        assert_eq!(full, FullQName::new("example.com/test", "doc"));
        assert_eq!(packages.local_qname(&full), name);
    }

    #[test]
    fn test_unknown_yields_null() {
        let packages = Packages::new();
        assert!(packages.full_qname(&QName::new("unknown", "doc")).is_null());
        assert!(packages
            .local_qname(&FullQName::new("example.com/unknown", "doc"))
            .is_null());
        assert!(packages.full_qname(&QName::NULL).is_null());
    }

    #[test]
    fn test_bijection_conflicts() {
        let mut packages = Packages::new();
        packages.add("test", "example.com/test", 255).unwrap();

        // identical pair is accepted again
        packages.add("test", "example.com/test", 255).unwrap();
        assert_eq!(packages.len(), 1);

        let err = packages.add("test", "example.com/other", 255).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        let err = packages.add("other", "example.com/test", 255).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        assert_eq!(packages.path_by_local("other"), None);
        assert_eq!(packages.local_by_path("example.com/other"), None);
    }

    #[test]
    fn test_sys_package() {
        let packages = Packages::with_sys();
        assert_eq!(packages.path_by_local(SYS_PACKAGE), Some(SYS_PACKAGE_PATH));
        let full = packages.full_qname(&QName::sys_workspace());
        assert_eq!(full.path(), SYS_PACKAGE_PATH);
        assert_eq!(packages.local_qname(&full), QName::sys_workspace());
    }

    #[test]
    fn test_invalid_input() {
        let mut packages = Packages::new();
        assert_eq!(
            packages.add("1bad", "example.com/bad", 255).unwrap_err().kind(),
            ErrorKind::InvalidName
        );
        assert_eq!(
            packages.add("empty", "", 255).unwrap_err().kind(),
            ErrorKind::Missing
        );
        assert!(packages.is_empty());
    }
}
