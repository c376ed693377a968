//! Workspaces and the graph they form.
//!
//! Ancestor and "uses" edges are stored by name. The closure algorithms in
//! [`WorkspaceGraph`] run against any store able to look a workspace up by
//! name; the frozen catalog caches their results.

use crate::qname::QName;
use serde::Serialize;
use std::collections::BTreeSet;

/// Body of a workspace type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Workspace {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ancestors: Vec<QName>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    used: Vec<QName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    descriptor: Option<QName>,
    #[serde(skip)]
    local: BTreeSet<QName>,
}

impl Workspace {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Ancestors set with `set_ancestors`, empty if none were.
    pub fn explicit_ancestors(&self) -> &[QName] {
        &self.ancestors
    }

    /// Directly used workspaces, in declaration order.
    pub fn used_workspaces(&self) -> &[QName] {
        &self.used
    }

    /// Descriptor document name.
    pub fn descriptor(&self) -> Option<&QName> {
        self.descriptor.as_ref()
    }

    /// Names declared in this workspace, sorted. Includes the workspace itself.
    pub fn local_types(&self) -> impl Iterator<Item = &QName> {
        self.local.iter()
    }

    /// Returns true if `name` is declared in this workspace.
    pub fn has_local(&self, name: &QName) -> bool {
        self.local.contains(name)
    }

    pub(crate) fn set_ancestors(&mut self, ancestors: Vec<QName>) {
        self.ancestors = ancestors;
    }

    pub(crate) fn add_used(&mut self, name: QName) {
        if !self.used.contains(&name) {
            self.used.push(name);
        }
    }

    pub(crate) fn set_descriptor(&mut self, descriptor: QName) {
        self.descriptor = Some(descriptor);
    }

    pub(crate) fn add_local(&mut self, name: QName) {
        self.local.insert(name);
    }
}

/// Direct ancestors of `name`: the explicit ones, or the system workspace.
pub(crate) fn effective_ancestors(name: &QName, ws: &Workspace) -> Vec<QName> {
    if !ws.ancestors.is_empty() {
        ws.ancestors.clone()
    } else if *name == QName::sys_workspace() {
        Vec::new()
    } else {
        vec![QName::sys_workspace()]
    }
}

/// Graph queries over workspaces addressed by name.
pub(crate) trait WorkspaceGraph {
    /// Look a workspace body up by name.
    fn workspace_body(&self, name: &QName) -> Option<&Workspace>;

    /// `start` plus every transitive ancestor.
    fn ancestor_closure(&self, start: &QName) -> BTreeSet<QName> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![start.clone()];
        while let Some(name) = stack.pop() {
            if seen.contains(&name) {
                continue;
            }
            if let Some(ws) = self.workspace_body(&name) {
                stack.extend(effective_ancestors(&name, ws));
            }
            seen.insert(name);
        }
        seen
    }

    /// True if `other` is `ws` or one of its transitive ancestors.
    #[cfg(test)]
    fn inherits(&self, ws: &QName, other: &QName) -> bool {
        ws == other || self.ancestor_closure(ws).contains(other)
    }

    /// Local types of `ws` and of all its ancestors.
    fn inherited_types(&self, ws: &QName) -> BTreeSet<QName> {
        let mut types = BTreeSet::new();
        for name in self.ancestor_closure(ws) {
            if let Some(body) = self.workspace_body(&name) {
                types.extend(body.local.iter().cloned());
            }
        }
        types
    }

    /// Every type visible from `ws`.
    ///
    /// Used workspaces contribute what they declare and inherit, not what
    /// they use in turn.
    fn visible_types(&self, ws: &QName) -> BTreeSet<QName> {
        let mut types = self.inherited_types(ws);
        if let Some(body) = self.workspace_body(ws) {
            for used in &body.used {
                types.extend(self.inherited_types(used));
            }
        }
        types
    }

    /// True if `name` is visible from `ws`.
    fn is_visible(&self, ws: &QName, name: &QName) -> bool {
        let declared_in = |w: &QName| {
            self.workspace_body(w)
                .map(|body| body.has_local(name))
                .unwrap_or(false)
        };
        if self.ancestor_closure(ws).iter().any(declared_in) {
            return true;
        }
        match self.workspace_body(ws) {
            Some(body) => body
                .used
                .iter()
                .any(|used| self.ancestor_closure(used).iter().any(declared_in)),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct Graph(BTreeMap<QName, Workspace>);

    impl Graph {
        fn add(&mut self, name: &str, ancestors: &[&str], local: &[&str]) {
            let mut ws = Workspace::new();
            ws.set_ancestors(ancestors.iter().map(|a| QName::new("test", *a)).collect());
            ws.add_local(QName::new("test", name));
            for l in local {
                ws.add_local(QName::new("test", *l));
            }
            self.0.insert(QName::new("test", name), ws);
        }
    }

    impl WorkspaceGraph for Graph {
        fn workspace_body(&self, name: &QName) -> Option<&Workspace> {
            self.0.get(name)
        }
    }

    fn q(s: &str) -> QName {
        QName::new("test", s)
    }

    fn graph() -> Graph {
        let mut g = Graph::default();
        let mut sys = Workspace::new();
        sys.add_local(QName::sys_workspace());
        sys.add_local(QName::sys("int64"));
        g.0.insert(QName::sys_workspace(), sys);

        g.add("base", &[], &["baseDoc"]);
        g.add("mid", &["base"], &["midDoc"]);
        g.add("leaf", &["mid"], &["leafDoc"]);
        g.add("lib", &[], &["libDoc"]);
        g
    }

    #[test]
    fn test_effective_ancestors() {
        let ws = Workspace::new();
        assert_eq!(effective_ancestors(&q("x"), &ws), vec![QName::sys_workspace()]);
        assert!(effective_ancestors(&QName::sys_workspace(), &ws).is_empty());
    }

    #[test]
    fn test_closure_and_inherits() {
        let g = graph();
        let closure = g.ancestor_closure(&q("leaf"));
        assert!(closure.contains(&q("leaf")));
        assert!(closure.contains(&q("mid")));
        assert!(closure.contains(&q("base")));
        assert!(closure.contains(&QName::sys_workspace()));
        assert!(!closure.contains(&q("lib")));

        assert!(g.inherits(&q("leaf"), &q("base")));
        assert!(g.inherits(&q("leaf"), &q("leaf")));
        assert!(g.inherits(&q("lib"), &QName::sys_workspace()));
        assert!(!g.inherits(&q("base"), &q("leaf")));
    }

    #[test]
    fn test_visible_types() {
        let mut g = graph();
        g.0.get_mut(&q("leaf")).unwrap().add_used(q("lib"));
        // what lib uses must not leak into leaf
        g.add("other", &[], &["otherDoc"]);
        g.0.get_mut(&q("lib")).unwrap().add_used(q("other"));

        let visible = g.visible_types(&q("leaf"));
        for name in ["leafDoc", "midDoc", "baseDoc", "libDoc", "lib"] {
            assert!(visible.contains(&q(name)), "{name}");
        }
        assert!(visible.contains(&QName::sys("int64")));
        assert!(!visible.contains(&q("otherDoc")));

        assert!(g.is_visible(&q("leaf"), &q("libDoc")));
        assert!(g.is_visible(&q("leaf"), &q("baseDoc")));
        assert!(!g.is_visible(&q("leaf"), &q("otherDoc")));
        assert!(!g.is_visible(&q("base"), &q("leafDoc")));
    }

    #[test]
    fn test_closure_tolerates_cycles() {
        let mut g = graph();
        g.0.get_mut(&q("base")).unwrap().set_ancestors(vec![q("leaf")]);
        let closure = g.ancestor_closure(&q("leaf"));
        assert_eq!(closure.len(), 3);
    }
}
