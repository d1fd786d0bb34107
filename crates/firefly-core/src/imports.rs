//! Import declarations of a unit
//!
//! Firefly imports come in three shapes:
//!
//! ```text
//! import firefly.Std[String, Int]   // names from a namespace
//! import firefly.shapes.Circle      // a single unit
//! import firefly.shapes as shapes   // a package, under an alias
//! ```
//!
//! A namespace is defined by a file, a unit lives inside a namespace, and a
//! package is a directory relative to the source root. The parser cannot tell
//! a package path from a unit path, so both carry an alias the same way:
//! `shapes.Circle` expands to `firefly.shapes.Circle`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportKind {
    Namespace,
    Unit,
    Package,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub path: String,
    pub names: Vec<String>,
    pub alias: Option<String>,
    pub kind: ImportKind,
}

impl Import {
    pub fn namespace(path: impl Into<String>, names: &[&str]) -> Self {
        Self {
            path: path.into(),
            names: names.iter().map(|n| n.to_string()).collect(),
            alias: None,
            kind: ImportKind::Namespace,
        }
    }

    pub fn unit(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            names: Vec::new(),
            alias: None,
            kind: ImportKind::Unit,
        }
    }

    /// Name the imported unit is visible under
    fn visible_name(&self) -> &str {
        self.alias
            .as_deref()
            .unwrap_or_else(|| self.path.rsplit('.').next().unwrap_or(&self.path))
    }

    /// Qualified name this import provides for `name`, if any
    pub fn provides(&self, name: &str) -> Option<String> {
        match self.kind {
            ImportKind::Namespace => self
                .names
                .iter()
                .any(|n| n == name)
                .then(|| format!("{}.{}", self.path, name)),
            ImportKind::Unit => (self.visible_name() == name).then(|| self.path.clone()),
            ImportKind::Package => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Imports {
    pub list: Vec<Import>,
}

impl Imports {
    pub fn new(list: Vec<Import>) -> Self {
        Self { list }
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Import> {
        self.list.iter()
    }

    /// Qualified candidates for a simple name, in import order
    ///
    /// A dotted name is already qualified and is returned as-is, unless its
    /// first segment is the alias of a unit or package import: `alias.Name`
    /// then becomes `path.Name`.
    pub fn candidates(&self, name: &str) -> Vec<String> {
        if let Some((head, rest)) = name.split_once('.') {
            let aliased = self.list.iter().find(|import| {
                matches!(import.kind, ImportKind::Unit | ImportKind::Package)
                    && import.alias.as_deref() == Some(head)
            });
            return match aliased {
                Some(import) => vec![format!("{}.{}", import.path, rest)],
                None => vec![name.to_string()],
            };
        }

        self.list
            .iter()
            .filter_map(|import| import.provides(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_candidates() {
        let imports = Imports::new(vec![
            Import::namespace("firefly.Std", &["String", "Int"]),
            Import::unit("app.model.Person"),
        ]);

        assert_eq!(imports.candidates("Int"), vec!["firefly.Std.Int"]);
        assert_eq!(imports.candidates("Person"), vec!["app.model.Person"]);
        assert!(imports.candidates("Missing").is_empty());
    }

    #[test]
    fn test_aliases() {
        let imports = Imports::new(vec![
            Import {
                path: "app.model.Person".to_string(),
                names: vec![],
                alias: Some("P".to_string()),
                kind: ImportKind::Unit,
            },
            Import {
                path: "app.shapes".to_string(),
                names: vec![],
                alias: Some("shapes".to_string()),
                kind: ImportKind::Package,
            },
        ]);

        assert_eq!(imports.candidates("P"), vec!["app.model.Person"]);
        assert!(imports.candidates("Person").is_empty());
        assert_eq!(imports.candidates("shapes.Circle"), vec!["app.shapes.Circle"]);
        assert_eq!(imports.candidates("other.Circle"), vec!["other.Circle"]);
    }

    #[test]
    fn test_aliased_unit_import_qualifies_names() {
        let imports = Imports::new(vec![Import {
            path: "app.shapes".to_string(),
            names: vec![],
            alias: Some("shapes".to_string()),
            kind: ImportKind::Unit,
        }]);

        assert_eq!(imports.candidates("shapes.Circle"), vec!["app.shapes.Circle"]);
        assert_eq!(imports.candidates("shapes.round.Circle"), vec!["app.shapes.round.Circle"]);
        assert_eq!(imports.candidates("app.shapes.Circle"), vec!["app.shapes.Circle"]);
    }
}
