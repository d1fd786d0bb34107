//! Compilation units and the values the pipeline produces for them
//!
//! A [`CompilationUnit`] is one source file waiting to be compiled. Parsing it
//! yields exactly one [`DeclaredUnit`], and generating code for that yields
//! exactly one [`CompiledUnit`].

use std::fmt;
use std::io;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::declaration::TypeDeclaration;

/// The construct a unit declares at its top level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    Object,
    Class,
    Interface,
    Rule,
    Unit,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Object => write!(f, "object"),
            UnitKind::Class => write!(f, "class"),
            UnitKind::Interface => write!(f, "interface"),
            UnitKind::Rule => write!(f, "rule"),
            UnitKind::Unit => write!(f, "unit"),
        }
    }
}

/// Re-invokable factory for the text of a unit
pub type ContentProducer = Arc<dyn Fn() -> io::Result<String> + Send + Sync>;

/// One source file submitted for compilation
#[derive(Clone)]
pub struct CompilationUnit {
    /// File name including its extension (e.g. `Greeter.firefly`)
    pub file_name: String,
    /// Slash-separated directory of the file, relative to the source root
    pub relative_path: String,
    /// The construct this unit declares
    pub kind: UnitKind,
    content: ContentProducer,
}

impl CompilationUnit {
    pub fn new<F>(
        file_name: impl Into<String>,
        relative_path: impl Into<String>,
        kind: UnitKind,
        content: F,
    ) -> Self
    where
        F: Fn() -> io::Result<String> + Send + Sync + 'static,
    {
        Self {
            file_name: file_name.into(),
            relative_path: relative_path.into(),
            kind,
            content: Arc::new(content),
        }
    }

    /// Create a unit whose content is held in memory
    pub fn from_source(
        file_name: impl Into<String>,
        relative_path: impl Into<String>,
        kind: UnitKind,
        source: impl Into<String>,
    ) -> Self {
        let source: Arc<str> = Arc::from(source.into());
        Self::new(file_name, relative_path, kind, move || Ok(source.to_string()))
    }

    /// Produce a fresh copy of the unit's text
    pub fn read_content(&self) -> io::Result<String> {
        (self.content)()
    }

    /// File name without its extension
    pub fn unit_name(&self) -> &str {
        match self.file_name.rfind('.') {
            Some(idx) if idx > 0 => &self.file_name[..idx],
            _ => &self.file_name,
        }
    }

    /// Dotted name of the unit: `relative.path.UnitName`
    pub fn qualified_name(&self) -> String {
        let package = self.package_name();
        if package.is_empty() {
            self.unit_name().to_string()
        } else {
            format!("{}.{}", package, self.unit_name())
        }
    }

    /// The relative path with slashes replaced by dots
    pub fn package_name(&self) -> String {
        self.relative_path
            .trim()
            .trim_matches('/')
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Path used in diagnostics: `relative/path/File.firefly`
    pub fn display_path(&self) -> String {
        let dir = self.relative_path.trim().trim_matches('/');
        if dir.is_empty() {
            self.file_name.clone()
        } else {
            format!("{}/{}", dir, self.file_name)
        }
    }
}

impl fmt::Debug for CompilationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilationUnit")
            .field("file_name", &self.file_name)
            .field("relative_path", &self.relative_path)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// A unit whose declaration tree has been fully translated
#[derive(Debug, Clone)]
pub struct DeclaredUnit {
    pub unit: Arc<CompilationUnit>,
    pub declaration: TypeDeclaration,
}

/// Binary output of the backend for one declared type
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Slash-separated output name (e.g. `io/github/Greeter.ffc`)
    pub name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Terminal pipeline output, one per successfully compiled unit
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    pub declared: DeclaredUnit,
    pub artifacts: Vec<Artifact>,
}

impl CompiledUnit {
    pub fn unit(&self) -> &CompilationUnit {
        &self.declared.unit
    }

    pub fn declaration(&self) -> &TypeDeclaration {
        &self.declared.declaration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(file_name: &str, path: &str) -> CompilationUnit {
        CompilationUnit::from_source(file_name, path, UnitKind::Unit, "")
    }

    #[test]
    fn test_qualified_name_with_package() {
        let unit = unit("Printer.firefly", "io/github/fireflylang");
        assert_eq!(unit.unit_name(), "Printer");
        assert_eq!(unit.qualified_name(), "io.github.fireflylang.Printer");
        assert_eq!(unit.display_path(), "io/github/fireflylang/Printer.firefly");
    }

    #[test]
    fn test_qualified_name_without_package() {
        assert_eq!(unit("Main.firefly", "").qualified_name(), "Main");
        assert_eq!(unit("Main.firefly", "   ").qualified_name(), "Main");
        assert_eq!(unit("Main.firefly", "/app/").qualified_name(), "app.Main");
    }

    #[test]
    fn test_unit_name_without_extension() {
        assert_eq!(unit("Makefile", "").unit_name(), "Makefile");
        assert_eq!(unit(".hidden", "").unit_name(), ".hidden");
    }

    #[test]
    fn test_content_is_reinvokable() {
        let unit = unit("A.firefly", "");
        let source = CompilationUnit::from_source("A.firefly", "", UnitKind::Unit, "fn a() {}");
        assert_eq!(source.read_content().unwrap(), "fn a() {}");
        assert_eq!(source.read_content().unwrap(), "fn a() {}");
        assert_eq!(unit.read_content().unwrap(), "");
    }
}
