//! Test fixtures for Firefly compiler testing
//!
//! Provides small source snippets as in-memory units, and source trees on disk
//! for the command line tests.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use firefly_core::unit::{CompilationUnit, UnitKind};

pub const HELLO_WORLD: &str = r#"fn hello() {
    println("Hello world")
}
"#;

pub const SIMPLE_FN: &str = r#"fn greet(name: String) {
    println(name)
}

greet("firefly")
"#;

pub const SIMPLE_FN_WITH_DEFAULT: &str = r#"fn greet(name: String, punctuation: String = "!") {
    print(name, punctuation)
}

greet("firefly")
"#;

pub const EPRINTLN: &str = r#"eprintln("Something went wrong")
"#;

pub const EPRINTLN_TWICE: &str = r#"fn warn(message: String) {
    eprintln(message)
    eprintln(message)
}
"#;

pub const NULL_ARGUMENT: &str = r#"fn hello() {
    println("Hello world")
}

fn broken() {
    println(null)
}
"#;

pub const MULTI_ARG_PRINTLN: &str = r#"fn show(a: String, b: Int) {
    println(a, b)
}
"#;

pub const UNKNOWN_NAMES: &str = r#"fn show(shape: Shape) {
    println(missing)
    undefined(1)
}
"#;

pub const SYNTAX_ERROR: &str = "fn broken( {";

/// Unit of kind `Unit` with its content held in memory
pub fn unit(file_name: &str, relative_path: &str, source: &str) -> CompilationUnit {
    CompilationUnit::from_source(file_name, relative_path, UnitKind::Unit, source)
}

pub fn shared_unit(file_name: &str, relative_path: &str, source: &str) -> Arc<CompilationUnit> {
    Arc::new(unit(file_name, relative_path, source))
}

/// Unit whose content can never be read
pub fn unreadable_unit(file_name: &str, relative_path: &str) -> CompilationUnit {
    CompilationUnit::new(file_name, relative_path, UnitKind::Unit, || {
        Err(io::Error::new(io::ErrorKind::NotFound, "fixture content is missing"))
    })
}

/// Unit that counts how often its content was produced
pub fn counting_unit(file_name: &str, source: &'static str) -> (CompilationUnit, Arc<AtomicUsize>) {
    let reads = Arc::new(AtomicUsize::new(0));
    let counter = reads.clone();
    let unit = CompilationUnit::new(file_name, "", UnitKind::Unit, move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(source.to_string())
    });
    (unit, reads)
}

/// Units that reference each other: `app/Main` uses `app.model.Person`,
/// declared by a unit listed after it.
pub fn forward_reference_units() -> Vec<CompilationUnit> {
    vec![
        unit(
            "Main.firefly",
            "app",
            "import app.model.Person\n\nfn welcome(person: Person) {\n    println(\"welcome\")\n}\n",
        ),
        unit("Person.firefly", "app/model", "fn describe() {\n    println(\"person\")\n}\n"),
    ]
}

/// `count` independent units named `Unit0` .. `Unit{count-1}`
pub fn independent_units(count: usize) -> Vec<CompilationUnit> {
    (0..count)
        .map(|i| {
            unit(
                &format!("Unit{}.firefly", i),
                "gen",
                &format!("fn run{}() {{\n    println(\"unit {}\")\n}}\n", i, i),
            )
        })
        .collect()
}

/// Source tree categories
pub enum FixtureType {
    /// One hello world unit at the root
    HelloWorld,
    /// Two packages referring to each other
    Packages,
    /// A valid unit next to one with semantic errors
    WithErrors,
}

/// Writes source trees into a temporary directory
pub struct TestFixtures {
    temp_dir: Option<tempfile::TempDir>,
}

impl Default for TestFixtures {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixtures {
    pub fn new() -> Self {
        Self { temp_dir: None }
    }

    /// Create a temporary source tree and return its root
    pub fn setup(&mut self, fixture_type: FixtureType) -> PathBuf {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();

        match fixture_type {
            FixtureType::HelloWorld => write(&path, "Hello.firefly", HELLO_WORLD),
            FixtureType::Packages => {
                write(&path, "app/Main.firefly", "import app.model.Person\n\nfn welcome(person: Person) {\n    println(\"welcome\")\n}\n");
                write(&path, "app/model/Person.firefly", "fn describe() {\n    println(\"person\")\n}\n");
                write(&path, "app/model/README.md", "not a unit");
            }
            FixtureType::WithErrors => {
                write(&path, "Good.firefly", HELLO_WORLD);
                write(&path, "Bad.firefly", NULL_ARGUMENT);
            }
        }

        self.temp_dir = Some(dir);
        path
    }
}

fn write(base: &Path, relative: &str, content: &str) {
    let path = base.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}
