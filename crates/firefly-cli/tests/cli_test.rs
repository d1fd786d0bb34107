//! Source discovery and directory compilation

use firefly_cli::{compile_dir, discover_units, load_config};
use firefly_codegen::decode_image;
use firefly_compiler::{CompilerConfig, RecoveryStrategy};
use firefly_test_fixtures::{FixtureType, TestFixtures};
use pretty_assertions::assert_eq;

#[test]
fn test_discover_hello_world() {
    let mut fixtures = TestFixtures::new();
    let root = fixtures.setup(FixtureType::HelloWorld);

    let units: Vec<_> = discover_units(&root).into_iter().map(Result::unwrap).collect();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].file_name, "Hello.firefly");
    assert_eq!(units[0].relative_path, "");
    assert_eq!(units[0].qualified_name(), "Hello");
}

#[test]
fn test_discover_packages_skips_other_files() {
    let mut fixtures = TestFixtures::new();
    let root = fixtures.setup(FixtureType::Packages);

    let names: Vec<String> = discover_units(&root)
        .into_iter()
        .map(|unit| unit.unwrap().qualified_name())
        .collect();
    assert_eq!(names, vec!["app.Main", "app.model.Person"]);
}

#[test]
fn test_discovered_units_read_lazily() {
    let mut fixtures = TestFixtures::new();
    let root = fixtures.setup(FixtureType::HelloWorld);

    let unit = discover_units(&root).remove(0).unwrap();
    std::fs::write(root.join("Hello.firefly"), "fn changed() {}\n").unwrap();
    assert_eq!(unit.read_content().unwrap(), "fn changed() {}\n");
}

#[test]
fn test_load_config() {
    let mut fixtures = TestFixtures::new();
    let root = fixtures.setup(FixtureType::HelloWorld);
    assert_eq!(load_config(&root, None).unwrap(), CompilerConfig::default());

    std::fs::write(root.join("firefly.toml"), "input_errors = \"continue\"\n").unwrap();
    assert_eq!(
        load_config(&root, None).unwrap().input_errors,
        RecoveryStrategy::Continue
    );

    assert!(load_config(&root, Some(root.join("missing.toml").as_path())).is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_compile_packages() {
    let mut fixtures = TestFixtures::new();
    let root = fixtures.setup(FixtureType::Packages);
    let out = tempfile::tempdir().unwrap();

    let outcome = compile_dir(&root, out.path(), CompilerConfig::default())
        .await
        .unwrap();

    assert!(outcome.summary.is_clean());
    assert_eq!(outcome.compiled, 2);

    let main = std::fs::read(out.path().join("app/Main.ffc")).unwrap();
    assert_eq!(decode_image(&main).unwrap().declaration.qualified_name, "app.Main");
    assert!(out.path().join("app/model/Person.ffc").is_file());
}

#[tokio::test]
async fn test_compile_reports_errors() {
    let mut fixtures = TestFixtures::new();
    let root = fixtures.setup(FixtureType::WithErrors);
    let out = tempfile::tempdir().unwrap();

    let outcome = compile_dir(&root, out.path(), CompilerConfig::default())
        .await
        .unwrap();

    assert_eq!(outcome.compiled, 2);
    assert_eq!(outcome.summary.unit_errors.len(), 1);
    assert_eq!(outcome.summary.unit_errors[0].unit.file_name, "Bad.firefly");
    assert!(!outcome.summary.is_clean());
}
