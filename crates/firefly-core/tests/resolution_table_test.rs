//! Concurrency behaviour of the resolution tables

use std::time::Duration;

use firefly_core::declaration::{MethodDeclaration, Parameter, TypeDeclaration};
use firefly_core::error::ResolutionError;
use firefly_core::ir::TypeRef;
use firefly_core::resolution::{MethodSignature, ResolutionTable, ResolutionTables, TypeSignature};
use firefly_core::unit::UnitKind;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn method(name: &str, arity: usize, marker: TypeRef) -> MethodDeclaration {
    let parameters = (0..arity)
        .map(|i| Parameter::new(format!("p{}", i), TypeRef::Dynamic))
        .collect();
    MethodDeclaration::new(name, parameters, marker)
}

/// Wait until `count` lookups are subscribed and waiting
async fn wait_for_pending<T>(table: &ResolutionTable<T>, count: usize)
where
    T: firefly_core::Named + Clone + Send + Sync + 'static,
{
    for _ in 0..500 {
        if table.pending_lookups().await.unwrap() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("lookups never started waiting");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_lookup_before_register_resolves() {
    let table: ResolutionTable<MethodDeclaration> = ResolutionTable::new("method");

    let waiting = {
        let table = table.clone();
        tokio::spawn(async move { table.lookup("app.Main", MethodSignature::new("greet", 1)).await })
    };
    wait_for_pending(&table, 1).await;

    table
        .register("app.Main", method("greet", 1, TypeRef::Void))
        .await
        .unwrap();

    let found = waiting.await.unwrap().unwrap();
    assert_eq!(found.map(|m| m.name), Some("greet".to_string()));
}

#[tokio::test]
async fn test_lookup_after_register_is_immediate() {
    let table: ResolutionTable<TypeDeclaration> = ResolutionTable::new("type");
    table
        .register("app.Person", TypeDeclaration::new("app.Person", UnitKind::Unit))
        .await
        .unwrap();

    let found = table
        .lookup("app.Person", TypeSignature::new("app.Person"))
        .await
        .unwrap();
    assert_eq!(found.map(|t| t.qualified_name), Some("app.Person".to_string()));
}

#[tokio::test]
async fn test_first_registration_wins() {
    let table: ResolutionTable<MethodDeclaration> = ResolutionTable::new("method");
    table
        .register("app.Main", method("greet", 1, TypeRef::Int))
        .await
        .unwrap();
    table
        .register("app.Main", method("greet", 1, TypeRef::String))
        .await
        .unwrap();

    let found = table
        .lookup("app.Main", MethodSignature::new("greet", 1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.return_type, TypeRef::Int);

    let all = table.declarations_named("app.Main", "greet").await.unwrap();
    assert_eq!(
        all.iter().map(|m| m.return_type.clone()).collect::<Vec<_>>(),
        vec![TypeRef::Int, TypeRef::String]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_end_resolution_settles_waiting_lookups() {
    let table: ResolutionTable<MethodDeclaration> = ResolutionTable::new("method");

    let waiting: Vec<_> = (0..3)
        .map(|i| {
            let table = table.clone();
            tokio::spawn(async move {
                table
                    .lookup("app.Main", MethodSignature::new(format!("missing{}", i), 0))
                    .await
            })
        })
        .collect();
    wait_for_pending(&table, 3).await;

    assert!(table.end_resolution().await.unwrap());
    for handle in waiting {
        assert_eq!(handle.await.unwrap(), Ok(None));
    }

    // Once ended, lookups answer without waiting.
    let missing = tokio::time::timeout(
        Duration::from_secs(1),
        table.lookup("app.Main", MethodSignature::new("other", 0)),
    )
    .await
    .expect("lookup after end must not wait");
    assert_eq!(missing, Ok(None));
}

#[tokio::test]
async fn test_end_resolution_is_idempotent() {
    let table: ResolutionTable<TypeDeclaration> = ResolutionTable::new("type");
    table
        .register("app.A", TypeDeclaration::new("app.A", UnitKind::Unit))
        .await
        .unwrap();

    assert!(table.end_resolution().await.unwrap());
    let first = table.snapshot().await.unwrap();
    assert!(!table.end_resolution().await.unwrap());
    let second = table.snapshot().await.unwrap();

    assert_eq!(first, second);
    assert!(table
        .lookup("app.A", TypeSignature::new("app.A"))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_register_after_end_is_rejected() {
    let table: ResolutionTable<MethodDeclaration> = ResolutionTable::new("method");
    table
        .register("app.Main", method("kept", 0, TypeRef::Void))
        .await
        .unwrap();
    table.end_resolution().await.unwrap();

    let rejected = table
        .register("app.Main", method("late", 0, TypeRef::Void))
        .await;
    assert_eq!(
        rejected,
        Err(ResolutionError::RegistrationClosed {
            owner: "app.Main".to_string(),
            name: "late".to_string(),
        })
    );

    assert!(table
        .lookup("app.Main", MethodSignature::new("late", 0))
        .await
        .unwrap()
        .is_none());
    assert!(table
        .lookup("app.Main", MethodSignature::new("kept", 0))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_snapshot_is_empty_before_end() {
    let table: ResolutionTable<MethodDeclaration> = ResolutionTable::new("method");
    table
        .register("app.Main", method("greet", 0, TypeRef::Void))
        .await
        .unwrap();

    assert!(table.snapshot().await.unwrap().is_empty());
    assert!(table.contains_owner("app.Main").await.unwrap());
    assert!(!table.contains_owner("app.Other").await.unwrap());

    table.end_resolution().await.unwrap();
    let snapshot = table.snapshot().await.unwrap();
    assert_eq!(snapshot["app.Main"]["greet"].len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lookups_are_isolated() {
    let table: ResolutionTable<MethodDeclaration> = ResolutionTable::new("method");

    let lookups: Vec<_> = ["alpha", "beta", "gamma"]
        .into_iter()
        .map(|name| {
            let table = table.clone();
            tokio::spawn(async move {
                let found = table.lookup("app.Main", MethodSignature::new(name, 0)).await;
                (name, found)
            })
        })
        .collect();
    wait_for_pending(&table, 3).await;

    // Same names under another owner and other arities must not satisfy anything.
    table
        .register("app.Other", method("alpha", 0, TypeRef::Void))
        .await
        .unwrap();
    table
        .register("app.Main", method("beta", 2, TypeRef::Void))
        .await
        .unwrap();
    for name in ["gamma", "beta", "alpha"] {
        table
            .register("app.Main", method(name, 0, TypeRef::Void))
            .await
            .unwrap();
    }

    for handle in lookups {
        let (name, found) = handle.await.unwrap();
        let found = found.unwrap().unwrap();
        assert_eq!(found.name, name);
        assert_eq!(found.parameters.len(), 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_lagging_lookup_still_resolves() {
    // A buffer of one event forces a waiting lookup to fall behind.
    let table: ResolutionTable<MethodDeclaration> = ResolutionTable::with_capacity("method", 1);

    let waiting = {
        let table = table.clone();
        tokio::spawn(async move { table.lookup("app.Main", MethodSignature::new("target", 0)).await })
    };
    wait_for_pending(&table, 1).await;

    for i in 0..50 {
        table
            .register("app.Main", method(&format!("noise{}", i), 0, TypeRef::Void))
            .await
            .unwrap();
    }
    table
        .register("app.Main", method("target", 0, TypeRef::Void))
        .await
        .unwrap();
    for i in 50..100 {
        table
            .register("app.Main", method(&format!("noise{}", i), 0, TypeRef::Void))
            .await
            .unwrap();
    }

    let found = tokio::time::timeout(Duration::from_secs(5), waiting)
        .await
        .expect("lagging lookup must not miss its registration")
        .unwrap()
        .unwrap();
    assert_eq!(found.map(|m| m.name), Some("target".to_string()));
}

#[tokio::test]
async fn test_tables_end_together() {
    let tables = ResolutionTables::new();
    tables.end_resolution().await.unwrap();

    assert!(!tables.types.end_resolution().await.unwrap());
    assert!(!tables.methods.end_resolution().await.unwrap());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Whatever the registration order, a lookup issued before any of it
    /// resolves to the first matching registration, and a signature nothing
    /// matches resolves to not-found once resolution ends.
    #[test]
    fn prop_lookup_resolves_first_match(
        arities in proptest::collection::vec(0usize..3, 1..12),
        wanted in 0usize..4,
    ) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let (found, expected) = runtime.block_on(async {
            let table: ResolutionTable<MethodDeclaration> = ResolutionTable::new("method");
            let waiting = {
                let table = table.clone();
                tokio::spawn(async move {
                    table.lookup("app.Main", MethodSignature::new("f", wanted)).await
                })
            };
            wait_for_pending(&table, 1).await;

            for (index, arity) in arities.iter().enumerate() {
                table
                    .register("app.Main", method("f", *arity, TypeRef::named(format!("r{}", index))))
                    .await
                    .unwrap();
            }
            table.end_resolution().await.unwrap();

            let expected = arities
                .iter()
                .position(|arity| *arity == wanted)
                .map(|index| TypeRef::named(format!("r{}", index)));
            let found = waiting.await.unwrap().unwrap().map(|m| m.return_type);
            (found, expected)
        });

        prop_assert_eq!(found, expected);
    }
}
