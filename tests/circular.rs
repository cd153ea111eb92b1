use keyed_di::{DiError, Key, ModuleOptions, ServiceFactory, ServiceKey, ServiceModule};
use std::sync::Arc;

fn unit(key: &ServiceKey<()>, deps: &[&ServiceKey<()>]) -> ServiceFactory {
    let deps: Vec<Key> = deps.iter().map(|k| k.key()).collect();
    ServiceFactory::singleton(key).depends_on(deps).initialize_sync(|_| Ok(()))
}

fn names(path: &[Arc<str>]) -> Vec<&str> {
    path.iter().map(|n| n.as_ref()).collect()
}

#[test]
fn test_self_dependency_rejected() {
    let a = ServiceKey::<()>::new("A");

    match ServiceModule::compose([unit(&a, &[&a])]) {
        Err(DiError::SelfDependency { service }) => assert_eq!(&*service, "A"),
        other => panic!("expected SelfDependency, got {:?}", other),
    }
}

#[test]
fn test_self_dependency_rejected_even_without_cycle_detection() {
    let a = ServiceKey::<()>::new("A");
    let result = ServiceModule::builder()
        .options(ModuleOptions::default().detect_cycles(false))
        .add(unit(&a, &[&a]))
        .build();

    assert!(matches!(result, Err(DiError::SelfDependency { .. })));
}

#[test]
fn test_two_node_cycle() {
    let a = ServiceKey::<()>::new("A");
    let b = ServiceKey::<()>::new("B");

    match ServiceModule::compose([unit(&a, &[&b]), unit(&b, &[&a])]) {
        Err(DiError::Circular(path)) => assert_eq!(names(&path), vec!["A", "B", "A"]),
        other => panic!("expected Circular, got {:?}", other),
    }
}

#[test]
fn test_three_node_cycle_behind_a_root() {
    let root = ServiceKey::<()>::new("Root");
    let a = ServiceKey::<()>::new("A");
    let b = ServiceKey::<()>::new("B");
    let c = ServiceKey::<()>::new("C");

    let result = ServiceModule::compose([
        unit(&root, &[&a]),
        unit(&a, &[&b]),
        unit(&b, &[&c]),
        unit(&c, &[&a]),
    ]);

    match result {
        Err(err @ DiError::Circular(_)) => {
            assert!(err.is_composition_error());
            assert_eq!(err.to_string(), "Circular dependency: A -> B -> C -> A");
        }
        other => panic!("expected Circular, got {:?}", other),
    }
}

#[test]
fn test_diamond_is_not_a_cycle() {
    let top = ServiceKey::<()>::new("Top");
    let left = ServiceKey::<()>::new("Left");
    let right = ServiceKey::<()>::new("Right");
    let bottom = ServiceKey::<()>::new("Bottom");

    let module = ServiceModule::compose([
        unit(&top, &[&left, &right]),
        unit(&left, &[&bottom]),
        unit(&right, &[&bottom]),
        unit(&bottom, &[]),
    ])
    .unwrap();

    assert_eq!(module.len(), 4);
}

#[test]
fn test_missing_dependencies_listed() {
    let config = ServiceKey::<()>::new("Config");
    let logger = ServiceKey::<()>::new("Logger");
    let app = ServiceKey::<()>::new("App");

    match ServiceModule::compose([unit(&app, &[&config, &logger])]) {
        Err(err @ DiError::MissingDependencies { .. }) => {
            assert_eq!(
                err.to_string(),
                "Service 'App' has unresolved dependencies:\n  Config\n  Logger"
            );
        }
        other => panic!("expected MissingDependencies, got {:?}", other),
    }
}

#[test]
fn test_first_violation_in_list_order_wins() {
    let a = ServiceKey::<()>::new("A");
    let b = ServiceKey::<()>::new("B");
    let ghost = ServiceKey::<()>::new("Ghost");

    // A is missing Ghost, B depends on itself; A comes first.
    match ServiceModule::compose([unit(&a, &[&ghost]), unit(&b, &[&b])]) {
        Err(DiError::MissingDependencies { service, missing }) => {
            assert_eq!(&*service, "A");
            assert_eq!(names(&missing), vec!["Ghost"]);
        }
        other => panic!("expected MissingDependencies, got {:?}", other),
    }

    // Swapped, the self dependency is reported.
    let result = ServiceModule::compose([unit(&b, &[&b]), unit(&a, &[&ghost])]);
    assert!(matches!(result, Err(DiError::SelfDependency { .. })));
}

#[test]
fn test_same_name_dependency_from_other_key_is_missing() {
    let real = ServiceKey::<()>::new("Config");
    let impostor = ServiceKey::<()>::new("Config");
    let app = ServiceKey::<()>::new("App");

    let result = ServiceModule::compose([unit(&real, &[]), unit(&app, &[&impostor])]);
    assert!(matches!(result, Err(DiError::MissingDependencies { .. })));
}

#[test]
fn test_override_can_break_a_cycle() {
    let a = ServiceKey::<()>::new("A");
    let b = ServiceKey::<()>::new("B");

    let module = ServiceModule::compose([unit(&a, &[&b]), unit(&b, &[&a]), unit(&b, &[])]).unwrap();
    assert_eq!(module.len(), 2);
}

#[tokio::test]
async fn test_cycle_detected_at_resolution_when_disabled() {
    let a = ServiceKey::<()>::new("A");
    let b = ServiceKey::<()>::new("B");
    let c = ServiceKey::<()>::new("C");

    let module = ServiceModule::builder()
        .options(ModuleOptions::default().detect_cycles(false))
        .add(unit(&a, &[&b]))
        .add(unit(&b, &[&c]))
        .add(unit(&c, &[&b]))
        .build()
        .unwrap();

    match module.get(&a).await {
        Err(DiError::Circular(path)) => assert_eq!(names(&path), vec!["A", "B", "C", "B"]),
        other => panic!("expected Circular, got {:?}", other),
    }

    // Nothing along the failed path was cached.
    assert!(module.factories().iter().all(|f| !f.is_initialized()));
}
