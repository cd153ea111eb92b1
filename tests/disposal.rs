use keyed_di::{
    DiObserver, DisposeOrder, Dispose, Key, ModuleOptions, ServiceFactory, ServiceKey, ServiceModule, ServiceScope,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<String>>>;

fn recording_singleton(key: &ServiceKey<String>, log: &Log, deps: Vec<Key>) -> ServiceFactory {
    let log = log.clone();
    let name = key.name().to_string();
    ServiceFactory::singleton(key)
        .depends_on(deps)
        .dispose(move |instance: Arc<String>| log.lock().unwrap().push(instance.to_string()))
        .initialize_sync(move |_| Ok(name.clone()))
}

#[tokio::test]
async fn test_dispose_all_calls_teardown_in_registration_order() {
    let log: Log = Arc::default();
    let a = ServiceKey::<String>::new("A");
    let b = ServiceKey::<String>::new("B");
    let c = ServiceKey::<String>::new("C");

    let module = ServiceModule::compose([
        recording_singleton(&c, &log, vec![a.key(), b.key()]),
        recording_singleton(&a, &log, vec![]),
        recording_singleton(&b, &log, vec![a.key()]),
    ])
    .unwrap();

    module.get(&c).await.unwrap();
    assert_eq!(module.dispose(None), 3);
    assert_eq!(*log.lock().unwrap(), vec!["C", "A", "B"]);
}

#[tokio::test]
async fn test_reverse_dependency_order_disposes_dependents_first() {
    let log: Log = Arc::default();
    let a = ServiceKey::<String>::new("A");
    let b = ServiceKey::<String>::new("B");
    let c = ServiceKey::<String>::new("C");

    let module = ServiceModule::builder()
        .options(ModuleOptions::default().dispose_order(DisposeOrder::ReverseDependency))
        .add(recording_singleton(&a, &log, vec![]))
        .add(recording_singleton(&c, &log, vec![a.key(), b.key()]))
        .add(recording_singleton(&b, &log, vec![a.key()]))
        .build()
        .unwrap();

    module.get(&c).await.unwrap();
    assert_eq!(module.dispose(None), 3);
    assert_eq!(*log.lock().unwrap(), vec!["C", "B", "A"]);
}

#[tokio::test]
async fn test_teardown_only_runs_for_cached_instances() {
    let log: Log = Arc::default();
    let used = ServiceKey::<String>::new("Used");
    let unused = ServiceKey::<String>::new("Unused");

    let module = ServiceModule::compose([
        recording_singleton(&used, &log, vec![]),
        recording_singleton(&unused, &log, vec![]),
    ])
    .unwrap();

    module.get(&used).await.unwrap();
    assert_eq!(module.dispose(None), 1);
    assert_eq!(*log.lock().unwrap(), vec!["Used"]);

    // Nothing cached any more.
    assert_eq!(module.dispose(None), 0);
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_scoped_disposal() {
    let log: Log = Arc::default();
    let s1 = ServiceScope::new("S1");
    let s2 = ServiceScope::new("S2");
    let x = ServiceKey::<String>::new("X");
    let y = ServiceKey::<String>::new("Y");
    let global = ServiceKey::<String>::new("Global");

    let scoped = |key: &ServiceKey<String>, scope: &ServiceScope| {
        let log = log.clone();
        let name = key.name().to_string();
        ServiceFactory::singleton(key)
            .scope(scope)
            .dispose(move |instance: Arc<String>| log.lock().unwrap().push(instance.to_string()))
            .initialize_sync(move |_| Ok(name.clone()))
    };

    let module = ServiceModule::compose([
        scoped(&x, &s1),
        scoped(&y, &s2),
        recording_singleton(&global, &log, vec![]),
    ])
    .unwrap();

    let x_before = module.get(&x).await.unwrap();
    let y_before = module.get(&y).await.unwrap();
    let global_before = module.get(&global).await.unwrap();

    assert_eq!(module.dispose(Some(&s1)), 1);
    assert_eq!(*log.lock().unwrap(), vec!["X"]);

    assert!(!Arc::ptr_eq(&x_before, &module.get(&x).await.unwrap()));
    assert!(Arc::ptr_eq(&y_before, &module.get(&y).await.unwrap()));
    assert!(Arc::ptr_eq(&global_before, &module.get(&global).await.unwrap()));
}

#[tokio::test]
async fn test_same_named_scopes_are_distinct() {
    let first = ServiceScope::new("request");
    let second = ServiceScope::new("request");
    let key = ServiceKey::<u32>::new("Session");

    let module =
        ServiceModule::compose([ServiceFactory::singleton(&key).scope(&first).initialize_sync(|_| Ok(1))]).unwrap();

    module.get(&key).await.unwrap();
    assert_eq!(module.dispose(Some(&second)), 0);
    assert_eq!(module.dispose(Some(&first)), 1);
}

#[tokio::test]
async fn test_singleton_without_teardown_is_still_reset() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let key = ServiceKey::<usize>::new("Counter");

    let module = ServiceModule::compose([
        ServiceFactory::singleton(&key).initialize_sync(move |_| Ok(counter.fetch_add(1, Ordering::SeqCst)))
    ])
    .unwrap();

    assert_eq!(*module.get(&key).await.unwrap(), 0);
    assert_eq!(module.dispose(None), 1);
    assert_eq!(*module.get(&key).await.unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_one_shot_factories_are_skipped() {
    let ticket = ServiceKey::<u32>::new("Ticket");
    let module = ServiceModule::compose([ServiceFactory::one_shot(&ticket, []).initialize_sync(|_| Ok(7))]).unwrap();

    module.get(&ticket).await.unwrap();
    assert!(!module.factories()[0].has_dispose());
    assert_eq!(module.dispose(None), 0);
}

#[tokio::test]
async fn test_dispose_trait_teardown() {
    struct Pool {
        closed: Arc<AtomicUsize>,
    }

    impl Dispose for Pool {
        fn dispose(&self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    let closed = Arc::new(AtomicUsize::new(0));
    let handle = closed.clone();
    let pool = ServiceKey::<Pool>::new("Pool");

    let module = ServiceModule::compose([ServiceFactory::singleton(&pool).disposable().initialize_sync(move |_| {
        Ok(Pool {
            closed: handle.clone(),
        })
    })])
    .unwrap();

    module.get(&pool).await.unwrap();
    module.dispose(None);
    module.dispose(None);
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_dispose_reaches_shared_factories() {
    let log: Log = Arc::default();
    let key = ServiceKey::<String>::new("Shared");
    let base = ServiceModule::compose([recording_singleton(&key, &log, vec![])]).unwrap();
    let wrapper = ServiceModule::compose([&base]).unwrap();

    let before = base.get(&key).await.unwrap();
    assert_eq!(wrapper.dispose(None), 1);
    assert!(!base.factories()[0].is_initialized());
    assert!(!Arc::ptr_eq(&before, &base.get(&key).await.unwrap()));
}

#[tokio::test]
async fn test_observers_see_disposals() {
    #[derive(Default)]
    struct DisposalRecorder {
        disposed: Mutex<Vec<String>>,
    }

    impl DiObserver for DisposalRecorder {
        fn disposed(&self, key: &Key) {
            self.disposed.lock().unwrap().push(key.name().to_string());
        }
    }

    let recorder = Arc::new(DisposalRecorder::default());
    let a = ServiceKey::<u8>::new("A");
    let b = ServiceKey::<u8>::new("B");

    let module = ServiceModule::builder()
        .observer(recorder.clone())
        .add(ServiceFactory::singleton(&a).initialize_sync(|_| Ok(1)))
        .add(ServiceFactory::singleton(&b).initialize_sync(|_| Ok(2)))
        .build()
        .unwrap();

    module.get(&b).await.unwrap();
    module.dispose(None);
    assert_eq!(*recorder.disposed.lock().unwrap(), vec!["B".to_string()]);
}
