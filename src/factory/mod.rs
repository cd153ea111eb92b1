//! Service factories: how a value for one key is produced and torn down.
//!
//! A [`ServiceFactory`] is a type-erased, cheaply clonable recipe. It is built
//! through one of two typed builders, [`SingletonBuilder`] or
//! [`OneShotBuilder`], which fix its [`Lifetime`] at construction.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

use crate::async_factories::{AsyncFactory, SyncFactory};
use crate::error::{BoxError, DiError, DiResult};
use crate::key::{Key, ServiceKey, ServiceScope};
use crate::lifetime::Lifetime;
use crate::traits::Dispose;

pub mod dependencies;
mod singleton;

pub use dependencies::Dependencies;
pub(crate) use dependencies::AnyArc;
use singleton::SingletonSlot;

type InitFn = Box<dyn Fn(Dependencies) -> BoxFuture<'static, Result<AnyArc, BoxError>> + Send + Sync>;
type DisposeFn = Box<dyn Fn(AnyArc) + Send + Sync>;

/// Lifetime strategy, one variant per policy.
enum Strategy {
    Singleton {
        slot: SingletonSlot,
        dispose: Option<DisposeFn>,
    },
    OneShot,
}

struct FactoryInner {
    provides: Key,
    depends_on: Arc<[Key]>,
    scope: Option<ServiceScope>,
    initialize: InitFn,
    strategy: Strategy,
}

/// Recipe producing the value for one [`ServiceKey`].
///
/// Clones share the same underlying factory, including a singleton's cached
/// instance, so a factory reused in several modules yields one instance.
///
/// # Examples
///
/// ```rust
/// use keyed_di::{Lifetime, ServiceFactory, ServiceKey, ServiceScope};
///
/// struct Config { port: u16 }
/// struct Server { port: u16 }
///
/// let config = ServiceKey::<Config>::new("Config");
/// let server = ServiceKey::<Server>::new("Server");
/// let request = ServiceScope::new("request");
///
/// let config_factory = ServiceFactory::singleton(&config)
///     .scope(&request)
///     .initialize_sync(|_| Ok(Config { port: 8080 }));
///
/// let server_factory = ServiceFactory::one_shot(&server, [config.key()])
///     .initialize(|deps| async move {
///         let config = deps.at::<Config>(0)?;
///         Ok(Server { port: config.port })
///     });
///
/// assert_eq!(config_factory.provides(), config.as_key());
/// assert_eq!(config_factory.scope(), Some(&request));
/// assert!(config_factory.has_dispose());
///
/// assert_eq!(server_factory.depends_on(), &[config.key()]);
/// assert_eq!(server_factory.lifetime(), Lifetime::OneShot);
/// assert!(!server_factory.has_dispose());
/// ```
#[derive(Clone)]
pub struct ServiceFactory {
    inner: Arc<FactoryInner>,
}

impl ServiceFactory {
    /// Starts a singleton factory for `provides`.
    pub fn singleton<T: Send + Sync + 'static>(provides: &ServiceKey<T>) -> SingletonBuilder<T> {
        SingletonBuilder {
            provides: provides.key(),
            depends_on: Vec::new(),
            scope: None,
            dispose: None,
            _marker: PhantomData,
        }
    }

    /// Starts a one-shot factory for `provides`.
    ///
    /// The dependency list is required here; one-shot factories take no scope
    /// and no teardown since they keep no instance around.
    pub fn one_shot<T: Send + Sync + 'static>(
        provides: &ServiceKey<T>,
        depends_on: impl IntoIterator<Item = Key>,
    ) -> OneShotBuilder<T> {
        OneShotBuilder {
            provides: provides.key(),
            depends_on: depends_on.into_iter().collect(),
            _marker: PhantomData,
        }
    }

    /// Key this factory satisfies.
    #[inline]
    pub fn provides(&self) -> &Key {
        &self.inner.provides
    }

    /// Dependencies in declaration order.
    #[inline]
    pub fn depends_on(&self) -> &[Key] {
        &self.inner.depends_on
    }

    pub(crate) fn shared_dependencies(&self) -> Arc<[Key]> {
        self.inner.depends_on.clone()
    }

    #[inline]
    pub fn scope(&self) -> Option<&ServiceScope> {
        self.inner.scope.as_ref()
    }

    pub fn lifetime(&self) -> Lifetime {
        match self.inner.strategy {
            Strategy::Singleton { .. } => Lifetime::Singleton,
            Strategy::OneShot => Lifetime::OneShot,
        }
    }

    /// Whether module disposal has anything to call on this factory.
    ///
    /// Singletons always do (their cache is cleared even without a user
    /// teardown); one-shot factories never do.
    pub fn has_dispose(&self) -> bool {
        matches!(self.inner.strategy, Strategy::Singleton { .. })
    }

    /// True when a singleton instance is currently cached.
    pub fn is_initialized(&self) -> bool {
        match &self.inner.strategy {
            Strategy::Singleton { slot, .. } => slot.is_initialized(),
            Strategy::OneShot => false,
        }
    }

    /// Returns true when both handles refer to the same factory.
    pub fn ptr_eq(&self, other: &ServiceFactory) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Runs the user initializer, bypassing any cache.
    async fn produce(&self, deps: Dependencies) -> DiResult<AnyArc> {
        (self.inner.initialize)(deps)
            .await
            .map_err(|source| DiError::initialization(self.inner.provides.shared_name(), source))
    }

    /// Produces or returns the instance according to the lifetime policy.
    ///
    /// `resolve` yields the dependency values. For singletons it runs inside
    /// the single-flight section, so concurrent first requests resolve the
    /// dependencies and call the initializer exactly once.
    pub(crate) async fn instance<R, Fut>(&self, resolve: R) -> DiResult<AnyArc>
    where
        R: FnOnce() -> Fut,
        Fut: Future<Output = DiResult<Dependencies>>,
    {
        match &self.inner.strategy {
            Strategy::Singleton { slot, .. } => {
                slot.get_or_try_init(|| async move {
                    let deps = resolve().await?;
                    let value = self.produce(deps).await?;
                    debug!(service = %self.inner.provides, "singleton created");
                    Ok(value)
                })
                .await
            }
            Strategy::OneShot => {
                let deps = resolve().await?;
                self.produce(deps).await
            }
        }
    }

    /// Releases a cached singleton.
    ///
    /// Calls the user teardown with the cached instance and clears the cache.
    /// Returns whether an instance was released; no-op for one-shot factories
    /// and for singletons that were never produced.
    pub(crate) fn dispose(&self) -> bool {
        match &self.inner.strategy {
            Strategy::Singleton { slot, dispose } => match slot.take() {
                Some(instance) => {
                    if let Some(dispose) = dispose {
                        dispose(instance);
                    }
                    debug!(service = %self.inner.provides, "singleton disposed");
                    true
                }
                None => false,
            },
            Strategy::OneShot => false,
        }
    }
}

impl std::fmt::Debug for ServiceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceFactory")
            .field("provides", &self.inner.provides)
            .field("depends_on", &self.inner.depends_on)
            .field("scope", &self.inner.scope)
            .field("lifetime", &self.lifetime())
            .finish()
    }
}

fn erase_initializer<T, A>(factory: A) -> InitFn
where
    T: Send + Sync + 'static,
    A: AsyncFactory<T>,
{
    let factory = Arc::new(factory);
    Box::new(move |deps: Dependencies| {
        let factory = factory.clone();
        async move {
            let value = factory.create(deps).await?;
            Ok::<AnyArc, BoxError>(Arc::new(value))
        }
        .boxed()
    })
}

/// Builder for singleton factories, see [`ServiceFactory::singleton`].
pub struct SingletonBuilder<T> {
    provides: Key,
    depends_on: Vec<Key>,
    scope: Option<ServiceScope>,
    dispose: Option<DisposeFn>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> SingletonBuilder<T> {
    /// Appends dependencies; their order is the positional order seen by the initializer.
    pub fn depends_on(mut self, keys: impl IntoIterator<Item = Key>) -> Self {
        self.depends_on.extend(keys);
        self
    }

    /// Tags the factory for [`ServiceModule::dispose`](crate::ServiceModule::dispose) by scope.
    pub fn scope(mut self, scope: &ServiceScope) -> Self {
        self.scope = Some(scope.clone());
        self
    }

    /// Teardown called with the cached instance when the singleton is disposed.
    pub fn dispose<D>(mut self, dispose: D) -> Self
    where
        D: Fn(Arc<T>) + Send + Sync + 'static,
    {
        self.dispose = Some(Box::new(move |instance: AnyArc| {
            if let Ok(instance) = instance.downcast::<T>() {
                dispose(instance);
            }
        }));
        self
    }

    /// Finishes with an async initializer closure.
    pub fn initialize<F, Fut>(self, initialize: F) -> ServiceFactory
    where
        F: Fn(Dependencies) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        self.initialize_with(initialize)
    }

    /// Finishes with an initializer that completes without suspending.
    pub fn initialize_sync<F>(self, initialize: F) -> ServiceFactory
    where
        F: Fn(Dependencies) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.initialize_with(SyncFactory(initialize))
    }

    /// Finishes with any [`AsyncFactory`] implementation.
    pub fn initialize_with<A: AsyncFactory<T>>(self, factory: A) -> ServiceFactory {
        ServiceFactory {
            inner: Arc::new(FactoryInner {
                provides: self.provides,
                depends_on: self.depends_on.into(),
                scope: self.scope,
                initialize: erase_initializer(factory),
                strategy: Strategy::Singleton {
                    slot: SingletonSlot::new(),
                    dispose: self.dispose,
                },
            }),
        }
    }
}

impl<T: Dispose> SingletonBuilder<T> {
    /// Uses the instance's [`Dispose`] implementation as teardown.
    pub fn disposable(self) -> Self {
        self.dispose(|instance: Arc<T>| instance.dispose())
    }
}

/// Builder for one-shot factories, see [`ServiceFactory::one_shot`].
pub struct OneShotBuilder<T> {
    provides: Key,
    depends_on: Vec<Key>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> OneShotBuilder<T> {
    pub fn initialize<F, Fut>(self, initialize: F) -> ServiceFactory
    where
        F: Fn(Dependencies) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        self.initialize_with(initialize)
    }

    pub fn initialize_sync<F>(self, initialize: F) -> ServiceFactory
    where
        F: Fn(Dependencies) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.initialize_with(SyncFactory(initialize))
    }

    pub fn initialize_with<A: AsyncFactory<T>>(self, factory: A) -> ServiceFactory {
        ServiceFactory {
            inner: Arc::new(FactoryInner {
                provides: self.provides,
                depends_on: self.depends_on.into(),
                scope: None,
                initialize: erase_initializer(factory),
                strategy: Strategy::OneShot,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn no_deps(name: &str) -> impl FnOnce() -> futures::future::Ready<DiResult<Dependencies>> {
        let deps = Dependencies::empty(name);
        move || futures::future::ready(Ok(deps))
    }

    #[tokio::test]
    async fn singleton_initializes_once() {
        let key = ServiceKey::<usize>::new("Counter");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let factory = ServiceFactory::singleton(&key).initialize_sync(move |_| {
            Ok(counter.fetch_add(1, Ordering::SeqCst))
        });

        let a = factory.instance(no_deps("Counter")).await.unwrap();
        let b = factory.instance(no_deps("Counter")).await.unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(factory.is_initialized());
    }

    #[tokio::test]
    async fn one_shot_initializes_every_time() {
        let key = ServiceKey::<usize>::new("Ticket");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let factory = ServiceFactory::one_shot(&key, []).initialize_sync(move |_| {
            Ok(counter.fetch_add(1, Ordering::SeqCst))
        });

        let a = factory.instance(no_deps("Ticket")).await.unwrap();
        let b = factory.instance(no_deps("Ticket")).await.unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!factory.is_initialized());
        assert!(!factory.dispose());
    }

    #[tokio::test]
    async fn dispose_runs_teardown_only_with_cached_instance() {
        let key = ServiceKey::<String>::new("Conn");
        let disposed = Arc::new(AtomicUsize::new(0));
        let seen = disposed.clone();
        let factory = ServiceFactory::singleton(&key)
            .dispose(move |conn: Arc<String>| {
                assert_eq!(*conn, "open");
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .initialize_sync(|_| Ok("open".to_string()));

        assert!(!factory.dispose());
        assert_eq!(disposed.load(Ordering::SeqCst), 0);

        let first = factory.instance(no_deps("Conn")).await.unwrap();
        assert!(factory.dispose());
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
        assert!(!factory.is_initialized());

        let second = factory.instance(no_deps("Conn")).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn initializer_error_keeps_source() {
        #[derive(Debug)]
        struct Refused;
        impl std::fmt::Display for Refused {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("connection refused")
            }
        }
        impl std::error::Error for Refused {}

        let key = ServiceKey::<u8>::new("Db");
        let factory = ServiceFactory::singleton(&key).initialize(|_| async { Err(Box::new(Refused) as BoxError) });

        let err = factory.instance(no_deps("Db")).await.unwrap_err();
        match &err {
            DiError::Initialization { service, source } => {
                assert_eq!(&**service, "Db");
                assert!(source.downcast_ref::<Refused>().is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!factory.is_initialized());
    }

    #[test]
    fn clones_share_identity() {
        let key = ServiceKey::<u8>::new("Shared");
        let factory = ServiceFactory::singleton(&key).initialize_sync(|_| Ok(1));
        let other = ServiceFactory::singleton(&key).initialize_sync(|_| Ok(1));

        assert!(factory.ptr_eq(&factory.clone()));
        assert!(!factory.ptr_eq(&other));
    }
}
