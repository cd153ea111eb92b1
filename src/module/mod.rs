//! Service modules: validated factory sets with resolution and disposal.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{try_join_all, BoxFuture, FutureExt};
use tracing::{debug, trace, warn};

use crate::config::{DisposeOrder, ModuleOptions};
use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::factory::{AnyArc, Dependencies, ServiceFactory};
use crate::key::{Key, ServiceKey, ServiceScope};
use crate::observer::Observers;
use crate::validation;

mod builder;

pub use builder::ModuleBuilder;

/// One element of a module composition: a factory or a whole module.
#[derive(Clone)]
pub enum ModuleEntry {
    Factory(ServiceFactory),
    Module(ServiceModule),
}

impl From<ServiceFactory> for ModuleEntry {
    fn from(factory: ServiceFactory) -> Self {
        ModuleEntry::Factory(factory)
    }
}

impl From<ServiceModule> for ModuleEntry {
    fn from(module: ServiceModule) -> Self {
        ModuleEntry::Module(module)
    }
}

impl From<&ServiceModule> for ModuleEntry {
    fn from(module: &ServiceModule) -> Self {
        ModuleEntry::Module(module.clone())
    }
}

/// Immutable, validated set of factories, one active factory per key.
///
/// Modules are composed from factories and other modules with
/// [`compose`](Self::compose). When several entries provide the same key the
/// last one wins, which is how a default service is overridden by appending
/// an alternative after a base module. Cloning a module is cheap and shares
/// its factories, including cached singletons.
///
/// # Examples
///
/// ```rust
/// use keyed_di::{ServiceFactory, ServiceKey, ServiceModule};
/// use std::sync::Arc;
///
/// struct Config { url: String }
/// struct Logger;
/// struct App { config: Arc<Config>, logger: Arc<Logger> }
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ServiceKey::<Config>::new("Config");
/// let logger = ServiceKey::<Logger>::new("Logger");
/// let app = ServiceKey::<App>::new("App");
///
/// let base = ServiceModule::compose([
///     ServiceFactory::singleton(&config).initialize_sync(|_| Ok(Config { url: "postgres://prod".into() })),
///     ServiceFactory::singleton(&logger).initialize_sync(|_| Ok(Logger)),
/// ])?;
///
/// let module = ServiceModule::builder()
///     .add(base)
///     .add(
///         ServiceFactory::singleton(&app)
///             .depends_on([config.key(), logger.key()])
///             .initialize(|deps| async move {
///                 Ok(App { config: deps.at(0)?, logger: deps.at(1)? })
///             }),
///     )
///     // Overrides the base module's Config.
///     .add(ServiceFactory::singleton(&config).initialize_sync(|_| Ok(Config { url: "postgres://test".into() })))
///     .build()?;
///
/// let resolved = module.get(&app).await?;
/// assert_eq!(resolved.config.url, "postgres://test");
/// assert!(Arc::ptr_eq(&resolved.config, &module.get(&config).await?));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ServiceModule {
    inner: Arc<ModuleInner>,
}

struct ModuleInner {
    factories: Vec<ServiceFactory>,
    index: HashMap<u64, usize>,
    options: ModuleOptions,
    observers: Observers,
}

impl ServiceModule {
    /// Composes a module with default options.
    ///
    /// Flattens nested modules in order, keeps the last factory per key (at
    /// the position where that key first appeared) and validates the result.
    /// Fails with the first violation found; no module is returned then.
    pub fn compose<I, E>(entries: I) -> DiResult<Self>
    where
        I: IntoIterator<Item = E>,
        E: Into<ModuleEntry>,
    {
        ModuleBuilder::new().extend(entries).build()
    }

    /// Starts a builder for modules with options or observers.
    pub fn builder() -> ModuleBuilder {
        ModuleBuilder::new()
    }

    pub(crate) fn from_parts(entries: Vec<ModuleEntry>, options: ModuleOptions, observers: Observers) -> DiResult<Self> {
        let mut factories: Vec<ServiceFactory> = Vec::new();
        let mut index: HashMap<u64, usize> = HashMap::new();

        for factory in flatten(entries) {
            match index.get(&factory.provides().id()) {
                Some(&position) => factories[position] = factory,
                None => {
                    index.insert(factory.provides().id(), factories.len());
                    factories.push(factory);
                }
            }
        }

        validation::check_invariants(&factories, &index)?;
        if options.detect_cycles {
            if let Some(cycle) = validation::find_cycle(&factories, &index) {
                return Err(DiError::Circular(cycle));
            }
        }

        debug!(factories = factories.len(), "service module composed");
        Ok(Self {
            inner: Arc::new(ModuleInner {
                factories,
                index,
                options,
                observers,
            }),
        })
    }

    /// Resolves the service behind `key`.
    ///
    /// Dependencies are resolved concurrently and handed to the initializer in
    /// declaration order. A failure aborts only this call; singletons already
    /// produced by sibling resolutions stay cached.
    pub async fn get<T: Send + Sync + 'static>(&self, key: &ServiceKey<T>) -> DiResult<Arc<T>> {
        self.get_any(key.as_key())
            .await?
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(key.as_key().shared_name()))
    }

    /// Type-erased [`get`](Self::get).
    pub async fn get_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>> {
        let result = self.resolve(key, Vec::new()).await;
        if let Err(error) = &result {
            warn!(service = %key, %error, "service resolution failed");
        }
        result
    }

    fn resolve<'a>(&'a self, key: &'a Key, path: Vec<Key>) -> BoxFuture<'a, DiResult<AnyArc>> {
        async move {
            if path.contains(key) {
                let mut cycle: Vec<Arc<str>> = path.iter().map(Key::shared_name).collect();
                cycle.push(key.shared_name());
                return Err(DiError::Circular(cycle));
            }

            trace!(service = %key, depth = path.len(), "resolving");
            let observers = &self.inner.observers;
            if !observers.has_observers() {
                return self.produce(key, path).await;
            }

            observers.resolving(key);
            let started = Instant::now();
            let result = self.produce(key, path).await;
            match &result {
                Ok(_) => observers.resolved(key, started.elapsed()),
                Err(error) => observers.resolution_failed(key, error),
            }
            result
        }
        .boxed()
    }

    async fn produce(&self, key: &Key, mut path: Vec<Key>) -> DiResult<AnyArc> {
        let factory = self
            .factory(key)
            .ok_or_else(|| DiError::NotFound(key.shared_name()))?;
        path.push(key.clone());
        factory
            .instance(move || self.resolve_dependencies(factory, path))
            .await
    }

    async fn resolve_dependencies(&self, factory: &ServiceFactory, path: Vec<Key>) -> DiResult<Dependencies> {
        let values = try_join_all(
            factory
                .depends_on()
                .iter()
                .map(|dep| self.resolve(dep, path.clone())),
        )
        .await?;
        Ok(Dependencies::new(
            factory.provides().shared_name(),
            factory.shared_dependencies(),
            values,
        ))
    }

    /// Disposes singletons, all of them or only those tagged with `scope`.
    ///
    /// Calls each selected factory's teardown when it has a cached instance
    /// and clears the cache so the next `get` produces a new one. One-shot
    /// factories are skipped. Returns how many instances were released.
    ///
    /// Runs synchronously and must not overlap in-flight `get` calls for the
    /// same factories; an instance still being produced is not disposed. A
    /// panicking teardown propagates and the remaining factories are skipped.
    pub fn dispose(&self, scope: Option<&ServiceScope>) -> usize {
        let factories = &self.inner.factories;
        let order: Vec<usize> = match self.inner.options.dispose_order {
            DisposeOrder::Registration => (0..factories.len()).collect(),
            DisposeOrder::ReverseDependency => {
                let mut order = validation::dependency_order(factories, &self.inner.index);
                order.reverse();
                order
            }
        };

        let mut released = 0;
        for position in order {
            let factory = &factories[position];
            if let Some(scope) = scope {
                if factory.scope() != Some(scope) {
                    continue;
                }
            }
            if factory.dispose() {
                released += 1;
                self.inner.observers.disposed(factory.provides());
            }
        }

        debug!(
            scope = scope.map(ServiceScope::name).unwrap_or("<all>"),
            released,
            "service module disposed"
        );
        released
    }

    /// Active factories in module order.
    pub fn factories(&self) -> &[ServiceFactory] {
        &self.inner.factories
    }

    /// Active factory for `key`, if any.
    pub fn factory(&self, key: &Key) -> Option<&ServiceFactory> {
        self.inner
            .index
            .get(&key.id())
            .map(|&position| &self.inner.factories[position])
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.inner.index.contains_key(&key.id())
    }

    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.inner
            .factories
            .iter()
            .map(ServiceDescriptor::from_factory)
            .collect()
    }

    pub fn options(&self) -> &ModuleOptions {
        &self.inner.options
    }

    pub fn len(&self) -> usize {
        self.inner.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.factories.is_empty()
    }
}

impl std::fmt::Debug for ServiceModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceModule")
            .field("factories", &self.inner.factories)
            .field("options", &self.inner.options)
            .finish()
    }
}

fn flatten(entries: Vec<ModuleEntry>) -> Vec<ServiceFactory> {
    let mut factories = Vec::new();
    for entry in entries {
        match entry {
            ModuleEntry::Factory(factory) => factories.push(factory),
            ModuleEntry::Module(module) => factories.extend(module.inner.factories.iter().cloned()),
        }
    }
    factories
}
