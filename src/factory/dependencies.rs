//! Resolved dependency values handed to initializers.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{Key, ServiceKey};

/// Type-erased shared value as stored in singleton caches.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// Values of a factory's dependencies, in the order they were declared.
///
/// Every dependency is resolved before the initializer runs, so lookups only
/// fail when the caller asks for the wrong type or position.
///
/// # Examples
///
/// ```rust
/// use keyed_di::{ServiceFactory, ServiceKey, ServiceModule};
///
/// struct Config { name: String }
/// struct Greeter { greeting: String }
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ServiceKey::<Config>::new("Config");
/// let greeter = ServiceKey::<Greeter>::new("Greeter");
///
/// let lookup = config.clone();
/// let module = ServiceModule::compose([
///     ServiceFactory::singleton(&config).initialize_sync(|_| Ok(Config { name: "world".into() })),
///     ServiceFactory::one_shot(&greeter, [config.key()]).initialize_sync(move |deps| {
///         // By position or by key; both see the same value.
///         let by_index = deps.at::<Config>(0)?;
///         let by_key = deps.get(&lookup)?;
///         assert!(std::sync::Arc::ptr_eq(&by_index, &by_key));
///         Ok(Greeter { greeting: format!("hello {}", by_key.name) })
///     }),
/// ])?;
///
/// assert_eq!(module.get(&greeter).await?.greeting, "hello world");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Dependencies {
    service: Arc<str>,
    keys: Arc<[Key]>,
    values: Vec<AnyArc>,
}

impl Dependencies {
    pub(crate) fn new(service: Arc<str>, keys: Arc<[Key]>, values: Vec<AnyArc>) -> Self {
        debug_assert_eq!(keys.len(), values.len());
        Self { service, keys, values }
    }

    #[cfg(test)]
    pub(crate) fn empty(service: &str) -> Self {
        Self::new(Arc::from(service), Arc::from(Vec::new()), Vec::new())
    }

    /// Number of declared dependencies.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Declared dependency keys, in order.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Returns the dependency at `index`, downcast to `T`.
    pub fn at<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        let value = self.values.get(index).ok_or_else(|| DiError::DependencyIndex {
            service: self.service.clone(),
            index,
            len: self.values.len(),
        })?;
        value
            .clone()
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(self.keys[index].shared_name()))
    }

    /// Returns the dependency declared under `key`.
    ///
    /// Fails with `NotFound` when the key is not in this factory's dependency list.
    pub fn get<T: Send + Sync + 'static>(&self, key: &ServiceKey<T>) -> DiResult<Arc<T>> {
        let index = self
            .keys
            .iter()
            .position(|k| k == key.as_key())
            .ok_or_else(|| DiError::NotFound(key.as_key().shared_name()))?;
        self.at(index)
    }
}

impl std::fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependencies")
            .field("service", &self.service)
            .field("keys", &self.keys)
            .finish()
    }
}
