//! Diagnostic observers for resolution and disposal events.
//!
//! Observers are registered on a [`ModuleBuilder`](crate::ModuleBuilder) and
//! called synchronously from `get` and `dispose`. Keep implementations
//! lightweight; queue expensive work elsewhere.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::key::Key;

/// Observer trait for resolution and disposal events.
///
/// Every hook has an empty default so implementations only override what
/// they need.
///
/// # Examples
///
/// ```
/// use keyed_di::{DiObserver, Key, ServiceFactory, ServiceKey, ServiceModule};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder {
///     resolved: Mutex<Vec<String>>,
/// }
///
/// impl DiObserver for Recorder {
///     fn resolved(&self, key: &Key, _duration: Duration) {
///         self.resolved.lock().unwrap().push(key.name().to_string());
///     }
/// }
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let recorder = Arc::new(Recorder::default());
/// let port = ServiceKey::<u16>::new("Port");
///
/// let module = ServiceModule::builder()
///     .observer(recorder.clone())
///     .add(ServiceFactory::singleton(&port).initialize_sync(|_| Ok(8080)))
///     .build()?;
///
/// module.get(&port).await?;
/// assert_eq!(*recorder.resolved.lock().unwrap(), vec!["Port".to_string()]);
/// # Ok(())
/// # }
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before a key's factory is looked up and its dependencies resolved.
    fn resolving(&self, _key: &Key) {}

    /// Called after a key resolved successfully.
    ///
    /// `duration` covers dependency resolution and the initializer, or just the
    /// cache hit for an already produced singleton.
    fn resolved(&self, _key: &Key, _duration: Duration) {}

    /// Called when resolving a key failed.
    fn resolution_failed(&self, _key: &Key, _error: &DiError) {}

    /// Called after a singleton instance was released by disposal.
    fn disposed(&self, _key: &Key) {}
}

/// Observer forwarding every event to `tracing`.
///
/// # Examples
///
/// ```
/// use keyed_di::{LoggingObserver, ServiceModule};
/// use std::sync::Arc;
///
/// let module = ServiceModule::builder()
///     .observer(Arc::new(LoggingObserver::new()))
///     .build()
///     .unwrap();
/// assert!(module.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LoggingObserver {
    prefix: Option<String>,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags every event with `prefix`, e.g. a module or tenant name.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or("di")
    }
}

impl DiObserver for LoggingObserver {
    fn resolving(&self, key: &Key) {
        tracing::trace!(target: "keyed_di", prefix = self.prefix(), service = %key, "resolving");
    }

    fn resolved(&self, key: &Key, duration: Duration) {
        tracing::debug!(
            target: "keyed_di",
            prefix = self.prefix(),
            service = %key,
            elapsed_us = duration.as_micros() as u64,
            "resolved"
        );
    }

    fn resolution_failed(&self, key: &Key, error: &DiError) {
        tracing::warn!(target: "keyed_di", prefix = self.prefix(), service = %key, %error, "resolution failed");
    }

    fn disposed(&self, key: &Key) {
        tracing::debug!(target: "keyed_di", prefix = self.prefix(), service = %key, "disposed");
    }
}

/// Registered observers of one module.
#[derive(Clone, Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    pub(crate) fn resolving(&self, key: &Key) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    pub(crate) fn resolved(&self, key: &Key, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(key, duration);
        }
    }

    pub(crate) fn resolution_failed(&self, key: &Key, error: &DiError) {
        for observer in &self.observers {
            observer.resolution_failed(key, error);
        }
    }

    pub(crate) fn disposed(&self, key: &Key) {
        for observer in &self.observers {
            observer.disposed(key);
        }
    }
}
