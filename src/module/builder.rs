//! Fluent construction of service modules.

use std::sync::Arc;

use super::{ModuleEntry, ServiceModule};
use crate::config::ModuleOptions;
use crate::error::DiResult;
use crate::observer::{DiObserver, Observers};

/// Collects entries, options and observers, then composes a [`ServiceModule`].
///
/// Entries keep their order; [`build`](Self::build) applies the same
/// flatten, last-wins and validation steps as [`ServiceModule::compose`].
///
/// # Examples
///
/// ```rust
/// use keyed_di::{DiError, ServiceFactory, ServiceKey, ServiceModule};
///
/// let config = ServiceKey::<String>::new("Config");
/// let logger = ServiceKey::<String>::new("Logger");
/// let app = ServiceKey::<String>::new("App");
///
/// let result = ServiceModule::builder()
///     .add(
///         ServiceFactory::singleton(&app)
///             .depends_on([config.key(), logger.key()])
///             .initialize_sync(|_| Ok("app".to_string())),
///     )
///     .build();
///
/// match result {
///     Err(DiError::MissingDependencies { service, missing }) => {
///         assert_eq!(&*service, "App");
///         assert_eq!(missing.len(), 2);
///     }
///     _ => panic!("expected a composition error"),
/// }
/// ```
pub struct ModuleBuilder {
    entries: Vec<ModuleEntry>,
    options: ModuleOptions,
    observers: Observers,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            options: ModuleOptions::default(),
            observers: Observers::new(),
        }
    }

    /// Appends a factory or module.
    pub fn add(mut self, entry: impl Into<ModuleEntry>) -> Self {
        self.entries.push(entry.into());
        self
    }

    /// Appends several entries, in iteration order.
    pub fn extend<I, E>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<ModuleEntry>,
    {
        self.entries.extend(entries.into_iter().map(Into::into));
        self
    }

    pub fn options(mut self, options: ModuleOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers an observer notified on resolution and disposal.
    pub fn observer(mut self, observer: Arc<dyn DiObserver>) -> Self {
        self.observers.add(observer);
        self
    }

    /// Number of entries added so far, before flattening.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Composes and validates the module.
    pub fn build(self) -> DiResult<ServiceModule> {
        ServiceModule::from_parts(self.entries, self.options, self.observers)
    }
}

impl Default for ModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}
