//! Service descriptors for introspection and tooling.

use crate::factory::ServiceFactory;
use crate::key::{Key, ServiceScope};
use crate::lifetime::Lifetime;

/// Read-only snapshot of one active factory.
///
/// This is everything external tooling (such as
/// [`DependencyGraph`](crate::DependencyGraph)) needs: the producer, its
/// ordered dependencies, its scope tag and lifetime.
///
/// # Examples
///
/// ```rust
/// use keyed_di::{Lifetime, ServiceFactory, ServiceKey, ServiceModule};
///
/// let config = ServiceKey::<String>::new("Config");
/// let app = ServiceKey::<String>::new("App");
///
/// let module = ServiceModule::compose([
///     ServiceFactory::singleton(&config).initialize_sync(|_| Ok("cfg".to_string())),
///     ServiceFactory::one_shot(&app, [config.key()]).initialize_sync(|_| Ok("app".to_string())),
/// ])
/// .unwrap();
///
/// let descriptors = module.descriptors();
/// assert_eq!(descriptors.len(), 2);
///
/// let app_descriptor = descriptors.iter().find(|d| d.name() == "App").unwrap();
/// assert_eq!(app_descriptor.lifetime, Lifetime::OneShot);
/// assert_eq!(app_descriptor.dependency_names(), vec!["Config"]);
/// assert!(!app_descriptor.is_leaf());
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// The key the factory provides
    pub key: Key,
    /// Dependencies in declaration order
    pub depends_on: Vec<Key>,
    /// Disposal scope tag, if any
    pub scope: Option<ServiceScope>,
    pub lifetime: Lifetime,
}

impl ServiceDescriptor {
    pub(crate) fn from_factory(factory: &ServiceFactory) -> Self {
        Self {
            key: factory.provides().clone(),
            depends_on: factory.depends_on().to_vec(),
            scope: factory.scope().cloned(),
            lifetime: factory.lifetime(),
        }
    }

    /// Service name of the producer.
    pub fn name(&self) -> &str {
        self.key.name()
    }

    pub fn dependency_names(&self) -> Vec<&str> {
        self.depends_on.iter().map(Key::name).collect()
    }

    /// True when the service has no dependencies.
    pub fn is_leaf(&self) -> bool {
        self.depends_on.is_empty()
    }

    pub fn scope_name(&self) -> Option<&str> {
        self.scope.as_ref().map(ServiceScope::name)
    }
}
