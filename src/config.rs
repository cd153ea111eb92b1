//! Module configuration.
//!
//! Options are fixed when a module is composed and travel with it into any
//! module composed from it only through [`ModuleBuilder::options`]; a plain
//! [`ServiceModule::compose`] always uses the defaults.
//!
//! [`ModuleBuilder::options`]: crate::ModuleBuilder::options
//! [`ServiceModule::compose`]: crate::ServiceModule::compose

/// Order in which [`ServiceModule::dispose`](crate::ServiceModule::dispose)
/// visits the selected factories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisposeOrder {
    /// Factory list order. A factory may be disposed before its dependents.
    #[default]
    Registration,
    /// Dependents before their dependencies.
    ReverseDependency,
}

/// Composition and disposal options.
///
/// # Examples
///
/// ```
/// use keyed_di::{DisposeOrder, ModuleOptions, ServiceModule};
///
/// let options = ModuleOptions::default()
///     .detect_cycles(false)
///     .dispose_order(DisposeOrder::ReverseDependency);
///
/// let module = ServiceModule::builder().options(options).build().unwrap();
/// assert_eq!(module.options().dispose_order, DisposeOrder::ReverseDependency);
/// assert!(!module.options().detect_cycles);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleOptions {
    /// Reject dependency cycles spanning several factories at composition.
    ///
    /// Direct self-dependency is always rejected. When disabled, a longer
    /// cycle surfaces as [`DiError::Circular`](crate::DiError::Circular) from
    /// the `get` call that walks into it. Concurrent first requests entering
    /// one cycle from different services can still wait on each other.
    pub detect_cycles: bool,
    pub dispose_order: DisposeOrder,
}

impl Default for ModuleOptions {
    fn default() -> Self {
        Self {
            detect_cycles: true,
            dispose_order: DisposeOrder::Registration,
        }
    }
}

impl ModuleOptions {
    pub fn detect_cycles(mut self, enabled: bool) -> Self {
        self.detect_cycles = enabled;
        self
    }

    pub fn dispose_order(mut self, order: DisposeOrder) -> Self {
        self.dispose_order = order;
        self
    }
}
