//! Disposal trait for resource cleanup.

/// Trait for synchronous resource disposal.
///
/// Implement this for services that need structured teardown (flushing
/// buffers, closing connections) and register the singleton with
/// [`SingletonBuilder::disposable`](crate::SingletonBuilder::disposable).
/// Disposal runs synchronously; keep implementations non-blocking.
///
/// # Examples
///
/// ```
/// use keyed_di::{Dispose, ServiceFactory, ServiceKey, ServiceModule};
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// struct Cache {
///     flushed: Arc<AtomicBool>,
/// }
///
/// impl Dispose for Cache {
///     fn dispose(&self) {
///         self.flushed.store(true, Ordering::SeqCst);
///     }
/// }
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let flushed = Arc::new(AtomicBool::new(false));
/// let cache = ServiceKey::<Cache>::new("Cache");
///
/// let flag = flushed.clone();
/// let module = ServiceModule::compose([
///     ServiceFactory::singleton(&cache)
///         .disposable()
///         .initialize_sync(move |_| Ok(Cache { flushed: flag.clone() })),
/// ])?;
///
/// module.get(&cache).await?;
/// module.dispose(None);
/// assert!(flushed.load(Ordering::SeqCst));
/// # Ok(())
/// # }
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}
