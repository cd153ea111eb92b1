//! Async initializer support.
//!
//! Factories receive their resolved [`Dependencies`] and may suspend while
//! producing a value (opening connections, handshakes, warm-up). Closures are
//! the usual way to provide one; [`AsyncFactory`] lets a struct carry its own
//! configuration instead.

use std::future::Future;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::factory::Dependencies;

/// Trait for initializers that create services asynchronously.
///
/// # Examples
///
/// ```
/// use keyed_di::{AsyncFactory, BoxError, Dependencies, ServiceFactory, ServiceKey, ServiceModule};
/// use async_trait::async_trait;
///
/// struct DatabasePool {
///     url: String,
/// }
///
/// struct PoolFactory {
///     url: String,
/// }
///
/// #[async_trait]
/// impl AsyncFactory<DatabasePool> for PoolFactory {
///     async fn create(&self, _deps: Dependencies) -> Result<DatabasePool, BoxError> {
///         tokio::time::sleep(std::time::Duration::from_millis(5)).await;
///         Ok(DatabasePool { url: self.url.clone() })
///     }
/// }
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = ServiceKey::<DatabasePool>::new("DatabasePool");
/// let module = ServiceModule::compose([
///     ServiceFactory::singleton(&pool)
///         .initialize_with(PoolFactory { url: "postgres://localhost".into() }),
/// ])?;
///
/// assert_eq!(module.get(&pool).await?.url, "postgres://localhost");
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait AsyncFactory<T: Send + Sync + 'static>: Send + Sync + 'static {
    /// Creates a new instance from the resolved dependencies.
    async fn create(&self, deps: Dependencies) -> Result<T, BoxError>;
}

#[async_trait]
impl<T, F, Fut> AsyncFactory<T> for F
where
    T: Send + Sync + 'static,
    F: Fn(Dependencies) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
{
    async fn create(&self, deps: Dependencies) -> Result<T, BoxError> {
        self(deps).await
    }
}

/// Adapter turning a synchronous initializer into an [`AsyncFactory`].
pub(crate) struct SyncFactory<F>(pub(crate) F);

#[async_trait]
impl<T, F> AsyncFactory<T> for SyncFactory<F>
where
    T: Send + Sync + 'static,
    F: Fn(Dependencies) -> Result<T, BoxError> + Send + Sync + 'static,
{
    async fn create(&self, deps: Dependencies) -> Result<T, BoxError> {
        (self.0)(deps)
    }
}
