//! Service lifetime definitions.

use std::fmt;

/// Lifetime policy of a factory, fixed when the factory is built.
///
/// # Examples
///
/// ```rust
/// use keyed_di::{Lifetime, ServiceFactory, ServiceKey};
///
/// let port = ServiceKey::<u16>::new("Port");
/// let request_id = ServiceKey::<u64>::new("RequestId");
///
/// let singleton = ServiceFactory::singleton(&port).initialize_sync(|_| Ok(8080));
/// let one_shot = ServiceFactory::one_shot(&request_id, []).initialize_sync(|_| Ok(1));
///
/// assert_eq!(singleton.lifetime(), Lifetime::Singleton);
/// assert_eq!(one_shot.lifetime(), Lifetime::OneShot);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "graph-export", derive(serde::Serialize, serde::Deserialize))]
pub enum Lifetime {
    /// Produced at most once, cached until disposed
    ///
    /// Concurrent first requests share one in-flight initialization.
    Singleton,
    /// Produced fresh on every request, never cached
    ///
    /// One-shot factories hold nothing to release and are skipped by disposal.
    OneShot,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Singleton => f.write_str("singleton"),
            Lifetime::OneShot => f.write_str("one-shot"),
        }
    }
}
