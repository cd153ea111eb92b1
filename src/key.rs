//! Identity tokens used to address services and disposal scopes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_KEY_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Type-erased service address.
///
/// Every call to [`ServiceKey::new`] allocates a fresh id, so two keys built
/// with the same name are still different services. The name exists only for
/// diagnostics and never takes part in equality or hashing.
///
/// # Examples
///
/// ```rust
/// use keyed_di::ServiceKey;
///
/// let a = ServiceKey::<u32>::new("Port");
/// let b = ServiceKey::<u32>::new("Port");
///
/// assert_eq!(a.key().name(), b.key().name());
/// assert_ne!(a.key(), b.key());
/// assert_eq!(a.key(), a.clone().key());
/// ```
#[derive(Clone)]
pub struct Key {
    id: u64,
    name: Arc<str>,
}

impl Key {
    fn allocate(name: Arc<str>) -> Self {
        Self {
            id: NEXT_KEY_ID.fetch_add(1, Ordering::Relaxed),
            name,
        }
    }

    /// Unique id of this address.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Human-readable name used in error messages and graph output.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        self.name.clone()
    }
}

impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl Hash for Key {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({}#{})", self.name, self.id)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Typed service address.
///
/// The type parameter ties the key to the value its factory produces, so
/// [`ServiceModule::get`](crate::ServiceModule::get) can hand back an
/// `Arc<T>` without the caller naming the type twice.
pub struct ServiceKey<T: ?Sized> {
    key: Key,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized> ServiceKey<T> {
    /// Creates a new, globally unique key.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            key: Key::allocate(name.into()),
            _marker: PhantomData,
        }
    }

    /// Returns the type-erased address, e.g. for dependency lists.
    #[inline]
    pub fn key(&self) -> Key {
        self.key.clone()
    }

    /// Borrows the type-erased address.
    #[inline]
    pub fn as_key(&self) -> &Key {
        &self.key
    }

    pub fn name(&self) -> &str {
        self.key.name()
    }
}

impl<T: ?Sized> Clone for ServiceKey<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> PartialEq for ServiceKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T: ?Sized> Eq for ServiceKey<T> {}

impl<T: ?Sized> Hash for ServiceKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for ServiceKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceKey({}#{})", self.key.name, self.key.id)
    }
}

impl<T: ?Sized> From<&ServiceKey<T>> for Key {
    fn from(key: &ServiceKey<T>) -> Self {
        key.key()
    }
}

impl<T: ?Sized> From<ServiceKey<T>> for Key {
    fn from(key: ServiceKey<T>) -> Self {
        key.key
    }
}

/// Tag grouping factories for bulk disposal.
///
/// Scopes carry no resolution semantics at all; they only select which
/// factories [`ServiceModule::dispose`](crate::ServiceModule::dispose) tears down.
#[derive(Clone)]
pub struct ServiceScope {
    id: u64,
    name: Arc<str>,
}

impl ServiceScope {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for ServiceScope {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceScope {}

impl Hash for ServiceScope {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ServiceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceScope({}#{})", self.name, self.id)
    }
}
