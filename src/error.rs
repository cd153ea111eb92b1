//! Error types for the dependency injection container.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Error type user initializers return.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Dependency injection errors
///
/// Composition errors (`SelfDependency`, `MissingDependencies`, `Circular`)
/// abort [`ServiceModule::compose`](crate::ServiceModule::compose); no
/// partially valid module is ever returned. Resolution errors abort the
/// single `get` call that hit them and leave every cached singleton intact.
///
/// # Examples
///
/// ```rust
/// use keyed_di::DiError;
///
/// let missing = DiError::MissingDependencies {
///     service: "App".into(),
///     missing: vec!["Config".into(), "Logger".into()],
/// };
/// assert_eq!(
///     missing.to_string(),
///     "Service 'App' has unresolved dependencies:\n  Config\n  Logger"
/// );
///
/// let not_found = DiError::NotFound("Cache".into());
/// assert_eq!(not_found.to_string(), "No suitable factory for service: Cache");
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// A factory lists its own key among its dependencies
    SelfDependency { service: Arc<str> },
    /// A factory depends on keys no factory in the module provides
    MissingDependencies {
        service: Arc<str>,
        missing: Vec<Arc<str>>,
    },
    /// Dependency cycle spanning several factories (includes path)
    Circular(Vec<Arc<str>>),
    /// No factory provides the requested key
    NotFound(Arc<str>),
    /// Resolved value is not of the requested type
    TypeMismatch(Arc<str>),
    /// Positional dependency access past the end of the dependency list
    DependencyIndex {
        service: Arc<str>,
        index: usize,
        len: usize,
    },
    /// User initializer failed; `source` is the error it returned
    Initialization {
        service: Arc<str>,
        source: Arc<dyn Error + Send + Sync + 'static>,
    },
}

impl DiError {
    pub(crate) fn initialization(service: Arc<str>, source: BoxError) -> Self {
        DiError::Initialization {
            service,
            source: Arc::from(source),
        }
    }

    /// Returns true for errors raised while composing a module.
    pub fn is_composition_error(&self) -> bool {
        matches!(
            self,
            DiError::SelfDependency { .. } | DiError::MissingDependencies { .. } | DiError::Circular(_)
        )
    }
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::SelfDependency { service } => {
                write!(f, "Service '{}' depends on itself", service)
            }
            DiError::MissingDependencies { service, missing } => {
                write!(f, "Service '{}' has unresolved dependencies:", service)?;
                for name in missing {
                    write!(f, "\n  {}", name)?;
                }
                Ok(())
            }
            DiError::Circular(path) => {
                let names: Vec<&str> = path.iter().map(|n| n.as_ref()).collect();
                write!(f, "Circular dependency: {}", names.join(" -> "))
            }
            DiError::NotFound(name) => write!(f, "No suitable factory for service: {}", name),
            DiError::TypeMismatch(name) => write!(f, "Type mismatch for: {}", name),
            DiError::DependencyIndex { service, index, len } => write!(
                f,
                "Dependency index {} out of range for '{}' ({} dependencies)",
                index, service, len
            ),
            DiError::Initialization { service, source } => {
                write!(f, "Failed to initialize '{}': {}", service, source)
            }
        }
    }
}

impl Error for DiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DiError::Initialization { source, .. } => Some(source.as_ref() as &(dyn Error + 'static)),
            _ => None,
        }
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
