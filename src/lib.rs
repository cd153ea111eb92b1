//! # keyed-di
//!
//! Key-addressed dependency injection: a registry of typed service factories
//! that depend on one another, composed into validated modules and resolved
//! asynchronously.
//!
//! ## Features
//!
//! - **Identity keys**: services are addressed by [`ServiceKey`]s compared by
//!   identity, never by name, so same-named services never collide
//! - **Two lifetimes**: singleton (cached until disposed) and one-shot (fresh
//!   on every request)
//! - **Single-flight singletons**: concurrent first requests share one
//!   in-flight initialization
//! - **Validated composition**: self dependencies, missing dependencies and
//!   dependency cycles are rejected before any service is requested
//! - **Last-wins overrides**: compose a base module and append alternatives
//! - **Scoped disposal**: tear down all singletons or only those tagged with a
//!   [`ServiceScope`]
//!
//! ## Quick Start
//!
//! ```rust
//! use keyed_di::{ServiceFactory, ServiceKey, ServiceModule};
//! use std::sync::Arc;
//!
//! struct Config {
//!     database_url: String,
//! }
//!
//! struct UserService {
//!     config: Arc<Config>,
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceKey::<Config>::new("Config");
//! let users = ServiceKey::<UserService>::new("UserService");
//!
//! let module = ServiceModule::compose([
//!     ServiceFactory::singleton(&config).initialize_sync(|_| {
//!         Ok(Config { database_url: "postgres://localhost".to_string() })
//!     }),
//!     ServiceFactory::one_shot(&users, [config.key()]).initialize(|deps| async move {
//!         Ok(UserService { config: deps.at(0)? })
//!     }),
//! ])?;
//!
//! let service = module.get(&users).await?;
//! assert_eq!(service.config.database_url, "postgres://localhost");
//! # Ok(())
//! # }
//! ```
//!
//! ## Scoped Disposal
//!
//! ```rust
//! use keyed_di::{ServiceFactory, ServiceKey, ServiceModule, ServiceScope};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let request = ServiceScope::new("request");
//! let session = ServiceKey::<String>::new("Session");
//!
//! let module = ServiceModule::compose([
//!     ServiceFactory::singleton(&session)
//!         .scope(&request)
//!         .dispose(|session: Arc<String>| println!("closing {session}"))
//!         .initialize_sync(|_| Ok("session-1".to_string())),
//! ])?;
//!
//! let first = module.get(&session).await?;
//! assert_eq!(module.dispose(Some(&request)), 1);
//! let second = module.get(&session).await?;
//! assert!(!Arc::ptr_eq(&first, &second));
//! # Ok(())
//! # }
//! ```

pub mod async_factories;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod factory;
pub mod graph_export;
pub mod key;
pub mod lifetime;
pub mod module;
pub mod observer;
pub mod traits;

mod validation;

pub use async_factories::AsyncFactory;
pub use config::{DisposeOrder, ModuleOptions};
pub use descriptors::ServiceDescriptor;
pub use error::{BoxError, DiError, DiResult};
pub use factory::{Dependencies, OneShotBuilder, ServiceFactory, SingletonBuilder};
pub use graph_export::{DependencyGraph, GraphEdge, GraphNode};
pub use key::{Key, ServiceKey, ServiceScope};
pub use lifetime::Lifetime;
pub use module::{ModuleBuilder, ModuleEntry, ServiceModule};
pub use observer::{DiObserver, LoggingObserver};
pub use traits::Dispose;
