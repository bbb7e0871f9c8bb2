//! Azzurro DI resolves the module graph of an application and lazily constructs its services.
//!
//! It consists of the following parts:
//!
//! 1. [ModuleRegistry] - named modules, their dependencies and their service recipes
//! 2. [Recipe] - how a service is built: default constructed, factory callback or provider
//! 3. [DependencyGraph] - resolution order and detection of missing or circular dependencies
//! 4. [Injector] - resolves an app module and hands out memoized services
//!
//! # Example
//!
//! ```rust
//! use std::convert::Infallible;
//! use azzurro_di::{Injector, ModuleHandle, ModuleRegistry};
//!
//! let registry = ModuleRegistry::shared();
//! let injector = Injector::new(registry.clone());
//!
//! ModuleHandle::declare(&registry, "storage", Some(&[])).unwrap()
//!     .factory("path", |_| Ok::<_, Infallible>(String::from("/tmp")))
//!     .unwrap();
//! ModuleHandle::declare(&registry, "app", Some(&["storage"])).unwrap();
//!
//! injector.resolve_application_dependencies("app").unwrap();
//! let path = injector.get_service::<String>("path").unwrap();
//! assert_eq!(path.as_str(), "/tmp");
//! ```

pub mod dependency_graph;
pub mod errors;
pub mod injector;
pub mod recipe;
pub mod registry;
pub mod types;

pub use dependency_graph::{DependencyGraph, DependencyGraphError, DependencyGraphErrors};
pub use errors::{RegistryError, RequireError};
pub use injector::Injector;
pub use recipe::{Recipe, ServiceProvider};
pub use registry::{Module, ModuleHandle, ModuleRegistry, SharedRegistry};
pub use types::{is_valid_identifier, DynError, Injectable, Instance, TypeInfo};
