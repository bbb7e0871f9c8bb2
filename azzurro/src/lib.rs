//! Azzurro is a small inversion of control runtime.
//!
//! An application is made of named modules. Each module declares the modules it
//! depends on and a set of lazily constructed services. The [Azzurro] runtime
//! resolves the dependencies of the app module and emits the lifecycle events
//! while services are pulled from the [Injector] on demand.
//!
//! # Example
//!
//! ```rust
//! use std::{convert::Infallible, sync::{Arc, Mutex}};
//! use azzurro::{Azzurro, EVENT_ENDED, EVENT_STARTED};
//!
//! let azzurro = Azzurro::new();
//! azzurro
//!     .module("greeting", Some(&[])).unwrap()
//!     .factory("greeter", |_| Ok::<_, Infallible>(String::from("hello")))
//!     .unwrap();
//! azzurro.app("main", Some(&["auto", "greeting"])).unwrap();
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! for event in [EVENT_STARTED, EVENT_ENDED] {
//!     let seen = seen.clone();
//!     azzurro
//!         .on(event, move |event| {
//!             seen.lock().unwrap().push(event.to_string());
//!             Ok::<_, Infallible>(())
//!         })
//!         .unwrap();
//! }
//!
//! azzurro.bootstrap().unwrap();
//!
//! let greeter = azzurro.injector().get_service::<String>("greeter").unwrap();
//! assert_eq!(greeter.as_str(), "hello");
//! assert_eq!(*seen.lock().unwrap(), vec![EVENT_STARTED, EVENT_ENDED]);
//! ```

pub mod auto;
pub mod errors;
pub mod runtime;

pub use azzurro_config::{Config, ConfigError, ConfigProvider};
pub use azzurro_di::{
    DynError, Injectable, Injector, ModuleHandle, RegistryError, RequireError, ServiceProvider,
};
pub use errors::{AzzurroError, EventError};
pub use runtime::{Azzurro, EVENT_ENDED, EVENT_STARTED};
