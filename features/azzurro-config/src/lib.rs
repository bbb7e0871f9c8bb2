//! Typed configuration for an Azzurro runtime.
//!
//! Configs are plain structs, keyed by their type:
//! 1. ConfigProvider: holds at most one value per config type
//! 2. Config<T>: pulls a config out of the `config` service of a resolved injector
//!
//! # Examples
//!
//! ```rust
//! use azzurro_config::ConfigProvider;
//!
//! #[derive(Clone)]
//! struct AppConfig {
//!     host: String,
//!     port: u16,
//! }
//!
//! let app_config = AppConfig {
//!     host: "localhost".to_string(),
//!     port: 8080_u16,
//! };
//!
//! let mut config_provider = ConfigProvider::initialize();
//! config_provider.add_config(app_config.clone()).unwrap();
//!
//! let retrieved_config = config_provider.get_config::<AppConfig>().unwrap();
//! assert_eq!(app_config.host, retrieved_config.host);
//! assert_eq!(app_config.port, retrieved_config.port);
//! ```

pub mod config;
pub mod errors;
pub mod provider;

pub use config::{Config, CONFIG_SERVICE};
pub use errors::ConfigError;
pub use provider::ConfigProvider;
