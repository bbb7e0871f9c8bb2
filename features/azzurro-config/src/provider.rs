use std::{any::TypeId, collections::HashMap, sync::Arc};

use azzurro_di::types::{Injectable, Instance, TypeInfo};

use crate::errors::ConfigError;

/// A provider to register all configs.
///
/// Configs can be registered and retrieved based on type.
#[derive(Default)]
pub struct ConfigProvider {
    configs: HashMap<TypeId, Instance>,
}

impl std::fmt::Debug for ConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.configs.values().map(|c| c.info.type_name).collect();
        names.sort();
        f.debug_struct("ConfigProvider")
            .field("configs", &names)
            .finish()
    }
}

impl ConfigProvider {
    /// Initializes an empty Config Provider
    pub fn initialize() -> Self {
        Self::default()
    }

    /// Retrieve a config with specified type, if registered
    pub fn get_config<T: Injectable>(&self) -> Option<Arc<T>> {
        self.configs
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.downcast().ok())
    }

    /// Retrieve a config with specified type.
    ///
    /// If the config type is not available, it will return [`ConfigError::Missing`]
    pub fn require_config<T: Injectable>(&self) -> Result<Arc<T>, ConfigError> {
        self.get_config()
            .ok_or_else(|| ConfigError::Missing(TypeInfo::of::<T>()))
    }

    /// Retrieve a config or its default value if it is not registered
    pub fn config_or_default<T: Injectable + Default>(&self) -> Arc<T> {
        self.get_config().unwrap_or_default()
    }

    /// Add a config to the registry.
    ///
    /// If the config type is already registered, it will return [`ConfigError::AlreadyRegistered`]
    pub fn add_config<T: Injectable>(&mut self, config: T) -> Result<&mut Self, ConfigError> {
        let info = TypeInfo::of::<T>();

        if self.configs.contains_key(&info.type_id) {
            return Err(ConfigError::AlreadyRegistered(info));
        }

        tracing::debug!("Registering config {info}");
        self.configs.insert(info.type_id, Instance::new(config));
        Ok(self)
    }

    /// Can optionally add a config to the registry.
    ///
    /// If the config provided is `Some(T)`, it will be the same as calling [`ConfigProvider::add_config`]
    /// If the config provided is `None`, then the function just returns `Ok(self)` for chaining
    pub fn maybe_add_config<T: Injectable>(
        &mut self,
        config: Option<T>,
    ) -> Result<&mut Self, ConfigError> {
        match config {
            Some(c) => self.add_config(c),
            None => Ok(self),
        }
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
