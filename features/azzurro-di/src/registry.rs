use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{
    errors::RegistryError,
    injector::Injector,
    recipe::{Recipe, ServiceCell, ServiceProvider},
    types::{is_valid_identifier, DynError, Injectable},
};

/// Registry shared between the facade, the module handles and the injector
pub type SharedRegistry = Arc<RwLock<ModuleRegistry>>;

pub(crate) fn read(registry: &SharedRegistry) -> RwLockReadGuard<'_, ModuleRegistry> {
    registry.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write(registry: &SharedRegistry) -> RwLockWriteGuard<'_, ModuleRegistry> {
    registry.write().unwrap_or_else(PoisonError::into_inner)
}

/// A declared module
#[derive(Debug)]
pub struct Module {
    dependencies: Vec<String>,
    services: HashMap<String, Arc<ServiceCell>>,
}

impl Module {
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Names of the declared services, sorted
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn cell(&self, name: &str) -> Option<&Arc<ServiceCell>> {
        self.services.get(name)
    }
}

/// All declared modules with their dependencies and service recipes
#[derive(Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Module>,
    /// Module names in declaration order
    declared: Vec<String>,
    /// The designated app module
    app: Option<String>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a fresh registry for sharing
    pub fn shared() -> SharedRegistry {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Declares or retrieves a module.
    ///
    /// With `Some(dependencies)` an unknown module is created, a known module keeps
    /// its original dependencies. With `None` the module must already exist.
    pub fn declare_module(
        &mut self,
        name: &str,
        dependencies: Option<&[&str]>,
    ) -> Result<&Module, RegistryError> {
        validate_name(name)?;
        if let Some(dependencies) = dependencies {
            for dependency in dependencies {
                validate_name(dependency)?;
            }
        }

        if !self.modules.contains_key(name) {
            let Some(dependencies) = dependencies else {
                return Err(RegistryError::ModuleNotFound(name.to_string()));
            };

            tracing::debug!("Declaring module '{name}' with dependencies {dependencies:?}");
            self.modules.insert(
                name.to_string(),
                Module {
                    dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
                    services: HashMap::new(),
                },
            );
            self.declared.push(name.to_string());
        }

        self.get_module(name)
    }

    /// Declares or retrieves the app module.
    ///
    /// The module becomes the app module only if dependencies are given.
    pub fn declare_app(
        &mut self,
        name: &str,
        dependencies: Option<&[&str]>,
    ) -> Result<&Module, RegistryError> {
        validate_name(name)?;
        if let Some(registered) = &self.app {
            if registered != name {
                return Err(RegistryError::AppAlreadyRegistered {
                    registered: registered.clone(),
                    requested: name.to_string(),
                });
            }
        }

        self.declare_module(name, dependencies)?;

        if dependencies.is_some() && self.app.is_none() {
            tracing::debug!("Module '{name}' is the app module");
            self.app = Some(name.to_string());
        }

        self.get_module(name)
    }

    pub fn get_module(&self, name: &str) -> Result<&Module, RegistryError> {
        self.modules
            .get(name)
            .ok_or_else(|| RegistryError::ModuleNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn app_name(&self) -> Option<&str> {
        self.app.as_deref()
    }

    /// Module names in declaration order
    pub fn module_names(&self) -> &[String] {
        &self.declared
    }

    /// Adds a recipe to a module, replacing any recipe with the same name
    pub fn register(
        &mut self,
        module: &str,
        service: &str,
        recipe: Recipe,
    ) -> Result<(), RegistryError> {
        validate_name(service)?;
        let entry = self
            .modules
            .get_mut(module)
            .ok_or_else(|| RegistryError::ModuleNotFound(module.to_string()))?;

        tracing::debug!(
            "Registering {} '{service}' on module '{module}'",
            recipe.kind()
        );
        if entry
            .services
            .insert(service.to_string(), Arc::new(ServiceCell::new(recipe)))
            .is_some()
        {
            tracing::debug!("Service '{service}' on module '{module}' has been replaced");
        }

        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), RegistryError> {
    match is_valid_identifier(name) {
        true => Ok(()),
        false => Err(RegistryError::InvalidName(name.to_string())),
    }
}

/// Handle to a declared module, used to register its services
#[derive(Clone)]
pub struct ModuleHandle {
    name: String,
    registry: SharedRegistry,
}

impl std::fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies())
            .field("services", &self.service_names())
            .finish()
    }
}

impl ModuleHandle {
    /// Declares or retrieves a module, see [ModuleRegistry::declare_module]
    pub fn declare(
        registry: &SharedRegistry,
        name: &str,
        dependencies: Option<&[&str]>,
    ) -> Result<Self, RegistryError> {
        write(registry).declare_module(name, dependencies)?;
        Ok(Self::bind(registry, name))
    }

    /// Declares or retrieves the app module, see [ModuleRegistry::declare_app]
    pub fn declare_app(
        registry: &SharedRegistry,
        name: &str,
        dependencies: Option<&[&str]>,
    ) -> Result<Self, RegistryError> {
        write(registry).declare_app(name, dependencies)?;
        Ok(Self::bind(registry, name))
    }

    fn bind(registry: &SharedRegistry, name: &str) -> Self {
        Self {
            name: name.to_string(),
            registry: registry.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> Vec<String> {
        read(&self.registry)
            .get_module(&self.name)
            .map(|module| module.dependencies().to_vec())
            .unwrap_or_default()
    }

    pub fn has_service(&self, name: &str) -> bool {
        read(&self.registry)
            .get_module(&self.name)
            .is_ok_and(|module| module.has_service(name))
    }

    pub fn service_names(&self) -> Vec<String> {
        read(&self.registry)
            .get_module(&self.name)
            .map(Module::service_names)
            .unwrap_or_default()
    }

    /// Registers a type which is default constructed on first request
    pub fn service<T: Injectable + Default>(&self, name: &str) -> Result<&Self, RegistryError> {
        self.register(name, Recipe::service::<T>())
    }

    /// Registers a callback which is invoked once on first request
    pub fn factory<T, E, F>(&self, name: &str, factory: F) -> Result<&Self, RegistryError>
    where
        T: Injectable,
        E: Into<DynError>,
        F: Fn(&Injector) -> Result<T, E> + Send + Sync + 'static,
    {
        self.register(name, Recipe::factory(factory))
    }

    /// Registers a provider whose `register` step builds the service on first request
    pub fn provider<P: ServiceProvider>(&self, name: &str) -> Result<&Self, RegistryError> {
        self.register(name, Recipe::provider::<P>())
    }

    fn register(&self, name: &str, recipe: Recipe) -> Result<&Self, RegistryError> {
        write(&self.registry).register(&self.name, name, recipe)?;
        Ok(self)
    }
}
