use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use crate::{
    injector::Injector,
    types::{DynError, Injectable, Instance, TypeInfo},
};

/// Builds a service out of a provider object.
///
/// The provider is default constructed the first time its service is requested,
/// `register` is called once and the provider is dropped afterwards.
pub trait ServiceProvider: Default + Send + 'static {
    type Service: Injectable;

    /// Returns the typeinfo about the provided service
    fn supplies() -> TypeInfo {
        TypeInfo::of::<Self::Service>()
    }

    /// Builds the service, the injector can be used to fetch other services
    fn register(self, injector: &Injector) -> Result<Self::Service, impl Into<DynError>>;
}

/// Callback stored by a factory recipe
pub type FactoryFn = dyn Fn(&Injector) -> Result<Instance, DynError> + Send + Sync;

/// How a named service gets constructed
pub enum Recipe {
    /// Default constructed type
    Service {
        info: TypeInfo,
        construct: fn() -> Result<Instance, DynError>,
    },
    /// Callback invoked with the injector
    Factory(Box<FactoryFn>),
    /// Provider type whose `register` step yields the instance
    Provider {
        info: TypeInfo,
        build: fn(&Injector) -> Result<Instance, DynError>,
    },
}

impl Recipe {
    pub fn service<T: Injectable + Default>() -> Self {
        fn construct<T: Injectable + Default>() -> Result<Instance, DynError> {
            Ok(Instance::new(T::default()))
        }

        Recipe::Service {
            info: TypeInfo::of::<T>(),
            construct: construct::<T>,
        }
    }

    pub fn factory<T, E, F>(factory: F) -> Self
    where
        T: Injectable,
        E: Into<DynError>,
        F: Fn(&Injector) -> Result<T, E> + Send + Sync + 'static,
    {
        Recipe::Factory(Box::new(move |injector: &Injector| {
            factory(injector).map(Instance::new).map_err(Into::into)
        }))
    }

    pub fn provider<P: ServiceProvider>() -> Self {
        fn build<P: ServiceProvider>(injector: &Injector) -> Result<Instance, DynError> {
            P::default()
                .register(injector)
                .map(Instance::new)
                .map_err(|e| e.into())
        }

        Recipe::Provider {
            info: P::supplies(),
            build: build::<P>,
        }
    }

    /// Name of the construction strategy
    pub fn kind(&self) -> &'static str {
        match self {
            Recipe::Service { .. } => "service",
            Recipe::Factory(_) => "factory",
            Recipe::Provider { .. } => "provider",
        }
    }

    /// Type of the built instance, if known before construction
    pub fn supplies(&self) -> Option<TypeInfo> {
        match self {
            Recipe::Service { info, .. } | Recipe::Provider { info, .. } => Some(*info),
            Recipe::Factory(_) => None,
        }
    }

    pub(crate) fn construct(&self, injector: &Injector) -> Result<Instance, DynError> {
        match self {
            Recipe::Service { construct, .. } => construct(),
            Recipe::Factory(factory) => factory(injector),
            Recipe::Provider { build, .. } => build(injector),
        }
    }
}

impl std::fmt::Debug for Recipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Recipe");
        debug.field("kind", &self.kind());
        if let Some(info) = self.supplies() {
            debug.field("supplies", &info.type_name);
        }
        debug.finish()
    }
}

/// A recipe together with its memo slot
pub(crate) struct ServiceCell {
    recipe: Recipe,
    memo: OnceLock<Instance>,
    /// Held while the recipe runs, so only one thread constructs
    claim: Mutex<()>,
}

impl ServiceCell {
    pub(crate) fn new(recipe: Recipe) -> Self {
        Self {
            recipe,
            memo: OnceLock::new(),
            claim: Mutex::new(()),
        }
    }

    pub(crate) fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub(crate) fn get(&self) -> Option<&Instance> {
        self.memo.get()
    }

    pub(crate) fn claim(&self) -> MutexGuard<'_, ()> {
        self.claim.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Must be called while holding the claim
    pub(crate) fn store(&self, instance: Instance) {
        // Only the claim holder sets the memo, after checking it is empty
        let _ = self.memo.set(instance);
    }
}

impl std::fmt::Debug for ServiceCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCell")
            .field("recipe", &self.recipe)
            .field("constructed", &self.memo.get().is_some())
            .finish()
    }
}
