use std::sync::Arc;

use thiserror::Error;

use crate::types::DynError;

/// Errors while declaring or retrieving modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A module, dependency or service name is not a valid identifier
    #[error("'{0}' is not a valid name")]
    InvalidName(String),
    /// A module was looked up without ever being declared
    #[error("Module '{0}' has not been registered")]
    ModuleNotFound(String),
    /// Another module has already been designated as the app module
    #[error("App module has already been registered as '{registered}', can't register '{requested}'")]
    AppAlreadyRegistered {
        registered: String,
        requested: String,
    },
}

/// Errors when trying to get a service
#[derive(Error, Debug, Clone)]
pub enum RequireError {
    /// No module declares the service
    #[error("Service '{0}' is not declared by any module")]
    ServiceNotFound(String),
    /// The owning module is not part of the resolved dependency graph
    #[error("Service '{service}' belongs to module '{module}' which has not been resolved")]
    ModuleNotResolved { service: String, module: String },
    /// The service, factory or provider failed to build the instance
    #[error("Construction of service '{service}' failed - error: {error}")]
    ServiceConstructionFailed {
        service: String,
        error: Arc<DynError>,
    },
    /// The service was requested again while it was being constructed
    #[error("Service '{service}' requires itself during construction through {chain:?}")]
    CircularConstruction { service: String, chain: Vec<String> },

    #[error("Failed to downcast service '{service}', required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        service: String,
        required_type: &'static str,
        actual_type: &'static str,
    },
}
