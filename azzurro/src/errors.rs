use std::sync::Arc;

use azzurro_di::{
    dependency_graph::DependencyGraphError,
    errors::{RegistryError, RequireError},
    types::DynError,
};
use thiserror::Error;

/// Errors while emitting an event
#[derive(Error, Debug, Clone)]
pub enum EventError {
    /// A listener returned an error, the remaining listeners were skipped
    #[error("Listener #{index} of event '{event}' failed - error: {error}")]
    ListenerFailed {
        event: String,
        index: usize,
        error: Arc<DynError>,
    },
}

/// Errors of the application runtime
#[derive(Error, Debug, Clone)]
pub enum AzzurroError {
    /// `bootstrap` was called before an app module was declared
    #[error("App module has not been defined")]
    AppModuleNotRegistered,
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    DependencyGraph(#[from] DependencyGraphError),
    #[error(transparent)]
    Require(#[from] RequireError),
    #[error(transparent)]
    Event(#[from] EventError),
}
