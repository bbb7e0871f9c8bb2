use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use azzurro_di::types::DynError;

use crate::errors::EventError;

/// A registered event listener, receives the name of the emitted event
pub type Listener = dyn Fn(&str) -> Result<(), DynError> + Send + Sync;

/// Boxes a typed listener into a [Listener]
pub fn into_listener<F, E>(listener: F) -> Arc<Listener>
where
    F: Fn(&str) -> Result<(), E> + Send + Sync + 'static,
    E: Into<DynError>,
{
    Arc::new(move |event: &str| listener(event).map_err(Into::into))
}

/// Synchronous event emitter, registered as the `event` service
#[derive(Default)]
pub struct EventService {
    listeners: RwLock<HashMap<String, Vec<Arc<Listener>>>>,
}

impl std::fmt::Debug for EventService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        let mut map = f.debug_map();
        for (event, list) in listeners.iter() {
            map.entry(event, &list.len());
        }
        map.finish()
    }
}

impl EventService {
    /// Registers a listener for an event
    pub fn on<F, E>(&self, event: &str, listener: F)
    where
        F: Fn(&str) -> Result<(), E> + Send + Sync + 'static,
        E: Into<DynError>,
    {
        self.add_listener(event, into_listener(listener));
    }

    /// Registers a listener that has already been boxed with [into_listener]
    pub fn add_listener(&self, event: &str, listener: Arc<Listener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event.to_string())
            .or_default()
            .push(listener);
    }

    /// Runs every listener of the event in registration order.
    ///
    /// Returns once all listeners ran, or on the first failing listener.
    /// Listeners added while the event is emitted only run on the next emission.
    pub fn emit(&self, event: &str) -> Result<(), EventError> {
        // Clone the list, listeners may register further listeners
        let listeners: Vec<Arc<Listener>> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .cloned()
            .unwrap_or_default();

        tracing::debug!("Emitting '{event}' to {} listeners", listeners.len());

        for (index, listener) in listeners.iter().enumerate() {
            if let Err(error) = listener(event) {
                tracing::error!("Listener #{index} of event '{event}' failed: {error}");
                return Err(EventError::ListenerFailed {
                    event: event.to_string(),
                    index,
                    error: Arc::new(error),
                });
            }
        }

        Ok(())
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .map_or(0, Vec::len)
    }
}
