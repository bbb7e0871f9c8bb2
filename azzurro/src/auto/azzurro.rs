use azzurro_config::{Config, ConfigError};
use azzurro_di::{injector::Injector, recipe::ServiceProvider};

/// Configures the event names reported by the `azzurro` service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzzurroConfig {
    /// Emitted to start the routing process
    pub route_event: String,
    /// Emitted to run the callbacks selected by routing
    pub callback_event: String,
}
impl Default for AzzurroConfig {
    fn default() -> Self {
        Self {
            route_event: "AF:route".to_string(),
            callback_event: "AF:callback".to_string(),
        }
    }
}

/// The `azzurro` service, tells bootstrap which events drive routing
#[derive(Debug, Clone)]
pub struct AzzurroService {
    route_event: String,
    callback_event: String,
}
impl AzzurroService {
    pub fn route_event(&self) -> &str {
        &self.route_event
    }

    pub fn callback_event(&self) -> &str {
        &self.callback_event
    }
}

/// Builds the [AzzurroService] out of the registered [AzzurroConfig]
#[derive(Default)]
pub struct AzzurroServiceProvider;
impl ServiceProvider for AzzurroServiceProvider {
    type Service = AzzurroService;

    fn register(self, injector: &Injector) -> Result<AzzurroService, ConfigError> {
        let config = Config::<AzzurroConfig>::resolve_or_default(injector)?;
        tracing::debug!(
            "Routing on '{}', callbacks on '{}'",
            config.route_event,
            config.callback_event
        );

        Ok(AzzurroService {
            route_event: config.route_event.clone(),
            callback_event: config.callback_event.clone(),
        })
    }
}
