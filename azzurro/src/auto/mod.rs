//! The `auto` module, registered by every runtime.
//!
//! It provides the services the runtime itself needs to bootstrap an application:
//!
//! | Service      | Recipe   | Type                  |
//! |--------------|----------|-----------------------|
//! | `azzurro`    | provider | [AzzurroService]      |
//! | `controller` | factory  | [ControllerService]   |
//! | `event`      | service  | [EventService]        |
//! | `filter`     | factory  | [FilterService]       |
//! | `injector`   | factory  | [InjectorService]     |
//! | `config`     | factory  | `Arc<ConfigProvider>` |

use std::{convert::Infallible, sync::Arc};

use azzurro_config::{ConfigProvider, CONFIG_SERVICE};
use azzurro_di::{
    errors::RegistryError,
    registry::{ModuleHandle, SharedRegistry},
};

pub mod azzurro;
pub mod controller;
pub mod event;
pub mod filter;
pub mod injector;

pub use azzurro::{AzzurroConfig, AzzurroService, AzzurroServiceProvider};
pub use controller::ControllerService;
pub use event::{into_listener, EventService, Listener};
pub use filter::FilterService;
pub use injector::InjectorService;

/// Name of the auto module
pub const AUTO_MODULE: &str = "auto";

pub const AZZURRO_SERVICE: &str = "azzurro";
pub const CONTROLLER_SERVICE: &str = "controller";
pub const EVENT_SERVICE: &str = "event";
pub const FILTER_SERVICE: &str = "filter";
pub const INJECTOR_SERVICE: &str = "injector";

/// Declares the auto module and registers its services
pub fn register_auto_module(
    registry: &SharedRegistry,
    config: Arc<ConfigProvider>,
) -> Result<ModuleHandle, RegistryError> {
    let auto = ModuleHandle::declare(registry, AUTO_MODULE, Some(&[]))?;

    auto.provider::<AzzurroServiceProvider>(AZZURRO_SERVICE)?
        .factory(CONTROLLER_SERVICE, |injector| {
            Ok::<_, Infallible>(ControllerService::new(injector.clone()))
        })?
        .service::<EventService>(EVENT_SERVICE)?
        .factory(FILTER_SERVICE, |injector| {
            Ok::<_, Infallible>(FilterService::new(injector.clone()))
        })?
        .factory(INJECTOR_SERVICE, |injector| {
            Ok::<_, Infallible>(InjectorService::new(injector.clone()))
        })?
        .factory(CONFIG_SERVICE, move |_| Ok::<_, Infallible>(config.clone()))?;

    Ok(auto)
}

#[cfg(test)]
mod tests {
    use azzurro_di::{injector::Injector, registry::ModuleRegistry};

    use super::*;

    fn resolved_auto(config: ConfigProvider) -> Injector {
        let registry = ModuleRegistry::shared();
        let injector = Injector::new(registry.clone());
        register_auto_module(&registry, Arc::new(config)).unwrap();
        injector.resolve_application_dependencies(AUTO_MODULE).unwrap();
        injector
    }

    #[test]
    fn test_auto_module_declares_its_services() {
        let registry = ModuleRegistry::shared();

        let auto = register_auto_module(&registry, Arc::new(ConfigProvider::initialize())).unwrap();

        assert!(auto.dependencies().is_empty());
        assert_eq!(
            auto.service_names(),
            vec!["azzurro", "config", "controller", "event", "filter", "injector"]
        );
    }

    #[test]
    fn test_nothing_is_constructed_before_request() {
        let injector = resolved_auto(ConfigProvider::initialize());

        for service in [AZZURRO_SERVICE, EVENT_SERVICE, INJECTOR_SERVICE] {
            assert!(!injector.is_constructed(service));
        }
    }

    #[test]
    fn test_azzurro_service_uses_default_events() {
        let injector = resolved_auto(ConfigProvider::initialize());

        let azzurro = injector.get_service::<AzzurroService>(AZZURRO_SERVICE).unwrap();

        assert_eq!(azzurro.route_event(), "AF:route");
        assert_eq!(azzurro.callback_event(), "AF:callback");
    }

    #[test]
    fn test_azzurro_service_uses_configured_events() {
        let mut config = ConfigProvider::initialize();
        config
            .add_config(AzzurroConfig {
                route_event: "custom:route".to_string(),
                callback_event: "custom:callback".to_string(),
            })
            .unwrap();
        let injector = resolved_auto(config);

        let azzurro = injector.get_service::<AzzurroService>(AZZURRO_SERVICE).unwrap();

        assert_eq!(azzurro.route_event(), "custom:route");
        assert_eq!(azzurro.callback_event(), "custom:callback");
    }

    #[test]
    fn test_injector_service_shares_memoized_services() {
        let injector = resolved_auto(ConfigProvider::initialize());

        let service = injector
            .get_service::<InjectorService>(INJECTOR_SERVICE)
            .unwrap();
        let events = service.get_service::<EventService>(EVENT_SERVICE).unwrap();

        assert!(Arc::ptr_eq(
            &events,
            &injector.get_service::<EventService>(EVENT_SERVICE).unwrap()
        ));
        assert!(service.is_constructed(EVENT_SERVICE));
    }

    #[test]
    fn test_controller_and_filter_lookup_by_suffix() {
        let registry = ModuleRegistry::shared();
        let injector = Injector::new(registry.clone());
        register_auto_module(&registry, Arc::new(ConfigProvider::initialize())).unwrap();
        ModuleHandle::declare(&registry, "web", Some(&[AUTO_MODULE]))
            .unwrap()
            .factory("homeController", |_| Ok::<_, Infallible>(String::from("home")))
            .unwrap()
            .factory("upperFilter", |_| Ok::<_, Infallible>(String::from("upper")))
            .unwrap();
        injector.resolve_application_dependencies("web").unwrap();

        let controllers = injector
            .get_service::<ControllerService>(CONTROLLER_SERVICE)
            .unwrap();
        let filters = injector.get_service::<FilterService>(FILTER_SERVICE).unwrap();

        assert_eq!(controllers.get::<String>("home").unwrap().as_str(), "home");
        assert_eq!(filters.get::<String>("upper").unwrap().as_str(), "upper");
        assert!(controllers.get::<String>("upper").is_err());
    }
}
