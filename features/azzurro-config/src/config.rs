use std::{ops::Deref, sync::Arc};

use azzurro_di::{injector::Injector, types::Injectable};

use crate::{errors::ConfigError, provider::ConfigProvider};

/// Name of the service exposing the [ConfigProvider]
pub const CONFIG_SERVICE: &str = "config";

/// A wrapper type to allow for config injections
///
/// This provides a simple way to retrieve configs from the config registry
/// inside of factories and providers
///
/// # Example
/// ```rust
/// use std::convert::Infallible;
/// use azzurro_config::{Config, ConfigProvider, CONFIG_SERVICE};
/// use azzurro_di::{Injector, ModuleHandle, ModuleRegistry};
///
/// #[derive(Clone)]
/// pub struct MailConfig {
///     sender: String,
/// }
///
/// let mut provider = ConfigProvider::initialize();
/// provider.add_config(MailConfig { sender: "noreply@example.com".to_string() }).unwrap();
/// let provider = std::sync::Arc::new(provider);
///
/// let registry = ModuleRegistry::shared();
/// let injector = Injector::new(registry.clone());
/// ModuleHandle::declare(&registry, "app", Some(&[])).unwrap()
///     .factory(CONFIG_SERVICE, move |_| Ok::<_, Infallible>(provider.clone()))
///     .unwrap();
/// injector.resolve_application_dependencies("app").unwrap();
///
/// let config = Config::<MailConfig>::resolve(&injector).unwrap();
/// assert_eq!(config.sender, "noreply@example.com");
/// ```
pub struct Config<T> {
    inner: Arc<T>,
}
impl<T> Deref for Config<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
impl<T> Config<T> {
    pub fn inner(&self) -> Arc<T> {
        self.inner.clone()
    }

    pub fn into_inner(self) -> Arc<T> {
        self.inner
    }
}

impl<T: Injectable> Config<T> {
    /// Fetches the config from the `config` service of the injector
    pub fn resolve(injector: &Injector) -> Result<Self, ConfigError> {
        let provider = Self::provider(injector)?;
        Ok(Config {
            inner: provider.require_config()?,
        })
    }

    /// Like [Config::resolve] but falls back to the default value if the config is not registered
    pub fn resolve_or_default(injector: &Injector) -> Result<Self, ConfigError>
    where
        T: Default,
    {
        let provider = Self::provider(injector)?;
        Ok(Config {
            inner: provider.config_or_default(),
        })
    }

    fn provider(injector: &Injector) -> Result<Arc<ConfigProvider>, ConfigError> {
        // The service holds an Arc so the provider can be shared with the runtime
        let provider = injector.get_service::<Arc<ConfigProvider>>(CONFIG_SERVICE)?;
        Ok((*provider).clone())
    }
}
