use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, OnceLock, PoisonError,
    },
};

use azzurro_config::ConfigProvider;
use azzurro_di::{
    errors::RegistryError,
    injector::Injector,
    registry::{ModuleHandle, ModuleRegistry, SharedRegistry},
    types::DynError,
};

use crate::{
    auto::{
        self, into_listener, AzzurroService, EventService, Listener, AUTO_MODULE,
        AZZURRO_SERVICE, EVENT_SERVICE,
    },
    errors::AzzurroError,
};

/// Emitted first by [Azzurro::bootstrap]
pub const EVENT_STARTED: &str = "AF:started";
/// Emitted last by [Azzurro::bootstrap]
pub const EVENT_ENDED: &str = "AF:ended";

static GLOBAL: OnceLock<Azzurro> = OnceLock::new();

/// The application runtime.
///
/// Owns the module registry and the injector. Modules are declared with
/// [Azzurro::module] and [Azzurro::app], [Azzurro::bootstrap] then resolves the
/// app module and emits the lifecycle events:
///
/// `AF:started` -> route event -> callback event -> `AF:ended`
///
/// A process normally uses the single instance returned by [Azzurro::global].
/// Separate runtimes can be created with [Azzurro::new], e.g. for tests.
pub struct Azzurro {
    registry: SharedRegistry,
    injector: Injector,
    /// Claimed by the first [Azzurro::bootstrap], released again if it fails
    bootstrapping: AtomicBool,
    booted: AtomicBool,
    /// Listeners registered before the `auto` module was resolved
    pending: Mutex<Vec<(String, Arc<Listener>)>>,
}

impl Debug for Azzurro {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Azzurro")
            .field("app", &self.app_name())
            .field("booted", &self.is_booted())
            .field("injector", &self.injector)
            .finish()
    }
}

/// Moves queued listeners to the event service, keeping their order
fn hand_over(pending: &mut Vec<(String, Arc<Listener>)>, events: &EventService) {
    for (event, listener) in pending.drain(..) {
        events.add_listener(&event, listener);
    }
}

impl Default for Azzurro {
    fn default() -> Self {
        Self::new()
    }
}

impl Azzurro {
    /// Creates a runtime without any config, defaults apply
    pub fn new() -> Self {
        Self::with_config(ConfigProvider::initialize())
    }

    /// Creates a runtime whose `config` service exposes the given configs
    pub fn with_config(config: ConfigProvider) -> Self {
        let registry = ModuleRegistry::shared();
        let injector = Injector::new(registry.clone());

        // Only fails on invalid names, the auto module uses constant valid ones
        if let Err(error) = auto::register_auto_module(&registry, Arc::new(config)) {
            tracing::error!("Failed to register the auto module: {error}");
        }

        Self {
            registry,
            injector,
            bootstrapping: AtomicBool::new(false),
            booted: AtomicBool::new(false),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// The process wide runtime, created on first access
    pub fn global() -> &'static Azzurro {
        GLOBAL.get_or_init(|| {
            tracing::debug!("Creating the global runtime");
            Azzurro::new()
        })
    }

    /// Declares or retrieves the app module.
    ///
    /// With dependencies the module becomes the app module. Only one app module can
    /// exist, declaring a different one fails with [RegistryError::AppAlreadyRegistered].
    pub fn app(
        &self,
        name: &str,
        dependencies: Option<&[&str]>,
    ) -> Result<ModuleHandle, RegistryError> {
        ModuleHandle::declare_app(&self.registry, name, dependencies)
    }

    /// Declares a module, or retrieves it if `dependencies` is `None` or the module exists.
    ///
    /// The dependencies of an existing module are never changed.
    pub fn module(
        &self,
        name: &str,
        dependencies: Option<&[&str]>,
    ) -> Result<ModuleHandle, RegistryError> {
        ModuleHandle::declare(&self.registry, name, dependencies)
    }

    /// Resolves the app module and emits the lifecycle events.
    ///
    /// Runs once. Further calls, including concurrent ones and calls made from a
    /// listener, return `Ok(())` without emitting anything. A failed bootstrap can
    /// be attempted again.
    pub fn bootstrap(&self) -> Result<(), AzzurroError> {
        if self
            .bootstrapping
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Application is bootstrapping or has already been bootstrapped");
            return Ok(());
        }

        let result = self.run_lifecycle();
        match result {
            Ok(()) => self.booted.store(true, Ordering::SeqCst),
            Err(_) => self.bootstrapping.store(false, Ordering::SeqCst),
        }
        result
    }

    fn run_lifecycle(&self) -> Result<(), AzzurroError> {
        let app = self.app_name().ok_or(AzzurroError::AppModuleNotRegistered)?;

        self.injector.resolve_application_dependencies(&app)?;

        let event = self.injector.get_service::<EventService>(EVENT_SERVICE)?;
        let azzurro = self.injector.get_service::<AzzurroService>(AZZURRO_SERVICE)?;
        hand_over(&mut self.pending(), &event);

        tracing::debug!("Bootstrapping application '{app}'");
        for name in [
            EVENT_STARTED,
            azzurro.route_event(),
            azzurro.callback_event(),
            EVENT_ENDED,
        ] {
            event.emit(name)?;
        }

        Ok(())
    }

    /// Registers a listener on the `event` service.
    ///
    /// Until the `auto` module is resolved, listeners are queued and handed to the
    /// `event` service by [Azzurro::bootstrap]. Registering a listener never
    /// resolves any module.
    pub fn on<F, E>(&self, event: &str, listener: F) -> Result<(), AzzurroError>
    where
        F: Fn(&str) -> Result<(), E> + Send + Sync + 'static,
        E: Into<DynError>,
    {
        let listener = into_listener(listener);
        let mut pending = self.pending();

        if !self.injector.is_resolved(AUTO_MODULE) {
            tracing::trace!("Queued a listener for '{event}' until bootstrap");
            pending.push((event.to_string(), listener));
            return Ok(());
        }

        let events = self.injector.get_service::<EventService>(EVENT_SERVICE)?;
        hand_over(&mut pending, &events);
        events.add_listener(event, listener);
        Ok(())
    }

    fn pending(&self) -> MutexGuard<'_, Vec<(String, Arc<Listener>)>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_booted(&self) -> bool {
        self.booted.load(Ordering::SeqCst)
    }

    pub fn app_name(&self) -> Option<String> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .app_name()
            .map(str::to_string)
    }

    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Version of the runtime
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
