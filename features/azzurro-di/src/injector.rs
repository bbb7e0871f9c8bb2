use std::{
    any::type_name,
    collections::{HashMap, HashSet},
    fmt::Debug,
    sync::{Arc, Mutex, PoisonError, RwLock},
    thread::{self, ThreadId},
};

use crate::{
    dependency_graph::{DependencyGraph, DependencyGraphError, DependencyGraphErrors},
    errors::RequireError,
    recipe::ServiceCell,
    registry::{self, SharedRegistry},
    types::{Injectable, Instance},
};

/// Resolves the module graph of an application and hands out its services.
///
/// Services are constructed the first time they are requested and memoized,
/// every later request returns the same instance.
/// Cloning the injector is cheap, all clones share the same state.
#[derive(Clone)]
pub struct Injector(Arc<InjectorInner>);
pub struct InjectorInner {
    registry: SharedRegistry,
    resolution: RwLock<Resolution>,
    /// Services currently being constructed, per thread
    constructing: Mutex<HashMap<ThreadId, Vec<String>>>,
}

#[derive(Default)]
struct Resolution {
    order: Vec<String>,
    resolved: HashSet<String>,
}

impl Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = registry::read(&self.0.registry);
        let resolution = self.resolution();
        let mut map = f.debug_struct("Injector");
        for name in registry.module_names() {
            let val = if resolution.resolved.contains(name) {
                "resolved"
            } else {
                "unresolved"
            };
            map.field(name, &val);
        }
        map.finish()
    }
}

impl Injector {
    pub fn new(registry: SharedRegistry) -> Self {
        Self(Arc::new(InjectorInner {
            registry,
            resolution: RwLock::new(Resolution::default()),
            constructing: Mutex::new(HashMap::new()),
        }))
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.0.registry
    }

    fn resolution(&self) -> std::sync::RwLockReadGuard<'_, Resolution> {
        self.0
            .resolution
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolves `root` and every module it transitively depends on.
    ///
    /// Afterwards the services of those modules can be requested.
    /// Returns the modules of this run in resolution order.
    pub fn resolve_application_dependencies(
        &self,
        root: &str,
    ) -> Result<Vec<String>, DependencyGraphError> {
        let graph = DependencyGraph::new(&registry::read(&self.0.registry));
        let order = graph.resolution_order(root)?;

        tracing::debug!("Resolved dependencies of '{root}' in order {order:?}");

        let mut resolution = self
            .0
            .resolution
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for module in &order {
            if resolution.resolved.insert(module.clone()) {
                resolution.order.push(module.clone());
            }
        }

        Ok(order)
    }

    /// Checks every declared module for missing and circular dependencies
    pub fn check_graph(&self) -> Result<(), DependencyGraphErrors> {
        DependencyGraph::new(&registry::read(&self.0.registry)).check()
    }

    /// All modules resolved so far, in resolution order
    pub fn resolution_order(&self) -> Vec<String> {
        self.resolution().order.clone()
    }

    pub fn is_resolved(&self, module: &str) -> bool {
        self.resolution().resolved.contains(module)
    }

    /// True if the service has been constructed already
    pub fn is_constructed(&self, name: &str) -> bool {
        self.locate(name)
            .is_ok_and(|(_, cell)| cell.get().is_some())
    }

    /// Attempts to get the requested service, downcasted to `T`
    pub fn get_service<T: Injectable>(&self, name: &str) -> Result<Arc<T>, RequireError> {
        self.get_instance(name)?
            .downcast()
            .map_err(|actual_type| RequireError::DowncastFailed {
                service: name.to_string(),
                required_type: type_name::<T>(),
                actual_type,
            })
    }

    /// Attempts to get the requested service, constructing it on first request
    pub fn get_instance(&self, name: &str) -> Result<Instance, RequireError> {
        let (module, cell) = self.locate(name)?;

        if let Some(instance) = cell.get() {
            return Ok(instance.clone());
        }

        let _frame = ConstructionFrame::enter(&self.0, name)?;
        let _claim = cell.claim();

        // Another thread might have finished while we waited for the claim
        if let Some(instance) = cell.get() {
            return Ok(instance.clone());
        }

        tracing::debug!(
            "Constructing service '{name}' of module '{module}' using its {}",
            cell.recipe().kind()
        );
        match cell.recipe().construct(self) {
            Ok(instance) => {
                tracing::debug!("Constructed instance of {}", instance.info.type_name);
                cell.store(instance.clone());
                Ok(instance)
            }
            Err(error) => {
                tracing::error!("Construction of service '{name}' failed: {error}");
                Err(RequireError::ServiceConstructionFailed {
                    service: name.to_string(),
                    error: Arc::new(error),
                })
            }
        }
    }

    /// Finds the module owning a service.
    ///
    /// Resolved modules are searched in resolution order, so with duplicate
    /// names the earliest resolved declaration wins.
    fn locate(&self, name: &str) -> Result<(String, Arc<ServiceCell>), RequireError> {
        let registry = registry::read(&self.0.registry);
        let resolution = self.resolution();

        for module in &resolution.order {
            if let Some(cell) = registry
                .get_module(module)
                .ok()
                .and_then(|entry| entry.cell(name))
            {
                return Ok((module.clone(), cell.clone()));
            }
        }

        let declared_by = registry.module_names().iter().find(|module| {
            registry
                .get_module(module)
                .is_ok_and(|entry| entry.has_service(name))
        });

        match declared_by {
            Some(module) => {
                tracing::error!(
                    "Tried to get service '{name}' of module '{module}' before it was resolved"
                );
                Err(RequireError::ModuleNotResolved {
                    service: name.to_string(),
                    module: module.clone(),
                })
            }
            None => {
                tracing::error!("Tried to get an unregistered service: {name}");
                Err(RequireError::ServiceNotFound(name.to_string()))
            }
        }
    }
}

/// Marks a service as being constructed by the current thread
struct ConstructionFrame<'a> {
    inner: &'a InjectorInner,
    thread: ThreadId,
}

impl<'a> ConstructionFrame<'a> {
    fn enter(inner: &'a InjectorInner, service: &str) -> Result<Self, RequireError> {
        let thread = thread::current().id();
        let mut constructing = inner
            .constructing
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let stack = constructing.entry(thread).or_default();

        if let Some(start) = stack.iter().position(|entry| entry == service) {
            let mut chain = stack[start..].to_vec();
            chain.push(service.to_string());
            return Err(RequireError::CircularConstruction {
                service: service.to_string(),
                chain,
            });
        }

        stack.push(service.to_string());
        Ok(Self { inner, thread })
    }
}

impl Drop for ConstructionFrame<'_> {
    fn drop(&mut self) {
        let mut constructing = self
            .inner
            .constructing
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(stack) = constructing.get_mut(&self.thread) {
            stack.pop();
            if stack.is_empty() {
                constructing.remove(&self.thread);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        convert::Infallible,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::{
        recipe::ServiceProvider,
        registry::{ModuleHandle, ModuleRegistry},
    };

    #[derive(Default, Debug)]
    struct Counter(AtomicUsize);

    struct Setup {
        registry: SharedRegistry,
        injector: Injector,
    }

    impl Setup {
        fn new() -> Self {
            let registry = ModuleRegistry::shared();
            let injector = Injector::new(registry.clone());
            Self { registry, injector }
        }

        fn module(&self, name: &str, dependencies: &[&str]) -> ModuleHandle {
            ModuleHandle::declare(&self.registry, name, Some(dependencies)).unwrap()
        }
    }

    #[test]
    fn test_chain_is_resolved_in_order() {
        // Arrange
        let setup = Setup::new();
        setup
            .module("a", &[])
            .service::<Counter>("counter")
            .unwrap();
        setup.module("b", &["a"]);
        setup.module("c", &["b"]);

        // Act
        let order = setup.injector.resolve_application_dependencies("c").unwrap();

        // Assert
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(setup.injector.resolution_order(), vec!["a", "b", "c"]);
        assert!(setup.injector.get_service::<Counter>("counter").is_ok());
        assert!(matches!(
            setup.injector.get_instance("from_d"),
            Err(RequireError::ServiceNotFound(name)) if name == "from_d"
        ));
    }

    #[test]
    fn test_cycle_fails_resolution() {
        let setup = Setup::new();
        setup.module("a", &["b"]);
        setup.module("b", &["a"]);

        let error = setup
            .injector
            .resolve_application_dependencies("a")
            .unwrap_err();

        assert!(matches!(
            error,
            DependencyGraphError::CircularDependency { .. }
        ));
        assert!(setup.injector.resolution_order().is_empty());
    }

    #[test]
    fn test_service_of_unresolved_module() {
        let setup = Setup::new();
        setup.module("app", &[]);
        setup
            .module("other", &[])
            .service::<Counter>("counter")
            .unwrap();
        setup.injector.resolve_application_dependencies("app").unwrap();

        let error = setup.injector.get_instance("counter").unwrap_err();

        assert!(matches!(
            error,
            RequireError::ModuleNotResolved { ref service, ref module }
                if service == "counter" && module == "other"
        ));
        assert!(!setup.injector.is_resolved("other"));
    }

    #[test]
    fn test_factory_is_invoked_once() {
        // Arrange
        let setup = Setup::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let factory_calls = calls.clone();
        setup
            .module("app", &[])
            .factory("x", move |_| {
                factory_calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Infallible>(String::from("x"))
            })
            .unwrap();
        setup.injector.resolve_application_dependencies("app").unwrap();
        assert!(!setup.injector.is_constructed("x"));

        // Act
        let first = setup.injector.get_service::<String>("x").unwrap();
        let second = setup.injector.get_service::<String>("x").unwrap();

        // Assert
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(setup.injector.is_constructed("x"));
    }

    #[test]
    fn test_failed_construction_can_be_retried() {
        // Arrange
        let setup = Setup::new();
        let attempts = Arc::new(AtomicUsize::new(0));
        let factory_attempts = attempts.clone();
        setup
            .module("app", &[])
            .factory("flaky", move |_| {
                match factory_attempts.fetch_add(1, Ordering::SeqCst) {
                    0 => Err("not yet"),
                    _ => Ok(42u32),
                }
            })
            .unwrap();
        setup.injector.resolve_application_dependencies("app").unwrap();

        // Act
        let failed = setup.injector.get_service::<u32>("flaky");
        let retried = setup.injector.get_service::<u32>("flaky");

        // Assert
        let Err(RequireError::ServiceConstructionFailed { service, error }) = failed else {
            panic!("expected construction failure");
        };
        assert_eq!(service, "flaky");
        assert_eq!(error.to_string(), "not yet");
        assert_eq!(*retried.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    static COUNTED_BUILDS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct CountedProvider;
    impl ServiceProvider for CountedProvider {
        type Service = String;

        fn register(self, _injector: &Injector) -> Result<String, Infallible> {
            COUNTED_BUILDS.fetch_add(1, Ordering::SeqCst);
            Ok(String::from("provided"))
        }
    }

    #[test]
    fn test_provider_is_registered_once() {
        // Arrange
        let setup = Setup::new();
        setup
            .module("app", &[])
            .provider::<CountedProvider>("provided")
            .unwrap();
        setup.injector.resolve_application_dependencies("app").unwrap();
        assert!(!setup.injector.is_constructed("provided"));

        // Act
        let first = setup.injector.get_service::<String>("provided").unwrap();
        let second = setup.injector.get_service::<String>("provided").unwrap();

        // Assert
        assert_eq!(COUNTED_BUILDS.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.as_str(), "provided");
    }

    static FLAKY_ATTEMPTS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct FlakyProvider;
    impl ServiceProvider for FlakyProvider {
        type Service = u64;

        fn register(self, _injector: &Injector) -> Result<u64, &'static str> {
            match FLAKY_ATTEMPTS.fetch_add(1, Ordering::SeqCst) {
                0 => Err("provider not ready"),
                _ => Ok(7),
            }
        }
    }

    #[test]
    fn test_failed_provider_can_be_retried() {
        // Arrange
        let setup = Setup::new();
        setup
            .module("app", &[])
            .provider::<FlakyProvider>("flaky_provider")
            .unwrap();
        setup.injector.resolve_application_dependencies("app").unwrap();

        // Act
        let failed = setup.injector.get_service::<u64>("flaky_provider");
        let retried = setup.injector.get_service::<u64>("flaky_provider");
        let memoized = setup.injector.get_service::<u64>("flaky_provider");

        // Assert
        let Err(RequireError::ServiceConstructionFailed { service, error }) = failed else {
            panic!("expected construction failure");
        };
        assert_eq!(service, "flaky_provider");
        assert_eq!(error.to_string(), "provider not ready");
        let retried = retried.unwrap();
        assert_eq!(*retried, 7);
        assert!(Arc::ptr_eq(&retried, &memoized.unwrap()));
        assert_eq!(FLAKY_ATTEMPTS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_factory_can_pull_other_services() {
        let setup = Setup::new();
        setup
            .module("base", &[])
            .service::<Counter>("counter")
            .unwrap();
        setup
            .module("app", &["base"])
            .factory("next", |injector| {
                let counter = injector.get_service::<Counter>("counter")?;
                Ok::<_, RequireError>(counter.0.fetch_add(1, Ordering::SeqCst) + 1)
            })
            .unwrap();
        setup.injector.resolve_application_dependencies("app").unwrap();

        let next = setup.injector.get_service::<usize>("next").unwrap();
        let counter = setup.injector.get_service::<Counter>("counter").unwrap();

        assert_eq!(*next, 1);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_self_requiring_factory_fails_instead_of_deadlocking() {
        let setup = Setup::new();
        setup
            .module("app", &[])
            .factory("ping", |injector| {
                injector.get_service::<String>("pong").map(|s| s.len())
            })
            .unwrap()
            .factory("pong", |injector| {
                injector.get_service::<usize>("ping").map(|n| n.to_string())
            })
            .unwrap();
        setup.injector.resolve_application_dependencies("app").unwrap();

        let error = setup.injector.get_service::<usize>("ping").unwrap_err();

        let RequireError::ServiceConstructionFailed { service, error } = error else {
            panic!("expected construction failure");
        };
        assert_eq!(service, "ping");
        assert!(error.to_string().contains("ping"));
        assert!(!setup.injector.is_constructed("ping"));
        assert!(!setup.injector.is_constructed("pong"));
    }

    #[test]
    fn test_downcast_to_wrong_type() {
        let setup = Setup::new();
        setup.module("app", &[]).service::<String>("text").unwrap();
        setup.injector.resolve_application_dependencies("app").unwrap();

        let error = setup.injector.get_service::<u32>("text").unwrap_err();

        assert!(matches!(
            error,
            RequireError::DowncastFailed { required_type: "u32", .. }
        ));
    }

    #[test]
    fn test_registry_changes_after_resolution_are_visible() {
        let setup = Setup::new();
        let app = setup.module("app", &[]);
        setup.injector.resolve_application_dependencies("app").unwrap();

        app.service::<String>("late").unwrap();

        assert!(setup.injector.get_service::<String>("late").is_ok());
    }

    #[test]
    fn test_duplicate_service_name_prefers_first_resolved_module() {
        let setup = Setup::new();
        setup
            .module("low", &[])
            .factory("name", |_| Ok::<_, Infallible>("low"))
            .unwrap();
        setup
            .module("high", &["low"])
            .factory("name", |_| Ok::<_, Infallible>("high"))
            .unwrap();
        setup.injector.resolve_application_dependencies("high").unwrap();

        let name = setup.injector.get_service::<&'static str>("name").unwrap();

        assert_eq!(*name, "low");
    }

    #[test]
    fn test_concurrent_requests_construct_once() {
        let setup = Setup::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let factory_calls = calls.clone();
        setup
            .module("app", &[])
            .factory("shared", move |_| {
                factory_calls.fetch_add(1, Ordering::SeqCst);
                thread::sleep(std::time::Duration::from_millis(20));
                Ok::<_, Infallible>(Counter::default())
            })
            .unwrap();
        setup.injector.resolve_application_dependencies("app").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let injector = setup.injector.clone();
                thread::spawn(move || injector.get_service::<Counter>("shared").unwrap())
            })
            .collect();
        let instances: Vec<Arc<Counter>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_graph_check_through_injector() {
        let setup = Setup::new();
        setup.module("app", &["missing"]);

        let errors = setup.injector.check_graph().unwrap_err();

        assert_eq!(errors.errors.len(), 1);
    }

    #[test]
    fn test_debug_lists_module_state() {
        let setup = Setup::new();
        setup.module("app", &[]);
        setup.module("idle", &[]);
        setup.injector.resolve_application_dependencies("app").unwrap();

        let debug = format!("{:?}", setup.injector);

        assert!(debug.contains("app: \"resolved\""));
        assert!(debug.contains("idle: \"unresolved\""));
    }
}
