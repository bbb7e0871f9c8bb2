use std::sync::Arc;

use azzurro_di::{
    errors::RequireError,
    injector::Injector,
    types::{Injectable, Instance},
};

/// The `injector` service, gives application code access to the injector
#[derive(Debug, Clone)]
pub struct InjectorService {
    injector: Injector,
}

impl InjectorService {
    pub fn new(injector: Injector) -> Self {
        Self { injector }
    }

    pub fn get_service<T: Injectable>(&self, name: &str) -> Result<Arc<T>, RequireError> {
        self.injector.get_service(name)
    }

    pub fn get_instance(&self, name: &str) -> Result<Instance, RequireError> {
        self.injector.get_instance(name)
    }

    pub fn is_constructed(&self, name: &str) -> bool {
        self.injector.is_constructed(name)
    }

    pub fn injector(&self) -> &Injector {
        &self.injector
    }
}
