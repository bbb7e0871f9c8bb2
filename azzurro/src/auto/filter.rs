use std::sync::Arc;

use azzurro_di::{errors::RequireError, injector::Injector, types::Injectable};

/// The `filter` service, looks up filters registered in the resolved modules
#[derive(Debug, Clone)]
pub struct FilterService {
    injector: Injector,
}

impl FilterService {
    pub fn new(injector: Injector) -> Self {
        Self { injector }
    }

    /// Gets the filter `name`, registered as the service `<name>Filter`
    pub fn get<T: Injectable>(&self, name: &str) -> Result<Arc<T>, RequireError> {
        self.injector.get_service(&Self::service_name(name))
    }

    pub fn service_name(name: &str) -> String {
        format!("{name}Filter")
    }
}
