use std::sync::Arc;

use azzurro_di::{errors::RequireError, injector::Injector, types::Injectable};

/// The `controller` service, looks up controllers registered in the resolved modules
#[derive(Debug, Clone)]
pub struct ControllerService {
    injector: Injector,
}

impl ControllerService {
    pub fn new(injector: Injector) -> Self {
        Self { injector }
    }

    /// Gets the controller `name`, registered as the service `<name>Controller`
    pub fn get<T: Injectable>(&self, name: &str) -> Result<Arc<T>, RequireError> {
        self.injector.get_service(&Self::service_name(name))
    }

    pub fn service_name(name: &str) -> String {
        format!("{name}Controller")
    }
}
