use azzurro_di::{errors::RequireError, types::TypeInfo};

/// Errors when trying to register or retrieve a config
#[derive(thiserror::Error, Debug, Clone)]
pub enum ConfigError {
    /// The required Config is not known
    #[error("The required Config type '{0}' is not known")]
    Missing(TypeInfo),
    /// The Config type is already registered
    #[error("The Config type '{0}' is already registered")]
    AlreadyRegistered(TypeInfo),
    /// The config provider could not be fetched from the injector
    #[error(transparent)]
    Require(#[from] RequireError),
}
