//! Gateway error taxonomy.

use crate::executor::DriverError;
use gatehouse_locator::LocateError;
use gatehouse_sql::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The caller does not own the project.
    #[error("{0}")]
    Authorization(String),

    /// The project has no reachable, configured instance.
    #[error("{0}")]
    Routing(String),

    #[error("{0}")]
    Credential(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The tenant driver failed, or the deadline passed.
    #[error(transparent)]
    Execution(#[from] DriverError),

    #[error("row not found")]
    RowNotFound,

    /// The control-plane catalog or history store failed.
    #[error("{0}")]
    Catalog(String),
}

impl GatewayError {
    /// Stable machine-readable name for API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authorization(_) => "authorization_error",
            Self::Routing(_) => "routing_error",
            Self::Credential(_) => "credential_error",
            Self::Validation(_) => "validation_error",
            Self::Execution(_) => "execution_error",
            Self::RowNotFound => "row_not_found",
            Self::Catalog(_) => "catalog_error",
        }
    }
}

impl From<LocateError> for GatewayError {
    fn from(err: LocateError) -> Self {
        let message = err.to_string();
        match err {
            LocateError::NotFound => Self::Authorization(message),
            LocateError::NoRunningInstance
            | LocateError::NoCredentials { .. }
            | LocateError::InstanceNotConfigured { .. }
            | LocateError::IpResolutionFailed { .. } => Self::Routing(message),
            LocateError::DecryptionFailed { .. } => Self::Credential(message),
            LocateError::Catalog(_) => Self::Catalog(message),
        }
    }
}
