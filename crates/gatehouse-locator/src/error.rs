//! Error types for tenant resolution.

use thiserror::Error;
use uuid::Uuid;

/// Why a (user, project) pair could not be turned into a reachable tenant.
#[derive(Debug, Error)]
pub enum LocateError {
    /// The project does not exist or belongs to someone else.
    #[error("project not found or not accessible")]
    NotFound,

    #[error("no running database instance for this project")]
    NoRunningInstance,

    #[error("no credentials configured for this database instance")]
    NoCredentials { instance_id: Uuid },

    /// Missing container id or port on the instance row.
    #[error("database instance {field} not configured")]
    InstanceNotConfigured {
        instance_id: Uuid,
        field: &'static str,
    },

    #[error("failed to get container IP for '{container_id}'")]
    IpResolutionFailed {
        instance_id: Uuid,
        container_id: String,
    },

    #[error("failed to decrypt database credentials")]
    DecryptionFailed { instance_id: Uuid },

    /// A backing lookup failed (catalog database unreachable, bad row).
    #[error("catalog lookup failed: {0}")]
    Catalog(String),
}

impl LocateError {
    /// The instance the failure can be attributed to, once one was found.
    pub fn instance_id(&self) -> Option<Uuid> {
        match self {
            Self::NoCredentials { instance_id }
            | Self::InstanceNotConfigured { instance_id, .. }
            | Self::IpResolutionFailed { instance_id, .. }
            | Self::DecryptionFailed { instance_id } => Some(*instance_id),
            Self::NotFound | Self::NoRunningInstance | Self::Catalog(_) => None,
        }
    }
}

/// Failure to encrypt or decrypt a stored credential.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    #[error("authentication failed")]
    AuthenticationFailed,
}
