//! # gatehouse-locator
//!
//! Turns an authenticated (user, project) pair into a [`TenantTarget`]:
//! ownership check, running instance, latest credential, container IP and
//! decrypted password.
//!
//! [`TenantTarget`]: gatehouse_core::TenantTarget

pub mod catalog;
pub mod cipher;
pub mod error;
pub mod locator;
pub mod memory;
pub mod registry;

pub use catalog::TenantCatalog;
pub use cipher::{AesGcmCipher, SecretCipher};
pub use error::{CipherError, LocateError};
pub use locator::TenantLocator;
pub use memory::InMemoryCatalog;
pub use registry::{ContainerRegistry, InMemoryRegistry, PersistentIpStore, RedisIpStore};
