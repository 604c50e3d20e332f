//! # gatehouse-adapter-pg
//!
//! Postgres implementations of the gateway seams:
//!
//! - [`PgTenantConnector`]: unpooled connections to tenant instances
//! - [`PgCatalog`]: project, instance and credential lookups
//! - [`PgHistoryStorage`]: the `query_history` table

pub mod catalog;
pub mod connector;
mod convert;
pub mod history;

pub use catalog::{PgCatalog, connect_catalog};
pub use connector::{PgTenantConnector, PgTenantSession};
pub use history::PgHistoryStorage;
