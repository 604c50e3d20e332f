//! # gatehouse-audit
//!
//! Append-only query history for tenant operations.
//!
//! Every attempt that reaches a tenant produces exactly one
//! [`QueryHistory`](gatehouse_core::QueryHistory) record: instance, user, query
//! text, success flag and latency. Records are written through an
//! [`AuditStorage`] backend:
//!
//! | Backend | Description |
//! |---------|-------------|
//! | `NullStorage` | Auditing disabled |
//! | `ConsoleStorage` | JSON line per record on stdout |
//! | `FileStorage` | JSON Lines file, queryable |
//! | `MemoryStorage` | In-process, queryable |
//!
//! The Postgres backend (`query_history` table) lives in
//! `gatehouse-adapter-pg`.

pub mod error;
pub mod logger;
pub mod storage;

pub use error::AuditError;
pub use logger::{AuditFilter, AuditLogger, DEFAULT_HISTORY_LIMIT};
pub use storage::{AuditStorage, ConsoleStorage, FileStorage, MemoryStorage, NullStorage};
