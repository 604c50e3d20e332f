//! Query history storage backends.

use crate::error::AuditError;
use crate::logger::AuditFilter;
use async_trait::async_trait;
use gatehouse_core::QueryHistory;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

/// Trait for history storage backends.
#[async_trait]
pub trait AuditStorage: Send + Sync {
    /// Append one record.
    async fn store(&self, entry: QueryHistory) -> Result<(), AuditError>;

    /// Records matching the filter, newest first.
    async fn query(&self, filter: AuditFilter) -> Result<Vec<QueryHistory>, AuditError>;
}

/// Apply a filter to records in any order; returns newest first.
pub(crate) fn apply_filter(
    records: impl IntoIterator<Item = QueryHistory>,
    filter: &AuditFilter,
) -> Vec<QueryHistory> {
    let mut results: Vec<_> = records.into_iter().filter(|r| filter.matches(r)).collect();
    results.sort_by(|a, b| b.executed_at.cmp(&a.executed_at));
    if let Some(limit) = filter.limit {
        results.truncate(limit);
    }
    results
}

/// Discards everything. Used when auditing is disabled.
#[derive(Debug, Default)]
pub struct NullStorage;

impl NullStorage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditStorage for NullStorage {
    async fn store(&self, _entry: QueryHistory) -> Result<(), AuditError> {
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> Result<Vec<QueryHistory>, AuditError> {
        Ok(vec![])
    }
}

/// Console storage (one JSON line per record on stdout).
#[derive(Debug, Default)]
pub struct ConsoleStorage;

impl ConsoleStorage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditStorage for ConsoleStorage {
    async fn store(&self, entry: QueryHistory) -> Result<(), AuditError> {
        let json = serde_json::to_string(&entry)?;
        println!("{}", json);
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> Result<Vec<QueryHistory>, AuditError> {
        // Console storage doesn't support querying
        Ok(vec![])
    }
}

/// JSON Lines file. Queries re-read the file, so history survives restarts.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditStorage for FileStorage {
    async fn store(&self, entry: QueryHistory) -> Result<(), AuditError> {
        let json = serde_json::to_string(&entry)?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| AuditError::StorageError(format!("Failed to acquire write lock: {}", e)))?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    async fn query(&self, filter: AuditFilter) -> Result<Vec<QueryHistory>, AuditError> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<QueryHistory>(&line) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(error = %e, "Skipping malformed history line"),
            }
        }

        Ok(apply_filter(records, &filter))
    }
}

/// In-process storage, lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: RwLock<Vec<QueryHistory>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored record in insertion order.
    pub fn records(&self) -> Vec<QueryHistory> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditStorage for MemoryStorage {
    async fn store(&self, entry: QueryHistory) -> Result<(), AuditError> {
        self.records
            .write()
            .map_err(|e| AuditError::StorageError(format!("Failed to acquire write lock: {}", e)))?
            .push(entry);
        Ok(())
    }

    async fn query(&self, filter: AuditFilter) -> Result<Vec<QueryHistory>, AuditError> {
        let records = self
            .records
            .read()
            .map_err(|e| AuditError::StorageError(format!("Failed to acquire read lock: {}", e)))?;
        Ok(apply_filter(records.iter().cloned(), &filter))
    }
}
