// crates/datashed-store/src/registry.rs
// ============================================================================
// Module: Store Handle Registry
// Description: One lazily-opened connection handle per logical database.
// Purpose: Serialize writers per database and pool readers under WAL.
// Dependencies: datashed-core, rusqlite
// ============================================================================

//! ## Overview
//! The registry owns every open connection. Each [`DatabaseName`] maps to at
//! most one [`DatabaseHandle`]: a write connection guarded by a mutex plus a
//! fixed pool of read connections selected round-robin. Handles are opened
//! on first acquisition and shared via `Arc`, so callers borrow a handle for
//! the duration of one call and never own its lifetime. No component outside
//! this module opens a store file directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::RwLock;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use datashed_core::DatabaseName;
use datashed_core::EngineError;
use datashed_core::PathSandbox;
use rusqlite::Connection;
use rusqlite::OpenFlags;

use crate::config::StoreConfig;

// ============================================================================
// SECTION: Database Handle
// ============================================================================

/// Open connections for one logical database.
///
/// # Invariants
/// - Exactly one handle exists per database name at any time.
/// - All writes to the database go through `write`; the mutex is the
///   per-database write lock the concurrency model relies on.
#[derive(Debug)]
pub struct DatabaseHandle {
    /// Store file path resolved by the sandbox.
    path: PathBuf,
    /// Shared writer connection guarded by a mutex.
    write: Mutex<Connection>,
    /// Read connection pool used for read path isolation under WAL.
    readers: Vec<Mutex<Connection>>,
    /// Round-robin cursor for read connection selection.
    cursor: AtomicUsize,
}

impl DatabaseHandle {
    /// Returns the store file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Locks the write connection, tolerating poisoned mutexes.
    ///
    /// # Errors
    ///
    /// Never fails today; kept fallible so callers propagate uniformly.
    pub fn lock_write(&self) -> Result<MutexGuard<'_, Connection>, EngineError> {
        Ok(self.write.lock().unwrap_or_else(std::sync::PoisonError::into_inner))
    }

    /// Locks the next read connection using round-robin selection.
    ///
    /// # Errors
    ///
    /// Never fails today; kept fallible so callers propagate uniformly.
    pub fn lock_read(&self) -> Result<MutexGuard<'_, Connection>, EngineError> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        Ok(self.readers[index].lock().unwrap_or_else(std::sync::PoisonError::into_inner))
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Process-scoped registry of open database handles.
///
/// # Invariants
/// - Acquisition for a given database name is serialized; two concurrent
///   first acquisitions still produce exactly one handle.
/// - Handles persist until eviction (database deletion) or engine teardown.
pub struct HandleRegistry {
    /// Engine configuration driving pragmas and pool sizing.
    config: StoreConfig,
    /// Path sandbox resolving names to confined store paths.
    sandbox: Arc<dyn PathSandbox + Send + Sync>,
    /// Open handles by database name.
    handles: RwLock<HashMap<DatabaseName, Arc<DatabaseHandle>>>,
}

impl HandleRegistry {
    /// Creates a registry over the given sandbox.
    #[must_use]
    pub fn new(config: StoreConfig, sandbox: Arc<dyn PathSandbox + Send + Sync>) -> Self {
        Self {
            config,
            sandbox,
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the sandbox used for path resolution.
    #[must_use]
    pub fn sandbox(&self) -> &Arc<dyn PathSandbox + Send + Sync> {
        &self.sandbox
    }

    /// Acquires the handle for an existing database, opening it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when no store file exists for the
    /// name, or [`EngineError::Io`] when opening fails.
    pub fn acquire(&self, name: &DatabaseName) -> Result<Arc<DatabaseHandle>, EngineError> {
        {
            let handles =
                self.handles.read().unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(handle) = handles.get(name) {
                return Ok(Arc::clone(handle));
            }
        }
        let mut handles =
            self.handles.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        // Double-checked: another caller may have opened it while we waited.
        if let Some(handle) = handles.get(name) {
            return Ok(Arc::clone(handle));
        }
        let path = self
            .sandbox
            .store_path(name)
            .map_err(|err| EngineError::Io(err.to_string()))?;
        if !path.exists() {
            return Err(EngineError::NotFound(format!(
                "database '{name}' not found; create it first"
            )));
        }
        let handle = Arc::new(self.open_handle(path)?);
        handles.insert(name.clone(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Creates the store file and handle for a new database.
    ///
    /// The existence check and file creation happen under one registry write
    /// lock, so two concurrent creates of the same name cannot both proceed:
    /// the loser sees the winner's file and gets `AlreadyExists` before any
    /// DDL can run against it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyExists`] when a handle or store file is
    /// already present for the name, or [`EngineError::Io`] when the file
    /// cannot be created or opened.
    pub fn create_exclusive(
        &self,
        name: &DatabaseName,
    ) -> Result<Arc<DatabaseHandle>, EngineError> {
        let mut handles =
            self.handles.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let path = self
            .sandbox
            .store_path(name)
            .map_err(|err| EngineError::Io(err.to_string()))?;
        if handles.contains_key(name) || path.exists() {
            return Err(EngineError::AlreadyExists(format!("database '{name}' already exists")));
        }
        let handle = Arc::new(self.open_handle(path)?);
        handles.insert(name.clone(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Returns `true` when a store file exists for the name.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] when path resolution fails.
    pub fn exists(&self, name: &DatabaseName) -> Result<bool, EngineError> {
        let path = self
            .sandbox
            .store_path(name)
            .map_err(|err| EngineError::Io(err.to_string()))?;
        Ok(path.exists())
    }

    /// Evicts and closes the handle for a database, if open.
    ///
    /// Returns the store path so lifecycle callers can remove the file after
    /// every connection is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] when path resolution fails.
    pub fn evict(&self, name: &DatabaseName) -> Result<PathBuf, EngineError> {
        let mut handles =
            self.handles.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(handle) = handles.remove(name) {
            let path = handle.path().to_path_buf();
            drop(handle);
            return Ok(path);
        }
        self.sandbox.store_path(name).map_err(|err| EngineError::Io(err.to_string()))
    }

    /// Opens write and read connections for one store file.
    fn open_handle(&self, path: PathBuf) -> Result<DatabaseHandle, EngineError> {
        let write = self.open_connection(&path, true)?;
        let mut readers = Vec::with_capacity(self.config.read_pool_size);
        for _ in 0 .. self.config.read_pool_size {
            readers.push(Mutex::new(self.open_connection(&path, false)?));
        }
        Ok(DatabaseHandle {
            path,
            write: Mutex::new(write),
            readers,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Opens one connection and applies the configured pragmas.
    fn open_connection(&self, path: &Path, create: bool) -> Result<Connection, EngineError> {
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if create {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        }
        let connection = Connection::open_with_flags(path, flags)
            .map_err(|err| EngineError::Io(format!("{}: {err}", path.display())))?;
        connection
            .busy_timeout(std::time::Duration::from_millis(self.config.busy_timeout_ms))
            .map_err(|err| EngineError::Io(err.to_string()))?;
        connection
            .pragma_update(None, "journal_mode", self.config.journal_mode.pragma_value())
            .map_err(|err| EngineError::Io(err.to_string()))?;
        connection
            .pragma_update(None, "synchronous", self.config.sync_mode.pragma_value())
            .map_err(|err| EngineError::Io(err.to_string()))?;
        connection
            .pragma_update(None, "foreign_keys", "on")
            .map_err(|err| EngineError::Io(err.to_string()))?;
        connection.set_prepared_statement_cache_capacity(self.config.prepared_cache_capacity);
        Ok(connection)
    }
}

impl std::fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleRegistry").field("config", &self.config).finish_non_exhaustive()
    }
}
