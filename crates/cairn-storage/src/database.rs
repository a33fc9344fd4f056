// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, vector extension
//! registration, and migrations.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Callers share one [`Database`] rather than opening extra
//! connections for writes.

use std::path::Path;
use std::sync::Once;

use cairn_core::CairnError;
use tracing::{debug, info};

/// Convert a tokio-rusqlite error into [`CairnError::Storage`].
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> CairnError {
    CairnError::Storage {
        source: Box::new(e),
    }
}

/// Unwrap a closure's own `CairnError`, wrapping connection-level failures.
fn map_call_err(e: tokio_rusqlite::Error<CairnError>) -> CairnError {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        other => CairnError::Storage {
            source: other.to_string().into(),
        },
    }
}

static VEC_EXTENSION: Once = Once::new();

/// Register sqlite-vec as an auto extension for every connection opened afterwards.
fn register_vector_extension() {
    VEC_EXTENSION.call_once(|| {
        // SAFETY: `sqlite3_vec_init` is the extension entry point sqlite-vec exports
        // for static linking; sqlite3_auto_extension expects exactly that signature.
        unsafe {
            rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
                sqlite_vec::sqlite3_vec_init as *const (),
            )));
        }
    });
}

/// Handle to the SQLite database backing the relational vector store.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path`, apply PRAGMAs and run migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, CairnError> {
        register_vector_extension();

        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(CairnError::storage)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(CairnError::storage)?;
        let db = Self { conn };
        db.configure(wal_mode).await?;
        let applied = db.migrate().await?;
        info!(path, applied, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database with the same schema.
    pub async fn open_in_memory() -> Result<Self, CairnError> {
        register_vector_extension();
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(CairnError::storage)?;
        let db = Self { conn };
        db.configure(false).await?;
        db.migrate().await?;
        Ok(db)
    }

    /// The underlying connection for query modules.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    async fn configure(&self, wal_mode: bool) -> Result<(), CairnError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                if wal_mode {
                    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
                }
                conn.execute_batch(
                    "PRAGMA synchronous = NORMAL;
                     PRAGMA foreign_keys = ON;
                     PRAGMA busy_timeout = 5000;",
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn migrate(&self) -> Result<usize, CairnError> {
        self.conn
            .call(|conn| crate::migrations::run_migrations(conn))
            .await
            .map_err(map_call_err)
    }

    /// Confirm the vector functions are callable; returns the sqlite-vec version.
    pub async fn probe(&self) -> Result<String, CairnError> {
        let version = self
            .conn
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.query_row("SELECT vec_version()", [], |row| row.get(0))
            })
            .await
            .map_err(map_tr_err)?;
        debug!(version = %version, "sqlite-vec available");
        Ok(version)
    }
}
