// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whole-file JSON record storage with a process-wide writer lock.
//!
//! Every [`JsonFile::update`] performs a full read-modify-write cycle while
//! holding the lock registered for the file's absolute path, so two handles
//! on the same file in one process cannot lose each other's updates. Writes
//! go to a sibling temp file which is synced and renamed over the original;
//! readers never observe a partial file and therefore take no lock.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, PoisonError};

use cairn_core::CairnError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

type LockRegistry = std::sync::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>;

static FILE_LOCKS: LazyLock<LockRegistry> = LazyLock::new(Default::default);

/// The writer lock shared by every handle on `path` in this process.
pub fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut locks = FILE_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    locks.entry(key).or_default().clone()
}

/// A JSON array of `T` persisted in a single file.
pub struct JsonFile<T> {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
    _records: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock = lock_for(&path);
        Self {
            path,
            lock,
            _records: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record. A missing or empty file holds no records.
    pub async fn read_all(&self) -> Result<Vec<T>, CairnError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CairnError::storage(e)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(CairnError::storage)
    }

    /// Apply `mutate` to the current records and persist the result.
    ///
    /// The lock spans the read, the mutation and the durable write. A file
    /// that cannot be parsed is left untouched and reported as an error.
    pub async fn update<R>(
        &self,
        mutate: impl FnOnce(&mut Vec<T>) -> R,
    ) -> Result<R, CairnError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        let result = mutate(&mut records);
        self.write_all(&records).await?;
        Ok(result)
    }

    async fn write_all(&self, records: &[T]) -> Result<(), CairnError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(CairnError::storage)?;
        }

        let bytes = serde_json::to_vec(records).map_err(CairnError::storage)?;
        let tmp = self.temp_path();

        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(CairnError::storage)?;
        file.write_all(&bytes).await.map_err(CairnError::storage)?;
        file.sync_all().await.map_err(CairnError::storage)?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(CairnError::storage)?;
        debug!(path = %self.path.display(), records = records.len(), bytes = bytes.len(), "json file written");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
