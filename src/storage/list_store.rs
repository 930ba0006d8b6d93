use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};

use crate::config::StorageConfig;
use crate::storage::records::ListName;
use crate::utils::{log_store_event, GateError, GateResult};

/// JSON-file backed store for the attempts, allow and deny lists
///
/// Each list lives in its own document under `data_dir`. Every save copies
/// the current document into `backup_dir` first, then replaces the document
/// through a temp file and rename. A per-list async mutex serializes
/// read-modify-write sequences taken through [`ListStore::lock`].
pub struct ListStore {
    data_dir: PathBuf,
    backup_dir: PathBuf,
    audit_log: PathBuf,
    locks: [Mutex<()>; 3],
    backup_seq: AtomicU64,
}

/// Exclusive access to one list for a read-modify-write sequence
pub struct ListGuard<'a> {
    store: &'a ListStore,
    list: ListName,
    _guard: MutexGuard<'a, ()>,
}

impl ListStore {
    /// Creates a store rooted at the given directories
    pub fn new(
        data_dir: impl Into<PathBuf>,
        log_dir: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            backup_dir: backup_dir.into(),
            audit_log: log_dir.into().join("access.log"),
            locks: [Mutex::new(()), Mutex::new(()), Mutex::new(())],
            backup_seq: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.data_dir, &config.log_dir, &config.backup_dir)
    }

    /// Path of the JSON document backing `list`
    pub fn path(&self, list: ListName) -> PathBuf {
        self.data_dir.join(list.file_name())
    }

    pub fn audit_log_path(&self) -> &Path {
        &self.audit_log
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Loads a list, substituting an empty one when the document is missing or corrupt
    pub async fn load<T: DeserializeOwned>(&self, list: ListName) -> Vec<T> {
        let path = self.path(list);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) => {
                log_store_event(
                    "load_failed",
                    false,
                    Some(&format!("Could not load {}, using empty list: {}", list.file_name(), e)),
                );
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                log_store_event(
                    "load_failed",
                    false,
                    Some(&format!("Could not parse {}, using empty list: {}", list.file_name(), e)),
                );
                Vec::new()
            }
        }
    }

    /// Saves a list, taking the list lock for the duration of the write
    pub async fn save<T: Serialize>(&self, list: ListName, records: &[T]) -> GateResult<()> {
        let _guard = self.locks[list.index()].lock().await;
        self.write_list(list, records).await
    }

    /// Takes the list lock so a load followed by a save cannot interleave with another writer
    pub async fn lock(&self, list: ListName) -> ListGuard<'_> {
        ListGuard {
            store: self,
            list,
            _guard: self.locks[list.index()].lock().await,
        }
    }

    /// Appends one line to the plain-text audit log
    pub async fn append_audit(&self, line: &str) -> GateResult<()> {
        if let Some(parent) = self.audit_log.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log)
            .await?;
        file.write_all(format!("{}\n", line).as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn write_list<T: Serialize>(&self, list: ListName, records: &[T]) -> GateResult<()> {
        match self.backup(list).await {
            Ok(path) => log_store_event(
                "backup_saved",
                true,
                Some(&format!("Backup saved: {}", path.display())),
            ),
            Err(e) => log_store_event("backup_failed", false, Some(&e.to_string())),
        }

        let content = serde_json::to_string_pretty(records)?;
        let path = self.path(list);
        atomic_write(&path, content.as_bytes()).await.map_err(|e| {
            tracing::error!(list = %list.file_name(), error = %e, "failed to save list");
            e
        })?;

        log_store_event(
            "list_saved",
            true,
            Some(&format!("{} now holds {} records", list.file_name(), records.len())),
        );
        Ok(())
    }

    async fn backup(&self, list: ListName) -> GateResult<PathBuf> {
        fs::create_dir_all(&self.backup_dir).await?;
        // Millisecond timestamp plus a per-store sequence keeps names unique
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S-%3f");
        let seq = self.backup_seq.fetch_add(1, Ordering::Relaxed);
        let target = self
            .backup_dir
            .join(format!("gate-{}-{:04}-{}", timestamp, seq, list.file_name()));
        fs::copy(self.path(list), &target).await?;
        Ok(target)
    }
}

impl ListGuard<'_> {
    pub async fn load<T: DeserializeOwned>(&self) -> Vec<T> {
        self.store.load(self.list).await
    }

    pub async fn save<T: Serialize>(&self, records: &[T]) -> GateResult<()> {
        self.store.write_list(self.list, records).await
    }
}

/// Write to a temp file next to `path`, then rename over it
async fn atomic_write(path: &Path, content: &[u8]) -> GateResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| GateError::Storage(format!("Invalid path: {}", path.display())))?;
    fs::create_dir_all(parent).await?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = parent.join(format!(".{}.tmp", file_name));

    let mut file = fs::File::create(&temp_path).await?;
    file.write_all(content).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&temp_path, path).await?;
    Ok(())
}
