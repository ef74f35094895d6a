//! Durable JSON-file node store
//!
//! The whole tree is persisted as one JSON document. A commit builds the next
//! state in memory, writes it to a temp file beside the real one, syncs it,
//! then renames it over the real file, so a crash leaves either the old or the
//! new snapshot on disk. The in-memory copy is swapped only after the rename
//! succeeds.
//!
//! The write runs on its own task and is never abandoned half-way: once
//! started, the in-memory swap follows the rename even if the caller stops
//! waiting. A deadline is checked before the rename; past it the temp file is
//! dropped and the commit reports `StoreError::Timeout` with nothing applied.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::sync::RwLock;

use crate::db::memory_store::apply_batch;
use crate::db::{NodeStore, StoreError, WriteBatch};
use crate::models::Node;

const STORE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    timeout: Duration,
}

impl Deadline {
    fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
            timeout,
        }
    }

    fn expired(&self) -> bool {
        Instant::now() >= self.at
    }
}

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    nodes: Arc<RwLock<HashMap<String, Node>>>,
}

impl FileStore {
    /// Open the store at `path`, loading existing contents if the file exists.
    ///
    /// Parent directories are created as needed. A missing file is an empty
    /// tree; it is written on the first commit.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let nodes = match fs::read_to_string(&path).await {
            Ok(contents) => {
                let file: StoreFile = serde_json::from_str(&contents)?;
                if file.version != STORE_FORMAT_VERSION {
                    return Err(StoreError::unavailable(format!(
                        "unsupported store format version {} in {}",
                        file.version,
                        path.display()
                    )));
                }
                file.nodes
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        tracing::info!(path = %path.display(), nodes = nodes.len(), "Opened file store");

        Ok(Self {
            path,
            nodes: Arc::new(RwLock::new(
                nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
            )),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `batch` on a detached task so the write cannot be cut short
    async fn write(&self, batch: WriteBatch, deadline: Option<Deadline>) -> Result<(), StoreError> {
        let nodes = Arc::clone(&self.nodes);
        let path = self.path.clone();

        let task = tokio::spawn(async move {
            let mut guard = match deadline {
                Some(deadline) => tokio::time::timeout_at(
                    tokio::time::Instant::from_std(deadline.at),
                    nodes.write_owned(),
                )
                .await
                .map_err(|_| StoreError::Timeout(deadline.timeout))?,
                None => nodes.write_owned().await,
            };

            let mut next = (*guard).clone();
            apply_batch(&mut next, batch);

            let next = tokio::task::spawn_blocking(move || {
                persist(&path, &next, deadline).map(|()| next)
            })
            .await
            .map_err(|e| StoreError::unavailable(format!("store write task failed: {e}")))??;

            *guard = next;
            Ok::<(), StoreError>(())
        });

        task.await
            .map_err(|e| StoreError::unavailable(format!("store commit task failed: {e}")))?
    }
}

/// Write `nodes` to the temp file, sync it and rename it into place.
///
/// The rename is the commit point and is skipped once `deadline` has passed.
fn persist(
    path: &Path,
    nodes: &HashMap<String, Node>,
    deadline: Option<Deadline>,
) -> Result<(), StoreError> {
    let mut records: Vec<Node> = nodes.values().cloned().collect();
    records.sort_by(|a, b| a.id.cmp(&b.id));

    let serialized = serde_json::to_vec_pretty(&StoreFile {
        version: STORE_FORMAT_VERSION,
        nodes: records,
    })?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    temp.write_all(&serialized)
        .and_then(|()| temp.flush())
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| StoreError::io(temp.path(), e))?;

    // dropping the temp file deletes it
    if let Some(deadline) = deadline.filter(Deadline::expired) {
        tracing::debug!(path = %path.display(), "Commit deadline passed before rename; discarded");
        return Err(StoreError::Timeout(deadline.timeout));
    }

    temp.persist(path)
        .map_err(|e| StoreError::io(path, e.error))?;
    Ok(())
}

#[async_trait]
impl NodeStore for FileStore {
    async fn get_node(&self, id: &str) -> Result<Option<Node>, StoreError> {
        Ok(self.nodes.read().await.get(id).cloned())
    }

    async fn get_all_nodes(&self) -> Result<Vec<Node>, StoreError> {
        Ok(self.nodes.read().await.values().cloned().collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        self.write(batch, None).await
    }

    async fn commit_within(&self, batch: WriteBatch, timeout: Duration) -> Result<(), StoreError> {
        self.write(batch, Some(Deadline::after(timeout))).await
    }
}
