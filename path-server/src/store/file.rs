//! Request store backed by JSON documents on disk.
//!
//! Layout under the root directory:
//!
//! ```text
//! requests/{token}.json   pathing records (in progress or success)
//! failures/{token}.json   failure records
//! ```
//!
//! Tokens are restricted to URI-safe characters, so they are safe to use as
//! file names. Every write is staged in a temporary file first: new
//! documents are hard-linked into place (failing if one already exists) and
//! updates are renamed over the old file, so readers never see a
//! half-written document.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::domain::{
    Coordinate, FailureCause, FailureRecord, PathingRecord, RequestToken, Solution, StoredRequest,
};

use super::{RequestStore, StoreError};

const REQUESTS_DIR: &str = "requests";
const FAILURES_DIR: &str = "failures";

/// Durable request store writing one JSON file per record.
#[derive(Debug, Clone)]
pub struct FileRequestStore {
    root: PathBuf,
}

impl FileRequestStore {
    /// Open a store rooted at `root`, creating its directories if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        for dir in [REQUESTS_DIR, FAILURES_DIR] {
            fs::create_dir_all(root.join(dir))
                .await
                .map_err(|e| unavailable(format!("failed to create {dir} directory"), e))?;
        }
        Ok(Self { root })
    }

    fn request_path(&self, token: &RequestToken) -> PathBuf {
        self.root
            .join(REQUESTS_DIR)
            .join(format!("{}.json", token.as_str()))
    }

    fn failure_path(&self, token: &RequestToken) -> PathBuf {
        self.root
            .join(FAILURES_DIR)
            .join(format!("{}.json", token.as_str()))
    }
}

fn unavailable(context: impl std::fmt::Display, err: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable {
        message: format!("{context}: {err}"),
    }
}

/// Read and parse a document, returning `None` if the file does not exist.
async fn read_doc<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let contents = match fs::read(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(unavailable(format!("failed to read {}", path.display()), e)),
    };

    serde_json::from_slice(&contents)
        .map(Some)
        .map_err(|e| unavailable(format!("corrupt document {}", path.display()), e))
}

/// Create a document. Returns `false` if it already exists.
///
/// The contents are written to a temporary file and hard-linked into place,
/// so a reader sees the document fully written or not at all.
async fn create_doc<T: Serialize>(path: &Path, doc: &T) -> Result<bool, StoreError> {
    let json = serde_json::to_vec_pretty(doc).map_err(|e| unavailable("failed to serialize", e))?;
    let tmp = temp_path(path);
    write_temp(&tmp, &json).await?;

    let linked = fs::hard_link(&tmp, path).await;
    discard_temp(&tmp).await;

    match linked {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(unavailable(format!("failed to create {}", path.display()), e)),
    }
}

/// Replace a document atomically via a temporary file and rename.
async fn replace_doc<T: Serialize>(path: &Path, doc: &T) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(doc).map_err(|e| unavailable("failed to serialize", e))?;
    let tmp = temp_path(path);
    write_temp(&tmp, &json).await?;

    if let Err(e) = fs::rename(&tmp, path).await {
        discard_temp(&tmp).await;
        return Err(unavailable(format!("failed to rename {}", tmp.display()), e));
    }
    Ok(())
}

/// A unique sibling of `path` for staging writes.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{:016x}.tmp", rand::random::<u64>()));
    path.with_file_name(name)
}

/// Write and sync a staging file, removing it again if anything fails.
async fn write_temp(tmp: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let written = async {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(tmp)
            .await?;
        file.write_all(contents).await?;
        file.sync_all().await
    }
    .await;

    if let Err(e) = written {
        // The file may never have been created.
        fs::remove_file(tmp).await.ok();
        return Err(unavailable(format!("failed to write {}", tmp.display()), e));
    }
    Ok(())
}

async fn discard_temp(tmp: &Path) {
    if let Err(e) = fs::remove_file(tmp).await {
        warn!(path = %tmp.display(), error = %e, "failed to remove temporary file");
    }
}

/// Remove a document; a missing file is not an error.
async fn remove_doc(path: &Path) -> Result<bool, StoreError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(unavailable(format!("failed to remove {}", path.display()), e)),
    }
}

#[async_trait]
impl RequestStore for FileRequestStore {
    async fn create_provisional(
        &self,
        token: &RequestToken,
        path: &[Coordinate],
    ) -> Result<PathingRecord, StoreError> {
        if fs::try_exists(self.failure_path(token))
            .await
            .map_err(|e| unavailable("failed to check failure record", e))?
        {
            return Err(StoreError::DuplicateToken(token.clone()));
        }

        let record = PathingRecord::provisional(token.clone(), path.to_vec(), Utc::now());
        if !create_doc(&self.request_path(token), &record).await? {
            return Err(StoreError::DuplicateToken(token.clone()));
        }
        Ok(record)
    }

    async fn finalize(
        &self,
        token: &RequestToken,
        solution: Solution,
    ) -> Result<PathingRecord, StoreError> {
        let path = self.request_path(token);
        let mut record: PathingRecord = read_doc(&path)
            .await?
            .filter(PathingRecord::is_in_progress)
            .ok_or_else(|| StoreError::MissingProvisional(token.clone()))?;

        record.conclude_with(solution, Utc::now());
        replace_doc(&path, &record).await?;
        Ok(record)
    }

    async fn record_failure(
        &self,
        token: &RequestToken,
        cause: &FailureCause,
    ) -> Result<FailureRecord, StoreError> {
        let record = FailureRecord::new(token.clone(), cause, Utc::now());
        if !create_doc(&self.failure_path(token), &record).await? {
            return Err(StoreError::DuplicateToken(token.clone()));
        }
        Ok(record)
    }

    async fn discard_provisional(&self, token: &RequestToken) -> Result<(), StoreError> {
        remove_doc(&self.request_path(token)).await.map(|_| ())
    }

    async fn lookup(&self, token: &RequestToken) -> Result<Option<StoredRequest>, StoreError> {
        if let Some(failure) = read_doc::<FailureRecord>(&self.failure_path(token)).await? {
            if remove_doc(&self.request_path(token)).await? {
                warn!(
                    %token,
                    "found both pathing and failure records; removed stale pathing record"
                );
            }
            return Ok(Some(StoredRequest::Failed(failure)));
        }

        Ok(read_doc::<PathingRecord>(&self.request_path(token))
            .await?
            .map(StoredRequest::from_pathing))
    }
}
