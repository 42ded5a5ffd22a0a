//! JSON-lines ledger store.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{Error, Result};

/// Default ledger file name, created under the download root.
pub const LEDGER_FILE_NAME: &str = ".douyin-ledger.jsonl";

/// One completed acquisition.
///
/// `owner_id` is the enumerated identifier: the author for post/like scopes,
/// the collection or music id for those scopes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub scope: String,
    pub owner_id: String,
    pub item_id: i64,
    pub fetched_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

type Key = (String, String, i64);

struct LedgerInner {
    seen: HashSet<Key>,
    writer: File,
}

/// Durable, idempotent record of completed items.
///
/// Backed by an append-only JSON-lines file; the in-memory key set is a
/// cache of the file contents, loaded once at open. Writes are serialized
/// behind an async mutex so the store is safe to share across download
/// workers. Any I/O failure is surfaced as [`Error::Ledger`] and treated as
/// fatal by the orchestrator.
pub struct Ledger {
    path: PathBuf,
    inner: Mutex<LedgerInner>,
}

impl Ledger {
    /// Open (or create) the ledger file and load its key index.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Ledger(format!("create {}: {}", parent.display(), e)))?;
        }

        let mut seen = HashSet::new();
        if path.exists() {
            let file = File::open(path)
                .map_err(|e| Error::Ledger(format!("open {}: {}", path.display(), e)))?;
            let reader = BufReader::new(file);
            let mut line_no = 0usize;
            for line in reader.lines() {
                line_no += 1;
                let line =
                    line.map_err(|e| Error::Ledger(format!("read {}: {}", path.display(), e)))?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<LedgerRecord>(&line) {
                    Ok(record) => {
                        seen.insert((record.scope, record.owner_id, record.item_id));
                    }
                    Err(e) => {
                        // A torn trailing line from an interrupted run is
                        // expected; anything else is worth a warning.
                        tracing::warn!(
                            "ledger {}: discarding unparsable line {}: {}",
                            path.display(),
                            line_no,
                            e
                        );
                    }
                }
            }
        }

        let mut writer = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::Ledger(format!("open {} for append: {}", path.display(), e)))?;

        // A torn append leaves no trailing newline; terminate it so the next
        // record starts on its own line.
        if ends_without_newline(path)? {
            writer
                .write_all(b"\n")
                .map_err(|e| Error::Ledger(format!("repair {}: {}", path.display(), e)))?;
        }

        tracing::debug!("ledger {} loaded, {} records", path.display(), seen.len());

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(LedgerInner { seen, writer }),
        })
    }

    /// Ledger file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `(scope, owner, item)` has already been recorded.
    pub async fn exists(&self, scope: &str, owner_id: &str, item_id: i64) -> bool {
        let inner = self.inner.lock().await;
        inner
            .seen
            .contains(&(scope.to_string(), owner_id.to_string(), item_id))
    }

    /// Record a completed item.
    ///
    /// Idempotent: recording an existing key is a no-op and returns `false`.
    /// The record is flushed before the key becomes visible so a crash never
    /// leaves the index ahead of the file.
    pub async fn record(
        &self,
        scope: &str,
        owner_id: &str,
        item_id: i64,
        title: Option<String>,
    ) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        let key = (scope.to_string(), owner_id.to_string(), item_id);
        if inner.seen.contains(&key) {
            return Ok(false);
        }

        let record = LedgerRecord {
            scope: scope.to_string(),
            owner_id: owner_id.to_string(),
            item_id,
            fetched_at: Utc::now(),
            title,
        };
        let mut line = serde_json::to_string(&record)
            .map_err(|e| Error::Ledger(format!("serialize record: {}", e)))?;
        line.push('\n');

        inner
            .writer
            .write_all(line.as_bytes())
            .map_err(|e| Error::Ledger(format!("append {}: {}", self.path.display(), e)))?;
        inner
            .writer
            .flush()
            .map_err(|e| Error::Ledger(format!("flush {}: {}", self.path.display(), e)))?;

        inner.seen.insert(key);
        Ok(true)
    }

    /// Number of records currently indexed.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.seen.len()
    }

    /// Whether the ledger holds no records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn ends_without_newline(path: &Path) -> Result<bool> {
    use std::io::{Read, Seek, SeekFrom};

    let mut file =
        File::open(path).map_err(|e| Error::Ledger(format!("open {}: {}", path.display(), e)))?;
    let len = file
        .metadata()
        .map_err(|e| Error::Ledger(format!("stat {}: {}", path.display(), e)))?
        .len();
    if len == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))
        .map_err(|e| Error::Ledger(format!("seek {}: {}", path.display(), e)))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)
        .map_err(|e| Error::Ledger(format!("read {}: {}", path.display(), e)))?;
    Ok(last[0] != b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn record_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let ledger = Ledger::open(&path).unwrap();

        assert!(ledger.record("post", "u1", 42, None).await.unwrap());
        assert!(!ledger.record("post", "u1", 42, None).await.unwrap());
        assert!(ledger.exists("post", "u1", 42).await);
        assert_eq!(ledger.len().await, 1);

        // Exactly one line on disk.
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        {
            let ledger = Ledger::open(&path).unwrap();
            ledger
                .record("post", "u1", 1, Some("first".into()))
                .await
                .unwrap();
            ledger.record("mix", "m9", 2, None).await.unwrap();
        }

        let ledger = Ledger::open(&path).unwrap();
        assert!(ledger.exists("post", "u1", 1).await);
        assert!(ledger.exists("mix", "m9", 2).await);
        assert!(!ledger.exists("post", "u1", 2).await);
        assert_eq!(ledger.len().await, 2);
    }

    #[tokio::test]
    async fn keys_are_scoped() {
        let dir = tempdir().unwrap();
        let ledger = Ledger::open(&dir.path().join("ledger.jsonl")).unwrap();

        ledger.record("post", "u1", 7, None).await.unwrap();
        assert!(!ledger.exists("like", "u1", 7).await);
        assert!(!ledger.exists("post", "u2", 7).await);
    }

    #[tokio::test]
    async fn torn_trailing_line_is_discarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        {
            let ledger = Ledger::open(&path).unwrap();
            ledger.record("post", "u1", 1, None).await.unwrap();
        }
        // Simulate a crash mid-append.
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(b"{\"scope\":\"post\",\"owner_id\":\"u1\"").unwrap();
        }

        let ledger = Ledger::open(&path).unwrap();
        assert_eq!(ledger.len().await, 1);
        assert!(ledger.exists("post", "u1", 1).await);

        // The store keeps accepting records after recovery.
        assert!(ledger.record("post", "u1", 2, None).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_records_keep_one_row_per_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let ledger = std::sync::Arc::new(Ledger::open(&path).unwrap());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.record("post", "u1", 99, None).await.unwrap()
            }));
        }
        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
