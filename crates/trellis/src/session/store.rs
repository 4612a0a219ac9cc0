//! Keyed storage of session stage lists.

use super::StageRecord;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use trellis_jsonl::{read_jsonl_resilient, write_jsonl_atomic};
use tracing::{debug, warn};

/// Storage of stage lists keyed by session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The stages of session `id`, or `None` if it is unknown.
    async fn get(&self, id: &str) -> Result<Option<Vec<StageRecord>>>;

    /// Store `stages` as the full stage list of session `id`.
    async fn put(&self, id: &str, stages: Vec<StageRecord>) -> Result<()>;

    /// Every known session id, in creation order.
    async fn list(&self) -> Result<Vec<String>>;
}

/// One line of the sessions file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionLine {
    session_id: String,
    #[serde(default)]
    stages: Vec<StageRecord>,
}

/// Sessions persisted as JSONL, one session per line.
///
/// Every `put` rewrites the whole file atomically.
#[derive(Debug, Clone)]
pub struct JsonlSessionStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonlSessionStore {
    /// Create a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Path of the sessions file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<SessionLine>> {
        match read_jsonl_resilient::<SessionLine, _>(&self.path).await {
            Ok((lines, warnings)) => {
                for warning in &warnings {
                    warn!(path = %self.path.display(), %warning, "Skipped session line");
                }
                Ok(lines)
            }
            Err(e) if e.is_not_found() => {
                debug!(path = %self.path.display(), "Sessions file not found, starting empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SessionStore for JsonlSessionStore {
    async fn get(&self, id: &str) -> Result<Option<Vec<StageRecord>>> {
        let lines = self.read_all().await?;
        Ok(lines
            .into_iter()
            .find(|line| line.session_id == id)
            .map(|line| line.stages))
    }

    async fn put(&self, id: &str, stages: Vec<StageRecord>) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut lines = self.read_all().await?;
        match lines.iter_mut().find(|line| line.session_id == id) {
            Some(line) => line.stages = stages,
            None => lines.push(SessionLine {
                session_id: id.to_string(),
                stages,
            }),
        }
        write_jsonl_atomic(&self.path, &lines).await?;
        debug!(path = %self.path.display(), sessions = lines.len(), "Saved sessions");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let lines = self.read_all().await?;
        Ok(lines.into_iter().map(|line| line.session_id).collect())
    }
}

/// Ephemeral session storage.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<Vec<(String, Vec<StageRecord>)>>>,
}

impl InMemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: &str) -> Result<Option<Vec<StageRecord>>> {
        let sessions = self.sessions.lock().await;
        Ok(sessions
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, stages)| stages.clone()))
    }

    async fn put(&self, id: &str, stages: Vec<StageRecord>) -> Result<()> {
        let mut sessions = self.sessions.lock().await;
        match sessions.iter_mut().find(|(key, _)| key == id) {
            Some((_, existing)) => *existing = stages,
            None => sessions.push((id.to_string(), stages)),
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let sessions = self.sessions.lock().await;
        Ok(sessions.iter().map(|(key, _)| key.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::StageRecord;
    use crate::session::payload::{StagePayload, SummaryData};
    use tempfile::tempdir;

    fn record(n: usize) -> StageRecord {
        StageRecord {
            stage_number: n,
            analysis: format!("stage {n}"),
            completed: false,
            payload: StagePayload::Summary(SummaryData::default()),
        }
    }

    #[tokio::test]
    async fn jsonl_store_persists_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sessions.jsonl");

        let store = JsonlSessionStore::new(&path);
        assert!(store.get("s1").await.unwrap().is_none());
        store.put("s1", vec![record(1)]).await.unwrap();
        store.put("s2", vec![]).await.unwrap();
        store.put("s1", vec![record(1), record(2)]).await.unwrap();

        let reopened = JsonlSessionStore::new(&path);
        assert_eq!(reopened.list().await.unwrap(), ["s1", "s2"]);
        assert_eq!(reopened.get("s1").await.unwrap().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn jsonl_store_skips_corrupt_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sessions.jsonl");
        tokio::fs::write(&path, "not json\n{\"sessionId\":\"ok\",\"stages\":[]}\n")
            .await
            .unwrap();

        let store = JsonlSessionStore::new(&path);
        assert_eq!(store.list().await.unwrap(), ["ok"]);
    }

    #[tokio::test]
    async fn in_memory_store_replaces_in_place() {
        let store = InMemorySessionStore::new();
        store.put("a", vec![record(1)]).await.unwrap();
        store.put("b", vec![]).await.unwrap();
        store.put("a", vec![]).await.unwrap();

        assert_eq!(store.list().await.unwrap(), ["a", "b"]);
        assert_eq!(store.get("a").await.unwrap(), Some(vec![]));
    }
}
