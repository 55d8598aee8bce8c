//! Persisted watcher state, one record per project.

use chrono::{DateTime, Utc};
use quarry_core::store::{read_json, write_json};
use quarry_core::{KvStore, Result, StoreKey};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchState {
    pub project_id: String,
    pub watching: bool,
    /// Watched paths, worktree-relative.
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<DateTime<Utc>>,
    /// When the last change batch was flushed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
}

impl WatchState {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            watching: false,
            paths: Vec::new(),
            started: None,
            last_update: None,
        }
    }
}

/// Read-modify-write access to the persisted `WatchState`.
#[derive(Clone)]
pub(crate) struct StateRecorder {
    store: Arc<dyn KvStore>,
    project_id: String,
}

impl StateRecorder {
    pub(crate) fn new(store: Arc<dyn KvStore>, project_id: impl Into<String>) -> Self {
        Self {
            store,
            project_id: project_id.into(),
        }
    }

    fn key(&self) -> StoreKey {
        StoreKey::watcher(&self.project_id)
    }

    pub(crate) async fn get(&self) -> Option<WatchState> {
        match read_json(self.store.as_ref(), &self.key()).await {
            Ok(state) => Some(state),
            Err(e) => {
                debug!("No watcher state for {}: {}", self.project_id, e);
                None
            }
        }
    }

    pub(crate) async fn update(&self, apply: impl FnOnce(&mut WatchState)) -> Result<WatchState> {
        let mut state = self
            .get()
            .await
            .unwrap_or_else(|| WatchState::new(&self.project_id));
        apply(&mut state);
        write_json(self.store.as_ref(), &self.key(), &state).await?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::MemoryStore;

    #[tokio::test]
    async fn test_update_creates_then_modifies() {
        let recorder = StateRecorder::new(Arc::new(MemoryStore::new()), "p");
        assert!(recorder.get().await.is_none());

        recorder
            .update(|s| {
                s.watching = true;
                s.paths = vec!["src".into()];
            })
            .await
            .unwrap();
        recorder.update(|s| s.last_update = Some(Utc::now())).await.unwrap();

        let state = recorder.get().await.unwrap();
        assert!(state.watching);
        assert_eq!(state.paths, vec!["src"]);
        assert!(state.last_update.is_some());
    }
}
