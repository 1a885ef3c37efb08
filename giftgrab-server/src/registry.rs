use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use uuid::Uuid;

use giftgrab_core::Game;

use crate::hub::Hub;
use crate::session::{self, SessionHandle};

/// One live session: the actor handle, its broadcast hub, the host
/// capability token, and an activity clock for the idle sweeper.
pub struct SessionEntry {
    pub handle: SessionHandle,
    pub hub: Arc<Hub>,
    pub host_token: String,
    last_activity: Mutex<Instant>,
}

impl SessionEntry {
    pub async fn touch(&self) {
        *self.last_activity.lock().await = Instant::now();
    }

    async fn idle_for(&self) -> Duration {
        self.last_activity.lock().await.elapsed()
    }
}

/// Process-wide session lookup. Entries are added only by explicit creation
/// (or restore from disk) and removed only by explicit close or the idle
/// sweeper; each session locks independently and never contends with
/// another.
pub struct Registry {
    sessions: RwLock<HashMap<String, Arc<SessionEntry>>>,
    queue_capacity: usize,
    persist_path: Option<PathBuf>,
}

#[derive(Serialize, Deserialize)]
struct SessionRecord {
    game: Game,
    host_token: String,
}

impl Registry {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            queue_capacity,
            persist_path: None,
        }
    }

    /// Registry backed by a best-effort JSON snapshot file; sessions found
    /// in it are respawned immediately.
    pub async fn with_persistence(queue_capacity: usize, path: PathBuf) -> Self {
        let mut registry = Self::new(queue_capacity);
        registry.persist_path = Some(path.clone());
        if let Ok(bytes) = tokio::fs::read(&path).await {
            if let Ok(saved) = serde_json::from_slice::<HashMap<String, SessionRecord>>(&bytes) {
                let mut sessions = registry.sessions.write().await;
                for (id, record) in saved {
                    let entry = Self::entry(record.game, record.host_token, queue_capacity);
                    sessions.insert(id, Arc::new(entry));
                }
                log::info!("[registry] restored {} sessions from disk", sessions.len());
            }
        }
        registry
    }

    fn entry(game: Game, host_token: String, queue_capacity: usize) -> SessionEntry {
        let hub = Arc::new(Hub::new(queue_capacity));
        let handle = session::spawn(game, hub.clone());
        SessionEntry {
            handle,
            hub,
            host_token,
            last_activity: Mutex::new(Instant::now()),
        }
    }

    pub async fn create(&self, seed: Option<u64>) -> (String, Arc<SessionEntry>) {
        let session_id = Uuid::new_v4().to_string();
        let host_token = Uuid::new_v4().to_string();
        let game = Game::new(session_id.clone(), seed.unwrap_or_else(rand::random));
        let entry = Arc::new(Self::entry(game, host_token, self.queue_capacity));
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), entry.clone());
        log::info!("[registry] created session {session_id}");
        (session_id, entry)
    }

    pub async fn get(&self, id: &str) -> Option<Arc<SessionEntry>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Stops the session actor and tears down its hub state.
    pub async fn close(&self, id: &str) -> bool {
        match self.sessions.write().await.remove(id) {
            Some(entry) => {
                entry.handle.shutdown().await;
                log::info!("[registry] closed session {id}");
                true
            }
            None => false,
        }
    }

    /// Evicts sessions with zero connections and no activity past `idle`.
    pub async fn sweep(&self, idle: Duration) {
        let mut stale = Vec::new();
        for (id, entry) in self.sessions.read().await.iter() {
            if entry.hub.is_empty().await && entry.idle_for().await > idle {
                stale.push(id.clone());
            }
        }
        for id in stale {
            log::info!("[registry] evicting idle session {id}");
            self.close(&id).await;
        }
    }

    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration, idle: Duration) {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(every);
            loop {
                tick.tick().await;
                registry.sweep(idle).await;
            }
        });
    }

    /// Best-effort snapshot of every session to the configured path.
    pub async fn persist(&self) {
        let Some(path) = &self.persist_path else {
            return;
        };
        let records: HashMap<String, SessionRecord> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, entry)| {
                (
                    id.clone(),
                    SessionRecord {
                        game: entry.handle.snapshot(),
                        host_token: entry.host_token.clone(),
                    },
                )
            })
            .collect();
        match serde_json::to_vec_pretty(&records) {
            Ok(json) => {
                if let Err(err) = tokio::fs::write(path, json).await {
                    log::error!("[registry] persist failed: {err}");
                }
            }
            Err(err) => log::error!("[registry] persist serialization failed: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftgrab_core::{Action, Context};

    #[tokio::test]
    async fn create_get_close_lifecycle() {
        let registry = Registry::new(8);
        let (id, entry) = registry.create(Some(1)).await;
        assert!(!entry.host_token.is_empty());
        assert!(registry.get(&id).await.is_some());

        assert!(registry.close(&id).await);
        assert!(registry.get(&id).await.is_none());
        assert!(!registry.close(&id).await);
    }

    #[tokio::test]
    async fn closed_sessions_refuse_further_actions() {
        let registry = Registry::new(8);
        let (id, entry) = registry.create(Some(1)).await;
        registry.close(&id).await;

        let err = entry
            .handle
            .apply(
                Action::Join {
                    player_id: "p1".into(),
                    name: "alice".into(),
                    joined_at: 0,
                },
                Context::anonymous(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, crate::session::SessionError::Closed);
    }

    #[tokio::test]
    async fn sweep_evicts_only_idle_unwatched_sessions() {
        let registry = Registry::new(8);
        let (idle_id, _) = registry.create(Some(1)).await;
        let (watched_id, watched) = registry.create(Some(2)).await;
        let _outlet = watched.hub.connect("p1".to_string()).await;

        tokio::time::sleep(Duration::from_millis(10)).await;
        registry.sweep(Duration::from_millis(1)).await;

        assert!(registry.get(&idle_id).await.is_none());
        assert!(registry.get(&watched_id).await.is_some());

        // Fresh activity also protects a connectionless session.
        let (busy_id, busy) = registry.create(Some(3)).await;
        busy.touch().await;
        registry.sweep(Duration::from_secs(3600)).await;
        assert!(registry.get(&busy_id).await.is_some());
    }
}
