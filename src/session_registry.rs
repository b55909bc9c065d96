use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::session::ChatSession;
use crate::types::{AppError, AppResult};

pub type SharedSession = Arc<Mutex<ChatSession>>;

pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 1_000;

/// When sessions are dropped from the registry
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// Sessions untouched for this long are removed
    pub idle_timeout: Duration,
    /// Upper bound on live sessions; the least recently used idle one makes room
    pub max_sessions: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl SessionLimits {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            idle_timeout: Duration::from_secs(config.session_idle_timeout_secs),
            max_sessions: config.max_sessions,
        }
    }
}

struct Entry {
    session: SharedSession,
    last_used: Instant,
}

impl Entry {
    // A handler still holds a clone while a request for this session runs
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.session) > 1
    }
}

/// In-memory sessions, one per browser tab
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, Entry>>>,
    limits: SessionLimits,
}

impl SessionRegistry {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            inner: Arc::default(),
            limits,
        }
    }

    pub async fn create(&self) -> (Uuid, SharedSession) {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(ChatSession::new()));

        let mut guard = self.inner.write().await;
        Self::prune(&mut guard, self.limits.idle_timeout);
        if guard.len() >= self.limits.max_sessions {
            let oldest = guard
                .iter()
                .filter(|(_, entry)| !entry.in_use())
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| *id);
            match oldest {
                Some(oldest) => {
                    guard.remove(&oldest);
                    debug!(session_id = %oldest, "Evicted least recently used session");
                }
                None => warn!(sessions = guard.len(), "Session limit reached with every session in use"),
            }
        }
        guard.insert(
            id,
            Entry {
                session: Arc::clone(&session),
                last_used: Instant::now(),
            },
        );
        (id, session)
    }

    /// Look up a session and mark it as used
    pub async fn get(&self, session_id: &Uuid) -> Option<SharedSession> {
        let mut guard = self.inner.write().await;
        guard.get_mut(session_id).map(|entry| {
            entry.last_used = Instant::now();
            Arc::clone(&entry.session)
        })
    }

    pub async fn require(&self, session_id: &Uuid) -> AppResult<SharedSession> {
        self.get(session_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("session {}", session_id)))
    }

    /// Drop idle sessions now; returns how many were removed
    pub async fn remove_expired(&self) -> usize {
        let mut guard = self.inner.write().await;
        Self::prune(&mut guard, self.limits.idle_timeout)
    }

    /// Sweep idle sessions on a fixed period for the life of the process
    pub fn spawn_expiry(&self, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = registry.remove_expired().await;
                if removed > 0 {
                    info!(removed, "Expired idle sessions");
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    fn prune(sessions: &mut HashMap<Uuid, Entry>, idle_timeout: Duration) -> usize {
        let before = sessions.len();
        sessions.retain(|_, entry| entry.in_use() || entry.last_used.elapsed() < idle_timeout);
        before - sessions.len()
    }
}
