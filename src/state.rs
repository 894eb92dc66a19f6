//! Application state: external collaborators and HTTP quiz sessions.
//!
//! This module owns:
//!   - the vocabulary store and workflow client (trait objects)
//!   - quiz sessions created over HTTP, keyed by session id
//!
//! WebSocket connections keep their own session and never touch the map.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::session::QuizSession;
use crate::store::{SupabaseStore, VocabularyStore};
use crate::workflow::{WorkflowClient, WorkflowHttpClient};

pub type SharedSession = Arc<Mutex<QuizSession>>;

/// HTTP sessions untouched for this long are dropped.
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(30 * 60);
/// Upper bound on live HTTP sessions; the least recently used go first.
pub const MAX_SESSIONS: usize = 10_000;

pub struct SessionEntry {
    pub session: SharedSession,
    pub last_seen: Instant,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VocabularyStore>,
    pub workflow: Arc<dyn WorkflowClient>,
    pub sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
    pub session_ttl: Duration,
    pub max_sessions: usize,
}

impl AppState {
    /// Build the HTTP-backed collaborators from configuration.
    #[instrument(level = "info", skip_all)]
    pub fn from_config(config: AppConfig) -> Result<Self, AppError> {
        let store = SupabaseStore::new(&config)?;
        let workflow = WorkflowHttpClient::new(&config)?;
        info!(target: "recipe_vocab", endpoint = %config.generation_endpoint, store = %config.supabase_url, user = %config.workflow_user, "Collaborators configured.");
        Ok(Self::with_collaborators(Arc::new(store), Arc::new(workflow)))
    }

    pub fn with_collaborators(
        store: Arc<dyn VocabularyStore>,
        workflow: Arc<dyn WorkflowClient>,
    ) -> Self {
        Self {
            store,
            workflow,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            session_ttl: SESSION_IDLE_TTL,
            max_sessions: MAX_SESSIONS,
        }
    }

    /// Register a fresh idle session and return its id.
    /// Expired sessions are evicted first, then the least recently used
    /// ones while the map is full.
    #[instrument(level = "debug", skip(self))]
    pub async fn create_session(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, e| e.last_seen.elapsed() < self.session_ttl);
        while sessions.len() >= self.max_sessions.max(1) {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, e)| e.last_seen)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => sessions.remove(&k),
                None => break,
            };
        }
        if sessions.len() < before {
            debug!(target: "quiz", evicted = before - sessions.len(), "Idle quiz sessions evicted");
        }

        sessions.insert(
            id.clone(),
            SessionEntry {
                session: Arc::new(Mutex::new(QuizSession::new())),
                last_seen: Instant::now(),
            },
        );
        info!(target: "quiz", session = %id, live = sessions.len(), "Quiz session created");
        id
    }

    /// Look up a session and mark it as recently used.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn session(&self, id: &str) -> Result<SharedSession, AppError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(id)
            .filter(|e| e.last_seen.elapsed() < self.session_ttl)
            .ok_or_else(|| AppError::UnknownSession(id.to_string()))?;
        entry.last_seen = Instant::now();
        Ok(entry.session.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::tests::{FakeStore, FakeWorkflow};

    fn state() -> AppState {
        AppState::with_collaborators(
            Arc::new(FakeStore::default()),
            Arc::new(FakeWorkflow::quiz(Ok(String::new()))),
        )
    }

    #[tokio::test]
    async fn expired_sessions_are_evicted_on_create() {
        let mut st = state();
        st.session_ttl = Duration::from_millis(20);
        let old = st.create_session().await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(matches!(st.session(&old).await, Err(AppError::UnknownSession(_))));
        let fresh = st.create_session().await;
        assert!(!st.sessions.read().await.contains_key(&old));
        assert!(st.session(&fresh).await.is_ok());
    }

    #[tokio::test]
    async fn full_map_evicts_least_recently_used() {
        let mut st = state();
        st.max_sessions = 2;
        let a = st.create_session().await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let b = st.create_session().await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        st.session(&a).await.unwrap();

        let c = st.create_session().await;
        let live = st.sessions.read().await;
        assert_eq!(live.len(), 2);
        assert!(live.contains_key(&a) && live.contains_key(&c));
        assert!(!live.contains_key(&b));
    }
}
