//! In-memory interview sessions keyed by id.
//!
//! Locks are only held for the duration of a synchronous mutation. Callers
//! that need the LLM copy what they need out, release the lock, and come
//! back with `update` once the call returns.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::session::InterviewSession;

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, InterviewSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> InterviewSession {
        let session = InterviewSession::new();
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        session
    }

    pub async fn get(&self, id: Uuid) -> Result<InterviewSession, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// Applies `f` to the session under the write lock.
    pub async fn update<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut InterviewSession) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        f(session)
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Interview {id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::session::Stage;

    #[tokio::test]
    async fn test_create_and_get() {
        let store = SessionStore::new();
        let created = store.create().await;
        let fetched = store.get(created.id).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_mutates_stored_session() {
        let store = SessionStore::new();
        let id = store.create().await.id;

        let done = store
            .update(id, |s| s.submit_profile_answer("Ada Park"))
            .await
            .unwrap();
        assert!(done.is_none());

        let session = store.get(id).await.unwrap();
        assert_eq!(session.stage, Stage::Profile { step: 1 });
    }

    #[tokio::test]
    async fn test_failed_update_leaves_session_unchanged() {
        let store = SessionStore::new();
        let id = store.create().await.id;

        let result = store.update(id, |s| s.submit_profile_answer("")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(store.get(id).await.unwrap().transcript.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(store.get(id).await, Err(AppError::NotFound(_))));
        assert!(matches!(store.remove(id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            store.update(id, |_| Ok(())).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove() {
        let store = SessionStore::new();
        let id = store.create().await.id;
        store.remove(id).await.unwrap();
        assert_eq!(store.len().await, 0);
    }
}
