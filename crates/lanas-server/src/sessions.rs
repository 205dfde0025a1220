//! In-memory form sessions.
//!
//! Each browser visit owns one [`FormState`] keyed by a random UUID. Sessions
//! expire after an idle TTL and are removed by the background sweeper in
//! `main.rs`. A session is marked busy while its submission runs; every other
//! operation on a busy session is refused with [`SessionError::Busy`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use lanas_core::error::FieldIssue;
use lanas_core::form::{FormFields, FormState};

/// Errors from session lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No live session has this id (never created, discarded, or expired).
    #[error("form session {id} not found")]
    NotFound { id: Uuid },

    /// A submission for this session is already running.
    #[error("form session {id} is being submitted")]
    Busy { id: Uuid },
}

struct Session {
    form: FormState,
    last_seen: Instant,
    submitting: bool,
}

/// Client view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct FormSnapshot {
    pub id: Uuid,
    pub step: usize,
    pub step_count: usize,
    pub step_title: &'static str,
    pub is_last_step: bool,
    pub step_valid: bool,
    /// Issues of the current step, so the UI can highlight fields.
    pub issues: Vec<FieldIssue>,
    pub fields: FormFields,
}

impl FormSnapshot {
    fn of(id: Uuid, form: &FormState) -> Self {
        let plan = form.plan();
        let issues = plan
            .validate(form.step(), form.fields())
            .err()
            .map(|e| e.issues().to_vec())
            .unwrap_or_default();
        Self {
            id,
            step: form.step(),
            step_count: form.step_count(),
            step_title: plan.step(form.step()).map_or("", |s| s.title),
            is_last_step: form.is_last_step(),
            step_valid: issues.is_empty(),
            issues,
            fields: form.fields().clone(),
        }
    }
}

/// Table of live form sessions.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
    ttl: Duration,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Open a fresh lead-intake session.
    pub async fn create(&self) -> FormSnapshot {
        let id = Uuid::new_v4();
        let form = FormState::lead_intake();
        let snapshot = FormSnapshot::of(id, &form);
        self.sessions.write().await.insert(
            id,
            Session {
                form,
                last_seen: Instant::now(),
                submitting: false,
            },
        );
        snapshot
    }

    /// Current view of a session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for unknown or expired sessions.
    pub async fn snapshot(&self, id: Uuid) -> Result<FormSnapshot, SessionError> {
        self.update(id, |_| ()).await.map(|((), snap)| snap)
    }

    /// Run `f` against a session's form and return its result with the
    /// updated view. Refreshes the idle timer.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for unknown or expired sessions and
    /// [`SessionError::Busy`] while a submission is running.
    pub async fn update<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut FormState) -> R,
    ) -> Result<(R, FormSnapshot), SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = self.live(&mut sessions, id)?;
        if session.submitting {
            return Err(SessionError::Busy { id });
        }
        session.last_seen = Instant::now();
        let out = f(&mut session.form);
        Ok((out, FormSnapshot::of(id, &session.form)))
    }

    /// Mark a session as submitting and hand out a copy of its form.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Busy`] if a submission is already running.
    pub async fn begin_submit(&self, id: Uuid) -> Result<FormState, SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = self.live(&mut sessions, id)?;
        if session.submitting {
            return Err(SessionError::Busy { id });
        }
        session.submitting = true;
        session.last_seen = Instant::now();
        Ok(session.form.clone())
    }

    /// Store the form returned by the pipeline and clear the busy flag.
    pub async fn finish_submit(&self, id: Uuid, form: FormState) -> Option<FormSnapshot> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id)?;
        session.form = form;
        session.submitting = false;
        session.last_seen = Instant::now();
        Some(FormSnapshot::of(id, &session.form))
    }

    /// Discard a session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for unknown sessions and
    /// [`SessionError::Busy`] while a submission is running, so the submit
    /// can still report its outcome.
    pub async fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        if self.live(&mut sessions, id)?.submitting {
            return Err(SessionError::Busy { id });
        }
        sessions.remove(&id);
        Ok(())
    }

    /// Remove every session idle longer than the TTL.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Instant::now()).await
    }

    /// [`sweep`](Self::sweep) against an explicit clock reading.
    pub async fn sweep_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.submitting || !is_expired(s, self.ttl, now));
        before.saturating_sub(sessions.len())
    }

    /// Number of sessions currently held.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn live<'a>(
        &self,
        sessions: &'a mut HashMap<Uuid, Session>,
        id: Uuid,
    ) -> Result<&'a mut Session, SessionError> {
        let expired = sessions
            .get(&id)
            .is_some_and(|s| !s.submitting && is_expired(s, self.ttl, Instant::now()));
        if expired {
            sessions.remove(&id);
        }
        sessions.get_mut(&id).ok_or(SessionError::NotFound { id })
    }
}

fn is_expired(session: &Session, ttl: Duration, now: Instant) -> bool {
    now.saturating_duration_since(session.last_seen) > ttl
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lanas_core::form::FieldId;

    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn create_and_snapshot() {
        let store = SessionStore::new(TTL);
        let created = store.create().await;
        assert_eq!(created.step, 1);
        assert_eq!(created.step_count, 4);
        assert!(!created.step_valid);

        let snap = store.snapshot(created.id).await.unwrap();
        assert_eq!(snap.id, created.id);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn update_mutates_the_form() {
        let store = SessionStore::new(TTL);
        let id = store.create().await.id;
        let (res, snap) = store
            .update(id, |form| form.set_field(FieldId::Name, "Ana"))
            .await
            .unwrap();
        assert!(res.is_ok());
        assert_eq!(snap.fields.text(FieldId::Name), "Ana");
    }

    #[tokio::test]
    async fn unknown_and_removed_sessions_are_not_found() {
        let store = SessionStore::new(TTL);
        let missing = Uuid::new_v4();
        assert_eq!(
            store.snapshot(missing).await.unwrap_err(),
            SessionError::NotFound { id: missing }
        );

        let id = store.create().await.id;
        assert!(store.remove(id).await.is_ok());
        assert_eq!(store.remove(id).await, Err(SessionError::NotFound { id }));
        assert!(store.snapshot(id).await.is_err());
    }

    #[tokio::test]
    async fn busy_session_refuses_second_submit_and_edits() {
        let store = SessionStore::new(TTL);
        let id = store.create().await.id;

        let form = store.begin_submit(id).await.unwrap();
        assert_eq!(store.begin_submit(id).await, Err(SessionError::Busy { id }));
        assert_eq!(
            store.update(id, |_| ()).await.unwrap_err(),
            SessionError::Busy { id }
        );

        store.finish_submit(id, form).await.unwrap();
        assert!(store.begin_submit(id).await.is_ok());
    }

    #[tokio::test]
    async fn busy_session_cannot_be_discarded() {
        let store = SessionStore::new(TTL);
        let id = store.create().await.id;

        let form = store.begin_submit(id).await.unwrap();
        assert_eq!(store.remove(id).await, Err(SessionError::Busy { id }));

        assert!(store.finish_submit(id, form).await.is_some());
        assert!(store.remove(id).await.is_ok());
    }

    #[tokio::test]
    async fn sweep_removes_idle_sessions_but_not_busy_ones() {
        let store = SessionStore::new(TTL);
        let idle = store.create().await.id;
        let busy = store.create().await.id;
        store.begin_submit(busy).await.unwrap();

        let later = Instant::now() + TTL + Duration::from_secs(1);
        assert_eq!(store.sweep_at(later).await, 1);
        assert!(store.snapshot(idle).await.is_err());
        assert_eq!(store.len().await, 1);

        // Nothing is idle yet from the real clock's point of view.
        assert_eq!(store.sweep().await, 0);
    }
}
