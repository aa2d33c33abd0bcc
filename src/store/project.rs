//! Project state store.
//!
//! Holds the participant's profile and project state in memory and writes
//! every change through to the document store. Updates are optimistic: the
//! in-memory state changes synchronously and is never rolled back when the
//! durable write fails. Failures surface through [`ProjectStore::last_error`]
//! and the notice queue instead.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;

use super::{Document, DocumentStore, Identity, IdentityProvider, PersistenceError, PROJECTS, USERS};
use crate::core::{
    describe_save_age, AiExperience, Language, Message, PreconditionError, ProfilePatch,
    ProjectPatch, ProjectState, UserProfile,
};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: Message,
}

impl Notice {
    fn success(message: Message) -> Self {
        Self { kind: NoticeKind::Success, message }
    }

    fn error(message: Message) -> Self {
        Self { kind: NoticeKind::Error, message }
    }

    /// Localized text.
    pub fn text(&self, lang: Language) -> &'static str {
        self.message.text(lang)
    }
}

/// What happened to the durable write of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Applied and persisted
    Saved,
    /// Applied in memory, durable write failed
    Failed,
    /// Nothing applied, no one is signed in
    NoIdentity,
    /// Nothing to apply
    Unchanged,
}

#[derive(Debug, Default)]
struct Inner {
    identity: Option<Identity>,
    /// Identity set but its documents not loaded yet
    loading: bool,
    profile: Option<UserProfile>,
    state: ProjectState,
    language: Language,
    last_saved: Option<DateTime<Utc>>,
    last_error: Option<String>,
    notices: Vec<Notice>,
}

/// Owner of the project state.
pub struct ProjectStore {
    documents: Arc<dyn DocumentStore>,
    inner: Mutex<Inner>,
}

impl ProjectStore {
    /// Create an empty, signed-out store.
    pub fn new(documents: Arc<dyn DocumentStore>, language: Language) -> Self {
        Self { documents, inner: Mutex::new(Inner { language, ..Default::default() }) }
    }

    /// Snapshot of the project state.
    pub fn state(&self) -> ProjectState {
        self.inner.lock().state.clone()
    }

    /// Read the state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&ProjectState) -> R) -> R {
        f(&self.inner.lock().state)
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner.lock().identity.clone()
    }

    /// Whether the current identity's documents are still loading.
    ///
    /// Writes are refused while loading so an empty state never replaces the
    /// stored project.
    pub fn is_loading(&self) -> bool {
        self.inner.lock().loading
    }

    /// The identity, once its documents have loaded.
    pub fn ready_identity(&self) -> Option<Identity> {
        let inner = self.inner.lock();
        inner.identity.clone().filter(|_| !inner.loading)
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.inner.lock().profile.clone()
    }

    pub fn language(&self) -> Language {
        self.inner.lock().language
    }

    pub fn set_language(&self, language: Language) {
        self.inner.lock().language = language;
    }

    /// Time of the last successful durable write.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().last_saved
    }

    /// Message of the last failed durable write, cleared by the next success.
    pub fn last_error(&self) -> Option<String> {
        self.inner.lock().last_error.clone()
    }

    /// Take all queued notices.
    pub fn drain_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.inner.lock().notices)
    }

    /// Save indicator text, e.g. "Just saved" or "3m ago".
    pub fn save_status(&self, now: DateTime<Utc>) -> Option<String> {
        let inner = self.inner.lock();
        let saved = inner.last_saved?;
        Some(describe_save_age(inner.language, (now - saved).num_seconds()))
    }

    /// Switch to a new identity and load its data.
    ///
    /// The project is only loaded when a profile exists; otherwise the state
    /// resets to empty. Signing out resets everything. Until the load
    /// finishes every write is refused; a failed load keeps refusing them
    /// until the identity is set again.
    pub async fn set_identity(&self, identity: Option<Identity>) -> Result<(), PersistenceError> {
        {
            let mut inner = self.inner.lock();
            let language = inner.language;
            *inner = Inner {
                identity: identity.clone(),
                loading: identity.is_some(),
                language,
                ..Default::default()
            };
        }

        let Some(identity) = identity else {
            tracing::debug!("Identity cleared, state reset");
            return Ok(());
        };

        let profile = match self.documents.get(USERS, &identity.uid).await {
            Ok(doc) => doc.and_then(|d| decode_document::<UserProfile>(d, "profile")),
            Err(e) => return Err(self.record_load_failure(e)),
        };

        let state = if profile.is_some() {
            match self.documents.get(PROJECTS, &identity.uid).await {
                Ok(doc) => doc.and_then(|d| decode_document::<ProjectState>(d, "project")),
                Err(e) => return Err(self.record_load_failure(e)),
            }
        } else {
            None
        };

        let mut inner = self.inner.lock();
        if inner.identity.as_ref() != Some(&identity) {
            // A newer identity change won the race.
            return Ok(());
        }
        tracing::info!(uid = %identity.uid, has_profile = profile.is_some(), "Loaded participant");
        inner.profile = profile;
        inner.state = state.unwrap_or_default();
        inner.loading = false;
        Ok(())
    }

    fn record_load_failure(&self, e: PersistenceError) -> PersistenceError {
        tracing::warn!(error = %e, "Failed to load participant data");
        self.inner.lock().last_error = Some(e.to_string());
        e
    }

    /// Follow an identity provider, reloading on every change.
    pub fn watch_identity(self: &Arc<Self>, provider: &dyn IdentityProvider) -> JoinHandle<()> {
        let store = Arc::clone(self);
        let mut changes = provider.subscribe();
        tokio::spawn(async move {
            loop {
                let identity = changes.borrow_and_update().clone();
                if let Err(e) = store.set_identity(identity).await {
                    tracing::warn!(error = %e, "Identity change could not be loaded");
                }
                if changes.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    /// Merge a patch into the state and persist the result.
    ///
    /// Without an identity nothing is applied. A patch leaving a selection
    /// dangling is refused before anything changes.
    pub async fn update(&self, patch: ProjectPatch) -> Result<SaveOutcome, PreconditionError> {
        self.update_with(move |_| Some(patch)).await
    }

    /// Compute a patch from the current state and apply it atomically.
    ///
    /// `f` runs under the store lock; returning `None` applies nothing.
    pub async fn update_with(
        &self,
        f: impl FnOnce(&ProjectState) -> Option<ProjectPatch>,
    ) -> Result<SaveOutcome, PreconditionError> {
        let (uid, snapshot) = {
            let mut inner = self.inner.lock();
            let Some(uid) = writable_uid(&inner) else {
                tracing::debug!(loading = inner.loading, "Update skipped, no loaded identity");
                return Ok(SaveOutcome::NoIdentity);
            };
            let Some(patch) = f(&inner.state) else {
                return Ok(SaveOutcome::Unchanged);
            };
            let applied = inner.state.apply(&patch)?;
            if !applied.cleared.is_empty() {
                tracing::debug!(cleared = ?applied.cleared, "Downstream fields invalidated");
            }
            inner.state = applied.state;
            (uid, inner.state.clone())
        };

        let result = match to_document(&snapshot) {
            Ok(doc) => self.documents.upsert(PROJECTS, &uid, doc, true).await,
            Err(e) => Err(e),
        };
        Ok(self.record_save(result, Message::Saved, Message::SaveFailed))
    }

    /// Create the participant's profile.
    pub async fn create_profile(
        &self,
        name: &str,
        affiliation: &str,
        ai_experience: AiExperience,
    ) -> Result<SaveOutcome, PreconditionError> {
        let profile = {
            let mut inner = self.inner.lock();
            let uid = writable_uid(&inner).ok_or(PreconditionError::NotSignedIn)?;
            let profile = UserProfile {
                uid,
                name: name.trim().to_string(),
                affiliation: affiliation.trim().to_string(),
                ai_experience,
                created_at: Utc::now().timestamp_millis(),
            };
            inner.profile = Some(profile.clone());
            profile
        };

        let result = match to_document(&profile) {
            Ok(doc) => self.documents.upsert(USERS, &profile.uid, doc, false).await,
            Err(e) => Err(e),
        };
        Ok(self.record_save(result, Message::Saved, Message::SaveFailed))
    }

    /// Update profile fields. Requires an existing profile.
    pub async fn update_profile(
        &self,
        patch: ProfilePatch,
    ) -> Result<SaveOutcome, PreconditionError> {
        let uid = {
            let mut inner = self.inner.lock();
            let uid = writable_uid(&inner).ok_or(PreconditionError::NotSignedIn)?;
            let profile = inner.profile.as_mut().ok_or(PreconditionError::NotSignedIn)?;
            patch.apply_to(profile);
            uid
        };

        let result = match to_document(&patch) {
            Ok(doc) => self.documents.upsert(USERS, &uid, doc, true).await,
            Err(e) => Err(e),
        };
        Ok(self.record_save(result, Message::ProfileUpdated, Message::ProfileUpdateFailed))
    }

    fn record_save(
        &self,
        result: Result<(), PersistenceError>,
        success: Message,
        failure: Message,
    ) -> SaveOutcome {
        let mut inner = self.inner.lock();
        match result {
            Ok(()) => {
                inner.last_saved = Some(Utc::now());
                inner.last_error = None;
                inner.notices.push(Notice::success(success));
                SaveOutcome::Saved
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to save progress");
                inner.last_error = Some(e.to_string());
                inner.notices.push(Notice::error(failure));
                SaveOutcome::Failed
            }
        }
    }
}

fn writable_uid(inner: &Inner) -> Option<String> {
    if inner.loading {
        return None;
    }
    inner.identity.as_ref().map(|i| i.uid.clone())
}

fn to_document<T: serde::Serialize>(value: &T) -> Result<Document, PersistenceError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(PersistenceError::Serialization(format!("expected an object, got {other}"))),
    }
}

fn decode_document<T: serde::de::DeserializeOwned>(doc: Document, what: &str) -> Option<T> {
    match serde_json::from_value(Value::Object(doc)) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, what, "Stored document is unreadable, ignoring it");
            None
        }
    }
}
