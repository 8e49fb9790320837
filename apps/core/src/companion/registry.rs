//! Session registry: many isolated conversations over one shared model handle.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;
use uuid::Uuid;

use super::journal::MoodRecord;
use super::session::{ConversationSession, TurnOutcome};
use super::Companion;
use crate::error::AppError;

type SessionHandle = Arc<Mutex<ConversationSession>>;

/// Independent sessions sharing one read-only [`Companion`].
///
/// Each session's streak and journal live only in its own
/// [`ConversationSession`]; nothing is shared between ids. The map lock is
/// only held to look a session up, so turns on different sessions run in
/// parallel while turns on the same session are serialized.
pub struct SessionRegistry {
    companion: Arc<Companion>,
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new(companion: Arc<Companion>) -> Self {
        Self {
            companion,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn companion(&self) -> &Arc<Companion> {
        &self.companion
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, SessionHandle>>, AppError> {
        self.sessions
            .lock()
            .map_err(|e| AppError::Internal(format!("Session registry lock poisoned: {}", e)))
    }

    fn unknown(id: Uuid) -> AppError {
        AppError::Session(format!("Unknown session {}", id))
    }

    /// Clones the session handle out so the map lock is released before use.
    fn session(&self, id: Uuid) -> Result<SessionHandle, AppError> {
        self.lock()?
            .get(&id)
            .cloned()
            .ok_or_else(|| Self::unknown(id))
    }

    fn with_session<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut ConversationSession) -> T,
    ) -> Result<T, AppError> {
        let handle = self.session(id)?;
        let mut session = handle
            .lock()
            .map_err(|e| AppError::Internal(format!("Session {} lock poisoned: {}", id, e)))?;
        Ok(f(&mut *session))
    }

    pub fn create(&self) -> Result<Uuid, AppError> {
        let session = ConversationSession::new();
        let id = session.id();
        self.lock()?.insert(id, Arc::new(Mutex::new(session)));
        info!("Created session {}", id);
        Ok(id)
    }

    pub fn len(&self) -> Result<usize, AppError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, AppError> {
        Ok(self.lock()?.is_empty())
    }

    pub fn handle_turn(
        &self,
        id: Uuid,
        raw_text: &str,
        today: NaiveDate,
    ) -> Result<TurnOutcome, AppError> {
        let companion = &self.companion;
        self.with_session(id, |session| session.handle_turn(companion, raw_text, today))
    }

    pub fn reset(&self, id: Uuid) -> Result<(), AppError> {
        self.with_session(id, ConversationSession::reset)
    }

    /// Removes the session and returns its final state.
    ///
    /// A turn already running on the session completes first.
    pub fn end(&self, id: Uuid) -> Result<ConversationSession, AppError> {
        let handle = self.lock()?.remove(&id).ok_or_else(|| Self::unknown(id))?;
        let session = handle
            .lock()
            .map_err(|e| AppError::Internal(format!("Session {} lock poisoned: {}", id, e)))?
            .clone();
        info!("Ended session {}", id);
        Ok(session)
    }

    pub fn negative_streak(&self, id: Uuid) -> Result<u32, AppError> {
        self.with_session(id, |session| session.negative_streak())
    }

    pub fn journal_history(&self, id: Uuid) -> Result<Vec<MoodRecord>, AppError> {
        self.with_session(id, |session| session.journal().history())
    }

    pub fn export_csv(&self, id: Uuid) -> Result<String, AppError> {
        self.with_session(id, |session| session.journal().export_csv())
    }
}
