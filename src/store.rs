//! The shared session store: one canonical [`SessionState`] per running
//! client, persisted after every mutation.
//!
//! The store is opened via [`SessionStoreBuilder`], owned by the application
//! root and handed to consumers by reference. Every operation takes `&self`.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use crate::aggregate::{Aggregate, apply_all};
use crate::error::{LoadError, StorageError};
use crate::locality::LocalityFilter;
use crate::snapshot;
use crate::state::{RsvpStatus, SessionCommand, SessionEvent, SessionState};
use crate::storage::{FileStorage, MemoryStorage, StateStorage};

/// Process-wide holder of the application session state.
///
/// The current state lives in a `watch` channel so that a mutation is a
/// single read-modify-write step and subscribers see every change. After
/// each mutation the full state is re-serialized and written to the storage
/// medium before the call returns.
///
/// Storage failures never reach callers. The first failed write switches the
/// store to in-memory operation for the rest of its lifetime.
pub struct SessionStore {
    state: watch::Sender<SessionState>,
    storage: Box<dyn StateStorage>,
    key: String,
    persistent: AtomicBool,
}

// Manual `Debug` because `dyn StateStorage` is not `Debug`.
impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("key", &self.key)
            .field("persistent", &self.is_persistent())
            .finish()
    }
}

impl SessionStore {
    /// Create a builder for configuring and opening a store.
    pub fn builder() -> SessionStoreBuilder {
        SessionStoreBuilder::new()
    }

    /// Open a store on `storage` with the default record key.
    ///
    /// Shorthand for `SessionStore::builder().storage(storage).open()`.
    pub fn open(storage: impl StateStorage + 'static) -> Self {
        Self::builder().storage(storage).open()
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Returns the active locality filter.
    pub fn selected_locality(&self) -> LocalityFilter {
        self.state.borrow().selected_locality.clone()
    }

    pub fn is_post_liked(&self, post_id: &str) -> bool {
        self.state.borrow().is_post_liked(post_id)
    }

    pub fn rsvp_status(&self, event_id: &str) -> RsvpStatus {
        self.state.borrow().rsvp_status(event_id)
    }

    pub fn is_group_joined(&self, group_id: &str) -> bool {
        self.state.borrow().is_group_joined(group_id)
    }

    pub fn is_following(&self, user_id: &str) -> bool {
        self.state.borrow().is_following(user_id)
    }

    /// Subscribe to state changes.
    ///
    /// The receiver observes the state after every mutation, including
    /// mutations that leave the state unchanged (e.g. re-setting the same
    /// RSVP status).
    ///
    /// A mutation holds the channel's write lock while it writes to storage.
    /// Do not call a mutating method while holding a guard from
    /// [`watch::Receiver::borrow`] on the same thread: the call blocks
    /// forever. Clone what you need out of the guard and drop it first.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Returns `true` while mutations are still written to storage.
    pub fn is_persistent(&self) -> bool {
        self.persistent.load(Ordering::Acquire)
    }

    /// Execute a command and persist the resulting state.
    ///
    /// # Returns
    ///
    /// The domain events that were applied.
    pub fn execute(&self, cmd: SessionCommand) -> Vec<SessionEvent> {
        let mut applied = Vec::new();
        self.state.send_modify(|state| {
            let events = match state.handle(cmd) {
                Ok(events) => events,
                Err(never) => match never {},
            };
            *state = apply_all(std::mem::take(state), &events);
            self.persist(state);
            applied = events;
        });
        tracing::debug!(key = %self.key, events = applied.len(), "session command applied");
        applied
    }

    /// Replace the selected locality. `"all"` clears the filter; unknown
    /// ids are accepted.
    pub fn set_selected_locality(&self, locality_id: impl Into<String>) {
        self.execute(SessionCommand::SelectLocality {
            locality: locality_id.into(),
        });
    }

    /// Like `post_id` if it is not liked, unlike it otherwise.
    ///
    /// # Returns
    ///
    /// `true` if the post is liked after the call.
    pub fn toggle_liked_post(&self, post_id: impl Into<String>) -> bool {
        let events = self.execute(SessionCommand::ToggleLikedPost {
            post_id: post_id.into(),
        });
        matches!(events.as_slice(), [SessionEvent::PostLiked { .. }])
    }

    /// Overwrite the RSVP status of `event_id`.
    pub fn set_rsvp_status(&self, event_id: impl Into<String>, status: RsvpStatus) {
        self.execute(SessionCommand::SetRsvpStatus {
            event_id: event_id.into(),
            status,
        });
    }

    /// Join `group_id` if not a member, leave it otherwise.
    ///
    /// # Returns
    ///
    /// `true` if the group is joined after the call.
    pub fn toggle_joined_group(&self, group_id: impl Into<String>) -> bool {
        let events = self.execute(SessionCommand::ToggleJoinedGroup {
            group_id: group_id.into(),
        });
        matches!(events.as_slice(), [SessionEvent::GroupJoined { .. }])
    }

    /// Follow `user_id` if not followed, unfollow otherwise.
    ///
    /// # Returns
    ///
    /// `true` if the user is followed after the call.
    pub fn toggle_followed_user(&self, user_id: impl Into<String>) -> bool {
        let events = self.execute(SessionCommand::ToggleFollowedUser {
            user_id: user_id.into(),
        });
        matches!(events.as_slice(), [SessionEvent::UserFollowed { .. }])
    }

    /// Return to the default state and delete the persisted record.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            *state = SessionState::default();
            if self.is_persistent()
                && let Err(e) = self.storage.remove(&self.key)
            {
                self.degrade(&e);
            }
        });
        tracing::info!(key = %self.key, "session state reset");
    }

    /// Write the current state to storage.
    ///
    /// A no-op once the store has fallen back to in-memory operation.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the write fails. The store also switches
    /// to in-memory operation in that case.
    pub fn flush(&self) -> Result<(), StorageError> {
        if !self.is_persistent() {
            return Ok(());
        }
        let state = self.state.borrow();
        snapshot::save(self.storage.as_ref(), &self.key, &state).inspect_err(|e| self.degrade(e))
    }

    /// Flush the final state and tear the store down.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the final write fails.
    pub fn close(self) -> Result<(), StorageError> {
        self.flush()?;
        tracing::debug!(key = %self.key, "session store closed");
        Ok(())
    }

    fn persist(&self, state: &SessionState) {
        if !self.is_persistent() {
            return;
        }
        if let Err(e) = snapshot::save(self.storage.as_ref(), &self.key, state) {
            self.degrade(&e);
        }
    }

    /// Switch to in-memory operation. Storage failures are not transient
    /// within a session, so there is no retry.
    fn degrade(&self, error: &StorageError) {
        if self.persistent.swap(false, Ordering::AcqRel) {
            tracing::warn!(
                key = %self.key,
                error = %error,
                "session storage write failed; continuing in memory only"
            );
        }
    }
}

/// Builder for configuring and opening a [`SessionStore`].
///
/// # Examples
///
/// ```
/// use session_store::{MemoryStorage, SessionStore};
///
/// let store = SessionStore::builder()
///     .storage(MemoryStorage::new())
///     .storage_key("appState")
///     .open();
/// store.set_selected_locality("boulder");
/// assert_eq!(store.selected_locality().id(), Some("boulder"));
/// ```
pub struct SessionStoreBuilder {
    key: String,
    storage: Option<Box<dyn StateStorage>>,
}

impl SessionStoreBuilder {
    /// Create a builder with the default record key and no medium.
    ///
    /// Without a medium, [`open`](SessionStoreBuilder::open) uses a fresh
    /// [`MemoryStorage`].
    pub fn new() -> Self {
        Self {
            key: SessionState::RECORD_KEY.to_owned(),
            storage: None,
        }
    }

    /// Set the key the state record is stored under.
    ///
    /// Defaults to `"appState"`.
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Set the storage medium.
    pub fn storage(mut self, storage: impl StateStorage + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    /// Use a [`FileStorage`] rooted at `path`.
    pub fn base_dir(self, path: impl AsRef<Path>) -> Self {
        self.storage(FileStorage::new(path.as_ref()))
    }

    /// Restore the persisted state and open the store.
    ///
    /// Never fails. A missing record yields the default state. A corrupt
    /// record is logged, removed from the medium and replaced by the default
    /// state. An unreadable medium is logged and the store runs in memory
    /// only.
    pub fn open(self) -> SessionStore {
        let storage = self
            .storage
            .unwrap_or_else(|| Box::new(MemoryStorage::new()));

        let (state, persistent) = match snapshot::load(storage.as_ref(), &self.key) {
            Ok(Some(state)) => {
                tracing::info!(key = %self.key, "restored persisted session state");
                (state, true)
            }
            Ok(None) => (SessionState::default(), true),
            Err(LoadError::Parse(e)) => {
                tracing::warn!(
                    key = %self.key,
                    error = %e,
                    "failed to parse persisted session state; using defaults"
                );
                match storage.remove(&self.key) {
                    Ok(()) => (SessionState::default(), true),
                    Err(e) => {
                        tracing::warn!(
                            key = %self.key,
                            error = %e,
                            "failed to discard corrupt session state; continuing in memory only"
                        );
                        (SessionState::default(), false)
                    }
                }
            }
            Err(LoadError::Storage(e)) => {
                tracing::warn!(
                    key = %self.key,
                    error = %e,
                    "session storage unavailable; continuing in memory only"
                );
                (SessionState::default(), false)
            }
        };

        let (tx, _rx) = watch::channel(state);
        SessionStore {
            state: tx,
            storage,
            key: self.key,
            persistent: AtomicBool::new(persistent),
        }
    }
}

impl Default for SessionStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
