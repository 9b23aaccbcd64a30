//! Persisted shared application state for a client-side social app.
//!
//! A [`SessionStore`] holds the selected locality filter, liked posts, RSVP
//! statuses, joined groups and followed users, and writes the whole state to
//! a [`StateStorage`] medium after every change.

mod aggregate;
pub use aggregate::{Aggregate, apply_all};
mod error;
mod locality;
mod snapshot;
mod state;
mod storage;
mod store;

pub use error::{LoadError, ParseError, StorageError};
pub use locality::{ALL_LOCALITIES, LocalityFilter};
pub use snapshot::{load, parse, save, serialize};
pub use state::{RsvpStatus, SessionCommand, SessionError, SessionEvent, SessionState};
pub use storage::{DisabledStorage, FileStorage, MemoryStorage, StateStorage};
pub use store::{SessionStore, SessionStoreBuilder};
