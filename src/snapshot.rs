//! Encoding and restoring the persisted state record.
//!
//! The record is the JSON form of [`SessionState`] stored under a single
//! key (`"appState"` by default). There is no versioning: a record that does
//! not parse in full is rejected, and the caller decides what to do instead.

use crate::error::{LoadError, ParseError, StorageError};
use crate::state::SessionState;
use crate::storage::StateStorage;

/// Parse a raw persisted record into a [`SessionState`].
///
/// Accepts text or raw bytes. Bytes that are not valid UTF-8 are a parse
/// failure like any other malformed content.
///
/// # Errors
///
/// Returns [`ParseError`] if `raw` is not valid JSON or lacks any field of
/// the state. No defaults are substituted here.
///
/// # Examples
///
/// ```
/// use session_store::parse;
///
/// assert!(parse("not json").is_err());
/// assert!(parse([0xff, 0xfe, b'{']).is_err());
/// ```
pub fn parse(raw: impl AsRef<[u8]>) -> Result<SessionState, ParseError> {
    Ok(serde_json::from_slice(raw.as_ref())?)
}

/// Encode a [`SessionState`] into its persisted textual form.
///
/// # Errors
///
/// Returns [`StorageError::Encode`] if serialization fails.
pub fn serialize(state: &SessionState) -> Result<String, StorageError> {
    Ok(serde_json::to_string(state)?)
}

/// Read and parse the record stored under `key`.
///
/// # Returns
///
/// - `Ok(Some(state))` if the record exists and parses.
/// - `Ok(None)` if no record exists.
///
/// # Errors
///
/// Returns [`LoadError::Storage`] if the medium cannot be read and
/// [`LoadError::Parse`] if the record is corrupt.
pub fn load(storage: &dyn StateStorage, key: &str) -> Result<Option<SessionState>, LoadError> {
    match storage.read(key)? {
        Some(raw) => Ok(Some(parse(&raw)?)),
        None => Ok(None),
    }
}

/// Serialize `state` and write it under `key`.
///
/// # Errors
///
/// Returns [`StorageError`] if encoding or the write fails.
pub fn save(storage: &dyn StateStorage, key: &str, state: &SessionState) -> Result<(), StorageError> {
    let raw = serialize(state)?;
    storage.write(key, raw.as_bytes())
}
