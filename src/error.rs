//! Crate-level error types for parsing, storage and state restoration.

/// The persisted state record could not be parsed.
///
/// Returned by [`parse`](crate::parse) when the raw text is not valid JSON
/// or does not have the full shape of a
/// [`SessionState`](crate::SessionState). Partially valid records are
/// rejected as a whole.
#[derive(Debug, thiserror::Error)]
#[error("malformed session state record: {0}")]
pub struct ParseError(#[from] serde_json::Error);

/// Error returned by a [`StateStorage`](crate::StateStorage) medium.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Disk I/O failure.
    ///
    /// An underlying filesystem error occurred while reading, writing or
    /// removing a record.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The storage medium is disabled or otherwise unavailable.
    #[error("storage medium is unavailable")]
    Unavailable,

    /// The record key cannot be used by this medium (e.g. it contains a
    /// path separator).
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// The state could not be encoded before writing.
    #[error("failed to encode session state: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Error returned when restoring persisted state fails.
///
/// The store never surfaces this to its callers: both variants are
/// recovered by starting from the default state.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A record exists but cannot be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The storage medium could not be read.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("{not json").unwrap_err()
    }

    #[test]
    fn parse_error_mentions_record() {
        let err = ParseError::from(json_error());
        assert!(err.to_string().starts_with("malformed session state record"));
    }

    #[test]
    fn storage_error_io_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = StorageError::from(io_err);
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn storage_error_unavailable_display() {
        assert_eq!(
            StorageError::Unavailable.to_string(),
            "storage medium is unavailable"
        );
    }

    #[test]
    fn load_error_is_transparent() {
        let err = LoadError::from(StorageError::Unavailable);
        assert_eq!(err.to_string(), "storage medium is unavailable");

        let err = LoadError::from(ParseError::from(json_error()));
        assert!(err.to_string().starts_with("malformed session state record"));
    }

    // Errors are carried across threads alongside the store.
    const _: () = {
        #[allow(dead_code)]
        fn assert_send_sync<T: Send + Sync>() {}

        #[allow(dead_code)]
        fn check() {
            assert_send_sync::<ParseError>();
            assert_send_sync::<StorageError>();
            assert_send_sync::<LoadError>();
        }
    };
}
