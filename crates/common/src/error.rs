//! Errors raised by, or about, the remote store.

use thiserror::Error;

/// Store-level error type.
///
/// The encryption layer never reinterprets these: a [`StoreError::Command`]
/// produced by the server (for example incrementing a non-numeric value)
/// reaches the caller with its message untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The server rejected the command. Carries the server's message verbatim.
    #[error("{0}")]
    Command(String),

    /// The connection to the store failed or was closed.
    #[error("connection error: {0}")]
    Connection(String),

    /// The reply had a different shape than the command guarantees.
    #[error("unexpected reply: expected {expected}, got {got}")]
    UnexpectedReply {
        /// Reply kind the caller asked for.
        expected: &'static str,
        /// Reply kind actually received.
        got: &'static str,
    },

    /// A numeric reply could not be parsed.
    #[error("invalid numeric reply: {0}")]
    InvalidNumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_error_is_verbatim() {
        let e = StoreError::Command("ERR value is not an integer or out of range".into());
        assert_eq!(e.to_string(), "ERR value is not an integer or out of range");
    }

    #[test]
    fn unexpected_reply_names_both_kinds() {
        let e = StoreError::UnexpectedReply {
            expected: "integer",
            got: "bulk",
        };
        let msg = e.to_string();
        assert!(msg.contains("integer"));
        assert!(msg.contains("bulk"));
    }
}
