//! Error types for NETCONF session operations.

use thiserror::Error;

/// Result type alias for session operations.
pub type NetconfResult<T> = Result<T, NetconfError>;

/// Errors raised by a NETCONF session or while reading its replies.
#[derive(Debug, Error)]
pub enum NetconfError {
    /// The transport to the device failed (connect, auth, read, write).
    #[error("Transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// The device answered with an `<rpc-error>`.
    #[error("RPC error: {message}")]
    Rpc {
        /// The error-message reported by the device, if any.
        message: String,
    },

    /// The reply could not be parsed as XML.
    #[error("Malformed reply: {message}")]
    MalformedReply {
        /// Parser error message.
        message: String,
    },

    /// The device did not accept an edit-config.
    #[error("Edit-config on {datastore} rejected: {message}")]
    EditConfigRejected {
        /// Target datastore.
        datastore: String,
        /// Error message.
        message: String,
    },

    /// Commit of the candidate datastore failed.
    #[error("Commit failed: {message}")]
    CommitFailed {
        /// Error message.
        message: String,
    },

    /// The session was closed.
    #[error("Session closed")]
    Closed,

    /// IO error on the underlying stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// SSH library error.
    #[cfg(feature = "ssh")]
    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),
}

impl NetconfError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an RPC error.
    pub fn rpc(message: impl Into<String>) -> Self {
        Self::Rpc {
            message: message.into(),
        }
    }

    /// Creates a malformed reply error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedReply {
            message: message.into(),
        }
    }

    /// Creates a commit error.
    pub fn commit_failed(message: impl Into<String>) -> Self {
        Self::CommitFailed {
            message: message.into(),
        }
    }

    /// Creates an edit-config rejection.
    pub fn edit_rejected(datastore: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EditConfigRejected {
            datastore: datastore.into(),
            message: message.into(),
        }
    }

    /// Returns true if the session can no longer be used.
    pub fn is_session_lost(&self) -> bool {
        match self {
            NetconfError::Transport { .. } | NetconfError::Closed | NetconfError::Io(_) => true,
            #[cfg(feature = "ssh")]
            NetconfError::Ssh(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NetconfError::rpc("data-missing");
        assert_eq!(err.to_string(), "RPC error: data-missing");

        let err = NetconfError::commit_failed("validation failed");
        assert_eq!(err.to_string(), "Commit failed: validation failed");

        let err = NetconfError::edit_rejected("candidate", "in-use");
        assert_eq!(err.to_string(), "Edit-config on candidate rejected: in-use");
    }

    #[test]
    fn test_is_session_lost() {
        assert!(NetconfError::transport("reset by peer").is_session_lost());
        assert!(NetconfError::Closed.is_session_lost());
        assert!(!NetconfError::rpc("bad element").is_session_lost());
        assert!(!NetconfError::malformed("eof").is_session_lost());
    }
}
