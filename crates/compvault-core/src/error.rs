use thiserror::Error;

/// Result alias used across the compvault crates.
pub type Result<T> = std::result::Result<T, VaultError>;

/// Failures surfaced by the envelope, the remote store and the session.
///
/// The presentation layer is the only place that turns these into user-facing
/// messages; library code propagates them untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// Non-2xx provider response (or no response at all when `status` is `None`).
    #[error("remote error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
    },
    /// Tag verification or plaintext decoding failed: wrong passphrase or corrupted store.
    #[error("failed to decrypt data ({reason}); check your encryption password")]
    Decryption { reason: String },
    /// Write rejected because the revision token is stale; re-fetch before retrying.
    #[error("remote file changed since last read: {message}")]
    Conflict { message: String },
    /// Missing configuration or input that does not meet policy.
    #[error("validation failed: {reason}")]
    Validation { reason: String },
    /// No component with the given id in the local collection.
    #[error("component not found: {id}")]
    NotFound { id: String },
    /// Failure that is neither the caller's nor the remote's fault.
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl VaultError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    pub fn decryption(reason: impl Into<String>) -> Self {
        Self::Decryption {
            reason: reason.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// True when prompting for a different passphrase is the right recovery.
    pub fn is_decryption(&self) -> bool {
        matches!(self, Self::Decryption { .. })
    }

    /// True when the caller must refresh before a write can succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
