//! Passphrase-based encryption envelope for the stored collection.
//! PBKDF2-HMAC-SHA256 derives an AES-256-GCM key per blob; the blob carries
//! its own salt and iv so only the passphrase is needed to open it.

pub mod envelope;
pub mod key;

pub use envelope::{open, open_value, seal};
pub use key::validate_passphrase;
