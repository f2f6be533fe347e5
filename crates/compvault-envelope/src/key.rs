use compvault_core::{Result, VaultError};
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// PBKDF2 work factor. Changing it makes existing blobs unreadable.
pub const PBKDF2_ITERATIONS: u32 = 100_000;
/// Length of the per-blob salt.
pub const SALT_LEN: usize = 16;
/// 256-bit AES key.
pub const KEY_LEN: usize = 32;
/// Minimum passphrase length accepted at setup time.
pub const MIN_PASSPHRASE_LEN: usize = 8;

/// Key material derived from a passphrase. Zeroized on drop, never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// PBKDF2-HMAC-SHA256 over the UTF-8 passphrase. Same inputs, same key.
pub fn derive_key(passphrase: &str, salt: &[u8]) -> DerivedKey {
    let mut bytes = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, PBKDF2_ITERATIONS, &mut bytes);
    DerivedKey { bytes }
}

/// Fresh random salt from the OS CSPRNG.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Policy applied when a passphrase is configured: not blank, at least
/// `MIN_PASSPHRASE_LEN` characters.
pub fn validate_passphrase(passphrase: &str) -> Result<()> {
    if passphrase.trim().is_empty() {
        return Err(VaultError::validation("encryption password cannot be empty"));
    }
    let len = passphrase.chars().count();
    if len < MIN_PASSPHRASE_LEN {
        return Err(VaultError::validation(format!(
            "encryption password must be at least {MIN_PASSPHRASE_LEN} characters (got {len})"
        )));
    }
    Ok(())
}
