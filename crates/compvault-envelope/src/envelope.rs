use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use compvault_core::{Result, VaultError};
use serde::{de::DeserializeOwned, Serialize};
use tracing::instrument;
use zeroize::Zeroizing;

use crate::key::{derive_key, generate_salt, DerivedKey, SALT_LEN};

/// AES-GCM nonce length (96 bits).
pub const IV_LEN: usize = 12;
/// Smallest decoded blob that can be split into salt and iv.
pub const HEADER_LEN: usize = SALT_LEN + IV_LEN;

/// Serialize `value` to JSON and encrypt it under `passphrase`.
///
/// The result is `base64(salt || iv || ciphertext || tag)`. Salt and iv are
/// drawn fresh on every call, so sealing the same value twice never yields
/// the same blob.
#[instrument(skip_all)]
pub fn seal<T: Serialize + ?Sized>(value: &T, passphrase: &str) -> Result<String> {
    if passphrase.is_empty() {
        return Err(VaultError::validation("encryption password is not set"));
    }

    let plaintext = Zeroizing::new(
        serde_json::to_vec(value)
            .map_err(|e| VaultError::internal(format!("serialize failed: {e}")))?,
    );

    let salt = generate_salt();
    let key = derive_key(passphrase, &salt);
    let cipher = build_cipher(&key)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_slice())
        .map_err(|e| VaultError::internal(format!("encrypt failed: {e}")))?;

    let mut blob = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(nonce.as_slice());
    blob.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(blob))
}

/// Reverse of [`seal`]. Every failure past argument checking is reported as
/// `VaultError::Decryption`: a short or undecodable blob, a tag mismatch
/// (wrong passphrase or tampering) and plaintext that is not the expected JSON.
#[instrument(skip_all)]
pub fn open<T: DeserializeOwned>(blob: &str, passphrase: &str) -> Result<T> {
    if passphrase.is_empty() {
        return Err(VaultError::validation("encryption password is not set"));
    }

    let compact: String = blob.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let data = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| VaultError::decryption(format!("blob is not base64: {e}")))?;
    if data.len() < HEADER_LEN {
        return Err(VaultError::decryption(format!(
            "blob too short: {} bytes, need at least {HEADER_LEN}",
            data.len()
        )));
    }

    let (salt, rest) = data.split_at(SALT_LEN);
    let (iv, ciphertext) = rest.split_at(IV_LEN);

    let key = derive_key(passphrase, salt);
    let cipher = build_cipher(&key)?;
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(iv), ciphertext)
            .map_err(|_| VaultError::decryption("authentication failed"))?,
    );

    let text = std::str::from_utf8(&plaintext)
        .map_err(|e| VaultError::decryption(format!("plaintext is not UTF-8: {e}")))?;
    serde_json::from_str(text)
        .map_err(|e| VaultError::decryption(format!("plaintext is not valid JSON: {e}")))
}

/// [`open`] into an untyped JSON value.
pub fn open_value(blob: &str, passphrase: &str) -> Result<serde_json::Value> {
    open(blob, passphrase)
}

fn build_cipher(key: &DerivedKey) -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::internal(format!("cipher init failed: {e}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const PASS: &str = "correct-horse-battery";

    fn decode(blob: &str) -> Vec<u8> {
        STANDARD.decode(blob).expect("base64")
    }

    #[test]
    fn round_trips_json_values() {
        for value in [
            json!(null),
            json!("plain string"),
            json!([1, 2.5, true]),
            json!({"components": [], "lastUpdated": "2024-01-01T00:00:00.000Z"}),
            json!({"unicode": "café ☕", "nested": {"deep": [{"a": 1}]}}),
        ] {
            let blob = seal(&value, PASS).expect("seal");
            let opened = open_value(&blob, PASS).expect("open");
            assert_eq!(opened, value);
        }
    }

    #[test]
    fn end_to_end_scenario() {
        let value = json!({"components": [{"id": "1", "name": "Acct Trigger"}]});
        let blob = seal(&value, PASS).expect("seal");

        assert_eq!(open_value(&blob, PASS).expect("open"), value);

        let err = open_value(&blob, "wrong-pass").expect_err("wrong passphrase");
        assert!(err.is_decryption(), "got {err:?}");
    }

    #[test]
    fn layout_is_salt_iv_ciphertext_tag() {
        let value = json!({"k": "v"});
        let plaintext_len = serde_json::to_vec(&value).expect("json").len();
        let blob = seal(&value, PASS).expect("seal");
        assert_eq!(decode(&blob).len(), HEADER_LEN + plaintext_len + 16);
        assert!(!blob.contains("\"k\""), "plaintext must not leak");
    }

    #[test]
    fn every_seal_uses_fresh_salt_and_iv() {
        let value = json!({"same": "input"});
        let a = decode(&seal(&value, PASS).expect("seal"));
        let b = decode(&seal(&value, PASS).expect("seal"));
        assert_ne!(a, b);
        assert_ne!(a[..SALT_LEN], b[..SALT_LEN]);
        assert_ne!(a[SALT_LEN..HEADER_LEN], b[SALT_LEN..HEADER_LEN]);
    }

    #[test]
    fn tampering_is_detected() {
        let blob = seal(&json!({"amount": 100}), PASS).expect("seal");
        let raw = decode(&blob);

        for index in [0, SALT_LEN, HEADER_LEN, raw.len() / 2 + HEADER_LEN / 2, raw.len() - 1] {
            let mut corrupted = raw.clone();
            corrupted[index] ^= 0x01;
            let err = open_value(&STANDARD.encode(&corrupted), PASS)
                .expect_err("tampered blob must not open");
            assert!(err.is_decryption(), "byte {index}: {err:?}");
        }
    }

    #[test]
    fn short_or_garbage_blobs_are_decryption_errors() {
        let short = STANDARD.encode([0u8; HEADER_LEN - 1]);
        assert!(open_value(&short, PASS).expect_err("short").is_decryption());
        assert!(open_value("not base64 !!", PASS)
            .expect_err("garbage")
            .is_decryption());
        assert!(open_value("", PASS).expect_err("empty").is_decryption());
    }

    #[test]
    fn tolerates_line_wrapped_blobs() {
        let value = json!({"wrapped": true});
        let blob = seal(&value, PASS).expect("seal");
        let wrapped: String = blob
            .as_bytes()
            .chunks(20)
            .map(|c| format!("{}\n", std::str::from_utf8(c).expect("ascii")))
            .collect();
        assert_eq!(open_value(&wrapped, PASS).expect("open"), value);
    }

    #[test]
    fn typed_open_rejects_wrong_shape() {
        let blob = seal(&json!({"not": "a list"}), PASS).expect("seal");
        let err = open::<Vec<String>>(&blob, PASS).expect_err("shape mismatch");
        assert!(err.is_decryption());
    }

    #[test]
    fn empty_passphrase_is_rejected() {
        let err = seal(&json!(1), "").expect_err("empty passphrase");
        assert!(matches!(err, VaultError::Validation { .. }));
    }
}
