//! Session blob and its symmetric codec
//!
//! The authenticated session is persisted as `base64(iv || ciphertext)` where
//! the ciphertext is AES-256-CBC over the JSON-serialized session and the key
//! is the client secret right-padded with NULs (or truncated) to 32 bytes.
//!
//! Both directions fail soft on purpose: encryption returns an empty string
//! and decryption returns `None`. Callers treat those as "no session". Every
//! swallowed failure is logged with a warn so the behavior stays auditable.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::RngCore;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;
use zeroize::Zeroize;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;

/// Vendor session state installed after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub session_id: String,
    /// Bearer token presented to the gateway on authenticated calls.
    pub session_token: String,
    #[serde(default)]
    pub session_pub_key: String,
    /// Smart wallet address of the authenticated user.
    pub user_swa: String,
    #[serde(default)]
    pub client_swa: String,
    /// Unix timestamp, seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl SessionConfig {
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => chrono::Utc::now().timestamp() >= at,
            None => false,
        }
    }
}

/// Derive the fixed-size cipher key from the client secret.
fn derive_key(secret: &str) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    let bytes = secret.as_bytes();
    let n = bytes.len().min(KEY_LEN);
    key[..n].copy_from_slice(&bytes[..n]);
    key
}

/// Encrypt a serializable value with the client secret.
///
/// Returns an empty string on any failure.
pub fn encrypt_session<T: Serialize>(data: &T, secret: &str) -> String {
    let plaintext = match serde_json::to_vec(data) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("session encryption skipped, serialization failed: {e}");
            return String::new();
        }
    };

    let mut key = derive_key(secret);
    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);

    let ciphertext =
        Aes256CbcEnc::new(&key.into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(&plaintext);
    key.zeroize();

    let mut combined = Vec::with_capacity(IV_LEN + ciphertext.len());
    combined.extend_from_slice(&iv);
    combined.extend_from_slice(&ciphertext);
    BASE64.encode(combined)
}

/// Decrypt a value previously produced by [`encrypt_session`].
///
/// Returns `None` on any failure (bad encoding, wrong key, corrupt padding,
/// invalid JSON); a missing and an undecryptable session are the same thing
/// to callers.
pub fn decrypt_session<T: DeserializeOwned>(encrypted: &str, secret: &str) -> Option<T> {
    let combined = match BASE64.decode(encrypted) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("session decryption failed, invalid base64: {e}");
            return None;
        }
    };

    if combined.len() <= IV_LEN {
        warn!("session decryption failed, blob too short");
        return None;
    }

    let (iv, ciphertext) = combined.split_at(IV_LEN);
    let iv: [u8; IV_LEN] = iv.try_into().expect("split length checked");

    let mut key = derive_key(secret);
    let plaintext =
        Aes256CbcDec::new(&key.into(), &iv.into()).decrypt_padded_vec_mut::<Pkcs7>(ciphertext);
    key.zeroize();

    let plaintext = match plaintext {
        Ok(bytes) => bytes,
        Err(_) => {
            warn!("session decryption failed, bad padding (wrong secret?)");
            return None;
        }
    };

    match serde_json::from_slice(&plaintext) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("session decryption failed, invalid JSON: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "0xtest-client-private-key";

    fn test_session() -> SessionConfig {
        SessionConfig {
            session_id: "sess-1".to_string(),
            session_token: "tok-abc".to_string(),
            session_pub_key: "0x04aa".to_string(),
            user_swa: "0xUser".to_string(),
            client_swa: "0xClient".to_string(),
            expires_at: Some(4_102_444_800),
        }
    }

    #[test]
    fn test_round_trip() {
        let session = test_session();
        let encrypted = encrypt_session(&session, TEST_SECRET);
        assert!(!encrypted.is_empty());

        let decrypted: SessionConfig = decrypt_session(&encrypted, TEST_SECRET).unwrap();
        assert_eq!(decrypted, session);
    }

    #[test]
    fn test_wrong_secret_yields_none() {
        let encrypted = encrypt_session(&test_session(), TEST_SECRET);
        let decrypted: Option<SessionConfig> = decrypt_session(&encrypted, "another-secret");
        assert!(decrypted.is_none());
    }

    #[test]
    fn test_garbage_input_yields_none() {
        let none: Option<SessionConfig> = decrypt_session("not base64 at all!", TEST_SECRET);
        assert!(none.is_none());

        // Valid base64 but shorter than one IV.
        let none: Option<SessionConfig> = decrypt_session("AAAA", TEST_SECRET);
        assert!(none.is_none());
    }

    #[test]
    fn test_truncated_ciphertext_yields_none() {
        let encrypted = encrypt_session(&test_session(), TEST_SECRET);
        let mut bytes = BASE64.decode(&encrypted).unwrap();
        bytes.truncate(bytes.len() - 7);
        let truncated = BASE64.encode(bytes);

        let none: Option<SessionConfig> = decrypt_session(&truncated, TEST_SECRET);
        assert!(none.is_none());
    }

    #[test]
    fn test_key_padding_and_truncation() {
        // Secrets longer than 32 bytes are truncated, so two secrets sharing
        // a 32-byte prefix are the same key.
        let long_a = "a".repeat(40);
        let long_b = format!("{}{}", "a".repeat(32), "b".repeat(8));
        let encrypted = encrypt_session(&test_session(), &long_a);
        let decrypted: Option<SessionConfig> = decrypt_session(&encrypted, &long_b);
        assert!(decrypted.is_some());

        // Short secrets are NUL-padded, not rejected.
        let encrypted = encrypt_session(&test_session(), "short");
        let decrypted: Option<SessionConfig> = decrypt_session(&encrypted, "short");
        assert_eq!(decrypted, Some(test_session()));
    }

    #[test]
    fn test_round_trips_arbitrary_json() {
        let value = serde_json::json!({
            "nested": { "list": [1, 2, 3], "text": "héllo ⚡" },
            "flag": true,
        });
        let encrypted = encrypt_session(&value, TEST_SECRET);
        let decrypted: serde_json::Value = decrypt_session(&encrypted, TEST_SECRET).unwrap();
        assert_eq!(decrypted, value);
    }

    #[test]
    fn test_session_expiry() {
        let mut session = test_session();
        assert!(!session.is_expired());
        session.expires_at = Some(0);
        assert!(session.is_expired());
        session.expires_at = None;
        assert!(!session.is_expired());
    }
}
