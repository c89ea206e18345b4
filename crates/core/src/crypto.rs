//! At-rest encryption of credential secrets.
//!
//! AES-256-GCM with a random 96-bit nonce per secret. The stored form is
//! `nonce || ciphertext` so it fits a single `BYTEA` column.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::CoreError;

const NONCE_SIZE: usize = 12;

/// Symmetric cipher for credential secrets.
#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCipher").finish_non_exhaustive()
    }
}

impl SecretCipher {
    /// Build a cipher from a raw 32-byte key.
    pub fn new(key: [u8; 32]) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(&key);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Derive the key as the SHA-256 digest of `passphrase`.
    pub fn from_passphrase(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        Self::new(digest.into())
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>, CoreError> {
        let mut rng = rand::rng();
        let nonce_bytes: [u8; NONCE_SIZE] = std::array::from_fn(|_| rng.random());
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CoreError::DependencyFailure(format!("Encryption failed: {e}")))?;

        let mut stored = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        stored.extend_from_slice(&nonce_bytes);
        stored.extend_from_slice(&ciphertext);
        Ok(stored)
    }

    /// Decrypt a value produced by [`encrypt`](Self::encrypt).
    ///
    /// Truncated, tampered or foreign-key ciphertext is a
    /// [`CoreError::DependencyFailure`], never a wrong plaintext.
    pub fn decrypt(&self, stored: &[u8]) -> Result<String, CoreError> {
        if stored.len() <= NONCE_SIZE {
            return Err(CoreError::DependencyFailure(
                "Stored secret is truncated".into(),
            ));
        }
        let (nonce_bytes, ciphertext) = stored.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CoreError::DependencyFailure("Decryption failed".into()))?;
        String::from_utf8(plaintext)
            .map_err(|_| CoreError::DependencyFailure("Decrypted secret is not UTF-8".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn round_trip_returns_original_plaintext() {
        let cipher = SecretCipher::from_passphrase("portal-test-key");
        let stored = cipher.encrypt("s3cr3t!").unwrap();
        assert_eq!(cipher.decrypt(&stored).unwrap(), "s3cr3t!");
    }

    #[test]
    fn same_plaintext_encrypts_differently() {
        let cipher = SecretCipher::from_passphrase("portal-test-key");
        assert_ne!(cipher.encrypt("x").unwrap(), cipher.encrypt("x").unwrap());
    }

    #[test]
    fn corrupted_ciphertext_is_dependency_failure() {
        let cipher = SecretCipher::from_passphrase("portal-test-key");
        let mut stored = cipher.encrypt("s3cr3t!").unwrap();
        let last = stored.len() - 1;
        stored[last] ^= 0x01;
        assert_matches!(cipher.decrypt(&stored), Err(CoreError::DependencyFailure(_)));
    }

    #[test]
    fn wrong_key_is_dependency_failure() {
        let stored = SecretCipher::from_passphrase("key-a").encrypt("s3cr3t!").unwrap();
        let other = SecretCipher::from_passphrase("key-b");
        assert_matches!(other.decrypt(&stored), Err(CoreError::DependencyFailure(_)));
    }

    #[test]
    fn truncated_value_is_dependency_failure() {
        let cipher = SecretCipher::from_passphrase("portal-test-key");
        assert_matches!(cipher.decrypt(&[0u8; 4]), Err(CoreError::DependencyFailure(_)));
    }

    #[test]
    fn empty_secret_round_trips() {
        let cipher = SecretCipher::from_passphrase("portal-test-key");
        let stored = cipher.encrypt("").unwrap();
        assert_eq!(cipher.decrypt(&stored).unwrap(), "");
    }
}
