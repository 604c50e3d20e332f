//! Credential encryption.
//!
//! Stored secrets are `base64(nonce || ciphertext)` where the nonce is 12
//! random bytes and the ciphertext carries the 16-byte GCM tag.

use crate::error::CipherError;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gatehouse_core::Secret;
use rand::RngCore;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Turns a stored encrypted secret into plaintext.
pub trait SecretCipher: Send + Sync {
    fn decrypt(&self, ciphertext: &str) -> Result<Secret, CipherError>;
}

/// AES-256-GCM with a process-wide key.
#[derive(Clone)]
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for AesGcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AesGcmCipher { .. }")
    }
}

impl AesGcmCipher {
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        if key.len() != KEY_LEN {
            return Err(CipherError::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_LEN,
                key.len()
            )));
        }
        let cipher =
            Aes256Gcm::new_from_slice(key).map_err(|e| CipherError::InvalidKey(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// Build from the base64 key held in configuration.
    pub fn from_base64_key(key: &str) -> Result<Self, CipherError> {
        let bytes = STANDARD
            .decode(key.trim())
            .map_err(|e| CipherError::InvalidKey(e.to_string()))?;
        Self::new(&bytes)
    }

    /// Encrypt with a fresh random nonce. Used by provisioning and tests.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce);

        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| CipherError::AuthenticationFailed)?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(STANDARD.encode(out))
    }
}

impl SecretCipher for AesGcmCipher {
    fn decrypt(&self, ciphertext: &str) -> Result<Secret, CipherError> {
        let raw = STANDARD
            .decode(ciphertext.trim())
            .map_err(|e| CipherError::InvalidCiphertext(e.to_string()))?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::InvalidCiphertext("too short".to_string()));
        }

        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::AuthenticationFailed)?;

        String::from_utf8(plaintext)
            .map(Secret::from)
            .map_err(|e| CipherError::InvalidCiphertext(e.to_string()))
    }
}
