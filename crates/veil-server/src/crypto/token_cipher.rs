//! Token cipher
//!
//! Symmetric encryption for OAuth and API bearer tokens before they are
//! persisted. The on-disk format is `hex(iv) + ":" + hex(ciphertext)` with a
//! fresh random 16-byte IV per encryption, using AES-256 in CTR mode.
//!
//! The format is load-bearing: tokens already stored by earlier releases
//! must keep decrypting, so CTR mode and the hex layout cannot change
//! without a data migration. CTR provides confidentiality only; tampering
//! with stored ciphertext is not detectable here.

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::RngCore;
use thiserror::Error;

/// AES-256 in CTR mode with a big-endian 128-bit counter
type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// Length of the per-token initialization vector, in bytes
const IV_LEN: usize = 16;

/// Delimiter between the access and refresh halves of a combined token
const PAIR_DELIMITER: &str = "::";

/// Errors from token encryption and decryption
#[derive(Debug, Error)]
pub enum CipherError {
    /// The stored token string does not parse (missing separator, invalid
    /// hex, or wrong IV length)
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// The cipher could not be applied
    #[error("Decryption failed: {0}")]
    Decryption(String),
}

/// Encrypts and decrypts bearer-token material under a fixed 256-bit key.
///
/// The key length is enforced at construction (and, upstream, at startup by
/// config validation), never per call.
#[derive(Clone)]
pub struct TokenCipher {
    key: [u8; 32],
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material must never reach logs
        f.debug_struct("TokenCipher").finish_non_exhaustive()
    }
}

impl TokenCipher {
    /// Create a cipher from a 32-byte key
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Encrypt `plaintext`, returning `hex(iv):hex(ciphertext)`.
    ///
    /// A fresh IV is drawn from the OS RNG on every call, so two
    /// encryptions of identical plaintext produce different tokens.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let mut iv = [0u8; IV_LEN];
        rand::rngs::OsRng.fill_bytes(&mut iv);

        let mut buffer = plaintext.to_vec();
        let mut cipher = Aes256Ctr::new(&self.key.into(), &iv.into());
        cipher
            .try_apply_keystream(&mut buffer)
            .map_err(|e| CipherError::Decryption(e.to_string()))?;

        Ok(format!("{}:{}", hex::encode(iv), hex::encode(buffer)))
    }

    /// Decrypt a stored token back to its plaintext bytes
    pub fn decrypt(&self, token: &str) -> Result<Vec<u8>, CipherError> {
        let (iv_hex, ct_hex) = token.split_once(':').ok_or_else(|| {
            CipherError::MalformedToken("missing ':' separator".to_string())
        })?;

        let iv_bytes = hex::decode(iv_hex)
            .map_err(|e| CipherError::MalformedToken(format!("invalid IV hex: {}", e)))?;
        let iv: [u8; IV_LEN] = iv_bytes.try_into().map_err(|v: Vec<u8>| {
            CipherError::MalformedToken(format!("IV must be {} bytes, got {}", IV_LEN, v.len()))
        })?;

        let mut buffer = hex::decode(ct_hex)
            .map_err(|e| CipherError::MalformedToken(format!("invalid ciphertext hex: {}", e)))?;

        let mut cipher = Aes256Ctr::new(&self.key.into(), &iv.into());
        cipher
            .try_apply_keystream(&mut buffer)
            .map_err(|e| CipherError::Decryption(e.to_string()))?;

        Ok(buffer)
    }

    /// Decrypt a stored token that is expected to be UTF-8 text
    pub fn decrypt_string(&self, token: &str) -> Result<String, CipherError> {
        let plaintext = self.decrypt(token)?;
        String::from_utf8(plaintext)
            .map_err(|_| CipherError::Decryption("plaintext is not valid UTF-8".to_string()))
    }

    /// Join an access/refresh token pair with `::` and encrypt the result,
    /// so one stored column carries both credentials
    pub fn encrypt_token_pair(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<String, CipherError> {
        let combined = format!("{}{}{}", access_token, PAIR_DELIMITER, refresh_token);
        self.encrypt(combined.as_bytes())
    }

    /// Split a decrypted token pair back into (access, refresh)
    pub fn split_token_pair(combined: &str) -> Result<(String, String), CipherError> {
        let (access, refresh) = combined.split_once(PAIR_DELIMITER).ok_or_else(|| {
            CipherError::MalformedToken("token pair missing '::' delimiter".to_string())
        })?;
        Ok((access.to_string(), refresh.to_string()))
    }
}
