//! Cryptography for credential material at rest

pub mod token_cipher;

pub use token_cipher::{CipherError, TokenCipher};
