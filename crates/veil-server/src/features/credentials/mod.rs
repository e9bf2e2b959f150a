//! Encrypted credential storage feature
//!
//! Bearer tokens pass through the [`TokenCipher`](crate::crypto::TokenCipher)
//! on the way in and out of the users table; plaintext token material exists
//! only in request and response bodies.

pub mod commands;
pub mod queries;
pub mod routes;

pub use routes::credential_routes;
