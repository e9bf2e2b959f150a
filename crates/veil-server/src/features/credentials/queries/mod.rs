//! Credential queries

pub mod get_tokens;

pub use get_tokens::{GetTokensError, GetTokensQuery, GetTokensResponse};
