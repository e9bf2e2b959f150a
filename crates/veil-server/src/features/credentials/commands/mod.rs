//! Credential commands

pub mod store_hf_token;
pub mod store_tokens;

pub use store_hf_token::{StoreHfTokenCommand, StoreHfTokenError, StoreHfTokenResponse};
pub use store_tokens::{StoreTokensCommand, StoreTokensError, StoreTokensResponse};
