//! User commands

pub mod create;
pub mod delete;

pub use create::{CreateUserCommand, CreateUserError, CreateUserResponse};
pub use delete::{DeleteUserCommand, DeleteUserError, DeleteUserResponse};
