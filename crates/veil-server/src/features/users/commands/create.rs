//! Create user command
//!
//! Passwords are bcrypt-hashed before they reach the store; the plaintext
//! never leaves this handler.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use veil_common::types::Role;

use crate::features::shared::validation::{validate_email, EmailValidationError};
use crate::features::FeatureState;
use crate::models::NewUser;

/// Minimum accepted password length
const MIN_PASSWORD_LEN: usize = 8;

/// Command to create a new user account
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserCommand {
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Response from creating a user; deliberately excludes credential material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Errors that can occur when creating a user
#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    #[error("Email validation failed: {0}")]
    EmailValidation(#[from] EmailValidationError),

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,

    #[error("Unknown role '{0}': expected data_owner, data_scientist, or data_admin")]
    InvalidRole(String),

    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Password hashing failed")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("Database error: {0}")]
    Database(crate::db::DbError),
}

impl CreateUserCommand {
    /// Validates the command parameters and resolves the role
    pub fn validate(&self) -> Result<Role, CreateUserError> {
        validate_email(&self.email)?;

        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(CreateUserError::PasswordTooShort);
        }

        self.role
            .parse()
            .map_err(|_| CreateUserError::InvalidRole(self.role.clone()))
    }
}

/// Handler function for creating users
#[tracing::instrument(skip(state, command), fields(email = %command.email))]
pub async fn handle(
    state: &FeatureState,
    command: CreateUserCommand,
) -> Result<CreateUserResponse, CreateUserError> {
    let role = command.validate()?;

    let password_hash = bcrypt::hash(&command.password, bcrypt::DEFAULT_COST)?;
    let email = command.email.clone();

    let new_user = NewUser {
        email: command.email,
        password_hash,
        role,
    };

    let user = state
        .credentials
        .create_user(new_user)
        .await
        .map_err(|e| match e {
            crate::db::DbError::Duplicate(_) => CreateUserError::DuplicateEmail(email),
            other => CreateUserError::Database(other),
        })?;

    tracing::info!(user_id = %user.id, "User created");

    Ok(CreateUserResponse {
        id: user.id,
        email: user.email,
        role: user.role,
    })
}
