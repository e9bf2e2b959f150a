//! Shared validation utilities
//!
//! Common validation functions used by commands across feature slices.

use thiserror::Error;

/// Errors that can occur during file-name validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FileNameValidationError {
    #[error("File name is required and cannot be empty")]
    Required,

    #[error("File name must be between 1 and {max_length} characters")]
    TooLong { max_length: usize },

    #[error("File name cannot contain path separators")]
    ContainsPathSeparator,
}

/// Errors that can occur during email validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmailValidationError {
    #[error("Email is required and cannot be empty")]
    Required,

    #[error("Email must contain exactly one '@' with text on both sides")]
    InvalidFormat,
}

/// Errors that can occur during budget validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BudgetValidationError {
    #[error("Privacy budget must be a finite number")]
    NotFinite,

    #[error("Privacy budget cannot be negative")]
    Negative,
}

/// Validate a dataset file name.
///
/// The name is forwarded verbatim to the engine's URL paths, so path
/// separators are rejected outright.
pub fn validate_file_name(name: &str, max_length: usize) -> Result<(), FileNameValidationError> {
    if name.trim().is_empty() {
        return Err(FileNameValidationError::Required);
    }

    if name.len() > max_length {
        return Err(FileNameValidationError::TooLong { max_length });
    }

    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(FileNameValidationError::ContainsPathSeparator);
    }

    Ok(())
}

/// Validate an email address.
///
/// Intentionally shallow; deliverability is not this service's problem.
pub fn validate_email(email: &str) -> Result<(), EmailValidationError> {
    if email.trim().is_empty() {
        return Err(EmailValidationError::Required);
    }

    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(())
        },
        _ => Err(EmailValidationError::InvalidFormat),
    }
}

/// Validate a privacy-budget value: finite and non-negative
pub fn validate_budget(budget: f64) -> Result<(), BudgetValidationError> {
    if !budget.is_finite() {
        return Err(BudgetValidationError::NotFinite);
    }

    if budget < 0.0 {
        return Err(BudgetValidationError::Negative);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_file_names() {
        for name in ["ratings.csv", "a", "data-2024_v2.parquet"] {
            assert!(validate_file_name(name, 255).is_ok(), "'{}' should be valid", name);
        }
    }

    #[test]
    fn test_file_name_rejects_path_traversal() {
        for name in ["../etc/passwd", "dir/file.csv", "dir\\file.csv", "a..b"] {
            assert!(
                matches!(
                    validate_file_name(name, 255),
                    Err(FileNameValidationError::ContainsPathSeparator)
                ),
                "'{}' should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_file_name_empty_and_too_long() {
        assert!(matches!(
            validate_file_name("  ", 255),
            Err(FileNameValidationError::Required)
        ));
        assert!(matches!(
            validate_file_name(&"a".repeat(300), 255),
            Err(FileNameValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("owner@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("owner@").is_err());
        assert!(validate_email("a@b@c").is_err());
    }

    #[test]
    fn test_budget_validation() {
        assert!(validate_budget(0.0).is_ok());
        assert!(validate_budget(1.5).is_ok());
        assert!(matches!(validate_budget(-0.1), Err(BudgetValidationError::Negative)));
        assert!(matches!(
            validate_budget(f64::NAN),
            Err(BudgetValidationError::NotFinite)
        ));
        assert!(matches!(
            validate_budget(f64::INFINITY),
            Err(BudgetValidationError::NotFinite)
        ));
    }
}
