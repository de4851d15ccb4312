//! Error types for Alugux
//!
//! Three families of failure reach the views:
//! - validation errors, field-level, that never leave the process
//! - remote-call errors, surfaced as a toast and aborting the operation
//! - a missing session, which sends the shell back to `/auth`

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// First failing message per form field, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` for `field` unless the field already failed an earlier rule.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing failed, otherwise the collected errors.
    pub fn into_result(self) -> std::result::Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Invalid month: {value}")]
    InvalidMonth { value: String },

    #[error("No active session")]
    SessionMissing,

    #[error("Resource not found: {resource} with id {id}")]
    NotFound { resource: &'static str, id: String },

    /// The remote service answered with a non-success status.
    #[error("Remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl AppError {
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        AppError::Remote {
            status,
            message: message.into(),
        }
    }

    /// Text shown to the user in the notification toast.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Remote { message, .. } => message.clone(),
            AppError::Validation(errors) => errors.to_string(),
            AppError::InvalidMonth { .. } => "Mês inválido".to_string(),
            AppError::SessionMissing => "Sessão expirada, entre novamente".to_string(),
            AppError::NotFound { resource, .. } => format!("{resource} não encontrado"),
            other => other.to_string(),
        }
    }

    /// Whether the shell should send the user back to the sign-in route.
    pub fn requires_sign_in(&self) -> bool {
        matches!(
            self,
            AppError::SessionMissing | AppError::Remote { status: 401, .. }
        )
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_message_per_field_wins() {
        let mut errors = FieldErrors::new();
        errors.add("tenant_cpf", "CPF inválido");
        errors.add("tenant_cpf", "CPF deve conter apenas números");
        assert_eq!(errors.get("tenant_cpf"), Some("CPF inválido"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_remote_message_is_shown_verbatim() {
        let err = AppError::remote(400, "Invalid login credentials");
        assert_eq!(err.user_message(), "Invalid login credentials");
        assert!(!err.requires_sign_in());
    }

    #[test]
    fn test_expired_session_requires_sign_in() {
        assert!(AppError::SessionMissing.requires_sign_in());
        assert!(AppError::remote(401, "JWT expired").requires_sign_in());
    }
}
