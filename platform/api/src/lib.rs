use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

/// Shared result type for portal operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error, Clone)]
pub enum ApiError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("username {0} is already taken")]
    UsernameTaken(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("record store unavailable")]
    StoreUnavailable(Arc<anyhow::Error>),
    #[error("record not found")]
    NotFound,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::UsernameTaken(_) => "USERNAME_TAKEN",
            ApiError::Validation(_) => "VALIDATION",
            ApiError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            ApiError::NotFound => "NOT_FOUND",
        }
    }

    pub fn store(err: impl Into<anyhow::Error>) -> Self {
        Self::StoreUnavailable(Arc::new(err.into()))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Message suitable for the status banner. Store failures never leak
    /// transport details.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::InvalidCredentials => "Invalid username or password".into(),
            ApiError::UsernameTaken(name) => format!("Username {name} is already taken"),
            ApiError::Validation(msg) => msg.clone(),
            ApiError::StoreUnavailable(_) => "Error connecting to server".into(),
            ApiError::NotFound => "Employee data not found".into(),
        }
    }
}

/// Transient status banner reported after every mutating operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusBanner {
    pub ok: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl StatusBanner {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            code: None,
        }
    }

    pub fn failure(err: &ApiError) -> Self {
        Self {
            ok: false,
            message: err.user_message(),
            code: Some(err.code()),
        }
    }
}

/// Fails with a validation error naming the first empty field.
pub fn require_fields(fields: &[(&str, &str)]) -> ApiResult<()> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(ApiError::validation(format!("{name} is required"))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_are_masked() {
        let err = ApiError::store(anyhow::anyhow!("connection refused on 10.0.0.4:3001"));
        let banner = StatusBanner::failure(&err);
        assert!(!banner.ok);
        assert_eq!(banner.message, "Error connecting to server");
        assert_eq!(banner.code, Some("STORE_UNAVAILABLE"));
    }

    #[test]
    fn success_banner_omits_code() {
        let json = serde_json::to_value(StatusBanner::success("Profile updated")).unwrap();
        assert_eq!(json, serde_json::json!({"ok": true, "message": "Profile updated"}));
    }

    #[test]
    fn require_fields_reports_first_blank() {
        let err = require_fields(&[("fullName", "Ada"), ("position", "  "), ("address", "")])
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
        assert_eq!(err.user_message(), "position is required");
        assert!(require_fields(&[("username", "ada")]).is_ok());
    }
}
