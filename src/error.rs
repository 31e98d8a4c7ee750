// src/error.rs

use reqwest::StatusCode;
use serde_json::Value;

/// Global Client Error Enum.
/// Every failure of the session layer and the sync client surfaces as one of these.
/// Each variant carries a non-empty, human-readable message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // 401 or rejected credentials
    #[error("{0}")]
    AuthError(String),

    // 400 / 409 / 422, or a local length/emptiness check
    #[error("{0}")]
    ValidationError(String),

    // 403, role or ownership violation
    #[error("{0}")]
    Forbidden(String),

    // 404
    #[error("{0}")]
    NotFound(String),

    // Malformed session token
    #[error("{0}")]
    DecodeError(String),

    // Transport failure (connect, TLS, body read)
    #[error("{0}")]
    NetworkError(String),

    // Any other non-success status
    #[error("{message}")]
    Server { status: u16, message: String },

    // Success status whose body does not match the contract
    #[error("{0}")]
    UnexpectedResponse(String),

    #[error("{0}")]
    Config(String),

    // Session slot could not be read or written
    #[error("{0}")]
    Storage(String),
}

impl AppError {
    /// Builds the typed error for a non-success response.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                AppError::ValidationError(message)
            }
            StatusCode::UNAUTHORIZED => AppError::AuthError(message),
            StatusCode::FORBIDDEN => AppError::Forbidden(message),
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            _ => AppError::Server {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// The message to show the user. Never empty.
    pub fn message(&self) -> &str {
        match self {
            AppError::AuthError(msg)
            | AppError::ValidationError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::DecodeError(msg)
            | AppError::NetworkError(msg)
            | AppError::UnexpectedResponse(msg)
            | AppError::Config(msg)
            | AppError::Storage(msg) => msg,
            AppError::Server { message, .. } => message,
        }
    }

    /// HTTP status the error came from, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::AuthError(_) => Some(401),
            AppError::Forbidden(_) => Some(403),
            AppError::NotFound(_) => Some(404),
            AppError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Picks the message for a failed response.
///
/// Priority: structured `message` field, then structured `error` field, then the
/// raw body text, then a synthesized status message. A structured body that has
/// neither field falls through to the synthesized message, not the raw JSON.
pub fn normalize_error_message(status: StatusCode, is_json: bool, body: &str) -> String {
    let synthesized = || format!("HTTP error! status: {}", status.as_u16());

    if is_json {
        if let Ok(value) = serde_json::from_str::<Value>(body) {
            return structured_message(&value).unwrap_or_else(synthesized);
        }
    }

    let text = body.trim();
    if text.is_empty() {
        synthesized()
    } else {
        text.to_string()
    }
}

fn structured_message(value: &Value) -> Option<String> {
    ["message", "error"].iter().find_map(|key| {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|msg| !msg.is_empty())
            .map(str::to_string)
    })
}

/// Transport failures carry no response; reqwest's description is the message.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::warn!("Request failed before a response arrived: {}", err);
        AppError::NetworkError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}
