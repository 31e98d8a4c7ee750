// src/utils/jwt.rs

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, models::user::Role};

/// Claims the backend embeds in every session token.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Claims {
    /// User ID.
    pub id: i64,
    pub username: String,
    /// User's role ('user' or 'admin').
    pub role: Role,
    /// Expiration time as Unix timestamp. Owned by the backend; not checked here.
    #[serde(default)]
    pub exp: Option<u64>,
}

/// Decodes the payload segment of a session token.
///
/// Only the middle segment is read. The header and signature are not
/// inspected and expiry is not enforced: the backend is the trust boundary
/// and rejects stale tokens itself. Any structural problem (wrong segment
/// count, bad base64url, non-JSON payload, missing claims) becomes
/// `AppError::DecodeError`.
pub fn decode_token(token: &str) -> Result<Claims, AppError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(AppError::DecodeError(
            "Malformed session token: expected three segments".to_string(),
        ));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(segments[1].trim_end_matches('='))
        .map_err(|e| AppError::DecodeError(format!("Malformed session token: {}", e)))?;

    serde_json::from_slice::<Claims>(&payload)
        .map_err(|e| AppError::DecodeError(format!("Malformed session token: {}", e)))
}
