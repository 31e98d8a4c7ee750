// src/session/mod.rs

//! Owns the lifecycle of the authentication token.
//!
//! The token lives in one `SessionStore` slot. Everything else about the
//! session (user id, name, role) is derived by decoding it, so there is never
//! a second copy to keep consistent.

pub mod store;

use std::sync::Arc;

use reqwest::Method;
use validator::Validate;

use crate::{
    error::AppError,
    http::ApiTransport,
    models::{
        post::Post,
        user::{CurrentUser, LoginRequest, RegisterRequest, Role, TokenResponse},
    },
    utils::jwt::decode_token,
};

pub use store::{FileStore, MemoryStore, SessionStore};

/// The authenticated user, as decoded from the token.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl Session {
    /// Decodes a token into a full session, or fails without a partial result.
    pub fn from_token(token: &str) -> Result<Self, AppError> {
        let claims = decode_token(token)?;
        Ok(Self {
            token: token.to_string(),
            user_id: claims.id,
            username: claims.username,
            role: claims.role,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Only the author may edit a post.
    pub fn can_edit(&self, post: &Post) -> bool {
        post.user_id == self.user_id
    }

    /// Only admins may delete posts and comments.
    pub fn can_delete(&self) -> bool {
        self.is_admin()
    }
}

/// Cheap to clone; clones share the same slot.
#[derive(Clone)]
pub struct SessionManager {
    transport: ApiTransport,
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(transport: ApiTransport, store: impl SessionStore + 'static) -> Self {
        Self {
            transport,
            store: Arc::new(store),
        }
    }

    pub fn transport(&self) -> &ApiTransport {
        &self.transport
    }

    /// Authenticates and stores the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AppError> {
        self.authenticate("/api/auth/login", username, password).await
    }

    /// Same contract as `login`, against the privileged endpoint.
    pub async fn admin_login(&self, username: &str, password: &str) -> Result<Session, AppError> {
        self.authenticate("/api/auth/admin/login", username, password)
            .await
    }

    async fn authenticate(
        &self,
        path: &str,
        username: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        let payload = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        payload.validate()?;

        let response: TokenResponse = self
            .transport
            .send(Method::POST, path, None, Some(&payload))
            .await?
            .into_json("login token")?;

        let token = response.token.ok_or_else(|| {
            AppError::DecodeError("Login response did not include a token".to_string())
        })?;

        // Decode before persisting so a bad token never leaves a half-populated session.
        let session = Session::from_token(&token).map_err(|e| {
            tracing::error!("Backend issued an undecodable token for {}: {}", username, e);
            e
        })?;
        self.store.save(&token)?;

        tracing::info!(
            "Logged in as {} (id {}, role {})",
            session.username,
            session.user_id,
            session.role.as_str()
        );
        Ok(session)
    }

    /// Creates an account. Callers log in afterwards.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        invite_code: &str,
    ) -> Result<(), AppError> {
        let payload = RegisterRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
            invite_code: invite_code.trim().to_string(),
        };
        payload.validate()?;

        self.transport
            .send(Method::POST, "/api/auth/register", None, Some(&payload))
            .await?;

        tracing::info!("Registered {}", payload.username);
        Ok(())
    }

    /// Drops the stored token. JWTs are stateless, so the backend is not told.
    pub fn logout(&self) -> Result<(), AppError> {
        self.store.clear()?;
        tracing::info!("Logged out");
        Ok(())
    }

    pub fn current_token(&self) -> Option<String> {
        match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Session slot unreadable, treating as logged out: {}", e);
                None
            }
        }
    }

    /// The live session, if any. A stored token that no longer decodes is discarded.
    pub fn current_session(&self) -> Option<Session> {
        let token = self.current_token()?;
        match Session::from_token(&token) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("Discarding stored token: {}", e);
                self.invalidate();
                None
            }
        }
    }

    /// Asks the backend who the token belongs to.
    pub async fn current_user(&self) -> Result<CurrentUser, AppError> {
        let token = self.current_token();
        let result = self
            .transport
            .send::<()>(Method::GET, "/api/auth/me", token.as_deref(), None)
            .await;
        if token.is_some() && matches!(result, Err(AppError::AuthError(_))) {
            self.invalidate();
        }
        result?.into_json("current user")
    }

    /// Ends the session after the backend rejected it.
    pub fn invalidate(&self) {
        if let Err(e) = self.store.clear() {
            tracing::error!("Failed to clear rejected session: {}", e);
        } else {
            tracing::warn!("Session rejected by backend; cleared");
        }
    }
}
