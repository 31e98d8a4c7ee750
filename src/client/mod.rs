// src/client/mod.rs

//! Canonical gateway for every stateful operation against the forum backend.
//!
//! Each operation returns the server's view of the entity it touched. Callers
//! overwrite whatever provisional copy they hold with that value.

pub mod community;
pub mod interaction;

use reqwest::Method;
use serde::Serialize;

use crate::{
    error::AppError,
    http::{ApiResponse, ApiTransport},
    session::SessionManager,
};

#[derive(Clone)]
pub struct SyncClient {
    transport: ApiTransport,
    session: SessionManager,
}

impl SyncClient {
    pub fn new(session: SessionManager) -> Self {
        Self {
            transport: session.transport().clone(),
            session,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Sends a request carrying the current token, if any.
    /// A 401 on an authenticated request ends the session.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse, AppError> {
        let token = self.session.current_token();
        let result = self
            .transport
            .send(method, path, token.as_deref(), body)
            .await;

        if token.is_some() && matches!(result, Err(AppError::AuthError(_))) {
            self.session.invalidate();
        }
        result
    }

    async fn get(&self, path: &str) -> Result<ApiResponse, AppError> {
        self.send::<()>(Method::GET, path, None).await
    }

    /// Fails fast with `Forbidden` when the live session is known not to be an admin.
    /// Without a session the request goes out and the backend decides.
    fn require_admin(&self, action: &str) -> Result<(), AppError> {
        match self.session.current_session() {
            Some(session) if !session.can_delete() => {
                Err(AppError::Forbidden(format!("Only admins can {}", action)))
            }
            _ => Ok(()),
        }
    }
}
