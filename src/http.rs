// src/http.rs

use reqwest::{Client, Method, StatusCode, header};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::{AppError, normalize_error_message};

/// Outcome of a successful request.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// 204, an empty body, or a body that is not JSON.
    Empty,
    Json(Value),
}

impl ApiResponse {
    pub fn is_empty(&self) -> bool {
        matches!(self, ApiResponse::Empty)
    }

    /// Deserializes the body into `T`, where `what` names the expected entity.
    pub fn into_json<T: DeserializeOwned>(self, what: &str) -> Result<T, AppError> {
        match self {
            ApiResponse::Json(value) => serde_json::from_value(value).map_err(|e| {
                AppError::UnexpectedResponse(format!("Could not read {} from response: {}", what, e))
            }),
            ApiResponse::Empty => Err(AppError::UnexpectedResponse(format!(
                "Server returned no {} in its response",
                what
            ))),
        }
    }
}

/// Thin wrapper around one `reqwest::Client` bound to the API base URL.
///
/// Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiTransport {
    client: Client,
    base_url: String,
}

impl ApiTransport {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues one request and normalizes the outcome.
    ///
    /// * `token` is sent as a bearer credential when present.
    /// * Non-success statuses become the matching `AppError` with a non-empty message.
    /// * Success without a JSON body becomes `ApiResponse::Empty`.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<ApiResponse, AppError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), &url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));
        let text = response.text().await?;

        if !status.is_success() {
            let message = normalize_error_message(status, is_json, &text);
            tracing::warn!("{} {} failed with {}: {}", method, path, status, message);
            return Err(AppError::from_status(status, message));
        }

        if status == StatusCode::NO_CONTENT || !is_json || text.trim().is_empty() {
            return Ok(ApiResponse::Empty);
        }

        serde_json::from_str(&text).map(ApiResponse::Json).map_err(|e| {
            tracing::error!("{} {} returned invalid JSON: {:?}", method, path, e);
            AppError::UnexpectedResponse(format!("Invalid JSON in response: {}", e))
        })
    }
}
