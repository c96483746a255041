//! HTTP utilities for cloud REST API calls

use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

const USER_AGENT: &str = concat!("dataarts-rule/", env!("CARGO_PKG_VERSION"));

/// Header carrying a pre-issued IAM token
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let char_count = body.chars().count();
    let truncated = if char_count > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Error body returned by the management API on failures,
/// e.g. `{"error_code": "DLS.4106", "error_msg": "Rule is not exist."}`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_msg: Option<String>,
}

/// Failure of a single API call
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API request failed: {status}: {}", sanitize_for_log(.body))]
    Status { status: StatusCode, body: String },

    #[error("failed to parse response JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status of a non-2xx response
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Parsed error body, if the response carried one in the standard shape
    pub fn error_body(&self) -> Option<ErrorBody> {
        match self {
            ApiError::Status { body, .. } => serde_json::from_str(body).ok(),
            _ => None,
        }
    }

    /// Shortcut for the `error_code` of the error body
    pub fn error_code(&self) -> Option<String> {
        self.error_body().and_then(|b| b.error_code)
    }
}

/// HTTP client wrapper for management API calls
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    auth_token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(auth_token: Option<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            auth_token: auth_token.filter(|t| !t.is_empty()),
        })
    }

    /// Make a GET request
    pub async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.send::<()>(Method::GET, url, headers, None).await
    }

    /// Make a POST request with a JSON body
    pub async fn post<B>(&self, url: &str, headers: &[(&str, &str)], body: &B) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, url, headers, Some(body)).await
    }

    /// Make a PUT request with a JSON body
    pub async fn put<B>(&self, url: &str, headers: &[(&str, &str)], body: &B) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::PUT, url, headers, Some(body)).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str, headers: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.send::<()>(Method::DELETE, url, headers, None).await
    }

    async fn send<B>(
        &self,
        method: Method,
        url: &str,
        headers: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method, url);

        if let Some(token) = &self.auth_token {
            request = request.header(AUTH_TOKEN_HEADER, token.as_str());
        }
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;

        let status = response.status();
        let response_body = response.text().await?;

        if !status.is_success() {
            // Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&response_body));
            return Err(ApiError::Status {
                status,
                body: response_body,
            });
        }

        // Handle empty response
        if response_body.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&response_body)?)
    }
}

/// Format an API failure for display
/// Maps common statuses to short messages and appends the service error code
pub fn format_api_error(error: &anyhow::Error) -> String {
    let Some(api_error) = error.chain().find_map(|e| e.downcast_ref::<ApiError>()) else {
        return truncate_message(&error.to_string());
    };

    let detail = api_error
        .error_body()
        .and_then(|b| match (b.error_code, b.error_msg) {
            (Some(code), Some(msg)) => Some(format!(" ({}: {})", code, truncate_message(&msg))),
            (Some(code), None) => Some(format!(" ({})", code)),
            _ => None,
        })
        .unwrap_or_default();

    let summary = match api_error.status().map(|s| s.as_u16()) {
        Some(400) => "Invalid request. Check your parameters.",
        Some(401) => "Authentication failed. Check HW_AUTH_TOKEN or the auth_token setting.",
        Some(403) => "Permission denied. Check your IAM permissions for DataArts Studio.",
        Some(404) => "Resource not found.",
        Some(409) => "Resource conflict. The resource may already exist or be in use.",
        Some(429) => "Rate limit exceeded. Please try again later.",
        Some(500) | Some(502) | Some(503) => "Service temporarily unavailable. Please try again.",
        Some(_) => "Request failed.",
        None => return truncate_message(&error.to_string()),
    };

    format!("{}{}", summary, detail)
}

/// Truncate long error messages and remove non-printable characters
fn truncate_message(message: &str) -> String {
    let sanitized = message
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(120)
        .collect::<String>();

    if sanitized.len() < message.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
