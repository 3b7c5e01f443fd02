// Client error types
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised by the durable key-value backend behind the token store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced to callers of the Atlas API client
#[derive(Debug, Error)]
pub enum ClientError {
    // Non-2xx response carrying the server's message verbatim
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    // 401 that a token refresh could not recover
    #[error("{message}")]
    Unauthorized { message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Build an error from a non-2xx response, preferring the server's `detail`
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = detail_message(body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()))
        });

        ClientError::Api { status, message }
    }

    /// HTTP status code, when the error came from a response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(status.as_u16()),
            ClientError::Unauthorized { .. } => Some(401),
            ClientError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(401)
    }

    /// Error code for JSON output
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Api { status, .. } => match status.as_u16() {
                400 => "BAD_REQUEST",
                401 => "UNAUTHORIZED",
                403 => "FORBIDDEN",
                404 => "NOT_FOUND",
                409 => "CONFLICT",
                422 => "VALIDATION_ERROR",
                500..=599 => "SERVER_ERROR",
                _ => "REQUEST_FAILED",
            },
            ClientError::Unauthorized { .. } => "SESSION_EXPIRED",
            ClientError::Transport(_) => "TRANSPORT_ERROR",
            ClientError::Decode(_) => "DECODE_ERROR",
            ClientError::Url(_) => "INVALID_URL",
            ClientError::Storage(_) => "STORAGE_ERROR",
            ClientError::Config(_) => "CONFIG_ERROR",
        }
    }
}

/// Extract `detail` from an error body. Validation failures arrive as a list
/// of `{loc, msg}` objects and are joined into one line.
fn detail_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    match value.get("detail")? {
        Value::String(message) => Some(message.clone()),
        Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .map(|item| {
                    let msg = item.get("msg").and_then(Value::as_str).unwrap_or("invalid value");
                    let field = item
                        .get("loc")
                        .and_then(Value::as_array)
                        .and_then(|loc| loc.last())
                        .and_then(Value::as_str);
                    match field {
                        Some(field) => format!("{}: {}", field, msg),
                        None => msg.to_string(),
                    }
                })
                .collect();

            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
