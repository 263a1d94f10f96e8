use reqwest::StatusCode;
use thiserror::Error;

/// Maximum number of characters of an upstream response body kept in errors.
pub const BODY_EXCERPT_CHARS: usize = 900;

/// Pipeline-level failures. Every variant is terminal for the run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Invalid sync window: {0}")]
    InvalidWindow(String),

    #[error("Invalid credentials: {0}")]
    Credentials(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Shopify {status}: {body}")]
    Shopify { status: StatusCode, body: String },

    #[error("Sheets API {status}: {body}")]
    Sheets { status: StatusCode, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Builds an upstream Shopify error keeping only a bounded body excerpt.
    pub fn shopify(status: StatusCode, body: &str) -> Self {
        Self::Shopify {
            status,
            body: excerpt(body, BODY_EXCERPT_CHARS),
        }
    }

    pub fn sheets(status: StatusCode, body: &str) -> Self {
        Self::Sheets {
            status,
            body: excerpt(body, BODY_EXCERPT_CHARS),
        }
    }

    /// HTTP status of the failed upstream call, if the error came from one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Shopify { status, .. } | Self::Sheets { status, .. } => Some(*status),
            Self::Http(err) => err.status(),
            _ => None,
        }
    }
}

/// Returns at most `max_chars` characters of `text`, never splitting a code point.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_keeps_short_bodies() {
        assert_eq!(excerpt("not found", 900), "not found");
    }

    #[test]
    fn excerpt_truncates_on_char_boundary() {
        let body = "é".repeat(1000);
        let cut = excerpt(&body, 900);
        assert_eq!(cut.chars().count(), 900);
    }

    #[test]
    fn shopify_error_reports_status_and_excerpt() {
        let body = "x".repeat(2000);
        let err = SyncError::shopify(StatusCode::TOO_MANY_REQUESTS, &body);
        assert_eq!(err.status(), Some(StatusCode::TOO_MANY_REQUESTS));
        let message = err.to_string();
        assert!(message.starts_with("Shopify 429 Too Many Requests: "));
        assert_eq!(message.matches('x').count(), BODY_EXCERPT_CHARS);
    }
}
