//! Service-account authentication for the Sheets API (OAuth 2.0 JWT bearer grant).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::{excerpt, SyncError, SyncResult, BODY_EXCERPT_CHARS};

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
// Refresh a little before the upstream expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Supplies bearer tokens for Sheets calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> SyncResult<String>;
}

/// The fields of a Google service-account key file that the grant needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub key_type: Option<String>,
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Parses a key file payload. Any problem is a credential error.
    pub fn from_json(raw: &str) -> SyncResult<Self> {
        let key: ServiceAccountKey = serde_json::from_str(raw)
            .map_err(|e| SyncError::Credentials(format!("invalid service account JSON: {}", e)))?;

        if let Some(key_type) = key.key_type.as_deref() {
            if key_type != "service_account" {
                return Err(SyncError::Credentials(format!(
                    "expected a service_account key, got '{}'",
                    key_type
                )));
            }
        }
        if key.client_email.trim().is_empty() {
            return Err(SyncError::Credentials(
                "service account client_email is empty".to_string(),
            ));
        }
        if key.private_key.trim().is_empty() {
            return Err(SyncError::Credentials(
                "service account private_key is empty".to_string(),
            ));
        }

        Ok(key)
    }
}

#[derive(Debug, Serialize)]
struct GrantClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: chrono::DateTime<Utc>,
}

/// Exchanges a signed service-account assertion for an access token and
/// reuses it until shortly before it expires.
pub struct ServiceAccountTokenProvider {
    client: Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scope: String,
    cached: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for ServiceAccountTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountTokenProvider")
            .field("key", &self.key)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountTokenProvider {
    pub fn new(key: ServiceAccountKey, timeout: Duration) -> SyncResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(key, client)
    }

    pub fn with_client(key: ServiceAccountKey, client: Client) -> SyncResult<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| SyncError::Credentials(format!("invalid service account key: {}", e)))?;

        Ok(Self {
            client,
            key,
            encoding_key,
            scope: SPREADSHEETS_SCOPE.to_string(),
            cached: Mutex::new(None),
        })
    }

    fn signed_assertion(&self) -> SyncResult<String> {
        let now = Utc::now().timestamp();
        let claims = GrantClaims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| SyncError::Auth(format!("failed to sign token request: {}", e)))
    }

    async fn request_token(&self) -> SyncResult<CachedToken> {
        let assertion = self.signed_assertion()?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SyncError::Auth(format!(
                "token endpoint returned {}: {}",
                status,
                excerpt(&body, BODY_EXCERPT_CHARS)
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| SyncError::Auth(format!("unexpected token response: {}", e)))?;
        let lifetime = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        debug!(expires_in = lifetime, "Obtained Sheets access token");

        Ok(CachedToken {
            value: token.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(lifetime - EXPIRY_MARGIN_SECS),
        })
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    async fn access_token(&self) -> SyncResult<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(token.value.clone());
            }
        }

        let token = self.request_token().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }
}
