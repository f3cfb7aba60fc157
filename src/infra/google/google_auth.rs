// =============================================================================
// GOOGLE CREDENTIALS
// =============================================================================
//
// Two ways to obtain an OAuth2 access token for the Slides and Drive APIs:
//
// 1. **Authorized user (default):** a `token.json` written by an external
//    consent flow. It holds a refresh token; when the access token is missing
//    or expired we refresh it and write the file back in place.
//
// 2. **Service account:** a JSON key. We sign a JWT with it and exchange that
//    for an access token. Presentations must be shared with the service
//    account's email address.
//
// Both are wrapped in `GoogleCredentials`, built once in `main` and cloned
// into each API client.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::CredentialSource;
use crate::core::slides::SlidesError;

pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/presentations",
    "https://www.googleapis.com/auth/drive",
];

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens are refreshed this long before they actually expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Anything that can hand out a bearer token.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, SlidesError>;
}

/// Shared handle to whichever credential provider is configured.
#[derive(Clone)]
pub struct GoogleCredentials {
    provider: Arc<dyn AccessTokenProvider>,
}

impl GoogleCredentials {
    pub fn new(provider: Arc<dyn AccessTokenProvider>) -> Self {
        Self { provider }
    }

    pub async fn from_source(source: &CredentialSource, client: Client) -> Result<Self, SlidesError> {
        let provider: Arc<dyn AccessTokenProvider> = match source {
            CredentialSource::TokenFile(path) => {
                Arc::new(AuthorizedUserAuth::from_file(path, client).await?)
            }
            CredentialSource::ServiceAccountFile(path) => {
                Arc::new(ServiceAccountAuth::from_file(path, client).await?)
            }
            CredentialSource::ServiceAccountJson(json) => {
                Arc::new(ServiceAccountAuth::from_json(json, client)?)
            }
        };
        Ok(Self::new(provider))
    }

    pub async fn bearer(&self) -> Result<String, SlidesError> {
        self.provider.access_token().await
    }
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

async fn request_token(
    client: &Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> Result<TokenResponse, SlidesError> {
    let response = client
        .post(token_uri)
        .form(form)
        .send()
        .await
        .map_err(|e| SlidesError::Auth(format!("token request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(SlidesError::Auth(format!(
            "token exchange failed ({}): {}",
            status, text
        )));
    }

    response
        .json()
        .await
        .map_err(|e| SlidesError::Auth(format!("unreadable token response: {}", e)))
}

// =============================================================================
// AUTHORIZED USER (token.json)
// =============================================================================

/// On-disk shape of an authorized-user token file. Unknown keys are kept so
/// the file round-trips unchanged apart from the refreshed fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AuthorizedUserToken {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    refresh_token: String,
    client_id: String,
    client_secret: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiry: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Accepts RFC 3339 and the zone-less form some tools write (`2024-05-01T10:00:00.123456`).
fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

pub struct AuthorizedUserAuth {
    path: PathBuf,
    client: Client,
    state: RwLock<AuthorizedUserToken>,
}

impl AuthorizedUserAuth {
    pub async fn from_file(path: &Path, client: Client) -> Result<Self, SlidesError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            SlidesError::Auth(format!(
                "cannot read token file {}: {}. Run the OAuth consent flow to create it.",
                path.display(),
                e
            ))
        })?;
        let token: AuthorizedUserToken = serde_json::from_str(&content).map_err(|e| {
            SlidesError::Auth(format!("token file {} is malformed: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), "Loaded authorized-user token file");
        Ok(Self {
            path: path.to_path_buf(),
            client,
            state: RwLock::new(token),
        })
    }

    fn still_valid(token: &AuthorizedUserToken) -> Option<String> {
        let access = token.token.as_ref()?;
        let expiry = token.expiry.as_deref().and_then(parse_expiry)?;
        (expiry > Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS)).then(|| access.clone())
    }

    async fn refresh(&self) -> Result<String, SlidesError> {
        let mut state = self.state.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if let Some(token) = Self::still_valid(&state) {
            return Ok(token);
        }

        let response = request_token(
            &self.client,
            &state.token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", state.refresh_token.as_str()),
                ("client_id", state.client_id.as_str()),
                ("client_secret", state.client_secret.as_str()),
            ],
        )
        .await?;

        let expires_in = response.expires_in.unwrap_or(3600);
        state.token = Some(response.access_token.clone());
        state.expiry = Some((Utc::now() + Duration::seconds(expires_in)).to_rfc3339());

        match serde_json::to_string_pretty(&*state) {
            Ok(json) => {
                if let Err(e) = tokio::fs::write(&self.path, json).await {
                    tracing::warn!(path = %self.path.display(), error = %e, "Could not write refreshed token back");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Could not serialize refreshed token"),
        }

        tracing::info!(expires_in, "Refreshed Google access token");
        Ok(response.access_token)
    }
}

#[async_trait]
impl AccessTokenProvider for AuthorizedUserAuth {
    async fn access_token(&self) -> Result<String, SlidesError> {
        {
            let state = self.state.read().await;
            if let Some(token) = Self::still_valid(&state) {
                return Ok(token);
            }
        }
        self.refresh().await
    }
}

// =============================================================================
// SERVICE ACCOUNT
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Authenticator that handles OAuth2 with service account credentials.
pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    client: Client,
    cached_token: RwLock<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub async fn from_file(path: &Path, client: Client) -> Result<Self, SlidesError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            SlidesError::Auth(format!(
                "cannot read service account key {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content, client)
    }

    pub fn from_json(json: &str, client: Client) -> Result<Self, SlidesError> {
        let credentials: ServiceAccountCredentials = serde_json::from_str(json)
            .map_err(|e| SlidesError::Auth(format!("service account key is malformed: {}", e)))?;
        tracing::debug!(client_email = %credentials.client_email, "Loaded service account");
        Ok(Self {
            credentials,
            client,
            cached_token: RwLock::new(None),
        })
    }

    async fn fetch_new_token(&self) -> Result<CachedToken, SlidesError> {
        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: SCOPES.join(" "),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| SlidesError::Auth(format!("invalid private key: {}", e)))?;
        let jwt = encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| SlidesError::Auth(format!("cannot sign JWT: {}", e)))?;

        let response = request_token(
            &self.client,
            &self.credentials.token_uri,
            &[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", jwt.as_str()),
            ],
        )
        .await?;

        Ok(CachedToken {
            token: response.access_token,
            expires_at: Utc::now() + Duration::seconds(response.expires_in.unwrap_or(3600)),
        })
    }
}

#[async_trait]
impl AccessTokenProvider for ServiceAccountAuth {
    async fn access_token(&self) -> Result<String, SlidesError> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) {
                    return Ok(token.token.clone());
                }
            }
        }

        let fresh = self.fetch_new_token().await?;
        let token = fresh.token.clone();
        *self.cached_token.write().await = Some(fresh);
        tracing::info!(client_email = %self.credentials.client_email, "Obtained service account token");
        Ok(token)
    }
}
