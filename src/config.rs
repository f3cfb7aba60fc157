// Runtime configuration, read once at startup from the environment
// (after `.env` has been loaded).
//
// **Environment Variables:**
// - `GOOGLE_SLIDES_TOKEN_PATH` - Authorized-user token file (default `token.json`)
// - `GOOGLE_SERVICE_ACCOUNT_KEY` - Path to a service account JSON key
// - `GOOGLE_SERVICE_ACCOUNT_JSON` - Service account JSON content (alternative)
// - `SLIDES_HTTP_TIMEOUT_SECS` - HTTP client timeout (default 60)
// - `RUST_LOG` - Log filter, handled by tracing-subscriber

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TOKEN_PATH: &str = "token.json";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Which credentials to use for the Google APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// OAuth authorized-user token file, produced by an external consent flow.
    TokenFile(PathBuf),
    ServiceAccountFile(PathBuf),
    ServiceAccountJson(String),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub credentials: CredentialSource,
    pub http_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. A service account, when
    /// configured, takes precedence over the token file.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let credentials = if let Some(path) = non_empty("GOOGLE_SERVICE_ACCOUNT_KEY") {
            CredentialSource::ServiceAccountFile(PathBuf::from(path))
        } else if let Some(json) = non_empty("GOOGLE_SERVICE_ACCOUNT_JSON") {
            CredentialSource::ServiceAccountJson(json)
        } else {
            CredentialSource::TokenFile(PathBuf::from(
                non_empty("GOOGLE_SLIDES_TOKEN_PATH").unwrap_or_else(|| DEFAULT_TOKEN_PATH.to_string()),
            ))
        };

        let timeout_secs = match non_empty("SLIDES_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().ok().filter(|s| *s > 0).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Invalid SLIDES_HTTP_TIMEOUT_SECS, using default");
                DEFAULT_TIMEOUT_SECS
            }),
            None => DEFAULT_TIMEOUT_SECS,
        };

        Self {
            credentials,
            http_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(
            config.credentials,
            CredentialSource::TokenFile(PathBuf::from("token.json"))
        );
        assert_eq!(config.http_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_service_account_wins() {
        let config = config(&[
            ("GOOGLE_SLIDES_TOKEN_PATH", "/tmp/t.json"),
            ("GOOGLE_SERVICE_ACCOUNT_KEY", "/keys/sa.json"),
        ]);
        assert_eq!(
            config.credentials,
            CredentialSource::ServiceAccountFile(PathBuf::from("/keys/sa.json"))
        );
    }

    #[test]
    fn test_bad_timeout_falls_back() {
        assert_eq!(
            config(&[("SLIDES_HTTP_TIMEOUT_SECS", "soon")]).http_timeout,
            Duration::from_secs(60)
        );
        assert_eq!(
            config(&[("SLIDES_HTTP_TIMEOUT_SECS", "15")]).http_timeout,
            Duration::from_secs(15)
        );
    }
}
