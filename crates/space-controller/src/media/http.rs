//! HTTP client for the media backend's admin API.
//!
//! # Security
//!
//! - Requests authenticate with a bearer token when one is configured
//! - Timeouts prevent hanging connections; the reconciler additionally
//!   bounds each per-space iteration
//! - Errors are logged server-side; callers see a generic failure

use super::{MediaBackend, MediaParticipant, MediaRoom};
use crate::errors::ScError;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{instrument, warn};

/// Default timeout for media backend requests in seconds.
const MEDIA_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Media backend client over its HTTP admin API.
#[derive(Clone)]
pub struct HttpMediaBackend {
    http: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpMediaBackend {
    /// Create a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ScError::Internal` if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(base_url: String, api_token: Option<String>) -> Result<Self, ScError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(MEDIA_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ScError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ScError> {
        let url = format!("{}{path}", self.base_url);

        let mut request = self.http.get(&url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            warn!(target: "sc.media.http", path = %path, error = %e, "Media backend request failed");
            ScError::MediaBackend(format!("request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(
                target: "sc.media.http",
                path = %path,
                status = %status,
                "Media backend returned error status"
            );
            return Err(ScError::MediaBackend(format!(
                "unexpected status {status} from {path}"
            )));
        }

        response.json().await.map_err(|e| {
            warn!(target: "sc.media.http", path = %path, error = %e, "Failed to decode media backend response");
            ScError::MediaBackend(format!("invalid response body: {e}"))
        })
    }
}

#[async_trait]
impl MediaBackend for HttpMediaBackend {
    #[instrument(skip_all)]
    async fn list_rooms(&self) -> Result<Vec<MediaRoom>, ScError> {
        self.get_json("/rooms").await
    }

    #[instrument(skip_all, fields(space = %space))]
    async fn list_participants(&self, space: &str) -> Result<Vec<MediaParticipant>, ScError> {
        self.get_json(&format!("/rooms/{space}/participants")).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let backend = HttpMediaBackend::new("http://sfu:7880/".to_string(), None).unwrap();
        assert_eq!(backend.base_url, "http://sfu:7880");
    }

    #[test]
    fn test_roster_payload_decodes() {
        let json = r#"[{"identity":"alice"},{"identity":"bob"}]"#;
        let roster: Vec<MediaParticipant> = serde_json::from_str(json).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.first().map(|p| p.identity.as_str()), Some("alice"));
    }

    #[test]
    fn test_room_payload_decodes() {
        let json = r#"[{"name":"atrium"}]"#;
        let rooms: Vec<MediaRoom> = serde_json::from_str(json).unwrap();
        assert_eq!(rooms.first().map(|r| r.name.as_str()), Some("atrium"));
    }
}
