//! HTTP-backed role directory.
//!
//! Fetches `GET {base}/principals/{id}/roles` and accepts either a bare JSON
//! array of roles or an object with a `roles` field.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::directory::{DirectoryError, DirectoryResult, RoleDirectory};
use crate::role::{PrincipalId, Role};

/// Longest error body kept in [`DirectoryError::Status`].
const MAX_ERROR_BODY: usize = 256;

#[derive(Deserialize)]
#[serde(untagged)]
enum RolesBody {
    Bare(Vec<Role>),
    Wrapped { roles: Vec<Role> },
}

impl From<RolesBody> for Vec<Role> {
    fn from(body: RolesBody) -> Self {
        match body {
            RolesBody::Bare(roles) | RolesBody::Wrapped { roles } => roles,
        }
    }
}

/// Role directory served over HTTP.
pub struct HttpRoleDirectory {
    client: Client,
    base_url: Url,
    bearer_token: Option<String>,
    timeout: Duration,
}

impl HttpRoleDirectory {
    /// Create a directory client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Transport`] if the URL is not an absolute
    /// `http`/`https` URL or the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> DirectoryResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| DirectoryError::Transport(format!("invalid directory URL: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(DirectoryError::Transport(format!(
                "directory URL must be http or https: {base_url}"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            bearer_token: None,
            timeout,
        })
    }

    /// Authenticate requests with a bearer token.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn roles_url(&self, principal: &PrincipalId) -> DirectoryResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| DirectoryError::Transport("directory URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["principals", principal.as_str(), "roles"]);
        Ok(url)
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl std::fmt::Debug for HttpRoleDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRoleDirectory")
            .field("base_url", &self.base_url.as_str())
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RoleDirectory for HttpRoleDirectory {
    async fn roles_for(&self, principal: &PrincipalId) -> DirectoryResult<Vec<Role>> {
        let url = self.roles_url(principal)?;
        debug!(url = %url, "Fetching roles");

        let mut request = self.client.get(url);
        if let Some(ref token) = self.bearer_token {
            let mut auth_value = HeaderValue::try_from(format!("Bearer {token}"))
                .map_err(|e| DirectoryError::Transport(format!("invalid bearer token: {e}")))?;
            auth_value.set_sensitive(true);
            request = request.header(AUTHORIZATION, auth_value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DirectoryError::Timeout {
                    timeout_ms: self.timeout_ms(),
                }
            } else {
                DirectoryError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            debug!(principal = %principal, status = %status, "Role directory denied lookup");
            return Err(DirectoryError::AccessDenied);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            warn!(status = %status, body = %body, "Role directory error");
            return Err(DirectoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                DirectoryError::Timeout {
                    timeout_ms: self.timeout_ms(),
                }
            } else {
                DirectoryError::Transport(e.to_string())
            }
        })?;
        let body: RolesBody =
            serde_json::from_slice(&bytes).map_err(|e| DirectoryError::Decode(e.to_string()))?;
        Ok(body.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory(base: &str) -> HttpRoleDirectory {
        HttpRoleDirectory::new(base, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_roles_url_joins_segments() {
        let principal = PrincipalId::new("user-1");
        assert_eq!(
            directory("https://dir.example/api")
                .roles_url(&principal)
                .unwrap()
                .as_str(),
            "https://dir.example/api/principals/user-1/roles"
        );
        assert_eq!(
            directory("https://dir.example/api/")
                .roles_url(&principal)
                .unwrap()
                .as_str(),
            "https://dir.example/api/principals/user-1/roles"
        );
    }

    #[test]
    fn test_roles_url_escapes_principal() {
        let principal = PrincipalId::new("a/b c");
        let url = directory("http://dir.example").roles_url(&principal).unwrap();
        assert_eq!(url.as_str(), "http://dir.example/principals/a%2Fb%20c/roles");
    }

    #[test]
    fn test_rejects_non_http_urls() {
        for bad in ["ftp://dir.example", "mailto:ops@dir.example", "not a url"] {
            assert!(
                HttpRoleDirectory::new(bad, Duration::from_secs(1)).is_err(),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_debug_redacts_token() {
        let dir = directory("http://dir.example").with_bearer_token("s3cret");
        let debug = format!("{dir:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_body_shapes() {
        let bare: RolesBody =
            serde_json::from_str(r#"[{"id":"r","name":"n","permissions":1}]"#).unwrap();
        let wrapped: RolesBody =
            serde_json::from_str(r#"{"roles":[{"id":"r","name":"n","permissions":"1"}]}"#)
                .unwrap();
        assert_eq!(Vec::<Role>::from(bare), Vec::<Role>::from(wrapped));
    }
}
