//! GitHub Content API Client
//!
//! Blocking, per-file retrieval through the contents API (base64 payloads)
//! plus a commit-history lookup for capture timestamps. The `ContentSource`
//! trait is the seam the ingest pipeline depends on, so tests can supply an
//! in-memory fake instead of the network.

use base64::Engine as _;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const API_BASE: &str = "https://api.github.com";
const ACCEPT_JSON: &str = "application/vnd.github.v3+json";

/// Environment variable holding an optional bearer token. Raises rate
/// limits; absence does not change functional behavior.
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} for {url}")]
    Status { status: StatusCode, url: String },

    #[error("invalid access token")]
    InvalidToken,

    #[error("content payload was not valid base64")]
    Base64(#[from] base64::DecodeError),

    #[error("content payload was not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Read-only access to files in external source repositories.
pub trait ContentSource {
    /// Returns the decoded text of a file, or `None` when the file does not
    /// exist in the repository (an expected, non-fatal condition).
    fn file_text(&self, owner: &str, repo: &str, path: &str) -> Result<Option<String>, FetchError>;

    /// ISO timestamp of the most recent commit touching `path`, if the
    /// lookup succeeds. Failures degrade to `None`.
    fn last_commit_iso(&self, owner: &str, repo: &str, path: &str) -> Option<String>;
}

#[derive(Deserialize)]
struct ContentPayload {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Deserialize)]
struct CommitEntry {
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    committer: CommitActor,
}

#[derive(Deserialize)]
struct CommitActor {
    date: String,
}

/// Blocking GitHub API client with an optional token.
pub struct GitHubClient {
    client: Client,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("token {}", token.trim()))
                .map_err(|_| FetchError::InvalidToken)?;
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder()
            .user_agent(concat!("siteproof-cli/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }

    /// Reads the token from `GITHUB_TOKEN` if set.
    pub fn from_env() -> Result<Self, FetchError> {
        Self::new(std::env::var(TOKEN_ENV_VAR).ok())
    }

    fn decode_payload(payload: ContentPayload) -> Result<Option<String>, FetchError> {
        match (payload.encoding.as_deref(), payload.content) {
            (Some("base64"), Some(content)) => {
                // The API wraps base64 payloads with newlines.
                let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
                let bytes = base64::engine::general_purpose::STANDARD.decode(compact)?;
                Ok(Some(String::from_utf8(bytes)?))
            }
            _ => Ok(None),
        }
    }
}

impl ContentSource for GitHubClient {
    fn file_text(&self, owner: &str, repo: &str, path: &str) -> Result<Option<String>, FetchError> {
        let url = format!("{API_BASE}/repos/{owner}/{repo}/contents/{path}");
        let response = self.client.get(&url).send()?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FetchError::Status { status, url });
        }
        let payload: ContentPayload = response.json()?;
        Self::decode_payload(payload)
    }

    fn last_commit_iso(&self, owner: &str, repo: &str, path: &str) -> Option<String> {
        let url = format!("{API_BASE}/repos/{owner}/{repo}/commits?path={path}&page=1&per_page=1");
        let response = match self.client.get(&url).send() {
            Ok(resp) => resp,
            Err(err) => {
                debug!(%url, error = %err, "commit lookup failed");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(%url, status = %response.status(), "commit lookup returned non-success");
            return None;
        }
        let commits: Vec<CommitEntry> = response.json().ok()?;
        commits.into_iter().next().map(|c| c.commit.committer.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_payload_base64_with_newlines() {
        let payload = ContentPayload {
            content: Some("eyJwOTVf\nbGF0ZW5jeV9tcyI6IDE4Nn0=\n".to_string()),
            encoding: Some("base64".to_string()),
        };
        let text = GitHubClient::decode_payload(payload).unwrap().unwrap();
        assert_eq!(text, r#"{"p95_latency_ms": 186}"#);
    }

    #[test]
    fn test_decode_payload_unknown_encoding() {
        let payload = ContentPayload {
            content: Some("whatever".to_string()),
            encoding: Some("none".to_string()),
        };
        assert!(GitHubClient::decode_payload(payload).unwrap().is_none());
    }

    #[test]
    fn test_decode_payload_invalid_base64() {
        let payload = ContentPayload {
            content: Some("!!not base64!!".to_string()),
            encoding: Some("base64".to_string()),
        };
        assert!(GitHubClient::decode_payload(payload).is_err());
    }
}
