//! HTTP session against the GitHub REST API.
//!
//! A [`GitHubSession`] owns the reqwest client, the API root and optional
//! credentials. Reads are available on any session; writes are only reachable
//! through an [`AuthenticatedSession`], which [`GitHubSession::authenticated`]
//! hands out only when a token is attached.

pub mod pagination;

pub use pagination::Paginated;

use std::fmt;

use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, ACCEPT, CONTENT_LENGTH, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::Config;

/// Media type requesting raw, text and HTML renderings of bodies.
pub const MEDIA_TYPE: &str = "application/vnd.github.v3.full+json";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("authentication required: no GitHub token is attached to this session")]
    AuthenticationRequired,

    #[error("GitHub API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected HTTP {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("failed to decode GitHub response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),
}

#[derive(Clone)]
struct Credentials {
    token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(<redacted>)")
    }
}

/// Connection to one GitHub API root. Cloning is cheap and shares the
/// underlying connection pool.
#[derive(Debug, Clone)]
pub struct GitHubSession {
    client: Client,
    api_base: String,
    credentials: Option<Credentials>,
}

/// Write capability over a session that carries credentials.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedSession<'a> {
    session: &'a GitHubSession,
}

impl GitHubSession {
    /// Create an unauthenticated session against `api_base`.
    pub fn new(api_base: &str, user_agent: &str) -> Result<Self, SessionError> {
        let parsed = reqwest::Url::parse(api_base)
            .map_err(|_| SessionError::InvalidBaseUrl(api_base.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SessionError::InvalidBaseUrl(api_base.to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE));
        headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);
        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            credentials: None,
        })
    }

    /// Build a session from configuration, attaching the resolved token if any.
    pub fn from_config(config: &Config) -> Result<Self, SessionError> {
        let session = Self::new(config.api_url(), config.user_agent())?;
        Ok(match config.github_token() {
            Some(token) => session.with_token(token),
            None => session,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.credentials = Some(Credentials {
            token: token.into(),
        });
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    /// Guard for write operations: fails before any request is made when the
    /// session carries no credentials.
    pub fn authenticated(&self) -> Result<AuthenticatedSession<'_>, SessionError> {
        if self.is_authenticated() {
            Ok(AuthenticatedSession { session: self })
        } else {
            Err(SessionError::AuthenticationRequired)
        }
    }

    /// Join path parts onto the API root.
    pub fn build_url(&self, parts: &[&str]) -> String {
        build_url(&self.api_base, parts)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.credentials {
            Some(credentials) => request.bearer_auth(&credentials.token),
            None => request,
        }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, url: &str) -> Result<Response, SessionError> {
        let response = self.request(Method::GET, url).send().await?;
        debug!(status = response.status().as_u16(), "GET");
        Ok(response)
    }

    /// GET `url` and decode a 200 response body. Any other status is an error.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SessionError> {
        let response = self.get(url).await?;
        if response.status() != StatusCode::OK {
            return Err(Self::status_error(response).await);
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Status-only probe: `true_code` maps to true, `false_code` to false and
    /// every other status is an error.
    pub async fn boolean(
        &self,
        url: &str,
        true_code: StatusCode,
        false_code: StatusCode,
    ) -> Result<bool, SessionError> {
        let response = self.get(url).await?;
        let status = response.status();
        if status == true_code {
            Ok(true)
        } else if status == false_code {
            Ok(false)
        } else {
            Err(Self::status_error(response).await)
        }
    }

    /// Decode a write response.
    ///
    /// Returns `Some` when the status equals `expected` and the body is not
    /// empty, `None` for any other non-error status, and an error for 4xx/5xx.
    pub async fn decode_json<T: DeserializeOwned>(
        response: Response,
        expected: StatusCode,
    ) -> Result<Option<T>, SessionError> {
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(Self::status_error(response).await);
        }
        if status != expected {
            return Ok(None);
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Turn a response with an unwanted status into an error, keeping GitHub's
    /// `message` for 4xx/5xx.
    pub(crate) async fn status_error(response: Response) -> SessionError {
        let status = response.status();
        let url = response.url().to_string();
        if !(status.is_client_error() || status.is_server_error()) {
            return SessionError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            };
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_github_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });
        SessionError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

impl AuthenticatedSession<'_> {
    pub fn session(&self) -> &GitHubSession {
        self.session
    }

    /// PUT with an optional JSON body. Without a body an explicit
    /// `Content-Length: 0` is sent.
    #[instrument(skip(self, body))]
    pub async fn put(
        &self,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Response, SessionError> {
        let request = self.session.request(Method::PUT, url);
        let request = match body {
            Some(body) => request.json(body),
            None => request.header(CONTENT_LENGTH, 0),
        };
        let response = request.send().await?;
        debug!(status = response.status().as_u16(), "PUT");
        Ok(response)
    }

    #[instrument(skip(self, body))]
    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<Response, SessionError> {
        let response = self
            .session
            .request(Method::PATCH, url)
            .json(body)
            .send()
            .await?;
        debug!(status = response.status().as_u16(), "PATCH");
        Ok(response)
    }
}

/// Join `parts` onto `base` with single slashes.
pub fn build_url(base: &str, parts: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for part in parts {
        url.push('/');
        url.push_str(part.trim_matches('/'));
    }
    url
}

fn extract_github_message(body: &str) -> Option<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return None;
    };
    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session(server: &MockServer) -> GitHubSession {
        GitHubSession::new(&server.uri(), "pullreq-tests").unwrap()
    }

    #[test]
    fn test_build_url_joins_parts() {
        assert_eq!(
            build_url("https://api.github.com/", &["repos", "o", "r", "pulls", "42"]),
            "https://api.github.com/repos/o/r/pulls/42"
        );
        assert_eq!(build_url("https://x/pulls/1", &["/merge"]), "https://x/pulls/1/merge");
    }

    #[test]
    fn test_new_rejects_bad_base() {
        assert!(matches!(
            GitHubSession::new("not a url", "ua"),
            Err(SessionError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            GitHubSession::new("ftp://example.com", "ua"),
            Err(SessionError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_authenticated_requires_token() {
        let anonymous = GitHubSession::new("https://api.github.com", "ua").unwrap();
        assert!(!anonymous.is_authenticated());
        assert!(matches!(
            anonymous.authenticated(),
            Err(SessionError::AuthenticationRequired)
        ));

        let authed = anonymous.with_token("secret");
        assert!(authed.is_authenticated());
        assert!(authed.authenticated().is_ok());
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = GitHubSession::new("https://api.github.com", "ua")
            .unwrap()
            .with_token("very-secret-token");
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("very-secret-token"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn test_from_config_uses_api_url() {
        let config: Config = toml::from_str(
            "[github]\ntoken = \"t\"\napi_url = \"https://ghe.example.com/api/v3\"\n",
        )
        .unwrap();
        let session = GitHubSession::from_config(&config).unwrap();
        assert_eq!(session.api_base(), "https://ghe.example.com/api/v3");
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_extract_github_message() {
        assert_eq!(
            extract_github_message(r#"{"message":"Not Found"}"#).as_deref(),
            Some("Not Found")
        );
        assert!(extract_github_message("<html>").is_none());
    }

    #[tokio::test]
    async fn test_requests_carry_headers_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .and(header("accept", MEDIA_TYPE))
            .and(header("user-agent", "pullreq-tests"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let session = session(&server).with_token("tok");
        let value: serde_json::Value = session
            .get_json(&session.build_url(&["ping"]))
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn test_boolean_maps_codes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/yes"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/no"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/boom"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"message": "Server Error"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let session = session(&server);
        let probe = |p: &str| session.build_url(&[p]);
        let (yes, no) = (StatusCode::NO_CONTENT, StatusCode::NOT_FOUND);

        assert!(session.boolean(&probe("yes"), yes, no).await.unwrap());
        assert!(!session.boolean(&probe("no"), yes, no).await.unwrap());
        match session.boolean(&probe("boom"), yes, no).await {
            Err(SessionError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Server Error");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert!(matches!(
            session.boolean(&probe("ok"), yes, no).await,
            Err(SessionError::UnexpectedStatus { status: 200, .. })
        ));
    }

    #[tokio::test]
    async fn test_put_without_body_sends_zero_length() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/thing"))
            .and(header("content-length", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": true})))
            .expect(1)
            .mount(&server)
            .await;

        let session = session(&server).with_token("tok");
        let auth = session.authenticated().unwrap();
        let response = auth.put(&session.build_url(&["thing"]), None).await.unwrap();
        let body: Option<serde_json::Value> =
            GitHubSession::decode_json(response, StatusCode::OK).await.unwrap();
        assert_eq!(body.unwrap()["done"], true);
    }

    #[tokio::test]
    async fn test_decode_json_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/accepted"))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({"x": 1})))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/invalid"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({"message": "Validation Failed"})),
            )
            .mount(&server)
            .await;

        let session = session(&server).with_token("tok");
        let auth = session.authenticated().unwrap();
        let body = json!({"title": "x"});

        let accepted = auth
            .patch(&session.build_url(&["accepted"]), &body)
            .await
            .unwrap();
        let decoded: Option<serde_json::Value> =
            GitHubSession::decode_json(accepted, StatusCode::OK).await.unwrap();
        assert!(decoded.is_none());

        let invalid = auth
            .patch(&session.build_url(&["invalid"]), &body)
            .await
            .unwrap();
        let err = GitHubSession::decode_json::<serde_json::Value>(invalid, StatusCode::OK)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Api { status: 422, .. }));
        assert!(err.to_string().contains("Validation Failed"));
    }
}
