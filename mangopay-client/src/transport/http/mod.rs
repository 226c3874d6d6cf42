//! HTTP transport implementation.
//!
//! Sends requests with reqwest, authenticating every call with HTTP basic
//! auth (client id and passphrase).

use std::collections::BTreeMap;

use reqwest::{Client, header};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::config::{HttpConfig, HttpVersion};
use crate::{
    action::Method,
    error::{MangoError, Result, TransportError},
    transport::{ApiRequest, Transport, TransportResponse},
};

/// Validates URL for security constraints.
///
/// Ensures the URL uses HTTPS and does not point to localhost.
pub(crate) fn validate_url(url: &Url) -> Result<()> {
    if url.scheme() != "https" {
        return Err(MangoError::Config("Only HTTPS URLs are allowed".to_owned()));
    }

    if let Some(host) = url.host_str()
        && (host == "localhost" || host == "127.0.0.1" || host == "::1" || host == "[::1]")
    {
        return Err(MangoError::Config("Localhost URLs are not allowed".to_owned()));
    }

    if url.host_str().is_none() {
        return Err(MangoError::Config(format!("URL missing host: {url}")));
    }

    Ok(())
}

/// Rejects request paths with traversal sequences.
///
/// Only the part before the query string is checked; query values are
/// already form-encoded.
fn sanitize_path(path: &str) -> std::result::Result<&str, TransportError> {
    let route = path.split_once('?').map_or(path, |(route, _)| route);
    if route.contains("..") || route.contains("//") {
        return Err(TransportError::InvalidPath(format!("traversal sequences not allowed: {path}")));
    }
    if !route.starts_with('/') {
        return Err(TransportError::InvalidPath(format!("path must start with '/': {path}")));
    }
    Ok(path)
}

/// Error document returned by the service on non-success statuses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "Type")]
    error_type: Option<String>,
    #[serde(default, rename = "errors")]
    errors: BTreeMap<String, String>,
}

/// Maps a non-success response to a [`TransportError`].
///
/// The service message is kept verbatim. When the body is not a MangoPay
/// error document the raw body text is used instead.
fn status_error(status: u16, body: &[u8]) -> TransportError {
    let parsed = serde_json::from_slice::<ErrorBody>(body).unwrap_or_default();
    if !parsed.errors.is_empty() {
        debug!(status, errors = ?parsed.errors, "field errors reported by service");
    }
    let message = parsed
        .message
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_owned());

    match status {
        401 | 403 => TransportError::Authentication { status, message },
        _ => TransportError::Status { status, message, error_type: parsed.error_type },
    }
}

const fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// HTTP/1.1 and HTTP/2 transport using reqwest.
///
/// Supports automatic connection pooling, keep-alive, and HTTP/2 multiplexing.
///
/// # Examples
///
/// ```rust,no_run
/// use mangopay_client::transport::{HttpConfig, HttpTransport};
///
/// let transport = HttpTransport::with_config(
///     "https://api.sandbox.mangopay.com/v2.01/my-client",
///     &HttpConfig::default(),
/// )
/// .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    api_root: String,
    http_version: HttpVersion,
}

impl HttpTransport {
    /// Creates a transport with default HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns error if `api_root` is not an HTTPS URL or the client cannot
    /// be built.
    pub fn new(api_root: &str) -> Result<Self> {
        Self::with_config(api_root, &HttpConfig::default())
    }

    /// Creates HTTP transport with custom configuration.
    ///
    /// `api_root` is the URL every request path is appended to, e.g.
    /// `https://api.mangopay.com/v2.01/my-client`.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration or `api_root` is invalid, or if the
    /// HTTP client cannot be built.
    pub fn with_config(api_root: &str, config: &HttpConfig) -> Result<Self> {
        config.validate()?;

        let url = Url::parse(api_root)
            .map_err(|e| MangoError::Config(format!("invalid api root '{api_root}': {e}")))?;
        validate_url(&url)?;

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let mut builder = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.as_str())
            .default_headers(headers);

        builder = match config.http_version {
            HttpVersion::Http1 => builder.http1_only(),
            HttpVersion::Http2 => builder.http2_prior_knowledge(),
            HttpVersion::Auto => builder,
        };

        let client = builder.build()?;

        Ok(Self {
            client,
            api_root: api_root.trim_end_matches('/').to_owned(),
            http_version: config.http_version,
        })
    }

    /// URL prefix of every request.
    #[must_use]
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    #[instrument(
        skip(self, request),
        fields(method = %request.method, path = request.path, client_id = request.credentials.client_id())
    )]
    async fn send(
        &self,
        request: ApiRequest<'_>,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let path = sanitize_path(request.path)?;
        let full_url = format!("{}{path}", self.api_root);

        let mut builder = self
            .client
            .request(reqwest_method(request.method), &full_url)
            .basic_auth(request.credentials.client_id(), Some(request.credentials.passphrase()));

        if let Some(body) = request.body {
            builder = builder.header(header::CONTENT_TYPE, "application/json").body(body.to_vec());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_owned()))
            .collect();

        let body = response.bytes().await?.to_vec();
        debug!(status, bytes = body.len(), "response received");

        if !(200..300).contains(&status) {
            return Err(status_error(status, &body));
        }

        Ok(TransportResponse { status, body, headers })
    }
}

impl Transport for HttpTransport {
    async fn execute<'a>(
        &'a self,
        request: ApiRequest<'a>,
    ) -> std::result::Result<TransportResponse, TransportError> {
        self.send(request).await
    }

    fn name(&self) -> &'static str {
        match self.http_version {
            HttpVersion::Http1 => "http/1.1",
            HttpVersion::Http2 => "http/2",
            HttpVersion::Auto => "http",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Credentials;

    const ROOT: &str = "https://api.sandbox.mangopay.com/v2.01/client";

    #[test]
    fn test_http_transport_with_config() {
        let config = HttpConfig { http_version: HttpVersion::Http2, ..HttpConfig::default() };
        let transport = HttpTransport::with_config(ROOT, &config).unwrap();
        assert_eq!(transport.name(), "http/2");
        assert_eq!(transport.api_root(), ROOT);
    }

    #[test]
    fn test_http_transport_name() {
        let http1 = HttpConfig { http_version: HttpVersion::Http1, ..HttpConfig::default() };
        assert_eq!(HttpTransport::with_config(ROOT, &http1).unwrap().name(), "http/1.1");
        assert_eq!(HttpTransport::new(ROOT).unwrap().name(), "http");
    }

    #[test]
    fn test_http_transport_trims_trailing_slash() {
        let transport = HttpTransport::new("https://api.mangopay.com/v2.01/client/").unwrap();
        assert_eq!(transport.api_root(), "https://api.mangopay.com/v2.01/client");
    }

    #[test]
    fn test_http_transport_rejects_plain_http() {
        let err = HttpTransport::new("http://api.mangopay.com/v2.01/client").unwrap_err();
        assert!(matches!(err, MangoError::Config(_)));
    }

    #[test]
    fn test_http_transport_rejects_localhost() {
        assert!(HttpTransport::new("https://localhost/v2.01/client").is_err());
        assert!(HttpTransport::new("https://127.0.0.1/v2.01/client").is_err());
    }

    #[test]
    fn test_http_transport_rejects_invalid_url() {
        assert!(matches!(HttpTransport::new("not-a-url"), Err(MangoError::Config(_))));
    }

    #[test]
    fn test_http_transport_rejects_invalid_config() {
        let config = HttpConfig { timeout_secs: 0, ..HttpConfig::default() };
        assert!(HttpTransport::with_config(ROOT, &config).is_err());
    }

    #[test]
    fn test_sanitize_path() {
        assert!(sanitize_path("/hooks/1").is_ok());
        assert!(sanitize_path("/users/1/transactions?Status=FAILED&Tag=a..b").is_ok());
        assert!(sanitize_path("/hooks/../users").is_err());
        assert!(sanitize_path("//hooks").is_err());
        assert!(matches!(sanitize_path("hooks"), Err(TransportError::InvalidPath(_))));
    }

    #[test]
    fn test_status_error_parses_service_body() {
        let body = br#"{"Message":"original transaction must have a SUCCEEDED Status","Type":"param_error","errors":{"Id":"invalid"}}"#;
        let err = status_error(400, body);
        match err {
            TransportError::Status { status, message, error_type } => {
                assert_eq!(status, 400);
                assert_eq!(message, "original transaction must have a SUCCEEDED Status");
                assert_eq!(error_type.as_deref(), Some("param_error"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_status_error_authentication() {
        let err = status_error(401, br#"{"Message":"invalid_client"}"#);
        assert!(matches!(
            err,
            TransportError::Authentication { status: 401, ref message } if message == "invalid_client"
        ));
    }

    #[test]
    fn test_status_error_raw_body() {
        let err = status_error(502, b"Bad Gateway\n");
        assert!(matches!(
            err,
            TransportError::Status { status: 502, ref message, error_type: None } if message == "Bad Gateway"
        ));
    }

    #[tokio::test]
    async fn test_execute_rejects_traversal_before_sending() {
        let transport = HttpTransport::new(ROOT).unwrap();
        let credentials = Credentials::new("client", "secret");
        let request = ApiRequest {
            method: Method::Get,
            path: "/hooks/../../admin",
            body: None,
            credentials: &credentials,
        };

        let err = transport.execute(request).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidPath(msg) if msg.contains("traversal")));
    }
}
