//! Transport abstraction.
//!
//! The [`Transport`] trait is the boundary between the client core and the
//! network. The core hands it a fully rendered [`ApiRequest`] and expects a
//! [`TransportResponse`] back, or a [`TransportError`] telling network,
//! authentication and status failures apart.
//!
//! Two implementations ship with the crate:
//! - [`HttpTransport`]: reqwest based, used against the real service
//! - [`MemoryTransport`]: canned responses and request recording, for tests
//!
//! # Examples
//!
//! ```rust,no_run
//! use mangopay_client::{
//!     action::Method,
//!     transport::{ApiRequest, Credentials, HttpConfig, HttpTransport, Transport},
//! };
//!
//! # async fn example() -> mangopay_client::error::Result<()> {
//! let transport = HttpTransport::with_config(
//!     "https://api.sandbox.mangopay.com/v2.01/my-client",
//!     &HttpConfig::default(),
//! )?;
//! let credentials = Credentials::new("my-client", "passphrase");
//!
//! let response = transport
//!     .execute(ApiRequest {
//!         method: Method::Get,
//!         path: "/hooks",
//!         body: None,
//!         credentials: &credentials,
//!     })
//!     .await?;
//! println!("Status: {}", response.status);
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;

use secrecy::{ExposeSecret, SecretString};

use crate::{action::Method, error::TransportError};

pub mod config;
pub mod http;
pub mod memory;

pub use config::HttpConfig;
pub use http::HttpTransport;
pub use memory::{MemoryTransport, RecordedRequest};

/// Client credentials sent with every request.
///
/// The passphrase is never printed by `Debug`.
#[derive(Debug, Clone)]
pub struct Credentials {
    client_id: String,
    passphrase: SecretString,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(client_id: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self { client_id: client_id.into(), passphrase: SecretString::from(passphrase.into()) }
    }

    /// Client identifier.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Exposes the passphrase for authentication headers.
    #[must_use]
    pub fn passphrase(&self) -> &str {
        self.passphrase.expose_secret()
    }
}

/// A request ready to be sent.
#[derive(Debug, Clone, Copy)]
pub struct ApiRequest<'a> {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the API root, query string included.
    pub path: &'a str,
    /// JSON body, for methods that carry one.
    pub body: Option<&'a [u8]>,
    /// Credentials of the session issuing the request.
    pub credentials: &'a Credentials,
}

/// A successful response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body bytes.
    pub body: Vec<u8>,
    /// Response headers.
    pub headers: Vec<(String, String)>,
}

impl TransportResponse {
    /// Returns a header value, matching the name case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }
}

/// Sends requests to the service.
///
/// Implementations own connection handling, authentication headers, timeouts
/// and any retry policy. Each call to [`Transport::execute`] is independent.
pub trait Transport: Send + Sync {
    /// Sends one request.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Network`] when no response was received
    /// - [`TransportError::InvalidPath`] when the path is refused before sending
    /// - [`TransportError::Authentication`] when the credentials are rejected
    /// - [`TransportError::Status`] for any other non-success status
    fn execute<'a>(
        &'a self,
        request: ApiRequest<'a>,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send + 'a;

    /// Short name for logging, e.g. `"http"`.
    fn name(&self) -> &'static str;
}
