//! Client configuration.
//!
//! Loaded from TOML:
//!
//! ```toml
//! client_id = "my-marketplace"
//! environment = "sandbox"
//!
//! [credentials]
//! passphrase_env = "MANGOPAY_PASSPHRASE"
//!
//! [endpoints]
//! update_hook = "/notifications/{Id}"
//!
//! [http]
//! timeout_secs = 20
//! ```
//!
//! The passphrase itself never appears in the file; only the name of the
//! environment variable holding it.

use std::{collections::BTreeMap, path::Path};

use serde::Deserialize;
use url::Url;

use crate::{
    error::{MangoError, Result},
    transport::{Credentials, HttpConfig, http::validate_url},
};

const SANDBOX_URL: &str = "https://api.sandbox.mangopay.com";
const PRODUCTION_URL: &str = "https://api.mangopay.com";

/// Target environment.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Test platform, no real money moves.
    #[default]
    Sandbox,
    /// Live platform.
    Production,
}

impl Environment {
    /// Base URL of the environment.
    #[must_use]
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_URL,
            Self::Production => PRODUCTION_URL,
        }
    }
}

/// Root client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Client identifier issued by the service.
    pub client_id: String,

    /// Target environment.
    #[serde(default)]
    pub environment: Environment,

    /// Overrides the environment's base URL.
    #[serde(default)]
    pub base_url: Option<String>,

    /// API version path segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Where to find the passphrase.
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Endpoint path overrides.
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// HTTP transport settings.
    #[serde(default)]
    pub http: HttpConfig,
}

impl ClientConfig {
    /// Creates a configuration with defaults for everything but the client id.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            environment: Environment::default(),
            base_url: None,
            api_version: default_api_version(),
            credentials: CredentialsConfig::default(),
            endpoints: EndpointConfig::default(),
            http: HttpConfig::default(),
        }
    }

    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Config`] if parsing or validation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use mangopay_client::config::{ClientConfig, Environment};
    ///
    /// let config = ClientConfig::from_toml(r#"
    ///     client_id = "my-marketplace"
    ///     environment = "production"
    /// "#).unwrap();
    ///
    /// assert_eq!(config.environment, Environment::Production);
    /// assert_eq!(config.api_root(), "https://api.mangopay.com/v2.01/my-marketplace");
    /// ```
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Config`] if the file cannot be read, parsed or
    /// validated.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MangoError::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Validates the configuration.
    ///
    /// This method checks for:
    /// - a non-empty client id made of URL-safe characters
    /// - an HTTPS base URL that is not a loopback address
    /// - an API version without slashes
    /// - a valid environment variable name for the passphrase
    /// - safe endpoint templates
    /// - HTTP timeouts within bounds
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(MangoError::Config("client_id cannot be empty".to_owned()));
        }
        if let Some(ch) =
            self.client_id.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '_')
        {
            return Err(MangoError::Config(format!(
                "client_id contains invalid character '{ch}': {}",
                self.client_id
            )));
        }

        let base_url = self.base_url();
        let url = Url::parse(base_url)
            .map_err(|e| MangoError::Config(format!("invalid base_url '{base_url}': {e}")))?;
        validate_url(&url)?;
        if url.host_str().is_some_and(|h| h.starts_with("127.")) {
            return Err(MangoError::Config(format!(
                "base_url must not be localhost or loopback: {base_url}"
            )));
        }

        if self.api_version.is_empty() || self.api_version.contains('/') {
            return Err(MangoError::Config(format!(
                "api_version must be a single path segment: '{}'",
                self.api_version
            )));
        }

        self.credentials.validate()?;
        self.endpoints.validate()?;
        self.http.validate()
    }

    /// Base URL in use: the override, or the environment's.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(self.environment.base_url())
    }

    /// URL every request path is appended to.
    #[must_use]
    pub fn api_root(&self) -> String {
        format!("{}/{}/{}", self.base_url().trim_end_matches('/'), self.api_version, self.client_id)
    }

    /// Reads the passphrase from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Config`] if the variable is unset or empty.
    pub fn load_credentials(&self) -> Result<Credentials> {
        self.credentials_with(|name| std::env::var(name).ok())
    }

    /// Builds credentials using `lookup` to resolve the passphrase variable.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Config`] if `lookup` yields nothing or an empty
    /// value.
    pub fn credentials_with(
        &self,
        lookup: impl FnOnce(&str) -> Option<String>,
    ) -> Result<Credentials> {
        let name = &self.credentials.passphrase_env;
        match lookup(name) {
            Some(passphrase) if !passphrase.is_empty() => {
                Ok(Credentials::new(self.client_id.clone(), passphrase))
            }
            _ => Err(MangoError::Config(format!("environment variable {name} is not set"))),
        }
    }
}

fn default_api_version() -> String {
    "v2.01".to_owned()
}

/// Credential lookup configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CredentialsConfig {
    /// Environment variable holding the API passphrase.
    #[serde(default = "default_passphrase_env")]
    pub passphrase_env: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self { passphrase_env: default_passphrase_env() }
    }
}

impl CredentialsConfig {
    /// Validates the environment variable name.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Config`] if the name is not a valid identifier.
    pub fn validate(&self) -> Result<()> {
        validate_env_var_name(&self.passphrase_env)
    }
}

fn default_passphrase_env() -> String {
    "MANGOPAY_PASSPHRASE".to_owned()
}

/// Validates an environment variable name.
fn validate_env_var_name(name: &str) -> Result<()> {
    let Some(first_char) = name.chars().next() else {
        return Err(MangoError::Config("environment variable name cannot be empty".to_owned()));
    };

    // Must be alphanumeric with underscores, starting with letter or underscore
    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(MangoError::Config(format!(
            "environment variable name must start with letter or underscore: {name}"
        )));
    }

    for ch in name.chars() {
        if !ch.is_ascii_alphanumeric() && ch != '_' {
            return Err(MangoError::Config(format!(
                "environment variable name contains invalid character '{ch}': {name}"
            )));
        }
    }

    Ok(())
}

/// Endpoint path overrides, keyed by action name (`fetch_hook`, ...).
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct EndpointConfig(BTreeMap<String, String>);

impl EndpointConfig {
    /// Creates an empty override set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an override, builder style.
    #[must_use]
    pub fn with(mut self, action: impl Into<String>, path: impl Into<String>) -> Self {
        self.0.insert(action.into(), path.into());
        self
    }

    /// Iterates `(action name, path template)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &String)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns true when no override is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Validates endpoint templates for security issues.
    ///
    /// Checks that endpoint templates:
    /// - Do not contain path traversal sequences (`..`, `//`)
    /// - Do not start with absolute paths on Windows (`C:`, `D:`, etc.)
    /// - Start with `/` (relative paths only)
    /// - Have balanced `{Name}` placeholders
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Config`] if any endpoint is invalid.
    pub fn validate(&self) -> Result<()> {
        for (name, path) in &self.0 {
            validate_endpoint_path(name, path)?;
        }
        Ok(())
    }
}

/// Validates an endpoint path template for security issues.
pub(crate) fn validate_endpoint_path(name: &str, path: &str) -> Result<()> {
    if path.contains("..") {
        return Err(MangoError::Config(format!(
            "endpoint '{name}' contains path traversal sequence '..': {path}"
        )));
    }

    // Double slashes can be used for path confusion
    if path.contains("//") {
        return Err(MangoError::Config(format!(
            "endpoint '{name}' contains double slash '//': {path}"
        )));
    }

    if path.len() >= 2 && path.chars().nth(1) == Some(':') {
        return Err(MangoError::Config(format!(
            "endpoint '{name}' appears to be an absolute Windows path: {path}"
        )));
    }

    if !path.starts_with('/') {
        return Err(MangoError::Config(format!("endpoint '{name}' must start with '/': {path}")));
    }

    if path.contains('?') || path.contains('#') {
        return Err(MangoError::Config(format!(
            "endpoint '{name}' must not contain a query or fragment: {path}"
        )));
    }

    if path.matches('{').count() != path.matches('}').count() {
        return Err(MangoError::Config(format!(
            "endpoint '{name}' has unbalanced placeholders: {path}"
        )));
    }

    Ok(())
}
