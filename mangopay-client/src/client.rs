//! Service handle.
//!
//! [`MangoPay`] identifies one configured account: credentials, action table
//! and transport. It is a cheap handle around an [`Arc`]; clones share the
//! same session, and every [`Bound`] object keeps one.

use std::{fmt, path::Path, sync::Arc};

use serde::de::DeserializeOwned;
use tracing::info;

use crate::{
    action::{Action, ActionRegistry},
    bound::Bound,
    config::ClientConfig,
    dispatch::{Dispatched, Dispatcher, PathParams},
    error::Result,
    fields::FieldMap,
    model::Record,
    rate_limit::RateLimitInfo,
    transport::{Credentials, HttpTransport, Transport},
};

/// Handle to a client session.
///
/// # Examples
///
/// ```rust,no_run
/// use mangopay_client::{MangoPay, model::EventType};
///
/// # async fn example() -> mangopay_client::Result<()> {
/// let service = MangoPay::from_file("mangopay.toml")?;
///
/// let mut hook = service.new_hook(EventType::PayinNormalSucceeded, "https://example.com/hooks")?;
/// hook.save().await?;
/// println!("hook {} is {:?}", hook.id(), hook.status);
/// # Ok(())
/// # }
/// ```
pub struct MangoPay<T = HttpTransport> {
    inner: Arc<Dispatcher<T>>,
}

impl<T> Clone for MangoPay<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: Transport> fmt::Debug for MangoPay<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MangoPay").field("client_id", &self.inner.credentials().client_id()).finish()
    }
}

impl MangoPay<HttpTransport> {
    /// Creates a session from configuration, reading the passphrase from the
    /// configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Config`](crate::MangoError::Config) if the
    /// configuration is invalid or the passphrase is not set.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let credentials = config.load_credentials()?;
        Self::with_credentials(config, credentials)
    }

    /// Creates a session from configuration and explicit credentials.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Config`](crate::MangoError::Config) if the
    /// configuration is invalid.
    pub fn with_credentials(config: &ClientConfig, credentials: Credentials) -> Result<Self> {
        config.validate()?;
        let registry = ActionRegistry::standard().with_overrides(&config.endpoints)?;
        let transport = HttpTransport::with_config(&config.api_root(), &config.http)?;
        info!(
            client_id = credentials.client_id(),
            environment = ?config.environment,
            overrides = config.endpoints.iter().count(),
            "mangopay session created"
        );
        Ok(Self::with_transport(credentials, registry, transport))
    }

    /// Creates a session from a TOML configuration string.
    ///
    /// # Errors
    ///
    /// Returns error if TOML parsing, validation or credential lookup fails.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Self::from_config(&ClientConfig::from_toml(toml_str)?)
    }

    /// Creates a session from a configuration file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, or if parsing, validation or
    /// credential lookup fails.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_config(&ClientConfig::from_file(path)?)
    }
}

impl<T: Transport> MangoPay<T> {
    /// Creates a session over any transport.
    #[must_use]
    pub fn with_transport(credentials: Credentials, registry: ActionRegistry, transport: T) -> Self {
        Self { inner: Arc::new(Dispatcher::new(registry, transport, credentials)) }
    }

    /// Client identifier of this session.
    #[must_use]
    pub fn client_id(&self) -> &str {
        self.inner.credentials().client_id()
    }

    /// Dispatcher used for every request of this session.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.inner
    }

    /// Transport used for every request of this session.
    #[must_use]
    pub fn transport(&self) -> &T {
        self.inner.transport()
    }

    /// Returns true when both handles refer to the same session.
    #[must_use]
    pub fn same_session(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Attaches a record to this session.
    pub(crate) fn bind<R>(&self, record: R) -> Bound<R, T> {
        Bound::new(self.clone(), record)
    }

    pub(crate) async fn request<D: DeserializeOwned>(
        &self,
        action: Action,
        params: &PathParams,
        fields: Option<FieldMap>,
    ) -> Result<Dispatched<D>> {
        self.inner.dispatch(action, params, fields).await
    }

    /// Fetches one record.
    pub(crate) async fn fetch<R: Record>(
        &self,
        action: Action,
        params: &PathParams,
    ) -> Result<(Bound<R, T>, Option<RateLimitInfo>)> {
        let Dispatched { value, rate_limit } = self.request::<R>(action, params, None).await?;
        Ok((self.bind(value), rate_limit))
    }

    /// Fetches a list of records, each attached to this session.
    pub(crate) async fn fetch_list<R: Record>(
        &self,
        action: Action,
        params: &PathParams,
        query: Option<FieldMap>,
    ) -> Result<(Vec<Bound<R, T>>, Option<RateLimitInfo>)> {
        let Dispatched { value, rate_limit } = self.request::<Vec<R>>(action, params, query).await?;
        Ok((value.into_iter().map(|record| self.bind(record)).collect(), rate_limit))
    }
}
