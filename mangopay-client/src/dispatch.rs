//! Generic request dispatcher.
//!
//! [`Dispatcher::dispatch`] is the single entry point every binding goes
//! through: resolve the action, render the path, encode the field map, call
//! the transport once, decode the body into the requested type and pick up
//! rate-limit metadata.
//!
//! The dispatcher keeps no state between calls and never retries.

use serde::de::DeserializeOwned;
use tracing::{Span, debug, instrument};
use url::form_urlencoded;

use crate::{
    action::{Action, ActionRegistry, ResponseShape},
    error::{MangoError, Result},
    fields::FieldMap,
    rate_limit::RateLimitInfo,
    transport::{ApiRequest, Credentials, Transport},
};

/// Values for the `{Name}` placeholders of a path template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(&'static str, String)>);

impl PathParams {
    /// Creates an empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single `{Id}` parameter.
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::new().with("Id", id)
    }

    /// Adds a parameter, builder style.
    #[must_use]
    pub fn with(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.0.push((name, value.into()));
        self
    }

    /// Returns the value of a parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(n, _)| *n == name).map(|(_, v)| v.as_str())
    }
}

/// A decoded response together with its rate-limit metadata.
#[derive(Debug, Clone)]
pub struct Dispatched<D> {
    /// Decoded response body.
    pub value: D,
    /// Rate-limit metadata, when the response carried any.
    pub rate_limit: Option<RateLimitInfo>,
}

/// Turns actions and field maps into transport calls.
#[derive(Debug)]
pub struct Dispatcher<T> {
    registry: ActionRegistry,
    transport: T,
    credentials: Credentials,
}

impl<T: Transport> Dispatcher<T> {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(registry: ActionRegistry, transport: T, credentials: Credentials) -> Self {
        Self { registry, transport, credentials }
    }

    /// Action table in use.
    #[must_use]
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Credentials sent with every request.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Executes `action` and decodes the response into `D`.
    ///
    /// For methods with a body, `fields` is sent as a JSON object (an empty
    /// object when `None`). For body-less methods, `fields` becomes the query
    /// string.
    ///
    /// # Errors
    ///
    /// - [`MangoError::Validation`] if a path parameter is missing or empty
    ///   (nothing is sent)
    /// - [`MangoError::Transport`] exactly as reported by the transport
    /// - [`MangoError::Serialization`] if the body does not decode into `D`
    ///
    /// # Panics
    ///
    /// Panics if `action` has no endpoint in the registry.
    #[instrument(
        skip(self, params, fields),
        fields(action = %action, transport = self.transport.name(), method, path)
    )]
    pub async fn dispatch<D: DeserializeOwned>(
        &self,
        action: Action,
        params: &PathParams,
        fields: Option<FieldMap>,
    ) -> Result<Dispatched<D>> {
        let endpoint = self.registry.resolve(action);
        let mut path = endpoint.render(params)?;

        let body = if endpoint.method.has_body() {
            Some(serde_json::to_vec(&fields.unwrap_or_default())?)
        } else {
            if let Some(fields) = fields.filter(|f| !f.is_empty()) {
                append_query(&mut path, &fields);
            }
            None
        };

        let span = Span::current();
        span.record("method", endpoint.method.as_str());
        span.record("path", path.as_str());

        let request = ApiRequest {
            method: endpoint.method,
            path: &path,
            body: body.as_deref(),
            credentials: &self.credentials,
        };
        let response = self.transport.execute(request).await?;
        debug!(status = response.status, bytes = response.body.len(), "response received");

        let value = serde_json::from_slice::<D>(&response.body).map_err(|e| {
            let expected = match endpoint.shape {
                ResponseShape::Single => "an object",
                ResponseShape::List => "a list",
            };
            MangoError::Serialization(format!("{action} response is not {expected} of the expected type: {e}"))
        })?;
        let rate_limit = RateLimitInfo::from_headers(&response.headers);

        Ok(Dispatched { value, rate_limit })
    }
}

fn append_query(path: &mut String, fields: &FieldMap) {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (name, value) in fields {
        if let Some(value) = value.to_query_value() {
            query.append_pair(name, &value);
        }
    }
    let query = query.finish();
    if !query.is_empty() {
        path.push('?');
        path.push_str(&query);
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::{
        action::Method,
        error::TransportError,
        transport::{MemoryTransport, TransportResponse},
    };

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Item {
        id: String,
    }

    fn dispatcher(transport: MemoryTransport) -> Dispatcher<MemoryTransport> {
        Dispatcher::new(ActionRegistry::standard(), transport, Credentials::new("client", "secret"))
    }

    #[tokio::test]
    async fn test_post_sends_fields_as_body() {
        let transport = MemoryTransport::new();
        transport.push_json(200, &json!({"Id": "7"}));
        let dispatcher = dispatcher(transport);

        let fields = FieldMap::new().with("Url", "https://example.test/hook");
        let out: Dispatched<Item> =
            dispatcher.dispatch(Action::CreateHook, &PathParams::new(), Some(fields)).await.unwrap();

        assert_eq!(out.value.id, "7");
        let requests = dispatcher.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].path, "/hooks");
        assert_eq!(requests[0].json_body(), Some(json!({"Url": "https://example.test/hook"})));
    }

    #[tokio::test]
    async fn test_put_without_fields_sends_empty_object() {
        let transport = MemoryTransport::new();
        transport.push_json(200, &json!({"Id": "7"}));
        let dispatcher = dispatcher(transport);

        let _: Dispatched<Item> =
            dispatcher.dispatch(Action::UpdateHook, &PathParams::id("7"), None).await.unwrap();

        let requests = dispatcher.transport().requests();
        assert_eq!(requests[0].path, "/hooks/7");
        assert_eq!(requests[0].json_body(), Some(json!({})));
    }

    #[tokio::test]
    async fn test_get_sends_fields_as_query() {
        let transport = MemoryTransport::new();
        transport.push_json(200, &json!([]));
        let dispatcher = dispatcher(transport);

        let fields = FieldMap::new().with("Status", "SUCCEEDED").with("Per_Page", 50_i64);
        let out: Dispatched<Vec<Item>> = dispatcher
            .dispatch(Action::FetchUserTransactions, &PathParams::id("12"), Some(fields))
            .await
            .unwrap();

        assert!(out.value.is_empty());
        let requests = dispatcher.transport().requests();
        assert_eq!(requests[0].path, "/users/12/transactions?Per_Page=50&Status=SUCCEEDED");
        assert!(requests[0].body.is_none());
    }

    #[tokio::test]
    async fn test_missing_parameter_never_reaches_transport() {
        let dispatcher = dispatcher(MemoryTransport::new());

        let err = dispatcher
            .dispatch::<Item>(Action::FetchHook, &PathParams::id(""), None)
            .await
            .unwrap_err();

        assert!(matches!(err, MangoError::Validation(_)));
        assert_eq!(dispatcher.transport().calls(), 0);
    }

    #[tokio::test]
    async fn test_transport_error_is_returned_unchanged() {
        let transport = MemoryTransport::new();
        transport.push_error(TransportError::Authentication {
            status: 401,
            message: "invalid_client".into(),
        });
        let dispatcher = dispatcher(transport);

        let err = dispatcher
            .dispatch::<Item>(Action::FetchHook, &PathParams::id("1"), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            MangoError::Transport(TransportError::Authentication { status: 401, .. })
        ));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_serialization_error() {
        let transport = MemoryTransport::new();
        transport.push(TransportResponse { status: 200, body: b"<html>".to_vec(), headers: vec![] });
        let dispatcher = dispatcher(transport);

        let err = dispatcher
            .dispatch::<Item>(Action::FetchHook, &PathParams::id("1"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, MangoError::Serialization(msg) if msg.contains("fetch_hook")));
    }

    #[tokio::test]
    async fn test_rate_limit_headers_are_extracted() {
        let transport = MemoryTransport::new();
        transport.push(TransportResponse {
            status: 200,
            body: br#"{"Id":"1"}"#.to_vec(),
            headers: vec![
                ("x-ratelimit-limit".into(), "2300".into()),
                ("x-ratelimit-remaining".into(), "2299".into()),
                ("x-ratelimit-reset".into(), "1700000900".into()),
            ],
        });
        let dispatcher = dispatcher(transport);

        let out = dispatcher
            .dispatch::<Item>(Action::FetchHook, &PathParams::id("1"), None)
            .await
            .unwrap();

        let info = out.rate_limit.expect("rate limit headers present");
        assert_eq!(info.windows()[0].remaining, 2299);
    }

    #[tokio::test]
    async fn test_no_rate_limit_headers() {
        let transport = MemoryTransport::new();
        transport.push_json(200, &json!({"Id": "1"}));
        let dispatcher = dispatcher(transport);

        let out = dispatcher
            .dispatch::<Item>(Action::FetchHook, &PathParams::id("1"), None)
            .await
            .unwrap();
        assert!(out.rate_limit.is_none());
    }

    #[test]
    fn test_path_params() {
        let params = PathParams::id("9").with("UserId", "3");
        assert_eq!(params.get("Id"), Some("9"));
        assert_eq!(params.get("UserId"), Some("3"));
        assert_eq!(params.get("Type"), None);
    }
}
