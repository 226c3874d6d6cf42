//! Hooks: URLs notified by the service when an event occurs.

use serde::{Deserialize, Serialize};

use super::{ProcessIdent, Record, nullable};
use crate::{
    action::{Action, Intent},
    bound::Bound,
    client::MangoPay,
    dispatch::PathParams,
    error::{MangoError, Result},
    fields::FieldMap,
    rate_limit::RateLimitInfo,
    transport::Transport,
};

/// Event a hook subscribes to.
///
/// Events this client has no variant for are kept verbatim in
/// [`EventType::Other`], so a fetched hook is sent back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
#[allow(missing_docs, reason = "variants are the service's event names")]
pub enum EventType {
    PayinNormalCreated,
    PayinNormalSucceeded,
    PayinNormalFailed,
    PayoutNormalCreated,
    PayoutNormalSucceeded,
    PayoutNormalFailed,
    TransferNormalCreated,
    TransferNormalSucceeded,
    TransferNormalFailed,
    PayinRefundCreated,
    PayinRefundSucceeded,
    PayinRefundFailed,
    PayoutRefundCreated,
    PayoutRefundSucceeded,
    PayoutRefundFailed,
    TransferRefundCreated,
    TransferRefundSucceeded,
    TransferRefundFailed,
    /// Any other event name, as sent by the service.
    Other(String),
}

impl EventType {
    const KNOWN: [Self; 18] = [
        Self::PayinNormalCreated,
        Self::PayinNormalSucceeded,
        Self::PayinNormalFailed,
        Self::PayoutNormalCreated,
        Self::PayoutNormalSucceeded,
        Self::PayoutNormalFailed,
        Self::TransferNormalCreated,
        Self::TransferNormalSucceeded,
        Self::TransferNormalFailed,
        Self::PayinRefundCreated,
        Self::PayinRefundSucceeded,
        Self::PayinRefundFailed,
        Self::PayoutRefundCreated,
        Self::PayoutRefundSucceeded,
        Self::PayoutRefundFailed,
        Self::TransferRefundCreated,
        Self::TransferRefundSucceeded,
        Self::TransferRefundFailed,
    ];

    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::PayinNormalCreated => "PAYIN_NORMAL_CREATED",
            Self::PayinNormalSucceeded => "PAYIN_NORMAL_SUCCEEDED",
            Self::PayinNormalFailed => "PAYIN_NORMAL_FAILED",
            Self::PayoutNormalCreated => "PAYOUT_NORMAL_CREATED",
            Self::PayoutNormalSucceeded => "PAYOUT_NORMAL_SUCCEEDED",
            Self::PayoutNormalFailed => "PAYOUT_NORMAL_FAILED",
            Self::TransferNormalCreated => "TRANSFER_NORMAL_CREATED",
            Self::TransferNormalSucceeded => "TRANSFER_NORMAL_SUCCEEDED",
            Self::TransferNormalFailed => "TRANSFER_NORMAL_FAILED",
            Self::PayinRefundCreated => "PAYIN_REFUND_CREATED",
            Self::PayinRefundSucceeded => "PAYIN_REFUND_SUCCEEDED",
            Self::PayinRefundFailed => "PAYIN_REFUND_FAILED",
            Self::PayoutRefundCreated => "PAYOUT_REFUND_CREATED",
            Self::PayoutRefundSucceeded => "PAYOUT_REFUND_SUCCEEDED",
            Self::PayoutRefundFailed => "PAYOUT_REFUND_FAILED",
            Self::TransferRefundCreated => "TRANSFER_REFUND_CREATED",
            Self::TransferRefundSucceeded => "TRANSFER_REFUND_SUCCEEDED",
            Self::TransferRefundFailed => "TRANSFER_REFUND_FAILED",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        Self::KNOWN.into_iter().find(|known| known.as_str() == name).unwrap_or(Self::Other(name))
    }
}

impl From<EventType> for String {
    fn from(event: EventType) -> Self {
        match event {
            EventType::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

/// Whether notifications are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HookStatus {
    /// Notifications are sent.
    Enabled,
    /// Notifications are suspended.
    Disabled,
}

impl HookStatus {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "ENABLED",
            Self::Disabled => "DISABLED",
        }
    }
}

/// Whether the hook URL answered the last notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Validity {
    /// The URL answered.
    Valid,
    /// The URL did not answer.
    Invalid,
}

impl Validity {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "VALID",
            Self::Invalid => "INVALID",
        }
    }
}

/// A notification endpoint for one event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Hook {
    /// Identity fields.
    #[serde(flatten)]
    pub ident: ProcessIdent,
    /// URL notified.
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    /// Subscribed event.
    pub event_type: EventType,
    /// Set by the service.
    #[serde(default)]
    pub status: Option<HookStatus>,
    /// Set by the service.
    #[serde(default)]
    pub validity: Option<Validity>,
}

impl Hook {
    /// Creates an unsaved hook.
    #[must_use]
    pub fn new(event_type: EventType, url: impl Into<String>) -> Self {
        Self {
            ident: ProcessIdent::default(),
            url: url.into(),
            event_type,
            status: None,
            validity: None,
        }
    }
}

impl Record for Hook {
    const KIND: &'static str = "hook";
    const SERVER_MANAGED: &'static [&'static str] = &["Status", "Validity", "CreationDate"];

    fn id(&self) -> &str {
        &self.ident.id
    }

    fn to_fields(&self, _intent: Intent) -> Result<FieldMap> {
        Ok(FieldMap::new()
            .with("Id", &self.ident.id)
            .with_opt("Tag", self.ident.tag.as_deref())
            .with("Url", &self.url)
            .with("EventType", self.event_type.as_str())
            .with_opt("Status", self.status.map(HookStatus::as_str))
            .with_opt("Validity", self.validity.map(Validity::as_str)))
    }
}

impl<T: Transport> MangoPay<T> {
    /// Creates an unsaved hook attached to this session.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Validation`] if `url` is empty.
    pub fn new_hook(&self, event_type: EventType, url: impl Into<String>) -> Result<Bound<Hook, T>> {
        let url = url.into();
        if url.is_empty() {
            return Err(MangoError::Validation("new hook: empty url".to_owned()));
        }
        Ok(self.bind(Hook::new(event_type, url)))
    }

    /// Fetches a hook by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Validation`] for an empty id, or any dispatch error.
    pub async fn hook(&self, id: &str) -> Result<(Bound<Hook, T>, Option<RateLimitInfo>)> {
        self.fetch(Action::FetchHook, &PathParams::id(id)).await
    }

    /// Lists all hooks of the client.
    ///
    /// # Errors
    ///
    /// Returns any dispatch error.
    pub async fn hooks(&self) -> Result<(Vec<Bound<Hook, T>>, Option<RateLimitInfo>)> {
        self.fetch_list(Action::FetchAllHooks, &PathParams::new(), None).await
    }
}

impl<T: Transport> Bound<Hook, T> {
    /// Creates the hook, or updates it once it has an identifier.
    ///
    /// On update only non-empty fields are sent, so blanking a field locally
    /// leaves it unchanged on the service.
    ///
    /// # Errors
    ///
    /// Returns any dispatch error; the hook is left untouched in that case.
    pub async fn save(&mut self) -> Result<Option<RateLimitInfo>> {
        if self.id().is_empty() {
            self.submit(Action::CreateHook, &PathParams::new()).await
        } else {
            let params = PathParams::id(self.id());
            self.submit(Action::UpdateHook, &params).await
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        action::{ActionRegistry, Method},
        fields::Sanitizer,
        transport::{Credentials, MemoryTransport},
    };

    fn service() -> MangoPay<MemoryTransport> {
        MangoPay::with_transport(
            Credentials::new("client", "secret"),
            ActionRegistry::standard(),
            MemoryTransport::new(),
        )
    }

    #[test]
    fn test_create_fields_are_event_type_and_url_only() {
        let hook = Hook::new(EventType::PayinNormalSucceeded, "https://example.test/hook");
        let fields = Sanitizer::for_record::<Hook>()
            .sanitize(hook.to_fields(Intent::Create).unwrap(), Action::CreateHook);

        assert_eq!(fields.keys().collect::<Vec<_>>(), ["EventType", "Url"]);
    }

    #[test]
    fn test_event_type_wire_names_match_serde() {
        for event in [EventType::PayinNormalSucceeded, EventType::TransferRefundFailed] {
            assert_eq!(serde_json::to_value(&event).unwrap(), json!(event.as_str()));
        }
        let known: EventType = serde_json::from_value(json!("PAYOUT_REFUND_CREATED")).unwrap();
        assert_eq!(known, EventType::PayoutRefundCreated);

        let other: EventType = serde_json::from_value(json!("KYC_SUCCEEDED")).unwrap();
        assert_eq!(other, EventType::Other("KYC_SUCCEEDED".to_owned()));
        assert_eq!(serde_json::to_value(&other).unwrap(), json!("KYC_SUCCEEDED"));
    }

    #[tokio::test]
    async fn test_update_sends_back_unlisted_event_type() {
        let service = service();
        service.transport().push_json(
            200,
            &json!({"Id": "h1", "Url": "https://example.test/a", "EventType": "KYC_SUCCEEDED", "Status": "ENABLED"}),
        );
        service.transport().push_json(
            200,
            &json!({"Id": "h1", "Url": "https://example.test/b", "EventType": "KYC_SUCCEEDED", "Status": "ENABLED"}),
        );

        let (mut hook, _) = service.hook("h1").await.unwrap();
        assert_eq!(hook.event_type.as_str(), "KYC_SUCCEEDED");
        hook.url = "https://example.test/b".to_owned();
        hook.save().await.unwrap();

        let request = &service.transport().requests()[1];
        assert_eq!(request.method, Method::Put);
        assert_eq!(
            request.json_body(),
            Some(json!({"EventType": "KYC_SUCCEEDED", "Url": "https://example.test/b"}))
        );
        assert_eq!(hook.event_type, EventType::Other("KYC_SUCCEEDED".to_owned()));
    }

    #[test]
    fn test_new_hook_rejects_empty_url() {
        let err = service().new_hook(EventType::PayinNormalSucceeded, "").unwrap_err();
        assert!(matches!(err, MangoError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_sends_only_changed_fields() {
        let service = service();
        service.transport().push_json(
            200,
            &json!({"Id": "123", "Url": "https://example.test/v2", "EventType": "PAYIN_NORMAL_SUCCEEDED", "Status": "ENABLED", "Validity": "VALID"}),
        );

        let mut hook = service.new_hook(EventType::PayinNormalSucceeded, "https://example.test/v2").unwrap();
        hook.ident.id = "123".to_owned();
        hook.status = Some(HookStatus::Enabled);
        hook.save().await.unwrap();

        let request = &service.transport().requests()[0];
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.path, "/hooks/123");
        assert_eq!(
            request.json_body(),
            Some(json!({"EventType": "PAYIN_NORMAL_SUCCEEDED", "Url": "https://example.test/v2"}))
        );
        assert_eq!(hook.validity, Some(Validity::Valid));
    }

    #[tokio::test]
    async fn test_update_with_blank_url_leaves_it_out() {
        let service = service();
        service.transport().push_json(
            200,
            &json!({"Id": "123", "Url": "https://example.test/kept", "EventType": "PAYIN_NORMAL_FAILED"}),
        );

        let mut hook = service.bind(Hook::new(EventType::PayinNormalFailed, ""));
        hook.ident.id = "123".to_owned();
        hook.save().await.unwrap();

        let body = service.transport().requests()[0].json_body().unwrap();
        assert_eq!(body, json!({"EventType": "PAYIN_NORMAL_FAILED"}));
        assert_eq!(hook.url, "https://example.test/kept");
    }

    #[tokio::test]
    async fn test_fetch_hook() {
        let service = service();
        service.transport().push_json(
            200,
            &json!({"Id": "55", "Tag": null, "CreationDate": 1700000000, "Url": "https://example.test", "EventType": "PAYOUT_NORMAL_FAILED", "Status": "DISABLED", "Validity": "INVALID"}),
        );

        let (hook, rate_limit) = service.hook("55").await.unwrap();

        assert_eq!(hook.id(), "55");
        assert_eq!(hook.status, Some(HookStatus::Disabled));
        assert!(rate_limit.is_none());
        assert!(hook.service().same_session(&service));
        assert_eq!(service.transport().requests()[0].path, "/hooks/55");
    }

    #[tokio::test]
    async fn test_fetch_hook_with_empty_id_sends_nothing() {
        let service = service();
        assert!(matches!(service.hook("").await, Err(MangoError::Validation(_))));
        assert_eq!(service.transport().calls(), 0);
    }

    #[tokio::test]
    async fn test_list_hooks() {
        let service = service();
        service.transport().push_json(
            200,
            &json!([
                {"Id": "1", "Url": "https://example.test/a", "EventType": "PAYIN_NORMAL_CREATED"},
                {"Id": "2", "Url": "https://example.test/b", "EventType": "PAYIN_NORMAL_FAILED"}
            ]),
        );

        let (hooks, _) = service.hooks().await.unwrap();

        assert_eq!(hooks.iter().map(|h| h.id()).collect::<Vec<_>>(), ["1", "2"]);
        assert!(hooks.iter().all(|h| h.service().same_session(&service)));
        assert_eq!(service.transport().requests()[0].path, "/hooks");
    }
}
