//! Domain records.
//!
//! A record is the server-state half of a domain object: plain data that is
//! serialized into a field map on save and replaced wholesale by the service
//! response. The session half lives in [`Bound`](crate::bound::Bound).

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};

use crate::{
    action::Intent,
    error::{MangoError, Result},
    fields::FieldMap,
};

pub mod bank_account;
pub mod hook;
pub mod money;
pub mod process;
pub mod refund;
pub mod transaction;
pub mod transfer;
pub mod user;
pub mod wallet;

pub use bank_account::{Address, BankAccount, BankAccountType};
pub use hook::{EventType, Hook, HookStatus, Validity};
pub use money::Money;
pub use process::{ProcessIdent, ProcessReply, TransactionStatus};
pub use refund::{Refund, RefundKind, RefundReason};
pub use transaction::{Transaction, TransactionFilter, TransactionType};
pub use transfer::Transfer;
pub use user::{Consumer, UserRef};
pub use wallet::Wallet;

/// Server-state record of a domain object.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Lowercase kind used in error messages (`transfer`, `hook`...).
    const KIND: &'static str;

    /// Fields computed by the service, never sent.
    const SERVER_MANAGED: &'static [&'static str];

    /// Identifier assigned by the service, empty before creation.
    fn id(&self) -> &str;

    /// Builds the field map sent for an action of the given intent.
    ///
    /// Every record of this crate builds its map explicitly. The default is
    /// a fallback for records defined by callers: it goes through the
    /// record's JSON form, so integral floats and zero values are left for
    /// the sanitizer to clean up before sending.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Serialization`] if the record does not
    /// serialize to a JSON object.
    fn to_fields(&self, intent: Intent) -> Result<FieldMap> {
        let _ = intent;
        FieldMap::from_serialize(self)
    }

    /// Business-level failure carried by the record, if any.
    fn failure(&self) -> Option<MangoError> {
        None
    }
}

/// Deserializes `null` as the type's default value.
///
/// The service sends `null` for unset strings and amounts.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{action::Action, fields::Sanitizer};

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Mandate {
        id: String,
        scheduled_at: f64,
        reference: String,
        status: String,
    }

    impl Record for Mandate {
        const KIND: &'static str = "mandate";
        const SERVER_MANAGED: &'static [&'static str] = &["Status"];

        fn id(&self) -> &str {
            &self.id
        }
    }

    #[test]
    fn test_default_fields_are_cleaned_by_sanitizer() {
        let mandate = Mandate {
            id: "m1".to_owned(),
            scheduled_at: 1_700_000_000.0,
            reference: String::new(),
            status: "ACTIVE".to_owned(),
        };

        let fields = mandate.to_fields(Intent::Update).unwrap();
        assert_eq!(fields.len(), 4);
        let fields = Sanitizer::for_record::<Mandate>().sanitize(fields, Action::UpdateHook);

        assert_eq!(serde_json::to_value(&fields).unwrap(), json!({"ScheduledAt": 1_700_000_000_i64}));
    }

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "nullable")]
        name: String,
        #[serde(default, deserialize_with = "nullable")]
        count: i64,
    }

    #[test]
    fn test_nullable_fields() {
        let sample: Sample = serde_json::from_str(r#"{"name": null, "count": null}"#).unwrap();
        assert_eq!(sample.name, "");
        assert_eq!(sample.count, 0);

        let sample: Sample = serde_json::from_str("{}").unwrap();
        assert_eq!(sample.name, "");

        let sample: Sample = serde_json::from_str(r#"{"name": "x", "count": 3}"#).unwrap();
        assert_eq!((sample.name.as_str(), sample.count), ("x", 3));
    }
}
