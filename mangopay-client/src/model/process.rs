//! Fields shared by every record and by every transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::nullable;

/// Outcome of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    /// Accepted, not yet executed.
    Created,
    /// Executed.
    Succeeded,
    /// Rejected; see the result message.
    Failed,
}

impl TransactionStatus {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        }
    }
}

/// Identity fields of every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessIdent {
    /// Identifier, empty until created.
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,
    /// Free-form caller data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Creation time as a Unix timestamp, 0 until created.
    #[serde(default, deserialize_with = "nullable")]
    pub creation_date: i64,
}

impl ProcessIdent {
    /// Creation time, when set.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        (self.creation_date != 0).then(|| DateTime::from_timestamp(self.creation_date, 0)).flatten()
    }
}

/// Identity and outcome fields of every transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessReply {
    /// Identity fields.
    #[serde(flatten)]
    pub ident: ProcessIdent,
    /// Outcome, absent before submission.
    #[serde(default)]
    pub status: Option<TransactionStatus>,
    /// Service result code (`000000` on success).
    #[serde(default, deserialize_with = "nullable")]
    pub result_code: String,
    /// Human-readable result.
    #[serde(default, deserialize_with = "nullable")]
    pub result_message: String,
    /// Execution time as a Unix timestamp.
    #[serde(default)]
    pub execution_date: Option<i64>,
}

impl ProcessReply {
    /// Execution time, when executed.
    #[must_use]
    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        self.execution_date.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_from_service_json() {
        let reply: ProcessReply = serde_json::from_str(
            r#"{
                "Id": "8494514",
                "Tag": null,
                "CreationDate": 1700000000,
                "Status": "FAILED",
                "ResultCode": "001001",
                "ResultMessage": "insufficient funds",
                "ExecutionDate": null
            }"#,
        )
        .unwrap();

        assert_eq!(reply.ident.id, "8494514");
        assert_eq!(reply.ident.tag, None);
        assert_eq!(reply.status, Some(TransactionStatus::Failed));
        assert_eq!(reply.result_message, "insufficient funds");
        assert_eq!(reply.execution_date, None);
        assert_eq!(reply.ident.created_at(), DateTime::from_timestamp(1_700_000_000, 0));
    }

    #[test]
    fn test_unset_reply() {
        let reply = ProcessReply::default();
        assert!(reply.ident.created_at().is_none());
        assert!(reply.executed_at().is_none());
        assert!(reply.status.is_none());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&TransactionStatus::Succeeded).unwrap(), "\"SUCCEEDED\"");
        assert_eq!(TransactionStatus::Created.as_str(), "CREATED");
    }
}
