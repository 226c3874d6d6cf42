//! Logical failure detection.
//!
//! A transaction can travel over the network without a hitch and still be
//! rejected by the service: the response is a 2xx carrying `"Status": "FAILED"`.
//! [`detect`] turns that status into [`MangoError::TransactionFailed`] so
//! callers can tell it apart from transport errors by variant.

use crate::{
    error::MangoError,
    model::{ProcessReply, Record, TransactionStatus},
};

/// A record carrying a transaction outcome.
pub trait Settled: Record {
    /// Outcome fields of the record.
    fn reply(&self) -> &ProcessReply;

    /// Current status, if any.
    fn status(&self) -> Option<TransactionStatus> {
        self.reply().status
    }
}

/// Returns the logical failure carried by `record`, if its status is FAILED.
///
/// The message is the service's result message, or the result code when the
/// message is empty.
#[must_use]
pub fn detect<R: Settled>(record: &R) -> Option<MangoError> {
    let reply = record.reply();
    if reply.status != Some(TransactionStatus::Failed) {
        return None;
    }

    let message = if reply.result_message.is_empty() {
        format!("result code {}", reply.result_code)
    } else {
        reply.result_message.clone()
    };

    Some(MangoError::TransactionFailed { kind: R::KIND, id: reply.ident.id.clone(), message })
}
