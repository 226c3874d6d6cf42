//! Refunds of pay-ins and transfers.
//!
//! Refunds are created from their parent transaction
//! ([`Bound::<Transfer>::refund`](crate::bound::Bound),
//! [`Bound::<Transaction>::refund`](crate::bound::Bound)) and can be fetched
//! afterwards. The parent must have SUCCEEDED; that rule is enforced by the
//! service, not here.

use serde::{Deserialize, Serialize};

use super::{Money, ProcessReply, Record, TransactionType, nullable};
use crate::{
    action::{Action, Intent},
    bound::Bound,
    client::MangoPay,
    dispatch::PathParams,
    error::{MangoError, Result},
    fields::FieldMap,
    outcome::{Settled, detect},
    rate_limit::RateLimitInfo,
    transport::Transport,
};

/// What a refund reverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefundKind {
    /// A wallet-to-wallet transfer.
    Transfer,
    /// A pay-in.
    PayIn,
}

impl RefundKind {
    /// Action creating a refund of this kind.
    #[must_use]
    pub const fn action(self) -> Action {
        match self {
            Self::Transfer => Action::CreateTransferRefund,
            Self::PayIn => Action::CreatePayInRefund,
        }
    }
}

/// Why the service issued or rejected a refund.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundReason {
    /// Reason code, e.g. `INITIALIZED_BY_CLIENT`.
    #[serde(rename = "RefundReasonType", default, deserialize_with = "nullable")]
    pub reason_type: String,
    /// Free-form explanation.
    #[serde(rename = "RefundReasonMessage", default, deserialize_with = "nullable")]
    pub message: String,
}

/// A refund.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Refund {
    /// Identity and outcome fields.
    #[serde(flatten)]
    pub reply: ProcessReply,
    /// User requesting the refund.
    #[serde(default, deserialize_with = "nullable")]
    pub author_id: String,
    /// Amount refunded. Zero before creation means "everything".
    #[serde(default, deserialize_with = "nullable")]
    pub debited_funds: Money,
    /// Fees refunded.
    #[serde(default, deserialize_with = "nullable")]
    pub fees: Money,
    /// Amount credited back.
    #[serde(default, deserialize_with = "nullable")]
    pub credited_funds: Money,
    /// Wallet debited by the refund.
    #[serde(default, deserialize_with = "nullable")]
    pub debited_wallet_id: String,
    /// Wallet credited by the refund.
    #[serde(default, deserialize_with = "nullable")]
    pub credited_wallet_id: String,
    /// Owner of the credited wallet.
    #[serde(default, deserialize_with = "nullable")]
    pub credited_user_id: String,
    /// Refunded transaction.
    #[serde(default, deserialize_with = "nullable")]
    pub initial_transaction_id: String,
    /// Type of the refunded transaction.
    #[serde(default)]
    pub initial_transaction_type: Option<TransactionType>,
    /// Reason given by the service.
    #[serde(default)]
    pub refund_reason: Option<RefundReason>,
}

impl Refund {
    /// Refund of the whole parent amount.
    #[must_use]
    pub fn full(author_id: &str) -> Self {
        Self { author_id: author_id.to_owned(), ..Self::default() }
    }

    /// Refund of part of a pay-in.
    #[must_use]
    pub fn partial(author_id: &str, amount: Money, fees: Money) -> Self {
        Self { author_id: author_id.to_owned(), debited_funds: amount, fees, ..Self::default() }
    }

    /// Kind of the refunded transaction, once known.
    #[must_use]
    pub fn kind(&self) -> Option<RefundKind> {
        self.initial_transaction_type.and_then(TransactionType::refund_kind)
    }
}

impl Record for Refund {
    const KIND: &'static str = "refund";
    const SERVER_MANAGED: &'static [&'static str] = &[
        "Status",
        "ResultCode",
        "ResultMessage",
        "CreationDate",
        "ExecutionDate",
        "CreditedFunds",
        "CreditedUserId",
        "CreditedWalletId",
        "DebitedWalletId",
        "InitialTransactionId",
        "InitialTransactionType",
        "RefundReason",
    ];

    fn id(&self) -> &str {
        &self.reply.ident.id
    }

    fn to_fields(&self, _intent: Intent) -> Result<FieldMap> {
        let fields = FieldMap::new()
            .with("Id", &self.reply.ident.id)
            .with_opt("Tag", self.reply.ident.tag.as_deref())
            .with("AuthorId", &self.author_id);

        if self.debited_funds.is_zero() {
            return Ok(fields);
        }
        Ok(fields.with("DebitedFunds", &self.debited_funds).with("Fees", &self.fees))
    }

    fn failure(&self) -> Option<MangoError> {
        detect(self)
    }
}

impl Settled for Refund {
    fn reply(&self) -> &ProcessReply {
        &self.reply
    }
}

impl<T: Transport> MangoPay<T> {
    /// Fetches a refund by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Validation`] for an empty id, or any dispatch error.
    pub async fn refund(&self, id: &str) -> Result<(Bound<Refund, T>, Option<RateLimitInfo>)> {
        self.fetch(Action::FetchRefund, &PathParams::id(id)).await
    }
}

impl<T: Transport> Bound<Refund, T> {
    /// Creates the refund against the parent transaction `parent_id`.
    pub(crate) async fn submit_for(
        &mut self,
        kind: RefundKind,
        parent_id: &str,
    ) -> Result<Option<RateLimitInfo>> {
        self.submit(kind.action(), &PathParams::id(parent_id)).await
    }
}
