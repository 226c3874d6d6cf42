//! Transactions: the read-only ledger of pay-ins, pay-outs and transfers.

use serde::{Deserialize, Serialize};

use super::{Consumer, Money, ProcessReply, Record, Refund, RefundKind, TransactionStatus, Wallet, nullable};
use crate::{
    action::Action,
    bound::Bound,
    client::MangoPay,
    dispatch::PathParams,
    error::{MangoError, Result},
    fields::FieldMap,
    outcome::{Settled, detect},
    rate_limit::RateLimitInfo,
    transport::Transport,
};

/// Kind of money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Money entering the platform.
    Payin,
    /// Money leaving the platform.
    Payout,
    /// Money moving between wallets.
    Transfer,
}

impl TransactionType {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Payin => "PAYIN",
            Self::Payout => "PAYOUT",
            Self::Transfer => "TRANSFER",
        }
    }

    /// Refund kind applicable to this type, if refundable.
    #[must_use]
    pub const fn refund_kind(self) -> Option<RefundKind> {
        match self {
            Self::Payin => Some(RefundKind::PayIn),
            Self::Transfer => Some(RefundKind::Transfer),
            Self::Payout => None,
        }
    }
}

/// A ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Transaction {
    /// Identity and outcome fields.
    #[serde(flatten)]
    pub reply: ProcessReply,
    /// User who initiated the movement.
    #[serde(default, deserialize_with = "nullable")]
    pub author_id: String,
    /// Owner of the credited wallet.
    #[serde(default, deserialize_with = "nullable")]
    pub credited_user_id: String,
    /// Amount debited, fees included.
    #[serde(default, deserialize_with = "nullable")]
    pub debited_funds: Money,
    /// Fees kept by the platform.
    #[serde(default, deserialize_with = "nullable")]
    pub fees: Money,
    /// Source wallet, empty for pay-ins.
    #[serde(default, deserialize_with = "nullable")]
    pub debited_wallet_id: String,
    /// Destination wallet, empty for pay-outs.
    #[serde(default, deserialize_with = "nullable")]
    pub credited_wallet_id: String,
    /// Amount credited.
    #[serde(default, deserialize_with = "nullable")]
    pub credited_funds: Money,
    /// Kind of movement.
    #[serde(rename = "Type")]
    pub kind: TransactionType,
}

impl Record for Transaction {
    const KIND: &'static str = "transaction";
    const SERVER_MANAGED: &'static [&'static str] = &[
        "Status",
        "ResultCode",
        "ResultMessage",
        "CreationDate",
        "ExecutionDate",
        "CreditedFunds",
        "CreditedUserId",
        "Type",
    ];

    fn id(&self) -> &str {
        &self.reply.ident.id
    }

    fn failure(&self) -> Option<MangoError> {
        detect(self)
    }
}

impl Settled for Transaction {
    fn reply(&self) -> &ProcessReply {
        &self.reply
    }
}

/// Query filter for transaction listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    status: Option<TransactionStatus>,
    kind: Option<TransactionType>,
}

impl TransactionFilter {
    /// A filter matching everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps transactions with the given status.
    #[must_use]
    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Keeps transactions of the given type.
    #[must_use]
    pub fn of_type(mut self, kind: TransactionType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Query parameters of the filter.
    #[must_use]
    pub fn to_fields(&self) -> FieldMap {
        FieldMap::new()
            .with_opt("Status", self.status.map(TransactionStatus::as_str))
            .with_opt("Type", self.kind.map(TransactionType::as_str))
    }
}

impl<T: Transport> MangoPay<T> {
    /// Lists the transactions of a user.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Validation`] if the user has an empty id, or any
    /// dispatch error.
    pub async fn transactions(
        &self,
        user: &dyn Consumer,
        filter: TransactionFilter,
    ) -> Result<(Vec<Bound<Transaction, T>>, Option<RateLimitInfo>)> {
        let params = PathParams::id(user.consumer_id());
        self.fetch_list(Action::FetchUserTransactions, &params, Some(filter.to_fields())).await
    }

    /// Lists the transactions of a wallet.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Validation`] if the wallet has an empty id, or
    /// any dispatch error.
    pub async fn wallet_transactions(
        &self,
        wallet: &Wallet,
        filter: TransactionFilter,
    ) -> Result<(Vec<Bound<Transaction, T>>, Option<RateLimitInfo>)> {
        let params = PathParams::id(&wallet.ident.id);
        self.fetch_list(Action::FetchWalletTransactions, &params, Some(filter.to_fields())).await
    }
}

impl<T: Transport> Bound<Transaction, T> {
    /// Refunds the whole transaction.
    ///
    /// Only pay-ins and transfers can be refunded.
    ///
    /// # Errors
    ///
    /// - [`MangoError::Validation`] for pay-outs or a transaction without
    ///   identifier
    /// - [`MangoError::TransactionFailed`] if the refund itself failed
    /// - any dispatch error, e.g. the service refusing to refund a
    ///   transaction that has not SUCCEEDED
    pub async fn refund(&self) -> Result<(Bound<Refund, T>, Option<RateLimitInfo>)> {
        self.refund_with(Refund::full(&self.author_id)).await
    }

    /// Refunds part of a pay-in.
    ///
    /// # Errors
    ///
    /// Same as [`Bound::<Transaction>::refund`], plus a
    /// [`MangoError::Validation`] if the transaction is not a pay-in.
    pub async fn partial_refund(
        &self,
        amount: Money,
        fees: Money,
    ) -> Result<(Bound<Refund, T>, Option<RateLimitInfo>)> {
        if self.kind != TransactionType::Payin {
            return Err(MangoError::Validation(format!(
                "refund: partial refunds only apply to PAYIN, not {}",
                self.kind.as_str()
            )));
        }
        self.refund_with(Refund::partial(&self.author_id, amount, fees)).await
    }

    async fn refund_with(&self, refund: Refund) -> Result<(Bound<Refund, T>, Option<RateLimitInfo>)> {
        if self.id().is_empty() {
            return Err(MangoError::Validation("refund: transaction has empty Id".to_owned()));
        }
        let Some(kind) = self.kind.refund_kind() else {
            return Err(MangoError::Validation(format!(
                "refund: {} transactions cannot be refunded",
                self.kind.as_str()
            )));
        };

        let mut refund = self.service().bind(refund);
        let rate_limit = refund.submit_for(kind, self.id()).await?;
        Ok((refund, rate_limit))
    }
}
