//! Transfers: moving e-money from one wallet to another.
//!
//! A transfer is executed by the service as soon as it is created. It cannot
//! be saved twice; once it has an identifier, only refunds and fetches apply.

use serde::{Deserialize, Serialize};

use super::{
    Consumer, Money, ProcessReply, Record, Refund, RefundKind, TransactionFilter,
    TransactionType, Wallet, nullable,
};
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

/// A wallet-to-wallet transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Transfer {
    /// Identity and outcome fields.
    #[serde(flatten)]
    pub reply: ProcessReply,
    /// User initiating the transfer.
    #[serde(default, deserialize_with = "nullable")]
    pub author_id: String,
    /// Owner of the credited wallet, set by the service.
    #[serde(default, deserialize_with = "nullable")]
    pub credited_user_id: String,
    /// Amount taken from the debited wallet, fees included.
    #[serde(default, deserialize_with = "nullable")]
    pub debited_funds: Money,
    /// Fees kept by the platform.
    #[serde(default, deserialize_with = "nullable")]
    pub fees: Money,
    /// Source wallet.
    #[serde(default, deserialize_with = "nullable")]
    pub debited_wallet_id: String,
    /// Destination wallet.
    #[serde(default, deserialize_with = "nullable")]
    pub credited_wallet_id: String,
    /// Amount received, set by the service.
    #[serde(default, deserialize_with = "nullable")]
    pub credited_funds: Money,
}

impl Record for Transfer {
    const KIND: &'static str = "transfer";
    const SERVER_MANAGED: &'static [&'static str] = &[
        "Status",
        "ResultCode",
        "ResultMessage",
        "CreationDate",
        "ExecutionDate",
        "CreditedFunds",
        "CreditedUserId",
    ];

    fn id(&self) -> &str {
        &self.reply.ident.id
    }

    fn to_fields(&self, _intent: Intent) -> Result<FieldMap> {
        Ok(FieldMap::new()
            .with("Id", &self.reply.ident.id)
            .with_opt("Tag", self.reply.ident.tag.as_deref())
            .with("AuthorId", &self.author_id)
            .with("DebitedFunds", &self.debited_funds)
            .with("Fees", &self.fees)
            .with("DebitedWalletId", &self.debited_wallet_id)
            .with("CreditedWalletId", &self.credited_wallet_id))
    }

    fn failure(&self) -> Option<MangoError> {
        detect(self)
    }
}

impl Settled for Transfer {
    fn reply(&self) -> &ProcessReply {
        &self.reply
    }
}

impl<T: Transport> MangoPay<T> {
    /// Prepares a transfer of `amount` (fees included) between two wallets.
    ///
    /// Nothing is sent until [`Bound::<Transfer>::save`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Validation`] if the author or a wallet is
    /// missing or has an empty identifier.
    pub fn new_transfer(
        &self,
        author: Option<&dyn Consumer>,
        amount: Money,
        fees: Money,
        from: Option<&Wallet>,
        to: Option<&Wallet>,
    ) -> Result<Bound<Transfer, T>> {
        let invalid = |reason: &str| MangoError::Validation(format!("new transfer: {reason}"));

        let author = author.ok_or_else(|| invalid("nil author"))?;
        let from = from.ok_or_else(|| invalid("nil source wallet"))?;
        let to = to.ok_or_else(|| invalid("nil dest wallet"))?;
        if from.ident.id.is_empty() {
            return Err(invalid("source wallet has empty Id"));
        }
        if to.ident.id.is_empty() {
            return Err(invalid("dest wallet has empty Id"));
        }
        if author.consumer_id().is_empty() {
            return Err(invalid("author has empty Id"));
        }

        Ok(self.bind(Transfer {
            author_id: author.consumer_id().to_owned(),
            debited_funds: amount,
            fees,
            debited_wallet_id: from.ident.id.clone(),
            credited_wallet_id: to.ident.id.clone(),
            ..Transfer::default()
        }))
    }

    /// Fetches a transfer by identifier.
    ///
    /// A fetched transfer with a FAILED status is returned as is; failure
    /// detection only applies to [`Bound::<Transfer>::save`].
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Validation`] for an empty id, or any dispatch error.
    pub async fn transfer(&self, id: &str) -> Result<(Bound<Transfer, T>, Option<RateLimitInfo>)> {
        self.fetch(Action::FetchTransfer, &PathParams::id(id)).await
    }

    /// Lists the transfers of a user.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Validation`] if the user has an empty id, or any
    /// dispatch error.
    pub async fn transfers(
        &self,
        user: &dyn Consumer,
    ) -> Result<(Vec<Bound<Transfer, T>>, Option<RateLimitInfo>)> {
        let filter = TransactionFilter::new().of_type(TransactionType::Transfer);
        self.fetch_list(
            Action::FetchUserTransactions,
            &PathParams::id(user.consumer_id()),
            Some(filter.to_fields()),
        )
        .await
    }
}

impl<T: Transport> Bound<Transfer, T> {
    /// Executes the transfer.
    ///
    /// # Errors
    ///
    /// - [`MangoError::Validation`] if the transfer already has an identifier
    ///   (nothing is sent)
    /// - [`MangoError::TransactionFailed`] if the service rejected the
    ///   transfer; the transfer then holds the FAILED state
    /// - any dispatch error, leaving the transfer untouched
    pub async fn save(&mut self) -> Result<Option<RateLimitInfo>> {
        if !self.id().is_empty() {
            return Err(MangoError::Validation(format!(
                "transfer {} already executed; transfers cannot be saved twice",
                self.id()
            )));
        }
        self.submit(Action::CreateTransfer, &PathParams::new()).await
    }

    /// Refunds the whole transfer.
    ///
    /// The service only refunds SUCCEEDED transfers; any other state is
    /// rejected remotely and surfaces as the transport error.
    ///
    /// # Errors
    ///
    /// - [`MangoError::Validation`] if the transfer has no identifier
    /// - [`MangoError::TransactionFailed`] if the refund itself failed
    /// - any dispatch error
    pub async fn refund(&self) -> Result<(Bound<Refund, T>, Option<RateLimitInfo>)> {
        if self.id().is_empty() {
            return Err(MangoError::Validation("refund: transfer has empty Id".to_owned()));
        }

        let mut refund = self.service().bind(Refund::full(&self.author_id));
        let rate_limit = refund.submit_for(RefundKind::Transfer, self.id()).await?;
        Ok((refund, rate_limit))
    }
}
