//! Wallets: e-money accounts owned by users.

use serde::{Deserialize, Serialize};

use super::{Consumer, Money, ProcessIdent, Record, nullable};
use crate::{
    action::{Action, Intent},
    bound::Bound,
    client::MangoPay,
    dispatch::PathParams,
    error::{MangoError, Result},
    fields::{FieldMap, FieldValue},
    rate_limit::RateLimitInfo,
    transport::Transport,
};

/// An e-money account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Wallet {
    /// Identity fields.
    #[serde(flatten)]
    pub ident: ProcessIdent,
    /// Identifiers of the owning users.
    #[serde(default, deserialize_with = "nullable")]
    pub owners: Vec<String>,
    /// Free-form description.
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    /// ISO 4217 currency of the wallet.
    #[serde(default, deserialize_with = "nullable")]
    pub currency: String,
    /// Current balance, set by the service.
    #[serde(default, deserialize_with = "nullable")]
    pub balance: Money,
    /// `DEFAULT`, `FEES` or `CREDIT`, set by the service.
    #[serde(default, deserialize_with = "nullable")]
    pub funds_type: String,
}

impl Record for Wallet {
    const KIND: &'static str = "wallet";
    const SERVER_MANAGED: &'static [&'static str] = &["Balance", "FundsType", "CreationDate"];

    fn id(&self) -> &str {
        &self.ident.id
    }

    /// Owners and currency are fixed at creation; updates only carry the
    /// description and tag.
    fn to_fields(&self, intent: Intent) -> Result<FieldMap> {
        let fields = FieldMap::new()
            .with("Id", &self.ident.id)
            .with_opt("Tag", self.ident.tag.as_deref())
            .with("Description", &self.description);

        if intent == Intent::Update {
            return Ok(fields);
        }
        Ok(fields
            .with("Owners", FieldValue::from(self.owners.clone()))
            .with("Currency", &self.currency))
    }
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

impl<T: Transport> MangoPay<T> {
    /// Creates an unsaved wallet attached to this session.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Validation`] if there is no owner, an owner has
    /// an empty identifier, the currency is not a three-letter code or the
    /// description is empty.
    pub fn new_wallet(
        &self,
        owners: &[&dyn Consumer],
        currency: &str,
        description: &str,
    ) -> Result<Bound<Wallet, T>> {
        let msg = "new wallet: ";
        if owners.is_empty() {
            return Err(MangoError::Validation(format!("{msg}no owner")));
        }
        if owners.iter().any(|o| o.consumer_id().is_empty()) {
            return Err(MangoError::Validation(format!("{msg}owner has empty Id")));
        }
        if !is_currency_code(currency) {
            return Err(MangoError::Validation(format!("{msg}invalid currency '{currency}'")));
        }
        if description.is_empty() {
            return Err(MangoError::Validation(format!("{msg}empty description")));
        }

        Ok(self.bind(Wallet {
            owners: owners.iter().map(|o| o.consumer_id().to_owned()).collect(),
            currency: currency.to_owned(),
            description: description.to_owned(),
            ..Wallet::default()
        }))
    }

    /// Fetches a wallet by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Validation`] for an empty id, or any dispatch error.
    pub async fn wallet(&self, id: &str) -> Result<(Bound<Wallet, T>, Option<RateLimitInfo>)> {
        self.fetch(Action::FetchWallet, &PathParams::id(id)).await
    }

    /// Lists the wallets of a user.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Validation`] if the user has an empty id, or any
    /// dispatch error.
    pub async fn wallets(
        &self,
        user: &dyn Consumer,
    ) -> Result<(Vec<Bound<Wallet, T>>, Option<RateLimitInfo>)> {
        self.fetch_list(Action::FetchUserWallets, &PathParams::id(user.consumer_id()), None).await
    }
}

impl<T: Transport> Bound<Wallet, T> {
    /// Creates the wallet, or updates its description and tag once it has an
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns any dispatch error; the wallet is left untouched in that case.
    pub async fn save(&mut self) -> Result<Option<RateLimitInfo>> {
        if self.id().is_empty() {
            self.submit(Action::CreateWallet, &PathParams::new()).await
        } else {
            let params = PathParams::id(self.id());
            self.submit(Action::UpdateWallet, &params).await
        }
    }
}
