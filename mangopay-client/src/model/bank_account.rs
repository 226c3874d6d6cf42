//! Bank accounts used as pay-out destinations.

use serde::{Deserialize, Serialize};

use super::{Consumer, ProcessIdent, Record, nullable};
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

/// Banking system of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BankAccountType {
    /// IBAN + BIC (SEPA).
    #[default]
    Iban,
    /// UK account number + sort code.
    Gb,
    /// US account number + ABA routing number.
    Us,
    /// Canadian account number + branch and institution numbers.
    Ca,
    /// Any other country: account number + BIC.
    Other,
}

impl BankAccountType {
    /// Path segment used when creating an account of this type.
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Iban => "iban",
            Self::Gb => "gb",
            Self::Us => "us",
            Self::Ca => "ca",
            Self::Other => "other",
        }
    }
}

/// Postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[allow(missing_docs, reason = "self-explanatory address lines")]
pub struct Address {
    #[serde(default, deserialize_with = "nullable")]
    pub address_line1: String,
    #[serde(default, deserialize_with = "nullable")]
    pub address_line2: String,
    #[serde(default, deserialize_with = "nullable")]
    pub city: String,
    #[serde(default, deserialize_with = "nullable")]
    pub region: String,
    #[serde(default, deserialize_with = "nullable")]
    pub postal_code: String,
    /// ISO 3166-1 alpha-2 country code.
    #[serde(default, deserialize_with = "nullable")]
    pub country: String,
}

impl Address {
    fn to_fields(&self) -> FieldMap {
        let non_empty = |s: &String| (!s.is_empty()).then(|| s.clone());
        FieldMap::new()
            .with("AddressLine1", &self.address_line1)
            .with_opt("AddressLine2", non_empty(&self.address_line2))
            .with("City", &self.city)
            .with_opt("Region", non_empty(&self.region))
            .with("PostalCode", &self.postal_code)
            .with("Country", &self.country)
    }
}

/// A user's bank account.
///
/// Details relevant to the account type are set before saving; the others
/// stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BankAccount {
    /// Identity fields.
    #[serde(flatten)]
    pub ident: ProcessIdent,
    /// Owning user.
    #[serde(default, deserialize_with = "nullable")]
    pub user_id: String,
    /// Banking system.
    #[serde(rename = "Type", default)]
    pub kind: BankAccountType,
    /// Name of the account holder.
    #[serde(default, deserialize_with = "nullable")]
    pub owner_name: String,
    /// Address of the account holder.
    #[serde(default, deserialize_with = "nullable")]
    pub owner_address: Address,
    /// Whether the account can receive pay-outs, set by the service.
    #[serde(default = "active_default")]
    pub active: bool,
    /// IBAN (`IBAN` accounts).
    #[serde(rename = "IBAN", default, skip_serializing_if = "Option::is_none")]
    pub iban: Option<String>,
    /// BIC (`IBAN` and `OTHER` accounts).
    #[serde(rename = "BIC", default, skip_serializing_if = "Option::is_none")]
    pub bic: Option<String>,
    /// Account number (`GB`, `US`, `CA` and `OTHER` accounts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    /// Sort code (`GB` accounts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_code: Option<String>,
    /// ABA routing number (`US` accounts).
    #[serde(rename = "ABA", default, skip_serializing_if = "Option::is_none")]
    pub aba: Option<String>,
    /// Branch code (`CA` accounts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_code: Option<String>,
    /// Institution number (`CA` accounts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_number: Option<String>,
    /// Bank name (`CA` accounts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    /// Country (`OTHER` accounts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

const fn active_default() -> bool {
    true
}

impl Record for BankAccount {
    const KIND: &'static str = "bank account";
    const SERVER_MANAGED: &'static [&'static str] = &["UserId", "Type", "Active", "CreationDate"];

    fn id(&self) -> &str {
        &self.ident.id
    }

    fn to_fields(&self, _intent: Intent) -> Result<FieldMap> {
        Ok(FieldMap::new()
            .with("Id", &self.ident.id)
            .with_opt("Tag", self.ident.tag.as_deref())
            .with("OwnerName", &self.owner_name)
            .with("OwnerAddress", self.owner_address.to_fields())
            .with_opt("IBAN", self.iban.as_deref())
            .with_opt("BIC", self.bic.as_deref())
            .with_opt("AccountNumber", self.account_number.as_deref())
            .with_opt("SortCode", self.sort_code.as_deref())
            .with_opt("ABA", self.aba.as_deref())
            .with_opt("BranchCode", self.branch_code.as_deref())
            .with_opt("InstitutionNumber", self.institution_number.as_deref())
            .with_opt("BankName", self.bank_name.as_deref())
            .with_opt("Country", self.country.as_deref()))
    }
}

impl<T: Transport> MangoPay<T> {
    /// Prepares a bank account for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Validation`] if the user has an empty id or the
    /// owner name is empty.
    pub fn new_bank_account(
        &self,
        user: &dyn Consumer,
        owner_name: &str,
        owner_address: Address,
        kind: BankAccountType,
    ) -> Result<Bound<BankAccount, T>> {
        if user.consumer_id().is_empty() {
            return Err(MangoError::Validation("new bank account: user has empty Id".to_owned()));
        }
        if owner_name.is_empty() {
            return Err(MangoError::Validation("new bank account: empty owner name".to_owned()));
        }

        Ok(self.bind(BankAccount {
            user_id: user.consumer_id().to_owned(),
            kind,
            owner_name: owner_name.to_owned(),
            owner_address,
            ..BankAccount::default()
        }))
    }

    /// Fetches one bank account of a user.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Validation`] for an empty user or account id, or
    /// any dispatch error.
    pub async fn bank_account(
        &self,
        user: &dyn Consumer,
        id: &str,
    ) -> Result<(Bound<BankAccount, T>, Option<RateLimitInfo>)> {
        let params = PathParams::id(id).with("UserId", user.consumer_id());
        self.fetch(Action::FetchBankAccount, &params).await
    }

    /// Lists the bank accounts of a user.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Validation`] if the user has an empty id, or any
    /// dispatch error.
    pub async fn bank_accounts(
        &self,
        user: &dyn Consumer,
    ) -> Result<(Vec<Bound<BankAccount, T>>, Option<RateLimitInfo>)> {
        self.fetch_list(Action::FetchUserBankAccounts, &PathParams::id(user.consumer_id()), None)
            .await
    }
}

impl<T: Transport> Bound<BankAccount, T> {
    /// Registers the account. Bank accounts cannot be modified afterwards.
    ///
    /// # Errors
    ///
    /// - [`MangoError::Validation`] if the account already has an identifier
    /// - any dispatch error, leaving the account untouched
    pub async fn save(&mut self) -> Result<Option<RateLimitInfo>> {
        if !self.id().is_empty() {
            return Err(MangoError::Validation(format!(
                "bank account {} already registered and cannot be modified",
                self.id()
            )));
        }
        let params = PathParams::new()
            .with("UserId", self.user_id.as_str())
            .with("Type", self.kind.path_segment());
        self.submit(Action::CreateBankAccount, &params).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        action::{ActionRegistry, Method},
        model::UserRef,
        transport::{Credentials, MemoryTransport},
    };

    const TEST_IBAN: &str = "FR3020041010124530725S03383";
    const TEST_BIC: &str = "CRLYFRPP";

    fn service() -> MangoPay<MemoryTransport> {
        MangoPay::with_transport(
            Credentials::new("client", "secret"),
            ActionRegistry::standard(),
            MemoryTransport::new(),
        )
    }

    fn address() -> Address {
        Address {
            address_line1: "1 rue de la Paix".to_owned(),
            city: "Paris".to_owned(),
            postal_code: "75002".to_owned(),
            country: "FR".to_owned(),
            ..Address::default()
        }
    }

    #[tokio::test]
    async fn test_create_iban_account() {
        let service = service();
        service.transport().push_json(
            200,
            &json!({
                "Id": "b1", "UserId": "7", "Type": "IBAN", "OwnerName": "Jane",
                "OwnerAddress": {"AddressLine1": "1 rue de la Paix", "AddressLine2": null, "City": "Paris",
                                 "Region": null, "PostalCode": "75002", "Country": "FR"},
                "IBAN": TEST_IBAN, "BIC": TEST_BIC, "Active": true, "CreationDate": 1700000000
            }),
        );

        let mut account = service
            .new_bank_account(&UserRef::new("7"), "Jane", address(), BankAccountType::Iban)
            .unwrap();
        account.iban = Some(TEST_IBAN.to_owned());
        account.bic = Some(TEST_BIC.to_owned());
        account.save().await.unwrap();

        let request = &service.transport().requests()[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.path, "/users/7/bankaccounts/iban");
        assert_eq!(
            request.json_body(),
            Some(json!({
                "OwnerName": "Jane",
                "OwnerAddress": {"AddressLine1": "1 rue de la Paix", "City": "Paris", "PostalCode": "75002", "Country": "FR"},
                "IBAN": TEST_IBAN,
                "BIC": TEST_BIC
            }))
        );
        assert_eq!(account.id(), "b1");
        assert_eq!(account.iban.as_deref(), Some(TEST_IBAN));
        assert!(account.active);
    }

    #[test]
    fn test_new_bank_account_validation() {
        let service = service();
        assert!(service
            .new_bank_account(&UserRef::new(""), "Jane", address(), BankAccountType::Iban)
            .is_err());
        assert!(service
            .new_bank_account(&UserRef::new("7"), "", address(), BankAccountType::Gb)
            .is_err());
    }

    #[tokio::test]
    async fn test_registered_account_cannot_be_saved() {
        let service = service();
        let mut account = service
            .new_bank_account(&UserRef::new("7"), "Jane", address(), BankAccountType::Gb)
            .unwrap();
        account.ident.id = "b1".to_owned();

        assert!(matches!(account.save().await, Err(MangoError::Validation(_))));
        assert_eq!(service.transport().calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_and_list_accounts() {
        let service = service();
        service.transport().push_json(200, &json!({"Id": "b1", "UserId": "7", "Type": "GB"}));
        service.transport().push_json(200, &json!([{"Id": "b1", "Type": "GB"}, {"Id": "b2", "Type": "US"}]));

        let user = UserRef::new("7");
        let (account, _) = service.bank_account(&user, "b1").await.unwrap();
        let (accounts, _) = service.bank_accounts(&user).await.unwrap();

        assert_eq!(account.kind, BankAccountType::Gb);
        assert_eq!(accounts[1].kind, BankAccountType::Us);
        let paths: Vec<_> = service.transport().requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, ["/users/7/bankaccounts/b1", "/users/7/bankaccounts"]);
    }
}
