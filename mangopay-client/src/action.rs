//! Action registry.
//!
//! Every logical operation of the API is an [`Action`]. An [`ActionRegistry`]
//! maps each action to exactly one [`Endpoint`]: HTTP method, path template
//! and response shape. The registry is a plain value handed to the
//! [`Dispatcher`](crate::dispatch::Dispatcher), so tests and callers can
//! substitute their own table.
//!
//! Path templates use `{Name}` placeholders filled from
//! [`PathParams`](crate::dispatch::PathParams), e.g. `/hooks/{Id}`.

use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    str::FromStr,
};

use crate::{
    config::EndpointConfig,
    dispatch::PathParams,
    error::{MangoError, Result},
};

/// What an action does with the object it carries.
///
/// Drives the [`Sanitizer`](crate::fields::Sanitizer) rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Creates a new object; the identifier is assigned by the service.
    Create,
    /// Partially updates an existing object.
    Update,
    /// Reads a single object.
    Fetch,
    /// Reads a collection.
    List,
}

/// HTTP method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// DELETE.
    Delete,
}

impl Method {
    /// Upper-case method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Returns true when requests carry a JSON body.
    #[must_use]
    pub const fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of a successful response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseShape {
    /// A single JSON object.
    Single,
    /// A JSON array of objects.
    List,
}

/// Logical operations offered by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    /// Create a wallet-to-wallet transfer.
    CreateTransfer,
    /// Fetch a transfer by id.
    FetchTransfer,
    /// List all transactions of a user.
    FetchUserTransactions,
    /// List all transactions of a wallet.
    FetchWalletTransactions,
    /// Refund a transfer.
    CreateTransferRefund,
    /// Refund a pay-in.
    CreatePayInRefund,
    /// Fetch a refund by id.
    FetchRefund,
    /// Register a hook.
    CreateHook,
    /// Update a hook.
    UpdateHook,
    /// Fetch a hook by id.
    FetchHook,
    /// List all hooks.
    FetchAllHooks,
    /// Create a wallet.
    CreateWallet,
    /// Update a wallet.
    UpdateWallet,
    /// Fetch a wallet by id.
    FetchWallet,
    /// List the wallets of a user.
    FetchUserWallets,
    /// Register a bank account for a user.
    CreateBankAccount,
    /// Fetch a bank account of a user.
    FetchBankAccount,
    /// List the bank accounts of a user.
    FetchUserBankAccounts,
}

impl Action {
    /// Every action, in declaration order.
    pub const ALL: [Self; 18] = [
        Self::CreateTransfer,
        Self::FetchTransfer,
        Self::FetchUserTransactions,
        Self::FetchWalletTransactions,
        Self::CreateTransferRefund,
        Self::CreatePayInRefund,
        Self::FetchRefund,
        Self::CreateHook,
        Self::UpdateHook,
        Self::FetchHook,
        Self::FetchAllHooks,
        Self::CreateWallet,
        Self::UpdateWallet,
        Self::FetchWallet,
        Self::FetchUserWallets,
        Self::CreateBankAccount,
        Self::FetchBankAccount,
        Self::FetchUserBankAccounts,
    ];

    /// Snake case name, as used in configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreateTransfer => "create_transfer",
            Self::FetchTransfer => "fetch_transfer",
            Self::FetchUserTransactions => "fetch_user_transactions",
            Self::FetchWalletTransactions => "fetch_wallet_transactions",
            Self::CreateTransferRefund => "create_transfer_refund",
            Self::CreatePayInRefund => "create_payin_refund",
            Self::FetchRefund => "fetch_refund",
            Self::CreateHook => "create_hook",
            Self::UpdateHook => "update_hook",
            Self::FetchHook => "fetch_hook",
            Self::FetchAllHooks => "fetch_all_hooks",
            Self::CreateWallet => "create_wallet",
            Self::UpdateWallet => "update_wallet",
            Self::FetchWallet => "fetch_wallet",
            Self::FetchUserWallets => "fetch_user_wallets",
            Self::CreateBankAccount => "create_bank_account",
            Self::FetchBankAccount => "fetch_bank_account",
            Self::FetchUserBankAccounts => "fetch_user_bank_accounts",
        }
    }

    /// What the action does with its payload.
    #[must_use]
    pub const fn intent(self) -> Intent {
        match self {
            Self::CreateTransfer
            | Self::CreateTransferRefund
            | Self::CreatePayInRefund
            | Self::CreateHook
            | Self::CreateWallet
            | Self::CreateBankAccount => Intent::Create,
            Self::UpdateHook | Self::UpdateWallet => Intent::Update,
            Self::FetchTransfer
            | Self::FetchRefund
            | Self::FetchHook
            | Self::FetchWallet
            | Self::FetchBankAccount => Intent::Fetch,
            Self::FetchUserTransactions
            | Self::FetchWalletTransactions
            | Self::FetchAllHooks
            | Self::FetchUserWallets
            | Self::FetchUserBankAccounts => Intent::List,
        }
    }

    fn standard_endpoint(self) -> Endpoint {
        let (method, path) = match self {
            Self::CreateTransfer => (Method::Post, "/transfers"),
            Self::FetchTransfer => (Method::Get, "/transfers/{Id}"),
            Self::FetchUserTransactions => (Method::Get, "/users/{Id}/transactions"),
            Self::FetchWalletTransactions => (Method::Get, "/wallets/{Id}/transactions"),
            Self::CreateTransferRefund => (Method::Post, "/transfers/{Id}/refunds"),
            Self::CreatePayInRefund => (Method::Post, "/payins/{Id}/refunds"),
            Self::FetchRefund => (Method::Get, "/refunds/{Id}"),
            Self::CreateHook => (Method::Post, "/hooks"),
            Self::UpdateHook => (Method::Put, "/hooks/{Id}"),
            Self::FetchHook => (Method::Get, "/hooks/{Id}"),
            Self::FetchAllHooks => (Method::Get, "/hooks"),
            Self::CreateWallet => (Method::Post, "/wallets"),
            Self::UpdateWallet => (Method::Put, "/wallets/{Id}"),
            Self::FetchWallet => (Method::Get, "/wallets/{Id}"),
            Self::FetchUserWallets => (Method::Get, "/users/{Id}/wallets"),
            Self::CreateBankAccount => (Method::Post, "/users/{UserId}/bankaccounts/{Type}"),
            Self::FetchBankAccount => (Method::Get, "/users/{UserId}/bankaccounts/{Id}"),
            Self::FetchUserBankAccounts => (Method::Get, "/users/{Id}/bankaccounts"),
        };
        let shape =
            if self.intent() == Intent::List { ResponseShape::List } else { ResponseShape::Single };
        Endpoint::new(method, path, shape)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = MangoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.name() == s)
            .ok_or_else(|| MangoError::Config(format!("unknown action '{s}'")))
    }
}

/// Method, path template and response shape of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// HTTP method.
    pub method: Method,
    /// Path template relative to the API root, e.g. `/hooks/{Id}`.
    pub path: String,
    /// Expected response body shape.
    pub shape: ResponseShape,
}

impl Endpoint {
    /// Creates an endpoint.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>, shape: ResponseShape) -> Self {
        Self { method, path: path.into(), shape }
    }

    /// Names of the `{Name}` placeholders in the path template.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.path.split('{').skip(1).filter_map(|chunk| chunk.split_once('}').map(|(name, _)| name))
    }

    /// Fills the path template from `params`.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Validation`] when a placeholder has no parameter,
    /// an empty one, or one containing URL delimiters.
    pub fn render(&self, params: &PathParams) -> Result<String> {
        let mut rendered = String::with_capacity(self.path.len());
        let mut rest = self.path.as_str();

        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let name = &rest[start + 1..start + len];
            let value = params.get(name).ok_or_else(|| {
                MangoError::Validation(format!("missing path parameter '{name}' for {}", self.path))
            })?;
            validate_segment(name, value)?;

            rendered.push_str(&rest[..start]);
            rendered.push_str(value);
            rest = &rest[start + len + 1..];
        }
        rendered.push_str(rest);

        Ok(rendered)
    }
}

fn validate_segment(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(MangoError::Validation(format!("empty {name}")));
    }
    if value.contains(['/', '?', '#', '%']) || value.contains("..") {
        return Err(MangoError::Validation(format!("{name} contains URL delimiters: {value}")));
    }
    Ok(())
}

/// Table of action endpoints.
///
/// Built once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ActionRegistry {
    endpoints: HashMap<Action, Endpoint>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ActionRegistry {
    /// Registry with the standard API v2.01 paths.
    #[must_use]
    pub fn standard() -> Self {
        let endpoints = Action::ALL.into_iter().map(|a| (a, a.standard_endpoint())).collect();
        Self { endpoints }
    }

    /// Registry without any endpoint.
    #[must_use]
    pub fn empty() -> Self {
        Self { endpoints: HashMap::new() }
    }

    /// Sets the endpoint of an action, builder style.
    #[must_use]
    pub fn with_endpoint(mut self, action: Action, endpoint: Endpoint) -> Self {
        self.endpoints.insert(action, endpoint);
        self
    }

    /// Applies configured path overrides.
    ///
    /// Method and response shape stay those of the standard table.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Config`] for unknown action names, unsafe paths,
    /// or paths whose placeholders differ from the ones the action fills.
    pub fn with_overrides(mut self, config: &EndpointConfig) -> Result<Self> {
        config.validate()?;
        for (name, path) in config.iter() {
            let action: Action = name.parse()?;
            let standard = action.standard_endpoint();
            let overridden = Endpoint::new(standard.method, path.as_str(), standard.shape);

            let expected: BTreeSet<_> = standard.placeholders().collect();
            let found: BTreeSet<_> = overridden.placeholders().collect();
            if expected != found {
                return Err(MangoError::Config(format!(
                    "endpoint override {name} = \"{path}\" must use placeholders {expected:?}, found {found:?}"
                )));
            }

            self.endpoints.insert(action, overridden);
        }
        Ok(self)
    }

    /// Returns the endpoint of an action, if registered.
    #[must_use]
    pub fn get(&self, action: Action) -> Option<&Endpoint> {
        self.endpoints.get(&action)
    }

    /// Returns the endpoint of an action.
    ///
    /// # Panics
    ///
    /// Panics if the action is not registered. Every registry built by
    /// [`ActionRegistry::standard`] covers all actions; a missing entry is a
    /// programming error, not a runtime condition.
    #[must_use]
    pub fn resolve(&self, action: Action) -> &Endpoint {
        self.get(action).unwrap_or_else(|| panic!("no endpoint registered for action {action}"))
    }

    /// Number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns true when no action is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
