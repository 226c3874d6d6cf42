//! MangoPay client core: typed payment objects over a generic action
//! dispatcher.
//!
//! The crate turns domain objects (hooks, wallets, transfers, refunds, bank
//! accounts) into authenticated HTTP calls against the MangoPay REST API and
//! merges the service reply back into the object that issued the call.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  Bound<Record>       │  hook.save(), transfer.save(), transfer.refund()
//! └──────────┬───────────┘
//!            │ to_fields(intent) → Sanitizer
//! ┌──────────▼───────────┐
//! │  MangoPay session    │  credentials + action table
//! │  ┌────────────────┐  │
//! │  │  Dispatcher    │  │  path substitution, JSON body, response decode
//! │  └────────────────┘  │
//! └──────────┬───────────┘
//!            │ ApiRequest
//! ┌──────────▼───────────┐
//! │  Transport           │  HttpTransport (reqwest) or MemoryTransport
//! └──────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mangopay_client::{
//!     MangoPay,
//!     model::{Money, UserRef},
//! };
//!
//! # async fn example() -> mangopay_client::Result<()> {
//! let service = MangoPay::from_file("mangopay.toml")?;
//!
//! let (source, _) = service.wallet("wallet-1").await?;
//! let (target, _) = service.wallet("wallet-2").await?;
//! let author = UserRef::new("user-1");
//!
//! let mut transfer = service.new_transfer(
//!     Some(&author),
//!     Money::eur(1000),
//!     Money::eur(0),
//!     Some(&source),
//!     Some(&target),
//! )?;
//! transfer.save().await?;
//! println!("transfer {} is {:?}", transfer.id(), transfer.reply.status);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Every operation returns [`Result<T, MangoError>`](error::Result). A
//! transaction the service accepted but marked `FAILED` surfaces as
//! [`MangoError::TransactionFailed`]; the object still reflects the reply.
//!
//! ```rust,no_run
//! use mangopay_client::{MangoError, MangoPay, error::TransportError};
//!
//! # async fn example(service: MangoPay) {
//! let (transfer, _) = match service.transfer("t1").await {
//!     Ok(found) => found,
//!     Err(MangoError::Transport(TransportError::Status { status: 404, .. })) => return,
//!     Err(e) => return eprintln!("lookup failed: {e}"),
//! };
//! match transfer.refund().await {
//!     Ok((refund, _)) => println!("refund {}", refund.id()),
//!     Err(MangoError::TransactionFailed { message, .. }) => eprintln!("refund failed: {message}"),
//!     Err(e) => eprintln!("refund rejected: {e}"),
//! }
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`client`]: the [`MangoPay`] session handle and its constructors
//! - [`model`]: domain records and their operations
//! - [`bound`]: records paired with the session that saves them
//! - [`action`]: the action table (method, path template, intent)
//! - [`dispatch`]: action execution against a [`transport::Transport`]
//! - [`fields`]: field maps and per-action sanitation
//! - [`outcome`]: logical failure detection for transactions
//! - [`rate_limit`]: rate-limit headers of the service
//! - [`config`]: TOML configuration
//! - [`transport`]: HTTP and in-memory transports
//! - [`error`]: error types

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest"
)]

pub mod action;
pub mod bound;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fields;
pub mod model;
pub mod outcome;
pub mod rate_limit;
pub mod transport;

pub use bound::Bound;
pub use client::MangoPay;
pub use error::{MangoError, Result};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _ = std::marker::PhantomData::<MangoError>;
        let _ = std::marker::PhantomData::<MangoPay>;
    }
}
