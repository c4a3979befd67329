//! # CyberFi Gateway
//!
//! Client side of the CyberFi demo: a wallet session, a gateway that reads
//! and writes the CyberFi contracts, and view-models for each screen.
//!
//! ```text
//! views ──► ContractGateway ──► ChainTransport (node or LocalChain)
//!                 │
//!                 └──────────► WalletProvider (injected wallet or LocalWallet)
//! ```
//!
//! Everything is single-threaded: futures are `!Send` and are meant for a
//! current-thread Tokio runtime.

pub mod config;
pub mod error;
pub mod gateway;
pub mod local;
pub mod model;
pub mod schema;
pub mod transport;
pub mod types;
pub mod units;
pub mod views;
pub mod wallet;

#[cfg(test)]
pub(crate) mod mock;

pub use config::{AddressManifest, ContractAddresses, ContractKind, GatewayConfig};
pub use error::{GatewayError, Result, WriteFailure};
pub use gateway::{ContractGateway, FaucetOutcome};
pub use model::{Budget, Loan, LoanBook, LoanConstraints, SavingsPool};
pub use transport::ChainTransport;
pub use types::{format_address, Address, TokenAmount, TokenBalance};
pub use wallet::{WalletProvider, WalletSession};
