//! Local development stack: an in-process wallet and, with the
//! `local-chain` feature, an in-process chain hosting the contracts.

#[cfg(feature = "local-chain")]
mod chain;
mod wallet;

#[cfg(feature = "local-chain")]
pub use chain::{Deployment, LocalChain, DEFAULT_NATIVE_BALANCE, GENESIS_TIMESTAMP, LOCAL_CHAIN_ID};
pub use wallet::{local_signature, LocalWallet};
