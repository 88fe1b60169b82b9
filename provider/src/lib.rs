//! EIP-1193 provider adapter over the Okto gateway client
//!
//! Exposes the standard provider surface (`request`, `connect`,
//! `disconnect`, events) on top of a custodial wallet: signing and
//! transaction submission are delegated to the gateway, and submitted
//! transactions are resolved to on-chain hashes by polling order history.

pub mod api;
pub mod convert;
pub mod error;
pub mod events;
mod polling;
pub mod provider;

pub use api::OktoApi;
pub use error::ProviderError;
pub use events::{EventListener, EventListeners, ProviderEvent};
pub use provider::{EthAccount, OktoProvider, RpcRequest};
