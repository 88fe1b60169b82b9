//! Wallet-framework connector for the Okto custodial wallet
//!
//! Wraps the provider in the connector surface wallet frameworks expect and
//! ships the wallet-list registry entries plus an `okto-wallet` CLI.

pub mod connector;
pub mod error;
pub mod registry;

pub use connector::{
    ConnectData, ConnectorEvent, ConnectorListener, ConnectorOptions, ConnectorStatus,
    OktoConnector, CONNECTOR_ID, CONNECTOR_NAME, CONNECTOR_TYPE, DISCONNECTED_KEY,
};
pub use error::ConnectorError;
pub use registry::{all_wallets, create_connector, okto_wallet, WalletDescriptor, WalletKind};
