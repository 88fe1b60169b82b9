//! Provider error taxonomy
//!
//! Error messages on the dispatch surface are part of the external contract
//! (wallet UIs match on them), so the display strings here are fixed.

use okto_client::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Chain not supported")]
    ChainNotSupported,

    #[error("No accounts found")]
    NoAccounts,

    #[error("No EIP155 accounts found")]
    NoEip155Accounts,

    #[error("\"{0}\" not implemented")]
    NotImplemented(String),

    #[error("Transaction Hash not found")]
    TransactionHashNotFound,

    #[error("The address or message hash is invalid")]
    AddressMismatch,

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}
