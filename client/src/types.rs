//! Gateway wire types

use primitive_types::U256;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// CAIP-2 namespace prefix for EVM chains.
pub const EIP155_PREFIX: &str = "eip155:";

/// An account held by the authenticated user, as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    /// Chain-namespaced id, e.g. `eip155:137`.
    pub caip_id: String,
    pub address: String,
}

impl Wallet {
    /// Chain id when this wallet lives on an EVM chain, `None` otherwise.
    pub fn eip155_chain_id(&self) -> Option<u64> {
        self.caip_id.strip_prefix(EIP155_PREFIX)?.parse().ok()
    }
}

/// Lifecycle status of a submitted user operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Initiated,
    InProgress,
    Successful,
    Failed,
    Expired,
    BundlerDiscarded,
    FailedOnChain,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Statuses after which the order will never produce a transaction hash
    /// it does not already have.
    ///
    /// `Successful` is in this set: an order reported successful without a
    /// downstream hash is treated as a permanent failure, not a retry.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Successful
                | OrderStatus::Failed
                | OrderStatus::Expired
                | OrderStatus::BundlerDiscarded
                | OrderStatus::FailedOnChain
        )
    }
}

/// An entry from the order-history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub intent_id: String,
    pub status: OrderStatus,
    /// On-chain transaction hashes produced by the order, if any.
    #[serde(default)]
    pub downstream_transaction_hash: Vec<String>,
}

/// EVM transaction fields passed through to the gateway as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub from: String,
    pub to: String,
    pub data: String,
    pub value: U256,
}

/// A not-yet-signed user operation wrapping one raw transaction intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOp {
    pub intent_id: String,
    pub caip2_id: String,
    pub transaction: RawTransaction,
    pub client_swa: String,
    pub nonce: String,
}

impl UserOp {
    pub fn new(
        caip2_id: impl Into<String>,
        transaction: RawTransaction,
        client_swa: impl Into<String>,
    ) -> Self {
        Self {
            intent_id: random_hex(16),
            caip2_id: caip2_id.into(),
            transaction,
            client_swa: client_swa.into(),
            nonce: random_hex(32),
        }
    }
}

/// A user operation plus the session signature the gateway issued for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUserOp {
    #[serde(flatten)]
    pub user_op: UserOp,
    pub signature: String,
}

fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    format!("0x{}", hex::encode(buf))
}
