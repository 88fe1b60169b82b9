//! Okto Gateway Client
//!
//! A client for the Okto custodial wallet gateway: social/OAuth login,
//! encrypted session persistence, message and typed-data signing, and
//! user-operation submission with order-history queries.
//!
//! ## Session model
//!
//! - Keys are custodial; signing happens on the gateway under a session token
//! - The session blob is persisted encrypted with the client secret
//! - A session that fails to decrypt is indistinguishable from no session

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod session;
pub mod storage;
pub mod types;

pub use auth::{AuthData, LoginType, SocialProvider};
pub use client::OktoClient;
pub use config::{Environment, OktoClientConfig};
pub use error::{AuthError, ClientError};
pub use session::SessionConfig;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use types::{Order, OrderStatus, RawTransaction, SignedUserOp, UserOp, Wallet};
