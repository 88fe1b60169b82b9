//! Trait seam between the provider adapter and the gateway client
//!
//! The adapter only ever talks to this trait, which keeps the dispatcher and
//! the polling loop testable against a mock.

use async_trait::async_trait;
use serde_json::Value;

use okto_client::{
    ClientError, LoginType, OktoClient, Order, RawTransaction, SignedUserOp, UserOp, Wallet,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OktoApi: Send + Sync {
    fn is_logged_in(&self) -> bool;
    fn user_swa(&self) -> Option<String>;
    async fn login(&self, login: LoginType) -> Result<String, ClientError>;
    async fn sync_user_keys(&self) -> Result<(), ClientError>;
    async fn get_account(&self) -> Result<Vec<Wallet>, ClientError>;
    async fn get_orders_history(&self, intent_id: &str) -> Result<Vec<Order>, ClientError>;
    async fn sign_message(&self, message: &str) -> Result<String, ClientError>;
    async fn sign_typed_data(&self, typed_data: Value) -> Result<String, ClientError>;
    fn evm_raw_transaction(&self, caip2_id: &str, transaction: RawTransaction) -> UserOp;
    async fn sign_user_op(&self, user_op: UserOp) -> Result<SignedUserOp, ClientError>;
    async fn execute_user_op(&self, signed: SignedUserOp) -> Result<String, ClientError>;
    fn session_clear(&self);
}

#[async_trait]
impl OktoApi for OktoClient {
    fn is_logged_in(&self) -> bool {
        OktoClient::is_logged_in(self)
    }

    fn user_swa(&self) -> Option<String> {
        OktoClient::user_swa(self)
    }

    async fn login(&self, login: LoginType) -> Result<String, ClientError> {
        OktoClient::login(self, &login).await
    }

    async fn sync_user_keys(&self) -> Result<(), ClientError> {
        OktoClient::sync_user_keys(self).await
    }

    async fn get_account(&self) -> Result<Vec<Wallet>, ClientError> {
        OktoClient::get_account(self).await
    }

    async fn get_orders_history(&self, intent_id: &str) -> Result<Vec<Order>, ClientError> {
        OktoClient::get_orders_history(self, intent_id).await
    }

    async fn sign_message(&self, message: &str) -> Result<String, ClientError> {
        OktoClient::sign_message(self, message).await
    }

    async fn sign_typed_data(&self, typed_data: Value) -> Result<String, ClientError> {
        OktoClient::sign_typed_data(self, &typed_data).await
    }

    fn evm_raw_transaction(&self, caip2_id: &str, transaction: RawTransaction) -> UserOp {
        OktoClient::evm_raw_transaction(self, caip2_id, transaction)
    }

    async fn sign_user_op(&self, user_op: UserOp) -> Result<SignedUserOp, ClientError> {
        OktoClient::sign_user_op(self, user_op).await
    }

    async fn execute_user_op(&self, signed: SignedUserOp) -> Result<String, ClientError> {
        OktoClient::execute_user_op(self, signed).await
    }

    fn session_clear(&self) {
        OktoClient::session_clear(self)
    }
}
