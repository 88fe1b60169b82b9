//! EIP-1193 provider adapter
//!
//! Implements the standard `connect` / `disconnect` / `request` provider
//! surface on top of the gateway client. Holds the current chain, address and
//! account list; all mutation goes through `connect`, `update_account` and
//! `switch_chain`. The runtime is genuinely parallel, so state lives behind a
//! mutex - guards are never held across await points.
//!
//! Signing methods honor the fail-soft contract: an address mismatch or a
//! signing failure degrades to the placeholder signature `0x` instead of
//! propagating, with a warn log marking every degraded call.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use okto_client::types::EIP155_PREFIX;
use okto_client::{LoginType, Wallet};

use crate::api::OktoApi;
use crate::convert::{normalize_transaction, number_to_hex, parse_chain_id};
use crate::error::ProviderError;
use crate::events::{EventListeners, ProviderEvent};
use crate::polling::wait_for_transaction_hash;

/// Zero-byte signature returned on degraded signing paths.
const PLACEHOLDER_SIGNATURE: &str = "0x";

/// A JSON-RPC-shaped provider request.
#[derive(Debug, Clone)]
pub struct RpcRequest {
    pub method: String,
    pub params: Vec<Value>,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// A user account projected onto one EVM chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthAccount {
    pub chain_id: u64,
    pub address: String,
}

struct ProviderState {
    chain: u64,
    address: String,
    /// Wallet list as fetched from the gateway. Cached after the first fetch
    /// and never invalidated. See DESIGN.md.
    accounts: Vec<Wallet>,
}

pub struct OktoProvider {
    api: Arc<dyn OktoApi>,
    state: Mutex<ProviderState>,
    events: EventListeners,
}

impl OktoProvider {
    pub fn new(api: Arc<dyn OktoApi>) -> Self {
        Self {
            api,
            state: Mutex::new(ProviderState {
                chain: 1,
                address: String::new(),
                accounts: Vec::new(),
            }),
            events: EventListeners::new(),
        }
    }

    pub fn events(&self) -> &EventListeners {
        &self.events
    }

    pub fn chain_id(&self) -> u64 {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).chain
    }

    pub fn address(&self) -> String {
        self.state
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .address
            .clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.api.is_logged_in()
    }

    /// Authenticate (unless a user is already present) and refresh local
    /// account state.
    pub async fn connect(&self, login: LoginType) -> Result<(), ProviderError> {
        self.events.emit(&ProviderEvent::Connect {
            chain_id: self.chain_id(),
        });

        if self.api.user_swa().is_none() {
            let user_swa = self.api.login(login).await?;
            info!("provider connected as {user_swa}");
        }

        self.update_account().await
    }

    /// Clear the session and notify listeners. Never fails.
    pub fn disconnect(&self) {
        self.events.emit(&ProviderEvent::Disconnect);
        self.api.session_clear();
    }

    /// Dispatch a JSON-RPC-shaped request.
    pub async fn request(&self, request: RpcRequest) -> Result<Value, ProviderError> {
        match request.method.as_str() {
            "eth_accounts" => Ok(json!([self.address()])),

            "eth_chainId" | "net_version" => Ok(Value::String(number_to_hex(self.chain_id()))),

            "wallet_switchEthereumChain" => {
                let target = request
                    .params
                    .first()
                    .and_then(parse_chain_id)
                    .ok_or_else(|| {
                        ProviderError::InvalidParams("missing or unparseable chain id".into())
                    })?;
                self.switch_chain(target).await?;
                Ok(Value::Bool(true))
            }

            "personal_sign" => {
                let signature = self
                    .fail_soft("personal_sign", self.try_personal_sign(&request.params))
                    .await;
                Ok(Value::String(signature))
            }

            "eth_sign" => {
                let signature = self
                    .fail_soft("eth_sign", self.try_eth_sign(&request.params))
                    .await;
                Ok(Value::String(signature))
            }

            "eth_signTypedData" | "eth_signTypedData_v4" => {
                let signature = self
                    .fail_soft("eth_signTypedData", self.try_sign_typed_data(&request.params))
                    .await;
                Ok(Value::String(signature))
            }

            "eth_sendTransaction" => {
                let hash = self.send_transaction(&request.params).await?;
                Ok(Value::String(hash))
            }

            other => Err(ProviderError::NotImplemented(other.to_string())),
        }
    }

    /// Refresh cached chain and address from the wallet list and announce the
    /// account to listeners.
    pub async fn update_account(&self) -> Result<(), ProviderError> {
        let accounts = self.eth_accounts().await?;
        self.api.sync_user_keys().await?;

        let first = accounts.first().ok_or(ProviderError::NoAccounts)?;
        let address = {
            let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
            state.chain = first.chain_id;
            state.address = first.address.clone();
            state.address.clone()
        };

        self.events
            .emit(&ProviderEvent::AccountsChanged(vec![address]));
        Ok(())
    }

    /// Point the provider at another chain the user has an account on.
    pub async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        let accounts = self.eth_accounts().await?;
        let account = accounts
            .into_iter()
            .find(|account| account.chain_id == chain_id)
            .ok_or(ProviderError::ChainNotSupported)?;

        {
            let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
            state.chain = chain_id;
            state.address = account.address;
        }

        self.events.emit(&ProviderEvent::ChainChanged(chain_id));
        Ok(())
    }

    /// EVM accounts of the user, from the (cached-forever) wallet list.
    async fn eth_accounts(&self) -> Result<Vec<EthAccount>, ProviderError> {
        let cached = {
            let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
            state.accounts.clone()
        };

        let wallets = if cached.is_empty() {
            let fetched = self.api.get_account().await?;
            let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
            if state.accounts.is_empty() {
                state.accounts = fetched;
            }
            state.accounts.clone()
        } else {
            cached
        };

        if wallets.is_empty() {
            return Err(ProviderError::NoAccounts);
        }

        let accounts: Vec<EthAccount> = wallets
            .iter()
            .filter_map(|wallet| {
                wallet.eip155_chain_id().map(|chain_id| EthAccount {
                    chain_id,
                    address: wallet.address.clone(),
                })
            })
            .collect();

        if accounts.is_empty() {
            return Err(ProviderError::NoEip155Accounts);
        }
        Ok(accounts)
    }

    async fn fail_soft(
        &self,
        method: &str,
        attempt: impl std::future::Future<Output = Result<String, ProviderError>>,
    ) -> String {
        match attempt.await {
            Ok(signature) => signature,
            Err(e) => {
                warn!("{method} returning placeholder signature: {e}");
                PLACEHOLDER_SIGNATURE.to_string()
            }
        }
    }

    fn require_cached_address(&self, address: &str) -> Result<(), ProviderError> {
        let cached = self.address();
        if cached.is_empty() || !cached.eq_ignore_ascii_case(address) {
            return Err(ProviderError::AddressMismatch);
        }
        Ok(())
    }

    async fn try_personal_sign(&self, params: &[Value]) -> Result<String, ProviderError> {
        let message = param_str(params, 0)?;
        let address = param_str(params, 1)?;
        self.require_cached_address(address)?;

        let signature = self.api.sign_message(message).await?;
        Ok(non_empty_or_placeholder(signature))
    }

    async fn try_eth_sign(&self, params: &[Value]) -> Result<String, ProviderError> {
        let address = param_str(params, 0)?;
        let message_hash = param_str(params, 1)?;
        if !message_hash.starts_with("0x") {
            return Err(ProviderError::AddressMismatch);
        }
        self.require_cached_address(address)?;

        let signature = self.api.sign_message(message_hash).await?;
        Ok(non_empty_or_placeholder(signature))
    }

    async fn try_sign_typed_data(&self, params: &[Value]) -> Result<String, ProviderError> {
        let address = param_str(params, 0)?;
        let typed_data = match params.get(1) {
            // Some callers serialize the typed data to a JSON string first.
            Some(Value::String(s)) => serde_json::from_str(s)
                .map_err(|e| ProviderError::InvalidParams(format!("invalid typed data: {e}")))?,
            Some(other) => other.clone(),
            None => return Err(ProviderError::InvalidParams("missing typed data".into())),
        };
        self.require_cached_address(address)?;

        let signature = self.api.sign_typed_data(typed_data).await?;
        Ok(non_empty_or_placeholder(signature))
    }

    /// Normalize, submit and resolve one transaction.
    async fn send_transaction(&self, params: &[Value]) -> Result<String, ProviderError> {
        let raw = params
            .first()
            .ok_or_else(|| ProviderError::InvalidParams("missing transaction object".into()))?;
        let normalized = normalize_transaction(raw)?;
        if let Some(gas) = normalized.gas {
            // The gateway estimates gas itself; the caller's limit is dropped.
            debug!("ignoring caller gas limit {gas}");
        }

        let caip2_id = format!("{}{}", EIP155_PREFIX, self.chain_id());
        let user_op = self.api.evm_raw_transaction(&caip2_id, normalized.transaction);
        let intent_id = {
            let signed = self.api.sign_user_op(user_op).await?;
            self.api.execute_user_op(signed).await?
        };
        debug!("submitted user operation, intent {intent_id}");

        wait_for_transaction_hash(self.api.as_ref(), &intent_id).await
    }
}

fn param_str<'a>(params: &'a [Value], index: usize) -> Result<&'a str, ProviderError> {
    params
        .get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::InvalidParams(format!("missing string param {index}")))
}

fn non_empty_or_placeholder(signature: String) -> String {
    if signature.is_empty() {
        PLACEHOLDER_SIGNATURE.to_string()
    } else {
        signature
    }
}
