//! Wallet-framework connector
//!
//! Adapts the provider to the connector contract wallet frameworks expect:
//! connect/disconnect, account and chain queries, chain switching restricted
//! to the configured list, and change events re-emitted in connector shape.
//!
//! The provider is created lazily on first use and shared for the lifetime of
//! the connector. "Shim disconnect" emulates a disconnected state for a
//! custodial wallet that has no real notion of one: a storage flag written on
//! disconnect makes `is_authorized` report false until the next connect.

use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;
use tracing::{info, warn};

use okto_client::{
    Environment, FileStore, KeyValueStore, LoginType, OktoClient, OktoClientConfig,
};
use okto_provider::{OktoApi, OktoProvider, ProviderError, ProviderEvent};

use crate::error::ConnectorError;

/// Storage key for the shim-disconnect flag.
///
/// Written after `session_clear` wipes the store, so the flag survives the
/// wipe it rides along with.
pub const DISCONNECTED_KEY: &str = "okto.disconnected";

/// Tag under which the connector registers its provider listener. Reusing the
/// tag keeps registration idempotent across repeated connects.
const LISTENER_TAG: &str = "connector";

pub const CONNECTOR_ID: &str = "okto";
pub const CONNECTOR_NAME: &str = "Okto";
pub const CONNECTOR_TYPE: &str = "okto";

#[derive(Debug, Clone)]
pub struct ConnectorOptions {
    pub environment: Environment,
    pub client_private_key: String,
    pub client_swa: String,
    /// Emulate a disconnected state via a storage flag.
    pub shim_disconnect: bool,
    pub login_type: LoginType,
    /// Chains `switch_chain` is allowed to target. Empty means unrestricted.
    pub chains: Vec<u64>,
}

impl ConnectorOptions {
    pub fn new(
        environment: Environment,
        client_private_key: impl Into<String>,
        client_swa: impl Into<String>,
    ) -> Self {
        Self {
            environment,
            client_private_key: client_private_key.into(),
            client_swa: client_swa.into(),
            shim_disconnect: true,
            login_type: LoginType::Generic,
            chains: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// Result of a successful connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectData {
    pub accounts: Vec<String>,
    pub chain_id: u64,
}

/// Connector-shaped change notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorEvent {
    Connect { chain_id: u64 },
    Disconnect,
    Change {
        accounts: Option<Vec<String>>,
        chain_id: Option<u64>,
    },
}

pub type ConnectorListener = Arc<dyn Fn(&ConnectorEvent) + Send + Sync>;

pub struct OktoConnector {
    options: ConnectorOptions,
    api: Arc<dyn OktoApi>,
    store: Arc<dyn KeyValueStore>,
    provider: OnceCell<Arc<OktoProvider>>,
    status: Mutex<ConnectorStatus>,
    listeners: Arc<Mutex<Vec<ConnectorListener>>>,
}

impl OktoConnector {
    /// Build a connector backed by a real gateway client and the default
    /// file store.
    pub fn new(options: ConnectorOptions) -> Self {
        let config = OktoClientConfig::new(
            options.environment,
            options.client_private_key.clone(),
            options.client_swa.clone(),
        );
        // The client owns session persistence; the connector only needs the
        // store for the shim-disconnect flag, so both share one handle.
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open_default());
        let client = OktoClient::new(config, store.clone());
        Self::with_parts(options, Arc::new(client), store)
    }

    /// Build a connector from explicit parts.
    pub fn with_parts(
        options: ConnectorOptions,
        api: Arc<dyn OktoApi>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            options,
            api,
            store,
            provider: OnceCell::new(),
            status: Mutex::new(ConnectorStatus::Disconnected),
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn id(&self) -> &'static str {
        CONNECTOR_ID
    }

    pub fn name(&self) -> &'static str {
        CONNECTOR_NAME
    }

    pub fn connector_type(&self) -> &'static str {
        CONNECTOR_TYPE
    }

    pub fn status(&self) -> ConnectorStatus {
        *self.status.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn set_status(&self, status: ConnectorStatus) {
        *self.status.lock().unwrap_or_else(|p| p.into_inner()) = status;
    }

    /// The shared provider, created on first use.
    pub fn provider(&self) -> &Arc<OktoProvider> {
        self.provider.get_or_init(|| {
            let provider = Arc::new(OktoProvider::new(self.api.clone()));
            self.wire_events(&provider);
            provider
        })
    }

    /// Register a listener for connector events.
    pub fn subscribe(&self, listener: ConnectorListener) {
        self.listeners
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(listener);
    }

    fn wire_events(&self, provider: &OktoProvider) {
        let listeners = self.listeners.clone();
        provider.events().subscribe(
            LISTENER_TAG,
            Arc::new(move |event| {
                let mapped = match event {
                    ProviderEvent::Connect { chain_id } => ConnectorEvent::Connect {
                        chain_id: *chain_id,
                    },
                    ProviderEvent::Disconnect => ConnectorEvent::Disconnect,
                    ProviderEvent::AccountsChanged(accounts) => ConnectorEvent::Change {
                        accounts: Some(accounts.clone()),
                        chain_id: None,
                    },
                    ProviderEvent::ChainChanged(chain_id) => ConnectorEvent::Change {
                        accounts: None,
                        chain_id: Some(*chain_id),
                    },
                };
                for listener in listeners.lock().unwrap_or_else(|p| p.into_inner()).iter() {
                    listener(&mapped);
                }
            }),
        );
    }

    /// Connect, logging in if necessary, optionally landing on a specific
    /// chain.
    pub async fn connect(&self, chain_id: Option<u64>) -> Result<ConnectData, ConnectorError> {
        self.set_status(ConnectorStatus::Connecting);

        let provider = self.provider().clone();
        // Re-register after a disconnect tore the subscription down. The
        // tag makes repeated registration idempotent.
        self.wire_events(&provider);
        if let Err(e) = provider.connect(self.options.login_type.clone()).await {
            self.set_status(ConnectorStatus::Disconnected);
            return Err(e.into());
        }

        if let Some(target) = chain_id {
            if provider.chain_id() != target {
                // The requested chain is a preference, not a requirement.
                if let Err(e) = self.switch_chain(target).await {
                    warn!("staying on chain {}: {e}", provider.chain_id());
                }
            }
        }

        if self.options.shim_disconnect {
            self.store.remove(DISCONNECTED_KEY);
        }
        self.set_status(ConnectorStatus::Connected);

        let data = ConnectData {
            accounts: vec![provider.address()],
            chain_id: provider.chain_id(),
        };
        info!(
            "connected {} on chain {}",
            data.accounts.first().map(String::as_str).unwrap_or(""),
            data.chain_id
        );
        Ok(data)
    }

    /// Tear the session down. Never fails.
    pub fn disconnect(&self) {
        let provider = self.provider();
        provider.disconnect();
        provider.events().unsubscribe(LISTENER_TAG);
        if self.options.shim_disconnect {
            // After the store wipe inside disconnect, so the flag sticks.
            self.store.set(DISCONNECTED_KEY, "true");
        }
        self.set_status(ConnectorStatus::Disconnected);
    }

    /// Whether a previous session can be resumed without a fresh login.
    ///
    /// The shim flag short-circuits without touching the gateway; otherwise
    /// the account list is probed and any failure reads as not-authorized.
    pub async fn is_authorized(&self) -> bool {
        if self.options.shim_disconnect && self.store.get(DISCONNECTED_KEY).is_some() {
            return false;
        }
        match self.get_accounts().await {
            Ok(accounts) => accounts.iter().any(|account| !account.is_empty()),
            Err(_) => false,
        }
    }

    pub async fn get_accounts(&self) -> Result<Vec<String>, ConnectorError> {
        let provider = self.provider();
        if provider.address().is_empty() {
            provider.update_account().await?;
        }
        Ok(vec![provider.address()])
    }

    pub fn get_chain_id(&self) -> u64 {
        self.provider().chain_id()
    }

    /// Switch to a chain from the configured list.
    pub async fn switch_chain(&self, chain_id: u64) -> Result<u64, ConnectorError> {
        if !self.options.chains.is_empty() && !self.options.chains.contains(&chain_id) {
            return Err(ConnectorError::ChainNotConfigured(chain_id));
        }
        self.provider().switch_chain(chain_id).await?;
        Ok(chain_id)
    }

    /// Forward a raw request to the provider.
    pub async fn request(
        &self,
        request: okto_provider::RpcRequest,
    ) -> Result<serde_json::Value, ProviderError> {
        self.provider().request(request).await
    }
}
