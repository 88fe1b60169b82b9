//! Okto client wrapper
//!
//! Owns the gateway transport, the persisted session, and the login flows.
//! On construction the client restores a previously persisted session by
//! decrypting it with the client secret; any failure along that path is
//! treated as "no session", never as an error.

use std::sync::{Arc, RwLock};

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::auth::{browser_login, AuthData, LoginType, SocialProvider};
use crate::config::OktoClientConfig;
use crate::error::{AuthError, ClientError};
use crate::gateway::Gateway;
use crate::session::{decrypt_session, encrypt_session, SessionConfig};
use crate::storage::{FileStore, KeyValueStore, SESSION_KEY};
use crate::types::{Order, RawTransaction, SignedUserOp, UserOp, Wallet};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticateResult {
    session: SessionConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureResult {
    signature: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteResult {
    intent_id: String,
}

pub struct OktoClient {
    config: OktoClientConfig,
    gateway: Gateway,
    store: Arc<dyn KeyValueStore>,
    session: RwLock<Option<SessionConfig>>,
}

impl OktoClient {
    /// Create a client backed by the given store, restoring any persisted
    /// session.
    pub fn new(config: OktoClientConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let gateway = Gateway::new(config.resolved_gateway_url());

        let session = store
            .get(SESSION_KEY)
            .and_then(|encrypted| decrypt_session::<SessionConfig>(&encrypted, &config.client_private_key))
            .filter(|session| {
                if session.is_expired() {
                    warn!("persisted session has expired, ignoring it");
                    return false;
                }
                true
            });
        if session.is_some() {
            debug!("restored persisted session");
        }

        Self {
            config,
            gateway,
            store,
            session: RwLock::new(session),
        }
    }

    /// Create a client backed by the default file store.
    pub fn with_default_store(config: OktoClientConfig) -> Self {
        let store: Arc<dyn KeyValueStore> = match &config.data_dir {
            Some(dir) => Arc::new(FileStore::new(dir)),
            None => Arc::new(FileStore::open_default()),
        };
        Self::new(config, store)
    }

    pub fn config(&self) -> &OktoClientConfig {
        &self.config
    }

    pub fn is_logged_in(&self) -> bool {
        self.session().is_some()
    }

    /// Smart wallet address of the authenticated user, if any.
    pub fn user_swa(&self) -> Option<String> {
        self.session().map(|s| s.user_swa)
    }

    fn session(&self) -> Option<SessionConfig> {
        self.session
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    fn session_token(&self) -> Result<String, ClientError> {
        self.session()
            .map(|s| s.session_token)
            .ok_or(ClientError::NoSession)
    }

    /// Install a session without persisting it.
    pub fn set_session_config(&self, session: SessionConfig) {
        *self.session.write().unwrap_or_else(|p| p.into_inner()) = Some(session);
    }

    fn persist_session(&self, session: &SessionConfig) {
        let encrypted = encrypt_session(session, &self.config.client_private_key);
        if encrypted.is_empty() {
            // encrypt_session already logged why; the login still succeeds,
            // it just won't survive a restart.
            warn!("session not persisted");
            return;
        }
        self.store.set(SESSION_KEY, &encrypted);
    }

    /// Log in according to the given login type.
    ///
    /// Returns the user's smart wallet address.
    pub async fn login(&self, login: &LoginType) -> Result<String, ClientError> {
        match login {
            LoginType::OAuth(auth) => self.login_using_oauth(auth.clone()).await,
            LoginType::Social(provider) => self.login_using_social(*provider).await,
            LoginType::Generic => self.authenticate_with_web_view().await,
        }
    }

    /// Exchange an OAuth id token for a session.
    pub async fn login_using_oauth(&self, auth: AuthData) -> Result<String, ClientError> {
        let result: AuthenticateResult = self
            .gateway
            .call(
                "authenticate",
                json!({
                    "idToken": auth.id_token,
                    "provider": auth.provider,
                    "clientSwa": self.config.client_swa,
                }),
                None,
            )
            .await
            .map_err(wrap_auth_error)?;

        let session = result.session;
        info!("authenticated as {}", session.user_swa);
        self.persist_session(&session);
        let user_swa = session.user_swa.clone();
        self.set_session_config(session);
        Ok(user_swa)
    }

    /// Browser login pinned to one social provider.
    pub async fn login_using_social(
        &self,
        provider: SocialProvider,
    ) -> Result<String, ClientError> {
        let auth = browser_login(self.config.environment.auth_page_url(), Some(provider)).await?;
        self.login_using_oauth(auth).await
    }

    /// Browser login on the hosted auth page, user picks the method.
    pub async fn authenticate_with_web_view(&self) -> Result<String, ClientError> {
        let auth = browser_login(self.config.environment.auth_page_url(), None).await?;
        self.login_using_oauth(auth).await
    }

    /// Refresh the gateway-side key material backing the session.
    pub async fn sync_user_keys(&self) -> Result<(), ClientError> {
        let token = self.session_token()?;
        let _: Value = self
            .gateway
            .call("syncUserKeys", json!({}), Some(&token))
            .await?;
        Ok(())
    }

    pub async fn sign_message(&self, message: &str) -> Result<String, ClientError> {
        let token = self.session_token()?;
        let result: SignatureResult = self
            .gateway
            .call("signMessage", json!({ "message": message }), Some(&token))
            .await?;
        Ok(result.signature)
    }

    pub async fn sign_typed_data(&self, typed_data: &Value) -> Result<String, ClientError> {
        let token = self.session_token()?;
        let result: SignatureResult = self
            .gateway
            .call("signTypedData", json!({ "typedData": typed_data }), Some(&token))
            .await?;
        Ok(result.signature)
    }

    /// Build a user operation around one raw EVM transaction.
    ///
    /// Construction is local; nothing is submitted until the op is signed and
    /// executed.
    pub fn evm_raw_transaction(&self, caip2_id: &str, transaction: RawTransaction) -> UserOp {
        UserOp::new(caip2_id, transaction, self.config.client_swa.clone())
    }

    pub async fn sign_user_op(&self, user_op: UserOp) -> Result<SignedUserOp, ClientError> {
        let token = self.session_token()?;
        self.gateway
            .call("signUserOp", serde_json::to_value(&user_op)?, Some(&token))
            .await
    }

    /// Submit a signed user operation. Returns the intent id to poll.
    pub async fn execute_user_op(&self, signed: SignedUserOp) -> Result<String, ClientError> {
        let token = self.session_token()?;
        let result: ExecuteResult = self
            .gateway
            .call("execute", serde_json::to_value(&signed)?, Some(&token))
            .await?;
        Ok(result.intent_id)
    }

    /// All accounts of the authenticated user, across chains.
    pub async fn get_account(&self) -> Result<Vec<Wallet>, ClientError> {
        let token = self.session_token()?;
        self.gateway.call("getAccount", json!({}), Some(&token)).await
    }

    /// Order history filtered to one intent id.
    pub async fn get_orders_history(&self, intent_id: &str) -> Result<Vec<Order>, ClientError> {
        let token = self.session_token()?;
        self.gateway
            .call(
                "getOrdersHistory",
                json!({ "intentId": intent_id }),
                Some(&token),
            )
            .await
    }

    /// Drop the session and wipe persisted state.
    ///
    /// Clears every key in the store, not just the session blob - unrelated
    /// keys (such as the shim-disconnect flag) go with it. See DESIGN.md.
    pub fn session_clear(&self) {
        warn!("clearing session: wiping all persisted connector state");
        self.store.clear_all();
        *self.session.write().unwrap_or_else(|p| p.into_inner()) = None;
    }
}

/// Wrap gateway-reported authentication failures into the human-readable
/// taxonomy; transport errors pass through untouched.
fn wrap_auth_error(error: ClientError) -> ClientError {
    match error {
        ClientError::Gateway { message, .. } => ClientError::Auth(AuthError::classify(message)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::storage::MemoryStore;

    const SECRET: &str = "0xdeadbeefcafe";

    fn test_config() -> OktoClientConfig {
        OktoClientConfig::new(Environment::Sandbox, SECRET, "0xClientSwa")
    }

    fn test_session() -> SessionConfig {
        SessionConfig {
            session_id: "sess".to_string(),
            session_token: "tok".to_string(),
            session_pub_key: String::new(),
            user_swa: "0xUserSwa".to_string(),
            client_swa: "0xClientSwa".to_string(),
            expires_at: None,
        }
    }

    #[test]
    fn test_restores_persisted_session() {
        let store = Arc::new(MemoryStore::new());
        let session = test_session();
        store.set(SESSION_KEY, &encrypt_session(&session, SECRET));

        let client = OktoClient::new(test_config(), store);
        assert!(client.is_logged_in());
        assert_eq!(client.user_swa().as_deref(), Some("0xUserSwa"));
    }

    #[test]
    fn test_undecryptable_session_means_logged_out() {
        let store = Arc::new(MemoryStore::new());
        store.set(
            SESSION_KEY,
            &encrypt_session(&test_session(), "some-other-secret"),
        );

        let client = OktoClient::new(test_config(), store);
        assert!(!client.is_logged_in());
        assert_eq!(client.user_swa(), None);
    }

    #[test]
    fn test_expired_session_not_restored() {
        let store = Arc::new(MemoryStore::new());
        let mut session = test_session();
        session.expires_at = Some(0);
        store.set(SESSION_KEY, &encrypt_session(&session, SECRET));

        let client = OktoClient::new(test_config(), store);
        assert!(!client.is_logged_in());
        assert_eq!(client.user_swa(), None);
    }

    #[test]
    fn test_missing_session_means_logged_out() {
        let client = OktoClient::new(test_config(), Arc::new(MemoryStore::new()));
        assert!(!client.is_logged_in());
        assert!(matches!(
            client.session_token(),
            Err(ClientError::NoSession)
        ));
    }

    #[test]
    fn test_session_clear_wipes_every_key() {
        let store = Arc::new(MemoryStore::new());
        store.set(SESSION_KEY, &encrypt_session(&test_session(), SECRET));
        store.set("okto.disconnected", "true");

        let client = OktoClient::new(test_config(), store.clone());
        assert!(client.is_logged_in());

        client.session_clear();
        assert!(!client.is_logged_in());
        assert_eq!(store.get(SESSION_KEY), None);
        // Collateral clearing is part of the contract.
        assert_eq!(store.get("okto.disconnected"), None);
    }

    #[test]
    fn test_wrap_auth_error_classifies_gateway_messages() {
        let wrapped = wrap_auth_error(ClientError::Gateway {
            code: -32000,
            message: "id token expired".to_string(),
        });
        assert!(matches!(
            wrapped,
            ClientError::Auth(AuthError::TokenRejected(_))
        ));

        let passthrough = wrap_auth_error(ClientError::NoSession);
        assert!(matches!(passthrough, ClientError::NoSession));
    }
}
