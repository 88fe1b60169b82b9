//! Gateway RPC transport
//!
//! JSON-RPC 2.0 over HTTPS against the Okto gateway. Authenticated calls
//! carry the session token as a bearer header.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ClientError;

/// Timeout for gateway requests
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-RPC request ID counter
static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// JSON-RPC 2.0 request
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    #[allow(dead_code)]
    jsonrpc: String,
    result: Option<T>,
    error: Option<JsonRpcError>,
    #[allow(dead_code)]
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[allow(dead_code)]
    data: Option<Value>,
}

pub struct Gateway {
    client: reqwest::Client,
    endpoint: String,
}

impl Gateway {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            endpoint: format!("{}/rpc", base_url.trim_end_matches('/')),
        }
    }

    /// Execute a gateway call, optionally authenticated by a session token.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
        session_token: Option<&str>,
    ) -> Result<T, ClientError> {
        let id = REQUEST_ID.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        debug!("gateway call {method} (id {id})");

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(token) = session_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?.error_for_status()?;
        let json_response: JsonRpcResponse<T> = response.json().await?;

        if let Some(error) = json_response.error {
            return Err(ClientError::Gateway {
                code: error.code,
                message: error.message,
            });
        }

        json_response.result.ok_or(ClientError::Gateway {
            code: -32603,
            message: "missing result in gateway response".to_string(),
        })
    }
}
