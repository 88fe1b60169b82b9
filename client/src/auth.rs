//! Login flows
//!
//! OAuth logins exchange an externally obtained id token directly. Social and
//! generic logins run a browser round-trip: bind a localhost listener on a
//! random port, open the system browser at the hosted auth page with the
//! callback URL, and wait for the page to POST the result back.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::error::AuthError;

/// How long the browser flow waits for the callback before giving up.
const AUTH_CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

/// Social identity providers accepted by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialProvider {
    Google,
    Apple,
    Twitter,
}

impl fmt::Display for SocialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SocialProvider::Google => "google",
            SocialProvider::Apple => "apple",
            SocialProvider::Twitter => "twitter",
        };
        f.write_str(name)
    }
}

/// Credentials handed to the gateway's authenticate call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub id_token: String,
    pub provider: String,
}

/// How the connector should log the user in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginType {
    /// Hosted auth page, user picks the method.
    Generic,
    /// Hosted auth page pinned to one social provider.
    Social(SocialProvider),
    /// Direct token exchange, no browser involved.
    OAuth(AuthData),
}

impl Default for LoginType {
    fn default() -> Self {
        LoginType::Generic
    }
}

/// Payload the auth page posts back to the local callback server.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthCallback {
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Run the browser login round-trip and return the credentials it produced.
pub(crate) async fn browser_login(
    auth_page_url: &str,
    provider: Option<SocialProvider>,
) -> Result<AuthData, AuthError> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|e| AuthError::Other(format!("failed to bind callback listener: {e}")))?;
    let port = listener
        .local_addr()
        .map_err(|e| AuthError::Other(format!("failed to read listener address: {e}")))?
        .port();

    let callback_url = format!("http://127.0.0.1:{port}/callback");
    let mut auth_url = format!(
        "{auth_page_url}?callback={}",
        urlencoding::encode(&callback_url)
    );
    if let Some(provider) = provider {
        auth_url.push_str(&format!("&provider={provider}"));
    }

    info!("opening browser for login on port {port}");
    open::that(&auth_url)
        .map_err(|e| AuthError::Other(format!("failed to open browser: {e}")))?;

    tokio::select! {
        result = wait_for_callback(listener) => result,
        _ = tokio::time::sleep(AUTH_CALLBACK_TIMEOUT) => Err(AuthError::Timeout(format!(
            "authentication timed out after {} seconds",
            AUTH_CALLBACK_TIMEOUT.as_secs()
        ))),
    }
}

async fn wait_for_callback(listener: TcpListener) -> Result<AuthData, AuthError> {
    loop {
        let (mut stream, _) = listener
            .accept()
            .await
            .map_err(|e| AuthError::Other(format!("callback accept failed: {e}")))?;

        let mut buffer = vec![0u8; 16384];
        let n = stream
            .read(&mut buffer)
            .await
            .map_err(|e| AuthError::Other(format!("callback read failed: {e}")))?;
        let request = String::from_utf8_lossy(&buffer[..n]).into_owned();
        debug!("callback request: {}", request.lines().next().unwrap_or(""));

        if request.starts_with("OPTIONS") {
            let _ = stream.write_all(CORS_PREFLIGHT.as_bytes()).await;
            continue;
        }

        if !request.starts_with("POST /callback") {
            let _ = stream.write_all(NOT_FOUND.as_bytes()).await;
            continue;
        }

        match parse_callback(&request) {
            Some(callback) => {
                let _ = stream.write_all(json_response(true).as_bytes()).await;
                if let Some(error) = callback.error {
                    return Err(AuthError::classify(error));
                }
                let id_token = callback.id_token.ok_or_else(|| {
                    AuthError::TokenRejected("callback carried no id token".to_string())
                })?;
                return Ok(AuthData {
                    id_token,
                    provider: callback.provider.unwrap_or_else(|| "okto".to_string()),
                });
            }
            None => {
                let _ = stream.write_all(json_response(false).as_bytes()).await;
                return Err(AuthError::Other("invalid callback payload".to_string()));
            }
        }
    }
}

fn parse_callback(request: &str) -> Option<AuthCallback> {
    let body = request
        .split_once("\r\n\r\n")
        .or_else(|| request.split_once("\n\n"))?
        .1
        .trim();
    serde_json::from_str(body).ok()
}

const CORS_PREFLIGHT: &str = "HTTP/1.1 204 No Content\r\n\
     Access-Control-Allow-Origin: *\r\n\
     Access-Control-Allow-Methods: POST, OPTIONS\r\n\
     Access-Control-Allow-Headers: Content-Type\r\n\
     Connection: close\r\n\r\n";

const NOT_FOUND: &str =
    "HTTP/1.1 404 Not Found\r\nConnection: close\r\nContent-Length: 0\r\n\r\n";

fn json_response(success: bool) -> String {
    let body = if success {
        r#"{"ok":true}"#
    } else {
        r#"{"ok":false}"#
    };
    format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: application/json\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Connection: close\r\n\
         Content-Length: {}\r\n\r\n{}",
        body.len(),
        body
    )
}
