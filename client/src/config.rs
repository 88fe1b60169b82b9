//! Client configuration

use std::path::PathBuf;

/// Okto gateway environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Sandbox,
    Production,
}

impl Environment {
    /// Base URL of the gateway RPC endpoint.
    pub fn gateway_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => "https://sandbox-api.okto.tech",
            Environment::Production => "https://apigw.okto.tech",
        }
    }

    /// Hosted onboarding page used by the browser login flows.
    pub fn auth_page_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => "https://sandbox-onboarding.okto.tech/auth",
            Environment::Production => "https://onboarding.okto.tech/auth",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Environment::Sandbox),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Immutable client configuration, captured once at connector creation.
#[derive(Debug, Clone)]
pub struct OktoClientConfig {
    pub environment: Environment,

    /// Client API secret issued by the Okto dashboard.
    ///
    /// Doubles as the symmetric secret for the persisted session blob.
    pub client_private_key: String,

    /// Client smart wallet address.
    pub client_swa: String,

    /// Overrides the environment's gateway URL when set.
    pub gateway_url: Option<String>,

    /// Overrides the default storage directory when set.
    pub data_dir: Option<PathBuf>,
}

impl OktoClientConfig {
    pub fn new(
        environment: Environment,
        client_private_key: impl Into<String>,
        client_swa: impl Into<String>,
    ) -> Self {
        Self {
            environment,
            client_private_key: client_private_key.into(),
            client_swa: client_swa.into(),
            gateway_url: None,
            data_dir: None,
        }
    }

    pub fn resolved_gateway_url(&self) -> &str {
        self.gateway_url
            .as_deref()
            .unwrap_or_else(|| self.environment.gateway_url())
    }
}
