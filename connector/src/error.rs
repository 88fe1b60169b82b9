use okto_provider::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The requested chain is not in the connector's configured chain list.
    #[error("chain {0} is not configured")]
    ChainNotConfigured(u64),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}
