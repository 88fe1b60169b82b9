//! Okto Wallet CLI
//!
//! A command-line front end for the Okto custodial wallet connector.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use okto_client::Environment;
use okto_connector::{ConnectorOptions, OktoConnector};
use okto_provider::RpcRequest;

#[derive(Parser)]
#[command(name = "okto-wallet")]
#[command(about = "Okto custodial wallet - log in and transact over the gateway")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Gateway environment
    #[arg(long, global = true, default_value = "sandbox")]
    environment: String,

    /// Client API secret
    #[arg(long, env = "OKTO_CLIENT_PRIVATE_KEY", global = true, hide_env_values = true)]
    client_private_key: Option<String>,

    /// Client smart wallet address
    #[arg(long, env = "OKTO_CLIENT_SWA", global = true)]
    client_swa: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LoginMethod {
    /// Hosted auth page, pick the method there
    Web,
    Google,
    Apple,
    Twitter,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in through the browser
    Login {
        /// Login method
        #[arg(long, value_enum, default_value = "web")]
        method: LoginMethod,
    },

    /// Show login status
    Status,

    /// Show the active account
    Accounts,

    /// Show the active chain
    Chain,

    /// Switch to another chain
    SwitchChain {
        /// Target chain id (decimal or 0x-hex)
        chain_id: String,
    },

    /// Sign a message with the session key
    Sign {
        /// Message to sign
        message: String,
    },

    /// Send a transaction and wait for its hash
    Send {
        /// Recipient address
        to: String,

        /// Value in wei (decimal or 0x-hex)
        #[arg(long, default_value = "0")]
        value: String,

        /// Calldata as 0x-hex
        #[arg(long, default_value = "0x")]
        data: String,
    },

    /// Log out and wipe local state
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let environment: Environment = cli
        .environment
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let client_private_key = cli
        .client_private_key
        .context("missing client API secret (--client-private-key or OKTO_CLIENT_PRIVATE_KEY)")?;
    let client_swa = cli
        .client_swa
        .context("missing client wallet address (--client-swa or OKTO_CLIENT_SWA)")?;

    let mut options = ConnectorOptions::new(environment, client_private_key, client_swa);

    match cli.command {
        Commands::Login { method } => {
            options.login_type = match method {
                LoginMethod::Web => okto_client::LoginType::Generic,
                LoginMethod::Google => {
                    okto_client::LoginType::Social(okto_client::SocialProvider::Google)
                }
                LoginMethod::Apple => {
                    okto_client::LoginType::Social(okto_client::SocialProvider::Apple)
                }
                LoginMethod::Twitter => {
                    okto_client::LoginType::Social(okto_client::SocialProvider::Twitter)
                }
            };
            let connector = OktoConnector::new(options);
            let data = connector.connect(None).await?;
            println!("Logged in as {} on chain {}", data.accounts[0], data.chain_id);
        }

        Commands::Status => {
            let connector = OktoConnector::new(options);
            if connector.is_authorized().await {
                println!("Logged in");
            } else {
                println!("Not logged in");
            }
        }

        Commands::Accounts => {
            let connector = connected(options).await?;
            for account in connector.get_accounts().await? {
                println!("{account}");
            }
        }

        Commands::Chain => {
            let connector = connected(options).await?;
            println!("{}", connector.get_chain_id());
        }

        Commands::SwitchChain { chain_id } => {
            let target = parse_chain_id(&chain_id)?;
            let connector = connected(options).await?;
            connector.switch_chain(target).await?;
            println!("Switched to chain {target}");
        }

        Commands::Sign { message } => {
            let connector = connected(options).await?;
            let address = connector
                .get_accounts()
                .await?
                .into_iter()
                .next()
                .context("no account available")?;
            let signature = connector
                .request(RpcRequest::with_params(
                    "personal_sign",
                    vec![json!(message), json!(address)],
                ))
                .await?;
            println!("{}", signature.as_str().unwrap_or_default());
        }

        Commands::Send { to, value, data } => {
            let connector = connected(options).await?;
            let from = connector
                .get_accounts()
                .await?
                .into_iter()
                .next()
                .context("no account available")?;
            let hash = connector
                .request(RpcRequest::with_params(
                    "eth_sendTransaction",
                    vec![json!({
                        "from": from,
                        "to": to,
                        "value": value,
                        "data": data,
                    })],
                ))
                .await?;
            println!("{}", hash.as_str().unwrap_or_default());
        }

        Commands::Logout => {
            let connector = OktoConnector::new(options);
            connector.disconnect();
            println!("Logged out");
        }
    }

    Ok(())
}

/// Connect, reusing a persisted session when one exists.
async fn connected(options: ConnectorOptions) -> Result<OktoConnector> {
    let connector = OktoConnector::new(options);
    if !connector.is_authorized().await {
        bail!("not logged in, run `okto-wallet login` first");
    }
    connector.connect(None).await?;
    Ok(connector)
}

fn parse_chain_id(s: &str) -> Result<u64> {
    let parsed = match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    };
    parsed.with_context(|| format!("unparseable chain id: {s}"))
}
