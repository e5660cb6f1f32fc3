//! Karma Supply API Server Binary
//!
//! Serves token version, stats, balances and circulating supply for an
//! EOSIO token by proxying a chain API node.

use clap::Parser;
use karma_supply::api::ApiServer;
use karma_supply::config::SupplyConfig;
use karma_supply::upstream::HttpChainClient;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "karma-supply")]
#[command(about = "Token supply proxy for an EOSIO chain API node", long_about = None)]
struct Args {
    /// TOML configuration file; flags below override its values
    #[arg(long)]
    config: Option<String>,

    /// API server host
    #[arg(long)]
    host: Option<String>,

    /// API server port
    #[arg(long)]
    port: Option<u16>,

    /// Chain API base URL (e.g. http://mainnet.eoscalgary.io/v1)
    #[arg(long)]
    node_url: Option<String>,

    /// Token contract account
    #[arg(long)]
    contract: Option<String>,

    /// Token symbol
    #[arg(long)]
    symbol: Option<String>,

    /// Decimal places of reported amounts
    #[arg(long)]
    decimals: Option<u32>,

    /// Accounts excluded from circulating supply (comma-separated, in order)
    #[arg(long, value_delimiter = ',')]
    exclude: Option<Vec<String>>,

    /// Allowed CORS origins (comma-separated, use * for all)
    #[arg(long, value_delimiter = ',')]
    cors_origins: Option<Vec<String>>,

    /// Upstream request timeout in seconds
    #[arg(long)]
    upstream_timeout: Option<u64>,
}

impl Args {
    fn apply(self, config: &mut SupplyConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(origins) = self.cors_origins {
            config.server.allowed_origins = origins.into_iter().map(|s| s.trim().to_string()).collect();
        }
        if let Some(url) = self.node_url {
            config.upstream.base_url = url;
        }
        if let Some(timeout) = self.upstream_timeout {
            config.upstream.timeout_secs = Some(timeout);
        }
        if let Some(contract) = self.contract {
            config.token.contract = contract;
        }
        if let Some(symbol) = self.symbol {
            config.token.symbol = symbol;
        }
        if let Some(decimals) = self.decimals {
            config.token.decimals = decimals;
        }
        if let Some(exclude) = self.exclude {
            config.token.excluded_accounts = exclude
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "karma_supply=info,tower_http=debug".into()),
        )
        .init();

    let mut args = Args::parse();

    let mut config = match args.config.take() {
        Some(path) => {
            info!("Loading configuration from {}", path);
            SupplyConfig::from_file(&path)?
        }
        None => SupplyConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;

    let chain = HttpChainClient::new(&config.upstream, &config.token)?;
    let server = ApiServer::new(config, Arc::new(chain));
    server.run().await?;

    Ok(())
}
