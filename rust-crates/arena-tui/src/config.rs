use crate::walrus_client::{
    DEFAULT_AGGREGATOR_URL,
    DEFAULT_PUBLISHERS,
};
use arena_engine::tournament::{
    DEFAULT_COUNTDOWN_SECS,
    DEFAULT_TOTAL_GAMES,
};
use clap::{
    Parser,
    ValueEnum,
};
use std::{
    fmt,
    path::PathBuf,
    time::Duration,
};
use tracing::warn;
use url::Url;

pub const DEFAULT_MOVE_INTERVAL_MS: u64 = 1200;
pub const DEFAULT_DATA_ROOT: &str = "./arena_data";
pub const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum NetworkEnv {
    #[default]
    Testnet,
    Devnet,
    Mainnet,
    Local,
}

impl NetworkEnv {
    pub fn dir_name(&self) -> &'static str {
        match self {
            NetworkEnv::Testnet => "testnet",
            NetworkEnv::Devnet => "devnet",
            NetworkEnv::Mainnet => "mainnet",
            NetworkEnv::Local => "local",
        }
    }

    pub fn fullnode_url(&self) -> &'static str {
        match self {
            NetworkEnv::Testnet => "https://fullnode.testnet.sui.io:443",
            NetworkEnv::Devnet => "https://fullnode.devnet.sui.io:443",
            NetworkEnv::Mainnet => "https://fullnode.mainnet.sui.io:443",
            NetworkEnv::Local => "http://127.0.0.1:9000",
        }
    }
}

impl fmt::Display for NetworkEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LookupKind {
    /// Raw Move fields
    #[default]
    Object,
    Agent,
    Battle,
    Tournament,
}

/// Terminal client for the AI battle arena
#[derive(Parser, Debug, Clone)]
#[command(name = "arena-tui", version)]
pub struct Args {
    /// Sui network used for object lookups
    #[arg(long, env = "ARENA_SUI_NETWORK", value_enum, default_value_t = NetworkEnv::Testnet)]
    pub network: NetworkEnv,

    /// Override the fullnode RPC URL for the selected network
    #[arg(long, env = "ARENA_SUI_RPC_URL")]
    pub rpc_url: Option<String>,

    #[arg(long, env = "ARENA_WALRUS_AGGREGATOR_URL", default_value = DEFAULT_AGGREGATOR_URL)]
    pub aggregator_url: String,

    /// Comma separated publisher URLs, tried in order
    #[arg(long, env = "ARENA_WALRUS_PUBLISHERS", value_delimiter = ',')]
    pub publishers: Vec<String>,

    /// Wallet profile used for betting
    #[arg(long)]
    pub wallet: Option<String>,

    /// Wallet profile directory (defaults to ~/.arena/wallets)
    #[arg(long)]
    pub wallet_dir: Option<String>,

    /// Ledger directory (defaults to ./arena_data/<network>)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Games per tournament
    #[arg(long, default_value_t = DEFAULT_TOTAL_GAMES)]
    pub games: u32,

    /// Delay between revealed moves
    #[arg(long, default_value_t = DEFAULT_MOVE_INTERVAL_MS)]
    pub move_interval_ms: u64,

    /// Countdown per tournament game slot
    #[arg(long, default_value_t = DEFAULT_COUNTDOWN_SECS)]
    pub countdown_secs: u32,

    #[arg(long, default_value = DEFAULT_LOG_DIR)]
    pub log_dir: PathBuf,

    /// Print an on-chain object and exit instead of starting the UI
    #[arg(long)]
    pub lookup_object: Option<String>,

    #[arg(long, value_enum, default_value_t = LookupKind::Object)]
    pub lookup_kind: LookupKind,

    /// Print a stored battle from the aggregator and exit
    #[arg(long)]
    pub fetch_blob: Option<String>,

    /// List wallet profiles and exit
    #[arg(long)]
    pub list_wallets: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    pub publishers: Vec<String>,
    pub aggregator_url: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub network: NetworkEnv,
    pub rpc_url: String,
    pub relay: RelayConfig,
    pub wallet: Option<String>,
    pub wallet_dir: Option<String>,
    pub data_dir: PathBuf,
    pub total_games: u32,
    pub move_interval: Duration,
    pub countdown_secs: u32,
}

impl Args {
    pub fn relay_config(&self) -> RelayConfig {
        let publishers: Vec<String> = self
            .publishers
            .iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .filter(|url| match Url::parse(url) {
                Ok(_) => true,
                Err(err) => {
                    warn!(%url, %err, "ignoring malformed publisher URL");
                    false
                }
            })
            .collect();
        let publishers = if publishers.is_empty() {
            DEFAULT_PUBLISHERS.iter().map(|url| url.to_string()).collect()
        } else {
            publishers
        };
        RelayConfig {
            publishers,
            aggregator_url: self.aggregator_url.clone(),
        }
    }

    pub fn rpc_url(&self) -> String {
        self.rpc_url
            .clone()
            .unwrap_or_else(|| self.network.fullnode_url().to_string())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            PathBuf::from(DEFAULT_DATA_ROOT).join(self.network.dir_name())
        })
    }

    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            network: self.network,
            rpc_url: self.rpc_url(),
            relay: self.relay_config(),
            wallet: self.wallet.clone(),
            wallet_dir: self.wallet_dir.clone(),
            data_dir: self.data_dir(),
            total_games: self.games,
            move_interval: Duration::from_millis(self.move_interval_ms.max(1)),
            countdown_secs: self.countdown_secs,
        }
    }
}
