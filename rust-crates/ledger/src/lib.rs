pub mod ledger;

pub mod records;

pub mod store;

pub use ledger::{
    BetSummary,
    ContestantStats,
    Ledger,
    MatchSettlement,
    SettlementSummary,
};
pub use store::KeyValueStore;

pub type Result<T, E = anyhow::Error> = std::result::Result<T, E>;

/// Global match history list.
pub const GAME_HISTORY_KEY: &str = "gameHistory";

/// Flat bet list written before bets were kept per wallet.
pub const LEGACY_BETS_KEY: &str = "userBets";

/// Prefix of the per-wallet bet lists, `bets_<address>`.
pub const BETS_KEY_PREFIX: &str = "bets_";

pub fn bets_key(address: &str) -> String {
    format!("{BETS_KEY_PREFIX}{address}")
}
