use crate::{
    BETS_KEY_PREFIX,
    GAME_HISTORY_KEY,
    LEGACY_BETS_KEY,
    Result,
    bets_key,
    records::{
        BetRecord,
        BetResult,
        ContestantRef,
        MatchRecord,
        NewBet,
        NewMatch,
    },
    store::KeyValueStore,
};
use anyhow::Context;
use chrono::Utc;
use serde::{
    Serialize,
    de::DeserializeOwned,
};
use std::collections::BTreeMap;

#[cfg(test)]
mod tests;

/// The participants and winner of a finished match, as settlement needs them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchSettlement {
    pub winner_id: String,
    pub participants: [String; 2],
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SettlementSummary {
    pub lists_scanned: usize,
    pub lists_updated: usize,
    pub wins: usize,
    pub losses: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContestantStats {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl ContestantStats {
    /// Share of decided games won, rounded to a whole percent.
    pub fn win_rate_percent(&self) -> u32 {
        let decided = self.wins + self.losses;
        if decided == 0 {
            return 0;
        }
        ((self.wins as f64 / decided as f64) * 100.0).round() as u32
    }
}

/// Betting totals for one wallet. Pending bets count toward the wager but not
/// toward wins or losses.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BetSummary {
    pub total_bets: usize,
    pub wins: usize,
    pub losses: usize,
    pub pending: usize,
    pub total_wagered: f64,
    pub total_won: f64,
}

impl BetSummary {
    pub fn net_profit(&self) -> f64 {
        self.total_won - self.total_wagered
    }
}

/// Match history and wallet bets kept in a [`KeyValueStore`]. Every operation is a
/// whole-list read-modify-write; concurrent writers overwrite each other.
pub struct Ledger<S> {
    store: S,
}

impl<S> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: KeyValueStore> Ledger<S> {
    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(list) => Ok(list),
            Err(err) => {
                tracing::warn!(key, %err, "malformed list in local store; treating it as empty");
                Ok(Vec::new())
            }
        }
    }

    fn write_list<T: Serialize>(&mut self, key: &str, list: &[T]) -> Result<()> {
        let raw = serde_json::to_string(list).with_context(|| format!("serialize {key}"))?;
        self.store.set(key, &raw)
    }

    pub fn history(&self) -> Result<Vec<MatchRecord>> {
        self.read_list(GAME_HISTORY_KEY)
    }

    /// Appends a finished match; its sequence number is the prior history length + 1.
    pub fn record_match(&mut self, new_match: NewMatch) -> Result<MatchRecord> {
        let mut history = self.history()?;
        let timestamp = Utc::now().timestamp_millis();
        let sequence = history.len() as u32 + 1;
        let record = MatchRecord {
            id: format!("game_{timestamp}_{sequence}"),
            timestamp,
            contestant_a: new_match.contestant_a,
            contestant_b: new_match.contestant_b,
            winner_name: new_match.winner.as_ref().map(|w| w.name.clone()),
            winner_id: new_match.winner.map(|w| w.id),
            move_count: new_match.move_count,
            storage_blob_id: None,
            match_sequence_number: sequence,
        };
        history.push(record.clone());
        self.write_list(GAME_HISTORY_KEY, &history)?;
        tracing::info!(
            match_id = %record.id,
            sequence,
            winner = record.winner_name.as_deref().unwrap_or("draw"),
            "match saved to history"
        );
        Ok(record)
    }

    /// Sets the storage identifier of a recorded match. Returns false when the match
    /// is unknown or already carries one.
    pub fn attach_blob_id(&mut self, match_id: &str, blob_id: &str) -> Result<bool> {
        let mut history = self.history()?;
        let Some(record) = history.iter_mut().find(|record| record.id == match_id) else {
            tracing::warn!(match_id, "cannot attach blob id to unknown match");
            return Ok(false);
        };
        if record.storage_blob_id.is_some() {
            return Ok(false);
        }
        record.storage_blob_id = Some(blob_id.to_string());
        self.write_list(GAME_HISTORY_KEY, &history)?;
        Ok(true)
    }

    pub fn clear_history(&mut self) -> Result<()> {
        self.store.remove(GAME_HISTORY_KEY)
    }

    pub fn bets(&self, address: &str) -> Result<Vec<BetRecord>> {
        self.read_list(&bets_key(address))
    }

    pub fn bet_summary(&self, address: &str) -> Result<BetSummary> {
        Ok(summarize_bets(&self.bets(address)?))
    }

    pub fn place_bet(&mut self, address: &str, bet: NewBet) -> Result<BetRecord> {
        let key = bets_key(address);
        let mut bets: Vec<BetRecord> = self.read_list(&key)?;
        let record = BetRecord {
            contestant_id: bet.contestant_id,
            contestant_name: bet.contestant_name,
            amount: bet.amount,
            odds: bet.odds,
            potential_payout: bet.potential_payout,
            timestamp: Utc::now().timestamp_millis(),
            transaction_ref: bet.transaction_ref,
            result: BetResult::Pending,
            payout: 0.0,
        };
        bets.push(record.clone());
        self.write_list(&key, &bets)?;
        tracing::info!(
            address,
            contestant = %record.contestant_name,
            amount = record.amount,
            "bet placed"
        );
        Ok(record)
    }

    pub fn clear_bets(&mut self, address: &str) -> Result<()> {
        self.store.remove(&bets_key(address))
    }

    /// Addresses that have a bet list in the store.
    pub fn bet_addresses(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .keys_with_prefix(BETS_KEY_PREFIX)?
            .into_iter()
            .filter_map(|key| key.strip_prefix(BETS_KEY_PREFIX).map(str::to_string))
            .collect())
    }

    pub fn legacy_bets(&self) -> Result<Vec<BetRecord>> {
        self.read_list(LEGACY_BETS_KEY)
    }

    pub fn clear_legacy_bets(&mut self) -> Result<()> {
        self.store.remove(LEGACY_BETS_KEY)
    }

    /// Resolves pending bets on the match participants in every stored bet list.
    /// Lists that fail to parse are skipped; lists without changes are not rewritten.
    pub fn settle(&mut self, settlement: &MatchSettlement) -> Result<SettlementSummary> {
        let mut summary = SettlementSummary::default();
        for address in self.bet_addresses()? {
            let key = bets_key(&address);
            let Some(raw) = self.store.get(&key)? else {
                continue;
            };
            let mut bets: Vec<BetRecord> = match serde_json::from_str(&raw) {
                Ok(bets) => bets,
                Err(err) => {
                    tracing::warn!(key, %err, "skipping malformed bet list during settlement");
                    continue;
                }
            };
            summary.lists_scanned += 1;
            let (wins, losses) = apply_settlement(&mut bets, settlement);
            if wins + losses > 0 {
                self.write_list(&key, &bets)?;
                summary.lists_updated += 1;
                summary.wins += wins;
                summary.losses += losses;
            }
        }
        tracing::info!(
            winner = %settlement.winner_id,
            wins = summary.wins,
            losses = summary.losses,
            lists = summary.lists_updated,
            "pending bets settled"
        );
        Ok(summary)
    }

    /// Win/loss/draw counts folded from the full history, keyed by contestant id.
    pub fn contestant_stats(&self) -> Result<BTreeMap<String, ContestantStats>> {
        Ok(fold_stats(&self.history()?))
    }
}

pub fn summarize_bets(bets: &[BetRecord]) -> BetSummary {
    bets.iter().fold(BetSummary::default(), |mut summary, bet| {
        summary.total_bets += 1;
        match bet.result {
            BetResult::Win => summary.wins += 1,
            BetResult::Loss => summary.losses += 1,
            BetResult::Pending => summary.pending += 1,
        }
        summary.total_wagered += bet.amount;
        summary.total_won += bet.payout;
        summary
    })
}

/// Flips pending bets on the winner to `Win` and pending bets on the other
/// participant to `Loss`. Returns how many of each were changed.
pub fn apply_settlement(
    bets: &mut [BetRecord],
    settlement: &MatchSettlement,
) -> (usize, usize) {
    let mut wins = 0;
    let mut losses = 0;
    for bet in bets.iter_mut().filter(|bet| bet.is_pending()) {
        if bet.contestant_id == settlement.winner_id {
            bet.result = BetResult::Win;
            bet.payout = bet.potential_payout;
            wins += 1;
        } else if settlement.participants.contains(&bet.contestant_id) {
            bet.result = BetResult::Loss;
            bet.payout = 0.0;
            losses += 1;
        }
    }
    (wins, losses)
}

// The history stores the winner by display name, so the join is on name.
pub fn fold_stats(history: &[MatchRecord]) -> BTreeMap<String, ContestantStats> {
    let mut stats: BTreeMap<String, ContestantStats> = BTreeMap::new();
    for record in history {
        let (a, b) = (&record.contestant_a, &record.contestant_b);
        stats.entry(a.id.clone()).or_default();
        stats.entry(b.id.clone()).or_default();
        let (winner, loser): (&ContestantRef, &ContestantRef) =
            match record.winner_name.as_deref() {
                None => {
                    for id in [&a.id, &b.id] {
                        if let Some(entry) = stats.get_mut(id) {
                            entry.draws += 1;
                        }
                    }
                    continue;
                }
                Some(name) if name == a.name => (a, b),
                Some(_) => (b, a),
            };
        if let Some(entry) = stats.get_mut(&winner.id) {
            entry.wins += 1;
        }
        if let Some(entry) = stats.get_mut(&loser.id) {
            entry.losses += 1;
        }
    }
    stats
}
