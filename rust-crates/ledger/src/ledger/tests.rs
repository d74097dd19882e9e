#![allow(non_snake_case)]

use super::*;
use crate::store::InMemoryKeyValueStore;

fn contestant(id: &str, name: &str) -> ContestantRef {
    ContestantRef {
        id: id.to_string(),
        name: name.to_string(),
        avatar: String::new(),
        color: String::new(),
    }
}

fn alpha() -> ContestantRef {
    contestant("bot_alpha", "Alpha")
}

fn beta() -> ContestantRef {
    contestant("bot_beta", "Beta")
}

fn gamma() -> ContestantRef {
    contestant("bot_gamma", "Gamma")
}

fn new_match(winner: Option<ContestantRef>) -> NewMatch {
    NewMatch {
        contestant_a: alpha(),
        contestant_b: beta(),
        winner,
        move_count: 11,
    }
}

fn new_bet(contestant: &ContestantRef, amount: f64) -> NewBet {
    NewBet {
        contestant_id: contestant.id.clone(),
        contestant_name: contestant.name.clone(),
        amount,
        odds: 0.5,
        potential_payout: amount / 0.5,
        transaction_ref: "0xfeed".to_string(),
    }
}

fn alpha_beats_beta() -> MatchSettlement {
    MatchSettlement {
        winner_id: alpha().id,
        participants: [alpha().id, beta().id],
    }
}

#[test]
fn record_match__sequence_number_follows_history_length() {
    // given
    let mut ledger = Ledger::new(InMemoryKeyValueStore::new());

    // when
    let first = ledger.record_match(new_match(Some(alpha()))).unwrap();
    let second = ledger.record_match(new_match(None)).unwrap();

    // then
    assert_eq!(first.match_sequence_number, 1);
    assert_eq!(second.match_sequence_number, 2);
    assert_ne!(first.id, second.id);
    let history = ledger.history().unwrap();
    assert_eq!(history, vec![first.clone(), second.clone()]);
    assert_eq!(first.winner_name.as_deref(), Some("Alpha"));
    assert_eq!(first.winner_id.as_deref(), Some("bot_alpha"));
    assert!(second.is_draw());
}

#[test]
fn history__malformed_json_reads_as_empty() {
    // given
    let store = InMemoryKeyValueStore::new();
    store
        .entries()
        .lock()
        .unwrap()
        .insert(GAME_HISTORY_KEY.to_string(), "{not json".to_string());
    let mut ledger = Ledger::new(store);

    // when
    let history = ledger.history().unwrap();
    let record = ledger.record_match(new_match(None)).unwrap();

    // then
    assert!(history.is_empty());
    assert_eq!(record.match_sequence_number, 1);
    assert_eq!(ledger.history().unwrap().len(), 1);
}

#[test]
fn attach_blob_id__sets_identifier_once() {
    // given
    let mut ledger = Ledger::new(InMemoryKeyValueStore::new());
    let record = ledger.record_match(new_match(Some(beta()))).unwrap();

    // when
    let attached = ledger.attach_blob_id(&record.id, "blob-1").unwrap();
    let reattached = ledger.attach_blob_id(&record.id, "blob-2").unwrap();
    let unknown = ledger.attach_blob_id("game_0_9", "blob-3").unwrap();

    // then
    assert!(attached);
    assert!(!reattached);
    assert!(!unknown);
    let history = ledger.history().unwrap();
    assert_eq!(history[0].storage_blob_id.as_deref(), Some("blob-1"));
}

#[test]
fn clear_history__removes_all_matches() {
    // given
    let mut ledger = Ledger::new(InMemoryKeyValueStore::new());
    ledger.record_match(new_match(None)).unwrap();

    // when
    ledger.clear_history().unwrap();

    // then
    assert!(ledger.history().unwrap().is_empty());
    let next = ledger.record_match(new_match(None)).unwrap();
    assert_eq!(next.match_sequence_number, 1);
}

#[test]
fn place_bet__appends_pending_bet_to_wallet_list() {
    // given
    let mut ledger = Ledger::new(InMemoryKeyValueStore::new());

    // when
    ledger.place_bet("0x01", new_bet(&alpha(), 10.0)).unwrap();
    ledger.place_bet("0x01", new_bet(&beta(), 4.0)).unwrap();
    ledger.place_bet("0x02", new_bet(&alpha(), 1.0)).unwrap();

    // then
    let bets = ledger.bets("0x01").unwrap();
    assert_eq!(bets.len(), 2);
    assert!(bets.iter().all(BetRecord::is_pending));
    assert_eq!(bets[0].potential_payout, 20.0);
    assert_eq!(bets[1].contestant_id, "bot_beta");
    assert_eq!(ledger.bets("0x02").unwrap().len(), 1);
    assert!(ledger.bets("0x03").unwrap().is_empty());
    assert_eq!(
        ledger.bet_addresses().unwrap(),
        vec!["0x01".to_string(), "0x02".to_string()]
    );
}

#[test]
fn clear_bets__only_touches_that_wallet() {
    // given
    let mut ledger = Ledger::new(InMemoryKeyValueStore::new());
    ledger.place_bet("0x01", new_bet(&alpha(), 10.0)).unwrap();
    ledger.place_bet("0x02", new_bet(&alpha(), 10.0)).unwrap();

    // when
    ledger.clear_bets("0x01").unwrap();

    // then
    assert!(ledger.bets("0x01").unwrap().is_empty());
    assert_eq!(ledger.bets("0x02").unwrap().len(), 1);
}

#[test]
fn settle__resolves_pending_bets_on_participants_only() {
    // given
    let mut ledger = Ledger::new(InMemoryKeyValueStore::new());
    ledger.place_bet("0x01", new_bet(&alpha(), 10.0)).unwrap();
    ledger.place_bet("0x01", new_bet(&beta(), 5.0)).unwrap();
    ledger.place_bet("0x01", new_bet(&gamma(), 7.0)).unwrap();

    // when
    let summary = ledger.settle(&alpha_beats_beta()).unwrap();

    // then
    let bets = ledger.bets("0x01").unwrap();
    assert_eq!(bets[0].result, BetResult::Win);
    assert_eq!(bets[0].payout, 20.0);
    assert_eq!(bets[1].result, BetResult::Loss);
    assert_eq!(bets[1].payout, 0.0);
    assert_eq!(bets[2].result, BetResult::Pending);
    assert_eq!(
        summary,
        SettlementSummary {
            lists_scanned: 1,
            lists_updated: 1,
            wins: 1,
            losses: 1,
        }
    );
}

#[test]
fn settle__applies_to_every_wallet_list() {
    // given
    let mut ledger = Ledger::new(InMemoryKeyValueStore::new());
    ledger.place_bet("0x01", new_bet(&alpha(), 10.0)).unwrap();
    ledger.place_bet("0x02", new_bet(&beta(), 3.0)).unwrap();
    ledger.place_bet("0x03", new_bet(&gamma(), 3.0)).unwrap();

    // when
    let summary = ledger.settle(&alpha_beats_beta()).unwrap();

    // then
    assert_eq!(ledger.bets("0x01").unwrap()[0].result, BetResult::Win);
    assert_eq!(ledger.bets("0x02").unwrap()[0].result, BetResult::Loss);
    assert_eq!(ledger.bets("0x03").unwrap()[0].result, BetResult::Pending);
    assert_eq!(summary.lists_scanned, 3);
    assert_eq!(summary.lists_updated, 2);
}

#[test]
fn settle__settled_bets_are_left_alone() {
    // given
    let mut ledger = Ledger::new(InMemoryKeyValueStore::new());
    ledger.place_bet("0x01", new_bet(&beta(), 10.0)).unwrap();
    ledger
        .settle(&MatchSettlement {
            winner_id: beta().id,
            participants: [alpha().id, beta().id],
        })
        .unwrap();

    // when
    let summary = ledger.settle(&alpha_beats_beta()).unwrap();

    // then
    let bet = &ledger.bets("0x01").unwrap()[0];
    assert_eq!(bet.result, BetResult::Win);
    assert_eq!(bet.payout, 20.0);
    assert_eq!(summary.lists_updated, 0);
}

#[test]
fn settle__skips_malformed_list_and_continues() {
    // given
    let store = InMemoryKeyValueStore::new();
    let mut ledger = Ledger::new(store.clone());
    ledger.place_bet("0x02", new_bet(&alpha(), 10.0)).unwrap();
    store
        .entries()
        .lock()
        .unwrap()
        .insert(bets_key("0x01"), "oops".to_string());

    // when
    let summary = ledger.settle(&alpha_beats_beta()).unwrap();

    // then
    assert_eq!(ledger.bets("0x02").unwrap()[0].result, BetResult::Win);
    assert_eq!(summary.lists_scanned, 1);
    let raw = store.entries().lock().unwrap().get(&bets_key("0x01")).cloned();
    assert_eq!(raw.as_deref(), Some("oops"));
}

#[test]
fn legacy_bets__read_and_cleared_without_touching_wallet_lists() {
    // given
    let store = InMemoryKeyValueStore::new();
    let mut ledger = Ledger::new(store.clone());
    ledger.place_bet("0x01", new_bet(&alpha(), 10.0)).unwrap();
    let legacy = ledger.bets("0x01").unwrap();
    store.entries().lock().unwrap().insert(
        LEGACY_BETS_KEY.to_string(),
        serde_json::to_string(&legacy).unwrap(),
    );

    // when
    let read = ledger.legacy_bets().unwrap();
    ledger.clear_legacy_bets().unwrap();

    // then
    assert_eq!(read, legacy);
    assert!(ledger.legacy_bets().unwrap().is_empty());
    assert_eq!(ledger.bets("0x01").unwrap().len(), 1);
}

#[test]
fn contestant_stats__folds_wins_losses_and_draws() {
    // given
    let mut ledger = Ledger::new(InMemoryKeyValueStore::new());
    ledger.record_match(new_match(Some(alpha()))).unwrap();
    ledger.record_match(new_match(Some(alpha()))).unwrap();
    ledger.record_match(new_match(Some(beta()))).unwrap();
    ledger.record_match(new_match(None)).unwrap();

    // when
    let stats = ledger.contestant_stats().unwrap();

    // then
    let alpha_stats = stats["bot_alpha"];
    let beta_stats = stats["bot_beta"];
    assert_eq!(
        alpha_stats,
        ContestantStats {
            wins: 2,
            losses: 1,
            draws: 1,
        }
    );
    assert_eq!(
        beta_stats,
        ContestantStats {
            wins: 1,
            losses: 2,
            draws: 1,
        }
    );
    assert_eq!(alpha_stats.win_rate_percent(), 67);
    assert_eq!(ContestantStats::default().win_rate_percent(), 0);
}

#[test]
fn bet_summary__totals_settled_and_pending_bets() {
    // given
    let mut ledger = Ledger::new(InMemoryKeyValueStore::new());
    ledger.place_bet("0x01", new_bet(&alpha(), 10.0)).unwrap();
    ledger.place_bet("0x01", new_bet(&beta(), 4.0)).unwrap();
    ledger.place_bet("0x01", new_bet(&gamma(), 6.0)).unwrap();
    ledger.place_bet("0x02", new_bet(&alpha(), 100.0)).unwrap();
    ledger.settle(&alpha_beats_beta()).unwrap();

    // when
    let summary = ledger.bet_summary("0x01").unwrap();

    // then
    assert_eq!(summary.total_bets, 3);
    assert_eq!(summary.wins, 1);
    assert_eq!(summary.losses, 1);
    assert_eq!(summary.pending, 1);
    assert_eq!(summary.total_wagered, 20.0);
    assert_eq!(summary.total_won, 20.0);
    assert_eq!(summary.net_profit(), 0.0);
}

#[test]
fn bet_summary__unknown_wallet_is_empty() {
    let ledger = Ledger::new(InMemoryKeyValueStore::new());
    assert_eq!(ledger.bet_summary("0x09").unwrap(), BetSummary::default());
}
