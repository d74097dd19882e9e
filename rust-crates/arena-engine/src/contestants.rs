use rand::{
    Rng,
    seq::SliceRandom,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Odds used when a contestant carries none, as the betting panel does.
pub const FALLBACK_ODDS: f64 = 0.5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contestant {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub color: String,
    pub win_rate: u8,
    pub strategy: String,
    pub current_odds: f64,
    pub votes: u32,
}

impl Contestant {
    pub fn odds(&self) -> f64 {
        effective_odds(self.current_odds)
    }

    pub fn win_chance_percent(&self) -> u8 {
        ((1.0 - self.odds()) * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

// id, name, avatar, color, win rate, strategy, odds, votes
const CATALOG: [(&str, &str, &str, &str, u8, &str, f64, u32); 6] = [
    ("bot_alpha", "Alpha", "🤖", "#BFFF00", 68, "Aggressive center control", 0.35, 412),
    ("bot_beta", "Beta", "🎯", "#22D3EE", 61, "Defensive blocker", 0.42, 356),
    ("bot_gamma", "Gamma", "⚡", "#F59E0B", 55, "Fast edge attacks", 0.48, 298),
    ("bot_delta", "Delta", "🔥", "#EF4444", 52, "Trap setter", 0.52, 241),
    ("bot_epsilon", "Epsilon", "💎", "#A855F7", 47, "Patient positional play", 0.58, 187),
    ("bot_zeta", "Zeta", "⭐", "#F472B6", 43, "Chaotic opportunist", 0.63, 129),
];

pub fn catalog() -> Vec<Contestant> {
    CATALOG
        .iter()
        .map(
            |(id, name, avatar, color, win_rate, strategy, odds, votes)| Contestant {
                id: id.to_string(),
                name: name.to_string(),
                avatar: avatar.to_string(),
                color: color.to_string(),
                win_rate: *win_rate,
                strategy: strategy.to_string(),
                current_odds: *odds,
                votes: *votes,
            },
        )
        .collect()
}

/// Draws two distinct contestants from the catalog.
pub fn sample_pair<R: Rng + ?Sized>(rng: &mut R) -> [Contestant; 2] {
    let mut pool = catalog();
    pool.shuffle(rng);
    let mut drawn = pool.into_iter();
    match (drawn.next(), drawn.next()) {
        (Some(first), Some(second)) => [first, second],
        _ => unreachable!("catalog holds more than two contestants"),
    }
}

pub fn effective_odds(odds: f64) -> f64 {
    if odds > 0.0 && odds.is_finite() {
        odds
    } else {
        FALLBACK_ODDS
    }
}

/// Stake returned on a winning bet: `amount / odds`.
pub fn potential_payout(amount: f64, odds: f64) -> f64 {
    amount / effective_odds(odds)
}
