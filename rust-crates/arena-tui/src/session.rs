use crate::walrus_client::{
    BattlePayload,
    BlobReceipt,
    PayloadMove,
};
use arena_engine::{
    Connect4Board,
    Contestant,
    CounterEvent,
    GameBoard,
    GameCounter,
    MatchReplay,
    Move,
    Outcome,
    Player,
    ReplayStep,
    TicTacToeBoard,
    board::{
        COLUMNS,
        TIC_TAC_TOE_CELLS,
    },
    contestants::{
        potential_payout,
        sample_pair,
    },
    generate_game,
};
use chrono::Utc;
use color_eyre::eyre::{
    Result,
    eyre,
};
use ledger::{
    BetSummary,
    ContestantStats,
    KeyValueStore,
    Ledger,
    MatchSettlement,
    SettlementSummary,
    records::{
        BetRecord,
        ContestantRef,
        MatchRecord,
        NewBet,
        NewMatch,
    },
};
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{
    info,
    warn,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GameVariant {
    #[default]
    Connect4,
    TicTacToe,
}

impl GameVariant {
    /// Value of `gameType` in the stored payload.
    pub fn game_type(&self) -> &'static str {
        match self {
            GameVariant::Connect4 => "connect4",
            GameVariant::TicTacToe => "tictactoe",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GameVariant::Connect4 => "Connect 4",
            GameVariant::TicTacToe => "Tic-Tac-Toe",
        }
    }

    pub fn columns(&self) -> usize {
        match self {
            GameVariant::Connect4 => COLUMNS,
            GameVariant::TicTacToe => TIC_TAC_TOE_CELLS / 3,
        }
    }

    fn toggled(self) -> Self {
        match self {
            GameVariant::Connect4 => GameVariant::TicTacToe,
            GameVariant::TicTacToe => GameVariant::Connect4,
        }
    }
}

/// What a single replay tick did, with the board type erased.
#[derive(Clone, Debug, PartialEq)]
pub enum MoveTick {
    Placed { index: usize, mv: Move },
    Finished(Outcome),
    Idle,
}

impl<P> From<ReplayStep<P>> for MoveTick {
    fn from(step: ReplayStep<P>) -> Self {
        match step {
            ReplayStep::Placed { index, mv, .. } => MoveTick::Placed { index, mv },
            ReplayStep::Finished(outcome) => MoveTick::Finished(outcome),
            ReplayStep::Idle => MoveTick::Idle,
        }
    }
}

#[derive(Clone, Debug)]
pub enum ActiveReplay {
    Connect4(MatchReplay<Connect4Board>),
    TicTacToe(MatchReplay<TicTacToeBoard>),
}

impl ActiveReplay {
    fn generate<R: Rng + ?Sized>(variant: GameVariant, rng: &mut R, names: [&str; 2]) -> Self {
        match variant {
            GameVariant::Connect4 => {
                let game = generate_game::<Connect4Board, _>(rng, names);
                ActiveReplay::Connect4(MatchReplay::new(game.moves))
            }
            GameVariant::TicTacToe => {
                let game = generate_game::<TicTacToeBoard, _>(rng, names);
                ActiveReplay::TicTacToe(MatchReplay::new(game.moves))
            }
        }
    }

    pub fn variant(&self) -> GameVariant {
        match self {
            ActiveReplay::Connect4(_) => GameVariant::Connect4,
            ActiveReplay::TicTacToe(_) => GameVariant::TicTacToe,
        }
    }

    fn tick(&mut self) -> MoveTick {
        match self {
            ActiveReplay::Connect4(replay) => replay.tick().into(),
            ActiveReplay::TicTacToe(replay) => replay.tick().into(),
        }
    }

    pub fn moves(&self) -> &[Move] {
        match self {
            ActiveReplay::Connect4(replay) => replay.moves(),
            ActiveReplay::TicTacToe(replay) => replay.moves(),
        }
    }

    pub fn revealed(&self) -> usize {
        match self {
            ActiveReplay::Connect4(replay) => replay.revealed(),
            ActiveReplay::TicTacToe(replay) => replay.revealed(),
        }
    }

    pub fn is_finished(&self) -> bool {
        match self {
            ActiveReplay::Connect4(replay) => replay.is_finished(),
            ActiveReplay::TicTacToe(replay) => replay.is_finished(),
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            ActiveReplay::Connect4(replay) => replay.outcome(),
            ActiveReplay::TicTacToe(replay) => replay.outcome(),
        }
    }

    /// Row-major cells of the board as revealed so far.
    pub fn cells(&self) -> Vec<Option<Player>> {
        match self {
            ActiveReplay::Connect4(replay) => replay.board().flatten(),
            ActiveReplay::TicTacToe(replay) => replay.board().flatten(),
        }
    }
}

/// A match that just ended: its history entry, what settlement did, and the
/// payload waiting to be published. A settlement failure does not undo the
/// recorded match; it is carried in `settlement_error` instead.
#[derive(Clone, Debug)]
pub struct CompletedMatch {
    pub record: MatchRecord,
    pub outcome: Outcome,
    pub settlement: Option<SettlementSummary>,
    pub settlement_error: Option<String>,
    pub payload: BattlePayload,
}

impl CompletedMatch {
    pub fn match_id(&self) -> &str {
        &self.record.id
    }
}

pub fn contestant_ref(contestant: &Contestant) -> ContestantRef {
    ContestantRef {
        id: contestant.id.clone(),
        name: contestant.name.clone(),
        avatar: contestant.avatar.clone(),
        color: contestant.color.clone(),
    }
}

pub struct ArenaSession<S> {
    ledger: Ledger<S>,
    pair: [Contestant; 2],
    variant: GameVariant,
    replay: Option<ActiveReplay>,
    counter: GameCounter,
    redraw_pending: bool,
}

impl<S: KeyValueStore> ArenaSession<S> {
    pub fn new<R: Rng + ?Sized>(ledger: Ledger<S>, counter: GameCounter, rng: &mut R) -> Self {
        Self {
            ledger,
            pair: sample_pair(rng),
            variant: GameVariant::default(),
            replay: None,
            counter,
            redraw_pending: false,
        }
    }

    pub fn pair(&self) -> &[Contestant; 2] {
        &self.pair
    }

    pub fn variant(&self) -> GameVariant {
        self.variant
    }

    pub fn replay(&self) -> Option<&ActiveReplay> {
        self.replay.as_ref()
    }

    pub fn counter(&self) -> &GameCounter {
        &self.counter
    }

    pub fn is_playing(&self) -> bool {
        self.replay
            .as_ref()
            .is_some_and(|replay| !replay.is_finished())
    }

    /// Generates a full game for the current pair and starts revealing it.
    /// Returns false while another match is still being revealed.
    pub fn start_match<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.is_playing() {
            return false;
        }
        let names = [self.pair[0].name.as_str(), self.pair[1].name.as_str()];
        let replay = ActiveReplay::generate(self.variant, rng, names);
        info!(
            variant = self.variant.game_type(),
            first = names[0],
            second = names[1],
            moves = replay.moves().len(),
            "match started"
        );
        self.replay = Some(replay);
        true
    }

    /// Reveals the next move. When the replay finishes, the match is recorded,
    /// bets are settled if there is a winner, and the publish job is returned.
    /// A pair redraw deferred by [`Self::tick_countdown`] happens here, from `rng`.
    pub fn tick_move<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Option<CompletedMatch>> {
        let Some(replay) = self.replay.as_mut() else {
            return Ok(None);
        };
        let MoveTick::Finished(outcome) = replay.tick() else {
            return Ok(None);
        };
        let moves = replay.moves().to_vec();
        let cells = replay.cells();
        let variant = replay.variant();

        let winner = outcome.winner().map(|player| &self.pair[player.index()]);
        let record = self
            .ledger
            .record_match(NewMatch {
                contestant_a: contestant_ref(&self.pair[0]),
                contestant_b: contestant_ref(&self.pair[1]),
                winner: winner.map(contestant_ref),
                move_count: moves.len() as u32,
            })
            .map_err(|e| eyre!(e))?;

        let (settlement, settlement_error) = match winner {
            Some(winner) => {
                let settled = self.ledger.settle(&MatchSettlement {
                    winner_id: winner.id.clone(),
                    participants: [self.pair[0].id.clone(), self.pair[1].id.clone()],
                });
                match settled {
                    Ok(summary) => (Some(summary), None),
                    Err(err) => {
                        warn!(match_id = %record.id, error = %err, "bet settlement failed");
                        (None, Some(format!("Bet settlement failed: {err:#}")))
                    }
                }
            }
            None => (None, None),
        };

        let payload = self.battle_payload(variant, &moves, &cells, outcome);
        if self.redraw_pending {
            self.redraw_pending = false;
            self.pair = sample_pair(rng);
        }
        Ok(Some(CompletedMatch {
            record,
            outcome,
            settlement,
            settlement_error,
            payload,
        }))
    }

    fn battle_payload(
        &self,
        variant: GameVariant,
        moves: &[Move],
        cells: &[Option<Player>],
        outcome: Outcome,
    ) -> BattlePayload {
        let now = Utc::now().timestamp_millis();
        BattlePayload {
            battle_id: format!("{}_{now}", variant.game_type()),
            agent1_id: self.pair[0].id.clone(),
            agent2_id: self.pair[1].id.clone(),
            agent1_name: self.pair[0].name.clone(),
            agent2_name: self.pair[1].name.clone(),
            moves: moves
                .iter()
                .enumerate()
                .map(|(i, mv)| PayloadMove {
                    position: mv.column,
                    player: mv.contestant.clone(),
                    timestamp: now + i as i64,
                })
                .collect(),
            board: cells.iter().map(|cell| cell.map(Player::number)).collect(),
            winner: outcome
                .winner()
                .map(|player| self.pair[player.index()].name.clone()),
            is_draw: outcome == Outcome::Draw,
            timestamp: now,
            game_type: variant.game_type().to_string(),
        }
    }

    /// One second of the tournament countdown. A new game slot draws a new pair,
    /// deferred until the running match is recorded.
    pub fn tick_countdown<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<CounterEvent> {
        let event = self.counter.tick_second()?;
        match event {
            CounterEvent::NextGame(game) => {
                info!(game, total = self.counter.total_games(), "next tournament game");
                if self.is_playing() {
                    self.redraw_pending = true;
                } else {
                    self.pair = sample_pair(rng);
                    self.replay = None;
                }
            }
            CounterEvent::Finished => info!("tournament finished"),
        }
        Some(event)
    }

    pub fn reset_tournament(&mut self) {
        self.counter.reset();
    }

    /// Switches between Connect-4 and tic-tac-toe when no match is running.
    pub fn toggle_variant(&mut self) -> bool {
        if self.is_playing() {
            return false;
        }
        self.variant = self.variant.toggled();
        self.replay = None;
        true
    }

    /// Whether a bet of `amount` on `contestant_id` would be accepted right now.
    /// Bets are only taken before a match starts, on one of the two current
    /// contestants, for a positive amount.
    pub fn check_bet(&self, contestant_id: &str, amount: f64) -> Result<&Contestant> {
        if self.is_playing() {
            return Err(eyre!("Betting is closed while a match is running"));
        }
        if !(amount.is_finite() && amount > 0.0) {
            return Err(eyre!("Bet amount must be positive, got {amount}"));
        }
        self.pair
            .iter()
            .find(|contestant| contestant.id == contestant_id)
            .ok_or_else(|| eyre!("{contestant_id} is not playing in this match"))
    }

    /// Records a pending bet for `address` on one of the two current contestants.
    pub fn place_bet(
        &mut self,
        address: &str,
        contestant_id: &str,
        amount: f64,
        transaction_ref: &str,
    ) -> Result<BetRecord> {
        let contestant = self.check_bet(contestant_id, amount)?;
        let odds = contestant.odds();
        let bet = NewBet {
            contestant_id: contestant.id.clone(),
            contestant_name: contestant.name.clone(),
            amount,
            odds,
            potential_payout: potential_payout(amount, odds),
            transaction_ref: transaction_ref.to_string(),
        };
        self.ledger.place_bet(address, bet).map_err(|e| eyre!(e))
    }

    pub fn attach_receipt(&mut self, match_id: &str, receipt: &BlobReceipt) -> Result<bool> {
        self.ledger
            .attach_blob_id(match_id, &receipt.blob_id)
            .map_err(|e| eyre!(e))
    }

    pub fn history(&self) -> Result<Vec<MatchRecord>> {
        self.ledger.history().map_err(|e| eyre!(e))
    }

    pub fn bets(&self, address: &str) -> Result<Vec<BetRecord>> {
        self.ledger.bets(address).map_err(|e| eyre!(e))
    }

    pub fn bet_summary(&self, address: &str) -> Result<BetSummary> {
        self.ledger.bet_summary(address).map_err(|e| eyre!(e))
    }

    pub fn contestant_stats(&self) -> Result<BTreeMap<String, ContestantStats>> {
        self.ledger.contestant_stats().map_err(|e| eyre!(e))
    }

    pub fn clear_history(&mut self) -> Result<()> {
        self.ledger.clear_history().map_err(|e| eyre!(e))
    }

    pub fn clear_bets(&mut self, address: &str) -> Result<()> {
        self.ledger.clear_bets(address).map_err(|e| eyre!(e))
    }

    /// Reads and drops the flat pre-wallet bet list.
    pub fn take_legacy_bets(&mut self) -> Result<Vec<BetRecord>> {
        let legacy = self.ledger.legacy_bets().map_err(|e| eyre!(e))?;
        if !legacy.is_empty() {
            info!(count = legacy.len(), "discarding legacy bet list");
            self.ledger.clear_legacy_bets().map_err(|e| eyre!(e))?;
        }
        Ok(legacy)
    }
}
