use crate::{
    board::{
        GameBoard,
        Outcome,
    },
    generator::Move,
};

#[derive(Clone, Debug, PartialEq)]
pub enum ReplayStep<P> {
    Placed {
        index: usize,
        mv: Move,
        placement: P,
    },
    Finished(Outcome),
    Idle,
}

/// Reveals a generated move list one piece per `tick`. The caller owns the
/// clock, so the same replay runs under a tokio interval or in a test loop.
#[derive(Clone, Debug)]
pub struct MatchReplay<B> {
    moves: Vec<Move>,
    board: B,
    revealed: usize,
    outcome: Option<Outcome>,
    finished: bool,
}

impl<B: GameBoard> MatchReplay<B> {
    pub fn new(moves: Vec<Move>) -> Self {
        Self {
            moves,
            board: B::default(),
            revealed: 0,
            outcome: None,
            finished: false,
        }
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Number of moves consumed so far, skipped ones included.
    pub fn revealed(&self) -> usize {
        self.revealed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Known once `Finished` has been emitted.
    pub fn outcome(&self) -> Option<Outcome> {
        if self.finished { self.outcome.or(Some(Outcome::Draw)) } else { None }
    }

    pub fn tick(&mut self) -> ReplayStep<B::Placement> {
        if self.finished {
            return ReplayStep::Idle;
        }
        if self.outcome.is_none() {
            while let Some(mv) = self.moves.get(self.revealed).cloned() {
                let index = self.revealed;
                self.revealed += 1;
                match self.board.play(mv.column, mv.player) {
                    Ok(placement) => {
                        if self.board.wins(placement, mv.player) {
                            self.outcome = Some(Outcome::Winner(mv.player));
                        }
                        return ReplayStep::Placed {
                            index,
                            mv,
                            placement,
                        };
                    }
                    Err(rejected) => {
                        tracing::debug!(%rejected, index, "skipping unplayable move during replay");
                    }
                }
            }
        }
        self.finished = true;
        ReplayStep::Finished(self.outcome.unwrap_or(Outcome::Draw))
    }
}
