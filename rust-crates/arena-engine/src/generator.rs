use crate::board::{
    GameBoard,
    Outcome,
    Player,
};
use rand::{
    Rng,
    seq::IndexedRandom,
};
use serde::{
    Deserialize,
    Serialize,
};

/// One placed piece. `column` is the cell index for tic-tac-toe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub column: usize,
    pub player: Player,
    pub contestant: String,
}

#[derive(Clone, Debug)]
pub struct GeneratedGame<B> {
    pub moves: Vec<Move>,
    pub outcome: Outcome,
    pub board: B,
}

/// Plays a whole game by picking uniformly among the open slots each turn,
/// starting with `Player::One`. Stops at the first win or when the board fills.
pub fn generate_game<B, R>(rng: &mut R, contestants: [&str; 2]) -> GeneratedGame<B>
where
    B: GameBoard,
    R: Rng + ?Sized,
{
    let mut board = B::default();
    let mut moves = Vec::with_capacity(B::MAX_MOVES);
    let mut player = Player::One;
    // skipped proposals do not place a piece, so bound the loop on attempts too
    let mut attempts = 0;

    while moves.len() < B::MAX_MOVES && attempts < B::MAX_MOVES * 2 {
        attempts += 1;
        let open = board.open_slots();
        let Some(&slot) = open.choose(rng) else {
            break;
        };
        match board.play(slot, player) {
            Ok(placement) => {
                moves.push(Move {
                    column: slot,
                    player,
                    contestant: contestants[player.index()].to_string(),
                });
                if board.wins(placement, player) {
                    return GeneratedGame {
                        moves,
                        outcome: Outcome::Winner(player),
                        board,
                    };
                }
                player = player.other();
            }
            Err(rejected) => {
                tracing::debug!(%rejected, slot, "skipping unplayable slot");
            }
        }
    }

    GeneratedGame {
        moves,
        outcome: Outcome::Draw,
        board,
    }
}
