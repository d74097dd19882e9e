pub mod board;

pub mod contestants;

pub mod generator;

pub mod replay;

pub mod tournament;

pub use board::{
    Connect4Board,
    GameBoard,
    MoveRejected,
    Outcome,
    Player,
    TicTacToeBoard,
};
pub use contestants::Contestant;
pub use generator::{
    GeneratedGame,
    Move,
    generate_game,
};
pub use replay::{
    MatchReplay,
    ReplayStep,
};
pub use tournament::{
    CounterEvent,
    GameCounter,
};
