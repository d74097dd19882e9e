use serde::{
    Deserialize,
    Serialize,
};
use std::fmt;

pub const ROWS: usize = 6;
pub const COLUMNS: usize = 7;
pub const CONNECT_LENGTH: usize = 4;

pub const TIC_TAC_TOE_CELLS: usize = 9;

/// The eight lines that win a game of tic-tac-toe: rows, columns, then diagonals.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

// horizontal, vertical, diagonal down-right, diagonal down-left
const AXES: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn other(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Zero-based seat, used to index the contestant pair.
    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Winner(Player),
    Draw,
}

impl Outcome {
    pub fn winner(&self) -> Option<Player> {
        match self {
            Outcome::Winner(player) => Some(*player),
            Outcome::Draw => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveRejected {
    ColumnFull(usize),
    CellTaken(usize),
    OutOfRange(usize),
}

impl fmt::Display for MoveRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveRejected::ColumnFull(column) => write!(f, "column {column} is full"),
            MoveRejected::CellTaken(cell) => write!(f, "cell {cell} is already taken"),
            MoveRejected::OutOfRange(slot) => write!(f, "slot {slot} is off the board"),
        }
    }
}

impl std::error::Error for MoveRejected {}

/// Common surface of the two board variants, so the random generator and the
/// replay ticker can drive either one.
pub trait GameBoard: Clone + Default {
    type Placement: Copy + fmt::Debug + PartialEq;

    /// Upper bound on the number of pieces a game can place.
    const MAX_MOVES: usize;

    /// Slots (columns or cells) that can still accept a piece.
    fn open_slots(&self) -> Vec<usize>;

    fn play(
        &mut self,
        slot: usize,
        player: Player,
    ) -> Result<Self::Placement, MoveRejected>;

    /// Whether the piece at `placement` completes a winning line for `player`.
    fn wins(&self, placement: Self::Placement, player: Player) -> bool;

    fn is_full(&self) -> bool;

    /// Row-major copy of every cell.
    fn flatten(&self) -> Vec<Option<Player>>;
}

/// 6x7 gravity board. Row 0 is the top row; pieces settle at the highest free
/// row index of their column.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Connect4Board {
    cells: [[Option<Player>; COLUMNS]; ROWS],
}

impl Connect4Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<Player> {
        self.cells
            .get(row)
            .and_then(|cells| cells.get(column))
            .copied()
            .flatten()
    }

    pub fn rows(&self) -> &[[Option<Player>; COLUMNS]; ROWS] {
        &self.cells
    }

    /// Columns off the board count as full.
    pub fn is_column_full(&self, column: usize) -> bool {
        self.cells[0].get(column).is_none_or(Option::is_some)
    }

    pub fn open_columns(&self) -> Vec<usize> {
        (0..COLUMNS)
            .filter(|column| !self.is_column_full(*column))
            .collect()
    }

    /// Drop a piece into `column`, returning the row it settled in.
    pub fn drop_piece(
        &mut self,
        column: usize,
        player: Player,
    ) -> Result<usize, MoveRejected> {
        if column >= COLUMNS {
            return Err(MoveRejected::OutOfRange(column));
        }
        if self.is_column_full(column) {
            return Err(MoveRejected::ColumnFull(column));
        }
        let row = (0..ROWS)
            .rev()
            .find(|row| self.cells[*row][column].is_none())
            .ok_or(MoveRejected::ColumnFull(column))?;
        self.cells[row][column] = Some(player);
        Ok(row)
    }

    /// Checks the four axes through `(row, column)` in a fixed order and stops at
    /// the first run of `CONNECT_LENGTH` or more. The cell itself counts as one
    /// piece of `player`.
    pub fn detect_win(&self, row: usize, column: usize, player: Player) -> bool {
        AXES.iter()
            .any(|axis| self.run_length(row, column, player, *axis) >= CONNECT_LENGTH)
    }

    fn run_length(
        &self,
        row: usize,
        column: usize,
        player: Player,
        (d_row, d_column): (isize, isize),
    ) -> usize {
        1 + self.count_direction(row, column, player, d_row, d_column)
            + self.count_direction(row, column, player, -d_row, -d_column)
    }

    fn count_direction(
        &self,
        row: usize,
        column: usize,
        player: Player,
        d_row: isize,
        d_column: isize,
    ) -> usize {
        let mut count = 0;
        let mut r = row as isize + d_row;
        let mut c = column as isize + d_column;
        while r >= 0 && c >= 0 && self.cell(r as usize, c as usize) == Some(player) {
            count += 1;
            r += d_row;
            c += d_column;
        }
        count
    }

    pub fn is_full(&self) -> bool {
        (0..COLUMNS).all(|column| self.is_column_full(column))
    }
}

impl GameBoard for Connect4Board {
    type Placement = (usize, usize);

    const MAX_MOVES: usize = ROWS * COLUMNS;

    fn open_slots(&self) -> Vec<usize> {
        self.open_columns()
    }

    fn play(
        &mut self,
        slot: usize,
        player: Player,
    ) -> Result<Self::Placement, MoveRejected> {
        let row = self.drop_piece(slot, player)?;
        Ok((row, slot))
    }

    fn wins(&self, (row, column): Self::Placement, player: Player) -> bool {
        self.detect_win(row, column, player)
    }

    fn is_full(&self) -> bool {
        Connect4Board::is_full(self)
    }

    fn flatten(&self) -> Vec<Option<Player>> {
        self.cells.iter().flatten().copied().collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct TicTacToeBoard {
    cells: [Option<Player>; TIC_TAC_TOE_CELLS],
}

impl TicTacToeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, index: usize) -> Option<Player> {
        self.cells.get(index).copied().flatten()
    }

    pub fn cells(&self) -> &[Option<Player>; TIC_TAC_TOE_CELLS] {
        &self.cells
    }

    pub fn open_cells(&self) -> Vec<usize> {
        (0..TIC_TAC_TOE_CELLS)
            .filter(|index| self.cells[*index].is_none())
            .collect()
    }

    pub fn place(&mut self, index: usize, player: Player) -> Result<usize, MoveRejected> {
        match self.cells.get_mut(index) {
            None => Err(MoveRejected::OutOfRange(index)),
            Some(Some(_)) => Err(MoveRejected::CellTaken(index)),
            Some(cell) => {
                *cell = Some(player);
                Ok(index)
            }
        }
    }

    pub fn detect_win(&self, player: Player) -> bool {
        WINNING_LINES
            .iter()
            .any(|line| line.iter().all(|index| self.cells[*index] == Some(player)))
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }
}

impl GameBoard for TicTacToeBoard {
    type Placement = usize;

    const MAX_MOVES: usize = TIC_TAC_TOE_CELLS;

    fn open_slots(&self) -> Vec<usize> {
        self.open_cells()
    }

    fn play(
        &mut self,
        slot: usize,
        player: Player,
    ) -> Result<Self::Placement, MoveRejected> {
        self.place(slot, player)
    }

    fn wins(&self, _placement: Self::Placement, player: Player) -> bool {
        self.detect_win(player)
    }

    fn is_full(&self) -> bool {
        TicTacToeBoard::is_full(self)
    }

    fn flatten(&self) -> Vec<Option<Player>> {
        self.cells.to_vec()
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use proptest::prelude::*;

    fn play_alternating(board: &mut Connect4Board, columns: &[usize]) -> Vec<(usize, usize)> {
        let mut player = Player::One;
        let mut placements = Vec::new();
        for column in columns {
            let row = board.drop_piece(*column, player).unwrap();
            placements.push((row, *column));
            player = player.other();
        }
        placements
    }

    #[test]
    fn drop_piece__settles_at_lowest_free_row() {
        // given
        let mut board = Connect4Board::new();

        // when
        let first = board.drop_piece(3, Player::One).unwrap();
        let second = board.drop_piece(3, Player::Two).unwrap();

        // then
        assert_eq!(first, ROWS - 1);
        assert_eq!(second, ROWS - 2);
        assert_eq!(board.cell(ROWS - 1, 3), Some(Player::One));
        assert_eq!(board.cell(ROWS - 2, 3), Some(Player::Two));
    }

    #[test]
    fn drop_piece__rejects_full_column_without_touching_board() {
        // given
        let mut board = Connect4Board::new();
        for i in 0..ROWS {
            let player = if i % 2 == 0 { Player::One } else { Player::Two };
            board.drop_piece(0, player).unwrap();
        }
        let before = board.clone();

        // when
        let result = board.drop_piece(0, Player::One);

        // then
        assert_eq!(result, Err(MoveRejected::ColumnFull(0)));
        assert_eq!(board, before);
        assert_eq!(board.open_columns(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn drop_piece__rejects_unknown_column() {
        let mut board = Connect4Board::new();
        assert_eq!(
            board.drop_piece(COLUMNS, Player::One),
            Err(MoveRejected::OutOfRange(COLUMNS))
        );
    }

    #[test]
    fn detect_win__vertical_four_after_seventh_move() {
        // given
        let mut board = Connect4Board::new();
        let placements = play_alternating(&mut board, &[3, 2, 3, 2, 3, 2]);
        for (i, (row, column)) in placements.iter().enumerate() {
            let player = if i % 2 == 0 { Player::One } else { Player::Two };
            assert!(!board.detect_win(*row, *column, player));
        }

        // when
        let row = board.drop_piece(3, Player::One).unwrap();

        // then
        assert_eq!(row, 2);
        assert!(board.detect_win(row, 3, Player::One));
    }

    #[test]
    fn detect_win__diagonal_down_left_completed_at_top_end() {
        // given
        let mut board = Connect4Board::new();
        let placements =
            play_alternating(&mut board, &[0, 1, 1, 2, 3, 2, 2, 3, 6, 3]);
        for (i, (row, column)) in placements.iter().enumerate() {
            let player = if i % 2 == 0 { Player::One } else { Player::Two };
            assert!(!board.detect_win(*row, *column, player));
        }

        // when
        let row = board.drop_piece(3, Player::One).unwrap();

        // then
        assert_eq!(row, 2);
        assert!(board.detect_win(row, 3, Player::One));
        assert!(board.detect_win(5, 0, Player::One));
        assert!(!board.detect_win(row, 3, Player::Two));
    }

    #[test]
    fn detect_win__horizontal_run_found_from_every_piece_of_the_run() {
        for start in 0..=COLUMNS - CONNECT_LENGTH {
            // given
            let mut board = Connect4Board::new();
            for column in start..start + CONNECT_LENGTH {
                board.drop_piece(column, Player::Two).unwrap();
            }

            // then
            for column in start..start + CONNECT_LENGTH {
                assert!(board.detect_win(ROWS - 1, column, Player::Two));
            }
        }
    }

    #[test]
    fn detect_win__three_in_a_row_is_not_enough() {
        let mut board = Connect4Board::new();
        for column in 0..3 {
            board.drop_piece(column, Player::One).unwrap();
        }
        assert!(!board.detect_win(ROWS - 1, 2, Player::One));
    }

    #[test]
    fn is_full__only_when_every_top_cell_is_taken() {
        // given
        let mut board = Connect4Board::new();
        let mut player = Player::One;
        for column in 0..COLUMNS {
            for _ in 0..ROWS {
                assert!(!board.is_full());
                board.drop_piece(column, player).unwrap();
                player = player.other();
            }
        }

        // then
        assert!(board.is_full());
        assert!(board.open_columns().is_empty());
    }

    #[test]
    fn tic_tac_toe__detects_each_winning_line() {
        for line in WINNING_LINES {
            // given
            let mut board = TicTacToeBoard::new();
            for index in line {
                board.place(index, Player::One).unwrap();
            }

            // then
            assert!(board.detect_win(Player::One));
            assert!(!board.detect_win(Player::Two));
        }
    }

    #[test]
    fn tic_tac_toe__place_rejects_taken_and_unknown_cells() {
        let mut board = TicTacToeBoard::new();
        board.place(4, Player::One).unwrap();
        assert_eq!(board.place(4, Player::Two), Err(MoveRejected::CellTaken(4)));
        assert_eq!(board.place(9, Player::Two), Err(MoveRejected::OutOfRange(9)));
        assert_eq!(board.cell(4), Some(Player::One));
    }

    #[test]
    fn tic_tac_toe__full_board_without_line_is_a_draw_position() {
        // given
        // X O X
        // X O O
        // O X X
        let mut board = TicTacToeBoard::new();
        let layout = [
            Player::One,
            Player::Two,
            Player::One,
            Player::One,
            Player::Two,
            Player::Two,
            Player::Two,
            Player::One,
            Player::One,
        ];
        for (index, player) in layout.iter().enumerate() {
            board.place(index, *player).unwrap();
        }

        // then
        assert!(board.is_full());
        assert!(!board.detect_win(Player::One));
        assert!(!board.detect_win(Player::Two));
    }

    proptest! {
        #[test]
        fn drop_piece__never_overwrites_an_occupied_cell(columns in prop::collection::vec(0usize..COLUMNS, 0..80)) {
            let mut board = Connect4Board::new();
            let mut player = Player::One;
            for column in columns {
                let before = board.flatten();
                let result = board.drop_piece(column, player);
                let after = board.flatten();
                for (old, new) in before.iter().zip(after.iter()) {
                    if old.is_some() {
                        prop_assert_eq!(old, new);
                    }
                }
                let changed = before.iter().zip(after.iter()).filter(|(a, b)| a != b).count();
                match result {
                    Ok(_) => prop_assert_eq!(changed, 1),
                    Err(_) => prop_assert_eq!(changed, 0),
                }
                player = player.other();
            }
        }

        #[test]
        fn detect_win__agrees_on_mirrored_board(columns in prop::collection::vec(0usize..COLUMNS, 0..60)) {
            let mut board = Connect4Board::new();
            let mut mirrored = Connect4Board::new();
            let mut player = Player::One;
            for column in columns {
                let mirror_column = COLUMNS - 1 - column;
                match (board.drop_piece(column, player), mirrored.drop_piece(mirror_column, player)) {
                    (Ok(row), Ok(mirror_row)) => {
                        prop_assert_eq!(row, mirror_row);
                        prop_assert_eq!(
                            board.detect_win(row, column, player),
                            mirrored.detect_win(mirror_row, mirror_column, player)
                        );
                    }
                    (Err(_), Err(_)) => {}
                    (left, right) => prop_assert!(false, "mirrored drops diverged: {:?} vs {:?}", left, right),
                }
                player = player.other();
            }
        }

        #[test]
        fn tic_tac_toe_detect_win__agrees_on_mirrored_board(cells in prop::collection::vec(0usize..TIC_TAC_TOE_CELLS, 0..12)) {
            let mut board = TicTacToeBoard::new();
            let mut mirrored = TicTacToeBoard::new();
            let mut player = Player::One;
            for cell in cells {
                let mirror_cell = cell - cell % 3 + (2 - cell % 3);
                let placed = board.place(cell, player).is_ok();
                let mirror_placed = mirrored.place(mirror_cell, player).is_ok();
                prop_assert_eq!(placed, mirror_placed);
                prop_assert_eq!(board.detect_win(player), mirrored.detect_win(player));
                player = player.other();
            }
        }
    }
}
