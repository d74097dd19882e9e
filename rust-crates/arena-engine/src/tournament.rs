pub const DEFAULT_TOTAL_GAMES: u32 = 3;
pub const DEFAULT_COUNTDOWN_SECS: u32 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterEvent {
    /// The countdown expired and game `n` (1-based) is now current.
    NextGame(u32),
    Finished,
}

/// Paces a fixed-length tournament: every game slot gets a countdown, advanced
/// by one second per `tick_second` call.
#[derive(Clone, Debug)]
pub struct GameCounter {
    total_games: u32,
    current_game: u32,
    countdown_secs: u32,
    remaining_secs: u32,
    active: bool,
}

impl Default for GameCounter {
    fn default() -> Self {
        Self::new(DEFAULT_TOTAL_GAMES, DEFAULT_COUNTDOWN_SECS)
    }
}

impl GameCounter {
    pub fn new(total_games: u32, countdown_secs: u32) -> Self {
        let countdown_secs = countdown_secs.max(1);
        Self {
            total_games: total_games.max(1),
            current_game: 1,
            countdown_secs,
            remaining_secs: countdown_secs,
            active: true,
        }
    }

    pub fn total_games(&self) -> u32 {
        self.total_games
    }

    pub fn current_game(&self) -> u32 {
        self.current_game
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_complete(&self) -> bool {
        self.current_game > self.total_games
    }

    pub fn tick_second(&mut self) -> Option<CounterEvent> {
        if !self.active || self.is_complete() {
            return None;
        }
        if self.remaining_secs > 1 {
            self.remaining_secs -= 1;
            return None;
        }
        if self.current_game < self.total_games {
            self.current_game += 1;
            self.remaining_secs = self.countdown_secs;
            Some(CounterEvent::NextGame(self.current_game))
        } else {
            self.current_game = self.total_games + 1;
            self.remaining_secs = 0;
            self.active = false;
            Some(CounterEvent::Finished)
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.total_games, self.countdown_secs);
    }

    pub fn progress_percent(&self) -> u32 {
        let done = self.current_game.saturating_sub(1).min(self.total_games);
        done * 100 / self.total_games
    }

    /// `m:ss`
    pub fn format_remaining(&self) -> String {
        format!("{}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }
}
