use crate::client::{
    AppSnapshot,
    BoardView,
    ContestantRow,
};
use arena_client::session::GameVariant;
use arena_engine::{
    Outcome,
    Player,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        Event,
        EventStream,
        KeyCode,
        KeyEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use futures::StreamExt;
use itertools::Itertools;
use ledger::{
    BetSummary,
    records::{
        BetRecord,
        BetResult,
        MatchRecord,
    },
};
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::stdout;
use unicode_width::UnicodeWidthStr;

pub type InputEventReceiver = EventStream;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserEvent {
    Quit,
    StartMatch,
    ToggleVariant,
    ResetTournament,
    OpenBetModal,
    ConfirmBet { seat: usize, amount: u64 },
    OpenClearModal,
    ConfirmClearHistory,
    Redraw,
}

#[derive(Debug, Default)]
pub struct UiState {
    mode: Mode,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
enum Mode {
    #[default]
    Normal,
    BetModal(BetState),
    ClearModal,
    QuitModal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct BetState {
    seat: usize,
    amount: u64,
}

impl BetState {
    fn for_seat(seat: usize) -> Self {
        BetState { seat, amount: 1 }
    }
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::event::DisableMouseCapture,
        crossterm::terminal::LeaveAlternateScreen
    )?;
    Ok(())
}

pub fn draw(state: &mut UiState, snap: &AppSnapshot) -> Result<()> {
    if snap.board.playing && matches!(state.mode, Mode::BetModal(_)) {
        // betting closed underneath the modal
        state.mode = Mode::Normal;
    }
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| ui(f, state, snap))?;
        state.terminal = Some(term);
    }
    Ok(())
}

pub fn input_event_stream() -> InputEventReceiver {
    EventStream::new()
}

pub async fn next_raw_event(input: &mut InputEventReceiver) -> Result<Event> {
    match input.next().await {
        Some(event) => Ok(event?),
        None => Err(eyre!("terminal input stream closed")),
    }
}

/// Maps a terminal event to an app event, updating modal state on the way.
pub fn interpret_event(state: &mut UiState, event: Event) -> Option<UserEvent> {
    let key = match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => key,
        Event::Resize(..) => return Some(UserEvent::Redraw),
        _ => return None,
    };

    match &mut state.mode {
        Mode::BetModal(bs) => {
            return match key.code {
                KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::Redraw)
                }
                KeyCode::Enter => {
                    let (seat, amount) = (bs.seat, bs.amount);
                    state.mode = Mode::Normal;
                    Some(UserEvent::ConfirmBet { seat, amount })
                }
                KeyCode::Left | KeyCode::Right | KeyCode::Char('h') | KeyCode::Char('l') | KeyCode::Tab => {
                    bs.seat = 1 - bs.seat;
                    Some(UserEvent::Redraw)
                }
                KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('+') => {
                    bs.amount = bs.amount.saturating_add(1);
                    Some(UserEvent::Redraw)
                }
                KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('-') => {
                    bs.amount = bs.amount.saturating_sub(1);
                    Some(UserEvent::Redraw)
                }
                KeyCode::Backspace => {
                    bs.amount /= 10;
                    Some(UserEvent::Redraw)
                }
                KeyCode::Char(c) => match c.to_digit(10) {
                    Some(d) => {
                        bs.amount = bs.amount.saturating_mul(10).saturating_add(d as u64);
                        Some(UserEvent::Redraw)
                    }
                    None => None,
                },
                _ => None,
            };
        }
        Mode::ClearModal => {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::ConfirmClearHistory)
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::Redraw)
                }
                _ => None,
            };
        }
        Mode::QuitModal => {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => Some(UserEvent::Quit),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::Redraw)
                }
                _ => None,
            };
        }
        Mode::Normal => {}
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            state.mode = Mode::QuitModal;
            Some(UserEvent::Redraw)
        }
        KeyCode::Char(' ') | KeyCode::Char('s') => Some(UserEvent::StartMatch),
        KeyCode::Char('g') => Some(UserEvent::ToggleVariant),
        KeyCode::Char('r') => Some(UserEvent::ResetTournament),
        KeyCode::Char('b') | KeyCode::Char('1') => {
            state.mode = Mode::BetModal(BetState::for_seat(0));
            Some(UserEvent::OpenBetModal)
        }
        KeyCode::Char('2') => {
            state.mode = Mode::BetModal(BetState::for_seat(1));
            Some(UserEvent::OpenBetModal)
        }
        KeyCode::Char('x') => {
            state.mode = Mode::ClearModal;
            Some(UserEvent::OpenClearModal)
        }
        _ => None,
    }
}

fn ui(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    f.render_widget(Clear, f.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),  // tournament
            Constraint::Length(6),  // contestants
            Constraint::Min(10),    // board + bets
            Constraint::Length(12), // history
            Constraint::Length(7),  // status/errors + help
        ])
        .split(f.area());

    draw_tournament(f, chunks[0], snap);
    draw_contestants(f, chunks[1], snap);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[2]);
    draw_board(f, middle[0], snap);
    draw_bets(f, middle[1], snap);

    draw_history(f, chunks[3], snap);
    draw_bottom(f, chunks[4], snap);
    draw_modals(f, state, snap);
}

fn draw_tournament(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let title = if snap.tournament_complete {
        String::from("Tournament complete")
    } else {
        format!(
            "Game {}/{} | next game in {}",
            snap.current_game, snap.total_games, snap.countdown
        )
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .gauge_style(Style::default().fg(Color::Cyan))
        .percent(snap.progress_percent.min(100) as u16);
    f.render_widget(gauge, area);
}

fn draw_contestants(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    for (seat, row) in snap.contestants.iter().enumerate().take(2) {
        let rect = cols[seat];
        f.render_widget(contestant_panel(seat, row, rect.width), rect);
    }
}

fn contestant_panel(seat: usize, row: &ContestantRow, width: u16) -> Paragraph<'static> {
    let c = &row.contestant;
    let color = contestant_color(&c.color);
    let title = format!("[{}] {} {}", seat + 1, c.avatar, c.name);
    let strategy = fit_width(&c.strategy, width.saturating_sub(4) as usize);
    let lines = vec![
        Line::from(strategy),
        Line::from(format!(
            "Odds {:.2} | Win chance {}% | Votes {}",
            c.odds(),
            c.win_chance_percent(),
            c.votes
        )),
        Line::from(format!(
            "Record {}W {}L {}D | Win rate {}%",
            row.stats.wins,
            row.stats.losses,
            row.stats.draws,
            row.stats.win_rate_percent()
        )),
    ];
    Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(Span::styled(
                title,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
    )
}

/// `#RRGGBB` to a terminal colour; anything else renders white.
fn contestant_color(hex_color: &str) -> Color {
    match hex::decode(hex_color.trim_start_matches('#')).as_deref() {
        Ok([r, g, b]) => Color::Rgb(*r, *g, *b),
        _ => Color::White,
    }
}

fn fit_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        if (out.clone() + &ch.to_string()).width() + 1 > max {
            break;
        }
        out.push(ch);
    }
    out.push('…');
    out
}

fn piece_span(cell: Option<Player>, variant: GameVariant, snap: &AppSnapshot) -> Span<'static> {
    let owner = cell.and_then(|player| snap.contestants.get(player.index()));
    match (cell, owner) {
        (Some(player), Some(row)) => {
            let glyph = match (variant, player) {
                (GameVariant::Connect4, _) => "●",
                (GameVariant::TicTacToe, Player::One) => "X",
                (GameVariant::TicTacToe, Player::Two) => "O",
            };
            Span::styled(
                format!(" {glyph} "),
                Style::default()
                    .fg(contestant_color(&row.contestant.color))
                    .add_modifier(Modifier::BOLD),
            )
        }
        _ => Span::styled(" · ", Style::default().fg(Color::DarkGray)),
    }
}

fn board_title(board: &BoardView, snap: &AppSnapshot) -> String {
    let label = board.variant.label();
    if board.playing {
        return format!("{label} | move {}/{}", board.revealed, board.total_moves);
    }
    match board.outcome {
        Some(Outcome::Winner(player)) => {
            let name = snap
                .contestants
                .get(player.index())
                .map(|row| row.contestant.name.as_str())
                .unwrap_or("?");
            format!("{label} | {name} wins")
        }
        Some(Outcome::Draw) => format!("{label} | draw"),
        None => format!("{label} | press space to start"),
    }
}

fn draw_board(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let board = &snap.board;
    let mut lines = Vec::new();
    if board.cells.is_empty() {
        lines.push(Line::styled(
            "No match on the board",
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        for row in &board.cells.iter().chunks(board.columns.max(1)) {
            let spans: Vec<Span> = row
                .map(|cell| piece_span(*cell, board.variant, snap))
                .collect();
            lines.push(Line::from(spans));
        }
        let footer = (1..=board.columns).map(|c| format!(" {c} ")).join("");
        lines.push(Line::styled(footer, Style::default().fg(Color::DarkGray)));
    }
    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(board_title(board, snap)),
    );
    f.render_widget(widget, area);
}

fn bet_line(bet: &BetRecord) -> Line<'static> {
    let (tag, color) = match bet.result {
        BetResult::Pending => (String::from("pending"), Color::Yellow),
        BetResult::Win => (format!("won {:.2}", bet.payout), Color::Green),
        BetResult::Loss => (String::from("lost"), Color::Red),
    };
    Line::from(vec![
        Span::raw(format!(
            "{} {} @ {:.2} -> {:.2} ",
            bet.amount, bet.contestant_name, bet.odds, bet.potential_payout
        )),
        Span::styled(tag, Style::default().fg(color)),
    ])
}

/// `3 bets | 1W 1L | wagered 20.00 | won 20.00 | net +0.00`
fn bet_summary_line(summary: &BetSummary) -> Line<'static> {
    let net = summary.net_profit();
    let net_color = if net < 0.0 { Color::Red } else { Color::Green };
    Line::from(vec![
        Span::styled(
            format!(
                "{} bets | {}W {}L | wagered {:.2} | won {:.2} | ",
                summary.total_bets,
                summary.wins,
                summary.losses,
                summary.total_wagered,
                summary.total_won
            ),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("net {net:+.2}"),
            Style::default().fg(net_color).add_modifier(Modifier::BOLD),
        ),
    ])
}

fn draw_bets(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let title = match &snap.wallet {
        Some(address) => format!("Bets | {}", short_id(address)),
        None => String::from("Bets | no wallet"),
    };
    let mut lines: Vec<Line> = Vec::with_capacity(snap.bets.len() + 1);
    if let Some(summary) = &snap.bet_summary {
        lines.push(bet_summary_line(summary));
    }
    lines.extend(snap.bets.iter().rev().map(bet_line));
    if snap.bets.is_empty() {
        lines.push(Line::styled("None", Style::default().fg(Color::DarkGray)));
    }
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(widget, area);
}

fn short_id(id: &str) -> String {
    if id.chars().count() <= 14 {
        return id.to_string();
    }
    let head: String = id.chars().take(8).collect();
    let tail: String = id.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("{head}…{tail}")
}

fn history_line(record: &MatchRecord) -> Line<'static> {
    let result = match &record.winner_name {
        Some(name) => format!("{name} won"),
        None => String::from("draw"),
    };
    let storage = match &record.storage_blob_id {
        Some(blob_id) if arena_client::walrus_client::is_placeholder_blob_id(blob_id) => {
            Span::styled(" [local]", Style::default().fg(Color::DarkGray))
        }
        Some(blob_id) => Span::styled(
            format!(" [{}]", short_id(blob_id)),
            Style::default().fg(Color::Cyan),
        ),
        None => Span::styled(" [storing]", Style::default().fg(Color::Yellow)),
    };
    Line::from(vec![
        Span::raw(format!(
            "#{} {} vs {} | {} in {} moves",
            record.match_sequence_number,
            record.contestant_a.name,
            record.contestant_b.name,
            result,
            record.move_count
        )),
        storage,
    ])
}

fn draw_history(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut lines: Vec<Line> = snap.history.iter().map(history_line).collect();
    if lines.is_empty() {
        lines.push(Line::styled("None", Style::default().fg(Color::DarkGray)));
    }
    if let Some(storage) = &snap.storage {
        let text = if storage.placeholder {
            format!("Last {}: stored locally as {}", storage.match_id, storage.blob_id)
        } else {
            format!("Last {}: {}", storage.match_id, storage.url)
        };
        lines.push(Line::styled(text, Style::default().fg(Color::DarkGray)));
    }
    let title = if snap.publishing > 0 {
        format!("Match History | publishing {}", snap.publishing)
    } else {
        String::from("Match History")
    };
    let widget =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(widget, area);
}

fn draw_bottom(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Length(3)])
        .split(area);

    let status_widget = if snap.errors.is_empty() {
        let lines: Vec<Line> = if snap.status.trim().is_empty() {
            vec![Line::from("Ready")]
        } else {
            snap.status
                .lines()
                .map(|line| Line::from(line.to_string()))
                .collect()
        };
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .style(Style::default().fg(Color::Green))
    } else {
        let lines: Vec<Line> = snap.errors.iter().map(|e| Line::from(e.clone())).collect();
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Errors"))
            .style(Style::default().fg(Color::Red))
    };
    f.render_widget(status_widget, chunks[0]);

    let help = Paragraph::new(
        "space start | 1/2 bet on seat | g switch game | r restart tournament | x clear history | q/Esc quit",
    )
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, chunks[1]);
}

fn draw_modals(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    match &state.mode {
        Mode::BetModal(bs) => {
            let area = centered_rect(50, 30, f.area());
            let block = Block::default().borders(Borders::ALL).title("Place Bet");
            let mut lines = Vec::new();
            match snap.contestants.get(bs.seat) {
                Some(row) => {
                    let c = &row.contestant;
                    lines.push(Line::from(format!("On: {} {}", c.avatar, c.name)));
                    lines.push(Line::from(format!("Amount: {}", bs.amount)));
                    lines.push(Line::from(format!(
                        "Potential payout: {:.2}",
                        arena_engine::contestants::potential_payout(bs.amount as f64, c.odds())
                    )));
                }
                None => lines.push(Line::from("No contestant in this seat")),
            }
            lines.push(Line::from(
                "Enter=confirm Esc=cancel ←/→ seat +/- or digits to edit",
            ));
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(Paragraph::new(lines), block.inner(area));
        }
        Mode::ClearModal => {
            let area = centered_rect(40, 20, f.area());
            let block = Block::default()
                .borders(Borders::ALL)
                .title("Clear History");
            let p = Paragraph::new("Delete match history and your bets? (Y/N)");
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::QuitModal => {
            let area = centered_rect(40, 20, f.area());
            let block = Block::default().borders(Borders::ALL).title("Confirm Quit");
            let p = Paragraph::new("Quit the arena? (Y/N)");
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::Normal => {}
    }
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1])[1]
}
