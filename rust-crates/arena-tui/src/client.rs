use crate::ui;
use arena_client::{
    config::AppConfig,
    http::ReqwestTransport,
    session::{
        ArenaSession,
        CompletedMatch,
        GameVariant,
    },
    walrus_client::{
        BattlePayload,
        BlobReceipt,
        WalrusClient,
        is_placeholder_blob_id,
    },
    wallets::{
        LocalWallet,
        WalletSigner,
        resolve_wallet_dir,
    },
};
use arena_engine::{
    Contestant,
    CounterEvent,
    Outcome,
    Player,
    tournament::GameCounter,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    anyhow,
    eyre,
};
use ledger::{
    BetSummary,
    ContestantStats,
    Ledger,
    records::{
        BetRecord,
        MatchRecord,
    },
    store::SledKeyValueStore,
};
use rand::{
    SeedableRng,
    rngs::StdRng,
};
use std::time::Duration;
use tokio::{
    sync::mpsc,
    time::{
        self,
        Instant,
        MissedTickBehavior,
    },
};
use tracing::{
    info,
    warn,
};

const HISTORY_DEPTH: usize = 10;
const MAX_ERRORS: usize = 5;

#[derive(Clone, Debug)]
pub struct ContestantRow {
    pub contestant: Contestant,
    pub stats: ContestantStats,
}

#[derive(Clone, Debug)]
pub struct BoardView {
    pub variant: GameVariant,
    pub columns: usize,
    pub cells: Vec<Option<Player>>,
    pub revealed: usize,
    pub total_moves: usize,
    pub playing: bool,
    pub outcome: Option<Outcome>,
}

#[derive(Clone, Debug)]
pub struct StorageView {
    pub match_id: String,
    pub blob_id: String,
    pub url: String,
    pub placeholder: bool,
}

#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub contestants: Vec<ContestantRow>,
    pub board: BoardView,
    pub current_game: u32,
    pub total_games: u32,
    pub countdown: String,
    pub progress_percent: u32,
    pub tournament_complete: bool,
    pub wallet: Option<String>,
    pub bets: Vec<BetRecord>,
    pub bet_summary: Option<BetSummary>,
    pub history: Vec<MatchRecord>,
    pub storage: Option<StorageView>,
    pub publishing: usize,
    pub status: String,
    pub errors: Vec<String>,
}

pub struct AppController {
    session: ArenaSession<SledKeyValueStore>,
    wallet: Option<LocalWallet>,
    walrus: WalrusClient<ReqwestTransport>,
    rng: StdRng,
    status: String,
    errors: Vec<String>,
    last_storage: Option<StorageView>,
    publishing: usize,
}

impl AppController {
    pub fn new(config: &AppConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).wrap_err_with(|| {
            format!("failed to create data dir {}", config.data_dir.display())
        })?;
        let store = SledKeyValueStore::open(&config.data_dir).map_err(|e| eyre!(e))?;
        let counter = GameCounter::new(config.total_games, config.countdown_secs);
        let mut rng = StdRng::from_os_rng();
        let mut session = ArenaSession::new(Ledger::new(store), counter, &mut rng);

        let wallet = match &config.wallet {
            Some(name) => {
                let dir = resolve_wallet_dir(config.wallet_dir.as_deref());
                let wallet = LocalWallet::open(&dir, name)
                    .wrap_err_with(|| format!("failed to load wallet '{name}'"))?;
                info!(wallet = wallet.name(), address = wallet.address(), "wallet connected");
                Some(wallet)
            }
            None => None,
        };

        let walrus = WalrusClient::new(
            ReqwestTransport::new()?,
            config.relay.publishers.clone(),
            config.relay.aggregator_url.clone(),
        );
        info!(
            publishers = walrus.publishers().len(),
            network = %config.network,
            "arena client configured"
        );

        let legacy = session.take_legacy_bets()?;
        let status = if legacy.is_empty() {
            String::from("Ready")
        } else {
            format!("Discarded {} bets from the old shared list", legacy.len())
        };

        Ok(Self {
            session,
            wallet,
            walrus,
            rng,
            status,
            errors: Vec::new(),
            last_storage: None,
            publishing: 0,
        })
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    fn push_error(&mut self, error: impl Into<String>) {
        let error = error.into();
        warn!(%error, "operation failed");
        self.errors.push(error);
        if self.errors.len() > MAX_ERRORS {
            let excess = self.errors.len() - MAX_ERRORS;
            self.errors.drain(..excess);
        }
    }

    fn clear_errors(&mut self) {
        self.errors.clear();
    }

    fn wallet_address(&self) -> Option<String> {
        self.wallet.as_ref().and_then(|wallet| wallet.current_account())
    }

    fn start_match(&mut self) {
        self.clear_errors();
        if self.session.start_match(&mut self.rng) {
            let [a, b] = self.session.pair();
            let status = format!(
                "{} {} vs {} {} | {}",
                a.avatar,
                a.name,
                b.avatar,
                b.name,
                self.session.variant().label()
            );
            self.set_status(status);
        } else {
            self.set_status("A match is already running");
        }
    }

    fn toggle_variant(&mut self) {
        if self.session.toggle_variant() {
            let label = self.session.variant().label();
            self.set_status(format!("Game switched to {label}"));
        } else {
            self.set_status("Wait for the running match to finish before switching games");
        }
    }

    fn tick_move(&mut self) -> Option<CompletedMatch> {
        match self.session.tick_move(&mut self.rng) {
            Ok(Some(completed)) => {
                let message = match &completed.record.winner_name {
                    Some(name) => format!("{name} wins in {} moves!", completed.record.move_count),
                    None => format!("Draw after {} moves", completed.record.move_count),
                };
                let settled = completed
                    .settlement
                    .map(|s| format!(" | settled {} won, {} lost", s.wins, s.losses))
                    .unwrap_or_default();
                self.set_status(format!("{message}{settled} | storing battle..."));
                if let Some(error) = &completed.settlement_error {
                    self.push_error(error.clone());
                }
                self.publishing += 1;
                Some(completed)
            }
            Ok(None) => None,
            Err(err) => {
                self.push_error(format!("Failed to record match: {err:#}"));
                None
            }
        }
    }

    fn tick_countdown(&mut self) {
        match self.session.tick_countdown(&mut self.rng) {
            Some(CounterEvent::NextGame(game)) => {
                let total = self.session.counter().total_games();
                self.set_status(format!("Game {game}/{total}: place your bets"));
            }
            Some(CounterEvent::Finished) => self.set_status("Tournament complete"),
            None => {}
        }
    }

    fn reset_tournament(&mut self) {
        self.session.reset_tournament();
        self.set_status("Tournament restarted");
    }

    fn place_bet(&mut self, seat: usize, amount: u64) {
        self.clear_errors();
        let Some(wallet) = self.wallet.as_ref() else {
            self.push_error("Connect a wallet with --wallet <name> to place bets");
            return;
        };
        let Some(contestant) = self.session.pair().get(seat).cloned() else {
            return;
        };
        let checked = self.session.check_bet(&contestant.id, amount as f64).map(|_| ());
        if let Err(err) = checked {
            self.push_error(format!("{err:#}"));
            return;
        }
        let address = wallet.address().to_string();
        let request = wallet.next_request();
        let transaction_ref = match wallet.sign_and_submit(&request) {
            Ok(reference) => reference,
            Err(err) => {
                self.push_error(format!("Wallet rejected the bet: {err:#}"));
                return;
            }
        };
        match self
            .session
            .place_bet(&address, &contestant.id, amount as f64, &transaction_ref)
        {
            Ok(bet) => self.set_status(format!(
                "Bet {} on {} | potential payout {:.2}",
                bet.amount, bet.contestant_name, bet.potential_payout
            )),
            Err(err) => self.push_error(format!("{err:#}")),
        }
    }

    fn clear_history(&mut self) {
        let address = self.wallet_address();
        let cleared = match self.session.clear_history() {
            Ok(()) => match address {
                Some(address) => self.session.clear_bets(&address),
                None => Ok(()),
            },
            Err(err) => Err(err),
        };
        match cleared {
            Ok(()) => self.set_status("History cleared"),
            Err(err) => self.push_error(format!("Failed to clear history: {err:#}")),
        }
    }

    fn apply_receipt(&mut self, match_id: String, receipt: BlobReceipt) {
        self.publishing = self.publishing.saturating_sub(1);
        if let Err(err) = self.session.attach_receipt(&match_id, &receipt) {
            self.push_error(format!("Failed to save blob id: {err:#}"));
        }
        if receipt.is_placeholder() {
            self.set_status(format!(
                "Storage unavailable; saved placeholder {}",
                receipt.blob_id
            ));
        } else {
            self.set_status(format!("Battle stored: {}", receipt.blob_id));
        }
        self.last_storage = Some(StorageView {
            url: self.walrus.blob_url(&receipt.blob_id),
            placeholder: is_placeholder_blob_id(&receipt.blob_id),
            match_id,
            blob_id: receipt.blob_id,
        });
    }

    pub fn build_snapshot(&self) -> Result<AppSnapshot> {
        let stats = self.session.contestant_stats()?;
        let contestants = self
            .session
            .pair()
            .iter()
            .map(|contestant| ContestantRow {
                stats: stats.get(&contestant.id).copied().unwrap_or_default(),
                contestant: contestant.clone(),
            })
            .collect();

        let variant = self.session.variant();
        let board = match self.session.replay() {
            Some(replay) => BoardView {
                variant: replay.variant(),
                columns: replay.variant().columns(),
                cells: replay.cells(),
                revealed: replay.revealed(),
                total_moves: replay.moves().len(),
                playing: !replay.is_finished(),
                outcome: replay.outcome(),
            },
            None => BoardView {
                variant,
                columns: variant.columns(),
                cells: Vec::new(),
                revealed: 0,
                total_moves: 0,
                playing: false,
                outcome: None,
            },
        };

        let wallet = self.wallet_address();
        let (bets, bet_summary) = match &wallet {
            Some(address) => (
                self.session.bets(address)?,
                Some(self.session.bet_summary(address)?),
            ),
            None => (Vec::new(), None),
        };
        let mut history = self.session.history()?;
        history.reverse();
        history.truncate(HISTORY_DEPTH);

        let counter = self.session.counter();
        Ok(AppSnapshot {
            contestants,
            board,
            current_game: counter.current_game().min(counter.total_games()),
            total_games: counter.total_games(),
            countdown: counter.format_remaining(),
            progress_percent: counter.progress_percent(),
            tournament_complete: counter.is_complete(),
            wallet,
            bets,
            bet_summary,
            history,
            storage: self.last_storage.clone(),
            publishing: self.publishing,
            status: self.status.clone(),
            errors: self.errors.clone(),
        })
    }
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let controller = AppController::new(&config)?;
    let mut ui_state = ui::UiState::default();
    let mut input_events = ui::input_event_stream();

    tracing::info!("Starting UI");
    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(
        controller,
        config.move_interval,
        &mut ui_state,
        &mut input_events,
    )
    .await;
    ui::terminal_exit()?;
    res
}

enum PublishCommand {
    Publish {
        match_id: String,
        payload: Box<BattlePayload>,
    },
    Shutdown,
}

enum PublishEvent {
    Stored {
        match_id: String,
        receipt: BlobReceipt,
    },
}

/// Publishes finished matches one at a time. Queued jobs still run after
/// `Shutdown` is sent, so no publish is abandoned midway.
async fn publish_worker(
    walrus: WalrusClient<ReqwestTransport>,
    mut cmd_rx: mpsc::UnboundedReceiver<PublishCommand>,
    event_tx: mpsc::UnboundedSender<PublishEvent>,
) -> Result<()> {
    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            PublishCommand::Publish { match_id, payload } => {
                let receipt = walrus.publish_or_placeholder(&payload).await;
                event_tx
                    .send(PublishEvent::Stored { match_id, receipt })
                    .map_err(|_| eyre!("publish receiver dropped"))?;
            }
            PublishCommand::Shutdown => break,
        }
    }
    Ok(())
}

fn redraw(
    controller: &AppController,
    ui_state: &mut ui::UiState,
    context: &'static str,
) -> Result<()> {
    let snapshot = controller.build_snapshot().wrap_err(context)?;
    ui::draw(ui_state, &snapshot).wrap_err(context)
}

async fn run_loop(
    mut controller: AppController,
    move_interval: Duration,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventReceiver,
) -> Result<()> {
    tracing::info!("Running app loop");
    let (publish_cmd_tx, publish_cmd_rx) = mpsc::unbounded_channel();
    let (publish_event_tx, mut publish_event_rx) = mpsc::unbounded_channel();
    let publish_handle = tokio::spawn(publish_worker(
        controller.walrus.clone(),
        publish_cmd_rx,
        publish_event_tx,
    ));

    let mut move_ticker = time::interval(move_interval);
    move_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let second = Duration::from_secs(1);
    let mut countdown_ticker = time::interval_at(Instant::now() + second, second);
    countdown_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    redraw(&controller, ui_state, "initial draw failed")?;
    let mut publish_worker_closed = false;

    loop {
        tokio::select! {
            _ = move_ticker.tick() => {
                if !controller.session.is_playing() {
                    continue;
                }
                if let Some(completed) = controller.tick_move() {
                    let _ = publish_cmd_tx.send(PublishCommand::Publish {
                        match_id: completed.match_id().to_string(),
                        payload: Box::new(completed.payload),
                    });
                }
                redraw(&controller, ui_state, "draw after move failed")?;
            }
            _ = countdown_ticker.tick() => {
                controller.tick_countdown();
                redraw(&controller, ui_state, "draw after countdown failed")?;
            }
            maybe_event = publish_event_rx.recv() => {
                match maybe_event {
                    Some(PublishEvent::Stored { match_id, receipt }) => {
                        controller.apply_receipt(match_id, receipt);
                        redraw(&controller, ui_state, "draw after publish failed")?;
                    }
                    None => {
                        tracing::warn!("publish worker channel closed");
                        publish_worker_closed = true;
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
            raw_ev = ui::next_raw_event(input_events) => {
                let event = raw_ev?;
                let Some(ev) = ui::interpret_event(ui_state, event) else {
                    continue;
                };
                match ev {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::StartMatch => controller.start_match(),
                    ui::UserEvent::ToggleVariant => controller.toggle_variant(),
                    ui::UserEvent::ResetTournament => controller.reset_tournament(),
                    ui::UserEvent::ConfirmBet { seat, amount } => {
                        controller.place_bet(seat, amount);
                    }
                    ui::UserEvent::ConfirmClearHistory => controller.clear_history(),
                    ui::UserEvent::OpenBetModal
                    | ui::UserEvent::OpenClearModal
                    | ui::UserEvent::Redraw => {}
                }
                redraw(&controller, ui_state, "draw after input failed")?;
            }
        }
    }

    let _ = publish_cmd_tx.send(PublishCommand::Shutdown);
    let worker_result = publish_handle.await;
    // receipts that arrived while shutting down still get saved
    while let Ok(PublishEvent::Stored { match_id, receipt }) = publish_event_rx.try_recv() {
        controller.apply_receipt(match_id, receipt);
    }
    match worker_result {
        Ok(Ok(())) => {
            if publish_worker_closed {
                return Err(anyhow!("Publish worker exited unexpectedly"));
            }
        }
        Ok(Err(err)) => {
            return Err(err).wrap_err("publish worker failed");
        }
        Err(err) => {
            return Err(anyhow!(err)).wrap_err("publish worker panicked");
        }
    }
    Ok(())
}
