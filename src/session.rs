//! Session lifecycle: the state machine, its pollers, and user actions.
//!
//! One [`Coordinator`] owns the whole mutable session and processes every
//! signal (poll ticks, countdown ticks, user actions) sequentially on a single
//! event loop, so each handler runs to completion before the next. The
//! `finalized` flag is the sole gate on the terminal commit; response arrival
//! order is never trusted.

use crate::api::{ApiError, GameApi, GameId, GameStatus, Move, StatusSnapshot};
use crate::clock::PollClock;
use crate::config::Config;
use crate::countdown::{Countdown, CountdownStep};
use crate::view::{FinalOutcome, GameView, Notice, Route, Seat};
use color_eyre::eyre::Result;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Searching,
    WaitingOpponent,
    Betting,
    Playing,
    Finalizing,
    Finished,
    Cancelled,
}

impl From<GameStatus> for Phase {
    fn from(status: GameStatus) -> Self {
        match status {
            GameStatus::Waiting => Phase::WaitingOpponent,
            GameStatus::Betting => Phase::Betting,
            GameStatus::Playing => Phase::Playing,
            GameStatus::Finished => Phase::Finished,
            GameStatus::Cancelled => Phase::Cancelled,
        }
    }
}

/// The single mutable aggregate for one game (or one search for a game).
/// Replaced wholesale on game entry; never mutated after finalization.
#[derive(Debug, Clone)]
pub struct Session {
    pub game_id: Option<GameId>,
    pub phase: Phase,
    /// Monotonic false→true while `game_id` is set. Prevents a double commit
    /// of the terminal UI transition.
    pub finalized: bool,
    pub bet_amount: Option<u64>,
    /// True while a finalize guard cycle owns the terminal decision.
    pub awaiting_finalize: bool,
    pub finalize_attempts: u32,
    pub is_player1: Option<bool>,
    // set-once view state, so duplicate snapshots cannot re-trigger effects
    pub revealed_player1: bool,
    pub revealed_player2: bool,
    pub bot_named: bool,
    pub shown_bank: Option<f64>,
    pub cancel_visible: bool,
}

impl Session {
    pub fn idle() -> Self {
        Self {
            game_id: None,
            phase: Phase::Idle,
            finalized: false,
            bet_amount: None,
            awaiting_finalize: false,
            finalize_attempts: 0,
            is_player1: None,
            revealed_player1: false,
            revealed_player2: false,
            bot_named: false,
            shown_bank: None,
            cancel_visible: false,
        }
    }

    pub fn with_game(game_id: GameId) -> Self {
        Self {
            game_id: Some(game_id),
            phase: Phase::WaitingOpponent,
            ..Self::idle()
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::idle()
    }
}

/// Everything that can wake the coordinator.
#[derive(Debug)]
pub enum Event {
    StatusTick,
    FinalizeTick,
    SearchTick,
    MoveTick,
    Action(UserAction),
    Shutdown,
}

#[derive(Debug, Clone)]
pub enum UserAction {
    PlaceBet { amount: u64 },
    CancelSearch,
    SubmitMove { mv: Move },
    CancelGame,
    Rematch,
}

/// Finalize-ready: the snapshot is sufficient to show a terminal result.
/// Both moves without a settled `result` still qualify, so both hands can be
/// shown before the payout lands; the authoritative outcome only ever comes
/// from `result`.
pub fn finalize_ready(snapshot: &StatusSnapshot) -> bool {
    snapshot.status == GameStatus::Finished
        && (snapshot.result.is_some()
            || (snapshot.player1_move.is_some() && snapshot.player2_move.is_some()))
}

pub struct Coordinator<A, V> {
    api: A,
    view: V,
    config: Config,
    session: Session,
    search_countdown: Countdown,
    move_countdown: Countdown,
    search_clock: PollClock,
    move_clock: PollClock,
    status_clock: PollClock,
    finalize_clock: PollClock,
    events_tx: mpsc::UnboundedSender<Event>,
}

impl<A: GameApi, V: GameView> Coordinator<A, V> {
    pub fn new(api: A, view: V, config: Config) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let coordinator = Self {
            api,
            view,
            session: Session::idle(),
            search_countdown: Countdown::new(config.search_start),
            move_countdown: Countdown::with_extension(config.move_start, config.move_extension),
            search_clock: PollClock::new(),
            move_clock: PollClock::new(),
            status_clock: PollClock::new(),
            finalize_clock: PollClock::new(),
            events_tx,
            config,
        };
        (coordinator, events_rx)
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.events_tx.clone()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// True while any clock or countdown of this session is live. Teardown
    /// must leave nothing running.
    pub fn timers_active(&self) -> bool {
        self.status_clock.is_running()
            || self.finalize_clock.is_running()
            || self.search_clock.is_running()
            || self.move_clock.is_running()
            || self.search_countdown.is_running()
            || self.move_countdown.is_running()
    }

    /// Drives the coordinator until the channel closes or a shutdown arrives.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<Event>) -> Result<()> {
        while let Some(event) = events.recv().await {
            if matches!(event, Event::Shutdown) {
                self.stop_all();
                break;
            }
            self.handle_event(event).await;
        }
        Ok(())
    }

    pub async fn handle_event(&mut self, event: Event) {
        match event {
            Event::StatusTick => self.status_tick().await,
            Event::FinalizeTick => self.finalize_tick().await,
            Event::SearchTick => self.search_tick().await,
            Event::MoveTick => self.move_tick(),
            Event::Action(action) => self.dispatch(action).await,
            Event::Shutdown => {}
        }
    }

    pub async fn dispatch(&mut self, action: UserAction) {
        match action {
            UserAction::PlaceBet { amount } => self.place_bet(amount).await,
            UserAction::CancelSearch => self.cancel_search().await,
            UserAction::SubmitMove { mv } => self.submit_move(mv).await,
            UserAction::CancelGame => self.cancel_game().await,
            UserAction::Rematch => self.rematch().await,
        }
    }

    /// Creates a fresh session for a known game and starts status polling.
    /// Any previous session's timers are stopped first.
    pub fn enter_game(&mut self, game_id: GameId) {
        self.stop_all();
        self.session = Session::with_game(game_id);
        info!(%game_id, "entering game");
        self.view.set_move_inputs_enabled(true);
        self.start_status_polling();
    }

    // ---- session state machine ----------------------------------------

    /// The single entry point for authoritative status, from either poller or
    /// inline action responses. Safe under duplicate and overlapping
    /// snapshots; commits the terminal transition at most once per session.
    pub fn on_snapshot(&mut self, snapshot: &StatusSnapshot) {
        if self.session.finalized {
            return;
        }
        if snapshot.status == GameStatus::Cancelled {
            self.commit_terminal(FinalOutcome::Cancelled);
            return;
        }
        if self.session.awaiting_finalize {
            // the guard owns the terminal decision for this cycle
            self.apply_updates(snapshot);
            return;
        }
        if finalize_ready(snapshot) {
            self.apply_updates(snapshot);
            self.commit_terminal(FinalOutcome::Finished {
                result: snapshot.result,
            });
            return;
        }
        self.apply_updates(snapshot);
    }

    /// Non-terminal, idempotent view updates.
    fn apply_updates(&mut self, snapshot: &StatusSnapshot) {
        if let Some(flag) = snapshot.is_player1 {
            self.session.is_player1 = Some(flag);
        }
        if let Some(mv) = snapshot.player1_move {
            self.reveal_once(Seat::Player1, mv);
        }
        if let Some(mv) = snapshot.player2_move {
            self.reveal_once(Seat::Player2, mv);
        }
        if snapshot.is_bot_game && !self.session.bot_named {
            if let Some(name) = &snapshot.bot_name {
                self.session.bot_named = true;
                self.view.set_opponent_name(name);
            }
        }
        if let Some(bank) = snapshot.game_bank {
            if self.session.shown_bank != Some(bank) {
                self.session.shown_bank = Some(bank);
                self.view.set_bank(bank);
            }
        }

        let in_round = matches!(snapshot.status, GameStatus::Betting | GameStatus::Playing);
        if self.session.cancel_visible != in_round {
            self.session.cancel_visible = in_round;
            self.view.set_cancel_visible(in_round);
        }
        self.session.phase = if self.session.awaiting_finalize {
            Phase::Finalizing
        } else {
            match snapshot.status {
                // the commit, not the raw status, moves us to Finished
                GameStatus::Finished | GameStatus::Cancelled => Phase::Finalizing,
                other => Phase::from(other),
            }
        };
        if in_round {
            self.ensure_move_countdown();
        }
    }

    fn reveal_once(&mut self, seat: Seat, mv: Move) {
        let revealed = match seat {
            Seat::Player1 => &mut self.session.revealed_player1,
            Seat::Player2 => &mut self.session.revealed_player2,
        };
        if !*revealed {
            *revealed = true;
            self.view.reveal_move(seat, mv);
        }
    }

    /// The one-time terminal transition. Gated by `finalized`, never by
    /// response order; callable from any handler.
    fn commit_terminal(&mut self, outcome: FinalOutcome) {
        if self.session.finalized {
            return;
        }
        self.session.finalized = true;
        self.session.awaiting_finalize = false;
        self.stop_all();
        self.session.phase = match outcome {
            FinalOutcome::Cancelled => Phase::Cancelled,
            FinalOutcome::Finished { .. } => Phase::Finished,
        };
        info!(game_id = ?self.session.game_id, phase = ?self.session.phase, "session finalized");
        self.view.set_move_inputs_enabled(false);
        self.view.set_cancel_visible(false);
        self.view.hide_move_countdown();
        self.view.commit_final(&outcome);
    }

    fn stop_all(&mut self) {
        self.status_clock.stop();
        self.finalize_clock.stop();
        self.search_clock.stop();
        self.move_clock.stop();
        self.search_countdown.stop();
        self.move_countdown.stop();
    }

    // ---- status poller -------------------------------------------------

    fn start_status_polling(&mut self) {
        // PollClock::start has restart semantics, so re-entry and rematch
        // never leave two concurrent status pollers behind.
        let tx = self.events_tx.clone();
        self.status_clock.start(self.config.status_poll, move || {
            let _ = tx.send(Event::StatusTick);
        });
    }

    async fn status_tick(&mut self) {
        if self.session.finalized {
            return;
        }
        let Some(game_id) = self.session.game_id else {
            return;
        };
        match self.api.status(game_id).await {
            Ok(snapshot) => self.on_snapshot(&snapshot),
            // failed ticks are skipped; the next scheduled tick retries
            Err(err) => debug!(%game_id, error = %err, "status poll skipped"),
        }
    }

    // ---- finalize guard ------------------------------------------------

    /// Entered after a local move when the server says the game is finished
    /// but the response lacks the authoritative result. Polls aggressively,
    /// bounded by the attempt ceiling.
    fn enter_finalize_guard(&mut self) {
        self.session.awaiting_finalize = true;
        self.session.finalize_attempts = 0;
        self.session.phase = Phase::Finalizing;
        let tx = self.events_tx.clone();
        self.finalize_clock.start(self.config.finalize_poll, move || {
            let _ = tx.send(Event::FinalizeTick);
        });
    }

    async fn finalize_tick(&mut self) {
        if !self.session.awaiting_finalize || self.session.finalized {
            return;
        }
        let Some(game_id) = self.session.game_id else {
            return;
        };
        self.session.finalize_attempts += 1;
        let attempt = self.session.finalize_attempts;
        match self.api.status(game_id).await {
            Ok(snapshot) => {
                if snapshot.status == GameStatus::Cancelled {
                    self.commit_terminal(FinalOutcome::Cancelled);
                    return;
                }
                self.apply_updates(&snapshot);
                if finalize_ready(&snapshot) {
                    self.commit_terminal(FinalOutcome::Finished {
                        result: snapshot.result,
                    });
                    return;
                }
            }
            Err(err) => debug!(%game_id, attempt, error = %err, "finalize poll skipped"),
        }
        if self.session.finalize_attempts >= self.config.finalize_ceiling {
            // give up the aggressive cycle; the status poller is still running
            // and may finalize later
            self.session.awaiting_finalize = false;
            self.finalize_clock.stop();
            self.view
                .notify(Notice::Info, "Result is taking longer than usual");
        }
    }

    // ---- countdowns ----------------------------------------------------

    fn ensure_move_countdown(&mut self) {
        if !self.move_countdown.start() {
            return;
        }
        self.view.show_move_countdown(self.move_countdown.remaining());
        let tx = self.events_tx.clone();
        self.move_clock.start(self.config.countdown_tick, move || {
            let _ = tx.send(Event::MoveTick);
        });
    }

    fn move_tick(&mut self) {
        if !self.move_countdown.is_running() {
            return;
        }
        match self.move_countdown.tick() {
            CountdownStep::Running { remaining } => {
                self.view.show_move_countdown(remaining);
            }
            CountdownStep::Extended { remaining } => {
                self.view.show_move_countdown(remaining);
                self.view.notify(
                    Notice::Info,
                    &format!("Extra time: +{remaining} seconds"),
                );
            }
            CountdownStep::Expired => {
                // the forfeit itself is server-authoritative; the status
                // poller delivers whatever the server decides
                self.move_clock.stop();
                self.view.hide_move_countdown();
                self.view.notify(Notice::Error, "Time is up!");
            }
        }
    }

    fn start_search_countdown(&mut self, amount: u64) {
        self.session = Session::idle();
        self.session.phase = Phase::Searching;
        self.session.bet_amount = Some(amount);
        self.search_countdown.start();
        self.view
            .show_search_countdown(self.search_countdown.remaining());
        let tx = self.events_tx.clone();
        self.search_clock.start(self.config.countdown_tick, move || {
            let _ = tx.send(Event::SearchTick);
        });
    }

    async fn search_tick(&mut self) {
        if !self.search_countdown.is_running() {
            return;
        }
        match self.search_countdown.tick() {
            CountdownStep::Running { remaining } | CountdownStep::Extended { remaining } => {
                self.view.show_search_countdown(remaining);
                self.check_for_opponent().await;
            }
            CountdownStep::Expired => {
                self.search_clock.stop();
                self.connect_bot().await;
            }
        }
    }

    /// Side-channel existence check while the search countdown runs.
    async fn check_for_opponent(&mut self) {
        let Some(amount) = self.session.bet_amount else {
            return;
        };
        match self.api.search(amount).await {
            Ok(response) if response.opponent_found => {
                if let Some(game_id) = response.game_id {
                    self.search_clock.stop();
                    self.search_countdown.stop();
                    self.view.navigate(Route::Game(game_id));
                    self.enter_game(game_id);
                }
            }
            Ok(_) => {}
            Err(err) => debug!(error = %err, "opponent check skipped"),
        }
    }

    /// One-time escalation when the search countdown expires.
    async fn connect_bot(&mut self) {
        let Some(amount) = self.session.bet_amount else {
            return;
        };
        match self.api.connect_bot(amount).await {
            Ok(response) if response.bot_connected || response.opponent_found => {
                if let Some(game_id) = response.game_id {
                    self.view.notify(Notice::Success, "Connected!");
                    self.view.navigate(Route::Game(game_id));
                    self.enter_game(game_id);
                }
            }
            Ok(_) => {
                self.session.phase = Phase::Idle;
            }
            Err(ApiError::Server(message)) => {
                self.view.notify(Notice::Error, &message);
                self.session.phase = Phase::Idle;
            }
            Err(err) => {
                error!(error = %err, "bot connect failed");
                self.view.notify(Notice::Error, "Could not connect an opponent");
                self.session.phase = Phase::Idle;
            }
        }
    }

    // ---- action dispatcher ---------------------------------------------

    async fn place_bet(&mut self, amount: u64) {
        if self.session.game_id.is_some() || self.session.phase == Phase::Searching {
            self.view.notify(Notice::Error, "Already in a game");
            return;
        }
        match self.api.search(amount).await {
            Ok(response) if response.opponent_found => {
                if let Some(game_id) = response.game_id {
                    self.view.notify(Notice::Success, "Opponent found!");
                    self.view.navigate(Route::Game(game_id));
                    self.enter_game(game_id);
                }
            }
            Ok(_) => self.start_search_countdown(amount),
            Err(ApiError::Server(message)) => {
                self.view.notify(Notice::Error, &message);
            }
            Err(err) => {
                error!(error = %err, "game search failed");
                self.view.notify(Notice::Error, "Could not search for a game");
            }
        }
    }

    async fn cancel_search(&mut self) {
        self.search_clock.stop();
        self.search_countdown.stop();
        // server-side dequeue is fire-and-forget
        if let Err(err) = self.api.cancel_search().await {
            debug!(error = %err, "search cancel not delivered");
        }
        self.session.phase = Phase::Idle;
        self.session.bet_amount = None;
        self.view.notify(Notice::Info, "Search cancelled");
    }

    async fn submit_move(&mut self, mv: Move) {
        let Some(game_id) = self.session.game_id else {
            self.view.notify(Notice::Error, "No active game");
            return;
        };
        // optimistic and irreversible for this turn: block a double
        // submission before the request resolves
        self.view.set_move_inputs_enabled(false);
        match self.api.submit_move(game_id, mv).await {
            Ok(response) => {
                if self.session.is_player1 != Some(false) {
                    self.reveal_once(Seat::Player1, mv);
                }
                if let Some(opponent_move) = response.player2_move {
                    self.reveal_once(Seat::Player2, opponent_move);
                }
                if response.game_finished && !self.session.finalized {
                    if response.result.is_some() && response.player2_move.is_some() {
                        // the response already carries the authoritative end
                        self.commit_terminal(FinalOutcome::Finished {
                            result: response.result,
                        });
                    } else {
                        self.enter_finalize_guard();
                    }
                }
            }
            Err(ApiError::Server(message)) => {
                self.view.notify(Notice::Error, &message);
                self.view.set_move_inputs_enabled(true);
            }
            Err(err) => {
                error!(%game_id, error = %err, "move submission failed");
                self.view.notify(Notice::Error, "Could not submit the move");
                self.view.set_move_inputs_enabled(true);
            }
        }
    }

    async fn cancel_game(&mut self) {
        let Some(game_id) = self.session.game_id else {
            self.view.notify(Notice::Error, "No active game");
            return;
        };
        if !self
            .view
            .confirm("Cancel the game? Stakes will be refunded.")
        {
            return;
        }
        match self.api.cancel_game(game_id).await {
            Ok(response) if response.success => {
                let message = response
                    .message
                    .unwrap_or_else(|| "Game cancelled, stakes refunded".into());
                self.view.notify(Notice::Success, &message);
                self.stop_all();
                self.session.finalized = true;
                self.session.phase = Phase::Cancelled;
                // keep the success notice visible before leaving the page
                time::sleep(self.config.exit_delay).await;
                self.view.navigate(Route::Lobby);
            }
            Ok(_) => {}
            Err(ApiError::Server(message)) => {
                self.view.notify(Notice::Error, &message);
            }
            Err(err) => {
                error!(%game_id, error = %err, "game cancel failed");
                self.view.notify(Notice::Error, "Could not cancel the game");
            }
        }
    }

    async fn rematch(&mut self) {
        let Some(game_id) = self.session.game_id else {
            self.view.notify(Notice::Error, "No active game");
            return;
        };
        match self.api.rematch(game_id).await {
            Ok(response) if response.success => {
                if let Some(new_id) = response.game_id {
                    self.view.notify(Notice::Success, "New game created!");
                    // stop the old session's pollers before the new page
                    // takes over; enter_game builds a fresh session
                    self.stop_all();
                    self.view.navigate(Route::Game(new_id));
                    self.enter_game(new_id);
                }
            }
            Ok(_) => {}
            Err(ApiError::Server(message)) => {
                self.view.notify(Notice::Error, &message);
            }
            Err(err) => {
                error!(%game_id, error = %err, "rematch failed");
                self.view.notify(Notice::Error, "Could not start a rematch");
            }
        }
    }
}
