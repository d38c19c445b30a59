//! The UI surface the coordinator drives. Rendering is collaborator-owned;
//! the coordinator only issues idempotent update calls through [`GameView`].

use crate::api::{GameId, Move, Outcome};
use chrono::Local;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    Player1,
    Player2,
}

/// Notification severity, mirrored in how the console view prefixes lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Info,
    Success,
    Error,
}

/// The one-time terminal display state.
///
/// `Finished { result: None }` is the provisional case: both hands are visible
/// but the server has not settled the payout yet. Views must label it as such.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalOutcome {
    Cancelled,
    Finished { result: Option<Outcome> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Lobby,
    Game(GameId),
}

pub trait GameView {
    fn reveal_move(&mut self, seat: Seat, mv: Move);
    fn set_bank(&mut self, bank: f64);
    fn set_opponent_name(&mut self, name: &str);
    fn set_cancel_visible(&mut self, visible: bool);
    fn set_move_inputs_enabled(&mut self, enabled: bool);
    fn show_search_countdown(&mut self, remaining: u32);
    fn show_move_countdown(&mut self, remaining: u32);
    fn hide_move_countdown(&mut self);
    fn notify(&mut self, level: Notice, message: &str);
    /// Blocking yes/no prompt for destructive actions.
    fn confirm(&mut self, prompt: &str) -> bool;
    /// The terminal commit. The coordinator guarantees at most one call per
    /// session; views may assume it and tear down freely.
    fn commit_final(&mut self, outcome: &FinalOutcome);
    fn navigate(&mut self, route: Route);
}

/// Plain line-oriented view for the interactive binary.
#[derive(Debug, Default)]
pub struct ConsoleView;

impl ConsoleView {
    pub fn new() -> Self {
        Self
    }

    fn line(&self, text: &str) {
        println!("[{}] {text}", Local::now().format("%H:%M:%S"));
    }
}

impl GameView for ConsoleView {
    fn reveal_move(&mut self, seat: Seat, mv: Move) {
        // the console does not know which seat is local, so label by seat
        let who = match seat {
            Seat::Player1 => "player 1",
            Seat::Player2 => "player 2",
        };
        self.line(&format!("{who}: {} {mv}", mv.glyph()));
    }

    fn set_bank(&mut self, bank: f64) {
        self.line(&format!("bank: {bank:.0}"));
    }

    fn set_opponent_name(&mut self, name: &str) {
        self.line(&format!("opponent: {name}"));
    }

    fn set_cancel_visible(&mut self, visible: bool) {
        if visible {
            self.line("(cancel available: type `cancel`)");
        }
    }

    fn set_move_inputs_enabled(&mut self, enabled: bool) {
        if enabled {
            self.line("your move: rock / paper / scissors");
        }
    }

    fn show_search_countdown(&mut self, remaining: u32) {
        self.line(&format!("searching... {remaining}"));
    }

    fn show_move_countdown(&mut self, remaining: u32) {
        self.line(&format!("move timer: {remaining}"));
    }

    fn hide_move_countdown(&mut self) {}

    fn notify(&mut self, level: Notice, message: &str) {
        let prefix = match level {
            Notice::Info => "i",
            Notice::Success => "+",
            Notice::Error => "!",
        };
        self.line(&format!("{prefix} {message}"));
    }

    // The typed command is already the user's explicit intent.
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }

    fn commit_final(&mut self, outcome: &FinalOutcome) {
        let text = match outcome {
            FinalOutcome::Cancelled => "game cancelled".to_string(),
            FinalOutcome::Finished { result: Some(Outcome::Player1Win) } => "player 1 wins".to_string(),
            FinalOutcome::Finished { result: Some(Outcome::Player2Win) } => "player 2 wins".to_string(),
            FinalOutcome::Finished { result: Some(Outcome::Draw) } => "draw".to_string(),
            FinalOutcome::Finished { result: None } => "game over (result pending)".to_string(),
        };
        self.line(&format!("=== {text} ==="));
        self.line("type `rematch` to play again");
    }

    fn navigate(&mut self, route: Route) {
        match route {
            Route::Lobby => self.line("back to lobby"),
            Route::Game(game_id) => self.line(&format!("entering game #{game_id}")),
        }
    }
}
