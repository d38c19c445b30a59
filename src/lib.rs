//! Client-side coordinator for the RPS table: keeps one two-player game with
//! a bank stake synchronized with the server of record over repeated polling.

pub mod api;
pub mod clock;
pub mod config;
pub mod countdown;
pub mod session;
pub mod test_helpers;
pub mod view;

pub use api::{
    ApiError, ApiResult, GameApi, GameId, GameStatus, HttpGameApi, Move, Outcome, StatusSnapshot,
};
pub use clock::PollClock;
pub use config::Config;
pub use countdown::{Countdown, CountdownStep};
pub use session::{finalize_ready, Coordinator, Event, Phase, Session, UserAction};
pub use view::{ConsoleView, FinalOutcome, GameView, Notice, Route, Seat};
