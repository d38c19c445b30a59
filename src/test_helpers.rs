//! Shared fixtures for unit and integration tests: a scripted API, a
//! recording view, and snapshot builders.

use crate::api::{
    ApiError, ApiResult, BotConnectResponse, CancelResponse, GameApi, GameId, GameStatus, Move,
    MoveResponse, Outcome, RematchResponse, SearchResponse, StatusSnapshot,
};
use crate::view::{FinalOutcome, GameView, Notice, Route, Seat};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub fn snapshot(status: GameStatus) -> StatusSnapshot {
    StatusSnapshot {
        status,
        game_id: None,
        player1_move: None,
        player2_move: None,
        result: None,
        game_bank: None,
        bet_amount: None,
        is_bot_game: false,
        bot_name: None,
        is_player1: None,
        winner_id: None,
    }
}

pub fn playing() -> StatusSnapshot {
    snapshot(GameStatus::Playing)
}

pub fn cancelled() -> StatusSnapshot {
    snapshot(GameStatus::Cancelled)
}

pub fn finished(
    result: Option<Outcome>,
    player1_move: Option<Move>,
    player2_move: Option<Move>,
) -> StatusSnapshot {
    StatusSnapshot {
        result,
        player1_move,
        player2_move,
        ..snapshot(GameStatus::Finished)
    }
}

/// A decode error of the kind the real client produces for a bad body.
pub fn decode_error() -> ApiError {
    ApiError::Decode(serde_json::from_str::<serde_json::Value>("not json").unwrap_err())
}

#[derive(Default)]
struct ScriptedInner {
    search: VecDeque<ApiResult<SearchResponse>>,
    bot_connect: VecDeque<ApiResult<BotConnectResponse>>,
    status: VecDeque<ApiResult<StatusSnapshot>>,
    status_fallback: Option<StatusSnapshot>,
    moves: VecDeque<ApiResult<MoveResponse>>,
    cancel_game: VecDeque<ApiResult<CancelResponse>>,
    rematch: VecDeque<ApiResult<RematchResponse>>,
    calls: Vec<String>,
}

/// Queue-driven [`GameApi`]: every call pops the next scripted response for
/// its endpoint and records itself. Status polls fall back to a repeatable
/// snapshot when the queue runs dry, which models the server reporting the
/// same state on every poll.
#[derive(Clone, Default)]
pub struct ScriptedApi {
    inner: Arc<Mutex<ScriptedInner>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_search(&self, response: ApiResult<SearchResponse>) {
        self.inner.lock().unwrap().search.push_back(response);
    }

    pub fn push_bot_connect(&self, response: ApiResult<BotConnectResponse>) {
        self.inner.lock().unwrap().bot_connect.push_back(response);
    }

    pub fn push_status(&self, response: ApiResult<StatusSnapshot>) {
        self.inner.lock().unwrap().status.push_back(response);
    }

    pub fn set_status_fallback(&self, snapshot: StatusSnapshot) {
        self.inner.lock().unwrap().status_fallback = Some(snapshot);
    }

    pub fn push_move(&self, response: ApiResult<MoveResponse>) {
        self.inner.lock().unwrap().moves.push_back(response);
    }

    pub fn push_cancel_game(&self, response: ApiResult<CancelResponse>) {
        self.inner.lock().unwrap().cancel_game.push_back(response);
    }

    pub fn push_rematch(&self, response: ApiResult<RematchResponse>) {
        self.inner.lock().unwrap().rematch.push_back(response);
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }
}

impl GameApi for ScriptedApi {
    async fn search(&self, bet_amount: u64) -> ApiResult<SearchResponse> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(format!("search({bet_amount})"));
        inner.search.pop_front().expect("no scripted search response")
    }

    async fn cancel_search(&self) -> ApiResult<()> {
        self.inner.lock().unwrap().calls.push("cancel_search".into());
        Ok(())
    }

    async fn connect_bot(&self, bet_amount: u64) -> ApiResult<BotConnectResponse> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(format!("connect_bot({bet_amount})"));
        inner
            .bot_connect
            .pop_front()
            .expect("no scripted bot connect response")
    }

    async fn status(&self, game_id: GameId) -> ApiResult<StatusSnapshot> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(format!("status({game_id})"));
        if let Some(response) = inner.status.pop_front() {
            return response;
        }
        match &inner.status_fallback {
            Some(snapshot) => Ok(snapshot.clone()),
            None => panic!("no scripted status response"),
        }
    }

    async fn submit_move(&self, game_id: GameId, mv: Move) -> ApiResult<MoveResponse> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(format!("move({game_id}, {mv})"));
        inner.moves.pop_front().expect("no scripted move response")
    }

    async fn cancel_game(&self, game_id: GameId) -> ApiResult<CancelResponse> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(format!("cancel_game({game_id})"));
        inner
            .cancel_game
            .pop_front()
            .expect("no scripted cancel response")
    }

    async fn rematch(&self, game_id: GameId) -> ApiResult<RematchResponse> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(format!("rematch({game_id})"));
        inner.rematch.pop_front().expect("no scripted rematch response")
    }
}

/// Records every call so tests can assert on idempotence and ordering.
#[derive(Debug)]
pub struct RecordingView {
    pub reveals: Vec<(Seat, Move)>,
    pub banks: Vec<f64>,
    pub opponent_names: Vec<String>,
    pub cancel_visible: Vec<bool>,
    pub inputs_enabled: Vec<bool>,
    pub search_countdowns: Vec<u32>,
    pub move_countdowns: Vec<u32>,
    pub move_countdown_hides: u32,
    pub notices: Vec<(Notice, String)>,
    pub confirms: u32,
    pub confirm_response: bool,
    pub commits: Vec<FinalOutcome>,
    pub routes: Vec<Route>,
}

impl Default for RecordingView {
    fn default() -> Self {
        Self {
            reveals: Vec::new(),
            banks: Vec::new(),
            opponent_names: Vec::new(),
            cancel_visible: Vec::new(),
            inputs_enabled: Vec::new(),
            search_countdowns: Vec::new(),
            move_countdowns: Vec::new(),
            move_countdown_hides: 0,
            notices: Vec::new(),
            confirms: 0,
            confirm_response: true,
            commits: Vec::new(),
            routes: Vec::new(),
        }
    }
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing_confirm() -> Self {
        Self {
            confirm_response: false,
            ..Self::default()
        }
    }

    pub fn notice_texts(&self) -> Vec<&str> {
        self.notices.iter().map(|(_, text)| text.as_str()).collect()
    }
}

impl GameView for RecordingView {
    fn reveal_move(&mut self, seat: Seat, mv: Move) {
        self.reveals.push((seat, mv));
    }

    fn set_bank(&mut self, bank: f64) {
        self.banks.push(bank);
    }

    fn set_opponent_name(&mut self, name: &str) {
        self.opponent_names.push(name.to_string());
    }

    fn set_cancel_visible(&mut self, visible: bool) {
        self.cancel_visible.push(visible);
    }

    fn set_move_inputs_enabled(&mut self, enabled: bool) {
        self.inputs_enabled.push(enabled);
    }

    fn show_search_countdown(&mut self, remaining: u32) {
        self.search_countdowns.push(remaining);
    }

    fn show_move_countdown(&mut self, remaining: u32) {
        self.move_countdowns.push(remaining);
    }

    fn hide_move_countdown(&mut self) {
        self.move_countdown_hides += 1;
    }

    fn notify(&mut self, level: Notice, message: &str) {
        self.notices.push((level, message.to_string()));
    }

    fn confirm(&mut self, _prompt: &str) -> bool {
        self.confirms += 1;
        self.confirm_response
    }

    fn commit_final(&mut self, outcome: &FinalOutcome) {
        self.commits.push(outcome.clone());
    }

    fn navigate(&mut self, route: Route) {
        self.routes.push(route);
    }
}
