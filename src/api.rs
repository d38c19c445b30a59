//! Wire contract with the server of record.
//!
//! The server owns matchmaking, move resolution and payout; this module only
//! models the JSON surface the coordinator consumes. Any response may carry an
//! `error` string instead of its payload, which surfaces as [`ApiError::Server`].

use crate::config::Config;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use thiserror::Error;

pub type GameId = u64;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("server error: {0}")]
    Server(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Rock,
    Paper,
    Scissors,
}

impl Move {
    pub fn glyph(&self) -> &'static str {
        match self {
            Move::Rock => "✊",
            Move::Paper => "🖐️",
            Move::Scissors => "✌️",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Rock => "rock",
            Move::Paper => "paper",
            Move::Scissors => "scissors",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for Move {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rock" => Ok(Move::Rock),
            "paper" => Ok(Move::Paper),
            "scissors" => Ok(Move::Scissors),
            other => Err(format!("unknown move: {other}")),
        }
    }
}

/// Outcome from player 1's perspective, as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Player1Win,
    Player2Win,
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Betting,
    Playing,
    Finished,
    Cancelled,
}

/// One authoritative status payload. Later snapshots are treated as
/// monotonically non-decreasing in revealed information, but duplicates and
/// repeats must be tolerated by the consumer.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusSnapshot {
    pub status: GameStatus,
    #[serde(default)]
    pub game_id: Option<GameId>,
    #[serde(default)]
    pub player1_move: Option<Move>,
    #[serde(default)]
    pub player2_move: Option<Move>,
    #[serde(default)]
    pub result: Option<Outcome>,
    #[serde(default)]
    pub game_bank: Option<f64>,
    #[serde(default)]
    pub bet_amount: Option<f64>,
    #[serde(default)]
    pub is_bot_game: bool,
    #[serde(default)]
    pub bot_name: Option<String>,
    #[serde(default)]
    pub is_player1: Option<bool>,
    #[serde(default)]
    pub winner_id: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub opponent_found: bool,
    #[serde(default)]
    pub game_id: Option<GameId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BotConnectResponse {
    #[serde(default)]
    pub bot_connected: bool,
    /// A late human match can still beat the bot; the server reports it here.
    #[serde(default)]
    pub opponent_found: bool,
    #[serde(default)]
    pub game_id: Option<GameId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoveResponse {
    #[serde(default)]
    pub game_finished: bool,
    #[serde(default)]
    pub player2_move: Option<Move>,
    #[serde(default)]
    pub result: Option<Outcome>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RematchResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub game_id: Option<GameId>,
}

/// The consumed HTTP surface. One method per endpoint, one round trip each.
#[allow(async_fn_in_trait)]
pub trait GameApi {
    async fn search(&self, bet_amount: u64) -> ApiResult<SearchResponse>;
    async fn cancel_search(&self) -> ApiResult<()>;
    async fn connect_bot(&self, bet_amount: u64) -> ApiResult<BotConnectResponse>;
    async fn status(&self, game_id: GameId) -> ApiResult<StatusSnapshot>;
    async fn submit_move(&self, game_id: GameId, mv: Move) -> ApiResult<MoveResponse>;
    async fn cancel_game(&self, game_id: GameId) -> ApiResult<CancelResponse>;
    async fn rematch(&self, game_id: GameId) -> ApiResult<RematchResponse>;
}

/// reqwest-backed implementation talking to the game backend.
#[derive(Debug, Clone)]
pub struct HttpGameApi {
    http: reqwest::Client,
    base_url: String,
    csrf_token: String,
}

impl HttpGameApi {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            csrf_token: config.csrf_token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rps/api/{}", self.base_url, path)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> ApiResult<T> {
        let text = self
            .http
            .post(self.url(path))
            .header("X-CSRFToken", &self.csrf_token)
            .json(&body)
            .send()
            .await?
            .text()
            .await?;
        parse_payload(&text)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let text = self.http.get(self.url(path)).send().await?.text().await?;
        parse_payload(&text)
    }
}

/// Error responses come back with non-2xx statuses but always as JSON with an
/// `error` field, so the body is probed before the payload decode.
fn parse_payload<T: DeserializeOwned>(text: &str) -> ApiResult<T> {
    #[derive(Deserialize)]
    struct ErrorProbe {
        error: Option<String>,
    }

    if let Ok(ErrorProbe { error: Some(message) }) = serde_json::from_str::<ErrorProbe>(text) {
        return Err(ApiError::Server(message));
    }
    Ok(serde_json::from_str(text)?)
}

impl GameApi for HttpGameApi {
    async fn search(&self, bet_amount: u64) -> ApiResult<SearchResponse> {
        self.post("search/", json!({ "bet_amount": bet_amount })).await
    }

    async fn cancel_search(&self) -> ApiResult<()> {
        let _: serde_json::Value = self.post("search/cancel/", json!({})).await?;
        Ok(())
    }

    async fn connect_bot(&self, bet_amount: u64) -> ApiResult<BotConnectResponse> {
        self.post("bot/connect/", json!({ "bet_amount": bet_amount })).await
    }

    async fn status(&self, game_id: GameId) -> ApiResult<StatusSnapshot> {
        self.get(&format!("game/{game_id}/status/")).await
    }

    async fn submit_move(&self, game_id: GameId, mv: Move) -> ApiResult<MoveResponse> {
        self.post("move/", json!({ "game_id": game_id, "move": mv })).await
    }

    async fn cancel_game(&self, game_id: GameId) -> ApiResult<CancelResponse> {
        self.post("game/cancel/", json!({ "game_id": game_id })).await
    }

    async fn rematch(&self, game_id: GameId) -> ApiResult<RematchResponse> {
        self.post("rematch/", json!({ "game_id": game_id })).await
    }
}
