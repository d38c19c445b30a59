//! Runtime configuration. Defaults carry the production timings; tests and
//! local setups override the pieces they need.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    /// Anti-forgery token sent with every mutating request. Sourcing it from
    /// the cookie jar is the embedding page's job.
    pub csrf_token: String,
    /// General status poll period while a session is active.
    pub status_poll: Duration,
    /// Finalize guard poll period, faster than the general poll.
    pub finalize_poll: Duration,
    /// Granularity of both countdowns.
    pub countdown_tick: Duration,
    pub search_start: u32,
    pub move_start: u32,
    pub move_extension: u32,
    /// Finalize guard attempt ceiling before surfacing a delayed result.
    pub finalize_ceiling: u32,
    /// How long a success notice stays visible before navigating away.
    pub exit_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            csrf_token: String::new(),
            status_poll: Duration::from_millis(1200),
            finalize_poll: Duration::from_millis(900),
            countdown_tick: Duration::from_secs(1),
            search_start: 5,
            move_start: 8,
            move_extension: 7,
            finalize_ceiling: 12,
            exit_delay: Duration::from_millis(1500),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("RPS_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(token) = std::env::var("RPS_CSRF_TOKEN") {
            config.csrf_token = token;
        }
        config
    }

    /// Immediate timers and no exit delay, for tests that drive ticks by hand.
    pub fn for_tests() -> Self {
        Self {
            status_poll: Duration::from_millis(5),
            finalize_poll: Duration::from_millis(5),
            countdown_tick: Duration::from_millis(5),
            exit_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
