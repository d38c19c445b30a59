//! Cancellable fixed-period tick source behind every poller and countdown.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Repeating-task primitive: spawns a task that invokes a callback once per
/// period until stopped or replaced.
///
/// `stop` is idempotent and safe from any callback context, including a tick
/// of this clock itself. Dropping the clock cancels the task.
#[derive(Debug, Default)]
pub struct PollClock {
    handle: Option<JoinHandle<()>>,
}

impl PollClock {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Starts ticking. A clock that is already running is cancelled first
    /// (restart semantics). Callers that need a no-op restart check
    /// `is_running` before calling.
    pub fn start<F>(&mut self, period: Duration, mut on_tick: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.stop();
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval yields immediately; the first real tick is one period out
            ticker.tick().await;
            loop {
                ticker.tick().await;
                on_tick();
            }
        });
        self.handle = Some(handle);
    }

    /// Cancels the tick task. No-op if the clock is not running.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for PollClock {
    fn drop(&mut self) {
        self.stop();
    }
}
