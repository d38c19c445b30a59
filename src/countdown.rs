//! Decrementing countdowns for opponent search and move deadlines.

/// What the owner should do after one second elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// Still counting; `remaining` is the new display value.
    Running { remaining: u32 },
    /// The one-shot extension kicked in with a fresh allotment.
    Extended { remaining: u32 },
    /// Reached zero with no extension left; the countdown stopped itself.
    Expired,
}

/// A decrementing integer with a terminal action at zero and an optional
/// one-shot extension. The search and move countdowns share this design;
/// they differ only in initial value and whether an extension exists.
#[derive(Debug, Clone)]
pub struct Countdown {
    initial: u32,
    extension: Option<u32>,
    remaining: u32,
    extension_used: bool,
    running: bool,
}

impl Countdown {
    pub fn new(initial: u32) -> Self {
        Self {
            initial,
            extension: None,
            remaining: initial,
            extension_used: false,
            running: false,
        }
    }

    pub fn with_extension(initial: u32, extension: u32) -> Self {
        Self {
            extension: Some(extension),
            ..Self::new(initial)
        }
    }

    /// Arms the countdown at its initial value, with the extension available
    /// again. No-op while already running, so overlapping start requests
    /// cannot desynchronize the displayed value from elapsed time.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.remaining = self.initial;
        self.extension_used = false;
        self.running = true;
        true
    }

    /// No-op if already stopped.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Advances one second. A tick on a stopped countdown reports `Expired`
    /// without side effects; late clock ticks are harmless.
    pub fn tick(&mut self) -> CountdownStep {
        if !self.running {
            return CountdownStep::Expired;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return CountdownStep::Running {
                remaining: self.remaining,
            };
        }
        match self.extension {
            Some(extra) if !self.extension_used => {
                self.extension_used = true;
                self.remaining = extra;
                CountdownStep::Extended { remaining: extra }
            }
            _ => {
                self.running = false;
                CountdownStep::Expired
            }
        }
    }
}
