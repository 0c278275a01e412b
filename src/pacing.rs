//! Pacing controller — the single chokepoint for every simulated user action.
//!
//! Every click, keystroke batch, navigation, and attempt start passes through
//! [`PacingController::gate`] before touching the page. The controller owns
//! three things: a randomized inter-action delay bound to a named profile, a
//! rolling session-window action budget, and a daily application budget.
//! Exhausting a budget returns `Throttled` without sleeping; an externally
//! observed restriction signal latches the controller into `Blocked`, which
//! is fatal for the whole session.
//!
//! Delay sampling is plain configuration-driven randomness, deterministic
//! under an injected seed — no behavioral learning.

use crate::config::EngineConfig;
use chrono::{Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Vocabulary on a page that signals the automating agent has been blocked.
pub const BLOCK_MARKERS: &[&str] = &[
    "unusual activity",
    "access denied",
    "temporarily restricted",
    "too many requests",
    "verify you are human",
    "captcha",
];

/// Kind of gated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Starting a new application attempt. Draws from the daily application
    /// budget instead of the window action budget.
    StartAttempt,
    Click,
    Type,
    Navigate,
    Submit,
}

/// Outcome of a gate consultation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateResult {
    /// Act now; the sampled delay has already been slept.
    Proceed,
    /// Budget exhausted. The caller must not act and should end the session.
    Throttled,
    /// Restriction signal observed. Fatal for the whole session.
    Blocked,
}

/// Named delay profile.
#[derive(Debug, Clone, Copy)]
pub struct PacingProfile {
    pub name: &'static str,
    /// Inter-action delay range in milliseconds.
    pub action_delay_ms: (u64, u64),
    /// Per-keystroke delay range in milliseconds.
    pub keystroke_delay_ms: (u64, u64),
    /// Submitted applications between long breaks.
    pub break_interval: u32,
    /// Long-break duration range in seconds.
    pub break_secs: (u64, u64),
}

impl PacingProfile {
    pub const CONSERVATIVE: Self = Self {
        name: "conservative",
        action_delay_ms: (3_000, 8_000),
        keystroke_delay_ms: (80, 200),
        break_interval: 10,
        break_secs: (45, 120),
    };

    pub const MODERATE: Self = Self {
        name: "moderate",
        action_delay_ms: (1_500, 4_000),
        keystroke_delay_ms: (50, 150),
        break_interval: 15,
        break_secs: (30, 90),
    };

    pub const AGGRESSIVE: Self = Self {
        name: "aggressive",
        action_delay_ms: (500, 1_500),
        keystroke_delay_ms: (30, 80),
        break_interval: 25,
        break_secs: (15, 45),
    };

    /// Look up a profile by name; unknown names fall back to moderate.
    pub fn from_name(name: &str) -> Self {
        match name {
            "conservative" => Self::CONSERVATIVE,
            "aggressive" => Self::AGGRESSIVE,
            "moderate" => Self::MODERATE,
            other => {
                tracing::warn!("unknown pacing profile {other:?}, using moderate");
                Self::MODERATE
            }
        }
    }
}

/// Remaining budgets, visible to callers for reporting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    pub actions_remaining: u32,
    pub applications_remaining: u32,
}

struct PacingState {
    actions_remaining: u32,
    applications_remaining: u32,
    window_started: Instant,
    day: NaiveDate,
    submitted_since_break: u32,
    blocked: bool,
    rng: StdRng,
}

/// Process-wide pacing state. All budget mutation happens behind one lock so
/// decrement stays atomic if attempts ever run from more than one task.
pub struct PacingController {
    profile: PacingProfile,
    actions_per_window: u32,
    applications_per_day: u32,
    window: Duration,
    state: Mutex<PacingState>,
}

impl PacingController {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_seed(config, rand::random())
    }

    /// Construct with a fixed RNG seed for deterministic tests.
    pub fn with_seed(config: &EngineConfig, seed: u64) -> Self {
        let profile = PacingProfile::from_name(&config.pacing_profile);
        Self {
            profile,
            actions_per_window: config.actions_per_window,
            applications_per_day: config.max_applications_per_session,
            window: Duration::from_secs(u64::from(config.session_window_minutes) * 60),
            state: Mutex::new(PacingState {
                actions_remaining: config.actions_per_window,
                applications_remaining: config.max_applications_per_session,
                window_started: Instant::now(),
                day: Local::now().date_naive(),
                submitted_since_break: 0,
                blocked: false,
                rng: StdRng::seed_from_u64(seed),
            }),
        }
    }

    pub fn profile(&self) -> &PacingProfile {
        &self.profile
    }

    /// Consult the gate before an externally observable action.
    ///
    /// `Proceed` is returned only after sleeping the sampled delay (plus a
    /// long break when one is due). `Throttled` and `Blocked` return
    /// immediately without sleeping.
    pub async fn gate(&self, kind: ActionKind) -> GateResult {
        let delay = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.blocked {
                return GateResult::Blocked;
            }
            self.roll_over(&mut state);

            match kind {
                ActionKind::StartAttempt => {
                    if state.applications_remaining == 0 {
                        return GateResult::Throttled;
                    }
                    state.applications_remaining -= 1;
                }
                _ => {
                    if state.actions_remaining == 0 {
                        return GateResult::Throttled;
                    }
                    state.actions_remaining -= 1;
                }
            }

            let (lo, hi) = self.profile.action_delay_ms;
            let mut delay = Duration::from_millis(state.rng.gen_range(lo..=hi));

            // A long break is due every `break_interval` submissions; it is
            // folded into the next attempt start.
            if kind == ActionKind::StartAttempt
                && state.submitted_since_break >= self.profile.break_interval
            {
                let (blo, bhi) = self.profile.break_secs;
                let break_secs = state.rng.gen_range(blo..=bhi);
                tracing::info!(break_secs, "taking a long pacing break");
                delay += Duration::from_secs(break_secs);
                state.submitted_since_break = 0;
            }
            delay
        };

        tokio::time::sleep(delay).await;
        GateResult::Proceed
    }

    /// Sample per-keystroke delays for typing `len` characters. Independent
    /// of the action gate; the driver sleeps these between keystrokes.
    pub fn typing_delays(&self, len: usize) -> Vec<Duration> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let (lo, hi) = self.profile.keystroke_delay_ms;
        (0..len)
            .map(|_| Duration::from_millis(state.rng.gen_range(lo..=hi)))
            .collect()
    }

    /// Record an externally observed restriction signal. Latches: every
    /// subsequent gate call returns `Blocked`.
    pub fn note_block(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.blocked = true;
    }

    pub fn is_blocked(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .blocked
    }

    /// Record a completed submission, for break scheduling.
    pub fn note_submitted(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.submitted_since_break += 1;
    }

    /// Explicitly start a fresh session: both budgets reset, block latch
    /// cleared.
    pub fn new_session(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.actions_remaining = self.actions_per_window;
        state.applications_remaining = self.applications_per_day;
        state.window_started = Instant::now();
        state.day = Local::now().date_naive();
        state.submitted_since_break = 0;
        state.blocked = false;
    }

    pub fn budget(&self) -> BudgetSnapshot {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        BudgetSnapshot {
            actions_remaining: state.actions_remaining,
            applications_remaining: state.applications_remaining,
        }
    }

    /// Rolling-window and calendar-day resets.
    fn roll_over(&self, state: &mut PacingState) {
        if state.window_started.elapsed() >= self.window {
            state.actions_remaining = self.actions_per_window;
            state.window_started = Instant::now();
        }
        let today = Local::now().date_naive();
        if today != state.day {
            state.applications_remaining = self.applications_per_day;
            state.day = today;
        }
    }
}

/// Whether page text carries a restriction signal.
pub fn has_block_signal(page_text: &str) -> bool {
    BLOCK_MARKERS.iter().any(|m| page_text.contains(m))
}
