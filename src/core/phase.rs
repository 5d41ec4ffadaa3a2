//! Phase controller: two-phase turn-taking with separator cooldown
//!
//! Transitions (only at the end of a resolved sentence):
//! - sentence ends on a direction → SEPARATOR
//! - sentence ends on a separator → DIRECTION, cooldown opens while recognizing
//! - start / clear / retry / stop → DIRECTION, cooldown cleared

use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

use crate::types::{Command, CueState, Phase, PhaseOutput, ReasonCode};

#[derive(Debug)]
pub struct PhaseController {
    /// Awaited command kind
    phase: Phase,
    /// Live session running; false disables cooldown enforcement
    recognizing: bool,
    /// Directions ignored before this instant
    cooldown_until: Option<Instant>,
    cooldown: Duration,
    /// When the current phase began
    phase_since: Instant,
    last_reason: ReasonCode,
    transition_count: u64,
}

impl PhaseController {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            phase: Phase::Direction,
            recognizing: false,
            cooldown_until: None,
            cooldown,
            phase_since: Instant::now(),
            last_reason: ReasonCode::P001_STOPPED,
            transition_count: 0,
        }
    }

    /// Session start: first direction allowed at once
    pub fn start(&mut self, now: Instant) -> PhaseOutput {
        self.recognizing = true;
        self.cooldown_until = None;
        self.enter(Phase::Direction, ReasonCode::P001_STARTED, now)
    }

    /// Session end; reported as Idle
    pub fn stop(&mut self, now: Instant) -> PhaseOutput {
        self.recognizing = false;
        self.cooldown_until = None;
        self.enter(Phase::Direction, ReasonCode::P001_STOPPED, now)
    }

    /// External reset to the direction phase, cooldown cleared
    pub fn reset(&mut self, reason: ReasonCode, now: Instant) -> PhaseOutput {
        self.cooldown_until = None;
        self.enter(Phase::Direction, reason, now)
    }

    /// Apply the last command of a resolved sentence
    pub fn apply_sentence(&mut self, last: Command, now: Instant) -> PhaseOutput {
        let next = Phase::after(last);
        if next == Phase::Separator {
            return self.enter(next, ReasonCode::P002_DIRECTION_ANSWERED, now);
        }

        let reason = if self.recognizing && !self.cooldown.is_zero() {
            self.cooldown_until = Some(now + self.cooldown);
            ReasonCode::P003_COOLDOWN_OPENED
        } else {
            ReasonCode::P002_SEPARATOR_HEARD
        };
        self.enter(next, reason, now)
    }

    fn enter(&mut self, phase: Phase, reason: ReasonCode, now: Instant) -> PhaseOutput {
        if phase != self.phase {
            info!(from = %self.phase, to = %phase, reason = reason.code(), "phase transition");
            self.phase = phase;
            self.phase_since = now;
            self.transition_count += 1;
        }
        self.last_reason = reason;
        PhaseOutput::new(self.phase, self.cue_state(now), reason)
    }

    /// True while a cooldown suppresses direction matches (live mode only)
    pub fn directions_suppressed(&self, now: Instant) -> bool {
        self.recognizing && self.cooldown_until.is_some_and(|until| now < until)
    }

    /// Cooldown time left, zero when none
    pub fn cooldown_remaining(&self, now: Instant) -> Duration {
        self.cooldown_until
            .map(|until| until.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    /// Recomputed summary for the UI
    pub fn cue_state(&self, now: Instant) -> CueState {
        if !self.recognizing {
            return CueState::Idle;
        }
        if self.phase == Phase::Direction && self.directions_suppressed(now) {
            return CueState::Cooldown {
                remaining: self.cooldown_remaining(now),
            };
        }
        match self.phase {
            Phase::Direction => CueState::AwaitingDirection,
            Phase::Separator => CueState::AwaitingSeparator,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_recognizing(&self) -> bool {
        self.recognizing
    }

    pub fn last_reason(&self) -> ReasonCode {
        self.last_reason
    }

    /// Time spent in the current phase
    pub fn time_in_phase(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.phase_since)
    }

    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }
}

// =============================================================================
// TESTS
// =============================================================================
