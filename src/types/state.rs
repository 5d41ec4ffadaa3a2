//! Externally observable cue state

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Summary of phase + cooldown for the UI. Recomputed, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CueState {
    /// Engine stopped
    Idle,
    /// Separator heard, directions ignored for `remaining`
    Cooldown {
        #[serde(with = "secs_f64")]
        remaining: Duration,
    },
    AwaitingDirection,
    AwaitingSeparator,
}

impl CueState {
    /// ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            CueState::Idle => "\x1b[90m",              // Gray
            CueState::Cooldown { .. } => "\x1b[33m",   // Yellow
            CueState::AwaitingDirection => "\x1b[32m", // Green
            CueState::AwaitingSeparator => "\x1b[36m", // Cyan
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            CueState::Idle => "⏸",
            CueState::Cooldown { .. } => "⏳",
            CueState::AwaitingDirection => "🎯",
            CueState::AwaitingSeparator => "⏭",
        }
    }
}

impl std::fmt::Display for CueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CueState::Idle => write!(f, "IDLE"),
            CueState::Cooldown { remaining } => {
                write!(f, "COOLDOWN({:.1}s)", remaining.as_secs_f64())
            }
            CueState::AwaitingDirection => write!(f, "AWAITING_DIRECTION"),
            CueState::AwaitingSeparator => write!(f, "AWAITING_SEPARATOR"),
        }
    }
}

mod secs_f64 {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}
