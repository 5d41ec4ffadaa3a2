//! Reason codes for phase changes

use serde::{Deserialize, Serialize};

/// Why the phase controller is where it is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // P001: Lifecycle
    // =========================================================================
    /// Recognition started, first direction allowed at once
    P001_STARTED,
    /// Recognition stopped
    P001_STOPPED,

    // =========================================================================
    // P002: Sentence outcomes
    // =========================================================================
    /// Sentence ended on a direction, separator required next
    P002_DIRECTION_ANSWERED,
    /// Sentence ended on a separator, directions unlocked
    P002_SEPARATOR_HEARD,
    /// Sentence contained no command
    P002_NO_COMMAND,

    // =========================================================================
    // P003: Cooldown
    // =========================================================================
    /// Cooldown window opened after separator
    P003_COOLDOWN_OPENED,

    // =========================================================================
    // P004: External resets
    // =========================================================================
    /// Next optotype shown
    P004_NEXT_INPUT,
    /// Wrong answer, direction may be spoken again
    P004_RETRY_DIRECTION,
    /// Offline test pass
    P004_TEST_RESET,
}

impl ReasonCode {
    /// Code string for logging
    pub fn code(&self) -> &'static str {
        match self {
            Self::P001_STARTED => "P001_STARTED",
            Self::P001_STOPPED => "P001_STOPPED",
            Self::P002_DIRECTION_ANSWERED => "P002_DIRECTION_ANSWERED",
            Self::P002_SEPARATOR_HEARD => "P002_SEPARATOR_HEARD",
            Self::P002_NO_COMMAND => "P002_NO_COMMAND",
            Self::P003_COOLDOWN_OPENED => "P003_COOLDOWN_OPENED",
            Self::P004_NEXT_INPUT => "P004_NEXT_INPUT",
            Self::P004_RETRY_DIRECTION => "P004_RETRY_DIRECTION",
            Self::P004_TEST_RESET => "P004_TEST_RESET",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::P001_STARTED => "Recognition started",
            Self::P001_STOPPED => "Recognition stopped",
            Self::P002_DIRECTION_ANSWERED => "Direction answered, say 继续 next",
            Self::P002_SEPARATOR_HEARD => "Separator heard, awaiting direction",
            Self::P002_NO_COMMAND => "No command in sentence",
            Self::P003_COOLDOWN_OPENED => "Directions ignored during cooldown",
            Self::P004_NEXT_INPUT => "Cleared for next input",
            Self::P004_RETRY_DIRECTION => "Direction allowed again",
            Self::P004_TEST_RESET => "Reset for offline pass",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
