//! Matcher and resolver results

use serde::{Deserialize, Serialize};

use crate::types::Command;

/// A marker occurrence in a normalized phonetic string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMatch {
    pub command: Command,
    /// Byte offset of the first marker char
    pub start: usize,
    /// Byte offset one past the last marker char
    pub end: usize,
}

impl TokenMatch {
    pub(crate) fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Everything one sentence resolved to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Normalized phonetic form of the sentence
    pub phonetic: String,
    /// Matched commands, left to right
    pub commands: Vec<Command>,
    /// Last direction in the sentence: the user's final spoken choice
    pub direction_answer: Option<Command>,
    /// Last command of any kind; drives the phase transition
    pub last_command: Option<Command>,
    /// Match rounds used
    pub rounds: usize,
    /// Round cap reached before the text was exhausted
    pub capped: bool,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
