//! Sentence resolver: every command in one transcript, in spoken order
//!
//! The matcher runs against the remainder of the phonetic string with each
//! matched span cut out, until nothing matches or the round cap is hit.
//! The last direction is the sentence's answer (self-corrections override
//! earlier words); the last command of any kind drives the phase.

use tracing::warn;

use crate::core::matcher::TokenMatcher;
use crate::core::phonetic::to_phonetic;
use crate::types::Resolution;
use crate::MAX_RESOLVE_ROUNDS;

#[derive(Debug, Clone)]
pub struct SentenceResolver {
    matcher: TokenMatcher,
    max_rounds: usize,
}

impl Default for SentenceResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceResolver {
    pub fn new() -> Self {
        Self::with_max_rounds(MAX_RESOLVE_ROUNDS)
    }

    pub fn with_max_rounds(max_rounds: usize) -> Self {
        Self {
            matcher: TokenMatcher::new(),
            max_rounds,
        }
    }

    /// Resolve raw transcript text
    pub fn resolve(&self, text: &str, suppress_directions: bool) -> Resolution {
        self.resolve_phonetic(to_phonetic(text), suppress_directions)
    }

    /// Resolve an already-normalized phonetic string
    pub fn resolve_phonetic(&self, phonetic: String, suppress_directions: bool) -> Resolution {
        let mut resolution = Resolution::default();
        let mut remaining = phonetic.clone();

        while resolution.rounds < self.max_rounds {
            let Some(m) = self.matcher.find(&remaining, suppress_directions) else {
                break;
            };
            resolution.rounds += 1;

            resolution.commands.push(m.command);
            resolution.last_command = Some(m.command);
            if m.command.is_direction() {
                resolution.direction_answer = Some(m.command);
            }

            // Spans come from str::find on whole markers: always char boundaries
            remaining = format!("{}{}", &remaining[..m.start], &remaining[m.end..]);
            if remaining.is_empty() {
                break;
            }
        }

        if resolution.rounds >= self.max_rounds
            && self.matcher.find(&remaining, suppress_directions).is_some()
        {
            warn!(rounds = resolution.rounds, remaining = %remaining, "resolve round cap reached");
            resolution.capped = true;
        }

        resolution.phonetic = phonetic;
        resolution
    }
}

// =============================================================================
// TESTS
// =============================================================================
