//! voicecue: voice command interpretation engine
//!
//! Transcript events in → ordered commands out:
//! TranscriptPipeline → SentenceResolver (TokenMatcher + phonetic) → PhaseController

pub mod core;
pub mod types;

// =============================================================================
// TIMING DEFAULTS
// =============================================================================

/// After a separator, direction matches are ignored for this long
pub const DEFAULT_COOLDOWN_SECS: f64 = 0.8;

/// Silence after the last partial before it is promoted to a final pass.
/// Recognizers with slow partial updates may need >= 2s to avoid early triggers.
pub const DEFAULT_SILENCE_AUTO_FINAL_SECS: f64 = 1.2;

/// Identical log lines within this window are dropped
pub const DEFAULT_LOG_DEDUP_SECS: f64 = 0.8;

/// Short-phrase limit for immediate direction matching
pub const DEFAULT_MAX_IMMEDIATE_CHARS_FOR_DIRECTION: usize = 6;

/// Delay before restarting capture after "no speech detected".
/// Restarting at once loops forever on some backends.
pub const DEFAULT_NO_SPEECH_RESTART_DELAY_SECS: f64 = 1.0;

/// Cue refresh period while recognizing (cooldown countdown display)
pub const DEFAULT_CUE_REFRESH_MS: u64 = 200;

/// Default recognizer locale
pub const DEFAULT_LOCALE: &str = "zh-CN";

// =============================================================================
// RESOLVER LIMITS
// =============================================================================

/// Upper bound on match rounds for one sentence
pub const MAX_RESOLVE_ROUNDS: usize = 30;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
