//! Transcript pipeline: dedup and silence auto-finalization
//!
//! Some recognizer backends never emit an explicit final result. Every
//! non-duplicate update re-arms a one-shot silence deadline; when it passes
//! with no newer update, the last seen text is promoted to a final pass.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::types::TranscriptEvent;

/// What the engine should do with one transcript update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ingest {
    /// Same text as the last committed sentence; not resolved again
    Duplicate,
    /// Blank update
    Empty,
    /// Partial text; wait for more or for silence
    Partial(String),
    /// Final text, ready to resolve
    Final(String),
}

#[derive(Debug)]
pub struct TranscriptPipeline {
    /// Trimmed text of the last resolved sentence
    last_committed: String,
    /// Latest text seen in this capture leg
    last_seen: Option<String>,
    silence_deadline: Option<Instant>,
    silence_after: Duration,
    /// A non-duplicate transcript awaits resolution
    processing: bool,
}

impl TranscriptPipeline {
    pub fn new(silence_after: Duration) -> Self {
        Self {
            last_committed: String::new(),
            last_seen: None,
            silence_deadline: None,
            silence_after,
            processing: false,
        }
    }

    /// Classify an update and re-arm the silence deadline
    pub fn ingest(&mut self, event: &TranscriptEvent, now: Instant) -> Ingest {
        let trimmed = event.text.trim();
        let duplicate = !trimmed.is_empty() && trimmed == self.last_committed;

        self.last_seen = Some(trimmed.to_string());

        if duplicate {
            debug!(text = trimmed, "duplicate transcript skipped");
            self.processing = false;
            return Ingest::Duplicate;
        }

        self.silence_deadline = Some(now + self.silence_after);

        if trimmed.is_empty() {
            return Ingest::Empty;
        }

        self.processing = true;
        if event.is_final {
            Ingest::Final(trimmed.to_string())
        } else {
            Ingest::Partial(trimmed.to_string())
        }
    }

    /// Text to promote if the silence deadline has passed.
    ///
    /// Consumes the deadline; a cancelled deadline never fires.
    pub fn take_silence_due(&mut self, now: Instant) -> Option<String> {
        match self.silence_deadline {
            Some(deadline) if deadline <= now => {}
            _ => return None,
        }
        self.silence_deadline = None;

        let text = self.last_seen.take()?;
        if text.is_empty() || text == self.last_committed {
            self.processing = false;
            return None;
        }
        Some(text)
    }

    /// Mark a resolution pass as started; true if the indicator changed
    pub fn begin_processing(&mut self) -> bool {
        !std::mem::replace(&mut self.processing, true)
    }

    /// Record a finished resolution pass
    pub fn commit(&mut self, trimmed: &str) {
        self.last_committed = trimmed.to_string();
        self.processing = false;
        self.cancel_silence();
    }

    /// Drop the silence deadline and the pending text
    pub fn cancel_silence(&mut self) {
        self.silence_deadline = None;
        self.last_seen = None;
    }

    /// New capture leg: nothing from the previous leg carries over
    pub fn restart_leg(&mut self) {
        self.cancel_silence();
        self.processing = false;
    }

    pub fn silence_deadline(&self) -> Option<Instant> {
        self.silence_deadline
    }

    pub fn last_committed(&self) -> &str {
        &self.last_committed
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> TranscriptPipeline {
        TranscriptPipeline::new(Duration::from_millis(1200))
    }

    #[test]
    fn test_final_and_partial() {
        let mut p = pipeline();
        let now = Instant::now();
        assert_eq!(p.ingest(&TranscriptEvent::partial(" 上 "), now), Ingest::Partial("上".into()));
        assert!(p.is_processing());
        assert_eq!(p.ingest(&TranscriptEvent::final_text("上"), now), Ingest::Final("上".into()));
    }

    #[test]
    fn test_duplicate_after_commit() {
        let mut p = pipeline();
        let now = Instant::now();
        p.ingest(&TranscriptEvent::final_text("上"), now);
        p.commit("上");

        assert_eq!(p.ingest(&TranscriptEvent::final_text(" 上"), now), Ingest::Duplicate);
        assert!(!p.is_processing());
        assert_eq!(p.silence_deadline(), None);
    }

    #[test]
    fn test_silence_promotes_last_partial() {
        let mut p = pipeline();
        let now = Instant::now();
        p.ingest(&TranscriptEvent::partial("上"), now);
        p.ingest(&TranscriptEvent::partial("上继续"), now + Duration::from_millis(500));

        assert_eq!(p.take_silence_due(now + Duration::from_millis(1200)), None);
        assert_eq!(
            p.take_silence_due(now + Duration::from_millis(1700)),
            Some("上继续".to_string())
        );
        // one-shot
        assert_eq!(p.take_silence_due(now + Duration::from_secs(5)), None);
    }

    #[test]
    fn test_cancelled_silence_never_fires() {
        let mut p = pipeline();
        let now = Instant::now();
        p.ingest(&TranscriptEvent::partial("左"), now);
        p.cancel_silence();
        assert_eq!(p.take_silence_due(now + Duration::from_secs(10)), None);
    }

    #[test]
    fn test_empty_update_rearms_without_text() {
        let mut p = pipeline();
        let now = Instant::now();
        assert_eq!(p.ingest(&TranscriptEvent::partial("  "), now), Ingest::Empty);
        assert!(p.silence_deadline().is_some());
        assert_eq!(p.take_silence_due(now + Duration::from_secs(2)), None);
    }
}
