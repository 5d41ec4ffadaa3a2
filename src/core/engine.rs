//! Engine: the single owner of resolver, phase controller and pipeline
//!
//! All state changes go through `&mut self`, so whoever owns the engine is its
//! serialized execution context (see `runtime` for the tokio one). Timers are
//! deadlines kept here; the owner calls `poll_timers` when `next_deadline`
//! passes. Clearing a deadline is cancellation.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::core::backend::{CaptureBackend, NullBackend};
use crate::core::listener::EngineListener;
use crate::core::phase::PhaseController;
use crate::core::pipeline::{Ingest, TranscriptPipeline};
use crate::core::resolver::SentenceResolver;
use crate::types::{
    Command, Config, CueState, EngineError, EngineStatus, Phase, ReasonCode, Resolution,
    TranscriptEvent,
};
use crate::MAX_RESOLVE_ROUNDS;

/// Suppresses identical log lines inside a short window
#[derive(Debug, Default)]
struct LogDedup {
    last_text: String,
    last_at: Option<Instant>,
}

impl LogDedup {
    fn admit(&mut self, text: &str, now: Instant, window: Duration) -> bool {
        let repeated = text == self.last_text
            && self.last_at.is_some_and(|at| now.saturating_duration_since(at) < window);
        if repeated {
            return false;
        }
        self.last_text = text.to_string();
        self.last_at = Some(now);
        true
    }
}

pub struct Engine<B: CaptureBackend = NullBackend> {
    config: Config,
    resolver: SentenceResolver,
    phase: PhaseController,
    pipeline: TranscriptPipeline,
    backend: B,
    listener: Box<dyn EngineListener>,
    log_dedup: LogDedup,
    /// Delayed capture restart after "no speech"
    restart_at: Option<Instant>,
    /// Next cooldown countdown refresh
    next_cue_refresh: Option<Instant>,
    last_cue: Option<CueState>,
}

impl Engine<NullBackend> {
    /// Engine without a capture backend; transcripts are pushed in
    pub fn new(config: Config, listener: impl EngineListener + 'static) -> Self {
        Self::with_backend(config, listener, NullBackend::new())
    }
}

impl<B: CaptureBackend> Engine<B> {
    pub fn with_backend(config: Config, listener: impl EngineListener + 'static, backend: B) -> Self {
        let config = config.sanitized();
        Self {
            resolver: SentenceResolver::new(),
            phase: PhaseController::new(config.cooldown()),
            pipeline: TranscriptPipeline::new(config.silence_auto_final()),
            backend,
            listener: Box::new(listener),
            log_dedup: LogDedup::default(),
            restart_at: None,
            next_cue_refresh: None,
            last_cue: None,
            config,
        }
    }

    // =========================================================================
    // Control operations
    // =========================================================================

    /// Begin a recognition session in the direction phase
    pub fn start(&mut self) -> Result<(), EngineError> {
        if let Err(err) = self.backend.check_permissions() {
            self.listener.on_error_text(&err.to_string());
            return Err(err);
        }

        let now = Instant::now();
        self.restart_at = None;
        self.next_cue_refresh = None;
        self.pipeline.restart_leg();
        self.phase.start(now);
        self.log("recognition started (direction → separator)");

        if let Err(err) = self.backend.start_leg(Phase::Direction, &self.config.locale) {
            self.listener.on_error_text(&err.to_string());
            self.phase.stop(now);
            self.emit_cue(now);
            return Err(err);
        }

        self.emit_cue(now);
        Ok(())
    }

    /// End the session; all timers cancelled
    pub fn stop(&mut self) {
        let now = Instant::now();
        self.backend.stop();
        let was_processing = self.pipeline.is_processing();
        self.pipeline.restart_leg();
        self.restart_at = None;
        self.next_cue_refresh = None;
        self.phase.stop(now);
        if was_processing {
            self.listener.on_processing(false);
        }
        self.emit_cue(now);
        self.log("recognition stopped");
    }

    /// Next optotype: direction phase, cooldown cleared
    pub fn clear_for_next_input(&mut self) {
        let now = Instant::now();
        self.phase.reset(ReasonCode::P004_NEXT_INPUT, now);
        self.pipeline.cancel_silence();
        self.next_cue_refresh = None;
        self.emit_cue(now);
    }

    /// Wrong answer: direction allowed again, stale transcript discarded
    pub fn allow_direction_again(&mut self) {
        let now = Instant::now();
        self.phase.reset(ReasonCode::P004_RETRY_DIRECTION, now);
        self.pipeline.cancel_silence();
        self.next_cue_refresh = None;
        if self.phase.is_recognizing() {
            self.restart_leg();
        }
        self.emit_cue(now);
    }

    // =========================================================================
    // Inputs from the recognizer
    // =========================================================================

    pub fn feed_transcript(&mut self, text: &str, is_final: bool) {
        self.handle_transcript(TranscriptEvent {
            text: text.to_string(),
            is_final,
        });
    }

    pub fn handle_transcript(&mut self, event: TranscriptEvent) {
        let now = Instant::now();
        let was_processing = self.pipeline.is_processing();

        match self.pipeline.ingest(&event, now) {
            Ingest::Duplicate => {
                if was_processing {
                    self.listener.on_processing(false);
                }
                self.listener.on_transcript("", false);
                if event.is_final {
                    self.log(format!("skipped duplicate final: {}", event.text.trim()));
                }
            }
            Ingest::Empty => {
                self.listener.on_transcript(&event.text, event.is_final);
            }
            Ingest::Partial(text) => {
                if !was_processing {
                    self.listener.on_processing(true);
                }
                self.listener.on_transcript(&event.text, false);
                self.log_dedup(
                    format!(
                        "recognized (partial): {} → final after {}s of silence",
                        text, self.config.silence_auto_final_secs
                    ),
                    now,
                );
            }
            Ingest::Final(text) => {
                if !was_processing {
                    self.listener.on_processing(true);
                }
                self.listener.on_transcript(&event.text, true);
                self.resolve_sentence(&text, now);
            }
        }
    }

    /// Recognizer failure; "no speech" restarts after a delay, anything else at once
    pub fn report_backend_error(&mut self, message: &str) {
        let now = Instant::now();
        let err = EngineError::from_backend_message(message);
        warn!(error = %err, "recognizer error");
        self.log(format!("recognizer error: {}", message));

        if !self.phase.is_recognizing() {
            self.stop();
            return;
        }

        if err.is_transient() {
            self.restart_at = Some(now + self.config.no_speech_restart_delay());
        } else {
            self.restart_leg();
            self.emit_cue(now);
        }
    }

    /// Phase reset + one resolved pass, no live audio or cooldown involved
    pub fn process_text_for_test(&mut self, text: &str) -> Resolution {
        let now = Instant::now();
        self.phase.reset(ReasonCode::P004_TEST_RESET, now);
        self.resolve_sentence(text.trim(), now)
    }

    // =========================================================================
    // Timers
    // =========================================================================

    /// Earliest pending deadline, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.pipeline.silence_deadline(),
            self.restart_at,
            self.next_cue_refresh,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Fire every deadline at or before `now`
    pub fn poll_timers(&mut self, now: Instant) {
        let was_processing = self.pipeline.is_processing();
        if let Some(text) = self.pipeline.take_silence_due(now) {
            if self.phase.is_recognizing() {
                self.log(format!(
                    "silence {}s, treating as final: {}",
                    self.config.silence_auto_final_secs, text
                ));
                self.resolve_sentence(&text, now);
            } else {
                self.pipeline.restart_leg();
                self.listener.on_processing(false);
            }
        } else if was_processing && !self.pipeline.is_processing() {
            self.listener.on_processing(false);
        }

        if self.restart_at.is_some_and(|at| at <= now) {
            self.restart_at = None;
            if self.phase.is_recognizing() {
                self.log("restarting capture after no speech");
                self.restart_leg();
                self.emit_cue(now);
            }
        }

        if self.next_cue_refresh.is_some_and(|at| at <= now) {
            self.refresh_cue(now);
        }
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    fn resolve_sentence(&mut self, trimmed: &str, now: Instant) -> Resolution {
        if trimmed.is_empty() {
            return Resolution::default();
        }

        if self.pipeline.begin_processing() {
            self.listener.on_processing(true);
        }
        self.log_dedup(format!("recognized (final): {}", trimmed), now);

        let suppress = self.phase.directions_suppressed(now);
        let resolution = self.resolver.resolve(trimmed, suppress);
        debug!(
            text = trimmed,
            phonetic = %resolution.phonetic,
            commands = ?resolution.commands,
            suppress,
            "sentence resolved"
        );

        for command in &resolution.commands {
            self.emit_command(*command);
        }
        if resolution.capped {
            self.log(format!(
                "stopped after {} matches, rest of sentence ignored",
                MAX_RESOLVE_ROUNDS
            ));
        }

        if let Some(answer) = resolution.direction_answer {
            self.listener.on_direction_command(answer);
            self.log(format!("sentence answer (last direction): {}", answer.display()));
        }

        if let Some(last) = resolution.last_command {
            let out = self.phase.apply_sentence(last, now);
            self.log(format!(
                "last match: {} → {} ({})",
                last.display(),
                out.to_parseable_string(),
                out.reason.description()
            ));
            if out.reason == ReasonCode::P003_COOLDOWN_OPENED {
                self.next_cue_refresh = Some(now + self.config.cue_refresh());
            }
            self.emit_cue(now);
        } else {
            self.log(format!("{}: {}", ReasonCode::P002_NO_COMMAND.description(), trimmed));
        }

        self.pipeline.commit(trimmed);
        self.listener.on_processing(false);
        resolution
    }

    fn emit_command(&mut self, command: Command) {
        if command.is_direction() {
            self.log(format!("matched direction: {}", command.display()));
        } else {
            self.log(format!(
                "matched separator: {} (unlocks next direction)",
                command.display()
            ));
        }
        self.listener.on_command(command);
    }

    fn restart_leg(&mut self) {
        let was_processing = self.pipeline.is_processing();
        self.pipeline.restart_leg();
        self.restart_at = None;
        if was_processing {
            self.listener.on_processing(false);
        }

        let phase = self.phase.phase();
        match self.backend.start_leg(phase, &self.config.locale) {
            Ok(()) => self.log(format!("capture restarted, awaiting {}", phase)),
            Err(err) => self.listener.on_error_text(&err.to_string()),
        }
    }

    // =========================================================================
    // Cue + logging
    // =========================================================================

    fn emit_cue(&mut self, now: Instant) {
        let cue = self.phase.cue_state(now);
        self.last_cue = Some(cue);
        self.listener.on_cue_state_changed(cue);
    }

    /// Periodic countdown refresh; runs only while a cooldown is active
    fn refresh_cue(&mut self, now: Instant) {
        let cue = self.phase.cue_state(now);
        if self.last_cue != Some(cue) {
            self.last_cue = Some(cue);
            self.listener.on_cue_state_changed(cue);
        }
        self.next_cue_refresh = if self.phase.directions_suppressed(now) {
            Some(now + self.config.cue_refresh())
        } else {
            None
        };
    }

    fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(target: "voicecue::log", "{}", message);
        let line = format!("[{}] {}", chrono::Local::now().format("%H:%M:%S"), message);
        self.listener.on_log(&line);
    }

    fn log_dedup(&mut self, message: String, now: Instant) {
        if self.log_dedup.admit(&message, now, self.config.log_dedup()) {
            self.log(message);
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn status(&self) -> EngineStatus {
        let now = Instant::now();
        EngineStatus {
            phase: self.phase.phase(),
            cue: self.phase.cue_state(now),
            recognizing: self.phase.is_recognizing(),
            processing: self.pipeline.is_processing(),
            last_committed: self.pipeline.last_committed().to_string(),
            last_reason: self.phase.last_reason(),
            time_in_phase_ms: self.phase.time_in_phase(now).as_millis() as u64,
            transitions: self.phase.transition_count(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase.phase()
    }

    pub fn cue_state(&self) -> CueState {
        self.phase.cue_state(Instant::now())
    }

    pub fn is_recognizing(&self) -> bool {
        self.phase.is_recognizing()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::listener::EventRecorder;
    use crate::types::EngineEvent;
    use pretty_assertions::assert_eq;

    fn engine() -> (Engine, EventRecorder) {
        let recorder = EventRecorder::new();
        (Engine::new(Config::default(), recorder.clone()), recorder)
    }

    #[test]
    fn test_offline_sentence_emits_commands_then_answer() {
        let (mut engine, rec) = engine();
        engine.process_text_for_test("上继续下");

        assert_eq!(rec.commands(), vec![Command::Up, Command::Continue, Command::Down]);
        assert_eq!(rec.direction_answers(), vec![Command::Down]);
        assert_eq!(engine.phase(), Phase::Separator);
    }

    #[test]
    fn test_answer_after_all_commands() {
        let (mut engine, rec) = engine();
        engine.process_text_for_test("左右");
        let order: Vec<_> = rec
            .events()
            .into_iter()
            .filter(|e| {
                matches!(e, EngineEvent::Command { .. } | EngineEvent::DirectionCommand { .. })
            })
            .collect();
        assert_eq!(
            order,
            vec![
                EngineEvent::Command { command: Command::Left },
                EngineEvent::Command { command: Command::Right },
                EngineEvent::DirectionCommand { command: Command::Right },
            ]
        );
    }

    #[test]
    fn test_start_and_stop_cues() {
        let (mut engine, rec) = engine();
        engine.start().unwrap();
        engine.stop();
        assert_eq!(rec.cue_states(), vec![CueState::AwaitingDirection, CueState::Idle]);
        assert_eq!(engine.backend().legs(), 1);
        assert!(!engine.backend().is_running());
    }

    #[test]
    fn test_duplicate_final_is_skipped() {
        let (mut engine, rec) = engine();
        engine.start().unwrap();
        engine.feed_transcript("上", true);
        engine.feed_transcript("上 ", true);
        assert_eq!(rec.commands(), vec![Command::Up]);
        assert_eq!(rec.direction_answers(), vec![Command::Up]);
    }

    #[test]
    fn test_partial_does_not_resolve() {
        let (mut engine, rec) = engine();
        engine.start().unwrap();
        engine.feed_transcript("上", false);
        assert!(rec.commands().is_empty());
        assert_eq!(rec.processing(), vec![true]);
        assert!(engine.next_deadline().is_some());
    }

    #[test]
    fn test_silence_promotes_partial() {
        let (mut engine, rec) = engine();
        engine.start().unwrap();
        engine.feed_transcript("左", false);
        engine.poll_timers(Instant::now() + Duration::from_secs(2));
        assert_eq!(rec.direction_answers(), vec![Command::Left]);
        assert_eq!(rec.processing(), vec![true, false]);
        assert_eq!(engine.phase(), Phase::Separator);
    }

    #[test]
    fn test_clear_cancels_silence() {
        let (mut engine, rec) = engine();
        engine.start().unwrap();
        engine.feed_transcript("左", false);
        engine.clear_for_next_input();
        engine.poll_timers(Instant::now() + Duration::from_secs(5));
        assert!(rec.commands().is_empty());
        assert_eq!(engine.next_deadline(), None);
    }

    #[test]
    fn test_cooldown_suppresses_directions_live() {
        let (mut engine, rec) = engine();
        engine.start().unwrap();
        engine.feed_transcript("上继续", true);
        engine.feed_transcript("下", true);
        assert_eq!(rec.commands(), vec![Command::Up, Command::Continue]);
        assert!(matches!(engine.cue_state(), CueState::Cooldown { .. }));
    }

    #[test]
    fn test_allow_direction_again_restarts_leg() {
        let (mut engine, rec) = engine();
        engine.start().unwrap();
        engine.feed_transcript("上继续", true);
        engine.allow_direction_again();
        engine.feed_transcript("下", true);

        assert_eq!(engine.backend().legs(), 2);
        assert_eq!(rec.direction_answers(), vec![Command::Up, Command::Down]);
    }

    #[test]
    fn test_no_speech_restarts_after_delay() {
        let (mut engine, rec) = engine();
        engine.start().unwrap();
        engine.report_backend_error("No speech detected");
        assert_eq!(engine.backend().legs(), 1);
        assert!(rec.errors().is_empty());

        engine.poll_timers(Instant::now() + Duration::from_millis(1100));
        assert_eq!(engine.backend().legs(), 2);
    }

    #[test]
    fn test_fatal_error_restarts_now() {
        let (mut engine, rec) = engine();
        engine.start().unwrap();
        engine.report_backend_error("audio route changed");
        assert_eq!(engine.backend().legs(), 2);
        assert!(rec.errors().is_empty());
        assert!(rec.logs().iter().any(|l| l.contains("audio route changed")));
    }

    #[test]
    fn test_error_while_stopped_stays_stopped() {
        let (mut engine, _rec) = engine();
        engine.report_backend_error("audio route changed");
        assert!(!engine.is_recognizing());
        assert_eq!(engine.backend().legs(), 0);
    }

    #[test]
    fn test_log_lines_are_timestamped() {
        let (mut engine, rec) = engine();
        engine.process_text_for_test("右");
        let logs = rec.logs();
        assert!(!logs.is_empty());
        assert!(logs.iter().all(|l| l.starts_with('[') && l.as_bytes()[9] == b']'));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_partial_logged_once_per_window() {
        let (mut engine, rec) = engine();
        engine.start().unwrap();
        let partial_logs = |rec: &EventRecorder| {
            rec.logs()
                .iter()
                .filter(|l| l.contains("recognized (partial): 上"))
                .count()
        };

        engine.feed_transcript("上", false);
        engine.feed_transcript("上", false);
        assert_eq!(partial_logs(&rec), 1);

        tokio::time::advance(Duration::from_millis(900)).await;
        engine.feed_transcript("上", false);
        assert_eq!(partial_logs(&rec), 2);
    }

    #[test]
    fn test_phase_change_logged_and_counted() {
        let (mut engine, rec) = engine();
        engine.process_text_for_test("左");
        engine.process_text_for_test("继续");

        let logs = rec.logs();
        assert!(logs.iter().any(|l| l.contains("phase=SEPARATOR | cue=IDLE")));
        assert!(logs.iter().any(|l| l.contains("reason=P002_SEPARATOR_HEARD")));
        assert_eq!(engine.status().transitions, 2);
    }

    struct DeniedBackend;

    impl CaptureBackend for DeniedBackend {
        fn check_permissions(&mut self) -> Result<(), EngineError> {
            Err(EngineError::PermissionDenied)
        }

        fn start_leg(&mut self, _phase: Phase, _locale: &str) -> Result<(), EngineError> {
            Ok(())
        }

        fn stop(&mut self) {}
    }

    #[test]
    fn test_permission_denied_surfaces_error() {
        let rec = EventRecorder::new();
        let mut engine = Engine::with_backend(Config::default(), rec.clone(), DeniedBackend);
        assert!(matches!(engine.start(), Err(EngineError::PermissionDenied)));
        assert_eq!(rec.errors().len(), 1);
        assert!(!engine.is_recognizing());
    }
}
