//! Transcript input and engine output events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Command, CueState};

/// One update from the external recognizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEvent {
    pub text: String,
    #[serde(default)]
    pub is_final: bool,
}

impl TranscriptEvent {
    pub fn partial(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_final: false }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_final: true }
    }
}

/// Everything the engine publishes, one variant per listener callback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    Command { command: Command },
    DirectionCommand { command: Command },
    CueStateChanged { cue: CueState },
    Processing { active: bool },
    Transcript { text: String, is_final: bool },
    Log { line: String },
    ErrorText { message: String },
}

/// Engine event with wall-clock timestamp, for streaming and CLI output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StampedEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: EngineEvent,
}

impl StampedEvent {
    pub fn new(event: EngineEvent) -> Self {
        Self { timestamp: Utc::now(), event }
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let reset = CueState::color_reset();
        match &self.event {
            EngineEvent::Command { command } => {
                format!("\x1b[1m{} {} ({}){}", command.arrow(), command, command.display(), reset)
            }
            EngineEvent::DirectionCommand { command } => {
                format!("\x1b[32m✓ answer: {} {}{}", command.arrow(), command, reset)
            }
            EngineEvent::CueStateChanged { cue } => {
                format!("{}{} {}{}", cue.color_code(), cue.emoji(), cue, reset)
            }
            EngineEvent::Processing { active } => {
                format!("\x1b[90m… processing={}{}", active, reset)
            }
            EngineEvent::Transcript { text, is_final } => {
                let tag = if *is_final { "final" } else { "partial" };
                format!("\x1b[90m[{}] {}{}", tag, text, reset)
            }
            EngineEvent::Log { line } => format!("\x1b[90m{}{}", line, reset),
            EngineEvent::ErrorText { message } => format!("\x1b[31m⚠ {}{}", message, reset),
        }
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        match &self.event {
            EngineEvent::Command { command } => format!("command={}", command),
            EngineEvent::DirectionCommand { command } => format!("answer={}", command),
            EngineEvent::CueStateChanged { cue } => format!("cue={}", cue),
            EngineEvent::Processing { active } => format!("processing={}", active),
            EngineEvent::Transcript { text, is_final } => {
                format!("transcript={} | final={}", text, is_final)
            }
            EngineEvent::Log { line } => format!("log={}", line),
            EngineEvent::ErrorText { message } => format!("error={}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_string(&EngineEvent::DirectionCommand { command: Command::Left })
            .unwrap();
        assert_eq!(json, r#"{"type":"direction_command","command":"left"}"#);
    }

    #[test]
    fn test_transcript_event_defaults_to_partial() {
        let event: TranscriptEvent = serde_json::from_str(r#"{"text":"上"}"#).unwrap();
        assert_eq!(event, TranscriptEvent::partial("上"));
    }

    #[test]
    fn test_parseable_string() {
        let stamped = StampedEvent::new(EngineEvent::Command { command: Command::Continue });
        assert_eq!(stamped.to_parseable_string(), "command=CONTINUE");
    }
}
