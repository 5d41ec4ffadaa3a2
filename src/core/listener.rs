//! Output side of the engine
//!
//! Every callback defaults to forwarding an `EngineEvent` to `on_event`, so a
//! listener can either override single callbacks or consume the event stream.

use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::types::{Command, CueState, EngineEvent, StampedEvent};

pub trait EngineListener: Send {
    /// Every matched command, direction or separator
    fn on_command(&mut self, command: Command) {
        self.on_event(EngineEvent::Command { command });
    }

    /// At most once per sentence: the sentence's answer
    fn on_direction_command(&mut self, command: Command) {
        self.on_event(EngineEvent::DirectionCommand { command });
    }

    fn on_cue_state_changed(&mut self, cue: CueState) {
        self.on_event(EngineEvent::CueStateChanged { cue });
    }

    fn on_processing(&mut self, active: bool) {
        self.on_event(EngineEvent::Processing { active });
    }

    /// Display passthrough; duplicates arrive as an empty partial
    fn on_transcript(&mut self, text: &str, is_final: bool) {
        self.on_event(EngineEvent::Transcript {
            text: text.to_string(),
            is_final,
        });
    }

    fn on_log(&mut self, line: &str) {
        self.on_event(EngineEvent::Log { line: line.to_string() });
    }

    fn on_error_text(&mut self, message: &str) {
        self.on_event(EngineEvent::ErrorText { message: message.to_string() });
    }

    fn on_event(&mut self, _event: EngineEvent) {}
}

/// Fan-out to any number of subscribers (WebSocket, CLI printer)
impl EngineListener for broadcast::Sender<StampedEvent> {
    fn on_event(&mut self, event: EngineEvent) {
        // No subscribers is fine
        let _ = self.send(StampedEvent::new(event));
    }
}

/// Shared in-memory event log; clones see the same events
#[derive(Debug, Default, Clone)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EngineEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.lock().clone()
    }

    /// Drain recorded events
    pub fn take(&self) -> Vec<EngineEvent> {
        std::mem::take(&mut *self.lock())
    }

    pub fn commands(&self) -> Vec<Command> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Command { command } => Some(*command),
                _ => None,
            })
            .collect()
    }

    pub fn direction_answers(&self) -> Vec<Command> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                EngineEvent::DirectionCommand { command } => Some(*command),
                _ => None,
            })
            .collect()
    }

    pub fn cue_states(&self) -> Vec<CueState> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                EngineEvent::CueStateChanged { cue } => Some(*cue),
                _ => None,
            })
            .collect()
    }

    pub fn processing(&self) -> Vec<bool> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Processing { active } => Some(*active),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                EngineEvent::ErrorText { message } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn logs(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Log { line } => Some(line.clone()),
                _ => None,
            })
            .collect()
    }
}

impl EngineListener for EventRecorder {
    fn on_event(&mut self, event: EngineEvent) {
        self.lock().push(event);
    }
}
