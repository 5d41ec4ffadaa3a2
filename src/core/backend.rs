//! Capture backend boundary
//!
//! Audio capture and speech-to-text live outside the engine. The engine only
//! asks the backend to check permissions, (re)start a capture leg and stop.
//! Transcripts and errors come back through the engine's input operations.

use tracing::debug;

use crate::types::{EngineError, Phase};

pub trait CaptureBackend: Send {
    /// Microphone + speech permissions; checked on every start
    fn check_permissions(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Begin a fresh capture leg, discarding any previous one
    fn start_leg(&mut self, phase: Phase, locale: &str) -> Result<(), EngineError>;

    fn stop(&mut self);
}

/// Backend for offline use: transcripts are pushed in by the caller
#[derive(Debug, Default)]
pub struct NullBackend {
    legs: u64,
    running: bool,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture legs started so far
    pub fn legs(&self) -> u64 {
        self.legs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl CaptureBackend for NullBackend {
    fn start_leg(&mut self, phase: Phase, locale: &str) -> Result<(), EngineError> {
        self.legs += 1;
        self.running = true;
        debug!(leg = self.legs, %phase, locale, "capture leg started");
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }
}
