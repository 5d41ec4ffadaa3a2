//! Tokio execution context for an engine
//!
//! One task owns the engine. Control calls, transcripts and backend errors
//! arrive as messages; timers fire from the same `select!` loop, so nothing
//! ever touches engine state concurrently.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::core::backend::CaptureBackend;
use crate::core::engine::Engine;
use crate::types::{EngineError, EngineStatus, Resolution, TranscriptEvent};

#[derive(Debug)]
pub enum EngineMessage {
    Start(Option<oneshot::Sender<Result<(), EngineError>>>),
    Stop,
    ClearForNextInput,
    AllowDirectionAgain,
    Transcript(TranscriptEvent),
    BackendError(String),
    ProcessTextForTest(String, oneshot::Sender<Resolution>),
    Status(oneshot::Sender<EngineStatus>),
    Shutdown,
}

/// Cheap, cloneable handle to a running engine task
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineMessage>,
}

impl EngineHandle {
    fn send(&self, msg: EngineMessage) -> Result<(), EngineError> {
        self.tx.send(msg).map_err(|_| EngineError::RuntimeClosed)
    }

    /// Start and wait for the permission check result
    pub async fn start(&self) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineMessage::Start(Some(reply)))?;
        rx.await.map_err(|_| EngineError::RuntimeClosed)?
    }

    pub fn stop(&self) -> Result<(), EngineError> {
        self.send(EngineMessage::Stop)
    }

    pub fn clear_for_next_input(&self) -> Result<(), EngineError> {
        self.send(EngineMessage::ClearForNextInput)
    }

    pub fn allow_direction_again(&self) -> Result<(), EngineError> {
        self.send(EngineMessage::AllowDirectionAgain)
    }

    pub fn transcript(&self, text: impl Into<String>, is_final: bool) -> Result<(), EngineError> {
        self.send(EngineMessage::Transcript(TranscriptEvent {
            text: text.into(),
            is_final,
        }))
    }

    pub fn backend_error(&self, message: impl Into<String>) -> Result<(), EngineError> {
        self.send(EngineMessage::BackendError(message.into()))
    }

    pub async fn process_text_for_test(&self, text: impl Into<String>) -> Result<Resolution, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineMessage::ProcessTextForTest(text.into(), reply))?;
        rx.await.map_err(|_| EngineError::RuntimeClosed)
    }

    pub async fn status(&self) -> Result<EngineStatus, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineMessage::Status(reply))?;
        rx.await.map_err(|_| EngineError::RuntimeClosed)
    }

    /// Stop the engine and end its task
    pub fn shutdown(&self) -> Result<(), EngineError> {
        self.send(EngineMessage::Shutdown)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Move the engine onto its own task
pub fn spawn<B>(engine: Engine<B>) -> (EngineHandle, JoinHandle<()>)
where
    B: CaptureBackend + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(engine, rx));
    (EngineHandle { tx }, task)
}

async fn run<B: CaptureBackend>(mut engine: Engine<B>, mut rx: mpsc::UnboundedReceiver<EngineMessage>) {
    debug!("engine task started");
    loop {
        let deadline = engine.next_deadline();
        tokio::select! {
            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                if !dispatch(&mut engine, msg) {
                    break;
                }
            }
            _ = wait_for(deadline) => {
                engine.poll_timers(Instant::now());
            }
        }
    }
    if engine.is_recognizing() {
        engine.stop();
    }
    info!("engine task finished");
}

/// Apply one message; false ends the loop
fn dispatch<B: CaptureBackend>(engine: &mut Engine<B>, msg: EngineMessage) -> bool {
    match msg {
        EngineMessage::Start(reply) => {
            let result = engine.start();
            if let Some(reply) = reply {
                let _ = reply.send(result);
            }
        }
        EngineMessage::Stop => engine.stop(),
        EngineMessage::ClearForNextInput => engine.clear_for_next_input(),
        EngineMessage::AllowDirectionAgain => engine.allow_direction_again(),
        EngineMessage::Transcript(event) => engine.handle_transcript(event),
        EngineMessage::BackendError(message) => engine.report_backend_error(&message),
        EngineMessage::ProcessTextForTest(text, reply) => {
            let _ = reply.send(engine.process_text_for_test(&text));
        }
        EngineMessage::Status(reply) => {
            let _ = reply.send(engine.status());
        }
        EngineMessage::Shutdown => return false,
    }
    true
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

// =============================================================================
// TESTS
// =============================================================================
