//! Core types for voicecue

mod command;
mod config;
mod error;
mod event;
mod output;
mod reason;
mod resolution;
mod state;

pub use command::{Command, Phase};
pub use config::Config;
pub use error::EngineError;
pub use event::{EngineEvent, StampedEvent, TranscriptEvent};
pub use output::{EngineStatus, PhaseOutput};
pub use reason::ReasonCode;
pub use resolution::{Resolution, TokenMatch};
pub use state::CueState;
