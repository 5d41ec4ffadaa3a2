//! Core modules for voicecue

pub mod phonetic;
pub mod matcher;
pub mod resolver;
pub mod phase;
pub mod pipeline;
pub mod listener;
pub mod backend;
pub mod engine;
pub mod runtime;
pub mod api;

pub use phonetic::to_phonetic;
pub use matcher::{Marker, MarkerGroup, TokenMatcher, DIRECTION_GROUPS, SEPARATOR_GROUPS};
pub use resolver::SentenceResolver;
pub use phase::PhaseController;
pub use pipeline::{Ingest, TranscriptPipeline};
pub use listener::{EngineListener, EventRecorder};
pub use backend::{CaptureBackend, NullBackend};
pub use engine::Engine;
pub use runtime::{spawn, EngineHandle, EngineMessage};
pub use api::{create_router, router_with_state, run_server, AppState};
