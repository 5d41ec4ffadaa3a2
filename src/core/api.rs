//! HTTP + WebSocket bridge for remote recognizers and UIs
//!
//! Endpoints:
//! - GET /health - Health check
//! - POST /session/new - Create session (own engine task)
//! - GET /session/:id - Engine status
//! - DELETE /session/:id - Shut the engine down
//! - POST /session/:id/transcript - Push a recognizer result
//! - POST /session/:id/control - start | stop | next | retry
//! - POST /session/:id/error - Report a recognizer error
//! - POST /session/:id/test - Resolve a sentence offline
//! - WS /ws/:id - Live engine events

use axum::{
    extract::{Path, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use crate::core::engine::Engine;
use crate::core::runtime::{self, EngineHandle};
use crate::types::{Command, Config, CueState, EngineError, Phase, StampedEvent};

/// One remote recognition session
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub handle: EngineHandle,
    pub events_tx: broadcast::Sender<StampedEvent>,
}

/// App state
pub struct AppState {
    pub sessions: RwLock<HashMap<String, Session>>,
    pub config: Config,
    next_id: AtomicU64,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
            next_id: AtomicU64::new(1),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewSessionResponse {
    pub session_id: String,
    pub websocket_url: String,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub phase: Phase,
    pub cue: CueState,
    pub recognizing: bool,
    pub processing: bool,
    pub last_committed: String,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptRequest {
    pub text: String,
    #[serde(default)]
    pub is_final: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    Start,
    Stop,
    Next,
    Retry,
}

#[derive(Debug, Deserialize)]
pub struct ControlRequest {
    pub action: ControlAction,
}

#[derive(Debug, Deserialize)]
pub struct ErrorRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TestRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TestResponse {
    pub phonetic: String,
    pub commands: Vec<Command>,
    pub direction_answer: Option<Command>,
    pub capped: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_active: usize,
}

/// Create the API router
pub fn create_router(config: Config) -> Router {
    router_with_state(Arc::new(AppState::new(config)))
}

/// Router over existing state; clones of the state see the same sessions
pub fn router_with_state(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/session/new", post(create_session))
        .route("/session/:id", get(get_session).delete(delete_session))
        .route("/session/:id/transcript", post(push_transcript))
        .route("/session/:id/control", post(control))
        .route("/session/:id/error", post(report_error))
        .route("/session/:id/test", post(test_text))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions = state.sessions.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        sessions_active: sessions.len(),
    })
}

async fn create_session(State(state): State<Arc<AppState>>) -> Json<NewSessionResponse> {
    let session_id = format!("session_{:x}", state.next_id.fetch_add(1, Ordering::Relaxed));
    let (events_tx, _) = broadcast::channel(256);

    let engine = Engine::new(state.config.clone(), events_tx.clone());
    let (handle, _task) = runtime::spawn(engine);

    let session = Session {
        id: session_id.clone(),
        handle,
        events_tx,
    };
    state.sessions.write().await.insert(session_id.clone(), session);
    info!(session = %session_id, "session created");

    Json(NewSessionResponse {
        session_id: session_id.clone(),
        websocket_url: format!("/ws/{}", session_id),
    })
}

async fn handle_for(state: &AppState, id: &str) -> Result<EngineHandle, StatusCode> {
    let sessions = state.sessions.read().await;
    sessions
        .get(id)
        .map(|s| s.handle.clone())
        .ok_or(StatusCode::NOT_FOUND)
}

fn engine_status(err: EngineError) -> StatusCode {
    match err {
        EngineError::RuntimeClosed => StatusCode::GONE,
        EngineError::PermissionDenied => StatusCode::FORBIDDEN,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse>, StatusCode> {
    let handle = handle_for(&state, &id).await?;
    let status = handle.status().await.map_err(engine_status)?;

    Ok(Json(SessionStatusResponse {
        session_id: id,
        phase: status.phase,
        cue: status.cue,
        recognizing: status.recognizing,
        processing: status.processing,
        last_committed: status.last_committed,
        reason: status.last_reason.code().to_string(),
    }))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    let removed = state.sessions.write().await.remove(&id);
    match removed {
        Some(session) => {
            let _ = session.handle.shutdown();
            info!(session = %session.id, "session closed");
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn push_transcript(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<TranscriptRequest>,
) -> Result<StatusCode, StatusCode> {
    let handle = handle_for(&state, &id).await?;
    handle.transcript(req.text, req.is_final).map_err(engine_status)?;
    Ok(StatusCode::ACCEPTED)
}

async fn control(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ControlRequest>,
) -> Result<StatusCode, StatusCode> {
    let handle = handle_for(&state, &id).await?;
    match req.action {
        ControlAction::Start => handle.start().await,
        ControlAction::Stop => handle.stop(),
        ControlAction::Next => handle.clear_for_next_input(),
        ControlAction::Retry => handle.allow_direction_again(),
    }
    .map_err(engine_status)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn report_error(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ErrorRequest>,
) -> Result<StatusCode, StatusCode> {
    let handle = handle_for(&state, &id).await?;
    handle.backend_error(req.message).map_err(engine_status)?;
    Ok(StatusCode::ACCEPTED)
}

async fn test_text(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<TestRequest>,
) -> Result<Json<TestResponse>, StatusCode> {
    let handle = handle_for(&state, &id).await?;
    let resolution = handle
        .process_text_for_test(req.text)
        .await
        .map_err(engine_status)?;

    Ok(Json(TestResponse {
        phonetic: resolution.phonetic,
        commands: resolution.commands,
        direction_answer: resolution.direction_answer,
        capped: resolution.capped,
    }))
}

async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let rx = session.events_tx.subscribe();
    drop(sessions);

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    }))
}

async fn handle_websocket(mut socket: WebSocket, mut rx: broadcast::Receiver<StampedEvent>) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "websocket client lagging, events dropped");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        if socket.send(Message::Text(json)).await.is_err() {
            break;
        }
    }
}

/// Run the API server
pub async fn run_server(addr: &str, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "voicecue API listening");
    println!("🎙  voicecue API running on {}", addr);
    println!("  POST   /session/new             - Create session");
    println!("  GET    /session/:id             - Engine status");
    println!("  DELETE /session/:id             - Close session");
    println!("  POST   /session/:id/transcript  - Push transcript");
    println!("  POST   /session/:id/control     - start | stop | next | retry");
    println!("  POST   /session/:id/error       - Report recognizer error");
    println!("  POST   /session/:id/test        - Resolve text offline");
    println!("  WS     /ws/:id                  - Live events");
    println!("  GET    /health                  - Health check");
    axum::serve(listener, router).await?;
    Ok(())
}
