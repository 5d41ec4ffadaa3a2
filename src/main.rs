//! voicecue CLI
//!
//! Usage:
//!   voicecue --text "上继续下"                 # Resolve one sentence offline
//!   voicecue --interactive                     # Live session fed from stdin
//!   voicecue --replay transcripts.jsonl        # Replay recorded recognizer output
//!   voicecue --serve                           # HTTP + WebSocket bridge
//!   voicecue --text "左" --json                # JSON output

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use voicecue::core::{run_server, spawn, Engine, EngineHandle, EventRecorder};
use voicecue::types::{Config, EngineEvent, Resolution, StampedEvent};
use voicecue::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "voicecue",
    version = VERSION,
    about = "voicecue - turn spoken Mandarin/English into direction commands",
    long_about = "voicecue interprets speech-recognizer transcripts for a hands-free\n\
                  vision test. Each answer is a direction (上 下 左 右) followed by a\n\
                  separator (继续 / next) that unlocks the next direction.\n\n\
                  Modes:\n  \
                  --text         Resolve one sentence offline\n  \
                  --interactive  Live session, one transcript per stdin line\n  \
                  --replay       Replay a JSON-lines transcript file\n  \
                  --serve        HTTP + WebSocket bridge\n\n\
                  Cues:\n  \
                  IDLE                - Not recognizing\n  \
                  AWAITING_DIRECTION  - Say a direction\n  \
                  AWAITING_SEPARATOR  - Say 继续 / next\n  \
                  COOLDOWN            - Directions briefly ignored after a separator"
)]
struct Args {
    /// Sentence to resolve (single mode)
    #[arg(short, long)]
    text: Option<String>,

    /// Interactive mode - each stdin line is a final transcript
    #[arg(short, long)]
    interactive: bool,

    /// Replay recorded transcripts (JSON lines: text, is_final, delay_ms)
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Separator cooldown in seconds
    #[arg(long)]
    cooldown: Option<f64>,

    /// Silence before a partial counts as final, in seconds
    #[arg(long)]
    silence: Option<f64>,

    /// Recognizer locale
    #[arg(long)]
    locale: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Show engine log lines and debug tracing
    #[arg(long)]
    verbose: bool,
}

/// One line of a replay file
#[derive(Debug, Deserialize)]
struct ReplayLine {
    text: String,
    #[serde(default)]
    is_final: bool,
    /// Wait before feeding this line
    #[serde(default)]
    delay_ms: u64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };

    let result = if args.serve {
        run_server(&args.addr, config).await
    } else if let Some(ref path) = args.replay {
        run_replay(path, config, &args).await
    } else if let Some(ref text) = args.text {
        run_single(text, config, &args);
        Ok(())
    } else {
        // Default to interactive if no mode specified
        run_interactive(config, &args).await
    };

    if let Err(err) = result {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "voicecue=debug" } else { "voicecue=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file first, then flag overrides
fn load_config(args: &Args) -> Result<Config, voicecue::types::EngineError> {
    let mut config = match args.config {
        Some(ref path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(cooldown) = args.cooldown {
        config.cooldown_secs = cooldown;
    }
    if let Some(silence) = args.silence {
        config.silence_auto_final_secs = silence;
    }
    if let Some(ref locale) = args.locale {
        config.locale = locale.clone();
    }
    Ok(config.sanitized())
}

/// Resolve one sentence without a live session
fn run_single(text: &str, config: Config, args: &Args) {
    let recorder = EventRecorder::new();
    let mut engine = Engine::new(config, recorder.clone());
    let resolution = engine.process_text_for_test(text);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolution).unwrap_or_default());
        return;
    }
    if args.verbose {
        for event in recorder.take() {
            print_event(&StampedEvent::new(event), args);
        }
    }
    print_resolution(&resolution, args.no_color);
}

/// Live session; each line is a transcript or a control command
async fn run_interactive(config: Config, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let (events_tx, events_rx) = broadcast::channel(256);
    let (handle, task) = spawn(Engine::new(config, events_tx));
    let printer = tokio::spawn(print_events(events_rx, args.json, args.no_color, args.verbose));

    print_header("Interactive Mode", args.no_color);
    println!("Each line is a final transcript. Prefix with 'p:' for a partial.");
    println!("Commands: :start :stop :next :retry :error <message> :status");
    println!("Type 'quit' to exit.");
    println!();

    handle.start().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }
        if line.is_empty() {
            continue;
        }
        if let Err(err) = handle_line(&handle, line).await {
            eprintln!("error: {}", err);
        }
    }

    handle.shutdown()?;
    task.await?;
    printer.abort();
    println!("\nSession ended.");
    Ok(())
}

async fn handle_line(handle: &EngineHandle, line: &str) -> Result<(), voicecue::types::EngineError> {
    match line {
        ":start" => handle.start().await,
        ":stop" => handle.stop(),
        ":next" => handle.clear_for_next_input(),
        ":retry" => handle.allow_direction_again(),
        ":status" => {
            let status = handle.status().await?;
            println!(
                "phase={} | cue={} | recognizing={} | last={}",
                status.phase, status.cue, status.recognizing, status.last_committed
            );
            Ok(())
        }
        _ => {
            if let Some(message) = line.strip_prefix(":error ") {
                handle.backend_error(message)
            } else if let Some(partial) = line.strip_prefix("p:") {
                handle.transcript(partial, false)
            } else {
                handle.transcript(line, true)
            }
        }
    }
}

/// Feed a recorded transcript file through a live session
async fn run_replay(
    path: &PathBuf,
    config: Config,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let settle = config.silence_auto_final() + Duration::from_millis(100);

    let (events_tx, events_rx) = broadcast::channel(1024);
    let (handle, task) = spawn(Engine::new(config, events_tx));
    let printer = tokio::spawn(print_events(events_rx, args.json, args.no_color, args.verbose));

    handle.start().await?;
    for (n, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: ReplayLine = serde_json::from_str(line)
            .map_err(|e| format!("{}:{}: {}", path.display(), n + 1, e))?;
        if entry.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(entry.delay_ms)).await;
        }
        handle.transcript(entry.text, entry.is_final)?;
    }

    // Let a trailing partial finalize on silence
    tokio::time::sleep(settle).await;
    let status = handle.status().await?;
    handle.shutdown()?;
    task.await?;
    // Printer drains once the engine (and its sender) is gone
    printer.await?;

    if !args.json {
        println!();
        println!("final phase: {} | last sentence: {}", status.phase, status.last_committed);
    }
    Ok(())
}

async fn print_events(
    mut rx: broadcast::Receiver<StampedEvent>,
    json: bool,
    no_color: bool,
    verbose: bool,
) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if matches!(event.event, EngineEvent::Log { .. }) && !verbose {
                    continue;
                }
                if json {
                    println!("{}", serde_json::to_string(&event).unwrap_or_default());
                } else if no_color {
                    println!("{}", event.to_parseable_string());
                } else {
                    println!("{}", event.to_terminal_string());
                }
            }
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_event(event: &StampedEvent, args: &Args) {
    if args.no_color {
        println!("{}", event.to_parseable_string());
    } else {
        println!("{}", event.to_terminal_string());
    }
}

fn print_resolution(resolution: &Resolution, no_color: bool) {
    let commands: Vec<String> = resolution.commands.iter().map(|c| c.to_string()).collect();
    let answer = resolution
        .direction_answer
        .map(|c| c.to_string())
        .unwrap_or_else(|| "-".to_string());

    if no_color {
        println!(
            "phonetic={} | commands={} | answer={} | capped={}",
            resolution.phonetic,
            commands.join(","),
            answer,
            resolution.capped
        );
    } else {
        println!("\x1b[2mphonetic:\x1b[0m {}", resolution.phonetic);
        println!("\x1b[2mcommands:\x1b[0m {}", commands.join(" → "));
        println!("\x1b[1manswer:\x1b[0m   \x1b[32m{}\x1b[0m", answer);
        if resolution.capped {
            println!("\x1b[33m⚠ match limit reached, rest ignored\x1b[0m");
        }
    }
}

fn print_header(mode: &str, no_color: bool) {
    if no_color {
        println!("voicecue v{} - {}", VERSION, mode);
        println!("================================");
    } else {
        println!("\x1b[1m🎙  voicecue v{} - {}\x1b[0m", VERSION, mode);
        println!("\x1b[2m================================\x1b[0m");
    }
    println!();
}
