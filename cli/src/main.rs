mod render;
mod session;

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use events::{Codec, ElementKind, Filters, SpawnIntent};
use replica::ids::next_element_id;
use replica::{ConnectionStatus, Reconciler, Renderer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::render::{LogRenderer, describe};
use crate::session::StageSession;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket send failed: {0}")]
    WsSend(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket receive failed: {0}")]
    WsRecv(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("event encode failed: {0}")]
    Encode(events::CodecError),
    #[error("event decode failed: {0}")]
    Decode(#[from] events::CodecError),
    #[error("timed out waiting for the server")]
    Timeout,
    #[error("no element with id `{0}` on the stage")]
    UnknownElement(String),
    #[error("element `{0}` already exists")]
    DuplicateElement(String),
    #[error("invalid filter `{0}`; expected name=value")]
    InvalidFilter(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "stage", about = "Shared stage websocket CLI")]
struct Cli {
    #[arg(long, env = "STAGE_URL", default_value = "ws://127.0.0.1:3000/ws")]
    url: String,

    /// Exchange protobuf binary frames instead of JSON text.
    #[arg(long, default_value_t = false)]
    binary: bool,

    /// Seconds to wait for the server's snapshot.
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone)]
struct CliContext {
    url: String,
    codec: Codec,
    timeout: Duration,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current stage snapshot.
    List {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Follow the stage and print every change. Reconnects on loss.
    Watch,
    Spawn(SpawnArgs),
    Move {
        id: String,
        x: f64,
        y: f64,
    },
    Resize {
        id: String,
        width: f64,
        height: f64,
    },
    /// Replace an element's filters. No pairs clears them.
    Filter {
        id: String,
        #[arg(value_name = "NAME=VALUE")]
        filters: Vec<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct SpawnArgs {
    #[arg(long, value_parser = parse_kind)]
    kind: ElementKind,

    /// Media URI, or text content for text elements.
    #[arg(long)]
    source: Option<String>,

    /// Defaults to a fresh `<kind>-<uuid>`.
    #[arg(long)]
    id: Option<String>,

    #[arg(long, requires = "y")]
    x: Option<f64>,
    #[arg(long, requires = "x")]
    y: Option<f64>,
    #[arg(long, requires = "height")]
    width: Option<f64>,
    #[arg(long, requires = "width")]
    height: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = CliContext {
        url: cli.url,
        codec: if cli.binary { Codec::Binary } else { Codec::Json },
        timeout: Duration::from_secs(cli.timeout_secs),
    };

    match cli.command {
        Command::List { json } => run_list(&ctx, json).await,
        Command::Watch => run_watch(&ctx).await,
        Command::Spawn(args) => run_spawn(&ctx, args).await,
        Command::Move { id, x, y } => run_intent(&ctx, &id, |r| r.move_to(&id, x, y)).await,
        Command::Resize { id, width, height } => {
            run_intent(&ctx, &id, |r| r.resize(&id, width, height)).await
        }
        Command::Filter { id, filters } => {
            let filters = parse_filters(&filters)?;
            run_intent(&ctx, &id, |r| r.set_filters(&id, filters)).await
        }
        Command::Delete { id } => run_intent(&ctx, &id, |r| r.delete(&id)).await,
    }
}

// =============================================================================
// ONE-SHOT COMMANDS
// =============================================================================

async fn open(ctx: &CliContext) -> Result<(StageSession, Reconciler<()>), CliError> {
    let mut session = StageSession::connect(&ctx.url, ctx.codec).await?;
    let mut replica = Reconciler::new(());
    session.bootstrap(&mut replica, ctx.timeout).await?;
    Ok((session, replica))
}

async fn run_list(ctx: &CliContext, json: bool) -> Result<(), CliError> {
    let (session, replica) = open(ctx).await?;
    if json {
        let records: Vec<_> = replica.store().iter().map(|el| &el.record).collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        for el in replica.store().iter() {
            println!("{}", describe(el));
        }
    }
    session.close().await
}

async fn run_spawn(ctx: &CliContext, args: SpawnArgs) -> Result<(), CliError> {
    let id = args.id.unwrap_or_else(|| next_element_id(args.kind));
    let mut intent = SpawnIntent::new(id.clone(), args.kind);
    if let Some(source) = args.source {
        intent = intent.with_source(source);
    }
    if let (Some(x), Some(y)) = (args.x, args.y) {
        intent = intent.with_position(x, y);
    }
    if let (Some(width), Some(height)) = (args.width, args.height) {
        intent = intent.with_size(width, height);
    }

    let (mut session, mut replica) = open(ctx).await?;
    let event = replica.spawn(intent).ok_or_else(|| CliError::DuplicateElement(id.clone()))?;
    session.send(&event).await?;
    session.close().await?;
    println!("{id}");
    Ok(())
}

/// Apply a local intent to a freshly bootstrapped replica and send it.
async fn run_intent<F>(ctx: &CliContext, id: &str, intent: F) -> Result<(), CliError>
where
    F: FnOnce(&mut Reconciler<()>) -> Option<events::ClientEvent>,
{
    let (mut session, mut replica) = open(ctx).await?;
    let event = intent(&mut replica).ok_or_else(|| CliError::UnknownElement(id.to_owned()))?;
    session.send(&event).await?;
    session.close().await
}

// =============================================================================
// WATCH
// =============================================================================

async fn run_watch(ctx: &CliContext) -> Result<(), CliError> {
    let mut replica = Reconciler::new(LogRenderer);
    let mut backoff = INITIAL_BACKOFF;

    loop {
        replica.set_status(ConnectionStatus::Connecting);

        let outcome = tokio::select! {
            result = watch_once(ctx, &mut replica, &mut backoff) => result,
            _ = tokio::signal::ctrl_c() => return Ok(()),
        };
        match outcome {
            Ok(()) => info!("watch: server closed the connection"),
            Err(e) => warn!(error = %e, "watch: connection lost"),
        }

        replica.set_status(ConnectionStatus::Disconnected);

        info!(delay_secs = backoff.as_secs(), "watch: reconnecting");
        tokio::select! {
            () = tokio::time::sleep(backoff) => {}
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
        backoff = next_backoff(backoff);
    }
}

/// Run one connection until it drops. A successful bootstrap resets `backoff`.
async fn watch_once<R: Renderer>(
    ctx: &CliContext,
    replica: &mut Reconciler<R>,
    backoff: &mut Duration,
) -> Result<(), CliError> {
    let mut session = StageSession::connect(&ctx.url, ctx.codec).await?;
    session.bootstrap(replica, ctx.timeout).await?;
    replica.set_status(ConnectionStatus::Connected);
    *backoff = INITIAL_BACKOFF;

    loop {
        match session.recv(None).await {
            Ok(event) => {
                replica.apply_remote(event);
            }
            Err(CliError::WsClosed) => return Ok(()),
            Err(CliError::Decode(e)) => warn!(error = %e, "watch: undecodable event skipped"),
            Err(e) => return Err(e),
        }
    }
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

// =============================================================================
// ARGUMENT PARSING
// =============================================================================

fn parse_kind(raw: &str) -> Result<ElementKind, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_ascii_lowercase()))
        .map_err(|_| format!("unknown kind `{raw}`; expected webcam, video, image, or text"))
}

fn parse_filters(pairs: &[String]) -> Result<Filters, CliError> {
    pairs
        .iter()
        .map(|pair| {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| CliError::InvalidFilter(pair.clone()))?;
            let value: f64 = value
                .trim()
                .parse()
                .map_err(|_| CliError::InvalidFilter(pair.clone()))?;
            let name = name.trim();
            if name.is_empty() || !value.is_finite() {
                return Err(CliError::InvalidFilter(pair.clone()));
            }
            Ok((name.to_owned(), value))
        })
        .collect()
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
