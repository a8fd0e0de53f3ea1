use std::{path::PathBuf, sync::Arc, time::Duration};

use annotation_core::{
    spawn_session, AnnotationSession, FileCapture, HttpTranscriber, SessionCommand,
    SessionHandle, ViewerConfig, Viewport,
};
use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod repl;
mod terminal_scene;

use repl::{parse_line, Input, HELP};
use terminal_scene::TerminalScene;

#[derive(Parser, Debug)]
#[command(about = "Annotate panoramas with voice notes from the terminal")]
struct Args {
    #[arg(long, env = "VIEWER_SERVER_URL", default_value = "http://127.0.0.1:5000")]
    server_url: String,
    /// Pre-recorded clip uploaded each time a recording stops.
    #[arg(long, env = "VIEWER_AUDIO")]
    audio: PathBuf,
    #[arg(long, default_value_t = 3)]
    panoramas: u32,
    #[arg(long, default_value = "/static/panorama_input")]
    base_path: String,
    #[arg(long, default_value = shared::protocol::DEFAULT_TRANSCRIPTION_MODEL)]
    model: String,
    /// Upper bound for one transcription request, in seconds.
    #[arg(long, default_value_t = 60)]
    timeout: u64,
    #[arg(long, default_value_t = 1280.0)]
    width: f32,
    #[arg(long, default_value_t = 720.0)]
    height: f32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();
    let args = Args::parse();

    let config = ViewerConfig {
        panorama_count: args.panoramas,
        panorama_base_path: args.base_path,
        transcription_model: args.model,
        transcription_timeout: Duration::from_secs(args.timeout),
        ..ViewerConfig::default()
    };
    let transcriber = HttpTranscriber::new(
        &args.server_url,
        config.transcription_model.clone(),
        config.transcription_timeout,
    )?;
    info!(endpoint = %transcriber.endpoint(), "using transcription relay");

    let session = AnnotationSession::new(
        config,
        Box::new(TerminalScene::new(Viewport::new(args.width, args.height))),
        Box::new(FileCapture::new(args.audio)),
        Arc::new(transcriber),
    )?;
    let handle = spawn_session(session);
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = match parse_line(&line) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        if !dispatch(&handle, input).await? {
            break;
        }
    }

    let session = handle.shutdown().await?;
    println!(
        "{} marker(s) annotated across {} panorama(s)",
        session.store().total(),
        session.config().panorama_count
    );
    Ok(())
}

/// Applies one input. Returns false once the user asked to quit.
async fn dispatch(handle: &SessionHandle, input: Input) -> Result<bool> {
    let command = match input {
        Input::Quit => return Ok(false),
        Input::Help => {
            println!("{HELP}");
            return Ok(true);
        }
        Input::List => {
            let snapshot = handle.snapshot().await?;
            println!(
                "panorama {}/{} ({:?}): {} marker(s), {} in total",
                snapshot.panorama,
                snapshot.panorama_count,
                snapshot.state,
                snapshot.markers.len(),
                snapshot.total_markers
            );
            for (slot, marker) in snapshot.markers.iter().enumerate() {
                let p = marker.position;
                println!(
                    "  {slot}: ({:.2}, {:.2}, {:.2}) {:?}",
                    p.x, p.y, p.z, marker.text
                );
            }
            return Ok(true);
        }
        Input::Add => SessionCommand::BeginPlacement,
        Input::Click(point) => SessionCommand::SurfaceClicked(point),
        Input::Stop => SessionCommand::StopRecording,
        Input::Cancel => SessionCommand::Cancel,
        Input::Advance(offset) => SessionCommand::Advance(offset),
        Input::Hover(visual) => SessionCommand::PointerEnter(visual),
        Input::Leave(visual) => SessionCommand::PointerLeave(visual),
    };
    if let Err(error) = handle.send(command).await {
        warn!(%error, "session stopped accepting input");
        return Ok(false);
    }
    Ok(true)
}
