use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use yakyn_voice::{
    ApiTranscriber, AudioBackendFactory, AudioSource, Config, ContactNotes, DraftSink,
    NewContactDraft, NoteDictation, PermissionStore, PermissionTracker, SessionOutcome,
    VoiceInput, VoiceServices,
};

#[derive(Parser)]
#[command(name = "yakyn-voice")]
#[command(about = "Voice capture and transcription for Yakyn contact drafts")]
#[command(version = "0.1.0")]
struct Cli {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/yakyn-voice")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or request microphone access
    Permission {
        #[command(subcommand)]
        action: PermissionAction,
    },

    /// Record for a fixed time and print what was recognized
    Record {
        /// Which field the recording fills
        #[arg(long, value_enum, default_value = "note")]
        purpose: Purpose,

        /// How long to hold the record button
        #[arg(long, default_value = "5")]
        seconds: f32,

        /// Play a WAV file instead of using the microphone
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PermissionAction {
    /// Show the cached permission state
    Status,
    /// Prompt for microphone access
    Request,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Purpose {
    Note,
    ContactNote,
    NewContact,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config).context("Failed to load configuration")?;

    match cli.command {
        Commands::Permission { action } => {
            let tracker = build_tracker(&cfg, None);
            let state = match action {
                PermissionAction::Status => tracker.check_status().await,
                PermissionAction::Request => tracker.request_permission().await,
            };
            println!("{}: {}", tracker.device_id(), state);
        }

        Commands::Record {
            purpose,
            seconds,
            file,
        } => {
            if !(seconds.is_finite() && seconds > 0.0) {
                bail!("--seconds must be a positive number");
            }

            let services = build_services(&cfg, file)?;
            let hold = Duration::from_secs_f32(seconds);

            match purpose {
                Purpose::Note => {
                    let sink = record(&services, NoteDictation::default(), hold).await?;
                    println!("{}", sink.text());
                }
                Purpose::ContactNote => {
                    let sink = record(&services, ContactNotes::default(), hold).await?;
                    println!("{}", sink.notes());
                }
                Purpose::NewContact => {
                    let sink = record(&services, NewContactDraft::default(), hold).await?;
                    println!("{}", serde_json::to_string_pretty(sink.draft())?);
                }
            }
        }
    }

    Ok(())
}

fn backend_factory(cfg: &Config, file: Option<PathBuf>) -> AudioBackendFactory {
    let source = match file {
        Some(path) => AudioSource::File(path),
        None => AudioSource::Microphone(cfg.voice.device.clone()),
    };
    AudioBackendFactory::new(source)
}

fn build_tracker(cfg: &Config, file: Option<PathBuf>) -> PermissionTracker {
    PermissionTracker::new(
        Arc::new(backend_factory(cfg, file)),
        PermissionStore::open(&cfg.permission.cache_path),
        cfg.voice.backend_config(),
    )
}

fn build_services(cfg: &Config, file: Option<PathBuf>) -> Result<VoiceServices> {
    let backends = Arc::new(backend_factory(cfg, file));
    let permissions = Arc::new(PermissionTracker::new(
        backends.clone(),
        PermissionStore::open(&cfg.permission.cache_path),
        cfg.voice.backend_config(),
    ));
    let transcriber =
        Arc::new(ApiTranscriber::new(&cfg.api).context("Failed to build transcription client")?);

    Ok(VoiceServices::new(permissions, backends, transcriber).with_voice_config(cfg.voice.clone()))
}

async fn record<S: DraftSink + Clone>(services: &VoiceServices, sink: S, hold: Duration) -> Result<S> {
    let input = VoiceInput::new(services, sink);

    if !input.press().await {
        let status = input.status();
        bail!(
            "Recording did not start: {}",
            status
                .notice
                .map(|n| n.to_string())
                .unwrap_or_else(|| format!("permission is {}", status.permission))
        );
    }

    info!("Recording for {:.1}s", hold.as_secs_f32());
    tokio::time::sleep(hold).await;

    match input.release().await {
        Some(SessionOutcome::Discarded { elapsed }) => {
            info!("Recording too short ({}ms), nothing sent", elapsed.as_millis())
        }
        Some(SessionOutcome::Empty) => info!("Nothing was recognized"),
        Some(_) => {}
        None => {
            let notice = input.status().notice.map(|n| n.to_string()).unwrap_or_default();
            bail!("{}", notice);
        }
    }

    let sink = input.sink().clone();
    Ok(sink)
}
