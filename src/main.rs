//! gaudio - play sounds through the sound manager from the command line.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::PlayerConfig;
use gaudio_audio::{AudioBackend, FsFetcher, HostEvent, SoundId, SoundManager};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Play sounds through the gaudio sound manager", long_about = None)]
struct Args {
    /// Sound files to play, one after another
    files: Vec<String>,

    /// Treat the sounds as music (music global volume applies)
    #[arg(long)]
    music: bool,

    /// Stereo pan from 0.0 (left) to 1.0 (right); unpanned when omitted
    #[arg(long)]
    pan: Option<f32>,

    /// Per-sound volume multiplier
    #[arg(long)]
    volume: Option<f32>,

    /// Configuration file (TOML)
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Directory sound paths are resolved against; overrides the config file
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    /// Give up on a sound that has not finished decoding after this long
    #[arg(long, default_value_t = 5000)]
    load_timeout_ms: u64,

    /// Write the effective configuration back to the config file
    #[arg(long)]
    write_config: bool,
}

#[cfg(feature = "rodio_backend")]
fn host() -> gaudio_audio::backend::RodioBackend {
    gaudio_audio::backend::RodioBackend
}

#[cfg(not(feature = "rodio_backend"))]
fn host() -> gaudio_audio::backend::NoAudio {
    gaudio_audio::backend::NoAudio
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Config warnings go to a default subscriber; the configured filter applies afterwards.
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("warn"))
        .finish();
    let mut config = tracing::subscriber::with_default(bootstrap, || {
        PlayerConfig::load_from_path(&args.config)
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    info!("Starting gaudio v{}", env!("CARGO_PKG_VERSION"));

    if let Some(dir) = args.assets_dir.clone() {
        config.assets_dir = Some(dir);
    }
    if args.write_config {
        config
            .save_to_path(&args.config)
            .with_context(|| format!("failed to write {}", args.config.display()))?;
        info!("Wrote configuration to {}", args.config.display());
    }

    let fetcher = match &config.assets_dir {
        Some(dir) => FsFetcher::with_root(dir),
        None => FsFetcher::new(),
    };
    let mut audio = SoundManager::new(host())
        .with_fetcher(fetcher)
        .with_volumes(config.volumes);
    audio.set_on_unlocked(|| info!("Audio unlocked"));
    audio.setup();
    if audio.context().is_none() {
        warn!("No audio output available; nothing will be heard");
    }

    let sounds: Vec<(SoundId, &str)> = args
        .files
        .iter()
        .map(|file| (audio.load(file.as_str(), args.music), file.as_str()))
        .collect();
    if let Some(volume) = args.volume {
        for (id, _) in &sounds {
            audio.set_volume(*id, volume);
        }
    }

    // No autoplay gate in a terminal, but this still resumes a suspended context.
    audio.handle_event(HostEvent::MouseUp);

    let timeout = Duration::from_millis(args.load_timeout_ms);
    for (id, file) in sounds {
        if !wait_until_loaded(&audio, id, timeout) {
            warn!(file, "Sound not loaded, skipping");
            continue;
        }
        if !audio.play(id, args.pan) {
            warn!(file, "Sound could not be played");
            continue;
        }
        info!(file, pan = ?args.pan, "Playing");
        while audio.is_playing(id) {
            thread::sleep(Duration::from_millis(20));
        }
    }

    audio.teardown();
    Ok(())
}

/// Poll until `id` is decoded. Gives up at once on sounds that can never load.
fn wait_until_loaded<B: AudioBackend>(
    audio: &SoundManager<B>,
    id: SoundId,
    timeout: Duration,
) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        match audio.sound(id) {
            Some(sound) if sound.is_loaded() => return true,
            Some(sound) if sound.is_registered() && Instant::now() < deadline => {
                thread::sleep(Duration::from_millis(10));
            }
            _ => return false,
        }
    }
}
