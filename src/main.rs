use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;

use pooled_audio::audio_system::{AudioSystem, HeadlessFactory, RodioFactory, SourceFactory};
use pooled_audio::messaging::AudioEvent;
use pooled_audio::{spawn_json_loader, AppResult, SystemConfig};

const FRAME: Duration = Duration::from_millis(16);
const LOAD_TIMEOUT: Duration = Duration::from_secs(10);
const PLAY_TIMEOUT: Duration = Duration::from_secs(30);

fn initialize_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

/// Plays every container of the configured library once, then exits.
///
/// Usage: `pooled-audio-demo [config.json] [--headless]`
fn main() -> AppResult<()> {
    initialize_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let headless = args.iter().any(|a| a == "--headless");
    let config_path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("audio_config.json"));

    let config = SystemConfig::load_from(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    tracing::info!(
        "Sweep every {:.2}s, expiry epsilon {:.2}s",
        config.sweep_interval,
        config.epsilon()
    );

    // The output stream must stay alive for as long as anything plays
    let mut stream = None;
    let factory: Box<dyn SourceFactory> = if headless {
        Box::new(HeadlessFactory::new())
    } else {
        match RodioFactory::try_default() {
            Ok((output, factory)) => {
                stream = Some(output);
                Box::new(factory)
            }
            Err(e) => {
                tracing::warn!("{}, falling back to headless playback", e);
                Box::new(HeadlessFactory::new())
            }
        }
    };
    let _stream = stream;

    let pending = spawn_json_loader(config.settings_path.clone(), config.library_path.clone());
    let mut system = AudioSystem::new(config, factory);
    let events = system.subscribe();
    system.begin_loading(pending);

    let started = Instant::now();
    while !system.is_ready() {
        if started.elapsed() > LOAD_TIMEOUT {
            anyhow::bail!("Audio assets did not load within {:?}", LOAD_TIMEOUT);
        }
        system.update(FRAME);
        thread::sleep(FRAME);
    }

    let mut ids: Vec<_> = system.catalog().ids().into_iter().collect();
    ids.sort_unstable();
    if ids.is_empty() {
        tracing::warn!("Container library is empty, nothing to play");
        return Ok(());
    }

    for id in ids {
        system.play_id(id);
    }

    let started = Instant::now();
    while system.alive_count() > 0 {
        if started.elapsed() > PLAY_TIMEOUT {
            let stopped = system.kill_all(None);
            tracing::info!("Stopped {} instances still playing", stopped);
        }
        system.update(FRAME);
        for event in events.try_iter() {
            match event {
                AudioEvent::Ready => {}
                other => tracing::info!("{}", other.description()),
            }
        }
        thread::sleep(FRAME);
    }

    if let Some(pool) = system.pool() {
        tracing::info!("Done, pool holds {} sources", pool.size());
    }
    Ok(())
}
