/// Asset loading
///
/// Settings and the container library come from an external source and may
/// arrive later than the first play request. Loading runs off-thread and
/// delivers its result over a channel that the audio system polls every tick.
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use serde::de::DeserializeOwned;

use crate::audio_system::catalog::ContainerLibrary;
use crate::audio_system::settings::AudioSettings;
use crate::error::AudioError;

/// What the loader produced. A `None` asset was missing; the audio system
/// substitutes defaults for it.
#[derive(Debug, Clone, Default)]
pub struct LoadedAssets {
    pub settings: Option<AudioSettings>,
    pub library: Option<ContainerLibrary>,
}

impl LoadedAssets {
    pub fn new(settings: AudioSettings, library: ContainerLibrary) -> Self {
        Self {
            settings: Some(settings),
            library: Some(library),
        }
    }
}

pub type LoadResult = Result<LoadedAssets, AudioError>;

/// A load in flight. Dropping it cancels the wait; the loader's late result
/// is discarded.
pub struct PendingLoad {
    receiver: Receiver<LoadResult>,
}

impl PendingLoad {
    /// A pending load completed by whoever holds the sender
    pub fn channel() -> (Sender<LoadResult>, Self) {
        let (tx, rx) = bounded(1);
        (tx, Self { receiver: rx })
    }

    /// An already completed load
    pub fn ready(assets: LoadedAssets) -> Self {
        let (tx, pending) = Self::channel();
        let _ = tx.send(Ok(assets));
        pending
    }

    /// Non-blocking check for the result
    pub fn poll(&self) -> Option<LoadResult> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(AudioError::LoaderDisconnected)),
        }
    }
}

/// Read both JSON assets on a background thread
pub fn spawn_json_loader(settings_path: Option<PathBuf>, library_path: Option<PathBuf>) -> PendingLoad {
    let (tx, pending) = PendingLoad::channel();

    thread::spawn(move || {
        tracing::debug!("Asset loader thread started");
        let result = load_json_assets(settings_path.as_deref(), library_path.as_deref());
        // The receiver is gone if the load was cancelled
        let _ = tx.send(result);
        tracing::debug!("Asset loader thread stopped");
    });

    pending
}

/// Read both JSON assets on the calling thread
pub fn load_json_assets(
    settings_path: Option<&Path>,
    library_path: Option<&Path>,
) -> LoadResult {
    Ok(LoadedAssets {
        settings: read_optional(settings_path, "settings")?,
        library: read_optional(library_path, "container library")?,
    })
}

fn read_optional<T: DeserializeOwned>(path: Option<&Path>, what: &str) -> Result<Option<T>, AudioError> {
    let Some(path) = path else {
        tracing::warn!("No {} asset configured", what);
        return Ok(None);
    };
    if !path.exists() {
        tracing::warn!("Audio {} asset not found: {}", what, path.display());
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| AudioError::LoadFailed {
        path: path.display().to_string(),
        source: Box::new(e),
    })?;
    let asset = serde_json::from_str(&content).map_err(|e| AudioError::ParseFailed {
        path: path.display().to_string(),
        source: e,
    })?;

    tracing::info!("Loaded {} from: {}", what, path.display());
    Ok(Some(asset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pooled-audio-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_ready_load_polls_immediately() {
        let pending = PendingLoad::ready(LoadedAssets::default());
        assert!(matches!(pending.poll(), Some(Ok(_))));
    }

    #[test]
    fn test_channel_load_is_pending_until_sent() {
        let (tx, pending) = PendingLoad::channel();
        assert!(pending.poll().is_none());

        tx.send(Ok(LoadedAssets::default())).unwrap();
        assert!(matches!(pending.poll(), Some(Ok(_))));
    }

    #[test]
    fn test_dropped_sender_reports_disconnect() {
        let (tx, pending) = PendingLoad::channel();
        drop(tx);

        assert!(matches!(
            pending.poll(),
            Some(Err(AudioError::LoaderDisconnected))
        ));
    }

    #[test]
    fn test_missing_assets_load_as_none() {
        let dir = temp_dir("missing");
        let assets = load_json_assets(
            Some(&dir.join("settings.json")),
            Some(&dir.join("library.json")),
        )
        .unwrap();

        assert!(assets.settings.is_none());
        assert!(assets.library.is_none());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_malformed_asset_is_an_error() {
        let dir = temp_dir("malformed");
        let path = dir.join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let result = load_json_assets(Some(&path), None);
        assert!(matches!(result, Err(AudioError::ParseFailed { .. })));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_background_loader_delivers() {
        let dir = temp_dir("background");
        let settings_path = dir.join("settings.json");
        let library_path = dir.join("library.json");
        fs::write(&settings_path, r#"{ "master_volume": 0.5 }"#).unwrap();
        fs::write(
            &library_path,
            r#"{ "containers": [ { "id": 3, "clip": { "name": "door", "length": 1.5 } } ] }"#,
        )
        .unwrap();

        let pending = spawn_json_loader(Some(settings_path), Some(library_path));
        let deadline = Instant::now() + Duration::from_secs(5);
        let result = loop {
            if let Some(result) = pending.poll() {
                break result;
            }
            assert!(Instant::now() < deadline, "loader did not finish");
            thread::sleep(Duration::from_millis(5));
        };

        let assets = result.unwrap();
        assert_eq!(assets.settings.map(|s| s.master_volume), Some(0.5));
        assert_eq!(assets.library.map(|l| l.len()), Some(1));
        let _ = fs::remove_dir_all(&dir);
    }
}
