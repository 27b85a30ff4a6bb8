//! Pooled game audio: a catalog of clip containers, a growable pool of
//! playback sources, alive-instance tracking with expiry, and live
//! category/master mixing.

pub mod audio_system;
pub mod config;
pub mod error;
pub mod loader;
pub mod messaging;
pub mod state;
pub mod utils;

pub use audio_system::{AliveId, AudioSystem, ClipPlayer, EffectChain};
pub use config::SystemConfig;
pub use error::{AppResult, AudioError, ConfigError};
pub use loader::{spawn_json_loader, LoadedAssets, PendingLoad};
