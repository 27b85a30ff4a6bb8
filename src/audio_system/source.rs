/// Audio source handles
///
/// A source is one hardware playback channel. The pool owns idle sources;
/// an alive instance owns its source exclusively while it plays.
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::catalog::AudioClip;

/// How a spatialized source attenuates over distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RolloffMode {
    #[default]
    Logarithmic,
    Linear,
}

/// 3-D parameters of a source. The core only stores and forwards them;
/// spatialization itself belongs to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spatial3d {
    pub doppler_level: f32,
    pub spread: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rolloff: RolloffMode,
}

impl Default for Spatial3d {
    fn default() -> Self {
        Self {
            doppler_level: 1.0,
            spread: 0.0,
            min_distance: 1.0,
            max_distance: 500.0,
            rolloff: RolloffMode::Logarithmic,
        }
    }
}

impl Spatial3d {
    /// Clamp every field into the range the backends accept
    pub fn clamped(self) -> Self {
        let min_distance = self.min_distance.max(0.0);
        Self {
            doppler_level: self.doppler_level.clamp(0.0, 5.0),
            spread: self.spread.clamp(0.0, 360.0),
            min_distance,
            max_distance: self.max_distance.max(min_distance + 0.01),
            rolloff: self.rolloff,
        }
    }
}

/// One playback channel provided by the host audio engine.
///
/// Parameter setters never fail; backends clamp or ignore what they cannot
/// express.
pub trait AudioSource: Send {
    fn set_clip(&mut self, clip: Option<&AudioClip>);
    fn clip(&self) -> Option<&AudioClip>;

    fn set_volume(&mut self, volume: f32);
    fn volume(&self) -> f32;

    fn set_pitch(&mut self, pitch: f32);
    fn pitch(&self) -> f32;

    fn set_looping(&mut self, looping: bool);
    fn is_looping(&self) -> bool;

    fn set_spatial_blend(&mut self, blend: f32);
    fn spatial_blend(&self) -> f32;

    fn set_muted(&mut self, muted: bool);
    fn is_muted(&self) -> bool;

    fn set_spatial_3d(&mut self, settings: Spatial3d);
    fn spatial_3d(&self) -> Spatial3d;

    fn set_position(&mut self, position: [f32; 3]);
    fn position(&self) -> [f32; 3];

    /// Activation state, toggled by the pool on acquire/release
    fn set_active(&mut self, active: bool);
    fn is_active(&self) -> bool;

    /// Start the current clip from the beginning
    fn play(&mut self);
    fn pause(&mut self);
    fn unpause(&mut self);
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
}

/// Constructs new sources when the pool runs dry
pub trait SourceFactory {
    fn create_source(&mut self) -> Box<dyn AudioSource>;
}

/// A source supplied by the caller. The core drives it while the instance is
/// alive but never takes ownership or hands it to the pool.
pub type SharedSource = Arc<Mutex<dyn AudioSource>>;

/// Where an alive instance's source came from
pub enum SourceSlot {
    Pooled(Box<dyn AudioSource>),
    External(SharedSource),
}

impl SourceSlot {
    /// Run `f` against the underlying source
    pub fn with<R>(&mut self, f: impl FnOnce(&mut dyn AudioSource) -> R) -> R {
        match self {
            SourceSlot::Pooled(source) => f(source.as_mut()),
            SourceSlot::External(shared) => {
                let mut guard = shared.lock();
                f(&mut *guard)
            }
        }
    }

    /// Read-only access to the underlying source
    pub fn inspect<R>(&self, f: impl FnOnce(&dyn AudioSource) -> R) -> R {
        match self {
            SourceSlot::Pooled(source) => f(source.as_ref()),
            SourceSlot::External(shared) => {
                let guard = shared.lock();
                f(&*guard)
            }
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, SourceSlot::External(_))
    }
}

impl fmt::Debug for SourceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSlot::Pooled(_) => write!(f, "SourceSlot::Pooled"),
            SourceSlot::External(_) => write!(f, "SourceSlot::External"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::headless::HeadlessSource;

    #[test]
    fn test_spatial_3d_clamping() {
        let settings = Spatial3d {
            doppler_level: 9.0,
            spread: -10.0,
            min_distance: 4.0,
            max_distance: 2.0,
            rolloff: RolloffMode::Linear,
        }
        .clamped();

        assert_eq!(settings.doppler_level, 5.0);
        assert_eq!(settings.spread, 0.0);
        assert!(settings.max_distance > settings.min_distance);
    }

    #[test]
    fn test_source_slot_routes_to_shared_source() {
        let shared: SharedSource = Arc::new(Mutex::new(HeadlessSource::new()));
        let mut slot = SourceSlot::External(Arc::clone(&shared));

        slot.with(|source| source.set_volume(0.25));

        assert!(slot.is_external());
        assert_eq!(shared.lock().volume(), 0.25);
        assert_eq!(slot.inspect(|source| source.volume()), 0.25);
    }
}
