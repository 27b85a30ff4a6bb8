/// Volume tween effect
///
/// Ramps an instance's runtime volume over time, e.g. fade in / fade out.
use serde::{Deserialize, Serialize};

use super::Effect;
use crate::audio_system::alive::AliveId;
use crate::audio_system::manager::AudioSystem;

/// Volume tween configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TweenVolumeEffect {
    /// Start from `start_volume` instead of the instance's current volume
    pub set_start_volume: bool,

    pub start_volume: f32,

    pub end_volume: f32,

    /// Duration in seconds
    pub duration: f64,
}

impl TweenVolumeEffect {
    /// Create a tween from `start_volume` to `end_volume`
    pub fn new(start_volume: f32, end_volume: f32, duration: f64) -> Self {
        Self {
            set_start_volume: true,
            start_volume: start_volume.clamp(0.0, 1.0),
            end_volume: end_volume.clamp(0.0, 1.0),
            duration: duration.max(0.0),
        }
    }

    /// Ramp up from silence to `volume`
    pub fn fade_in(volume: f32, duration: f64) -> Self {
        Self::new(0.0, volume, duration)
    }

    /// Ramp down from wherever the instance is to silence
    pub fn fade_out(duration: f64) -> Self {
        Self {
            set_start_volume: false,
            start_volume: 0.0,
            end_volume: 0.0,
            duration: duration.max(0.0),
        }
    }
}

impl Default for TweenVolumeEffect {
    fn default() -> Self {
        Self::fade_in(1.0, 0.2)
    }
}

impl Effect for TweenVolumeEffect {
    fn apply(&self, system: &mut AudioSystem, target: AliveId) {
        let start = if self.set_start_volume {
            Some(self.start_volume)
        } else {
            None
        };
        system.start_volume_tween(target, start, self.end_volume, self.duration);
    }

    fn remove(&self, system: &mut AudioSystem, target: AliveId) {
        system.cancel_volume_tween(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tween_creation_clamps() {
        let tween = TweenVolumeEffect::new(-1.0, 2.0, -3.0);
        assert_eq!(tween.start_volume, 0.0);
        assert_eq!(tween.end_volume, 1.0);
        assert_eq!(tween.duration, 0.0);
    }

    #[test]
    fn test_fade_out_starts_from_current() {
        let tween = TweenVolumeEffect::fade_out(2.0);
        assert!(!tween.set_start_volume);
        assert_eq!(tween.end_volume, 0.0);
    }

    #[test]
    fn test_default_tween() {
        let tween = TweenVolumeEffect::default();
        assert!(tween.set_start_volume);
        assert_eq!(tween.start_volume, 0.0);
        assert_eq!(tween.duration, 0.2);
    }
}
