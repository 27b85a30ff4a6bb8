/// Audio effects module
///
/// Effects mutate one live instance right after it starts (apply) and undo
/// whatever is ongoing when it stops (remove). They are invoked by callers
/// such as [`ClipPlayer`](crate::audio_system::ClipPlayer), never by the core.

pub mod looping;
pub mod pitch;
pub mod spatial;
pub mod tween;

use serde::{Deserialize, Serialize};

use super::alive::AliveId;
use super::manager::AudioSystem;
use super::source::Spatial3d;

pub use looping::OverrideLoopEffect;
pub use pitch::{RandomizePitchEffect, SetPitchEffect};
pub use spatial::{Override3dEffect, OverrideSpatialBlendEffect};
pub use tween::TweenVolumeEffect;

/// Something that can be applied to and removed from a live instance
pub trait Effect {
    fn apply(&self, system: &mut AudioSystem, target: AliveId);
    fn remove(&self, system: &mut AudioSystem, target: AliveId);
}

/// Every effect the system ships with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AudioEffect {
    TweenVolume(TweenVolumeEffect),
    SetPitch(SetPitchEffect),
    RandomizePitch(RandomizePitchEffect),
    OverrideSpatialBlend(OverrideSpatialBlendEffect),
    OverrideLoop(OverrideLoopEffect),
    Override3d(Override3dEffect),
}

impl AudioEffect {
    fn as_effect(&self) -> &dyn Effect {
        match self {
            AudioEffect::TweenVolume(e) => e,
            AudioEffect::SetPitch(e) => e,
            AudioEffect::RandomizePitch(e) => e,
            AudioEffect::OverrideSpatialBlend(e) => e,
            AudioEffect::OverrideLoop(e) => e,
            AudioEffect::Override3d(e) => e,
        }
    }
}

impl Effect for AudioEffect {
    fn apply(&self, system: &mut AudioSystem, target: AliveId) {
        self.as_effect().apply(system, target);
    }

    fn remove(&self, system: &mut AudioSystem, target: AliveId) {
        self.as_effect().remove(system, target);
    }
}

/// Ordered list of effects. Applied front to back, so when two effects set
/// the same parameter the later one wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectChain {
    pub effects: Vec<AudioEffect>,
}

impl EffectChain {
    /// Create an effect chain with no effects
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with(mut self, effect: AudioEffect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Add a fade in to `volume`
    pub fn with_fade_in(self, volume: f32, duration: f64) -> Self {
        self.with(AudioEffect::TweenVolume(TweenVolumeEffect::fade_in(
            volume, duration,
        )))
    }

    /// Add a volume tween between two explicit levels
    pub fn with_volume_tween(self, from: f32, to: f32, duration: f64) -> Self {
        self.with(AudioEffect::TweenVolume(TweenVolumeEffect::new(
            from, to, duration,
        )))
    }

    pub fn with_pitch(self, pitch: f32) -> Self {
        self.with(AudioEffect::SetPitch(SetPitchEffect::new(pitch)))
    }

    pub fn with_random_pitch(self, min_pitch: f32, max_pitch: f32) -> Self {
        self.with(AudioEffect::RandomizePitch(RandomizePitchEffect::new(
            min_pitch, max_pitch,
        )))
    }

    pub fn with_spatial_blend(self, blend: f32) -> Self {
        self.with(AudioEffect::OverrideSpatialBlend(
            OverrideSpatialBlendEffect::new(blend),
        ))
    }

    pub fn with_loop(self, looped: bool) -> Self {
        self.with(AudioEffect::OverrideLoop(OverrideLoopEffect::new(looped)))
    }

    pub fn with_3d(self, settings: Spatial3d) -> Self {
        self.with(AudioEffect::Override3d(Override3dEffect::new(settings)))
    }

    pub fn apply(&self, system: &mut AudioSystem, target: AliveId) {
        for effect in &self.effects {
            effect.apply(system, target);
        }
    }

    pub fn remove(&self, system: &mut AudioSystem, target: AliveId) {
        for effect in &self.effects {
            effect.remove(system, target);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }
}
