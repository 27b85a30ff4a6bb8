/// Alive audio instances
///
/// One record per playing (or paused) occurrence of a container. The record
/// owns its source while alive and is disposed exactly once.
use std::sync::Arc;

use slotmap::new_key_type;

use super::catalog::{AudioClipContainer, CategoryId, ContainerId};
use super::settings::AudioSettings;
use super::source::SourceSlot;

new_key_type! {
    /// Generational handle to an alive instance. Stale after disposal, so a
    /// disposed record can never be reached (or reused) through it.
    pub struct AliveId;
}

/// Identifier of the player component that started an instance (0 = none)
pub type PlayerId = u64;

pub const NO_PLAYER: PlayerId = 0;

#[derive(Debug)]
pub struct AliveAudioData {
    container: Option<Arc<AudioClipContainer>>,
    source: Option<SourceSlot>,
    born: f64,
    lifetime: f64,
    looping: bool,
    total_pause: f64,
    pause_started: f64,
    paused: bool,
    disposed: bool,
    player: PlayerId,
    sequence: u64,
    volume: f32,
}

impl AliveAudioData {
    pub(crate) fn new(
        container: Arc<AudioClipContainer>,
        source: SourceSlot,
        now: f64,
        player: PlayerId,
        sequence: u64,
    ) -> Self {
        let looping = container.looping;
        let volume = if container.base_volume.is_nan() {
            1.0
        } else {
            container.base_volume.clamp(0.0, 1.0)
        };
        Self {
            lifetime: lifetime_of(&container, looping),
            container: Some(container),
            source: Some(source),
            born: now,
            looping,
            total_pause: 0.0,
            pause_started: 0.0,
            paused: false,
            disposed: false,
            player,
            sequence,
            volume,
        }
    }

    pub fn container(&self) -> Option<&Arc<AudioClipContainer>> {
        self.container.as_ref()
    }

    pub fn container_id(&self) -> Option<ContainerId> {
        self.container.as_ref().map(|c| c.id)
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.container.as_ref().map(|c| c.category_id)
    }

    pub fn born(&self) -> f64 {
        self.born
    }

    /// Clip length in seconds, or infinity while looping
    pub fn lifetime(&self) -> f64 {
        self.lifetime
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Start order; larger means started later
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Runtime volume before category and master attenuation
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub(crate) fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub(crate) fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
        if let Some(container) = &self.container {
            self.lifetime = lifetime_of(container, looping);
        }
    }

    pub fn is_external_source(&self) -> bool {
        self.source.as_ref().is_some_and(SourceSlot::is_external)
    }

    pub fn source(&self) -> Option<&SourceSlot> {
        self.source.as_ref()
    }

    pub(crate) fn source_mut(&mut self) -> Option<&mut SourceSlot> {
        self.source.as_mut()
    }

    /// Push volume and mute derived from `settings` to the source.
    /// Returns the effective volume, or `None` once disposed.
    pub(crate) fn refresh_mix(&mut self, settings: &AudioSettings) -> Option<f32> {
        let category = self.category_id()?;
        let volume = settings.effective_volume(self.volume, category);
        let muted = settings.is_category_muted(category);
        self.source.as_mut()?.with(|source| {
            source.set_volume(volume);
            source.set_muted(muted);
        });
        Some(volume)
    }

    /// Paused time accumulated so far, including an ongoing pause
    pub fn total_pause_time(&self, now: f64) -> f64 {
        if self.paused {
            self.total_pause + (now - self.pause_started).max(0.0)
        } else {
            self.total_pause
        }
    }

    /// Time after which a non-looping instance counts as dead
    pub fn expires_at(&self, now: f64, epsilon: f64) -> f64 {
        self.born + self.lifetime + epsilon + self.total_pause_time(now)
    }

    pub fn has_died(&self, now: f64, epsilon: f64) -> bool {
        if self.disposed {
            return true;
        }
        if self.looping {
            return false;
        }
        now > self.expires_at(now, epsilon)
    }

    /// Returns false if already paused or disposed
    pub(crate) fn pause(&mut self, now: f64) -> bool {
        if self.paused || self.disposed {
            return false;
        }
        self.paused = true;
        self.pause_started = now;
        if let Some(source) = self.source.as_mut() {
            source.with(|s| s.pause());
        }
        true
    }

    /// Returns false if not paused or disposed
    pub(crate) fn resume(&mut self, now: f64) -> bool {
        if !self.paused || self.disposed {
            return false;
        }
        self.total_pause += (now - self.pause_started).max(0.0);
        self.paused = false;
        if let Some(source) = self.source.as_mut() {
            source.with(|s| s.unpause());
        }
        true
    }

    /// Clear every reference and hand the source back to the caller.
    /// Terminal: a second call returns `None`.
    pub(crate) fn dispose(&mut self) -> Option<SourceSlot> {
        if self.disposed {
            return None;
        }
        self.disposed = true;
        self.paused = false;
        self.container = None;
        self.source.take()
    }
}

fn lifetime_of(container: &AudioClipContainer, looping: bool) -> f64 {
    let length = container.clip.length;
    if looping {
        f64::INFINITY
    } else if length.is_finite() && length > 0.0 {
        length
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::catalog::AudioClip;
    use crate::audio_system::headless::HeadlessSource;

    const EPS: f64 = 0.1;

    fn record(length: f64, looping: bool) -> AliveAudioData {
        let container = Arc::new(
            AudioClipContainer::new(1, AudioClip::new("hit", length)).with_looping(looping),
        );
        let source = SourceSlot::Pooled(Box::new(HeadlessSource::new()));
        AliveAudioData::new(container, source, 10.0, NO_PLAYER, 0)
    }

    #[test]
    fn test_expiry_after_clip_length() {
        let data = record(2.0, false);

        assert!(!data.has_died(10.0, EPS));
        assert!(!data.has_died(12.0, EPS));
        assert!(!data.has_died(12.05, EPS));
        assert!(data.has_died(12.11, EPS));
    }

    #[test]
    fn test_looping_never_expires() {
        let data = record(2.0, true);
        assert!(!data.has_died(1.0e9, EPS));
        assert!(data.lifetime().is_infinite());
    }

    #[test]
    fn test_pause_excluded_from_expiry() {
        let mut data = record(2.0, false);

        assert!(data.pause(11.0));
        // Still paused long after the clip would have ended
        assert!(!data.has_died(50.0, EPS));

        assert!(data.resume(14.0));
        assert_eq!(data.total_pause_time(14.0), 3.0);
        assert!((data.expires_at(14.0, EPS) - 15.1).abs() < 1e-9);
        assert!(!data.has_died(15.0, EPS));
        assert!(data.has_died(15.2, EPS));
    }

    #[test]
    fn test_double_pause_and_resume_are_noops() {
        let mut data = record(2.0, false);

        assert!(!data.resume(10.5));
        assert!(data.pause(11.0));
        assert!(!data.pause(11.5));
        assert!(data.resume(12.0));
        assert!(!data.resume(12.5));
        assert_eq!(data.total_pause_time(13.0), 1.0);
    }

    #[test]
    fn test_dispose_once() {
        let mut data = record(2.0, false);

        assert!(data.dispose().is_some());
        assert!(data.is_disposed());
        assert!(data.container().is_none());
        assert!(data.has_died(0.0, EPS));
        assert!(data.dispose().is_none());
        assert!(!data.pause(11.0));
    }

    #[test]
    fn test_set_looping_updates_lifetime() {
        let mut data = record(2.0, false);

        data.set_looping(true);
        assert!(!data.has_died(100.0, EPS));

        data.set_looping(false);
        assert!(data.has_died(100.0, EPS));
    }

    #[test]
    fn test_unsanitized_container_is_clamped() {
        let mut container = AudioClipContainer::new(1, AudioClip::new("broken", f64::NAN));
        container.base_volume = 2.0;
        let container = Arc::new(container);
        let source = SourceSlot::Pooled(Box::new(HeadlessSource::new()));
        let data = AliveAudioData::new(container, source, 10.0, NO_PLAYER, 0);

        assert_eq!(data.volume(), 1.0);
        assert_eq!(data.lifetime(), 0.0);
        assert!(data.has_died(10.2, EPS));
    }
}
