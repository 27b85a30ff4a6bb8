/// Headless backend
///
/// Sources that record every parameter without producing sound. Used by hosts
/// that have no output device and by the test suite.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::catalog::AudioClip;
use super::source::{AudioSource, SourceFactory, Spatial3d};

/// Silent source that remembers what it was told
#[derive(Debug, Clone)]
pub struct HeadlessSource {
    clip: Option<AudioClip>,
    volume: f32,
    pitch: f32,
    looping: bool,
    spatial_blend: f32,
    muted: bool,
    spatial: Spatial3d,
    position: [f32; 3],
    active: bool,
    playing: bool,
    paused: bool,
}

impl HeadlessSource {
    pub fn new() -> Self {
        Self {
            clip: None,
            volume: 1.0,
            pitch: 1.0,
            looping: false,
            spatial_blend: 0.0,
            muted: false,
            spatial: Spatial3d::default(),
            position: [0.0; 3],
            active: false,
            playing: false,
            paused: false,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

impl Default for HeadlessSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for HeadlessSource {
    fn set_clip(&mut self, clip: Option<&AudioClip>) {
        self.clip = clip.cloned();
    }

    fn clip(&self) -> Option<&AudioClip> {
        self.clip.as_ref()
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(-3.0, 3.0);
    }

    fn pitch(&self) -> f32 {
        self.pitch
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn is_looping(&self) -> bool {
        self.looping
    }

    fn set_spatial_blend(&mut self, blend: f32) {
        self.spatial_blend = blend.clamp(0.0, 1.0);
    }

    fn spatial_blend(&self) -> f32 {
        self.spatial_blend
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn set_spatial_3d(&mut self, settings: Spatial3d) {
        self.spatial = settings;
    }

    fn spatial_3d(&self) -> Spatial3d {
        self.spatial
    }

    fn set_position(&mut self, position: [f32; 3]) {
        self.position = position;
    }

    fn position(&self) -> [f32; 3] {
        self.position
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn play(&mut self) {
        self.playing = self.clip.is_some();
        self.paused = false;
    }

    fn pause(&mut self) {
        if self.playing {
            self.paused = true;
        }
    }

    fn unpause(&mut self) {
        self.paused = false;
    }

    fn stop(&mut self) {
        self.playing = false;
        self.paused = false;
    }

    fn is_playing(&self) -> bool {
        self.playing && !self.paused
    }
}

/// Factory for headless sources.
///
/// Clones share the construction counter so a test can keep one copy and
/// hand the other to the system.
#[derive(Debug, Clone, Default)]
pub struct HeadlessFactory {
    created: Arc<AtomicUsize>,
}

impl HeadlessFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sources constructed so far
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl SourceFactory for HeadlessFactory {
    fn create_source(&mut self) -> Box<dyn AudioSource> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Box::new(HeadlessSource::new())
    }
}
