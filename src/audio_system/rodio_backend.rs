/// Rodio backend
///
/// Each pooled source owns one rodio `Sink`. Clip data is read once into a
/// shared [`ClipBank`] and decoded from memory on every play. Rodio sinks are
/// not spatialized: spatial blend, 3-D settings and position are recorded but
/// do not change the output.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use super::catalog::AudioClip;
use super::source::{AudioSource, SourceFactory, Spatial3d};
use crate::error::AudioError;

/// Encoded clip data keyed by clip name
#[derive(Debug, Default)]
pub struct ClipBank {
    data: Mutex<HashMap<String, Arc<Vec<u8>>>>,
}

impl ClipBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register already loaded bytes under `name`
    pub fn insert(&self, name: impl Into<String>, bytes: Vec<u8>) {
        self.data.lock().insert(name.into(), Arc::new(bytes));
    }

    /// Read the clip's file into memory and verify it decodes
    pub fn preload(&self, clip: &AudioClip) -> Result<Arc<Vec<u8>>, AudioError> {
        let Some(path) = &clip.path else {
            return Err(AudioError::LoadFailed {
                path: clip.name.clone(),
                source: "clip has no file path".into(),
            });
        };

        let bytes = std::fs::read(path).map_err(|e| AudioError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        Decoder::new(Cursor::new(bytes.clone()))
            .map_err(|e| AudioError::DecodeFailed(Box::new(e)))?;

        let bytes = Arc::new(bytes);
        self.data
            .lock()
            .insert(clip.name.clone(), Arc::clone(&bytes));
        tracing::debug!("Preloaded {} ({} bytes)", clip.name, bytes.len());
        Ok(bytes)
    }

    /// Cached bytes, loading from the clip's path on first use
    pub fn get(&self, clip: &AudioClip) -> Option<Arc<Vec<u8>>> {
        if let Some(bytes) = self.data.lock().get(&clip.name) {
            return Some(Arc::clone(bytes));
        }
        match self.preload(clip) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!("No audio data for {}: {}", clip.name, e);
                None
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.data.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }
}

/// Length in seconds of encoded audio, if the decoder can tell
pub fn clip_length(bytes: &[u8]) -> Result<Option<f64>, AudioError> {
    let decoder = Decoder::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| AudioError::DecodeFailed(Box::new(e)))?;
    Ok(decoder.total_duration().map(|d| d.as_secs_f64()))
}

/// Builds [`RodioSource`]s that all play into one output stream
pub struct RodioFactory {
    stream_handle: OutputStreamHandle,
    clips: Arc<ClipBank>,
}

impl RodioFactory {
    /// Open the default output device. The returned stream must outlive
    /// every source the factory creates.
    pub fn try_default() -> Result<(OutputStream, Self), AudioError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| AudioError::StreamInitFailed(Box::new(e)))?;
        tracing::info!("Audio output stream initialized");
        Ok((
            stream,
            Self {
                stream_handle,
                clips: Arc::new(ClipBank::new()),
            },
        ))
    }

    pub fn clips(&self) -> Arc<ClipBank> {
        Arc::clone(&self.clips)
    }
}

impl SourceFactory for RodioFactory {
    fn create_source(&mut self) -> Box<dyn AudioSource> {
        Box::new(RodioSource::new(
            Some(self.stream_handle.clone()),
            Arc::clone(&self.clips),
        ))
    }
}

pub struct RodioSource {
    output: Option<OutputStreamHandle>,
    clips: Arc<ClipBank>,
    sink: Option<Sink>,
    clip: Option<AudioClip>,
    volume: f32,
    pitch: f32,
    looping: bool,
    spatial_blend: f32,
    muted: bool,
    spatial: Spatial3d,
    position: [f32; 3],
    active: bool,
    /// Looping flag of the decoder currently queued on the sink
    queued_looping: Option<bool>,
}

impl RodioSource {
    fn new(output: Option<OutputStreamHandle>, clips: Arc<ClipBank>) -> Self {
        let sink = new_sink(output.as_ref());
        Self {
            output,
            clips,
            sink,
            clip: None,
            volume: 1.0,
            pitch: 1.0,
            looping: false,
            spatial_blend: 0.0,
            muted: false,
            spatial: Spatial3d::default(),
            position: [0.0; 3],
            active: false,
            queued_looping: None,
        }
    }

    /// A source whose sink is not connected to any device
    pub fn detached(clips: Arc<ClipBank>) -> Self {
        Self::new(None, clips)
    }

    /// Stop whatever is queued and start over with an empty sink
    fn reset_sink(&mut self) {
        if let Some(sink) = &self.sink {
            sink.stop();
        }
        self.sink = new_sink(self.output.as_ref());
        self.queued_looping = None;
    }

    fn apply_volume(&self) {
        if let Some(sink) = &self.sink {
            sink.set_volume(if self.muted { 0.0 } else { self.volume });
        }
    }

    fn apply_speed(&self) {
        if let Some(sink) = &self.sink {
            // Rodio cannot play backwards
            sink.set_speed(self.pitch.abs().max(0.01));
        }
    }
}

fn new_sink(output: Option<&OutputStreamHandle>) -> Option<Sink> {
    match output {
        Some(handle) => match Sink::try_new(handle) {
            Ok(sink) => Some(sink),
            Err(e) => {
                tracing::warn!("Failed to create audio sink: {}", e);
                None
            }
        },
        None => Some(Sink::new_idle().0),
    }
}

impl AudioSource for RodioSource {
    fn set_clip(&mut self, clip: Option<&AudioClip>) {
        self.clip = clip.cloned();
    }

    fn clip(&self) -> Option<&AudioClip> {
        self.clip.as_ref()
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.apply_volume();
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(-3.0, 3.0);
        self.apply_speed();
    }

    fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Rodio decoders cannot change looping once queued, so a started clip
    /// is requeued from the beginning with the new flag
    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
        if self.queued_looping.is_some_and(|queued| queued != looping) {
            let paused = self.sink.as_ref().is_some_and(Sink::is_paused);
            tracing::debug!("Requeueing clip with looping = {}", looping);
            self.play();
            if paused {
                self.pause();
            }
        }
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
        self.apply_volume();
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn set_spatial_3d(&mut self, settings: Spatial3d) {
        self.spatial = settings.clamped();
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
        self.reset_sink();
        let Some(bytes) = self.clip.as_ref().and_then(|clip| self.clips.get(clip)) else {
            return;
        };
        let Some(sink) = &self.sink else {
            return;
        };

        let cursor = Cursor::new((*bytes).clone());
        let appended = if self.looping {
            Decoder::new_looped(cursor).map(|decoder| sink.append(decoder))
        } else {
            Decoder::new(cursor).map(|decoder| sink.append(decoder))
        };
        if let Err(e) = appended {
            let name = self.clip.as_ref().map_or("<none>", |clip| clip.name.as_str());
            tracing::warn!("Failed to decode {}: {}", name, e);
            return;
        }
        sink.play();

        self.queued_looping = Some(self.looping);
        self.apply_volume();
        self.apply_speed();
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn unpause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn stop(&mut self) {
        self.reset_sink();
    }

    fn is_playing(&self) -> bool {
        self.sink
            .as_ref()
            .is_some_and(|sink| !sink.empty() && !sink.is_paused())
    }
}
