/// Container catalog
///
/// Read-only lookup from container ID to immutable clip metadata. Built once
/// from a [`ContainerLibrary`] supplied by the asset loader; the library is
/// drained in the process so the catalog is the only owner afterwards.
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::AudioError;

pub type ContainerId = u32;
pub type CategoryId = u32;
pub type TagId = u32;

/// Reserved ID meaning "no category" / "no tag"
pub const NONE_ID: u32 = 0;

/// Reference to a piece of audio known to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioClip {
    /// Name used for logs and by backends that look clips up by name
    pub name: String,

    /// Length in seconds
    pub length: f64,

    /// File backing the clip, if the backend streams from disk
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AudioClip {
    pub fn new(name: impl Into<String>, length: f64) -> Self {
        Self {
            name: name.into(),
            length,
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

fn default_unit() -> f32 {
    1.0
}

/// Descriptor of a playable sound: clip plus mixing metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioClipContainer {
    pub id: ContainerId,
    pub clip: AudioClip,

    /// Base volume (0.0-1.0)
    #[serde(default = "default_unit")]
    pub base_volume: f32,

    /// Pitch (-3.0-3.0)
    #[serde(default = "default_unit")]
    pub pitch: f32,

    /// 2-D / 3-D blend (0.0-1.0)
    #[serde(default)]
    pub spatial_blend: f32,

    #[serde(default)]
    pub looping: bool,

    #[serde(default)]
    pub category_id: CategoryId,

    #[serde(default)]
    pub tag_id: TagId,
}

impl AudioClipContainer {
    /// Create a container with neutral mixing parameters
    pub fn new(id: ContainerId, clip: AudioClip) -> Self {
        Self {
            id,
            clip,
            base_volume: 1.0,
            pitch: 1.0,
            spatial_blend: 0.0,
            looping: false,
            category_id: NONE_ID,
            tag_id: NONE_ID,
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.base_volume = volume.clamp(0.0, 1.0);
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch.clamp(-3.0, 3.0);
        self
    }

    pub fn with_spatial_blend(mut self, blend: f32) -> Self {
        self.spatial_blend = blend.clamp(0.0, 1.0);
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = category_id;
        self
    }

    pub fn with_tag(mut self, tag_id: TagId) -> Self {
        self.tag_id = tag_id;
        self
    }

    /// Clamp every ranged field. Applied to everything entering the catalog,
    /// since deserialized assets bypass the builder setters.
    pub fn sanitized(mut self) -> Self {
        self.base_volume = clamp_or(self.base_volume, 0.0, 1.0, 1.0);
        self.pitch = clamp_or(self.pitch, -3.0, 3.0, 1.0);
        self.spatial_blend = clamp_or(self.spatial_blend, 0.0, 1.0, 0.0);
        if !(self.clip.length.is_finite() && self.clip.length >= 0.0) {
            self.clip.length = 0.0;
        }
        self
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

/// Draw a random ID that is not in `existing`.
///
/// IDs are drawn uniformly from `1..=u32::MAX` (0 is reserved) and redrawn on
/// collision, at most `max_attempts` times.
pub fn generate_unique_id<R: Rng + ?Sized>(
    existing: &HashSet<ContainerId>,
    rng: &mut R,
    max_attempts: u32,
) -> Result<ContainerId, AudioError> {
    for _ in 0..max_attempts {
        let candidate = rng.gen_range(1..=u32::MAX);
        if !existing.contains(&candidate) {
            return Ok(candidate);
        }
    }
    Err(AudioError::IdSpaceExhausted {
        attempts: max_attempts,
    })
}

/// Mutable list of containers as produced by tooling / the asset loader
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerLibrary {
    pub containers: Vec<AudioClipContainer>,
}

impl ContainerLibrary {
    pub fn new(containers: Vec<AudioClipContainer>) -> Self {
        Self { containers }
    }

    pub fn ids(&self) -> HashSet<ContainerId> {
        self.containers.iter().map(|c| c.id).collect()
    }

    /// Create a container for `clip` with default parameters and a fresh ID
    pub fn add_clip<R: Rng + ?Sized>(
        &mut self,
        clip: AudioClip,
        rng: &mut R,
        max_attempts: u32,
    ) -> Result<ContainerId, AudioError> {
        let id = generate_unique_id(&self.ids(), rng, max_attempts)?;
        self.containers.push(AudioClipContainer::new(id, clip));
        Ok(id)
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }
}

/// Immutable container lookup
#[derive(Debug, Default)]
pub struct ContainerCatalog {
    containers: Vec<Arc<AudioClipContainer>>,
    by_id: HashMap<ContainerId, usize>,
    by_tag: HashMap<TagId, Vec<usize>>,
    by_category: HashMap<CategoryId, Vec<usize>>,
}

impl ContainerCatalog {
    /// Build the catalog, taking every container out of `library`
    pub fn from_library(library: &mut ContainerLibrary) -> Self {
        Self::from_containers(std::mem::take(&mut library.containers))
    }

    pub fn from_containers(containers: Vec<AudioClipContainer>) -> Self {
        let mut catalog = Self::default();

        for container in containers {
            if catalog.by_id.contains_key(&container.id) {
                tracing::warn!(
                    "Duplicate container ID {} ({}), keeping the first one",
                    container.id,
                    container.clip.name
                );
                continue;
            }

            let container = container.sanitized();
            let index = catalog.containers.len();
            catalog.by_id.insert(container.id, index);
            catalog
                .by_tag
                .entry(container.tag_id)
                .or_default()
                .push(index);
            catalog
                .by_category
                .entry(container.category_id)
                .or_default()
                .push(index);
            catalog.containers.push(Arc::new(container));
        }

        tracing::debug!("Container catalog built with {} entries", catalog.len());
        catalog
    }

    pub fn get_by_id(&self, id: ContainerId) -> Option<Arc<AudioClipContainer>> {
        self.by_id
            .get(&id)
            .map(|&index| Arc::clone(&self.containers[index]))
    }

    pub fn get_by_tag(&self, tag_id: TagId) -> Vec<Arc<AudioClipContainer>> {
        self.collect(self.by_tag.get(&tag_id))
    }

    pub fn get_by_category(&self, category_id: CategoryId) -> Vec<Arc<AudioClipContainer>> {
        self.collect(self.by_category.get(&category_id))
    }

    fn collect(&self, indices: Option<&Vec<usize>>) -> Vec<Arc<AudioClipContainer>> {
        indices
            .map(|indices| {
                indices
                    .iter()
                    .map(|&index| Arc::clone(&self.containers[index]))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contains(&self, id: ContainerId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Whether `container` is this catalog's own entry rather than a caller-built copy
    pub fn owns(&self, container: &Arc<AudioClipContainer>) -> bool {
        self.by_id
            .get(&container.id)
            .is_some_and(|&index| Arc::ptr_eq(&self.containers[index], container))
    }

    pub fn ids(&self) -> HashSet<ContainerId> {
        self.by_id.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<AudioClipContainer>> {
        self.containers.iter()
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}
