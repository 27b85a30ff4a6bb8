/// Audio system module
///
/// Pooled playback of short-lived clip instances:
/// - A catalog of clip containers addressed by numeric ID, tag or category
/// - A pool of reusable playback sources that grows on demand
/// - Alive instances that expire after their clip length plus paused time
/// - Category and master volume/mute pushed live to every instance
/// - Timed tasks (volume tweens, emitter following) and effect chains
///
/// ## Architecture
///
/// ```text
/// AudioSystem
///   ├── ContainerCatalog   (id / tag / category lookups)
///   ├── AudioSettings      (master + category mix)
///   ├── SourcePool ── SourceFactory (rodio / headless)
///   ├── AliveRegistry      (AliveId -> AliveAudioData)
///   └── TaskList           (tweens, follow emitter)
///
/// ClipPlayer
///   ├── PlaySource (containers / IDs / random by tag)
///   └── EffectChain
///       ├── TweenVolumeEffect
///       ├── SetPitchEffect / RandomizePitchEffect
///       ├── OverrideSpatialBlendEffect / Override3dEffect
///       └── OverrideLoopEffect
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// use pooled_audio::audio_system::{AudioSystem, HeadlessFactory};
///
/// let mut system = AudioSystem::new(SystemConfig::default(), Box::new(HeadlessFactory::new()));
/// system.begin_loading(spawn_json_loader(settings_path, library_path));
///
/// // Once per frame
/// system.update(frame_time);
///
/// if let Some(id) = system.play_id(1001) {
///     system.set_instance_pitch(id, 1.1);
/// }
/// ```

pub mod alive;
pub mod catalog;
pub mod effects;
pub mod headless;
pub mod manager;
pub mod player;
pub mod pool;
pub mod registry;
pub mod rodio_backend;
pub mod settings;
pub mod source;
pub mod tasks;

// Re-export commonly used types
pub use alive::{AliveAudioData, AliveId, PlayerId, NO_PLAYER};
pub use catalog::{
    generate_unique_id, AudioClip, AudioClipContainer, CategoryId, ContainerCatalog, ContainerId,
    ContainerLibrary, TagId, NONE_ID,
};
pub use effects::{AudioEffect, Effect, EffectChain};
pub use headless::{HeadlessFactory, HeadlessSource};
pub use manager::{AudioSystem, PlayOptions};
pub use player::{ClipPlayer, PlaySource, PlayerState, Selection};
pub use pool::SourcePool;
pub use rodio_backend::{ClipBank, RodioFactory, RodioSource};
pub use settings::{AudioCategory, AudioSettings, SettingsChange};
pub use source::{AudioSource, RolloffMode, SharedSource, SourceFactory, SourceSlot, Spatial3d};
pub use tasks::{Emitter, TaskId, TaskKind};
