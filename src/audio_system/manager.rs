/// Audio system manager
///
/// Turns play requests into pooled, tracked instances; reclaims them when
/// they expire; pushes settings changes to everything alive. Runs on one
/// logical timeline: the host calls [`AudioSystem::update`] once per tick and
/// other threads talk to it through the command queue.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;

use super::alive::{AliveAudioData, AliveId, PlayerId, NO_PLAYER};
use super::catalog::{
    generate_unique_id, AudioClipContainer, CategoryId, ContainerCatalog, ContainerId, NONE_ID,
};
use super::pool::SourcePool;
use super::registry::AliveRegistry;
use super::settings::{AudioSettings, SettingsChange};
use super::source::{AudioSource, SharedSource, SourceFactory, SourceSlot, Spatial3d};
use super::tasks::{Emitter, TaskId, TaskKind, TaskList, TimedTask};
use crate::config::SystemConfig;
use crate::error::AudioError;
use crate::loader::{LoadResult, LoadedAssets, PendingLoad};
use crate::messaging::{AudioCommand, AudioEvent, CommandQueue, EventBus, Subscription};
use crate::state::{ReadinessMachine, ReadinessState};

/// Per-request options for [`AudioSystem::play_with`]
#[derive(Clone, Default)]
pub struct PlayOptions {
    /// Play on this caller-owned source instead of a pooled one
    pub source: Option<SharedSource>,

    /// Player component that issued the request
    pub player: PlayerId,
}

impl PlayOptions {
    pub fn for_player(player: PlayerId) -> Self {
        Self {
            source: None,
            player,
        }
    }

    pub fn on_source(source: SharedSource) -> Self {
        Self {
            source: Some(source),
            player: NO_PLAYER,
        }
    }
}

/// Audio system manager
pub struct AudioSystem {
    config: SystemConfig,
    readiness: ReadinessMachine,
    pending: Option<PendingLoad>,
    factory: Option<Box<dyn SourceFactory>>,
    pool: Option<SourcePool>,
    catalog: ContainerCatalog,
    settings: AudioSettings,
    registry: AliveRegistry,
    tasks: TaskList,
    bus: EventBus,
    commands: CommandQueue,
    now: f64,
    warned_not_ready: bool,
}

impl AudioSystem {
    /// Create a system that is not ready yet. Sources are constructed with
    /// `factory` once the settings tell how large the pool starts.
    pub fn new(config: SystemConfig, factory: Box<dyn SourceFactory>) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                tracing::warn!("{}, using default configuration", e);
                SystemConfig::default()
            }
        };

        Self {
            config,
            readiness: ReadinessMachine::new(),
            pending: None,
            factory: Some(factory),
            pool: None,
            catalog: ContainerCatalog::default(),
            settings: AudioSettings::default(),
            registry: AliveRegistry::new(),
            tasks: TaskList::new(),
            bus: EventBus::new(),
            commands: CommandQueue::new(),
            now: 0.0,
            warned_not_ready: false,
        }
    }

    // ----------------------------------------------------------------------
    // Readiness
    // ----------------------------------------------------------------------

    pub fn readiness(&self) -> ReadinessState {
        self.readiness.state()
    }

    pub fn is_ready(&self) -> bool {
        self.readiness.state().is_ready()
    }

    /// Wait for `pending` on subsequent ticks
    pub fn begin_loading(&mut self, pending: PendingLoad) {
        match self.readiness.begin_loading() {
            Ok(()) => {
                tracing::info!("Audio assets loading");
                self.pending = Some(pending);
            }
            Err(e) => tracing::warn!("Ignoring asset load: {}", e),
        }
    }

    /// Install assets right away
    pub fn load(&mut self, assets: LoadedAssets) {
        if self.is_ready() {
            tracing::warn!("Ignoring asset load: audio system is already ready");
            return;
        }
        if !self.readiness.state().is_loading() {
            let _ = self.readiness.begin_loading();
        }
        self.pending = None;
        self.finish_loading(Ok(assets));
    }

    /// Drop an in-flight load and go back to NotReady
    pub fn cancel_loading(&mut self) {
        if self.pending.take().is_some() || self.readiness.state().is_loading() {
            tracing::info!("Audio asset loading cancelled");
            self.readiness.reset();
        }
    }

    fn poll_loading(&mut self) {
        let Some(result) = self.pending.as_ref().and_then(PendingLoad::poll) else {
            return;
        };
        self.pending = None;
        self.finish_loading(result);
    }

    fn finish_loading(&mut self, result: LoadResult) {
        let assets = match result {
            Ok(assets) => assets,
            Err(e) => {
                tracing::warn!("Audio asset loading failed: {}, continuing with defaults", e);
                LoadedAssets::default()
            }
        };

        let settings = match assets.settings {
            Some(settings) => settings,
            None => {
                tracing::warn!("No audio settings available, using defaults");
                AudioSettings {
                    pool_start_size: self.config.default_pool_start_size,
                    ..AudioSettings::default()
                }
            }
        };
        self.settings = settings.sanitized();

        self.catalog = match assets.library {
            Some(mut library) => ContainerCatalog::from_library(&mut library),
            None => {
                tracing::warn!("No container library available, catalog is empty");
                ContainerCatalog::default()
            }
        };

        if self.pool.is_none() {
            if let Some(factory) = self.factory.take() {
                self.pool = Some(SourcePool::new(factory, self.settings.pool_start_size));
            }
        }

        if let Err(e) = self.readiness.mark_ready() {
            tracing::warn!("Unexpected readiness transition: {}", e);
        }
        self.warned_not_ready = false;

        tracing::info!(
            "Audio system ready: {} containers, {} categories, pool of {}",
            self.catalog.len(),
            self.settings.categories.len(),
            self.settings.pool_start_size
        );
        self.bus.publish(AudioEvent::Ready);
    }

    /// Log once per not-ready period; returns whether the system is ready
    fn ensure_ready(&mut self, action: &str) -> bool {
        if self.is_ready() {
            return true;
        }
        if !self.warned_not_ready {
            tracing::warn!(
                "Audio system not ready ({}), ignoring {}",
                self.readiness.state().description(),
                action
            );
            self.warned_not_ready = true;
        }
        false
    }

    // ----------------------------------------------------------------------
    // Tick
    // ----------------------------------------------------------------------

    /// Advance simulated time by `delta` and run everything that is due:
    /// asset polling, queued commands, timed tasks and the reclamation sweep.
    pub fn update(&mut self, delta: Duration) {
        let dt = delta.as_secs_f64();
        self.now += dt;

        self.poll_loading();

        let commands = self.commands.drain();
        if !commands.is_empty() {
            tracing::debug!("Draining {} audio commands", commands.len());
        }
        for command in commands {
            self.execute(command);
        }

        self.tasks.advance(dt, &mut self.registry, &self.settings);

        if self.registry.sweep_due(self.now, self.config.sweep_interval) {
            self.sweep();
        }
    }

    /// Reclaim every instance whose expiry has passed. Returns how many.
    pub fn sweep(&mut self) -> usize {
        let dead = self
            .registry
            .collect_dead(self.now, self.config.epsilon());
        let count = dead.len();
        for id in dead {
            self.reclaim(id);
        }
        if count > 0 {
            tracing::debug!("Sweep reclaimed {} audio instances", count);
        }
        count
    }

    /// Remove from the live set, release the source, announce the death.
    fn reclaim(&mut self, id: AliveId) -> bool {
        let Some(mut record) = self.registry.remove(id) else {
            return false;
        };
        self.tasks.cancel_for(id);

        let container = record.container_id().unwrap_or(NONE_ID);
        let player = record.player();

        if let Some(mut slot) = record.dispose() {
            slot.with(|source| {
                source.stop();
                source.set_clip(None);
            });
            if let SourceSlot::Pooled(source) = slot {
                if let Some(pool) = self.pool.as_mut() {
                    pool.release(source);
                }
            }
        }

        self.bus.publish(AudioEvent::Died {
            id,
            container,
            player,
        });
        true
    }

    /// Simulated seconds since creation
    pub fn now(&self) -> f64 {
        self.now
    }

    // ----------------------------------------------------------------------
    // Playback
    // ----------------------------------------------------------------------

    pub fn play(&mut self, container: &Arc<AudioClipContainer>) -> Option<AliveId> {
        self.play_with(container, PlayOptions::default())
    }

    pub fn play_id(&mut self, container: ContainerId) -> Option<AliveId> {
        self.play_id_with(container, PlayOptions::default())
    }

    /// Play on a caller-owned source. The source is never pooled.
    pub fn play_on_source(
        &mut self,
        container: &Arc<AudioClipContainer>,
        source: SharedSource,
    ) -> Option<AliveId> {
        self.play_with(container, PlayOptions::on_source(source))
    }

    pub fn play_id_with(&mut self, container: ContainerId, options: PlayOptions) -> Option<AliveId> {
        if !self.ensure_ready("play request") {
            return None;
        }
        match self.catalog.get_by_id(container) {
            Some(resolved) => self.play_with(&resolved, options),
            None => {
                tracing::warn!("Unknown audio container ID {}", container);
                None
            }
        }
    }

    pub fn play_with(
        &mut self,
        container: &Arc<AudioClipContainer>,
        options: PlayOptions,
    ) -> Option<AliveId> {
        if !self.ensure_ready("play request") {
            return None;
        }

        let container = if self.catalog.owns(container) {
            Arc::clone(container)
        } else {
            Arc::new(AudioClipContainer::clone(container).sanitized())
        };

        let slot = match options.source {
            Some(shared) => SourceSlot::External(shared),
            None => SourceSlot::Pooled(self.pool.as_mut()?.acquire()),
        };

        let id = self
            .registry
            .insert(Arc::clone(&container), slot, self.now, options.player);
        let record = self.registry.get_mut(id)?;

        if let Some(source) = record.source_mut() {
            source.with(|s| {
                s.set_clip(Some(&container.clip));
                s.set_pitch(container.pitch);
                s.set_looping(container.looping);
                s.set_spatial_blend(container.spatial_blend);
                s.set_active(true);
            });
        }
        record.refresh_mix(&self.settings);
        if let Some(source) = record.source_mut() {
            source.with(|s| s.play());
        }

        tracing::debug!("Playing {} (container {})", container.clip.name, container.id);
        self.bus.publish(AudioEvent::Started {
            id,
            container: container.id,
            player: options.player,
        });
        Some(id)
    }

    /// No-op for unknown, disposed or already paused instances
    pub fn pause(&mut self, id: AliveId) -> bool {
        let now = self.now;
        self.registry
            .get_mut(id)
            .map(|record| record.pause(now))
            .unwrap_or(false)
    }

    /// No-op for unknown, disposed or playing instances
    pub fn resume(&mut self, id: AliveId) -> bool {
        let now = self.now;
        self.registry
            .get_mut(id)
            .map(|record| record.resume(now))
            .unwrap_or(false)
    }

    /// Stop and dispose an instance. Safe to call repeatedly.
    pub fn stop(&mut self, id: AliveId) -> bool {
        self.reclaim(id)
    }

    /// Stop every instance, or every instance of one category
    pub fn kill_all(&mut self, category: Option<CategoryId>) -> usize {
        self.registry
            .snapshot(category)
            .into_iter()
            .filter(|&id| self.reclaim(id))
            .count()
    }

    pub fn pause_all(&mut self, category: Option<CategoryId>) -> usize {
        self.registry
            .snapshot(category)
            .into_iter()
            .filter(|&id| self.pause(id))
            .count()
    }

    pub fn resume_all(&mut self, category: Option<CategoryId>) -> usize {
        self.registry
            .snapshot(category)
            .into_iter()
            .filter(|&id| self.resume(id))
            .count()
    }

    // ----------------------------------------------------------------------
    // Queries
    // ----------------------------------------------------------------------

    pub fn get(&self, id: AliveId) -> Option<&AliveAudioData> {
        self.registry.get(id)
    }

    pub fn is_alive(&self, id: AliveId) -> bool {
        self.registry.contains(id)
    }

    /// True once the instance is gone or past its expiry, even if the sweep
    /// has not reclaimed it yet
    pub fn has_died(&self, id: AliveId) -> bool {
        self.registry
            .get(id)
            .map(|record| record.has_died(self.now, self.config.epsilon()))
            .unwrap_or(true)
    }

    /// Live instances of a container, oldest first
    pub fn alive_datas(&self, container: ContainerId) -> Vec<AliveId> {
        self.registry.for_container(container)
    }

    /// Most recently started live instance of a container
    pub fn latest_alive(&self, container: ContainerId) -> Option<AliveId> {
        self.registry.latest_for_container(container)
    }

    pub fn alive_of_player(&self, player: PlayerId) -> Vec<AliveId> {
        self.registry.for_player(player)
    }

    pub fn alive_count(&self) -> usize {
        self.registry.len()
    }

    pub fn catalog(&self) -> &ContainerCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &AudioSettings {
        &self.settings
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Random container ID not used by the catalog, drawn at most
    /// `max_id_attempts` times
    pub fn generate_container_id(&self) -> Result<ContainerId, AudioError> {
        generate_unique_id(
            &self.catalog.ids(),
            &mut rand::thread_rng(),
            self.config.max_id_attempts,
        )
    }

    /// `None` until the system first became ready
    pub fn pool(&self) -> Option<&SourcePool> {
        self.pool.as_ref()
    }

    // ----------------------------------------------------------------------
    // Per-instance parameters
    // ----------------------------------------------------------------------

    fn with_source<R>(&mut self, id: AliveId, f: impl FnOnce(&mut dyn AudioSource) -> R) -> Option<R> {
        self.registry.get_mut(id)?.source_mut().map(|slot| slot.with(f))
    }

    fn inspect_source<R>(&self, id: AliveId, f: impl FnOnce(&dyn AudioSource) -> R) -> Option<R> {
        self.registry.get(id)?.source().map(|slot| slot.inspect(f))
    }

    /// Set the runtime volume and re-derive the mix
    pub fn set_instance_volume(&mut self, id: AliveId, volume: f32) -> bool {
        let Some(record) = self.registry.get_mut(id) else {
            return false;
        };
        record.set_volume(volume);
        record.refresh_mix(&self.settings).is_some()
    }

    /// Runtime volume before category and master attenuation
    pub fn instance_volume(&self, id: AliveId) -> Option<f32> {
        self.registry.get(id).map(AliveAudioData::volume)
    }

    /// Volume currently applied to the instance's source
    pub fn effective_volume(&self, id: AliveId) -> Option<f32> {
        self.inspect_source(id, |s| s.volume())
    }

    pub fn is_instance_muted(&self, id: AliveId) -> Option<bool> {
        self.inspect_source(id, |s| s.is_muted())
    }

    pub fn set_instance_pitch(&mut self, id: AliveId, pitch: f32) -> bool {
        let pitch = pitch.clamp(-3.0, 3.0);
        self.with_source(id, |s| s.set_pitch(pitch)).is_some()
    }

    pub fn instance_pitch(&self, id: AliveId) -> Option<f32> {
        self.inspect_source(id, |s| s.pitch())
    }

    pub fn set_instance_spatial_blend(&mut self, id: AliveId, blend: f32) -> bool {
        let blend = blend.clamp(0.0, 1.0);
        self.with_source(id, |s| s.set_spatial_blend(blend)).is_some()
    }

    pub fn instance_spatial_blend(&self, id: AliveId) -> Option<f32> {
        self.inspect_source(id, |s| s.spatial_blend())
    }

    /// Loop state also decides expiry: a looping instance never expires
    pub fn set_instance_looping(&mut self, id: AliveId, looping: bool) -> bool {
        let Some(record) = self.registry.get_mut(id) else {
            return false;
        };
        record.set_looping(looping);
        if let Some(source) = record.source_mut() {
            source.with(|s| s.set_looping(looping));
        }
        true
    }

    pub fn set_instance_3d(&mut self, id: AliveId, settings: Spatial3d) -> bool {
        let settings = settings.clamped();
        self.with_source(id, |s| s.set_spatial_3d(settings)).is_some()
    }

    pub fn instance_3d(&self, id: AliveId) -> Option<Spatial3d> {
        self.inspect_source(id, |s| s.spatial_3d())
    }

    pub fn set_instance_position(&mut self, id: AliveId, position: [f32; 3]) -> bool {
        self.with_source(id, |s| s.set_position(position)).is_some()
    }

    pub fn instance_position(&self, id: AliveId) -> Option<[f32; 3]> {
        self.inspect_source(id, |s| s.position())
    }

    // ----------------------------------------------------------------------
    // Timed tasks
    // ----------------------------------------------------------------------

    /// Ramp the runtime volume to `to` over `duration` seconds, starting at
    /// `from` (or the current runtime volume). Replaces a running tween.
    pub fn start_volume_tween(
        &mut self,
        id: AliveId,
        from: Option<f32>,
        to: f32,
        duration: f64,
    ) -> Option<TaskId> {
        let record = self.registry.get_mut(id)?;
        let start = match from {
            Some(volume) => {
                record.set_volume(volume);
                record.refresh_mix(&self.settings);
                record.volume()
            }
            None => record.volume(),
        };

        self.tasks.cancel_kind_for(id, TaskKind::VolumeTween);
        Some(
            self.tasks
                .add(TimedTask::volume_tween(id, start, to, duration)),
        )
    }

    pub fn cancel_volume_tween(&mut self, id: AliveId) -> usize {
        self.tasks.cancel_kind_for(id, TaskKind::VolumeTween)
    }

    /// Keep the instance's source at the emitter's position until either of
    /// them goes away
    pub fn follow_emitter(&mut self, id: AliveId, emitter: &Emitter) -> Option<TaskId> {
        let position = *emitter.read();
        self.with_source(id, |s| s.set_position(position))?;

        self.tasks.cancel_kind_for(id, TaskKind::FollowEmitter);
        Some(self.tasks.add(TimedTask::follow_emitter(id, emitter)))
    }

    pub fn cancel_tasks(&mut self, id: AliveId) -> usize {
        self.tasks.cancel_for(id)
    }

    pub fn task_count(&self, id: AliveId) -> usize {
        self.tasks.count_for(id)
    }

    // ----------------------------------------------------------------------
    // Settings propagation
    // ----------------------------------------------------------------------

    pub fn set_master_volume(&mut self, volume: f32) {
        if !self.ensure_ready("master volume change") {
            return;
        }
        let change = self.settings.set_master_volume(volume);
        self.propagate(change);
    }

    /// Returns false for unknown categories
    pub fn set_category_volume(&mut self, category: CategoryId, volume: f32) -> bool {
        if !self.ensure_ready("category volume change") {
            return false;
        }
        match self.settings.set_category_volume(category, volume) {
            Some(change) => {
                self.propagate(change);
                true
            }
            None => {
                tracing::warn!("Unknown audio category {}", category);
                false
            }
        }
    }

    pub fn set_category_muted(&mut self, category: CategoryId, muted: bool) -> bool {
        if !self.ensure_ready("category mute change") {
            return false;
        }
        match self.settings.set_category_muted(category, muted) {
            Some(change) => {
                self.propagate(change);
                true
            }
            None => {
                tracing::warn!("Unknown audio category {}", category);
                false
            }
        }
    }

    /// Name-based variant for tooling
    pub fn set_category_volume_by_name(&mut self, name: &str, volume: f32) -> bool {
        match self.settings.category_by_name(name).map(|c| c.id) {
            Some(id) => self.set_category_volume(id, volume),
            None => {
                tracing::warn!("Unknown audio category '{}'", name);
                false
            }
        }
    }

    pub fn set_category_muted_by_name(&mut self, name: &str, muted: bool) -> bool {
        match self.settings.category_by_name(name).map(|c| c.id) {
            Some(id) => self.set_category_muted(id, muted),
            None => {
                tracing::warn!("Unknown audio category '{}'", name);
                false
            }
        }
    }

    /// Re-derive volume and mute of every alive instance the change touches
    fn propagate(&mut self, change: SettingsChange) {
        let mut refreshed = 0;
        for id in self.registry.snapshot(None) {
            let Some(record) = self.registry.get_mut(id) else {
                continue;
            };
            let affected = record
                .category_id()
                .is_some_and(|category| change.affects(category));
            if affected && record.refresh_mix(&self.settings).is_some() {
                refreshed += 1;
            }
        }
        tracing::debug!("{:?} refreshed {} audio instances", change, refreshed);
        self.bus.publish(AudioEvent::SettingsChanged(change));
    }

    // ----------------------------------------------------------------------
    // Messaging
    // ----------------------------------------------------------------------

    /// Subscribe to started/died/settings events. Dropping the subscription
    /// unsubscribes.
    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    /// Sender for other threads; commands run on the next `update`
    pub fn command_sender(&self) -> Sender<AudioCommand> {
        self.commands.sender()
    }

    pub fn execute(&mut self, command: AudioCommand) {
        tracing::debug!("Executing audio command: {}", command.description());
        match command {
            AudioCommand::Play { container, player } => {
                self.play_id_with(container, PlayOptions::for_player(player));
            }
            AudioCommand::Stop(id) => {
                self.stop(id);
            }
            AudioCommand::KillAll(category) => {
                self.kill_all(category);
            }
            AudioCommand::PauseAll(category) => {
                self.pause_all(category);
            }
            AudioCommand::ResumeAll(category) => {
                self.resume_all(category);
            }
            AudioCommand::SetMasterVolume(volume) => self.set_master_volume(volume),
            AudioCommand::SetCategoryVolume { category, volume } => {
                self.set_category_volume(category, volume);
            }
            AudioCommand::SetCategoryMuted { category, muted } => {
                self.set_category_muted(category, muted);
            }
        }
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        let stopped = self.kill_all(None);
        if stopped > 0 {
            tracing::debug!("Stopped {} audio instances on shutdown", stopped);
        }
    }
}
