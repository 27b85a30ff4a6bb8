/// Clip player
///
/// A reusable component that picks a container, plays it through the
/// [`AudioSystem`], applies its effect chain to the new instance and keeps
/// track of the one instance it currently owns.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::alive::{AliveId, PlayerId};
use super::catalog::{AudioClipContainer, ContainerId, TagId};
use super::effects::EffectChain;
use super::manager::{AudioSystem, PlayOptions};
use super::tasks::Emitter;
use crate::messaging::{AudioEvent, Subscription};
use crate::utils::{random_element, RoundRobin};

static NEXT_PLAYER_ID: AtomicU64 = AtomicU64::new(1);

/// Where a player gets its containers from
#[derive(Debug, Clone)]
pub enum PlaySource {
    /// Containers held directly
    Containers(Vec<Arc<AudioClipContainer>>),

    /// Container IDs resolved through the catalog on every play
    ContainerIds(Vec<ContainerId>),

    /// Any catalog container carrying this tag
    RandomByTag(TagId),
}

/// How the next container is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Random,
    /// In order, wrapping around
    Sequential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Playing,
    Paused,
}

pub struct ClipPlayer {
    id: PlayerId,
    source: PlaySource,
    selection: Selection,
    effects: EffectChain,
    emitter: Option<Emitter>,
    current: Option<AliveId>,
    cursor: RoundRobin,
    events: Option<Subscription>,
}

impl ClipPlayer {
    pub fn new(source: PlaySource) -> Self {
        Self {
            id: NEXT_PLAYER_ID.fetch_add(1, Ordering::Relaxed),
            source,
            selection: Selection::default(),
            effects: EffectChain::none(),
            emitter: None,
            current: None,
            cursor: RoundRobin::new(),
            events: None,
        }
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_effects(mut self, effects: EffectChain) -> Self {
        self.effects = effects;
        self
    }

    /// Keep played instances positioned at `emitter`
    pub fn with_emitter(mut self, emitter: Emitter) -> Self {
        self.emitter = Some(emitter);
        self
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn current(&self) -> Option<AliveId> {
        self.current
    }

    pub fn effects(&self) -> &EffectChain {
        &self.effects
    }

    /// Start a new instance unless the current one is still playing.
    /// Returns the instance the player now owns.
    pub fn play(&mut self, system: &mut AudioSystem) -> Option<AliveId> {
        self.poll_events();
        if self.is_playing(system) {
            return self.current;
        }

        // Subscribe before starting so the instance's death cannot be missed
        self.current = None;
        self.events = None;
        let events = system.subscribe();

        let options = PlayOptions::for_player(self.id);
        let played = match self.pick(system) {
            Some(container) => system.play_with(&container, options),
            None => None,
        };

        let Some(id) = played else {
            tracing::warn!("Player {} failed to play an audio clip", self.id);
            return None;
        };

        self.current = Some(id);
        self.events = Some(events);
        self.effects.apply(system, id);
        if let Some(emitter) = &self.emitter {
            system.follow_emitter(id, emitter);
        }
        Some(id)
    }

    fn pick(&mut self, system: &AudioSystem) -> Option<Arc<AudioClipContainer>> {
        match &self.source {
            PlaySource::Containers(containers) => {
                choose(self.selection, &mut self.cursor, containers).cloned()
            }
            PlaySource::ContainerIds(ids) => {
                let id = *choose(self.selection, &mut self.cursor, ids)?;
                let container = system.catalog().get_by_id(id);
                if container.is_none() {
                    tracing::warn!("Player {}: unknown container ID {}", self.id, id);
                }
                container
            }
            PlaySource::RandomByTag(tag) => {
                let tagged = system.catalog().get_by_tag(*tag);
                choose(self.selection, &mut self.cursor, &tagged).cloned()
            }
        }
    }

    pub fn pause(&mut self, system: &mut AudioSystem) -> bool {
        self.current.is_some_and(|id| system.pause(id))
    }

    pub fn resume(&mut self, system: &mut AudioSystem) -> bool {
        self.current.is_some_and(|id| system.resume(id))
    }

    /// Undo the effects, then stop and release the current instance
    pub fn stop(&mut self, system: &mut AudioSystem) -> bool {
        self.events = None;
        let Some(id) = self.current.take() else {
            return false;
        };
        self.effects.remove(system, id);
        system.stop(id)
    }

    pub fn is_playing(&self, system: &AudioSystem) -> bool {
        self.current.is_some_and(|id| !system.has_died(id))
    }

    pub fn state(&self, system: &AudioSystem) -> PlayerState {
        let Some(id) = self.current else {
            return PlayerState::Idle;
        };
        if system.has_died(id) {
            return PlayerState::Idle;
        }
        match system.get(id) {
            Some(record) if record.is_paused() => PlayerState::Paused,
            Some(_) => PlayerState::Playing,
            None => PlayerState::Idle,
        }
    }

    /// Forget the current instance once the system reports it died.
    /// The subscription is only held while the player owns an instance.
    pub fn poll_events(&mut self) {
        let Some(events) = &self.events else {
            return;
        };
        let current = self.current;
        let finished = events
            .try_iter()
            .any(|event| matches!(event, AudioEvent::Died { id, .. } if current == Some(id)));

        if finished {
            tracing::debug!("Player {} instance finished", self.id);
            self.current = None;
            self.events = None;
        }
    }

    /// Events queued for this player and not yet polled
    pub fn pending_events(&self) -> usize {
        self.events.as_ref().map_or(0, Subscription::pending)
    }
}

fn choose<'a, T>(selection: Selection, cursor: &mut RoundRobin, items: &'a [T]) -> Option<&'a T> {
    match selection {
        Selection::Random => random_element(items, &mut rand::thread_rng()),
        Selection::Sequential => cursor.next_index(items.len()).and_then(|i| items.get(i)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::catalog::{AudioClip, ContainerLibrary};
    use crate::audio_system::headless::HeadlessFactory;
    use crate::audio_system::settings::AudioSettings;
    use crate::config::SystemConfig;
    use crate::loader::LoadedAssets;
    use parking_lot::RwLock;
    use std::time::Duration;

    const FOOTSTEP: TagId = 4;

    fn system() -> AudioSystem {
        let library = ContainerLibrary::new(vec![
            AudioClipContainer::new(1, AudioClip::new("step_a", 0.5)).with_tag(FOOTSTEP),
            AudioClipContainer::new(2, AudioClip::new("step_b", 0.5)).with_tag(FOOTSTEP),
            AudioClipContainer::new(3, AudioClip::new("music", 60.0)).with_looping(true),
        ]);
        let mut system = AudioSystem::new(SystemConfig::default(), Box::new(HeadlessFactory::new()));
        system.load(LoadedAssets::new(AudioSettings::default(), library));
        system
    }

    fn tick(system: &mut AudioSystem, seconds: f64) {
        let steps = (seconds / 0.05).round() as usize;
        for _ in 0..steps {
            system.update(Duration::from_millis(50));
        }
    }

    #[test]
    fn test_player_ids_are_unique() {
        let a = ClipPlayer::new(PlaySource::ContainerIds(vec![1]));
        let b = ClipPlayer::new(PlaySource::ContainerIds(vec![1]));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_play_tags_instance_with_player() {
        let mut system = system();
        let mut player = ClipPlayer::new(PlaySource::ContainerIds(vec![3]));

        let id = player.play(&mut system).unwrap();
        assert_eq!(system.get(id).unwrap().player(), player.id());
        assert_eq!(player.state(&system), PlayerState::Playing);

        // Still playing: no second instance
        assert_eq!(player.play(&mut system), Some(id));
        assert_eq!(system.alive_count(), 1);
    }

    #[test]
    fn test_sequential_selection_wraps() {
        let mut system = system();
        let mut player = ClipPlayer::new(PlaySource::ContainerIds(vec![1, 2]))
            .with_selection(Selection::Sequential);

        let mut played = Vec::new();
        for _ in 0..3 {
            let id = player.play(&mut system).unwrap();
            played.push(system.get(id).unwrap().container_id().unwrap());
            player.stop(&mut system);
        }
        assert_eq!(played, vec![1, 2, 1]);
    }

    #[test]
    fn test_random_by_tag_picks_tagged() {
        let mut system = system();
        let mut player = ClipPlayer::new(PlaySource::RandomByTag(FOOTSTEP));

        for _ in 0..10 {
            let id = player.play(&mut system).unwrap();
            let container = system.get(id).unwrap().container_id().unwrap();
            assert!(container == 1 || container == 2);
            player.stop(&mut system);
        }
    }

    #[test]
    fn test_unknown_tag_fails_gracefully() {
        let mut system = system();
        let mut player = ClipPlayer::new(PlaySource::RandomByTag(99));
        assert!(player.play(&mut system).is_none());
        assert_eq!(player.state(&system), PlayerState::Idle);
    }

    #[test]
    fn test_pause_resume_state() {
        let mut system = system();
        let mut player = ClipPlayer::new(PlaySource::ContainerIds(vec![3]));
        player.play(&mut system);

        assert!(player.pause(&mut system));
        assert_eq!(player.state(&system), PlayerState::Paused);
        assert!(player.resume(&mut system));
        assert_eq!(player.state(&system), PlayerState::Playing);
    }

    #[test]
    fn test_instance_death_clears_current() {
        let mut system = system();
        let mut player = ClipPlayer::new(PlaySource::ContainerIds(vec![1]));
        player.play(&mut system).unwrap();

        tick(&mut system, 1.0);
        player.poll_events();

        assert!(player.current().is_none());
        assert_eq!(player.state(&system), PlayerState::Idle);
        assert!(player.play(&mut system).is_some());
    }

    #[test]
    fn test_idle_player_holds_no_event_backlog() {
        let mut system = system();
        let mut player = ClipPlayer::new(PlaySource::ContainerIds(vec![1]));

        player.play(&mut system).unwrap();
        let other = system.play_id(2).unwrap();
        system.stop(other);
        assert!(player.pending_events() > 0);

        player.stop(&mut system);
        for _ in 0..1000 {
            let id = system.play_id(2).unwrap();
            system.stop(id);
        }
        assert_eq!(player.pending_events(), 0);

        // Natural death releases the subscription too
        player.play(&mut system).unwrap();
        tick(&mut system, 1.0);
        player.poll_events();
        for _ in 0..1000 {
            let id = system.play_id(2).unwrap();
            system.stop(id);
        }
        assert_eq!(player.pending_events(), 0);
        assert!(player.current().is_none());

        // And a fresh play still sees its own instance die
        let id = player.play(&mut system).unwrap();
        system.stop(id);
        player.poll_events();
        assert!(player.current().is_none());
    }

    #[test]
    fn test_effects_and_emitter_applied() {
        let mut system = system();
        let emitter: Emitter = Arc::new(RwLock::new([0.0, 2.0, 0.0]));
        let mut player = ClipPlayer::new(PlaySource::ContainerIds(vec![3]))
            .with_effects(EffectChain::none().with_pitch(1.5).with_fade_in(1.0, 2.0))
            .with_emitter(Arc::clone(&emitter));

        let id = player.play(&mut system).unwrap();
        assert_eq!(system.instance_pitch(id), Some(1.5));
        assert_eq!(system.task_count(id), 2);

        *emitter.write() = [5.0, 0.0, 0.0];
        system.update(Duration::from_millis(16));
        assert_eq!(system.instance_position(id), Some([5.0, 0.0, 0.0]));

        assert!(player.stop(&mut system));
        assert_eq!(system.task_count(id), 0);
        assert!(!player.stop(&mut system));
    }
}
