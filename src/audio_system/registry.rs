/// Alive-instance registry
///
/// Owns every alive record, keyed by generational [`AliveId`]. Scans hand
/// out ID snapshots so callers can stop/dispose records while walking them.
use std::sync::Arc;

use slotmap::SlotMap;

use super::alive::{AliveAudioData, AliveId, PlayerId};
use super::catalog::{AudioClipContainer, CategoryId, ContainerId};
use super::source::SourceSlot;

#[derive(Debug, Default)]
pub struct AliveRegistry {
    records: SlotMap<AliveId, AliveAudioData>,
    next_sequence: u64,
    last_sweep: f64,
}

impl AliveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        container: Arc<AudioClipContainer>,
        source: SourceSlot,
        now: f64,
        player: PlayerId,
    ) -> AliveId {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.records
            .insert(AliveAudioData::new(container, source, now, player, sequence))
    }

    pub fn get(&self, id: AliveId) -> Option<&AliveAudioData> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: AliveId) -> Option<&mut AliveAudioData> {
        self.records.get_mut(id)
    }

    pub fn remove(&mut self, id: AliveId) -> Option<AliveAudioData> {
        self.records.remove(id)
    }

    pub fn contains(&self, id: AliveId) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stable snapshot of live IDs in start order, optionally limited to a
    /// category
    pub fn snapshot(&self, category: Option<CategoryId>) -> Vec<AliveId> {
        self.collect_sorted(|data| category.map_or(true, |c| data.category_id() == Some(c)))
    }

    /// Live instances of a container, oldest first
    pub fn for_container(&self, container: ContainerId) -> Vec<AliveId> {
        self.collect_sorted(|data| data.container_id() == Some(container))
    }

    /// Most recently started live instance of a container
    pub fn latest_for_container(&self, container: ContainerId) -> Option<AliveId> {
        self.records
            .iter()
            .filter(|(_, data)| data.container_id() == Some(container))
            .max_by_key(|(_, data)| data.sequence())
            .map(|(id, _)| id)
    }

    /// Live instances started by a player
    pub fn for_player(&self, player: PlayerId) -> Vec<AliveId> {
        self.collect_sorted(|data| data.player() == player)
    }

    /// The "dead" batch of a sweep: every record whose expiry has passed
    pub fn collect_dead(&self, now: f64, epsilon: f64) -> Vec<AliveId> {
        self.collect_sorted(|data| data.has_died(now, epsilon))
    }

    fn collect_sorted(&self, mut keep: impl FnMut(&AliveAudioData) -> bool) -> Vec<AliveId> {
        let mut matches: Vec<(u64, AliveId)> = self
            .records
            .iter()
            .filter(|&(_, data)| keep(data))
            .map(|(id, data)| (data.sequence(), id))
            .collect();
        matches.sort_unstable_by_key(|(sequence, _)| *sequence);
        matches.into_iter().map(|(_, id)| id).collect()
    }

    /// Whether a sweep is due; marks the sweep as done when it is
    pub fn sweep_due(&mut self, now: f64, interval: f64) -> bool {
        if now - self.last_sweep < interval {
            return false;
        }
        self.last_sweep = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::alive::NO_PLAYER;
    use crate::audio_system::catalog::AudioClip;
    use crate::audio_system::headless::HeadlessSource;

    fn container(id: ContainerId, category: CategoryId, length: f64) -> Arc<AudioClipContainer> {
        Arc::new(
            AudioClipContainer::new(id, AudioClip::new(format!("c{id}"), length))
                .with_category(category),
        )
    }

    fn source() -> SourceSlot {
        SourceSlot::Pooled(Box::new(HeadlessSource::new()))
    }

    #[test]
    fn test_simultaneous_instances_of_one_container() {
        let mut registry = AliveRegistry::new();
        let c = container(1, 1, 1.0);

        let first = registry.insert(Arc::clone(&c), source(), 0.0, NO_PLAYER);
        let second = registry.insert(Arc::clone(&c), source(), 0.5, NO_PLAYER);

        assert_ne!(first, second);
        assert_eq!(registry.for_container(1), vec![first, second]);
        assert_eq!(registry.latest_for_container(1), Some(second));
    }

    #[test]
    fn test_collect_dead() {
        let mut registry = AliveRegistry::new();
        let short = registry.insert(container(1, 1, 1.0), source(), 0.0, NO_PLAYER);
        let long = registry.insert(container(2, 1, 5.0), source(), 0.0, NO_PLAYER);

        assert!(registry.collect_dead(1.0, 0.1).is_empty());
        assert_eq!(registry.collect_dead(1.2, 0.1), vec![short]);
        assert_eq!(registry.collect_dead(6.0, 0.1), vec![short, long]);
    }

    #[test]
    fn test_snapshot_by_category() {
        let mut registry = AliveRegistry::new();
        let a = registry.insert(container(1, 1, 1.0), source(), 0.0, NO_PLAYER);
        let b = registry.insert(container(2, 2, 1.0), source(), 0.0, NO_PLAYER);

        assert_eq!(registry.snapshot(None), vec![a, b]);
        assert_eq!(registry.snapshot(Some(2)), vec![b]);
        assert!(registry.snapshot(Some(9)).is_empty());
    }

    #[test]
    fn test_removed_ids_are_stale() {
        let mut registry = AliveRegistry::new();
        let id = registry.insert(container(1, 1, 1.0), source(), 0.0, NO_PLAYER);

        assert!(registry.remove(id).is_some());
        assert!(!registry.contains(id));
        assert!(registry.remove(id).is_none());

        let reused_slot = registry.insert(container(1, 1, 1.0), source(), 0.0, NO_PLAYER);
        assert_ne!(id, reused_slot);
        assert!(registry.get(id).is_none());
    }

    #[test]
    fn test_sweep_cadence() {
        let mut registry = AliveRegistry::new();

        assert!(!registry.sweep_due(0.05, 0.1));
        assert!(registry.sweep_due(0.1, 0.1));
        assert!(!registry.sweep_due(0.15, 0.1));
        assert!(registry.sweep_due(0.25, 0.1));
    }
}
