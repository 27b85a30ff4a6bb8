/// Timed tasks
///
/// Per-instance work that spans several ticks: volume tweens and following a
/// moving emitter. Driven by the same tick as the reclamation sweep. A task
/// ends when it completes, when its target is no longer alive, or when it is
/// cancelled.
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use slotmap::{new_key_type, SlotMap};

use super::alive::AliveId;
use super::registry::AliveRegistry;
use super::settings::AudioSettings;

new_key_type! {
    /// A unique identifier for a timed task.
    pub struct TaskId;
}

/// Shared world position of something a sound should follow
pub type Emitter = Arc<RwLock<[f32; 3]>>;

/// The kind of task, for targeted cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    VolumeTween,
    FollowEmitter,
}

#[derive(Debug)]
pub enum TimedTask {
    /// Linear ramp of the runtime volume
    VolumeTween {
        target: AliveId,
        from: f32,
        to: f32,
        duration: f64,
        elapsed: f64,
    },

    /// Copy the emitter position to the source every tick. Holds the emitter
    /// weakly so a despawned emitter ends the task.
    FollowEmitter {
        target: AliveId,
        emitter: Weak<RwLock<[f32; 3]>>,
    },
}

impl TimedTask {
    pub fn volume_tween(target: AliveId, from: f32, to: f32, duration: f64) -> Self {
        TimedTask::VolumeTween {
            target,
            from: from.clamp(0.0, 1.0),
            to: to.clamp(0.0, 1.0),
            duration: duration.max(0.0),
            elapsed: 0.0,
        }
    }

    pub fn follow_emitter(target: AliveId, emitter: &Emitter) -> Self {
        TimedTask::FollowEmitter {
            target,
            emitter: Arc::downgrade(emitter),
        }
    }

    pub fn target(&self) -> AliveId {
        match self {
            TimedTask::VolumeTween { target, .. } | TimedTask::FollowEmitter { target, .. } => *target,
        }
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            TimedTask::VolumeTween { .. } => TaskKind::VolumeTween,
            TimedTask::FollowEmitter { .. } => TaskKind::FollowEmitter,
        }
    }

    /// Advance by `dt` seconds. Returns true when the task is finished.
    fn step(&mut self, dt: f64, registry: &mut AliveRegistry, settings: &AudioSettings) -> bool {
        let Some(record) = registry.get_mut(self.target()) else {
            // Target disposed
            return true;
        };

        match self {
            TimedTask::VolumeTween {
                from,
                to,
                duration,
                elapsed,
                ..
            } => {
                if record.is_paused() {
                    return false;
                }
                *elapsed += dt;
                let progress = if *duration <= 0.0 {
                    1.0
                } else {
                    (*elapsed / *duration).min(1.0)
                };
                let volume = *from + (*to - *from) * progress as f32;
                record.set_volume(volume);
                record.refresh_mix(settings);
                progress >= 1.0
            }
            TimedTask::FollowEmitter { emitter, .. } => {
                let Some(emitter) = emitter.upgrade() else {
                    return true;
                };
                let position = *emitter.read();
                match record.source_mut() {
                    Some(source) => {
                        source.with(|s| s.set_position(position));
                        false
                    }
                    None => true,
                }
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct TaskList {
    tasks: SlotMap<TaskId, TimedTask>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, task: TimedTask) -> TaskId {
        self.tasks.insert(task)
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.tasks.remove(id).is_some()
    }

    /// Cancel every task of `target`. Returns how many were cancelled.
    pub fn cancel_for(&mut self, target: AliveId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, task| task.target() != target);
        before - self.tasks.len()
    }

    pub fn cancel_kind_for(&mut self, target: AliveId, kind: TaskKind) -> usize {
        let before = self.tasks.len();
        self.tasks
            .retain(|_, task| !(task.target() == target && task.kind() == kind));
        before - self.tasks.len()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn count_for(&self, target: AliveId) -> usize {
        self.tasks.values().filter(|t| t.target() == target).count()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Step every task once, dropping those that finished
    pub fn advance(&mut self, dt: f64, registry: &mut AliveRegistry, settings: &AudioSettings) {
        self.tasks
            .retain(|_, task| !task.step(dt, registry, settings));
    }
}
