/// Loop override
use serde::{Deserialize, Serialize};

use super::Effect;
use crate::audio_system::alive::AliveId;
use crate::audio_system::manager::AudioSystem;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OverrideLoopEffect {
    pub looped: bool,
}

impl OverrideLoopEffect {
    pub fn new(looped: bool) -> Self {
        Self { looped }
    }
}

impl Effect for OverrideLoopEffect {
    fn apply(&self, system: &mut AudioSystem, target: AliveId) {
        system.set_instance_looping(target, self.looped);
    }

    fn remove(&self, _system: &mut AudioSystem, _target: AliveId) {}
}
