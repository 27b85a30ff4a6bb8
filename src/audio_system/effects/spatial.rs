/// Spatial overrides
///
/// Replace the spatial blend or the 3-D settings of a single instance.
use serde::{Deserialize, Serialize};

use super::Effect;
use crate::audio_system::alive::AliveId;
use crate::audio_system::manager::AudioSystem;
use crate::audio_system::source::Spatial3d;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OverrideSpatialBlendEffect {
    pub spatial_blend: f32,
}

impl OverrideSpatialBlendEffect {
    pub fn new(spatial_blend: f32) -> Self {
        Self {
            spatial_blend: spatial_blend.clamp(0.0, 1.0),
        }
    }
}

impl Effect for OverrideSpatialBlendEffect {
    fn apply(&self, system: &mut AudioSystem, target: AliveId) {
        system.set_instance_spatial_blend(target, self.spatial_blend);
    }

    fn remove(&self, _system: &mut AudioSystem, _target: AliveId) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Override3dEffect {
    pub settings: Spatial3d,
}

impl Override3dEffect {
    pub fn new(settings: Spatial3d) -> Self {
        Self { settings }
    }
}

impl Effect for Override3dEffect {
    fn apply(&self, system: &mut AudioSystem, target: AliveId) {
        system.set_instance_3d(target, self.settings);
    }

    fn remove(&self, _system: &mut AudioSystem, _target: AliveId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_blend_clamping() {
        assert_eq!(OverrideSpatialBlendEffect::new(1.5).spatial_blend, 1.0);
        assert_eq!(OverrideSpatialBlendEffect::new(-0.5).spatial_blend, 0.0);
    }
}
