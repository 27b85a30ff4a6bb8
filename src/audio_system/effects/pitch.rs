/// Pitch effects
///
/// Fixed or randomized pitch override for a single instance.
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Effect;
use crate::audio_system::alive::AliveId;
use crate::audio_system::manager::AudioSystem;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetPitchEffect {
    pub pitch: f32,
}

impl SetPitchEffect {
    pub fn new(pitch: f32) -> Self {
        Self {
            pitch: pitch.clamp(-3.0, 3.0),
        }
    }
}

impl Default for SetPitchEffect {
    fn default() -> Self {
        Self { pitch: 1.0 }
    }
}

impl Effect for SetPitchEffect {
    fn apply(&self, system: &mut AudioSystem, target: AliveId) {
        system.set_instance_pitch(target, self.pitch);
    }

    fn remove(&self, _system: &mut AudioSystem, _target: AliveId) {}
}

/// Random pitch in `[min_pitch, max_pitch]`, drawn on every apply
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomizePitchEffect {
    pub min_pitch: f32,
    pub max_pitch: f32,
}

impl RandomizePitchEffect {
    pub fn new(min_pitch: f32, max_pitch: f32) -> Self {
        let min_pitch = min_pitch.clamp(-3.0, 3.0);
        let max_pitch = max_pitch.clamp(-3.0, 3.0);
        Self {
            min_pitch: min_pitch.min(max_pitch),
            max_pitch: min_pitch.max(max_pitch),
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max_pitch <= self.min_pitch {
            return self.min_pitch;
        }
        rng.gen_range(self.min_pitch..=self.max_pitch)
    }
}

impl Default for RandomizePitchEffect {
    fn default() -> Self {
        Self {
            min_pitch: 0.98,
            max_pitch: 1.02,
        }
    }
}

impl Effect for RandomizePitchEffect {
    fn apply(&self, system: &mut AudioSystem, target: AliveId) {
        let pitch = self.sample(&mut rand::thread_rng());
        system.set_instance_pitch(target, pitch);
    }

    fn remove(&self, _system: &mut AudioSystem, _target: AliveId) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_set_pitch_clamping() {
        assert_eq!(SetPitchEffect::new(5.0).pitch, 3.0);
        assert_eq!(SetPitchEffect::new(-5.0).pitch, -3.0);
    }

    #[test]
    fn test_random_pitch_within_range() {
        let effect = RandomizePitchEffect::default();
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..100 {
            let pitch = effect.sample(&mut rng);
            assert!((0.98..=1.02).contains(&pitch));
        }
    }

    #[test]
    fn test_random_pitch_swapped_bounds() {
        let effect = RandomizePitchEffect::new(1.5, 0.5);
        assert_eq!(effect.min_pitch, 0.5);
        assert_eq!(effect.max_pitch, 1.5);
    }

    #[test]
    fn test_degenerate_range() {
        let effect = RandomizePitchEffect::new(1.2, 1.2);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(effect.sample(&mut rng), 1.2);
    }
}
