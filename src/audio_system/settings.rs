/// Category volume / mute table and master volume
///
/// Setters clamp their input, mutate the record and report what changed so
/// the manager can re-derive the mix of every affected alive instance.
use serde::{Deserialize, Serialize};

use super::catalog::{CategoryId, TagId, NONE_ID};

fn default_unit() -> f32 {
    1.0
}

fn default_pool_start_size() -> usize {
    20
}

/// Named volume/mute group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioCategory {
    pub name: String,
    pub id: CategoryId,

    /// Volume multiplier (0.0-1.0)
    #[serde(default = "default_unit")]
    pub volume: f32,

    #[serde(default)]
    pub muted: bool,
}

impl AudioCategory {
    pub fn new(name: impl Into<String>, id: CategoryId) -> Self {
        Self {
            name: name.into(),
            id,
            volume: 1.0,
            muted: false,
        }
    }
}

/// What a settings mutation touched
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingsChange {
    MasterVolume(f32),
    CategoryVolume { category: CategoryId, volume: f32 },
    CategoryMuted { category: CategoryId, muted: bool },
}

impl SettingsChange {
    /// Whether instances of `category` need their mix refreshed
    pub fn affects(&self, category: CategoryId) -> bool {
        match self {
            SettingsChange::MasterVolume(_) => true,
            SettingsChange::CategoryVolume { category: c, .. }
            | SettingsChange::CategoryMuted { category: c, .. } => *c == category,
        }
    }
}

/// Mixing settings shared by every alive instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Master volume multiplier (0.0-1.0)
    #[serde(default = "default_unit")]
    pub master_volume: f32,

    #[serde(default)]
    pub categories: Vec<AudioCategory>,

    /// Tag names, addressed by index
    #[serde(default)]
    pub tags: Vec<String>,

    /// Number of sources the pool constructs up front
    #[serde(default = "default_pool_start_size")]
    pub pool_start_size: usize,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            categories: Vec::new(),
            tags: Vec::new(),
            pool_start_size: default_pool_start_size(),
        }
    }
}

impl AudioSettings {
    pub fn with_category(mut self, category: AudioCategory) -> Self {
        self.categories.push(category);
        self
    }

    /// Clamp ranged fields and drop categories whose ID is already taken.
    /// Duplicates are a configuration error worth one warning each.
    pub fn sanitized(mut self) -> Self {
        self.master_volume = clamp01(self.master_volume);

        let mut seen = std::collections::HashSet::new();
        self.categories.retain(|category| {
            if seen.insert(category.id) {
                true
            } else {
                tracing::warn!(
                    "Duplicate category ID {} ({}), ignoring it",
                    category.id,
                    category.name
                );
                false
            }
        });
        for category in &mut self.categories {
            category.volume = clamp01(category.volume);
        }
        self
    }

    /// Category lookup by ID. ID 0 means "no category" and never matches.
    pub fn category(&self, id: CategoryId) -> Option<&AudioCategory> {
        if id == NONE_ID {
            return None;
        }
        self.categories.iter().find(|c| c.id == id)
    }

    fn category_mut(&mut self, id: CategoryId) -> Option<&mut AudioCategory> {
        if id == NONE_ID {
            return None;
        }
        self.categories.iter_mut().find(|c| c.id == id)
    }

    pub fn category_by_name(&self, name: &str) -> Option<&AudioCategory> {
        if name.is_empty() {
            return None;
        }
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn tag_name(&self, tag: TagId) -> Option<&str> {
        self.tags.get(tag as usize).map(String::as_str)
    }

    pub fn tag_id_by_name(&self, name: &str) -> Option<TagId> {
        self.tags
            .iter()
            .position(|t| t == name)
            .and_then(|index| TagId::try_from(index).ok())
    }

    pub fn set_master_volume(&mut self, volume: f32) -> SettingsChange {
        self.master_volume = clamp01(volume);
        SettingsChange::MasterVolume(self.master_volume)
    }

    /// Returns `None` when the category does not exist
    pub fn set_category_volume(
        &mut self,
        category: CategoryId,
        volume: f32,
    ) -> Option<SettingsChange> {
        let entry = self.category_mut(category)?;
        entry.volume = clamp01(volume);
        Some(SettingsChange::CategoryVolume {
            category,
            volume: entry.volume,
        })
    }

    pub fn set_category_muted(&mut self, category: CategoryId, muted: bool) -> Option<SettingsChange> {
        let entry = self.category_mut(category)?;
        entry.muted = muted;
        Some(SettingsChange::CategoryMuted { category, muted })
    }

    /// Volume multiplier of a category; unknown categories don't attenuate
    pub fn category_volume(&self, category: CategoryId) -> f32 {
        self.category(category).map(|c| c.volume).unwrap_or(1.0)
    }

    pub fn is_category_muted(&self, category: CategoryId) -> bool {
        self.category(category).map(|c| c.muted).unwrap_or(false)
    }

    /// baseVolume x categoryVolume x masterVolume, clamped to 0.0-1.0
    pub fn effective_volume(&self, base_volume: f32, category: CategoryId) -> f32 {
        clamp01(base_volume * self.category_volume(category) * self.master_volume)
    }
}

fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AudioSettings {
        AudioSettings::default()
            .with_category(AudioCategory::new("SFX", 1))
            .with_category(AudioCategory::new("Music", 2))
    }

    #[test]
    fn test_effective_volume_formula() {
        let mut settings = settings();
        assert_eq!(settings.effective_volume(0.8, 1), 0.8);

        settings.set_category_volume(1, 0.5);
        assert!((settings.effective_volume(0.8, 1) - 0.4).abs() < 1e-6);

        settings.set_master_volume(0.5);
        assert!((settings.effective_volume(0.8, 1) - 0.2).abs() < 1e-6);
        assert!((settings.effective_volume(0.8, 2) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_setters_clamp() {
        let mut settings = settings();

        assert_eq!(
            settings.set_category_volume(1, 3.0),
            Some(SettingsChange::CategoryVolume {
                category: 1,
                volume: 1.0
            })
        );
        assert_eq!(
            settings.set_master_volume(-1.0),
            SettingsChange::MasterVolume(0.0)
        );
    }

    #[test]
    fn test_unknown_category_is_neutral() {
        let mut settings = settings();

        assert!(settings.set_category_volume(99, 0.1).is_none());
        assert!(settings.set_category_muted(NONE_ID, true).is_none());
        assert_eq!(settings.category_volume(99), 1.0);
        assert!(!settings.is_category_muted(NONE_ID));
    }

    #[test]
    fn test_change_affects() {
        let change = SettingsChange::CategoryMuted {
            category: 2,
            muted: true,
        };
        assert!(change.affects(2));
        assert!(!change.affects(1));
        assert!(SettingsChange::MasterVolume(0.3).affects(7));
    }

    #[test]
    fn test_name_lookups() {
        let mut settings = settings();
        settings.tags = vec!["None".into(), "Footsteps".into()];

        assert_eq!(settings.category_by_name("Music").map(|c| c.id), Some(2));
        assert!(settings.category_by_name("").is_none());
        assert_eq!(settings.tag_id_by_name("Footsteps"), Some(1));
        assert_eq!(settings.tag_name(1), Some("Footsteps"));
        assert!(settings.tag_name(5).is_none());
    }

    #[test]
    fn test_sanitize_drops_duplicate_categories() {
        let mut settings = settings().with_category(AudioCategory::new("SFX again", 1));
        settings.master_volume = 2.0;
        let settings = settings.sanitized();

        assert_eq!(settings.categories.len(), 2);
        assert_eq!(settings.master_volume, 1.0);
        assert_eq!(settings.category(1).map(|c| c.name.as_str()), Some("SFX"));
    }
}
