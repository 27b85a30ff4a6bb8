/// Command types for the audio system
///
/// Commands represent requests to perform actions (imperative). Other
/// threads send them; the audio system drains them on its own tick.
use crate::audio_system::alive::{AliveId, PlayerId};
use crate::audio_system::catalog::{CategoryId, ContainerId};

/// Audio system commands
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
    /// Play a catalog container
    Play {
        container: ContainerId,
        player: PlayerId,
    },

    /// Stop one alive instance
    Stop(AliveId),

    /// Stop every alive instance, optionally only one category
    KillAll(Option<CategoryId>),

    PauseAll(Option<CategoryId>),

    ResumeAll(Option<CategoryId>),

    SetMasterVolume(f32),

    SetCategoryVolume { category: CategoryId, volume: f32 },

    SetCategoryMuted { category: CategoryId, muted: bool },
}

impl AudioCommand {
    /// Get a human-readable description of the command
    pub fn description(&self) -> String {
        match self {
            AudioCommand::Play { container, .. } => format!("Play container {}", container),
            AudioCommand::Stop(_) => "Stop instance".to_string(),
            AudioCommand::KillAll(category) => scoped("Kill all", category),
            AudioCommand::PauseAll(category) => scoped("Pause all", category),
            AudioCommand::ResumeAll(category) => scoped("Resume all", category),
            AudioCommand::SetMasterVolume(volume) => format!("Set master volume: {}", volume),
            AudioCommand::SetCategoryVolume { category, volume } => {
                format!("Set category {} volume: {}", category, volume)
            }
            AudioCommand::SetCategoryMuted { category, muted } => {
                format!("Set category {} muted: {}", category, muted)
            }
        }
    }
}

fn scoped(action: &str, category: &Option<CategoryId>) -> String {
    match category {
        Some(category) => format!("{} in category {}", action, category),
        None => action.to_string(),
    }
}
