/// Event types for the audio system
///
/// Events represent things that have happened (past tense).
/// They are broadcast to all subscribers.
use crate::audio_system::alive::{AliveId, PlayerId};
use crate::audio_system::catalog::ContainerId;
use crate::audio_system::settings::SettingsChange;

/// Audio system events
#[derive(Debug, Clone)]
pub enum AudioEvent {
    /// Catalog and settings are available; play requests are served
    Ready,

    /// An alive instance started playing
    Started {
        id: AliveId,
        container: ContainerId,
        player: PlayerId,
    },

    /// An alive instance was stopped or reclaimed. Its source has already
    /// been released when this is published.
    Died {
        id: AliveId,
        container: ContainerId,
        player: PlayerId,
    },

    /// A settings setter ran and the mix of affected instances was refreshed
    SettingsChanged(SettingsChange),
}

impl AudioEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            AudioEvent::Ready => "Audio system ready".to_string(),
            AudioEvent::Started { container, .. } => {
                format!("Started container {}", container)
            }
            AudioEvent::Died { container, .. } => {
                format!("Container {} died", container)
            }
            AudioEvent::SettingsChanged(change) => {
                format!("Settings changed: {:?}", change)
            }
        }
    }

    /// The alive instance this event refers to, if any
    pub fn alive_id(&self) -> Option<AliveId> {
        match self {
            AudioEvent::Started { id, .. } | AudioEvent::Died { id, .. } => Some(*id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_description() {
        assert_eq!(AudioEvent::Ready.description(), "Audio system ready");

        let event = AudioEvent::Died {
            id: AliveId::default(),
            container: 42,
            player: 0,
        };
        assert_eq!(event.description(), "Container 42 died");
        assert_eq!(event.alive_id(), Some(AliveId::default()));
    }
}
