/// Messaging module for Event/Command architecture
///
/// - **Events**: notifications of things that happened in the audio system
///   (instance started/died, settings changed), broadcast to subscribers
/// - **Commands**: requests from other threads, queued and drained on the
///   audio system's own tick
///
/// ## Architecture
///
/// ```text
/// ┌──────────┐   AudioCommand   ┌──────────────┐   AudioEvent   ┌───────────┐
/// │ Any      │ ───────────────> │ CommandQueue │ ─── update ──> │ Event Bus │
/// │ thread   │                  │  (drained    │                │           │
/// └──────────┘                  │   per tick)  │                └───────────┘
///                               └──────────────┘                      │
///                                                                     ▼
///                                                              ┌──────────────┐
///                                                              │ Subscription │
///                                                              │ (players,    │
///                                                              │  effects)    │
///                                                              └──────────────┘
/// ```

pub mod bus;
pub mod commands;
pub mod events;
pub mod executor;

// Re-export commonly used types
pub use bus::{EventBus, SubscriberId, Subscription};
pub use commands::AudioCommand;
pub use events::AudioEvent;
pub use executor::CommandQueue;
