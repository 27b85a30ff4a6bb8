/// State management module
///
/// Explicit readiness of the audio system.

pub mod readiness;

// Re-export commonly used types
pub use readiness::{ReadinessMachine, ReadinessState, TransitionError};
