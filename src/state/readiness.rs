/// Readiness state machine
///
/// The audio system serves play requests only once both the catalog and the
/// settings are available. Loading may finish on a different schedule than
/// the requests, so readiness is an explicit state.

use std::time::Instant;

/// Readiness of the audio system
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ReadinessState {
    /// Nothing loaded and no load in flight
    #[default]
    NotReady,

    /// Assets are being loaded
    Loading { since: Instant },

    /// Catalog and settings are available
    Ready,
}

impl ReadinessState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ReadinessState::Ready)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ReadinessState::Loading { .. })
    }

    /// Get the time spent loading so far (if loading)
    pub fn loading_duration(&self) -> Option<std::time::Duration> {
        match self {
            ReadinessState::Loading { since } => Some(since.elapsed()),
            _ => None,
        }
    }

    /// Get a human-readable description of the state
    pub fn description(&self) -> &'static str {
        match self {
            ReadinessState::NotReady => "Not ready",
            ReadinessState::Loading { .. } => "Loading...",
            ReadinessState::Ready => "Ready",
        }
    }
}

/// State transition results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// Cannot start loading once ready
    AlreadyReady,

    /// Cannot start a second load while one is in flight
    AlreadyLoading,

    /// Cannot become ready without loading first
    NotLoading,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionError::AlreadyReady => write!(f, "Audio system is already ready"),
            TransitionError::AlreadyLoading => write!(f, "Audio assets are already loading"),
            TransitionError::NotLoading => write!(f, "No asset load in progress"),
        }
    }
}

impl std::error::Error for TransitionError {}

/// State machine for readiness transitions
#[derive(Debug, Default)]
pub struct ReadinessMachine {
    state: ReadinessState,
}

impl ReadinessMachine {
    /// Create a new state machine in the NotReady state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current state
    pub fn state(&self) -> ReadinessState {
        self.state
    }

    /// Transition NotReady -> Loading
    pub fn begin_loading(&mut self) -> Result<(), TransitionError> {
        match self.state {
            ReadinessState::NotReady => {
                self.state = ReadinessState::Loading {
                    since: Instant::now(),
                };
                Ok(())
            }
            ReadinessState::Loading { .. } => Err(TransitionError::AlreadyLoading),
            ReadinessState::Ready => Err(TransitionError::AlreadyReady),
        }
    }

    /// Transition Loading -> Ready
    pub fn mark_ready(&mut self) -> Result<(), TransitionError> {
        match self.state {
            ReadinessState::Loading { .. } => {
                self.state = ReadinessState::Ready;
                Ok(())
            }
            ReadinessState::Ready => Err(TransitionError::AlreadyReady),
            ReadinessState::NotReady => Err(TransitionError::NotLoading),
        }
    }

    /// Back to NotReady (cancelled load, teardown)
    pub fn reset(&mut self) {
        self.state = ReadinessState::NotReady;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_predicates() {
        assert!(!ReadinessState::NotReady.is_ready());
        assert!(ReadinessState::Ready.is_ready());

        let loading = ReadinessState::Loading {
            since: Instant::now(),
        };
        assert!(loading.is_loading());
        assert!(loading.loading_duration().is_some());
        assert!(ReadinessState::Ready.loading_duration().is_none());
    }

    #[test]
    fn test_state_machine_transitions() {
        let mut sm = ReadinessMachine::new();
        assert_eq!(sm.state(), ReadinessState::NotReady);

        // Cannot become ready without loading
        assert_eq!(sm.mark_ready(), Err(TransitionError::NotLoading));

        assert!(sm.begin_loading().is_ok());
        assert!(sm.state().is_loading());
        assert_eq!(sm.begin_loading(), Err(TransitionError::AlreadyLoading));

        assert!(sm.mark_ready().is_ok());
        assert_eq!(sm.state(), ReadinessState::Ready);
        assert_eq!(sm.begin_loading(), Err(TransitionError::AlreadyReady));
    }

    #[test]
    fn test_reset() {
        let mut sm = ReadinessMachine::new();
        sm.begin_loading().unwrap();

        sm.reset();
        assert_eq!(sm.state(), ReadinessState::NotReady);
        assert!(sm.begin_loading().is_ok());
    }
}
