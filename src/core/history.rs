//! State transition history tracking.
//!
//! Keeps an immutable, serializable record of the states a machine moved
//! through, for diagnostics and debugging tools.

use super::state::StateSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single state swap.
///
/// # Example
///
/// ```rust
/// use experience_engine::core::{StateSnapshot, StateTransition};
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: StateSnapshot::idling(),
///     to: StateSnapshot {
///         name: "BeginningExperience".to_string(),
///         experience_id: None,
///         flat_step_index: None,
///     },
///     action: "StartExperience".to_string(),
///     timestamp: Utc::now(),
/// };
/// assert_eq!(transition.from.name, "Idling");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state being left
    pub from: StateSnapshot,
    /// The state being entered
    pub to: StateSnapshot,
    /// Name of the action that caused the swap
    pub action: String,
    /// When the swap happened
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of state transitions, oldest first.
///
/// History is immutable - `record` returns a new history with the transition
/// added. When a limit is set, the oldest transitions are dropped to stay
/// within it.
///
/// # Example
///
/// ```rust
/// use experience_engine::core::{StateHistory, StateSnapshot, StateTransition};
/// use chrono::Utc;
///
/// let snapshot = |name: &str| StateSnapshot {
///     name: name.to_string(),
///     experience_id: None,
///     flat_step_index: None,
/// };
///
/// let history = StateHistory::new()
///     .record(StateTransition {
///         from: snapshot("Idling"),
///         to: snapshot("BeginningExperience"),
///         action: "StartExperience".to_string(),
///         timestamp: Utc::now(),
///     })
///     .record(StateTransition {
///         from: snapshot("BeginningExperience"),
///         to: snapshot("BeginningStep"),
///         action: "StartStep".to_string(),
///         timestamp: Utc::now(),
///     });
///
/// let path: Vec<_> = history.get_path().iter().map(|s| s.name.as_str()).collect();
/// assert_eq!(path, vec!["Idling", "BeginningExperience", "BeginningStep"]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StateHistory {
    transitions: Vec<StateTransition>,
    limit: Option<usize>,
}

impl StateHistory {
    /// Create a new, unbounded, empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty history that keeps at most `limit` transitions.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            transitions: Vec::new(),
            limit: Some(limit),
        }
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, transition: StateTransition) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);

        if let Some(limit) = self.limit {
            let excess = transitions.len().saturating_sub(limit);
            transitions.drain(..excess);
        }

        Self {
            transitions,
            limit: self.limit,
        }
    }

    /// Get the path of states traversed: the first `from`, then every `to`.
    pub fn get_path(&self) -> Vec<&StateSnapshot> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Time between the first and last recorded transition.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// All recorded transitions, oldest first.
    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }
}
