//! Presentation states.
//!
//! Exactly one [`State`] is live per machine. States are plain values: the
//! reducer replaces them wholesale and never mutates one in place, except for
//! the [`StepMetadata`] bag a `BeginningStep` owns while its metadata is
//! being produced.

use super::dismiss::DismissContinuation;
use crate::experience::Experience;
use crate::traits::Metadata;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Metadata bag attached to a step while it is prepared and rendered.
///
/// A fresh bag is created for every `BeginningStep`; the following
/// `RenderingStep` carries the same bag.
#[derive(Clone, Default)]
pub struct StepMetadata(Arc<RwLock<Metadata>>);

impl StepMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Metadata {
        match self.0.read() {
            Ok(metadata) => metadata.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        match self.0.read() {
            Ok(metadata) => metadata.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        }
    }

    pub fn replace(&self, metadata: Metadata) {
        match self.0.write() {
            Ok(mut slot) => *slot = metadata,
            Err(poisoned) => *poisoned.into_inner() = metadata,
        }
    }
}

impl PartialEq for StepMetadata {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.snapshot() == other.snapshot()
    }
}

impl fmt::Debug for StepMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StepMetadata").field(&self.snapshot()).finish()
    }
}

/// Where the machine is in an experience's lifecycle.
#[derive(Clone, PartialEq, Debug)]
pub enum State {
    /// No active experience
    Idling,

    /// Experience accepted, about to begin its first step
    BeginningExperience { experience: Arc<Experience> },

    /// About to present a step
    BeginningStep {
        experience: Arc<Experience>,
        flat_step_index: usize,
        is_first: bool,
        metadata: StepMetadata,
    },

    /// Step UI is live and interactive
    RenderingStep {
        experience: Arc<Experience>,
        flat_step_index: usize,
        is_first: bool,
        metadata: StepMetadata,
    },

    /// Step is tearing down. With a `dismiss` continuation the machine waits
    /// for the UI to resume it before moving on.
    EndingStep {
        experience: Arc<Experience>,
        flat_step_index: usize,
        mark_complete: bool,
        dismiss: Option<DismissContinuation>,
    },

    /// Experience is tearing down
    EndingExperience {
        experience: Arc<Experience>,
        flat_step_index: usize,
        mark_complete: bool,
        track_analytics: bool,
    },
}

impl State {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idling => "Idling",
            Self::BeginningExperience { .. } => "BeginningExperience",
            Self::BeginningStep { .. } => "BeginningStep",
            Self::RenderingStep { .. } => "RenderingStep",
            Self::EndingStep { .. } => "EndingStep",
            Self::EndingExperience { .. } => "EndingExperience",
        }
    }

    /// The owning experience; `None` only while idling.
    pub fn experience(&self) -> Option<&Arc<Experience>> {
        match self {
            Self::Idling => None,
            Self::BeginningExperience { experience }
            | Self::BeginningStep { experience, .. }
            | Self::RenderingStep { experience, .. }
            | Self::EndingStep { experience, .. }
            | Self::EndingExperience { experience, .. } => Some(experience),
        }
    }

    /// Flat index of the current step, in step-bearing states.
    pub fn current_step_index(&self) -> Option<usize> {
        match self {
            Self::Idling | Self::BeginningExperience { .. } => None,
            Self::BeginningStep {
                flat_step_index, ..
            }
            | Self::RenderingStep {
                flat_step_index, ..
            }
            | Self::EndingStep {
                flat_step_index, ..
            }
            | Self::EndingExperience {
                flat_step_index, ..
            } => Some(*flat_step_index),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idling)
    }

    /// Pending dismiss continuation, when the machine is waiting on the UI.
    pub fn dismiss_continuation(&self) -> Option<&DismissContinuation> {
        match self {
            Self::EndingStep {
                dismiss: Some(dismiss),
                ..
            } => Some(dismiss),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            name: self.name().to_string(),
            experience_id: self.experience().map(|e| e.id),
            flat_step_index: self.current_step_index(),
        }
    }
}

/// Serializable summary of a state, used for history and diagnostics.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub name: String,
    pub experience_id: Option<Uuid>,
    pub flat_step_index: Option<usize>,
}

impl StateSnapshot {
    pub fn idling() -> Self {
        State::Idling.snapshot()
    }
}
