//! Errors reported by the state machine.

use super::state::State;
use crate::experience::{Experience, RenderContext};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Closed set of failures the machine reports on its result stream.
///
/// Every error carries an identity `id`; two errors are equal only when they
/// are the same report.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("an experience is already active")]
    ExperienceAlreadyActive { id: Uuid },

    #[error("render context {context} is not active")]
    RenderContextNotActive { context: RenderContext, id: Uuid },

    #[error("experience '{}' failed: {message}", .experience.name)]
    ExperienceError {
        experience: Arc<Experience>,
        message: String,
        id: Uuid,
    },

    #[error("step {step_index} of experience '{}' failed: {message}", .experience.name)]
    StepError {
        experience: Arc<Experience>,
        step_index: usize,
        message: String,
        id: Uuid,
    },
}

/// Outcome of one submitted action: the settled state or the reported error.
pub type MachineResult = Result<State, Error>;

impl Error {
    pub fn already_active() -> Self {
        Self::ExperienceAlreadyActive { id: Uuid::new_v4() }
    }

    pub fn render_context_not_active(context: RenderContext) -> Self {
        Self::RenderContextNotActive {
            context,
            id: Uuid::new_v4(),
        }
    }

    pub fn experience(experience: &Arc<Experience>, message: impl Into<String>) -> Self {
        Self::ExperienceError {
            experience: Arc::clone(experience),
            message: message.into(),
            id: Uuid::new_v4(),
        }
    }

    pub fn step(experience: &Arc<Experience>, step_index: usize, message: impl Into<String>) -> Self {
        Self::StepError {
            experience: Arc::clone(experience),
            step_index,
            message: message.into(),
            id: Uuid::new_v4(),
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::ExperienceAlreadyActive { id }
            | Self::RenderContextNotActive { id, .. }
            | Self::ExperienceError { id, .. }
            | Self::StepError { id, .. } => *id,
        }
    }

    /// The experience this error is about, if any.
    pub fn experience_ref(&self) -> Option<&Arc<Experience>> {
        match self {
            Self::ExperienceError { experience, .. } | Self::StepError { experience, .. } => {
                Some(experience)
            }
            _ => None,
        }
    }

    /// The human readable reason without the experience prefix.
    pub fn message(&self) -> String {
        match self {
            Self::ExperienceError { message, .. } | Self::StepError { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
