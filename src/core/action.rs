//! Inputs to the reducer.

use super::error::Error;
use crate::experience::{Experience, StepReference};
use std::sync::Arc;

/// A command submitted to the state machine. Actions carry data only.
#[derive(Clone, Debug)]
pub enum Action {
    StartExperience(Arc<Experience>),
    StartStep(StepReference),
    RenderStep,
    EndExperience {
        mark_complete: bool,
        /// The hosting UI is gone; skip waiting for a dismiss animation
        destroyed: bool,
        track_analytics: bool,
    },
    Reset,
    /// Publish an error. A fatal report also returns the machine to `Idling`.
    ReportError { error: Error, fatal: bool },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartExperience(_) => "StartExperience",
            Self::StartStep(_) => "StartStep",
            Self::RenderStep => "RenderStep",
            Self::EndExperience { .. } => "EndExperience",
            Self::Reset => "Reset",
            Self::ReportError { .. } => "ReportError",
        }
    }

    /// A user-initiated dismissal that waits for the UI and records
    /// analytics.
    pub fn dismiss(mark_complete: bool) -> Self {
        Self::EndExperience {
            mark_complete,
            destroyed: false,
            track_analytics: true,
        }
    }
}
