//! Experience actions and the hook that runs them around step presentation.
//!
//! Actions are plugins attached to containers, steps and experiences. The
//! state machine runs container `Navigate` actions before a container is
//! presented and the experience's completion actions after it ends. Both go
//! through an [`ActionProcessing`] implementation, which may rewrite the
//! queue before executing it.

mod gate;
mod processor;

pub use gate::GateAction;
pub use processor::{ActionProcessor, ProcessOutcome};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Ordered batch of actions handed to a processor.
pub type ActionQueue = Vec<Arc<dyn ExperienceAction>>;

/// Error raised by an action while executing.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ActionError {
    #[error("action '{kind}' failed: {message}")]
    ExecutionFailed { kind: String, message: String },
}

/// User or lifecycle event an action is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTrigger {
    Tap,
    LongPress,
    Navigate,
}

/// A single pluggable action.
#[async_trait]
pub trait ExperienceAction: Send + Sync {
    /// Stable identifier of the action type, used for logging.
    fn kind(&self) -> &str;

    async fn execute(&self) -> Result<(), ActionError>;

    /// Rewrite the pending queue before anything executes. `index` is this
    /// action's position in `queue`. The default leaves the queue untouched.
    fn transform_queue(&self, queue: ActionQueue, _index: usize) -> ActionQueue {
        queue
    }
}

impl fmt::Debug for dyn ExperienceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExperienceAction")
            .field("kind", &self.kind())
            .finish()
    }
}

/// An action bound to the trigger that fires it.
#[derive(Clone, Debug)]
pub struct TriggeredAction {
    pub on: ActionTrigger,
    pub action: Arc<dyn ExperienceAction>,
}

impl TriggeredAction {
    pub fn new(on: ActionTrigger, action: Arc<dyn ExperienceAction>) -> Self {
        Self { on, action }
    }
}

/// Why a batch of actions is being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingTrigger {
    /// A step container is about to be presented
    Navigate,
    /// The experience ended completed
    Completion,
    /// The user interacted with an element of the current step
    Interaction(ActionTrigger),
}

/// Where a batch of actions originates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionContext {
    pub experience_id: Uuid,
    pub flat_step_index: Option<usize>,
    pub trigger: ProcessingTrigger,
}

/// Runs batches of actions on behalf of the state machine.
#[async_trait]
pub trait ActionProcessing: Send + Sync {
    async fn process(&self, actions: ActionQueue, context: ActionContext) -> ProcessOutcome;
}
