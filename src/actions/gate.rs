//! Queue-transforming action that blocks everything queued after it.

use super::{ActionError, ActionQueue, ExperienceAction};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type GateCheck = Arc<dyn Fn() -> bool + Send + Sync>;

/// Lets the rest of the queue through only when `check` passes.
///
/// Typical use is form validation: a "submit" button carries a gate followed
/// by the actions that advance the experience. When the form is invalid the
/// gate truncates the queue so those actions never run.
#[derive(Clone)]
pub struct GateAction {
    name: String,
    check: GateCheck,
}

impl GateAction {
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for GateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateAction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ExperienceAction for GateAction {
    fn kind(&self) -> &str {
        "gate"
    }

    async fn execute(&self) -> Result<(), ActionError> {
        Ok(())
    }

    fn transform_queue(&self, mut queue: ActionQueue, index: usize) -> ActionQueue {
        if (self.check)() {
            return queue;
        }

        debug!(gate = %self.name, blocked = queue.len().saturating_sub(index + 1), "gate closed");
        queue.truncate(index + 1);
        queue
    }
}
