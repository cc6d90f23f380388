//! Default action processor: transform the queue, then execute in order.

use super::{ActionContext, ActionProcessing, ActionQueue};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Summary of one processed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Actions that executed successfully
    pub executed: usize,
    /// Actions that returned an error
    pub failed: usize,
    /// Actions removed from the queue by a transformation
    pub dropped: usize,
}

/// Processes actions sequentially.
///
/// Before anything executes, each action gets a chance to rewrite the queue
/// (in queue order). A failing action is logged and skipped; the rest of the
/// queue still runs.
#[derive(Debug, Default, Clone)]
pub struct ActionProcessor;

impl ActionProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Apply every action's queue transformation, front to back.
    ///
    /// When an action removes itself, the action that slides into its slot
    /// is visited next instead of being skipped.
    pub fn transform(&self, actions: ActionQueue) -> ActionQueue {
        let mut queue = actions;
        let mut index = 0;

        while index < queue.len() {
            let action = Arc::clone(&queue[index]);
            queue = action.transform_queue(queue, index);

            let still_here = queue
                .get(index)
                .is_some_and(|current| Arc::ptr_eq(current, &action));
            if still_here {
                index += 1;
            }
        }

        queue
    }
}

#[async_trait]
impl ActionProcessing for ActionProcessor {
    async fn process(&self, actions: ActionQueue, context: ActionContext) -> ProcessOutcome {
        let submitted = actions.len();
        let queue = self.transform(actions);

        let mut outcome = ProcessOutcome {
            dropped: submitted.saturating_sub(queue.len()),
            ..ProcessOutcome::default()
        };

        debug!(
            experience = %context.experience_id,
            trigger = ?context.trigger,
            queued = queue.len(),
            dropped = outcome.dropped,
            "processing actions"
        );

        for action in queue {
            match action.execute().await {
                Ok(()) => outcome.executed += 1,
                Err(err) => {
                    warn!(kind = action.kind(), error = %err, "action failed");
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }
}
