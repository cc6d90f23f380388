//! Lifecycle notifications derived from a machine's result stream.
//!
//! Analytics collaborators do not hook into the machine directly. They
//! observe the published results, and [`events_for`] turns each result into
//! the lifecycle events it implies.

use crate::core::{Error, MachineResult, State};
use crate::effects::StateMachine;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    ExperienceStarted {
        experience_id: Uuid,
        instance_id: Uuid,
    },
    StepSeen {
        experience_id: Uuid,
        step_id: Uuid,
        flat_step_index: usize,
    },
    StepCompleted {
        experience_id: Uuid,
        step_id: Uuid,
        flat_step_index: usize,
    },
    ExperienceCompleted {
        experience_id: Uuid,
    },
    ExperienceDismissed {
        experience_id: Uuid,
        flat_step_index: usize,
    },
    StepError {
        experience_id: Uuid,
        flat_step_index: usize,
        message: String,
    },
    ExperienceError {
        experience_id: Uuid,
        message: String,
    },
}

/// Events implied by one published result.
///
/// Every rendered step is seen; the first one also starts the experience.
/// Ending a step as complete completes it. Ending the experience with
/// analytics enabled either completes or dismisses it.
pub fn events_for(result: &MachineResult) -> Vec<LifecycleEvent> {
    match result {
        Ok(state) => state_events(state),
        Err(error) => error_events(error),
    }
}

fn state_events(state: &State) -> Vec<LifecycleEvent> {
    match state {
        State::RenderingStep {
            experience,
            flat_step_index,
            is_first,
            ..
        } => {
            let mut events = Vec::new();
            if *is_first {
                events.push(LifecycleEvent::ExperienceStarted {
                    experience_id: experience.id,
                    instance_id: experience.instance_id,
                });
            }
            if let Some(step) = experience.flat_step(*flat_step_index) {
                events.push(LifecycleEvent::StepSeen {
                    experience_id: experience.id,
                    step_id: step.id,
                    flat_step_index: *flat_step_index,
                });
            }
            events
        }

        State::EndingStep {
            experience,
            flat_step_index,
            mark_complete: true,
            ..
        } => experience
            .flat_step(*flat_step_index)
            .map(|step| LifecycleEvent::StepCompleted {
                experience_id: experience.id,
                step_id: step.id,
                flat_step_index: *flat_step_index,
            })
            .into_iter()
            .collect(),

        State::EndingExperience {
            experience,
            flat_step_index,
            mark_complete,
            track_analytics: true,
        } => {
            let event = if *mark_complete {
                LifecycleEvent::ExperienceCompleted {
                    experience_id: experience.id,
                }
            } else {
                LifecycleEvent::ExperienceDismissed {
                    experience_id: experience.id,
                    flat_step_index: *flat_step_index,
                }
            };
            vec![event]
        }

        _ => Vec::new(),
    }
}

fn error_events(error: &Error) -> Vec<LifecycleEvent> {
    match error {
        Error::StepError {
            experience,
            step_index,
            message,
            ..
        } => vec![LifecycleEvent::StepError {
            experience_id: experience.id,
            flat_step_index: *step_index,
            message: message.clone(),
        }],
        Error::ExperienceError {
            experience,
            message,
            ..
        } => vec![LifecycleEvent::ExperienceError {
            experience_id: experience.id,
            message: message.clone(),
        }],
        Error::ExperienceAlreadyActive { .. } | Error::RenderContextNotActive { .. } => Vec::new(),
    }
}

/// Receives lifecycle events, typically to forward them to analytics.
#[async_trait]
pub trait LifecycleObserver: Send + Sync {
    async fn on_event(&self, event: LifecycleEvent);
}

/// Forward every lifecycle event of `machine` to `observer` until the
/// machine is dropped.
pub fn spawn_tracker(
    machine: &StateMachine,
    observer: Arc<dyn LifecycleObserver>,
) -> JoinHandle<()> {
    let mut results = machine.subscribe_results();
    let context = machine.render_context().clone();

    tokio::spawn(async move {
        loop {
            match results.recv().await {
                Ok(result) => {
                    for event in events_for(&result) {
                        observer.on_event(event).await;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%context, skipped, "lifecycle tracker lagged, events lost");
                }
                Err(RecvError::Closed) => {
                    debug!(%context, "result stream closed, lifecycle tracker stopping");
                    break;
                }
            }
        }
    })
}
