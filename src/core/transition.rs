//! The pure transition table.
//!
//! [`transition`] maps the current state and a submitted action to the next
//! state and an optional side effect. It performs no I/O; executing the side
//! effect is the machine's job. Pairs missing from the table return `None`
//! and are ignored.

use super::action::Action;
use super::dismiss::{self, DismissSignal};
use super::error::Error;
use super::state::{State, StepMetadata};
use crate::actions::ActionQueue;
use crate::experience::validation::{validate, violation_message};
use crate::experience::{Experience, StepReference};
use std::sync::Arc;

/// Work the machine performs after swapping in a new state.
#[derive(Debug)]
pub enum SideEffect {
    /// Submit another action immediately, within the same call
    Continuation(Action),

    /// Run navigate actions, produce metadata, then present the container
    /// holding `flat_step_index`
    PresentContainer {
        experience: Arc<Experience>,
        flat_step_index: usize,
        metadata: StepMetadata,
        pre_step_actions: ActionQueue,
    },

    /// Produce metadata for a step whose container is already presented
    PrepareStep {
        experience: Arc<Experience>,
        flat_step_index: usize,
        metadata: StepMetadata,
    },

    /// Wait for the UI to resume the dismiss continuation, then submit `then`
    AwaitDismiss { signal: DismissSignal, then: Action },

    /// Run the experience's completion actions
    ProcessActions {
        experience: Arc<Experience>,
        actions: ActionQueue,
    },

    /// Publish an error without changing state
    ReportError(Error),
}

/// Next state (or `None` to stay) paired with an optional side effect.
#[derive(Debug)]
pub struct Transition {
    pub state: Option<State>,
    pub effect: Option<SideEffect>,
}

impl Transition {
    fn to(state: State) -> Self {
        Self {
            state: Some(state),
            effect: None,
        }
    }

    fn with(state: State, effect: SideEffect) -> Self {
        Self {
            state: Some(state),
            effect: Some(effect),
        }
    }

    fn stay(effect: SideEffect) -> Self {
        Self {
            state: None,
            effect: Some(effect),
        }
    }
}

/// Compute the transition for `action` in `state`.
pub fn transition(state: &State, action: &Action) -> Option<Transition> {
    if let Action::ReportError { error, fatal } = action {
        return Some(report_error(state, error, *fatal));
    }

    match (state, action) {
        (State::Idling, Action::StartExperience(experience)) => Some(start_experience(experience)),

        (State::BeginningExperience { experience }, Action::StartStep(reference)) => {
            Some(begin_first_step(experience, reference))
        }

        (
            State::BeginningStep {
                experience,
                flat_step_index,
                is_first,
                metadata,
            },
            Action::RenderStep,
        ) => Some(Transition::to(State::RenderingStep {
            experience: Arc::clone(experience),
            flat_step_index: *flat_step_index,
            is_first: *is_first,
            metadata: metadata.clone(),
        })),

        (
            State::RenderingStep {
                experience,
                flat_step_index,
                ..
            },
            Action::StartStep(reference),
        ) => Some(leave_rendered_step(experience, *flat_step_index, reference)),

        (
            State::RenderingStep {
                experience,
                flat_step_index,
                ..
            },
            Action::EndExperience {
                mark_complete,
                destroyed,
                ..
            },
        ) => Some(ending_step(
            experience,
            *flat_step_index,
            *mark_complete,
            *destroyed,
            action.clone(),
        )),

        (
            State::EndingStep {
                experience,
                flat_step_index,
                ..
            },
            Action::EndExperience {
                mark_complete,
                track_analytics,
                ..
            },
        ) => Some(Transition::with(
            State::EndingExperience {
                experience: Arc::clone(experience),
                flat_step_index: *flat_step_index,
                mark_complete: *mark_complete,
                track_analytics: *track_analytics,
            },
            SideEffect::Continuation(Action::Reset),
        )),

        (
            State::EndingStep {
                experience,
                flat_step_index,
                ..
            },
            Action::StartStep(reference),
        ) => Some(begin_next_step(experience, *flat_step_index, reference)),

        (
            State::EndingExperience {
                experience,
                mark_complete,
                ..
            },
            Action::Reset,
        ) => {
            let actions = experience.completion_actions();
            let effect = (*mark_complete && !actions.is_empty()).then(|| {
                SideEffect::ProcessActions {
                    experience: Arc::clone(experience),
                    actions: actions.clone(),
                }
            });
            Some(Transition {
                state: Some(State::Idling),
                effect,
            })
        }

        _ => None,
    }
}

fn report_error(state: &State, error: &Error, fatal: bool) -> Transition {
    let effect = SideEffect::ReportError(error.clone());
    if fatal && !state.is_idle() {
        Transition::with(State::Idling, effect)
    } else {
        Transition::stay(effect)
    }
}

fn start_experience(experience: &Arc<Experience>) -> Transition {
    if let Some(message) = violation_message(&validate(experience)) {
        return Transition::stay(SideEffect::ReportError(Error::experience(
            experience, message,
        )));
    }

    Transition::with(
        State::BeginningExperience {
            experience: Arc::clone(experience),
        },
        SideEffect::Continuation(Action::StartStep(StepReference::Index(0))),
    )
}

fn begin_first_step(experience: &Arc<Experience>, reference: &StepReference) -> Transition {
    let target = reference.resolve(experience, 0).filter(|index| {
        experience
            .container_for(*index)
            .is_some_and(|container| !container.steps.is_empty())
    });

    let Some(target) = target else {
        return Transition::with(
            State::Idling,
            SideEffect::ReportError(step_not_found(experience, 0, reference)),
        );
    };

    let metadata = StepMetadata::new();
    Transition::with(
        State::BeginningStep {
            experience: Arc::clone(experience),
            flat_step_index: target,
            is_first: true,
            metadata: metadata.clone(),
        },
        SideEffect::PresentContainer {
            experience: Arc::clone(experience),
            flat_step_index: target,
            metadata,
            pre_step_actions: navigate_actions(experience, target),
        },
    )
}

fn leave_rendered_step(
    experience: &Arc<Experience>,
    current: usize,
    reference: &StepReference,
) -> Transition {
    let Some(next) = reference.resolve(experience, current) else {
        return Transition::stay(SideEffect::ReportError(step_not_found(
            experience, current, reference,
        )));
    };

    // Continue with the resolved index so offsets are not applied twice.
    let then = Action::StartStep(StepReference::Index(next));
    ending_step(
        experience,
        current,
        true,
        experience.is_same_group(current, next),
        then,
    )
}

/// `EndingStep` either continues straight away or waits for the UI to
/// finish dismissing the current container.
fn ending_step(
    experience: &Arc<Experience>,
    current: usize,
    mark_complete: bool,
    immediate: bool,
    then: Action,
) -> Transition {
    if immediate {
        return Transition::with(
            State::EndingStep {
                experience: Arc::clone(experience),
                flat_step_index: current,
                mark_complete,
                dismiss: None,
            },
            SideEffect::Continuation(then),
        );
    }

    let (continuation, signal) = dismiss::channel();
    Transition::with(
        State::EndingStep {
            experience: Arc::clone(experience),
            flat_step_index: current,
            mark_complete,
            dismiss: Some(continuation),
        },
        SideEffect::AwaitDismiss { signal, then },
    )
}

fn begin_next_step(
    experience: &Arc<Experience>,
    current: usize,
    reference: &StepReference,
) -> Transition {
    let Some(next) = reference.resolve(experience, current) else {
        return Transition::stay(SideEffect::ReportError(step_not_found(
            experience, current, reference,
        )));
    };

    let metadata = StepMetadata::new();
    let state = State::BeginningStep {
        experience: Arc::clone(experience),
        flat_step_index: next,
        is_first: false,
        metadata: metadata.clone(),
    };

    let effect = if experience.is_same_group(current, next) {
        SideEffect::PrepareStep {
            experience: Arc::clone(experience),
            flat_step_index: next,
            metadata,
        }
    } else {
        SideEffect::PresentContainer {
            experience: Arc::clone(experience),
            flat_step_index: next,
            metadata,
            pre_step_actions: navigate_actions(experience, next),
        }
    };

    Transition::with(state, effect)
}

/// Navigate actions of the container holding `flat_step_index`, unless the
/// experience was qualified (the triggering screen already ran them).
fn navigate_actions(experience: &Experience, flat_step_index: usize) -> ActionQueue {
    if !experience.trigger.runs_navigate_actions() {
        return Vec::new();
    }

    experience
        .container_for(flat_step_index)
        .map(|container| container.navigate_actions())
        .unwrap_or_default()
}

fn step_not_found(experience: &Arc<Experience>, current: usize, reference: &StepReference) -> Error {
    Error::step(
        experience,
        current,
        format!("Step at {reference} does not exist"),
    )
}
