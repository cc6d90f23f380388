//! Property-based tests for step addressing and the transition table.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated experiences and states.

use chrono::Utc;
use experience_engine::core::{
    dismiss, transition, Action, Error, State, StateHistory, StateSnapshot, StateTransition,
    StepMetadata,
};
use experience_engine::experience::{Experience, Step, StepContainer, StepReference};
use proptest::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

prop_compose! {
    /// Experience with 1..5 containers of 1..4 steps each.
    fn arbitrary_experience()(sizes in prop::collection::vec(1..4usize, 1..5)) -> Arc<Experience> {
        let containers = sizes
            .into_iter()
            .map(|size| {
                StepContainer::new(
                    Uuid::new_v4(),
                    (0..size).map(|_| Step::new(Uuid::new_v4())).collect(),
                )
            })
            .collect();
        Arc::new(Experience::new(Uuid::new_v4(), "generated", containers))
    }
}

/// Every state variant, positioned on `index`.
fn states_for(experience: &Arc<Experience>, index: usize) -> Vec<State> {
    let (continuation, _signal) = dismiss::channel();
    vec![
        State::Idling,
        State::BeginningExperience {
            experience: Arc::clone(experience),
        },
        State::BeginningStep {
            experience: Arc::clone(experience),
            flat_step_index: index,
            is_first: index == 0,
            metadata: StepMetadata::new(),
        },
        State::RenderingStep {
            experience: Arc::clone(experience),
            flat_step_index: index,
            is_first: false,
            metadata: StepMetadata::new(),
        },
        State::EndingStep {
            experience: Arc::clone(experience),
            flat_step_index: index,
            mark_complete: true,
            dismiss: Some(continuation),
        },
        State::EndingExperience {
            experience: Arc::clone(experience),
            flat_step_index: index,
            mark_complete: false,
            track_analytics: true,
        },
    ]
}

/// Every action kind except `ReportError`, which applies everywhere.
fn actions_for(experience: &Arc<Experience>) -> Vec<Action> {
    vec![
        Action::StartExperience(Arc::clone(experience)),
        Action::StartStep(StepReference::Index(0)),
        Action::RenderStep,
        Action::dismiss(false),
        Action::Reset,
    ]
}

/// Rows of the transition table.
fn in_table(state: &State, action: &Action) -> bool {
    matches!(
        (state, action),
        (State::Idling, Action::StartExperience(_))
            | (State::BeginningExperience { .. }, Action::StartStep(_))
            | (State::BeginningStep { .. }, Action::RenderStep)
            | (State::RenderingStep { .. }, Action::StartStep(_))
            | (State::RenderingStep { .. }, Action::EndExperience { .. })
            | (State::EndingStep { .. }, Action::StartStep(_))
            | (State::EndingStep { .. }, Action::EndExperience { .. })
            | (State::EndingExperience { .. }, Action::Reset)
    )
}

proptest! {
    #[test]
    fn step_index_resolves_only_in_range(
        experience in arbitrary_experience(),
        index in 0..20usize,
        current in 0..20usize,
    ) {
        let resolved = StepReference::Index(index).resolve(&experience, current);

        if index < experience.flat_step_count() {
            prop_assert_eq!(resolved, Some(index));
        } else {
            prop_assert_eq!(resolved, None);
        }
    }

    #[test]
    fn offset_matches_absolute_index(
        experience in arbitrary_experience(),
        current in 0..16usize,
        offset in -16..16isize,
    ) {
        let by_offset = StepReference::Offset(offset).resolve(&experience, current);
        let by_index = current
            .checked_add_signed(offset)
            .and_then(|target| StepReference::Index(target).resolve(&experience, current));

        prop_assert_eq!(by_offset, by_index);
    }

    #[test]
    fn step_id_resolves_to_its_flat_index(
        experience in arbitrary_experience(),
        pick in any::<prop::sample::Index>(),
    ) {
        let index = pick.index(experience.flat_step_count());
        let id = experience.flat_step(index).map(|step| step.id);

        prop_assert!(id.is_some());
        let resolved = id.and_then(|id| StepReference::Id(id).resolve(&experience, 0));
        prop_assert_eq!(resolved, Some(index));
    }

    #[test]
    fn actions_outside_the_table_are_no_ops(
        experience in arbitrary_experience(),
        pick in any::<prop::sample::Index>(),
    ) {
        let index = pick.index(experience.flat_step_count());

        for state in states_for(&experience, index) {
            for action in actions_for(&experience) {
                if in_table(&state, &action) {
                    continue;
                }
                prop_assert!(
                    transition(&state, &action).is_none(),
                    "{} should ignore {}",
                    state.name(),
                    action.name()
                );
            }
        }
    }

    #[test]
    fn error_reports_never_leave_idling(experience in arbitrary_experience(), fatal in any::<bool>()) {
        let action = Action::ReportError {
            error: Error::experience(&experience, "boom"),
            fatal,
        };

        let result = transition(&State::Idling, &action);

        prop_assert!(result.is_some_and(|t| t.state.is_none()));
    }

    #[test]
    fn group_boundaries_match_container_layout(
        experience in arbitrary_experience(),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let count = experience.flat_step_count();
        let (a, b) = (a.index(count), b.index(count));

        prop_assert_eq!(
            experience.is_same_group(a, b),
            experience.group_index(a) == experience.group_index(b)
        );
        prop_assert!(!experience.is_same_group(a, count));
    }

    #[test]
    fn bounded_history_keeps_latest(limit in 1..8usize, swaps in 0..20usize) {
        let snapshot = |index: usize| StateSnapshot {
            name: "RenderingStep".to_string(),
            experience_id: None,
            flat_step_index: Some(index),
        };

        let mut history = StateHistory::with_limit(limit);
        for i in 0..swaps {
            history = history.record(StateTransition {
                from: snapshot(i),
                to: snapshot(i + 1),
                action: "StartStep".to_string(),
                timestamp: Utc::now(),
            });
        }

        prop_assert_eq!(history.transitions().len(), swaps.min(limit));
        if let Some(last) = history.transitions().last() {
            prop_assert_eq!(last.to.flat_step_index, Some(swaps));
        }
    }
}
