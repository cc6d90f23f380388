//! Load-time validation of experience structure.
//!
//! Uses Stillwater's `Validation` to collect every structural problem in one
//! pass rather than stopping at the first one, so the reported experience
//! error lists all of them.

use super::Experience;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// A structural problem that prevents an experience from starting.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationViolation {
    /// The data layer flagged the experience as failed to load
    #[error("{0}")]
    LoadError(String),

    #[error("Experience has 0 steps")]
    NoSteps,

    #[error("Step container {index} has 0 steps")]
    EmptyContainer { index: usize },
}

pub type ExperienceValidation = Validation<(), NonEmptyVec<ValidationViolation>>;

/// Check an experience before any step is attempted, accumulating all
/// violations.
pub fn validate(experience: &Experience) -> ExperienceValidation {
    let mut checks: Vec<ExperienceValidation> = Vec::new();

    checks.push(match &experience.error {
        Some(error) => Validation::fail(ValidationViolation::LoadError(error.clone())),
        None => Validation::success(()),
    });

    checks.push(if experience.step_containers().is_empty() {
        Validation::fail(ValidationViolation::NoSteps)
    } else {
        Validation::success(())
    });

    for (index, container) in experience.step_containers().iter().enumerate() {
        checks.push(if container.steps.is_empty() {
            Validation::fail(ValidationViolation::EmptyContainer { index })
        } else {
            Validation::success(())
        });
    }

    Validation::all_vec(checks).map(|_| ())
}

/// Render a failed validation as one message, violations joined by `"; "`.
/// Returns `None` when the experience is valid.
pub fn violation_message(validation: &ExperienceValidation) -> Option<String> {
    match validation {
        Validation::Success(_) => None,
        Validation::Failure(violations) => Some(
            violations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experience::{Step, StepContainer};
    use uuid::Uuid;

    fn container(size: usize) -> StepContainer {
        StepContainer::new(
            Uuid::new_v4(),
            (0..size).map(|_| Step::new(Uuid::new_v4())).collect(),
        )
    }

    #[test]
    fn well_formed_experience_passes() {
        let experience = Experience::new(Uuid::new_v4(), "ok", vec![container(2), container(1)]);

        let result = validate(&experience);

        assert!(result.is_success());
        assert_eq!(violation_message(&result), None);
    }

    #[test]
    fn zero_containers_reports_zero_steps() {
        let experience = Experience::new(Uuid::new_v4(), "empty", vec![]);

        let result = validate(&experience);

        assert_eq!(
            violation_message(&result).as_deref(),
            Some("Experience has 0 steps")
        );
    }

    #[test]
    fn accumulates_all_violations() {
        let experience = Experience::new(
            Uuid::new_v4(),
            "broken",
            vec![container(0), container(1), container(0)],
        )
        .with_error("schema mismatch");

        let result = validate(&experience);

        match result {
            Validation::Failure(violations) => {
                assert_eq!(violations.len(), 3);
                assert!(violations
                    .iter()
                    .any(|v| matches!(v, ValidationViolation::LoadError(_))));
                assert!(violations
                    .iter()
                    .any(|v| *v == ValidationViolation::EmptyContainer { index: 2 }));
            }
            Validation::Success(_) => panic!("Expected failures, got success"),
        }
    }

    #[test]
    fn message_joins_violations_in_order() {
        let experience =
            Experience::new(Uuid::new_v4(), "broken", vec![container(0)]).with_error("bad");

        let message = violation_message(&validate(&experience));

        assert_eq!(
            message.as_deref(),
            Some("bad; Step container 0 has 0 steps")
        );
    }
}
