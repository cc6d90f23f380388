//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use experience_engine::actions::{ActionError, ExperienceAction};
use experience_engine::experience::{Experience, Step, StepContainer};
use experience_engine::traits::{Metadata, MetadataSettingTrait, PresentingTrait, TraitError};
use experience_engine::{State, StateMachine};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Presenter that records every call.
#[derive(Default)]
pub struct RecordingPresenter {
    pub presented: Mutex<Vec<usize>>,
    pub removed: AtomicUsize,
    pub fail: bool,
}

impl RecordingPresenter {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn presented(&self) -> Vec<usize> {
        self.presented.lock().unwrap().clone()
    }
}

#[async_trait]
impl PresentingTrait for RecordingPresenter {
    async fn present(
        &self,
        _experience: &Experience,
        flat_step_index: usize,
        _metadata: &Metadata,
    ) -> Result<(), TraitError> {
        self.presented.lock().unwrap().push(flat_step_index);
        if self.fail {
            return Err(TraitError::new("presenter unavailable"));
        }
        Ok(())
    }

    async fn remove(&self) {
        self.removed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Metadata trait that asks to be retried until its `succeed_on`-th call.
pub struct FlakyMetadata {
    pub calls: AtomicUsize,
    pub succeed_on: usize,
}

impl FlakyMetadata {
    pub fn new(succeed_on: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            succeed_on,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataSettingTrait for FlakyMetadata {
    async fn produce_metadata(&self) -> Result<Metadata, TraitError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call < self.succeed_on {
            return Err(TraitError::retry_after(
                "content not ready",
                Duration::from_millis(5),
            ));
        }
        Ok(Metadata::from([("attempts".to_string(), json!(call))]))
    }
}

/// Action that counts its executions.
#[derive(Default)]
pub struct CountingAction {
    pub runs: AtomicUsize,
}

impl CountingAction {
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExperienceAction for CountingAction {
    fn kind(&self) -> &str {
        "counting"
    }

    async fn execute(&self) -> Result<(), ActionError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Experience with containers `[S0, S1]` and `[S2]`, both presented by
/// `presenter`.
pub fn two_containers(presenter: &Arc<RecordingPresenter>) -> Experience {
    Experience::new(
        Uuid::new_v4(),
        "Two containers",
        vec![
            StepContainer::new(
                Uuid::new_v4(),
                vec![Step::new(Uuid::new_v4()), Step::new(Uuid::new_v4())],
            )
            .with_presenting_trait(presenter.clone()),
            StepContainer::new(Uuid::new_v4(), vec![Step::new(Uuid::new_v4())])
                .with_presenting_trait(presenter.clone()),
        ],
    )
}

/// Wait until `machine` publishes an `EndingStep` with a pending dismiss,
/// then resume it.
pub async fn resume_when_ending(machine: &StateMachine) {
    let mut states = machine.watch_state();
    tokio::time::timeout(
        Duration::from_secs(2),
        states.wait_for(|state| state.dismiss_continuation().is_some()),
    )
    .await
    .expect("machine never waited on a dismiss")
    .expect("machine dropped");

    assert!(machine.resume_dismiss());
}

pub fn is_rendering(state: &State, index: usize) -> bool {
    matches!(state, State::RenderingStep { flat_step_index, .. } if *flat_step_index == index)
}
