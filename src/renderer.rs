//! Registry of state machines, one per render context.

use crate::actions::{
    ActionContext, ActionProcessing, ActionProcessor, ActionTrigger, ProcessOutcome,
    ProcessingTrigger,
};
use crate::config::{ConfigError, MachineConfig};
use crate::core::{Action, Error, MachineResult, State};
use crate::effects::StateMachine;
use crate::experience::{Experience, RenderContext, StepReference};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

/// Routes experiences to the machine of their render context.
///
/// Machines are created on first use and are independent of each other: a
/// modal and an embedded frame can show experiences at the same time.
///
/// Cooperative dismissals (`dismiss` with `destroyed == false`, or a step
/// change that leaves the current container) wait for the UI to resume the
/// dismiss continuation published in `EndingStep`. Call
/// [`StateMachine::resume_dismiss`] once the container is gone.
pub struct ExperienceRenderer {
    config: MachineConfig,
    processor: Arc<dyn ActionProcessing>,
    machines: Mutex<HashMap<RenderContext, Arc<StateMachine>>>,
}

impl ExperienceRenderer {
    pub fn new() -> Self {
        Self {
            config: MachineConfig::default(),
            processor: Arc::new(ActionProcessor::new()),
            machines: Mutex::new(HashMap::new()),
        }
    }

    /// Renderer whose machines share `config` and `processor`.
    pub fn with_config(
        config: MachineConfig,
        processor: Arc<dyn ActionProcessing>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            processor,
            machines: Mutex::new(HashMap::new()),
        })
    }

    /// Machine for `context`, created idle if it does not exist yet.
    pub fn state_machine(&self, context: &RenderContext) -> Arc<StateMachine> {
        let mut machines = match self.machines.lock() {
            Ok(machines) => machines,
            Err(poisoned) => poisoned.into_inner(),
        };

        let machine = machines.entry(context.clone()).or_insert_with(|| {
            debug!(%context, "creating state machine");
            Arc::new(StateMachine::from_parts(
                context.clone(),
                self.config.clone(),
                Arc::clone(&self.processor),
            ))
        });
        Arc::clone(machine)
    }

    fn existing(&self, context: &RenderContext) -> Option<Arc<StateMachine>> {
        match self.machines.lock() {
            Ok(machines) => machines.get(context).cloned(),
            Err(poisoned) => poisoned.into_inner().get(context).cloned(),
        }
    }

    /// Start `experience` in its own render context.
    pub async fn show(&self, experience: Experience) -> MachineResult {
        let machine = self.state_machine(&experience.render_context);
        info!(
            experience = %experience.id,
            context = %experience.render_context,
            "showing experience"
        );
        machine
            .handle_action(Action::StartExperience(Arc::new(experience)))
            .await
    }

    /// Move the experience showing in `context` to another step.
    pub async fn show_step(
        &self,
        context: &RenderContext,
        reference: StepReference,
    ) -> MachineResult {
        let machine = self.active(context)?;
        machine.handle_action(Action::StartStep(reference)).await
    }

    /// End the experience showing in `context`.
    pub async fn dismiss(
        &self,
        context: &RenderContext,
        mark_complete: bool,
        destroyed: bool,
    ) -> MachineResult {
        let machine = self.active(context)?;
        machine
            .handle_action(Action::EndExperience {
                mark_complete,
                destroyed,
                track_analytics: true,
            })
            .await
    }

    /// Run the actions bound to `element_id` of the step rendering in
    /// `context`.
    pub async fn interact(
        &self,
        context: &RenderContext,
        element_id: Uuid,
        trigger: ActionTrigger,
    ) -> Result<ProcessOutcome, Error> {
        let machine = self.active(context)?;
        let State::RenderingStep {
            experience,
            flat_step_index,
            ..
        } = machine.state()
        else {
            return Err(Error::render_context_not_active(context.clone()));
        };

        let actions = experience
            .flat_step(flat_step_index)
            .map(|step| step.actions_for(element_id, trigger))
            .unwrap_or_default();
        let context = ActionContext {
            experience_id: experience.id,
            flat_step_index: Some(flat_step_index),
            trigger: ProcessingTrigger::Interaction(trigger),
        };

        Ok(machine.action_processor().process(actions, context).await)
    }

    /// Tear down every showing experience without waiting on the UI, and
    /// forget all machines.
    pub async fn reset_all(&self) {
        let machines: Vec<Arc<StateMachine>> = match self.machines.lock() {
            Ok(mut machines) => machines.drain().map(|(_, machine)| machine).collect(),
            Err(poisoned) => poisoned
                .into_inner()
                .drain()
                .map(|(_, machine)| machine)
                .collect(),
        };

        for machine in machines {
            if machine.state().is_idle() {
                continue;
            }
            let _ = machine
                .handle_action(Action::EndExperience {
                    mark_complete: false,
                    destroyed: true,
                    track_analytics: false,
                })
                .await;
        }
    }

    fn active(&self, context: &RenderContext) -> Result<Arc<StateMachine>, Error> {
        self.existing(context)
            .filter(|machine| !machine.state().is_idle())
            .ok_or_else(|| Error::render_context_not_active(context.clone()))
    }
}

impl Default for ExperienceRenderer {
    fn default() -> Self {
        Self::new()
    }
}
