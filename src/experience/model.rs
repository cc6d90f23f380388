//! Experience, step container and step values.

use crate::actions::{ActionQueue, ActionTrigger, ExperienceAction, TriggeredAction};
use crate::traits::{MetadataSettingTrait, PresentingTrait};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Why an experience was launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExperienceTrigger {
    /// Qualified by a screen or event; the triggering screen already ran its
    /// own side effects
    Qualification,
    DeepLink,
    Preview,
    ShowCall,
    ExperienceCompletionAction { from: Option<Uuid> },
    LaunchExperienceAction { from: Option<Uuid> },
}

impl ExperienceTrigger {
    /// Whether container navigate actions run when a container begins.
    pub fn runs_navigate_actions(&self) -> bool {
        !matches!(self, Self::Qualification)
    }
}

/// Independent UI slot an experience renders into. Each one is backed by its
/// own state machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderContext {
    Modal,
    Embed { frame_id: String },
}

impl fmt::Display for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modal => write!(f, "modal"),
            Self::Embed { frame_id } => write!(f, "embed:{frame_id}"),
        }
    }
}

/// One step of a container.
#[derive(Clone)]
pub struct Step {
    pub id: Uuid,
    metadata_traits: Vec<Arc<dyn MetadataSettingTrait>>,
    actions: HashMap<Uuid, Vec<TriggeredAction>>,
}

impl Step {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            metadata_traits: Vec::new(),
            actions: HashMap::new(),
        }
    }

    pub fn with_metadata_trait(mut self, metadata_trait: Arc<dyn MetadataSettingTrait>) -> Self {
        self.metadata_traits.push(metadata_trait);
        self
    }

    /// Bind an action to an element of this step.
    pub fn with_action(
        mut self,
        element_id: Uuid,
        on: ActionTrigger,
        action: Arc<dyn ExperienceAction>,
    ) -> Self {
        self.actions
            .entry(element_id)
            .or_default()
            .push(TriggeredAction::new(on, action));
        self
    }

    pub fn metadata_traits(&self) -> &[Arc<dyn MetadataSettingTrait>] {
        &self.metadata_traits
    }

    /// Actions bound to `element_id` for the given trigger, in declaration
    /// order.
    pub fn actions_for(&self, element_id: Uuid, trigger: ActionTrigger) -> ActionQueue {
        self.actions
            .get(&element_id)
            .map(|bound| {
                bound
                    .iter()
                    .filter(|a| a.on == trigger)
                    .map(|a| Arc::clone(&a.action))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("id", &self.id)
            .field("metadata_traits", &self.metadata_traits.len())
            .field("elements_with_actions", &self.actions.len())
            .finish()
    }
}

/// Ordered group of steps presented together as one UI surface.
#[derive(Clone)]
pub struct StepContainer {
    pub id: Uuid,
    pub steps: Vec<Step>,
    presenting_trait: Option<Arc<dyn PresentingTrait>>,
    metadata_traits: Vec<Arc<dyn MetadataSettingTrait>>,
    actions: Vec<TriggeredAction>,
}

impl StepContainer {
    pub fn new(id: Uuid, steps: Vec<Step>) -> Self {
        Self {
            id,
            steps,
            presenting_trait: None,
            metadata_traits: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn with_presenting_trait(mut self, presenting: Arc<dyn PresentingTrait>) -> Self {
        self.presenting_trait = Some(presenting);
        self
    }

    /// Metadata traits declared on the container apply to every step and
    /// run before the step's own.
    pub fn with_metadata_trait(mut self, metadata_trait: Arc<dyn MetadataSettingTrait>) -> Self {
        self.metadata_traits.push(metadata_trait);
        self
    }

    pub fn with_action(mut self, on: ActionTrigger, action: Arc<dyn ExperienceAction>) -> Self {
        self.actions.push(TriggeredAction::new(on, action));
        self
    }

    pub fn presenting_trait(&self) -> Option<&Arc<dyn PresentingTrait>> {
        self.presenting_trait.as_ref()
    }

    pub fn metadata_traits(&self) -> &[Arc<dyn MetadataSettingTrait>] {
        &self.metadata_traits
    }

    /// Actions that run when this container begins.
    pub fn navigate_actions(&self) -> ActionQueue {
        self.actions
            .iter()
            .filter(|a| a.on == ActionTrigger::Navigate)
            .map(|a| Arc::clone(&a.action))
            .collect()
    }
}

impl fmt::Debug for StepContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepContainer")
            .field("id", &self.id)
            .field("steps", &self.steps)
            .field("presenting_trait", &self.presenting_trait.is_some())
            .field("metadata_traits", &self.metadata_traits.len())
            .field("actions", &self.actions.len())
            .finish()
    }
}

/// One content package: ordered containers of ordered steps.
///
/// Immutable once handed to a state machine. Flat step addressing (across
/// containers) is precomputed at construction:
///
/// ```rust
/// use experience_engine::experience::{Experience, Step, StepContainer};
/// use uuid::Uuid;
///
/// let experience = Experience::new(
///     Uuid::new_v4(),
///     "onboarding",
///     vec![
///         StepContainer::new(Uuid::new_v4(), vec![Step::new(Uuid::new_v4()), Step::new(Uuid::new_v4())]),
///         StepContainer::new(Uuid::new_v4(), vec![Step::new(Uuid::new_v4())]),
///     ],
/// );
///
/// assert_eq!(experience.flat_step_count(), 3);
/// assert_eq!(experience.group_index(2), Some(1));
/// assert_eq!(experience.step_index_in_group(1), Some(1));
/// ```
#[derive(Clone)]
pub struct Experience {
    pub id: Uuid,
    pub instance_id: Uuid,
    pub name: String,
    pub trigger: ExperienceTrigger,
    pub render_context: RenderContext,
    pub error: Option<String>,
    step_containers: Vec<StepContainer>,
    completion_actions: ActionQueue,
    group_lookup: Vec<usize>,
    step_index_lookup: Vec<usize>,
}

impl Experience {
    pub fn new(id: Uuid, name: impl Into<String>, step_containers: Vec<StepContainer>) -> Self {
        let mut group_lookup = Vec::new();
        let mut step_index_lookup = Vec::new();
        for (group, container) in step_containers.iter().enumerate() {
            for index in 0..container.steps.len() {
                group_lookup.push(group);
                step_index_lookup.push(index);
            }
        }

        Self {
            id,
            instance_id: Uuid::new_v4(),
            name: name.into(),
            trigger: ExperienceTrigger::ShowCall,
            render_context: RenderContext::Modal,
            error: None,
            step_containers,
            completion_actions: Vec::new(),
            group_lookup,
            step_index_lookup,
        }
    }

    pub fn with_trigger(mut self, trigger: ExperienceTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_render_context(mut self, render_context: RenderContext) -> Self {
        self.render_context = render_context;
        self
    }

    /// Mark the experience as failed to load.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_completion_action(mut self, action: Arc<dyn ExperienceAction>) -> Self {
        self.completion_actions.push(action);
        self
    }

    pub fn step_containers(&self) -> &[StepContainer] {
        &self.step_containers
    }

    pub fn completion_actions(&self) -> &ActionQueue {
        &self.completion_actions
    }

    pub fn flat_step_count(&self) -> usize {
        self.group_lookup.len()
    }

    /// All steps across all containers, in presentation order.
    pub fn flat_steps(&self) -> impl Iterator<Item = &Step> {
        self.step_containers.iter().flat_map(|c| c.steps.iter())
    }

    pub fn flat_step(&self, flat_index: usize) -> Option<&Step> {
        let group = *self.group_lookup.get(flat_index)?;
        let index = *self.step_index_lookup.get(flat_index)?;
        self.step_containers.get(group)?.steps.get(index)
    }

    /// Container index holding `flat_index`.
    pub fn group_index(&self, flat_index: usize) -> Option<usize> {
        self.group_lookup.get(flat_index).copied()
    }

    /// Position of `flat_index` within its container.
    pub fn step_index_in_group(&self, flat_index: usize) -> Option<usize> {
        self.step_index_lookup.get(flat_index).copied()
    }

    pub fn container_for(&self, flat_index: usize) -> Option<&StepContainer> {
        self.step_containers.get(self.group_index(flat_index)?)
    }

    /// Whether two flat indices live in the same container. False when
    /// either index is out of range.
    pub fn is_same_group(&self, a: usize, b: usize) -> bool {
        match (self.group_index(a), self.group_index(b)) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        }
    }
}

impl PartialEq for Experience {
    fn eq(&self, other: &Self) -> bool {
        self.instance_id == other.instance_id
    }
}

impl fmt::Debug for Experience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Experience")
            .field("id", &self.id)
            .field("instance_id", &self.instance_id)
            .field("name", &self.name)
            .field("trigger", &self.trigger)
            .field("render_context", &self.render_context)
            .field("error", &self.error)
            .field("step_containers", &self.step_containers)
            .field("completion_actions", &self.completion_actions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(count: usize) -> Vec<Step> {
        (0..count).map(|_| Step::new(Uuid::new_v4())).collect()
    }

    fn experience(sizes: &[usize]) -> Experience {
        let containers = sizes
            .iter()
            .map(|size| StepContainer::new(Uuid::new_v4(), steps(*size)))
            .collect();
        Experience::new(Uuid::new_v4(), "test", containers)
    }

    #[test]
    fn flat_steps_cover_every_container() {
        let experience = experience(&[2, 1, 3]);

        assert_eq!(experience.flat_step_count(), 6);
        assert_eq!(experience.flat_steps().count(), 6);
    }

    #[test]
    fn lookups_map_flat_index_to_container_position() {
        let experience = experience(&[2, 1, 3]);

        let groups: Vec<_> = (0..6).map(|i| experience.group_index(i).unwrap()).collect();
        let positions: Vec<_> = (0..6)
            .map(|i| experience.step_index_in_group(i).unwrap())
            .collect();

        assert_eq!(groups, vec![0, 0, 1, 2, 2, 2]);
        assert_eq!(positions, vec![0, 1, 0, 0, 1, 2]);
        assert_eq!(experience.group_index(6), None);
    }

    #[test]
    fn flat_step_matches_iteration_order() {
        let experience = experience(&[2, 2]);
        let ids: Vec<_> = experience.flat_steps().map(|s| s.id).collect();

        for (index, id) in ids.iter().enumerate() {
            assert_eq!(experience.flat_step(index).map(|s| s.id), Some(*id));
        }
    }

    #[test]
    fn empty_containers_contribute_no_flat_steps() {
        let experience = experience(&[0, 2]);

        assert_eq!(experience.flat_step_count(), 2);
        assert_eq!(experience.group_index(0), Some(1));
    }

    #[test]
    fn same_group_compares_containers() {
        let experience = experience(&[2, 1]);

        assert!(experience.is_same_group(0, 1));
        assert!(!experience.is_same_group(1, 2));
        assert!(!experience.is_same_group(0, 9));
    }

    #[test]
    fn equality_is_per_instance() {
        let first = experience(&[1]);
        let copy = first.clone();
        let rebuilt = Experience::new(first.id, "test", vec![]);

        assert_eq!(first, copy);
        assert_ne!(first, rebuilt);
    }

    #[test]
    fn qualification_skips_navigate_actions() {
        assert!(!ExperienceTrigger::Qualification.runs_navigate_actions());
        assert!(ExperienceTrigger::DeepLink.runs_navigate_actions());
    }
}
