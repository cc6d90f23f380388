//! Step presentation protocol.
//!
//! Run when a step begins: navigate actions, metadata production with
//! retries, then the container's presenting trait. Every trait failure is
//! converted to a step error here and never escapes further.

use crate::actions::{ActionContext, ActionProcessing, ActionQueue, ProcessingTrigger};
use crate::core::{Error, StepMetadata};
use crate::experience::Experience;
use crate::traits::{Metadata, MetadataSettingTrait, TraitError};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Run every metadata trait of a step and merge their output.
///
/// Container-level traits run first, then the step's own, each in
/// declaration order; later keys overwrite earlier ones. When a trait fails
/// with a retry delay the whole pass is retried after that delay, up to
/// `max_attempts` passes when a ceiling is set.
#[instrument(skip(experience), fields(experience = %experience.id))]
pub async fn produce_metadata(
    experience: &Arc<Experience>,
    flat_step_index: usize,
    max_attempts: Option<u32>,
) -> Result<Metadata, Error> {
    let (Some(container), Some(step)) = (
        experience.container_for(flat_step_index),
        experience.flat_step(flat_step_index),
    ) else {
        return Err(Error::step(
            experience,
            flat_step_index,
            format!("Step {flat_step_index} does not exist"),
        ));
    };

    let traits: Vec<&Arc<dyn MetadataSettingTrait>> = container
        .metadata_traits()
        .iter()
        .chain(step.metadata_traits())
        .collect();

    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let err = match metadata_pass(&traits).await {
            Ok(metadata) => return Ok(metadata),
            Err(err) => err,
        };

        let delay = err
            .retry_after
            .filter(|_| max_attempts.is_none_or(|max| attempt < max));
        let Some(delay) = delay else {
            return Err(Error::step(experience, flat_step_index, err.message));
        };

        debug!(attempt, ?delay, error = %err, "metadata not ready, retrying");
        tokio::time::sleep(delay).await;
    }
}

async fn metadata_pass(traits: &[&Arc<dyn MetadataSettingTrait>]) -> Result<Metadata, TraitError> {
    let mut metadata = Metadata::new();
    for metadata_trait in traits {
        metadata.extend(metadata_trait.produce_metadata().await?);
    }
    Ok(metadata)
}

/// Present the container holding `flat_step_index`.
#[instrument(skip(processor, experience, metadata, pre_step_actions), fields(experience = %experience.id))]
pub async fn present_container(
    processor: &dyn ActionProcessing,
    max_attempts: Option<u32>,
    experience: &Arc<Experience>,
    flat_step_index: usize,
    metadata: &StepMetadata,
    pre_step_actions: ActionQueue,
) -> Result<(), Error> {
    if !pre_step_actions.is_empty() {
        let context = ActionContext {
            experience_id: experience.id,
            flat_step_index: Some(flat_step_index),
            trigger: ProcessingTrigger::Navigate,
        };
        processor.process(pre_step_actions, context).await;
    }

    metadata.replace(produce_metadata(experience, flat_step_index, max_attempts).await?);

    let Some(presenting) = experience
        .container_for(flat_step_index)
        .and_then(|container| container.presenting_trait())
    else {
        return Err(Error::step(
            experience,
            flat_step_index,
            format!("Unable to present step {flat_step_index}"),
        ));
    };

    presenting
        .present(experience, flat_step_index, &metadata.snapshot())
        .await
        .map_err(|err| Error::step(experience, flat_step_index, err.message))
}

/// Prepare a step whose container is already on screen. On failure the
/// container is removed, since the machine is about to return to idle.
#[instrument(skip(experience, metadata), fields(experience = %experience.id))]
pub async fn prepare_step(
    max_attempts: Option<u32>,
    experience: &Arc<Experience>,
    flat_step_index: usize,
    metadata: &StepMetadata,
) -> Result<(), Error> {
    match produce_metadata(experience, flat_step_index, max_attempts).await {
        Ok(produced) => {
            metadata.replace(produced);
            Ok(())
        }
        Err(error) => {
            if let Some(presenting) = experience
                .container_for(flat_step_index)
                .and_then(|container| container.presenting_trait())
            {
                presenting.remove().await;
            }
            Err(error)
        }
    }
}
