//! Contracts that experience traits must satisfy to take part in step
//! presentation.
//!
//! Traits are pluggable behaviors attached to a step container or a step.
//! The state machine only consumes two kinds:
//!
//! - [`PresentingTrait`]: puts a container's UI on screen and takes it down
//! - [`MetadataSettingTrait`]: produces key/value metadata consumed by other
//!   traits while a step is being prepared
//!
//! Both report failures as a [`TraitError`]. A failure carrying a
//! `retry_after` delay is retriable; anything else is fatal for the step.

use crate::experience::Experience;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Key/value bag produced by metadata traits. `Value::Null` stands for an
/// absent value.
pub type Metadata = HashMap<String, serde_json::Value>;

/// Failure raised by a trait while producing metadata or presenting.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct TraitError {
    /// Human readable reason, surfaced in the resulting step error
    pub message: String,
    /// When set, the work may be retried after this delay
    pub retry_after: Option<Duration>,
}

impl TraitError {
    /// A fatal trait failure.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retry_after: None,
        }
    }

    /// A failure that should be retried after `delay`.
    pub fn retry_after(message: impl Into<String>, delay: Duration) -> Self {
        Self {
            message: message.into(),
            retry_after: Some(delay),
        }
    }

    pub fn is_retriable(&self) -> bool {
        self.retry_after.is_some()
    }
}

/// Presents and removes the UI of one step container.
#[async_trait]
pub trait PresentingTrait: Send + Sync {
    /// Put the container holding `flat_step_index` on screen.
    async fn present(
        &self,
        experience: &Experience,
        flat_step_index: usize,
        metadata: &Metadata,
    ) -> Result<(), TraitError>;

    /// Tear the container UI down. Must tolerate being called when nothing
    /// is presented.
    async fn remove(&self);
}

/// Produces metadata for a step before it is presented.
#[async_trait]
pub trait MetadataSettingTrait: Send + Sync {
    async fn produce_metadata(&self) -> Result<Metadata, TraitError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retriable_errors_carry_delay() {
        let error = TraitError::retry_after("image not loaded", Duration::from_millis(50));

        assert!(error.is_retriable());
        assert_eq!(error.retry_after, Some(Duration::from_millis(50)));
        assert_eq!(error.to_string(), "image not loaded");
    }

    #[test]
    fn plain_errors_are_fatal() {
        let error = TraitError::new("missing layout");

        assert!(!error.is_retriable());
        assert_eq!(error.retry_after, None);
    }
}
