//! Builder for constructing state machines.

use crate::actions::{ActionProcessing, ActionProcessor};
use crate::builder::error::BuildError;
use crate::config::MachineConfig;
use crate::effects::StateMachine;
use crate::experience::RenderContext;
use std::sync::Arc;

/// Builder for constructing a [`StateMachine`] with a fluent API.
#[derive(Default)]
pub struct StateMachineBuilder {
    render_context: Option<RenderContext>,
    config: MachineConfig,
    processor: Option<Arc<dyn ActionProcessing>>,
}

impl StateMachineBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the render context the machine serves (required).
    pub fn render_context(mut self, render_context: RenderContext) -> Self {
        self.render_context = Some(render_context);
        self
    }

    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default [`ActionProcessor`].
    pub fn action_processor(mut self, processor: Arc<dyn ActionProcessing>) -> Self {
        self.processor = Some(processor);
        self
    }

    /// Build the state machine.
    /// Returns an error if the render context is missing or the config is
    /// invalid.
    pub fn build(self) -> Result<StateMachine, BuildError> {
        let render_context = self
            .render_context
            .ok_or(BuildError::MissingRenderContext)?;
        self.config.validate()?;

        let processor = self
            .processor
            .unwrap_or_else(|| Arc::new(ActionProcessor::new()));

        Ok(StateMachine::from_parts(render_context, self.config, processor))
    }
}
