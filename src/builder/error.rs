//! Build errors for the state machine builder.

use crate::config::ConfigError;
use thiserror::Error;

/// Errors that can occur when building a state machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Render context not specified. Call .render_context(context) before .build()")]
    MissingRenderContext,

    #[error("Invalid machine config: {0}")]
    InvalidConfig(#[from] ConfigError),
}
