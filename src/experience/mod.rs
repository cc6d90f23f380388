//! Experience content model.
//!
//! Experiences arrive from the data layer already parsed. This module holds
//! the immutable value types, flat step addressing, step reference
//! resolution and load-time validation.

mod model;
mod step_reference;
pub mod validation;

pub use model::{Experience, ExperienceTrigger, RenderContext, Step, StepContainer};
pub use step_reference::StepReference;
pub use validation::{validate, ValidationViolation};
