//! Experience engine: the presentation state machine behind in-app product
//! experiences.
//!
//! An experience is an ordered list of step containers, each holding one or
//! more steps. The engine walks an experience through its lifecycle
//! (beginning, presenting each step, ending) and coordinates the pluggable
//! traits that put steps on screen.
//!
//! The crate follows a "pure core, imperative shell" split. The
//! [`core::transition`] table is a pure function from state and action to the
//! next state and a requested side effect; [`effects::StateMachine`] performs
//! those effects and publishes every state it enters.
//!
//! # Core Concepts
//!
//! - **State**: where the machine is in an experience's lifecycle
//! - **Action**: a command submitted to the machine
//! - **Traits**: presenting and metadata plugins attached to containers and steps
//! - **Actions processing**: navigate, completion and interaction actions
//! - **Lifecycle**: analytics events derived from the result stream
//!
//! # Example
//!
//! ```rust
//! use experience_engine::experience::{Experience, Step, StepContainer};
//! use experience_engine::traits::{Metadata, PresentingTrait, TraitError};
//! use experience_engine::{RenderContext, StateMachine};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! struct Modal;
//!
//! #[async_trait]
//! impl PresentingTrait for Modal {
//!     async fn present(
//!         &self,
//!         _experience: &Experience,
//!         _flat_step_index: usize,
//!         _metadata: &Metadata,
//!     ) -> Result<(), TraitError> {
//!         Ok(())
//!     }
//!
//!     async fn remove(&self) {}
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let experience = Experience::new(
//!     Uuid::new_v4(),
//!     "Welcome tour",
//!     vec![StepContainer::new(Uuid::new_v4(), vec![Step::new(Uuid::new_v4())])
//!         .with_presenting_trait(Arc::new(Modal))],
//! );
//!
//! let machine = StateMachine::new(RenderContext::Modal);
//! let state = machine.start(experience).await.unwrap();
//! assert_eq!(state.name(), "RenderingStep");
//! # });
//! ```

pub mod actions;
pub mod builder;
pub mod config;
pub mod core;
pub mod effects;
pub mod experience;
pub mod lifecycle;
pub mod renderer;
pub mod traits;

// Re-export commonly used types
pub use config::MachineConfig;
pub use core::{Action, Error, MachineResult, State, StateHistory, StateTransition};
pub use effects::StateMachine;
pub use experience::{Experience, RenderContext, StepReference};
pub use renderer::ExperienceRenderer;
