//! Pure core of the presentation state machine.
//!
//! This module contains:
//! - the [`State`] and [`Action`] unions
//! - the pure [`transition`] table and the [`SideEffect`]s it requests
//! - the machine's [`Error`] model
//! - immutable [`StateHistory`] tracking
//!
//! Nothing here performs I/O; the effectful shell lives in
//! [`crate::effects`].

mod action;
pub mod dismiss;
mod error;
mod history;
mod state;
mod transition;

pub use action::Action;
pub use dismiss::{DismissContinuation, DismissSignal};
pub use error::{Error, MachineResult};
pub use history::{StateHistory, StateTransition};
pub use state::{State, StateSnapshot, StepMetadata};
pub use transition::{transition, SideEffect, Transition};
