//! Effectful shell around the pure transition table.
//!
//! [`StateMachine`] owns the live state of one render context. It swaps in
//! the states [`crate::core::transition`] computes, publishes them, and runs
//! the side effects they request: presenting containers, producing step
//! metadata, waiting on dismiss continuations and processing completion
//! actions.
//!
//! # Key Concepts
//!
//! - **Serialized submissions**: one action and all of its continuations run
//!   to completion before the next submission is looked at
//! - **Publish first**: every state is visible to observers before its side
//!   effect starts
//! - **Contained failures**: trait failures become step errors and return
//!   the machine to idle instead of escaping

mod machine;
pub mod presentation;

pub use machine::StateMachine;
