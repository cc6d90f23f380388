//! Logical "go to step" requests and their resolution to flat indices.

use super::Experience;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A logical step target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StepReference {
    /// Step with this id, anywhere in the experience
    Id(Uuid),
    /// Absolute flat index
    Index(usize),
    /// Relative to the current flat index
    Offset(isize),
    /// Page within the current step's container
    GroupPage(usize),
}

impl StepReference {
    /// Resolve to a flat step index of `experience`, given the current flat
    /// index. Returns `None` when the target does not exist.
    ///
    /// Pure and total.
    pub fn resolve(&self, experience: &Experience, current: usize) -> Option<usize> {
        let count = experience.flat_step_count();
        let in_bounds = |index: usize| (index < count).then_some(index);

        match *self {
            Self::Id(id) => experience.flat_steps().position(|step| step.id == id),
            Self::Index(index) => in_bounds(index),
            Self::Offset(offset) => current.checked_add_signed(offset).and_then(in_bounds),
            Self::GroupPage(page) => {
                let group = experience.group_index(current)?;
                let position = experience.step_index_in_group(current)?;
                let size = experience.step_containers().get(group)?.steps.len();
                (page < size).then(|| current - position + page)
            }
        }
    }
}

impl fmt::Display for StepReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Index(index) => write!(f, "index {index}"),
            Self::Offset(offset) => write!(f, "offset {offset:+}"),
            Self::GroupPage(page) => write!(f, "group page {page}"),
        }
    }
}
