//! Partition keys
//!
//! A partition key groups every pending rule and scheduled operation that
//! belongs to one logical interaction of one requestor. Starting a new
//! interaction clears everything under its key, so a stale walk or
//! expedition can never fire for an abandoned request.

use crate::models::CreatureId;
use crate::operations::OperationKind;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionKey {
    requestor: CreatureId,
    /// `None` for world rules that belong to no interaction
    interaction: Option<OperationKind>,
}

impl PartitionKey {
    /// Key of the interaction `kind` started by `requestor`
    pub fn for_operation(requestor: CreatureId, kind: OperationKind) -> Self {
        Self {
            requestor,
            interaction: Some(kind),
        }
    }

    /// Key under which configured world rules live
    pub fn world() -> Self {
        Self {
            requestor: CreatureId::NONE,
            interaction: None,
        }
    }

    pub fn requestor(&self) -> CreatureId {
        self.requestor
    }

    pub fn interaction(&self) -> Option<OperationKind> {
        self.interaction
    }

    pub fn is_world(&self) -> bool {
        self.interaction.is_none() && self.requestor.is_none()
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.interaction {
            Some(kind) => write!(f, "{}/{}", self.requestor, kind),
            None => write!(f, "{}/world", self.requestor),
        }
    }
}
