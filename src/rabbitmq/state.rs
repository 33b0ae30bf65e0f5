use std::fmt;

use super::errors::{PubSubError, Result};

/// Lifecycle of a publisher or subscriber. `start` is single-shot:
/// `Created -> Ready` on success, `Created -> Failed` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    Created,
    Ready,
    Failed,
}

impl ComponentState {
    pub(crate) fn ensure_created(self, component: &str) -> Result<()> {
        match self {
            ComponentState::Created => Ok(()),
            other => Err(PubSubError::Usage(format!(
                "{} cannot be started from state {}; construct a new instance",
                component, other
            ))),
        }
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentState::Created => f.write_str("created"),
            ComponentState::Ready => f.write_str("ready"),
            ComponentState::Failed => f.write_str("failed"),
        }
    }
}
