//! Outbound follow-up actions (CRM escalation, logging, risk alerts).
//!
//! Callers get an immediate acknowledgment; delivery runs on a detached
//! task and its terminal outcome only ever lands in the shared store.

pub mod endpoints;
pub mod transport;
pub mod dispatcher;

pub use endpoints::*;
pub use transport::*;
pub use dispatcher::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ActionKind, ActionStatus};

/// Producer name for every terminal dispatch record.
pub const DISPATCHER_AGENT: &str = "ActionDispatcher";

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Endpoint answered with status {0}")]
    Status(u16),

    #[error("Unknown action type: {0}")]
    UnknownActionKind(String),

    #[error("Action {action} failed after {attempts} attempts")]
    Exhausted { action: ActionKind, attempts: u32 },
}

/// Synchronous answer to a trigger request. Always `triggered_async`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionAck {
    pub status: ActionStatus,
    pub action: ActionKind,
}

impl ActionAck {
    pub fn triggered(action: ActionKind) -> Self {
        Self {
            status: ActionStatus::TriggeredAsync,
            action,
        }
    }
}

/// Terminal result of one background delivery, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub status: ActionStatus,
    pub action: ActionKind,
    pub payload: serde_json::Value,
    pub attempts: u32,
}

impl ActionOutcome {
    pub fn into_record(self) -> serde_json::Value {
        serde_json::json!({
            "status": self.status,
            "action": self.action,
            "payload": self.payload,
            "attempts": self.attempts,
        })
    }
}

/// Narrow seam agents use to request a follow-up action.
pub trait ActionTrigger: Send + Sync {
    fn trigger(&self, action: ActionKind, payload: serde_json::Value) -> ActionAck;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records trigger calls instead of delivering them.
    #[derive(Default)]
    pub(crate) struct RecordingTrigger {
        pub calls: Mutex<Vec<(ActionKind, serde_json::Value)>>,
    }

    impl RecordingTrigger {
        pub(crate) fn kinds(&self) -> Vec<ActionKind> {
            self.calls.lock().unwrap().iter().map(|(k, _)| *k).collect()
        }
    }

    impl ActionTrigger for RecordingTrigger {
        fn trigger(&self, action: ActionKind, payload: serde_json::Value) -> ActionAck {
            self.calls.lock().unwrap().push((action, payload));
            ActionAck::triggered(action)
        }
    }
}
