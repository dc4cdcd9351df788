//! Format-specific extraction agents.
//!
//! An agent never fails past its boundary: decoding problems become an
//! error-shaped [`AgentOutput::Failed`], and storage failures are logged
//! and swallowed.

pub mod json;
pub mod email;
pub mod pdf;

pub use email::*;
pub use json::*;
pub use pdf::*;

use serde::Serialize;

use super::input::RawInput;
use crate::db::SharedStore;

pub trait ExtractionAgent: Send + Sync {
    /// Producer name used for this agent's primary fields record.
    fn name(&self) -> &'static str;

    fn process(&self, raw: &RawInput) -> AgentOutput;
}

/// Whatever an agent (or the router, for unroutable input) hands back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AgentOutput {
    Json(JsonExtraction),
    Email(EmailRecord),
    Pdf(PdfExtraction),
    Failed(AgentFailure),
}

impl AgentOutput {
    /// Anomalies reported by the JSON agent; empty for everything else.
    pub fn anomalies(&self) -> &[String] {
        match self {
            Self::Json(extraction) => &extraction.anomalies,
            _ => &[],
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Error-shaped output: `{error, details?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentFailure {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AgentFailure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl ToString) -> Self {
        Self {
            error: error.into(),
            details: Some(details.to_string()),
        }
    }
}

/// Append a fields record; failures are logged and otherwise ignored.
pub(crate) fn persist_fields<T: Serialize>(store: &dyn SharedStore, agent: &str, data: &T) {
    let value = match serde_json::to_value(data) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(agent, error = %e, "Failed to serialize extracted fields");
            return;
        }
    };
    if let Err(e) = store.record_fields(agent, &value) {
        tracing::warn!(agent, error = %e, "Failed to store extracted fields");
    }
}
