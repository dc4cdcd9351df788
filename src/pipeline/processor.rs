//! Intake orchestrator.
//!
//! Single entry point that drives one payload through the pipeline:
//! classify → record metadata → route to an agent → follow-up actions.
//!
//! Uses trait-based DI for every collaborator (Classifier, TextExtractor,
//! ActionTrigger, SharedStore) so it stays testable with mocks. The call
//! is synchronous; follow-up actions are acknowledged, never awaited.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use super::agents::{
    AgentFailure, AgentOutput, EmailAgent, ExtractionAgent, JsonAgent, PdfAgent,
};
use super::classify::{Classifier, IntentTable, KeywordClassifier};
use super::extraction::TextExtractor;
use super::input::RawInput;
use crate::actions::ActionTrigger;
use crate::db::SharedStore;
use crate::models::{ActionKind, Classification, Format};

/// Source recorded when the caller does not name one.
pub const DEFAULT_SOURCE: &str = "user_input";

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// What an intake call returns to its caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntakeResponse {
    /// Classification used for routing (after the Unknown→JSON upgrade).
    pub classification: Classification,
    pub extraction: AgentOutput,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct IntakeProcessor {
    store: Arc<dyn SharedStore>,
    classifier: Box<dyn Classifier>,
    actions: Arc<dyn ActionTrigger>,
    json: JsonAgent,
    email: EmailAgent,
    pdf: PdfAgent,
}

impl IntakeProcessor {
    pub fn new(
        store: Arc<dyn SharedStore>,
        actions: Arc<dyn ActionTrigger>,
        extractor: Box<dyn TextExtractor>,
    ) -> Self {
        Self::with_intents(store, actions, extractor, IntentTable::standard())
    }

    /// Build with a custom intent table shared by the classifier and the
    /// email agent.
    pub fn with_intents(
        store: Arc<dyn SharedStore>,
        actions: Arc<dyn ActionTrigger>,
        extractor: Box<dyn TextExtractor>,
        intents: IntentTable,
    ) -> Self {
        Self {
            classifier: Box::new(KeywordClassifier::new(intents.clone())),
            json: JsonAgent::new(Arc::clone(&store)),
            email: EmailAgent::new(Arc::clone(&store), Arc::clone(&actions), intents),
            pdf: PdfAgent::new(Arc::clone(&store), extractor),
            store,
            actions,
        }
    }

    /// Swap the classification strategy without touching routing.
    pub fn with_classifier(mut self, classifier: Box<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn handle(&self, raw: &RawInput) -> IntakeResponse {
        self.handle_from(DEFAULT_SOURCE, raw)
    }

    /// Full pipeline for one payload.
    ///
    /// 1. Classify (format + intent)
    /// 2. Upgrade Unknown to JSON if the payload parses as JSON
    /// 3. Record intake metadata
    /// 4. Route to the matching agent
    /// 5. Trigger `risk_alert` if the JSON agent reported anomalies
    pub fn handle_from(&self, source: &str, raw: &RawInput) -> IntakeResponse {
        let intake_id = Uuid::new_v4();
        let span = tracing::info_span!("intake", %intake_id, source);
        let _enter = span.enter();

        let mut classification = self.classifier.classify(raw);
        if classification.format == Format::Unknown && raw.parse_json().is_ok() {
            tracing::debug!("Unknown format parses as JSON, routing as JSON");
            classification.format = Format::Json;
        }

        tracing::info!(
            format = %classification.format,
            intent = %classification.intent,
            bytes = raw.len(),
            "Intake classified"
        );

        if let Err(e) = self.store.record_metadata(source, &classification) {
            tracing::warn!(error = %e, "Failed to record intake metadata");
        }

        let extraction = match self.agent_for(classification.format) {
            Some(agent) => run_agent(agent, raw),
            None => AgentOutput::Failed(AgentFailure::new("Unknown format")),
        };

        if classification.format == Format::Json && !extraction.anomalies().is_empty() {
            let payload = json!({
                "details": extraction.anomalies(),
                "timestamp": Utc::now().to_rfc3339(),
            });
            self.actions.trigger(ActionKind::RiskAlert, payload);
        }

        IntakeResponse {
            classification,
            extraction,
        }
    }

    fn agent_for(&self, format: Format) -> Option<&dyn ExtractionAgent> {
        match format {
            Format::Json => Some(&self.json),
            Format::Email => Some(&self.email),
            Format::Pdf => Some(&self.pdf),
            Format::Unknown => None,
        }
    }
}

/// Run one agent; a panic inside it becomes a `Processing failed` output.
fn run_agent(agent: &dyn ExtractionAgent, raw: &RawInput) -> AgentOutput {
    match catch_unwind(AssertUnwindSafe(|| agent.process(raw))) {
        Ok(output) => output,
        Err(panic) => {
            let details = panic_message(panic.as_ref());
            tracing::error!(agent = agent.name(), details = %details, "Extraction agent panicked");
            AgentOutput::Failed(AgentFailure::with_details("Processing failed", details))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|msg| msg.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "agent panicked".to_string())
}
