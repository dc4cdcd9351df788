use std::sync::{Arc, LazyLock};

use chrono::Utc;
use regex::Regex;
use serde::Serialize;

use super::{persist_fields, AgentOutput, ExtractionAgent};
use crate::actions::ActionTrigger;
use crate::db::SharedStore;
use crate::models::{ActionKind, Intent, Tone, Urgency};
use crate::pipeline::classify::IntentTable;
use crate::pipeline::input::RawInput;

pub const EMAIL_AGENT: &str = "EmailAgent";
pub const EMAIL_ACTION: &str = "EmailAgent_Action";

static SENDER_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)From:\s*(.*)").unwrap());
static SENDER_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.*)<.*>").unwrap());
static CONVERSATION_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Conversation-ID:\s*(\S+)").unwrap());

// Whole-word so that "Complaint" does not read as the threat word "complain".
static THREAT_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:angry|threatening|escalate|complain)\b").unwrap());
static COURTESY_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:please|thank\s+you|kindly)\b").unwrap());

const HIGH_URGENCY: [&str; 2] = ["urgent", "asap"];
const MEDIUM_URGENCY: [&str; 2] = ["soon", "priority"];

/// CRM-style record extracted from one email.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailRecord {
    pub sender: String,
    pub intent: Intent,
    pub urgency: Urgency,
    pub tone: Tone,
    pub conversation_id: Option<String>,
    pub timestamp: String,
}

impl EmailRecord {
    /// Escalate on hostile tone or high urgency; log everything else.
    pub fn follow_up(&self) -> ActionKind {
        if self.tone == Tone::Escalation || self.urgency == Urgency::High {
            ActionKind::CrmEscalate
        } else {
            ActionKind::CrmLog
        }
    }
}

pub fn extract_sender(text: &str) -> String {
    let Some(line) = SENDER_LINE.captures(text).and_then(|c| c.get(1)) else {
        return "Unknown".to_string();
    };
    let line = line.as_str().trim();
    match SENDER_NAME.captures(line).and_then(|c| c.get(1)) {
        Some(name) => name.as_str().trim().to_string(),
        None => line.to_string(),
    }
}

pub fn extract_urgency(text: &str) -> Urgency {
    let lower = text.to_lowercase();
    if HIGH_URGENCY.iter().any(|w| lower.contains(w)) {
        Urgency::High
    } else if MEDIUM_URGENCY.iter().any(|w| lower.contains(w)) {
        Urgency::Medium
    } else {
        Urgency::Low
    }
}

pub fn identify_tone(text: &str) -> Tone {
    if THREAT_WORDS.is_match(text) {
        Tone::Escalation
    } else if COURTESY_WORDS.is_match(text) {
        Tone::Polite
    } else {
        Tone::Neutral
    }
}

pub fn extract_conversation_id(text: &str) -> Option<String> {
    CONVERSATION_ID
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parses email bodies into CRM records and requests a follow-up action.
pub struct EmailAgent {
    store: Arc<dyn SharedStore>,
    actions: Arc<dyn ActionTrigger>,
    intents: IntentTable,
}

impl EmailAgent {
    pub fn new(
        store: Arc<dyn SharedStore>,
        actions: Arc<dyn ActionTrigger>,
        intents: IntentTable,
    ) -> Self {
        Self {
            store,
            actions,
            intents,
        }
    }

    pub fn parse(&self, text: &str) -> EmailRecord {
        EmailRecord {
            sender: extract_sender(text),
            intent: self.intents.detect(text),
            urgency: extract_urgency(text),
            tone: identify_tone(text),
            conversation_id: extract_conversation_id(text),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl ExtractionAgent for EmailAgent {
    fn name(&self) -> &'static str {
        EMAIL_AGENT
    }

    fn process(&self, raw: &RawInput) -> AgentOutput {
        let record = self.parse(&raw.lossy_text());

        persist_fields(self.store.as_ref(), EMAIL_AGENT, &record);

        if let Some(conversation_id) = &record.conversation_id {
            match serde_json::to_value(&record) {
                Ok(metadata) => {
                    if let Err(e) = self.store.record_conversation(conversation_id, &metadata) {
                        tracing::warn!(
                            conversation_id = %conversation_id,
                            error = %e,
                            "Failed to store conversation"
                        );
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to serialize conversation"),
            }
        }

        let action = record.follow_up();
        let payload = serde_json::to_value(&record).unwrap_or_default();
        let ack = self.actions.trigger(action, payload);
        persist_fields(self.store.as_ref(), EMAIL_ACTION, &ack);

        tracing::info!(
            intent = %record.intent,
            urgency = %record.urgency,
            tone = %record.tone,
            action = %action,
            "Email processed"
        );

        AgentOutput::Email(record)
    }
}
