use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{Format, Intent};

/// Format and intent tags assigned to one raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub format: Format,
    pub intent: Intent,
}

impl Classification {
    pub fn new(format: Format, intent: Intent) -> Self {
        Self { format, intent }
    }
}

/// One row of the `metadata` table: what arrived, and how it was tagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub id: i64,
    pub source: String,
    #[serde(rename = "type")]
    pub format: Format,
    pub intent: Intent,
    pub timestamp: DateTime<Utc>,
}

/// One row of the `extracted_fields` table.
///
/// `agent` names the producer (`JSONAgent`, `JSONAgent_Alert`,
/// `ActionDispatcher`, ...). `data` is schema-free.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldsRecord {
    pub id: i64,
    pub agent: String,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// One row of the `conversations` table. Several rows may share a
/// `conversation_id`; the store appends, it never merges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: i64,
    pub conversation_id: String,
    pub metadata: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}
