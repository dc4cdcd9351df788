use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::{persist_fields, AgentFailure, AgentOutput, ExtractionAgent};
use crate::db::SharedStore;
use crate::pipeline::extraction::ExtractionError;
use crate::pipeline::input::RawInput;

pub const JSON_AGENT: &str = "JSONAgent";
pub const JSON_ALERT: &str = "JSONAgent_Alert";

const REQUIRED_FIELDS: [&str; 2] = ["id", "type"];

/// Canonical `{id, type, attributes}` projection of an arbitrary object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedRecord {
    pub id: Value,
    #[serde(rename = "type")]
    pub kind: Value,
    pub attributes: Value,
}

impl ProjectedRecord {
    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            id: object.get("id").cloned().unwrap_or(Value::Null),
            kind: object.get("type").cloned().unwrap_or(Value::Null),
            attributes: object.get("attributes").cloned().unwrap_or_else(|| json!({})),
        }
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .into_iter()
            .zip([&self.id, &self.kind])
            .filter(|(_, value)| value.is_null())
            .map(|(name, _)| name)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonExtraction {
    pub projected_shape: ProjectedRecord,
    pub anomalies: Vec<String>,
}

/// Projects JSON objects and flags missing identifiers.
pub struct JsonAgent {
    store: Arc<dyn SharedStore>,
}

impl JsonAgent {
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self { store }
    }
}

impl ExtractionAgent for JsonAgent {
    fn name(&self) -> &'static str {
        JSON_AGENT
    }

    fn process(&self, raw: &RawInput) -> AgentOutput {
        let object = match raw.parse_json() {
            Ok(Value::Object(object)) => object,
            Ok(other) => {
                let e = ExtractionError::NotAnObject(json_kind(&other));
                return AgentOutput::Failed(AgentFailure::with_details("Invalid JSON format", e));
            }
            Err(e @ ExtractionError::Encoding(_)) => {
                return AgentOutput::Failed(AgentFailure::with_details("Invalid encoding", e));
            }
            Err(e) => {
                return AgentOutput::Failed(AgentFailure::with_details("Invalid JSON format", e));
            }
        };

        let projected_shape = ProjectedRecord::from_object(&object);
        let missing = projected_shape.missing_fields();
        let anomalies = if missing.is_empty() {
            Vec::new()
        } else {
            vec![format!("Missing fields: {}", missing.join(", "))]
        };

        persist_fields(self.store.as_ref(), JSON_AGENT, &projected_shape);

        if !anomalies.is_empty() {
            tracing::info!(anomalies = ?anomalies, "JSON anomaly detected");
            let alert = json!({
                "alert_type": "JSON Anomaly",
                "details": anomalies,
                "timestamp": Utc::now().to_rfc3339(),
            });
            persist_fields(self.store.as_ref(), JSON_ALERT, &alert);
        }

        AgentOutput::Json(JsonExtraction {
            projected_shape,
            anomalies,
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;

    fn agent() -> (JsonAgent, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        (JsonAgent::new(store.clone()), store)
    }

    fn extraction(output: AgentOutput) -> JsonExtraction {
        match output {
            AgentOutput::Json(extraction) => extraction,
            other => panic!("expected JSON extraction, got {other:?}"),
        }
    }

    #[test]
    fn complete_object_has_no_anomalies() {
        let (agent, store) = agent();
        let output = agent.process(&RawInput::from(
            r#"{"id":"123","type":"order","attributes":{"item":"book"}}"#,
        ));
        let result = extraction(output);

        assert!(result.anomalies.is_empty());
        assert_eq!(result.projected_shape.id, json!("123"));
        assert_eq!(result.projected_shape.attributes, json!({"item": "book"}));

        let rows = store.fields().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].agent, JSON_AGENT);
        assert_eq!(
            rows[0].data,
            json!({"id": "123", "type": "order", "attributes": {"item": "book"}})
        );
    }

    #[test]
    fn missing_id_writes_alert() {
        let (agent, store) = agent();
        let result = extraction(agent.process(&RawInput::from(r#"{"type":"order"}"#)));

        assert_eq!(result.anomalies, vec!["Missing fields: id".to_string()]);
        assert_eq!(result.projected_shape.attributes, json!({}));

        let rows = store.fields().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].agent, JSON_ALERT);
        assert_eq!(rows[1].data["alert_type"], "JSON Anomaly");
        assert_eq!(rows[1].data["details"], json!(["Missing fields: id"]));
    }

    #[test]
    fn null_fields_count_as_missing() {
        let (agent, _store) = agent();
        let result = extraction(agent.process(&RawInput::from(r#"{"id":null}"#)));
        assert_eq!(result.anomalies, vec!["Missing fields: id, type".to_string()]);
    }

    #[test]
    fn syntax_error_is_error_shaped() {
        let (agent, store) = agent();
        let output = agent.process(&RawInput::from("{broken"));
        match output {
            AgentOutput::Failed(failure) => {
                assert_eq!(failure.error, "Invalid JSON format");
                assert!(failure.details.is_some());
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(store.fields().unwrap().is_empty());
    }

    #[test]
    fn invalid_utf8_is_encoding_error() {
        let (agent, _store) = agent();
        let output = agent.process(&RawInput::from(vec![b'{', 0xff, b'}']));
        assert!(matches!(
            output,
            AgentOutput::Failed(AgentFailure { ref error, .. }) if error == "Invalid encoding"
        ));
    }

    #[test]
    fn top_level_array_is_rejected() {
        let (agent, _store) = agent();
        let output = agent.process(&RawInput::from("[1, 2, 3]"));
        match output {
            AgentOutput::Failed(failure) => {
                assert_eq!(failure.error, "Invalid JSON format");
                assert!(failure.details.unwrap().contains("array"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn output_shape() {
        let (agent, _store) = agent();
        let output = agent.process(&RawInput::from(r#"{"id":1,"type":"t"}"#));
        assert_eq!(
            serde_json::to_value(&output).unwrap(),
            json!({
                "projected_shape": {"id": 1, "type": "t", "attributes": {}},
                "anomalies": [],
            })
        );
    }
}
