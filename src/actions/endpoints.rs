use std::collections::HashMap;

use crate::models::ActionKind;

/// Outbound URL per action kind. A kind missing from the table is
/// reported as an unknown action type at delivery time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTable {
    urls: HashMap<ActionKind, String>,
}

impl EndpointTable {
    pub fn empty() -> Self {
        Self {
            urls: HashMap::new(),
        }
    }

    pub fn standard() -> Self {
        Self::empty()
            .with(ActionKind::CrmEscalate, "http://example.com/crm/escalate")
            .with(ActionKind::CrmLog, "http://example.com/crm/log")
            .with(ActionKind::RiskAlert, "http://example.com/risk_alert")
            .with(ActionKind::TicketCreate, "http://example.com/ticket/create")
    }

    pub fn with(mut self, kind: ActionKind, url: impl Into<String>) -> Self {
        self.urls.insert(kind, url.into());
        self
    }

    pub fn set(&mut self, kind: ActionKind, url: impl Into<String>) {
        self.urls.insert(kind, url.into());
    }

    pub fn url_for(&self, kind: ActionKind) -> Option<&str> {
        self.urls.get(&kind).map(String::as_str)
    }
}

impl Default for EndpointTable {
    fn default() -> Self {
        Self::standard()
    }
}
