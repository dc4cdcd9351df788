use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The wire name doubles as the serde name so JSON output and stored
/// columns always agree.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Format {
    Json => "JSON",
    Email => "Email",
    Pdf => "PDF",
    Unknown => "Unknown",
});

str_enum!(Intent {
    Invoice => "Invoice",
    Rfq => "RFQ",
    Complaint => "Complaint",
    Regulation => "Regulation",
    General => "General",
});

str_enum!(Urgency {
    High => "High",
    Medium => "Medium",
    Low => "Low",
});

str_enum!(Tone {
    Escalation => "escalation",
    Polite => "polite",
    Neutral => "neutral",
});

str_enum!(ActionKind {
    CrmEscalate => "crm_escalate",
    CrmLog => "crm_log",
    RiskAlert => "risk_alert",
    TicketCreate => "ticket_create",
});

str_enum!(ActionStatus {
    Success => "success",
    Failed => "failed",
    TriggeredAsync => "triggered_async",
});

impl ActionKind {
    /// Every action kind the dispatcher knows how to route.
    pub const ALL: [ActionKind; 4] = [
        ActionKind::CrmEscalate,
        ActionKind::CrmLog,
        ActionKind::RiskAlert,
        ActionKind::TicketCreate,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn format_round_trip() {
        for (variant, s) in [
            (Format::Json, "JSON"),
            (Format::Email, "Email"),
            (Format::Pdf, "PDF"),
            (Format::Unknown, "Unknown"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Format::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn intent_round_trip() {
        for (variant, s) in [
            (Intent::Invoice, "Invoice"),
            (Intent::Rfq, "RFQ"),
            (Intent::Complaint, "Complaint"),
            (Intent::Regulation, "Regulation"),
            (Intent::General, "General"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Intent::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn action_kind_round_trip() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_str(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&Format::Pdf).unwrap(), "\"PDF\"");
        assert_eq!(serde_json::to_string(&Tone::Escalation).unwrap(), "\"escalation\"");
        assert_eq!(
            serde_json::to_string(&ActionStatus::TriggeredAsync).unwrap(),
            "\"triggered_async\""
        );
        let kind: ActionKind = serde_json::from_str("\"risk_alert\"").unwrap();
        assert_eq!(kind, ActionKind::RiskAlert);
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(Format::from_str("json").is_err());
        assert!(ActionKind::from_str("page_oncall").is_err());
        assert!(Urgency::from_str("").is_err());
    }
}
