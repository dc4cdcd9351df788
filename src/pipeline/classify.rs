//! Format and intent tagging for raw intake payloads.
//!
//! Classification is pure and total: any byte sequence yields a
//! [`Classification`], with `Unknown` / `General` as the fallbacks.

use super::input::RawInput;
use crate::models::{Classification, Format, Intent};

const PDF_MAGIC: &[u8] = b"%PDF";
const EMAIL_MARKERS: [&str; 2] = ["From:", "Subject:"];

/// Strategy for tagging a raw input. Swappable without touching routing.
pub trait Classifier: Send + Sync {
    fn classify(&self, raw: &RawInput) -> Classification;
}

/// Ordered keyword → intent pairs. First keyword found wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentTable {
    entries: Vec<(String, Intent)>,
}

impl IntentTable {
    /// Keywords are matched case-insensitively; they are stored lowercased.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Intent)>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(keyword, intent)| (keyword.as_ref().to_lowercase(), intent))
                .collect(),
        }
    }

    pub fn standard() -> Self {
        Self::new([
            ("invoice", Intent::Invoice),
            ("rfq", Intent::Rfq),
            ("complaint", Intent::Complaint),
            ("regulation", Intent::Regulation),
        ])
    }

    pub fn detect(&self, text: &str) -> Intent {
        let lower = text.to_lowercase();
        self.entries
            .iter()
            .find(|(keyword, _)| lower.contains(keyword.as_str()))
            .map(|(_, intent)| *intent)
            .unwrap_or(Intent::General)
    }
}

impl Default for IntentTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Structural format check: PDF magic, then JSON, then email headers.
pub fn detect_format(raw: &RawInput) -> Format {
    if raw.as_bytes().starts_with(PDF_MAGIC) {
        return Format::Pdf;
    }

    let Ok(text) = raw.as_text() else {
        return Format::Unknown;
    };

    if serde_json::from_str::<serde_json::Value>(text).is_ok() {
        Format::Json
    } else if EMAIL_MARKERS.iter().any(|marker| text.contains(marker)) {
        Format::Email
    } else {
        Format::Unknown
    }
}

/// Default classifier: structural format detection plus an [`IntentTable`].
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier {
    intents: IntentTable,
}

impl KeywordClassifier {
    pub fn new(intents: IntentTable) -> Self {
        Self { intents }
    }

    pub fn intents(&self) -> &IntentTable {
        &self.intents
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, raw: &RawInput) -> Classification {
        Classification::new(detect_format(raw), self.intents.detect(&raw.lossy_text()))
    }
}
