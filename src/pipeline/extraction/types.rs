use serde::{Deserialize, Serialize};

use super::ExtractionError;

/// Page-ordered text pulled out of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub pages: Vec<String>,
}

impl ExtractedDocument {
    pub fn new(pages: Vec<String>) -> Self {
        Self { pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Pages concatenated in order, without separators.
    pub fn full_text(&self) -> String {
        self.pages.concat()
    }
}

/// Document text extraction abstraction (allows mocking for tests).
///
/// A malformed document is an error; implementations never return
/// partial text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedDocument, ExtractionError>;
}
