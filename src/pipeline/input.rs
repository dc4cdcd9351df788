use std::borrow::Cow;

use super::extraction::ExtractionError;

/// One intake payload, as it arrived. Lives for a single intake call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    Bytes(Vec<u8>),
    Text(String),
}

impl RawInput {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(bytes) => bytes,
            Self::Text(text) => text.as_bytes(),
        }
    }

    /// Strict UTF-8 view. Fails for binary payloads.
    pub fn as_text(&self) -> Result<&str, ExtractionError> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Bytes(bytes) => std::str::from_utf8(bytes)
                .map_err(|e| ExtractionError::Encoding(e.to_string())),
        }
    }

    /// Text view with invalid sequences replaced; never fails.
    pub fn lossy_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Bytes(bytes) => String::from_utf8_lossy(bytes),
        }
    }

    /// Decode as UTF-8 and parse as a JSON document.
    pub fn parse_json(&self) -> Result<serde_json::Value, ExtractionError> {
        Ok(serde_json::from_str(self.as_text()?)?)
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl From<Vec<u8>> for RawInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for RawInput {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<String> for RawInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RawInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}
