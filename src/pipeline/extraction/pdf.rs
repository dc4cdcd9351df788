use super::types::{ExtractedDocument, TextExtractor};
use super::ExtractionError;

/// PDF text extractor using the pdf-extract crate.
/// Handles digital PDFs with embedded text layers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedDocument, ExtractionError> {
        // pdf-extract panics on some malformed inputs; treat that as a parse failure.
        let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
            .map_err(|_| ExtractionError::PdfParsing("parser panicked on malformed input".into()))?
            .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;
        Ok(ExtractedDocument::new(pages))
    }
}
