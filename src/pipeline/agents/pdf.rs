use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;

use super::{persist_fields, AgentFailure, AgentOutput, ExtractionAgent};
use crate::db::SharedStore;
use crate::pipeline::extraction::TextExtractor;
use crate::pipeline::input::RawInput;

pub const PDF_AGENT: &str = "PDFAgent";

/// Invoice totals strictly above this are flagged.
pub const HIGH_TOTAL_THRESHOLD: f64 = 10_000.0;

const POLICY_KEYWORDS: [&str; 4] = ["GDPR", "FDA", "HIPAA", "CCPA"];

static LINE_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<item>\w+)\s+(?P<qty>\d+)\s+\$?(?P<price>[\d,.]+)").unwrap()
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceLine {
    pub item: String,
    pub quantity: i64,
    pub price: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfExtraction {
    pub extracted_text: String,
    pub num_pages: usize,
    pub invoice_lines: Vec<InvoiceLine>,
    pub invoice_total: f64,
    pub policy_flags: Vec<String>,
    pub flags: Vec<String>,
}

/// Scan text for `item qty [$]price` triples. Matches whose quantity or
/// price does not parse are skipped one by one.
pub fn parse_invoice_lines(text: &str) -> Vec<InvoiceLine> {
    LINE_ITEM
        .captures_iter(text)
        .filter_map(|caps| {
            let quantity: i64 = caps["qty"].parse().ok()?;
            let price: f64 = caps["price"].replace(',', "").parse().ok()?;
            Some(InvoiceLine {
                item: caps["item"].to_string(),
                quantity,
                price,
                total: quantity as f64 * price,
            })
        })
        .collect()
}

pub fn detect_policies(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    POLICY_KEYWORDS
        .iter()
        .filter(|keyword| lower.contains(&keyword.to_lowercase()))
        .map(|keyword| keyword.to_string())
        .collect()
}

/// Invoice line-item and compliance scan over a document's text layer.
pub struct PdfAgent {
    store: Arc<dyn SharedStore>,
    extractor: Box<dyn TextExtractor>,
}

impl PdfAgent {
    pub fn new(store: Arc<dyn SharedStore>, extractor: Box<dyn TextExtractor>) -> Self {
        Self { store, extractor }
    }
}

impl ExtractionAgent for PdfAgent {
    fn name(&self) -> &'static str {
        PDF_AGENT
    }

    fn process(&self, raw: &RawInput) -> AgentOutput {
        let document = match self.extractor.extract(raw.as_bytes()) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(error = %e, "PDF text extraction failed");
                return AgentOutput::Failed(AgentFailure::with_details(
                    "Failed to process PDF",
                    e,
                ));
            }
        };

        let text = document.full_text();
        let invoice_lines = parse_invoice_lines(&text);
        let invoice_total: f64 = invoice_lines.iter().map(|line| line.total).sum();
        let policy_flags = detect_policies(&text);

        let mut flags = Vec::new();
        if invoice_total > HIGH_TOTAL_THRESHOLD {
            flags.push("High Invoice Total".to_string());
        }
        if !policy_flags.is_empty() {
            flags.push(format!("Policy Mentions: {}", policy_flags.join(", ")));
        }

        let extraction = PdfExtraction {
            extracted_text: text,
            num_pages: document.page_count(),
            invoice_lines,
            invoice_total,
            policy_flags,
            flags,
        };

        persist_fields(self.store.as_ref(), PDF_AGENT, &extraction);

        tracing::info!(
            pages = extraction.num_pages,
            lines = extraction.invoice_lines.len(),
            total = extraction.invoice_total,
            "PDF processed"
        );

        AgentOutput::Pdf(extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::pipeline::extraction::{ExtractedDocument, ExtractionError};

    /// Mock extractor returning fixed pages, or failing.
    struct MockExtractor {
        pages: Option<Vec<String>>,
    }

    impl TextExtractor for MockExtractor {
        fn extract(&self, _bytes: &[u8]) -> Result<ExtractedDocument, ExtractionError> {
            match &self.pages {
                Some(pages) => Ok(ExtractedDocument::new(pages.clone())),
                None => Err(ExtractionError::PdfParsing("corrupt xref".into())),
            }
        }
    }

    fn agent(pages: Option<Vec<&str>>) -> (PdfAgent, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let extractor = MockExtractor {
            pages: pages.map(|p| p.into_iter().map(String::from).collect()),
        };
        (PdfAgent::new(store.clone(), Box::new(extractor)), store)
    }

    fn extraction(output: AgentOutput) -> PdfExtraction {
        match output {
            AgentOutput::Pdf(extraction) => extraction,
            other => panic!("expected PDF extraction, got {other:?}"),
        }
    }

    #[test]
    fn high_total_flagged_without_policies() {
        let (agent, store) = agent(Some(vec!["Widget 150 $100.00"]));
        let result = extraction(agent.process(&RawInput::from(b"%PDF-1.4".as_slice())));

        assert_eq!(
            result.invoice_lines,
            vec![InvoiceLine {
                item: "Widget".into(),
                quantity: 150,
                price: 100.0,
                total: 15000.0,
            }]
        );
        assert_eq!(result.invoice_total, 15000.0);
        assert!(result.flags.contains(&"High Invoice Total".to_string()));
        assert!(result.policy_flags.is_empty());
        assert_eq!(result.num_pages, 1);

        let rows = store.fields().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].agent, PDF_AGENT);
        assert_eq!(rows[0].data["invoice_total"], 15000.0);
    }

    #[test]
    fn thousands_separators_are_stripped() {
        let lines = parse_invoice_lines("Server 2 $1,250.50\nCable 10 3");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].price, 1250.5);
        assert_eq!(lines[0].total, 2501.0);
        assert_eq!(lines[1].item, "Cable");
        assert_eq!(lines[1].total, 30.0);
    }

    #[test]
    fn malformed_prices_are_skipped() {
        let lines = parse_invoice_lines("Bolt 3 1.2.3\nNut 4 $2.50");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item, "Nut");
    }

    #[test]
    fn total_at_threshold_is_not_flagged() {
        let (agent, _store) = agent(Some(vec!["Desk 100 $100"]));
        let result = extraction(agent.process(&RawInput::from(b"%PDF".as_slice())));
        assert_eq!(result.invoice_total, 10_000.0);
        assert!(result.flags.is_empty());
    }

    #[test]
    fn policy_mentions_case_insensitive_in_keyword_order() {
        let (agent, _store) = agent(Some(vec!["Subject to hipaa. ", "Also gdpr applies."]));
        let result = extraction(agent.process(&RawInput::from(b"%PDF".as_slice())));
        assert_eq!(result.policy_flags, vec!["GDPR".to_string(), "HIPAA".to_string()]);
        assert_eq!(result.flags, vec!["Policy Mentions: GDPR, HIPAA".to_string()]);
        assert_eq!(result.num_pages, 2);
    }

    #[test]
    fn extractor_failure_is_error_shaped() {
        let (agent, store) = agent(None);
        let output = agent.process(&RawInput::from(b"%PDF-garbage".as_slice()));
        match output {
            AgentOutput::Failed(failure) => {
                assert_eq!(failure.error, "Failed to process PDF");
                assert!(failure.details.unwrap().contains("corrupt xref"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(store.fields().unwrap().is_empty());
    }

    #[test]
    fn real_pdf_through_pdf_extract() {
        use crate::pipeline::extraction::pdf::tests::make_test_pdf;
        use crate::pipeline::extraction::PdfTextExtractor;

        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let agent = PdfAgent::new(store, Box::new(PdfTextExtractor));
        let bytes = make_test_pdf(&["Gadget 3 $20.00 FDA"]);
        let result = extraction(agent.process(&RawInput::from(bytes)));

        assert_eq!(result.num_pages, 1);
        assert_eq!(result.policy_flags, vec!["FDA".to_string()]);
        assert_eq!(result.invoice_total, 60.0);
    }
}
