use super::call_lab::{build_lite, build_pro};
use super::classify::detect_variant;
use super::discovery_lab::{build_discovery, build_discovery_pro};
use super::grammar::{grammar_for, SectionedText};
use super::sanitize::normalize_input;
use super::{ExtractionError, ExtractionOptions};
use crate::models::enums::ReportVariant;
use crate::models::report::Report;

/// Turns one report document into its typed form.
pub trait ReportExtractor {
    fn extract(&self, text: &str) -> Result<Report, ExtractionError>;

    /// Byte input must be UTF-8 text.
    fn extract_bytes(&self, bytes: &[u8]) -> Result<Report, ExtractionError> {
        let text = std::str::from_utf8(bytes).map_err(|_| ExtractionError::NotText)?;
        self.extract(text)
    }
}

/// Grammar-driven extractor. Stateless apart from its options, so one
/// instance can serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct ReportParser {
    options: ExtractionOptions,
}

impl ReportParser {
    pub fn new(options: ExtractionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractionOptions {
        &self.options
    }
}

impl ReportExtractor for ReportParser {
    fn extract(&self, text: &str) -> Result<Report, ExtractionError> {
        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyInput);
        }

        let normalized = normalize_input(text, self.options.max_input_chars);
        let variant = match self.options.variant_override {
            Some(v) => v,
            None => detect_variant(&normalized)?,
        };

        let doc = SectionedText::parse(grammar_for(variant), &normalized);
        let report = build(variant, &doc);

        tracing::debug!(
            variant = %variant,
            input_chars = normalized.chars().count(),
            overridden = self.options.variant_override.is_some(),
            sections = doc.populated_sections(),
            cards = report.pattern_cards().len(),
            "Report extraction complete"
        );
        Ok(report)
    }
}

fn build(variant: ReportVariant, doc: &SectionedText<'_>) -> Report {
    match variant {
        ReportVariant::CallLabLite => Report::CallLabLite(build_lite(doc)),
        ReportVariant::CallLabPro => Report::CallLabPro(build_pro(doc)),
        ReportVariant::DiscoveryLab => Report::DiscoveryLab(build_discovery(doc)),
        ReportVariant::DiscoveryLabPro => Report::DiscoveryLabPro(build_discovery_pro(doc)),
    }
}

/// Extract with default options: layout detected from cue phrases.
pub fn extract_report(text: &str) -> Result<Report, ExtractionError> {
    ReportParser::default().extract(text)
}

pub fn extract_report_with(text: &str, options: &ExtractionOptions) -> Result<Report, ExtractionError> {
    ReportParser::new(options.clone()).extract(text)
}

pub fn extract_report_bytes(bytes: &[u8]) -> Result<Report, ExtractionError> {
    ReportParser::default().extract_bytes(bytes)
}
