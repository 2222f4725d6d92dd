//! Referential checks of detected patterns against the taxonomy.
//!
//! Validation is fail-fast: the first unknown or mis-nested reference
//! aborts the pass, since one hallucinated id means the payload as a whole
//! should not be trusted.

pub mod resolve;
pub mod types;

pub use resolve::*;
pub use types::*;

use serde::Deserialize;
use thiserror::Error;

use crate::taxonomy::PatternLibrary;

// ── Error Type ──────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid macro pattern: {0}")]
    UnknownMacro(String),

    #[error("Invalid micro pattern: {0}")]
    UnknownMicro(String),

    #[error("Micro {micro_id} should map to {expected}, not {found}")]
    MisnestedMicro {
        micro_id: String,
        expected: String,
        found: String,
    },

    #[error("Malformed analysis payload: {0}")]
    MalformedPayload(String),
}

// ── Validation ──────────────────────────────────────────

/// Check every macro and micro id and each micro's nesting, in order.
/// On success the same slice is handed back unchanged.
pub fn validate_analysis_patterns<'a>(
    library: &PatternLibrary,
    patterns: &'a [DetectedPattern],
) -> Result<&'a [DetectedPattern], ValidationError> {
    for pattern in patterns {
        if !library.is_valid_macro(&pattern.macro_id) {
            tracing::warn!(macro_id = %pattern.macro_id, "Unknown macro in analysis");
            return Err(ValidationError::UnknownMacro(pattern.macro_id.clone()));
        }

        for micro in &pattern.detected_micros {
            if !library.is_valid_micro(&micro.micro_id) {
                tracing::warn!(
                    macro_id = %pattern.macro_id,
                    micro_id = %micro.micro_id,
                    "Unknown micro in analysis"
                );
                return Err(ValidationError::UnknownMicro(micro.micro_id.clone()));
            }

            if !library.validate_mapping(&micro.micro_id, &pattern.macro_id) {
                let expected = library
                    .get_macro_for_micro(&micro.micro_id)
                    .map(|m| m.id.as_str())
                    .or_else(|| library.get_micro(&micro.micro_id).map(|m| m.macro_id.as_str()))
                    .unwrap_or("unmapped")
                    .to_string();
                tracing::warn!(
                    micro_id = %micro.micro_id,
                    expected = %expected,
                    found = %pattern.macro_id,
                    "Micro nested under the wrong macro"
                );
                return Err(ValidationError::MisnestedMicro {
                    micro_id: micro.micro_id.clone(),
                    expected,
                    found: pattern.macro_id.clone(),
                });
            }
        }
    }
    Ok(patterns)
}

/// Upstream payloads send either a bare list or a wrapper object.
#[derive(Deserialize)]
#[serde(untagged)]
enum AnalysisPayload {
    List(Vec<DetectedPattern>),
    Wrapped {
        #[serde(alias = "detected_patterns")]
        patterns: Vec<DetectedPattern>,
    },
}

/// Parse an upstream JSON payload, then validate it.
pub fn validate_analysis_json(
    library: &PatternLibrary,
    payload: &str,
) -> Result<Vec<DetectedPattern>, ValidationError> {
    let patterns = match serde_json::from_str::<AnalysisPayload>(payload) {
        Ok(AnalysisPayload::List(p)) | Ok(AnalysisPayload::Wrapped { patterns: p }) => p,
        Err(e) => {
            tracing::warn!(error = %e, "Analysis payload did not parse");
            return Err(ValidationError::MalformedPayload(e.to_string()));
        }
    };
    validate_analysis_patterns(library, &patterns)?;
    Ok(patterns)
}
