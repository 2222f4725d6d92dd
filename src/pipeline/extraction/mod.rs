pub mod cards;
pub mod call_lab;
pub mod classify;
pub mod discovery_lab;
pub mod grammar;
pub mod matchers;
pub mod orchestrator;
pub mod sanitize;

pub use classify::*;
pub use grammar::*;
pub use orchestrator::*;
pub use sanitize::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::enums::ReportVariant;

/// Input-contract failures. Raised before any extraction work starts;
/// missing sections inside an accepted document never surface here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Input is not valid UTF-8 text")]
    NotText,

    #[error("Input is empty")]
    EmptyInput,

    #[error("Could not recognize the report layout")]
    UnrecognizedVariant,

    #[error("Ambiguous report layout, candidates: {candidates:?}")]
    AmbiguousVariant { candidates: Vec<ReportVariant> },
}

/// Per-call knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionOptions {
    /// Skip cue detection and parse with this layout.
    pub variant_override: Option<ReportVariant>,
    /// Input beyond this many characters is ignored.
    pub max_input_chars: usize,
}

pub const DEFAULT_MAX_INPUT_CHARS: usize = 200_000;

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            variant_override: None,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }
}

impl ExtractionOptions {
    pub fn with_variant(variant: ReportVariant) -> Self {
        Self {
            variant_override: Some(variant),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_from_empty_json() {
        let opts: ExtractionOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, ExtractionOptions::default());
        assert_eq!(opts.max_input_chars, DEFAULT_MAX_INPUT_CHARS);
    }

    #[test]
    fn ambiguous_error_lists_candidates() {
        let err = ExtractionError::AmbiguousVariant {
            candidates: vec![ReportVariant::CallLabLite, ReportVariant::CallLabPro],
        };
        assert!(err.to_string().contains("CallLabLite"));
    }
}
