pub mod config;
pub mod models;
pub mod pipeline;
pub mod taxonomy;

pub use models::enums::{Category, Polarity, ReportVariant, Severity, Strength};
pub use models::report::Report;
pub use pipeline::extraction::{
    extract_report, extract_report_bytes, extract_report_with, ExtractionError, ExtractionOptions,
    ReportExtractor, ReportParser,
};
pub use pipeline::validation::{
    resolve_pattern_cards, validate_analysis_json, validate_analysis_patterns, DetectedMicro,
    DetectedPattern, ResolvedCard, ValidationError,
};
pub use taxonomy::{PatternLibrary, PatternRating, TaxonomyError};

use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber filtered by `RUST_LOG`, falling back to
/// the crate default. Safe to call more than once; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}
