//! Pattern taxonomy: macro/micro behavioral patterns, the authoritative
//! micro→macro mapping and the negative→positive counter table.
//!
//! The [`PatternLibrary`] is built once from four declarative tables and is
//! read-only afterwards; share it by reference (or `Arc`) across threads.

pub mod confidence;
pub mod library;
pub mod types;

pub use confidence::*;
pub use library::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaxonomyError {
    #[error("Failed to read pattern table {0}: {1}")]
    TableLoad(String, String),

    #[error("Failed to parse pattern table {0}: {1}")]
    TableParse(String, String),

    #[error("Duplicate macro pattern id: {0}")]
    DuplicateMacro(String),

    #[error("Duplicate micro pattern id: {0}")]
    DuplicateMicro(String),

    #[error("Micro {micro_id} references unknown macro {macro_id}")]
    DanglingMicro { micro_id: String, macro_id: String },

    #[error("Macro {0} owns no micro patterns")]
    OrphanMacro(String),

    #[error("Mapping drift for {micro_id}: mapping says {mapped}, micro says {declared}")]
    MappingDrift {
        micro_id: String,
        mapped: String,
        declared: String,
    },

    #[error("Micro {0} is missing from the mapping table")]
    UnmappedMicro(String),

    #[error("Mapping table references unknown micro {0}")]
    MappingUnknownMicro(String),

    #[error("Counter table references unknown macro {0}")]
    CounterUnknownMacro(String),

    #[error("Counter source {0} is not a negative pattern")]
    CounterSourceNotNegative(String),

    #[error("Counter target {target} for {source_id} is not a positive pattern")]
    CounterTargetNotPositive { source_id: String, target: String },

    #[error("Negative macro {0} has no counter pattern")]
    MissingCounter(String),
}
