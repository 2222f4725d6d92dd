use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::enums::{Category, Polarity};

/// Top-level named behavioral pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroPattern {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub polarity: Polarity,
    pub summary: String,
    #[serde(default)]
    pub behavioral_signals: Vec<String>,
}

/// Fine-grained observable signal offered as evidence for a macro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroPattern {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub macro_id: String,
}

/// Counter table entry, keyed by the negative macro id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterEntry {
    pub counter_id: String,
    #[serde(default)]
    pub counter_name: Option<String>,
    pub rationale: String,
}

// On-disk table shapes (one JSON file each).

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MacroTable {
    pub macros: Vec<MacroPattern>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MicroTable {
    pub micros: Vec<MicroPattern>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingTable {
    pub mapping: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CounterTable {
    pub counters: BTreeMap<String, CounterEntry>,
}

/// The four declarative tables a [`super::PatternLibrary`] is built from.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyTables {
    pub macros: MacroTable,
    pub micros: MicroTable,
    pub mapping: MappingTable,
    pub counters: CounterTable,
}

/// A resolved counter pattern: the positive macro to substitute and why.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterPattern<'a> {
    pub counter: &'a MacroPattern,
    pub rationale: &'a str,
}

/// Aggregate sizes of a loaded taxonomy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatternCounts {
    pub total_macros: usize,
    pub positive_macros: usize,
    pub negative_macros: usize,
    pub total_micros: usize,
    pub positive_micros: usize,
    pub negative_micros: usize,
    pub by_category: BTreeMap<Category, usize>,
}
