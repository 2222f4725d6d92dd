use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::de::DeserializeOwned;

use super::confidence::{rating_for, PatternRating};
use super::types::*;
use super::TaxonomyError;
use crate::config;
use crate::models::enums::{Category, Polarity};

pub const MACRO_TABLE_FILE: &str = "macro_patterns.json";
pub const MICRO_TABLE_FILE: &str = "micro_patterns.json";
pub const MAPPING_TABLE_FILE: &str = "pattern_mapping.json";
pub const COUNTER_TABLE_FILE: &str = "pattern_counters.json";

const BUNDLED_MACROS: &str = include_str!("../../resources/patterns/macro_patterns.json");
const BUNDLED_MICROS: &str = include_str!("../../resources/patterns/micro_patterns.json");
const BUNDLED_MAPPING: &str = include_str!("../../resources/patterns/pattern_mapping.json");
const BUNDLED_COUNTERS: &str = include_str!("../../resources/patterns/pattern_counters.json");

/// Immutable registry of macro/micro patterns, the mapping table and the
/// counter table. All lookups are pure reads.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    macros: Vec<MacroPattern>,
    micros: Vec<MicroPattern>,
    mapping: BTreeMap<String, String>,
    counters: BTreeMap<String, CounterEntry>,
    macro_index: HashMap<String, usize>,
    micro_index: HashMap<String, usize>,
}

impl PatternLibrary {
    /// Index the tables. Only duplicate ids are rejected here; run
    /// [`PatternLibrary::verify`] for the referential checks.
    pub fn new(tables: TaxonomyTables) -> Result<Self, TaxonomyError> {
        let TaxonomyTables {
            macros,
            micros,
            mapping,
            counters,
        } = tables;

        let mut macro_index = HashMap::with_capacity(macros.macros.len());
        for (i, m) in macros.macros.iter().enumerate() {
            if macro_index.insert(m.id.clone(), i).is_some() {
                return Err(TaxonomyError::DuplicateMacro(m.id.clone()));
            }
        }

        let mut micro_index = HashMap::with_capacity(micros.micros.len());
        for (i, m) in micros.micros.iter().enumerate() {
            if micro_index.insert(m.id.clone(), i).is_some() {
                return Err(TaxonomyError::DuplicateMicro(m.id.clone()));
            }
        }

        Ok(Self {
            macros: macros.macros,
            micros: micros.micros,
            mapping: mapping.mapping,
            counters: counters.counters,
            macro_index,
            micro_index,
        })
    }

    /// Build and verify a library from the four JSON documents.
    pub fn from_json(
        macros_json: &str,
        micros_json: &str,
        mapping_json: &str,
        counters_json: &str,
    ) -> Result<Self, TaxonomyError> {
        let tables = TaxonomyTables {
            macros: parse_table(MACRO_TABLE_FILE, macros_json)?,
            micros: parse_table(MICRO_TABLE_FILE, micros_json)?,
            mapping: parse_table(MAPPING_TABLE_FILE, mapping_json)?,
            counters: parse_table(COUNTER_TABLE_FILE, counters_json)?,
        };
        let library = Self::new(tables)?;
        library.verify().inspect_err(|e| {
            tracing::error!(error = %e, "Pattern taxonomy failed integrity check");
        })?;
        Ok(library)
    }

    /// The taxonomy compiled into the binary.
    pub fn bundled() -> Result<Self, TaxonomyError> {
        Self::from_json(
            BUNDLED_MACROS,
            BUNDLED_MICROS,
            BUNDLED_MAPPING,
            BUNDLED_COUNTERS,
        )
    }

    /// Load the four tables from a directory.
    pub fn load(dir: &Path) -> Result<Self, TaxonomyError> {
        let macros = read_table(dir, MACRO_TABLE_FILE)?;
        let micros = read_table(dir, MICRO_TABLE_FILE)?;
        let mapping = read_table(dir, MAPPING_TABLE_FILE)?;
        let counters = read_table(dir, COUNTER_TABLE_FILE)?;
        let library = Self::from_json(&macros, &micros, &mapping, &counters)?;
        tracing::info!(
            dir = %dir.display(),
            macros = library.macros.len(),
            micros = library.micros.len(),
            "Pattern taxonomy loaded"
        );
        Ok(library)
    }

    /// Load from the configured directory, falling back to the bundled tables.
    pub fn from_config() -> Result<Self, TaxonomyError> {
        match config::patterns_dir() {
            Some(dir) => Self::load(&dir),
            None => Self::bundled(),
        }
    }

    /// Referential integrity check. Returns the first violation found.
    pub fn verify(&self) -> Result<(), TaxonomyError> {
        for micro in &self.micros {
            if !self.macro_index.contains_key(&micro.macro_id) {
                return Err(TaxonomyError::DanglingMicro {
                    micro_id: micro.id.clone(),
                    macro_id: micro.macro_id.clone(),
                });
            }
            match self.mapping.get(&micro.id) {
                None => return Err(TaxonomyError::UnmappedMicro(micro.id.clone())),
                Some(mapped) if *mapped != micro.macro_id => {
                    return Err(TaxonomyError::MappingDrift {
                        micro_id: micro.id.clone(),
                        mapped: mapped.clone(),
                        declared: micro.macro_id.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        if let Some(unknown) = self
            .mapping
            .keys()
            .find(|id| !self.micro_index.contains_key(*id))
        {
            return Err(TaxonomyError::MappingUnknownMicro(unknown.clone()));
        }

        let owners: HashSet<&str> = self.micros.iter().map(|m| m.macro_id.as_str()).collect();
        if let Some(orphan) = self.macros.iter().find(|m| !owners.contains(m.id.as_str())) {
            return Err(TaxonomyError::OrphanMacro(orphan.id.clone()));
        }

        for (source_id, entry) in &self.counters {
            let source = self
                .get_macro(source_id)
                .ok_or_else(|| TaxonomyError::CounterUnknownMacro(source_id.clone()))?;
            if source.polarity != Polarity::Negative {
                return Err(TaxonomyError::CounterSourceNotNegative(source_id.clone()));
            }
            let target = self
                .get_macro(&entry.counter_id)
                .ok_or_else(|| TaxonomyError::CounterUnknownMacro(entry.counter_id.clone()))?;
            if target.polarity != Polarity::Positive {
                return Err(TaxonomyError::CounterTargetNotPositive {
                    source_id: source_id.clone(),
                    target: entry.counter_id.clone(),
                });
            }
        }

        if let Some(missing) = self
            .negative_macros()
            .into_iter()
            .find(|m| !self.counters.contains_key(&m.id))
        {
            return Err(TaxonomyError::MissingCounter(missing.id.clone()));
        }

        Ok(())
    }

    // ──────────────────────────────────────────────
    // Lookups
    // ──────────────────────────────────────────────

    pub fn get_macro(&self, id: &str) -> Option<&MacroPattern> {
        self.macro_index.get(id).map(|&i| &self.macros[i])
    }

    pub fn get_micro(&self, id: &str) -> Option<&MicroPattern> {
        self.micro_index.get(id).map(|&i| &self.micros[i])
    }

    /// Micros owned by a macro, in table order. Empty for unknown ids.
    pub fn get_micros_for_macro(&self, macro_id: &str) -> Vec<&MicroPattern> {
        self.micros
            .iter()
            .filter(|m| m.macro_id == macro_id)
            .collect()
    }

    /// Owning macro of a micro, resolved through the mapping table.
    pub fn get_macro_for_micro(&self, micro_id: &str) -> Option<&MacroPattern> {
        self.mapping
            .get(micro_id)
            .and_then(|macro_id| self.get_macro(macro_id))
    }

    /// Positive counter for a negative macro. `None` for positive or unknown ids.
    pub fn get_counter_pattern(&self, negative_macro_id: &str) -> Option<CounterPattern<'_>> {
        let entry = self.counters.get(negative_macro_id)?;
        let counter = self.get_macro(&entry.counter_id)?;
        Some(CounterPattern {
            counter,
            rationale: &entry.rationale,
        })
    }

    /// Display name stored with the counter entry, if any.
    pub fn counter_name(&self, negative_macro_id: &str) -> Option<&str> {
        self.counters
            .get(negative_macro_id)
            .and_then(|e| e.counter_name.as_deref())
    }

    pub fn is_valid_macro(&self, id: &str) -> bool {
        self.macro_index.contains_key(id)
    }

    pub fn is_valid_micro(&self, id: &str) -> bool {
        self.micro_index.contains_key(id)
    }

    /// True when the mapping table assigns `micro_id` to `macro_id`.
    pub fn validate_mapping(&self, micro_id: &str, macro_id: &str) -> bool {
        self.mapping.get(micro_id).is_some_and(|m| m == macro_id)
    }

    pub fn macros(&self) -> &[MacroPattern] {
        &self.macros
    }

    pub fn micros(&self) -> &[MicroPattern] {
        &self.micros
    }

    pub fn positive_macros(&self) -> Vec<&MacroPattern> {
        self.macros_with(|m| m.polarity == Polarity::Positive)
    }

    pub fn negative_macros(&self) -> Vec<&MacroPattern> {
        self.macros_with(|m| m.polarity == Polarity::Negative)
    }

    pub fn macros_by_category(&self, category: Category) -> Vec<&MacroPattern> {
        self.macros_with(|m| m.category == category)
    }

    pub fn positive_macros_by_category(&self, category: Category) -> Vec<&MacroPattern> {
        self.macros_with(|m| m.category == category && m.polarity == Polarity::Positive)
    }

    pub fn negative_macros_by_category(&self, category: Category) -> Vec<&MacroPattern> {
        self.macros_with(|m| m.category == category && m.polarity == Polarity::Negative)
    }

    pub fn macro_ids(&self) -> HashSet<&str> {
        self.macros.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn micro_ids(&self) -> HashSet<&str> {
        self.micros.iter().map(|m| m.id.as_str()).collect()
    }

    /// Aggregate sizes. A micro counts toward its owning macro's polarity.
    pub fn counts(&self) -> PatternCounts {
        let mut counts = PatternCounts {
            total_macros: self.macros.len(),
            total_micros: self.micros.len(),
            ..Default::default()
        };

        for m in &self.macros {
            match m.polarity {
                Polarity::Positive => counts.positive_macros += 1,
                Polarity::Negative => counts.negative_macros += 1,
            }
            *counts.by_category.entry(m.category).or_insert(0) += 1;
        }

        for micro in &self.micros {
            match self.get_macro_for_micro(&micro.id).map(|m| m.polarity) {
                Some(Polarity::Positive) => counts.positive_micros += 1,
                Some(Polarity::Negative) => counts.negative_micros += 1,
                None => {}
            }
        }

        counts
    }

    /// Label a micro confidence using the scale of the macro's polarity.
    pub fn label_for_confidence(&self, macro_id: &str, confidence: f32) -> Option<PatternRating> {
        self.get_macro(macro_id)
            .map(|m| rating_for(m.polarity, confidence))
    }

    fn macros_with(&self, pred: impl Fn(&MacroPattern) -> bool) -> Vec<&MacroPattern> {
        self.macros.iter().filter(|m| pred(m)).collect()
    }
}

fn parse_table<T: DeserializeOwned>(name: &str, json: &str) -> Result<T, TaxonomyError> {
    serde_json::from_str(json).map_err(|e| TaxonomyError::TableParse(name.into(), e.to_string()))
}

fn read_table(dir: &Path, name: &str) -> Result<String, TaxonomyError> {
    let path = dir.join(name);
    std::fs::read_to_string(&path)
        .map_err(|e| TaxonomyError::TableLoad(path.display().to_string(), e.to_string()))
}
