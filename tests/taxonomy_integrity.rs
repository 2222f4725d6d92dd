//! Taxonomy loading from the bundled tables and from disk.

use std::fs;
use std::path::Path;

use patternlab::taxonomy::{
    COUNTER_TABLE_FILE, MACRO_TABLE_FILE, MAPPING_TABLE_FILE, MICRO_TABLE_FILE,
};
use patternlab::{Category, PatternLibrary, PatternRating, Polarity, Severity, Strength, TaxonomyError};

const MACROS: &str = include_str!("../resources/patterns/macro_patterns.json");
const MICROS: &str = include_str!("../resources/patterns/micro_patterns.json");
const MAPPING: &str = include_str!("../resources/patterns/pattern_mapping.json");
const COUNTERS: &str = include_str!("../resources/patterns/pattern_counters.json");

fn write_tables(dir: &Path, macros: &str, micros: &str, mapping: &str, counters: &str) {
    fs::write(dir.join(MACRO_TABLE_FILE), macros).unwrap();
    fs::write(dir.join(MICRO_TABLE_FILE), micros).unwrap();
    fs::write(dir.join(MAPPING_TABLE_FILE), mapping).unwrap();
    fs::write(dir.join(COUNTER_TABLE_FILE), counters).unwrap();
}

#[test]
fn bundled_counts_match_tables() {
    let lib = PatternLibrary::bundled().unwrap();
    let counts = lib.counts();
    assert_eq!(counts.total_macros, 18);
    assert_eq!(counts.positive_macros, 8);
    assert_eq!(counts.negative_macros, 10);
    assert_eq!(counts.total_micros, 72);
    assert_eq!(counts.positive_micros + counts.negative_micros, 72);
    assert_eq!(counts.by_category.get(&Category::Connection), Some(&5));
    assert_eq!(counts.by_category.values().sum::<usize>(), 18);
}

#[test]
fn every_negative_has_a_positive_counter() {
    let lib = PatternLibrary::bundled().unwrap();
    for neg in lib.negative_macros() {
        let counter = lib.get_counter_pattern(&neg.id).unwrap();
        assert_eq!(counter.counter.polarity, Polarity::Positive, "{}", neg.id);
        assert!(!counter.rationale.is_empty());
    }
    assert_eq!(
        lib.get_counter_pattern("soft_close_fade").map(|c| c.counter.id.as_str()),
        Some("mirror_close")
    );
    assert!(lib.get_counter_pattern("mirror_close").is_none());
}

#[test]
fn micro_lookups_go_through_the_mapping() {
    let lib = PatternLibrary::bundled().unwrap();
    assert_eq!(
        lib.get_macro_for_micro("early_humor_landing").map(|m| m.id.as_str()),
        Some("cultural_handshake")
    );
    assert!(lib.validate_mapping("early_humor_landing", "cultural_handshake"));
    assert!(!lib.validate_mapping("early_humor_landing", "scenic_route"));
    assert!(lib.get_macro_for_micro("invented_micro").is_none());
    assert_eq!(lib.get_micros_for_macro("cultural_handshake").len(), 4);
}

#[test]
fn confidence_labels_follow_macro_polarity() {
    let lib = PatternLibrary::bundled().unwrap();
    assert_eq!(
        lib.label_for_confidence("cultural_handshake", 0.80),
        Some(PatternRating::Strength(Strength::Strong))
    );
    assert_eq!(
        lib.label_for_confidence("scenic_route", 0.70),
        Some(PatternRating::Severity(Severity::Medium))
    );
    assert_eq!(lib.label_for_confidence("invented_pattern", 0.9), None);
}

#[test]
fn loads_tables_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    write_tables(dir.path(), MACROS, MICROS, MAPPING, COUNTERS);

    let from_disk = PatternLibrary::load(dir.path()).unwrap();
    let bundled = PatternLibrary::bundled().unwrap();
    assert_eq!(from_disk.counts(), bundled.counts());
    assert_eq!(from_disk.macro_ids(), bundled.macro_ids());
}

#[test]
fn missing_table_file_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(MACRO_TABLE_FILE), MACROS).unwrap();

    match PatternLibrary::load(dir.path()) {
        Err(TaxonomyError::TableLoad(path, _)) => assert!(path.ends_with(MICRO_TABLE_FILE)),
        other => panic!("expected TableLoad, got {other:?}"),
    }
}

#[test]
fn malformed_table_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_tables(dir.path(), MACROS, MICROS, "{ not json", COUNTERS);

    match PatternLibrary::load(dir.path()) {
        Err(TaxonomyError::TableParse(name, _)) => assert_eq!(name, MAPPING_TABLE_FILE),
        other => panic!("expected TableParse, got {other:?}"),
    }
}

#[test]
fn drifted_mapping_fails_integrity_check() {
    let drifted = MAPPING.replacen(
        r#""early_humor_landing": "cultural_handshake""#,
        r#""early_humor_landing": "scenic_route""#,
        1,
    );
    assert_ne!(drifted, MAPPING);

    let dir = tempfile::tempdir().unwrap();
    write_tables(dir.path(), MACROS, MICROS, &drifted, COUNTERS);

    match PatternLibrary::load(dir.path()) {
        Err(TaxonomyError::MappingDrift { micro_id, mapped, declared }) => {
            assert_eq!(micro_id, "early_humor_landing");
            assert_eq!(mapped, "scenic_route");
            assert_eq!(declared, "cultural_handshake");
        }
        other => panic!("expected MappingDrift, got {other:?}"),
    }
}

#[test]
fn library_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PatternLibrary>();
}
