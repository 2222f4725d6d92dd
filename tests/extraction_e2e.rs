//! End-to-end: raw report text through detection, extraction and the
//! taxonomy link-up, using the public API only.

use patternlab::models::enums::{ProbeTier, TrustDelta};
use patternlab::models::report::{DiscoveryProReport, DiscoveryReport, LiteReport, ProReport};
use patternlab::pipeline::validation::macro_slug;
use patternlab::{
    extract_report, extract_report_bytes, extract_report_with, resolve_pattern_cards,
    validate_analysis_json, ExtractionError, ExtractionOptions, PatternLibrary, Report,
    ReportVariant, Severity, Strength, ValidationError,
};

const LITE: &str = include_str!("fixtures/call_lab_lite.md");
const PRO: &str = include_str!("fixtures/call_lab_pro.md");
const DISCOVERY: &str = include_str!("fixtures/discovery_lab.md");
const DISCOVERY_PRO: &str = include_str!("fixtures/discovery_lab_pro.md");

fn lite() -> LiteReport {
    match extract_report(LITE).unwrap() {
        Report::CallLabLite(r) => r,
        other => panic!("expected lite, got {:?}", other.variant()),
    }
}

fn pro() -> ProReport {
    match extract_report(PRO).unwrap() {
        Report::CallLabPro(r) => r,
        other => panic!("expected pro, got {:?}", other.variant()),
    }
}

fn discovery() -> DiscoveryReport {
    match extract_report(DISCOVERY).unwrap() {
        Report::DiscoveryLab(r) => r,
        other => panic!("expected discovery, got {:?}", other.variant()),
    }
}

fn discovery_pro() -> DiscoveryProReport {
    match extract_report(DISCOVERY_PRO).unwrap() {
        Report::DiscoveryLabPro(r) => r,
        other => panic!("expected discovery pro, got {:?}", other.variant()),
    }
}

#[test]
fn each_fixture_detects_its_layout() {
    let cases = [
        (LITE, ReportVariant::CallLabLite),
        (PRO, ReportVariant::CallLabPro),
        (DISCOVERY, ReportVariant::DiscoveryLab),
        (DISCOVERY_PRO, ReportVariant::DiscoveryLabPro),
    ];
    for (text, expected) in cases {
        assert_eq!(extract_report(text).unwrap().variant(), expected);
    }
}

#[test]
fn lite_report_end_to_end() {
    let r = lite();
    assert_eq!(r.score, Some(80));
    assert_eq!(r.pull_quote.as_deref(), Some("Wait, you're a Bills fan too?"));
    assert_eq!(r.what_worked[0].name, "The Cultural Handshake");
    assert_eq!(
        r.what_to_watch[0].fix(),
        Some("Put the follow-up on the calendar live.")
    );
    assert_eq!(r.warning_signals, vec!["Pricing not raised"]);
    assert_eq!(r.bottom_line.as_deref(), Some("You crushed rapport. Fix the close."));
}

#[test]
fn pro_report_end_to_end() {
    let r = pro();
    assert_eq!(r.overall_score, Some(70));

    let discovery = r.dimensions.iter().find(|d| d.metric == "Discovery").unwrap();
    assert_eq!(discovery.score, 80);

    assert_eq!(r.strengths[0].strength(), Some(Strength::Strong));
    let fade = &r.frictions[0];
    assert_eq!(fade.name, "The Soft Close Fade");
    assert_eq!(fade.severity(), Some(Severity::High));
    let counter = fade.counter().unwrap();
    assert_eq!(counter.name, "The Mirror Close");
    assert_eq!(counter.rationale.as_deref(), Some("Reflect criteria, then ask."));

    assert_eq!(r.timeline.len(), 2);
    assert_eq!(r.timeline[1].delta, Some(TrustDelta::Down));
    assert_eq!(r.rewrites.len(), 1);
    assert_eq!(r.blueprint.len(), 2);
}

#[test]
fn discovery_lab_end_to_end() {
    let r = discovery();
    assert_eq!(r.target.company.as_deref(), Some("Initech"));
    assert_eq!(r.probes.len(), 3);
    assert_eq!(r.probes[2].tier, ProbeTier::Secondary);
    assert_eq!(r.competitors.len(), 2);
    assert_eq!(r.flow.len(), 3);
}

#[test]
fn discovery_pro_end_to_end() {
    let r = discovery_pro();
    assert_eq!(r.findings.len(), 2);
    assert_eq!((r.primary_probes.len(), r.secondary_probes.len()), (5, 3));
    assert_eq!(r.competitors[0].name, "Gong");
    assert_eq!(r.decision_tree.len(), 2);
    assert_eq!(r.opening.len(), 4);
    assert_eq!(r.objections.len(), 2);
    assert_eq!(r.objectives.primary.as_deref(), Some("Book a CFO walkthrough"));
    assert_eq!(r.unknowns.gaps, vec!["Current ramp data"]);
    assert_eq!(r.actions.len(), 3);
}

#[test]
fn extraction_is_deterministic() {
    for text in [LITE, PRO, DISCOVERY, DISCOVERY_PRO] {
        let first = serde_json::to_string(&extract_report(text).unwrap()).unwrap();
        let second = serde_json::to_string(&extract_report(text).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn missing_section_leaves_field_empty() {
    let start = PRO.find("## TRUST MAP").unwrap();
    let end = PRO.find("## TACTICAL REWRITES").unwrap();
    let trimmed = format!("{}{}", &PRO[..start], &PRO[end..]);

    let Report::CallLabPro(r) = extract_report(&trimmed).unwrap() else {
        panic!("expected pro report");
    };
    assert!(r.timeline.is_empty());
    assert_eq!(r.rewrites.len(), 1);
    assert_eq!(r.frictions.len(), 1);
}

#[test]
fn windows_line_endings_give_the_same_report() {
    let crlf = DISCOVERY_PRO.replace('\n', "\r\n");
    assert_eq!(
        extract_report_bytes(crlf.as_bytes()).unwrap(),
        extract_report(DISCOVERY_PRO).unwrap()
    );
}

#[test]
fn override_parses_an_unrecognized_document() {
    let text = "## SNAP TAKE\nShort and sharp.\n";
    assert_eq!(extract_report(text), Err(ExtractionError::UnrecognizedVariant));

    let opts = ExtractionOptions::with_variant(ReportVariant::CallLabLite);
    let Report::CallLabLite(r) = extract_report_with(text, &opts).unwrap() else {
        panic!("expected lite report");
    };
    assert_eq!(r.snap_take.as_deref(), Some("Short and sharp."));
}

#[test]
fn report_round_trips_through_json() {
    let report = extract_report(PRO).unwrap();
    let json = serde_json::to_string(&report).unwrap();
    let back: Report = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);
}

#[test]
fn extracted_cards_link_to_the_taxonomy() {
    let lib = PatternLibrary::bundled().unwrap();
    let report = extract_report(PRO).unwrap();
    let cards = report.pattern_cards();
    let resolved = resolve_pattern_cards(&cards, &lib);

    assert_eq!(resolved.len(), 2);
    assert!(resolved.iter().all(|r| r.known));

    let fade = resolved
        .iter()
        .find(|r| r.macro_id == "soft_close_fade")
        .unwrap();
    let counter = fade.counter.as_ref().unwrap();
    assert_eq!(counter.pattern.id, "mirror_close");
    assert_eq!(macro_slug(&fade.stated_counter.unwrap().name), "mirror_close");
    assert!(!fade.counter_disagrees());
}

#[test]
fn upstream_payload_with_misnested_micro_is_rejected() {
    let lib = PatternLibrary::bundled().unwrap();
    let payload = r#"{"detected_patterns": [
        {"macro_id": "cultural_handshake", "category": "connection", "polarity": "positive",
         "macro_summary": "Rapport first",
         "detected_micros": [{"micro_id": "early_humor_landing", "confidence": 0.9,
                              "evidence": ["Go Bills!"]}]},
        {"macro_id": "scenic_route", "category": "connection", "polarity": "negative",
         "macro_summary": "Wandered",
         "detected_micros": [{"micro_id": "early_humor_landing", "confidence": 0.7,
                              "evidence": []}]}
    ]}"#;

    let err = validate_analysis_json(&lib, payload).unwrap_err();
    assert!(matches!(err, ValidationError::MisnestedMicro { .. }));
    assert_eq!(
        err.to_string(),
        "Micro early_humor_landing should map to cultural_handshake, not scenic_route"
    );
}
