//! Builders for the two call-analysis layouts.

use std::sync::LazyLock;

use regex::Regex;

use super::cards::extract_cards;
use super::grammar::SectionedText;
use super::matchers::{
    bullet_items, clean_value, compile_all, dimension_scores, first_capture, labelled, list_items,
    non_empty, parse_score, split_blocks, strip_markup,
};
use crate::models::enums::{Polarity, TrustDelta};
use crate::models::report::{
    CallMetadata, FollowUpEmail, LevelUpMove, LiteReport, PatternCard, ProReport, TacticalRewrite,
    TrustBeat,
};

static BUYING_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^.*\bbuying\s+signals\b.*$").expect("valid regex"));

static WARNING_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^.*\bwarning\s+signals\b.*$").expect("valid regex"));

static TRY_THIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:\*\*)?try\s+this\b").expect("valid regex"));

/// A quote closing its line or followed by an attribution dash.
static PULL_QUOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)["“]([^"“”\n]{2,})["”](?:[ \t]*--|[ \t]+-[ \t]|[ \t]*$)"#).expect("valid regex")
});

fn metadata(doc: &SectionedText<'_>) -> CallMetadata {
    CallMetadata {
        call_name: doc.field("call_name"),
        duration: doc.field("duration"),
        effectiveness: doc.field("effectiveness"),
    }
}

fn section_text(doc: &SectionedText<'_>, key: &str) -> Option<String> {
    doc.section(key).and_then(non_empty)
}

fn cards(doc: &SectionedText<'_>, key: &str, polarity: Polarity) -> Vec<PatternCard> {
    doc.section(key)
        .map(|s| extract_cards(s, polarity))
        .unwrap_or_default()
}

// ──────────────────────────────────────────────
// Call Lab Lite
// ──────────────────────────────────────────────

pub fn build_lite(doc: &SectionedText<'_>) -> LiteReport {
    let (buying_signals, warning_signals, signals) = doc
        .section("signals")
        .map(split_signals)
        .unwrap_or_default();

    LiteReport {
        metadata: metadata(doc),
        score: doc.field("score").and_then(|s| parse_score(&s)),
        snap_take: section_text(doc, "snap_take").or_else(|| doc.field("snap_take")),
        pull_quote: pull_quote(doc.text()),
        what_worked: cards(doc, "what_worked", Polarity::Positive),
        what_to_watch: cards(doc, "what_to_watch", Polarity::Negative),
        why_it_worked: section_text(doc, "why_it_worked"),
        buying_signals,
        warning_signals,
        signals,
        level_up: level_up(doc),
        bottom_line: section_text(doc, "bottom_line"),
    }
}

fn pull_quote(text: &str) -> Option<String> {
    PULL_QUOTE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| non_empty(m.as_str()))
}

/// Split a signals section into (buying, warning, unlabelled).
/// Without the two labels every bullet lands in the unlabelled list.
fn split_signals(section: &str) -> (Vec<String>, Vec<String>, Vec<String>) {
    let buying = BUYING_LABEL.find(section);
    let warning = WARNING_LABEL.find(section);

    match (buying, warning) {
        (None, None) => (Vec::new(), Vec::new(), bullet_items(section)),
        (Some(b), None) => (bullet_items(&section[b.end()..]), Vec::new(), Vec::new()),
        (None, Some(w)) => (
            Vec::new(),
            bullet_items(&section[w.end()..]),
            bullet_items(&section[..w.start()]),
        ),
        (Some(b), Some(w)) if b.start() < w.start() => (
            bullet_items(&section[b.end()..w.start()]),
            bullet_items(&section[w.end()..]),
            Vec::new(),
        ),
        (Some(b), Some(w)) => (
            bullet_items(&section[b.end()..]),
            bullet_items(&section[w.end()..b.start()]),
            Vec::new(),
        ),
    }
}

fn level_up(doc: &SectionedText<'_>) -> Option<LevelUpMove> {
    let section = doc.section("level_up")?;
    let action_text = match TRY_THIS.find(section) {
        Some(m) => &section[..m.start()],
        None => section,
    };
    let action = non_empty(action_text).map(|a| clean_value(&a));
    let example = doc.field("level_up_example");

    if action.is_none() && example.is_none() {
        return None;
    }
    Some(LevelUpMove { action, example })
}

// ──────────────────────────────────────────────
// Call Lab Pro
// ──────────────────────────────────────────────

static BEAT_BOLD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-•*]\s+|\d{1,2}[.)]\s+)?\*\*\[?([^*\]\n]+?)\]?\*\*\s*(?:--|—|–|-|:)?\s*(.*)$")
        .expect("valid regex")
});

static BEAT_PLAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-•*]\s+)?\[?(\d{1,2}:\d{2}(?::\d{2})?)\]?\s*(?:--|—|–|-|:)\s*(.+)$")
        .expect("valid regex")
});

static DELTA_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[\s\-•*]*(?:\*\*)?trust\s+delta(?:\*\*)?\s*:?\s*(?:\*\*)?\s*(.+)$")
        .expect("valid regex")
});

static DELTA_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*([+\-±–−]|\+/-)\s*\)\s*$").expect("valid regex"));

static HAS_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").expect("valid regex"));

static REWRITE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#{3,4}\s+(.+)$").expect("valid regex"));

static REWRITE_NUMBERED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\*\*)?(?:moment\s+)?\d{1,2}[.):]\s*(.+?)(?:\*\*)?\s*$").expect("valid regex")
});

static WHAT_YOU_SAID: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r#"(?is)what\s+(?:you\s+said|happened)(?:\*\*)?\s*:?\s*(?:\*\*)?\s*(?:>\s*)?"([^"]+)""#.into(),
        labelled(r"\**[ \t]*what\s+(?:you\s+said|happened)"),
    ])
});

static WHY_IT_MISSED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[labelled(r"\**[ \t]*why\s+it\s+missed")])
});

static STRONGER: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r#"(?is)(?:stronger\s+alternative|pro\s+rewrite|try\s+this)(?:\*\*)?\s*:?\s*(?:\*\*)?\s*(?:>\s*)?"([^"]+)""#.into(),
        labelled(r"\**[ \t]*(?:stronger\s+alternative|pro\s+rewrite|try\s+this)"),
    ])
});

static SUBJECT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[\s\-•*]*(?:\*\*)?subject").expect("valid regex"));

pub fn build_pro(doc: &SectionedText<'_>) -> ProReport {
    ProReport {
        metadata: metadata(doc),
        overall_score: doc.field("overall_score").and_then(|s| parse_score(&s)),
        profile: doc.field("profile"),
        snap_take: section_text(doc, "snap_take"),
        dimensions: doc.section("dimensions").map(dimension_scores).unwrap_or_default(),
        strengths: cards(doc, "strengths", Polarity::Positive),
        frictions: cards(doc, "frictions", Polarity::Negative),
        timeline: doc.section("timeline").map(trust_beats).unwrap_or_default(),
        rewrites: doc.section("rewrites").map(tactical_rewrites).unwrap_or_default(),
        blueprint: doc.section("blueprint").map(list_items).unwrap_or_default(),
        follow_up: follow_up(doc),
        closing_insight: section_text(doc, "closing"),
    }
}

/// Beat head: (timestamp, event) from a bold or plain timestamped line.
fn beat_start(line: &str) -> Option<(Option<String>, String)> {
    if DELTA_LINE.is_match(line) {
        return None;
    }
    if let Some(c) = BEAT_BOLD.captures(line) {
        let bold = c.get(1)?.as_str().trim();
        let rest = c.get(2).map_or("", |m| m.as_str()).trim();
        if bold.ends_with(':') {
            return None;
        }
        return Some(if HAS_DIGIT.is_match(bold) {
            (Some(bold.to_string()), rest.to_string())
        } else if rest.is_empty() {
            (None, bold.to_string())
        } else {
            (None, format!("{bold} {rest}"))
        });
    }
    let c = BEAT_PLAIN.captures(line)?;
    Some((
        Some(c.get(1)?.as_str().to_string()),
        c.get(2)?.as_str().trim().to_string(),
    ))
}

fn trust_beats(section: &str) -> Vec<TrustBeat> {
    split_blocks(section, beat_start)
        .into_iter()
        .filter_map(|((timestamp, event), lines)| {
            let mut delta = None;
            let mut analysis = Vec::new();
            for line in lines.iter().skip(1) {
                if let Some(c) = DELTA_LINE.captures(line) {
                    let marker = c.get(1).map_or("", |m| m.as_str());
                    delta = delta.or_else(|| {
                        TrustDelta::from_marker(marker.split_whitespace().next().unwrap_or(""))
                    });
                } else {
                    let text = strip_markup(line.trim().trim_start_matches(['-', '•', '*']));
                    if !text.is_empty() {
                        analysis.push(text);
                    }
                }
            }

            let mut event = strip_markup(&event);
            let suffix = DELTA_SUFFIX
                .captures(&event)
                .and_then(|c| Some((c.get(0)?.start(), c.get(1)?.as_str().to_string())));
            if let Some((cut, marker)) = suffix {
                delta = delta.or_else(|| TrustDelta::from_marker(&marker));
                event = event[..cut].trim_end().to_string();
            }
            if event.is_empty() {
                return None;
            }

            Some(TrustBeat {
                timestamp,
                event,
                delta,
                analysis: (!analysis.is_empty()).then(|| analysis.join(" ")),
            })
        })
        .collect()
}

fn rewrite_start(line: &str) -> Option<String> {
    REWRITE_HEADING
        .captures(line)
        .or_else(|| REWRITE_NUMBERED.captures(line))
        .and_then(|c| c.get(1))
        .map(|m| strip_markup(m.as_str()))
}

fn tactical_rewrites(section: &str) -> Vec<TacticalRewrite> {
    split_blocks(section, rewrite_start)
        .into_iter()
        .filter_map(|(moment, lines)| {
            let block = lines.join("\n");
            let rewrite = TacticalRewrite {
                moment: non_empty(&moment),
                what_you_said: first_capture(&WHAT_YOU_SAID, &block),
                why_it_missed: first_capture(&WHY_IT_MISSED, &block),
                stronger_alternative: first_capture(&STRONGER, &block),
            };
            let has_content = rewrite.what_you_said.is_some()
                || rewrite.why_it_missed.is_some()
                || rewrite.stronger_alternative.is_some();
            has_content.then_some(rewrite)
        })
        .collect()
}

fn follow_up(doc: &SectionedText<'_>) -> Option<FollowUpEmail> {
    let section = doc.section("follow_up")?;
    let subject = doc.field("follow_up_subject");
    let body: Vec<&str> = section
        .lines()
        .filter(|l| !SUBJECT_LINE.is_match(l))
        .collect();
    let body = non_empty(&body.join("\n"));

    if subject.is_none() && body.is_none() {
        return None;
    }
    Some(FollowUpEmail { subject, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{ReportVariant, Severity, Strength};
    use crate::pipeline::extraction::grammar::grammar_for;

    fn sample_lite_report() -> &'static str {
        "## CALL LAB LITE — DIAGNOSTIC SNAPSHOT\n\
         **Call:** Acme Corp intro\n\
         **Duration:** 28 minutes\n\
         **Score:** 8/10\n\
         **Effectiveness:** High\n\n\
         ## SNAP TAKE\n\n\
         You earned trust fast and let the close drift.\n\n\
         ## WHAT WORKED\n\n\
         **The Cultural Handshake**\n\
         Why it hit: Rapport before agenda.\n\
         \"Wait, you're a Bills fan too?\"\n\n\
         ## WHAT TO WATCH\n\n\
         **The Soft Close Fade**\n\
         Why it matters: No date, no deal.\n\
         Fix: Put the follow-up on the calendar live.\n\n\
         ## WHY THIS CALL WORKED\n\n\
         The buyer sold themselves.\n\n\
         ## CALL SIGNALS DETECTED\n\n\
         **BUYING SIGNALS**\n\
         - Buyer asked about onboarding\n\
         - Buyer laughed with you\n\
         **WARNING SIGNALS**\n\
         - Pricing not raised\n\n\
         ## ONE MOVE TO LEVEL UP\n\n\
         Close on a date, not a vibe.\n\n\
         Try this:\n\
         \"Does Thursday at 2 work to walk your CFO through it?\"\n\n\
         ## UNLOCK THE FULL ANALYSIS\n\n\
         Pro shows more.\n\n\
         ## BOTTOM LINE\n\n\
         You crushed rapport. Fix the close.\n"
    }

    fn sample_pro_report() -> &'static str {
        "# CALL LAB PRO -- FULL DIAGNOSTIC\n\n\
         **Call:** Globex renewal\n\
         **Duration:** 41 minutes\n\
         **SCORE:** 7/10\n\
         **Effectiveness:** Medium\n\
         **Dynamics Profile:** The Trusted Fixer\n\n\
         ## SNAP TAKE\n\n\
         Strong diagnosis, soft landing.\n\n\
         ## PERFORMANCE SCORES\n\n\
         | Metric | Score |\n\
         |--------|-------|\n\
         | Gap Creation | 72/100 |\n\
         - Discovery: 8/10\n\n\
         **STRENGTHS DETECTED**\n\n\
         - **The Diagnostic Reveal** (Diagnosis)\n\
         Strength: STRONG\n\
         Evidence: \"So the real cost is the churn, not the tool.\"\n\n\
         **FRICTION DETECTED**\n\n\
         - **The Soft Close Fade** (Activation)\n\
         Severity: HIGH\n\
         Fix: Ask for the date.\n\
         → COUNTER: **The Mirror Close** - Reflect criteria, then ask.\n\n\
         ## TRUST MAP\n\n\
         Trust climbed early and sagged at pricing.\n\n\
         **[03:10]** -- Shared the churn numbers\n\
         - Trust Delta: +\n\
         - Buyer leaned in once the cost was named.\n\n\
         **[27:45]** -- Pricing dodge\n\
         - Trust Delta: -\n\n\
         ## TACTICAL REWRITES\n\n\
         ### Pricing question\n\n\
         **What you said:**\n\
         > \"We can probably figure something out.\"\n\n\
         **Why it missed:** Sounded unsure of your own value.\n\n\
         **Stronger alternative:**\n\
         > \"Teams your size invest 40k. Want the breakdown?\"\n\n\
         ## NEXT STEPS\n\n\
         1. **Send** the churn model\n\
         2. Book the CFO walkthrough\n\n\
         ## FOLLOW-UP EMAIL\n\n\
         **Subject:** Churn model + Thursday\n\n\
         Hi Dana, attached is the model.\n\n\
         ## BOTTOM LINE\n\n\
         You diagnose like a surgeon and close like a tourist.\n"
    }

    #[test]
    fn lite_report_fields() {
        let doc = SectionedText::parse(grammar_for(ReportVariant::CallLabLite), sample_lite_report());
        let r = build_lite(&doc);
        assert_eq!(r.metadata.call_name.as_deref(), Some("Acme Corp intro"));
        assert_eq!(r.metadata.duration.as_deref(), Some("28 minutes"));
        assert_eq!(r.metadata.effectiveness.as_deref(), Some("High"));
        assert_eq!(r.score, Some(80));
        assert_eq!(
            r.snap_take.as_deref(),
            Some("You earned trust fast and let the close drift.")
        );
        assert_eq!(r.pull_quote.as_deref(), Some("Wait, you're a Bills fan too?"));
        assert_eq!(r.what_worked.len(), 1);
        assert_eq!(r.what_worked[0].evidence.as_deref(), Some("Wait, you're a Bills fan too?"));
        assert_eq!(r.what_to_watch.len(), 1);
        assert_eq!(r.what_to_watch[0].name, "The Soft Close Fade");
        assert_eq!(r.why_it_worked.as_deref(), Some("The buyer sold themselves."));
        assert_eq!(
            r.buying_signals,
            vec!["Buyer asked about onboarding", "Buyer laughed with you"]
        );
        assert_eq!(r.warning_signals, vec!["Pricing not raised"]);
        assert!(r.signals.is_empty());

        let lu = r.level_up.unwrap();
        assert_eq!(lu.action.as_deref(), Some("Close on a date, not a vibe."));
        assert_eq!(
            lu.example.as_deref(),
            Some("Does Thursday at 2 work to walk your CFO through it?")
        );
        assert_eq!(r.bottom_line.as_deref(), Some("You crushed rapport. Fix the close."));
    }

    #[test]
    fn pull_quote_skips_inline_quotes() {
        let text = "He said \"maybe later\" and left.\n\"We need this by Q3\" -- VP Sales\n";
        assert_eq!(pull_quote(text).as_deref(), Some("We need this by Q3"));
        assert_eq!(pull_quote("No quotes at all."), None);
    }

    #[test]
    fn unlabelled_signals_stay_together() {
        let (buy, warn, all) = split_signals("- Buyer laughed\n- Asked for guidance");
        assert!(buy.is_empty() && warn.is_empty());
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn pro_report_fields() {
        let doc = SectionedText::parse(grammar_for(ReportVariant::CallLabPro), sample_pro_report());
        let r = build_pro(&doc);

        assert_eq!(r.metadata.call_name.as_deref(), Some("Globex renewal"));
        assert_eq!(r.overall_score, Some(70));
        assert_eq!(r.profile.as_deref(), Some("The Trusted Fixer"));
        assert_eq!(r.snap_take.as_deref(), Some("Strong diagnosis, soft landing."));

        assert_eq!(r.dimensions.len(), 2);
        assert_eq!(r.dimensions[0].metric, "Gap Creation");
        assert_eq!(r.dimensions[1].metric, "Discovery");
        assert_eq!(r.dimensions[1].score, 80);

        assert_eq!(r.strengths.len(), 1);
        assert_eq!(r.strengths[0].strength(), Some(Strength::Strong));
        assert_eq!(r.frictions.len(), 1);
        assert_eq!(r.frictions[0].severity(), Some(Severity::High));
        assert_eq!(r.frictions[0].counter().unwrap().name, "The Mirror Close");

        assert_eq!(r.timeline.len(), 2);
        assert_eq!(r.timeline[0].timestamp.as_deref(), Some("03:10"));
        assert_eq!(r.timeline[0].event, "Shared the churn numbers");
        assert_eq!(r.timeline[0].delta, Some(TrustDelta::Up));
        assert_eq!(
            r.timeline[0].analysis.as_deref(),
            Some("Buyer leaned in once the cost was named.")
        );
        assert_eq!(r.timeline[1].delta, Some(TrustDelta::Down));
        assert!(r.timeline[1].analysis.is_none());

        assert_eq!(r.rewrites.len(), 1);
        let rw = &r.rewrites[0];
        assert_eq!(rw.moment.as_deref(), Some("Pricing question"));
        assert_eq!(rw.what_you_said.as_deref(), Some("We can probably figure something out."));
        assert_eq!(rw.why_it_missed.as_deref(), Some("Sounded unsure of your own value."));
        assert_eq!(
            rw.stronger_alternative.as_deref(),
            Some("Teams your size invest 40k. Want the breakdown?")
        );

        assert_eq!(r.blueprint, vec!["Send the churn model", "Book the CFO walkthrough"]);
        let email = r.follow_up.unwrap();
        assert_eq!(email.subject.as_deref(), Some("Churn model + Thursday"));
        assert_eq!(email.body.as_deref(), Some("Hi Dana, attached is the model."));
        assert_eq!(
            r.closing_insight.as_deref(),
            Some("You diagnose like a surgeon and close like a tourist.")
        );
    }

    #[test]
    fn plain_timestamps_with_suffix_delta() {
        let beats = trust_beats("[12:30] - Named the budget owner (+)\n[18:00] - Pricing pushback (±)");
        assert_eq!(beats.len(), 2);
        assert_eq!(beats[0].timestamp.as_deref(), Some("12:30"));
        assert_eq!(beats[0].event, "Named the budget owner");
        assert_eq!(beats[0].delta, Some(TrustDelta::Up));
        assert_eq!(beats[1].delta, Some(TrustDelta::Mixed));
    }

    #[test]
    fn missing_tactical_section_is_empty() {
        let text = "# CALL LAB PRO\n## SNAP TAKE\nShort call.";
        let doc = SectionedText::parse(grammar_for(ReportVariant::CallLabPro), text);
        let r = build_pro(&doc);
        assert!(r.rewrites.is_empty());
        assert!(r.timeline.is_empty());
        assert!(r.follow_up.is_none());
        assert_eq!(r.snap_take.as_deref(), Some("Short call."));
    }
}
