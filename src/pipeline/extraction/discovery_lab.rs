//! Builders for the two discovery-brief layouts.
//!
//! Discovery Lab Pro carries every Discovery Lab section, so the shared
//! readers (target profile, probes, hooks, flow) live here once and the Pro
//! builder layers its extra sections on top.

use std::sync::LazyLock;

use regex::Regex;

use super::grammar::SectionedText;
use super::matchers::{
    bullet_items, clean_value, compile_all, first_capture, first_quote, labelled, non_empty,
    split_blocks, strip_markup,
};
use crate::models::enums::ProbeTier;
use crate::models::report::{
    CallObjectives, Competitor, CompetitorPosition, DecisionBranch, DiscoveryProReport,
    DiscoveryReport, Finding, FlowStep, Hook, LabeledScript, ObjectionHandle, OpenQuestions,
    PostCallAction, Probe, ProspectPsychology, TargetProfile,
};

/// Most findings a Pro brief reports.
pub const MAX_FINDINGS: usize = 5;

/// Share of probes treated as primary when a brief gives no split of its own.
const PRIMARY_PROBE_SHARE: (usize, usize) = (5, 8);

pub const SEARCH_LABEL: &str = "WHAT THEY'LL SEARCH";
pub const FIND_LABEL: &str = "WHAT YOU WANT THEM TO FIND";
pub const SEEDS_LABEL: &str = "SEEDS TO PLANT";

pub const AUTHORITY_FRAME_LABEL: &str = "AUTHORITY FRAME (15 sec)";
pub const REASON_LABEL: &str = "REASON FOR CALL (15 sec)";
pub const PERMISSION_LABEL: &str = "PERMISSION QUESTION (10 sec)";
pub const TRANSITION_LABEL: &str = "TRANSITION (10 sec)";

fn section_text(doc: &SectionedText<'_>, key: &str) -> Option<String> {
    doc.section(key).and_then(non_empty)
}

fn from_section<T: Default>(doc: &SectionedText<'_>, key: &str, read: impl FnOnce(&str) -> T) -> T {
    doc.section(key).map(read).unwrap_or_default()
}

// ──────────────────────────────────────────────
// Discovery Lab
// ──────────────────────────────────────────────

pub fn build_discovery(doc: &SectionedText<'_>) -> DiscoveryReport {
    DiscoveryReport {
        target: target_profile(doc),
        probes: from_section(doc, "probes", |s| {
            numbered_probes(s, ProbeTier::Primary)
                .into_iter()
                .map(RawProbe::into_probe)
                .collect()
        }),
        hooks: from_section(doc, "hooks", hooks),
        competitors: from_section(doc, "competitors", competitors),
        emotional_probe: doc.section("emotional").and_then(emotional_probe),
        flow: from_section(doc, "flow", flow_steps),
        call_objective: section_text(doc, "objective"),
    }
}

static COMPANY_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s+[(<\[]?(https?://\S+?)[)>\]]?$").expect("valid regex")
});

static CONTACT_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[-–—]\s+|,\s+").expect("valid regex"));

fn target_profile(doc: &SectionedText<'_>) -> TargetProfile {
    let (company, website) = match doc.field("target_company") {
        Some(raw) => match COMPANY_URL.captures(&raw) {
            Some(c) => (
                c.get(1).map(|m| m.as_str().trim().to_string()),
                c.get(2).map(|m| m.as_str().to_string()),
            ),
            None => (Some(raw), None),
        },
        None => (None, None),
    };

    let (contact, contact_title) = match doc.field("contact") {
        Some(raw) => match CONTACT_SPLIT.find(&raw) {
            Some(sep) => (
                non_empty(&raw[..sep.start()]),
                non_empty(&raw[sep.end()..]),
            ),
            None => (Some(raw), None),
        },
        None => (None, None),
    };

    TargetProfile {
        service: doc.field("service"),
        company,
        website,
        contact,
        contact_title,
        recent_signals: doc.field("recent_signals"),
        authority_line: doc.field("authority_line"),
    }
}

// ── Probes ──

static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{1,2}[.)]\s+(.*)$").expect("valid regex"));

static PROBE_TIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^(?:\*\*)?\s*\[?(primary|secondary)\]?\s*(?:\*\*)?\s*[:\-–—]?\s*(.*)$")
        .expect("valid regex")
});

static TAGGED_PROBE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[(primary|secondary)\]\s*(?:\*\*)?\s*(.+)$").expect("valid regex")
});

static FOLLOW_UP_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(?:→|->)\s*(?:\*\*)?(?:follow-?up\s*:?)?(?:\*\*)?\s*|\s+(?:\*\*)?follow-?up\s*:\s*(?:\*\*)?")
        .expect("valid regex")
});

static PRIMARY_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t#*]*(?:\*\*)?\s*primary\s+probes?\b[^\n]*$").expect("valid regex")
});

static SECONDARY_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t#*]*(?:\*\*)?\s*secondary\s+probes?\b[^\n]*$").expect("valid regex")
});

/// A probe before its tier is settled. `tagged` is the tier written next to
/// the question, if any.
#[derive(Debug, Clone, PartialEq)]
struct RawProbe {
    tagged: Option<ProbeTier>,
    tier: ProbeTier,
    question: String,
    follow_up: Option<String>,
}

impl RawProbe {
    fn into_probe(self) -> Probe {
        Probe {
            tier: self.tier,
            question: self.question,
            follow_up: self.follow_up,
        }
    }

    fn with_tier(mut self, tier: ProbeTier) -> Self {
        self.tier = tier;
        self
    }
}

fn parse_tier(raw: &str) -> Option<ProbeTier> {
    raw.parse().ok()
}

fn read_probe(text: &str, default_tier: ProbeTier) -> Option<RawProbe> {
    let (tagged, body) = match PROBE_TIER.captures(text) {
        Some(c) => (
            c.get(1).and_then(|m| parse_tier(m.as_str())),
            c.get(2).map_or("", |m| m.as_str()),
        ),
        None => (None, text),
    };

    let (question, follow_up) = match FOLLOW_UP_SPLIT.find(body) {
        Some(sep) => (&body[..sep.start()], Some(&body[sep.end()..])),
        None => (body, None),
    };

    let question = clean_value(&strip_markup(question));
    if question.is_empty() {
        return None;
    }
    Some(RawProbe {
        tagged,
        tier: tagged.unwrap_or(default_tier),
        question,
        follow_up: follow_up
            .map(|f| clean_value(&strip_markup(f)))
            .filter(|f| !f.is_empty()),
    })
}

/// Numbered probes; continuation lines join their item. Falls back to
/// `[PRIMARY]` / `[SECONDARY]` markers when nothing is numbered.
fn numbered_probes(section: &str, default_tier: ProbeTier) -> Vec<RawProbe> {
    let probes: Vec<RawProbe> = split_blocks(section, |l| NUMBERED_ITEM.captures(l))
        .into_iter()
        .filter_map(|(head, lines)| {
            let first = head.get(1).map_or("", |m| m.as_str());
            let text = std::iter::once(first)
                .chain(lines.iter().skip(1).copied())
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            read_probe(&text, default_tier)
        })
        .collect();
    if !probes.is_empty() {
        return probes;
    }

    section
        .lines()
        .filter_map(|l| TAGGED_PROBE.captures(l))
        .filter_map(|c| {
            let tier = parse_tier(c.get(1)?.as_str())?;
            read_probe(c.get(2)?.as_str(), tier)
        })
        .collect()
}

/// Split Pro probes into (primary, secondary).
///
/// Explicit "Primary Probes" / "Secondary Probes" sub-headings win, then
/// per-probe tier tags; otherwise the first five of every eight are primary.
fn split_probes(section: &str) -> (Vec<Probe>, Vec<Probe>) {
    let primary_head = PRIMARY_HEADING.find(section);
    let secondary_head = SECONDARY_HEADING.find(section);

    if primary_head.is_some() || secondary_head.is_some() {
        let slice = |start: usize, end: usize| section.get(start..end).unwrap_or("");
        let primary_text = match (primary_head, secondary_head) {
            (Some(p), Some(s)) if p.end() <= s.start() => slice(p.end(), s.start()),
            (Some(p), _) => slice(p.end(), section.len()),
            (None, Some(s)) => slice(0, s.start()),
            (None, None) => "",
        };
        let secondary_text = match (secondary_head, primary_head) {
            (Some(s), Some(p)) if s.end() <= p.start() => slice(s.end(), p.start()),
            (Some(s), _) => slice(s.end(), section.len()),
            (None, _) => "",
        };
        let tiered = |text: &str, tier: ProbeTier| -> Vec<Probe> {
            numbered_probes(text, tier)
                .into_iter()
                .map(|p| p.with_tier(tier).into_probe())
                .collect()
        };
        return (
            tiered(primary_text, ProbeTier::Primary),
            tiered(secondary_text, ProbeTier::Secondary),
        );
    }

    let all = numbered_probes(section, ProbeTier::Primary);
    if all.iter().any(|p| p.tagged == Some(ProbeTier::Secondary)) {
        let (primary, secondary): (Vec<RawProbe>, Vec<RawProbe>) =
            all.into_iter().partition(|p| p.tier == ProbeTier::Primary);
        return (
            primary.into_iter().map(RawProbe::into_probe).collect(),
            secondary.into_iter().map(RawProbe::into_probe).collect(),
        );
    }

    let (share, of) = PRIMARY_PROBE_SHARE;
    let cut = (all.len() * share).div_ceil(of);
    let mut primary = Vec::with_capacity(cut);
    let mut secondary = Vec::new();
    for (i, probe) in all.into_iter().enumerate() {
        if i < cut {
            primary.push(probe.with_tier(ProbeTier::Primary).into_probe());
        } else {
            secondary.push(probe.with_tier(ProbeTier::Secondary).into_probe());
        }
    }
    (primary, secondary)
}

// ── Hooks, competitors, flow ──

static BOLD_LEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-•*]\s+|\d{1,2}[.)]\s+|#{2,4}\s+)?\*\*\[?([^*\]\n]+?)\]?\*\*\s*[:\-–—]?\s*(.*)$")
        .expect("valid regex")
});

static HOOK_BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*[-•*]\s+(?:hook\s+\d+\s*:\s*)?(.+?)(?:\s+[-–—]\s+|:\s+)(.+)$")
        .expect("valid regex")
});

static COMPETITOR_BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[-•*]\s+(?:\*\*)?([^*\n:]+?)(?:\*\*)?\s*(?::|\s[-–—])(?:\*\*)?\s+(.+)$")
        .expect("valid regex")
});

static COMPETITOR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-•*]\s+)?(?:\*\*)?([^*\n:]+?)(?:\*\*)?\s*(?::|\s[-–—])(?:\*\*)?\s+(.+)$")
        .expect("valid regex")
});

static FLOW_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\*([^*\n]+?)\*\*\s*[:\-–—]?\s*(.*)$").expect("valid regex")
});

/// Continuation text of a block: the head's remainder plus following lines.
fn block_body(rest: &str, lines: &[&str]) -> String {
    std::iter::once(rest)
        .chain(lines.iter().skip(1).copied())
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn hooks(section: &str) -> Vec<Hook> {
    let bold: Vec<Hook> = split_blocks(section, |l| BOLD_LEAD.captures(l))
        .into_iter()
        .filter_map(|(head, lines)| {
            let name = strip_markup(head.get(1)?.as_str())
                .trim_end_matches(':')
                .trim()
                .to_string();
            let description = strip_markup(&block_body(head.get(2).map_or("", |m| m.as_str()), &lines));
            (!name.is_empty() && !description.is_empty()).then_some(Hook { name, description })
        })
        .collect();
    if !bold.is_empty() {
        return bold;
    }

    section
        .lines()
        .filter_map(|l| HOOK_BULLET.captures(l))
        .filter_map(|c| {
            Some(Hook {
                name: strip_markup(c.get(1)?.as_str()),
                description: strip_markup(c.get(2)?.as_str()),
            })
        })
        .collect()
}

fn competitor_lines(section: &str, line: &Regex) -> Vec<Competitor> {
    section
        .lines()
        .filter_map(|l| line.captures(l))
        .filter_map(|c| {
            let name = strip_markup(c.get(1)?.as_str());
            let why = strip_markup(c.get(2)?.as_str());
            (!name.is_empty() && !why.is_empty()).then_some(Competitor { name, why })
        })
        .collect()
}

fn competitors(section: &str) -> Vec<Competitor> {
    let bulleted = competitor_lines(section, &COMPETITOR_BULLET);
    if !bulleted.is_empty() {
        return bulleted;
    }
    competitor_lines(section, &COMPETITOR_LINE)
}

fn emotional_probe(section: &str) -> Option<String> {
    first_quote(section).or_else(|| non_empty(&strip_markup(section)))
}

fn flow_steps(section: &str) -> Vec<FlowStep> {
    split_blocks(section, |l| NUMBERED_ITEM.captures(l))
        .into_iter()
        .filter_map(|(head, lines)| {
            let item = head.get(1)?.as_str().trim();
            let (title, rest) = match FLOW_TITLE.captures(item) {
                Some(c) => (
                    c.get(1)?.as_str().trim().trim_end_matches(':').to_string(),
                    block_body(c.get(2).map_or("", |m| m.as_str()), &lines),
                ),
                None => match item.find('"') {
                    Some(q) => (
                        item[..q].trim().trim_end_matches([':', '-', '–', '—']).trim().to_string(),
                        block_body(&item[q..], &lines),
                    ),
                    None => (strip_markup(item), block_body("", &lines)),
                },
            };
            if title.is_empty() {
                return None;
            }
            let script = first_quote(&rest).or_else(|| non_empty(&strip_markup(&rest)));
            Some(FlowStep { title, script })
        })
        .collect()
}

// ──────────────────────────────────────────────
// Discovery Lab Pro
// ──────────────────────────────────────────────

pub fn build_discovery_pro(doc: &SectionedText<'_>) -> DiscoveryProReport {
    let (primary_probes, secondary_probes) = from_section(doc, "probes", split_probes);

    DiscoveryProReport {
        findings: from_section(doc, "findings", findings),
        executive_summary: section_text(doc, "executive_summary"),
        target: target_profile(doc),
        psychology: ProspectPsychology {
            success_metrics: doc.field("success_metrics"),
            fears: doc.field("fears"),
            need_to_hear: doc.field("need_to_hear"),
            says_yes_when: doc.field("says_yes_when"),
        },
        primary_probes,
        secondary_probes,
        hooks: from_section(doc, "hooks", hooks),
        competitors: from_section(doc, "competitors", competitor_positions),
        emotional_probe: doc.section("emotional").and_then(emotional_probe),
        flow: from_section(doc, "flow", flow_steps),
        decision_tree: from_section(doc, "decision_tree", decision_branches),
        search_intel: labeled_fields(
            doc,
            &[
                (SEARCH_LABEL, "search_terms"),
                (FIND_LABEL, "want_found"),
                (SEEDS_LABEL, "seeds"),
            ],
        ),
        opening: labeled_fields(
            doc,
            &[
                (AUTHORITY_FRAME_LABEL, "authority_frame"),
                (REASON_LABEL, "reason_for_call"),
                (PERMISSION_LABEL, "permission_question"),
                (TRANSITION_LABEL, "transition"),
            ],
        ),
        objections: from_section(doc, "objections", objection_handles),
        objectives: CallObjectives {
            primary: doc.field("primary_objective"),
            success_looks_like: doc.field("success_looks_like"),
            minimum_viable_outcome: doc.field("minimum_viable_outcome"),
            red_flags: doc.field("red_flags"),
        },
        unknowns: from_section(doc, "unknowns", open_questions),
        actions: from_section(doc, "actions", post_call_actions),
    }
}

fn labeled_fields(doc: &SectionedText<'_>, pairs: &[(&str, &str)]) -> Vec<LabeledScript> {
    pairs
        .iter()
        .filter_map(|(label, key)| {
            doc.field(key).map(|text| LabeledScript {
                label: (*label).to_string(),
                text,
            })
        })
        .collect()
}

// ── Findings ──

static FINDING_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:#{2,4}\s+)?(?:\*\*)?\s*\d{1,2}[.)]\s*(.+?)\s*(?:\*\*)?\s*$").expect("valid regex")
});

static FINDING_WHAT: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_all(&[labelled(r"\**\s*what\s+it\s+is")]));
static FINDING_WHY: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_all(&[labelled(r"\**\s*why\s+it\s+matters")]));
static FINDING_ACTION: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_all(&[labelled(r"\**\s*what\s+to\s+do")]));
static FINDING_CONFIDENCE: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_all(&[labelled(r"\**\s*confidence")]));

fn findings(section: &str) -> Vec<Finding> {
    split_blocks(section, |l| FINDING_START.captures(l))
        .into_iter()
        .filter_map(|(head, lines)| {
            let title = strip_markup(head.get(1)?.as_str()).replace(['[', ']'], "");
            let title = title.trim();
            if title.is_empty() {
                return None;
            }
            let block = lines[1..].join("\n");
            Some(Finding {
                title: title.to_string(),
                what: first_capture(&FINDING_WHAT, &block),
                why: first_capture(&FINDING_WHY, &block),
                action: first_capture(&FINDING_ACTION, &block),
                confidence: first_capture(&FINDING_CONFIDENCE, &block),
            })
        })
        .take(MAX_FINDINGS)
        .collect()
}

// ── Competitor positioning ──

/// Bold text that labels a field inside a competitor block.
static COMPETITOR_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:what|where|how|the\s+question|question|good\s+at|falls?\s+short|position)")
        .expect("valid regex")
});

static GOOD_AT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[labelled(
        r"\**\s*(?:what\s+they(?:'re|\s+are)?\s+good\s+at|good\s+at|strengths?)",
    )])
});
static FALL_SHORT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[labelled(
        r"\**\s*(?:where\s+they\s+fall\s+short|falls?\s+short|weakness(?:es)?)",
    )])
});
static POSITION: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[labelled(r"\**\s*(?:how\s+to\s+position|positioning|position)")])
});
static QUESTION: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_all(&[labelled(r"\**\s*(?:the\s+)?question")]));

static LEADING_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s:\-–—]+").expect("valid regex"));

fn competitor_start(line: &str) -> Option<(String, String)> {
    let c = BOLD_LEAD.captures(line)?;
    let name = strip_markup(c.get(1)?.as_str());
    let rest = c.get(2).map_or("", |m| m.as_str()).trim();
    if name.is_empty() || name.ends_with(':') || COMPETITOR_FIELD.is_match(&name) {
        return None;
    }
    Some((name, LEADING_SEPARATOR.replace(rest, "").into_owned()))
}

fn competitor_positions(section: &str) -> Vec<CompetitorPosition> {
    let blocks: Vec<CompetitorPosition> = split_blocks(section, competitor_start)
        .into_iter()
        .map(|((name, rest), lines)| {
            let block = lines.join("\n");
            let mut position = CompetitorPosition {
                name,
                strength: first_capture(&GOOD_AT, &block),
                weakness: first_capture(&FALL_SHORT, &block),
                positioning: first_capture(&POSITION, &block),
                question: first_capture(&QUESTION, &block),
            };
            if position.positioning.is_none() {
                position.positioning = non_empty(&strip_markup(&rest));
            }
            position
        })
        .collect();
    if !blocks.is_empty() {
        return blocks;
    }

    competitors(section)
        .into_iter()
        .map(|c| CompetitorPosition {
            name: c.name,
            strength: None,
            weakness: None,
            positioning: Some(c.why),
            question: None,
        })
        .collect()
}

// ── Decision tree ──

static BRANCH_BOLD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:[-•*]\s+|\d{1,2}[.)]\s+)?\*\*\s*((?:if|when)\b[^*\n]*?)\s*\*\*\s*[:\-–—→]?\s*(.*)$")
        .expect("valid regex")
});

static BRANCH_PLAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^\s*(?:[-•*]\s+|\d{1,2}[.)]\s+)?((?:if|when)\s[^"→\n:]*?)\s*(?:→|->|:)\s*(.*)$"#)
        .expect("valid regex")
});

static GUIDANCE: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_all(&[labelled(r"\**\s*guidance")]));

static GUIDANCE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[\s\-•*>]*(?:\*\*)?guidance").expect("valid regex"));

static SCRIPT: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_all(&[labelled(r"\**\s*(?:script|say)")]));

fn branch_start(line: &str) -> Option<(String, String)> {
    let c = BRANCH_BOLD.captures(line).or_else(|| BRANCH_PLAIN.captures(line))?;
    let condition = strip_markup(c.get(1)?.as_str())
        .trim_end_matches(':')
        .trim()
        .to_string();
    Some((condition, c.get(2).map_or("", |m| m.as_str()).to_string()))
}

fn decision_branches(section: &str) -> Vec<DecisionBranch> {
    split_blocks(section, branch_start)
        .into_iter()
        .filter_map(|((condition, rest), lines)| {
            let block = lines[1..].join("\n");
            let spoken: Vec<&str> = std::iter::once(rest.as_str())
                .chain(lines[1..].iter().copied())
                .filter(|l| !GUIDANCE_LINE.is_match(l))
                .collect();
            let script = first_quote(&spoken.join("\n"))
                .or_else(|| first_capture(&SCRIPT, &block))?;
            Some(DecisionBranch {
                condition,
                guidance: first_capture(&GUIDANCE, &block),
                script,
            })
        })
        .collect()
}

// ── Objections ──

static OBJECTION_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:[-•*]\s+|\d{1,2}[.)]\s+|#{2,4}\s+)?(?:\*\*)?\s*objection(?:\s*#?\d+)?\s*:\s*(.*)$")
        .expect("valid regex")
});

static INLINE_HANDLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?)\s*(?:\*\*)?\s*>?\s*(?:\*\*)?handle(?:\*\*)?\s*:\s*(?:\*\*)?(.+)$")
        .expect("valid regex")
});

static ARROW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*(?:→|->)\s*").expect("valid regex"));

static HANDLE: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_all(&[labelled(r"\**\s*(?:handle|response)")]));

static ARROW_OBJECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-•*]\s+|\d{1,2}[.)]\s+)(.+?)\s*(?:→|->)\s*(.+)$").expect("valid regex")
});

fn spoken(raw: &str) -> String {
    clean_value(&strip_markup(raw))
}

fn objection_handles(section: &str) -> Vec<ObjectionHandle> {
    let blocks: Vec<ObjectionHandle> = split_blocks(section, |l| OBJECTION_START.captures(l))
        .into_iter()
        .filter_map(|(head, lines)| {
            let rest = head.get(1).map_or("", |m| m.as_str());
            let (objection, handle) = if let Some(c) = INLINE_HANDLE.captures(rest) {
                (spoken(c.get(1)?.as_str()), Some(spoken(c.get(2)?.as_str())))
            } else if let Some(sep) = ARROW.find(rest) {
                (spoken(&rest[..sep.start()]), Some(spoken(&rest[sep.end()..])))
            } else {
                let block = lines[1..].join("\n");
                let handle = first_capture(&HANDLE, &block).or_else(|| first_quote(&block));
                (spoken(rest), handle)
            };
            let handle = handle.filter(|h| !h.is_empty())?;
            (!objection.is_empty()).then_some(ObjectionHandle { objection, handle })
        })
        .collect();
    if !blocks.is_empty() {
        return blocks;
    }

    section
        .lines()
        .filter_map(|l| ARROW_OBJECTION.captures(l))
        .filter_map(|c| {
            let objection = spoken(c.get(1)?.as_str());
            let handle = spoken(c.get(2)?.as_str());
            (!objection.is_empty() && !handle.is_empty()).then_some(ObjectionHandle { objection, handle })
        })
        .collect()
}

// ── Open questions ──

static GAPS_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t#]*(?:\*\*)?[ \t]*(?:knowledge\s+)?gaps\b[^\n]*$").expect("valid regex")
});

static ASSUMPTIONS_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t#]*(?:\*\*)?[ \t]*assumptions\b[^\n]*$").expect("valid regex")
});

static RED_FLAGS_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t#]*(?:\*\*)?[ \t]*red\s+flags\b[^\n]*$").expect("valid regex")
});

fn open_questions(section: &str) -> OpenQuestions {
    let labels = [&*GAPS_LABEL, &*ASSUMPTIONS_LABEL, &*RED_FLAGS_LABEL];

    // (label start, label end, which list)
    let mut marks: Vec<(usize, usize, usize)> = labels
        .iter()
        .enumerate()
        .filter_map(|(i, re)| re.find(section).map(|m| (m.start(), m.end(), i)))
        .collect();
    marks.sort_unstable();

    let mut lists: [Vec<String>; 3] = Default::default();
    for (n, &(_, end, which)) in marks.iter().enumerate() {
        let stop = marks.get(n + 1).map_or(section.len(), |next| next.0);
        lists[which] = bullet_items(section.get(end..stop).unwrap_or(""));
    }

    let [gaps, assumptions, red_flags_to_watch] = lists;
    OpenQuestions {
        gaps,
        assumptions,
        red_flags_to_watch,
    }
}

// ── Post-call actions ──

static ACTION_BRACKET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\d{1,2}[.)]|[-•*])\s*(?:\*\*)?\[([^\]\n]+)\](?:\*\*)?\s*[:\-–—]?\s*(.+)$")
        .expect("valid regex")
});

static ACTION_BOLD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\d{1,2}[.)]|[-•*])\s*\*\*([^*\n]+?)\*\*\s*[:\-–—]?\s*(.+)$").expect("valid regex")
});

static ACTION_COLON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\d{1,2}[.)]|[-•*])\s*([^:\n]+?):\s+(.+)$").expect("valid regex")
});

fn post_call_actions(section: &str) -> Vec<PostCallAction> {
    section
        .lines()
        .filter_map(|line| {
            let c = ACTION_BRACKET
                .captures(line)
                .or_else(|| ACTION_BOLD.captures(line))
                .or_else(|| ACTION_COLON.captures(line))?;
            let timing = strip_markup(c.get(1)?.as_str())
                .trim_end_matches(':')
                .trim()
                .to_string();
            let action = strip_markup(c.get(2)?.as_str());
            (!timing.is_empty() && !action.is_empty()).then_some(PostCallAction { timing, action })
        })
        .collect()
}
