//! Declarative per-variant section grammars and the section locator.
//!
//! A grammar names its sections by the heading titles they may carry and
//! lists, per scalar field, an ordered set of candidate matchers. Locating
//! a section tries every spelling of its heading (numbered, markdown, bold,
//! then loose) in that order and keeps the first that has a body.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::matchers::{compile_all, dashed, first_capture, labelled};
use crate::models::enums::ReportVariant;

/// A named section and the heading titles that introduce it, in priority order.
#[derive(Debug, Clone)]
pub struct SectionRule {
    pub key: &'static str,
    pub titles: &'static [&'static str],
}

/// Ordered candidate regexes for one scalar field. Capture 1 is the value.
#[derive(Debug)]
pub struct FieldMatcher {
    pub key: &'static str,
    /// Section searched first; the whole document is the fallback.
    pub section: Option<&'static str>,
    candidates: Vec<Regex>,
}

impl FieldMatcher {
    pub fn new(key: &'static str, section: Option<&'static str>, patterns: &[String]) -> Self {
        Self {
            key,
            section,
            candidates: compile_all(patterns),
        }
    }

    /// Shorthand for the common `Label: value` / `Label - value` pair.
    pub fn label(key: &'static str, section: Option<&'static str>, label: &str) -> Self {
        Self::new(key, section, &[labelled(label), dashed(label)])
    }

    pub fn find(&self, text: &str) -> Option<String> {
        first_capture(&self.candidates, text)
    }
}

#[derive(Debug)]
pub struct SectionGrammar {
    pub variant: ReportVariant,
    /// Literal phrases whose presence votes for this layout.
    pub cues: &'static [&'static str],
    pub sections: &'static [SectionRule],
    /// Headings that end a section but are not extracted.
    pub stops: &'static [&'static str],
    pub fields: Vec<FieldMatcher>,
}

impl SectionGrammar {
    pub fn rule(&self, key: &str) -> Option<&SectionRule> {
        self.sections.iter().find(|r| r.key == key)
    }

    pub fn field_matcher(&self, key: &str) -> Option<&FieldMatcher> {
        self.fields.iter().find(|f| f.key == key)
    }

    fn all_titles(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sections
            .iter()
            .flat_map(|r| r.titles.iter().copied())
            .chain(self.stops.iter().copied())
    }
}

pub fn grammar_for(variant: ReportVariant) -> &'static SectionGrammar {
    match variant {
        ReportVariant::CallLabLite => &LITE_GRAMMAR,
        ReportVariant::CallLabPro => &PRO_GRAMMAR,
        ReportVariant::DiscoveryLab => &DISCOVERY_GRAMMAR,
        ReportVariant::DiscoveryLabPro => &DISCOVERY_PRO_GRAMMAR,
    }
}

// ──────────────────────────────────────────────
// Heading recognition
// ──────────────────────────────────────────────

/// Heading spellings in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum HeadingStyle {
    Numbered,
    Markdown,
    Bold,
    Loose,
}

#[derive(Debug)]
struct Heading {
    style: HeadingStyle,
    /// Lower is more significant. Markdown uses its level, the rest sit at 2.
    rank: u8,
    /// Heading text with markup, numbering and symbols removed.
    label: String,
}

static MARKDOWN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{0,3}(#{1,6})\s+(.+?)\s*#*\s*$").expect("valid regex"));

static NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{1,2}[.)]\s+").expect("valid regex"));

static BOLD_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\*\*([^*]+?)\*\*\s*:?\s*$").expect("valid regex"));

/// What may follow a title on its heading line: a parenthetical, a colon, or a
/// dash-separated subtitle. Group 1 is the separator, group 2 the trailing text.
static TITLE_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\([^)]*\)|\[[^\]]*\])?\s*(?:(--|—|–|-|:)\s*(.*))?$").expect("valid regex")
});

const MAX_LOOSE_HEADING_CHARS: usize = 90;

fn clean_label(raw: &str) -> String {
    let no_bold = raw.replace("**", "");
    let no_number = NUMBER_PREFIX.replace(&no_bold, "");
    no_number
        .trim_start_matches(|c: char| !(c.is_alphanumeric() || c == '"' || c == '(' || c == '['))
        .trim_end_matches(|c: char| c == '*' || c == ':' || c.is_whitespace())
        .to_string()
}

fn classify_heading(line: &str) -> Option<Heading> {
    if let Some(c) = MARKDOWN.captures(line) {
        let level = c.get(1).map_or(1, |m| m.as_str().len()) as u8;
        let label = clean_label(c.get(2).map_or("", |m| m.as_str()));
        return Some(Heading {
            style: HeadingStyle::Markdown,
            rank: level,
            label,
        });
    }

    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_LOOSE_HEADING_CHARS {
        return None;
    }

    let style = if NUMBER_PREFIX.is_match(trimmed) {
        HeadingStyle::Numbered
    } else if BOLD_ONLY.is_match(trimmed) {
        HeadingStyle::Bold
    } else {
        HeadingStyle::Loose
    };

    Some(Heading {
        style,
        rank: 2,
        label: clean_label(trimmed),
    })
}

fn compact_upper(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// If `label` introduces `title`, returns the inline text written after a
/// colon on the heading line (possibly empty).
fn match_title(label: &str, title: &str) -> Option<String> {
    let label_c = compact_upper(label);
    let title_c = compact_upper(title);
    let rest = label_c.strip_prefix(&title_c)?;
    let caps = TITLE_TAIL.captures(rest)?;
    if caps.get(1).map(|m| m.as_str()) == Some(":") {
        // Recover the inline text with its original spacing.
        let inline = label.split_once(':').map_or("", |(_, after)| after);
        return Some(inline.trim().to_string());
    }
    Some(String::new())
}

fn is_shouting(label: &str) -> bool {
    let letters = label.chars().filter(|c| c.is_alphabetic()).count();
    letters >= 3 && !label.chars().any(|c| c.is_lowercase())
}

// ──────────────────────────────────────────────
// Section location
// ──────────────────────────────────────────────

/// A document split into the sections its grammar names.
#[derive(Debug)]
pub struct SectionedText<'a> {
    grammar: &'a SectionGrammar,
    text: &'a str,
    sections: HashMap<&'static str, String>,
}

impl<'a> SectionedText<'a> {
    pub fn parse(grammar: &'a SectionGrammar, text: &'a str) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        let headings: Vec<Option<Heading>> = lines.iter().map(|l| classify_heading(l)).collect();

        let mut sections = HashMap::new();
        for rule in grammar.sections {
            match locate(grammar, rule, &lines, &headings) {
                Some(body) => {
                    sections.insert(rule.key, body);
                }
                None => tracing::trace!(section = rule.key, "Section not found"),
            }
        }

        Self {
            grammar,
            text,
            sections,
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn section(&self, key: &str) -> Option<&str> {
        self.sections.get(key).map(String::as_str)
    }

    /// Scalar field lookup: the field's own section first, then the whole text.
    pub fn field(&self, key: &str) -> Option<String> {
        let matcher = self.grammar.field_matcher(key)?;
        matcher
            .section
            .and_then(|s| self.section(s))
            .and_then(|body| matcher.find(body))
            .or_else(|| matcher.find(self.text))
    }

    pub fn populated_sections(&self) -> usize {
        self.sections.len()
    }
}

fn locate(
    grammar: &SectionGrammar,
    rule: &SectionRule,
    lines: &[&str],
    headings: &[Option<Heading>],
) -> Option<String> {
    // (style, title priority, line index, inline text)
    let mut candidates: Vec<(HeadingStyle, usize, usize, String)> = Vec::new();
    for (idx, heading) in headings.iter().enumerate() {
        let Some(h) = heading else { continue };
        for (ti, title) in rule.titles.iter().enumerate() {
            if let Some(inline) = match_title(&h.label, title) {
                candidates.push((h.style, ti, idx, inline));
                break;
            }
        }
    }
    candidates.sort_by_key(|(style, ti, idx, _)| (*style, *ti, *idx));

    candidates.into_iter().find_map(|(_, _, idx, inline)| {
        let body = section_body(grammar, lines, headings, idx);
        let full = if inline.is_empty() {
            body
        } else if body.is_empty() {
            inline
        } else {
            format!("{inline}\n{body}")
        };
        (!full.trim().is_empty()).then(|| full.trim().to_string())
    })
}

/// Lines after `start` up to the next heading of equal or higher rank, or
/// the next line introducing any title the grammar knows. A bold-only
/// section also ends at the next all-caps bold line.
fn section_body(
    grammar: &SectionGrammar,
    lines: &[&str],
    headings: &[Option<Heading>],
    start: usize,
) -> String {
    let (rank, start_style) = headings[start]
        .as_ref()
        .map_or((2, HeadingStyle::Loose), |h| (h.rank, h.style));
    let mut end = lines.len();

    for (offset, heading) in headings[start + 1..].iter().enumerate() {
        let Some(h) = heading else { continue };
        let names_section = grammar.all_titles().any(|t| match_title(&h.label, t).is_some());
        let boundary = match h.style {
            HeadingStyle::Markdown => h.rank <= rank || names_section,
            HeadingStyle::Bold => {
                names_section
                    || (start_style == HeadingStyle::Bold
                        && is_shouting(&h.label)
                        && !NUMBER_PREFIX.is_match(&lines[start + 1 + offset].replace("**", "")))
            }
            HeadingStyle::Numbered | HeadingStyle::Loose => {
                names_section && heading_like(grammar, h, lines[start + 1 + offset])
            }
        };
        if boundary {
            end = start + 1 + offset;
            break;
        }
    }

    lines[start + 1..end].join("\n").trim().to_string()
}

/// A plain line naming a title ends a section only when it reads as a
/// heading. "Strengths: rapport and timing." inside a paragraph is prose.
fn heading_like(grammar: &SectionGrammar, heading: &Heading, line: &str) -> bool {
    if is_shouting(&heading.label) || NUMBER_PREFIX.replace(line, "").trim_start().starts_with("**") {
        return true;
    }
    grammar
        .all_titles()
        .any(|t| match_title(&heading.label, t).is_some_and(|inline| inline.is_empty()))
}

// ──────────────────────────────────────────────
// Grammars
// ──────────────────────────────────────────────

const LITE_SECTIONS: &[SectionRule] = &[
    SectionRule { key: "header", titles: &["CALL LAB LITE", "DIAGNOSTIC SNAPSHOT"] },
    SectionRule { key: "snap_take", titles: &["SNAP TAKE"] },
    SectionRule { key: "what_worked", titles: &["WHAT WORKED"] },
    SectionRule { key: "what_to_watch", titles: &["WHAT TO WATCH"] },
    SectionRule { key: "why_it_worked", titles: &["WHY THIS CALL WORKED", "WHY IT WORKED"] },
    SectionRule { key: "signals", titles: &["CALL SIGNALS DETECTED", "CALL SIGNALS", "SIGNALS DETECTED"] },
    SectionRule { key: "level_up", titles: &["ONE MOVE TO LEVEL UP", "LEVEL UP"] },
    SectionRule { key: "bottom_line", titles: &["BOTTOM LINE"] },
];

const PRO_SECTIONS: &[SectionRule] = &[
    SectionRule { key: "header", titles: &["CALL LAB PRO"] },
    SectionRule { key: "snap_take", titles: &["SNAP TAKE", "EXECUTIVE SUMMARY"] },
    SectionRule {
        key: "dimensions",
        titles: &["PERFORMANCE SCORES", "PERFORMANCE SCORECARD", "PERFORMANCE DIMENSIONS"],
    },
    SectionRule { key: "strengths", titles: &["STRENGTHS DETECTED", "STRENGTHS"] },
    SectionRule {
        key: "frictions",
        titles: &["FRICTION DETECTED", "FRICTIONS DETECTED", "PATTERNS DETECTED", "FRICTIONS", "FRICTION"],
    },
    SectionRule { key: "timeline", titles: &["TRUST MAP", "TRUST TIMELINE"] },
    SectionRule {
        key: "rewrites",
        titles: &[
            "TACTICAL MOMENT REWRITES",
            "TACTICAL MOMENT REWRITE",
            "TACTICAL REWRITES",
            "TACTICAL REWRITE",
        ],
    },
    SectionRule {
        key: "blueprint",
        titles: &["NEXT-CALL BLUEPRINT", "NEXT CALL BLUEPRINT", "NEXT STEPS"],
    },
    SectionRule { key: "follow_up", titles: &["FOLLOW-UP EMAIL", "FOLLOW UP EMAIL"] },
    SectionRule { key: "closing", titles: &["BOTTOM LINE INSIGHT", "BOTTOM LINE", "CLOSING INSIGHT"] },
];

const AUTHORITY: SectionRule = SectionRule { key: "authority", titles: &["Authority Snapshot"] };
const PROBES: SectionRule = SectionRule {
    key: "probes",
    titles: &["Pain / Impact Probes", "Pain Impact Probes", "Impact Probes", "Pain Probes"],
};
const HOOKS: SectionRule = SectionRule {
    key: "hooks",
    titles: &["Market & Competitor Hooks", "Market and Competitor Hooks", "Competitor Hooks", "Market Hooks"],
};
const COMPETITORS: SectionRule = SectionRule {
    key: "competitors",
    titles: &["Competitor Set", "Competitor Positioning", "Competitors"],
};
const EMOTIONAL: SectionRule = SectionRule {
    key: "emotional",
    titles: &["Emotional / Identity Probe", "Emotional Probe", "Identity Probe"],
};
const FLOW: SectionRule = SectionRule {
    key: "flow",
    titles: &["Quick Discovery Flow", "Discovery Flow"],
};

const DISCOVERY_SECTIONS: &[SectionRule] = &[
    AUTHORITY,
    PROBES,
    HOOKS,
    COMPETITORS,
    EMOTIONAL,
    FLOW,
    SectionRule { key: "objective", titles: &["Call Objective"] },
];

const DISCOVERY_PRO_SECTIONS: &[SectionRule] = &[
    SectionRule { key: "findings", titles: &["TOP 5 FINDINGS", "TOP FINDINGS", "KEY FINDINGS"] },
    SectionRule { key: "executive_summary", titles: &["Executive Summary", "MOMENTUM SIGNALS"] },
    AUTHORITY,
    SectionRule { key: "psychology", titles: &["Prospect Psychology"] },
    PROBES,
    HOOKS,
    COMPETITORS,
    EMOTIONAL,
    FLOW,
    SectionRule { key: "decision_tree", titles: &["Conversation Decision Tree", "Decision Tree"] },
    SectionRule { key: "google", titles: &["What They'll Google", "What They Will Google"] },
    SectionRule { key: "opening", titles: &["Opening 60 Seconds", "Opening 60 Second", "First 60 Seconds"] },
    SectionRule { key: "objections", titles: &["Objection Handles", "Objection Handling", "Objections"] },
    SectionRule {
        key: "objectives",
        titles: &["Call Objective & Success Metrics", "Call Objective and Success Metrics", "Call Objective"],
    },
    SectionRule { key: "unknowns", titles: &["What We Don't Know", "What We Do Not Know"] },
    SectionRule { key: "actions", titles: &["Post-Call Actions", "Post Call Actions", "Post-Call Action"] },
];

fn metadata_fields(section: &'static str) -> Vec<FieldMatcher> {
    vec![
        FieldMatcher::label("call_name", Some(section), r"\**\s*call(?:\s+name)?"),
        FieldMatcher::label("duration", Some(section), r"\**\s*duration"),
        FieldMatcher::new(
            "effectiveness",
            Some(section),
            &[
                labelled(r"\**\s*effectiveness(?:\s+level)?"),
                r"(?i)effectiveness\s*:?\s*\**\s*(high|medium|low)\b".to_string(),
            ],
        ),
    ]
}

const SCORE_RATIO: &str =
    r"(?i)(?:overall\s+)?score(?:\*\*)?\s*:?\s*(?:\*\*)?\s*(\d+(?:\.\d+)?\s*(?:/|out\s+of|of)\s*\d+(?:\.\d+)?)";
const SCORE_BARE: &str = r"(?i)(?:overall\s+)?score(?:\*\*)?\s*:\s*(?:\*\*)?\s*(\d+(?:\.\d+)?)\b";

pub static LITE_GRAMMAR: LazyLock<SectionGrammar> = LazyLock::new(|| {
    let mut fields = metadata_fields("header");
    fields.extend([
        FieldMatcher::new(
            "score",
            Some("header"),
            &[SCORE_RATIO.to_string(), SCORE_BARE.to_string()],
        ),
        FieldMatcher::label("snap_take", None, r"\**\s*snap\s+take"),
        FieldMatcher::new(
            "level_up_example",
            Some("level_up"),
            &[
                r#"(?is)try\s+this\s*:?\s*(?:\*\*)?\s*(?:>\s*)?"([^"]+)""#.to_string(),
                labelled(r"\**\s*try\s+this"),
            ],
        ),
    ]);

    SectionGrammar {
        variant: ReportVariant::CallLabLite,
        cues: &[
            "CALL LAB LITE",
            "WHAT TO WATCH",
            "ONE MOVE TO LEVEL UP",
            "CALL SIGNALS DETECTED",
        ],
        sections: LITE_SECTIONS,
        stops: &["UNLOCK THE FULL ANALYSIS"],
        fields,
    }
});

pub static PRO_GRAMMAR: LazyLock<SectionGrammar> = LazyLock::new(|| {
    let mut fields = metadata_fields("header");
    fields.extend([
        FieldMatcher::new(
            "overall_score",
            Some("header"),
            &[SCORE_RATIO.to_string(), SCORE_BARE.to_string()],
        ),
        FieldMatcher::label("profile", Some("header"), r"\**\s*(?:sales\s+)?(?:dynamics\s+)?profile"),
        FieldMatcher::label("follow_up_subject", Some("follow_up"), r"\**\s*subject(?:\s+line)?"),
    ]);

    SectionGrammar {
        variant: ReportVariant::CallLabPro,
        cues: &[
            "CALL LAB PRO",
            "STRENGTHS DETECTED",
            "FRICTION DETECTED",
            "TRUST MAP",
            "TACTICAL MOMENT REWRITE",
            "NEXT-CALL BLUEPRINT",
            "PERFORMANCE SCORES",
        ],
        sections: PRO_SECTIONS,
        stops: &["SALES FRAMEWORK ANALYSIS", "PRO VALUE"],
        fields,
    }
});

const DISCOVERY_CUES: &[&str] = &[
    "DISCOVERY LAB",
    "Discovery Lab",
    "Authority Snapshot",
    "Pain / Impact Probes",
    "Quick Discovery Flow",
];

const DISCOVERY_PRO_CUES: &[&str] = &[
    "DISCOVERY LAB PRO",
    "Discovery Lab Pro",
    "Executive Summary",
    "Prospect Psychology",
    "Conversation Decision Tree",
    "What They'll Google",
    "Opening 60 Seconds",
];

fn target_fields() -> Vec<FieldMatcher> {
    vec![
        FieldMatcher::label("service", Some("authority"), r"\**\s*your\s+service"),
        FieldMatcher::label("target_company", Some("authority"), r"\**\s*target(?:\s+company)?"),
        FieldMatcher::label("contact", Some("authority"), r"\**\s*(?:target\s+)?contact"),
        FieldMatcher::label("recent_signals", Some("authority"), r"\**\s*recent\s+signals"),
        FieldMatcher::label("authority_line", Some("authority"), r"\**\s*authority\s+line"),
    ]
}

pub static DISCOVERY_GRAMMAR: LazyLock<SectionGrammar> = LazyLock::new(|| SectionGrammar {
    variant: ReportVariant::DiscoveryLab,
    cues: DISCOVERY_CUES,
    sections: DISCOVERY_SECTIONS,
    stops: &["UPGRADE", "Want the full"],
    fields: target_fields(),
});

pub static DISCOVERY_PRO_GRAMMAR: LazyLock<SectionGrammar> = LazyLock::new(|| {
    let mut fields = target_fields();
    fields.extend([
        FieldMatcher::label("success_metrics", Some("psychology"), r"\**\s*success\s+metrics"),
        FieldMatcher::label("fears", Some("psychology"), r"\**\s*fears"),
        FieldMatcher::label("need_to_hear", Some("psychology"), r"\**\s*what\s+they\s+need\s+to\s+hear"),
        FieldMatcher::label("says_yes_when", Some("psychology"), r"\**\s*what\s+makes\s+them\s+say\s+yes"),
        FieldMatcher::label("search_terms", Some("google"), r"\**\s*what\s+they'?ll\s+search(?:\s+for)?"),
        FieldMatcher::label("want_found", Some("google"), r"\**\s*what\s+you\s+want\s+them\s+to\s+find"),
        FieldMatcher::label("seeds", Some("google"), r"\**\s*seeds\s+to\s+plant"),
        FieldMatcher::label("authority_frame", Some("opening"), r"\**\s*authority\s+frame[^:\n*]*"),
        FieldMatcher::label("reason_for_call", Some("opening"), r"\**\s*reason\s+for\s+(?:call|reaching\s+out)[^:\n*]*"),
        FieldMatcher::label("permission_question", Some("opening"), r"\**\s*permission\s+question[^:\n*]*"),
        FieldMatcher::label("transition", Some("opening"), r"\**\s*transition[^:\n*]*"),
        FieldMatcher::label("primary_objective", Some("objectives"), r"\**\s*primary\s+(?:objective|goal)"),
        FieldMatcher::label("success_looks_like", Some("objectives"), r"\**\s*(?:what\s+)?success\s+looks\s+like"),
        FieldMatcher::label("minimum_viable_outcome", Some("objectives"), r"\**\s*minimum\s+viable\s+outcome"),
        FieldMatcher::label("red_flags", Some("objectives"), r"\**\s*red\s+flags"),
    ]);

    SectionGrammar {
        variant: ReportVariant::DiscoveryLabPro,
        cues: DISCOVERY_PRO_CUES,
        sections: DISCOVERY_PRO_SECTIONS,
        stops: &[],
        fields,
    }
});
