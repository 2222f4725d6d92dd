//! Pattern-card segmentation.
//!
//! A card section is cut into blocks at every line that opens a new
//! bold-labelled item (or a `###` item heading). Each block is then read on
//! its own, so a malformed card never disturbs its neighbours.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use super::matchers::{bullet_items, compile_all, first_capture, labelled, split_blocks, strip_markup};
use crate::models::enums::{Polarity, Severity, Strength};
use crate::models::report::{CardDetail, CounterReference, PatternCard};

static BOLD_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-•*]\s+|\d{1,2}[.)]\s+|[A-H][.)]\s+)?\*\*\[?([^*\]\n]+?)\]?\*\*\s*(.*)$")
        .expect("valid regex")
});

static HEADING_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#{2,4}\s+(.+)$").expect("valid regex"));

static LETTER_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[A-H][.)]\s+([^*\n]+?)\s*$").expect("valid regex"));

/// Heading text split into name, optional `(Category)` and a trailing remark.
static NAME_PARTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[?([^\]()\n]+?)\]?\s*(?:\(([^)]+)\))?\s*(?:(?:--|—|–|\s-|:)\s*(.*))?$")
        .expect("valid regex")
});

static ITEM_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d{1,2}|[A-H])[.)]\s+").expect("valid regex"));

static CATEGORY_PAREN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(([^)]+)\)").expect("valid regex"));

/// Bold text that is a field label inside a card rather than a card name.
static FIELD_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:strength|severity|evidence|fix|fixes|the fix|how|why|counter|what|try|symptoms|recommended|example|category|replicate|quote|rationale)\b",
    )
    .expect("valid regex")
});

static STRENGTH: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?i)strength(?:\*\*)?\s*[:\-–—]?\s*(?:\*\*)?\s*(strong|medium|developing)\b".into(),
    ])
});

static SEVERITY: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?i)severity(?:\*\*)?\s*[:\-–—]?\s*(?:\*\*)?\s*(high|medium|low)\b".into(),
    ])
});

/// Unlabelled level words, honoured on a card's heading line only.
static BARE_STRENGTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(STRONG|DEVELOPING|MEDIUM)\b").expect("valid regex"));

static BARE_SEVERITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(HIGH|MEDIUM|LOW)\b").expect("valid regex"));

static CATEGORY: LazyLock<Vec<Regex>> = LazyLock::new(|| compile_all(&[labelled(r"\**\s*category")]));

static HOW_IT_APPEARED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        labelled(r"\**\s*how\s+it\s+(?:appeared|showed\s+up)"),
        labelled(r"\**\s*what\s+it\s+is"),
    ])
});

static WHY_IT_MATTERED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        labelled(r"\**\s*why\s+it\s+(?:worked|hurt|hit|matters|mattered)"),
        labelled(r"\**\s*why\s+it\s+\w+"),
    ])
});

static EVIDENCE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r#"(?i)evidence(?:\*\*)?\s*:?\s*(?:\*\*)?\s*(?:>\s*)?"([^"\n]+)""#.into(),
        labelled(r"\**\s*evidence"),
    ])
});

static REPLICATION: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        labelled(r"\**\s*how\s+to\s+replicate"),
        labelled(r"\**\s*replicate"),
        labelled(r"\**\s*try\s+this"),
    ])
});

static FIX: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        labelled(r"\**\s*(?:the\s+)?fix"),
        labelled(r"\**\s*recommended\s+fix(?:es)?"),
    ])
});

static RECOMMENDED_FIXES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)recommended\s+fix(?:es)?").expect("valid regex"));

static COUNTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[\s\-•*]*(?:→|->)?\s*(?:\*\*)?counter(?:\s+(?:pattern|move))?(?:\s*\([^)\n]*\))?\s*(?:\*\*)?\s*:\s*(?:\*\*)?(.+)$",
    )
    .expect("valid regex")
});

static COUNTER_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[-–—]\s+|:\s+").expect("valid regex"));

static QUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"\n]{2,})""#).expect("valid regex"));

/// Lines whose quotes belong to a fix or tip, not to the evidence.
static NON_EVIDENCE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[\s\-•*>]*(?:\*\*)?(?:fix|the fix|how to replicate|replicate|try this|counter|→|->|example rewrite|recommended)",
    )
    .expect("valid regex")
});

#[derive(Debug, Clone, PartialEq)]
struct CardHead {
    name: String,
    category: Option<String>,
}

/// Cut a card section into blocks and read one card per block.
pub fn extract_cards(section: &str, polarity: Polarity) -> Vec<PatternCard> {
    let cards: Vec<PatternCard> = split_blocks(section, card_start)
        .into_iter()
        .map(|(head, lines)| build_card(head, &lines.join("\n"), polarity))
        .collect();
    tracing::trace!(cards = cards.len(), polarity = %polarity, "Pattern cards read");
    cards
}

fn card_start(line: &str) -> Option<CardHead> {
    if let Some(c) = BOLD_START.captures(line) {
        let name = c.get(1)?.as_str().trim();
        let rest = c.get(2).map_or("", |m| m.as_str()).trim();
        if name.ends_with(':') || rest.starts_with(':') || FIELD_LABEL.is_match(name) {
            return None;
        }
        let category = CATEGORY_PAREN
            .captures(rest)
            .and_then(|p| p.get(1))
            .map(|m| m.as_str().trim().to_string());
        return head_from(name, category);
    }

    let text = HEADING_START
        .captures(line)
        .or_else(|| LETTER_START.captures(line))?
        .get(1)?
        .as_str()
        .replace("**", "");
    if FIELD_LABEL.is_match(text.trim()) {
        return None;
    }
    let parts = NAME_PARTS.captures(text.trim())?;
    let name = parts.get(1)?.as_str();
    let category = parts.get(2).map(|m| m.as_str().trim().to_string());
    head_from(name, category)
}

fn head_from(name: &str, category: Option<String>) -> Option<CardHead> {
    let name = strip_markup(name);
    let name = ITEM_NUMBER
        .replace(&name, "")
        .trim_end_matches(':')
        .trim()
        .to_string();
    if name.is_empty() {
        return None;
    }
    Some(CardHead {
        name,
        category: category.filter(|c| !c.is_empty()),
    })
}

fn build_card(head: CardHead, block: &str, polarity: Polarity) -> PatternCard {
    let category = head.category.or_else(|| first_capture(&CATEGORY, block));
    let how_it_appeared = first_capture(&HOW_IT_APPEARED, block);
    let why_it_mattered = first_capture(&WHY_IT_MATTERED, block);
    let evidence = first_capture(&EVIDENCE, block).or_else(|| loose_evidence(block));

    let detail = match polarity {
        Polarity::Positive => CardDetail::Positive {
            strength: level_word(block, &STRENGTH, &BARE_STRENGTH)
                .and_then(|s| Strength::from_str(&s).ok()),
            replication_tip: first_capture(&REPLICATION, block),
        },
        Polarity::Negative => CardDetail::Negative {
            severity: level_word(block, &SEVERITY, &BARE_SEVERITY)
                .and_then(|s| Severity::from_str(&s).ok()),
            fix: first_capture(&FIX, block).or_else(|| listed_fixes(block)),
            counter: counter_reference(block),
        },
    };

    PatternCard {
        name: head.name,
        category,
        how_it_appeared,
        why_it_mattered,
        evidence,
        detail,
    }
}

/// A labelled level anywhere in the block, else a bare level word on the
/// heading line outside any quote.
fn level_word(block: &str, labelled: &[Regex], bare: &Regex) -> Option<String> {
    first_capture(labelled, block).or_else(|| {
        let head = block.lines().next()?;
        let unquoted = QUOTE.replace_all(head, "");
        bare.captures(&unquoted)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// First quote on a line that is not a fix, tip or counter line.
fn loose_evidence(block: &str) -> Option<String> {
    block
        .lines()
        .skip(1)
        .filter(|l| !NON_EVIDENCE_LINE.is_match(l))
        .find_map(|l| QUOTE.captures(l).and_then(|c| c.get(1)))
        .map(|m| m.as_str().trim().to_string())
}

/// Bulleted fixes under a "Recommended fixes" label, joined with "; ".
fn listed_fixes(block: &str) -> Option<String> {
    let start = RECOMMENDED_FIXES.find(block)?.end();
    let after = &block[start..];
    let items: Vec<String> = after
        .lines()
        .skip(1)
        .take_while(|l| l.trim().is_empty() || l.trim_start().starts_with(['-', '•', '*']))
        .flat_map(bullet_items)
        .collect();
    (!items.is_empty()).then(|| items.join("; "))
}

fn counter_reference(block: &str) -> Option<CounterReference> {
    let raw = COUNTER.captures(block)?.get(1)?.as_str().replace("**", "");
    let raw = raw.trim();
    let (name, rationale) = match COUNTER_SPLIT.find(raw) {
        Some(sep) => (&raw[..sep.start()], Some(raw[sep.end()..].trim())),
        None => (raw, None),
    };
    let name = strip_markup(name);
    if name.is_empty() {
        return None;
    }
    Some(CounterReference {
        name,
        rationale: rationale.filter(|r| !r.is_empty()).map(str::to_string),
    })
}
