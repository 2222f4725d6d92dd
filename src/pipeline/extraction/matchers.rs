//! Small text helpers shared by the variant builders.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::report::DimensionScore;

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-•*]\s+(.+)$").expect("valid regex"));

static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{1,2}[.)]\s+(.+)$").expect("valid regex"));

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"\n]{2,})""#).expect("valid regex"));

static RATIO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:/|out\s+of|of)\s*(\d+(?:\.\d+)?)").expect("valid regex")
});

static BARE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*%?\s*$").expect("valid regex"));

static TABLE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\|\s*([^|]+?)\s*\|\s*([^|]+?)\s*\|").expect("valid regex")
});

static LABEL_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-•*]\s+)?(?:\*\*)?([^:*|\n]+?)(?:\*\*)?\s*:\s*(?:\*\*)?\s*(.+)$")
        .expect("valid regex")
});

/// Regex source for a `Label: value` line. The label may be bold with the
/// colon inside or outside the bold markers, and may follow a bullet.
/// `label` is itself a regex fragment. The value must sit on the same line.
pub fn labelled(label: &str) -> String {
    format!(r"(?im)^[ \t>\-•*]*(?:{label})(?:\*\*)?[ \t]*:[ \t]*(?:\*\*)?[ \t]*(.+)$")
}

/// Looser form: `Label - value` or `Label — value`.
pub fn dashed(label: &str) -> String {
    format!(r"(?im)^[ \t>\-•*]*(?:{label})(?:\*\*)?[ \t]+[-–—][ \t]+(.+)$")
}

/// Compile a list of regex sources. Only called from `LazyLock` initializers.
pub fn compile_all(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
}

/// First non-empty capture 1 across `candidates`, tried in order.
pub fn first_capture(candidates: &[Regex], text: &str) -> Option<String> {
    candidates.iter().find_map(|re| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| clean_value(m.as_str()))
            .filter(|v| !v.is_empty())
    })
}

/// Trim whitespace, stray bold markers and one pair of enclosing quotes.
pub fn clean_value(raw: &str) -> String {
    let trimmed = raw
        .trim()
        .trim_start_matches("**")
        .trim_end_matches("**")
        .trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}

/// Remove every `**` pair and surrounding brackets from a label.
pub fn strip_markup(raw: &str) -> String {
    raw.replace("**", "")
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim()
        .to_string()
}

/// Non-empty trimmed text, or `None`.
pub fn non_empty(text: &str) -> Option<String> {
    let t = text.trim();
    (!t.is_empty()).then(|| t.to_string())
}

/// Items of `-`, `•` or `*` bulleted lines.
pub fn bullet_items(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|l| BULLET.captures(l))
        .filter_map(|c| c.get(1).map(|m| strip_markup(m.as_str())))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Items of bulleted or numbered lines.
pub fn list_items(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|l| BULLET.captures(l).or_else(|| NUMBERED.captures(l)))
        .filter_map(|c| c.get(1).map(|m| strip_markup(m.as_str())))
        .filter(|s| !s.is_empty())
        .collect()
}

/// First double-quoted passage.
pub fn first_quote(text: &str) -> Option<String> {
    QUOTED
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Split `text` into blocks, each starting at a line for which `is_start`
/// returns a value. Text before the first start is dropped.
pub fn split_blocks<'a, T>(
    text: &'a str,
    mut is_start: impl FnMut(&'a str) -> Option<T>,
) -> Vec<(T, Vec<&'a str>)> {
    let mut blocks: Vec<(T, Vec<&'a str>)> = Vec::new();
    for line in text.lines() {
        if let Some(head) = is_start(line) {
            blocks.push((head, vec![line]));
        } else if let Some((_, lines)) = blocks.last_mut() {
            lines.push(line);
        }
    }
    blocks
}

/// Rescale a score written as "N/M", "N out of M" or "N of M" onto 0–100.
/// A bare number is taken as already on 0–100.
pub fn parse_score(text: &str) -> Option<u32> {
    if let Some(c) = RATIO.captures(text) {
        let n: f64 = c.get(1)?.as_str().parse().ok()?;
        let m: f64 = c.get(2)?.as_str().parse().ok()?;
        return rescale(n, m);
    }
    let c = BARE_NUMBER.captures(text)?;
    let n: f64 = c.get(1)?.as_str().parse().ok()?;
    (n <= 100.0).then(|| n.round() as u32)
}

fn rescale(n: f64, max: f64) -> Option<u32> {
    if max <= 0.0 || n < 0.0 {
        return None;
    }
    Some(((n / max) * 100.0).round().clamp(0.0, 100.0) as u32)
}

/// Performance dimensions from bullets, `Label: N/M` lines or a markdown table.
pub fn dimension_scores(section: &str) -> Vec<DimensionScore> {
    let mut out = Vec::new();
    for line in section.lines() {
        let pair = TABLE_ROW
            .captures(line)
            .or_else(|| LABEL_VALUE.captures(line))
            .and_then(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())));
        let Some((label, value)) = pair else { continue };

        let metric = strip_markup(label);
        if metric.is_empty() || metric.starts_with('-') || metric.eq_ignore_ascii_case("metric") {
            continue;
        }
        if let Some(score) = parse_score(&strip_markup(value)) {
            out.push(DimensionScore { metric, score });
        }
    }
    out
}
