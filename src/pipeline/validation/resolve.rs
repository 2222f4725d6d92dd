//! Links pattern cards read from report prose to the taxonomy.
//!
//! Extraction never consults the registry, so a card may name a pattern the
//! taxonomy does not know. This step reports that instead of failing.

use serde::Serialize;

use crate::models::enums::Polarity;
use crate::models::report::{CounterReference, PatternCard};
use crate::taxonomy::{MacroPattern, PatternLibrary};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCard<'a> {
    pub card: &'a PatternCard,
    /// Id derived from the card name.
    pub macro_id: String,
    pub known: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<&'a MacroPattern>,
    /// Registry counter for a negative card whose macro is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter: Option<ResolvedCounter<'a>>,
    /// Counter named in the report text, unvalidated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stated_counter: Option<&'a CounterReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCounter<'a> {
    pub pattern: &'a MacroPattern,
    pub rationale: &'a str,
}

impl ResolvedCard<'_> {
    /// True when the report names a counter other than the registry's.
    pub fn counter_disagrees(&self) -> bool {
        match (&self.counter, self.stated_counter) {
            (Some(c), Some(stated)) => macro_slug(&stated.name) != c.pattern.id,
            _ => false,
        }
    }
}

/// "The Soft Close Fade" → `soft_close_fade`. Runs of anything other than
/// ASCII letters and digits collapse to one underscore.
pub fn macro_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_');
    slug.strip_prefix("the_").unwrap_or(slug).to_string()
}

pub fn resolve_pattern_cards<'a>(
    cards: &[&'a PatternCard],
    library: &'a PatternLibrary,
) -> Vec<ResolvedCard<'a>> {
    let resolved: Vec<ResolvedCard<'a>> = cards
        .iter()
        .map(|&card| resolve_card(card, library))
        .collect();

    let unknown = resolved.iter().filter(|r| !r.known).count();
    if unknown > 0 {
        tracing::warn!(
            card_count = resolved.len(),
            unknown_count = unknown,
            "Pattern cards name macros outside the taxonomy"
        );
    }
    resolved
}

fn resolve_card<'a>(card: &'a PatternCard, library: &'a PatternLibrary) -> ResolvedCard<'a> {
    let macro_id = macro_slug(&card.name);
    let pattern = library.get_macro(&macro_id);
    let counter = match card.polarity() {
        Polarity::Negative => library
            .get_counter_pattern(&macro_id)
            .map(|c| ResolvedCounter {
                pattern: c.counter,
                rationale: c.rationale,
            }),
        Polarity::Positive => None,
    };

    ResolvedCard {
        card,
        known: pattern.is_some(),
        pattern,
        counter,
        stated_counter: card.counter(),
        macro_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::CardDetail;

    fn card(name: &str, detail: CardDetail) -> PatternCard {
        PatternCard {
            name: name.into(),
            category: None,
            how_it_appeared: None,
            why_it_mattered: None,
            evidence: None,
            detail,
        }
    }

    fn negative(name: &str, stated: Option<&str>) -> PatternCard {
        card(
            name,
            CardDetail::Negative {
                severity: None,
                fix: None,
                counter: stated.map(|n| CounterReference {
                    name: n.into(),
                    rationale: None,
                }),
            },
        )
    }

    #[test]
    fn slug_rules() {
        assert_eq!(macro_slug("The Soft Close Fade"), "soft_close_fade");
        assert_eq!(macro_slug("The Over-Explain Loop"), "over_explain_loop");
        assert_eq!(macro_slug("  Mirror Close!! "), "mirror_close");
        assert_eq!(macro_slug("Theory Crafting"), "theory_crafting");
    }

    #[test]
    fn negative_card_gets_registry_counter() {
        let lib = PatternLibrary::bundled().unwrap();
        let fade = negative("The Soft Close Fade", Some("The Mirror Close"));
        let resolved = resolve_pattern_cards(&[&fade], &lib);

        assert_eq!(resolved.len(), 1);
        let r = &resolved[0];
        assert!(r.known);
        assert_eq!(r.macro_id, "soft_close_fade");
        assert_eq!(r.counter.as_ref().map(|c| c.pattern.id.as_str()), Some("mirror_close"));
        assert_eq!(r.stated_counter.map(|c| c.name.as_str()), Some("The Mirror Close"));
        assert!(!r.counter_disagrees());
    }

    #[test]
    fn stated_counter_mismatch_flagged() {
        let lib = PatternLibrary::bundled().unwrap();
        let fade = negative("The Soft Close Fade", Some("The Cultural Handshake"));
        let resolved = resolve_pattern_cards(&[&fade], &lib);
        assert!(resolved[0].counter_disagrees());
    }

    #[test]
    fn unknown_name_is_reported_not_rejected() {
        let lib = PatternLibrary::bundled().unwrap();
        let invented = card(
            "The Velvet Hammer",
            CardDetail::Positive {
                strength: None,
                replication_tip: None,
            },
        );
        let resolved = resolve_pattern_cards(&[&invented], &lib);
        assert!(!resolved[0].known);
        assert!(resolved[0].pattern.is_none());
        assert!(resolved[0].counter.is_none());
    }

    #[test]
    fn positive_cards_have_no_counter() {
        let lib = PatternLibrary::bundled().unwrap();
        let handshake = card(
            "The Cultural Handshake",
            CardDetail::Positive {
                strength: None,
                replication_tip: None,
            },
        );
        let resolved = resolve_pattern_cards(&[&handshake], &lib);
        assert!(resolved[0].known);
        assert!(resolved[0].counter.is_none());
    }

    #[test]
    fn numbered_card_names_resolve() {
        use crate::pipeline::extraction::cards::extract_cards;

        let lib = PatternLibrary::bundled().unwrap();
        let cards = extract_cards("**1. THE DIAGNOSTIC REVEAL**\nStrength: STRONG", Polarity::Positive);
        let refs: Vec<&PatternCard> = cards.iter().collect();
        let resolved = resolve_pattern_cards(&refs, &lib);
        assert!(resolved[0].known);
        assert_eq!(resolved[0].macro_id, "diagnostic_reveal");
    }
}
