use super::grammar::{grammar_for, DISCOVERY_GRAMMAR, DISCOVERY_PRO_GRAMMAR};
use super::ExtractionError;
use crate::models::enums::ReportVariant;

/// Count how many of a grammar's cue phrases occur in the text.
fn cue_hits(text: &str, cues: &[&str]) -> usize {
    cues.iter().filter(|cue| text.contains(*cue)).count()
}

/// Cue score per layout. Discovery Lab Pro only scores when the base
/// Discovery Lab cues are present too, and then carries both counts.
pub fn variant_scores(text: &str) -> Vec<(ReportVariant, usize)> {
    let discovery = cue_hits(text, DISCOVERY_GRAMMAR.cues);
    let discovery_pro = cue_hits(text, DISCOVERY_PRO_GRAMMAR.cues);

    ReportVariant::ALL
        .iter()
        .map(|&variant| {
            let score = match variant {
                ReportVariant::DiscoveryLab => discovery,
                ReportVariant::DiscoveryLabPro if discovery > 0 && discovery_pro > 0 => {
                    discovery + discovery_pro
                }
                ReportVariant::DiscoveryLabPro => 0,
                other => cue_hits(text, grammar_for(other).cues),
            };
            (variant, score)
        })
        .collect()
}

/// Pick the layout with the most cue hits. A tie at the top is ambiguous.
pub fn detect_variant(text: &str) -> Result<ReportVariant, ExtractionError> {
    let scores = variant_scores(text);
    let best = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
    if best == 0 {
        return Err(ExtractionError::UnrecognizedVariant);
    }

    let leaders: Vec<ReportVariant> = scores
        .iter()
        .filter(|(_, s)| *s == best)
        .map(|(v, _)| *v)
        .collect();

    match leaders.as_slice() {
        [only] => Ok(*only),
        _ => {
            tracing::warn!(candidates = ?leaders, hits = best, "Ambiguous report layout");
            Err(ExtractionError::AmbiguousVariant { candidates: leaders })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_lite() {
        let text = "## CALL LAB LITE — DIAGNOSTIC SNAPSHOT\n## WHAT TO WATCH\n## ONE MOVE TO LEVEL UP";
        assert_eq!(detect_variant(text).unwrap(), ReportVariant::CallLabLite);
    }

    #[test]
    fn detects_pro() {
        let text = "# CALL LAB PRO -- FULL DIAGNOSTIC\n## PERFORMANCE SCORES\n## TRUST MAP";
        assert_eq!(detect_variant(text).unwrap(), ReportVariant::CallLabPro);
    }

    #[test]
    fn detects_discovery_lab() {
        let text = "🎯 Authority Snapshot\n🔍 Pain / Impact Probes\n⚡ Quick Discovery Flow";
        assert_eq!(detect_variant(text).unwrap(), ReportVariant::DiscoveryLab);
    }

    #[test]
    fn pro_cues_need_base_discovery_cues() {
        let with_base = "Discovery Lab Pro\n🎯 Authority Snapshot\n🧠 Prospect Psychology";
        assert_eq!(detect_variant(with_base).unwrap(), ReportVariant::DiscoveryLabPro);

        let scores = variant_scores("Executive Summary only");
        let dlp = scores
            .iter()
            .find(|(v, _)| *v == ReportVariant::DiscoveryLabPro)
            .unwrap();
        assert_eq!(dlp.1, 0);
    }

    #[test]
    fn unknown_text_is_unrecognized() {
        assert_eq!(
            detect_variant("meeting notes: nothing here"),
            Err(ExtractionError::UnrecognizedVariant)
        );
    }

    #[test]
    fn tie_is_ambiguous() {
        let text = "CALL LAB LITE\nCALL LAB PRO";
        match detect_variant(text) {
            Err(ExtractionError::AmbiguousVariant { candidates }) => {
                assert_eq!(
                    candidates,
                    vec![ReportVariant::CallLabLite, ReportVariant::CallLabPro]
                );
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }
}
