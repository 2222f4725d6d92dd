use serde::{Deserialize, Serialize};

use super::enums::{Polarity, ProbeTier, ReportVariant, Severity, Strength, TrustDelta};

/// Typed result of one extraction call.
///
/// One variant per known layout. Every field inside a variant is optional
/// on its own: `None` or an empty list means the text did not contain it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum Report {
    CallLabLite(LiteReport),
    CallLabPro(ProReport),
    DiscoveryLab(DiscoveryReport),
    DiscoveryLabPro(DiscoveryProReport),
}

impl Report {
    pub fn variant(&self) -> ReportVariant {
        match self {
            Self::CallLabLite(_) => ReportVariant::CallLabLite,
            Self::CallLabPro(_) => ReportVariant::CallLabPro,
            Self::DiscoveryLab(_) => ReportVariant::DiscoveryLab,
            Self::DiscoveryLabPro(_) => ReportVariant::DiscoveryLabPro,
        }
    }

    /// All pattern cards carried by the report, positives first.
    pub fn pattern_cards(&self) -> Vec<&PatternCard> {
        match self {
            Self::CallLabLite(r) => r.what_worked.iter().chain(&r.what_to_watch).collect(),
            Self::CallLabPro(r) => r.strengths.iter().chain(&r.frictions).collect(),
            Self::DiscoveryLab(_) | Self::DiscoveryLabPro(_) => Vec::new(),
        }
    }
}

// ──────────────────────────────────────────────
// Shared pieces
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallMetadata {
    pub call_name: Option<String>,
    pub duration: Option<String>,
    pub effectiveness: Option<String>,
}

/// A performance dimension rescaled onto 0–100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub metric: String,
    pub score: u32,
}

/// One detected pattern as written in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternCard {
    pub name: String,
    /// Category tag exactly as written (not checked against the taxonomy).
    pub category: Option<String>,
    pub how_it_appeared: Option<String>,
    pub why_it_mattered: Option<String>,
    pub evidence: Option<String>,
    pub detail: CardDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "polarity", rename_all = "snake_case")]
pub enum CardDetail {
    Positive {
        strength: Option<Strength>,
        replication_tip: Option<String>,
    },
    Negative {
        severity: Option<Severity>,
        fix: Option<String>,
        counter: Option<CounterReference>,
    },
}

impl PatternCard {
    pub fn polarity(&self) -> Polarity {
        match self.detail {
            CardDetail::Positive { .. } => Polarity::Positive,
            CardDetail::Negative { .. } => Polarity::Negative,
        }
    }

    pub fn strength(&self) -> Option<Strength> {
        match &self.detail {
            CardDetail::Positive { strength, .. } => *strength,
            CardDetail::Negative { .. } => None,
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        match &self.detail {
            CardDetail::Negative { severity, .. } => *severity,
            CardDetail::Positive { .. } => None,
        }
    }

    pub fn fix(&self) -> Option<&str> {
        match &self.detail {
            CardDetail::Negative { fix, .. } => fix.as_deref(),
            CardDetail::Positive { .. } => None,
        }
    }

    pub fn replication_tip(&self) -> Option<&str> {
        match &self.detail {
            CardDetail::Positive { replication_tip, .. } => replication_tip.as_deref(),
            CardDetail::Negative { .. } => None,
        }
    }

    pub fn counter(&self) -> Option<&CounterReference> {
        match &self.detail {
            CardDetail::Negative { counter, .. } => counter.as_ref(),
            CardDetail::Positive { .. } => None,
        }
    }
}

/// Counter-pattern back-reference captured from free text. Unvalidated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterReference {
    pub name: String,
    pub rationale: Option<String>,
}

// ──────────────────────────────────────────────
// Call Lab Lite
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiteReport {
    pub metadata: CallMetadata,
    pub score: Option<u32>,
    pub snap_take: Option<String>,
    /// First quote that stands at the end of its line or before a dash.
    pub pull_quote: Option<String>,
    pub what_worked: Vec<PatternCard>,
    pub what_to_watch: Vec<PatternCard>,
    pub why_it_worked: Option<String>,
    pub buying_signals: Vec<String>,
    pub warning_signals: Vec<String>,
    /// Signals listed without a buying/warning split.
    pub signals: Vec<String>,
    pub level_up: Option<LevelUpMove>,
    pub bottom_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelUpMove {
    pub action: Option<String>,
    pub example: Option<String>,
}

// ──────────────────────────────────────────────
// Call Lab Pro
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProReport {
    pub metadata: CallMetadata,
    /// Overall score on 0–100.
    pub overall_score: Option<u32>,
    pub profile: Option<String>,
    pub snap_take: Option<String>,
    pub dimensions: Vec<DimensionScore>,
    pub strengths: Vec<PatternCard>,
    pub frictions: Vec<PatternCard>,
    pub timeline: Vec<TrustBeat>,
    pub rewrites: Vec<TacticalRewrite>,
    pub blueprint: Vec<String>,
    pub follow_up: Option<FollowUpEmail>,
    pub closing_insight: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustBeat {
    pub timestamp: Option<String>,
    pub event: String,
    pub delta: Option<TrustDelta>,
    pub analysis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TacticalRewrite {
    pub moment: Option<String>,
    pub what_you_said: Option<String>,
    pub why_it_missed: Option<String>,
    pub stronger_alternative: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpEmail {
    pub subject: Option<String>,
    pub body: Option<String>,
}

// ──────────────────────────────────────────────
// Discovery Lab
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetProfile {
    pub service: Option<String>,
    pub company: Option<String>,
    pub website: Option<String>,
    pub contact: Option<String>,
    pub contact_title: Option<String>,
    pub recent_signals: Option<String>,
    pub authority_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    pub tier: ProbeTier,
    pub question: String,
    pub follow_up: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hook {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    pub why: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowStep {
    pub title: String,
    pub script: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub target: TargetProfile,
    pub probes: Vec<Probe>,
    pub hooks: Vec<Hook>,
    pub competitors: Vec<Competitor>,
    pub emotional_probe: Option<String>,
    pub flow: Vec<FlowStep>,
    pub call_objective: Option<String>,
}

// ──────────────────────────────────────────────
// Discovery Lab Pro
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub title: String,
    pub what: Option<String>,
    pub why: Option<String>,
    pub action: Option<String>,
    pub confidence: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProspectPsychology {
    pub success_metrics: Option<String>,
    pub fears: Option<String>,
    pub need_to_hear: Option<String>,
    pub says_yes_when: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorPosition {
    pub name: String,
    pub strength: Option<String>,
    pub weakness: Option<String>,
    pub positioning: Option<String>,
    pub question: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionBranch {
    pub condition: String,
    pub guidance: Option<String>,
    pub script: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledScript {
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectionHandle {
    pub objection: String,
    pub handle: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallObjectives {
    pub primary: Option<String>,
    pub success_looks_like: Option<String>,
    pub minimum_viable_outcome: Option<String>,
    pub red_flags: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenQuestions {
    pub gaps: Vec<String>,
    pub assumptions: Vec<String>,
    pub red_flags_to_watch: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostCallAction {
    pub timing: String,
    pub action: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryProReport {
    pub findings: Vec<Finding>,
    pub executive_summary: Option<String>,
    pub target: TargetProfile,
    pub psychology: ProspectPsychology,
    pub primary_probes: Vec<Probe>,
    pub secondary_probes: Vec<Probe>,
    pub hooks: Vec<Hook>,
    pub competitors: Vec<CompetitorPosition>,
    pub emotional_probe: Option<String>,
    pub flow: Vec<FlowStep>,
    pub decision_tree: Vec<DecisionBranch>,
    pub search_intel: Vec<LabeledScript>,
    pub opening: Vec<LabeledScript>,
    pub objections: Vec<ObjectionHandle>,
    pub objectives: CallObjectives,
    pub unknowns: OpenQuestions,
    pub actions: Vec<PostCallAction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn negative_card() -> PatternCard {
        PatternCard {
            name: "The Soft Close Fade".into(),
            category: Some("Activation".into()),
            how_it_appeared: None,
            why_it_mattered: None,
            evidence: Some("Let's touch base next month.".into()),
            detail: CardDetail::Negative {
                severity: Some(Severity::High),
                fix: Some("Book the next step before hanging up.".into()),
                counter: Some(CounterReference {
                    name: "The Mirror Close".into(),
                    rationale: None,
                }),
            },
        }
    }

    #[test]
    fn card_accessors_follow_polarity() {
        let card = negative_card();
        assert_eq!(card.polarity(), Polarity::Negative);
        assert_eq!(card.severity(), Some(Severity::High));
        assert_eq!(card.strength(), None);
        assert_eq!(card.counter().unwrap().name, "The Mirror Close");
        assert_eq!(card.fix(), Some("Book the next step before hanging up."));
        assert_eq!(card.replication_tip(), None);
    }

    #[test]
    fn report_serializes_with_variant_tag() {
        let report = Report::CallLabPro(ProReport {
            frictions: vec![negative_card()],
            ..Default::default()
        });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["variant"], "call_lab_pro");
        assert_eq!(json["frictions"][0]["detail"]["polarity"], "negative");
        assert_eq!(json["frictions"][0]["detail"]["severity"], "HIGH");

        let back: Report = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn pattern_cards_lists_positives_first() {
        let mut positive = negative_card();
        positive.name = "The Mirror Close".into();
        positive.detail = CardDetail::Positive {
            strength: Some(Strength::Strong),
            replication_tip: None,
        };
        let report = Report::CallLabPro(ProReport {
            strengths: vec![positive],
            frictions: vec![negative_card()],
            ..Default::default()
        });
        let names: Vec<_> = report.pattern_cards().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["The Mirror Close", "The Soft Close Fade"]);
        assert_eq!(report.variant(), ReportVariant::CallLabPro);
    }
}
