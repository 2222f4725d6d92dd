use serde::{Deserialize, Serialize};

use crate::models::enums::{Category, Polarity, Severity, Strength};
use crate::taxonomy::{rating_for, PatternRating};

/// A macro pattern reported by an upstream analysis, with the micro
/// behaviors that support it. Nothing here is trusted until validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedPattern {
    pub macro_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macro_name: Option<String>,
    pub category: Category,
    pub polarity: Polarity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<Strength>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub macro_summary: String,
    #[serde(default)]
    pub detected_micros: Vec<DetectedMicro>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why_it_worked: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub how_to_reuse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
    /// Counter suggested upstream for a negative pattern. Carried as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_pattern_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_pattern_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedMicro {
    pub micro_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub micro_name: Option<String>,
    /// Expected in [0, 1]; out-of-range values are clamped when rated.
    pub confidence: f32,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

/// A supporting quote. Upstream payloads send either a bare string or an
/// object with an optional call timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Evidence {
    Quote(String),
    Timed {
        quote: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },
}

impl Evidence {
    pub fn quote(&self) -> &str {
        match self {
            Self::Quote(q) | Self::Timed { quote: q, .. } => q,
        }
    }

    pub fn timestamp(&self) -> Option<&str> {
        match self {
            Self::Timed { timestamp, .. } => timestamp.as_deref(),
            Self::Quote(_) => None,
        }
    }
}

impl DetectedPattern {
    /// Highest micro confidence, or `None` when no micros were reported.
    pub fn peak_confidence(&self) -> Option<f32> {
        self.detected_micros
            .iter()
            .map(|m| m.confidence)
            .filter(|c| !c.is_nan())
            .reduce(f32::max)
    }

    /// Strength or severity implied by the strongest micro.
    pub fn rating(&self) -> Option<PatternRating> {
        self.peak_confidence().map(|c| rating_for(self.polarity, c))
    }
}
