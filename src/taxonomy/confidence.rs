use serde::{Deserialize, Serialize};

use crate::models::enums::{Polarity, Severity, Strength};

/// Cut points shared by the strength and severity scales.
/// Both bounds are inclusive on the upper side.
pub mod confidence_thresholds {
    /// At or above this: STRONG / HIGH.
    pub const TOP: f32 = 0.80;

    /// At or above this: MEDIUM.
    pub const MIDDLE: f32 = 0.70;
}

/// Qualitative label for a detected pattern. Which scale applies depends on
/// the polarity of the owning macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scale", content = "label", rename_all = "snake_case")]
pub enum PatternRating {
    Strength(Strength),
    Severity(Severity),
}

impl PatternRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strength(s) => s.as_str(),
            Self::Severity(s) => s.as_str(),
        }
    }
}

/// Position of a confidence value on the three-step scale (0 = top).
fn tier(confidence: f32) -> u8 {
    // NaN compares false everywhere and falls through to the bottom tier.
    let c = confidence.clamp(0.0, 1.0);
    if c >= confidence_thresholds::TOP {
        0
    } else if c >= confidence_thresholds::MIDDLE {
        1
    } else {
        2
    }
}

pub fn strength_from_confidence(confidence: f32) -> Strength {
    match tier(confidence) {
        0 => Strength::Strong,
        1 => Strength::Medium,
        _ => Strength::Developing,
    }
}

pub fn severity_from_confidence(confidence: f32) -> Severity {
    match tier(confidence) {
        0 => Severity::High,
        1 => Severity::Medium,
        _ => Severity::Low,
    }
}

/// Translate a micro confidence into the label vocabulary of its macro's polarity.
pub fn rating_for(polarity: Polarity, confidence: f32) -> PatternRating {
    match polarity {
        Polarity::Positive => PatternRating::Strength(strength_from_confidence(confidence)),
        Polarity::Negative => PatternRating::Severity(severity_from_confidence(confidence)),
    }
}
