use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a label read from text or a table does not name a known variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Parsing is case-insensitive and ignores surrounding whitespace.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($s) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(InvalidEnum {
                    field: stringify!($name).into(),
                    value: s.into(),
                })
            }
        }
    };
}

str_enum!(
    /// Behavioral area a macro pattern belongs to.
    Category {
        Connection => "connection",
        Diagnosis => "diagnosis",
        Control => "control",
        Activation => "activation",
    }
);

str_enum!(
    /// Whether a pattern helps (positive) or hurts (negative) the coached outcome.
    Polarity {
        Positive => "positive",
        Negative => "negative",
    }
);

str_enum!(
    /// Qualitative label for a positive pattern: something to replicate.
    Strength {
        Strong => "STRONG",
        Medium => "MEDIUM",
        Developing => "DEVELOPING",
    }
);

str_enum!(
    /// Qualitative label for a negative pattern: something to fix.
    Severity {
        High => "HIGH",
        Medium => "MEDIUM",
        Low => "LOW",
    }
);

str_enum!(
    /// Known narrative layouts produced upstream.
    ReportVariant {
        CallLabLite => "call_lab_lite",
        CallLabPro => "call_lab_pro",
        DiscoveryLab => "discovery_lab",
        DiscoveryLabPro => "discovery_lab_pro",
    }
);

str_enum!(
    ProbeTier {
        Primary => "PRIMARY",
        Secondary => "SECONDARY",
    }
);

str_enum!(
    /// Direction of a trust/momentum beat on the timeline.
    TrustDelta {
        Up => "+",
        Down => "-",
        Mixed => "±",
    }
);

impl Strength {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Strong => "⚡",
            Self::Medium => "◆",
            Self::Developing => "◇",
        }
    }
}

impl Severity {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::High => "⚠️",
            Self::Medium => "⚠︎",
            Self::Low => "⚐",
        }
    }
}

impl ReportVariant {
    /// Human-readable product name of the layout.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CallLabLite => "Call Lab Lite",
            Self::CallLabPro => "Call Lab Pro",
            Self::DiscoveryLab => "Discovery Lab",
            Self::DiscoveryLabPro => "Discovery Lab Pro",
        }
    }
}

impl TrustDelta {
    /// Read a delta marker as written in a trust map ("+", "-", "±", "+/-", or words).
    pub fn from_marker(marker: &str) -> Option<Self> {
        let m = marker.trim().trim_matches(|c| c == '*' || c == '(' || c == ')');
        match m.to_ascii_lowercase().as_str() {
            "+" | "up" | "positive" => Some(Self::Up),
            "-" | "–" | "−" | "down" | "negative" => Some(Self::Down),
            "±" | "+/-" | "+-" | "mixed" | "neutral" => Some(Self::Mixed),
            _ => None,
        }
    }
}
