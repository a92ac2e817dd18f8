use serde::{Deserialize, Serialize};

/// How a computed score of exactly 0.0 is treated at the PO and all-PO levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroScorePolicy {
    /// A 0.0 score is dropped exactly like missing data.
    #[default]
    SkipZero,
    /// Only missing data is dropped; a measured 0.0 counts toward the average.
    IncludeMeasured,
}

impl ZeroScorePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "skip" | "skip_zero" | "compat" => Some(Self::SkipZero),
            "include" | "include_measured" | "strict" => Some(Self::IncludeMeasured),
            _ => None,
        }
    }

    /// Filter a measurement (`None` means no data) down to what may enter a weighted sum.
    pub fn admit(self, measured: Option<f64>) -> Option<f64> {
        match self {
            Self::SkipZero => measured.filter(|score| *score > 0.0),
            Self::IncludeMeasured => measured,
        }
    }
}

/// Strategy for combining per-course PO scores into one overall PO score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStrategy {
    /// Each course score is weighted by the course credit.
    #[default]
    CreditWeighted,
    /// Arithmetic mean of the course scores.
    SimpleAverage,
}

impl AggregationStrategy {
    pub const fn from_use_credits(use_credits: bool) -> Self {
        if use_credits {
            Self::CreditWeighted
        } else {
            Self::SimpleAverage
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "credits" | "credit" | "credit_weighted" => Some(Self::CreditWeighted),
            "average" | "mean" | "simple" | "simple_average" => Some(Self::SimpleAverage),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::CreditWeighted => "credit_weighted",
            Self::SimpleAverage => "simple_average",
        }
    }
}

/// Knobs applied by the scoring engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoringConfig {
    pub zero_policy: ZeroScorePolicy,
    /// Used by the all-PO operation when a caller does not pick a strategy.
    pub strategy: AggregationStrategy,
}
