use serde::{Deserialize, Serialize};

const EXCEEDED_THRESHOLD: f64 = 85.0;
const ACHIEVED_THRESHOLD: f64 = 70.0;
const PARTIALLY_THRESHOLD: f64 = 50.0;

/// Achievement band for an outcome percentage. Thresholds are shared by every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AchievementLevel {
    NotAchieved,
    Partially,
    Achieved,
    Exceeded,
}

impl AchievementLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= EXCEEDED_THRESHOLD {
            Self::Exceeded
        } else if score >= ACHIEVED_THRESHOLD {
            Self::Achieved
        } else if score >= PARTIALLY_THRESHOLD {
            Self::Partially
        } else {
            Self::NotAchieved
        }
    }

    pub const fn ordered() -> [Self; 4] {
        [
            Self::NotAchieved,
            Self::Partially,
            Self::Achieved,
            Self::Exceeded,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NotAchieved => "Not Achieved",
            Self::Partially => "Partially Achieved",
            Self::Achieved => "Achieved",
            Self::Exceeded => "Exceeded",
        }
    }
}
