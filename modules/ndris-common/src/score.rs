use std::fmt;

use serde::{Deserialize, Serialize};

/// Weight applied to the grievance count.
pub const GRIEVANCE_WEIGHT: f64 = 0.4;
/// Weight applied to the disaster count.
pub const DISASTER_WEIGHT: f64 = 0.3;
/// Weight subtracted per point of average policy effectiveness.
pub const POLICY_WEIGHT: f64 = 0.3;

/// Scores below this are `low`.
pub const MEDIUM_THRESHOLD: f64 = 5.0;
/// Scores at or above this are `high`.
pub const HIGH_THRESHOLD: f64 = 10.0;

/// Round to two decimal places, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Neglect score for a district's aggregate inputs.
///
/// Grievances and disasters raise the score, policy effectiveness lowers it.
/// The result is floored at zero and rounded to two decimals.
pub fn neglect_score(grievance_count: i64, disaster_count: i64, policy_score: f64) -> f64 {
    let raw = grievance_count as f64 * GRIEVANCE_WEIGHT + disaster_count as f64 * DISASTER_WEIGHT
        - policy_score * POLICY_WEIGHT;
    let score = round2(raw);
    // Also maps -0.0 to 0.0
    if score > 0.0 {
        score
    } else {
        0.0
    }
}

/// Presentation category for a neglect score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeglectLevel {
    Low,
    Medium,
    High,
}

impl NeglectLevel {
    pub fn from_score(score: f64) -> Self {
        if score < MEDIUM_THRESHOLD {
            Self::Low
        } else if score < HIGH_THRESHOLD {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Hex color used on the map and in dashboard badges.
    pub fn color(self) -> &'static str {
        match self {
            Self::Low => "#4CAF50",
            Self::Medium => "#FFC107",
            Self::High => "#F44336",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for NeglectLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
