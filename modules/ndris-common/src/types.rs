use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::score::{neglect_score, NeglectLevel};

/// Aggregate inputs for one district and the score derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictMetrics {
    pub district: String,
    pub grievance_count: i64,
    pub disaster_count: i64,
    pub policy_score: f64,
    pub neglect_score: f64,
}

impl DistrictMetrics {
    pub fn compute(
        district: impl Into<String>,
        grievance_count: i64,
        disaster_count: i64,
        policy_score: f64,
    ) -> Self {
        Self {
            district: district.into(),
            grievance_count,
            disaster_count,
            policy_score,
            neglect_score: neglect_score(grievance_count, disaster_count, policy_score),
        }
    }
}

/// Stored snapshot of a district's metrics. One row per district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NeglectIndexRecord {
    pub district: String,
    pub grievance_count: i64,
    pub disaster_count: i64,
    pub policy_score: f64,
    pub neglect_score: f64,
    pub last_updated: DateTime<Utc>,
}

impl NeglectIndexRecord {
    pub fn level(&self) -> NeglectLevel {
        NeglectLevel::from_score(self.neglect_score)
    }

    /// True when both records carry the same snapshot, ignoring `last_updated`.
    pub fn same_snapshot(&self, other: &Self) -> bool {
        self.district == other.district
            && self.grievance_count == other.grievance_count
            && self.disaster_count == other.disaster_count
            && self.policy_score == other.policy_score
            && self.neglect_score == other.neglect_score
    }
}

/// Stored record plus its presentation category, as shown on map click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictSummary {
    #[serde(flatten)]
    pub record: NeglectIndexRecord,
    pub neglect_level: NeglectLevel,
    pub color_code: String,
}

impl From<NeglectIndexRecord> for DistrictSummary {
    fn from(record: NeglectIndexRecord) -> Self {
        let level = record.level();
        Self {
            record,
            neglect_level: level,
            color_code: level.color().to_string(),
        }
    }
}

/// Outcome of recomputing every known district.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecomputeReport {
    /// Districts whose index row was written.
    pub updated: usize,
    /// Districts whose recompute failed, in processing order.
    pub failed: Vec<String>,
}
