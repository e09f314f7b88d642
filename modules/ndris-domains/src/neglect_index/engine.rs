use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};

use ndris_common::{
    DistrictMetrics, DistrictSummary, NdrisResult, NeglectIndexRecord, NeglectLevel,
    RecomputeReport,
};

use super::store::{NeglectIndexStore, PgNeglectIndexStore};
use crate::aggregates::{DistrictAggregates, PgDistrictAggregates};

/// Derives, caches and categorizes the neglect score per district.
///
/// District names are taken as given; callers normalize them first.
#[derive(Clone)]
pub struct NeglectIndexEngine {
    aggregates: Arc<dyn DistrictAggregates>,
    store: Arc<dyn NeglectIndexStore>,
}

impl NeglectIndexEngine {
    pub fn new(aggregates: Arc<dyn DistrictAggregates>, store: Arc<dyn NeglectIndexStore>) -> Self {
        Self { aggregates, store }
    }

    /// Engine backed by the Postgres record tables and `neglect_index` table.
    pub fn postgres(pool: PgPool) -> Self {
        Self::new(
            Arc::new(PgDistrictAggregates::new(pool.clone())),
            Arc::new(PgNeglectIndexStore::new(pool)),
        )
    }

    /// Read the current aggregates and derive the score. Writes nothing.
    ///
    /// A district with no records yields all zeros.
    pub async fn compute_score(&self, district: &str) -> NdrisResult<DistrictMetrics> {
        let grievance_count = self.aggregates.count_grievances(district).await?;
        let disaster_count = self.aggregates.count_disasters(district).await?;
        let policy_score = self.aggregates.average_policy_score(district).await?;

        Ok(DistrictMetrics::compute(
            district,
            grievance_count,
            disaster_count,
            policy_score,
        ))
    }

    /// Recompute and replace the stored row for `district`.
    pub async fn upsert(&self, district: &str) -> NdrisResult<NeglectIndexRecord> {
        let metrics = self.compute_score(district).await?;
        let record = self.store.upsert(&metrics).await?;
        info!(
            district = %record.district,
            neglect_score = record.neglect_score,
            "Neglect index updated"
        );
        Ok(record)
    }

    /// Stored row if present (possibly stale), otherwise compute and store it.
    pub async fn get_or_compute(&self, district: &str) -> NdrisResult<NeglectIndexRecord> {
        match self.store.get(district).await? {
            Some(record) => Ok(record),
            None => self.upsert(district).await,
        }
    }

    /// Every stored row, highest neglect first.
    pub async fn get_all(&self) -> NdrisResult<Vec<NeglectIndexRecord>> {
        self.store.list_by_score().await
    }

    /// Upsert every district that appears in any record store.
    ///
    /// A district that fails is logged and listed in the report; the rest of
    /// the batch still runs. Failing to list districts aborts the call.
    pub async fn recompute_all(&self) -> NdrisResult<RecomputeReport> {
        let districts = self.aggregates.list_distinct_districts().await?;
        let mut report = RecomputeReport::default();

        for district in districts {
            match self.upsert(&district).await {
                Ok(_) => report.updated += 1,
                Err(e) => {
                    warn!(district = %district, error = %e, "Failed to recompute neglect index");
                    report.failed.push(district);
                }
            }
        }

        info!(
            updated = report.updated,
            failed = report.failed.len(),
            "Recalculated neglect indices"
        );
        Ok(report)
    }

    pub fn classify(score: f64) -> NeglectLevel {
        NeglectLevel::from_score(score)
    }

    /// `get_or_compute` plus level and color for display.
    pub async fn district_summary(&self, district: &str) -> NdrisResult<DistrictSummary> {
        self.get_or_compute(district).await.map(DistrictSummary::from)
    }
}
