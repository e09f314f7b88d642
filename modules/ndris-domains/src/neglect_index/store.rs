use async_trait::async_trait;
use sqlx::PgPool;

use ndris_common::{DistrictMetrics, NdrisResult, NeglectIndexRecord};

/// Keyed storage for index rows.
///
/// Implemented by [`PgNeglectIndexStore`] and `MockIndexStore` (tests).
#[async_trait]
pub trait NeglectIndexStore: Send + Sync {
    async fn get(&self, district: &str) -> NdrisResult<Option<NeglectIndexRecord>>;

    /// Insert or overwrite the row for `metrics.district` in one operation,
    /// stamping `last_updated`.
    async fn upsert(&self, metrics: &DistrictMetrics) -> NdrisResult<NeglectIndexRecord>;

    /// All rows, highest `neglect_score` first.
    async fn list_by_score(&self) -> NdrisResult<Vec<NeglectIndexRecord>>;
}

#[derive(Clone)]
pub struct PgNeglectIndexStore {
    pool: PgPool,
}

impl PgNeglectIndexStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NeglectIndexStore for PgNeglectIndexStore {
    async fn get(&self, district: &str) -> NdrisResult<Option<NeglectIndexRecord>> {
        sqlx::query_as::<_, NeglectIndexRecord>(
            "SELECT * FROM neglect_index WHERE district = $1",
        )
        .bind(district)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn upsert(&self, metrics: &DistrictMetrics) -> NdrisResult<NeglectIndexRecord> {
        sqlx::query_as::<_, NeglectIndexRecord>(
            r#"
            INSERT INTO neglect_index
                (district, grievance_count, disaster_count, policy_score, neglect_score, last_updated)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (district) DO UPDATE SET
                grievance_count = EXCLUDED.grievance_count,
                disaster_count = EXCLUDED.disaster_count,
                policy_score = EXCLUDED.policy_score,
                neglect_score = EXCLUDED.neglect_score,
                last_updated = NOW()
            RETURNING *
            "#,
        )
        .bind(&metrics.district)
        .bind(metrics.grievance_count)
        .bind(metrics.disaster_count)
        .bind(metrics.policy_score)
        .bind(metrics.neglect_score)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn list_by_score(&self) -> NdrisResult<Vec<NeglectIndexRecord>> {
        sqlx::query_as::<_, NeglectIndexRecord>(
            "SELECT * FROM neglect_index ORDER BY neglect_score DESC, district ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }
}
