//! Per-district read-only queries over the three record stores.

use async_trait::async_trait;
use sqlx::PgPool;

use ndris_common::NdrisResult;

/// The inputs the neglect index is derived from.
///
/// Implemented by [`PgDistrictAggregates`] and `MockAggregates` (tests).
#[async_trait]
pub trait DistrictAggregates: Send + Sync {
    async fn count_grievances(&self, district: &str) -> NdrisResult<i64>;

    async fn count_disasters(&self, district: &str) -> NdrisResult<i64>;

    /// Mean policy effectiveness, rounded to two decimals. Zero when the
    /// district has no policies.
    async fn average_policy_score(&self, district: &str) -> NdrisResult<f64>;

    /// Every district named by at least one grievance, disaster or policy,
    /// sorted ascending.
    async fn list_distinct_districts(&self) -> NdrisResult<Vec<String>>;
}

#[derive(Clone)]
pub struct PgDistrictAggregates {
    pool: PgPool,
}

impl PgDistrictAggregates {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DistrictAggregates for PgDistrictAggregates {
    async fn count_grievances(&self, district: &str) -> NdrisResult<i64> {
        let (count,) = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM grievances WHERE district = $1",
        )
        .bind(district)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_disasters(&self, district: &str) -> NdrisResult<i64> {
        let (count,) = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM disasters WHERE district = $1",
        )
        .bind(district)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn average_policy_score(&self, district: &str) -> NdrisResult<f64> {
        let (avg,) = sqlx::query_as::<_, (f64,)>(
            r#"
            SELECT COALESCE(ROUND(AVG(effectiveness_score)::numeric, 2), 0)::DOUBLE PRECISION
            FROM policies
            WHERE district = $1
            "#,
        )
        .bind(district)
        .fetch_one(&self.pool)
        .await?;
        Ok(avg)
    }

    async fn list_distinct_districts(&self) -> NdrisResult<Vec<String>> {
        let rows = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT district FROM grievances
            UNION
            SELECT district FROM disasters
            UNION
            SELECT district FROM policies
            ORDER BY district
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(d,)| d).collect())
    }
}
