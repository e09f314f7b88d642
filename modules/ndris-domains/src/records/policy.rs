use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use ndris_common::NdrisResult;

use super::{
    filter_value, in_range, no_fields_to_update, normalize_district, optional, required,
    update_locked, DistrictRecord, Updated,
};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Policy {
    pub id: Uuid,
    pub policy_name: String,
    pub sector: String,
    pub district: String,
    pub effectiveness_score: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPolicy {
    pub policy_name: String,
    pub sector: String,
    pub district: String,
    pub effectiveness_score: i32,
    pub notes: Option<String>,
}

impl NewPolicy {
    pub fn validate(&self) -> NdrisResult<Self> {
        Ok(Self {
            policy_name: required("Policy name", &self.policy_name)?,
            sector: required("Sector", &self.sector)?,
            district: normalize_district(&self.district)?,
            effectiveness_score: in_range(
                "Effectiveness score",
                self.effectiveness_score,
                1,
                10,
            )?,
            notes: optional(self.notes.as_deref()),
        })
    }
}

/// Partial edit. A supplied blank `notes` clears them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyUpdate {
    pub policy_name: Option<String>,
    pub sector: Option<String>,
    pub district: Option<String>,
    pub effectiveness_score: Option<i32>,
    pub notes: Option<String>,
}

impl PolicyUpdate {
    pub fn validate(&self) -> NdrisResult<Self> {
        let changes = Self {
            policy_name: self
                .policy_name
                .as_deref()
                .map(|n| required("Policy name", n))
                .transpose()?,
            sector: self.sector.as_deref().map(|s| required("Sector", s)).transpose()?,
            district: self.district.as_deref().map(normalize_district).transpose()?,
            effectiveness_score: self
                .effectiveness_score
                .map(|s| in_range("Effectiveness score", s, 1, 10))
                .transpose()?,
            notes: self.notes.as_ref().map(|n| n.trim().to_string()),
        };
        if changes.policy_name.is_none()
            && changes.sector.is_none()
            && changes.district.is_none()
            && changes.effectiveness_score.is_none()
            && changes.notes.is_none()
        {
            return Err(no_fields_to_update());
        }
        Ok(changes)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyFilters {
    pub district: Option<String>,
    pub sector: Option<String>,
}

/// Policy count and mean effectiveness for one sector.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SectorStats {
    pub sector: String,
    pub count: i64,
    pub avg_score: f64,
}

impl Policy {
    pub async fn create(input: &NewPolicy, pool: &PgPool) -> NdrisResult<Self> {
        let input = input.validate()?;
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO policies (policy_name, sector, district, effectiveness_score, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&input.policy_name)
        .bind(&input.sector)
        .bind(&input.district)
        .bind(input.effectiveness_score)
        .bind(&input.notes)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> NdrisResult<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM policies WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn list(filters: &PolicyFilters, pool: &PgPool) -> NdrisResult<Vec<Self>> {
        let mut qb = sqlx::QueryBuilder::new("SELECT * FROM policies WHERE 1=1 ");

        if let Some(district) = filter_value(filters.district.as_deref()) {
            qb.push("AND district = ");
            qb.push_bind(district);
            qb.push(" ");
        }
        if let Some(sector) = filter_value(filters.sector.as_deref()) {
            qb.push("AND sector = ");
            qb.push_bind(sector);
            qb.push(" ");
        }

        qb.push("ORDER BY created_at DESC");

        qb.build_query_as::<Self>()
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    /// Apply a partial edit. Returns `None` when no policy has this id.
    pub async fn update(
        id: Uuid,
        changes: &PolicyUpdate,
        pool: &PgPool,
    ) -> NdrisResult<Option<Updated<Self>>> {
        let changes = changes.validate()?;

        let mut qb = sqlx::QueryBuilder::new("UPDATE policies SET ");
        {
            let mut set = qb.separated(", ");
            if let Some(name) = changes.policy_name {
                set.push("policy_name = ");
                set.push_bind_unseparated(name);
            }
            if let Some(sector) = changes.sector {
                set.push("sector = ");
                set.push_bind_unseparated(sector);
            }
            if let Some(district) = changes.district {
                set.push("district = ");
                set.push_bind_unseparated(district);
            }
            if let Some(score) = changes.effectiveness_score {
                set.push("effectiveness_score = ");
                set.push_bind_unseparated(score);
            }
            if let Some(notes) = changes.notes {
                set.push("notes = ");
                set.push_bind_unseparated(optional(Some(notes.as_str())));
            }
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(" RETURNING *");

        update_locked("policies", id, qb, pool).await
    }

    pub async fn delete(id: Uuid, pool: &PgPool) -> NdrisResult<Option<Self>> {
        sqlx::query_as::<_, Self>("DELETE FROM policies WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn sector_stats(pool: &PgPool) -> NdrisResult<Vec<SectorStats>> {
        sqlx::query_as::<_, SectorStats>(
            r#"
            SELECT sector,
                   COUNT(*) AS count,
                   ROUND(AVG(effectiveness_score)::numeric, 2)::DOUBLE PRECISION AS avg_score
            FROM policies
            GROUP BY sector
            ORDER BY count DESC, sector ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}

impl DistrictRecord for Policy {
    fn district(&self) -> &str {
        &self.district
    }
}
