use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use ndris_common::NdrisResult;

use super::{
    filter_value, in_range, no_fields_to_update, normalize_district, optional, required,
    update_locked, DistrictRecord, Updated,
};

pub const EARLIEST_YEAR: i32 = 1900;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Disaster {
    pub id: Uuid,
    pub title: String,
    pub disaster_type: String,
    pub district: String,
    pub year: i32,
    pub impact_level: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDisaster {
    pub title: String,
    pub disaster_type: String,
    pub district: String,
    pub year: i32,
    pub impact_level: i32,
    pub description: Option<String>,
}

impl NewDisaster {
    pub fn validate(&self) -> NdrisResult<Self> {
        self.validate_as_of(Utc::now().year())
    }

    /// Validation against an explicit current year.
    pub fn validate_as_of(&self, current_year: i32) -> NdrisResult<Self> {
        Ok(Self {
            title: required("Title", &self.title)?,
            disaster_type: required("Disaster type", &self.disaster_type)?,
            district: normalize_district(&self.district)?,
            year: in_range("Year", self.year, EARLIEST_YEAR, current_year)?,
            impact_level: in_range("Impact level", self.impact_level, 1, 10)?,
            description: optional(self.description.as_deref()),
        })
    }
}

/// Partial edit. A supplied blank `description` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisasterUpdate {
    pub title: Option<String>,
    pub disaster_type: Option<String>,
    pub district: Option<String>,
    pub year: Option<i32>,
    pub impact_level: Option<i32>,
    pub description: Option<String>,
}

impl DisasterUpdate {
    pub fn validate(&self) -> NdrisResult<Self> {
        self.validate_as_of(Utc::now().year())
    }

    pub fn validate_as_of(&self, current_year: i32) -> NdrisResult<Self> {
        let changes = Self {
            title: self.title.as_deref().map(|t| required("Title", t)).transpose()?,
            disaster_type: self
                .disaster_type
                .as_deref()
                .map(|t| required("Disaster type", t))
                .transpose()?,
            district: self.district.as_deref().map(normalize_district).transpose()?,
            year: self
                .year
                .map(|y| in_range("Year", y, EARLIEST_YEAR, current_year))
                .transpose()?,
            impact_level: self
                .impact_level
                .map(|l| in_range("Impact level", l, 1, 10))
                .transpose()?,
            description: self.description.as_ref().map(|d| d.trim().to_string()),
        };
        if changes.title.is_none()
            && changes.disaster_type.is_none()
            && changes.district.is_none()
            && changes.year.is_none()
            && changes.impact_level.is_none()
            && changes.description.is_none()
        {
            return Err(no_fields_to_update());
        }
        Ok(changes)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisasterFilters {
    pub district: Option<String>,
    pub year: Option<i32>,
    pub disaster_type: Option<String>,
}

impl Disaster {
    pub async fn create(input: &NewDisaster, pool: &PgPool) -> NdrisResult<Self> {
        let input = input.validate()?;
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO disasters (title, disaster_type, district, year, impact_level, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&input.title)
        .bind(&input.disaster_type)
        .bind(&input.district)
        .bind(input.year)
        .bind(input.impact_level)
        .bind(&input.description)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> NdrisResult<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM disasters WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn list(filters: &DisasterFilters, pool: &PgPool) -> NdrisResult<Vec<Self>> {
        let mut qb = sqlx::QueryBuilder::new("SELECT * FROM disasters WHERE 1=1 ");

        if let Some(district) = filter_value(filters.district.as_deref()) {
            qb.push("AND district = ");
            qb.push_bind(district);
            qb.push(" ");
        }
        if let Some(year) = filters.year {
            qb.push("AND year = ");
            qb.push_bind(year);
            qb.push(" ");
        }
        if let Some(kind) = filter_value(filters.disaster_type.as_deref()) {
            qb.push("AND disaster_type = ");
            qb.push_bind(kind);
            qb.push(" ");
        }

        qb.push("ORDER BY year DESC, created_at DESC");

        qb.build_query_as::<Self>()
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    /// Apply a partial edit. Returns `None` when no disaster has this id.
    pub async fn update(
        id: Uuid,
        changes: &DisasterUpdate,
        pool: &PgPool,
    ) -> NdrisResult<Option<Updated<Self>>> {
        let changes = changes.validate()?;

        let mut qb = sqlx::QueryBuilder::new("UPDATE disasters SET ");
        {
            let mut set = qb.separated(", ");
            if let Some(title) = changes.title {
                set.push("title = ");
                set.push_bind_unseparated(title);
            }
            if let Some(kind) = changes.disaster_type {
                set.push("disaster_type = ");
                set.push_bind_unseparated(kind);
            }
            if let Some(district) = changes.district {
                set.push("district = ");
                set.push_bind_unseparated(district);
            }
            if let Some(year) = changes.year {
                set.push("year = ");
                set.push_bind_unseparated(year);
            }
            if let Some(impact_level) = changes.impact_level {
                set.push("impact_level = ");
                set.push_bind_unseparated(impact_level);
            }
            if let Some(description) = changes.description {
                set.push("description = ");
                set.push_bind_unseparated(optional(Some(description.as_str())));
            }
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(" RETURNING *");

        update_locked("disasters", id, qb, pool).await
    }

    pub async fn delete(id: Uuid, pool: &PgPool) -> NdrisResult<Option<Self>> {
        sqlx::query_as::<_, Self>("DELETE FROM disasters WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }
}

impl DistrictRecord for Disaster {
    fn district(&self) -> &str {
        &self.district
    }
}
