use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use ndris_common::{NdrisError, NdrisResult};

use super::{
    filter_value, no_fields_to_update, normalize_district, required, update_locked,
    DistrictRecord, Updated,
};

pub const MIN_DESCRIPTION_LEN: usize = 10;

/// Stored as lowercase text in `grievances.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum GrievanceStatus {
    Pending,
    Reviewed,
    Resolved,
}

impl GrievanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for GrievanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrievanceStatus {
    type Err = NdrisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(Self::Pending),
            "reviewed" => Ok(Self::Reviewed),
            "resolved" => Ok(Self::Resolved),
            other => Err(NdrisError::validation(format!(
                "Invalid status value: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Grievance {
    pub id: Uuid,
    pub category: String,
    pub district: String,
    pub description: String,
    pub status: GrievanceStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGrievance {
    pub category: String,
    pub district: String,
    pub description: String,
}

impl NewGrievance {
    /// Trimmed copy of the submission, or the first field that fails.
    pub fn validate(&self) -> NdrisResult<Self> {
        Ok(Self {
            category: required("Category", &self.category)?,
            district: normalize_district(&self.district)?,
            description: checked_description(&self.description)?,
        })
    }
}

fn checked_description(raw: &str) -> NdrisResult<String> {
    let description = required("Description", raw)?;
    if description.chars().count() < MIN_DESCRIPTION_LEN {
        return Err(NdrisError::validation(format!(
            "Description must be at least {MIN_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(description)
}

/// Partial edit. Absent fields are left unchanged; supplied fields follow
/// the same rules as [`NewGrievance`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrievanceUpdate {
    pub category: Option<String>,
    pub district: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

impl GrievanceUpdate {
    pub fn validate(&self) -> NdrisResult<Self> {
        let changes = Self {
            category: self.category.as_deref().map(|c| required("Category", c)).transpose()?,
            district: self.district.as_deref().map(normalize_district).transpose()?,
            description: self.description.as_deref().map(checked_description).transpose()?,
            status: self
                .status
                .as_deref()
                .map(|s| s.parse::<GrievanceStatus>().map(|s| s.as_str().to_string()))
                .transpose()?,
        };
        if changes.category.is_none()
            && changes.district.is_none()
            && changes.description.is_none()
            && changes.status.is_none()
        {
            return Err(no_fields_to_update());
        }
        Ok(changes)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrievanceFilters {
    pub district: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

impl Grievance {
    /// Insert a validated grievance. New grievances start as `pending`.
    pub async fn create(input: &NewGrievance, pool: &PgPool) -> NdrisResult<Self> {
        let input = input.validate()?;
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO grievances (category, district, description, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&input.category)
        .bind(&input.district)
        .bind(&input.description)
        .bind(GrievanceStatus::Pending)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> NdrisResult<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM grievances WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn list(filters: &GrievanceFilters, pool: &PgPool) -> NdrisResult<Vec<Self>> {
        let mut qb = sqlx::QueryBuilder::new("SELECT * FROM grievances WHERE 1=1 ");

        if let Some(district) = filter_value(filters.district.as_deref()) {
            qb.push("AND district = ");
            qb.push_bind(district);
            qb.push(" ");
        }
        if let Some(category) = filter_value(filters.category.as_deref()) {
            qb.push("AND category = ");
            qb.push_bind(category);
            qb.push(" ");
        }
        if let Some(status) = filter_value(filters.status.as_deref()) {
            let status: GrievanceStatus = status.parse()?;
            qb.push("AND status = ");
            qb.push_bind(status);
            qb.push(" ");
        }

        qb.push("ORDER BY created_at DESC");

        qb.build_query_as::<Self>()
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    /// Returns `None` when no grievance has this id.
    pub async fn update_status(
        id: Uuid,
        status: GrievanceStatus,
        pool: &PgPool,
    ) -> NdrisResult<Option<Self>> {
        sqlx::query_as::<_, Self>("UPDATE grievances SET status = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Apply a partial edit. Returns `None` when no grievance has this id.
    pub async fn update(
        id: Uuid,
        changes: &GrievanceUpdate,
        pool: &PgPool,
    ) -> NdrisResult<Option<Updated<Self>>> {
        let changes = changes.validate()?;

        let mut qb = sqlx::QueryBuilder::new("UPDATE grievances SET ");
        {
            let mut set = qb.separated(", ");
            if let Some(category) = changes.category {
                set.push("category = ");
                set.push_bind_unseparated(category);
            }
            if let Some(district) = changes.district {
                set.push("district = ");
                set.push_bind_unseparated(district);
            }
            if let Some(description) = changes.description {
                set.push("description = ");
                set.push_bind_unseparated(description);
            }
            if let Some(status) = changes.status {
                set.push("status = ");
                set.push_bind_unseparated(status.parse::<GrievanceStatus>()?);
            }
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(" RETURNING *");

        update_locked("grievances", id, qb, pool).await
    }

    /// Delete and return the removed row, so callers can refresh its district.
    pub async fn delete(id: Uuid, pool: &PgPool) -> NdrisResult<Option<Self>> {
        sqlx::query_as::<_, Self>("DELETE FROM grievances WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn category_stats(pool: &PgPool) -> NdrisResult<Vec<CategoryCount>> {
        sqlx::query_as::<_, CategoryCount>(
            r#"
            SELECT category, COUNT(*) AS count
            FROM grievances
            GROUP BY category
            ORDER BY count DESC, category ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}

impl DistrictRecord for Grievance {
    fn district(&self) -> &str {
        &self.district
    }
}
