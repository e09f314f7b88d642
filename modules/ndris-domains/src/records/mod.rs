//! Source record stores feeding the neglect index.
//!
//! Each record type is tagged by a free-text district. The aggregators in
//! [`crate::aggregates`] read these tables; nothing here touches the index.

pub mod disaster;
pub mod grievance;
pub mod policy;

pub use disaster::{Disaster, DisasterFilters, DisasterUpdate, NewDisaster};
pub use grievance::{
    CategoryCount, Grievance, GrievanceFilters, GrievanceStatus, GrievanceUpdate, NewGrievance,
};
pub use policy::{NewPolicy, Policy, PolicyFilters, PolicyUpdate, SectorStats};

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use ndris_common::{NdrisError, NdrisResult};

pub const MAX_DISTRICT_LEN: usize = 100;

/// Trim a caller-supplied district name and reject blanks.
pub fn normalize_district(raw: &str) -> NdrisResult<String> {
    let district = raw.trim();
    if district.is_empty() {
        return Err(NdrisError::validation("District name is required"));
    }
    if district.chars().count() > MAX_DISTRICT_LEN {
        return Err(NdrisError::validation(format!(
            "District name too long (max {MAX_DISTRICT_LEN} characters)"
        )));
    }
    Ok(district.to_string())
}

pub(crate) fn required(field: &str, value: &str) -> NdrisResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(NdrisError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

pub(crate) fn in_range(field: &str, value: i32, min: i32, max: i32) -> NdrisResult<i32> {
    if value < min || value > max {
        return Err(NdrisError::validation(format!(
            "{field} must be between {min} and {max}"
        )));
    }
    Ok(value)
}

/// A record tagged with the district it counts towards.
pub trait DistrictRecord {
    fn district(&self) -> &str;
}

/// A record after an update, along with the district it had before.
#[derive(Debug, Clone)]
pub struct Updated<T> {
    pub record: T,
    pub previous_district: String,
}

impl<T: DistrictRecord> Updated<T> {
    /// Districts whose aggregates the update may have changed: the current
    /// one, plus the previous one when the record moved.
    pub fn touched_districts(&self) -> Vec<&str> {
        let current = self.record.district();
        if current == self.previous_district {
            vec![current]
        } else {
            vec![self.previous_district.as_str(), current]
        }
    }
}

pub(crate) fn no_fields_to_update() -> NdrisError {
    NdrisError::validation("No fields to update")
}

/// Lock the row, run `update` (an `UPDATE ... RETURNING *` for the same id)
/// and pair the result with the district the row had before.
///
/// Returns `None` when no row in `table` has this id.
pub(crate) async fn update_locked<'a, T>(
    table: &'static str,
    id: Uuid,
    mut update: QueryBuilder<'a, Postgres>,
    pool: &PgPool,
) -> NdrisResult<Option<Updated<T>>>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut tx = pool.begin().await?;

    let previous = sqlx::query_as::<_, (String,)>(&format!(
        "SELECT district FROM {table} WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some((previous_district,)) = previous else {
        return Ok(None);
    };

    let record = update.build_query_as::<T>().fetch_one(&mut *tx).await?;
    tx.commit().await?;

    Ok(Some(Updated {
        record,
        previous_district,
    }))
}

/// Query filter value, with blank strings treated as absent.
pub(crate) fn filter_value(value: Option<&str>) -> Option<String> {
    optional(value)
}

/// Empty optional text is stored as NULL.
pub(crate) fn optional(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn district_is_trimmed() {
        assert_eq!(normalize_district("  Kathmandu ").unwrap(), "Kathmandu");
    }

    #[test]
    fn blank_district_rejected() {
        let err = normalize_district("   ").unwrap_err();
        assert!(matches!(err, NdrisError::Validation(msg) if msg == "District name is required"));
    }

    #[test]
    fn overlong_district_rejected() {
        let name = "x".repeat(MAX_DISTRICT_LEN + 1);
        assert!(normalize_district(&name).is_err());
    }

    struct Tagged(&'static str);

    impl DistrictRecord for Tagged {
        fn district(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn update_in_place_touches_one_district() {
        let updated = Updated {
            record: Tagged("Kaski"),
            previous_district: "Kaski".into(),
        };
        assert_eq!(updated.touched_districts(), vec!["Kaski"]);
    }

    #[test]
    fn moved_record_touches_both_districts() {
        let updated = Updated {
            record: Tagged("Syangja"),
            previous_district: "Kaski".into(),
        };
        assert_eq!(updated.touched_districts(), vec!["Kaski", "Syangja"]);
    }

    #[test]
    fn blank_optional_becomes_none() {
        assert_eq!(optional(Some("  ")), None);
        assert_eq!(optional(Some(" note ")), Some("note".to_string()));
        assert_eq!(optional(None), None);
    }
}
