pub mod extract;
pub mod neglect;
pub mod records;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::warn;
use uuid::Uuid;

use ndris_common::NdrisError;
use ndris_domains::NeglectIndexEngine;

/// Handler error rendered as `{"error": "..."}` with a matching status.
#[derive(Debug)]
pub struct ApiError(NdrisError);

impl From<NdrisError> for ApiError {
    fn from(e: NdrisError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(NdrisError::validation(msg))
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NdrisError::not_found(msg))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            NdrisError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            NdrisError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            NdrisError::Persistence(e) => {
                warn!(error = %e, "Database operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database operation failed".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

pub(crate) fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid id: {raw}")))
}

/// Refresh the index rows for districts whose records just changed.
///
/// The record write already succeeded, so failures are only logged. Returns
/// how many rows were refreshed.
pub(crate) async fn refresh_districts(
    engine: &NeglectIndexEngine,
    enabled: bool,
    districts: &[&str],
) -> usize {
    if !enabled {
        return 0;
    }
    let mut refreshed = 0;
    for district in districts {
        match engine.upsert(district).await {
            Ok(_) => refreshed += 1,
            Err(e) => {
                warn!(district = %district, error = %e, "Failed to refresh neglect index after write");
            }
        }
    }
    refreshed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ndris_domains::testing::{MockAggregates, MockIndexStore};

    fn engine(store: &Arc<MockIndexStore>) -> NeglectIndexEngine {
        let aggregates = MockAggregates::new()
            .with_grievances("Kaski", 4)
            .with_grievances("Syangja", 2);
        NeglectIndexEngine::new(Arc::new(aggregates), store.clone())
    }

    #[tokio::test]
    async fn write_refreshes_its_district() {
        let store = Arc::new(MockIndexStore::new());
        let refreshed = refresh_districts(&engine(&store), true, &["Kaski"]).await;

        assert_eq!(refreshed, 1);
        assert_eq!(store.upsert_calls(), 1);
        let row = engine(&store).get_all().await.unwrap();
        assert_eq!(row[0].district, "Kaski");
        assert_eq!(row[0].grievance_count, 4);
    }

    #[tokio::test]
    async fn disabled_refresh_leaves_index_alone() {
        let store = Arc::new(MockIndexStore::new());
        let refreshed = refresh_districts(&engine(&store), false, &["Kaski"]).await;

        assert_eq!(refreshed, 0);
        assert_eq!(store.upsert_calls(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn moved_record_refreshes_both_districts() {
        let store = Arc::new(MockIndexStore::new());
        let refreshed = refresh_districts(&engine(&store), true, &["Kaski", "Syangja"]).await;

        assert_eq!(refreshed, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_is_swallowed() {
        let store = Arc::new(MockIndexStore::new().failing_upserts_for("Kaski"));
        let refreshed = refresh_districts(&engine(&store), true, &["Kaski", "Syangja"]).await;

        assert_eq!(refreshed, 1);
        assert_eq!(store.upsert_calls(), 2);
        assert_eq!(store.len(), 1);
    }
}
