// Test doubles for the neglect index collaborators.
//
// - MockAggregates (DistrictAggregates): in-memory per-district counts
// - MockIndexStore (NeglectIndexStore): HashMap keyed by district
//
// Both support failure injection per district and surface it as a
// persistence error, the same kind the Postgres implementations return.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use ndris_common::{round2, DistrictMetrics, NdrisError, NdrisResult, NeglectIndexRecord};

use crate::aggregates::DistrictAggregates;
use crate::neglect_index::NeglectIndexStore;

fn store_unreachable() -> NdrisError {
    NdrisError::Persistence(sqlx::Error::PoolClosed)
}

// ---------------------------------------------------------------------------
// MockAggregates
// ---------------------------------------------------------------------------

#[derive(Default)]
struct AggregatesInner {
    grievances: HashMap<String, i64>,
    disasters: HashMap<String, i64>,
    policy_scores: HashMap<String, Vec<i32>>,
    failing: HashSet<String>,
}

/// Cloneable handle; clones share state so tests can mutate the underlying
/// data after handing a copy to the engine.
#[derive(Clone, Default)]
pub struct MockAggregates {
    inner: Arc<Mutex<AggregatesInner>>,
}

impl MockAggregates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grievances(self, district: &str, count: i64) -> Self {
        self.add_grievances(district, count);
        self
    }

    pub fn with_disasters(self, district: &str, count: i64) -> Self {
        self.add_disasters(district, count);
        self
    }

    /// Individual policy effectiveness scores for a district.
    pub fn with_policy_scores(self, district: &str, scores: &[i32]) -> Self {
        self.inner
            .lock()
            .unwrap()
            .policy_scores
            .entry(district.to_string())
            .or_default()
            .extend_from_slice(scores);
        self
    }

    /// Make every read for `district` fail.
    pub fn failing_reads_for(self, district: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .failing
            .insert(district.to_string());
        self
    }

    pub fn add_grievances(&self, district: &str, count: i64) {
        *self
            .inner
            .lock()
            .unwrap()
            .grievances
            .entry(district.to_string())
            .or_default() += count;
    }

    pub fn add_disasters(&self, district: &str, count: i64) {
        *self
            .inner
            .lock()
            .unwrap()
            .disasters
            .entry(district.to_string())
            .or_default() += count;
    }

    fn check(&self, district: &str) -> NdrisResult<()> {
        if self.inner.lock().unwrap().failing.contains(district) {
            return Err(store_unreachable());
        }
        Ok(())
    }
}

#[async_trait]
impl DistrictAggregates for MockAggregates {
    async fn count_grievances(&self, district: &str) -> NdrisResult<i64> {
        self.check(district)?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .grievances
            .get(district)
            .copied()
            .unwrap_or(0))
    }

    async fn count_disasters(&self, district: &str) -> NdrisResult<i64> {
        self.check(district)?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .disasters
            .get(district)
            .copied()
            .unwrap_or(0))
    }

    async fn average_policy_score(&self, district: &str) -> NdrisResult<f64> {
        self.check(district)?;
        let inner = self.inner.lock().unwrap();
        let avg = match inner.policy_scores.get(district) {
            Some(scores) if !scores.is_empty() => {
                let sum: i64 = scores.iter().map(|s| i64::from(*s)).sum();
                round2(sum as f64 / scores.len() as f64)
            }
            _ => 0.0,
        };
        Ok(avg)
    }

    async fn list_distinct_districts(&self) -> NdrisResult<Vec<String>> {
        let inner = self.inner.lock().unwrap();
        let districts: BTreeSet<String> = inner
            .grievances
            .iter()
            .chain(inner.disasters.iter())
            .filter(|(_, count)| **count > 0)
            .map(|(d, _)| d.clone())
            .chain(
                inner
                    .policy_scores
                    .iter()
                    .filter(|(_, scores)| !scores.is_empty())
                    .map(|(d, _)| d.clone()),
            )
            .collect();
        Ok(districts.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// MockIndexStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct IndexStoreInner {
    rows: HashMap<String, NeglectIndexRecord>,
    failing: HashSet<String>,
    upsert_calls: usize,
}

#[derive(Default)]
pub struct MockIndexStore {
    inner: Mutex<IndexStoreInner>,
}

impl MockIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `upsert` fail for `district`.
    pub fn failing_upserts_for(self, district: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .failing
            .insert(district.to_string());
        self
    }

    // --- Assertion helpers ---

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Successful and failed upsert attempts.
    pub fn upsert_calls(&self) -> usize {
        self.inner.lock().unwrap().upsert_calls
    }
}

#[async_trait]
impl NeglectIndexStore for MockIndexStore {
    async fn get(&self, district: &str) -> NdrisResult<Option<NeglectIndexRecord>> {
        Ok(self.inner.lock().unwrap().rows.get(district).cloned())
    }

    async fn upsert(&self, metrics: &DistrictMetrics) -> NdrisResult<NeglectIndexRecord> {
        let mut inner = self.inner.lock().unwrap();
        inner.upsert_calls += 1;
        if inner.failing.contains(&metrics.district) {
            return Err(store_unreachable());
        }
        let record = NeglectIndexRecord {
            district: metrics.district.clone(),
            grievance_count: metrics.grievance_count,
            disaster_count: metrics.disaster_count,
            policy_score: metrics.policy_score,
            neglect_score: metrics.neglect_score,
            last_updated: Utc::now(),
        };
        inner.rows.insert(record.district.clone(), record.clone());
        Ok(record)
    }

    async fn list_by_score(&self) -> NdrisResult<Vec<NeglectIndexRecord>> {
        let mut rows: Vec<_> = self.inner.lock().unwrap().rows.values().cloned().collect();
        rows.sort_by(|a, b| {
            b.neglect_score
                .total_cmp(&a.neglect_score)
                .then_with(|| a.district.cmp(&b.district))
        });
        Ok(rows)
    }
}
