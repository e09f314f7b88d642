//! Derived per-district neglect index.
//!
//! The index is a cache of [`ndris_common::DistrictMetrics`] snapshots, one row
//! per district. Rows are filled lazily on first read and replaced wholesale on
//! every recompute. Nothing invalidates them automatically; callers decide when
//! to refresh (see `index.refresh_on_write` in the server config).

mod engine;
mod store;

pub use engine::NeglectIndexEngine;
pub use store::{NeglectIndexStore, PgNeglectIndexStore};
