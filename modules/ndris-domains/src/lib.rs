pub mod aggregates;
pub mod neglect_index;
pub mod records;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use aggregates::{DistrictAggregates, PgDistrictAggregates};
pub use neglect_index::{NeglectIndexEngine, NeglectIndexStore, PgNeglectIndexStore};
