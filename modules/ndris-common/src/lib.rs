pub mod config;
pub mod error;
pub mod score;
pub mod types;

pub use config::{AppConfig, FileConfig, IndexConfig, ServerConfig};
pub use error::{NdrisError, NdrisResult};
pub use score::{neglect_score, round2, NeglectLevel};
pub use types::*;
