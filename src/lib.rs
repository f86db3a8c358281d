//! Classification and aggregation engine for maintenance work order
//! governance reporting.
//!
//! The flow is `loader` -> `classifier` -> `summary` -> `missed`; `pipeline`
//! strings those together into one [`types::GovernanceReport`].
pub mod classifier;
pub mod config;
pub mod error;
pub mod loader;
pub mod missed;
pub mod output;
pub mod pipeline;
pub mod summary;
pub mod types;
pub mod util;

pub use classifier::{classify, classify_record, ClassifyOutcome};
pub use config::EngineConfig;
pub use error::{DataQualityWarning, EngineError, Result};
pub use missed::{build_group_missed_series, build_period_missed_series, Stoplight};
pub use summary::{extract_flagged, summarize};
pub use types::{Classification, ClassifiedRecord, Dimension, SummaryTable, WorkOrderRecord};
