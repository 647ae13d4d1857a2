//! rfm-segmenter: customer segmentation with quantile-based RFM scoring
//!
//! Customers are scored on Recency, Frequency and Monetary value relative to
//! the whole population, then assigned to one of ten behavioural segments from
//! their recency and frequency scores.

pub mod cli;
pub mod data;
pub mod error;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod segment;
pub mod targets;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{load_customers, write_customer_ids, write_rfm_table, CustomerRecord};
pub use error::{RfmError, RfmResult};
pub use metrics::{analysis_date_after_latest, derive_metrics};
pub use model::{RfmRecord, RfmTable, Score, ScoreCard};
pub use pipeline::build_rfm_table;
pub use scoring::score_population;
pub use segment::{classify, Segment};
pub use targets::{select_targets, Campaign, CampaignConfig};
pub use viz::generate_segment_charts;

/// Common result type used by the I/O layer and the binary
pub type Result<T> = anyhow::Result<T>;
