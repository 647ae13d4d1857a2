//! Error types raised by the RFM engine

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::Metric;

/// Failures of the RFM computation. Every variant aborts the run: a partial
/// table would shift the population-relative quantile boundaries.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RfmError {
    #[error("customer {customer_id} is missing required field `{field}`")]
    MissingMetric {
        customer_id: String,
        field: &'static str,
    },

    #[error("customer {customer_id} has invalid `{field}` value {value}")]
    InvalidMetric {
        customer_id: String,
        field: &'static str,
        value: f64,
    },

    #[error("customer {customer_id} appears more than once")]
    DuplicateCustomer { customer_id: String },

    #[error(
        "analysis date {analysis_date} must be after the latest purchase date {latest_purchase}"
    )]
    AnalysisDateNotAfterLatestPurchase {
        analysis_date: NaiveDate,
        latest_purchase: NaiveDate,
    },

    #[error("cannot split {metric} of {population} customers into {bins} quantile bins")]
    DegenerateDistribution {
        metric: Metric,
        population: usize,
        bins: usize,
    },

    #[error("RF code {code} matches no segment rule")]
    UnmappedSegment { code: String },
}

/// Result type of the engine stages.
pub type RfmResult<T> = std::result::Result<T, RfmError>;
