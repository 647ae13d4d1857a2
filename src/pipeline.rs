//! End-to-end RFM segmentation: derive, score, classify

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::data::CustomerRecord;
use crate::error::RfmResult;
use crate::metrics::derive_metrics;
use crate::model::{RfmRecord, RfmTable};
use crate::scoring::score_population;
use crate::segment::classify_all;

/// Build the RFM table for a full customer population.
///
/// The result depends only on `customers` and `analysis_date`; scores are
/// population-relative, so any change to the population invalidates them.
pub fn build_rfm_table(
    customers: &[CustomerRecord],
    analysis_date: NaiveDate,
) -> RfmResult<RfmTable> {
    let metrics = derive_metrics(customers, analysis_date)?;
    info!(customers = metrics.len(), %analysis_date, "derived rfm metrics");

    let cards = score_population(&metrics)?;
    debug!(customers = cards.len(), "assigned quantile scores");

    let segments = classify_all(&cards)?;

    let records: Vec<RfmRecord> = metrics
        .into_iter()
        .zip(cards)
        .zip(segments)
        .map(|((metrics, scores), segment)| RfmRecord {
            customer_id: metrics.customer_id,
            recency: metrics.recency,
            frequency: metrics.frequency,
            monetary: metrics.monetary,
            rf_code: scores.rf_code(),
            rfm_code: scores.rfm_code(),
            scores,
            segment,
        })
        .collect();

    let table = RfmTable::new(analysis_date, records);
    info!(
        customers = table.len(),
        segments = table.segment_counts().len(),
        "classified customers into segments"
    );
    Ok(table)
}
