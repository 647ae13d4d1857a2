//! Recency, frequency and monetary derivation from raw customer records

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use tracing::warn;

use crate::data::{
    CustomerRecord, COL_LAST_ORDER_DATE, COL_ORDERS_OFFLINE, COL_ORDERS_ONLINE,
    COL_VALUE_OFFLINE, COL_VALUE_ONLINE,
};
use crate::error::{RfmError, RfmResult};
use crate::model::CustomerMetrics;

/// Days added to the latest purchase when no analysis date is given.
pub const DEFAULT_ANALYSIS_OFFSET_DAYS: u32 = 2;

/// Latest last-purchase date across the population.
pub fn latest_purchase_date(customers: &[CustomerRecord]) -> Option<NaiveDate> {
    customers
        .iter()
        .filter_map(CustomerRecord::last_purchase_date)
        .max()
}

/// Analysis date placed `offset_days` after the latest purchase, so that no
/// customer has a recency of zero.
pub fn analysis_date_after_latest(
    customers: &[CustomerRecord],
    offset_days: u32,
) -> Option<NaiveDate> {
    latest_purchase_date(customers).map(|latest| latest + Duration::days(i64::from(offset_days)))
}

/// Derive raw metrics for every customer, in input order.
///
/// Fails on the first customer lacking a last purchase date, an order count or
/// a spend amount, on a repeated customer id, and when `analysis_date` does
/// not postdate every purchase.
pub fn derive_metrics(
    customers: &[CustomerRecord],
    analysis_date: NaiveDate,
) -> RfmResult<Vec<CustomerMetrics>> {
    let mut metrics = Vec::with_capacity(customers.len());
    let mut latest: Option<NaiveDate> = None;
    let mut seen: HashSet<&str> = HashSet::with_capacity(customers.len());

    for customer in customers {
        if !seen.insert(customer.customer_id.as_str()) {
            return Err(RfmError::DuplicateCustomer {
                customer_id: customer.customer_id.clone(),
            });
        }
        let derived = derive_customer(customer, analysis_date)?;
        if let Some(last) = customer.last_purchase_date() {
            latest = latest.max(Some(last));
        }
        if derived.frequency == 0 {
            warn!(
                customer_id = %derived.customer_id,
                "customer has no recorded orders"
            );
        }
        metrics.push(derived);
    }

    if let Some(latest_purchase) = latest {
        if analysis_date <= latest_purchase {
            return Err(RfmError::AnalysisDateNotAfterLatestPurchase {
                analysis_date,
                latest_purchase,
            });
        }
    }

    Ok(metrics)
}

fn derive_customer(
    customer: &CustomerRecord,
    analysis_date: NaiveDate,
) -> RfmResult<CustomerMetrics> {
    let missing = |field: &'static str| RfmError::MissingMetric {
        customer_id: customer.customer_id.clone(),
        field,
    };

    let last_purchase = customer
        .last_purchase_date()
        .ok_or_else(|| missing(COL_LAST_ORDER_DATE))?;
    let orders_online = customer.orders_online.ok_or_else(|| missing(COL_ORDERS_ONLINE))?;
    let orders_offline = customer.orders_offline.ok_or_else(|| missing(COL_ORDERS_OFFLINE))?;
    let value_online = customer.value_online.ok_or_else(|| missing(COL_VALUE_ONLINE))?;
    let value_offline = customer.value_offline.ok_or_else(|| missing(COL_VALUE_OFFLINE))?;

    for (field, value) in [(COL_VALUE_ONLINE, value_online), (COL_VALUE_OFFLINE, value_offline)] {
        if !value.is_finite() || value < 0.0 {
            return Err(RfmError::InvalidMetric {
                customer_id: customer.customer_id.clone(),
                field,
                value,
            });
        }
    }

    let frequency = orders_online
        .checked_add(orders_offline)
        .ok_or_else(|| RfmError::InvalidMetric {
            customer_id: customer.customer_id.clone(),
            field: COL_ORDERS_OFFLINE,
            value: f64::from(orders_online) + f64::from(orders_offline),
        })?;

    Ok(CustomerMetrics {
        customer_id: customer.customer_id.clone(),
        recency: (analysis_date - last_purchase).num_days(),
        frequency,
        monetary: value_online + value_offline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn customer(id: &str, last: NaiveDate, online: u32, offline: u32, spend: f64) -> CustomerRecord {
        CustomerRecord {
            customer_id: id.to_string(),
            last_order_date: Some(last),
            orders_online: Some(online),
            orders_offline: Some(offline),
            value_online: Some(spend),
            value_offline: Some(0.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_derive_metrics() {
        let customers = vec![
            customer("a", date(2021, 5, 30), 3, 2, 250.0),
            customer("b", date(2021, 1, 1), 0, 1, 19.99),
        ];
        let metrics = derive_metrics(&customers, date(2021, 6, 1)).unwrap();

        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].customer_id, "a");
        assert_eq!(metrics[0].recency, 2);
        assert_eq!(metrics[0].frequency, 5);
        assert_eq!(metrics[0].monetary, 250.0);
        assert_eq!(metrics[1].recency, 151);
        assert_eq!(metrics[1].frequency, 1);
    }

    #[test]
    fn test_analysis_date_after_latest() {
        let customers = vec![
            customer("a", date(2021, 5, 30), 1, 0, 1.0),
            customer("b", date(2020, 1, 1), 1, 0, 1.0),
        ];
        assert_eq!(
            analysis_date_after_latest(&customers, DEFAULT_ANALYSIS_OFFSET_DAYS),
            Some(date(2021, 6, 1))
        );
        assert_eq!(analysis_date_after_latest(&[], 2), None);
    }

    #[test]
    fn test_missing_last_purchase_date_is_an_error() {
        let mut broken = customer("b", date(2021, 1, 1), 1, 1, 1.0);
        broken.last_order_date = None;
        let customers = vec![customer("a", date(2021, 1, 1), 1, 1, 1.0), broken];

        let err = derive_metrics(&customers, date(2021, 6, 1)).unwrap_err();
        assert_eq!(
            err,
            RfmError::MissingMetric {
                customer_id: "b".to_string(),
                field: COL_LAST_ORDER_DATE,
            }
        );
    }

    #[test]
    fn test_missing_amount_is_an_error() {
        let mut broken = customer("a", date(2021, 1, 1), 1, 1, 1.0);
        broken.value_offline = None;

        let err = derive_metrics(&[broken], date(2021, 6, 1)).unwrap_err();
        assert!(matches!(err, RfmError::MissingMetric { field, .. } if field == COL_VALUE_OFFLINE));
    }

    #[test]
    fn test_negative_spend_is_rejected() {
        let broken = customer("a", date(2021, 1, 1), 1, 1, -5.0);
        let err = derive_metrics(&[broken], date(2021, 6, 1)).unwrap_err();
        assert!(matches!(err, RfmError::InvalidMetric { .. }));
    }

    #[test]
    fn test_order_count_overflow_is_rejected() {
        let broken = customer("a", date(2021, 1, 1), u32::MAX, 1, 1.0);
        let err = derive_metrics(&[broken], date(2021, 6, 1)).unwrap_err();
        assert_eq!(
            err,
            RfmError::InvalidMetric {
                customer_id: "a".to_string(),
                field: COL_ORDERS_OFFLINE,
                value: f64::from(u32::MAX) + 1.0,
            }
        );
    }

    #[test]
    fn test_repeated_customer_id_is_rejected() {
        let customers = vec![
            customer("a", date(2021, 1, 1), 1, 0, 1.0),
            customer("b", date(2021, 2, 1), 2, 0, 2.0),
            customer("a", date(2021, 3, 1), 3, 0, 3.0),
        ];
        let err = derive_metrics(&customers, date(2021, 6, 1)).unwrap_err();
        assert_eq!(
            err,
            RfmError::DuplicateCustomer {
                customer_id: "a".to_string()
            }
        );
    }

    #[test]
    fn test_zero_order_customer_is_kept() {
        let customers = vec![
            customer("a", date(2021, 5, 1), 0, 0, 0.0),
            customer("b", date(2021, 4, 1), 2, 1, 40.0),
        ];
        let metrics = derive_metrics(&customers, date(2021, 6, 1)).unwrap();

        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].customer_id, "a");
        assert_eq!(metrics[0].frequency, 0);
        assert_eq!(metrics[0].monetary, 0.0);
    }

    #[test]
    fn test_analysis_date_must_postdate_purchases() {
        let customers = vec![customer("a", date(2021, 6, 1), 1, 0, 1.0)];
        let err = derive_metrics(&customers, date(2021, 6, 1)).unwrap_err();
        assert_eq!(
            err,
            RfmError::AnalysisDateNotAfterLatestPurchase {
                analysis_date: date(2021, 6, 1),
                latest_purchase: date(2021, 6, 1),
            }
        );
    }
}
