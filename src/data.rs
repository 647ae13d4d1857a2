//! Customer data loading and result export using Polars

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use polars::prelude::*;

use crate::model::{RfmRecord, RfmTable, Score};

pub const COL_MASTER_ID: &str = "master_id";
pub const COL_ORDER_CHANNEL: &str = "order_channel";
pub const COL_LAST_ORDER_CHANNEL: &str = "last_order_channel";
pub const COL_FIRST_ORDER_DATE: &str = "first_order_date";
pub const COL_LAST_ORDER_DATE: &str = "last_order_date";
pub const COL_LAST_ORDER_DATE_ONLINE: &str = "last_order_date_online";
pub const COL_LAST_ORDER_DATE_OFFLINE: &str = "last_order_date_offline";
pub const COL_ORDERS_ONLINE: &str = "order_num_total_ever_online";
pub const COL_ORDERS_OFFLINE: &str = "order_num_total_ever_offline";
pub const COL_VALUE_ONLINE: &str = "customer_value_total_ever_online";
pub const COL_VALUE_OFFLINE: &str = "customer_value_total_ever_offline";
pub const COL_CATEGORIES: &str = "interested_in_categories_12";

/// One input row. Fields the source left empty are `None`; the engine decides
/// which of them are required.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub order_channel: Option<String>,
    pub last_order_channel: Option<String>,
    pub first_order_date: Option<NaiveDate>,
    pub last_order_date: Option<NaiveDate>,
    pub last_order_date_online: Option<NaiveDate>,
    pub last_order_date_offline: Option<NaiveDate>,
    pub orders_online: Option<u32>,
    pub orders_offline: Option<u32>,
    pub value_online: Option<f64>,
    pub value_offline: Option<f64>,
    pub interested_in_categories: Vec<String>,
}

impl CustomerRecord {
    /// Most recent purchase: the overall last order date, falling back to the
    /// later of the per-channel dates.
    pub fn last_purchase_date(&self) -> Option<NaiveDate> {
        self.last_order_date.or_else(|| {
            match (self.last_order_date_online, self.last_order_date_offline) {
                (Some(online), Some(offline)) => Some(online.max(offline)),
                (online, offline) => online.or(offline),
            }
        })
    }

    /// Total orders across channels, treating missing counts as zero.
    pub fn total_orders(&self) -> u64 {
        u64::from(self.orders_online.unwrap_or(0)) + u64::from(self.orders_offline.unwrap_or(0))
    }

    /// Total spend across channels, treating missing amounts as zero.
    pub fn total_value(&self) -> f64 {
        self.value_online.unwrap_or(0.0) + self.value_offline.unwrap_or(0.0)
    }

    /// True when any interest category contains `tag`.
    pub fn interested_in(&self, tag: &str) -> bool {
        self.interested_in_categories
            .iter()
            .any(|category| category.contains(tag))
    }
}

/// Load customer records from a CSV file.
///
/// Every column is read as text and parsed here so that mixed integer and
/// decimal cells do not depend on schema inference.
///
/// # Arguments
/// * `file_path` - Path to a CSV file with a `master_id` column and any of the
///   channel, date, order count, spend and category columns
///
/// # Returns
/// * One `CustomerRecord` per row, in file order. Fails on an empty file, an
///   empty or repeated `master_id`, or a cell that does not parse.
pub fn load_customers(file_path: &Path) -> crate::Result<Vec<CustomerRecord>> {
    let df = LazyCsvReader::new(file_path)
        .with_infer_schema_length(Some(0))
        .finish()
        .with_context(|| format!("Failed to open {}", file_path.display()))?
        .collect()
        .with_context(|| format!("Failed to read {}", file_path.display()))?;

    let ids = text_column(&df, COL_MASTER_ID)?
        .ok_or_else(|| anyhow::anyhow!("Input is missing the `{}` column", COL_MASTER_ID))?;
    let height = ids.len();

    let order_channel = text_column(&df, COL_ORDER_CHANNEL)?;
    let last_order_channel = text_column(&df, COL_LAST_ORDER_CHANNEL)?;
    let first_order_date = text_column(&df, COL_FIRST_ORDER_DATE)?;
    let last_order_date = text_column(&df, COL_LAST_ORDER_DATE)?;
    let last_online = text_column(&df, COL_LAST_ORDER_DATE_ONLINE)?;
    let last_offline = text_column(&df, COL_LAST_ORDER_DATE_OFFLINE)?;
    let orders_online = text_column(&df, COL_ORDERS_ONLINE)?;
    let orders_offline = text_column(&df, COL_ORDERS_OFFLINE)?;
    let value_online = text_column(&df, COL_VALUE_ONLINE)?;
    let value_offline = text_column(&df, COL_VALUE_OFFLINE)?;
    let categories = text_column(&df, COL_CATEGORIES)?;

    let mut customers = Vec::with_capacity(height);
    let mut seen = HashSet::with_capacity(height);
    for (row, id) in ids.into_iter().enumerate() {
        let customer_id = id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Row {} has an empty `{}`", row + 1, COL_MASTER_ID))?;
        if !seen.insert(customer_id.clone()) {
            anyhow::bail!("Row {} repeats customer {}", row + 1, customer_id);
        }
        let context = |field: &str| format!("Invalid `{}` for customer {}", field, customer_id);

        customers.push(CustomerRecord {
            order_channel: cell(&order_channel, row),
            last_order_channel: cell(&last_order_channel, row),
            first_order_date: cell(&first_order_date, row)
                .map(|s| parse_date(&s))
                .transpose()
                .with_context(|| context(COL_FIRST_ORDER_DATE))?,
            last_order_date: cell(&last_order_date, row)
                .map(|s| parse_date(&s))
                .transpose()
                .with_context(|| context(COL_LAST_ORDER_DATE))?,
            last_order_date_online: cell(&last_online, row)
                .map(|s| parse_date(&s))
                .transpose()
                .with_context(|| context(COL_LAST_ORDER_DATE_ONLINE))?,
            last_order_date_offline: cell(&last_offline, row)
                .map(|s| parse_date(&s))
                .transpose()
                .with_context(|| context(COL_LAST_ORDER_DATE_OFFLINE))?,
            orders_online: cell(&orders_online, row)
                .map(|s| parse_count(&s))
                .transpose()
                .with_context(|| context(COL_ORDERS_ONLINE))?,
            orders_offline: cell(&orders_offline, row)
                .map(|s| parse_count(&s))
                .transpose()
                .with_context(|| context(COL_ORDERS_OFFLINE))?,
            value_online: cell(&value_online, row)
                .map(|s| parse_amount(&s))
                .transpose()
                .with_context(|| context(COL_VALUE_ONLINE))?,
            value_offline: cell(&value_offline, row)
                .map(|s| parse_amount(&s))
                .transpose()
                .with_context(|| context(COL_VALUE_OFFLINE))?,
            interested_in_categories: cell(&categories, row)
                .map(|s| parse_categories(&s))
                .unwrap_or_default(),
            customer_id,
        });
    }

    if customers.is_empty() {
        anyhow::bail!("No customers found in {}", file_path.display());
    }

    Ok(customers)
}

/// Write the scored table with one row per customer.
///
/// # Arguments
/// * `file_path` - Destination CSV file, created or truncated
/// * `table` - Scored and classified customers, written in table order
pub fn write_rfm_table(file_path: &Path, table: &RfmTable) -> crate::Result<()> {
    let records = table.records();
    let score_column = |score: fn(&RfmRecord) -> Score| {
        records
            .iter()
            .map(|r| i64::from(score(r).value()))
            .collect::<Vec<_>>()
    };
    let mut df = df!(
        "customer_id" => records.iter().map(|r| r.customer_id.clone()).collect::<Vec<_>>(),
        "recency" => records.iter().map(|r| r.recency).collect::<Vec<_>>(),
        "frequency" => records.iter().map(|r| i64::from(r.frequency)).collect::<Vec<_>>(),
        "monetary" => records.iter().map(|r| r.monetary).collect::<Vec<_>>(),
        "recency_score" => score_column(|r| r.scores.recency),
        "frequency_score" => score_column(|r| r.scores.frequency),
        "monetary_score" => score_column(|r| r.scores.monetary),
        "RF_SCORE" => records.iter().map(|r| r.rf_code.clone()).collect::<Vec<_>>(),
        "RFM_SCORE" => records.iter().map(|r| r.rfm_code.clone()).collect::<Vec<_>>(),
        "segment" => records.iter().map(|r| r.segment.label().to_string()).collect::<Vec<_>>()
    )?;

    write_csv(file_path, &mut df)
}

/// Write a single `customer_id` column.
pub fn write_customer_ids(file_path: &Path, customer_ids: &[String]) -> crate::Result<()> {
    let mut df = df!("customer_id" => customer_ids.to_vec())?;
    write_csv(file_path, &mut df)
}

fn write_csv(file_path: &Path, df: &mut DataFrame) -> crate::Result<()> {
    let mut file = File::create(file_path)
        .with_context(|| format!("Failed to create {}", file_path.display()))?;
    CsvWriter::new(&mut file)
        .finish(df)
        .with_context(|| format!("Failed to write {}", file_path.display()))?;
    Ok(())
}

/// Column values as trimmed text, or `None` when the column is absent.
fn text_column(df: &DataFrame, name: &str) -> crate::Result<Option<Vec<Option<String>>>> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };
    let column = column.cast(&DataType::String)?;
    let values = column
        .str()?
        .into_iter()
        .map(|value| {
            value
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        })
        .collect();
    Ok(Some(values))
}

fn cell(column: &Option<Vec<Option<String>>>, row: usize) -> Option<String> {
    column.as_ref().and_then(|values| values.get(row).cloned().flatten())
}

/// Parse `YYYY-MM-DD`, ignoring any time-of-day suffix.
pub fn parse_date(value: &str) -> crate::Result<NaiveDate> {
    let date_part = value.trim().get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid date: {}", value))
}

/// Parse a whole, non-negative order count. Counts exported as `3.0` are accepted.
pub fn parse_count(value: &str) -> crate::Result<u32> {
    let number: f64 = value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid order count: {}", value))?;
    if !number.is_finite() || number < 0.0 || number.fract() != 0.0 || number > u32::MAX as f64 {
        anyhow::bail!("Order count must be a whole non-negative number: {}", value);
    }
    Ok(number as u32)
}

/// Parse a spend amount. Sign checks happen in the engine.
pub fn parse_amount(value: &str) -> crate::Result<f64> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid amount: {}", value))
}

/// Parse an interest list such as `[KADIN, AKTIFSPOR]`.
pub fn parse_categories(value: &str) -> Vec<String> {
    value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|tag| tag.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "master_id,order_channel,last_order_channel,first_order_date,last_order_date,last_order_date_online,last_order_date_offline,order_num_total_ever_online,order_num_total_ever_offline,customer_value_total_ever_offline,customer_value_total_ever_online,interested_in_categories_12";

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        writeln!(file, "cc294636,Android App,Offline,2020-10-30,2021-02-26,2021-02-21,2021-02-26,4.0,1.0,139.99,799.38,[KADIN]").unwrap();
        writeln!(file, "f431bd5a,Android App,Mobile,2017-02-08,2021-02-16,2021-02-16,2020-01-10,19.0,2.0,159.97,1853.58,\"[ERKEK, COCUK, KADIN, AKTIFSPOR]\"").unwrap();
        writeln!(file, "69b69676,Desktop,Desktop,2019-11-27,2020-11-27,2020-11-27,,5,0,0,585.32,[]").unwrap();
        file
    }

    #[test]
    fn test_load_customers() {
        let file = create_test_csv();
        let customers = load_customers(file.path()).unwrap();

        assert_eq!(customers.len(), 3);
        let first = &customers[0];
        assert_eq!(first.customer_id, "cc294636");
        assert_eq!(first.order_channel.as_deref(), Some("Android App"));
        assert_eq!(first.last_order_date, NaiveDate::from_ymd_opt(2021, 2, 26));
        assert_eq!(first.orders_online, Some(4));
        assert_eq!(first.orders_offline, Some(1));
        assert_eq!(first.value_offline, Some(139.99));
        assert_eq!(first.interested_in_categories, vec!["KADIN".to_string()]);

        let second = &customers[1];
        assert_eq!(second.interested_in_categories.len(), 4);
        assert!(second.interested_in("COCUK"));

        let third = &customers[2];
        assert_eq!(third.last_order_date_offline, None);
        assert!(third.interested_in_categories.is_empty());
    }

    #[test]
    fn test_load_rejects_fractional_order_count() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        writeln!(file, "a1,Desktop,Desktop,2020-01-01,2021-01-01,2021-01-01,,1.5,0,0,10.0,[]").unwrap();

        assert!(load_customers(file.path()).is_err());
    }

    #[test]
    fn test_load_rejects_repeated_customer_id() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        writeln!(file, "a1,Desktop,Desktop,2020-01-01,2021-01-01,2021-01-01,,1,0,0,10.0,[]").unwrap();
        writeln!(file, "b2,Mobile,Mobile,2020-01-01,2021-02-01,2021-02-01,,2,0,0,20.0,[]").unwrap();
        writeln!(file, "a1,Mobile,Mobile,2020-01-01,2021-03-01,2021-03-01,,3,0,0,30.0,[KADIN]").unwrap();

        let err = load_customers(file.path()).unwrap_err();
        assert!(err.to_string().contains("repeats customer a1"));
    }

    #[test]
    fn test_total_orders_does_not_overflow() {
        let record = CustomerRecord {
            customer_id: "big".to_string(),
            orders_online: Some(u32::MAX),
            orders_offline: Some(1),
            ..Default::default()
        };
        assert_eq!(record.total_orders(), u64::from(u32::MAX) + 1);
    }

    #[test]
    fn test_last_purchase_date_falls_back_to_channels() {
        let record = CustomerRecord {
            customer_id: "x".to_string(),
            last_order_date_online: NaiveDate::from_ymd_opt(2021, 3, 1),
            last_order_date_offline: NaiveDate::from_ymd_opt(2021, 4, 1),
            ..Default::default()
        };
        assert_eq!(record.last_purchase_date(), NaiveDate::from_ymd_opt(2021, 4, 1));

        let explicit = CustomerRecord {
            last_order_date: NaiveDate::from_ymd_opt(2021, 5, 1),
            ..record.clone()
        };
        assert_eq!(explicit.last_purchase_date(), NaiveDate::from_ymd_opt(2021, 5, 1));

        let none = CustomerRecord::default();
        assert_eq!(none.last_purchase_date(), None);
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(
            parse_date("2021-05-30 00:00:00").unwrap(),
            NaiveDate::from_ymd_opt(2021, 5, 30).unwrap()
        );
        assert!(parse_date("30/05/2021").is_err());
        assert_eq!(parse_count("3.0").unwrap(), 3);
        assert!(parse_count("-1").is_err());
        assert_eq!(parse_amount("12.50").unwrap(), 12.5);
        assert_eq!(
            parse_categories("[ERKEK, 'COCUK']"),
            vec!["ERKEK".to_string(), "COCUK".to_string()]
        );
        assert!(parse_categories("[]").is_empty());
    }
}
