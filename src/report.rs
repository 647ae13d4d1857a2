//! Descriptive statistics over the input customers and the RFM table

use std::collections::BTreeMap;

use crate::data::{self, CustomerRecord};
use crate::model::RfmTable;
use crate::segment::Segment;

/// Per-channel totals.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelSummary {
    pub channel: String,
    pub customers: usize,
    pub total_orders: u64,
    pub total_value: f64,
}

/// Mean metrics of one segment.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentSummary {
    pub segment: Segment,
    pub count: usize,
    pub mean_recency: f64,
    pub mean_frequency: f64,
    pub mean_monetary: f64,
}

/// Number of empty cells per input field, in column order.
pub fn missing_value_counts(customers: &[CustomerRecord]) -> Vec<(&'static str, usize)> {
    let count = |present: fn(&CustomerRecord) -> bool| {
        customers.iter().filter(|c| !present(c)).count()
    };
    vec![
        (data::COL_ORDER_CHANNEL, count(|c| c.order_channel.is_some())),
        (data::COL_LAST_ORDER_CHANNEL, count(|c| c.last_order_channel.is_some())),
        (data::COL_FIRST_ORDER_DATE, count(|c| c.first_order_date.is_some())),
        (data::COL_LAST_ORDER_DATE, count(|c| c.last_order_date.is_some())),
        (data::COL_LAST_ORDER_DATE_ONLINE, count(|c| c.last_order_date_online.is_some())),
        (data::COL_LAST_ORDER_DATE_OFFLINE, count(|c| c.last_order_date_offline.is_some())),
        (data::COL_ORDERS_ONLINE, count(|c| c.orders_online.is_some())),
        (data::COL_ORDERS_OFFLINE, count(|c| c.orders_offline.is_some())),
        (data::COL_VALUE_OFFLINE, count(|c| c.value_offline.is_some())),
        (data::COL_VALUE_ONLINE, count(|c| c.value_online.is_some())),
        (data::COL_CATEGORIES, count(|c| !c.interested_in_categories.is_empty())),
    ]
}

/// Customers, orders and spend per order channel, sorted by channel name.
pub fn channel_distribution(customers: &[CustomerRecord]) -> Vec<ChannelSummary> {
    let mut channels: BTreeMap<String, ChannelSummary> = BTreeMap::new();
    for customer in customers {
        let channel = customer
            .order_channel
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        let summary = channels
            .entry(channel.clone())
            .or_insert_with(|| ChannelSummary {
                channel,
                customers: 0,
                total_orders: 0,
                total_value: 0.0,
            });
        summary.customers += 1;
        summary.total_orders += customer.total_orders();
        summary.total_value += customer.total_value();
    }
    channels.into_values().collect()
}

/// The `n` customers with the highest total spend.
pub fn top_customers_by_value(customers: &[CustomerRecord], n: usize) -> Vec<&CustomerRecord> {
    let mut sorted: Vec<&CustomerRecord> = customers.iter().collect();
    sorted.sort_by(|a, b| b.total_value().total_cmp(&a.total_value()));
    sorted.truncate(n);
    sorted
}

/// The `n` customers with the most orders.
pub fn top_customers_by_orders(customers: &[CustomerRecord], n: usize) -> Vec<&CustomerRecord> {
    let mut sorted: Vec<&CustomerRecord> = customers.iter().collect();
    sorted.sort_by(|a, b| b.total_orders().cmp(&a.total_orders()));
    sorted.truncate(n);
    sorted
}

/// Mean recency, frequency and monetary per segment, ordered by segment label.
pub fn segment_summary(table: &RfmTable) -> Vec<SegmentSummary> {
    let mut totals: BTreeMap<&'static str, (Segment, usize, f64, f64, f64)> = BTreeMap::new();
    for record in table.iter() {
        let entry = totals
            .entry(record.segment.label())
            .or_insert((record.segment, 0, 0.0, 0.0, 0.0));
        entry.1 += 1;
        entry.2 += record.recency as f64;
        entry.3 += f64::from(record.frequency);
        entry.4 += record.monetary;
    }

    totals
        .into_values()
        .map(|(segment, count, recency, frequency, monetary)| {
            let n = count as f64;
            SegmentSummary {
                segment,
                count,
                mean_recency: recency / n,
                mean_frequency: frequency / n,
                mean_monetary: monetary / n,
            }
        })
        .collect()
}

/// Print the dataset overview and descriptive tables to stdout.
pub fn print_dataset_overview(customers: &[CustomerRecord], top_n: usize) {
    println!("=== Dataset Overview ===");
    println!("Customers: {}", customers.len());

    println!("\nMissing values by column:");
    for (column, missing) in missing_value_counts(customers) {
        println!("  {:<36} {}", column, missing);
    }

    println!("\nDistribution by order channel:");
    println!("  {:<16} | {:>9} | {:>12} | {:>14}", "Channel", "Customers", "Orders", "Value");
    for summary in channel_distribution(customers) {
        println!(
            "  {:<16} | {:>9} | {:>12} | {:>14.2}",
            summary.channel, summary.customers, summary.total_orders, summary.total_value
        );
    }

    println!("\nTop {} customers by total value:", top_n);
    for customer in top_customers_by_value(customers, top_n) {
        println!("  {:<40} {:>12.2}", customer.customer_id, customer.total_value());
    }

    println!("\nTop {} customers by total orders:", top_n);
    for customer in top_customers_by_orders(customers, top_n) {
        println!("  {:<40} {:>12}", customer.customer_id, customer.total_orders());
    }
}

/// Print per-segment statistics to stdout.
pub fn print_segment_summary(table: &RfmTable) {
    println!("\n=== Segment Statistics ===");
    println!("Analysis date: {}", table.analysis_date());
    println!(
        "  {:<20} | {:>7} | {:>9} | {:>9} | {:>10}",
        "Segment", "Count", "Recency", "Frequency", "Monetary"
    );
    println!("  {:-<20}-|-{:->7}-|-{:->9}-|-{:->9}-|-{:->10}", "", "", "", "", "");
    for summary in segment_summary(table) {
        let percentage = (summary.count as f64 / table.len() as f64) * 100.0;
        println!(
            "  {:<20} | {:>7} | {:>9.2} | {:>9.2} | {:>10.2}  ({:.1}%)",
            summary.segment.label(),
            summary.count,
            summary.mean_recency,
            summary.mean_frequency,
            summary.mean_monetary,
            percentage
        );
    }
}
