//! RFM records and the table produced by a segmentation run

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

use crate::segment::Segment;

/// The three behavioural metrics scored by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    Recency,
    Frequency,
    Monetary,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Recency => "recency",
            Metric::Frequency => "frequency",
            Metric::Monetary => "monetary",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordinal quantile score, always within `1..=5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(u8);

impl Score {
    pub const MIN: Score = Score(1);
    pub const MAX: Score = Score(5);

    /// Returns `None` outside `1..=5`.
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN.0..=Self::MAX.0)
            .contains(&value)
            .then_some(Score(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw metrics of one customer before scoring.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomerMetrics {
    pub customer_id: String,
    /// Days between the analysis date and the last purchase
    pub recency: i64,
    /// Online + offline order count
    pub frequency: u32,
    /// Online + offline spend
    pub monetary: f64,
}

/// Scores of one customer, one per metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreCard {
    pub recency: Score,
    pub frequency: Score,
    pub monetary: Score,
}

impl ScoreCard {
    /// Recency digit followed by frequency digit, e.g. `"51"`.
    pub fn rf_code(&self) -> String {
        format!("{}{}", self.recency, self.frequency)
    }

    /// Recency, frequency and monetary digits, e.g. `"514"`.
    pub fn rfm_code(&self) -> String {
        format!("{}{}{}", self.recency, self.frequency, self.monetary)
    }
}

/// Fully scored and classified customer.
#[derive(Clone, Debug, PartialEq)]
pub struct RfmRecord {
    pub customer_id: String,
    pub recency: i64,
    pub frequency: u32,
    pub monetary: f64,
    pub scores: ScoreCard,
    pub rf_code: String,
    pub rfm_code: String,
    pub segment: Segment,
}

/// Result of one run over a full customer population, in input order.
#[derive(Clone, Debug, PartialEq)]
pub struct RfmTable {
    analysis_date: NaiveDate,
    records: Vec<RfmRecord>,
}

impl RfmTable {
    pub fn new(analysis_date: NaiveDate, records: Vec<RfmRecord>) -> Self {
        Self {
            analysis_date,
            records,
        }
    }

    pub fn analysis_date(&self) -> NaiveDate {
        self.analysis_date
    }

    pub fn records(&self) -> &[RfmRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RfmRecord> {
        self.records.iter()
    }

    pub fn get(&self, customer_id: &str) -> Option<&RfmRecord> {
        self.records.iter().find(|r| r.customer_id == customer_id)
    }

    /// Records whose segment is one of `segments`, in table order.
    pub fn in_segments<'a>(
        &'a self,
        segments: &'a [Segment],
    ) -> impl Iterator<Item = &'a RfmRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| segments.contains(&r.segment))
    }

    /// Number of customers per segment. Segments without members are omitted.
    pub fn segment_counts(&self) -> BTreeMap<Segment, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.segment).or_insert(0) += 1;
        }
        counts
    }
}
