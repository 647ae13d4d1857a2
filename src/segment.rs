//! Segment classification from recency and frequency scores
//!
//! The classifier walks an ordered rule table and returns the first rule whose
//! recency and frequency ranges both contain the customer's scores.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RfmError, RfmResult};
use crate::model::{Score, ScoreCard};

/// Behavioural segment assigned from the RF code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Hibernating,
    AtRisk,
    CantLoose,
    AboutToSleep,
    NeedAttention,
    LoyalCustomers,
    Promising,
    NewCustomers,
    PotentialLoyalists,
    Champions,
}

impl Segment {
    pub const ALL: [Segment; 10] = [
        Segment::Hibernating,
        Segment::AtRisk,
        Segment::CantLoose,
        Segment::AboutToSleep,
        Segment::NeedAttention,
        Segment::LoyalCustomers,
        Segment::Promising,
        Segment::NewCustomers,
        Segment::PotentialLoyalists,
        Segment::Champions,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Segment::Hibernating => "hibernating",
            Segment::AtRisk => "at_risk",
            Segment::CantLoose => "cant_loose",
            Segment::AboutToSleep => "about_to_sleep",
            Segment::NeedAttention => "need_attention",
            Segment::LoyalCustomers => "loyal_customers",
            Segment::Promising => "promising",
            Segment::NewCustomers => "new_customers",
            Segment::PotentialLoyalists => "potential_loyalists",
            Segment::Champions => "champions",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Segment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Segment::ALL
            .into_iter()
            .find(|segment| segment.label() == wanted)
            .ok_or_else(|| anyhow::anyhow!("Unknown segment: {}", s))
    }
}

/// One row of the classification table.
#[derive(Clone, Debug)]
pub struct SegmentRule {
    pub recency: RangeInclusive<u8>,
    pub frequency: RangeInclusive<u8>,
    pub segment: Segment,
}

impl SegmentRule {
    pub fn matches(&self, recency: Score, frequency: Score) -> bool {
        self.recency.contains(&recency.value()) && self.frequency.contains(&frequency.value())
    }
}

/// Rules in priority order; the first match wins.
pub static SEGMENT_RULES: [SegmentRule; 10] = [
    SegmentRule { recency: 1..=2, frequency: 1..=2, segment: Segment::Hibernating },
    SegmentRule { recency: 1..=2, frequency: 3..=4, segment: Segment::AtRisk },
    SegmentRule { recency: 1..=2, frequency: 5..=5, segment: Segment::CantLoose },
    SegmentRule { recency: 3..=3, frequency: 1..=2, segment: Segment::AboutToSleep },
    SegmentRule { recency: 3..=3, frequency: 3..=3, segment: Segment::NeedAttention },
    SegmentRule { recency: 3..=4, frequency: 4..=5, segment: Segment::LoyalCustomers },
    SegmentRule { recency: 4..=4, frequency: 1..=1, segment: Segment::Promising },
    SegmentRule { recency: 5..=5, frequency: 1..=1, segment: Segment::NewCustomers },
    SegmentRule { recency: 4..=5, frequency: 2..=3, segment: Segment::PotentialLoyalists },
    SegmentRule { recency: 5..=5, frequency: 4..=5, segment: Segment::Champions },
];

/// Classify a recency/frequency score pair.
pub fn classify(recency: Score, frequency: Score) -> RfmResult<Segment> {
    SEGMENT_RULES
        .iter()
        .find(|rule| rule.matches(recency, frequency))
        .map(|rule| rule.segment)
        .ok_or_else(|| RfmError::UnmappedSegment {
            code: format!("{}{}", recency, frequency),
        })
}

/// Classify every score card, keeping input order.
pub fn classify_all(cards: &[ScoreCard]) -> RfmResult<Vec<Segment>> {
    cards
        .iter()
        .map(|card| classify(card.recency, card.frequency))
        .collect()
}
