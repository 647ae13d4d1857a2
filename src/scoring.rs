//! Quantile scoring of RFM metrics
//!
//! Each metric is ranked over the full population with ties broken by input
//! order, then the ranks are cut into equal-count bins. Ranking first keeps the
//! bin edges distinct even when raw values repeat heavily (order counts
//! cluster at small integers).

use std::cmp::Ordering;

use crate::error::{RfmError, RfmResult};
use crate::model::{CustomerMetrics, Metric, Score, ScoreCard};

/// Number of quantile bins, and therefore the highest score.
pub const SCORE_BINS: usize = 5;

/// Whether a larger raw value earns a larger score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

impl Metric {
    /// More recent (smaller recency) is better; more orders and spend are better.
    pub fn direction(&self) -> Direction {
        match self {
            Metric::Recency => Direction::LowerIsBetter,
            Metric::Frequency | Metric::Monetary => Direction::HigherIsBetter,
        }
    }
}

/// 1-based ranks in ascending value order. Equal values are ranked by their
/// position in `values`.
pub fn stable_ranks(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| compare(values[a], values[b]));

    let mut ranks = vec![0; values.len()];
    for (position, &index) in order.iter().enumerate() {
        ranks[index] = position + 1;
    }
    ranks
}

fn compare(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

/// Bin of a 1-based rank among `population` distinct ranks.
///
/// Bin edges sit at the linear-interpolated quantiles `1 + k * (n - 1) / bins`
/// and each bin is closed on the right, with the lowest rank in bin 1.
fn quantile_bin(rank: usize, population: usize, bins: usize) -> usize {
    let span = population - 1;
    let bin = (bins * (rank - 1) + span - 1) / span;
    bin.max(1)
}

/// Score one metric across the whole population.
pub fn score_metric(metric: Metric, values: &[f64]) -> RfmResult<Vec<Score>> {
    let population = values.len();
    if population < SCORE_BINS {
        return Err(RfmError::DegenerateDistribution {
            metric,
            population,
            bins: SCORE_BINS,
        });
    }

    stable_ranks(values)
        .into_iter()
        .map(|rank| {
            let bin = quantile_bin(rank, population, SCORE_BINS);
            let score = match metric.direction() {
                Direction::HigherIsBetter => bin,
                Direction::LowerIsBetter => SCORE_BINS + 1 - bin,
            };
            Score::new(score as u8).ok_or(RfmError::DegenerateDistribution {
                metric,
                population,
                bins: SCORE_BINS,
            })
        })
        .collect()
}

/// Score all three metrics; the result is aligned with `metrics`.
pub fn score_population(metrics: &[CustomerMetrics]) -> RfmResult<Vec<ScoreCard>> {
    let recency: Vec<f64> = metrics.iter().map(|m| m.recency as f64).collect();
    let frequency: Vec<f64> = metrics.iter().map(|m| f64::from(m.frequency)).collect();
    let monetary: Vec<f64> = metrics.iter().map(|m| m.monetary).collect();

    let recency = score_metric(Metric::Recency, &recency)?;
    let frequency = score_metric(Metric::Frequency, &frequency)?;
    let monetary = score_metric(Metric::Monetary, &monetary)?;

    Ok(recency
        .into_iter()
        .zip(frequency)
        .zip(monetary)
        .map(|((recency, frequency), monetary)| ScoreCard {
            recency,
            frequency,
            monetary,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(scores: &[Score]) -> [usize; SCORE_BINS] {
        let mut counts = [0; SCORE_BINS];
        for score in scores {
            counts[score.value() as usize - 1] += 1;
        }
        counts
    }

    #[test]
    fn test_stable_ranks_break_ties_by_position() {
        let ranks = stable_ranks(&[3.0, 1.0, 3.0, 2.0, 1.0]);
        assert_eq!(ranks, vec![4, 1, 5, 3, 2]);
    }

    #[test]
    fn test_equal_bins_when_population_divisible_by_five() {
        for population in [5, 10, 25, 100] {
            let values: Vec<f64> = (0..population).map(|i| ((i * 7) % 13) as f64).collect();
            for metric in [Metric::Recency, Metric::Frequency, Metric::Monetary] {
                let scores = score_metric(metric, &values).unwrap();
                assert_eq!(counts(&scores), [population / 5; SCORE_BINS]);
            }
        }
    }

    #[test]
    fn test_uneven_population_stays_within_one_of_share() {
        for population in 5..60 {
            let values: Vec<f64> = (0..population).map(|i| i as f64).collect();
            let scores = score_metric(Metric::Monetary, &values).unwrap();
            let share = population / SCORE_BINS;
            for count in counts(&scores) {
                assert!(
                    count == share || count == share + 1,
                    "population {} produced bin of {}",
                    population,
                    count
                );
            }
        }
    }

    #[test]
    fn test_recency_is_inverted() {
        let values = [40.0, 5.0, 300.0, 120.0, 60.0, 10.0];
        let scores = score_metric(Metric::Recency, &values).unwrap();
        assert_eq!(scores[1], Score::MAX);
        assert_eq!(scores[2], Score::MIN);
    }

    #[test]
    fn test_frequency_and_monetary_are_monotonic() {
        let values = [4.0, 1.0, 20.0, 2.0, 7.0, 3.0, 3.0];
        for metric in [Metric::Frequency, Metric::Monetary] {
            let scores = score_metric(metric, &values).unwrap();
            assert_eq!(scores[2], Score::MAX);
            assert_eq!(scores[1], Score::MIN);
            let mut by_value: Vec<(f64, Score)> = values.iter().copied().zip(scores).collect();
            by_value.sort_by(|a, b| a.0.total_cmp(&b.0));
            assert!(by_value.windows(2).all(|w| w[0].1 <= w[1].1));
        }
    }

    #[test]
    fn test_tied_values_on_a_boundary_get_different_scores() {
        // Ranks 2 and 3 fall on either side of a bin edge for five customers.
        let values = [1.0, 2.0, 2.0, 5.0, 9.0];
        let scores = score_metric(Metric::Frequency, &values).unwrap();
        assert_eq!(scores[1].value(), 2);
        assert_eq!(scores[2].value(), 3);
    }

    #[test]
    fn test_all_equal_values_still_spread() {
        let scores = score_metric(Metric::Frequency, &[1.0; 10]).unwrap();
        assert_eq!(counts(&scores), [2; SCORE_BINS]);
        assert_eq!(scores[0], Score::MIN);
        assert_eq!(scores[9], Score::MAX);
    }

    #[test]
    fn test_small_population_is_degenerate() {
        let err = score_metric(Metric::Monetary, &[1.0, 2.0, 3.0, 4.0]).unwrap_err();
        assert_eq!(
            err,
            RfmError::DegenerateDistribution {
                metric: Metric::Monetary,
                population: 4,
                bins: SCORE_BINS,
            }
        );
        assert!(score_population(&[]).is_err());
    }

    #[test]
    fn test_score_population_aligns_cards() {
        let metrics: Vec<CustomerMetrics> = (0..5)
            .map(|i| CustomerMetrics {
                customer_id: format!("c{}", i),
                recency: 10 * (i + 1),
                frequency: (i + 1) as u32,
                monetary: 100.0 * (i + 1) as f64,
            })
            .collect();
        let cards = score_population(&metrics).unwrap();

        assert_eq!(cards.len(), 5);
        assert_eq!(cards[0].recency, Score::MAX);
        assert_eq!(cards[0].frequency, Score::MIN);
        assert_eq!(cards[4].recency, Score::MIN);
        assert_eq!(cards[4].monetary, Score::MAX);
    }
}
