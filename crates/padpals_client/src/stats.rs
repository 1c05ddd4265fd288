//! Cycle statistics: average cycle length, average flow length and the
//! predicted start of the next cycle.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::CycleEntry;

pub const DEFAULT_CYCLE_LENGTH: i64 = 28;
pub const DEFAULT_FLOW_LENGTH: i64 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleStatistics {
    pub average_cycle_length: i64,
    pub average_flow_length: i64,
    pub predicted_next_start: Option<NaiveDate>,
}

impl Default for CycleStatistics {
    fn default() -> Self {
        Self {
            average_cycle_length: DEFAULT_CYCLE_LENGTH,
            average_flow_length: DEFAULT_FLOW_LENGTH,
            predicted_next_start: None,
        }
    }
}

impl CycleStatistics {
    /// Derive statistics from entries in any order.
    pub fn compute(entries: &[CycleEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }

        let mut sorted: Vec<&CycleEntry> = entries.iter().collect();
        sorted.sort_by_key(|e| e.start_date);

        let spans: Vec<i64> = sorted
            .iter()
            .map(|e| days_between(e.start_date, e.end()) + 1)
            .collect();
        let average_flow_length = rounded_mean(&spans).unwrap_or(DEFAULT_FLOW_LENGTH);

        let gaps: Vec<i64> = sorted
            .windows(2)
            .map(|pair| days_between(pair[0].start_date, pair[1].start_date))
            .collect();
        let average_cycle_length = rounded_mean(&gaps).unwrap_or(DEFAULT_CYCLE_LENGTH);

        let predicted_next_start = sorted
            .last()
            .and_then(|e| e.start_date.checked_add_signed(Duration::days(average_cycle_length)));

        Self {
            average_cycle_length,
            average_flow_length,
            predicted_next_start,
        }
    }

    /// Inclusive range of days the next period is expected to cover.
    pub fn predicted_window(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.predicted_next_start?;
        let end = start.checked_add_signed(Duration::days(self.average_flow_length - 1))?;
        Some((start, end))
    }
}

/// Absolute distance between two calendar days.
fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b - a).num_days().abs()
}

/// Mean of non-negative day counts, rounded half-up. `None` for no values.
fn rounded_mean(values: &[i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as i64;
    let sum: i64 = values.iter().sum();
    Some((2 * sum + n) / (2 * n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Flow;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn entry(start: &str, end: Option<&str>) -> CycleEntry {
        CycleEntry::new(date(start), end.map(date), Flow::Medium)
    }

    #[test]
    fn empty_collection_uses_defaults() {
        let stats = CycleStatistics::compute(&[]);
        assert_eq!(stats.average_cycle_length, 28);
        assert_eq!(stats.average_flow_length, 5);
        assert_eq!(stats.predicted_next_start, None);
        assert_eq!(stats.predicted_window(), None);
    }

    #[test]
    fn single_entry_predicts_default_cycle() {
        let stats = CycleStatistics::compute(&[entry("2025-01-05", Some("2025-01-10"))]);
        assert_eq!(stats.average_flow_length, 6);
        assert_eq!(stats.average_cycle_length, 28);
        assert_eq!(stats.predicted_next_start, Some(date("2025-02-02")));
    }

    #[test]
    fn two_entries_average_their_gap() {
        let stats = CycleStatistics::compute(&[
            entry("2025-01-05", Some("2025-01-10")),
            entry("2025-02-02", Some("2025-02-07")),
        ]);
        assert_eq!(stats.average_cycle_length, 28);
        assert_eq!(stats.average_flow_length, 6);
        assert_eq!(stats.predicted_next_start, Some(date("2025-03-02")));
        assert_eq!(
            stats.predicted_window(),
            Some((date("2025-03-02"), date("2025-03-07")))
        );
    }

    #[test]
    fn input_order_does_not_matter() {
        let forward = vec![
            entry("2025-01-01", Some("2025-01-04")),
            entry("2025-01-28", Some("2025-02-02")),
            entry("2025-02-25", None),
        ];
        let mut backward = forward.clone();
        backward.reverse();
        assert_eq!(
            CycleStatistics::compute(&forward),
            CycleStatistics::compute(&backward)
        );
    }

    #[test]
    fn gaps_of_27_28_30_round_to_28() {
        let stats = CycleStatistics::compute(&[
            entry("2025-01-01", None),
            entry("2025-01-28", None),
            entry("2025-02-25", None),
            entry("2025-03-27", None),
        ]);
        assert_eq!(stats.average_cycle_length, 28);
        assert_eq!(stats.average_flow_length, 1);
        assert_eq!(stats.predicted_next_start, Some(date("2025-04-24")));
    }

    #[test]
    fn half_rounds_up() {
        assert_eq!(rounded_mean(&[28, 29]), Some(29));
        assert_eq!(rounded_mean(&[5, 6, 6]), Some(6));
        assert_eq!(rounded_mean(&[]), None);
    }

    #[test]
    fn gap_crosses_month_lengths_by_raw_days() {
        let stats = CycleStatistics::compute(&[
            entry("2025-01-31", None),
            entry("2025-02-28", None),
        ]);
        assert_eq!(stats.average_cycle_length, 28);
    }

    #[test]
    fn compute_is_repeatable() {
        let entries = vec![entry("2025-01-05", Some("2025-01-10"))];
        assert_eq!(
            CycleStatistics::compute(&entries),
            CycleStatistics::compute(&entries)
        );
    }
}
