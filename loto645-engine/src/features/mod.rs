pub mod frequency;
pub mod pairs;
pub mod patterns;
pub mod timeseries;

use serde::Serialize;

use loto645_db::models::DrawHistory;

pub use frequency::{FrequencyTable, OverdueTable};
pub use pairs::{PairCoOccurrence, PairCount};
pub use patterns::{ConsecutiveStats, PatternStats, SumStats};
pub use timeseries::TimeSeriesPoint;

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Toutes les caractéristiques dérivées d'un historique, calculées en une passe.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeatureSet {
    pub frequency: FrequencyTable,
    pub bonus_frequency: FrequencyTable,
    pub overdue: OverdueTable,
    pub patterns: PatternStats,
    #[serde(skip)]
    pub pairs: PairCoOccurrence,
    pub time_series: Vec<TimeSeriesPoint>,
}

pub fn analyze(history: &DrawHistory, window: usize, stride: usize) -> FeatureSet {
    let draws = history.draws();
    FeatureSet {
        frequency: frequency::count_main(draws),
        bonus_frequency: frequency::count_bonus(draws),
        overdue: frequency::last_seen(draws),
        patterns: patterns::compute_patterns(draws),
        pairs: PairCoOccurrence::from_draws(draws),
        time_series: timeseries::sum_series(draws, window, stride),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loto645_db::models::make_test_draws;

    #[test]
    fn test_analyze_consistency() {
        let history = DrawHistory::from_draws(make_test_draws(60));
        let features = analyze(&history, 52, 10);
        assert_eq!(features.frequency.total(), 6 * 60);
        assert_eq!(features.pairs.total(), 15 * 60);
        assert_eq!(features.patterns.total_draws, 60);
        assert_eq!(features.time_series.len(), 6);
        assert_eq!(features.overdue.latest_index(), 60);
        assert_eq!(features.bonus_frequency.total(), 60);
    }

    #[test]
    fn test_analyze_empty_history() {
        let features = analyze(&DrawHistory::default(), 52, 10);
        assert_eq!(features.frequency.total(), 0);
        assert!(features.pairs.is_empty());
        assert!(features.time_series.is_empty());
        assert_eq!(features.patterns.sums.mean, 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.235_1), 1.24);
    }
}
