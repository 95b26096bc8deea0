use serde::Serialize;

use loto645_db::models::{PICK_COUNT, POOL_SIZE};

use crate::config::{PatternPolicy, ScoreWeights};
use crate::features::{FeatureSet, FrequencyTable, OverdueTable, PairCoOccurrence};
use crate::normalize::normalize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recommendations {
    pub pattern: Vec<u8>,
    pub co_occurrence: Vec<u8>,
    pub hot: Vec<u8>,
    pub overdue: Vec<u8>,
    pub integrated: Vec<u8>,
    /// Score intégré par numéro, index 0 = numéro 1.
    pub scores: Vec<f64>,
}

/// Les `k` numéros de plus haut score (à égalité, le plus petit numéro), rendus triés.
/// `scores[i]` est le score du numéro `i + 1`.
pub fn top_numbers(scores: &[f64], k: usize) -> Vec<u8> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    let mut top: Vec<u8> = indices.iter().take(k).map(|&i| (i + 1) as u8).collect();
    top.sort();
    top
}

/// Numéros les plus « centraux » parmi les `top_pairs` paires les plus fréquentes.
/// Seuls les numéros présents dans ces paires sont éligibles.
pub fn co_occurrence_set(pairs: &PairCoOccurrence, top_pairs: usize) -> Vec<u8> {
    let mut centrality = vec![0u64; POOL_SIZE as usize];
    for pair in pairs.top_pairs(top_pairs) {
        centrality[(pair.first - 1) as usize] += pair.count as u64;
        centrality[(pair.second - 1) as usize] += pair.count as u64;
    }

    let mut ranked: Vec<(u8, u64)> = centrality
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c > 0)
        .map(|(i, &c)| ((i + 1) as u8, c))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut selected: Vec<u8> = ranked.iter().take(PICK_COUNT).map(|&(n, _)| n).collect();
    selected.sort();
    selected
}

/// score(n) = w_f·freq_norm + w_o·retard_norm + w_p·[n ∈ motif] + w_c·[n ∈ co-apparition]
pub fn integrated_scores(
    frequency: &FrequencyTable,
    overdue: &OverdueTable,
    pattern: &[u8],
    co_occurrence: &[u8],
    weights: &ScoreWeights,
) -> Vec<f64> {
    let freq_norm = normalize(&frequency.scores());
    let overdue_norm = normalize(&overdue.scores());

    (1..=POOL_SIZE)
        .map(|n| {
            let i = (n - 1) as usize;
            let mut score = weights.frequency * freq_norm[i] + weights.overdue * overdue_norm[i];
            if pattern.contains(&n) {
                score += weights.pattern;
            }
            if co_occurrence.contains(&n) {
                score += weights.co_occurrence;
            }
            score
        })
        .collect()
}

pub struct Recommender<'a> {
    weights: &'a ScoreWeights,
    pattern: &'a PatternPolicy,
    centrality_pairs: usize,
}

impl<'a> Recommender<'a> {
    pub fn new(weights: &'a ScoreWeights, pattern: &'a PatternPolicy, centrality_pairs: usize) -> Self {
        Self {
            weights,
            pattern,
            centrality_pairs,
        }
    }

    pub fn recommend(&self, features: &FeatureSet) -> Recommendations {
        let mut pattern = self.pattern.numbers.to_vec();
        pattern.sort();
        let co_occurrence = co_occurrence_set(&features.pairs, self.centrality_pairs);

        let scores = integrated_scores(
            &features.frequency,
            &features.overdue,
            &pattern,
            &co_occurrence,
            self.weights,
        );
        let integrated = top_numbers(&scores, PICK_COUNT);

        log::debug!("Recommandation intégrée : {:?}", integrated);

        Recommendations {
            hot: top_numbers(&features.frequency.scores(), PICK_COUNT),
            overdue: top_numbers(&features.overdue.scores(), PICK_COUNT),
            pattern,
            co_occurrence,
            integrated,
            scores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::features::analyze;
    use loto645_db::models::{make_test_draws, Draw, DrawHistory};

    fn draw(index: u32, numbers: [u8; 6], bonus: Option<u8>) -> Draw {
        Draw {
            draw_index: index,
            date: String::new(),
            numbers,
            bonus,
        }
    }

    fn recommend(history: &DrawHistory) -> Recommendations {
        let config = EngineConfig::default();
        let features = analyze(history, config.moving_average_window, config.sample_stride);
        Recommender::new(&config.weights, &config.pattern, config.centrality_pairs).recommend(&features)
    }

    #[test]
    fn test_top_numbers_tie_break() {
        let mut scores = vec![0.0; 45];
        scores[9] = 1.0;
        scores[4] = 0.5;
        scores[2] = 0.5;
        assert_eq!(top_numbers(&scores, 3), vec![3, 5, 10]);
        // à égalité parfaite : les plus petits numéros
        assert_eq!(top_numbers(&vec![0.0; 45], 6), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_integrated_is_six_sorted_distinct() {
        let history = DrawHistory::from_draws(make_test_draws(80));
        let recs = recommend(&history);
        assert_eq!(recs.integrated.len(), 6);
        assert!(recs.integrated.windows(2).all(|w| w[0] < w[1]));
        assert!(recs.integrated.iter().all(|&n| (1..=45).contains(&n)));
        assert_eq!(recs.scores.len(), 45);
    }

    #[test]
    fn test_scores_bounded() {
        let history = DrawHistory::from_draws(make_test_draws(80));
        let recs = recommend(&history);
        let max_score = ScoreWeights::default().total();
        for &s in &recs.scores {
            assert!(s >= 0.0 && s <= max_score + 1e-12, "score hors bornes: {}", s);
        }
    }

    #[test]
    fn test_empty_history_falls_back_to_pattern() {
        let recs = recommend(&DrawHistory::default());
        assert_eq!(recs.integrated, vec![12, 13, 17, 28, 33, 40]);
        assert!(recs.co_occurrence.is_empty());
    }

    #[test]
    fn test_co_occurrence_centrality() {
        let draws = vec![
            draw(1, [1, 2, 3, 4, 5, 6], None),
            draw(2, [1, 2, 3, 4, 5, 7], None),
            draw(3, [1, 2, 3, 4, 8, 9], None),
        ];
        let pairs = PairCoOccurrence::from_draws(&draws);
        // paires entre 1..4 : 3 fois chacune, 5 apparaît deux fois avec 1..4
        assert_eq!(co_occurrence_set(&pairs, 50), vec![1, 2, 3, 4, 5, 6]);
        // avec les 6 seules paires les plus fréquentes : uniquement 1..4
        assert_eq!(co_occurrence_set(&pairs, 6), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_frequency_dominates_integrated() {
        let mut draws = Vec::new();
        for i in 0..20 {
            draws.push(draw(i + 1, [1, 2, 3, 4, 5, 6], None));
        }
        let history = DrawHistory::from_draws(draws);
        let recs = recommend(&history);
        assert_eq!(recs.hot, vec![1, 2, 3, 4, 5, 6]);
        // 1..6 : 0.4 (fréquence) + 0.1 (co-apparition) = 0.5
        // les autres : 0.3 (retard maximal) + éventuellement 0.1 (motif)
        assert_eq!(recs.integrated, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(recs.overdue, vec![7, 8, 9, 10, 11, 12]);
    }
}
