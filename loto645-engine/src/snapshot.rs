use std::sync::Arc;

use arc_swap::ArcSwap;
use rand::Rng;
use serde::Serialize;

use loto645_db::models::{DrawHistory, NumberCount};

use crate::config::EngineConfig;
use crate::features::{analyze, FeatureSet, PairCount};
use crate::generator::{generate_exact_sum, generate_in_range, sum_recommendations, GenerationOutcome, SumRecommendations};
use crate::hit_rate::hit_rate_rounded;
use crate::recommend::{Recommendations, Recommender};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecommendationHitRates {
    pub pattern: f64,
    pub co_occurrence: f64,
    pub hot: f64,
    pub overdue: f64,
    pub integrated: f64,
}

/// Résultat complet d'une passe d'analyse. Jamais modifié une fois construit.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisSnapshot {
    pub built_at: String,
    pub total_draws: usize,
    pub skipped_records: usize,
    pub latest_index: u32,
    pub features: FeatureSet,
    pub recommendations: Recommendations,
    pub hit_rates: RecommendationHitRates,
}

impl AnalysisSnapshot {
    pub fn hot_numbers(&self, k: usize) -> Vec<NumberCount> {
        self.features.frequency.hot(k)
    }

    pub fn cold_numbers(&self, k: usize) -> Vec<NumberCount> {
        self.features.frequency.cold(k)
    }

    pub fn hot_bonus(&self, k: usize) -> Vec<NumberCount> {
        self.features.bonus_frequency.hot(k)
    }

    pub fn cold_bonus(&self, k: usize) -> Vec<NumberCount> {
        self.features.bonus_frequency.cold(k)
    }

    pub fn top_pairs(&self, k: usize) -> Vec<PairCount> {
        self.features.pairs.top_pairs(k)
    }

    pub fn generate_exact_sum<R: Rng + ?Sized>(&self, target: u32, config: &EngineConfig, rng: &mut R) -> GenerationOutcome {
        generate_exact_sum(target, config.exact_sum_attempts, rng)
    }

    pub fn generate_in_range<R: Rng + ?Sized>(
        &self,
        min_sum: u32,
        max_sum: u32,
        config: &EngineConfig,
        rng: &mut R,
    ) -> GenerationOutcome {
        generate_in_range(min_sum, max_sum, &self.features.frequency, config.range_attempts, rng)
    }

    pub fn sum_recommendations<R: Rng + ?Sized>(&self, config: &EngineConfig, rng: &mut R) -> SumRecommendations {
        sum_recommendations(&self.features, config, rng)
    }
}

/// Une passe complète : caractéristiques, recommandations, taux de réussite.
pub fn run_analysis(history: &DrawHistory, config: &EngineConfig) -> AnalysisSnapshot {
    let features = analyze(history, config.moving_average_window, config.sample_stride);
    let recommendations =
        Recommender::new(&config.weights, &config.pattern, config.centrality_pairs).recommend(&features);

    let hit_rates = RecommendationHitRates {
        pattern: hit_rate_rounded(&recommendations.pattern, history),
        co_occurrence: hit_rate_rounded(&recommendations.co_occurrence, history),
        hot: hit_rate_rounded(&recommendations.hot, history),
        overdue: hit_rate_rounded(&recommendations.overdue, history),
        integrated: hit_rate_rounded(&recommendations.integrated, history),
    };

    log::info!(
        "Analyse terminée : {} tirages ({} ignorés), dernier tirage {}",
        history.len(),
        history.skipped(),
        history.latest_index()
    );

    AnalysisSnapshot {
        built_at: chrono::Local::now().to_rfc3339(),
        total_draws: history.len(),
        skipped_records: history.skipped(),
        latest_index: history.latest_index(),
        features,
        recommendations,
        hit_rates,
    }
}

/// Instantané publié. Les lecteurs obtiennent un `Arc` et ne voient jamais de table à moitié reconstruite.
pub struct SnapshotStore {
    current: ArcSwap<AnalysisSnapshot>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(AnalysisSnapshot::default())
    }
}

impl SnapshotStore {
    pub fn new(snapshot: AnalysisSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(snapshot),
        }
    }

    pub fn current(&self) -> Arc<AnalysisSnapshot> {
        self.current.load_full()
    }

    pub fn publish(&self, snapshot: AnalysisSnapshot) {
        self.current.store(Arc::new(snapshot));
    }

    /// Reconstruit tout depuis l'historique puis publie d'un seul échange.
    pub fn refresh(&self, history: &DrawHistory, config: &EngineConfig) -> Arc<AnalysisSnapshot> {
        let snapshot = Arc::new(run_analysis(history, config));
        self.current.store(Arc::clone(&snapshot));
        snapshot
    }
}
