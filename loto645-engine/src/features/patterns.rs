use std::collections::BTreeMap;

use serde::Serialize;

use loto645_db::models::{Draw, LOW_MAX};

use super::round2;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsecutiveStats {
    pub count: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SumStats {
    pub min: u32,
    pub max: u32,
    pub mean: f64,
    pub median: u32,
    pub std_dev: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatternStats {
    pub total_draws: usize,
    /// Clé "impairs:pairs".
    pub odd_even: BTreeMap<String, u32>,
    /// Clé "hauts:bas", bas = 1-22.
    pub high_low: BTreeMap<String, u32>,
    pub consecutive: ConsecutiveStats,
    pub sums: SumStats,
    /// Nombre d'apparitions de chaque somme.
    pub sum_counts: BTreeMap<u32, u32>,
}

impl PatternStats {
    /// Ratios triés par nombre d'apparitions décroissant.
    pub fn sorted_ratios(ratios: &BTreeMap<String, u32>) -> Vec<(String, u32)> {
        let mut sorted: Vec<(String, u32)> = ratios.iter().map(|(k, &v)| (k.clone(), v)).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        sorted
    }

    /// Les `k` sommes les plus fréquentes (à égalité, la plus petite d'abord).
    pub fn top_sums(&self, k: usize) -> Vec<(u32, u32)> {
        let mut sorted: Vec<(u32, u32)> = self.sum_counts.iter().map(|(&s, &c)| (s, c)).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        sorted.truncate(k);
        sorted
    }
}

pub fn odd_even_key(numbers: &[u8]) -> String {
    let odd = numbers.iter().filter(|&&n| n % 2 == 1).count();
    format!("{}:{}", odd, numbers.len() - odd)
}

pub fn high_low_key(numbers: &[u8]) -> String {
    let low = numbers.iter().filter(|&&n| (1..=LOW_MAX).contains(&n)).count();
    format!("{}:{}", numbers.len() - low, low)
}

pub fn has_consecutive(numbers: &[u8]) -> bool {
    let mut sorted = numbers.to_vec();
    sorted.sort();
    sorted.windows(2).any(|w| w[1] == w[0] + 1)
}

/// Médiane basse : pour une longueur paire, l'élément du milieu inférieur.
pub fn sum_stats(sums: &[u32]) -> SumStats {
    if sums.is_empty() {
        return SumStats::default();
    }
    let mut sorted = sums.to_vec();
    sorted.sort();

    let n = sorted.len() as f64;
    let mean = sorted.iter().map(|&s| s as f64).sum::<f64>() / n;
    let variance = sorted
        .iter()
        .map(|&s| (s as f64 - mean).powi(2))
        .sum::<f64>()
        / n;

    SumStats {
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        mean: round2(mean),
        median: sorted[(sorted.len() - 1) / 2],
        std_dev: round2(variance.sqrt()),
    }
}

pub fn compute_patterns(draws: &[Draw]) -> PatternStats {
    let mut stats = PatternStats {
        total_draws: draws.len(),
        ..Default::default()
    };
    let mut sums = Vec::with_capacity(draws.len());

    for draw in draws {
        *stats.odd_even.entry(odd_even_key(&draw.numbers)).or_insert(0) += 1;
        *stats.high_low.entry(high_low_key(&draw.numbers)).or_insert(0) += 1;
        if has_consecutive(&draw.numbers) {
            stats.consecutive.count += 1;
        }
        let sum = draw.sum();
        *stats.sum_counts.entry(sum).or_insert(0) += 1;
        sums.push(sum);
    }

    if !draws.is_empty() {
        stats.consecutive.percentage =
            round2(stats.consecutive.count as f64 / draws.len() as f64 * 100.0);
    }
    stats.sums = sum_stats(&sums);
    stats
}
