use std::collections::BTreeMap;

use serde::Serialize;

use loto645_db::models::Draw;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PairCount {
    pub first: u8,
    pub second: u8,
    pub count: u32,
}

/// Co-apparitions de paires non ordonnées (a < b) dans les numéros principaux.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairCoOccurrence {
    counts: BTreeMap<(u8, u8), u32>,
}

impl PairCoOccurrence {
    pub fn from_draws(draws: &[Draw]) -> Self {
        let mut counts = BTreeMap::new();
        for draw in draws {
            let sorted = draw.sorted_numbers();
            for i in 0..sorted.len() {
                for j in (i + 1)..sorted.len() {
                    *counts.entry((sorted[i], sorted[j])).or_insert(0) += 1;
                }
            }
        }
        Self { counts }
    }

    pub fn get(&self, a: u8, b: u8) -> u32 {
        let key = if a < b { (a, b) } else { (b, a) };
        self.counts.get(&key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Les `k` paires les plus fréquentes ; à égalité, ordre croissant de (a, b).
    pub fn top_pairs(&self, k: usize) -> Vec<PairCount> {
        let mut sorted: Vec<PairCount> = self
            .counts
            .iter()
            .map(|(&(first, second), &count)| PairCount { first, second, count })
            .collect();
        // BTreeMap déjà trié par paire, un tri stable suffit
        sorted.sort_by(|a, b| b.count.cmp(&a.count));
        sorted.truncate(k);
        sorted
    }
}
