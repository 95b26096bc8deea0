use loto645_db::models::{DrawHistory, PICK_COUNT};

use crate::features::round2;

/// Pourcentage des tirages dont les numéros principaux contiennent TOUTE la grille.
pub fn hit_rate(candidate: &[u8], history: &DrawHistory) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let hits = history
        .draws()
        .iter()
        .filter(|draw| candidate.iter().all(|&n| draw.contains(n)))
        .count();
    100.0 * hits as f64 / history.len() as f64
}

pub fn hit_rate_rounded(candidate: &[u8], history: &DrawHistory) -> f64 {
    round2(hit_rate(candidate, history))
}

/// Pour k = 0..=6, nombre de tirages partageant exactement k numéros avec la grille.
pub fn match_distribution(candidate: &[u8], history: &DrawHistory) -> [u32; PICK_COUNT + 1] {
    let mut distribution = [0u32; PICK_COUNT + 1];
    for draw in history.draws() {
        let matched = draw.numbers.iter().filter(|&&n| candidate.contains(&n)).count();
        distribution[matched.min(PICK_COUNT)] += 1;
    }
    distribution
}
