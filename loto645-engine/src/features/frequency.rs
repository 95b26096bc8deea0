use serde::Serialize;

use loto645_db::models::{Draw, NumberCount, POOL_SIZE};

/// Compteur par numéro 1..=45. Les 45 numéros sont toujours présents, même à 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyTable {
    counts: Vec<u32>,
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self {
            counts: vec![0; POOL_SIZE as usize],
        }
    }

    fn increment(&mut self, number: u8) {
        if let Some(c) = number.checked_sub(1).and_then(|i| self.counts.get_mut(i as usize)) {
            *c += 1;
        }
    }

    pub fn get(&self, number: u8) -> u32 {
        number
            .checked_sub(1)
            .and_then(|i| self.counts.get(i as usize))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.counts.iter().enumerate().map(|(i, &c)| ((i + 1) as u8, c))
    }

    pub fn scores(&self) -> Vec<f64> {
        self.counts.iter().map(|&c| c as f64).collect()
    }

    /// Les `k` numéros les plus fréquents (à égalité, le plus petit numéro d'abord).
    pub fn hot(&self, k: usize) -> Vec<NumberCount> {
        let mut sorted: Vec<NumberCount> = self
            .iter()
            .map(|(number, count)| NumberCount { number, count })
            .collect();
        sorted.sort_by(|a, b| b.count.cmp(&a.count).then(a.number.cmp(&b.number)));
        sorted.truncate(k);
        sorted
    }

    /// Les `k` numéros les moins fréquents, du plus rare au moins rare.
    pub fn cold(&self, k: usize) -> Vec<NumberCount> {
        let mut sorted: Vec<NumberCount> = self
            .iter()
            .map(|(number, count)| NumberCount { number, count })
            .collect();
        sorted.sort_by(|a, b| a.count.cmp(&b.count).then(a.number.cmp(&b.number)));
        sorted.truncate(k);
        sorted
    }

    pub fn unappeared(&self) -> Vec<u8> {
        self.iter().filter(|&(_, c)| c == 0).map(|(n, _)| n).collect()
    }
}

/// Dernier indice de tirage où chaque numéro est apparu (principal ou bonus), 0 si jamais.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverdueTable {
    last_seen: Vec<u32>,
    latest_index: u32,
}

impl Default for OverdueTable {
    fn default() -> Self {
        Self {
            last_seen: vec![0; POOL_SIZE as usize],
            latest_index: 0,
        }
    }
}

impl OverdueTable {
    pub fn last_seen(&self, number: u8) -> u32 {
        number
            .checked_sub(1)
            .and_then(|i| self.last_seen.get(i as usize))
            .copied()
            .unwrap_or(0)
    }

    pub fn latest_index(&self) -> u32 {
        self.latest_index
    }

    /// Retard = dernier indice − indice de dernière apparition.
    pub fn gap(&self, number: u8) -> u32 {
        self.latest_index.saturating_sub(self.last_seen(number))
    }

    pub fn scores(&self) -> Vec<f64> {
        (1..=POOL_SIZE).map(|n| self.gap(n) as f64).collect()
    }
}

pub fn count_main(draws: &[Draw]) -> FrequencyTable {
    let mut table = FrequencyTable::new();
    for draw in draws {
        for &n in &draw.numbers {
            table.increment(n);
        }
    }
    table
}

pub fn count_bonus(draws: &[Draw]) -> FrequencyTable {
    let mut table = FrequencyTable::new();
    for bonus in draws.iter().filter_map(|d| d.bonus) {
        table.increment(bonus);
    }
    table
}

/// `draws` doit être trié par indice croissant.
pub fn last_seen(draws: &[Draw]) -> OverdueTable {
    let mut table = OverdueTable::default();
    for draw in draws {
        for n in draw.seen_numbers() {
            if let Some(slot) = n.checked_sub(1).and_then(|i| table.last_seen.get_mut(i as usize)) {
                *slot = draw.draw_index;
            }
        }
        table.latest_index = draw.draw_index;
    }
    table
}
