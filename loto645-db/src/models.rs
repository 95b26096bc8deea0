use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

/// Plus grand numéro tirable.
pub const POOL_SIZE: u8 = 45;
/// Nombre de numéros principaux par tirage.
pub const PICK_COUNT: usize = 6;
/// Borne haute de la moitié « basse » (1-22).
pub const LOW_MAX: u8 = 22;
/// Plus petite somme possible : 1+2+3+4+5+6.
pub const MIN_SUM: u32 = 21;
/// Plus grande somme possible : 40+41+42+43+44+45.
pub const MAX_SUM: u32 = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Draw {
    pub draw_index: u32,
    pub date: String,
    pub numbers: [u8; 6],
    pub bonus: Option<u8>,
}

impl Draw {
    pub fn sum(&self) -> u32 {
        self.numbers.iter().map(|&n| n as u32).sum()
    }

    pub fn sorted_numbers(&self) -> [u8; 6] {
        let mut sorted = self.numbers;
        sorted.sort();
        sorted
    }

    pub fn contains(&self, number: u8) -> bool {
        self.numbers.contains(&number)
    }

    /// Numéros principaux plus le bonus : ce qui compte comme « vu » pour le retard.
    pub fn seen_numbers(&self) -> impl Iterator<Item = u8> + '_ {
        self.numbers.iter().copied().chain(self.bonus)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Indice de tirage nul (doit être positif)")]
    ZeroIndex,
    #[error("Nombre de numéros invalide : {0} (6 attendus)")]
    WrongCount(usize),
    #[error("Numéro {0} hors limites (1-45)")]
    OutOfRange(u8),
    #[error("Numéro en double : {0}")]
    Duplicate(u8),
    #[error("Numéro bonus {0} hors limites (1-45)")]
    BonusOutOfRange(u8),
}

pub fn validate_numbers(numbers: &[u8]) -> Result<(), RecordError> {
    if numbers.len() != PICK_COUNT {
        return Err(RecordError::WrongCount(numbers.len()));
    }
    for &n in numbers {
        if n < 1 || n > POOL_SIZE {
            return Err(RecordError::OutOfRange(n));
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                return Err(RecordError::Duplicate(numbers[i]));
            }
        }
    }
    Ok(())
}

pub fn validate_bonus(bonus: u8) -> Result<(), RecordError> {
    if bonus < 1 || bonus > POOL_SIZE {
        return Err(RecordError::BonusOutOfRange(bonus));
    }
    Ok(())
}

/// Seuls l'indice et les numéros principaux rendent un tirage inutilisable.
/// Un bonus invalide est traité comme absent (voir `DrawHistory::from_draws`).
pub fn validate_draw(draw: &Draw) -> Result<(), RecordError> {
    if draw.draw_index == 0 {
        return Err(RecordError::ZeroIndex);
    }
    validate_numbers(&draw.numbers)
}

/// Historique trié par indice croissant, sans doublon, uniquement des tirages valides.
#[derive(Debug, Clone, Default)]
pub struct DrawHistory {
    draws: Vec<Draw>,
    skipped: usize,
}

impl DrawHistory {
    pub fn from_draws(draws: Vec<Draw>) -> Self {
        let mut skipped = 0;
        let mut valid = Vec::with_capacity(draws.len());
        let mut seen = HashSet::new();

        for mut draw in draws {
            if let Err(e) = validate_draw(&draw) {
                log::warn!("Tirage {} ignoré : {}", draw.draw_index, e);
                skipped += 1;
                continue;
            }
            if !seen.insert(draw.draw_index) {
                log::warn!("Tirage {} en double ignoré", draw.draw_index);
                skipped += 1;
                continue;
            }
            if let Some(Err(e)) = draw.bonus.map(validate_bonus) {
                log::warn!("Tirage {} : {}, bonus ignoré", draw.draw_index, e);
                draw.bonus = None;
            }
            valid.push(draw);
        }

        valid.sort_by_key(|d| d.draw_index);
        Self { draws: valid, skipped }
    }

    pub fn draws(&self) -> &[Draw] {
        &self.draws
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Nombre d'enregistrements rejetés à la construction.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn latest(&self) -> Option<&Draw> {
        self.draws.last()
    }

    /// Indice du dernier tirage, 0 si l'historique est vide.
    pub fn latest_index(&self) -> u32 {
        self.latest().map(|d| d.draw_index).unwrap_or(0)
    }
}

/// Grille de 6 numéros distincts, toujours triée.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Candidate([u8; 6]);

impl Candidate {
    pub fn new(mut numbers: [u8; 6]) -> Result<Self, RecordError> {
        validate_numbers(&numbers)?;
        numbers.sort();
        Ok(Self(numbers))
    }

    pub fn numbers(&self) -> &[u8; 6] {
        &self.0
    }

    pub fn sum(&self) -> u32 {
        self.0.iter().map(|&n| n as u32).sum()
    }
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self
            .0
            .iter()
            .map(|n| format!("{:2}", n))
            .collect::<Vec<_>>()
            .join(" - ");
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumberCount {
    pub number: u8,
    pub count: u32,
}

/// Tirages synthétiques valides, indices 1..=n.
pub fn make_test_draws(n: usize) -> Vec<Draw> {
    (0..n)
        .map(|i| {
            let base = ((i % 7) * 5) as u8;
            Draw {
                draw_index: (i + 1) as u32,
                date: format!("2024-01-{:02}", (i % 28) + 1),
                numbers: [base + 1, base + 3, base + 5, base + 8, base + 11, base + 15],
                bonus: Some(((i * 11) % 45 + 1) as u8),
            }
        })
        .collect()
}
