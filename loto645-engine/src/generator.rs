use chrono::Datelike;
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;
use rand::seq::index;
use rand::Rng;
use serde::Serialize;

use loto645_db::models::{Candidate, LOW_MAX, MAX_SUM, MIN_SUM, PICK_COUNT, POOL_SIZE};

use crate::config::EngineConfig;
use crate::features::{FeatureSet, FrequencyTable};

/// Résultat d'une recherche bornée : une grille, ou le budget d'essais épuisé.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationOutcome {
    Found(Candidate),
    Exhausted { attempts: usize },
}

impl GenerationOutcome {
    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            GenerationOutcome::Found(c) => Some(c),
            GenerationOutcome::Exhausted { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, GenerationOutcome::Found(_))
    }
}

/// Génère un seed déterministe basé sur la date du jour (YYYYMMDD).
pub fn date_seed() -> u64 {
    let today = chrono::Local::now().date_naive();
    let y = today.year() as u64;
    let m = today.month() as u64;
    let d = today.day() as u64;
    y * 10_000 + m * 100 + d
}

fn uniform_combination<R: Rng + ?Sized>(rng: &mut R) -> Option<Candidate> {
    let mut numbers = [0u8; 6];
    for (slot, idx) in numbers.iter_mut().zip(index::sample(rng, POOL_SIZE as usize, PICK_COUNT).iter()) {
        *slot = idx as u8 + 1;
    }
    Candidate::new(numbers).ok()
}

/// 3 numéros dans 1-22 et 3 dans 23-45, triés.
fn balanced_combination<R: Rng + ?Sized>(rng: &mut R) -> [u8; 6] {
    let mut numbers = [0u8; 6];
    let low = index::sample(rng, LOW_MAX as usize, 3);
    let high = index::sample(rng, (POOL_SIZE - LOW_MAX) as usize, 3);
    for (slot, idx) in numbers[..3].iter_mut().zip(low.iter()) {
        *slot = idx as u8 + 1;
    }
    for (slot, idx) in numbers[3..].iter_mut().zip(high.iter()) {
        *slot = idx as u8 + LOW_MAX + 1;
    }
    numbers.sort();
    numbers
}

/// Un seul échange correctif : on décale un numéro de l'écart restant s'il reste
/// dans 1-45 et distinct des cinq autres.
fn adjust_to_sum(numbers: [u8; 6], target: u32) -> Option<Candidate> {
    let current: u32 = numbers.iter().map(|&n| n as u32).sum();
    if current == target {
        return Candidate::new(numbers).ok();
    }

    let replace = |i: usize, value: u32| -> Option<Candidate> {
        if value < 1 || value > POOL_SIZE as u32 || numbers.contains(&(value as u8)) {
            return None;
        }
        let mut adjusted = numbers;
        adjusted[i] = value as u8;
        Candidate::new(adjusted).ok()
    };

    if current < target {
        let deficit = target - current;
        (0..numbers.len())
            .rev()
            .find_map(|i| replace(i, numbers[i] as u32 + deficit))
    } else {
        let surplus = current - target;
        (0..numbers.len())
            .filter(|&i| numbers[i] as u32 > surplus)
            .find_map(|i| replace(i, numbers[i] as u32 - surplus))
    }
}

/// Grille de 6 numéros dont la somme vaut exactement `target`.
pub fn generate_exact_sum<R: Rng + ?Sized>(
    target: u32,
    max_attempts: usize,
    rng: &mut R,
) -> GenerationOutcome {
    if !(MIN_SUM..=MAX_SUM).contains(&target) {
        log::debug!("Somme cible {} impossible ({}-{})", target, MIN_SUM, MAX_SUM);
        return GenerationOutcome::Exhausted { attempts: 0 };
    }

    for attempt in 1..=max_attempts {
        let numbers = balanced_combination(rng);
        if let Some(candidate) = adjust_to_sum(numbers, target) {
            log::trace!("Somme {} trouvée en {} essai(s)", target, attempt);
            return GenerationOutcome::Found(candidate);
        }

        if let Some(candidate) = uniform_combination(rng) {
            if candidate.sum() == target {
                return GenerationOutcome::Found(candidate);
            }
        }
    }

    log::debug!("Somme {} : aucune grille en {} essais", target, max_attempts);
    GenerationOutcome::Exhausted {
        attempts: max_attempts,
    }
}

/// Tirage pondéré sans remise : équivalent à tirer avec remise jusqu'à obtenir
/// 6 numéros distincts.
fn weighted_combination<R: Rng + ?Sized>(pool: &[(u8, u32)], rng: &mut R) -> Option<Candidate> {
    let mut available = pool.to_vec();
    let mut numbers = [0u8; 6];

    for slot in numbers.iter_mut() {
        let weights: Vec<u32> = available.iter().map(|(_, w)| *w).collect();
        let dist = WeightedIndex::new(&weights).ok()?;
        let idx = dist.sample(rng);
        let (number, _) = available.remove(idx);
        *slot = number;
    }

    Candidate::new(numbers).ok()
}

/// Grille dont la somme est dans `[min_sum, max_sum]`, pondérée par la fréquence historique.
/// Sans au moins 6 numéros déjà sortis, l'échantillonnage est uniforme.
pub fn generate_in_range<R: Rng + ?Sized>(
    min_sum: u32,
    max_sum: u32,
    frequency: &FrequencyTable,
    max_attempts: usize,
    rng: &mut R,
) -> GenerationOutcome {
    if min_sum > max_sum || max_sum < MIN_SUM || min_sum > MAX_SUM {
        log::debug!("Plage {}-{} impossible", min_sum, max_sum);
        return GenerationOutcome::Exhausted { attempts: 0 };
    }

    let pool: Vec<(u8, u32)> = frequency.iter().filter(|&(_, c)| c > 0).collect();
    let weighted = pool.len() >= PICK_COUNT;
    if !weighted {
        log::debug!("Pas assez d'historique ({} numéros), échantillonnage uniforme", pool.len());
    }

    for _ in 0..max_attempts {
        let candidate = if weighted {
            weighted_combination(&pool, rng)
        } else {
            uniform_combination(rng)
        };
        if let Some(c) = candidate {
            if (min_sum..=max_sum).contains(&c.sum()) {
                return GenerationOutcome::Found(c);
            }
        }
    }

    log::debug!("Plage {}-{} : aucune grille en {} essais", min_sum, max_sum, max_attempts);
    GenerationOutcome::Exhausted {
        attempts: max_attempts,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequentSumRecommendation {
    pub sum: u32,
    pub count: u32,
    pub outcome: GenerationOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeRecommendation {
    pub label: String,
    pub min: u32,
    pub max: u32,
    pub outcome: GenerationOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SumRecommendations {
    pub frequent: Vec<FrequentSumRecommendation>,
    pub ranges: Vec<RangeRecommendation>,
}

/// Une grille pour chacune des sommes historiques les plus fréquentes, puis une par plage configurée.
pub fn sum_recommendations<R: Rng + ?Sized>(
    features: &FeatureSet,
    config: &EngineConfig,
    rng: &mut R,
) -> SumRecommendations {
    let frequent = features
        .patterns
        .top_sums(config.frequent_sums)
        .into_iter()
        .map(|(sum, count)| FrequentSumRecommendation {
            sum,
            count,
            outcome: generate_exact_sum(sum, config.exact_sum_attempts, rng),
        })
        .collect();

    let ranges = config
        .sum_ranges
        .iter()
        .map(|r| RangeRecommendation {
            label: r.label.clone(),
            min: r.min,
            max: r.max,
            outcome: generate_in_range(r.min, r.max, &features.frequency, config.range_attempts, rng),
        })
        .collect();

    SumRecommendations { frequent, ranges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{analyze, frequency::count_main};
    use loto645_db::models::{make_test_draws, DrawHistory};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_valid(c: &Candidate) {
        let n = c.numbers();
        assert!(n.windows(2).all(|w| w[0] < w[1]), "non trié/distinct: {:?}", n);
        assert!(n.iter().all(|&x| (1..=45).contains(&x)), "hors limites: {:?}", n);
    }

    #[test]
    fn test_date_seed_format() {
        let seed = date_seed();
        assert_eq!(seed.to_string().len(), 8, "seed devrait avoir 8 chiffres: {seed}");
    }

    #[test]
    fn test_adjust_increases_largest_first() {
        // 1+2+3+23+24+25 = 78, cible 80 → 25 devient 27
        let c = adjust_to_sum([1, 2, 3, 23, 24, 25], 80).unwrap();
        assert_eq!(c.numbers(), &[1, 2, 3, 23, 24, 27]);
    }

    #[test]
    fn test_adjust_decreases_smallest_first() {
        // 5+10+15+30+35+40 = 135, cible 132 → 5 devient 2
        let c = adjust_to_sum([5, 10, 15, 30, 35, 40], 132).unwrap();
        assert_eq!(c.numbers(), &[2, 10, 15, 30, 35, 40]);
    }

    #[test]
    fn test_adjust_inapplicable() {
        // 1+2+3+4+5+6 = 21 ; +200 impossible pour n'importe quel numéro
        assert!(adjust_to_sum([1, 2, 3, 4, 5, 6], 221).is_none());
    }

    #[test]
    fn test_exact_sum_constraint() {
        let mut rng = StdRng::seed_from_u64(42);
        for target in [21, 60, 100, 138, 180, 230, 255] {
            match generate_exact_sum(target, 1_000, &mut rng) {
                GenerationOutcome::Found(c) => {
                    assert_eq!(c.sum(), target);
                    assert_valid(&c);
                }
                GenerationOutcome::Exhausted { attempts } => assert_eq!(attempts, 1_000),
            }
        }
    }

    #[test]
    fn test_exact_sum_mid_range_always_found() {
        let mut rng = StdRng::seed_from_u64(42);
        for target in 70..=200 {
            match generate_exact_sum(target, 1_000, &mut rng) {
                GenerationOutcome::Found(c) => {
                    assert_eq!(c.sum(), target);
                    assert_valid(&c);
                }
                other => panic!("somme {} non trouvée : {:?}", target, other),
            }
        }
    }

    #[test]
    fn test_exact_sum_typical_target_found() {
        let mut rng = StdRng::seed_from_u64(7);
        let outcome = generate_exact_sum(138, 1_000, &mut rng);
        assert!(outcome.is_found());
        assert_eq!(outcome.candidate().unwrap().sum(), 138);
    }

    #[test]
    fn test_exact_sum_infeasible() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(generate_exact_sum(20, 1_000, &mut rng), GenerationOutcome::Exhausted { attempts: 0 });
        assert_eq!(generate_exact_sum(256, 1_000, &mut rng), GenerationOutcome::Exhausted { attempts: 0 });
    }

    #[test]
    fn test_exact_sum_seed_determinism() {
        let a = generate_exact_sum(120, 1_000, &mut StdRng::seed_from_u64(123));
        let b = generate_exact_sum(120, 1_000, &mut StdRng::seed_from_u64(123));
        assert_eq!(a, b);
    }

    #[test]
    fn test_range_constraint_weighted() {
        let freq = count_main(&make_test_draws(70));
        let mut rng = StdRng::seed_from_u64(42);
        for (min, max) in [(60, 90), (100, 150), (120, 150)] {
            let outcome = generate_in_range(min, max, &freq, 10_000, &mut rng);
            if let Some(c) = outcome.candidate() {
                assert!(c.sum() >= min && c.sum() <= max, "somme {} hors [{}, {}]", c.sum(), min, max);
                assert_valid(c);
                for &n in c.numbers() {
                    assert!(freq.get(n) > 0, "numéro {} jamais sorti", n);
                }
            }
        }
    }

    #[test]
    fn test_range_uniform_fallback() {
        let freq = FrequencyTable::new();
        let mut rng = StdRng::seed_from_u64(9);
        let outcome = generate_in_range(120, 150, &freq, 10_000, &mut rng);
        let c = outcome.candidate().expect("plage large, doit réussir");
        assert!((120..=150).contains(&c.sum()));
    }

    #[test]
    fn test_range_invalid() {
        let freq = FrequencyTable::new();
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(
            generate_in_range(150, 120, &freq, 100, &mut rng),
            GenerationOutcome::Exhausted { attempts: 0 }
        );
        assert_eq!(
            generate_in_range(300, 400, &freq, 100, &mut rng),
            GenerationOutcome::Exhausted { attempts: 0 }
        );
    }

    #[test]
    fn test_range_exhausted_when_unreachable() {
        // un seul jeu de 6 numéros dans l'historique : somme fixe 1+3+5+8+11+15 = 43
        let freq = count_main(&make_test_draws(1));
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(
            generate_in_range(200, 210, &freq, 50, &mut rng),
            GenerationOutcome::Exhausted { attempts: 50 }
        );
        let found = generate_in_range(43, 43, &freq, 50, &mut rng);
        assert_eq!(found.candidate().unwrap().numbers(), &[1, 3, 5, 8, 11, 15]);
    }

    #[test]
    fn test_sum_recommendations_shape() {
        let history = DrawHistory::from_draws(make_test_draws(70));
        let config = EngineConfig::default();
        let features = analyze(&history, config.moving_average_window, config.sample_stride);
        let mut rng = StdRng::seed_from_u64(2024);

        let recs = sum_recommendations(&features, &config, &mut rng);
        assert_eq!(recs.frequent.len(), 5);
        assert_eq!(recs.ranges.len(), 3);
        for f in &recs.frequent {
            if let Some(c) = f.outcome.candidate() {
                assert_eq!(c.sum(), f.sum);
            }
        }
        for r in &recs.ranges {
            if let Some(c) = r.outcome.candidate() {
                assert!((r.min..=r.max).contains(&c.sum()));
            }
        }
    }

    #[test]
    fn test_outcome_serialization() {
        let found = GenerationOutcome::Found(Candidate::new([1, 2, 3, 4, 5, 6]).unwrap());
        assert_eq!(serde_json::to_string(&found).unwrap(), r#"{"found":[1,2,3,4,5,6]}"#);
        let exhausted = GenerationOutcome::Exhausted { attempts: 10 };
        assert_eq!(serde_json::to_string(&exhausted).unwrap(), r#"{"exhausted":{"attempts":10}}"#);
    }
}
