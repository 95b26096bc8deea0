/// Normalisation min-max dans [0, 1].
/// Si toutes les valeurs sont égales, chaque valeur normalisée vaut 0 (jamais NaN).
pub fn normalize(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range <= 0.0 || !range.is_finite() {
        return vec![0.0; values.len()];
    }
    values.iter().map(|&v| (v - min) / range).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::frequency::count_main;
    use loto645_db::models::make_test_draws;

    #[test]
    fn test_min_max_mapping() {
        let norm = normalize(&[2.0, 4.0, 6.0]);
        assert_eq!(norm, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_degenerate_is_zero() {
        let norm = normalize(&[3.0; 45]);
        assert_eq!(norm.len(), 45);
        assert!(norm.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_empty() {
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_frequency_extremes() {
        let freq = count_main(&make_test_draws(30));
        let scores = freq.scores();
        let norm = normalize(&scores);

        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        for (raw, n) in scores.iter().zip(&norm) {
            assert!((0.0..=1.0).contains(n));
            if *raw == max {
                assert_eq!(*n, 1.0);
            }
            if *raw == min {
                assert_eq!(*n, 0.0);
            }
        }
    }
}
