use serde::Serialize;

use loto645_db::models::Draw;

use super::round2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub draw_index: u32,
    pub sum: u32,
    pub moving_average: Option<f64>,
}

/// Moyenne mobile sur `window` sommes. Absente tant que la fenêtre n'est pas pleine.
pub fn moving_average(sums: &[u32], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; sums.len()];
    }
    let mut result = Vec::with_capacity(sums.len());
    let mut running: u64 = 0;
    for (i, &s) in sums.iter().enumerate() {
        running += s as u64;
        if i >= window {
            running -= sums[i - window] as u64;
        }
        if i + 1 < window {
            result.push(None);
        } else {
            result.push(Some(round2(running as f64 / window as f64)));
        }
    }
    result
}

/// Un point tous les `stride` tirages, en partant du premier.
pub fn sum_series(draws: &[Draw], window: usize, stride: usize) -> Vec<TimeSeriesPoint> {
    let sums: Vec<u32> = draws.iter().map(|d| d.sum()).collect();
    let averages = moving_average(&sums, window);
    let stride = stride.max(1);

    draws
        .iter()
        .zip(averages)
        .step_by(stride)
        .map(|(draw, moving_average)| TimeSeriesPoint {
            draw_index: draw.draw_index,
            sum: draw.sum(),
            moving_average,
        })
        .collect()
}
