use std::collections::BTreeMap;

use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};

use crate::import::ImportResult;
use loto645_db::models::{Draw, NumberCount, PICK_COUNT};
use loto645_engine::features::{PairCount, PatternStats, TimeSeriesPoint};
use loto645_engine::generator::{GenerationOutcome, SumRecommendations};
use loto645_engine::snapshot::AnalysisSnapshot;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

fn outcome_cells(outcome: &GenerationOutcome) -> (Cell, Cell) {
    match outcome {
        GenerationOutcome::Found(c) => (Cell::new(c.to_string()), Cell::new(c.sum().to_string())),
        GenerationOutcome::Exhausted { attempts } => (
            Cell::new(format!("échec après {} essais", attempts)).fg(Color::Red),
            Cell::new("—"),
        ),
    }
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Tirage", "Date", "Numéros", "Bonus", "Somme"]);

    for draw in draws {
        let bonus = draw
            .bonus
            .map(|b| format!("{:2}", b))
            .unwrap_or_else(|| "—".to_string());

        table.add_row(vec![
            &draw.draw_index.to_string(),
            &draw.date,
            &join_numbers(&draw.sorted_numbers()),
            &bonus,
            &draw.sum().to_string(),
        ]);
    }

    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

fn count_table(counts: &[NumberCount]) -> Table {
    let mut table = new_table(vec!["Numéro", "Apparitions"]);
    for c in counts {
        table.add_row(vec![format!("{:2}", c.number), c.count.to_string()]);
    }
    table
}

pub fn display_stats(snapshot: &AnalysisSnapshot) {
    println!(
        "\n📊 Fréquences sur {} tirages (dernier : {})\n",
        snapshot.total_draws, snapshot.latest_index
    );
    if snapshot.skipped_records > 0 {
        println!("⚠ {} enregistrements invalides ignorés\n", snapshot.skipped_records);
    }

    println!("── Numéros les plus fréquents ──");
    println!("{}", count_table(&snapshot.hot_numbers(10)));

    println!("\n── Numéros les moins fréquents ──");
    println!("{}", count_table(&snapshot.cold_numbers(10)));

    println!("\n── Bonus les plus fréquents ──");
    println!("{}", count_table(&snapshot.hot_bonus(5)));

    println!("\n── Bonus les moins fréquents ──");
    println!("{}", count_table(&snapshot.cold_bonus(5)));

    let unappeared = snapshot.features.frequency.unappeared();
    if unappeared.is_empty() {
        println!("\nTous les numéros sont déjà sortis.");
    } else {
        println!("\nJamais sortis : {}", join_numbers(&unappeared));
    }

    println!("\n── Retards (tirages depuis la dernière apparition) ──");
    let overdue = &snapshot.features.overdue;
    let mut gaps: Vec<(u8, u32)> = (1..=45).map(|n| (n, overdue.gap(n))).collect();
    gaps.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    let mut table = new_table(vec!["Numéro", "Retard", "Dernière apparition"]);
    for &(n, gap) in gaps.iter().take(10) {
        let last = overdue.last_seen(n);
        table.add_row(vec![
            format!("{:2}", n),
            gap.to_string(),
            if last == 0 { "jamais".to_string() } else { last.to_string() },
        ]);
    }
    println!("{table}");
}

pub fn display_patterns(patterns: &PatternStats) {
    println!("\n🔎 Motifs sur {} tirages\n", patterns.total_draws);

    let ratio_table = |title: &str, ratios: &BTreeMap<String, u32>| {
        let mut table = new_table(vec![title, "Tirages", "%"]);
        for (key, count) in PatternStats::sorted_ratios(ratios) {
            let pct = if patterns.total_draws > 0 {
                count as f64 / patterns.total_draws as f64 * 100.0
            } else {
                0.0
            };
            table.add_row(vec![key, count.to_string(), format!("{:.2}", pct)]);
        }
        table
    };

    println!("── Impairs / pairs ──");
    println!("{}", ratio_table("Impairs:Pairs", &patterns.odd_even));

    println!("\n── Hauts / bas (bas = 1-22) ──");
    println!("{}", ratio_table("Hauts:Bas", &patterns.high_low));

    println!(
        "\nNuméros consécutifs : {} tirages ({:.2} %)",
        patterns.consecutive.count, patterns.consecutive.percentage
    );

    let s = &patterns.sums;
    println!("\n── Sommes ──");
    let mut table = new_table(vec!["Min", "Max", "Moyenne", "Médiane", "Écart-type"]);
    table.add_row(vec![
        s.min.to_string(),
        s.max.to_string(),
        format!("{:.2}", s.mean),
        s.median.to_string(),
        format!("{:.2}", s.std_dev),
    ]);
    println!("{table}");

    let top = patterns.top_sums(5);
    if !top.is_empty() {
        println!("\n── Sommes les plus fréquentes ──");
        let mut table = new_table(vec!["Somme", "Tirages"]);
        for (sum, count) in top {
            table.add_row(vec![sum.to_string(), count.to_string()]);
        }
        println!("{table}");
    }
}

pub fn display_pairs(pairs: &[PairCount]) {
    if pairs.is_empty() {
        println!("Aucune paire à afficher.");
        return;
    }
    println!("\n🔗 Paires les plus fréquentes\n");
    let mut table = new_table(vec!["#", "Paire", "Tirages communs"]);
    for (i, p) in pairs.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            format!("{:2} - {:2}", p.first, p.second),
            p.count.to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_timeseries(points: &[TimeSeriesPoint], window: usize) {
    if points.is_empty() {
        println!("Aucun point à afficher.");
        return;
    }
    println!("\n📈 Somme par tirage et moyenne mobile ({} tirages)\n", window);
    let mut table = new_table(vec!["Tirage", "Somme", "Moyenne mobile"]);
    for p in points {
        let ma = p
            .moving_average
            .map(|m| format!("{:.2}", m))
            .unwrap_or_else(|| "—".to_string());
        table.add_row(vec![p.draw_index.to_string(), p.sum.to_string(), ma]);
    }
    println!("{table}");
}

pub fn display_recommendations(snapshot: &AnalysisSnapshot) {
    let recs = &snapshot.recommendations;
    let rates = &snapshot.hit_rates;

    println!("\n🎯 Recommandations ({} tirages analysés)\n", snapshot.total_draws);

    let mut table = new_table(vec!["Méthode", "Numéros", "Taux historique (%)"]);
    let rows: [(&str, &[u8], f64); 5] = [
        ("Motif", &recs.pattern, rates.pattern),
        ("Co-apparition", &recs.co_occurrence, rates.co_occurrence),
        ("Fréquence", &recs.hot, rates.hot),
        ("Retard", &recs.overdue, rates.overdue),
        ("Intégrée", &recs.integrated, rates.integrated),
    ];
    for (name, numbers, rate) in rows {
        let mut numbers_cell = Cell::new(join_numbers(numbers));
        if name == "Intégrée" {
            numbers_cell = numbers_cell.fg(Color::Green);
        } else if numbers.len() < PICK_COUNT {
            numbers_cell = numbers_cell.fg(Color::Yellow);
        }
        table.add_row(vec![Cell::new(name), numbers_cell, Cell::new(format!("{:.2}", rate))]);
    }
    println!("{table}");

    println!("\n── Scores intégrés (10 meilleurs) ──");
    let mut ranked: Vec<(usize, f64)> = recs.scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    let mut table = new_table(vec!["Numéro", "Score"]);
    for &(i, score) in ranked.iter().take(10) {
        table.add_row(vec![format!("{:2}", i + 1), format!("{:.4}", score)]);
    }
    println!("{table}");
}

pub fn display_outcome(label: &str, outcome: &GenerationOutcome) {
    let mut table = new_table(vec!["Contrainte", "Grille", "Somme"]);
    let (grid, sum) = outcome_cells(outcome);
    table.add_row(vec![Cell::new(label), grid, sum]);
    println!("{table}");
}

pub fn display_sum_recommendations(recs: &SumRecommendations) {
    println!("\n🎲 Grilles par sommes fréquentes\n");
    if recs.frequent.is_empty() {
        println!("Aucune somme historique.");
    } else {
        let mut table = new_table(vec!["Somme", "Tirages", "Grille", "Vérif."]);
        for r in &recs.frequent {
            let (grid, sum) = outcome_cells(&r.outcome);
            table.add_row(vec![Cell::new(r.sum), Cell::new(r.count), grid, sum]);
        }
        println!("{table}");
    }

    println!("\n🎲 Grilles par plages de somme\n");
    let mut table = new_table(vec!["Plage", "Bornes", "Grille", "Somme"]);
    for r in &recs.ranges {
        let (grid, sum) = outcome_cells(&r.outcome);
        table.add_row(vec![
            Cell::new(&r.label),
            Cell::new(format!("{}-{}", r.min, r.max)),
            grid,
            sum,
        ]);
    }
    println!("{table}");
}

pub fn display_hit_rate(candidate: &[u8], rate: f64, distribution: &[u32], total_draws: usize) {
    println!("\nGrille : {}", join_numbers(candidate));
    println!("Tirages contenant toute la grille : {:.2} %\n", rate);

    let mut table = new_table(vec!["Numéros communs", "Tirages", "%"]);
    for (k, &count) in distribution.iter().enumerate().rev() {
        let pct = if total_draws > 0 {
            count as f64 / total_draws as f64 * 100.0
        } else {
            0.0
        };
        table.add_row(vec![k.to_string(), count.to_string(), format!("{:.2}", pct)]);
    }
    println!("{table}");
}
