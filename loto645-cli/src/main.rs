mod display;
mod import;
mod interactive;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use loto645_db::db::{count_draws, db_path, fetch_history, fetch_last_draws, insert_draw, migrate, open_db};
use loto645_db::models::{Draw, PICK_COUNT, validate_draw, validate_numbers};
use loto645_db::rusqlite::Connection;
use loto645_engine::config::EngineConfig;
use loto645_engine::generator::date_seed;
use loto645_engine::hit_rate::{hit_rate_rounded, match_distribution};
use loto645_engine::snapshot::{AnalysisSnapshot, run_analysis};
use crate::display::{
    display_draws, display_hit_rate, display_import_summary, display_outcome, display_pairs,
    display_patterns, display_recommendations, display_stats, display_sum_recommendations,
    display_timeseries,
};

#[derive(Parser)]
#[command(name = "loto645", about = "Analyseur statistique Loto 6/45")]
struct Cli {
    /// Fichier de configuration JSON (défauts intégrés sinon)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Sortie JSON au lieu des tableaux
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer les tirages depuis un fichier CSV
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long, default_value = "data/lotto_history.csv")]
        file: PathBuf,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Écrire la configuration par défaut dans un fichier JSON
    InitConfig {
        #[arg(short, long, default_value = "loto645.json")]
        output: PathBuf,
    },

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Fréquences, bonus, numéros jamais sortis et retards
    Stats,

    /// Ratios impairs/pairs et hauts/bas, consécutifs, statistiques de sommes
    Patterns,

    /// Paires de numéros les plus fréquentes
    Pairs {
        #[arg(short, long, default_value = "20")]
        top: usize,
    },

    /// Somme par tirage et moyenne mobile
    Timeseries {
        /// Fenêtre de la moyenne mobile (défaut : configuration)
        #[arg(short, long)]
        window: Option<usize>,

        /// Pas d'échantillonnage (défaut : configuration)
        #[arg(short, long)]
        stride: Option<usize>,
    },

    /// Recommandations par méthode et recommandation intégrée
    Recommend,

    /// Générer une grille de somme exacte
    Sum {
        /// Somme visée (21-255)
        target: u32,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Générer une grille dont la somme tombe dans une plage
    Range {
        min: u32,
        max: u32,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Grilles pour les sommes historiques fréquentes et les plages configurées
    SumBased {
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Taux historique d'une grille
    HitRate {
        /// Numéros de la grille (1-45)
        #[arg(num_args = 1..=6, required = true)]
        numbers: Vec<u8>,
    },

    /// Ajouter un tirage manuellement
    Add,

    /// Mode interactif
    Interactive,
}

/// Options partagées par toutes les commandes d'analyse.
pub(crate) struct Options {
    pub config: EngineConfig,
    pub json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let ctx = Options {
        config: load_config(cli.config.as_deref())?,
        json: cli.json,
    };

    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file, &ctx),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::InitConfig { output } => {
            ctx.config.save(&output)?;
            println!("Configuration écrite dans {}", output.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last, &ctx),
        Command::Stats => with_snapshot(&conn, &ctx, |snapshot| {
            let report = serde_json::json!({
                "total_draws": snapshot.total_draws,
                "hot": snapshot.hot_numbers(10),
                "cold": snapshot.cold_numbers(10),
                "bonus_hot": snapshot.hot_bonus(5),
                "bonus_cold": snapshot.cold_bonus(5),
                "unappeared": snapshot.features.frequency.unappeared(),
                "overdue": snapshot.features.overdue,
            });
            emit(&ctx, &report, || display_stats(snapshot))
        }),
        Command::Patterns => with_snapshot(&conn, &ctx, |snapshot| {
            let patterns = &snapshot.features.patterns;
            emit(&ctx, patterns, || display_patterns(patterns))
        }),
        Command::Pairs { top } => with_snapshot(&conn, &ctx, |snapshot| {
            let pairs = snapshot.top_pairs(top);
            emit(&ctx, &pairs, || display_pairs(&pairs))
        }),
        Command::Timeseries { window, stride } => cmd_timeseries(&conn, &ctx, window, stride),
        Command::Recommend => with_snapshot(&conn, &ctx, |snapshot| {
            emit(&ctx, snapshot, || display_recommendations(snapshot))
        }),
        Command::Sum { target, seed } => with_snapshot(&conn, &ctx, |snapshot| {
            let mut rng = make_rng(seed);
            let outcome = snapshot.generate_exact_sum(target, &ctx.config, &mut rng);
            emit(&ctx, &outcome, || display_outcome(&format!("somme = {}", target), &outcome))
        }),
        Command::Range { min, max, seed } => with_snapshot(&conn, &ctx, |snapshot| {
            let mut rng = make_rng(seed);
            let outcome = snapshot.generate_in_range(min, max, &ctx.config, &mut rng);
            emit(&ctx, &outcome, || {
                display_outcome(&format!("{} ≤ somme ≤ {}", min, max), &outcome)
            })
        }),
        Command::SumBased { seed } => with_snapshot(&conn, &ctx, |snapshot| {
            let mut rng = make_rng(seed);
            let recs = snapshot.sum_recommendations(&ctx.config, &mut rng);
            emit(&ctx, &recs, || display_sum_recommendations(&recs))
        }),
        Command::HitRate { numbers } => cmd_hit_rate(&conn, &ctx, &numbers),
        Command::Add => cmd_add(&conn, &mut io::stdin().lock()).map(|_| ()),
        Command::Interactive => interactive::run_interactive(&conn, &ctx, &mut io::stdin().lock()),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(p) => EngineConfig::load(p),
        None => Ok(EngineConfig::default()),
    }
}

pub(crate) fn make_rng(seed: Option<u64>) -> StdRng {
    let seed = seed.unwrap_or_else(date_seed);
    log::debug!("Seed : {}", seed);
    StdRng::seed_from_u64(seed)
}

/// Affiche `value` en JSON si demandé, sinon appelle le rendu tableau.
pub(crate) fn emit<T: Serialize + ?Sized>(ctx: &Options, value: &T, table: impl FnOnce()) -> Result<()> {
    if ctx.json {
        let out = serde_json::to_string_pretty(value).context("Sérialisation JSON impossible")?;
        println!("{}", out);
    } else {
        table();
    }
    Ok(())
}

pub(crate) fn build_snapshot(conn: &Connection, config: &EngineConfig) -> Result<AnalysisSnapshot> {
    let history = fetch_history(conn)?;
    Ok(run_analysis(&history, config))
}

fn with_snapshot<F>(conn: &Connection, ctx: &Options, f: F) -> Result<()>
where
    F: FnOnce(&AnalysisSnapshot) -> Result<()>,
{
    if count_draws(conn)? == 0 {
        println!("Base vide. Lancez d'abord : loto645 import");
        return Ok(());
    }
    let snapshot = build_snapshot(conn, &ctx.config)?;
    f(&snapshot)
}

fn cmd_import(conn: &Connection, file: &Path, ctx: &Options) -> Result<()> {
    let result = import::import_csv(conn, file)?;
    emit(ctx, &result, || display_import_summary(&result))
}

fn cmd_list(conn: &Connection, last: u32, ctx: &Options) -> Result<()> {
    let n = count_draws(conn)?;
    if n == 0 {
        println!("Base vide. Lancez d'abord : loto645 import");
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last)?;
    emit(ctx, &draws, || display_draws(&draws))
}

fn cmd_timeseries(conn: &Connection, ctx: &Options, window: Option<usize>, stride: Option<usize>) -> Result<()> {
    let mut config = ctx.config.clone();
    if let Some(w) = window {
        config.moving_average_window = w;
    }
    if let Some(s) = stride {
        config.sample_stride = s;
    }
    config.validate()?;

    let window = config.moving_average_window;
    let local = Options { config, json: ctx.json };
    with_snapshot(conn, &local, |snapshot| {
        let points = &snapshot.features.time_series;
        emit(&local, points, || display_timeseries(points, window))
    })
}

#[derive(Serialize)]
struct HitRateReport<'a> {
    numbers: &'a [u8],
    hit_rate: f64,
    match_distribution: [u32; PICK_COUNT + 1],
}

pub(crate) fn cmd_hit_rate(conn: &Connection, ctx: &Options, numbers: &[u8]) -> Result<()> {
    for &n in numbers {
        if !(1..=45).contains(&n) {
            anyhow::bail!("Numéro {} hors limites (1-45)", n);
        }
    }
    let history = fetch_history(conn)?;
    let report = HitRateReport {
        numbers,
        hit_rate: hit_rate_rounded(numbers, &history),
        match_distribution: match_distribution(numbers, &history),
    };
    emit(ctx, &report, || {
        display_hit_rate(numbers, report.hit_rate, &report.match_distribution, history.len())
    })
}

/// Saisie manuelle d'un tirage. Renvoie `true` si une ligne a été insérée.
pub(crate) fn cmd_add(conn: &Connection, input: &mut dyn BufRead) -> Result<bool> {
    println!("Ajout d'un tirage manuellement\n");

    let raw_index = prompt(input, "Numéro du tirage (ex: 1095) : ")?;
    let draw_index = import::parse_draw_index(&raw_index)?;
    let raw_date = prompt(input, "Date (AAAA.MM.JJ, vide si inconnue) : ")?;
    let date = import::parse_date(&raw_date)?;

    let numbers = prompt_numbers(input)?;
    let bonus = prompt_bonus(input)?;

    let draw = Draw {
        draw_index,
        date,
        numbers,
        bonus,
    };
    validate_draw(&draw)?;

    println!("\nTirage à insérer :");
    display_draws(&[draw.clone()]);

    let confirm = prompt(input, "\nConfirmer l'insertion ? (o/n) : ")?;
    if confirm.trim().to_lowercase() == "o" {
        let inserted = insert_draw(conn, &draw)?;
        if inserted {
            println!("Tirage inséré avec succès.");
        } else {
            println!("Ce tirage existe déjà (doublon ignoré).");
        }
        Ok(inserted)
    } else {
        println!("Insertion annulée.");
        Ok(false)
    }
}

/// Lit une ligne. La fin de l'entrée est une erreur, pour que toute boucle de saisie s'arrête.
pub(crate) fn prompt(input: &mut dyn BufRead, msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .context("Erreur de lecture")?;
    if read == 0 {
        bail!("Fin de l'entrée");
    }
    Ok(line.trim().to_string())
}

pub(crate) fn prompt_numbers(input: &mut dyn BufRead) -> Result<[u8; 6]> {
    loop {
        let line = prompt(input, "6 numéros (séparés par des espaces, 1-45) : ")?;
        match import::parse_numbers(&line) {
            Ok(arr) => {
                if validate_numbers(&arr).is_ok() {
                    return Ok(arr);
                }
                println!("Numéros invalides (1-45, pas de doublons). Réessayez.");
            }
            Err(_) => println!("Entrez exactement 6 numéros. Réessayez."),
        }
    }
}

fn prompt_bonus(input: &mut dyn BufRead) -> Result<Option<u8>> {
    loop {
        let line = prompt(input, "Numéro bonus (1-45, vide si aucun) : ")?;
        if line.is_empty() {
            return Ok(None);
        }
        match import::parse_bonus(&line) {
            Some(b) => return Ok(Some(b)),
            None => println!("Bonus invalide (1-45). Réessayez."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loto645_db::db::migrate;

    #[test]
    fn test_prompt_end_of_input() {
        let mut input: &[u8] = b"";
        assert!(prompt(&mut input, "> ").is_err());

        let mut input: &[u8] = b"  42 \n";
        assert_eq!(prompt(&mut input, "> ").unwrap(), "42");
        assert!(prompt(&mut input, "> ").is_err());
    }

    #[test]
    fn test_prompt_numbers_stops_at_end_of_input() {
        let mut input: &[u8] = b"1 2 3\n1 1 2 3 4 5\n";
        assert!(prompt_numbers(&mut input).is_err());

        let mut input: &[u8] = b"1 2 3\n6 5 4 3 2 1\n";
        assert_eq!(prompt_numbers(&mut input).unwrap(), [6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_prompt_bonus_stops_at_end_of_input() {
        let mut input: &[u8] = b"99\nx\n";
        assert!(prompt_bonus(&mut input).is_err());

        let mut input: &[u8] = b"\n";
        assert_eq!(prompt_bonus(&mut input).unwrap(), None);
    }

    #[test]
    fn test_cmd_add_from_reader() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        let mut input: &[u8] = b"1095\n(2023.11.25)\n8 14 28 29 34 40\n12\no\n";
        assert!(cmd_add(&conn, &mut input).unwrap());
        assert_eq!(count_draws(&conn).unwrap(), 1);

        // saisie interrompue : rien n'est inséré
        let mut input: &[u8] = b"1096\n";
        assert!(cmd_add(&conn, &mut input).is_err());
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }
}
