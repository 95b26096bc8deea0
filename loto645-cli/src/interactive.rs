use std::io::BufRead;

use anyhow::{Context, Result};
use loto645_db::db::{fetch_history, fetch_last_draws};
use loto645_db::rusqlite::Connection;
use loto645_engine::snapshot::SnapshotStore;

use crate::display::{
    display_draws, display_outcome, display_recommendations, display_stats,
    display_sum_recommendations,
};
use crate::{Options, cmd_add, cmd_hit_rate, make_rng, prompt, prompt_numbers};

#[derive(Debug, PartialEq)]
enum InteractiveCommand {
    Add,
    Stats,
    Recommend,
    SumBased,
    Generate,
    History,
    Compare,
    Reload,
    Quit,
}

fn parse_command(input: &str) -> Option<InteractiveCommand> {
    match input.trim().to_lowercase().as_str() {
        "1" | "ajouter" | "add" => Some(InteractiveCommand::Add),
        "2" | "stats" | "statistiques" => Some(InteractiveCommand::Stats),
        "3" | "recommander" | "recommend" | "rec" => Some(InteractiveCommand::Recommend),
        "4" | "sommes" | "sums" => Some(InteractiveCommand::SumBased),
        "5" | "generer" | "générer" | "generate" | "gen" => Some(InteractiveCommand::Generate),
        "6" | "historique" | "history" | "hist" => Some(InteractiveCommand::History),
        "7" | "comparer" | "compare" | "comp" => Some(InteractiveCommand::Compare),
        "8" | "recharger" | "reload" => Some(InteractiveCommand::Reload),
        "9" | "quitter" | "quit" | "q" | "exit" => Some(InteractiveCommand::Quit),
        _ => None,
    }
}

fn display_menu() {
    println!();
    println!("── Mode interactif ──");
    println!("  1. ajouter     Ajouter un tirage");
    println!("  2. stats       Fréquences et retards");
    println!("  3. recommander Recommandations");
    println!("  4. sommes      Grilles par sommes");
    println!("  5. generer     Grille de somme exacte ou par plage");
    println!("  6. historique  Derniers tirages");
    println!("  7. comparer    Taux historique d'une grille");
    println!("  8. recharger   Relire la base et recalculer");
    println!("  9. quitter     Quitter");
    println!();
}

fn prompt_with_default(input: &mut dyn BufRead, msg: &str, default: &str) -> Result<String> {
    let line = prompt(input, &format!("{} [{}] : ", msg, default))?;
    if line.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(line)
    }
}

fn prompt_seed(input: &mut dyn BufRead) -> Result<Option<u64>> {
    let seed_str = prompt_with_default(input, "Seed (vide = date du jour)", "")?;
    if seed_str.is_empty() {
        Ok(None)
    } else {
        Ok(Some(seed_str.parse().context("Seed invalide")?))
    }
}

fn reload(conn: &Connection, store: &SnapshotStore, opts: &Options) -> Result<()> {
    let history = fetch_history(conn)?;
    let snapshot = store.refresh(&history, &opts.config);
    println!(
        "Analyse recalculée : {} tirages (dernier : {}).",
        snapshot.total_draws, snapshot.latest_index
    );
    Ok(())
}

fn cmd_generate_interactive(
    input: &mut dyn BufRead,
    store: &SnapshotStore,
    opts: &Options,
) -> Result<()> {
    let raw = prompt_with_default(input, "Somme exacte ou plage min-max", "120-150")?;
    let seed = prompt_seed(input)?;
    let mut rng = make_rng(seed);
    let snapshot = store.current();

    match raw.split_once('-') {
        Some((min, max)) => {
            let min: u32 = min.trim().parse().context("Minimum invalide")?;
            let max: u32 = max.trim().parse().context("Maximum invalide")?;
            let outcome = snapshot.generate_in_range(min, max, &opts.config, &mut rng);
            display_outcome(&format!("{} ≤ somme ≤ {}", min, max), &outcome);
        }
        None => {
            let target: u32 = raw.trim().parse().context("Somme invalide")?;
            let outcome = snapshot.generate_exact_sum(target, &opts.config, &mut rng);
            display_outcome(&format!("somme = {}", target), &outcome);
        }
    }
    Ok(())
}

fn cmd_history_interactive(input: &mut dyn BufRead, conn: &Connection) -> Result<()> {
    let n_str = prompt_with_default(input, "Nombre de tirages", "10")?;
    let n: u32 = n_str.parse().context("Nombre invalide")?;
    display_draws(&fetch_last_draws(conn, n)?);
    Ok(())
}

pub fn run_interactive(conn: &Connection, opts: &Options, input: &mut dyn BufRead) -> Result<()> {
    println!("Bienvenue dans le mode interactif de loto645 !");

    let store = SnapshotStore::default();
    reload(conn, &store, opts)?;

    loop {
        display_menu();
        let line = match prompt(input, "> ") {
            Ok(s) => s,
            Err(_) => break, // EOF / Ctrl+D
        };

        if line.is_empty() {
            continue;
        }

        let result = match parse_command(&line) {
            Some(InteractiveCommand::Quit) => {
                println!("Au revoir !");
                break;
            }
            Some(InteractiveCommand::Add) => cmd_add(conn, input).and_then(|inserted| {
                if inserted {
                    reload(conn, &store, opts)
                } else {
                    Ok(())
                }
            }),
            Some(InteractiveCommand::Stats) => {
                display_stats(&store.current());
                Ok(())
            }
            Some(InteractiveCommand::Recommend) => {
                display_recommendations(&store.current());
                Ok(())
            }
            Some(InteractiveCommand::SumBased) => prompt_seed(input).map(|seed| {
                let mut rng = make_rng(seed);
                let recs = store.current().sum_recommendations(&opts.config, &mut rng);
                display_sum_recommendations(&recs);
            }),
            Some(InteractiveCommand::Generate) => cmd_generate_interactive(input, &store, opts),
            Some(InteractiveCommand::History) => cmd_history_interactive(input, conn),
            Some(InteractiveCommand::Compare) => {
                prompt_numbers(input).and_then(|numbers| cmd_hit_rate(conn, opts, &numbers))
            }
            Some(InteractiveCommand::Reload) => reload(conn, &store, opts),
            None => {
                println!("Commande inconnue : '{}'. Tapez un numéro (1-9) ou un nom de commande.", line);
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("Erreur: {e:#}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_by_number() {
        assert_eq!(parse_command("1"), Some(InteractiveCommand::Add));
        assert_eq!(parse_command("2"), Some(InteractiveCommand::Stats));
        assert_eq!(parse_command("3"), Some(InteractiveCommand::Recommend));
        assert_eq!(parse_command("4"), Some(InteractiveCommand::SumBased));
        assert_eq!(parse_command("5"), Some(InteractiveCommand::Generate));
        assert_eq!(parse_command("6"), Some(InteractiveCommand::History));
        assert_eq!(parse_command("7"), Some(InteractiveCommand::Compare));
        assert_eq!(parse_command("8"), Some(InteractiveCommand::Reload));
        assert_eq!(parse_command("9"), Some(InteractiveCommand::Quit));
    }

    #[test]
    fn test_parse_command_by_name() {
        assert_eq!(parse_command("ajouter"), Some(InteractiveCommand::Add));
        assert_eq!(parse_command("recommander"), Some(InteractiveCommand::Recommend));
        assert_eq!(parse_command("générer"), Some(InteractiveCommand::Generate));
        assert_eq!(parse_command("recharger"), Some(InteractiveCommand::Reload));
        assert_eq!(parse_command("quitter"), Some(InteractiveCommand::Quit));
    }

    #[test]
    fn test_parse_command_case_insensitive() {
        assert_eq!(parse_command("QUIT"), Some(InteractiveCommand::Quit));
        assert_eq!(parse_command("  Sommes "), Some(InteractiveCommand::SumBased));
        assert_eq!(parse_command("HIST"), Some(InteractiveCommand::History));
    }

    #[test]
    fn test_parse_command_unknown() {
        assert_eq!(parse_command("foo"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("10"), None);
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        loto645_db::db::migrate(&conn).unwrap();
        conn
    }

    fn default_options() -> Options {
        Options {
            config: Default::default(),
            json: false,
        }
    }

    #[test]
    fn test_loop_stops_at_end_of_input() {
        let conn = memory_db();
        let opts = default_options();

        let mut input: &[u8] = b"";
        run_interactive(&conn, &opts, &mut input).unwrap();

        // commande inconnue puis fin de l'entrée
        let mut input: &[u8] = b"foo\n\n";
        run_interactive(&conn, &opts, &mut input).unwrap();
    }

    #[test]
    fn test_subcommand_interrupted_by_end_of_input() {
        let conn = memory_db();
        let opts = default_options();

        // chaque sous-commande échoue sur la fin de l'entrée, puis la boucle s'arrête
        for cmd in ["1", "4", "5", "6", "7"] {
            let script = format!("{}\n", cmd);
            let mut input = script.as_bytes();
            run_interactive(&conn, &opts, &mut input).unwrap();
        }

        let mut input: &[u8] = b"7\n1 2 3\n1 1 1 1 1 1\n";
        run_interactive(&conn, &opts, &mut input).unwrap();
    }

    #[test]
    fn test_add_then_quit() {
        let conn = memory_db();
        let opts = default_options();

        let mut input: &[u8] = b"ajouter\n7\n\n1 2 3 4 5 6\n\no\nhist\n\nquitter\nnon lu\n";
        run_interactive(&conn, &opts, &mut input).unwrap();
        assert_eq!(loto645_db::db::count_draws(&conn).unwrap(), 1);
        assert_eq!(input, b"non lu\n");
    }

    #[test]
    fn test_reload_publishes_new_snapshot() {
        use loto645_db::db::insert_draw;
        use loto645_db::models::make_test_draws;

        let conn = memory_db();
        let opts = default_options();
        let store = SnapshotStore::default();
        let before = store.current();

        for draw in make_test_draws(12) {
            insert_draw(&conn, &draw).unwrap();
        }
        reload(&conn, &store, &opts).unwrap();

        assert_eq!(before.total_draws, 0);
        assert_eq!(store.current().total_draws, 12);
        assert_eq!(store.current().latest_index, 12);
    }
}
